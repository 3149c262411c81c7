//! Error types shared by every phase of the preprocessor.
//!
//! ```text
//! GoopError (top-level wrapper)
//! ├── LexError     - tokenization errors
//! ├── ParseErrors  - syntax errors (each a ParseError with a ParseErrorKind)
//! ├── TypeErrors   - type-checking diagnostics (each a TypeError with a TypeErrorKind)
//! └── Io           - reading sources or writing output
//! ```
//!
//! Phase-specific errors can be handled directly, or converted into
//! [`GoopError`] with `?`.

use std::path::PathBuf;

use thiserror::Error;

use crate::{FileId, Span};

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors produced while splitting source text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string literal at {span}")]
    UnterminatedString { span: Span },

    #[error("unterminated raw string literal at {span}")]
    UnterminatedRawString { span: Span },

    #[error("unterminated rune literal at {span}")]
    UnterminatedRune { span: Span },

    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Where the error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedRawString { span }
            | LexError::UnterminatedRune { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A lexer error surfaced through the parser.
    Lexical,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// A type was expected.
    ExpectedType,
    /// A statement was expected.
    ExpectedStatement,
    /// A top-level declaration was expected.
    ExpectedDeclaration,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// The `package` clause is missing.
    MissingPackageClause,
    /// A literal could not be decoded.
    InvalidLiteral,
    /// An escape sequence in a string or rune literal is malformed.
    InvalidEscapeSequence,
    /// The construct is valid Go but not part of the supported subset.
    Unsupported,
    /// Any other syntax error.
    InvalidSyntax,
}

impl ParseErrorKind {
    /// A short human-readable name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::Lexical => "lexical error",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::MissingPackageClause => "missing package clause",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::InvalidEscapeSequence => "invalid escape sequence",
            ParseErrorKind::Unsupported => "unsupported syntax",
            ParseErrorKind::InvalidSyntax => "invalid syntax",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syntax error with location and message.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// An "expected X, found Y" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }

    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Render the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        render_excerpt(source, self.span, &format!("{}: {}", self.kind, self.message))
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lexical, error.span(), error.to_string())
    }
}

/// All syntax errors found in one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<Vec<ParseError>> for ParseErrors {
    fn from(errors: Vec<ParseError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

// ============================================================================
// Type Errors
// ============================================================================

/// Categories of type-checking diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeErrorKind {
    /// A name is not declared in any enclosing scope.
    Undeclared,
    /// A name is declared twice in the same scope.
    Redeclared,
    /// Operand types do not match for an operator.
    MismatchedTypes,
    /// The operator is not defined for the operand type.
    InvalidOperation,
    /// A value cannot be used where a value of another type is required.
    NotAssignable,
    /// A value cannot be converted to the requested type.
    InvalidConversion,
    /// A constant does not fit its type.
    ConstantOverflow,
    /// Division by a constant zero.
    DivisionByZero,
    /// Wrong number of arguments, results, or assignment operands.
    WrongCount,
    /// The expression is not a type, or a type was used as a value.
    NotAType,
    /// Selector names no field or method.
    MissingFieldOrMethod,
    /// Taking the address of, or assigning to, a non-addressable operand.
    NotAddressable,
    /// A function with results can fall off its end.
    MissingReturn,
    /// A local variable is declared but never used.
    UnusedVariable,
    /// An import is never referenced.
    UnusedImport,
    /// An import path is not known to the package registry.
    UnknownImport,
    /// A type refers to itself without indirection.
    InvalidRecursiveType,
    /// Package-level initialization refers back to itself.
    InitializationCycle,
    /// `break`, `continue` or `fallthrough` outside a valid context.
    MisplacedBranch,
    /// An expression is evaluated but its value is discarded.
    UnusedResult,
    /// Index or slice bounds are invalid.
    InvalidIndex,
    /// Anything not covered by the kinds above.
    Other,
}

impl TypeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeErrorKind::Undeclared => "undeclared name",
            TypeErrorKind::Redeclared => "redeclared",
            TypeErrorKind::MismatchedTypes => "mismatched types",
            TypeErrorKind::InvalidOperation => "invalid operation",
            TypeErrorKind::NotAssignable => "not assignable",
            TypeErrorKind::InvalidConversion => "invalid conversion",
            TypeErrorKind::ConstantOverflow => "constant overflow",
            TypeErrorKind::DivisionByZero => "division by zero",
            TypeErrorKind::WrongCount => "wrong count",
            TypeErrorKind::NotAType => "not a type",
            TypeErrorKind::MissingFieldOrMethod => "missing field or method",
            TypeErrorKind::NotAddressable => "not addressable",
            TypeErrorKind::MissingReturn => "missing return",
            TypeErrorKind::UnusedVariable => "unused variable",
            TypeErrorKind::UnusedImport => "unused import",
            TypeErrorKind::UnknownImport => "unknown import",
            TypeErrorKind::InvalidRecursiveType => "invalid recursive type",
            TypeErrorKind::InitializationCycle => "initialization cycle",
            TypeErrorKind::MisplacedBranch => "misplaced branch",
            TypeErrorKind::UnusedResult => "unused result",
            TypeErrorKind::InvalidIndex => "invalid index",
            TypeErrorKind::Other => "type error",
        }
    }

    /// Soft errors do not affect the soundness of recorded type information.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            TypeErrorKind::UnusedVariable | TypeErrorKind::UnusedImport
        )
    }
}

impl std::fmt::Display for TypeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned type-checking diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{span}: {message}")]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub file: FileId,
    pub span: Span,
    pub message: String,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, file: FileId, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            file,
            span,
            message: message.into(),
        }
    }

    /// Render as `name:line:col: message` followed by a source excerpt.
    pub fn display_with_source(&self, file_name: &str, source: &str) -> String {
        render_excerpt(
            source,
            self.span,
            &format!("{file_name}:{}: {}", self.span, self.message),
        )
    }
}

/// Every diagnostic of one type-checking run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeErrors {
    errors: Vec<TypeError>,
}

impl TypeErrors {
    pub fn new(errors: Vec<TypeError>) -> Self {
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<TypeError> {
        self.errors
    }
}

impl std::fmt::Display for TypeErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("no type errors"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more errors)", rest.len()),
        }
    }
}

impl std::error::Error for TypeErrors {}

// ============================================================================
// Top-level
// ============================================================================

/// Any error the preprocessor can report.
#[derive(Debug, Error)]
pub enum GoopError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{file}: {errors}")]
    Parse { file: String, errors: ParseErrors },

    #[error(transparent)]
    Type(#[from] TypeErrors),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no Go source files in {}", .0.display())]
    NoSources(PathBuf),
}

impl GoopError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GoopError::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Format a header plus the source line under `span`, with a caret marker.
fn render_excerpt(source: &str, span: Span, header: &str) -> String {
    let mut output = format!("{header}\n");

    let line_text = span
        .line
        .checked_sub(1)
        .and_then(|index| source.lines().nth(index as usize));
    if let Some(text) = line_text {
        output.push_str("    |\n");
        output.push_str(&format!("{:>3} | {}\n", span.line, text));
        let indent = " ".repeat(span.col.saturating_sub(1) as usize);
        let marker = if span.len <= 1 {
            "^".to_string()
        } else {
            format!("^{}", "~".repeat(span.len as usize - 1))
        };
        output.push_str(&format!("    | {indent}{marker}\n"));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_span() {
        let error = LexError::UnterminatedRune {
            span: Span::new(2, 3, 1),
        };
        assert_eq!(error.span(), Span::new(2, 3, 1));
        assert_eq!(error.to_string(), "unterminated rune literal at 2:3");
    }

    #[test]
    fn lex_error_becomes_parse_error() {
        let error: ParseError = LexError::UnexpectedChar {
            ch: '$',
            span: Span::new(1, 4, 1),
        }
        .into();
        assert_eq!(error.kind, ParseErrorKind::Lexical);
        assert_eq!(error.span, Span::new(1, 4, 1));
    }

    #[test]
    fn parse_error_excerpt_marks_column() {
        let error = ParseError::expected_token(Span::new(2, 5, 3), "'{'", "'}'");
        let rendered = error.display_with_source("package p\nfunc f() }\n");
        assert!(rendered.contains("expected '{', found '}'"));
        assert!(rendered.contains("  2 | func f() }"));
        assert!(rendered.contains("    |     ^~~"));
    }

    #[test]
    fn excerpt_tolerates_missing_line() {
        let error = TypeError::new(
            TypeErrorKind::Other,
            FileId(0),
            Span::new(40, 1, 1),
            "boom",
        );
        let rendered = error.display_with_source("main.go", "package p\n");
        assert_eq!(rendered, "main.go:40:1: boom\n");
    }

    #[test]
    fn type_errors_summary() {
        let one = TypeError::new(
            TypeErrorKind::Undeclared,
            FileId(0),
            Span::new(3, 2, 1),
            "undefined: x",
        );
        let errors = TypeErrors::new(vec![one.clone(), one]);
        assert_eq!(errors.to_string(), "3:2: undefined: x (and 1 more errors)");
    }

    #[test]
    fn soft_kinds() {
        assert!(TypeErrorKind::UnusedImport.is_soft());
        assert!(!TypeErrorKind::MismatchedTypes.is_soft());
    }
}
