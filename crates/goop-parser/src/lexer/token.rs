//! Token definitions for the Go lexer.

use goop_core::Span;
use std::fmt;

/// A token with its source text.
///
/// The lexeme is copied into the arena, so tokens outlive the source string.
/// Automatically inserted semicolons carry the lexeme `"\n"`.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Whether this is a semicolon the lexer inserted at a line end.
    #[inline]
    pub fn is_implicit_semicolon(&self) -> bool {
        self.kind == TokenKind::Semicolon && self.lexeme == "\n"
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// Every token kind of the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals and names
    // =========================================
    /// `x`, `Op_Add`
    Ident,
    /// `42`, `0x1F`, `1_000`
    Int,
    /// `1.5`, `1e9`, `.5`
    Float,
    /// `'a'`, `'\n'`
    Rune,
    /// `"text"` or a raw `` `text` ``
    String,

    // =========================================
    // Keywords
    // =========================================
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,

    // =========================================
    // Operators
    // =========================================
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Quo,
    /// `%`
    Rem,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&^`
    AndNot,

    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    QuoAssign,
    /// `%=`
    RemAssign,
    /// `&=`
    AndAssign,
    /// `|=`
    OrAssign,
    /// `^=`
    XorAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `&^=`
    AndNotAssign,

    /// `&&`
    LAnd,
    /// `||`
    LOr,
    /// `<-`
    Arrow,
    /// `++`
    Inc,
    /// `--`
    Dec,

    /// `==`
    Eql,
    /// `<`
    Lss,
    /// `>`
    Gtr,
    /// `=`
    Assign,
    /// `!`
    Not,
    /// `~`
    Tilde,

    /// `!=`
    Neq,
    /// `<=`
    Leq,
    /// `>=`
    Geq,
    /// `:=`
    Define,
    /// `...`
    Ellipsis,

    // =========================================
    // Delimiters
    // =========================================
    LParen,
    LBrack,
    LBrace,
    Comma,
    Period,
    RParen,
    RBrack,
    RBrace,
    Semicolon,
    Colon,

    // =========================================
    // Special
    // =========================================
    /// End of input.
    Eof,
    /// A lexical error; the error itself is recorded by the lexer.
    Error,
}

impl TokenKind {
    /// Whether a newline after this token ends the statement.
    pub fn triggers_semicolon(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Rune
                | TokenKind::String
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Fallthrough
                | TokenKind::Return
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::RParen
                | TokenKind::RBrack
                | TokenKind::RBrace
        )
    }

    /// Whether this is a literal token.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::Float | TokenKind::Rune | TokenKind::String
        )
    }

    /// Source spelling of fixed tokens, or a description for the rest.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Rune => "rune literal",
            TokenKind::String => "string literal",
            TokenKind::Break => "break",
            TokenKind::Case => "case",
            TokenKind::Chan => "chan",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Default => "default",
            TokenKind::Defer => "defer",
            TokenKind::Else => "else",
            TokenKind::Fallthrough => "fallthrough",
            TokenKind::For => "for",
            TokenKind::Func => "func",
            TokenKind::Go => "go",
            TokenKind::Goto => "goto",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::Interface => "interface",
            TokenKind::Map => "map",
            TokenKind::Package => "package",
            TokenKind::Range => "range",
            TokenKind::Return => "return",
            TokenKind::Select => "select",
            TokenKind::Struct => "struct",
            TokenKind::Switch => "switch",
            TokenKind::Type => "type",
            TokenKind::Var => "var",
            TokenKind::Add => "+",
            TokenKind::Sub => "-",
            TokenKind::Mul => "*",
            TokenKind::Quo => "/",
            TokenKind::Rem => "%",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Xor => "^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::AndNot => "&^",
            TokenKind::AddAssign => "+=",
            TokenKind::SubAssign => "-=",
            TokenKind::MulAssign => "*=",
            TokenKind::QuoAssign => "/=",
            TokenKind::RemAssign => "%=",
            TokenKind::AndAssign => "&=",
            TokenKind::OrAssign => "|=",
            TokenKind::XorAssign => "^=",
            TokenKind::ShlAssign => "<<=",
            TokenKind::ShrAssign => ">>=",
            TokenKind::AndNotAssign => "&^=",
            TokenKind::LAnd => "&&",
            TokenKind::LOr => "||",
            TokenKind::Arrow => "<-",
            TokenKind::Inc => "++",
            TokenKind::Dec => "--",
            TokenKind::Eql => "==",
            TokenKind::Lss => "<",
            TokenKind::Gtr => ">",
            TokenKind::Assign => "=",
            TokenKind::Not => "!",
            TokenKind::Tilde => "~",
            TokenKind::Neq => "!=",
            TokenKind::Leq => "<=",
            TokenKind::Geq => ">=",
            TokenKind::Define => ":=",
            TokenKind::Ellipsis => "...",
            TokenKind::LParen => "(",
            TokenKind::LBrack => "[",
            TokenKind::LBrace => "{",
            TokenKind::Comma => ",",
            TokenKind::Period => ".",
            TokenKind::RParen => ")",
            TokenKind::RBrack => "]",
            TokenKind::RBrace => "}",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an identifier to its keyword kind, if it is one.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "chan" => TokenKind::Chan,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "default" => TokenKind::Default,
        "defer" => TokenKind::Defer,
        "else" => TokenKind::Else,
        "fallthrough" => TokenKind::Fallthrough,
        "for" => TokenKind::For,
        "func" => TokenKind::Func,
        "go" => TokenKind::Go,
        "goto" => TokenKind::Goto,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "interface" => TokenKind::Interface,
        "map" => TokenKind::Map,
        "package" => TokenKind::Package,
        "range" => TokenKind::Range,
        "return" => TokenKind::Return,
        "select" => TokenKind::Select,
        "struct" => TokenKind::Struct,
        "switch" => TokenKind::Switch,
        "type" => TokenKind::Type,
        "var" => TokenKind::Var,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(lookup_keyword("func"), Some(TokenKind::Func));
        assert_eq!(lookup_keyword("fallthrough"), Some(TokenKind::Fallthrough));
        assert_eq!(lookup_keyword("Func"), None);
        assert_eq!(lookup_keyword("int"), None);
    }

    #[test]
    fn semicolon_triggers() {
        assert!(TokenKind::RBrace.triggers_semicolon());
        assert!(TokenKind::Return.triggers_semicolon());
        assert!(!TokenKind::LBrace.triggers_semicolon());
        assert!(!TokenKind::Add.triggers_semicolon());
    }

    #[test]
    fn implicit_semicolon() {
        let span = Span::point(1, 1);
        assert!(Token::new(TokenKind::Semicolon, "\n", span).is_implicit_semicolon());
        assert!(!Token::new(TokenKind::Semicolon, ";", span).is_implicit_semicolon());
    }
}
