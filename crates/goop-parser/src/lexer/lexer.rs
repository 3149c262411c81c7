//! The Go lexer.
//!
//! [`Lexer`] turns source text into [`Token`]s, inserting semicolons at line
//! ends following Go's semicolon rules. Lexemes are copied into the
//! arena so the source string may be dropped once lexing completes.

use bumpalo::Bump;
use goop_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Operator spellings, longest first so the first match is the longest.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("<<=", TokenKind::ShlAssign),
    (">>=", TokenKind::ShrAssign),
    ("&^=", TokenKind::AndNotAssign),
    ("...", TokenKind::Ellipsis),
    ("+=", TokenKind::AddAssign),
    ("-=", TokenKind::SubAssign),
    ("*=", TokenKind::MulAssign),
    ("/=", TokenKind::QuoAssign),
    ("%=", TokenKind::RemAssign),
    ("&=", TokenKind::AndAssign),
    ("|=", TokenKind::OrAssign),
    ("^=", TokenKind::XorAssign),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("&^", TokenKind::AndNot),
    ("&&", TokenKind::LAnd),
    ("||", TokenKind::LOr),
    ("<-", TokenKind::Arrow),
    ("++", TokenKind::Inc),
    ("--", TokenKind::Dec),
    ("==", TokenKind::Eql),
    ("!=", TokenKind::Neq),
    ("<=", TokenKind::Leq),
    (">=", TokenKind::Geq),
    (":=", TokenKind::Define),
    ("+", TokenKind::Add),
    ("-", TokenKind::Sub),
    ("*", TokenKind::Mul),
    ("/", TokenKind::Quo),
    ("%", TokenKind::Rem),
    ("&", TokenKind::And),
    ("|", TokenKind::Or),
    ("^", TokenKind::Xor),
    ("<", TokenKind::Lss),
    (">", TokenKind::Gtr),
    ("=", TokenKind::Assign),
    ("!", TokenKind::Not),
    ("~", TokenKind::Tilde),
    ("(", TokenKind::LParen),
    ("[", TokenKind::LBrack),
    ("{", TokenKind::LBrace),
    (",", TokenKind::Comma),
    (".", TokenKind::Period),
    (")", TokenKind::RParen),
    ("]", TokenKind::RBrack),
    ("}", TokenKind::RBrace),
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
];

/// Lexer for Go source text.
///
/// `'src` is the borrowed source; `'ast` is the arena holding lexemes.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    errors: Vec<LexError>,
    /// Whether a newline at the current position terminates a statement.
    insert_semi: bool,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            errors: Vec::new(),
            insert_semi: false,
        }
    }

    /// Lex the whole input. The returned tokens always end with `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token<'ast>>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Scan and return the next token.
    pub fn next_token(&mut self) -> Token<'ast> {
        if let Some(semi) = self.skip_trivia() {
            return semi;
        }

        if self.cursor.is_eof() {
            if self.insert_semi {
                self.insert_semi = false;
                return self.implicit_semicolon();
            }
            return Token::new(
                TokenKind::Eof,
                "",
                Span::point(self.cursor.line(), self.cursor.column()),
            );
        }

        let start = Start {
            line: self.cursor.line(),
            col: self.cursor.column(),
            offset: self.cursor.offset(),
        };

        let token = match self.cursor.peek() {
            Some(c) if c.is_ascii_digit() => self.scan_number(start),
            Some('.') if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(start)
            }
            Some('"') => self.scan_string(start),
            Some('`') => self.scan_raw_string(start),
            Some('\'') => self.scan_rune(start),
            Some(c) if is_ident_start(c) => self.scan_identifier(start),
            _ => self.scan_operator(start),
        };

        self.insert_semi = token.kind.triggers_semicolon();
        token
    }

    // =========================================
    // Trivia
    // =========================================

    /// Skip whitespace and comments. Returns an implicit semicolon when a
    /// line end terminates the previous statement.
    fn skip_trivia(&mut self) -> Option<Token<'ast>> {
        loop {
            match self.cursor.peek() {
                Some('\n') => {
                    if self.insert_semi {
                        self.insert_semi = false;
                        let semi = self.implicit_semicolon();
                        self.cursor.advance();
                        return Some(semi);
                    }
                    self.cursor.advance();
                }
                Some(' ' | '\t' | '\r' | '\u{FEFF}') => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.check_str("//") => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.check_str("/*") => {
                    let span = Span::point(self.cursor.line(), self.cursor.column());
                    let spans_lines = self.skip_block_comment(span);
                    if spans_lines && self.insert_semi {
                        self.insert_semi = false;
                        return Some(Token::new(TokenKind::Semicolon, "\n", span));
                    }
                }
                _ => return None,
            }
        }
    }

    /// Skip a `/* ... */` comment; returns whether it contained a newline.
    fn skip_block_comment(&mut self, span: Span) -> bool {
        self.cursor.eat_str("/*");
        let mut newline = false;
        loop {
            if self.cursor.eat_str("*/") {
                return newline;
            }
            match self.cursor.advance() {
                Some('\n') => newline = true,
                Some(_) => {}
                None => {
                    self.errors.push(LexError::UnterminatedComment { span });
                    return newline;
                }
            }
        }
    }

    fn implicit_semicolon(&self) -> Token<'ast> {
        Token::new(
            TokenKind::Semicolon,
            "\n",
            Span::point(self.cursor.line(), self.cursor.column()),
        )
    }

    // =========================================
    // Token construction
    // =========================================

    fn make_token(&self, kind: TokenKind, start: Start) -> Token<'ast> {
        let text = self.cursor.slice_from(start.offset);
        let span = Span::new(start.line, start.col, text.len() as u32);
        Token::new(kind, self.arena.alloc_str(text), span)
    }

    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    fn span_from(&self, start: Start) -> Span {
        Span::new(start.line, start.col, self.cursor.offset() - start.offset)
    }

    // =========================================
    // Numbers
    // =========================================

    fn scan_number(&mut self, start: Start) -> Token<'ast> {
        if self.cursor.peek() == Some('0') {
            let radix = match self.cursor.peek_nth(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.cursor.advance();
                self.cursor.advance();
                let digits = self
                    .cursor
                    .eat_while(|c| c == '_' || c.is_digit(radix));
                if !digits.chars().any(|c| c != '_') {
                    let span = self.span_from(start);
                    return self.make_error(LexError::InvalidNumber {
                        span,
                        detail: "expected digits after base prefix".to_string(),
                    });
                }
                return self.make_token(TokenKind::Int, start);
            }
        }

        let mut kind = TokenKind::Int;
        self.eat_decimal_digits();

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1) != Some('.') {
            self.cursor.advance();
            self.eat_decimal_digits();
            kind = TokenKind::Float;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if self.eat_decimal_digits().is_empty() {
                let span = self.span_from(start);
                return self.make_error(LexError::InvalidNumber {
                    span,
                    detail: "exponent has no digits".to_string(),
                });
            }
            kind = TokenKind::Float;
        }

        self.make_token(kind, start)
    }

    fn eat_decimal_digits(&mut self) -> &'src str {
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_')
    }

    // =========================================
    // Strings and runes
    // =========================================

    fn scan_string(&mut self, start: Start) -> Token<'ast> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start);
                    return self.make_error(LexError::UnterminatedString { span });
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek().is_some_and(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                Some('"') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::String, start);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn scan_raw_string(&mut self, start: Start) -> Token<'ast> {
        self.cursor.advance();
        self.cursor.eat_while(|c| c != '`');
        if !self.cursor.eat('`') {
            let span = self.span_from(start);
            return self.make_error(LexError::UnterminatedRawString { span });
        }
        self.make_token(TokenKind::String, start)
    }

    fn scan_rune(&mut self, start: Start) -> Token<'ast> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start);
                    return self.make_error(LexError::UnterminatedRune { span });
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek().is_some_and(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                Some('\'') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::Rune, start);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    // =========================================
    // Identifiers and operators
    // =========================================

    fn scan_identifier(&mut self, start: Start) -> Token<'ast> {
        let text = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Ident);
        self.make_token(kind, start)
    }

    fn scan_operator(&mut self, start: Start) -> Token<'ast> {
        for &(spelling, kind) in OPERATORS {
            if self.cursor.eat_str(spelling) {
                return self.make_token(kind, start);
            }
        }

        let ch = self.cursor.advance().unwrap_or('\0');
        let span = self.span_from(start);
        self.make_error(LexError::UnexpectedChar { ch, span })
    }
}

/// Where the token being scanned began.
#[derive(Clone, Copy)]
struct Start {
    line: u32,
    col: u32,
    offset: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let arena = Bump::new();
        let (tokens, errors) = Lexer::new(source, &arena).tokenize();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn semicolons_after_line_ends() {
        use TokenKind::*;
        assert_eq!(
            kinds("x := 1\nreturn x\n"),
            vec![Ident, Define, Int, Semicolon, Return, Ident, Semicolon, Eof]
        );
    }

    #[test]
    fn no_semicolon_after_operator() {
        use TokenKind::*;
        assert_eq!(kinds("a +\nb"), vec![Ident, Add, Ident, Semicolon, Eof]);
    }

    #[test]
    fn semicolon_before_eof_and_after_brace() {
        use TokenKind::*;
        assert_eq!(
            kinds("func f() {}"),
            vec![Func, Ident, LParen, RParen, LBrace, RBrace, Semicolon, Eof]
        );
    }

    #[test]
    fn comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(
            kinds("x // trailing\n/* block */ y"),
            vec![Ident, Semicolon, Ident, Semicolon, Eof]
        );
    }

    #[test]
    fn multiline_block_comment_ends_statement() {
        use TokenKind::*;
        assert_eq!(kinds("x /*\n*/ y"), vec![Ident, Semicolon, Ident, Semicolon, Eof]);
    }

    #[test]
    fn longest_operator_wins() {
        use TokenKind::*;
        assert_eq!(
            kinds("a &^= b &^ c && d"),
            vec![Ident, AndNotAssign, Ident, AndNot, Ident, LAnd, Ident, Semicolon, Eof]
        );
    }

    #[test]
    fn numbers() {
        use TokenKind::*;
        assert_eq!(
            kinds("42 0x_ff 0b101 1.5 .5 1e9 2.e3 1_000"),
            vec![Int, Int, Int, Float, Float, Float, Float, Int, Semicolon, Eof]
        );
    }

    #[test]
    fn literals_keep_quotes() {
        let arena = Bump::new();
        let (tokens, _) = Lexer::new(r#""a\"b" `raw` '\n'"#, &arena).tokenize();
        assert_eq!(tokens[0].lexeme, r#""a\"b""#);
        assert_eq!(tokens[1].lexeme, "`raw`");
        assert_eq!(tokens[2].kind, TokenKind::Rune);
        assert_eq!(tokens[2].lexeme, r"'\n'");
    }

    #[test]
    fn spans_are_tracked() {
        let arena = Bump::new();
        let (tokens, _) = Lexer::new("package main\n\nfunc", &arena).tokenize();
        assert_eq!(tokens[1].span, Span::new(1, 9, 4));
        assert_eq!(tokens[3].span, Span::new(3, 1, 4));
    }

    #[test]
    fn unterminated_string_is_reported() {
        let arena = Bump::new();
        let (tokens, errors) = Lexer::new("\"abc\nx", &arena).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }

    #[test]
    fn unexpected_character() {
        let arena = Bump::new();
        let (_, errors) = Lexer::new("a $ b", &arena).tokenize();
        assert_eq!(
            errors,
            vec![LexError::UnexpectedChar {
                ch: '$',
                span: Span::new(1, 3, 1)
            }]
        );
    }

    #[test]
    fn missing_hex_digits() {
        let arena = Bump::new();
        let (_, errors) = Lexer::new("0x", &arena).tokenize();
        assert!(matches!(errors[0], LexError::InvalidNumber { .. }));
    }
}
