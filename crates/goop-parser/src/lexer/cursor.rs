/// A position-tracking cursor over source text.
///
/// Offers peek/advance access to characters while keeping the byte offset,
/// line, and column of the current position up to date.
pub struct Cursor<'src> {
    /// The full source text.
    source: &'src str,
    /// Unconsumed remainder of `source`.
    rest: &'src str,
    /// Byte offset of `rest` within `source`.
    offset: u32,
    /// Current line (1-indexed).
    line: u32,
    /// Current column (1-indexed, byte-based).
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    /// The current character, without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        let first = *self.rest.as_bytes().first()?;
        if first < 128 {
            Some(first as char)
        } else {
            self.rest.chars().next()
        }
    }

    /// The character `n` positions ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Whether the remaining input starts with `s`.
    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    /// Consume one character, updating line and column.
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len as u32;
        }
        Some(ch)
    }

    /// Consume `s` if the input starts with it.
    pub fn eat_str(&mut self, s: &str) -> bool {
        if !self.check_str(s) {
            return false;
        }
        for _ in s.chars() {
            self.advance();
        }
        true
    }

    /// Consume the current character if it equals `ch`.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while `f` holds and return the consumed slice.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset;
        while self.check(&f) {
            self.advance();
        }
        self.slice_from(start)
    }

    /// Source text from `start` up to the current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Whether `c` may start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Whether `c` may continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_lines() {
        let mut cursor = Cursor::new("a\nbc");
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (1, 2));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        cursor.advance();
        assert_eq!(cursor.column(), 2);
    }

    #[test]
    fn eat_while_returns_slice() {
        let mut cursor = Cursor::new("abc123 rest");
        assert_eq!(cursor.eat_while(is_ident_continue), "abc123");
        assert_eq!(cursor.peek(), Some(' '));
    }

    #[test]
    fn eat_str_matches_prefix_only() {
        let mut cursor = Cursor::new("&^=");
        assert!(!cursor.eat_str("&&"));
        assert!(cursor.eat_str("&^"));
        assert!(cursor.eat('='));
        assert!(cursor.is_eof());
    }

    #[test]
    fn multibyte_columns_are_bytes() {
        let mut cursor = Cursor::new("π1");
        assert_eq!(cursor.advance(), Some('π'));
        assert_eq!(cursor.column(), 3);
        assert_eq!(cursor.offset(), 2);
    }

    #[test]
    fn unicode_identifiers() {
        assert!(is_ident_start('é'));
        assert!(!is_ident_start('1'));
        assert!(is_ident_continue('1'));
    }
}
