use std::fmt;

/// Classification of a lexed token.
///
/// `Keyword1` covers the built-in functions (اطبع، ادخل، مدى) and `Keyword2`
/// the special identifiers (_تهيئة_، هذا، اصل). The f-string kinds are part
/// of the token model even though the lexer currently emits whole f-strings
/// as `String`; expression tokenization inside `{}` is not done at this
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword,
    Keyword1,
    Keyword2,
    Identifier,
    Number,
    String,
    Comment,
    Whitespace,
    Operator,
    Punctuation,
    EndOfFile,
    Invalid,
    FStringStart,
    FStringMiddle,
    FStringEnd,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Keyword1 => "keyword1",
            TokenKind::Keyword2 => "keyword2",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Comment => "comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Operator => "operator",
            TokenKind::Punctuation => "punctuation",
            TokenKind::EndOfFile => "end-of-file",
            TokenKind::Invalid => "invalid",
            TokenKind::FStringStart => "fstring-start",
            TokenKind::FStringMiddle => "fstring-middle",
            TokenKind::FStringEnd => "fstring-end",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point in the source text. Line and column are 1-based and count
/// codepoints; `offset` is a 0-based byte offset into the UTF-8 source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Position { line, column, offset }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, range: Range) -> Self {
        Token {
            kind,
            text: text.into(),
            range,
        }
    }

    /// True when the byte offset falls inside this token's source extent.
    pub fn covers_offset(&self, offset: usize) -> bool {
        self.range.start.offset <= offset && offset < self.range.end.offset
    }
}

/// A lexing problem. Errors are collected alongside the token stream, never
/// emitted as tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub position: Position,
}

impl LexerError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        LexerError {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_position_is_line_one_column_one() {
        let pos = Position::default();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn covers_offset_is_half_open() {
        let token = Token::new(
            TokenKind::Identifier,
            "احسب",
            Range::new(Position::new(1, 3, 4), Position::new(1, 7, 12)),
        );
        assert!(!token.covers_offset(3));
        assert!(token.covers_offset(4));
        assert!(token.covers_offset(11));
        assert!(!token.covers_offset(12));
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(TokenKind::Keyword1.name(), "keyword1");
        assert_eq!(TokenKind::EndOfFile.to_string(), "end-of-file");
    }
}
