use crate::token::{LexerError, Position, Range, Token, TokenKind};

/// Reserved words of the language.
const KEYWORDS: &[&str] = &[
    "ك", "و", "في", "او", "أو", "من", "مع", "صح", "هل", "اذا", "إذا", "ليس", "مرر", "عدم", "ولد",
    "صنف", "خطا", "خطأ", "عام", "احذف", "دالة", "لاجل", "لأجل", "والا", "وإلا", "توقف", "نطاق",
    "ارجع", "اواذا", "أوإذا", "بينما", "انتظر", "استمر", "مزامنة", "استورد", "حاول", "خلل", "نهاية",
];

/// Built-in functions.
const KEYWORDS1: &[&str] = &["اطبع", "ادخل", "مدى"];

/// Special identifiers.
const KEYWORDS2: &[&str] = &["_تهيئة_", "هذا", "اصل"];

pub fn is_arabic_letter(ch: char) -> bool {
    matches!(ch,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
}

pub fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || is_arabic_letter(ch)
}

pub fn is_identifier_continue(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit() || matches!(ch, '\u{0660}'..='\u{0669}')
}

fn is_operator_char(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-' | '*' | '/' | '\\' | '=' | '<' | '>' | '!' | '&' | '|' | '%' | '^' | '~'
    )
}

fn is_punctuation_char(ch: char) -> bool {
    matches!(ch, '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';' | ':' | '.')
}

/// Tokenizer for Alif source text.
///
/// Byte offsets in the produced ranges are exact; the walk decodes
/// codepoints through `str`'s own UTF-8 iteration.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    quote_depth: u32,
    in_fstring: bool,
    errors: Vec<LexerError>,
}

/// Tokenize `source` in one call, returning the token stream (terminated by
/// exactly one `EndOfFile`) and any lexing errors.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexerError>) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    let errors = lexer.errors().to_vec();
    (tokens, errors)
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            pos: 0,
            line: 1,
            column: 1,
            quote_depth: 0,
            in_fstring: false,
            errors: Vec::new(),
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        self.pos = 0;
        self.line = 1;
        self.column = 1;
        self.quote_depth = 0;
        self.in_fstring = false;
        self.errors.clear();

        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.at_end() {
                break;
            }

            let start = self.position();
            let ch = match self.current_char() {
                Some(ch) => ch,
                None => break,
            };

            if ch.is_ascii_digit() {
                tokens.push(self.lex_number(start));
            } else if is_identifier_start(ch) {
                tokens.push(self.lex_identifier(start));
            } else if ch == '"' || ch == '\'' {
                tokens.push(self.lex_string(start, ch));
            } else if ch == '#' {
                tokens.push(self.lex_comment(start));
            } else if is_operator_char(ch) {
                tokens.push(self.lex_operator(start));
            } else if is_punctuation_char(ch) {
                tokens.push(self.lex_punctuation(start));
            } else {
                self.errors
                    .push(LexerError::new(format!("unexpected character: {ch}"), start));
                self.advance();
            }
        }

        let eof = self.position();
        tokens.push(Token::new(TokenKind::EndOfFile, "", Range::new(eof, eof)));
        tokens
    }

    pub fn errors(&self) -> &[LexerError] {
        &self.errors
    }

    pub fn has_more_tokens(&self) -> bool {
        !self.at_end()
    }

    /// True while the scan position is inside an f-string literal.
    pub fn in_fstring(&self) -> bool {
        self.in_fstring
    }

    /// Point the lexer at new source text, discarding all scan state.
    pub fn reset(&mut self, source: &'a str) {
        *self = Lexer::new(source);
    }

    pub fn is_keyword(word: &str) -> bool {
        KEYWORDS.contains(&word)
    }

    pub fn is_keyword1(word: &str) -> bool {
        KEYWORDS1.contains(&word)
    }

    pub fn is_keyword2(word: &str) -> bool {
        KEYWORDS2.contains(&word)
    }

    pub fn keywords() -> &'static [&'static str] {
        KEYWORDS
    }

    pub fn builtin_keywords() -> &'static [&'static str] {
        KEYWORDS1
    }

    pub fn special_keywords() -> &'static [&'static str] {
        KEYWORDS2
    }

    // ── scanning helpers ─────────────────────────────────────────

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.pos)
    }

    fn current_char(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.pos += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if matches!(ch, ' ' | '\t' | '\r' | '\n') {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn token_from(&self, kind: TokenKind, start: Position) -> Token {
        let end = self.position();
        let text = self.source[start.offset..end.offset].to_string();
        Token::new(kind, text, Range::new(start, end))
    }

    // ── token producers ──────────────────────────────────────────

    fn lex_number(&mut self, start: Position) -> Token {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() || ch == '.' {
                self.advance();
            } else {
                break;
            }
        }
        self.token_from(TokenKind::Number, start)
    }

    fn lex_identifier(&mut self, start: Position) -> Token {
        while let Some(ch) = self.current_char() {
            if is_identifier_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }
        let end = self.position();
        let text = &self.source[start.offset..end.offset];
        let kind = if Self::is_keyword(text) {
            TokenKind::Keyword
        } else if Self::is_keyword1(text) {
            TokenKind::Keyword1
        } else if Self::is_keyword2(text) {
            TokenKind::Keyword2
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, text, Range::new(start, end))
    }

    fn lex_string(&mut self, start: Position, quote: char) -> Token {
        // An f-string is announced by the Arabic letter م (U+0645, bytes
        // D9 85) immediately before the opening quote.
        let is_fstring = start.offset >= 2
            && self.source.as_bytes()[start.offset - 2..start.offset] == [0xD9, 0x85];
        if is_fstring {
            self.in_fstring = true;
            self.quote_depth += 1;
        }

        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            if ch == '\\' {
                // Escape pair kept verbatim.
                self.advance();
                if !self.at_end() {
                    self.advance();
                }
            } else if ch == quote {
                self.advance();
                if is_fstring {
                    self.quote_depth = self.quote_depth.saturating_sub(1);
                    if self.quote_depth == 0 {
                        self.in_fstring = false;
                    }
                }
                break;
            } else {
                // `{` inside an f-string passes through verbatim; expression
                // tokenization happens at a higher layer, if ever.
                self.advance();
            }
        }

        self.token_from(TokenKind::String, start)
    }

    fn lex_comment(&mut self, start: Position) -> Token {
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
        self.token_from(TokenKind::Comment, start)
    }

    fn lex_operator(&mut self, start: Position) -> Token {
        let first = self.current_char();
        self.advance();
        if let (Some(a), Some(b)) = (first, self.current_char()) {
            let two_char = matches!((a, b), ('=', '=') | ('!', '=') | ('<', '=') | ('>', '='));
            if two_char {
                self.advance();
            }
        }
        self.token_from(TokenKind::Operator, start)
    }

    fn lex_punctuation(&mut self, start: Position) -> Token {
        self.advance();
        self.token_from(TokenKind::Punctuation, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        tokenize(source).0
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).iter().map(|t| t.kind).collect()
    }

    // ── keyword classification ───────────────────────────────────

    #[test]
    fn every_keyword_lexes_to_keyword_and_eof() {
        for word in Lexer::keywords() {
            let tokens = lex(word);
            assert_eq!(tokens.len(), 2, "unexpected stream for {word}");
            assert_eq!(tokens[0].kind, TokenKind::Keyword, "misclassified {word}");
            assert_eq!(tokens[0].text, *word);
            assert_eq!(tokens[1].kind, TokenKind::EndOfFile);
        }
    }

    #[test]
    fn every_builtin_lexes_to_keyword1() {
        for word in Lexer::builtin_keywords() {
            let tokens = lex(word);
            assert_eq!(tokens.len(), 2);
            assert_eq!(tokens[0].kind, TokenKind::Keyword1, "misclassified {word}");
        }
    }

    #[test]
    fn every_special_identifier_lexes_to_keyword2() {
        for word in Lexer::special_keywords() {
            let tokens = lex(word);
            assert_eq!(tokens.len(), 2);
            assert_eq!(tokens[0].kind, TokenKind::Keyword2, "misclassified {word}");
        }
    }

    #[test]
    fn non_keyword_identifiers_stay_identifiers() {
        for word in ["العداد", "اسم_الدالة", "x", "_temp", "قيمة١"] {
            let tokens = lex(word);
            assert_eq!(tokens[0].kind, TokenKind::Identifier, "misclassified {word}");
        }
    }

    #[test]
    fn keyword_sets_are_disjoint() {
        for word in Lexer::keywords() {
            assert!(!Lexer::is_keyword1(word));
            assert!(!Lexer::is_keyword2(word));
        }
        for word in Lexer::builtin_keywords() {
            assert!(!Lexer::is_keyword2(word));
        }
    }

    // ── identifiers ──────────────────────────────────────────────

    #[test]
    fn arabic_indic_digits_continue_identifiers() {
        let tokens = lex("س١٢٣");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "س١٢٣");
    }

    #[test]
    fn ascii_digit_cannot_start_identifier() {
        let tokens = lex("1سم");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    // ── numbers ──────────────────────────────────────────────────

    #[test]
    fn integer_and_decimal_numbers() {
        let tokens = lex("42 3.14");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].text, "3.14");
    }

    // ── strings ──────────────────────────────────────────────────

    #[test]
    fn double_and_single_quoted_strings() {
        let tokens = lex(r#""مرحبا" 'x'"#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "\"مرحبا\"");
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].text, "'x'");
    }

    #[test]
    fn escape_pairs_are_preserved_verbatim() {
        let tokens = lex(r#""a\"b""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, r#""a\"b""#);
        assert_eq!(tokens[1].kind, TokenKind::EndOfFile);
    }

    #[test]
    fn unterminated_string_consumes_to_eof() {
        let tokens = lex("\"مفتوح");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "\"مفتوح");
        assert_eq!(tokens[1].kind, TokenKind::EndOfFile);
    }

    #[test]
    fn fstring_brace_passes_through() {
        // In م"..." the prefix letter is its own identifier token and the
        // braces stay inside the string text.
        let tokens = lex("م\"القيمة {س}\"");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "م");
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert!(tokens[1].text.contains("{س}"));
    }

    // ── comments ─────────────────────────────────────────────────

    #[test]
    fn comment_runs_to_end_of_line() {
        let tokens = lex("# تعليق\nاطبع");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text, "# تعليق");
        assert_eq!(tokens[1].kind, TokenKind::Keyword1);
    }

    // ── operators and punctuation ────────────────────────────────

    #[test]
    fn two_char_operators_lex_as_one_token() {
        for op in ["==", "!=", "<=", ">="] {
            let tokens = lex(op);
            assert_eq!(tokens[0].kind, TokenKind::Operator);
            assert_eq!(tokens[0].text, op, "split {op}");
        }
    }

    #[test]
    fn other_operator_pairs_stay_separate() {
        let tokens = lex("++");
        assert_eq!(tokens[0].text, "+");
        assert_eq!(tokens[1].text, "+");
    }

    #[test]
    fn punctuation_single_codepoint_tokens() {
        assert_eq!(
            kinds("(){}[],;:."),
            vec![
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::Punctuation,
                TokenKind::EndOfFile,
            ]
        );
    }

    // ── positions ────────────────────────────────────────────────

    #[test]
    fn positions_track_lines_columns_and_byte_offsets() {
        let tokens = lex("اذا\nس = 1");
        // اذا: line 1, columns 1..4, bytes 0..6 (three 2-byte codepoints)
        assert_eq!(tokens[0].range.start, Position::new(1, 1, 0));
        assert_eq!(tokens[0].range.end, Position::new(1, 4, 6));
        // س on line 2
        assert_eq!(tokens[1].range.start, Position::new(2, 1, 7));
        assert_eq!(tokens[1].range.end, Position::new(2, 2, 9));
        // = operator
        assert_eq!(tokens[2].range.start, Position::new(2, 3, 10));
        // 1
        assert_eq!(tokens[3].range.start, Position::new(2, 5, 12));
    }

    #[test]
    fn stream_ends_with_exactly_one_eof() {
        for source in ["", "   ", "اطبع(١)", "# فقط تعليق"] {
            let tokens = lex(source);
            let eof_count = tokens
                .iter()
                .filter(|t| t.kind == TokenKind::EndOfFile)
                .count();
            assert_eq!(eof_count, 1, "source: {source:?}");
            assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfFile));
        }
    }

    // ── errors ───────────────────────────────────────────────────

    #[test]
    fn unknown_character_is_recorded_and_skipped() {
        let (tokens, errors) = tokenize("س @ ص");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains('@'));
        assert_eq!(errors[0].position.line, 1);
        // Both identifiers still come through.
        let idents: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(idents, vec!["س", "ص"]);
    }

    #[test]
    fn whitespace_yields_no_tokens() {
        let tokens = lex(" \t\r\n ");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EndOfFile);
    }
}
