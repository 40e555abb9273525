//! Lexer (tokenizer) for the HDL subset.

use crate::error::{LogicError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Token {
    /// True if this is the identifier or keyword `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }
}

/// Token types of the HDL subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier or keyword (`module`, `assign`, `and`, net names)
    Identifier,
    /// A number or sized literal (`0`, `1'b1`, `4'hF`)
    Number,
    /// Open parenthesis '('
    OpenParen,
    /// Close parenthesis ')'
    CloseParen,
    /// Open bracket '['
    OpenBracket,
    /// Close bracket ']'
    CloseBracket,
    /// Comma ','
    Comma,
    /// Semicolon ';'
    Semicolon,
    /// Colon ':'
    Colon,
    /// Equals sign '='
    Equals,
    /// Bitwise and '&'
    And,
    /// Bitwise or '|'
    Or,
    /// Bitwise xor '^'
    Xor,
    /// Bitwise xnor '~^' or '^~'
    Xnor,
    /// Bitwise not '~'
    Not,
    /// Any other ASCII symbol (`@`, `<`, `+`, '`' ...); the parser skips
    /// statements containing these.
    Symbol,
    /// End of file
    Eof,
}

/// Lexer for tokenizing HDL input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input, ending with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;

        let start_line = self.line;
        let start_column = self.column;
        let make = |kind: TokenKind, text: String| Token {
            kind,
            text,
            line: start_line,
            column: start_column,
        };

        let ch = match self.chars.peek().copied() {
            Some(ch) => ch,
            None => return Ok(make(TokenKind::Eof, String::new())),
        };

        let token = match ch {
            '(' | ')' | '[' | ']' | ',' | ';' | ':' | '=' | '&' | '|' => {
                self.advance();
                let kind = match ch {
                    '(' => TokenKind::OpenParen,
                    ')' => TokenKind::CloseParen,
                    '[' => TokenKind::OpenBracket,
                    ']' => TokenKind::CloseBracket,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    ':' => TokenKind::Colon,
                    '=' => TokenKind::Equals,
                    '&' => TokenKind::And,
                    _ => TokenKind::Or,
                };
                make(kind, ch.to_string())
            }
            '~' | '^' => {
                self.advance();
                let other = if ch == '~' { '^' } else { '~' };
                if self.chars.peek() == Some(&other) {
                    self.advance();
                    make(TokenKind::Xnor, format!("{}{}", ch, other))
                } else if ch == '~' {
                    make(TokenKind::Not, "~".to_string())
                } else {
                    make(TokenKind::Xor, "^".to_string())
                }
            }
            '0'..='9' | '\'' => make(TokenKind::Number, self.read_number()),
            _ if ch.is_ascii_alphabetic() || ch == '_' || ch == '\\' => {
                make(TokenKind::Identifier, self.read_identifier())
            }
            _ if ch.is_ascii_graphic() => {
                self.advance();
                make(TokenKind::Symbol, ch.to_string())
            }
            _ => {
                return Err(LogicError::lexer(
                    start_line,
                    start_column,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        Ok(token)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_whitespace() {
                self.advance();
                continue;
            }
            if ch != '/' {
                break;
            }

            let mut ahead = self.chars.clone();
            ahead.next();
            match ahead.peek() {
                Some('/') => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    self.advance();
                    let mut prev = '\0';
                    loop {
                        match self.advance() {
                            Some('/') if prev == '*' => break,
                            Some(c) => prev = c,
                            None => {
                                return Err(LogicError::lexer(line, column, "unterminated block comment"));
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        // Escaped identifiers run to the next whitespace.
        if self.chars.peek() == Some(&'\\') {
            self.advance();
            while let Some(&ch) = self.chars.peek() {
                if ch.is_ascii_whitespace() {
                    break;
                }
                text.push(ch);
                self.advance();
            }
            return text;
        }
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    /// Decimal integers and sized/based literals such as `1'b0` or `'1`.
    fn read_number(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if self.chars.peek() == Some(&'\'') {
            text.push('\'');
            self.advance();
            while let Some(&ch) = self.chars.peek() {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        text
    }
}

/// Value of a single-bit literal: `0`, `1`, `1'b0`, `1'b1`, `'0`, `'1`.
/// Anything wider or non-binary yields `None`.
pub fn parse_bit(text: &str) -> Option<bool> {
    let digits = match text.split_once('\'') {
        Some((width, rest)) => {
            if !(width.is_empty() || width == "1") {
                return None;
            }
            let mut chars = rest.chars();
            match chars.clone().next() {
                Some('b' | 'B' | 'd' | 'D' | 'h' | 'H' | 'o' | 'O') => {
                    chars.next();
                    chars.as_str()
                }
                _ => rest,
            }
        }
        None => text,
    };
    match digits {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_assign_statement() {
        let tokens = Lexer::new("assign y = ~(a & b);").tokenize().unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["assign", "y", "=", "~", "(", "a", "&", "b", ")", ";", ""]);
        assert_eq!(tokens[3].kind, TokenKind::Not);
        assert_eq!(tokens[6].kind, TokenKind::And);
    }

    #[test]
    fn test_comments_and_positions() {
        let input = "// header\nmodule m /* inline\n comment */ (a);";
        let tokens = Lexer::new(input).tokenize().unwrap();
        assert!(tokens[0].is_word("module"));
        assert_eq!((tokens[0].line, tokens[0].column), (2, 1));
        assert_eq!(tokens[2].kind, TokenKind::OpenParen);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_xnor_operators() {
        assert_eq!(
            kinds("a ~^ b ^~ c ^ d"),
            vec![
                TokenKind::Identifier,
                TokenKind::Xnor,
                TokenKind::Identifier,
                TokenKind::Xnor,
                TokenKind::Identifier,
                TokenKind::Xor,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_literals() {
        let tokens = Lexer::new("1'b0 4'hF 1 '1").tokenize().unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["1'b0", "4'hF", "1", "'1", ""]);
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Number));

        assert_eq!(parse_bit("1'b0"), Some(false));
        assert_eq!(parse_bit("1'B1"), Some(true));
        assert_eq!(parse_bit("'1"), Some(true));
        assert_eq!(parse_bit("0"), Some(false));
        assert_eq!(parse_bit("4'hF"), None);
        assert_eq!(parse_bit("2"), None);
    }

    #[test]
    fn test_symbols_are_tokens() {
        assert_eq!(
            kinds("@ <"),
            vec![TokenKind::Symbol, TokenKind::Symbol, TokenKind::Eof]
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new("a /* never closed").tokenize(),
            Err(LogicError::LexerError { line: 1, column: 3, .. })
        ));
        assert!(matches!(
            Lexer::new("wire é;").tokenize(),
            Err(LogicError::LexerError { line: 1, column: 6, .. })
        ));
    }
}
