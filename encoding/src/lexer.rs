//! `TypeLexer`: tokenizes a type descriptor string such as
//! `Array(Nullable(Tuple(id UInt32, name String)))` ahead of the
//! recursive-descent `TypeParser`.

use chfx_core::error::ParseErrorSnafu;
use chfx_core::Result;

/// A single lexical token, paired with the byte offset (into the type
/// string) at which it starts, used for `ParseError{position, ...}`
/// reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    LParen,
    RParen,
    Comma,
    Equals,
    Number(i64),
    Str(String),
}

/// Scans `src` into a flat token stream. The parser consumes this by
/// index rather than re-invoking the lexer incrementally, which keeps the
/// (small, recursive-descent) grammar in `parser.rs` free of lexer state.
pub fn tokenize(src: &str) -> Result<Vec<(Token, usize)>> {
    let mut lexer = Lexer { src, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn next_token(&mut self) -> Result<Option<(Token, usize)>> {
        self.skip_whitespace();
        let start = self.pos;
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(None),
        };
        let token = match c {
            '(' => {
                self.bump();
                Token::LParen
            }
            ')' => {
                self.bump();
                Token::RParen
            }
            ',' => {
                self.bump();
                Token::Comma
            }
            '=' => {
                self.bump();
                Token::Equals
            }
            '\'' => self.lex_string(start)?,
            '`' => self.lex_backtick_identifier(start)?,
            c if c == '-' || c.is_ascii_digit() => self.lex_number(),
            c if c.is_alphabetic() || c == '_' => self.lex_identifier(),
            other => {
                return ParseErrorSnafu {
                    position: start,
                    message: format!("unexpected character '{other}'"),
                }
                .fail()
            }
        };
        Ok(Some((token, start)))
    }

    fn lex_identifier(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        Token::Identifier(self.src[start..self.pos].to_string())
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        // Guaranteed to parse: we only consumed an optional '-' plus digits.
        Token::Number(text.parse().unwrap_or(0))
    }

    fn lex_string(&mut self, start: usize) -> Result<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return ParseErrorSnafu {
                        position: start,
                        message: "unterminated string literal".to_string(),
                    }
                    .fail()
                }
                Some('\'') => break,
                Some('\\') => match self.bump() {
                    Some('\'') => value.push('\''),
                    Some('\\') => value.push('\\'),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                    None => {
                        return ParseErrorSnafu {
                            position: start,
                            message: "unterminated string literal".to_string(),
                        }
                        .fail()
                    }
                },
                Some(other) => value.push(other),
            }
        }
        Ok(Token::Str(value))
    }

    fn lex_backtick_identifier(&mut self, start: usize) -> Result<Token> {
        self.bump(); // opening backtick
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return ParseErrorSnafu {
                        position: start,
                        message: "unterminated back-ticked identifier".to_string(),
                    }
                    .fail()
                }
                Some('`') => break,
                Some('\\') if self.peek_char() == Some('`') => {
                    self.bump();
                    value.push('`');
                }
                Some(other) => value.push(other),
            }
        }
        Ok(Token::Identifier(value))
    }
}
