//! Lexer for query directive arguments.
//!
//! Tokens keep their raw source text: literal decoding (stripping quotes,
//! slashes and brackets) happens later, on the syntax tree.

use std::ops::Range;

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare identifier; keywords are told apart by the grammar.
    Identifier(String),
    Number(String),
    /// `"..."` or `'...'`, quotes included.
    String(String),
    /// `/.../`, slashes included.
    Regex(String),
    /// `[[...]]`, brackets included.
    PageRef(String),
    /// One of `=`, `!=`, `<`, `<=`, `>`, `>=`, `=~`, `!=~`.
    Operator(String),
    LeftBracket,
    RightBracket,
    Comma,
    Whitespace(String),
    Eof,
}

/// A token with the byte range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

pub struct Lexer<'a> {
    source: &'a str,
    input: Vec<(usize, char)>,
    position: usize,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let input: Vec<(usize, char)> = source.char_indices().collect();
        let current_char = input.first().map(|(_, c)| *c);

        Self {
            source,
            input,
            position: 0,
            current_char,
        }
    }

    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).map(|(_, c)| *c);
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).map(|(_, c)| *c)
    }

    /// Byte offset of the current character.
    fn offset(&self) -> usize {
        self.input
            .get(self.position)
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    fn raw_from(&self, start: usize) -> String {
        self.source[start..self.offset()].to_string()
    }

    pub fn tokenize(&mut self) -> QueryResult<Vec<Spanned>> {
        let mut tokens = Vec::new();

        loop {
            let start = self.offset();
            let token = self.next_token()?;
            let end = self.offset();
            let done = token == Token::Eof;
            tokens.push(Spanned {
                token,
                span: start..end,
            });
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> QueryResult<Token> {
        let start = self.offset();
        let Some(ch) = self.current_char else {
            return Ok(Token::Eof);
        };

        match ch {
            c if c.is_whitespace() => {
                while self.current_char.is_some_and(char::is_whitespace) {
                    self.advance();
                }
                Ok(Token::Whitespace(self.raw_from(start)))
            }
            '"' | '\'' => self.read_string(),
            '/' => self.read_regex(),
            '[' if self.peek_char() == Some('[') => self.read_page_ref(),
            '[' => {
                self.advance();
                Ok(Token::LeftBracket)
            }
            ']' => {
                self.advance();
                Ok(Token::RightBracket)
            }
            ',' => {
                self.advance();
                Ok(Token::Comma)
            }
            '=' | '!' | '<' | '>' => self.read_operator(),
            '-' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => Ok(self.read_number()),
            c if c.is_ascii_digit() => Ok(self.read_number()),
            c if c.is_alphabetic() || c == '_' || c == '$' => Ok(self.read_identifier()),
            other => Err(QueryError::parse_at(
                start,
                format!("Unexpected character '{}'", other),
            )),
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.offset();
        if self.current_char == Some('-') {
            self.advance();
        }

        let mut has_dot = false;
        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !has_dot && self.peek_char().is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(self.raw_from(start))
    }

    fn read_string(&mut self) -> QueryResult<Token> {
        let start = self.offset();
        let quote = self.current_char;
        self.advance(); // skip opening quote

        while let Some(ch) = self.current_char {
            if Some(ch) == quote {
                self.advance(); // skip closing quote
                return Ok(Token::String(self.raw_from(start)));
            } else if ch == '\\' {
                self.advance();
                if self.current_char.is_some() {
                    self.advance();
                }
            } else {
                self.advance();
            }
        }

        Err(QueryError::parse_at(start, "Unterminated string"))
    }

    fn read_regex(&mut self) -> QueryResult<Token> {
        let start = self.offset();
        self.advance(); // skip opening slash

        while let Some(ch) = self.current_char {
            match ch {
                '/' => {
                    self.advance();
                    return Ok(Token::Regex(self.raw_from(start)));
                }
                '\\' => {
                    self.advance();
                    if self.current_char.is_some() {
                        self.advance();
                    }
                }
                '\n' => break,
                _ => self.advance(),
            }
        }

        Err(QueryError::parse_at(start, "Unterminated regex"))
    }

    fn read_page_ref(&mut self) -> QueryResult<Token> {
        let start = self.offset();
        self.advance(); // [
        self.advance(); // [

        while let Some(ch) = self.current_char {
            if ch == ']' && self.peek_char() == Some(']') {
                self.advance();
                self.advance();
                return Ok(Token::PageRef(self.raw_from(start)));
            }
            if ch == '\n' {
                break;
            }
            self.advance();
        }

        Err(QueryError::parse_at(start, "Unterminated page reference"))
    }

    fn read_operator(&mut self) -> QueryResult<Token> {
        let start = self.offset();
        let first = self.current_char;
        self.advance();

        match (first, self.current_char) {
            (Some('='), Some('~')) => self.advance(),
            (Some('!'), Some('=')) => {
                self.advance();
                if self.current_char == Some('~') {
                    self.advance();
                }
            }
            (Some('<') | Some('>'), Some('=')) => self.advance(),
            (Some('!'), _) => {
                return Err(QueryError::parse_at(start, "Expected '=' after '!'"));
            }
            _ => {}
        }

        Ok(Token::Operator(self.raw_from(start)))
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.offset();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || matches!(ch, '_' | '$' | '-' | '.') {
                self.advance();
            } else {
                break;
            }
        }

        Token::Identifier(self.raw_from(start))
    }
}

/// Tokenize `source`, ending with [`Token::Eof`].
pub fn tokenize(source: &str) -> QueryResult<Vec<Spanned>> {
    Lexer::new(source).tokenize()
}
