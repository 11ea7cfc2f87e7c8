//! Lossless tokenizer: every byte of the input ends up either in a token's
//! text or in the trivia prefix of the token that follows it.

use crate::lang::ParseError;
use crate::tree::{LiteralKind, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexKind {
    /// Identifier or keyword
    Word,
    Literal(LiteralKind),
    Punct,
    /// End of input; its prefix holds the trailing trivia
    Eof,
}

#[derive(Debug, Clone)]
pub struct Lexeme {
    pub kind: LexKind,
    pub prefix: String,
    pub text: String,
    pub offset: usize,
}

impl Lexeme {
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == LexKind::Punct && self.text == text
    }

    pub fn is_word(&self) -> bool {
        self.kind == LexKind::Word
    }

    pub fn to_token(&self) -> Token {
        Token::new(self.prefix.clone(), self.text.clone(), self.offset)
    }
}

const OPERATORS: &[&str] = &[
    "...", "->", "::", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=",
];

/// Split source text into lexemes; the last one is always `Eof`
pub fn tokenize(source: &str) -> Result<Vec<Lexeme>, ParseError> {
    let mut lexer = Lexer { source, pos: 0 };
    let mut out = Vec::new();
    loop {
        let trivia_start = lexer.pos;
        lexer.skip_trivia()?;
        let prefix = source[trivia_start..lexer.pos].to_string();
        let start = lexer.pos;
        let Some(c) = lexer.peek() else {
            out.push(Lexeme {
                kind: LexKind::Eof,
                prefix,
                text: String::new(),
                offset: start,
            });
            return Ok(out);
        };

        let kind = if c.is_alphabetic() || c == '_' || c == '$' {
            lexer.eat_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
            match &source[start..lexer.pos] {
                "true" | "false" => LexKind::Literal(LiteralKind::Boolean),
                "null" => LexKind::Literal(LiteralKind::Null),
                _ => LexKind::Word,
            }
        } else if c.is_ascii_digit()
            || (c == '.' && lexer.peek_nth(1).is_some_and(|d| d.is_ascii_digit()))
        {
            lexer.number();
            LexKind::Literal(LiteralKind::Number)
        } else if c == '"' {
            lexer.string()?;
            LexKind::Literal(LiteralKind::String)
        } else if c == '\'' {
            lexer.quoted('\'')?;
            LexKind::Literal(LiteralKind::Char)
        } else {
            let rest = &source[start..];
            let len = OPERATORS
                .iter()
                .find(|op| rest.starts_with(**op))
                .map(|op| op.len())
                .unwrap_or(c.len_utf8());
            lexer.pos += len;
            LexKind::Punct
        };

        out.push(Lexeme {
            kind,
            prefix,
            text: source[start..lexer.pos].to_string(),
            offset: start,
        });
    }
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn rest(&self) -> &str {
        &self.source[self.pos..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, offset: usize, message: &str) -> ParseError {
        ParseError::at(self.source, offset, message)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                self.eat_while(|c| c != '\n');
            } else if rest.starts_with("/*") {
                let start = self.pos;
                match rest[2..].find("*/") {
                    Some(end) => self.pos += 2 + end + 2,
                    None => return Err(self.error(start, "unterminated comment")),
                }
            } else if self.peek().is_some_and(char::is_whitespace) {
                self.eat_while(char::is_whitespace);
            } else {
                return Ok(());
            }
        }
    }

    fn number(&mut self) {
        let hex = self.rest().starts_with("0x") || self.rest().starts_with("0X");
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                    self.pos += 1;
                    let exponent = if hex { matches!(c, 'p' | 'P') } else { matches!(c, 'e' | 'E') };
                    if exponent && matches!(self.peek(), Some('+') | Some('-')) {
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Result<(), ParseError> {
        if self.rest().starts_with("\"\"\"") {
            let start = self.pos;
            self.pos += 3;
            loop {
                if self.rest().starts_with("\"\"\"") {
                    self.pos += 3;
                    return Ok(());
                }
                match self.bump() {
                    Some('\\') => {
                        self.bump();
                    }
                    Some(_) => {}
                    None => return Err(self.error(start, "unterminated text block")),
                }
            }
        }
        self.quoted('"')
    }

    fn quoted(&mut self, quote: char) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        loop {
            match self.bump() {
                Some('\\') => {
                    if self.bump().is_none() {
                        break;
                    }
                }
                Some(c) if c == quote => return Ok(()),
                Some('\n') | None => break,
                Some(_) => {}
            }
        }
        let what = if quote == '"' { "string" } else { "character" };
        Err(self.error(start, &format!("unterminated {} literal", what)))
    }
}
