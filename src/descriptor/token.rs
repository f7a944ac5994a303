//! Lexer for descriptor strings.

use core::fmt;

use super::ItemType;
use crate::Error;

/// A lexical unit of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// A built-in type keyword.
    Type(ItemType),
    /// A bare identifier: a struct reference, or a field name after `:`.
    Ident(&'a str),
    /// `#N`
    FixedLength(usize),
    /// `*N`
    ArraySize(usize),
    /// `@name`
    Function(&'a str),
    /// `:`
    Colon,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(ty) => write!(f, "{ty}"),
            Token::Ident(name) => f.write_str(name),
            Token::FixedLength(n) => write!(f, "#{n}"),
            Token::ArraySize(n) => write!(f, "*{n}"),
            Token::Function(name) => write!(f, "@{name}"),
            Token::Colon => f.write_str(":"),
        }
    }
}

/// Iterator over the tokens of a descriptor.
///
/// Items are separated by whitespace; suffixes and the colon attach directly
/// to the preceding word (`str#8*2:name`). Iteration stops after the first
/// error.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    rest: &'a str,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: text,
            failed: false,
        }
    }

    /// Split the longest prefix of `rest` whose characters satisfy `f`.
    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(|c| !f(c)).unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        head
    }

    fn number(&mut self) -> Result<usize, Error> {
        let digits = self.take_while(is_word);
        digits
            .parse()
            .map_err(|_| Error::InvalidNumber(digits.to_string()))
    }

    fn identifier(&mut self) -> Option<&'a str> {
        if self.rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            Some(self.take_while(is_word))
        } else {
            None
        }
    }

    fn unknown(&mut self) -> Error {
        Error::UnknownToken(self.take_while(|c| !c.is_whitespace()).to_string())
    }

    fn lex(&mut self, c: char) -> Result<Token<'a>, Error> {
        let after = &self.rest[c.len_utf8()..];

        let token = match c {
            ':' => {
                self.rest = after;
                Token::Colon
            }
            '#' => {
                self.rest = after;
                Token::FixedLength(self.number()?)
            }
            '*' => {
                self.rest = after;
                Token::ArraySize(self.number()?)
            }
            '@' => {
                self.rest = after;
                match self.identifier() {
                    Some(name) => Token::Function(name),
                    None => return Err(self.unknown()),
                }
            }
            _ => match self.identifier() {
                Some(word) => match ItemType::from_keyword(word) {
                    Some(ty) => Token::Type(ty),
                    None => Token::Ident(word),
                },
                None => return Err(self.unknown()),
            },
        };

        Ok(token)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        self.rest = self.rest.trim_start();
        let c = self.rest.chars().next()?;

        let token = self.lex(c);
        self.failed = token.is_err();
        Some(token)
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
