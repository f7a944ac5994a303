//! The descriptor mini-language.
//!
//! A descriptor is a whitespace-separated list of items. Each item names a
//! type, optionally followed by a fixed length (`#N`, strings and `void`
//! only) and an array size (`*N`):
//!
//! ```text
//! u8 u16*4 str#16 wstr void#8*2 @checksum header
//! ```
//!
//! Bare identifiers reference structs previously declared in a
//! [`Registry`](crate::Registry), and `@name` references a callback supplied
//! by the host. Struct declarations additionally name each field after a
//! colon (`u32:length str#8:tag`); a `void` field is anonymous.
//!
//! Two state machines consume the token stream: [`parse_read`] produces the
//! unnamed items of an ad-hoc read, and [`parse_fields`] the named fields of
//! a struct declaration.

use core::fmt;

use crate::Error;

mod cache;
mod fields;
mod read;
mod token;

pub use cache::DescriptorCache;
pub use token::{Token, Tokenizer};

/// Fixed-width integer types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Int {
    U8,
    U16,
    U32,
    I16,
    I32,
    I64,
}

impl Int {
    /// Width of the type in bytes.
    pub fn width(self) -> usize {
        match self {
            Int::U8 => 1,
            Int::U16 | Int::I16 => 2,
            Int::U32 | Int::I32 => 4,
            Int::I64 => 8,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Int::U8 => "u8",
            Int::U16 => "u16",
            Int::U32 => "u32",
            Int::I16 => "i16",
            Int::I32 => "i32",
            Int::I64 => "i64",
        }
    }
}

/// Floating point types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Float {
    F32,
    F64,
}

impl Float {
    /// Width of the type in bytes.
    pub fn width(self) -> usize {
        match self {
            Float::F32 => 4,
            Float::F64 => 8,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Float::F32 => "f32",
            Float::F64 => "f64",
        }
    }
}

/// The type of a descriptor item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    Int(Int),
    Float(Float),
    /// Narrow string, fixed length or null-terminated.
    Str,
    /// Wide string of 2-byte units, fixed length or double-null-terminated.
    WStr,
    /// Skipped region, never surfaced as a value.
    Void,
    /// Value produced by the named host callback.
    Function(String),
    /// Nested record of the named struct.
    Custom(String),
}

impl ItemType {
    /// Look up a built-in type keyword.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "u8" => ItemType::Int(Int::U8),
            "u16" => ItemType::Int(Int::U16),
            "u32" => ItemType::Int(Int::U32),
            "i16" => ItemType::Int(Int::I16),
            "i32" => ItemType::Int(Int::I32),
            "i64" => ItemType::Int(Int::I64),
            "f32" => ItemType::Float(Float::F32),
            "f64" => ItemType::Float(Float::F64),
            "str" => ItemType::Str,
            "wstr" => ItemType::WStr,
            "void" => ItemType::Void,
            _ => return None,
        })
    }

    /// Whether a fixed length suffix may follow this type.
    pub fn takes_length(&self) -> bool {
        matches!(self, ItemType::Str | ItemType::WStr | ItemType::Void)
    }

    /// The struct this type embeds, if any.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            ItemType::Custom(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Int(t) => f.write_str(t.keyword()),
            ItemType::Float(t) => f.write_str(t.keyword()),
            ItemType::Str => f.write_str("str"),
            ItemType::WStr => f.write_str("wstr"),
            ItemType::Void => f.write_str("void"),
            ItemType::Function(name) => write!(f, "@{name}"),
            ItemType::Custom(name) => f.write_str(name),
        }
    }
}

/// One unit to decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataItem {
    pub ty: ItemType,
    /// Explicit byte length for `str` and `void`, unit count for `wstr`.
    /// Zero means the length is determined while reading.
    pub size: usize,
    /// Repeat count.
    pub count: usize,
}

impl DataItem {
    pub fn new(ty: ItemType) -> Self {
        Self {
            ty,
            size: 0,
            count: 1,
        }
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)?;
        if self.size != 0 {
            write!(f, "#{}", self.size)?;
        }
        if self.count != 1 {
            write!(f, "*{}", self.count)?;
        }
        Ok(())
    }
}

/// A named member of a struct declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub item: DataItem,
    /// Absent only for `void` fields.
    pub name: Option<String>,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.item)?;
        if let Some(name) = &self.name {
            write!(f, ":{name}")?;
        }
        Ok(())
    }
}

/// Parse the descriptor of an ad-hoc read into unnamed items.
pub fn parse_read(text: &str) -> Result<Vec<DataItem>, Error> {
    let mut parser = read::ReadParser::default();
    for token in Tokenizer::new(text) {
        parser.advance(token?)?;
    }
    parser.finish()
}

/// Parse a struct declaration into named fields.
pub fn parse_fields(text: &str) -> Result<Vec<Field>, Error> {
    let mut parser = fields::FieldsParser::default();
    for token in Tokenizer::new(text) {
        parser.advance(token?)?;
    }
    parser.finish()
}

/// Validate a struct name: exactly one identifier that is not a keyword.
pub fn parse_name(text: &str) -> Result<&str, Error> {
    let mut tokens = Tokenizer::new(text);
    match (tokens.next(), tokens.next()) {
        (Some(Ok(Token::Ident(name))), None) if name.len() == text.len() => Ok(name),
        _ => Err(Error::InvalidName(text.to_string())),
    }
}
