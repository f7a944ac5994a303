//! Decoded values and typed extraction.

use core::fmt;

use crate::Error;

/// A value produced by decoding one descriptor item.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Any integer type, widened.
    Int(i64),
    /// Any floating point type, widened.
    Float(f64),
    /// A narrow or wide string, as the bytes read without its terminator.
    Str(Vec<u8>),
    /// The values of an item with an array size other than one.
    Array(Vec<Value>),
    /// A decoded struct.
    Record(Record),
}

impl Value {
    /// A short description of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to a Rust type.
    pub fn to<T: FromValue>(&self) -> Result<T, Error> {
        T::from_value(self)
    }

    fn unexpected(&self, expected: &'static str) -> Error {
        Error::UnexpectedValue {
            expected,
            found: self.kind(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.as_bytes().to_vec())
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

/// Renders strings lossily as UTF-8, arrays as `[a, b]` and records as
/// `{name: value, ...}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{:?}", String::from_utf8_lossy(v)),
            Value::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Value::Record(record) => write!(f, "{record}"),
        }
    }
}

/// The named values of a decoded struct, in declaration order.
///
/// `void` fields produce no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// The value of the first field with the given name.
    ///
    /// Declarations reject repeated field names, so decoded records hold
    /// each name at most once.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Extract a field as a Rust type.
    ///
    /// A missing field is an error unless `T` accepts absence, as `Option`
    /// does.
    pub fn field<T: FromValue>(&self, name: &str) -> Result<T, Error> {
        match self.get(name) {
            Some(value) => T::from_value(value),
            None => T::from_missing(name),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

/// Conversion from a decoded value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, Error>;

    /// The result for a record field that is absent.
    fn from_missing(name: &str) -> Result<Self, Error> {
        Err(Error::MissingField(name.to_string()))
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, Error> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, Error> {
        value.as_int().ok_or_else(|| value.unexpected("integer"))
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, Error> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| Error::UnexpectedValue {
                        expected: stringify!($ty),
                        found: "integer out of range",
                    })
                }
            }
        )*
    };
}

narrow_int!(u8, u16, u32, u64, i16, i32);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, Error> {
        value.as_float().ok_or_else(|| value.unexpected("float"))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, Error> {
        // Values decoded from `f32` items round-trip exactly.
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, Error> {
        let bytes = value.as_bytes().ok_or_else(|| value.unexpected("string"))?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::UnexpectedValue {
            expected: "UTF-8 string",
            found: "invalid UTF-8",
        })
    }
}

/// Arrays convert element-wise. Strings convert byte-wise, so `Vec<u8>`
/// receives the raw bytes of a string.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, Error> {
        match value {
            Value::Array(values) => values.iter().map(T::from_value).collect(),
            Value::Str(bytes) => bytes
                .iter()
                .map(|&b| T::from_value(&Value::Int(b.into())))
                .collect(),
            other => Err(other.unexpected("array")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, Error> {
        T::from_value(value).map(Some)
    }

    fn from_missing(_: &str) -> Result<Self, Error> {
        Ok(None)
    }
}

impl FromValue for Record {
    fn from_value(value: &Value) -> Result<Self, Error> {
        value
            .as_record()
            .cloned()
            .ok_or_else(|| value.unexpected("record"))
    }
}

/// Construct a Rust struct from a decoded record.
///
/// See the [`FromRecord`](macro@crate::FromRecord) derive macro for an
/// implementation that maps fields by name.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, Error>;
}
