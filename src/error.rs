//! The error type shared by every layer of the crate.

use std::io;

use thiserror::Error;

/// Errors occurring while parsing descriptors, declaring structs, opening
/// sources, or decoding data.
///
/// Every error aborts the operation in progress without side effects. The
/// active source, the struct registry and the descriptor cache remain usable.
#[derive(Debug, Error)]
pub enum Error {
    /// A descriptor contains a character sequence that is not a token.
    #[error("Unexpected input `{0}` in descriptor.")]
    UnknownToken(String),
    /// A fixed length or array size suffix is not an unsigned decimal.
    #[error("Invalid fixed length or array size value `{0}`.")]
    InvalidNumber(String),
    /// A token arrived in a parser state that does not permit it.
    #[error("Unexpected `{0}` in descriptor.")]
    UnexpectedToken(String),
    /// The descriptor ended, or a new item began, before the current
    /// declaration was finished.
    #[error("Declaration not finished.")]
    Unfinished,
    /// A `void` item was given no length.
    #[error("A `void` item requires an explicit length.")]
    VoidWithoutLength,
    /// A struct name is not a single identifier.
    #[error("Invalid struct name `{0}`.")]
    InvalidName(String),
    /// A declaration names two fields alike.
    #[error("Field `{0}` is declared more than once.")]
    DuplicateField(String),

    /// A struct is not registered.
    #[error("Struct `{0}` is not found.")]
    StructNotFound(String),
    /// A struct embeds itself directly.
    #[error("Struct `{0}` references itself.")]
    SelfReference(String),
    /// A struct embeds itself through other structs.
    #[error("Struct `{name}` is circular through `{via}`.")]
    CircularDefinition { name: String, via: String },
    /// A struct embeds a struct that has not been declared.
    #[error("Struct `{name}` references missing struct `{missing}`.")]
    MissingDefinition { name: String, missing: String },

    /// Fewer bytes remain than a read requires.
    #[error("Insufficient data in source: {needed} bytes needed at {pos}, {size} available.")]
    InsufficientData { pos: usize, needed: usize, size: usize },
    /// A null-terminated string runs past the end of the source.
    #[error("String at {0} has no terminator.")]
    MissingTerminator(usize),
    /// A cursor position lies outside the source.
    #[error("Position {pos} is outside of the source ({size} bytes).")]
    InvalidPosition { pos: usize, size: usize },
    /// No source is active.
    #[error("Source is not set.")]
    NoSource,
    /// An array repeats an item that consumes no data more often than
    /// [`MAX_EMPTY_REPEAT`](crate::MAX_EMPTY_REPEAT) allows.
    #[error("`{item}` consumes no data and cannot be repeated {count} times.")]
    EmptyRepeat { item: String, count: usize },

    /// A configuration string could not be interpreted.
    #[error("Invalid source configuration `{0}`.")]
    InvalidConfig(String),
    /// A configuration string names the test fixture namespace.
    #[error("Source `{0}` belongs to the reserved test namespace.")]
    ReservedNamespace(String),
    /// A path exists but is not a regular file.
    #[error("Source `{0}` is neither a regular file nor shared memory.")]
    UnsupportedSource(String),
    /// The operating system refused to open, map or attach a backing store.
    #[error("Failed to {action} `{name}`: {source}.")]
    Os {
        action: &'static str,
        name: String,
        #[source]
        source: io::Error,
    },

    /// A function-reference field names a callback that does not exist.
    #[error("Function `{0}` is not defined.")]
    CallbackNotDefined(String),
    /// A callback produced other than exactly one value.
    #[error("Function `{name}` returned {count} results, expected one.")]
    CallbackArity { name: String, count: usize },

    /// A decoded value does not have the shape a typed extraction expects.
    #[error("Expected {expected}, found {found}.")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    /// A decoded record lacks a field a typed extraction expects.
    #[error("Record has no field `{0}`.")]
    MissingField(String),
}

impl Error {
    pub(crate) fn os(action: &'static str, name: &str) -> Self {
        Self::Os {
            action,
            name: name.to_string(),
            source: io::Error::last_os_error(),
        }
    }
}
