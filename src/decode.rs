//! Decoding descriptor items from a source.

use core::fmt;
use std::collections::HashMap;

use log::trace;

use crate::{
    Error, Registry, Source,
    descriptor::{DataItem, ItemType},
    value::{Record, Value},
};

/// Host-supplied functions for `@name` items.
pub trait Callbacks {
    /// Call the named function.
    ///
    /// Returns `None` when no function of that name exists. Decoding fails
    /// unless the function returns exactly one value.
    fn invoke(&mut self, name: &str) -> Option<Vec<Value>>;
}

/// Callbacks that reject every name as undefined.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallbacks;

impl Callbacks for NoCallbacks {
    fn invoke(&mut self, _: &str) -> Option<Vec<Value>> {
        None
    }
}

/// The most times an array may repeat an item that consumes no data, such as
/// a callback or an empty struct.
pub const MAX_EMPTY_REPEAT: usize = 1 << 16;

type Function = Box<dyn FnMut() -> Vec<Value>>;

/// Callbacks backed by named closures.
#[derive(Default)]
pub struct CallbackTable {
    functions: HashMap<String, Function>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function, replacing any earlier one of the same name.
    pub fn insert(&mut self, name: impl Into<String>, function: impl FnMut() -> Vec<Value> + 'static) {
        self.functions.insert(name.into(), Box::new(function));
    }

    /// Register a function returning a single value.
    pub fn with(mut self, name: impl Into<String>, mut function: impl FnMut() -> Value + 'static) -> Self {
        self.insert(name, move || vec![function()]);
        self
    }

    /// Unregister a function, returning whether one was registered.
    pub fn remove(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }
}

impl Callbacks for CallbackTable {
    fn invoke(&mut self, name: &str) -> Option<Vec<Value>> {
        self.functions.get_mut(name).map(|function| function())
    }
}

impl fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

/// Decodes items at a source's cursor.
///
/// Struct items resolve through the registry at the point they are read, and
/// `@name` items through the callbacks. When decoding fails, the cursor is
/// returned to where it was before the call.
pub struct Decoder<'a> {
    source: &'a mut Source,
    registry: &'a Registry,
    callbacks: &'a mut dyn Callbacks,
}

impl<'a> Decoder<'a> {
    pub fn new(
        source: &'a mut Source,
        registry: &'a Registry,
        callbacks: &'a mut dyn Callbacks,
    ) -> Self {
        Self {
            source,
            registry,
            callbacks,
        }
    }

    /// Decode a list of unnamed items, yielding one value per non-void item.
    pub fn items(&mut self, items: &[DataItem]) -> Result<Vec<Value>, Error> {
        self.restoring(|decoder| {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.extend(decoder.item(item)?);
            }
            Ok(values)
        })
    }

    /// Decode one instance of a registered struct.
    pub fn record(&mut self, name: &str) -> Result<Record, Error> {
        self.restoring(|decoder| decoder.fields(name))
    }

    fn restoring<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        let start = self.source.pos();
        let result = f(self);

        if result.is_err() {
            self.source.rewind(start);
        }

        result
    }

    fn fields(&mut self, name: &str) -> Result<Record, Error> {
        let fields = self.registry.lookup(name)?;

        let mut record = Record::new();
        for field in fields.iter() {
            let Some(value) = self.item(&field.item)? else {
                continue;
            };
            record.push(field.name.clone().unwrap_or_default(), value);
        }

        Ok(record)
    }

    fn item(&mut self, item: &DataItem) -> Result<Option<Value>, Error> {
        if item.ty == ItemType::Void {
            let len = item.size.checked_mul(item.count).ok_or(Error::InsufficientData {
                pos: self.source.pos(),
                needed: usize::MAX,
                size: self.source.size(),
            })?;
            trace!("skipping {len} bytes at {}", self.source.pos());
            self.source.skip(len)?;
            return Ok(None);
        }

        let value = if item.count == 1 {
            self.one(item)?
        } else {
            Value::Array(self.repeat(item)?)
        };

        Ok(Some(value))
    }

    fn repeat(&mut self, item: &DataItem) -> Result<Vec<Value>, Error> {
        let mut values = Vec::new();
        for _ in 0..item.count {
            let start = self.source.pos();
            values.push(self.one(item)?);

            // Every repetition consumes what the first one did.
            if values.len() == 1 && self.source.pos() == start && item.count > MAX_EMPTY_REPEAT {
                Err(Error::EmptyRepeat {
                    item: item.ty.to_string(),
                    count: item.count,
                })?;
            }
        }

        Ok(values)
    }

    fn one(&mut self, item: &DataItem) -> Result<Value, Error> {
        trace!("reading `{}` at {}", item.ty, self.source.pos());

        Ok(match &item.ty {
            ItemType::Int(ty) => Value::Int(self.source.read_int(*ty)?),
            ItemType::Float(ty) => Value::Float(self.source.read_float(*ty)?),
            ItemType::Str => Value::Str(self.source.read_str(item.size)?),
            ItemType::WStr => Value::Str(self.source.read_wstr(item.size)?),
            ItemType::Function(name) => self.call(name)?,
            ItemType::Custom(name) => Value::Record(self.fields(name)?),
            ItemType::Void => Err(Error::UnexpectedToken(item.ty.to_string()))?,
        })
    }

    fn call(&mut self, name: &str) -> Result<Value, Error> {
        let Some(mut results) = self.callbacks.invoke(name) else {
            Err(Error::CallbackNotDefined(name.to_string()))?
        };

        match (results.pop(), results.len()) {
            (Some(value), 0) => Ok(value),
            (last, rest) => Err(Error::CallbackArity {
                name: name.to_string(),
                count: rest + usize::from(last.is_some()),
            }),
        }
    }
}
