//! The state shared by a sequence of host operations.

use core::fmt;

use crate::{
    Error, Registry, Source,
    decode::{Callbacks, Decoder, NoCallbacks},
    descriptor::{DescriptorCache, parse_fields, parse_name},
    value::{FromRecord, Record, Value},
};

/// The active source, declared structs, parsed descriptors and callbacks.
///
/// At most one source is active. Opening or installing another releases the
/// previous one. Failed operations leave every part of the session as it was.
pub struct Session {
    source: Option<Source>,
    registry: Registry,
    cache: DescriptorCache,
    callbacks: Box<dyn Callbacks>,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_callbacks(NoCallbacks)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("source", &self.source)
            .field("registry", &self.registry)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callbacks(callbacks: impl Callbacks + 'static) -> Self {
        Self {
            source: None,
            registry: Registry::new(),
            cache: DescriptorCache::new(),
            callbacks: Box::new(callbacks),
        }
    }

    /// Replace the functions `@name` items call.
    pub fn set_callbacks(&mut self, callbacks: impl Callbacks + 'static) {
        self.callbacks = Box::new(callbacks);
    }

    /// Open a source from a configuration string and make it active.
    ///
    /// On failure the previously active source remains active.
    ///
    /// # Safety
    ///
    /// See [`Source::open`].
    pub unsafe fn open(&mut self, config: &str) -> Result<(), Error> {
        let source = unsafe { Source::open(config)? };
        self.install(source);
        Ok(())
    }

    /// Make a source active, releasing the previous one.
    pub fn install(&mut self, source: Source) {
        self.source = Some(source);
    }

    /// Deactivate the active source and hand it back.
    pub fn close(&mut self) -> Option<Source> {
        self.source.take()
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    fn active(&mut self) -> Result<&mut Source, Error> {
        self.source.as_mut().ok_or(Error::NoSource)
    }

    /// Decode a read descriptor at the cursor.
    ///
    /// Returns one value per non-void item. The cursor advances past
    /// everything read, including skipped regions.
    pub fn read(&mut self, descriptor: &str) -> Result<Vec<Value>, Error> {
        let source = self.source.as_mut().ok_or(Error::NoSource)?;
        let items = self.cache.parse(descriptor)?;

        Decoder::new(source, &self.registry, &mut *self.callbacks).items(&items)
    }

    /// Decode one instance of a declared struct at the cursor.
    pub fn read_record(&mut self, name: &str) -> Result<Record, Error> {
        let source = self.source.as_mut().ok_or(Error::NoSource)?;

        Decoder::new(source, &self.registry, &mut *self.callbacks).record(name)
    }

    /// Decode one instance of a declared struct into a Rust type.
    ///
    /// If decoding or the conversion fails, the cursor stays where it was.
    pub fn read_as<T: FromRecord>(&mut self, name: &str) -> Result<T, Error> {
        let start = self.active()?.pos();
        let record = self.read_record(name)?;

        T::from_record(&record).inspect_err(|_| {
            if let Some(source) = &mut self.source {
                source.rewind(start);
            }
        })
    }

    /// Declare a struct from a field descriptor such as `u32:id str#8:tag`.
    pub fn declare(&mut self, name: &str, fields: &str) -> Result<(), Error> {
        let name = parse_name(name)?;
        let fields = parse_fields(fields)?;

        self.registry.declare(name, fields)
    }

    /// Render a declared struct as numbered fields.
    pub fn show(&self, name: &str) -> Result<String, Error> {
        self.registry.describe(name)
    }

    /// Discard every declared struct.
    pub fn reset_structs(&mut self) {
        self.registry.clear();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn set_pos(&mut self, pos: usize) -> Result<(), Error> {
        self.active()?.set_pos(pos)
    }

    /// Search the active source from the cursor. See [`Source::find`].
    pub fn find(&mut self, needle: &[u8], max_offset: usize) -> Result<Option<usize>, Error> {
        Ok(self.active()?.find(needle, max_offset))
    }

    /// Cursor of the active source.
    pub fn pos(&self) -> Option<usize> {
        self.source.as_ref().map(Source::pos)
    }

    /// Name of the active source.
    pub fn path(&self) -> Option<&str> {
        self.source.as_ref().map(Source::name)
    }

    /// Size of the active source.
    pub fn size(&self) -> Option<usize> {
        self.source.as_ref().map(Source::size)
    }
}
