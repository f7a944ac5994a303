//! Bounds-checked reads over a backing byte region.
//!
//! A [`Source`] pairs one backing region with a read cursor. Four kinds of
//! region are supported, differing only in how they are acquired and
//! released:
//!
//! | Kind                 | Configuration string      | Released by    |
//! |----------------------|---------------------------|----------------|
//! | in-process buffer    | `malloc:<pointer> <size>` | the caller     |
//! | file                 | path to a regular file    | unmap, close   |
//! | POSIX shared memory  | object name               | unmap, close   |
//! | SysV shared memory   | `sysvshmem:<id>`          | detach         |
//!
//! Every read either advances the cursor by exactly the bytes it consumed or
//! fails without moving it.

use std::{ffi::CString, fs::File, io, os::fd::FromRawFd, path::Path};

use log::{debug, trace};
use zerocopy::FromBytes;

use crate::{
    Error,
    descriptor::{Float, Int},
};

mod backing;
mod config;

use backing::{Attachment, Backing};
pub use config::{PREFIX_MALLOC, PREFIX_SYSV_SHMEM, PREFIX_TEST, SourceConfig};

/// A byte region with a read cursor.
#[derive(Debug)]
pub struct Source {
    name: String,
    backing: Backing,
    pos: usize,
}

impl Source {
    /// Open a source described by a configuration string.
    ///
    /// See [`SourceConfig`] for the accepted forms. The `test:` namespace is
    /// reserved for fixtures supplied by the host and is rejected here.
    ///
    /// # Safety
    ///
    /// A `malloc:` configuration must name a pointer valid for reads of the
    /// given size for as long as the returned source lives.
    pub unsafe fn open(config: &str) -> Result<Self, Error> {
        let source = match config.parse::<SourceConfig>()? {
            SourceConfig::Heap { ptr, size } => unsafe {
                Self::from_raw_parts(config, ptr as *const u8, size)
            },
            SourceConfig::SysV { id } => Self::sysv_shm(id)?,
            SourceConfig::Test(_) => Err(Error::ReservedNamespace(config.to_string()))?,
            SourceConfig::Path(path) => match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => Self::file(&path)?,
                Ok(_) => Err(Error::UnsupportedSource(config.to_string()))?,
                Err(err) if err.kind() == io::ErrorKind::NotFound => Self::posix_shm(config)?,
                Err(source) => Err(Error::Os {
                    action: "stat",
                    name: config.to_string(),
                    source,
                })?,
            },
        };

        Ok(source)
    }

    /// A source over an owned in-process buffer.
    pub fn from_vec(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name.into(), Backing::Owned(bytes))
    }

    /// A source over a caller-owned in-process buffer.
    ///
    /// # Safety
    ///
    /// Unless `len` is zero, `ptr` must be valid for reads of `len` bytes for
    /// as long as the returned source lives.
    pub unsafe fn from_raw_parts(name: impl Into<String>, ptr: *const u8, len: usize) -> Self {
        Self::new(name.into(), Backing::Borrowed { ptr, len })
    }

    /// Map a regular file read-only.
    pub fn file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let file = File::open(path).map_err(|source| Error::Os {
            action: "open",
            name: name.clone(),
            source,
        })?;
        let mapping = backing::map(&file, &name)?;

        Ok(Self::new(name, Backing::Mapped(mapping)))
    }

    /// Map a POSIX shared-memory object read-only.
    pub fn posix_shm(name: &str) -> Result<Self, Error> {
        let c_name = CString::new(name).map_err(|_| Error::InvalidConfig(name.to_string()))?;

        // SAFETY: `c_name` is a valid C string for the duration of the call.
        let fd = unsafe { libc::shm_open(c_name.as_ptr(), libc::O_RDONLY, 0) };
        if fd < 0 {
            Err(Error::os("open shared memory", name))?;
        }

        // SAFETY: `fd` was just opened and is owned by nothing else.
        let file = unsafe { File::from_raw_fd(fd) };
        let mapping = backing::map(&file, name)?;

        Ok(Self::new(name.to_string(), Backing::Mapped(mapping)))
    }

    /// Attach to a SysV shared-memory segment read-only.
    pub fn sysv_shm(id: i32) -> Result<Self, Error> {
        let name = format!("{PREFIX_SYSV_SHMEM}{id}");
        let attachment = Attachment::new(id, &name)?;

        Ok(Self::new(name, Backing::Attached(attachment)))
    }

    fn new(name: String, backing: Backing) -> Self {
        debug!(
            "opened source `{name}` ({} bytes)",
            backing.as_bytes().len()
        );

        Self {
            name,
            backing,
            pos: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.bytes().len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The whole backing region.
    pub fn bytes(&self) -> &[u8] {
        self.backing.as_bytes()
    }

    /// The bytes from the cursor to the end of the region.
    pub fn remaining(&self) -> &[u8] {
        &self.bytes()[self.pos..]
    }

    /// Move the cursor to an absolute position, at most the size.
    pub fn set_pos(&mut self, pos: usize) -> Result<(), Error> {
        let size = self.size();
        if pos > size {
            Err(Error::InvalidPosition { pos, size })?;
        }

        self.pos = pos;
        Ok(())
    }

    /// Return the cursor to a position it previously held.
    pub(crate) fn rewind(&mut self, pos: usize) {
        debug_assert!(pos <= self.size());
        self.pos = pos;
    }

    /// Advance the cursor over `len` bytes without reading them.
    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.span(len)?;
        self.pos += len;
        Ok(())
    }

    fn insufficient(&self, needed: usize) -> Error {
        Error::InsufficientData {
            pos: self.pos,
            needed,
            size: self.size(),
        }
    }

    fn span(&self, len: usize) -> Result<&[u8], Error> {
        self.remaining()
            .get(..len)
            .ok_or_else(|| self.insufficient(len))
    }

    fn scalar<T: FromBytes>(&mut self) -> Result<T, Error> {
        let needed = size_of::<T>();
        let (value, _) =
            T::read_from_prefix(self.remaining()).map_err(|_| self.insufficient(needed))?;

        self.pos += needed;
        Ok(value)
    }

    /// Read an integer in native byte order.
    pub fn read_int(&mut self, ty: Int) -> Result<i64, Error> {
        Ok(match ty {
            Int::U8 => self.scalar::<u8>()?.into(),
            Int::U16 => self.scalar::<u16>()?.into(),
            Int::U32 => self.scalar::<u32>()?.into(),
            Int::I16 => self.scalar::<i16>()?.into(),
            Int::I32 => self.scalar::<i32>()?.into(),
            Int::I64 => self.scalar::<i64>()?,
        })
    }

    /// Read a floating point number in native byte order.
    pub fn read_float(&mut self, ty: Float) -> Result<f64, Error> {
        Ok(match ty {
            Float::F32 => self.scalar::<f32>()?.into(),
            Float::F64 => self.scalar::<f64>()?,
        })
    }

    /// Read a narrow string.
    ///
    /// With `len == 0` the string ends at the first null byte, which is
    /// consumed but not returned. Otherwise exactly `len` bytes are consumed
    /// and the returned string stops at the first null byte among them.
    pub fn read_str(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let (text, consumed) = if len == 0 {
            let rest = self.remaining();
            let end = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or(Error::MissingTerminator(self.pos))?;
            (&rest[..end], end + 1)
        } else {
            let span = self.span(len)?;
            let end = span.iter().position(|&b| b == 0).unwrap_or(len);
            (&span[..end], len)
        };

        let text = text.to_vec();
        self.pos += consumed;
        trace!("read {} string bytes, consumed {consumed}", text.len());

        Ok(text)
    }

    /// Read a wide string of 2-byte units, returned as raw bytes.
    ///
    /// A leading byte-order mark (lead byte `0xFF` or `0xFE`) is skipped.
    /// With `len == 0` the string ends at the first all-zero unit, which is
    /// consumed but not returned. Otherwise exactly `len` units, including
    /// any byte-order mark, are consumed and the returned string stops at
    /// the first all-zero unit among them.
    pub fn read_wstr(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let rest = self.remaining();
        let bom = match rest {
            [0xFF | 0xFE, _, ..] => 2,
            _ => 0,
        };

        let (text, consumed) = if len == 0 {
            let body = &rest[bom..];
            let end = terminator(body).ok_or(Error::MissingTerminator(self.pos))?;
            (&body[..end], bom + end + 2)
        } else {
            let bytes = len
                .checked_mul(2)
                .ok_or_else(|| self.insufficient(usize::MAX))?;
            let body = &self.span(bytes)?[bom..];
            let end = terminator(body).unwrap_or(body.len());
            (&body[..end], bytes)
        };

        let text = text.to_vec();
        self.pos += consumed;
        trace!("read {} wide string bytes, consumed {consumed}", text.len());

        Ok(text)
    }

    /// Find the first occurrence of `needle` at or after the cursor that
    /// ends no later than `max_offset`. The cursor does not move.
    pub fn find(&self, needle: &[u8], max_offset: usize) -> Option<usize> {
        let end = max_offset.min(self.size());
        let window = self.bytes().get(self.pos..end)?;

        if needle.is_empty() || needle.len() > window.len() {
            return None;
        }

        window
            .windows(needle.len())
            .position(|w| w == needle)
            .map(|i| self.pos + i)
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        debug!("released source `{}`", self.name);
    }
}

/// Byte offset of the first all-zero 2-byte unit.
fn terminator(bytes: &[u8]) -> Option<usize> {
    bytes
        .chunks_exact(2)
        .position(|unit| unit == [0, 0])
        .map(|i| i * 2)
}
