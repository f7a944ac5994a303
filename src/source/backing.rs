//! Ownership of the memory regions behind a source.
//!
//! Each variant acquires its region on construction and releases it on drop,
//! exactly once.

use std::{fs::File, ptr, slice};

use memmap2::Mmap;

use crate::Error;

/// A read-only byte region.
#[derive(Debug)]
pub(crate) enum Backing {
    /// An in-process buffer owned by the source.
    Owned(Vec<u8>),
    /// An in-process buffer owned by the caller.
    Borrowed { ptr: *const u8, len: usize },
    /// A private read-only mapping of a file or POSIX shared-memory object.
    Mapped(Mmap),
    /// A read-only attachment to a SysV shared-memory segment.
    Attached(Attachment),
}

impl Backing {
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            Backing::Owned(bytes) => bytes,
            // SAFETY: The creator of a borrowed backing guarantees `ptr` is
            // valid for reads of `len` bytes for the life of the source.
            Backing::Borrowed { ptr, len } => unsafe { raw_slice(*ptr, *len) },
            Backing::Mapped(mapping) => mapping,
            Backing::Attached(attachment) => attachment.as_bytes(),
        }
    }
}

/// # Safety
///
/// Unless `len` is zero, `ptr` must be valid for reads of `len` bytes for
/// the returned lifetime.
unsafe fn raw_slice<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr, len) }
    }
}

/// Map the whole of an open file or shared-memory object read-only.
pub(crate) fn map(file: &File, name: &str) -> Result<Mmap, Error> {
    // SAFETY: The mapping is only ever read through shared slices. Changes
    // made by other processes are visible but cannot invalidate the region.
    unsafe { Mmap::map(file) }.map_err(|source| Error::Os {
        action: "map",
        name: name.to_string(),
        source,
    })
}

/// A read-only attachment to a SysV shared-memory segment, detached on drop.
#[derive(Debug)]
pub(crate) struct Attachment {
    ptr: *const libc::c_void,
    len: usize,
}

impl Attachment {
    pub(crate) fn new(id: libc::c_int, name: &str) -> Result<Self, Error> {
        // SAFETY: `shmid_ds` is plain data; `shmctl` fills it on success.
        let mut ds: libc::shmid_ds = unsafe { std::mem::zeroed() };
        if unsafe { libc::shmctl(id, libc::IPC_STAT, &mut ds) } < 0 {
            Err(Error::os("stat shared memory", name))?;
        }

        // SAFETY: Attaching read-only at a kernel-chosen address aliases no
        // Rust memory.
        let ptr = unsafe { libc::shmat(id, ptr::null(), libc::SHM_RDONLY) };
        if ptr as isize == -1 {
            Err(Error::os("attach", name))?;
        }

        Ok(Self {
            ptr,
            len: ds.shm_segsz as usize,
        })
    }

    fn as_bytes(&self) -> &[u8] {
        // SAFETY: The segment stays attached with `len` readable bytes until
        // dropped.
        unsafe { raw_slice(self.ptr as *const u8, self.len) }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by a successful `shmat`.
        unsafe { libc::shmdt(self.ptr) };
    }
}
