#![allow(dead_code)]

use std::{
    ffi::CString,
    fs::File,
    io::{self, Write},
    os::fd::FromRawFd,
    ptr,
};

use blobscope::Value;
use tempfile::NamedTempFile;
use zerocopy::{Immutable, IntoBytes};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(IntoBytes, Immutable)]
#[repr(C, packed)]
struct Numbers {
    a_u8: u8,
    a_u16: u16,
    a_u32: u32,
    a_i16: i16,
    a_i32: i32,
    a_i64: i64,
    a_f32: f32,
    a_f64: f64,
}

/// Where each group of fixture data starts.
#[derive(Debug, Clone, Copy)]
pub struct Offsets {
    pub strings: usize,
    pub u32_array: usize,
    pub fixed_strings: usize,
    pub terminated_strings: usize,
    pub fixed_wstrs: usize,
    pub terminated_wstrs: usize,
    pub end: usize,
}

/// One of each primitive, then strings, a `u32` array and wide strings.
pub fn fixture() -> (Vec<u8>, Offsets) {
    let numbers = Numbers {
        a_u8: 1,
        a_u16: 2,
        a_u32: 3,
        a_i16: -5,
        a_i32: -6,
        a_i64: -7,
        a_f32: -8.1,
        a_f64: 9.2,
    };

    let mut bytes = numbers.as_bytes().to_vec();

    let strings = bytes.len();
    bytes.extend_from_slice(b"onetwo\0bbc\0fox");

    let u32_array = bytes.len();
    let array: Vec<u32> = (1000..1008).collect();
    bytes.extend_from_slice(array.as_bytes());

    let fixed_strings = bytes.len();
    bytes.extend_from_slice(b"x1x2x3");

    let terminated_strings = bytes.len();
    bytes.extend_from_slice(b"y1\0y2\0y3\0");

    // Wide strings hold UTF-8 text two bytes at a time.
    let fixed_wstrs = bytes.len();
    bytes.extend_from_slice("РазДваГопУпс".as_bytes());

    let terminated_wstrs = bytes.len();
    for word in ["Джаз", "Рок", "Классика"] {
        bytes.extend_from_slice(word.as_bytes());
        bytes.extend_from_slice(&[0, 0]);
    }

    let offsets = Offsets {
        strings,
        u32_array,
        fixed_strings,
        terminated_strings,
        fixed_wstrs,
        terminated_wstrs,
        end: bytes.len(),
    };

    (bytes, offsets)
}

pub fn text(words: &[&str]) -> Value {
    Value::Array(words.iter().map(|&w| w.into()).collect())
}

pub fn ints(values: impl IntoIterator<Item = i64>) -> Value {
    Value::Array(values.into_iter().map(Value::Int).collect())
}

pub fn temp_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// A POSIX shared-memory object, unlinked on drop.
pub struct PosixShm {
    name: CString,
}

impl PosixShm {
    pub fn create(tag: &str, bytes: &[u8]) -> Self {
        let name = format!("/blobscope-test-{}-{tag}", std::process::id());
        let name = CString::new(name).unwrap();

        let fd = unsafe {
            libc::shm_open(
                name.as_ptr(),
                libc::O_RDWR | libc::O_CREAT | libc::O_TRUNC,
                0o600,
            )
        };
        assert!(fd >= 0, "{}", io::Error::last_os_error());

        let mut file = unsafe { File::from_raw_fd(fd) };
        file.write_all(bytes).unwrap();

        Self { name }
    }

    pub fn name(&self) -> &str {
        self.name.to_str().unwrap()
    }
}

impl Drop for PosixShm {
    fn drop(&mut self) {
        unsafe { libc::shm_unlink(self.name.as_ptr()) };
    }
}

/// A SysV shared-memory segment, removed on drop.
pub struct SysVShm {
    id: libc::c_int,
}

impl SysVShm {
    pub fn create(bytes: &[u8]) -> Self {
        let id = unsafe { libc::shmget(libc::IPC_PRIVATE, bytes.len(), libc::IPC_CREAT | 0o600) };
        assert!(id >= 0, "{}", io::Error::last_os_error());

        let segment = Self { id };

        let ptr = unsafe { libc::shmat(id, ptr::null(), 0) };
        assert!(ptr as isize != -1, "{}", io::Error::last_os_error());

        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.cast::<u8>(), bytes.len());
            libc::shmdt(ptr);
        }

        segment
    }

    pub fn config(&self) -> String {
        format!("{}{}", blobscope::source::PREFIX_SYSV_SHMEM, self.id)
    }
}

impl Drop for SysVShm {
    fn drop(&mut self) {
        unsafe { libc::shmctl(self.id, libc::IPC_RMID, ptr::null_mut()) };
    }
}
