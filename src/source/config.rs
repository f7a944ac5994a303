//! Source configuration strings.

use core::str::FromStr;
use std::path::PathBuf;

use crate::Error;

/// Prefix of an in-process buffer: `malloc:<pointer> <size>`.
pub const PREFIX_MALLOC: &str = "malloc:";
/// Prefix of a SysV shared-memory segment: `sysvshmem:<id>`.
pub const PREFIX_SYSV_SHMEM: &str = "sysvshmem:";
/// Prefix reserved for test fixtures supplied by the host.
pub const PREFIX_TEST: &str = "test:";

/// A parsed source configuration.
///
/// Any string without a known prefix is a path: a regular file, or, when
/// nothing exists at that path, the name of a POSIX shared-memory object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Heap { ptr: usize, size: usize },
    SysV { id: i32 },
    Test(String),
    Path(PathBuf),
}

impl SourceConfig {
    /// The configuration string for a caller-owned buffer.
    pub fn heap(bytes: &[u8]) -> String {
        format!("{PREFIX_MALLOC}{:p} {}", bytes.as_ptr(), bytes.len())
    }
}

impl FromStr for SourceConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidConfig(s.to_string());

        if let Some(rest) = s.strip_prefix(PREFIX_TEST) {
            return Ok(SourceConfig::Test(rest.to_string()));
        }

        if let Some(rest) = s.strip_prefix(PREFIX_MALLOC) {
            let mut parts = rest.split_whitespace();
            let (Some(ptr), Some(size), None) = (parts.next(), parts.next(), parts.next()) else {
                Err(invalid())?
            };

            let digits = ptr
                .strip_prefix("0x")
                .or_else(|| ptr.strip_prefix("0X"))
                .unwrap_or(ptr);
            let ptr = usize::from_str_radix(digits, 16).map_err(|_| invalid())?;
            let size = size.parse().map_err(|_| invalid())?;

            if ptr == 0 && size != 0 {
                Err(invalid())?;
            }

            return Ok(SourceConfig::Heap { ptr, size });
        }

        if let Some(rest) = s.strip_prefix(PREFIX_SYSV_SHMEM) {
            let id = rest.trim().parse().map_err(|_| invalid())?;
            return Ok(SourceConfig::SysV { id });
        }

        if s.is_empty() {
            Err(invalid())?;
        }

        Ok(SourceConfig::Path(PathBuf::from(s)))
    }
}
