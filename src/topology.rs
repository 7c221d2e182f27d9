//! Operating-system cache descriptors.
//!
//! Linux exposes one directory per cache under
//! `/sys/devices/system/cpu/cpu0/cache/indexN/`. Each attribute is a small
//! file whose first whitespace-free token is the value. Enumeration stops at
//! the first index without a `size` file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// Cache directory for CPU 0 on Linux.
pub const CPU0_CACHE_DIR: &str = "/sys/devices/system/cpu/cpu0/cache";

/// One cache as described by the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDescriptor {
    /// Directory index (`indexN`).
    pub index: usize,
    /// Cache level, when exposed.
    pub level: Option<u32>,
    /// `Data`, `Instruction` or `Unified`, when exposed.
    pub cache_type: Option<String>,
    /// Capacity in bytes.
    pub size_bytes: usize,
    /// Ways of associativity, when exposed.
    pub ways: Option<usize>,
    /// Coherency line size in bytes, when exposed.
    pub line_size: Option<usize>,
}

impl CacheDescriptor {
    /// Whether this cache holds data (data or unified).
    pub fn holds_data(&self) -> bool {
        !matches!(self.cache_type.as_deref(), Some("Instruction"))
    }
}

/// Parse a sysfs size such as `48K`, `2048K`, `32M` or `1G`.
///
/// A bare number is bytes.
pub fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    let (digits, multiplier) = match value.char_indices().last()? {
        (i, 'K' | 'k') => (&value[..i], 1024),
        (i, 'M' | 'm') => (&value[..i], 1024 * 1024),
        (i, 'G' | 'g') => (&value[..i], 1024 * 1024 * 1024),
        _ => (value, 1),
    };
    digits.parse::<usize>().ok()?.checked_mul(multiplier)
}

/// First whitespace-free token of `path`, or `None` when the file is missing.
fn read_token(path: &Path) -> Result<Option<String>, TopologyError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.split_whitespace().next().map(str::to_string)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(TopologyError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_number<T: std::str::FromStr>(path: PathBuf) -> Result<Option<T>, TopologyError> {
    match read_token(&path)? {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| TopologyError::Parse { path, value }),
    }
}

/// Read every `indexN` descriptor under `root`.
///
/// Fails with [`TopologyError::NotAvailable`] when `index0/size` is absent.
pub fn read_cache_descriptors(root: &Path) -> Result<Vec<CacheDescriptor>, TopologyError> {
    let mut descriptors = Vec::new();

    for index in 0.. {
        let dir = root.join(format!("index{}", index));
        let size_path = dir.join("size");
        let Some(size) = read_token(&size_path)? else {
            break;
        };
        let size_bytes = parse_size(&size).ok_or_else(|| TopologyError::Parse {
            path: size_path,
            value: size,
        })?;

        let descriptor = CacheDescriptor {
            index,
            level: read_number(dir.join("level"))?,
            cache_type: read_token(&dir.join("type"))?,
            size_bytes,
            ways: read_number(dir.join("ways_of_associativity"))?,
            line_size: read_number(dir.join("coherency_line_size"))?,
        };
        debug!("cache descriptor: {:?}", descriptor);
        descriptors.push(descriptor);
    }

    if descriptors.is_empty() {
        return Err(TopologyError::NotAvailable(root.to_path_buf()));
    }
    Ok(descriptors)
}

/// [`read_cache_descriptors`] for CPU 0.
pub fn read_cpu0_cache_descriptors() -> Result<Vec<CacheDescriptor>, TopologyError> {
    read_cache_descriptors(Path::new(CPU0_CACHE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("48K"), Some(48 * 1024));
        assert_eq!(parse_size("32M\n"), Some(32 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("K"), None);
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("12Q"), None);
    }

    #[test]
    fn test_holds_data() {
        let mut descriptor = CacheDescriptor {
            index: 0,
            level: Some(1),
            cache_type: Some("Instruction".to_string()),
            size_bytes: 32 * 1024,
            ways: Some(8),
            line_size: Some(64),
        };
        assert!(!descriptor.holds_data());
        descriptor.cache_type = Some("Unified".to_string());
        assert!(descriptor.holds_data());
        descriptor.cache_type = None;
        assert!(descriptor.holds_data());
    }
}
