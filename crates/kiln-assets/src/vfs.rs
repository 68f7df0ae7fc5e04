//! Content sources - where asset bytes come from.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;

use crate::address::Address;
use crate::error::{LoadError, LoadResult};

/// Byte access for logical addresses.
///
/// The pipeline treats this purely as "give me bytes for this path or fail";
/// reads are issued from worker threads, so implementations must be
/// thread-safe.
pub trait ContentSource: Send + Sync + 'static {
    /// Read all bytes for an address.
    fn read(&self, address: &Address) -> LoadResult<Vec<u8>>;

    /// Check whether an address exists without reading it.
    fn exists(&self, address: &Address) -> bool;

    /// A string describing this source for logging.
    fn describe(&self) -> String;
}

/// Content rooted at a directory on disk.
pub struct DirSource {
    base: PathBuf,
}

impl DirSource {
    /// Create a source rooted at `base`.
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, address: &Address) -> PathBuf {
        self.base.join(address.as_str())
    }
}

impl ContentSource for DirSource {
    fn read(&self, address: &Address) -> LoadResult<Vec<u8>> {
        let path = self.path_for(address);
        std::fs::read(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound {
                    address: address.clone(),
                }
            } else {
                LoadError::Io {
                    address: address.clone(),
                    message: err.to_string(),
                }
            }
        })
    }

    fn exists(&self, address: &Address) -> bool {
        self.path_for(address).exists()
    }

    fn describe(&self) -> String {
        format!("dir://{}", self.base.display())
    }
}

/// In-memory content for embedded assets and tests.
///
/// Files are inserted up front; reads are counted so tests can assert that
/// cache coalescing really prevents duplicate work.
#[derive(Default)]
pub struct MemorySource {
    files: AHashMap<Address, Arc<[u8]>>,
    reads: AtomicUsize,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes for an address.
    pub fn insert(&mut self, address: impl Into<Address>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(address.into(), bytes.into().into());
    }

    /// Builder-style [`insert`](MemorySource::insert).
    pub fn with_file(mut self, address: impl Into<Address>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(address, bytes);
        self
    }

    /// Number of reads served so far, including failed lookups.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl ContentSource for MemorySource {
    fn read(&self, address: &Address) -> LoadResult<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.files
            .get(address)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| LoadError::NotFound {
                address: address.clone(),
            })
    }

    fn exists(&self, address: &Address) -> bool {
        self.files.contains_key(address)
    }

    fn describe(&self) -> String {
        format!("memory://{} files", self.files.len())
    }
}
