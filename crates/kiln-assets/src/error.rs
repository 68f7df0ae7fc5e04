//! Error types for the asset pipeline.

use std::fmt;

use kiln_core::Promise;

use crate::address::Address;

/// Errors that can fail an asset load.
///
/// `LoadError` is `Clone` so a single rejection can propagate to every
/// caller coalesced on the same cache entry.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// The backing store has no content for this address.
    NotFound {
        /// The address that failed to resolve.
        address: Address,
    },

    /// The backing store failed to produce bytes for this address.
    Io {
        /// The address being read.
        address: Address,
        /// Description of the underlying I/O failure.
        message: String,
    },

    /// Raw bytes are not valid for the expected structured format.
    Parse {
        /// The address being parsed.
        address: Address,
        /// The format that rejected the bytes (e.g. `"json"`, `"utf-8"`).
        format: &'static str,
        /// Description of the parse failure.
        message: String,
    },

    /// A structurally valid document failed the type's declared schema.
    Schema {
        /// The address of the offending declaration.
        address: Address,
        /// The violated schema keyword (`"required"`, `"type"`, ...).
        keyword: &'static str,
        /// Pointer into the document, e.g. `"/streaming"`.
        pointer: String,
        /// Human-readable description of the violation.
        detail: String,
    },

    /// A nested reference in a declaration did not resolve.
    DependencyNotFound {
        /// The asset whose declaration made the reference.
        address: Address,
        /// The referenced asset or declaration entry that did not resolve.
        dependency: String,
        /// Underlying failure, when the reference failed to load.
        cause: Option<Box<LoadError>>,
    },

    /// A backend factory returned a null handle on the main thread.
    Backend {
        /// The address being constructed.
        address: Address,
        /// The factory call that failed.
        what: &'static str,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound { address } => {
                write!(f, "asset not found: '{}'", address)
            }
            LoadError::Io { address, message } => {
                write!(f, "i/o error reading '{}': {}", address, message)
            }
            LoadError::Parse {
                address,
                format,
                message,
            } => {
                write!(f, "failed to parse '{}' as {}: {}", address, format, message)
            }
            LoadError::Schema {
                address,
                keyword,
                pointer,
                detail,
            } => {
                write!(
                    f,
                    "schema violation in '{}' at '{}' ({}): {}",
                    address, pointer, keyword, detail
                )
            }
            LoadError::DependencyNotFound {
                address,
                dependency,
                cause,
            } => {
                write!(f, "asset '{}' references missing {}", address, dependency)?;
                if let Some(cause) = cause {
                    write!(f, ": {}", cause)?;
                }
                Ok(())
            }
            LoadError::Backend { address, what } => {
                write!(f, "backend construction failed for '{}': {}", address, what)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::DependencyNotFound {
                cause: Some(cause), ..
            } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for asset operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Promise type alias used throughout the pipeline.
pub type LoadPromise<T> = Promise<T, LoadError>;
