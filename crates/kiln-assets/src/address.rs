//! Slash-delimited logical asset addresses.

use std::fmt;

/// A slash-delimited path identifying an asset relative to a library root.
///
/// An address is an immutable value type with no identity beyond its string
/// value. `"atlas/hero.json"` splits into a parent (`"atlas"`) and a nested
/// remainder (`"hero.json"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Create an address from a path string.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The raw path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything but the last segment, or an empty address for a bare name.
    pub fn parent(&self) -> Address {
        match self.0.rfind('/') {
            Some(split) => Address::new(&self.0[..split]),
            None => Address::new(""),
        }
    }

    /// Everything after the first separator, if any.
    pub fn nested(&self) -> Option<Address> {
        self.0.find('/').map(|split| Address::new(&self.0[split + 1..]))
    }

    /// The last path segment.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(split) => &self.0[split + 1..],
            None => &self.0,
        }
    }

    /// Check whether the address is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a relative path segment-wise.
    pub fn join(&self, relative: &str) -> Address {
        if self.0.is_empty() {
            Address::new(relative)
        } else if relative.is_empty() {
            self.clone()
        } else {
            Address::new(format!("{}/{}", self.0.trim_end_matches('/'), relative))
        }
    }

    /// Resolve a relative reference found in this asset's declaration.
    ///
    /// References combine with the declaring asset's parent, so
    /// `"atlas/hero.json"` resolving `"hero.png"` yields `"atlas/hero.png"`.
    /// This is the one rule shared by the loader and the dependency
    /// collector; both must request identical addresses.
    pub fn resolve(&self, reference: &str) -> Address {
        self.parent().join(reference)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(path: &str) -> Self {
        Address::new(path)
    }
}

impl From<String> for Address {
    fn from(path: String) -> Self {
        Address::new(path)
    }
}
