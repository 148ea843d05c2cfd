// src/registry/host.rs
use std::fmt;

/// A monitored network address (IP or hostname).
///
/// Identity is exact string equality: no trimming, case folding or address
/// canonicalisation is applied, so `"1.1.1.1"` and `" 1.1.1.1"` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Host(String);

impl Host {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Host {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Host {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl AsRef<str> for Host {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
