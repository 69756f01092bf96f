//! Process-wide connection configuration.

use serde::{Deserialize, Serialize};

/// Page size limits shared by every connection resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Page size used when neither `first` nor `last` is supplied.
    pub default_page_size: usize,
    /// Upper bound on any requested page size.
    pub max_page_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }

    /// Sets the default page size.
    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Sets the maximum page size.
    pub fn max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    /// Returns the effective `(default, max)` pair.
    ///
    /// The maximum is at least 1 and the default never exceeds it, so a
    /// deserialized config with inconsistent values still yields a usable
    /// page size.
    pub fn limits(&self) -> (usize, usize) {
        let max = self.max_page_size.max(1);
        (self.default_page_size.min(max), max)
    }

    /// Computes the pre-overfetch page size for the given `first`/`last`.
    pub fn page_size(&self, first: Option<usize>, last: Option<usize>) -> usize {
        let (default, max) = self.limits();
        let requested = match (first, last) {
            (None, None) => default,
            (first, last) => first.unwrap_or(0).max(last.unwrap_or(0)),
        };
        requested.min(max)
    }

    /// Rows to fetch for the given `first`/`last`, including the overfetch
    /// sentinel: `min(max(first, last, default), max) + 1`.
    ///
    /// Never smaller than `page_size(first, last) + 1`. Saturates instead of
    /// overflowing when the maximum is `usize::MAX`.
    pub fn fetch_size(&self, first: Option<usize>, last: Option<usize>) -> usize {
        let (default, max) = self.limits();
        let requested = first.unwrap_or(0).max(last.unwrap_or(0)).max(default);
        requested.min(max).saturating_add(1)
    }
}
