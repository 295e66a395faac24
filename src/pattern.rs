//! Copy-verbatim routing.
//!
//! Files whose base name matches one of the configured copy patterns are
//! mirrored byte for byte instead of being sent to the model.

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compiled list of copy patterns.
#[derive(Debug, Clone)]
pub struct CopyMatcher {
    set: GlobSet,
}

impl CopyMatcher {
    /// Compiles `patterns` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first glob that does not
    /// parse.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| Error::invalid_pattern(pattern, e.kind().to_string()))?;
            builder.add(glob);
        }

        let set = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build copy pattern set: {}", e)))?;

        Ok(Self { set })
    }

    /// A matcher that never matches.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
        }
    }

    /// Returns true if `file_name` should be copied unmodified.
    ///
    /// Only the last path component is matched, so callers may pass
    /// either a bare name or a full path.
    #[must_use]
    pub fn should_copy_unmodified(&self, file_name: &str) -> bool {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(file_name);
        self.set.is_match(base)
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Returns true if no patterns are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl Default for CopyMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

/// One-off check of `file_name` against `patterns`.
///
/// Invalid patterns never match.
#[must_use]
pub fn should_copy_unmodified(file_name: &str, patterns: &[String]) -> bool {
    CopyMatcher::new(patterns).is_ok_and(|m| m.should_copy_unmodified(file_name))
}
