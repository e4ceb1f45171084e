//! Key Pattern Module
//!
//! Compiles `*`-wildcard key patterns into anchored regular expressions.
//! Every pattern-based lookup or invalidation goes through [`KeyPattern`].

use regex::Regex;

use crate::error::{CacheError, Result};

// == Key Pattern ==
/// A compiled wildcard pattern.
///
/// `*` matches any run of characters (including none); every other character
/// is literal. The whole key must match, so `user:posts:42:*` never matches
/// `user:posts:421:1`.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    // == Compile ==
    /// Compiles a wildcard pattern.
    ///
    /// Returns `InvalidArgument` for an empty pattern.
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(CacheError::InvalidArgument(
                "Pattern cannot be empty".to_string(),
            ));
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("^{}$", body))
            .map_err(|e| CacheError::InvalidArgument(format!("Malformed pattern: {}", e)))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    // == Matches ==
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The pattern as originally written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern contains no wildcard and names a single key.
    pub fn is_literal(&self) -> bool {
        !self.source.contains('*')
    }
}
