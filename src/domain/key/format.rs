//! Canonical API key format
//!
//! Every issued key is `keymzanzi` followed by a class tag (`prod` or
//! `dev`), an underscore, and a lowercase alphanumeric tail of at least
//! 20 characters. This module is the single source of truth for that
//! shape; issuance and the authorization gate both go through it.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix shared by every issued key
pub const KEY_PREFIX: &str = "keymzanzi";

/// Minimum length of the random tail
pub const MIN_TAIL_LEN: usize = 20;

static KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^keymzanzi(prod|dev)_[a-z0-9]{20,}$").expect("key pattern must compile")
});

/// Key class encoded in the key string itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyClass {
    Dev,
    Prod,
}

impl KeyClass {
    /// Short tag embedded in the key string
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }

    /// Long form used in API responses
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Dev => "development",
            Self::Prod => "production",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "dev" => Some(Self::Dev),
            "prod" => Some(Self::Prod),
            _ => None,
        }
    }
}

impl fmt::Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Classifies a candidate key string.
///
/// Purely syntactic and total: returns the class iff the candidate
/// matches the canonical shape exactly (anchored, case-sensitive, tail
/// at least [`MIN_TAIL_LEN`] characters from `[a-z0-9]`). Never consults
/// a store and never panics.
pub fn classify(candidate: &str) -> Option<KeyClass> {
    let captures = KEY_PATTERN.captures(candidate)?;
    KeyClass::from_tag(captures.get(1)?.as_str())
}

/// Returns true when the candidate matches the canonical key shape
pub fn is_well_formed(candidate: &str) -> bool {
    classify(candidate).is_some()
}
