//! Wire types shared by the gaam backend and its clients.

pub mod account;
pub mod gaam;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// An opaque record identifier.
///
/// Identifiers are collision-resistant lowercase alphanumeric strings.
/// Values coming from untrusted input go through [`Id::parse`], which
/// rejects anything that does not look like an identifier at all
/// (empty strings, form placeholders, truncated values).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// The shortest accepted identifier.
    pub const MIN_LEN: usize = 20;
    /// The longest accepted identifier.
    pub const MAX_LEN: usize = 64;

    const PLACEHOLDERS: [&'static str; 4] = ["placeholder", "undefined", "null", "none"];

    /// Parses an identifier from untrusted input, returning `None`
    /// if the value has no plausible identifier shape.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() < Self::MIN_LEN
            || raw.len() > Self::MAX_LEN
            || Self::PLACEHOLDERS
                .iter()
                .any(|p| raw.eq_ignore_ascii_case(p))
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return None;
        }
        Some(Self(raw.to_owned()))
    }

    /// Wraps a freshly generated identifier.
    ///
    /// The caller guarantees the value satisfies the shape [`Id::parse`] accepts.
    #[inline]
    pub fn new_unchecked(raw: String) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Id {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Count of all matching records, across every page.
    pub total: usize,
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    /// An empty page with the given position.
    pub fn empty(page: usize, limit: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            limit,
        }
    }
}
