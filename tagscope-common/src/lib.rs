//! Common types and utilities shared across tagscope crates.
//!
//! This crate holds the small domain primitives every layer agrees on, the
//! shared error type for them, and the observability helpers used by binaries
//! and integration tests. It is intentionally lightweight so that all crates
//! can depend on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`Hashtag`]: validated query key, safe to embed in artifact file names
//! - [`Cutoff`]: inclusive recency boundary in unix seconds
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`CommonError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use tagscope_common::{Cutoff, Hashtag};
//!
//! let tag = Hashtag::parse("#kitten").unwrap();
//! assert_eq!(tag.as_str(), "kitten");
//!
//! let cutoff: Cutoff = "1600000000".parse().unwrap();
//! assert!(cutoff.admits(1600000000));
//! assert!(!cutoff.admits(1599999999));
//! ```
use std::fmt;
use std::str::FromStr;

use time::macros::format_description;
use time::{Duration, OffsetDateTime};

pub mod observability;

/// Default look-back window used when a request carries no explicit cutoff.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Error types for the shared primitives.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// The hashtag was empty after trimming.
    #[error("hashtag is empty")]
    EmptyHashtag,

    /// The hashtag contains characters that are not letters, digits or `_`.
    #[error("hashtag '{0}' contains unsupported characters")]
    MalformedHashtag(String),

    /// The cutoff could not be read as integer unix seconds.
    #[error("invalid cutoff timestamp '{raw}': {reason}")]
    InvalidCutoff { raw: String, reason: String },

    /// The look-back window reaches past the representable date range.
    #[error("look-back window of {days} days is out of range")]
    WindowOutOfRange { days: u32 },
}

/// Convenient alias for results that use [`CommonError`].
pub type Result<T> = std::result::Result<T, CommonError>;

/// A hashtag stripped of its leading `#`.
///
/// Only Unicode letters, digits and `_` are accepted, which keeps the value
/// safe to interpolate into URLs and file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hashtag(String);

impl Hashtag {
    pub fn parse(raw: &str) -> Result<Self> {
        let tag = raw.trim();
        let tag = tag.strip_prefix('#').unwrap_or(tag);
        if tag.is_empty() {
            return Err(CommonError::EmptyHashtag);
        }
        if !tag.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(CommonError::MalformedHashtag(tag.to_string()));
        }
        Ok(Self(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Hashtag {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Hashtag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hashtag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive lower bound on a post's creation instant, in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cutoff(i64);

impl Cutoff {
    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    pub const fn unix(self) -> i64 {
        self.0
    }

    /// `days` whole days before `now`.
    ///
    /// ```
    /// use tagscope_common::Cutoff;
    /// use time::macros::datetime;
    ///
    /// let now = datetime!(2024-03-31 12:00 UTC);
    /// let cutoff = Cutoff::days_before(now, 30).unwrap();
    /// assert_eq!(cutoff.unix(), datetime!(2024-03-01 12:00 UTC).unix_timestamp());
    /// ```
    pub fn days_before(now: OffsetDateTime, days: u32) -> Result<Self> {
        now.checked_sub(Duration::days(i64::from(days)))
            .map(|dt| Self(dt.unix_timestamp()))
            .ok_or(CommonError::WindowOutOfRange { days })
    }

    /// `days` whole days before the current UTC instant.
    pub fn days_ago(days: u32) -> Result<Self> {
        Self::days_before(OffsetDateTime::now_utc(), days)
    }

    /// Whether a post created at `created_at` is recent enough to keep.
    pub fn admits(self, created_at: i64) -> bool {
        created_at >= self.0
    }

    /// Human-readable UTC rendering for logs; falls back to the raw seconds
    /// when the instant is outside the representable range.
    pub fn describe(self) -> String {
        OffsetDateTime::from_unix_timestamp(self.0)
            .ok()
            .and_then(|dt| {
                dt.format(format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
                ))
                .ok()
            })
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl FromStr for Cutoff {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|e| CommonError::InvalidCutoff {
                raw: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
