//! Domain library for the URL Shortener.
//!
//! This crate holds the domain types, ports (traits), error definitions and
//! the link registry that orchestrates them. It only pulls in the small crates
//! it needs for URL parsing and short code generation; adapters and IO
//! concerns stay out of this crate.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Identifier of a short link as it appears in the redirect path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortCode(String);

impl ShortCode {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        // Generated codes are base62, but stored data may hold any string
        if val.is_empty() {
            return Err(CoreError::InvalidShortCode("empty".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One shortened link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkRecord {
    pub short_code: ShortCode,
    pub original_url: String,
    /// Set once at creation. `None` only for legacy records whose timestamp
    /// was missing or unreadable.
    pub created_at: Option<SystemTime>,
    /// Number of successful resolves.
    pub visit_count: u64,
}

impl LinkRecord {
    /// Create a fresh record with a zero visit counter. `created_at` is
    /// truncated to whole seconds, the precision the store keeps.
    pub fn new(short_code: ShortCode, original_url: String, created_at: SystemTime) -> Self {
        Self {
            short_code,
            original_url,
            created_at: Some(whole_seconds(created_at)),
            visit_count: 0,
        }
    }
}

/// Drop the sub-second part of `t`. Times before the epoch clamp to it.
fn whole_seconds(t: SystemTime) -> SystemTime {
    let secs = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs();
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// The complete collection of link records, oldest first.
///
/// This is the unit the store loads and saves; callers mutate a local copy
/// and hand the whole set back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkSet {
    records: Vec<LinkRecord>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkRecord> {
        self.records.iter()
    }

    pub fn contains_code(&self, code: &ShortCode) -> bool {
        self.find_by_code(code).is_some()
    }

    pub fn find_by_code(&self, code: &ShortCode) -> Option<&LinkRecord> {
        self.records.iter().find(|r| r.short_code == *code)
    }

    pub fn find_by_code_mut(&mut self, code: &ShortCode) -> Option<&mut LinkRecord> {
        self.records.iter_mut().find(|r| r.short_code == *code)
    }

    /// Exact string match on the stored URL.
    pub fn find_by_url(&self, url: &str) -> Option<&LinkRecord> {
        self.records.iter().find(|r| r.original_url == url)
    }

    /// Append a record. Fails if its short code is already taken.
    pub fn push(&mut self, record: LinkRecord) -> Result<(), CoreError> {
        if self.contains_code(&record.short_code) {
            return Err(CoreError::AlreadyExists);
        }
        self.records.push(record);
        Ok(())
    }
}

impl FromIterator<LinkRecord> for LinkSet {
    /// Collect records keeping the first occurrence of each short code.
    fn from_iter<I: IntoIterator<Item = LinkRecord>>(iter: I) -> Self {
        let mut set = LinkSet::new();
        for record in iter {
            let _ = set.push(record);
        }
        set
    }
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Short code generator; must avoid every code already in `existing`.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, existing: &LinkSet) -> ShortCode;
}

/// Store port: whole-set load and atomic whole-set replace.
pub trait LinkStore: Send + Sync {
    /// Read the persisted set. An unreadable document yields an empty set.
    fn load(&self) -> Result<LinkSet, CoreError>;
    /// Replace the persisted set. Readers never observe a partial write.
    fn save(&self, links: &LinkSet) -> Result<(), CoreError>;
}

/// Core domain errors (no external error crates to keep deps small).
#[derive(Debug)]
pub enum CoreError {
    InvalidUrl(String),
    InvalidShortCode(String),
    AlreadyExists,
    NotFound,
    Store(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
            CoreError::InvalidShortCode(msg) => write!(f, "invalid short code: {}", msg),
            CoreError::AlreadyExists => write!(f, "short code already exists"),
            CoreError::NotFound => write!(f, "not found"),
            CoreError::Store(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod base62;
pub mod code;
pub mod normalize;
pub mod registry;
