//! json-store — flat-file implementation of the LinkStore port.
//!
//! Purpose
//! - Keep the whole link set in one human-readable JSON document so the
//!   service runs with nothing but a writable directory.
//! - Implements the `LinkStore` trait from the `domain` crate.
//!
//! Notes
//! - Writes go to a temp file in the same directory which is then renamed
//!   over the document, so readers see either the old or the new set.
//! - Reading is lenient: an unparseable document is an empty set, and
//!   individual records missing optional fields get defaults.
//! - There is no cross-process lock. Two processes saving at once end up
//!   last-writer-wins.
//! - Timestamps are `YYYY-MM-DD HH:MM:SS` in UTC.

use std::fmt::Display;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use domain::{CoreError, LinkRecord, LinkSet, LinkStore, ShortCode};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Format of the `created_at` field.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default document location.
pub const DEFAULT_DATA_FILE: &str = "./data/data.json";

/// One record as it appears in the document and in the listing API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub short: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub visits: u64,
}

impl From<&LinkRecord> for StoredRecord {
    fn from(record: &LinkRecord) -> Self {
        Self {
            short: record.short_code.as_str().to_string(),
            url: record.original_url.clone(),
            created_at: record.created_at.map(format_created_at),
            visits: record.visit_count,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum StoreError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        CoreError::Store(e.to_string())
    }
}

fn io_err<C: Display>(context: C) -> impl FnOnce(io::Error) -> StoreError {
    move |source| StoreError::Io {
        context: context.to_string(),
        source,
    }
}

/// Link store backed by a single JSON document.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the document at `path`. Nothing touches the disk until the first
    /// load or save.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_document(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        debug!(path = %self.path.display(), "initializing empty link document");
        self.write_atomic(&encode(&LinkSet::new())?)
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err(format!("create {}", dir.display())))?;

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(io_err(format!("temp file in {}", dir.display())))?;
        tmp.write_all(bytes).map_err(io_err("write temp file"))?;
        tmp.as_file().sync_all().map_err(io_err("sync temp file"))?;
        tmp.persist(&self.path)
            .map_err(|e| io_err(format!("replace {}", self.path.display()))(e.error))?;
        Ok(())
    }
}

impl LinkStore for JsonFileStore {
    fn load(&self) -> Result<LinkSet, CoreError> {
        self.ensure_document()?;
        let bytes =
            fs::read(&self.path).map_err(io_err(format!("read {}", self.path.display())))?;
        Ok(parse_document(&bytes))
    }

    fn save(&self, links: &LinkSet) -> Result<(), CoreError> {
        let bytes = encode(links)?;
        self.write_atomic(&bytes)?;
        Ok(())
    }
}

/// Serialize a set as 4-space pretty JSON with non-ASCII left unescaped.
fn encode(links: &LinkSet) -> Result<Vec<u8>, StoreError> {
    let records: Vec<StoredRecord> = links.iter().map(StoredRecord::from).collect();
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut ser)?;
    Ok(buf)
}

/// Decode a document. Anything other than an array of records yields an
/// empty set; unusable records are skipped.
pub fn parse_document(bytes: &[u8]) -> LinkSet {
    let items = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("link document is not an array; treating as empty");
            return LinkSet::new();
        }
        Err(e) => {
            warn!(err = %e, "link document unreadable; treating as empty");
            return LinkSet::new();
        }
    };
    let total = items.len();
    let links: LinkSet = items.iter().filter_map(record_from_value).collect();
    if links.len() < total {
        warn!(skipped = total - links.len(), "dropped unusable link records");
    }
    links
}

fn record_from_value(value: &Value) -> Option<LinkRecord> {
    let obj = value.as_object()?;
    let short_code = ShortCode::new(obj.get("short")?.as_str()?).ok()?;
    let url = obj.get("url")?.as_str()?;
    if url.is_empty() {
        return None;
    }
    Some(LinkRecord {
        short_code,
        original_url: url.to_string(),
        created_at: obj
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_created_at),
        visit_count: obj.get("visits").map(parse_visits).unwrap_or(0),
    })
}

fn parse_visits(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub fn format_created_at(t: SystemTime) -> String {
    let dt: DateTime<Utc> = t.into();
    dt.format(CREATED_AT_FORMAT).to_string()
}

pub fn parse_created_at(s: &str) -> Option<SystemTime> {
    NaiveDateTime::parse_from_str(s.trim(), CREATED_AT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().into())
}
