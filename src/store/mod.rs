//! The authoritative text lives here.
//!
//! A [`TextStore`] owns string fields keyed by name. The widget reads one
//! field and proposes new values through [`TextStore::update`]; nothing
//! else writes to it.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field a markdown file's content is exposed under.
pub const BODY_FIELD: &str = "body";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path} does not contain a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("field `{key}` is missing or not a string")]
    NotATextField { key: String },
}

/// Host-owned record with named string fields.
pub trait TextStore {
    fn text(&self, key: &str) -> Option<&str>;

    /// Replace the value of `key`.
    fn update(&mut self, key: &str, value: String);

    fn has_text_field(&self, key: &str) -> bool {
        self.text(key).is_some()
    }
}

/// A JSON object used as a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// A record holding a single text field.
    pub fn with_text(key: &str, value: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.update(key, value.into());
        record
    }

    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl TextStore for Record {
    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    fn update(&mut self, key: &str, value: String) {
        self.fields.insert(key.to_string(), Value::String(value));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// The whole file is the `body` field.
    Markdown,
    /// The file is one JSON object.
    Json,
}

impl RecordFormat {
    pub fn for_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json { Self::Json } else { Self::Markdown }
    }
}

/// A [`Record`] backed by a file on disk.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
    format: RecordFormat,
    record: Record,
    /// Hash of the bytes last read from or written to disk.
    disk_hash: u64,
    modified: bool,
}

impl RecordFile {
    /// Load `path`, picking the format from its extension.
    ///
    /// # Errors
    /// Fails if the file cannot be read or a JSON file is not an object.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let format = RecordFormat::for_path(&path);
        let bytes = std::fs::read(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let record = parse(&path, format, &bytes)?;
        tracing::debug!(path = %path.display(), ?format, "record loaded");
        Ok(Self {
            path,
            format,
            record,
            disk_hash: hash_bytes(&bytes),
            modified: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn format(&self) -> RecordFormat {
        self.format
    }

    pub const fn record(&self) -> &Record {
        &self.record
    }

    /// Whether a field changed since the last load or save.
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether `bytes` are what this record last read or wrote.
    pub fn is_known_content(&self, bytes: &[u8]) -> bool {
        hash_bytes(bytes) == self.disk_hash
    }

    /// The file contents this record would save.
    ///
    /// # Errors
    /// Fails only if JSON serialization fails.
    pub fn serialize(&self) -> Result<String, StoreError> {
        match self.format {
            RecordFormat::Markdown => Ok(self.text(BODY_FIELD).unwrap_or_default().to_string()),
            RecordFormat::Json => {
                let mut out = serde_json::to_string_pretty(&self.record).map_err(
                    |source| StoreError::Json {
                        path: self.path.clone(),
                        source,
                    },
                )?;
                out.push('\n');
                Ok(out)
            }
        }
    }

    /// Write the record back in the format it was loaded in.
    ///
    /// # Errors
    /// Fails if serialization or the write fails.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let _scope = crate::perf::scope("store.save");
        let content = self.serialize()?;
        std::fs::write(&self.path, &content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.disk_hash = hash_bytes(content.as_bytes());
        self.modified = false;
        tracing::debug!(path = %self.path.display(), "record saved");
        Ok(())
    }

    /// Re-read the file. Returns `false` when its content is unchanged.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed; the record is untouched.
    pub fn reload(&mut self) -> Result<bool, StoreError> {
        let bytes = std::fs::read(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        if self.is_known_content(&bytes) {
            return Ok(false);
        }
        self.record = parse(&self.path, self.format, &bytes)?;
        self.disk_hash = hash_bytes(&bytes);
        self.modified = false;
        tracing::debug!(path = %self.path.display(), "record reloaded");
        Ok(true)
    }
}

impl TextStore for RecordFile {
    fn text(&self, key: &str) -> Option<&str> {
        self.record.text(key)
    }

    fn update(&mut self, key: &str, value: String) {
        if self.record.text(key) != Some(value.as_str()) {
            self.record.update(key, value);
            self.modified = true;
        }
    }
}

fn parse(path: &Path, format: RecordFormat, bytes: &[u8]) -> Result<Record, StoreError> {
    match format {
        RecordFormat::Markdown => Ok(Record::with_text(
            BODY_FIELD,
            String::from_utf8_lossy(bytes),
        )),
        RecordFormat::Json => {
            let value: Value = serde_json::from_slice(bytes).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            match value {
                Value::Object(fields) => Ok(Record::from(fields)),
                _ => Err(StoreError::NotAnObject {
                    path: path.to_path_buf(),
                }),
            }
        }
    }
}

pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}
