//! Q-table keyed by after-state.
//!
//! The table maps a board state key to a scalar value. Lookups through
//! [`QTable::value`] insert the default value on first sight, so the table
//! only ever grows while training.
//!
//! On disk the table is a gzip stream wrapping a JSON object
//! `{"<state key>": value, ...}` with keys in sorted order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Mapping from after-state key to learned value.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    /// Values by state key
    values: BTreeMap<String, f64>,
    /// Value assigned to keys seen for the first time
    default_value: f64,
}

impl QTable {
    /// Create an empty table
    pub fn new(default_value: f64) -> Self {
        Self {
            values: BTreeMap::new(),
            default_value,
        }
    }

    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    /// Value for `key`, inserting the default value if it is missing.
    pub fn value(&mut self, key: &str) -> f64 {
        if let Some(&v) = self.values.get(key) {
            return v;
        }
        self.values.insert(key.to_string(), self.default_value);
        self.default_value
    }

    /// Value for `key` without inserting anything.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Get total number of values stored
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Writes the table as gzip-compressed JSON.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut encoder, &self.values)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    /// Reads a table written by [`QTable::write_to`].
    ///
    /// `default_value` applies to keys first seen after loading.
    pub fn read_from<R: Read>(reader: R, default_value: f64) -> Result<Self> {
        let mut json = String::new();
        GzDecoder::new(reader).read_to_string(&mut json)?;
        let values: BTreeMap<String, f64> = serde_json::from_str(&json)?;
        Ok(Self {
            values,
            default_value,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::TableIo {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_to(BufWriter::new(file)).map_err(|e| with_path(e, path))
    }

    /// Loads a saved table. A missing or unreadable file is an error.
    pub fn load<P: AsRef<Path>>(path: P, default_value: f64) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::TableIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_from(BufReader::new(file), default_value).map_err(|e| with_path(e, path))
    }

    /// Loads a saved table, or starts an empty one when the file does not
    /// exist. Corrupt files are still reported.
    pub fn load_or_default<P: AsRef<Path>>(path: P, default_value: f64) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new(default_value));
        }
        Self::load(path, default_value)
    }
}

fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::Io(source) => Error::TableIo {
            path: path.to_path_buf(),
            source,
        },
        Error::Json(source) => Error::TableCorrupt {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}
