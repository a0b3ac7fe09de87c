//! Download record and identifier types.

use std::borrow::Borrow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::timestamp;

/// Earliest publication year accepted in an identifier.
const MIN_ID_YEAR: i32 = 2000;
/// Latest publication year accepted in an identifier.
const MAX_ID_YEAR: i32 = 2030;
/// Upper bound for a sanitized filename, in characters.
const MAX_FILENAME_LEN: usize = 255;
/// Characters replaced with `_` when sanitizing.
const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Why an identifier was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordIdError {
    #[error("identifier must have 4 dash-separated segments, got {0}")]
    WrongSegmentCount(usize),

    #[error("date segment must be 8 digits (YYYYMMDD), got {0:?}")]
    MalformedDate(String),

    #[error("date segment {0:?} is not a real calendar date")]
    InvalidDate(String),

    #[error("year {0} is outside 2000-2030")]
    YearOutOfRange(i32),

    #[error("segment {index} must be non-empty digits, got {value:?}")]
    NonNumericSegment { index: usize, value: String },

    #[error("year segment must be 4 digits, got {0:?}")]
    MalformedYear(String),
}

/// Identifier of a tracked document.
///
/// Shape: `<YYYYMMDD>-<digits>-<YYYY>-<digits>`, e.g. `20250301-01234-2025-7`.
/// [`RecordId::parse`] validates the shape and that the leading date is a
/// real calendar day between 2000 and 2030. Identifiers read back from a
/// persisted store are trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Validate and wrap an identifier.
    pub fn parse(raw: &str) -> Result<Self, RecordIdError> {
        let raw = raw.trim();
        let segments: Vec<&str> = raw.split('-').collect();
        if segments.len() != 4 {
            return Err(RecordIdError::WrongSegmentCount(segments.len()));
        }

        let date = segments[0];
        if date.len() != 8 || !is_digits(date) {
            return Err(RecordIdError::MalformedDate(date.to_string()));
        }
        let parsed = NaiveDate::parse_from_str(date, "%Y%m%d")
            .map_err(|_| RecordIdError::InvalidDate(date.to_string()))?;
        let year = chrono::Datelike::year(&parsed);
        if !(MIN_ID_YEAR..=MAX_ID_YEAR).contains(&year) {
            return Err(RecordIdError::YearOutOfRange(year));
        }

        for (index, segment) in segments.iter().enumerate().skip(1) {
            if !is_digits(segment) {
                return Err(RecordIdError::NonNumericSegment {
                    index,
                    value: (*segment).to_string(),
                });
            }
        }
        if segments[2].len() != 4 {
            return Err(RecordIdError::MalformedYear(segments[2].to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Borrow<str> for RecordId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Make a display filename safe for the local filesystem.
///
/// Path separators, reserved characters and control characters become `_`.
/// Names longer than 255 characters keep their extension and have the stem
/// cut to 250 characters.
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_control() || UNSAFE_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.chars().count() <= MAX_FILENAME_LEN {
        return cleaned;
    }

    let (stem, ext) = match cleaned.rfind('.') {
        Some(dot) if dot > 0 => cleaned.split_at(dot),
        _ => (cleaned.as_str(), ""),
    };
    let stem: String = stem.chars().take(MAX_FILENAME_LEN - 5).collect();
    let ext: String = ext.chars().take(MAX_FILENAME_LEN - stem.chars().count()).collect();
    format!("{stem}{ext}")
}

/// One tracked artifact.
///
/// `downloaded_at` is fixed at creation. Path, size and the compressed flag
/// only change through [`DownloadRecord::mark_compressed`], which never
/// clears the flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    #[serde(alias = "edicto_id")]
    id: RecordId,

    filename: String,

    #[serde(alias = "download_date", with = "timestamp")]
    downloaded_at: DateTime<Utc>,

    #[serde(alias = "file_size", default)]
    file_size: u64,

    #[serde(alias = "file_path")]
    file_path: PathBuf,

    #[serde(default, deserialize_with = "non_empty_checksum")]
    checksum: Option<String>,

    #[serde(default)]
    compressed: bool,
}

fn non_empty_checksum<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.trim().is_empty()))
}

impl DownloadRecord {
    /// Create a record for a freshly registered download.
    ///
    /// The filename is sanitized here so every record carries a safe name.
    pub fn new(
        id: RecordId,
        filename: &str,
        downloaded_at: DateTime<Utc>,
        file_size: u64,
        file_path: impl Into<PathBuf>,
        checksum: Option<String>,
    ) -> Self {
        Self {
            id,
            filename: sanitize_filename(filename),
            downloaded_at,
            file_size,
            file_path: file_path.into(),
            checksum: checksum.filter(|c| !c.is_empty()),
            compressed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn downloaded_at(&self) -> DateTime<Utc> {
        self.downloaded_at
    }

    /// Recorded size in bytes. May drift from the file on disk.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Content hash taken at registration, before any compression.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Point the record at its compressed artifact.
    ///
    /// The checksum is kept: it still describes the original content, which
    /// is why compressed records cannot be verified against it.
    pub fn mark_compressed(&mut self, compressed_path: impl Into<PathBuf>, compressed_size: u64) {
        self.file_path = compressed_path.into();
        self.file_size = compressed_size;
        self.compressed = true;
    }
}
