//! Core note types for photonotes.
//!
//! A [`Note`] binds one managed image file to a caption and a timestamp. The
//! serialized shape (`path`, `caption`, `timestamp` in epoch milliseconds) is
//! the persisted layout of the note index.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A stored photo note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Location of the owned image in the image store. Unique within the index.
    pub path: PathBuf,

    /// User text, already trimmed.
    pub caption: String,

    /// Creation or last-edit time, in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Note {
    /// Create a note from already-validated parts.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, caption: impl Into<String>, timestamp: i64) -> Self {
        Self {
            path: path.into(),
            caption: caption.into(),
            timestamp,
        }
    }

    /// Check whether this note owns the image at `path`.
    #[must_use]
    pub fn refers_to(&self, path: &Path) -> bool {
        self.path == path
    }

    /// The timestamp as a UTC date-time.
    ///
    /// Returns `None` if the stored millisecond value is out of range.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Trim a caption and reject it if nothing is left.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the caption is empty after trimming.
pub fn normalize_caption(caption: &str) -> Result<String> {
    let trimmed = caption.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("caption must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Milliseconds since the Unix epoch, never repeating within one clock.
///
/// Successive calls return strictly increasing values even when the wall clock
/// has not advanced (or has stepped backwards) since the previous call.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    /// Create a new clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next timestamp.
    pub fn now_millis(&self) -> i64 {
        let wall = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let next = wall.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Make sure later calls return values greater than `millis`.
    pub fn observe(&self, millis: i64) {
        self.last.fetch_max(millis, Ordering::SeqCst);
    }
}
