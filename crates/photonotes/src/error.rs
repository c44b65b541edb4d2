//! Error types for photonotes.
//!
//! This module defines all error types used throughout the photonotes crate.
//! Every variant maps onto one of a handful of [`ErrorKind`]s so callers can
//! decide how to surface a failure without matching on every variant.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for photonotes operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// Input was rejected before any storage was touched.
    #[error("invalid input: {message}")]
    Validation {
        /// Description of what was wrong with the input.
        message: String,
    },

    /// The operation targets a path that is not in the note index.
    #[error("no note references {}", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    // === Key-Value Store Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The background task running a store operation failed.
    #[error("key-value store task failed: {message}")]
    StoreTask {
        /// Description of the failure.
        message: String,
    },

    // === Image Store Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The captured image handed to `commit` does not exist.
    #[error("captured image {path} does not exist")]
    ImageMissing {
        /// The transient path that was supplied.
        path: PathBuf,
    },

    /// Moving a captured image into the managed directory failed.
    #[error("failed to commit {from} to {to}: {source}")]
    ImageCommit {
        /// The transient source path.
        from: PathBuf,
        /// The intended permanent path.
        to: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Removing a managed image failed for a reason other than not-found.
    #[error("failed to remove image {path}: {source}")]
    ImageRemove {
        /// The image that could not be removed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Index Errors ===
    /// The persisted note index could not be parsed.
    #[error("note index under key '{key}' is corrupt: {source}")]
    IndexCorrupt {
        /// The key the index is stored under.
        key: String,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },
}

/// A specialized Result type for photonotes operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// User-correctable input problem.
    Validation,
    /// The target note is not in the index.
    NotFound,
    /// File or key-value store I/O failed.
    Storage,
    /// The persisted index is unreadable.
    IndexCorrupt,
    /// Configuration could not be loaded or is invalid.
    Config,
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not-found error for the given path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a key-value store task failure.
    #[must_use]
    pub fn store_task(message: impl Into<String>) -> Self {
        Self::StoreTask {
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DatabaseOpen { .. }
            | Self::DatabaseQuery(_)
            | Self::DatabaseMigration { .. }
            | Self::StoreTask { .. }
            | Self::DirectoryCreate { .. }
            | Self::ImageMissing { .. }
            | Self::ImageCommit { .. }
            | Self::ImageRemove { .. }
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Storage,
            Self::IndexCorrupt { .. } => ErrorKind::IndexCorrupt,
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => ErrorKind::Config,
        }
    }

    /// Check if this error was caused by bad input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this error means the targeted note does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error is a file or key-value store failure.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }

    /// Check if this error means the persisted index is unreadable.
    #[must_use]
    pub fn is_index_corrupt(&self) -> bool {
        self.kind() == ErrorKind::IndexCorrupt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrupt_json_error() -> serde_json::Error {
        serde_json::from_str::<Vec<i32>>("{not json").unwrap_err()
    }

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("caption must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid input: caption must not be empty"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_not_found_error_display() {
        let err = Error::not_found("/photos/1.jpg");
        assert_eq!(err.to_string(), "no note references /photos/1.jpg");
        assert!(err.is_not_found());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_store_task_error_is_storage() {
        let err = Error::store_task("database task failed: cancelled");
        assert_eq!(
            err.to_string(),
            "key-value store task failed: database task failed: cancelled"
        );
        assert!(err.is_storage());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("denied"));
        assert!(err.is_storage());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_storage());
        }
    }

    #[test]
    fn test_index_corrupt_error() {
        let err = Error::IndexCorrupt {
            key: "@camera_notes".to_string(),
            source: corrupt_json_error(),
        };
        let msg = err.to_string();
        assert!(msg.contains("@camera_notes"));
        assert!(err.is_index_corrupt());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_image_errors_are_storage() {
        let missing = Error::ImageMissing {
            path: PathBuf::from("/tmp/capture.jpg"),
        };
        assert!(missing.to_string().contains("/tmp/capture.jpg"));
        assert!(missing.is_storage());

        let commit = Error::ImageCommit {
            from: PathBuf::from("/tmp/a.jpg"),
            to: PathBuf::from("/photos/1.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let msg = commit.to_string();
        assert!(msg.contains("/tmp/a.jpg"));
        assert!(msg.contains("/photos/1.jpg"));
        assert!(msg.contains("disk full"));
        assert!(commit.is_storage());

        let remove = Error::ImageRemove {
            path: PathBuf::from("/photos/1.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(remove.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_config_errors() {
        let err = Error::ConfigValidation {
            message: "index_key must not be empty".to_string(),
        };
        assert!(err.to_string().contains("index_key"));
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }
}
