//! `photonotes` - Captured photos paired with short captions
//!
//! This library keeps a list of note records consistent with the image files
//! they own: a [`NoteIndex`] persisted in a [`KeyValueStore`], an
//! [`ImageStore`] over one managed directory, and a [`NoteManager`] that
//! orders writes to the two so that no note ever points at a missing image.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod images;
pub mod index;
pub mod logging;
pub mod manager;
pub mod note;
pub mod storage;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use images::ImageStore;
pub use index::NoteIndex;
pub use logging::init_logging;
pub use manager::{ConsistencyReport, NoteManager};
pub use note::Note;
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
