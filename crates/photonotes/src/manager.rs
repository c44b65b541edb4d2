//! Note lifecycle management.
//!
//! [`NoteManager`] composes the [`NoteIndex`] and the [`ImageStore`] so that
//! an index entry never points at a file that is not there:
//!
//! - creating a note commits the image first and writes the index second
//! - deleting a note writes the index first and removes the image second
//!
//! A failure between the two steps can leave an orphaned image behind, but
//! never a dangling index entry. Orphans are not cleaned up automatically;
//! [`NoteManager::check_consistency`] reports them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::images::ImageStore;
use crate::index::NoteIndex;
use crate::note::{normalize_caption, MonotonicClock, Note};
use crate::storage::SqliteStore;

/// Create, list, edit and delete photo notes.
///
/// Every operation reloads the index from durable storage; nothing is cached
/// between calls. Operations are meant to be issued one at a time.
#[derive(Debug)]
pub struct NoteManager {
    index: NoteIndex,
    images: ImageStore,
    clock: MonotonicClock,
}

impl NoteManager {
    /// Compose a manager from an index and an image store.
    #[must_use]
    pub fn new(index: NoteIndex, images: ImageStore) -> Self {
        Self {
            index,
            images,
            clock: MonotonicClock::new(),
        }
    }

    /// Open the durable stores described by `config`.
    ///
    /// Opens (or creates) the `SQLite` database and the image directory.
    ///
    /// # Errors
    ///
    /// Returns an error if either store cannot be opened.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = SqliteStore::open(config.database_path())?;
        let index = NoteIndex::with_key(Arc::new(store), config.notes.index_key.clone());
        let images =
            ImageStore::with_extension(config.images_dir(), config.notes.image_extension.clone());
        images.ensure_directory().await?;
        Ok(Self::new(index, images))
    }

    /// The underlying note index.
    #[must_use]
    pub fn index(&self) -> &NoteIndex {
        &self.index
    }

    /// The underlying image store.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    /// Store a freshly captured image together with its caption.
    ///
    /// The image is moved out of `captured` into the image store. The
    /// caption is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the caption is blank, `captured` is empty,
    ///   or `captured` is already a stored image; nothing is touched
    /// - [`Error::IndexCorrupt`] if the stored index is unreadable; nothing
    ///   is touched
    /// - a storage error if the image cannot be committed; the index is not
    ///   touched
    /// - a storage error if the index cannot be saved; the committed image
    ///   is left behind as an orphan
    pub async fn create_note(&self, captured: impl AsRef<Path>, caption: &str) -> Result<Note> {
        let captured = captured.as_ref();
        if captured.as_os_str().is_empty() {
            return Err(Error::validation("captured image path must not be empty"));
        }
        let caption = normalize_caption(caption)?;

        let mut notes = self.index.load().await?;
        if notes.iter().any(|n| n.refers_to(captured))
            || self.images.resolves_inside(captured).await
        {
            return Err(Error::validation(format!(
                "{} is already a stored image",
                captured.display()
            )));
        }
        self.observe(&notes);

        let path = self
            .images
            .commit_avoiding(captured, |candidate| {
                notes.iter().any(|n| n.refers_to(candidate))
            })
            .await
            .map_err(|e| {
                error!("Failed to commit {}: {}", captured.display(), e);
                e
            })?;

        let note = Note::new(path, caption, self.clock.now_millis());
        notes.push(note.clone());

        if let Err(e) = self.index.save(&notes).await {
            warn!(
                "Image {} is orphaned: index save failed after commit",
                note.path.display()
            );
            return Err(e);
        }

        info!("Created note for {}", note.path.display());
        Ok(note)
    }

    /// All notes, newest first.
    ///
    /// Notes with equal timestamps keep their stored relative order. An
    /// unreadable index is reported in the log and listed as empty.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the index cannot be read.
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let mut notes = self.load_for_read().await?;
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notes)
    }

    /// The note that owns `path`, if any.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the index cannot be read.
    pub async fn get_note(&self, path: impl AsRef<Path>) -> Result<Option<Note>> {
        let path = path.as_ref();
        let notes = self.load_for_read().await?;
        Ok(notes.into_iter().find(|n| n.refers_to(path)))
    }

    /// Replace the caption of the note that owns `path`.
    ///
    /// The note's timestamp is set to now.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the new caption is blank
    /// - [`Error::NotFound`] if no note owns `path`
    /// - [`Error::IndexCorrupt`] or a storage error if the index cannot be
    ///   loaded or saved; the stored index is then unchanged
    pub async fn update_caption(&self, path: impl AsRef<Path>, new_caption: &str) -> Result<Note> {
        let path = path.as_ref();
        let caption = normalize_caption(new_caption)?;

        let mut notes = self.index.load().await?;
        self.observe(&notes);
        let Some(note) = notes.iter_mut().find(|n| n.refers_to(path)) else {
            return Err(Error::not_found(path));
        };
        note.caption = caption;
        note.timestamp = self.clock.now_millis();
        let updated = note.clone();

        self.index.save(&notes).await?;
        info!("Updated caption for {}", path.display());
        Ok(updated)
    }

    /// Delete the note that owns `path` together with its image.
    ///
    /// Returns the removed note, or `None` if no note owned `path`. Deleting
    /// an absent note is not an error; if `path` lies in the image directory
    /// any leftover file there is removed, so repeating a delete whose image
    /// removal failed finishes the job.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexCorrupt`] or a storage error if the index cannot be
    ///   loaded or saved; neither the index nor the image is touched
    /// - a storage error if the image cannot be removed after the index was
    ///   saved; the image is left behind as an orphan
    pub async fn delete_note(&self, path: impl AsRef<Path>) -> Result<Option<Note>> {
        let path = path.as_ref();
        let mut notes = self.index.load().await?;

        let Some(position) = notes.iter().position(|n| n.refers_to(path)) else {
            debug!("No note owns {}, nothing to delete", path.display());
            if self.images.manages(path) {
                self.images.remove(path).await?;
            }
            return Ok(None);
        };
        let removed = notes.remove(position);

        self.index.save(&notes).await?;

        if let Err(e) = self.images.remove(&removed.path).await {
            warn!(
                "Image {} is orphaned: removal failed after index save",
                removed.path.display()
            );
            return Err(e);
        }

        info!("Deleted note for {}", removed.path.display());
        Ok(Some(removed))
    }

    /// Compare the index against the image directory.
    ///
    /// This only reports; it never modifies either store.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or the image directory cannot be read.
    pub async fn check_consistency(&self) -> Result<ConsistencyReport> {
        let notes = self.index.load().await?;
        let files = self.images.list().await?;

        let mut dangling = Vec::new();
        for note in &notes {
            if !self.images.contains(&note.path).await? {
                dangling.push(note.clone());
            }
        }

        let orphaned: Vec<PathBuf> = files
            .iter()
            .filter(|file| !notes.iter().any(|n| n.refers_to(file)))
            .cloned()
            .collect();

        if !dangling.is_empty() || !orphaned.is_empty() {
            warn!(
                "Consistency check found {} dangling notes and {} orphaned images",
                dangling.len(),
                orphaned.len()
            );
        }

        Ok(ConsistencyReport {
            note_count: notes.len(),
            image_count: files.len(),
            dangling,
            orphaned,
        })
    }

    /// Keep new timestamps ahead of every stored one, even if the wall clock
    /// has stepped back since they were written.
    fn observe(&self, notes: &[Note]) {
        if let Some(latest) = notes.iter().map(|n| n.timestamp).max() {
            self.clock.observe(latest);
        }
    }

    /// Load for read-only use, treating a corrupt index as empty.
    async fn load_for_read(&self) -> Result<Vec<Note>> {
        match self.index.load().await {
            Err(e) if e.is_index_corrupt() => {
                warn!("Treating note index as empty: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }
}

/// Result of [`NoteManager::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Number of notes in the index.
    pub note_count: usize,
    /// Number of files in the image directory.
    pub image_count: usize,
    /// Notes whose image file is missing.
    pub dangling: Vec<Note>,
    /// Image files no note refers to.
    pub orphaned: Vec<PathBuf>,
}

impl ConsistencyReport {
    /// `true` if there are neither dangling notes nor orphaned images.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.orphaned.is_empty()
    }
}
