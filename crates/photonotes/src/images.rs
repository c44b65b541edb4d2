//! Managed image directory.
//!
//! The [`ImageStore`] owns every file under one directory. Captured photos
//! enter it through [`ImageStore::commit`] and leave it through
//! [`ImageStore::remove`]; nothing else in the crate touches those files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::note::MonotonicClock;

/// Default extension for committed images.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Image files under a single managed directory.
#[derive(Debug)]
pub struct ImageStore {
    root: PathBuf,
    extension: String,
    clock: MonotonicClock,
}

impl ImageStore {
    /// Create a store rooted at `root` that names files `<millis>.jpg`.
    ///
    /// The directory is not touched until [`ensure_directory`](Self::ensure_directory)
    /// or [`commit`](Self::commit) is called.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_extension(root, DEFAULT_EXTENSION)
    }

    /// Create a store that names files `<millis>.<extension>`.
    #[must_use]
    pub fn with_extension(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            clock: MonotonicClock::new(),
        }
    }

    /// The managed directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether `path` names an entry directly inside the managed
    /// directory. This is a lexical check; the file need not exist.
    #[must_use]
    pub fn manages(&self, path: &Path) -> bool {
        path.parent() == Some(self.root.as_path()) && path.file_name().is_some()
    }

    /// Like [`manages`](Self::manages), but also matches when `path` reaches
    /// the managed directory through symlinks or relative components.
    ///
    /// Paths that cannot be resolved fall back to the lexical check.
    pub async fn resolves_inside(&self, path: &Path) -> bool {
        if self.manages(path) {
            return true;
        }
        match (fs::canonicalize(path).await, fs::canonicalize(&self.root).await) {
            (Ok(path), Ok(root)) => path.parent() == Some(root.as_path()),
            _ => false,
        }
    }

    /// Create the managed directory, including missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] if the directory cannot be created.
    pub async fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: self.root.clone(),
                source,
            })
    }

    /// Move a captured image into the managed directory.
    ///
    /// Returns the permanent path of the committed file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageMissing`] if `temporary` does not exist, or
    /// [`Error::ImageCommit`] if the move fails. In both cases the source
    /// file is left where it was and nothing new remains in the managed
    /// directory.
    pub async fn commit(&self, temporary: impl AsRef<Path>) -> Result<PathBuf> {
        self.commit_avoiding(temporary, |_| false).await
    }

    /// Like [`commit`](Self::commit), but also skips any candidate name for
    /// which `taken` returns `true`.
    ///
    /// The note manager uses this to keep names distinct from paths already
    /// referenced by the index even if their files have gone missing.
    ///
    /// # Errors
    ///
    /// Same as [`commit`](Self::commit).
    pub async fn commit_avoiding<F>(&self, temporary: impl AsRef<Path>, taken: F) -> Result<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        let temporary = temporary.as_ref();

        match fs::metadata(temporary).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(Error::ImageCommit {
                    from: temporary.to_path_buf(),
                    to: self.root.clone(),
                    source: std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ImageMissing {
                    path: temporary.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(Error::ImageCommit {
                    from: temporary.to_path_buf(),
                    to: self.root.clone(),
                    source,
                })
            }
        }

        self.ensure_directory().await?;
        let target = self.next_free_path(&taken).await?;

        if let Err(rename_err) = fs::rename(temporary, &target).await {
            debug!(
                "rename {} -> {} failed ({}), falling back to copy",
                temporary.display(),
                target.display(),
                rename_err
            );
            self.copy_then_remove(temporary, &target).await?;
        }

        info!("Committed {} as {}", temporary.display(), target.display());
        Ok(target)
    }

    /// Cross-device move: copy, then drop the source.
    async fn copy_then_remove(&self, from: &Path, to: &Path) -> Result<()> {
        if let Err(source) = fs::copy(from, to).await {
            if let Err(cleanup) = fs::remove_file(to).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(
                        "could not clean up partial copy {}: {}",
                        to.display(),
                        cleanup
                    );
                }
            }
            return Err(Error::ImageCommit {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source,
            });
        }

        // The image is committed at this point; a leftover source is only a
        // stale temporary.
        if let Err(e) = fs::remove_file(from).await {
            warn!(
                "committed {} but could not remove source {}: {}",
                to.display(),
                from.display(),
                e
            );
        }
        Ok(())
    }

    /// Pick `<millis>.<ext>` with a seed no other file or caller claims.
    async fn next_free_path<F>(&self, taken: &F) -> Result<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        loop {
            let seed = self.clock.now_millis();
            let candidate = self.root.join(format!("{seed}.{}", self.extension));
            if taken(&candidate) {
                continue;
            }
            match fs::try_exists(&candidate).await {
                Ok(false) => return Ok(candidate),
                Ok(true) => {}
                Err(source) => {
                    return Err(Error::ImageCommit {
                        from: PathBuf::new(),
                        to: candidate,
                        source,
                    })
                }
            }
        }
    }

    /// Delete a managed image. Missing files are not an error.
    ///
    /// Returns `true` if a file was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageRemove`] on any I/O failure other than not-found.
    pub async fn remove(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed image {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Image {} already absent", path.display());
                Ok(false)
            }
            Err(source) => Err(Error::ImageRemove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Check whether `path` is an existing regular file inside the managed
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's metadata cannot be read for a reason
    /// other than not-found.
    pub async fn contains(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        if !self.manages(path) {
            return Ok(false);
        }
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List the regular files in the managed directory, sorted by path.
    ///
    /// A missing directory lists as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn write_capture(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"jpeg bytes").await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_ensure_directory_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a/b/photos");
        let store = ImageStore::new(&root);

        store.ensure_directory().await.unwrap();
        assert!(root.is_dir());

        // Idempotent
        store.ensure_directory().await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        let capture = write_capture(dir.path(), "capture.jpg").await;

        let committed = store.commit(&capture).await.unwrap();

        assert!(!capture.exists());
        assert!(committed.starts_with(store.root()));
        assert_eq!(committed.extension().unwrap(), "jpg");
        assert_eq!(fs::read(&committed).await.unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_commit_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));

        let mut seen = HashSet::new();
        for i in 0..20 {
            let capture = write_capture(dir.path(), &format!("c{i}.jpg")).await;
            let committed = store.commit(&capture).await.unwrap();
            assert!(seen.insert(committed));
        }
        assert_eq!(store.list().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_commit_skips_existing_names_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("photos");

        let first = ImageStore::new(&root);
        let second = ImageStore::new(&root);

        let a = first
            .commit(write_capture(dir.path(), "a.jpg").await)
            .await
            .unwrap();
        let b = second
            .commit(write_capture(dir.path(), "b.jpg").await)
            .await
            .unwrap();
        assert_ne!(a, b);
        assert!(a.exists());
        assert!(b.exists());
    }

    #[tokio::test]
    async fn test_commit_avoiding_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        let first = store
            .commit(write_capture(dir.path(), "a.jpg").await)
            .await
            .unwrap();
        fs::remove_file(&first).await.unwrap();

        let second = store
            .commit_avoiding(write_capture(dir.path(), "b.jpg").await, |p| p == first)
            .await
            .unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_commit_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));

        let err = store
            .commit(dir.path().join("does-not-exist.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ImageMissing { .. }));
        assert!(err.is_storage());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_directory_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        let not_a_file = dir.path().join("folder");
        fs::create_dir(&not_a_file).await.unwrap();

        let err = store.commit(&not_a_file).await.unwrap_err();
        assert!(matches!(err, Error::ImageCommit { .. }));
        assert!(not_a_file.is_dir());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::with_extension(dir.path().join("photos"), "png");
        let committed = store
            .commit(write_capture(dir.path(), "c.png").await)
            .await
            .unwrap();
        assert_eq!(committed.extension().unwrap(), "png");
    }

    #[tokio::test]
    async fn test_remove_existing_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        let committed = store
            .commit(write_capture(dir.path(), "c.jpg").await)
            .await
            .unwrap();

        assert!(store.remove(&committed).await.unwrap());
        assert!(!committed.exists());
        assert!(!store.remove(&committed).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        store.ensure_directory().await.unwrap();

        // A directory where a file is expected cannot be unlinked.
        let blocker = store.root().join("123.jpg");
        fs::create_dir(&blocker).await.unwrap();

        let err = store.remove(&blocker).await.unwrap_err();
        assert!(matches!(err, Error::ImageRemove { .. }));
    }

    #[tokio::test]
    async fn test_contains() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        let committed = store
            .commit(write_capture(dir.path(), "c.jpg").await)
            .await
            .unwrap();

        assert!(store.contains(&committed).await.unwrap());
        assert!(!store.contains(store.root().join("nope.jpg")).await.unwrap());
        assert!(!store.contains(store.root()).await.unwrap());
    }

    #[tokio::test]
    async fn test_contains_ignores_files_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        let outside = write_capture(dir.path(), "outside.jpg").await;

        assert!(outside.is_file());
        assert!(!store.contains(&outside).await.unwrap());
    }

    #[tokio::test]
    async fn test_resolves_inside_through_relative_components() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("photos"));
        let committed = store
            .commit(write_capture(dir.path(), "c.jpg").await)
            .await
            .unwrap();
        let name = committed.file_name().unwrap();
        let roundabout = dir.path().join("photos/../photos").join(name);

        assert!(!store.manages(&roundabout));
        assert!(store.resolves_inside(&roundabout).await);
        assert!(store.resolves_inside(&committed).await);

        let outside = write_capture(dir.path(), "outside.jpg").await;
        assert!(!store.resolves_inside(&outside).await);
        assert!(!store.resolves_inside(&dir.path().join("missing.jpg")).await);
    }

    #[test]
    fn test_manages() {
        let store = ImageStore::new("/data/photos");
        assert!(store.manages(Path::new("/data/photos/1.jpg")));
        assert!(!store.manages(Path::new("/data/photos")));
        assert!(!store.manages(Path::new("/data/photos/sub/1.jpg")));
        assert!(!store.manages(Path::new("/tmp/1.jpg")));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }
}
