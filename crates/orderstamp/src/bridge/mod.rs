//! Host file bridge: the only way the core touches the file system.
//!
//! Every operation reports failure as a [`BridgeError`] carrying the host's
//! message; nothing panics across the boundary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

pub mod local;

pub use local::LocalFileBridge;

/// Result of [`FileBridge::file_exists`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileCheck {
    pub exists: bool,
    pub is_file: bool,
}

#[async_trait]
pub trait FileBridge: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, BridgeError>;

    /// Creates or truncates `path`.
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), BridgeError>;

    async fn path_exists(&self, path: &Path) -> Result<bool, BridgeError>;

    async fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), BridgeError>;

    /// Entry names (not paths) in `path`, sorted.
    async fn list_directory(&self, path: &Path) -> Result<Vec<String>, BridgeError>;

    async fn file_exists(&self, path: &Path) -> Result<FileCheck, BridgeError>;
}

/// Filter for [`Dialogs::select_file`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    /// Extensions without the leading dot.
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn csv() -> Self {
        Self::new("CSV files", &["csv"])
    }

    pub fn pdf() -> Self {
        Self::new("PDF files", &["pdf"])
    }

    /// Whether `path` has one of the filter's extensions (case-insensitive).
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

/// Host pickers. `None` means the user cancelled.
#[async_trait]
pub trait Dialogs: Send + Sync {
    async fn select_folder(&self) -> Option<PathBuf>;
    async fn select_file(&self, filters: &[FileFilter]) -> Option<PathBuf>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory bridge that counts calls, for unit tests.

    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryBridge {
        pub files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
        pub dirs: Mutex<BTreeSet<PathBuf>>,
        pub calls: AtomicUsize,
        /// Paths whose writes fail with this message.
        pub failing_writes: Mutex<BTreeMap<PathBuf, String>>,
    }

    impl MemoryBridge {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
            self.dirs.lock().unwrap().insert(path.into());
            self
        }

        pub fn with_file(self, path: impl Into<PathBuf>, bytes: &[u8]) -> Self {
            self.files.lock().unwrap().insert(path.into(), bytes.to_vec());
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
            self.files.lock().unwrap().get(path.as_ref()).cloned()
        }

        fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl FileBridge for MemoryBridge {
        async fn read_file(&self, path: &Path) -> Result<Vec<u8>, BridgeError> {
            self.tick();
            self.file(path)
                .ok_or_else(|| BridgeError::new(format!("ENOENT: {}", path.display())))
        }

        async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), BridgeError> {
            self.tick();
            if let Some(message) = self.failing_writes.lock().unwrap().get(path) {
                return Err(BridgeError::new(message.clone()));
            }
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), bytes.to_vec());
            Ok(())
        }

        async fn path_exists(&self, path: &Path) -> Result<bool, BridgeError> {
            self.tick();
            Ok(self.dirs.lock().unwrap().contains(path)
                || self.files.lock().unwrap().contains_key(path))
        }

        async fn create_directory(&self, path: &Path, _recursive: bool) -> Result<(), BridgeError> {
            self.tick();
            self.dirs.lock().unwrap().insert(path.to_path_buf());
            Ok(())
        }

        async fn list_directory(&self, path: &Path) -> Result<Vec<String>, BridgeError> {
            self.tick();
            if !self.dirs.lock().unwrap().contains(path) {
                return Err(BridgeError::new(format!("ENOENT: {}", path.display())));
            }
            let names = self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter(|p| p.parent() == Some(path))
                .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
                .collect();
            Ok(names)
        }

        async fn file_exists(&self, path: &Path) -> Result<FileCheck, BridgeError> {
            self.tick();
            let is_file = self.files.lock().unwrap().contains_key(path);
            let is_dir = self.dirs.lock().unwrap().contains(path);
            Ok(FileCheck {
                exists: is_file || is_dir,
                is_file,
            })
        }
    }
}
