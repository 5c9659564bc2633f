use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use super::{FileBridge, FileCheck};
use crate::error::BridgeError;

/// File bridge backed by the local file system through `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct LocalFileBridge;

impl LocalFileBridge {
    pub fn new() -> Self {
        Self
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> BridgeError {
    BridgeError::new(format!("{} '{}': {}", action, path.display(), err))
}

#[async_trait]
impl FileBridge for LocalFileBridge {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, BridgeError> {
        fs::read(path)
            .await
            .map_err(|e| io_error("Failed to read", path, e))
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), BridgeError> {
        fs::write(path, bytes)
            .await
            .map_err(|e| io_error("Failed to write", path, e))
    }

    async fn path_exists(&self, path: &Path) -> Result<bool, BridgeError> {
        fs::try_exists(path)
            .await
            .map_err(|e| io_error("Failed to check", path, e))
    }

    async fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), BridgeError> {
        let result = if recursive {
            fs::create_dir_all(path).await
        } else {
            fs::create_dir(path).await
        };
        result.map_err(|e| io_error("Failed to create directory", path, e))
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<String>, BridgeError> {
        let mut entries = fs::read_dir(path)
            .await
            .map_err(|e| io_error("Failed to list", path, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("Failed to list", path, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn file_exists(&self, path: &Path) -> Result<FileCheck, BridgeError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(FileCheck {
                exists: true,
                is_file: meta.is_file(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileCheck::default()),
            Err(e) => Err(io_error("Failed to check", path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_and_check() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = LocalFileBridge::new();
        let path = dir.path().join("a.pdf");

        assert_eq!(bridge.file_exists(&path).await.unwrap(), FileCheck::default());
        bridge.write_file(&path, b"%PDF-1.5").await.unwrap();
        assert_eq!(bridge.read_file(&path).await.unwrap(), b"%PDF-1.5");
        assert!(bridge.path_exists(&path).await.unwrap());
        assert_eq!(
            bridge.file_exists(&path).await.unwrap(),
            FileCheck {
                exists: true,
                is_file: true
            }
        );
        assert_eq!(
            bridge.file_exists(dir.path()).await.unwrap(),
            FileCheck {
                exists: true,
                is_file: false
            }
        );
    }

    #[tokio::test]
    async fn test_create_directory_recursive_flag() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = LocalFileBridge::new();
        let nested = dir.path().join("x").join("y");

        assert!(bridge.create_directory(&nested, false).await.is_err());
        bridge.create_directory(&nested, true).await.unwrap();
        assert!(bridge.path_exists(&nested).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_directory_sorted_names() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = LocalFileBridge::new();
        for name in ["b.pdf", "a.pdf", "c.txt"] {
            bridge
                .write_file(&dir.path().join(name), b"x")
                .await
                .unwrap();
        }
        assert_eq!(
            bridge.list_directory(dir.path()).await.unwrap(),
            vec!["a.pdf", "b.pdf", "c.txt"]
        );
    }

    #[tokio::test]
    async fn test_errors_carry_path_and_reason() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = LocalFileBridge::new();
        let missing = dir.path().join("missing.pdf");

        let err = bridge.read_file(&missing).await.unwrap_err();
        assert!(err.message.starts_with("Failed to read"));
        assert!(err.message.contains("missing.pdf"));
    }
}
