//! Isolated environment for session-level integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;

use orderstamp::bridge::{FileBridge, FileCheck};
use orderstamp::store::SettingsStore;
use orderstamp::{AppSettings, BridgeError, Config, Database, LocalFileBridge, SessionService};

use super::builders::PdfBuilder;

/// Local bridge that counts every call and every write.
#[derive(Default)]
pub struct CountingBridge {
    inner: LocalFileBridge,
    calls: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingBridge {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileBridge for CountingBridge {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, BridgeError> {
        self.tick();
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), BridgeError> {
        self.tick();
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_file(path, bytes).await
    }

    async fn path_exists(&self, path: &Path) -> Result<bool, BridgeError> {
        self.tick();
        self.inner.path_exists(path).await
    }

    async fn create_directory(&self, path: &Path, recursive: bool) -> Result<(), BridgeError> {
        self.tick();
        self.inner.create_directory(path, recursive).await
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<String>, BridgeError> {
        self.tick();
        self.inner.list_directory(path).await
    }

    async fn file_exists(&self, path: &Path) -> Result<FileCheck, BridgeError> {
        self.tick();
        self.inner.file_exists(path).await
    }
}

pub type TestService = SessionService<Database, CountingBridge>;

/// Temp folders for the date folder, pre-made designs and operator uploads.
pub struct TestHarness {
    temp_dir: TempDir,
    pub date_dir: PathBuf,
    pub premade_dir: PathBuf,
    pub designs_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let date_dir = base.join("2026-10-19");
        let premade_dir = base.join("premade");
        let designs_dir = base.join("designs");
        for dir in [&date_dir, &premade_dir, &designs_dir] {
            std::fs::create_dir_all(dir).expect("Failed to create test directory");
        }

        Self {
            temp_dir,
            date_dir,
            premade_dir,
            designs_dir,
        }
    }

    /// Service over an in-memory database with both folders configured and
    /// one rule per product family (`CH`, `CD`, `BL`).
    pub fn service(&self) -> TestService {
        let db = Database::open_in_memory().expect("Failed to open database");
        db.save_settings(&AppSettings {
            date_folder_path: self.date_dir.to_string_lossy().into_owned(),
            premade_folder_path: self.premade_dir.to_string_lossy().into_owned(),
        })
        .expect("Failed to save settings");

        let service = SessionService::new(db, CountingBridge::default(), &Config::default());
        for (priority, family) in ["CH", "CD", "BL"].iter().enumerate() {
            service
                .add_rule(family, family, priority as i32 + 1)
                .expect("Failed to add rule");
        }
        service
    }

    /// Writes a blank one-page design into the uploads folder.
    pub fn design(&self, name: &str) -> PathBuf {
        let path = self.designs_dir.join(name);
        std::fs::write(&path, PdfBuilder::new().size(400, 800).build())
            .expect("Failed to write design");
        path
    }

    pub fn premade(&self, name: &str) -> PathBuf {
        let path = self.premade_dir.join(name);
        std::fs::write(&path, PdfBuilder::new().build()).expect("Failed to write design");
        path
    }

    pub fn routed(&self, folder: &str, file: &str) -> PathBuf {
        self.date_dir.join(folder).join(file)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}
