//! Export sinks - where a captured PNG ends up

use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;

use crate::errors::CompositeError;

/// Result of an export action as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExportOutcome {
    Saved { path: String, bytes: usize },
    /// `retryable` drives the retry affordance in the shell
    Failed { message: String, retryable: bool },
}

impl ExportOutcome {
    pub fn failed(err: impl std::fmt::Display) -> Self {
        ExportOutcome::Failed {
            message: err.to_string(),
            retryable: true,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, ExportOutcome::Saved { .. })
    }
}

/// Client-side save action
pub trait ExportSink: Send + Sync {
    /// Persist `bytes` under `filename`, returning where it went
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, CompositeError>;
}

/// Writes exports into a directory, by default the user's downloads folder
#[derive(Debug, Clone)]
pub struct FileExportSink {
    dir: PathBuf,
}

impl FileExportSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn downloads() -> Self {
        let dir = dirs::download_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir)
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl ExportSink for FileExportSink {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, CompositeError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        tracing::info!("Exported {} bytes to {:?}", bytes.len(), path);
        Ok(path)
    }
}

/// Keeps exports in memory; used by headless sessions and tests
#[derive(Debug, Default)]
pub struct MemoryExportSink {
    saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().clone()
    }
}

impl ExportSink for MemoryExportSink {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, CompositeError> {
        self.saved.lock().push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(format!("memory://{}", filename)))
    }
}
