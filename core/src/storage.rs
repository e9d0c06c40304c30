use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::DiveError;
use crate::models::DiveSummary;
use crate::wire::{decode_history, encode_history};

/// Persistence of the viewer's dive history as one opaque blob.
pub trait HistoryStore {
    fn save(&mut self, history: &[DiveSummary]) -> Result<(), DiveError>;
    fn load(&self) -> Result<Vec<DiveSummary>, DiveError>;
}

/// History kept as an encoded blob in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blob: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved blob, if any.
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl HistoryStore for MemoryStore {
    fn save(&mut self, history: &[DiveSummary]) -> Result<(), DiveError> {
        self.blob = Some(encode_history(history)?);
        Ok(())
    }

    fn load(&self) -> Result<Vec<DiveSummary>, DiveError> {
        match &self.blob {
            Some(blob) => decode_history(blob),
            None => Ok(Vec::new()),
        }
    }
}

/// History kept as a pretty-printed JSON file.
///
/// A missing file loads as an empty history. Saves go through a sibling
/// temporary file and a rename so a crash never leaves a half-written file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl HistoryStore for JsonFileStore {
    fn save(&mut self, history: &[DiveSummary]) -> Result<(), DiveError> {
        let json = encode_history(history)?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| DiveError::Storage(format!("{}: {e}", temp.display())))?;
        fs::rename(&temp, &self.path)
            .map_err(|e| DiveError::Storage(format!("{}: {e}", self.path.display())))?;
        debug!("saved {} dives to {}", history.len(), self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Vec<DiveSummary>, DiveError> {
        if !self.path.exists() {
            debug!("no history at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| DiveError::Storage(format!("{}: {e}", self.path.display())))?;
        let history = decode_history(&contents)?;
        debug!("loaded {} dives from {}", history.len(), self.path.display());
        Ok(history)
    }
}
