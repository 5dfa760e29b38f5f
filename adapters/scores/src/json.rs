//! Leaderboard stored as a JSON document on disk.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{normalize_name, rank, ScoreEntry, ScoreStore, ScoreStoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

/// Leaderboard persisted to a JSON file.
///
/// A missing file reads as an empty leaderboard. Writes go through a
/// temporary file in the same directory and are renamed into place, so a
/// crash never leaves a half-written document behind.
#[derive(Clone, Debug)]
pub struct JsonScoreStore {
    path: PathBuf,
}

impl JsonScoreStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Leaderboard, ScoreStoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(Leaderboard::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_slice(&bytes).map_err(|source| ScoreStoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, leaderboard: &Leaderboard) -> Result<(), ScoreStoreError> {
        let json = serde_json::to_vec_pretty(leaderboard).map_err(|source| {
            ScoreStoreError::Format {
                path: self.path.clone(),
                source,
            }
        })?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|source| self.io_error(source))?;
        tmp.write_all(&json).map_err(|source| self.io_error(source))?;
        let _ = tmp
            .persist(&self.path)
            .map_err(|error| self.io_error(error.error))?;
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> ScoreStoreError {
        ScoreStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScoreStore for JsonScoreStore {
    fn save_score(&mut self, name: &str, score: u32) -> Result<(), ScoreStoreError> {
        let name = normalize_name(name)?;
        let mut leaderboard = self.read()?;
        leaderboard.entries.push(ScoreEntry { name, score });
        self.write(&leaderboard)?;
        debug!(
            path = %self.path.display(),
            entries = leaderboard.entries.len(),
            "leaderboard written"
        );
        Ok(())
    }

    fn load_top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, ScoreStoreError> {
        let leaderboard = self.read()?;
        Ok(rank(&leaderboard.entries, limit))
    }
}
