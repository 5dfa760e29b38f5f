#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Leaderboard persistence for finished rounds.
//!
//! The round engine never talks to storage directly. Hosts hand the final
//! score of a round to a [`ScoreStore`] once the round has ended, usually
//! through [`submit_final_score`], which logs failures instead of surfacing
//! them to the player.

use std::{io, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

mod json;

pub use json::JsonScoreStore;

/// Longest player name accepted by a store, counted in characters.
pub const MAX_NAME_LEN: usize = 24;

/// Single leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player name, trimmed.
    pub name: String,
    /// Final score of the round.
    pub score: u32,
}

/// Persistence contract for final scores.
pub trait ScoreStore {
    /// Records a final score under `name`.
    fn save_score(&mut self, name: &str, score: u32) -> Result<(), ScoreStoreError>;

    /// Returns up to `limit` entries, best score first.
    ///
    /// Entries with equal scores keep the order in which they were saved.
    fn load_top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, ScoreStoreError>;
}

/// Reasons a score could not be stored or read back.
#[derive(Debug, Error)]
pub enum ScoreStoreError {
    /// The name is blank after trimming.
    #[error("player name must not be empty")]
    EmptyName,
    /// The name exceeds [`MAX_NAME_LEN`].
    #[error("player name has {len} characters, the limit is {max}")]
    NameTooLong {
        /// Length of the rejected name.
        len: usize,
        /// Maximum accepted length.
        max: usize,
    },
    /// The backing file could not be read or written.
    #[error("failed to access leaderboard at {path}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file does not contain a leaderboard.
    #[error("leaderboard at {path} is malformed")]
    Format {
        /// File being parsed.
        path: PathBuf,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Leaderboard kept in memory for the lifetime of the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryScoreStore {
    entries: Vec<ScoreEntry>,
}

impl MemoryScoreStore {
    /// Creates an empty leaderboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded scores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn save_score(&mut self, name: &str, score: u32) -> Result<(), ScoreStoreError> {
        let name = normalize_name(name)?;
        self.entries.push(ScoreEntry { name, score });
        Ok(())
    }

    fn load_top_scores(&self, limit: usize) -> Result<Vec<ScoreEntry>, ScoreStoreError> {
        Ok(rank(&self.entries, limit))
    }
}

/// Saves a final score, logging instead of failing.
///
/// Returns whether the score was recorded.
pub fn submit_final_score<S: ScoreStore + ?Sized>(store: &mut S, name: &str, score: u32) -> bool {
    match store.save_score(name, score) {
        Ok(()) => {
            debug!(name = name.trim(), score, "final score recorded");
            true
        }
        Err(error) => {
            warn!(%error, score, "final score was not recorded");
            false
        }
    }
}

pub(crate) fn normalize_name(name: &str) -> Result<String, ScoreStoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ScoreStoreError::EmptyName);
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ScoreStoreError::NameTooLong {
            len,
            max: MAX_NAME_LEN,
        });
    }
    Ok(trimmed.to_owned())
}

// Stable sort keeps submission order among equal scores.
pub(crate) fn rank(entries: &[ScoreEntry], limit: usize) -> Vec<ScoreEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|left, right| right.score.cmp(&left.score));
    ranked.truncate(limit);
    ranked
}
