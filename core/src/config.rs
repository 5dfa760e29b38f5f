//! Immutable per-round tuning surface.

use std::{ops::Range, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest board a round accepts.
pub const MAX_SLOTS: u32 = 4_096;

/// Tuning knobs that stay fixed for the lifetime of a round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Number of slot rows laid out in the grid.
    pub rows: u32,
    /// Number of slot columns laid out in the grid.
    pub columns: u32,
    /// Length of a round in whole seconds.
    pub round_duration_secs: u32,
    /// How long a character stays in its slot before expiring.
    pub character_lifetime_ms: u64,
    /// Inclusive lower bound of the random delay between spawn attempts.
    pub spawn_interval_min_ms: u64,
    /// Exclusive upper bound of the random delay between spawn attempts.
    pub spawn_interval_max_ms: u64,
    /// Probability in `[0, 1]` that a spawn is a special character.
    pub special_probability: f64,
    /// Points awarded for hitting a regular character.
    pub regular_points: u32,
    /// Points awarded for hitting a special character.
    pub special_points: u32,
    /// Points deducted for a miss or an expired character.
    pub miss_penalty: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            columns: 4,
            round_duration_secs: 30,
            character_lifetime_ms: 1_200,
            spawn_interval_min_ms: 400,
            spawn_interval_max_ms: 1_000,
            special_probability: 0.1,
            regular_points: 10,
            special_points: 50,
            miss_penalty: 5,
        }
    }
}

impl RoundConfig {
    /// Total number of slots on the board.
    #[must_use]
    pub const fn total_slots(&self) -> u32 {
        self.rows.saturating_mul(self.columns)
    }

    /// Length of a round.
    #[must_use]
    pub const fn round_duration(&self) -> Duration {
        Duration::from_secs(self.round_duration_secs as u64)
    }

    /// Lifetime of a spawned character.
    #[must_use]
    pub const fn character_lifetime(&self) -> Duration {
        Duration::from_millis(self.character_lifetime_ms)
    }

    /// Half-open range of spawn delays in milliseconds.
    #[must_use]
    pub const fn spawn_interval_ms(&self) -> Range<u64> {
        self.spawn_interval_min_ms..self.spawn_interval_max_ms
    }

    /// Checks the configuration for values that cannot produce a playable round.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_slots() == 0 {
            return Err(ConfigError::NoSlots {
                rows: self.rows,
                columns: self.columns,
            });
        }
        if self.total_slots() > MAX_SLOTS {
            return Err(ConfigError::TooManySlots {
                rows: self.rows,
                columns: self.columns,
                max: MAX_SLOTS,
            });
        }
        if self.round_duration_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.character_lifetime_ms == 0 {
            return Err(ConfigError::ZeroLifetime);
        }
        if self.spawn_interval_min_ms == 0 {
            return Err(ConfigError::ZeroSpawnInterval);
        }
        if self.spawn_interval_min_ms > self.spawn_interval_max_ms {
            return Err(ConfigError::InvertedSpawnInterval {
                min_ms: self.spawn_interval_min_ms,
                max_ms: self.spawn_interval_max_ms,
            });
        }
        if !(0.0..=1.0).contains(&self.special_probability) {
            return Err(ConfigError::SpecialProbability(self.special_probability));
        }
        Ok(())
    }
}

/// Reasons a [`RoundConfig`] is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid dimensions produce no slots.
    #[error("grid of {rows}x{columns} has no slots")]
    NoSlots {
        /// Configured row count.
        rows: u32,
        /// Configured column count.
        columns: u32,
    },
    /// The grid is larger than [`MAX_SLOTS`].
    #[error("grid of {rows}x{columns} exceeds the {max} slot limit")]
    TooManySlots {
        /// Configured row count.
        rows: u32,
        /// Configured column count.
        columns: u32,
        /// Largest accepted slot count.
        max: u32,
    },
    /// The round would end before it starts.
    #[error("round duration must be at least one second")]
    ZeroDuration,
    /// Characters would expire the instant they spawn.
    #[error("character lifetime must be positive")]
    ZeroLifetime,
    /// Spawn attempts could reschedule themselves at the same instant forever.
    #[error("spawn interval minimum must be at least 1ms")]
    ZeroSpawnInterval,
    /// The spawn interval bounds are reversed.
    #[error("spawn interval minimum {min_ms}ms exceeds maximum {max_ms}ms")]
    InvertedSpawnInterval {
        /// Configured lower bound.
        min_ms: u64,
        /// Configured upper bound.
        max_ms: u64,
    },
    /// The special probability lies outside `[0, 1]`.
    #[error("special probability {0} is outside [0, 1]")]
    SpecialProbability(f64),
}
