#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized spawning system deciding where and when characters appear.
//!
//! The scheduler runs a self-rescheduling loop: every spawn attempt is
//! followed immediately by a request for the next one after an independent
//! random delay. It also acts as the expiry guard, turning an elapsed
//! lifetime into an expire command only while the round is running and the
//! slot still holds the same spawn episode.

use std::{ops::Range, time::Duration};

use tracing::trace;
use whack_core::{BoardView, CharacterKind, Command, Event, Phase, RoundConfig, SlotIndex};

mod random;

pub use random::{RandomSource, SeededRandom};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    interval_ms: Range<u64>,
    special_probability: f64,
}

impl Config {
    /// Creates a configuration from explicit delay bounds and special probability.
    ///
    /// Delays are drawn from `[interval_min, interval_max)`; equal bounds
    /// produce a fixed delay.
    #[must_use]
    pub fn new(interval_min: Duration, interval_max: Duration, special_probability: f64) -> Self {
        Self {
            interval_ms: millis(interval_min)..millis(interval_max),
            special_probability,
        }
    }

    /// Derives the spawning configuration from the round tuning surface.
    #[must_use]
    pub fn from_round(config: &RoundConfig) -> Self {
        Self {
            interval_ms: config.spawn_interval_ms(),
            special_probability: config.special_probability,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Pure system that emits spawn, reschedule and expiry commands.
#[derive(Debug)]
pub struct SpawnScheduler<R = SeededRandom> {
    config: Config,
    random: R,
}

impl<R: RandomSource> SpawnScheduler<R> {
    /// Creates a new scheduler drawing from the supplied random source.
    #[must_use]
    pub fn new(config: Config, random: R) -> Self {
        Self { config, random }
    }

    /// Consumes round events and the current board to emit commands.
    ///
    /// `phase` must be the phase of the round after the events were produced.
    pub fn handle(
        &mut self,
        events: &[Event],
        phase: Phase,
        board: BoardView<'_>,
        out: &mut Vec<Command>,
    ) {
        if phase != Phase::Running {
            return;
        }

        let mut claimed = Vec::new();
        for event in events {
            match *event {
                Event::RoundStarted { .. } | Event::RoundResumed => {
                    let delay = self.next_delay();
                    out.push(Command::ScheduleSpawn { delay });
                }
                Event::SpawnDue => {
                    if let Some((slot, kind)) = self.attempt_spawn(board, &claimed) {
                        claimed.push(slot);
                        out.push(Command::SpawnCharacter { slot, kind });
                    }
                    let delay = self.next_delay();
                    out.push(Command::ScheduleSpawn { delay });
                }
                Event::ExpiryDue { slot, episode } => {
                    if board.episode_of(slot) == Some(episode) {
                        out.push(Command::ExpireCharacter { slot, episode });
                    } else {
                        trace!(slot = slot.get(), "expiry skipped: episode already over");
                    }
                }
                _ => {}
            }
        }
    }

    fn attempt_spawn(
        &mut self,
        board: BoardView<'_>,
        claimed: &[SlotIndex],
    ) -> Option<(SlotIndex, CharacterKind)> {
        let free: Vec<SlotIndex> = board
            .unoccupied_indices()
            .into_iter()
            .filter(|slot| !claimed.contains(slot))
            .collect();
        if free.is_empty() {
            trace!("spawn skipped: board saturated");
            return None;
        }

        let pick = self.random.below(free.len() as u64) as usize;
        let slot = free[pick];
        let kind = self.draw_kind();
        Some((slot, kind))
    }

    fn draw_kind(&mut self) -> CharacterKind {
        if self.random.unit() < self.config.special_probability {
            CharacterKind::Special
        } else {
            CharacterKind::Regular
        }
    }

    fn next_delay(&mut self) -> Duration {
        let start = self.config.interval_ms.start;
        let span = self.config.interval_ms.end.saturating_sub(start);
        let offset = if span == 0 {
            0
        } else {
            self.random.below(span)
        };
        Duration::from_millis(start + offset)
    }
}
