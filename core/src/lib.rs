#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Whack round engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative round, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the round executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to. Systems consume event streams, query
//! immutable views such as [`BoardView`], and respond exclusively with new
//! command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod presentation;

pub use config::{ConfigError, RoundConfig, MAX_SLOTS};
pub use presentation::{present, Presentation};

/// Commands that express all permissible round mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Begins a fresh round, resetting any previous round first.
    Start,
    /// Ends the active round immediately, publishing the current score.
    Stop,
    /// Suspends a running round or resumes a paused one.
    TogglePause,
    /// Hard reset back to the idle phase, cancelling every pending timer.
    Reset,
    /// Reports that the player hit the character occupying a slot.
    Whack {
        /// Slot the player hit.
        slot: SlotIndex,
    },
    /// Reports that the player clicked without hitting a character.
    Miss,
    /// Advances the round clock by the provided delta time.
    Tick {
        /// Duration of wall or simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the next spawn attempt happen after the provided delay.
    ScheduleSpawn {
        /// Delay before the spawn timer fires.
        delay: Duration,
    },
    /// Requests that a character appear in an unoccupied slot.
    SpawnCharacter {
        /// Slot chosen for the character.
        slot: SlotIndex,
        /// Variant of the character to spawn.
        kind: CharacterKind,
    },
    /// Requests that an unwhacked character be removed with a miss penalty.
    ExpireCharacter {
        /// Slot holding the expiring character.
        slot: SlotIndex,
        /// Spawn episode the expiry was scheduled for.
        episode: EpisodeId,
    },
}

/// Events broadcast by the round after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a fresh round began with a full countdown and an empty board.
    RoundStarted {
        /// Length of the round in whole seconds.
        duration_secs: u32,
    },
    /// Announces that the running round was suspended.
    RoundPaused,
    /// Announces that a paused round continues.
    RoundResumed,
    /// Announces that the round finished, either manually or because time ran out.
    RoundEnded {
        /// Score achieved when the round ended.
        final_score: u32,
    },
    /// Announces that the round returned to the idle phase.
    RoundReset,
    /// Reports the updated score.
    ScoreChanged {
        /// Score after the mutation.
        score: u32,
    },
    /// Reports the updated countdown.
    TimeRemainingChanged {
        /// Whole seconds left in the round.
        seconds: u32,
    },
    /// Confirms that a character appeared in a slot.
    SlotSpawned {
        /// Slot the character occupies.
        slot: SlotIndex,
        /// Variant of the character.
        kind: CharacterKind,
    },
    /// Confirms that a slot became empty.
    SlotCleared {
        /// Slot that was cleared.
        slot: SlotIndex,
        /// Why the occupant left.
        reason: ClearReason,
    },
    /// Signals that the spawn delay elapsed and a spawn attempt is due.
    SpawnDue,
    /// Signals that a spawn episode reached the end of its lifetime.
    ExpiryDue {
        /// Slot the episode was spawned into.
        slot: SlotIndex,
        /// Episode whose lifetime elapsed.
        episode: EpisodeId,
    },
}

/// Lifecycle phase of a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No round has started, or the round was reset.
    #[default]
    Idle,
    /// The countdown and spawn loop are active.
    Running,
    /// The round is suspended; the board keeps its occupants.
    Paused,
    /// The round finished and its final score was published.
    Ended,
}

/// Variant of a character appearing in a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterKind {
    /// Ordinary character worth the regular points.
    Regular,
    /// Rare bonus character worth the special points.
    Special,
}

/// Reasons a slot may be cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClearReason {
    /// The player hit the occupant.
    Whacked,
    /// The occupant outlived its lifetime without being hit.
    Expired,
    /// The round ended or was reset while the slot was occupied.
    RoundOver,
}

/// Zero-based index of a slot within the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Creates a new slot index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    fn position(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a single spawn episode.
///
/// Episodes are allocated monotonically and never reused, so a deferred
/// callback holding an episode can always tell whether the slot it refers to
/// still holds the same occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeId(u64);

impl EpisodeId {
    /// Creates a new episode identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Occupancy of a single slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// No character is present.
    #[default]
    Empty,
    /// A character is present until whacked or expired.
    Occupied {
        /// Variant of the occupying character.
        kind: CharacterKind,
        /// Spawn episode that placed the character.
        episode: EpisodeId,
    },
}

/// Read-only view into the slot occupancy board.
#[derive(Clone, Copy, Debug)]
pub struct BoardView<'a> {
    slots: &'a [SlotState],
}

impl<'a> BoardView<'a> {
    /// Captures a new board view backed by the provided slot slice.
    #[must_use]
    pub const fn new(slots: &'a [SlotState]) -> Self {
        Self { slots }
    }

    /// Number of slots on the board.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether the board has no slots at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// State of the provided slot; out-of-range slots read as empty.
    #[must_use]
    pub fn state(&self, slot: SlotIndex) -> SlotState {
        self.slots
            .get(slot.position())
            .copied()
            .unwrap_or(SlotState::Empty)
    }

    /// Reports whether a character currently occupies the slot.
    #[must_use]
    pub fn is_occupied(&self, slot: SlotIndex) -> bool {
        matches!(self.state(slot), SlotState::Occupied { .. })
    }

    /// Variant of the character occupying the slot, if any.
    #[must_use]
    pub fn kind_of(&self, slot: SlotIndex) -> Option<CharacterKind> {
        match self.state(slot) {
            SlotState::Occupied { kind, .. } => Some(kind),
            SlotState::Empty => None,
        }
    }

    /// Spawn episode occupying the slot, if any.
    #[must_use]
    pub fn episode_of(&self, slot: SlotIndex) -> Option<EpisodeId> {
        match self.state(slot) {
            SlotState::Occupied { episode, .. } => Some(episode),
            SlotState::Empty => None,
        }
    }

    /// Enumerates the unoccupied slots in ascending order.
    #[must_use]
    pub fn unoccupied_indices(&self) -> Vec<SlotIndex> {
        self.iter()
            .filter(|(_, state)| *state == SlotState::Empty)
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Enumerates the occupied slots in ascending order.
    #[must_use]
    pub fn occupied_indices(&self) -> Vec<SlotIndex> {
        self.iter()
            .filter(|(_, state)| *state != SlotState::Empty)
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Returns an iterator over every slot and its state.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, SlotState)> + 'a {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, state)| (SlotIndex::new(index as u32), *state))
    }
}
