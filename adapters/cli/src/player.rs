//! Simulated player that reacts to spawns after a human-like delay.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use whack_core::{BoardView, Event, SlotIndex};

/// How skilled the simulated player is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlayerProfile {
    /// Probability that a spawned character is noticed at all.
    pub(crate) accuracy: f64,
    /// Typical delay between a spawn and the click.
    pub(crate) reaction: Duration,
    /// Probability that a planned click lands beside the character.
    pub(crate) misclick: f64,
}

/// Input the player sends to the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Whack(SlotIndex),
    Miss,
}

#[derive(Clone, Copy, Debug)]
struct PlannedClick {
    slot: SlotIndex,
    at: Duration,
}

#[derive(Debug)]
pub(crate) struct SimulatedPlayer {
    profile: PlayerProfile,
    rng: ChaCha8Rng,
    planned: Vec<PlannedClick>,
}

impl SimulatedPlayer {
    pub(crate) fn new(profile: PlayerProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: ChaCha8Rng::seed_from_u64(seed),
            planned: Vec::new(),
        }
    }

    /// Plans clicks for fresh spawns and forgets slots that emptied.
    pub(crate) fn observe(&mut self, events: &[Event], now: Duration) {
        for event in events {
            match *event {
                Event::SlotSpawned { slot, .. } => {
                    if self.rng.gen::<f64>() < self.profile.accuracy {
                        let at = now + self.reaction_time();
                        self.planned.push(PlannedClick { slot, at });
                    }
                }
                Event::SlotCleared { slot, .. } => {
                    self.planned.retain(|click| click.slot != slot);
                }
                Event::RoundStarted { .. } | Event::RoundReset => self.planned.clear(),
                _ => {}
            }
        }
    }

    /// Round-clock instant of the earliest planned click.
    pub(crate) fn next_click(&self) -> Option<Duration> {
        self.planned.iter().map(|click| click.at).min()
    }

    /// Clicks that fall due at `now`, in the order they were planned.
    pub(crate) fn act(&mut self, now: Duration, board: BoardView<'_>) -> Vec<Action> {
        let mut actions = Vec::new();
        let mut index = 0;
        while index < self.planned.len() {
            if self.planned[index].at > now {
                index += 1;
                continue;
            }
            let click = self.planned.remove(index);
            if !board.is_occupied(click.slot) {
                continue;
            }
            if self.rng.gen::<f64>() < self.profile.misclick {
                actions.push(Action::Miss);
            } else {
                actions.push(Action::Whack(click.slot));
            }
        }
        actions
    }

    // Uniform jitter of +/- 50% around the configured reaction.
    fn reaction_time(&mut self) -> Duration {
        let base = self.profile.reaction;
        base.mul_f64(self.rng.gen_range(0.5..1.5))
    }
}
