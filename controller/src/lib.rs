#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Round controller exposing the calls a presentation layer makes.
//!
//! The controller owns one [`Round`] and one [`SpawnScheduler`] and pumps
//! commands and events between them until the round is quiescent. Hosts
//! construct it once and keep it for as many rounds as they like; there is no
//! global state.

use std::time::Duration;

use tracing::trace;
use whack_core::{BoardView, Command, ConfigError, Event, Phase, RoundConfig, SlotIndex};
use whack_round::{self as round, query, Round};
use whack_system_spawning::{Config, RandomSource, SeededRandom, SpawnScheduler};

/// Single source of truth for round phase, countdown and score.
#[derive(Debug)]
pub struct RoundController<R = SeededRandom> {
    round: Round,
    spawning: SpawnScheduler<R>,
}

impl RoundController<SeededRandom> {
    /// Creates a controller whose spawn decisions replay from `seed`.
    pub fn with_seed(config: RoundConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, SeededRandom::from_seed(seed))
    }
}

impl<R: RandomSource> RoundController<R> {
    /// Creates an idle controller drawing spawn decisions from `random`.
    pub fn new(config: RoundConfig, random: R) -> Result<Self, ConfigError> {
        let spawning = SpawnScheduler::new(Config::from_round(&config), random);
        let round = Round::new(config)?;
        Ok(Self { round, spawning })
    }

    /// Starts a fresh round; ignored while a round is running or paused.
    pub fn start(&mut self, out: &mut Vec<Event>) {
        self.run(Command::Start, out);
    }

    /// Ends the active round and publishes its final score.
    pub fn stop(&mut self, out: &mut Vec<Event>) {
        self.run(Command::Stop, out);
    }

    /// Pauses a running round or resumes a paused one.
    pub fn toggle_pause(&mut self, out: &mut Vec<Event>) {
        self.run(Command::TogglePause, out);
    }

    /// Returns to idle with a zero score, a full countdown and an empty board.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        self.run(Command::Reset, out);
    }

    /// Registers a hit on `slot`.
    pub fn handle_whack(&mut self, slot: SlotIndex, out: &mut Vec<Event>) {
        self.run(Command::Whack { slot }, out);
    }

    /// Registers a click that hit nothing.
    pub fn handle_miss(&mut self, out: &mut Vec<Event>) {
        self.run(Command::Miss, out);
    }

    /// Advances the round clock by `dt`, firing every timer that falls due.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        self.run(Command::Tick { dt }, out);
    }

    /// Reports whether the round is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        query::is_running(&self.round)
    }

    /// Reports whether the round is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        query::is_paused(&self.round)
    }

    /// Lifecycle phase of the round.
    #[must_use]
    pub fn phase(&self) -> Phase {
        query::phase(&self.round)
    }

    /// Current score.
    #[must_use]
    pub fn score(&self) -> u32 {
        query::score(&self.round)
    }

    /// Whole seconds left on the countdown.
    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        query::time_remaining(&self.round)
    }

    /// Time elapsed on the round clock since the controller was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        query::now(&self.round)
    }

    /// Round-clock instant of the next pending callback.
    ///
    /// Hosts that advance in coarse steps can stop here first so that input
    /// lands between callbacks rather than after the whole step.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        query::next_deadline(&self.round)
    }

    /// Read-only view of slot occupancy.
    #[must_use]
    pub fn board(&self) -> BoardView<'_> {
        query::board(&self.round)
    }

    /// Configuration the controller was created with.
    #[must_use]
    pub fn config(&self) -> &RoundConfig {
        query::config(&self.round)
    }

    fn run(&mut self, command: Command, out: &mut Vec<Event>) {
        let mut commands = vec![command];
        let mut passes = 0_usize;

        loop {
            let mut events = Vec::new();
            for command in commands.drain(..) {
                round::apply(&mut self.round, command, &mut events);
            }

            let mut follow_up = Vec::new();
            self.spawning.handle(
                &events,
                query::phase(&self.round),
                query::board(&self.round),
                &mut follow_up,
            );
            out.append(&mut events);

            if follow_up.is_empty() {
                if query::is_settled(&self.round) {
                    break;
                }
                follow_up.push(Command::Tick { dt: Duration::ZERO });
            }
            commands = follow_up;
            passes += 1;
        }

        if passes > 0 {
            trace!(passes, now = ?query::now(&self.round), "controller pump settled");
        }
    }
}
