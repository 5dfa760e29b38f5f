#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative round state management for Whack.
//!
//! The round owns the lifecycle phase, the countdown, the score, and the slot
//! occupancy board. It also owns the virtual clock on which every deferred
//! callback is scheduled. Callbacks never trust that cancellation worked:
//! countdown and spawn-delay timers carry the generation that was current when
//! they were armed, and expiry timers carry the spawn episode they belong to.
//! A callback whose token no longer matches is dropped without side effects.

use std::time::Duration;

use tracing::{debug, trace};
use whack_core::{
    CharacterKind, ClearReason, Command, ConfigError, EpisodeId, Event, Phase, RoundConfig,
    SlotIndex, SlotState,
};
use whack_timing::{TimerHandle, TimerQueue};

mod board;

use board::Board;

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Counter bumped on every phase change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Copy, Debug)]
enum Timer {
    Countdown(Generation),
    SpawnDelay(Generation),
    Expiry { slot: SlotIndex, episode: EpisodeId },
}

/// Represents the authoritative state of a single round.
#[derive(Debug)]
pub struct Round {
    config: RoundConfig,
    phase: Phase,
    score: u32,
    time_remaining: u32,
    board: Board,
    timers: TimerQueue<Timer>,
    horizon: Duration,
    generation: Generation,
    countdown: Option<TimerHandle>,
    spawn_delay: Option<TimerHandle>,
    next_episode: u64,
}

impl Round {
    /// Creates an idle round for the provided configuration.
    ///
    /// The configuration is validated so that every later operation can rely
    /// on a non-empty board and positive durations.
    pub fn new(config: RoundConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            phase: Phase::Idle,
            score: 0,
            time_remaining: config.round_duration_secs,
            board: Board::new(config.total_slots()),
            timers: TimerQueue::new(),
            horizon: Duration::ZERO,
            generation: Generation::default(),
            countdown: None,
            spawn_delay: None,
            next_episode: 0,
            config,
        })
    }

    fn enter_phase(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "round phase change");
        self.phase = phase;
        self.generation = self.generation.next();
    }

    fn start(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.phase, Phase::Running | Phase::Paused) {
            debug!(phase = ?self.phase, "start ignored: round already active");
            return;
        }

        self.reset(out_events);
        self.enter_phase(Phase::Running);
        out_events.push(Event::RoundStarted {
            duration_secs: self.config.round_duration_secs,
        });
        self.arm_countdown();
    }

    fn stop(&mut self, out_events: &mut Vec<Event>) {
        if matches!(self.phase, Phase::Running | Phase::Paused) {
            self.end(out_events);
        } else {
            debug!(phase = ?self.phase, "stop ignored: no active round");
        }
    }

    fn toggle_pause(&mut self, out_events: &mut Vec<Event>) {
        match self.phase {
            Phase::Running => {
                self.cancel_phase_timers();
                self.enter_phase(Phase::Paused);
                out_events.push(Event::RoundPaused);
            }
            Phase::Paused => {
                self.enter_phase(Phase::Running);
                self.arm_countdown();
                self.arm_resume_backstops();
                out_events.push(Event::RoundResumed);
            }
            Phase::Idle | Phase::Ended => {
                debug!(phase = ?self.phase, "pause toggle ignored: no active round");
            }
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.timers.clear();
        self.countdown = None;
        self.spawn_delay = None;
        for slot in self.board.clear_all() {
            out_events.push(Event::SlotCleared {
                slot,
                reason: ClearReason::RoundOver,
            });
        }
        self.score = 0;
        self.time_remaining = self.config.round_duration_secs;
        self.enter_phase(Phase::Idle);

        out_events.push(Event::RoundReset);
        out_events.push(Event::ScoreChanged { score: self.score });
        out_events.push(Event::TimeRemainingChanged {
            seconds: self.time_remaining,
        });
    }

    fn end(&mut self, out_events: &mut Vec<Event>) {
        self.cancel_phase_timers();
        self.enter_phase(Phase::Ended);
        for slot in self.board.clear_all() {
            out_events.push(Event::SlotCleared {
                slot,
                reason: ClearReason::RoundOver,
            });
        }
        debug!(final_score = self.score, "round ended");
        out_events.push(Event::RoundEnded {
            final_score: self.score,
        });
    }

    fn whack(&mut self, slot: SlotIndex, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            debug!(slot = slot.get(), phase = ?self.phase, "whack ignored: round not running");
            return;
        }
        let Some(occupant) = self.board.clear(slot) else {
            debug!(slot = slot.get(), "whack ignored: slot empty");
            return;
        };

        let points = match occupant.kind {
            CharacterKind::Regular => self.config.regular_points,
            CharacterKind::Special => self.config.special_points,
        };
        trace!(
            slot = slot.get(),
            episode = occupant.episode.get(),
            points,
            "whack landed"
        );
        self.score = self.score.saturating_add(points);
        out_events.push(Event::SlotCleared {
            slot,
            reason: ClearReason::Whacked,
        });
        out_events.push(Event::ScoreChanged { score: self.score });
    }

    fn miss(&mut self, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            debug!(phase = ?self.phase, "miss ignored: round not running");
            return;
        }
        self.apply_penalty(out_events);
    }

    // Score is a points tally, never a debt: penalties clamp at zero.
    fn apply_penalty(&mut self, out_events: &mut Vec<Event>) {
        self.score = self.score.saturating_sub(self.config.miss_penalty);
        out_events.push(Event::ScoreChanged { score: self.score });
    }

    fn schedule_spawn(&mut self, delay: Duration) {
        if self.phase != Phase::Running {
            debug!(phase = ?self.phase, "spawn schedule ignored: round not running");
            return;
        }
        if let Some(previous) = self.spawn_delay.take() {
            let _ = self.timers.cancel(previous);
        }
        self.spawn_delay = Some(
            self.timers
                .schedule(delay, Timer::SpawnDelay(self.generation)),
        );
    }

    fn spawn(&mut self, slot: SlotIndex, kind: CharacterKind, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            debug!(slot = slot.get(), "spawn ignored: round not running");
            return;
        }

        let episode = EpisodeId::new(self.next_episode);
        if !self.board.occupy(slot, kind, episode) {
            debug!(slot = slot.get(), "spawn rejected: slot occupied or out of range");
            return;
        }
        self.next_episode += 1;

        let _ = self.timers.schedule(
            self.config.character_lifetime(),
            Timer::Expiry { slot, episode },
        );
        out_events.push(Event::SlotSpawned { slot, kind });
    }

    fn expire(&mut self, slot: SlotIndex, episode: EpisodeId, out_events: &mut Vec<Event>) {
        if self.phase != Phase::Running {
            trace!(slot = slot.get(), "expiry ignored: round not running");
            return;
        }
        if self.board.view().episode_of(slot) != Some(episode) {
            trace!(
                slot = slot.get(),
                episode = episode.get(),
                "expiry ignored: episode already over"
            );
            return;
        }

        let _ = self.board.clear(slot);
        self.apply_penalty(out_events);
        out_events.push(Event::SlotCleared {
            slot,
            reason: ClearReason::Expired,
        });
    }

    fn arm_countdown(&mut self) {
        if let Some(previous) = self.countdown.take() {
            let _ = self.timers.cancel(previous);
        }
        self.countdown = Some(
            self.timers
                .schedule(COUNTDOWN_STEP, Timer::Countdown(self.generation)),
        );
    }

    // Occupants that survive a pause get a fresh full lifetime. Their original
    // expiry stays armed as well; whichever fires first while running wins and
    // the other finds the episode over.
    fn arm_resume_backstops(&mut self) {
        let lifetime = self.config.character_lifetime();
        for (slot, state) in self.board.view().iter() {
            if let SlotState::Occupied { episode, .. } = state {
                let _ = self
                    .timers
                    .schedule(lifetime, Timer::Expiry { slot, episode });
            }
        }
    }

    fn cancel_phase_timers(&mut self) {
        for handle in [self.countdown.take(), self.spawn_delay.take()]
            .into_iter()
            .flatten()
        {
            let _ = self.timers.cancel(handle);
        }
    }

    fn advance_clock(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.horizon = self.horizon.saturating_add(dt);
        match self.timers.pop_due(self.horizon) {
            Some(fired) => self.fire(fired.payload, out_events),
            None => self.timers.advance_to(self.horizon),
        }
    }

    fn fire(&mut self, timer: Timer, out_events: &mut Vec<Event>) {
        match timer {
            Timer::Countdown(generation) => {
                if !self.is_current(generation) {
                    trace!("stale countdown timer dropped");
                    return;
                }
                self.countdown = None;
                self.time_remaining = self.time_remaining.saturating_sub(1);
                out_events.push(Event::TimeRemainingChanged {
                    seconds: self.time_remaining,
                });
                if self.time_remaining == 0 {
                    self.end(out_events);
                } else {
                    self.arm_countdown();
                }
            }
            Timer::SpawnDelay(generation) => {
                if !self.is_current(generation) {
                    trace!("stale spawn timer dropped");
                    return;
                }
                self.spawn_delay = None;
                out_events.push(Event::SpawnDue);
            }
            Timer::Expiry { slot, episode } => {
                if self.phase != Phase::Running {
                    trace!(slot = slot.get(), "expiry timer dropped: round not running");
                    return;
                }
                out_events.push(Event::ExpiryDue { slot, episode });
            }
        }
    }

    fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation && self.phase == Phase::Running
    }
}

/// Applies the provided command to the round, mutating state deterministically.
///
/// `Command::Tick` fires at most one due timer per call. Callers keep ticking
/// with a zero delta until [`query::is_settled`] reports that the clock has
/// reached the requested horizon, giving systems the chance to respond to each
/// callback before the next one runs.
pub fn apply(round: &mut Round, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start => round.start(out_events),
        Command::Stop => round.stop(out_events),
        Command::TogglePause => round.toggle_pause(out_events),
        Command::Reset => round.reset(out_events),
        Command::Whack { slot } => round.whack(slot, out_events),
        Command::Miss => round.miss(out_events),
        Command::Tick { dt } => round.advance_clock(dt, out_events),
        Command::ScheduleSpawn { delay } => round.schedule_spawn(delay),
        Command::SpawnCharacter { slot, kind } => round.spawn(slot, kind, out_events),
        Command::ExpireCharacter { slot, episode } => round.expire(slot, episode, out_events),
    }
}

/// Query functions that provide read-only access to the round state.
pub mod query {
    use std::time::Duration;

    use whack_core::{BoardView, Phase, RoundConfig};

    use super::Round;

    /// Lifecycle phase of the round.
    #[must_use]
    pub fn phase(round: &Round) -> Phase {
        round.phase
    }

    /// Reports whether the round is running.
    #[must_use]
    pub fn is_running(round: &Round) -> bool {
        round.phase == Phase::Running
    }

    /// Reports whether the round is paused.
    #[must_use]
    pub fn is_paused(round: &Round) -> bool {
        round.phase == Phase::Paused
    }

    /// Current score.
    #[must_use]
    pub fn score(round: &Round) -> u32 {
        round.score
    }

    /// Whole seconds left on the countdown.
    #[must_use]
    pub fn time_remaining(round: &Round) -> u32 {
        round.time_remaining
    }

    /// Read-only view of slot occupancy.
    #[must_use]
    pub fn board(round: &Round) -> BoardView<'_> {
        round.board.view()
    }

    /// Configuration the round was created with.
    #[must_use]
    pub fn config(round: &Round) -> &RoundConfig {
        &round.config
    }

    /// Reading of the round clock.
    #[must_use]
    pub fn now(round: &Round) -> Duration {
        round.timers.now()
    }

    /// Instant on the round clock at which the next timer falls due.
    #[must_use]
    pub fn next_deadline(round: &Round) -> Option<Duration> {
        round.timers.next_deadline()
    }

    /// Number of timers still waiting to fire.
    #[must_use]
    pub fn pending_timers(round: &Round) -> usize {
        round.timers.len()
    }

    /// Reports whether the clock reached the tick horizon with nothing left due.
    #[must_use]
    pub fn is_settled(round: &Round) -> bool {
        round.timers.now() >= round.horizon
            && round
                .timers
                .next_deadline()
                .map_or(true, |deadline| deadline > round.horizon)
    }
}
