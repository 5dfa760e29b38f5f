use std::{collections::VecDeque, time::Duration};

use whack_controller::RoundController;
use whack_core::{CharacterKind, ClearReason, Event, Phase, RoundConfig, SlotIndex};
use whack_system_spawning::RandomSource;

/// Replays scripted draws, then falls back to the largest value allowed.
#[derive(Debug, Default)]
struct Script {
    below: VecDeque<u64>,
}

impl Script {
    fn new(below: &[u64]) -> Self {
        Self {
            below: below.iter().copied().collect(),
        }
    }
}

impl RandomSource for Script {
    fn below(&mut self, bound: u64) -> u64 {
        self.below
            .pop_front()
            .unwrap_or(u64::MAX)
            .min(bound - 1)
    }

    fn unit(&mut self) -> f64 {
        0.5
    }
}

/// One slot, first spawn at 100ms, later spawns pushed out to 10s unless scripted.
fn single_slot_config() -> RoundConfig {
    RoundConfig {
        rows: 1,
        columns: 1,
        round_duration_secs: 30,
        character_lifetime_ms: 2_000,
        spawn_interval_min_ms: 100,
        spawn_interval_max_ms: 10_100,
        special_probability: 0.0,
        regular_points: 10,
        special_points: 50,
        miss_penalty: 5,
    }
}

fn advance_to<R: RandomSource>(
    controller: &mut RoundController<R>,
    millis: u64,
    events: &mut Vec<Event>,
) {
    let target = Duration::from_millis(millis);
    let dt = target.saturating_sub(controller.elapsed());
    controller.advance(dt, events);
}

fn expirations(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::SlotCleared {
                    reason: ClearReason::Expired,
                    ..
                }
            )
        })
        .count()
}

#[test]
fn start_publishes_full_countdown_and_empty_board() {
    let mut controller =
        RoundController::with_seed(RoundConfig::default(), 0xfeed).expect("valid config");
    let mut events = Vec::new();

    controller.start(&mut events);

    assert!(events.contains(&Event::RoundStarted { duration_secs: 30 }));
    assert!(controller.is_running());
    assert_eq!(controller.time_remaining(), 30);
    assert!(controller.board().occupied_indices().is_empty());
}

#[test]
fn start_while_running_is_ignored() {
    let mut controller =
        RoundController::with_seed(RoundConfig::default(), 1).expect("valid config");
    let mut events = Vec::new();
    controller.start(&mut events);
    controller.advance(Duration::from_millis(2_500), &mut events);
    let remaining = controller.time_remaining();
    events.clear();

    controller.start(&mut events);

    assert!(events.is_empty(), "re-entrant start emitted {events:?}");
    assert_eq!(controller.time_remaining(), remaining);
}

#[test]
fn untouched_round_ends_with_zero_score() {
    let config = RoundConfig {
        round_duration_secs: 10,
        ..RoundConfig::default()
    };
    let mut controller = RoundController::with_seed(config, 0xabcd).expect("valid config");
    let mut events = Vec::new();
    controller.start(&mut events);

    for _ in 0..10 {
        controller.advance(Duration::from_secs(1), &mut events);
    }

    assert_eq!(controller.phase(), Phase::Ended);
    assert_eq!(controller.time_remaining(), 0);
    assert_eq!(events.last(), Some(&Event::RoundEnded { final_score: 0 }));
    assert!(expirations(&events) > 0, "characters should have expired");
    assert!(controller.board().occupied_indices().is_empty());
}

#[test]
fn whacks_award_exact_points_and_expiry_costs_penalty() {
    let mut config = single_slot_config();
    config.special_probability = 1.0;
    let mut controller = RoundController::new(config, Script::new(&[0, 0, 400])).expect("valid");
    let mut events = Vec::new();
    let slot = SlotIndex::new(0);
    controller.start(&mut events);

    advance_to(&mut controller, 100, &mut events);
    assert_eq!(controller.board().kind_of(slot), Some(CharacterKind::Special));
    controller.handle_whack(slot, &mut events);
    assert_eq!(controller.score(), 50);

    // The next spawn lands at 600ms and is left to expire at 2600ms.
    advance_to(&mut controller, 2_599, &mut events);
    assert!(controller.board().is_occupied(slot));
    advance_to(&mut controller, 2_600, &mut events);
    assert_eq!(controller.score(), 45);
    assert!(!controller.board().is_occupied(slot));
}

#[test]
fn regular_whack_awards_regular_points() {
    let mut controller =
        RoundController::new(single_slot_config(), Script::new(&[0])).expect("valid");
    let mut events = Vec::new();
    controller.start(&mut events);
    advance_to(&mut controller, 100, &mut events);

    controller.handle_whack(SlotIndex::new(0), &mut events);

    assert_eq!(controller.score(), 10);
    assert!(events.contains(&Event::SlotCleared {
        slot: SlotIndex::new(0),
        reason: ClearReason::Whacked,
    }));
}

#[test]
fn misses_clamp_score_at_zero() {
    let mut controller =
        RoundController::new(single_slot_config(), Script::new(&[0])).expect("valid");
    let mut events = Vec::new();
    controller.start(&mut events);
    advance_to(&mut controller, 100, &mut events);
    controller.handle_whack(SlotIndex::new(0), &mut events);

    for _ in 0..5 {
        controller.handle_miss(&mut events);
    }

    assert_eq!(controller.score(), 0);
    let scores: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::ScoreChanged { score } => Some(*score),
            _ => None,
        })
        .collect();
    assert_eq!(scores, vec![0, 10, 5, 0, 0, 0, 0]);
}

#[test]
fn whack_on_empty_slot_and_input_outside_running_are_ignored() {
    let mut controller =
        RoundController::new(single_slot_config(), Script::new(&[0])).expect("valid");
    let mut events = Vec::new();

    controller.handle_miss(&mut events);
    controller.handle_whack(SlotIndex::new(0), &mut events);
    assert!(events.is_empty(), "idle round reacted to input: {events:?}");

    controller.start(&mut events);
    events.clear();
    controller.handle_whack(SlotIndex::new(0), &mut events);
    assert!(events.is_empty(), "whack on empty slot emitted {events:?}");

    advance_to(&mut controller, 100, &mut events);
    controller.toggle_pause(&mut events);
    events.clear();
    controller.handle_whack(SlotIndex::new(0), &mut events);
    controller.handle_miss(&mut events);
    assert!(events.is_empty(), "paused round reacted to input: {events:?}");
    assert!(controller.board().is_occupied(SlotIndex::new(0)));
}

#[test]
fn whack_then_respawn_survives_stale_expiry() {
    let mut controller =
        RoundController::new(single_slot_config(), Script::new(&[0, 0, 400])).expect("valid");
    let mut events = Vec::new();
    let slot = SlotIndex::new(0);
    controller.start(&mut events);

    advance_to(&mut controller, 200, &mut events);
    controller.handle_whack(slot, &mut events);
    advance_to(&mut controller, 600, &mut events);
    assert!(controller.board().is_occupied(slot), "respawn expected at 600ms");
    events.clear();

    // The first episode's expiry fires at 2100ms and must leave the respawn alone.
    advance_to(&mut controller, 2_100, &mut events);
    assert!(controller.board().is_occupied(slot));
    assert_eq!(expirations(&events), 0);

    advance_to(&mut controller, 2_600, &mut events);
    assert_eq!(expirations(&events), 1);
    assert!(!controller.board().is_occupied(slot));
}

#[test]
fn expiry_in_flight_across_short_pause_fires_once_at_original_deadline() {
    let mut controller =
        RoundController::new(single_slot_config(), Script::new(&[0])).expect("valid");
    let mut events = Vec::new();
    let slot = SlotIndex::new(0);
    controller.start(&mut events);

    advance_to(&mut controller, 100, &mut events);
    assert!(controller.board().is_occupied(slot));
    advance_to(&mut controller, 600, &mut events);
    controller.toggle_pause(&mut events);
    advance_to(&mut controller, 1_600, &mut events);
    controller.toggle_pause(&mut events);
    events.clear();

    advance_to(&mut controller, 2_099, &mut events);
    assert_eq!(expirations(&events), 0);
    advance_to(&mut controller, 2_100, &mut events);
    assert_eq!(expirations(&events), 1, "original deadline still applies");

    // The resume backstop fires at 3600ms and finds the episode over.
    advance_to(&mut controller, 3_700, &mut events);
    assert_eq!(expirations(&events), 1);
    assert!(!controller.board().is_occupied(slot));
}

#[test]
fn expiry_swallowed_by_pause_is_rearmed_on_resume() {
    let mut controller =
        RoundController::new(single_slot_config(), Script::new(&[0])).expect("valid");
    let mut events = Vec::new();
    let slot = SlotIndex::new(0);
    controller.start(&mut events);

    advance_to(&mut controller, 600, &mut events);
    controller.toggle_pause(&mut events);
    advance_to(&mut controller, 2_600, &mut events);
    assert_eq!(expirations(&events), 0, "paused rounds never expire characters");
    assert!(controller.board().is_occupied(slot));

    controller.toggle_pause(&mut events);
    advance_to(&mut controller, 4_599, &mut events);
    assert!(controller.board().is_occupied(slot));
    advance_to(&mut controller, 4_600, &mut events);
    assert_eq!(expirations(&events), 1);
    assert!(!controller.board().is_occupied(slot));
}

#[test]
fn pause_freezes_countdown_and_resume_restarts_whole_seconds() {
    let mut controller =
        RoundController::with_seed(RoundConfig::default(), 9).expect("valid config");
    let mut events = Vec::new();
    controller.start(&mut events);

    advance_to(&mut controller, 1_500, &mut events);
    assert_eq!(controller.time_remaining(), 29);
    controller.toggle_pause(&mut events);
    assert!(controller.is_paused());
    assert!(events.contains(&Event::RoundPaused));

    advance_to(&mut controller, 10_000, &mut events);
    assert_eq!(controller.time_remaining(), 29);

    controller.toggle_pause(&mut events);
    assert!(events.contains(&Event::RoundResumed));
    advance_to(&mut controller, 10_999, &mut events);
    assert_eq!(controller.time_remaining(), 29);
    advance_to(&mut controller, 11_000, &mut events);
    assert_eq!(controller.time_remaining(), 28);
}

#[test]
fn paused_round_stops_spawning() {
    let mut controller =
        RoundController::with_seed(RoundConfig::default(), 21).expect("valid config");
    let mut events = Vec::new();
    controller.start(&mut events);
    controller.toggle_pause(&mut events);
    events.clear();

    controller.advance(Duration::from_secs(20), &mut events);

    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::SlotSpawned { .. })),
        "paused round spawned characters"
    );
}

#[test]
fn stop_clears_board_without_scoring() {
    let mut controller =
        RoundController::new(single_slot_config(), Script::new(&[0])).expect("valid");
    let mut events = Vec::new();
    controller.start(&mut events);
    advance_to(&mut controller, 100, &mut events);
    controller.toggle_pause(&mut events);
    events.clear();

    controller.stop(&mut events);

    assert_eq!(
        events,
        vec![
            Event::SlotCleared {
                slot: SlotIndex::new(0),
                reason: ClearReason::RoundOver,
            },
            Event::RoundEnded { final_score: 0 },
        ]
    );
    assert_eq!(controller.phase(), Phase::Ended);

    // Pending expiry timers fire into the ended round and change nothing.
    events.clear();
    advance_to(&mut controller, 5_000, &mut events);
    assert!(events.is_empty(), "ended round emitted {events:?}");
}

#[test]
fn reset_is_idempotent() {
    let mut controller =
        RoundController::with_seed(RoundConfig::default(), 5).expect("valid config");
    let mut events = Vec::new();
    controller.start(&mut events);
    controller.advance(Duration::from_millis(3_300), &mut events);

    let mut first = Vec::new();
    controller.reset(&mut first);
    let first_state = (
        controller.phase(),
        controller.score(),
        controller.time_remaining(),
        controller.board().occupied_indices(),
    );

    let mut second = Vec::new();
    controller.reset(&mut second);
    let second_state = (
        controller.phase(),
        controller.score(),
        controller.time_remaining(),
        controller.board().occupied_indices(),
    );

    assert_eq!(first_state, (Phase::Idle, 0, 30, Vec::new()));
    assert_eq!(first_state, second_state);
    assert_eq!(
        second,
        vec![
            Event::RoundReset,
            Event::ScoreChanged { score: 0 },
            Event::TimeRemainingChanged { seconds: 30 },
        ]
    );
}

#[test]
fn ended_round_can_start_again() {
    let config = RoundConfig {
        round_duration_secs: 2,
        ..RoundConfig::default()
    };
    let mut controller = RoundController::with_seed(config, 77).expect("valid config");
    let mut events = Vec::new();
    controller.start(&mut events);
    controller.advance(Duration::from_secs(2), &mut events);
    assert_eq!(controller.phase(), Phase::Ended);

    events.clear();
    controller.start(&mut events);

    assert!(controller.is_running());
    assert_eq!(controller.time_remaining(), 2);
    assert!(events.contains(&Event::RoundStarted { duration_secs: 2 }));
}

#[test]
fn spawns_only_target_unoccupied_slots_and_respect_lifetime() {
    let config = RoundConfig {
        rows: 2,
        columns: 2,
        spawn_interval_min_ms: 50,
        spawn_interval_max_ms: 150,
        ..RoundConfig::default()
    };
    let lifetime = config.character_lifetime();
    let step = Duration::from_millis(10);
    let mut controller = RoundController::with_seed(config, 0x1234).expect("valid config");
    let mut events = Vec::new();
    controller.start(&mut events);
    events.clear();

    let mut spawned_at: [Option<Duration>; 4] = [None; 4];
    let mut spawns = 0;
    while controller.is_running() {
        controller.advance(step, &mut events);
        let now = controller.elapsed();
        for event in events.drain(..) {
            match event {
                Event::SlotSpawned { slot, .. } => {
                    let entry = &mut spawned_at[slot.get() as usize];
                    assert!(entry.is_none(), "slot {} spawned twice", slot.get());
                    *entry = Some(now);
                    spawns += 1;
                }
                Event::SlotCleared { slot, .. } => {
                    let since = spawned_at[slot.get() as usize]
                        .take()
                        .expect("cleared slot was occupied");
                    assert!(now - since <= lifetime + step, "slot outlived its lifetime");
                }
                _ => {}
            }
        }
    }

    assert!(spawns > 20, "expected a busy board, saw {spawns} spawns");
}

#[test]
fn same_seed_replays_identical_event_stream() {
    fn replay(seed: u64) -> Vec<Event> {
        let mut controller =
            RoundController::with_seed(RoundConfig::default(), seed).expect("valid config");
        let mut events = Vec::new();
        controller.start(&mut events);
        for frame in 0..400_u32 {
            controller.advance(Duration::from_millis(16), &mut events);
            if frame % 7 == 0 {
                let target = controller.board().occupied_indices().first().copied();
                if let Some(slot) = target {
                    controller.handle_whack(slot, &mut events);
                }
            }
            if frame == 150 || frame == 180 {
                controller.toggle_pause(&mut events);
            }
        }
        events
    }

    let first = replay(0x4d59_5df4_d0f3_3173);
    let second = replay(0x4d59_5df4_d0f3_3173);

    assert_eq!(first, second, "replay diverged between runs");
    assert!(first.len() > 100);
}
