//! Callback surface consumed by presentation layers.

use crate::{CharacterKind, ClearReason, Event, SlotIndex};

/// Receives the public round events.
///
/// Every callback defaults to a no-op so presentations only implement what
/// they render.
pub trait Presentation {
    /// The score changed to `score`.
    fn on_score_changed(&mut self, _score: u32) {}

    /// The countdown changed to `seconds`.
    fn on_time_remaining_changed(&mut self, _seconds: u32) {}

    /// A character of `kind` appeared in `slot`.
    fn on_slot_spawned(&mut self, _slot: SlotIndex, _kind: CharacterKind) {}

    /// `slot` became empty because of `reason`.
    fn on_slot_cleared(&mut self, _slot: SlotIndex, _reason: ClearReason) {}

    /// A fresh round began.
    fn on_round_started(&mut self) {}

    /// The round was suspended.
    fn on_round_paused(&mut self) {}

    /// The round continues after a pause.
    fn on_round_resumed(&mut self) {}

    /// The round finished with `final_score`.
    fn on_round_ended(&mut self, _final_score: u32) {}

    /// The round returned to idle.
    fn on_round_reset(&mut self) {}
}

/// Forwards each public event to the matching [`Presentation`] callback.
///
/// Scheduler-facing events ([`Event::SpawnDue`], [`Event::ExpiryDue`]) are
/// skipped.
pub fn present<P>(events: &[Event], presentation: &mut P)
where
    P: Presentation + ?Sized,
{
    for event in events {
        match *event {
            Event::RoundStarted { .. } => presentation.on_round_started(),
            Event::RoundPaused => presentation.on_round_paused(),
            Event::RoundResumed => presentation.on_round_resumed(),
            Event::RoundEnded { final_score } => presentation.on_round_ended(final_score),
            Event::RoundReset => presentation.on_round_reset(),
            Event::ScoreChanged { score } => presentation.on_score_changed(score),
            Event::TimeRemainingChanged { seconds } => {
                presentation.on_time_remaining_changed(seconds);
            }
            Event::SlotSpawned { slot, kind } => presentation.on_slot_spawned(slot, kind),
            Event::SlotCleared { slot, reason } => presentation.on_slot_cleared(slot, reason),
            Event::SpawnDue | Event::ExpiryDue { .. } => {}
        }
    }
}
