//! Drives one round from start to finish with a simulated player.

use std::{
    io,
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, info};
use whack_controller::RoundController;
use whack_core::{present, Event, Phase};

use crate::{
    player::{Action, SimulatedPlayer},
    terminal::TerminalPresentation,
};

/// How the host advances the round clock between frames.
#[derive(Clone, Copy, Debug)]
pub(crate) enum FrameClock {
    /// Advances by a fixed step without waiting.
    Simulated { step: Duration },
    /// Sleeps for `frame` and advances by the wall time that actually passed.
    Realtime { frame: Duration },
}

impl FrameClock {
    fn next_delta(&self, last: &mut Instant) -> Duration {
        match *self {
            Self::Simulated { step } => step,
            Self::Realtime { frame } => {
                thread::sleep(frame);
                let now = Instant::now();
                let dt = now.duration_since(*last);
                *last = now;
                dt
            }
        }
    }
}

/// Runs a round to completion and returns its final score.
pub(crate) fn play_round<W: io::Write>(
    controller: &mut RoundController,
    player: &mut SimulatedPlayer,
    presentation: &mut TerminalPresentation<W>,
    clock: FrameClock,
) -> u32 {
    let mut events = Vec::new();
    controller.start(&mut events);
    publish(controller, player, presentation, &mut events);

    let mut last = Instant::now();
    let mut frames = 0_u64;
    while controller.phase() != Phase::Ended {
        let frame_end = controller.elapsed() + clock.next_delta(&mut last);

        // Stop at every callback and planned click inside the frame so spawns
        // are seen when they happen and clicks land before later expiries.
        while controller.phase() != Phase::Ended && controller.elapsed() < frame_end {
            let target = [controller.next_deadline(), player.next_click()]
                .into_iter()
                .flatten()
                .fold(frame_end, Duration::min);
            controller.advance(target.saturating_sub(controller.elapsed()), &mut events);
            publish(controller, player, presentation, &mut events);

            let now = controller.elapsed();
            for action in player.act(now, controller.board()) {
                match action {
                    Action::Whack(slot) => controller.handle_whack(slot, &mut events),
                    Action::Miss => controller.handle_miss(&mut events),
                }
            }
            publish(controller, player, presentation, &mut events);
        }
        frames += 1;
    }

    let final_score = controller.score();
    info!(final_score, frames, "round finished");
    final_score
}

fn publish<W: io::Write>(
    controller: &RoundController,
    player: &mut SimulatedPlayer,
    presentation: &mut TerminalPresentation<W>,
    events: &mut Vec<Event>,
) {
    if events.is_empty() {
        return;
    }
    let now = controller.elapsed();
    debug!(count = events.len(), ?now, "publishing round events");
    player.observe(events, now);
    presentation.set_clock(now);
    present(events, presentation);
    events.clear();
}
