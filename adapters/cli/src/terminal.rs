//! Line-oriented presentation that narrates a round on a writer.

use std::{io, time::Duration};

use whack_core::{CharacterKind, ClearReason, Presentation, SlotIndex};

/// Prints one line per public round event, stamped with the round clock.
#[derive(Debug)]
pub(crate) struct TerminalPresentation<W: io::Write> {
    out: W,
    columns: u32,
    clock: Duration,
    error: Option<io::Error>,
}

impl<W: io::Write> TerminalPresentation<W> {
    pub(crate) fn new(out: W, columns: u32) -> Self {
        Self {
            out,
            columns: columns.max(1),
            clock: Duration::ZERO,
            error: None,
        }
    }

    /// Sets the timestamp printed on subsequent lines.
    pub(crate) fn set_clock(&mut self, clock: Duration) {
        self.clock = clock;
    }

    /// Flushes the writer, reporting the first write failure if any.
    pub(crate) fn finish(mut self) -> io::Result<W> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn line(&mut self, message: std::fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        let stamp = self.clock.as_secs_f64();
        if let Err(error) = writeln!(self.out, "[{stamp:>7.3}s] {message}") {
            self.error = Some(error);
        }
    }

    fn cell(&self, slot: SlotIndex) -> (u32, u32) {
        (slot.get() / self.columns, slot.get() % self.columns)
    }
}

impl<W: io::Write> Presentation for TerminalPresentation<W> {
    fn on_score_changed(&mut self, score: u32) {
        self.line(format_args!("score {score}"));
    }

    fn on_time_remaining_changed(&mut self, seconds: u32) {
        self.line(format_args!("{seconds}s left"));
    }

    fn on_slot_spawned(&mut self, slot: SlotIndex, kind: CharacterKind) {
        let (row, column) = self.cell(slot);
        let label = match kind {
            CharacterKind::Regular => "mole",
            CharacterKind::Special => "golden mole",
        };
        self.line(format_args!("{label} pops up at row {row}, column {column}"));
    }

    fn on_slot_cleared(&mut self, slot: SlotIndex, reason: ClearReason) {
        let (row, column) = self.cell(slot);
        let verb = match reason {
            ClearReason::Whacked => "whacked",
            ClearReason::Expired => "escaped",
            ClearReason::RoundOver => "cleared",
        };
        self.line(format_args!("row {row}, column {column} {verb}"));
    }

    fn on_round_started(&mut self) {
        self.line(format_args!("round started"));
    }

    fn on_round_paused(&mut self) {
        self.line(format_args!("paused"));
    }

    fn on_round_resumed(&mut self) {
        self.line(format_args!("resumed"));
    }

    fn on_round_ended(&mut self, final_score: u32) {
        self.line(format_args!("round over, final score {final_score}"));
    }
}
