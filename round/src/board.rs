//! Dense slot occupancy board owned by the round.

use whack_core::{BoardView, CharacterKind, EpisodeId, SlotIndex, SlotState};

/// Character removed from a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Occupant {
    pub(crate) kind: CharacterKind,
    pub(crate) episode: EpisodeId,
}

#[derive(Debug)]
pub(crate) struct Board {
    slots: Vec<SlotState>,
}

impl Board {
    pub(crate) fn new(total_slots: u32) -> Self {
        Self {
            slots: vec![SlotState::Empty; total_slots as usize],
        }
    }

    pub(crate) fn view(&self) -> BoardView<'_> {
        BoardView::new(&self.slots)
    }

    /// Places a character, refusing out-of-range or already occupied slots.
    pub(crate) fn occupy(
        &mut self,
        slot: SlotIndex,
        kind: CharacterKind,
        episode: EpisodeId,
    ) -> bool {
        match self.slots.get_mut(slot.get() as usize) {
            Some(state) if *state == SlotState::Empty => {
                *state = SlotState::Occupied { kind, episode };
                true
            }
            _ => false,
        }
    }

    pub(crate) fn clear(&mut self, slot: SlotIndex) -> Option<Occupant> {
        let state = self.slots.get_mut(slot.get() as usize)?;
        match std::mem::take(state) {
            SlotState::Occupied { kind, episode } => Some(Occupant { kind, episode }),
            SlotState::Empty => None,
        }
    }

    /// Empties every slot, returning the slots that held a character.
    pub(crate) fn clear_all(&mut self) -> Vec<SlotIndex> {
        let cleared = self.view().occupied_indices();
        self.slots.fill(SlotState::Empty);
        cleared
    }
}
