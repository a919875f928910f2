//! Request sequencing for display slots.
//!
//! Requests are not cancelled, so a slow response can arrive after a newer
//! one. Every request takes a ticket for its slot; only the holder of the
//! latest ticket may update what the slot shows.

use std::collections::HashMap;

use parking_lot::Mutex;

/// A part of the display filled by one kind of request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplaySlot {
    /// Current conditions and forecast
    Conditions,
    /// City suggestions
    Suggestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub slot: DisplaySlot,
    pub sequence: u64,
}

/// Issues increasing ticket numbers per slot
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: Mutex<HashMap<DisplaySlot, u64>>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, slot: DisplaySlot) -> RequestTicket {
        let mut latest = self.latest.lock();
        let sequence = latest.entry(slot).or_insert(0);
        *sequence += 1;
        RequestTicket {
            slot,
            sequence: *sequence,
        }
    }

    /// True if no newer ticket has been issued for the ticket's slot
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.latest.lock().get(&ticket.slot).copied() == Some(ticket.sequence)
    }
}
