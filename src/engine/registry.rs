use std::collections::HashMap;

use crate::{
    engine::scheduler::{TeardownScheduler, TeardownTicket},
    synth::voice::VoiceId,
};

/// Control-side view of one live voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceEntry {
    pub id: VoiceId,
    pub state: EntryState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryState {
    Held,
    Releasing { ticket: TeardownTicket, deadline: f64 },
}

/// Maps each sounding MIDI note to the one voice playing it.
///
/// An entry lives from note-on until its teardown deadline has been polled,
/// so a releasing voice still owns its note. A retrigger replaces the entry
/// and cancels any teardown the old one had pending.
#[derive(Debug, Default)]
pub struct VoiceRegistry {
    voices: HashMap<u8, VoiceEntry>,
    teardown: TeardownScheduler,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh held voice for `note`, returning the entry it replaced.
    pub fn insert(&mut self, note: u8, id: VoiceId) -> Option<VoiceEntry> {
        let replaced = self.voices.insert(
            note,
            VoiceEntry {
                id,
                state: EntryState::Held,
            },
        );
        if let Some(VoiceEntry {
            state: EntryState::Releasing { ticket, .. },
            ..
        }) = replaced
        {
            self.teardown.cancel(ticket);
        }
        replaced
    }

    /// Move a held voice into release with teardown at `deadline`.
    ///
    /// Returns the released voice, or `None` if `note` has no held voice.
    pub fn release(&mut self, note: u8, deadline: f64) -> Option<VoiceId> {
        let entry = self.voices.get_mut(&note)?;
        if entry.state != EntryState::Held {
            return None;
        }
        let ticket = self.teardown.schedule(note, deadline);
        entry.state = EntryState::Releasing { ticket, deadline };
        Some(entry.id)
    }

    /// Drop every entry whose teardown deadline is at or before `now`.
    pub fn poll(&mut self, now: f64) -> Vec<(u8, VoiceId)> {
        let mut removed = Vec::new();
        for (note, ticket) in self.teardown.poll(now) {
            let due = matches!(
                self.voices.get(&note),
                Some(VoiceEntry { state: EntryState::Releasing { ticket: t, .. }, .. }) if *t == ticket
            );
            if due {
                if let Some(entry) = self.voices.remove(&note) {
                    removed.push((note, entry.id));
                }
            }
        }
        removed
    }

    pub fn get(&self, note: u8) -> Option<&VoiceEntry> {
        self.voices.get(&note)
    }

    pub fn contains(&self, note: u8) -> bool {
        self.voices.contains_key(&note)
    }

    /// Registered notes, ascending.
    pub fn notes(&self) -> Vec<u8> {
        let mut notes: Vec<u8> = self.voices.keys().copied().collect();
        notes.sort_unstable();
        notes
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Teardowns still waiting for their deadline.
    pub fn pending_teardowns(&self) -> usize {
        self.teardown.len()
    }
}
