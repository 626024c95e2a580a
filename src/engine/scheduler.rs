use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashMap},
};

/*
Teardown Scheduler
==================

Deferred work keyed by render-clock deadline. Each scheduled teardown hands
back a ticket; cancelling the ticket is the only way to call it off.

    schedule(60, 0.7) ──→ ticket #1 ─┐
    schedule(64, 0.9) ──→ ticket #2  │ cancel(#1)   (retrigger of note 60)
                                     ▼
    poll(1.0) ──→ [(64, #2)]

Nothing fires on its own. The owner polls with the current clock and gets
back every ticket whose deadline has passed, earliest first. Cancelled
tickets stay in the heap until their deadline and are skipped then.
*/

/// Handle to one pending teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeardownTicket(u64);

#[derive(Debug)]
struct Pending {
    deadline: f64,
    ticket: TeardownTicket,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then(self.ticket.cmp(&other.ticket))
    }
}

#[derive(Debug, Default)]
pub struct TeardownScheduler {
    queue: BinaryHeap<Reverse<Pending>>,
    live: HashMap<TeardownTicket, u8>,
    next_ticket: u64,
}

impl TeardownScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule teardown of `note` at render-clock `deadline`.
    pub fn schedule(&mut self, note: u8, deadline: f64) -> TeardownTicket {
        self.next_ticket += 1;
        let ticket = TeardownTicket(self.next_ticket);
        self.queue.push(Reverse(Pending { deadline, ticket }));
        self.live.insert(ticket, note);
        ticket
    }

    /// Call off a pending teardown. Returns false if it already fired or
    /// was cancelled before.
    pub fn cancel(&mut self, ticket: TeardownTicket) -> bool {
        self.live.remove(&ticket).is_some()
    }

    /// Remove and return every live ticket due at or before `now`.
    pub fn poll(&mut self, now: f64) -> Vec<(u8, TeardownTicket)> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.queue.peek() {
            if next.deadline > now {
                break;
            }
            let ticket = next.ticket;
            self.queue.pop();
            if let Some(note) = self.live.remove(&ticket) {
                due.push((note, ticket));
            }
        }
        due
    }

    pub fn is_pending(&self, ticket: TeardownTicket) -> bool {
        self.live.contains_key(&ticket)
    }

    /// Number of live (uncancelled, unfired) tickets.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
