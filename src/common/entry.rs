/**
 * rust-kad
 * Kademlia bucket entry type
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use std::time::Duration;

/// Peer identifier with its measured latency.
///
/// Entries are immutable once stored in a bucket, a latency change replaces
/// the entry as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PeerEntry<Id> {
    id: Id,
    latency: Duration,
}

impl<Id> PeerEntry<Id> {
    pub fn new(id: Id, latency: Duration) -> PeerEntry<Id> {
        PeerEntry { id, latency }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Consume the entry, returning the peer identifier
    pub fn into_id(self) -> Id {
        self.id
    }
}

impl<Id> From<Id> for PeerEntry<Id> {
    fn from(id: Id) -> PeerEntry<Id> {
        PeerEntry::new(id, Duration::ZERO)
    }
}

impl<Id> From<(Id, Duration)> for PeerEntry<Id> {
    fn from(d: (Id, Duration)) -> PeerEntry<Id> {
        PeerEntry::new(d.0, d.1)
    }
}

impl<Id> From<PeerEntry<Id>> for (Id, Duration) {
    fn from(e: PeerEntry<Id>) -> (Id, Duration) {
        (e.id, e.latency)
    }
}
