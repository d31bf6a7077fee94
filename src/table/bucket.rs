/**
 * rust-kad
 * Kademlia KBucket implementation
 *
 * https://github.com/ryankurte/rust-kad
 * Copyright 2018 Ryan Kurte
 */
use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::common::{DatabaseId, DistanceMetric, Error, PeerEntry};
use crate::{Config, DuplicatePolicy};

/// Bucket holds an ordered list of peers for a single routing table slot.
///
/// Entries are kept front (most preferred) to back (least preferred). Using
/// only [Bucket::push_front] and [Bucket::move_to_front] gives a
/// most-recently-seen-first ordering, using only
/// [Bucket::push_front_with_latency] gives ascending latency. Mixing the two
/// voids the latency ordering.
///
/// All operations hold a single reader/writer lock for their full scan, so a
/// bucket may be shared between threads via `Arc`.
pub struct Bucket<Id> {
    config: Config,
    entries: RwLock<VecDeque<PeerEntry<Id>>>,
}

impl<Id> Bucket<Id>
where
    Id: Clone + PartialEq + Debug,
{
    /// Create a new empty bucket with the default configuration
    pub fn new() -> Bucket<Id> {
        Bucket::with_config(Config::default())
    }

    /// Create a new empty bucket with the provided configuration
    pub fn with_config(config: Config) -> Bucket<Id> {
        let entries = VecDeque::with_capacity(config.bucket_size);
        Bucket {
            config,
            entries: RwLock::new(entries),
        }
    }

    /// Fetch the bucket configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // Mutations never leave the list part-updated, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<PeerEntry<Id>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<PeerEntry<Id>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone the list of peer identifiers, front to back
    pub fn peers(&self) -> Vec<Id> {
        self.read().iter().map(|e| e.id().clone()).collect()
    }

    /// Clone the list of entries currently in the bucket, front to back
    pub fn entries(&self) -> Vec<PeerEntry<Id>> {
        self.read().iter().cloned().collect()
    }

    /// Check whether the bucket contains a peer
    pub fn has(&self, id: &Id) -> bool {
        self.read().iter().any(|e| e.id() == id)
    }

    /// Find the first entry for a peer
    pub fn get(&self, id: &Id) -> Option<PeerEntry<Id>> {
        self.read().iter().find(|e| e.id() == id).cloned()
    }

    /// Fetch the most preferred entry
    pub fn front(&self) -> Option<PeerEntry<Id>> {
        self.read().front().cloned()
    }

    /// Fetch the least preferred entry, the candidate for eviction
    pub fn back(&self) -> Option<PeerEntry<Id>> {
        self.read().back().cloned()
    }

    /// Fetch number of entries in the bucket
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Remove the first entry for a peer, returning whether one was found
    pub fn remove(&self, id: &Id) -> bool {
        let mut entries = self.write();

        let index = match entries.iter().position(|e| e.id() == id) {
            Some(i) => i,
            None => return false,
        };

        trace!(target: "kbucket", "[Bucket] Removing peer {:?}", id);
        entries.remove(index);

        true
    }

    /// Move every entry for a peer to the front of the bucket.
    ///
    /// Other entries keep their relative order, as do multiple entries for the
    /// same peer. Returns whether any entry was moved.
    pub fn move_to_front(&self, id: &Id) -> bool {
        let mut entries = self.write();

        if !entries.iter().any(|e| e.id() == id) {
            return false;
        }

        trace!(target: "kbucket", "[Bucket] Moving peer {:?} to front", id);

        let (mut matched, rest): (VecDeque<_>, VecDeque<_>) =
            entries.drain(..).partition(|e| e.id() == id);
        matched.extend(rest);
        *entries = matched;

        true
    }

    /// Insert a freshly contacted peer at the front of the bucket with zero latency.
    ///
    /// Returns false if the insertion was refused by [DuplicatePolicy::Reject].
    pub fn push_front(&self, id: Id) -> bool {
        let mut entries = self.write();

        if !self.admit(&mut entries, &id) {
            return false;
        }

        trace!(target: "kbucket", "[Bucket] Adding peer {:?} at front", id);
        entries.push_front(PeerEntry::from(id));

        true
    }

    /// Insert a peer ahead of the first entry with a strictly greater latency,
    /// or at the back if there is none, keeping a latency-built bucket sorted.
    ///
    /// Returns false if the insertion was refused by [DuplicatePolicy::Reject].
    pub fn push_front_with_latency(&self, id: Id, latency: Duration) -> bool {
        let mut entries = self.write();

        if !self.admit(&mut entries, &id) {
            return false;
        }

        Self::insert_sorted(&mut entries, PeerEntry::new(id, latency));

        true
    }

    /// Replace the entry for a peer with one carrying a new latency, moving it
    /// to its latency-sorted position. Returns false if the peer is not present.
    pub fn update_latency(&self, id: &Id, latency: Duration) -> bool {
        let mut entries = self.write();

        let index = match entries.iter().position(|e| e.id() == id) {
            Some(i) => i,
            None => return false,
        };

        if let Some(prior) = entries.remove(index) {
            trace!(
                target: "kbucket",
                "[Bucket] Updating peer {:?} latency {:?} -> {:?}",
                id,
                prior.latency(),
                latency
            );
            Self::insert_sorted(&mut entries, PeerEntry::new(prior.into_id(), latency));
        }

        true
    }

    /// Remove and return the least preferred peer
    pub fn pop_back(&self) -> Result<Id, Error> {
        let mut entries = self.write();

        let e = entries.pop_back().ok_or(Error::Empty)?;
        trace!(target: "kbucket", "[Bucket] Popped peer {:?}", e.id());

        Ok(e.into_id())
    }

    /// Split the bucket by common prefix length with a target point.
    ///
    /// Entries sharing more than `cpl` leading bits with `target` move, in
    /// order, to the returned bucket. The remaining entries keep their order.
    /// If any identifier fails to convert, the bucket is left untouched.
    pub fn split<M>(&self, metric: &M, cpl: usize, target: &M::Point) -> Result<Bucket<Id>, Error>
    where
        M: DistanceMetric<Id>,
    {
        let mut entries = self.write();

        // Classify all entries first, a conversion failure leaves the bucket untouched
        let mut closer = Vec::with_capacity(entries.len());
        for e in entries.iter() {
            let point = metric.convert(e.id()).and_then(|p| {
                if p.max_bits() != target.max_bits() {
                    return Err(Error::InvalidId(format!(
                        "{} bit point, expected {} bits",
                        p.max_bits(),
                        target.max_bits()
                    )));
                }
                Ok(p)
            });
            let point = match point {
                Ok(p) => p,
                Err(err) => {
                    warn!(target: "kbucket", "[Bucket] Split aborted, peer {:?}: {}", e.id(), err);
                    return Err(err);
                }
            };
            closer.push(metric.common_prefix_len(&point, target) > cpl);
        }

        let mut out = VecDeque::with_capacity(self.config.bucket_size);
        let mut keep = VecDeque::with_capacity(self.config.bucket_size);
        for (e, closer) in entries.drain(..).zip(closer) {
            if closer {
                out.push_back(e);
            } else {
                keep.push_back(e);
            }
        }
        *entries = keep;

        debug!(
            target: "kbucket",
            "[Bucket] Split at cpl {}: {} kept, {} moved",
            cpl,
            entries.len(),
            out.len()
        );

        Ok(Bucket {
            config: self.config.clone(),
            entries: RwLock::new(out),
        })
    }

    /// Apply the duplicate policy ahead of inserting a peer
    fn admit(&self, entries: &mut VecDeque<PeerEntry<Id>>, id: &Id) -> bool {
        match self.config.duplicates {
            DuplicatePolicy::Allow => true,
            DuplicatePolicy::Reject => {
                let found = entries.iter().any(|e| e.id() == id);
                if found {
                    trace!(target: "kbucket", "[Bucket] Rejecting duplicate peer {:?}", id);
                }
                !found
            }
            DuplicatePolicy::Replace => {
                entries.retain(|e| e.id() != id);
                true
            }
        }
    }

    fn insert_sorted(entries: &mut VecDeque<PeerEntry<Id>>, entry: PeerEntry<Id>) {
        // First entry with a higher latency, or the back if this is the highest so far
        let index = entries
            .iter()
            .position(|e| e.latency() > entry.latency())
            .unwrap_or(entries.len());

        trace!(
            target: "kbucket",
            "[Bucket] Adding peer {:?} ({:?}) at {}",
            entry.id(),
            entry.latency(),
            index
        );
        entries.insert(index, entry);
    }
}

impl<Id> Default for Bucket<Id>
where
    Id: Clone + PartialEq + Debug,
{
    fn default() -> Self {
        Bucket::new()
    }
}

impl<Id> Debug for Bucket<Id> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let len = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        write!(f, "Bucket{{ entries: {} }}", len)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::XorMetric;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_bucket_latency_order() {
        let b = Bucket::new();

        b.push_front_with_latency("p1", ms(10));
        b.push_front_with_latency("p2", ms(5));
        b.push_front_with_latency("p3", ms(20));

        assert_eq!(b.peers(), vec!["p2", "p1", "p3"]);

        // Equal latency goes after existing peers with that latency
        b.push_front_with_latency("p4", ms(10));
        assert_eq!(b.peers(), vec!["p2", "p1", "p4", "p3"]);

        // Lowest latency goes to the front
        b.push_front_with_latency("p5", ms(1));
        assert_eq!(b.front(), Some(PeerEntry::new("p5", ms(1))));
        assert_eq!(b.back(), Some(PeerEntry::new("p3", ms(20))));
    }

    #[test]
    fn test_bucket_has_remove() {
        let b = Bucket::new();
        assert_eq!(b.has(&"p"), false);

        b.push_front("p");
        assert_eq!(b.has(&"p"), true);
        assert_eq!(b.get(&"p"), Some(PeerEntry::new("p", Duration::ZERO)));

        assert_eq!(b.remove(&"p"), true);
        assert_eq!(b.has(&"p"), false);
        assert_eq!(b.remove(&"p"), false);
        assert!(b.is_empty());
    }

    #[test]
    fn test_bucket_move_to_front() {
        let b = Bucket::new();

        b.push_front("p1");
        b.push_front("p2");
        b.push_front("p3");
        assert_eq!(b.peers(), vec!["p3", "p2", "p1"]);

        assert_eq!(b.move_to_front(&"p1"), true);
        assert_eq!(b.peers(), vec!["p1", "p3", "p2"]);

        assert_eq!(b.move_to_front(&"p4"), false);
        assert_eq!(b.peers(), vec!["p1", "p3", "p2"]);
    }

    #[test]
    fn test_bucket_pop_back() {
        let b = Bucket::new();

        b.push_front_with_latency("p1", ms(1));
        b.push_front_with_latency("p2", ms(2));
        b.push_front_with_latency("p3", ms(3));

        assert_eq!(b.pop_back(), Ok("p3"));
        assert_eq!(b.len(), 2);
        assert_eq!(b.pop_back(), Ok("p2"));
        assert_eq!(b.pop_back(), Ok("p1"));
        assert_eq!(b.len(), 0);

        assert_eq!(b.pop_back(), Err(Error::Empty));
        assert_eq!(b.back(), None);
    }

    #[test]
    fn test_bucket_duplicates_replace() {
        let b = Bucket::new();

        b.push_front_with_latency("p1", ms(10));
        b.push_front_with_latency("p2", ms(20));

        // Re-inserting a peer replaces its entry
        assert_eq!(b.push_front_with_latency("p1", ms(30)), true);
        assert_eq!(b.entries(), vec![PeerEntry::new("p2", ms(20)), PeerEntry::new("p1", ms(30))]);

        assert_eq!(b.push_front("p1"), true);
        assert_eq!(b.peers(), vec!["p1", "p2"]);
    }

    #[test]
    fn test_bucket_duplicates_reject() {
        let b = Bucket::with_config(Config {
            duplicates: DuplicatePolicy::Reject,
            ..Default::default()
        });

        assert_eq!(b.push_front_with_latency("p1", ms(10)), true);
        assert_eq!(b.push_front_with_latency("p1", ms(1)), false);
        assert_eq!(b.push_front("p1"), false);
        assert_eq!(b.entries(), vec![PeerEntry::new("p1", ms(10))]);
    }

    #[test]
    fn test_bucket_duplicates_allow() {
        let b = Bucket::with_config(Config {
            duplicates: DuplicatePolicy::Allow,
            ..Default::default()
        });

        b.push_front_with_latency("a", ms(1));
        b.push_front_with_latency("x", ms(2));
        b.push_front_with_latency("b", ms(3));
        b.push_front_with_latency("x", ms(4));
        assert_eq!(b.len(), 4);

        // Duplicates move together, keeping their relative order
        b.move_to_front(&"x");
        assert_eq!(
            b.entries(),
            vec![
                PeerEntry::new("x", ms(2)),
                PeerEntry::new("x", ms(4)),
                PeerEntry::new("a", ms(1)),
                PeerEntry::new("b", ms(3)),
            ]
        );

        // Only the first match is removed
        assert_eq!(b.remove(&"x"), true);
        assert_eq!(b.get(&"x"), Some(PeerEntry::new("x", ms(4))));
    }

    #[test]
    fn test_bucket_update_latency() {
        let b = Bucket::new();

        b.push_front_with_latency("p1", ms(10));
        b.push_front_with_latency("p2", ms(20));
        b.push_front_with_latency("p3", ms(30));

        assert_eq!(b.update_latency(&"p1", ms(25)), true);
        assert_eq!(b.peers(), vec!["p2", "p1", "p3"]);
        assert_eq!(b.get(&"p1").map(|e| e.latency()), Some(ms(25)));

        assert_eq!(b.update_latency(&"p4", ms(1)), false);
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn test_bucket_split() {
        let b = Bucket::new();

        // Target 0b1000_0000, threshold of one shared bit
        let target = [0b1000_0000u8];
        let ids = [
            [0b1100_0000u8], // cpl 1, kept
            [0b1010_0000u8], // cpl 2, moved
            [0b0000_0000u8], // cpl 0, kept
            [0b1000_0001u8], // cpl 7, moved
            [0b1110_0000u8], // cpl 1, kept
        ];
        for id in ids.iter().rev() {
            b.push_front(*id);
        }
        assert_eq!(b.peers(), ids.to_vec());

        let closer = b.split(&XorMetric, 1, &target).unwrap();

        assert_eq!(closer.peers(), vec![ids[1], ids[3]]);
        assert_eq!(b.peers(), vec![ids[0], ids[2], ids[4]]);
        assert_eq!(closer.config(), b.config());
    }

    #[test]
    fn test_bucket_split_variable_ids() {
        let b = Bucket::new();
        b.push_front(vec![0u8, 0]);
        b.push_front(vec![0x80u8, 0]);

        let closer = b.split(&XorMetric, 0, &vec![0x80, 0]).unwrap();
        assert_eq!(closer.peers(), vec![vec![0x80, 0]]);
        assert_eq!(b.peers(), vec![vec![0, 0]]);

        // Points must match the target width
        b.push_front(vec![0x80u8]);
        let before = b.entries();
        assert_eq!(
            b.split(&XorMetric, 0, &vec![0x80, 0]).unwrap_err(),
            Error::InvalidId("8 bit point, expected 16 bits".to_string())
        );
        assert_eq!(b.entries(), before);
    }

    #[test]
    fn test_bucket_debug_poisoned() {
        use std::sync::Arc;

        let b = Arc::new(Bucket::new());
        b.push_front("p1");
        b.push_front("p2");

        // Poison the lock by panicking while holding it
        let b1 = b.clone();
        let _ = std::thread::spawn(move || {
            let _guard = b1.write();
            panic!("poison");
        })
        .join();

        assert!(b.entries.is_poisoned());
        assert_eq!(format!("{:?}", b), "Bucket{ entries: 2 }");
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_bucket_split_failure() {
        struct Picky;

        impl DistanceMetric<[u8; 1]> for Picky {
            type Point = [u8; 1];

            fn convert(&self, id: &[u8; 1]) -> Result<[u8; 1], Error> {
                if id[0] == 0xFF {
                    return Err(Error::InvalidId(format!("{:?}", id)));
                }
                Ok(*id)
            }
        }

        let b = Bucket::new();
        b.push_front([0b1000_0000u8]);
        b.push_front([0xFF]);
        b.push_front([0b1100_0000u8]);

        let before = b.entries();

        assert_eq!(
            b.split(&Picky, 0, &[0b1000_0000]).unwrap_err(),
            Error::InvalidId("[255]".to_string())
        );
        assert_eq!(b.entries(), before);
    }
}
