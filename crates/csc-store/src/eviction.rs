//! Eviction policies: the rule the cache store uses to pick a victim once it
//! is full.
//!
//! Each policy owns only the *ordering* of fingerprints — the cache store
//! itself owns the fingerprint → entry map. This keeps an eviction engine
//! swappable without touching the stored values.

use crate::fingerprint::Fingerprint;
use lru::LruCache;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Selects which [`EvictionEngine`] a [`crate::store::CacheStore`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Evicts the fingerprint that was accessed longest ago.
    Lru,
    /// Evicts the fingerprint with the lowest access count.
    Lfu,
    /// Evicts the fingerprint closest to TTL expiry; also evicts anything
    /// already expired on every read.
    Ttl,
    /// Evicts a uniformly random tracked fingerprint.
    Random,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::Lru
    }
}

/// The ordering structure backing one [`EvictionPolicy`].
///
/// All methods are called under the cache store's single mutex; none of
/// them perform I/O or blocking work.
pub(crate) trait EvictionEngine: Send {
    /// Records a new fingerprint.
    fn on_insert(&mut self, fp: &Fingerprint);

    /// Records an access to an already-tracked fingerprint.
    fn on_hit(&mut self, fp: &Fingerprint);

    /// Stops tracking a fingerprint (invalidation, disconnect, or eviction).
    fn on_remove(&mut self, fp: &Fingerprint);

    /// Chooses the next fingerprint to evict, without removing it.
    ///
    /// Must not return a fingerprint that is not currently tracked.
    fn pick_victim(&self) -> Option<Fingerprint>;

    /// Drops all tracked fingerprints.
    fn clear(&mut self);

    /// For the TTL engine: the next already-expired fingerprint, if any.
    /// Every other engine ignores TTL and returns `None`.
    fn next_expired(&mut self, _now: Instant) -> Option<Fingerprint> {
        None
    }
}

pub(crate) fn build_engine(policy: EvictionPolicy, ttl: Option<Duration>) -> Box<dyn EvictionEngine> {
    match policy {
        EvictionPolicy::Lru => Box::new(LruEngine::new()),
        EvictionPolicy::Lfu => Box::new(LfuEngine::new()),
        EvictionPolicy::Ttl => Box::new(TtlEngine::new(ttl.unwrap_or_default())),
        EvictionPolicy::Random => Box::new(RandomEngine::new(None)),
    }
}

/// Doubly linked list ordering, MRU at one end, LRU at the other.
struct LruEngine {
    order: LruCache<Fingerprint, ()>,
}

impl LruEngine {
    fn new() -> Self {
        // Capacity is enforced by the cache store, not here; give the
        // underlying ring generous headroom so `push` never itself evicts.
        Self {
            order: LruCache::unbounded(),
        }
    }
}

impl EvictionEngine for LruEngine {
    fn on_insert(&mut self, fp: &Fingerprint) {
        self.order.put(fp.clone(), ());
    }

    fn on_hit(&mut self, fp: &Fingerprint) {
        self.order.promote(fp);
    }

    fn on_remove(&mut self, fp: &Fingerprint) {
        self.order.pop(fp);
    }

    fn pick_victim(&self) -> Option<Fingerprint> {
        self.order.peek_lru().map(|(fp, _)| fp.clone())
    }

    fn clear(&mut self) {
        self.order.clear();
    }
}

/// Frequency-bucketed ordering: `frequency -> fingerprints in hit order`.
struct LfuEngine {
    buckets: HashMap<u64, VecDeque<Fingerprint>>,
    frequency: HashMap<Fingerprint, u64>,
    min_frequency: u64,
}

impl LfuEngine {
    fn new() -> Self {
        Self {
            buckets: HashMap::new(),
            frequency: HashMap::new(),
            min_frequency: 0,
        }
    }

    fn bump(&mut self, fp: &Fingerprint, from: u64) {
        if let Some(bucket) = self.buckets.get_mut(&from) {
            bucket.retain(|tracked| tracked != fp);
            if bucket.is_empty() && from == self.min_frequency {
                self.min_frequency += 1;
            }
        }
        let to = from + 1;
        self.buckets.entry(to).or_default().push_back(fp.clone());
        self.frequency.insert(fp.clone(), to);
    }
}

impl EvictionEngine for LfuEngine {
    fn on_insert(&mut self, fp: &Fingerprint) {
        self.frequency.insert(fp.clone(), 1);
        self.buckets.entry(1).or_default().push_back(fp.clone());
        self.min_frequency = 1;
    }

    fn on_hit(&mut self, fp: &Fingerprint) {
        if let Some(&current) = self.frequency.get(fp) {
            self.bump(fp, current);
        }
    }

    fn on_remove(&mut self, fp: &Fingerprint) {
        if let Some(freq) = self.frequency.remove(fp) {
            if let Some(bucket) = self.buckets.get_mut(&freq) {
                bucket.retain(|tracked| tracked != fp);
            }
        }
    }

    fn pick_victim(&self) -> Option<Fingerprint> {
        let mut freqs: Vec<&u64> = self.buckets.keys().collect();
        freqs.sort_unstable();
        for freq in freqs {
            if let Some(bucket) = self.buckets.get(freq) {
                if let Some(fp) = bucket.front() {
                    return Some(fp.clone());
                }
            }
        }
        None
    }

    fn clear(&mut self) {
        self.buckets.clear();
        self.frequency.clear();
        self.min_frequency = 0;
    }
}

/// Min-heap ordering keyed on `created_at + ttl`.
struct TtlEngine {
    ttl: Duration,
    heap: BinaryHeap<std::cmp::Reverse<HeapEntry>>,
    live: HashSet<Fingerprint>,
    seq: u64,
}

#[derive(Debug, Clone)]
struct HeapEntry {
    expires_at: Instant,
    seq: u64,
    fp: Fingerprint,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.expires_at == other.expires_at && self.seq == other.seq
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.expires_at, self.seq).cmp(&(other.expires_at, other.seq))
    }
}

impl TtlEngine {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            heap: BinaryHeap::new(),
            live: HashSet::new(),
            seq: 0,
        }
    }

    fn push(&mut self, fp: &Fingerprint) {
        self.seq += 1;
        self.heap.push(std::cmp::Reverse(HeapEntry {
            expires_at: Instant::now() + self.ttl,
            seq: self.seq,
            fp: fp.clone(),
        }));
        self.live.insert(fp.clone());
    }
}

impl EvictionEngine for TtlEngine {
    fn on_insert(&mut self, fp: &Fingerprint) {
        self.push(fp);
    }

    fn on_hit(&mut self, _fp: &Fingerprint) {
        // TTL eviction ignores access recency; expiry is fixed at insertion.
    }

    fn on_remove(&mut self, fp: &Fingerprint) {
        self.live.remove(fp);
    }

    fn pick_victim(&self) -> Option<Fingerprint> {
        self.heap
            .iter()
            .map(|std::cmp::Reverse(entry)| entry)
            .filter(|entry| self.live.contains(&entry.fp))
            .min_by_key(|entry| (entry.expires_at, entry.seq))
            .map(|entry| entry.fp.clone())
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    fn next_expired(&mut self, now: Instant) -> Option<Fingerprint> {
        while let Some(std::cmp::Reverse(top)) = self.heap.peek() {
            if !self.live.contains(&top.fp) {
                self.heap.pop();
                continue;
            }
            if top.expires_at <= now {
                let top = self.heap.pop().expect("peeked above").0;
                self.live.remove(&top.fp);
                return Some(top.fp);
            }
            break;
        }
        None
    }
}

/// Uniform-sampling ordering over every tracked fingerprint.
struct RandomEngine {
    index: Vec<Fingerprint>,
    position: HashMap<Fingerprint, usize>,
    rng: StdRng,
}

impl RandomEngine {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            index: Vec::new(),
            position: HashMap::new(),
            rng,
        }
    }

    #[cfg(test)]
    fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }
}

impl EvictionEngine for RandomEngine {
    fn on_insert(&mut self, fp: &Fingerprint) {
        if self.position.contains_key(fp) {
            return;
        }
        self.position.insert(fp.clone(), self.index.len());
        self.index.push(fp.clone());
    }

    fn on_hit(&mut self, _fp: &Fingerprint) {
        // Access order is irrelevant to uniform sampling.
    }

    fn on_remove(&mut self, fp: &Fingerprint) {
        if let Some(pos) = self.position.remove(fp) {
            let last = self.index.len() - 1;
            self.index.swap(pos, last);
            self.index.pop();
            if pos < self.index.len() {
                let moved = self.index[pos].clone();
                self.position.insert(moved, pos);
            }
        }
    }

    fn pick_victim(&self) -> Option<Fingerprint> {
        if self.index.is_empty() {
            return None;
        }
        // `pick_victim` takes `&self`; draw from a throwaway clone of the
        // generator's state so the signature stays non-mutating. The actual
        // removal of this fingerprint (see `CacheStore::set`) happens via
        // `on_remove`, so losing the few draws we don't act on costs nothing.
        let mut rng = self.rng.clone();
        let i = rng.gen_range(0..self.index.len());
        Some(self.index[i].clone())
    }

    fn clear(&mut self) {
        self.index.clear();
        self.position.clear();
    }
}
