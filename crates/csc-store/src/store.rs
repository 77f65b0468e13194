//! The thread-safe cache container: a fingerprint → entry map, a
//! database-key → fingerprint-set index, and one eviction engine, all
//! behind a single mutex.

use crate::config::CacheConfiguration;
use crate::entry::CacheEntry;
use crate::eviction::{build_engine, EvictionEngine, EvictionPolicy};
use crate::events::StoreEvent;
use crate::fingerprint::{DatabaseKey, Fingerprint};
use csc_core::{EventListener, EventListeners};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Inner<V> {
    primary: HashMap<Fingerprint, CacheEntry<V>>,
    key_index: HashMap<DatabaseKey, HashSet<Fingerprint>>,
    engine: Box<dyn EvictionEngine>,
}

/// The thread-safe cache store.
///
/// All mutating and reading operations take the single internal mutex for
/// their whole critical section; none of them perform I/O or hold the lock
/// across a caller-supplied callback, so an event listener that panics or
/// reenters the store cannot deadlock it (reentrance still panics, as with
/// any `std::sync::Mutex`).
pub struct CacheStore<V> {
    inner: Mutex<Inner<V>>,
    max_size: usize,
    ttl: Option<Duration>,
    policy: EvictionPolicy,
    listeners: EventListeners<StoreEvent>,
}

impl<V> CacheStore<V>
where
    V: Clone + Send + 'static,
{
    /// Builds a store from a validated [`CacheConfiguration`].
    pub fn new(config: &CacheConfiguration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                primary: HashMap::new(),
                key_index: HashMap::new(),
                engine: build_engine(config.eviction_policy(), config.ttl()),
            }),
            max_size: config.max_size(),
            ttl: config.ttl(),
            policy: config.eviction_policy(),
            listeners: EventListeners::new(),
        }
    }

    /// Registers an observer for store events (hit, miss, insert, eviction).
    pub fn add_listener(&mut self, listener: impl EventListener<StoreEvent> + 'static) {
        self.listeners.add(listener);
    }

    /// The eviction policy this store was built with.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// The number of entries currently held.
    pub fn currsize(&self) -> usize {
        self.inner.lock().unwrap().primary.len()
    }

    /// Looks up `fp`, evicting it (and, under the TTL policy, any other
    /// already-expired entries) before returning.
    pub fn get(&self, fp: &Fingerprint) -> Option<V> {
        let (hit, response) = {
            let mut inner = self.inner.lock().unwrap();
            self.evict_expired_locked(&mut inner);

            match inner.primary.get_mut(fp) {
                Some(entry) => {
                    entry.mark_hit();
                    inner.engine.on_hit(fp);
                    (true, Some(entry.response().clone()))
                }
                None => (false, None),
            }
        };

        let event = if hit {
            StoreEvent::Hit {
                fingerprint: fp.clone(),
                timestamp: Instant::now(),
            }
        } else {
            StoreEvent::Miss {
                fingerprint: fp.clone(),
                timestamp: Instant::now(),
            }
        };
        self.listeners.emit(&event);

        response
    }

    /// Inserts a response, updating an existing entry in place or evicting
    /// a victim to make room for a new one.
    pub fn set(&self, fp: &Fingerprint, response: V, touched_keys: HashSet<DatabaseKey>) {
        let evicted = {
            let mut inner = self.inner.lock().unwrap();

            if inner.primary.contains_key(fp) {
                self.reindex_locked(&mut inner, fp, &touched_keys);
                let entry = inner.primary.get_mut(fp).expect("checked above");
                entry.replace(response, touched_keys);
                inner.engine.on_hit(fp);
                None
            } else {
                let evicted = if inner.primary.len() >= self.max_size {
                    inner.engine.pick_victim().map(|victim| {
                        remove_locked(&mut inner, &victim);
                        victim
                    })
                } else {
                    None
                };

                for key in &touched_keys {
                    inner.key_index.entry(key.clone()).or_default().insert(fp.clone());
                }
                inner.primary.insert(fp.clone(), CacheEntry::new(response, touched_keys));
                inner.engine.on_insert(fp);
                evicted
            }
        };

        if let Some(victim) = evicted {
            self.listeners.emit(&StoreEvent::Eviction {
                fingerprint: victim,
                timestamp: Instant::now(),
            });
        }
        self.listeners.emit(&StoreEvent::Insert {
            fingerprint: fp.clone(),
            timestamp: Instant::now(),
        });
    }

    /// Removes every fingerprint that depends on `key`. A no-op if `key` is
    /// not tracked.
    pub fn invalidate_key(&self, key: &DatabaseKey) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(fingerprints) = inner.key_index.remove(key) {
            for fp in fingerprints {
                remove_locked(&mut inner, &fp);
            }
        }
    }

    /// Removes one fingerprint directly, regardless of its dependencies.
    pub fn invalidate_fingerprint(&self, fp: &Fingerprint) {
        let mut inner = self.inner.lock().unwrap();
        remove_locked(&mut inner, fp);
    }

    /// Drops every entry and index, and resets the eviction engine.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.primary.clear();
        inner.key_index.clear();
        inner.engine.clear();
    }

    fn evict_expired_locked(&self, inner: &mut Inner<V>) {
        if self.ttl.is_none() {
            return;
        }
        let now = Instant::now();
        while let Some(fp) = inner.engine.next_expired(now) {
            remove_locked(inner, &fp);
        }
    }

    /// Reconciles `key_index` for an in-place update whose touched keys may
    /// differ from the previous insertion's.
    fn reindex_locked(&self, inner: &mut Inner<V>, fp: &Fingerprint, new_keys: &HashSet<DatabaseKey>) {
        let old_keys = inner
            .primary
            .get(fp)
            .map(|entry| entry.touched_keys().clone())
            .unwrap_or_default();

        for key in old_keys.difference(new_keys) {
            if let Some(set) = inner.key_index.get_mut(key) {
                set.remove(fp);
                if set.is_empty() {
                    inner.key_index.remove(key);
                }
            }
        }
        for key in new_keys.difference(&old_keys) {
            inner.key_index.entry(key.clone()).or_default().insert(fp.clone());
        }
    }
}

/// Removes `fp` from `primary` and every `key_index` bucket it appears in,
/// and tells the eviction engine. A no-op if `fp` is not tracked.
fn remove_locked<V>(inner: &mut Inner<V>, fp: &Fingerprint) {
    if let Some(entry) = inner.primary.remove(fp) {
        for key in entry.touched_keys() {
            if let Some(set) = inner.key_index.get_mut(key) {
                set.remove(fp);
                if set.is_empty() {
                    inner.key_index.remove(key);
                }
            }
        }
    }
    inner.engine.on_remove(fp);
}
