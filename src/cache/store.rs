use std::{
    collections::VecDeque,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
    key::{CacheKey, CachePrefix},
    sync::{MutationIntent, apply_intent},
};

/// One cached page of a server-side list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedCollection {
    pub items: Vec<Value>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub query: String,
}

impl CachedCollection {
    pub fn new(items: Vec<Value>, total: u64, page: u32, limit: u32) -> Self {
        Self {
            items,
            total,
            page,
            limit,
            query: String::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Age after which an entry should be refetched.
    pub stale_after: Duration,
    /// Upper bound on stored pages; the least recently refreshed goes first.
    pub max_entries: usize,
    /// Unconfirmed patches remembered per page for refresh replay.
    pub max_journal: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(60),
            max_entries: 64,
            max_journal: 32,
        }
    }
}

impl CachePolicy {
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn with_max_journal(mut self, max_journal: usize) -> Self {
        self.max_journal = max_journal.max(1);
        self
    }
}

/// Proof that a refetch started at a given generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    key: String,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fresh page stored, `replayed` optimistic patches re-applied on top.
    Stored { replayed: usize },
    /// A newer refresh already landed; the page was dropped.
    Discarded,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    collection: CachedCollection,
    fetched_at: Instant,
    /// Tickets older than this cannot be applied to the entry.
    refreshed_through: u64,
    journal: VecDeque<(u64, MutationIntent)>,
}

impl CacheEntry {
    fn patched(&self) -> bool {
        !self.journal.is_empty()
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: IndexMap<String, CacheEntry>,
    /// Store-wide generation clock; every patch takes the next value.
    clock: u64,
}

/// Shared, explicitly owned list cache.
///
/// Clones share the same entries. Reads are open to anyone; patches go through
/// [`super::OptimisticSync`] and refetches through `begin_refresh` /
/// `complete_refresh`.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<RwLock<StoreInner>>,
    policy: CachePolicy,
}

impl CacheStore {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            inner: Arc::default(),
            policy,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn read(&self, key: &CacheKey) -> Option<CachedCollection> {
        self.read_guard()
            .entries
            .get(&key.encoded())
            .map(|entry| entry.collection.clone())
    }

    /// Read-only handle for views.
    pub fn reader(&self) -> CacheReader {
        CacheReader {
            store: self.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.read_guard().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.read_guard()
            .entries
            .get(&key.encoded())
            .is_none_or(|entry| entry.fetched_at.elapsed() >= self.policy.stale_after)
    }

    /// Missing, stale, or carrying optimistic patches the server has not confirmed.
    pub fn needs_refresh(&self, key: &CacheKey) -> bool {
        let inner = self.read_guard();
        match inner.entries.get(&key.encoded()) {
            Some(entry) => {
                entry.patched() || entry.fetched_at.elapsed() >= self.policy.stale_after
            }
            None => true,
        }
    }

    pub fn begin_refresh(&self, key: &CacheKey) -> RefreshTicket {
        RefreshTicket {
            key: key.encoded(),
            generation: self.read_guard().clock,
        }
    }

    /// Store a refetched page, replaying patches applied after `ticket` was taken.
    pub fn complete_refresh(
        &self,
        ticket: RefreshTicket,
        fresh: CachedCollection,
    ) -> RefreshOutcome {
        let mut inner = self.write_guard();
        let superseded = inner
            .entries
            .get(&ticket.key)
            .is_some_and(|entry| ticket.generation < entry.refreshed_through);
        if superseded {
            debug!(key = %ticket.key, "discarding refresh older than the stored page");
            return RefreshOutcome::Discarded;
        }
        let previous = inner.entries.shift_remove(&ticket.key);

        let journal: VecDeque<(u64, MutationIntent)> = previous
            .map(|entry| entry.journal)
            .unwrap_or_default()
            .into_iter()
            .filter(|(generation, _)| *generation > ticket.generation)
            .collect();

        let mut collection = fresh;
        for (_, intent) in &journal {
            if let Some(next) = apply_intent(&collection, intent) {
                collection = next;
            }
        }
        let replayed = journal.len();
        inner.entries.insert(
            ticket.key.clone(),
            CacheEntry {
                collection,
                fetched_at: Instant::now(),
                refreshed_through: ticket.generation,
                journal,
            },
        );
        self.enforce_capacity(&mut inner);
        debug!(key = %ticket.key, replayed, "stored refreshed page");
        RefreshOutcome::Stored { replayed }
    }

    /// Store a page fetched outside any optimistic activity.
    pub fn populate(&self, key: &CacheKey, collection: CachedCollection) -> RefreshOutcome {
        let ticket = self.begin_refresh(key);
        self.complete_refresh(ticket, collection)
    }

    /// Drop every entry older than the stale window. Returns how many went.
    pub fn evict_stale(&self) -> usize {
        let stale_after = self.policy.stale_after;
        let mut inner = self.write_guard();
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| entry.fetched_at.elapsed() < stale_after);
        before - inner.entries.len()
    }

    pub fn invalidate_prefix(&self, prefix: &CachePrefix) -> usize {
        let mut inner = self.write_guard();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !prefix.matches(key));
        before - inner.entries.len()
    }

    /// Run `updater` against the entry under `key`.
    ///
    /// `None` from the updater leaves the entry untouched; `Some` replaces the
    /// page and journals `intent` for later refresh replay. Returns `None`
    /// when nothing is cached under the key.
    pub(crate) fn write<F>(&self, key: &str, intent: &MutationIntent, updater: F) -> Option<bool>
    where
        F: FnOnce(&CachedCollection) -> Option<CachedCollection>,
    {
        let max_journal = self.policy.max_journal;
        let mut inner = self.write_guard();
        let inner = &mut *inner;
        let entry = inner.entries.get_mut(key)?;
        let Some(next) = updater(&entry.collection) else {
            return Some(false);
        };
        inner.clock += 1;
        entry.collection = next;
        entry.journal.push_back((inner.clock, intent.clone()));
        // Refreshes begun before a forgotten patch could not replay it.
        while entry.journal.len() > max_journal {
            if let Some((generation, _)) = entry.journal.pop_front() {
                entry.refreshed_through = entry.refreshed_through.max(generation);
            }
        }
        Some(true)
    }

    pub(crate) fn keys_matching(&self, prefix: &CachePrefix) -> Vec<String> {
        self.read_guard()
            .entries
            .keys()
            .filter(|key| prefix.matches(key))
            .cloned()
            .collect()
    }

    fn enforce_capacity(&self, inner: &mut StoreInner) {
        while inner.entries.len() > self.policy.max_entries {
            if let Some((key, _)) = inner.entries.shift_remove_index(0) {
                debug!(key = %key, "evicted least recently refreshed page");
            }
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn journal_len(&self, key: &CacheKey) -> Option<usize> {
        self.read_guard()
            .entries
            .get(&key.encoded())
            .map(|entry| entry.journal.len())
    }
}

/// Read-only view over a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct CacheReader {
    store: CacheStore,
}

impl CacheReader {
    pub fn read(&self, key: &CacheKey) -> Option<CachedCollection> {
        self.store.read(key)
    }

    pub fn needs_refresh(&self, key: &CacheKey) -> bool {
        self.store.needs_refresh(key)
    }
}
