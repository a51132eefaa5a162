use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    key::{CacheKey, CachePrefix},
    store::{CacheStore, CachedCollection},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Add,
    Edit,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationIntent {
    pub action: MutationAction,
    /// Field holding the entity identity, e.g. `id` or `dni`.
    pub identifier_key: String,
    pub item: Value,
}

impl MutationIntent {
    pub fn new(action: MutationAction, identifier_key: impl Into<String>, item: Value) -> Self {
        Self {
            action,
            identifier_key: identifier_key.into(),
            item,
        }
    }

    pub fn add(identifier_key: impl Into<String>, item: Value) -> Self {
        Self::new(MutationAction::Add, identifier_key, item)
    }

    pub fn edit(identifier_key: impl Into<String>, item: Value) -> Self {
        Self::new(MutationAction::Edit, identifier_key, item)
    }

    pub fn delete(identifier_key: impl Into<String>, item: Value) -> Self {
        Self::new(MutationAction::Delete, identifier_key, item)
    }

    fn identifier(&self) -> Option<&Value> {
        self.item
            .get(&self.identifier_key)
            .filter(|value| !value.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The intent had no effect; the entry is untouched.
    Unchanged,
    /// Nothing is cached under the key.
    NotCached,
}

/// Pure page transition for one intent. `None` means no-op.
pub fn apply_intent(
    collection: &CachedCollection,
    intent: &MutationIntent,
) -> Option<CachedCollection> {
    let id = intent.identifier()?;
    let position = collection
        .items
        .iter()
        .position(|item| item.get(&intent.identifier_key) == Some(id));

    match (intent.action, position) {
        (MutationAction::Add, Some(_)) => None,
        (MutationAction::Add, None) => {
            let mut next = collection.clone();
            next.items.insert(0, intent.item.clone());
            if next.limit > 0 {
                next.items.truncate(next.limit as usize);
            }
            next.total += 1;
            Some(next)
        }
        (MutationAction::Edit, Some(idx)) => {
            let mut next = collection.clone();
            merge_shallow(&mut next.items[idx], &intent.item);
            (next != *collection).then_some(next)
        }
        (MutationAction::Delete, Some(idx)) => {
            let mut next = collection.clone();
            next.items.remove(idx);
            next.total = next.total.saturating_sub(1);
            Some(next)
        }
        (MutationAction::Edit | MutationAction::Delete, None) => None,
    }
}

fn merge_shallow(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(update)) => {
            for (key, value) in update {
                existing.insert(key.clone(), value.clone());
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// The single writer for optimistic list patches.
#[derive(Debug, Clone)]
pub struct OptimisticSync {
    store: CacheStore,
}

impl OptimisticSync {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn apply(&self, key: &CacheKey, intent: MutationIntent) -> ApplyOutcome {
        self.apply_encoded(&key.encoded(), &intent)
    }

    /// Remove the entity from every cached page under `prefix`.
    ///
    /// Only deletes make sense across pages; other actions are refused.
    pub fn apply_to_prefix(&self, prefix: &CachePrefix, intent: MutationIntent) -> usize {
        if intent.action != MutationAction::Delete {
            warn!(
                prefix = prefix.as_str(),
                action = ?intent.action,
                "only deletes can target a key prefix"
            );
            return 0;
        }
        self.store
            .keys_matching(prefix)
            .iter()
            .filter(|key| self.apply_encoded(key, &intent) == ApplyOutcome::Applied)
            .count()
    }

    fn apply_encoded(&self, key: &str, intent: &MutationIntent) -> ApplyOutcome {
        if intent.identifier().is_none() {
            warn!(
                key,
                identifier = %intent.identifier_key,
                "mutation item has no identifier; cache left untouched"
            );
            return ApplyOutcome::Unchanged;
        }
        match self
            .store
            .write(key, intent, |collection| apply_intent(collection, intent))
        {
            Some(true) => {
                info!(key, action = ?intent.action, "applied optimistic patch");
                ApplyOutcome::Applied
            }
            Some(false) => {
                debug!(key, action = ?intent.action, "optimistic patch was a no-op");
                ApplyOutcome::Unchanged
            }
            None => {
                debug!(key, "no cached page for optimistic patch");
                ApplyOutcome::NotCached
            }
        }
    }
}

/// Ties a form's successful submit to one cached page.
#[derive(Debug, Clone)]
pub struct CacheBinding {
    pub sync: OptimisticSync,
    pub key: CacheKey,
    pub action: MutationAction,
    pub identifier_key: String,
}

impl CacheBinding {
    pub fn new(
        sync: OptimisticSync,
        key: CacheKey,
        action: MutationAction,
        identifier_key: impl Into<String>,
    ) -> Self {
        Self {
            sync,
            key,
            action,
            identifier_key: identifier_key.into(),
        }
    }

    pub(crate) fn apply(&self, entity: &Value) -> ApplyOutcome {
        let intent = MutationIntent::new(self.action, self.identifier_key.clone(), entity.clone());
        match self.action {
            MutationAction::Delete => {
                let applied = self.sync.apply_to_prefix(&self.key.prefix(), intent);
                if applied > 0 {
                    ApplyOutcome::Applied
                } else {
                    ApplyOutcome::Unchanged
                }
            }
            MutationAction::Add | MutationAction::Edit => self.sync.apply(&self.key, intent),
        }
    }
}
