//! Resolution cache.
//!
//! Per-entity memoization of filtered record lists, keyed by a stable
//! serialization of the query shape. Each entity's entries are stamped with
//! the entity's version (and its owner's); a stamp mismatch throws the
//! entity's entries away before lookup, so callers never invalidate by hand.

use crate::context::ResolutionContext;
use crate::modifier::ModifierRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Version of an entity together with its owner's.
pub type VersionStamp = (u64, Option<u64>);

/// The query shape a cached list depends on.
///
/// Serialized to JSON to form the cache key; field order is fixed, so the
/// serialization is stable.
#[derive(Debug, Clone, Serialize)]
pub struct CacheKey<'q> {
    pub key: String,
    pub attribute_filter: String,
    pub item_filter: String,
    pub embedded_override: Option<Vec<String>>,
    pub owner: Option<&'q str>,
    pub parent: Option<&'q str>,
    pub context: ResolutionContext,
}

impl CacheKey<'_> {
    pub fn encode(&self) -> String {
        // Plain strings, options and bools only; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct EntityCache {
    stamp: VersionStamp,
    entries: HashMap<String, Vec<ModifierRecord>>,
}

/// Cache of filtered record lists, scoped per entity.
///
/// # Examples
///
/// ```rust
/// use sheetcalc::ResolutionCache;
///
/// let mut cache = ResolutionCache::new();
/// cache.insert("a1", (1, None), "k".into(), Vec::new());
/// assert!(cache.get("a1", (1, None), "k").is_some());
///
/// // The entity changed: its entries are gone.
/// assert!(cache.get("a1", (2, None), "k").is_none());
/// ```
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entities: HashMap<String, EntityCache>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached list. A stale stamp clears the entity's entries.
    pub fn get(&mut self, entity_id: &str, stamp: VersionStamp, key: &str) -> Option<&[ModifierRecord]> {
        let cache = self.entities.get_mut(entity_id)?;
        if cache.stamp != stamp {
            tracing::debug!(entity = entity_id, "entity changed; dropping cached resolutions");
            cache.entries.clear();
            cache.stamp = stamp;
            return None;
        }
        cache.entries.get(key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, entity_id: &str, stamp: VersionStamp, key: String, records: Vec<ModifierRecord>) {
        let cache = self.entities.entry(entity_id.to_string()).or_default();
        if cache.stamp != stamp {
            cache.entries.clear();
            cache.stamp = stamp;
        }
        cache.entries.insert(key, records);
    }

    /// Drop everything cached for one entity.
    pub fn invalidate(&mut self, entity_id: &str) {
        self.entities.remove(entity_id);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Number of cached lists across all entities.
    pub fn len(&self) -> usize {
        self.entities.values().map(|c| c.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
