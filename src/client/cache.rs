//! A read-through cache for API query results, keyed by operation and variables.
//! Entries are refreshed by explicit invalidation when a mutation completes, and
//! optionally expire after a time-to-live.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use log::{debug, trace};
use rocket::serde::json::{serde_json, serde_json::Value};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Identifies one query result: operation name plus its serialized variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new<V: Serialize>(operation: &str, variables: &V) -> Result<Self> {
        let variables = serde_json::to_string(variables)?;
        Ok(Self(format!("{operation}:{variables}")))
    }

    /// Key for an operation without variables.
    pub fn operation(operation: &str) -> Self {
        Self(format!("{operation}:{{}}"))
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

struct CacheEntry {
    value: Value,
    stored_at: DateTime<Utc>,
}

pub struct QueryCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Option<Duration>,
}

impl QueryCache {
    /// A cache whose entries live until invalidated.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: None,
        }
    }

    /// A cache whose entries also expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    /// The cached value, if present, fresh, and of the expected shape.
    pub fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;

        if let Some(ttl) = self.ttl {
            if Utc::now() - entry.stored_at > ttl {
                trace!("Cache expired: {key}");
                entries.remove(key);
                return None;
            }
        }

        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => {
                trace!("Cache hit: {key}");
                Some(value)
            }
            Err(e) => {
                debug!("Dropping unreadable cache entry {key}: {e}");
                entries.remove(key);
                None
            }
        }
    }

    pub fn write<T: Serialize>(&self, key: CacheKey, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                debug!("Not caching {key}: {e}");
                return;
            }
        };
        let entry = CacheEntry {
            value,
            stored_at: Utc::now(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Drop an entry so the next read goes to the API. Returns whether it existed.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some();
        if removed {
            debug!("Cache invalidated: {key}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rocket::serde::json::serde_json::json;

    use crate::error::Error;
    use crate::model::awards::{Awards, PriorVote};

    use super::*;

    #[test]
    fn keys_include_variables() {
        let a = CacheKey::new("MyAwardsVotes", &json!({ "awardsId": "a1" })).unwrap();
        let b = CacheKey::new("MyAwardsVotes", &json!({ "awardsId": "a2" })).unwrap();
        assert_ne!(a, b);
        assert_eq!(
            a,
            CacheKey::new("MyAwardsVotes", &json!({ "awardsId": "a1" })).unwrap()
        );
        assert_eq!(CacheKey::operation("CurrentAwards").to_string(), "CurrentAwards:{}");
    }

    #[test]
    fn unserializable_variables_have_no_key() {
        let variables = HashMap::from([((1_u8, 2_u8), 3_u8)]);
        assert!(matches!(
            CacheKey::new("MyAwardsVotes", &variables),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn read_write_invalidate() {
        let cache = QueryCache::new();
        let key = CacheKey::operation("CurrentAwards");
        assert_eq!(cache.read::<Awards>(&key), None);

        cache.write(key.clone(), &Awards::example());
        assert_eq!(cache.read::<Awards>(&key), Some(Awards::example()));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert_eq!(cache.read::<Awards>(&key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn wrong_shape_is_a_miss() {
        let cache = QueryCache::new();
        let key = CacheKey::operation("CurrentAwards");
        cache.write(key.clone(), &vec![PriorVote::example("x")]);
        assert_eq!(cache.read::<Awards>(&key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn entries_expire() {
        let cache = QueryCache::with_ttl(Duration::zero());
        let key = CacheKey::operation("CurrentAwards");
        cache.write(key.clone(), &Awards::example());
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(cache.read::<Awards>(&key), None);
    }
}
