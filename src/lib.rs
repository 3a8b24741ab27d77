mod document;
mod error;
mod loader;
pub mod normalize;
pub mod spelling;
mod store;

pub use document::{Document, IndexKey};
pub use error::{IndexError, SpellingError};
pub use normalize::NormalizeOptions;
pub use spelling::{
    NoSpellings, ReplaceRule, ReplaceRuleSpec, RuleSet, SpellingMap, SpellingRule,
    build_spellings,
};
pub use store::{Store, StoredEntry};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::trace;

const DEFAULT_FIELD: &str = "label";
const DEFAULT_QUERY_CACHE: usize = 1024;

/// Construction-time settings for a [`FastIndex`].
#[derive(Clone)]
pub struct IndexConfig {
    pub fields: Vec<String>,
    pub spellings: Arc<dyn SpellingRule>,
    pub normalize: NormalizeOptions,
    /// Number of built query key sets kept for `get`; `0` disables caching.
    pub query_cache: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            fields: vec![DEFAULT_FIELD.to_string()],
            spellings: Arc::new(NoSpellings),
            normalize: NormalizeOptions::default(),
            query_cache: DEFAULT_QUERY_CACHE,
        }
    }
}

impl fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexConfig")
            .field("fields", &self.fields)
            .field("normalize", &self.normalize)
            .field("query_cache", &self.query_cache)
            .finish_non_exhaustive()
    }
}

impl IndexConfig {
    /// Fields read by `load_one`, in order. An empty list keeps `["label"]`.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.fields = if fields.is_empty() {
            vec![DEFAULT_FIELD.to_string()]
        } else {
            fields
        };
        self
    }

    pub fn with_spellings(mut self, rule: impl SpellingRule + 'static) -> Self {
        self.spellings = Arc::new(rule);
        self
    }

    pub fn with_normalize(mut self, options: NormalizeOptions) -> Self {
        self.normalize = options;
        self
    }

    pub fn with_query_cache(mut self, capacity: usize) -> Self {
        self.query_cache = capacity;
        self
    }
}

/// One ranked match returned by [`FastIndex::get`].
#[derive(Debug, PartialEq, Serialize)]
pub struct Hit<'a, V> {
    pub value: &'a V,
    pub score: f64,
}

impl<V> Clone for Hit<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Hit<'_, V> {}

/// In-memory fuzzy lookup index from free-text keys to values.
///
/// Build it with [`set`](Self::set) or the loaders, then query it with
/// [`get`](Self::get). Writes take `&mut self`; reads can be shared.
pub struct FastIndex<V = Value> {
    config: IndexConfig,
    store: Store<V>,
    query_cache: Option<Mutex<LruCache<String, Arc<SpellingMap>>>>,
}

impl<V: PartialEq> Default for FastIndex<V> {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl<V> fmt::Debug for FastIndex<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastIndex")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<V: PartialEq> FastIndex<V> {
    pub fn new(config: IndexConfig) -> Self {
        let query_cache = NonZeroUsize::new(config.query_cache)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));
        Self {
            config,
            store: Store::new(),
            query_cache,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn store(&self) -> &Store<V> {
        &self.store
    }

    /// Number of distinct normalized keys.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of stored entries across all keys.
    pub fn entry_count(&self) -> usize {
        self.store.entry_count()
    }

    /// Returns the weighted keys this index derives from `text`.
    pub fn keys(&self, text: &str) -> Result<SpellingMap, IndexError> {
        build_spellings(text, &*self.config.spellings, &self.config.normalize)
    }

    /// Indexes `value` under `key` and all of its spelling variants.
    ///
    /// Empty keys are ignored. A list of keys indexes the value under each
    /// element independently.
    pub fn set(&mut self, key: impl Into<IndexKey>, value: V) -> Result<(), IndexError>
    where
        V: Clone,
    {
        let key = key.into();
        if key.is_blank() {
            return Ok(());
        }
        match key {
            IndexKey::Single(key) => self.set_text(&key, &value),
            IndexKey::Multi(keys) => {
                for key in &keys {
                    self.set_text(key, &value)?;
                }
                Ok(())
            }
        }
    }

    fn set_text(&mut self, key: &str, value: &V) -> Result<(), IndexError>
    where
        V: Clone,
    {
        if key.is_empty() {
            return Ok(());
        }
        let spellings = self.keys(key)?;
        self.insert_spellings(&spellings, value);
        Ok(())
    }

    pub(crate) fn insert_spellings(&mut self, spellings: &SpellingMap, value: &V)
    where
        V: Clone,
    {
        let mut inserted = 0usize;
        for (key, weight) in spellings.entries() {
            if self.store.insert(key, value.clone(), weight) {
                inserted += 1;
            }
        }
        trace!(keys = spellings.len(), inserted, "indexed value");
    }

    /// Indexes `item` under each configured field. Blank items are ignored.
    pub fn load_one(&mut self, item: &V) -> Result<(), IndexError>
    where
        V: Document + Clone,
    {
        if item.is_blank() {
            return Ok(());
        }
        for i in 0..self.config.fields.len() {
            if let Some(key) = item.field(&self.config.fields[i]) {
                self.set(key, item.clone())?;
            }
        }
        Ok(())
    }

    /// Looks up `query` and returns every match, best score first.
    pub fn get(&self, query: &str) -> Result<Vec<Hit<'_, V>>, IndexError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let spellings = self.query_spellings(query)?;
        Ok(self.rank(&spellings))
    }

    /// Like [`get`](Self::get), but expands the query with `rule` instead of
    /// the configured one.
    pub fn get_with(
        &self,
        query: &str,
        rule: &dyn SpellingRule,
    ) -> Result<Vec<Hit<'_, V>>, IndexError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let spellings = build_spellings(query, rule, &self.config.normalize)?;
        Ok(self.rank(&spellings))
    }

    fn query_spellings(&self, query: &str) -> Result<Arc<SpellingMap>, IndexError> {
        let Some(cache) = &self.query_cache else {
            return self.keys(query).map(Arc::new);
        };
        if let Some(cached) = cache.lock().get(query) {
            return Ok(Arc::clone(cached));
        }
        let spellings = Arc::new(self.keys(query)?);
        cache.lock().put(query.to_owned(), Arc::clone(&spellings));
        Ok(spellings)
    }

    fn rank(&self, spellings: &SpellingMap) -> Vec<Hit<'_, V>> {
        let mut hits = Vec::new();
        for (key, weight) in spellings.entries() {
            for entry in self.store.lookup(key) {
                hits.push(Hit {
                    value: &entry.value,
                    score: weight * entry.score,
                });
            }
        }
        if hits.len() > 1 {
            hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        }
        trace!(keys = spellings.len(), hits = hits.len(), "ranked query");
        hits
    }
}
