//! Bulk drivers around [`FastIndex::load_one`].
//!
//! Every driver loads items in collection order and leaves the index in the
//! same state as calling `load_one` on each item by hand.

use rayon::prelude::*;
use tracing::debug;

use crate::document::{Document, IndexKey};
use crate::error::IndexError;
use crate::spelling::{SpellingMap, SpellingRule, build_spellings};
use crate::{FastIndex, NormalizeOptions};

impl<V> FastIndex<V>
where
    V: Document + Clone + PartialEq,
{
    /// Loads every item eagerly on the calling thread.
    pub fn load_sync<I>(&mut self, items: I) -> Result<&mut Self, IndexError>
    where
        I: IntoIterator<Item = V>,
    {
        let mut loaded = 0usize;
        for item in items {
            self.load_one(&item)?;
            loaded += 1;
        }
        debug!(
            items = loaded,
            keys = self.len(),
            entries = self.entry_count(),
            "loaded collection"
        );
        Ok(self)
    }

    /// Builds keys for all items on the rayon pool, then inserts them in
    /// collection order.
    ///
    /// If a spelling rule fails, everything `load_sync` would have stored
    /// before the failure is stored, then the error is returned.
    pub fn load_parallel(&mut self, items: &[V]) -> Result<&mut Self, IndexError>
    where
        V: Sync,
    {
        let fields = &self.config.fields;
        let rule = &*self.config.spellings;
        let options = &self.config.normalize;
        let planned: Vec<PlannedItem> = items
            .par_iter()
            .map(|item| plan_item(item, fields, rule, options))
            .collect();

        for (item, plan) in items.iter().zip(planned) {
            for map in &plan.spellings {
                self.insert_spellings(map, item);
            }
            if let Some(err) = plan.failure {
                return Err(err);
            }
        }
        debug!(
            items = items.len(),
            keys = self.len(),
            entries = self.entry_count(),
            "loaded collection in parallel"
        );
        Ok(self)
    }

    /// Loads items one per scheduler tick so a large collection does not
    /// starve other tasks on the runtime. Returns the number of items seen.
    #[cfg(feature = "async")]
    pub async fn load_async<I>(&mut self, items: I) -> Result<usize, IndexError>
    where
        I: IntoIterator<Item = V>,
    {
        let mut loaded = 0usize;
        for item in items {
            self.load_one(&item)?;
            loaded += 1;
            tokio::task::yield_now().await;
        }
        debug!(
            items = loaded,
            keys = self.len(),
            entries = self.entry_count(),
            "loaded collection asynchronously"
        );
        Ok(loaded)
    }
}

/// Keys built for one item, up to the first rule failure if there was one.
struct PlannedItem {
    spellings: Vec<SpellingMap>,
    failure: Option<IndexError>,
}

// Mirrors `load_one`: same fields, same key order, same blank handling.
fn plan_item<V: Document>(
    item: &V,
    fields: &[String],
    rule: &dyn SpellingRule,
    options: &NormalizeOptions,
) -> PlannedItem {
    let mut plan = PlannedItem {
        spellings: Vec::new(),
        failure: None,
    };
    if item.is_blank() {
        return plan;
    }
    for field in fields {
        let texts = match item.field(field) {
            Some(IndexKey::Single(text)) => vec![text],
            Some(IndexKey::Multi(texts)) => texts,
            None => continue,
        };
        for text in texts.iter().filter(|text| !text.is_empty()) {
            match build_spellings(text, rule, options) {
                Ok(spellings) => plan.spellings.push(spellings),
                Err(err) => {
                    plan.failure = Some(err);
                    return plan;
                }
            }
        }
    }
    plan
}
