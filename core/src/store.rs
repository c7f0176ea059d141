use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub doc_id: String,
    pub score: f64,
}

impl ScoreEntry {
    pub fn new(doc_id: impl Into<String>, score: f64) -> Self { Self { doc_id: doc_id.into(), score } }
}

pub type ScoreList = Vec<ScoreEntry>;

type Slot = Arc<OnceLock<Arc<ScoreList>>>;

/// Query text -> score list. Entries are written at most once and never evicted.
///
/// Every key owns a once-cell, so callers racing on the same uncomputed query
/// block on a single computation while other keys proceed independently.
#[derive(Debug, Default)]
pub struct ScoreStore {
    slots: RwLock<HashMap<String, Slot>>,
    computed: AtomicUsize,
}

impl ScoreStore {
    pub fn new() -> Self { Self::default() }

    pub fn get_or_compute<F>(&self, query: &str, compute: F) -> Arc<ScoreList>
    where
        F: FnOnce() -> ScoreList,
    {
        let slot = self.slot(query);
        slot.get_or_init(|| {
            self.computed.fetch_add(1, Ordering::Relaxed);
            Arc::new(compute())
        })
        .clone()
    }

    /// Stored list for `query`, if it has been computed.
    pub fn get(&self, query: &str) -> Option<Arc<ScoreList>> {
        self.slots.read().get(query).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, query: &str) -> bool { self.get(query).is_some() }

    pub fn len(&self) -> usize { self.slots.read().values().filter(|s| s.get().is_some()).count() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// How many score lists have actually been computed.
    pub fn computations(&self) -> usize { self.computed.load(Ordering::Relaxed) }

    fn slot(&self, query: &str) -> Slot {
        if let Some(slot) = self.slots.read().get(query) {
            return slot.clone();
        }
        self.slots.write().entry(query.to_string()).or_default().clone()
    }
}
