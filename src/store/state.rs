use crate::signal::Signal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Snapshot of a store's state, keyed by state name.
pub type StateMap = BTreeMap<String, Value>;

/// The reactive state of one store instance.
///
/// Each state key is backed by its own [`Signal`], so a getter only recomputes
/// when a key it actually read has been written. The set of keys is fixed when
/// the store is instantiated. Getters receive this type and can only read it;
/// writes go through the owning [`Store`](crate::Store).
#[derive(Clone)]
pub struct State {
    cells: Arc<BTreeMap<String, Signal<Value>>>,
}

impl State {
    pub(crate) fn new(initial: StateMap) -> Self {
        let cells = initial
            .into_iter()
            .map(|(name, value)| (name, Signal::new(value)))
            .collect();
        Self {
            cells: Arc::new(cells),
        }
    }

    /// Current value of a state key, tracked as a reactive read.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.cells.get(name).map(Signal::get)
    }

    /// Read a state key without cloning it.
    pub fn with<R>(&self, name: &str, f: impl FnOnce(&Value) -> R) -> Option<R> {
        self.cells.get(name).map(|cell| cell.with(f))
    }

    /// Shorthand for reading an integer state key.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.with(name, Value::as_i64).flatten()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn snapshot(&self) -> StateMap {
        self.cells
            .iter()
            .map(|(name, cell)| (name.clone(), cell.get()))
            .collect()
    }

    pub(crate) fn cell(&self, name: &str) -> Option<&Signal<Value>> {
        self.cells.get(name)
    }
}
