use super::registry::Registry;
use crate::error::{Error, Result};
use crate::store::{define_store, Action, Store, StoreOptions};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Build a store instance with the registry's shape.
///
/// The initial state is copied out of the registry once; every later reset of
/// the instance restores that copy. Getters are handed to the engine for
/// memoized evaluation. Each declared action gets an inert placeholder so the
/// store is defined with exactly the declared action names. A placeholder
/// never touches the store and fails with [`Error::UnboundAction`]; the real
/// implementations are reached through [`bind`](super::bind), which must run
/// before the store is handed out.
pub fn assemble(registry: &Registry) -> Store {
    let snapshot = registry.initial_state();
    let mut options = StoreOptions::new(move || snapshot.clone());

    for (name, getter) in registry.getters() {
        options.getters.insert(name.to_string(), Arc::clone(getter));
    }

    for name in registry.action_names() {
        options
            .actions
            .insert(name.to_string(), placeholder(registry.store_id(), name));
    }

    debug!(
        store = registry.store_id(),
        state = registry.state_names().count(),
        getters = options.getters.len(),
        actions = options.actions.len(),
        "assembled store"
    );

    define_store(registry.store_id(), options).instantiate()
}

fn placeholder(store: &str, action: &str) -> Action {
    let store = store.to_string();
    let action = action.to_string();
    Arc::new(move |_args: &[Value]| -> Result<Value> {
        Err(Error::UnboundAction {
            store: store.clone(),
            name: action.clone(),
        })
    })
}
