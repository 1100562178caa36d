use super::registry::Registry;
use crate::error::{Error, Result};
use crate::store::{Action, ActionCall, Store};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

/// Real action implementations of one store instance, keyed by action name.
struct BindingTable {
    actions: HashMap<String, Action>,
}

impl BindingTable {
    fn forward(table: &OnceLock<BindingTable>, call: &ActionCall<'_>) -> Result<Value> {
        let action = table
            .get()
            .and_then(|table| table.actions.get(call.name))
            .ok_or_else(|| Error::UnboundAction {
                store: call.store.to_string(),
                name: call.name.to_string(),
            })?;

        trace!(store = call.store, action = call.name, "forwarding to bound action");
        action(call.args)
    }
}

/// A store whose actions have been bound to their implementations.
#[derive(Debug, Clone)]
pub struct BoundStore {
    store: Store,
    actions: Vec<String>,
}

impl BoundStore {
    /// Names of the actions reachable through the store, sorted.
    pub fn bound_actions(&self) -> &[String] {
        &self.actions
    }

    pub fn into_store(self) -> Store {
        self.store
    }
}

impl Deref for BoundStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

/// Bind the registry's actions to a store built from it.
///
/// Installs the store's single action interceptor, then runs every action
/// factory once with the store and publishes the results as the store's
/// binding table. From then on every dispatch on the store, whichever way it
/// is made, is looked up by name in that table and forwarded with its
/// original arguments.
///
/// A store can be bound only once. A second call fails with
/// [`Error::AlreadyBound`] before running any factory, and the first binding
/// keeps working.
///
/// Factories receive a handle that does not keep the store alive, so bound
/// actions can capture it without leaking the store.
pub fn bind(registry: &Registry, store: &Store) -> Result<BoundStore> {
    let table: Arc<OnceLock<BindingTable>> = Arc::new(OnceLock::new());

    let lookup = Arc::clone(&table);
    store
        .intercept_actions(move |call| BindingTable::forward(&lookup, call))
        .map_err(|err| match err {
            Error::InterceptorInstalled { store } => Error::AlreadyBound { store },
            other => other,
        })?;

    let handle = store.detached();
    let actions: HashMap<String, Action> = registry
        .action_factories()
        .map(|(name, factory)| (name.to_string(), factory(&handle)))
        .collect();

    let mut names: Vec<String> = actions.keys().cloned().collect();
    names.sort_unstable();

    // The interceptor above was installed by this call, so the table is empty.
    let published = table.set(BindingTable { actions }).is_ok();
    debug_assert!(published, "binding table published twice");

    debug!(store = store.id(), actions = names.len(), "bound store actions");

    Ok(BoundStore {
        store: store.clone(),
        actions: names,
    })
}
