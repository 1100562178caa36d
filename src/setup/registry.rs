use crate::error::{DeclarationKind, Error, Result};
use crate::store::{Action, Getter, State, StateMap, Store};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds an action's implementation once the store it acts on exists.
pub type ActionFactory = Arc<dyn Fn(&Store) -> Action + Send + Sync>;

/// Named declarations for one store, collected before the store exists.
///
/// State, getter and action names share one namespace: a name can be declared
/// only once, whatever its kind.
pub struct Registry {
    store_id: String,
    state: BTreeMap<String, Value>,
    getters: BTreeMap<String, Getter>,
    actions: BTreeMap<String, ActionFactory>,
}

impl Registry {
    pub fn new(store_id: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            state: BTreeMap::new(),
            getters: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Declare a state cell with its initial value.
    pub fn declare_state(
        &mut self,
        name: impl Into<String>,
        initial: impl Into<Value>,
    ) -> Result<()> {
        let name = self.claim(name.into())?;
        self.state.insert(name, initial.into());
        Ok(())
    }

    /// Declare a derived value computed from the store's state.
    pub fn declare_getter<F>(&mut self, name: impl Into<String>, compute: F) -> Result<()>
    where
        F: Fn(&State) -> Value + Send + Sync + 'static,
    {
        let name = self.claim(name.into())?;
        self.getters.insert(name, Arc::new(compute));
        Ok(())
    }

    /// Declare an action through a factory that receives the live store.
    ///
    /// The factory runs once, when the store is bound, and returns the
    /// action's implementation. It may keep the store handle to read and write
    /// state or dispatch other actions later, but must not dispatch while it
    /// is running: the other actions are not bound yet. The handle does not
    /// keep the store alive.
    pub fn declare_action<F, A>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&Store) -> A + Send + Sync + 'static,
        A: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let name = self.claim(name.into())?;
        self.actions
            .insert(name, Arc::new(move |store: &Store| -> Action { Arc::new(factory(store)) }));
        Ok(())
    }

    /// The kind a name was declared as, if any.
    pub fn kind_of(&self, name: &str) -> Option<DeclarationKind> {
        if self.state.contains_key(name) {
            Some(DeclarationKind::State)
        } else if self.getters.contains_key(name) {
            Some(DeclarationKind::Getter)
        } else if self.actions.contains_key(name) {
            Some(DeclarationKind::Action)
        } else {
            None
        }
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    pub fn getter_names(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.state.len() + self.getters.len() + self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The declared initial values, copied out.
    pub fn initial_state(&self) -> StateMap {
        self.state.clone()
    }

    pub(crate) fn getters(&self) -> impl Iterator<Item = (&str, &Getter)> {
        self.getters.iter().map(|(name, getter)| (name.as_str(), getter))
    }

    pub(crate) fn action_factories(&self) -> impl Iterator<Item = (&str, &ActionFactory)> {
        self.actions.iter().map(|(name, factory)| (name.as_str(), factory))
    }

    fn claim(&self, name: String) -> Result<String> {
        match self.kind_of(&name) {
            Some(existing) => Err(Error::NameCollision {
                store: self.store_id.clone(),
                name,
                existing,
            }),
            None => Ok(name),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store_id", &self.store_id)
            .field("state", &self.state)
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
