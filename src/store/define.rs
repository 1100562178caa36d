use super::state::{State, StateMap};
use super::store::Store;
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An action implementation: positional arguments in, result out.
pub type Action = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Positional argument of an action call.
///
/// Fails with [`Error::MissingArgument`] when fewer arguments were passed.
pub fn arg(args: &[Value], index: usize) -> Result<&Value> {
    args.get(index).ok_or(Error::MissingArgument { index })
}

/// A derived value computed from the store's state.
pub type Getter = Arc<dyn Fn(&State) -> Value + Send + Sync>;

/// Produces the initial state of a new store instance.
pub type StateFactory = Arc<dyn Fn() -> StateMap + Send + Sync>;

/// The static shape a store is defined with.
///
/// The engine needs the full shape up front: every getter and every action
/// must be present when the store is defined.
#[derive(Clone)]
pub struct StoreOptions {
    pub state: StateFactory,
    pub getters: HashMap<String, Getter>,
    pub actions: HashMap<String, Action>,
}

impl StoreOptions {
    /// Options with the given state producer and no getters or actions.
    pub fn new<F>(state: F) -> Self
    where
        F: Fn() -> StateMap + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(state),
            getters: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    pub fn getter<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&State) -> Value + Send + Sync + 'static,
    {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    pub fn action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// A defined store, ready to be instantiated.
#[derive(Clone, Debug)]
pub struct UseStore {
    id: Arc<str>,
    options: Arc<StoreOptions>,
}

impl UseStore {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Create a live store instance from this definition.
    ///
    /// Each call produces an independent instance with fresh state.
    pub fn instantiate(&self) -> Store {
        Store::new(&self.id, Arc::clone(&self.options))
    }
}

/// Define a store from its static shape.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use tincan_setup::store::{define_store, StateMap, StoreOptions};
///
/// let use_counter = define_store(
///     "counter",
///     StoreOptions::new(|| StateMap::from([("count".to_string(), json!(1))]))
///         .getter("double", |state| json!(state.get_i64("count").unwrap_or(0) * 2))
///         .action("noop", |_args| Ok(Value::Null)),
/// );
///
/// let store = use_counter.instantiate();
/// assert_eq!(store.getter("double"), Some(json!(2)));
/// ```
pub fn define_store(id: impl Into<String>, options: StoreOptions) -> UseStore {
    let id: String = id.into();
    UseStore {
        id: Arc::from(id),
        options: Arc::new(options),
    }
}
