use super::assembler::assemble;
use super::dispatcher::bind;
use super::registry::Registry;
use crate::error::{Error, Result};
use crate::store::{State, Store};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// How a [`SetupStore`] hands out store instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupConfig {
    /// Return the same instance from every [`SetupStore::get_store`] call.
    /// When off, each call builds and binds an independent instance.
    pub memoize: bool,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self { memoize: true }
    }
}

/// A store declared setup style: state, getters and actions by name.
///
/// Declarations are accepted until the first [`get_store`](Self::get_store)
/// call; after that the store's shape is fixed.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use tincan_setup::{arg, SetupStore, Store};
///
/// let mut counter = SetupStore::new("counter");
/// counter
///     .state("count", 0)?
///     .getter("doubled", |state| json!(state.get_i64("count").unwrap_or(0) * 2))?
///     .action("increment", |store: &Store| {
///         let store = store.clone();
///         move |args: &[Value]| {
///             let by = arg(args, 0)?.as_i64().unwrap_or(0);
///             store.update("count", |count| *count = json!(count.as_i64().unwrap_or(0) + by))?;
///             Ok(Value::Null)
///         }
///     })?;
///
/// let store = counter.get_store()?;
/// store.dispatch("increment", &[json!(5)])?;
/// assert_eq!(store.getter("doubled"), Some(json!(10)));
/// # Ok::<(), tincan_setup::Error>(())
/// ```
pub struct SetupStore {
    registry: Registry,
    config: SetupConfig,
    sealed: AtomicBool,
    instance: Mutex<Option<Store>>,
}

impl SetupStore {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_config(id, SetupConfig::default())
    }

    pub fn with_config(id: impl Into<String>, config: SetupConfig) -> Self {
        Self::from_registry(Registry::new(id), config)
    }

    fn from_registry(registry: Registry, config: SetupConfig) -> Self {
        Self {
            registry,
            config,
            sealed: AtomicBool::new(false),
            instance: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        self.registry.store_id()
    }

    pub fn config(&self) -> SetupConfig {
        self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Declare a state cell. See [`Registry::declare_state`].
    pub fn state(
        &mut self,
        name: impl Into<String>,
        initial: impl Into<Value>,
    ) -> Result<&mut Self> {
        self.open_registry()?.declare_state(name, initial)?;
        Ok(self)
    }

    /// Declare a getter. See [`Registry::declare_getter`].
    pub fn getter<F>(&mut self, name: impl Into<String>, compute: F) -> Result<&mut Self>
    where
        F: Fn(&State) -> Value + Send + Sync + 'static,
    {
        self.open_registry()?.declare_getter(name, compute)?;
        Ok(self)
    }

    /// Declare an action factory. See [`Registry::declare_action`].
    pub fn action<F, A>(&mut self, name: impl Into<String>, factory: F) -> Result<&mut Self>
    where
        F: Fn(&Store) -> A + Send + Sync + 'static,
        A: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.open_registry()?.declare_action(name, factory)?;
        Ok(self)
    }

    /// Get the live store: assembled from the declarations, with every action
    /// bound.
    pub fn get_store(&self) -> Result<Store> {
        let mut instance = self.instance.lock();
        if let Some(store) = instance.as_ref() {
            return Ok(store.clone());
        }

        self.sealed.store(true, Ordering::SeqCst);

        let store = assemble(&self.registry);
        let store = bind(&self.registry, &store)?.into_store();

        if self.config.memoize {
            *instance = Some(store.clone());
        }
        debug!(store = self.id(), memoized = self.config.memoize, "store ready");
        Ok(store)
    }

    fn open_registry(&mut self) -> Result<&mut Registry> {
        if *self.sealed.get_mut() {
            return Err(Error::Sealed {
                store: self.registry.store_id().to_string(),
            });
        }
        Ok(&mut self.registry)
    }
}

impl fmt::Debug for SetupStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupStore")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("sealed", &self.sealed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Define a store with a setup function.
///
/// The setup function declares everything the store has; the returned
/// [`SetupStore`] builds it on demand.
///
/// # Example
///
/// ```
/// use serde_json::{json, Value};
/// use tincan_setup::{define_setup_store, Store};
///
/// let todos = define_setup_store("todos", |setup| {
///     setup.declare_state("items", json!([]))?;
///     setup.declare_getter("count", |state| {
///         json!(state.with("items", |items| items.as_array().map_or(0, Vec::len)))
///     })?;
///     setup.declare_action("add", |store: &Store| {
///         let store = store.clone();
///         move |args: &[Value]| {
///             let item = args.first().cloned().unwrap_or(Value::Null);
///             store.update("items", |items| {
///                 if let Some(items) = items.as_array_mut() {
///                     items.push(item);
///                 }
///             })?;
///             Ok(Value::Null)
///         }
///     })
/// })?;
///
/// let store = todos.get_store()?;
/// store.dispatch("add", &[json!("milk")])?;
/// assert_eq!(store.getter("count"), Some(json!(1)));
/// # Ok::<(), tincan_setup::Error>(())
/// ```
pub fn define_setup_store<F>(id: impl Into<String>, setup: F) -> Result<SetupStore>
where
    F: FnOnce(&mut Registry) -> Result<()>,
{
    let mut registry = Registry::new(id);
    setup(&mut registry)?;
    Ok(SetupStore::from_registry(registry, SetupConfig::default()))
}
