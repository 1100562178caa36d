use super::define::StoreOptions;
use super::state::{State, StateMap};
use crate::error::{Error, Result};
use crate::signal::{Memo, Signal};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// One invocation of a store action, as seen by listeners and interceptors.
#[derive(Debug, Clone, Copy)]
pub struct ActionCall<'a> {
    pub store: &'a str,
    pub name: &'a str,
    pub args: &'a [Value],
}

type ActionInterceptor = Arc<dyn Fn(&ActionCall<'_>) -> Result<Value> + Send + Sync>;

type ActionListener = Arc<dyn Fn(&ActionCall<'_>) + Send + Sync>;
type Subscriber = Arc<dyn Fn(&Mutation) + Send + Sync>;

/// How a state change was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `set` or `update` on a single key.
    Direct,
    /// `patch` over several keys at once.
    Patch,
    /// `reset` back to the initial state.
    Reset,
}

/// A state change reported to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub kind: MutationKind,
    pub keys: Vec<String>,
}

enum Interception {
    Open,
    Installed(ActionInterceptor),
    Disposed,
}

struct StoreInner {
    id: String,
    options: Arc<StoreOptions>,
    state: State,
    getters: RwLock<HashMap<String, Memo<Value>>>,
    interception: RwLock<Interception>,
    listeners: RwLock<Vec<ActionListener>>,
    subscribers: RwLock<Vec<Subscriber>>,
}

/// A live store instance.
///
/// Stores are cheap to clone; every clone refers to the same instance. State
/// is read through [`get`](Store::get) and written through [`set`](Store::set),
/// [`update`](Store::update), [`patch`](Store::patch) and
/// [`reset`](Store::reset). Getters are memoized and only recompute after a
/// state key they read has changed. Actions are invoked by name through
/// [`dispatch`](Store::dispatch).
///
/// The store is disposed when the last handle returned by
/// [`UseStore::instantiate`](crate::UseStore::instantiate), or a clone of it,
/// is dropped. Handles given to action factories do not count.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
    owner: Option<Arc<Owner>>,
}

/// Shared by the caller-facing handles of one store.
struct Owner {
    inner: Weak<StoreInner>,
}

impl Drop for Owner {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            Store { inner, owner: None }.dispose();
        }
    }
}

impl Store {
    pub(crate) fn new(id: &str, options: Arc<StoreOptions>) -> Self {
        let state = State::new((options.state)());

        let getters = options
            .getters
            .iter()
            .map(|(name, getter)| {
                let state = state.clone();
                let getter = Arc::clone(getter);
                (name.clone(), Memo::new(move || getter(&state)))
            })
            .collect();

        debug!(
            store = id,
            getters = options.getters.len(),
            actions = options.actions.len(),
            "instantiated store"
        );

        let inner = Arc::new(StoreInner {
            id: id.to_string(),
            options,
            state,
            getters: RwLock::new(getters),
            interception: RwLock::new(Interception::Open),
            listeners: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
        });
        let owner = Arc::new(Owner {
            inner: Arc::downgrade(&inner),
        });

        Self {
            inner,
            owner: Some(owner),
        }
    }

    /// A handle to the same store that does not keep it from being disposed.
    pub(crate) fn detached(&self) -> Store {
        Store {
            inner: Arc::clone(&self.inner),
            owner: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Read-only reactive view of the state.
    pub fn state(&self) -> &State {
        &self.inner.state
    }

    /// Current value of a state key.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.state.get(name)
    }

    /// Current value of a getter, recomputed if its inputs changed.
    ///
    /// A disposed store has no getters.
    pub fn getter(&self, name: &str) -> Option<Value> {
        let memo = self.inner.getters.read().get(name).cloned();
        memo.map(|memo| memo.get())
    }

    pub fn snapshot(&self) -> StateMap {
        self.inner.state.snapshot()
    }

    /// Replace the value of a state key.
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        self.cell(name)?.set(value);
        trace!(store = %self.inner.id, key = name, "state set");
        self.notify(MutationKind::Direct, vec![name.to_string()]);
        Ok(())
    }

    /// Modify a state key in place.
    pub fn update<R>(&self, name: &str, f: impl FnOnce(&mut Value) -> R) -> Result<R> {
        let result = self.cell(name)?.update(f);
        trace!(store = %self.inner.id, key = name, "state updated");
        self.notify(MutationKind::Direct, vec![name.to_string()]);
        Ok(result)
    }

    /// Write several state keys at once.
    ///
    /// Nothing is written unless every key exists.
    pub fn patch(&self, partial: StateMap) -> Result<()> {
        if let Some(name) = partial.keys().find(|name| !self.inner.state.contains(name)) {
            return Err(self.unknown_state(name));
        }

        let keys = partial.keys().cloned().collect();
        for (name, value) in partial {
            if let Some(cell) = self.inner.state.cell(&name) {
                cell.set(value);
            }
        }
        self.notify(MutationKind::Patch, keys);
        Ok(())
    }

    /// Restore every state key to its initial value.
    pub fn reset(&self) {
        let initial = (self.inner.options.state)();
        let mut keys = Vec::with_capacity(initial.len());
        for (name, value) in initial {
            if let Some(cell) = self.inner.state.cell(&name) {
                cell.set(value);
                keys.push(name);
            }
        }
        debug!(store = %self.inner.id, "state reset");
        self.notify(MutationKind::Reset, keys);
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.inner.options.actions.contains_key(name)
    }

    /// Names of the actions this store was defined with, sorted.
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.options.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invoke an action by name.
    ///
    /// Action listeners see the call first. The call is then handed to the
    /// installed interceptor, or, when none is installed, to the action body
    /// the store was defined with.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> Result<Value> {
        let interceptor = match &*self.inner.interception.read() {
            Interception::Open => None,
            Interception::Installed(interceptor) => Some(Arc::clone(interceptor)),
            Interception::Disposed => {
                return Err(Error::Disposed {
                    store: self.inner.id.clone(),
                })
            }
        };

        trace!(store = %self.inner.id, action = name, args = args.len(), "dispatch");

        let call = ActionCall {
            store: &self.inner.id,
            name,
            args,
        };

        let listeners = self.inner.listeners.read().clone();
        for listener in &listeners {
            listener(&call);
        }

        match interceptor {
            Some(interceptor) => interceptor(&call),
            None => match self.inner.options.actions.get(name) {
                Some(action) => action(args),
                None => Err(Error::UnknownAction {
                    store: self.inner.id.clone(),
                    name: name.to_string(),
                }),
            },
        }
    }

    /// Route every future action invocation through `interceptor`.
    ///
    /// Only one interceptor can ever be installed on a store.
    pub fn intercept_actions<F>(&self, interceptor: F) -> Result<()>
    where
        F: Fn(&ActionCall<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        let mut interception = self.inner.interception.write();
        match &*interception {
            Interception::Open => {
                *interception = Interception::Installed(Arc::new(interceptor));
                Ok(())
            }
            Interception::Installed(_) => Err(Error::InterceptorInstalled {
                store: self.inner.id.clone(),
            }),
            Interception::Disposed => Err(Error::Disposed {
                store: self.inner.id.clone(),
            }),
        }
    }

    pub fn is_intercepted(&self) -> bool {
        matches!(&*self.inner.interception.read(), Interception::Installed(_))
    }

    /// Observe every action invocation before it runs.
    pub fn on_action<F>(&self, listener: F)
    where
        F: Fn(&ActionCall<'_>) + Send + Sync + 'static,
    {
        self.inner.listeners.write().push(Arc::new(listener));
    }

    /// Subscribe to state changes.
    ///
    /// The callback is called after every write with the keys that changed.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&Mutation) + Send + Sync + 'static,
    {
        self.inner.subscribers.write().push(Arc::new(callback));
    }

    /// Detach the interceptor, listeners, subscribers and getters.
    ///
    /// Bound actions usually hold a handle to their own store; disposing
    /// releases that cycle. Dispatching on a disposed store fails, and it can
    /// never be intercepted again. State stays readable.
    pub fn dispose(&self) {
        let interception =
            mem::replace(&mut *self.inner.interception.write(), Interception::Disposed);
        let listeners = mem::take(&mut *self.inner.listeners.write());
        let subscribers = mem::take(&mut *self.inner.subscribers.write());
        let getters = mem::take(&mut *self.inner.getters.write());
        debug!(store = %self.inner.id, "store disposed");

        // Released outside the locks: an action may hold the last owner handle.
        drop((interception, listeners, subscribers, getters));
    }

    fn cell(&self, name: &str) -> Result<&Signal<Value>> {
        self.inner
            .state
            .cell(name)
            .ok_or_else(|| self.unknown_state(name))
    }

    fn unknown_state(&self, name: &str) -> Error {
        Error::UnknownState {
            store: self.inner.id.clone(),
            name: name.to_string(),
        }
    }

    /// Notify all subscribers of a state change.
    fn notify(&self, kind: MutationKind, keys: Vec<String>) {
        let subscribers = self.inner.subscribers.read().clone();
        if subscribers.is_empty() {
            return;
        }
        let mutation = Mutation { kind, keys };
        for subscriber in &subscribers {
            subscriber(&mutation);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.names().collect::<Vec<_>>())
            .field("actions", &self.action_names())
            .field("intercepted", &self.is_intercepted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::define_store;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Store {
        define_store(
            "counter",
            StoreOptions::new(|| {
                StateMap::from([
                    ("count".to_string(), json!(0)),
                    ("name".to_string(), json!("test")),
                ])
            })
            .getter("doubled", |state| json!(state.get_i64("count").unwrap_or(0) * 2))
            .action("inert", |_args| Ok(Value::Null)),
        )
        .instantiate()
    }

    #[test]
    fn store_get_set() {
        let store = counter();
        assert_eq!(store.get("count"), Some(json!(0)));

        store.set("count", json!(42)).unwrap();
        assert_eq!(store.get("count"), Some(json!(42)));
        assert_eq!(store.getter("doubled"), Some(json!(84)));
    }

    #[test]
    fn store_update() {
        let store = counter();
        store
            .update("count", |v| *v = json!(v.as_i64().unwrap_or(0) + 10))
            .unwrap();
        assert_eq!(store.get("count"), Some(json!(10)));
    }

    #[test]
    fn writes_to_unknown_state_fail() {
        let store = counter();
        let err = store.set("missing", json!(1)).unwrap_err();
        assert!(matches!(err, Error::UnknownState { ref name, .. } if name == "missing"));
    }

    #[test]
    fn patch_is_all_or_nothing() {
        let store = counter();
        let err = store
            .patch(StateMap::from([
                ("count".to_string(), json!(5)),
                ("missing".to_string(), json!(1)),
            ]))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownState { .. }));
        assert_eq!(store.get("count"), Some(json!(0)));

        store
            .patch(StateMap::from([
                ("count".to_string(), json!(5)),
                ("name".to_string(), json!("patched")),
            ]))
            .unwrap();
        assert_eq!(store.get("count"), Some(json!(5)));
        assert_eq!(store.get("name"), Some(json!("patched")));
    }

    #[test]
    fn reset_restores_initial_state() {
        let store = counter();
        store.set("count", json!(9)).unwrap();
        store.reset();
        assert_eq!(store.get("count"), Some(json!(0)));
        assert_eq!(store.getter("doubled"), Some(json!(0)));
    }

    #[test]
    fn store_subscribe() {
        let store = counter();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |mutation| sink.lock().push(mutation.clone()));

        store.set("count", json!(1)).unwrap();
        store.reset();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].kind, MutationKind::Direct);
        assert_eq!(seen[0].keys, vec!["count".to_string()]);
        assert_eq!(seen[1].kind, MutationKind::Reset);
    }

    #[test]
    fn dispatch_without_interceptor_runs_defined_action() {
        let store = counter();
        assert_eq!(store.dispatch("inert", &[]).unwrap(), Value::Null);
        let err = store.dispatch("missing", &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownAction { ref name, .. } if name == "missing"));
    }

    #[test]
    fn interceptor_receives_every_call_and_installs_once() {
        let store = counter();
        store
            .intercept_actions(|call| Ok(json!({ "name": call.name, "args": call.args.len() })))
            .unwrap();

        assert_eq!(
            store.dispatch("anything", &[json!(1), json!(2)]).unwrap(),
            json!({ "name": "anything", "args": 2 })
        );

        let err = store.intercept_actions(|_| Ok(Value::Null)).unwrap_err();
        assert!(matches!(err, Error::InterceptorInstalled { .. }));
        assert!(store.is_intercepted());
    }

    #[test]
    fn listeners_observe_calls() {
        let store = counter();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.on_action(move |call| {
            assert_eq!(call.store, "counter");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch("inert", &[]).unwrap();
        store.dispatch("inert", &[]).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn disposed_store_rejects_dispatch() {
        let store = counter();
        store.dispose();
        assert!(matches!(
            store.dispatch("inert", &[]).unwrap_err(),
            Error::Disposed { .. }
        ));
        assert!(matches!(
            store.intercept_actions(|_| Ok(Value::Null)).unwrap_err(),
            Error::Disposed { .. }
        ));
        assert_eq!(store.get("count"), Some(json!(0)));
        assert_eq!(store.getter("doubled"), None);
    }

    #[test]
    fn dropping_the_last_owner_disposes() {
        let store = counter();
        let detached = store.detached();
        let clone = store.clone();

        drop(store);
        assert!(detached.dispatch("inert", &[]).is_ok());

        drop(clone);
        assert!(matches!(
            detached.dispatch("inert", &[]).unwrap_err(),
            Error::Disposed { .. }
        ));
    }

    #[test]
    fn instances_are_independent() {
        let use_counter = define_store(
            "counter",
            StoreOptions::new(|| StateMap::from([("count".to_string(), json!(0))])),
        );
        let a = use_counter.instantiate();
        let b = use_counter.instantiate();
        a.set("count", json!(3)).unwrap();
        assert_eq!(b.get("count"), Some(json!(0)));
    }
}
