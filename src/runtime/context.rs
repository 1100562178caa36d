use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

type Observer = Arc<dyn Fn() + Send + Sync>;

/// Dependency graph between reactive sources and their observers.
#[derive(Default)]
struct ReactiveGraph {
    // Observer being computed on each thread
    current_observer: HashMap<ThreadId, usize>,
    // Map from source ID (signal or memo) to the observers that read it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to the sources it read
    observer_deps: HashMap<usize, HashSet<usize>>,
    // Map from effect ID to the function re-run on change
    observers: HashMap<usize, Observer>,
    // Map from memo ID to dirty state
    memo_dirty: HashMap<usize, bool>,
}

/// Hybrid reactive runtime for managing reactive primitives.
///
/// Supports both a global runtime (default) and scoped runtimes for isolation.
/// The runtime tracks dependencies between signals, effects, and memos, so a
/// store's getters are marked dirty when the state they read is written.
///
/// # Examples
///
/// ```
/// use tincan_setup::runtime::ReactiveRuntime;
/// use tincan_setup::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// // Runtime and all its state is dropped here
/// ```
pub struct ReactiveRuntime {
    next_id: AtomicUsize,
    graph: Mutex<ReactiveGraph>,
}

// Thread-local stack for scoped runtimes
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = const { RefCell::new(Vec::new()) };
}

impl ReactiveRuntime {
    /// Create a new isolated runtime with its own dependency graph.
    pub fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            next_id: AtomicUsize::new(0),
            graph: Mutex::new(ReactiveGraph::default()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Primitives created inside keep the runtime alive for as long as they
    /// exist, so a store built in a scope stays reactive after it returns.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Get or create the global runtime (fallback).
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// Get the current reactive runtime (scoped or global fallback).
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run a function with a specific runtime as the current context.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| stack.borrow_mut().push(runtime));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Generate the next unique ID for a reactive primitive.
    pub(crate) fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Track a read of a source by the current observer.
    pub(crate) fn track_read(&self, source_id: usize) {
        let mut graph = self.graph.lock();
        if let Some(&observer) = graph.current_observer.get(&thread::current().id()) {
            graph.dependencies.entry(source_id).or_default().insert(observer);
            graph.observer_deps.entry(observer).or_default().insert(source_id);
        }
    }

    /// Notify all observers that depend on a source.
    pub(crate) fn notify_observers(&self, source_id: usize) {
        let observers = {
            let graph = self.graph.lock();
            graph
                .dependencies
                .get(&source_id)
                .map(|obs| obs.iter().copied().collect::<Vec<_>>())
        };

        for observer_id in observers.into_iter().flatten() {
            self.mark_observer_dirty(observer_id);
        }
    }

    /// Mark an observer (memo or effect) as dirty and propagate to dependents.
    fn mark_observer_dirty(&self, observer_id: usize) {
        let mut graph = self.graph.lock();

        if let Some(dirty) = graph.memo_dirty.get_mut(&observer_id) {
            if *dirty {
                return;
            }
            *dirty = true;

            let dependents = graph
                .dependencies
                .get(&observer_id)
                .map(|deps| deps.iter().copied().collect::<Vec<_>>());
            drop(graph);

            for dependent_id in dependents.into_iter().flatten() {
                self.mark_observer_dirty(dependent_id);
            }
            return;
        }

        let effect = graph.observers.get(&observer_id).cloned();
        drop(graph);

        if let Some(effect) = effect {
            effect();
        }
    }

    /// Register the function re-run when an effect's dependencies change.
    pub(crate) fn create_observer<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut graph = self.graph.lock();
        Self::clear_dependencies(&mut graph, observer_id);
        graph.observers.insert(observer_id, Arc::new(f));
    }

    /// Forget a primitive, both as an observer and as a source.
    pub(crate) fn remove_node(&self, id: usize) {
        let mut graph = self.graph.lock();
        let effect = graph.observers.remove(&id);
        graph.memo_dirty.remove(&id);
        Self::clear_dependencies(&mut graph, id);

        if let Some(observers) = graph.dependencies.remove(&id) {
            for observer_id in observers {
                if let Some(sources) = graph.observer_deps.get_mut(&observer_id) {
                    sources.remove(&id);
                    if sources.is_empty() {
                        graph.observer_deps.remove(&observer_id);
                    }
                }
            }
        }
        drop(graph);

        // Dropping an effect can release further primitives of this runtime.
        drop(effect);
    }

    fn clear_dependencies(graph: &mut ReactiveGraph, observer_id: usize) {
        if let Some(old_deps) = graph.observer_deps.remove(&observer_id) {
            for source_id in old_deps {
                if let Some(deps) = graph.dependencies.get_mut(&source_id) {
                    deps.remove(&observer_id);
                    if deps.is_empty() {
                        graph.dependencies.remove(&source_id);
                    }
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn graph_size(&self) -> usize {
        let graph = self.graph.lock();
        graph.dependencies.len()
            + graph.observer_deps.len()
            + graph.observers.len()
            + graph.memo_dirty.len()
    }

    /// Run a function with a specific observer as the current context.
    pub(crate) fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let thread = thread::current().id();
        let prev = self.graph.lock().current_observer.insert(thread, observer_id);

        let result = f();

        let mut graph = self.graph.lock();
        match prev {
            Some(prev) => graph.current_observer.insert(thread, prev),
            None => graph.current_observer.remove(&thread),
        };
        result
    }

    /// Register a memo and mark it as dirty initially.
    pub(crate) fn register_memo(&self, memo_id: usize) {
        self.graph.lock().memo_dirty.insert(memo_id, true);
    }

    /// Check if a memo is dirty (needs recomputation).
    pub(crate) fn is_memo_dirty(&self, memo_id: usize) -> bool {
        self.graph.lock().memo_dirty.get(&memo_id).copied().unwrap_or(true)
    }

    /// Mark a memo as clean.
    ///
    /// Called before the memo recomputes, so a write that lands during the
    /// computation leaves it dirty.
    pub(crate) fn mark_memo_clean(&self, memo_id: usize) {
        self.graph.lock().memo_dirty.insert(memo_id, false);
    }
}

/// Registration of one reactive primitive in its runtime.
///
/// Dropping the node removes the primitive from the dependency graph.
pub(crate) struct Node {
    id: usize,
    runtime: Arc<ReactiveRuntime>,
}

impl Node {
    pub(crate) fn new(runtime: Arc<ReactiveRuntime>) -> Self {
        let id = runtime.next_id();
        Self { id, runtime }
    }

    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn runtime(&self) -> &ReactiveRuntime {
        &self.runtime
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.runtime.remove_node(self.id);
    }
}
