use crate::runtime::{Node, ReactiveRuntime};
use parking_lot::Mutex;
use std::sync::Arc;

/// A memoized computed value that automatically tracks dependencies.
///
/// Memos only recompute when a signal or memo they read has changed since the
/// last computation. Recomputation is serialized per memo, so a computation
/// must not read the memo it belongs to, directly or through an effect it
/// triggers.
pub struct Memo<T> {
    inner: Arc<MemoInner<T>>,
}

struct MemoInner<T> {
    compute: Box<dyn Fn() -> T + Send + Sync>,
    cached: Mutex<Option<T>>,
    node: Node,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let node = Node::new(ReactiveRuntime::current());
        node.runtime().register_memo(node.id());

        Self {
            inner: Arc::new(MemoInner {
                compute: Box::new(compute),
                cached: Mutex::new(None),
                node,
            }),
        }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        let MemoInner {
            compute,
            cached,
            node,
        } = &*self.inner;
        let runtime = node.runtime();
        runtime.track_read(node.id());

        let mut cached = cached.lock();
        if !runtime.is_memo_dirty(node.id()) {
            if let Some(value) = cached.as_ref() {
                return value.clone();
            }
        }

        // Clean first: a write during the computation marks it dirty again
        runtime.mark_memo_clean(node.id());
        let value = runtime.with_observer(node.id(), || compute());
        *cached = Some(value.clone());
        value
    }
}

/// Create a new memoized computation.
///
/// # Example
///
/// ```
/// use tincan_setup::{create_memo, Signal};
///
/// let count = Signal::new(5);
/// let doubled = create_memo({
///     let count = count.clone();
///     move || count.get() * 2
/// });
/// assert_eq!(doubled.get(), 10);
/// ```
pub fn create_memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Memo::new(compute)
}
