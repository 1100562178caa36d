use crate::runtime::{Node, ReactiveRuntime};
use std::sync::Arc;

/// A side effect that runs when its dependencies change.
///
/// Effects automatically track signal and memo reads and re-run when those
/// sources change. The effect runs immediately on creation to establish its
/// dependencies, and stops reacting once dropped.
///
/// Stores never create effects themselves. An effect is how callers react to
/// a store: reading [`Store::get`](crate::Store::get) or
/// [`Store::getter`](crate::Store::getter) inside one re-runs it whenever an
/// action writes the state behind that value.
///
/// # Examples
///
/// ```
/// use tincan_setup::{Effect, Signal};
/// use std::sync::{Arc, atomic::{AtomicI32, Ordering}};
///
/// let signal = Signal::new(5);
/// let last_value = Arc::new(AtomicI32::new(0));
///
/// let _effect = Effect::new({
///     let signal = signal.clone();
///     let last_value = last_value.clone();
///     move || last_value.store(signal.get(), Ordering::SeqCst)
/// });
/// assert_eq!(last_value.load(Ordering::SeqCst), 5);
///
/// signal.set(10);
/// assert_eq!(last_value.load(Ordering::SeqCst), 10);
/// ```
pub struct Effect {
    _node: Node,
}

impl Effect {
    /// Create a new effect that runs when dependencies change.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let node = Node::new(ReactiveRuntime::current());
        let runtime = node.runtime();
        let effect = Arc::new(effect);
        let effect_clone = Arc::clone(&effect);

        // Register the effect with the runtime
        runtime.create_observer(node.id(), move || effect_clone());

        // Run immediately within the observer context to track dependencies
        runtime.with_observer(node.id(), || effect());

        Self { _node: node }
    }
}

/// Create a new effect that runs when dependencies change.
///
/// The returned [`Effect`] must be kept alive for the effect to keep running.
pub fn create_effect<F>(effect: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(effect)
}
