use crate::runtime::{Node, ReactiveRuntime};
use parking_lot::RwLock;
use std::sync::Arc;

/// A reactive signal that holds a value and notifies dependents when changed.
#[derive(Clone)]
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    node: Arc<Node>,
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            node: Arc::new(Node::new(ReactiveRuntime::current())),
        }
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.node.runtime().track_read(self.node.id());
        self.value.read().clone()
    }

    /// Set a new value for the signal.
    pub fn set(&self, new_value: T) {
        *self.value.write() = new_value;
        self.node.runtime().notify_observers(self.node.id());
    }

    /// Update the value using a function.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.value.write();
            f(&mut *value)
        };
        self.node.runtime().notify_observers(self.node.id());
        result
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.node.runtime().track_read(self.node.id());
        let value = self.value.read();
        f(&*value)
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.node.id()
    }
}
