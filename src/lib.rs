//! # Tincan Setup
//!
//! Setup-style reactive stores for Rust.
//!
//! A store is declared as a bag of named state cells, derived values and
//! actions, while the store engine underneath works from a static shape and
//! routes every action call through a single interceptable entry point.
//!
//! ## Signals (Low-level primitives)
//!
//! Fine-grained reactive primitives the engine is built on:
//! - `Signal<T>` - Reactive values that notify dependents when changed
//! - `Memo<T>` - Computed values that automatically track dependencies
//! - `Effect` - Side effects that run when dependencies change; the way
//!   callers react to a store's state and getters
//!
//! ## Store (Engine)
//!
//! - `define_store` / `UseStore` - define a store from its static shape
//! - `Store` - live instance with state, memoized getters and named actions
//! - Action listeners, a one-shot action interceptor and state subscriptions
//!
//! ## Setup (Declaration)
//!
//! - `SetupStore` / `define_setup_store` - declare by name, then `get_store`
//! - Actions are late-bound against the live store they belong to

pub mod error;
pub mod runtime;
pub mod setup;
pub mod signal;
pub mod store;

// Re-export main types for convenience
pub use error::{DeclarationKind, Error, Result};
pub use setup::{assemble, bind, define_setup_store, BoundStore, Registry, SetupConfig, SetupStore};
pub use signal::{create_effect, create_memo, Effect, Memo, Signal};
pub use store::{arg, define_store, ActionCall, State, StateMap, Store, StoreOptions};
