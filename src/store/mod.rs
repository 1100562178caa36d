//! The store engine.
//!
//! Stores are defined from a static shape (a state producer, a map of getters
//! and a map of actions) and instantiated into live [`Store`] handles. Every
//! action call goes through [`Store::dispatch`], where it can be observed and
//! intercepted.

mod define;
mod state;
mod store;

pub use define::{arg, define_store, Action, Getter, StateFactory, StoreOptions, UseStore};
pub use state::{State, StateMap};
pub use store::{ActionCall, Mutation, MutationKind, Store};
