//! Setup-style store declaration.
//!
//! A setup store is declared by name: state cells with their initial values,
//! getters over that state, and action factories. Action implementations need
//! the live store, which cannot be built before every action is known, so a
//! store is produced in two phases:
//!
//! 1. [`assemble`] builds the store from the [`Registry`] with inert
//!    placeholder actions of the right names.
//! 2. [`bind`] runs each action factory against that store and installs the
//!    single interceptor that forwards every dispatch to the real action.
//!
//! [`SetupStore::get_store`] runs both phases before handing the store out.

mod assembler;
mod dispatcher;
mod registry;
mod setup_store;

pub use assembler::assemble;
pub use dispatcher::{bind, BoundStore};
pub use registry::{ActionFactory, Registry};
pub use setup_store::{define_setup_store, SetupConfig, SetupStore};
