//! Error types for store declaration, assembly and dispatch.

use std::fmt;

use thiserror::Error;

/// The kind of a named declaration in a setup store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    State,
    Getter,
    Action,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            DeclarationKind::State => "state",
            DeclarationKind::Getter => "getter",
            DeclarationKind::Action => "action",
        };
        f.write_str(kind)
    }
}

/// Errors raised while declaring, building or using a store.
#[derive(Debug, Error)]
pub enum Error {
    #[error("store '{store}': '{name}' is already declared as {existing}")]
    NameCollision {
        store: String,
        name: String,
        existing: DeclarationKind,
    },

    #[error("store '{store}': action '{name}' has no bound implementation")]
    UnboundAction { store: String, name: String },

    #[error("store '{store}': actions are already bound")]
    AlreadyBound { store: String },

    #[error("store '{store}': an action interceptor is already installed")]
    InterceptorInstalled { store: String },

    #[error("store '{store}': no action named '{name}'")]
    UnknownAction { store: String, name: String },

    #[error("store '{store}': no state named '{name}'")]
    UnknownState { store: String, name: String },

    #[error("store '{store}': declarations are closed once the store has been requested")]
    Sealed { store: String },

    #[error("store '{store}' has been disposed")]
    Disposed { store: String },

    #[error("missing action argument at position {index}")]
    MissingArgument { index: usize },

    #[error("action failed: {0}")]
    Action(String),
}

impl Error {
    /// Build an [`Error::Action`] from any displayable message.
    pub fn action(message: impl fmt::Display) -> Self {
        Error::Action(message.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
