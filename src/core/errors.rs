//! Core error types.

use thiserror::Error;

use crate::core::ids::{ClientId, OutputId, SurfaceId};

/// Internal engine errors.
///
/// These report inconsistencies between the engine and its collaborators
/// (for example the backend naming an output the engine never saw). Client
/// protocol mistakes are not errors of this type; they are answered with an
/// `Event::Error` to the offending client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown client {0}")]
    UnknownClient(ClientId),

    #[error("unknown output {0}")]
    UnknownOutput(OutputId),

    #[error("surface {1} of client {0} is in an inconsistent tree")]
    InconsistentTree(ClientId, SurfaceId),

    #[error("state error: {0}")]
    StateError(String),
}

impl CoreError {
    pub fn state_error(msg: impl Into<String>) -> Self {
        Self::StateError(msg.into())
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
