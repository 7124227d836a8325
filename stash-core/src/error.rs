//! Error types shared across the crate.
//!
//! Public store and dispatcher operations never surface these as panics.
//! The dispatcher folds them into a [`Failure`](crate::api::Failure)
//! envelope; stores degrade to an absent value and log.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type StashResult<T> = Result<T, StashError>;

/// Everything that can go wrong inside the store and dispatch layers.
#[derive(Debug, Error)]
pub enum StashError {
    /// Neither a server request scope nor a client context could be resolved.
    #[error("no request context is available")]
    MissingContext,

    /// The wrapped transport call failed before producing a response.
    #[error("{0}")]
    Transport(String),

    /// A key was already registered with a value of a different type.
    #[error("state key `{key}` holds `{found}`, not `{expected}`")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// `update` was called on a store that holds no value.
    #[error("cannot update store `{key}`: no value is loaded")]
    StoreUpdateWithoutData { key: String },

    /// A write was attempted through a cell that has no setter.
    #[error("`{0}` is read-only")]
    ReadOnly(String),

    /// Encoding a cell into a hydration payload failed.
    #[error("failed to encode state `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: rmp_serde::encode::Error,
    },

    /// Decoding a cell out of a hydration payload failed.
    #[error("failed to decode state `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: rmp_serde::decode::Error,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StashError {
    /// Build a transport fault from any displayable error.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}
