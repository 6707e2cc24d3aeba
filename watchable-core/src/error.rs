//! Error types.

use thiserror::Error;

/// Errors from encoding or decoding a cell.
///
/// Every variant is the underlying codec's own error, unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// JSON encoding or decoding failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// MessagePack encoding failed.
    #[error(transparent)]
    MsgpackEncode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding failed.
    #[error(transparent)]
    MsgpackDecode(#[from] rmp_serde::decode::Error),
}

/// Result alias for fallible cell operations.
pub type Result<T> = std::result::Result<T, Error>;
