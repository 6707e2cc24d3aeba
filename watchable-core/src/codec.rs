//! Encoding helpers.
//!
//! A cell encodes as exactly its value. These helpers exist so callers do
//! not have to pick serde entry points themselves.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::reactive::Watchable;

/// Encode a cell's value as JSON.
pub fn to_json<T: Serialize>(cell: &Watchable<T>) -> Result<String> {
    Ok(serde_json::to_string(cell)?)
}

/// Decode a JSON value into a new, equality-gated cell.
pub fn from_json<T>(input: &str) -> Result<Watchable<T>>
where
    T: DeserializeOwned + PartialEq,
{
    Ok(serde_json::from_str(input)?)
}

/// Encode a cell's value as MessagePack.
pub fn to_msgpack<T: Serialize>(cell: &Watchable<T>) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(cell)?)
}

/// Decode a MessagePack value into a new, equality-gated cell.
pub fn from_msgpack<T>(input: &[u8]) -> Result<Watchable<T>>
where
    T: DeserializeOwned + PartialEq,
{
    Ok(rmp_serde::from_slice(input)?)
}
