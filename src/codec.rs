//! Payload codec
//!
//! Sample payloads are persisted as MessagePack. The format is opaque to the
//! rest of the crate: callers only rely on `decode(encode(x)) == x`.

use crate::error::{DofError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Encode a payload to bytes
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(value)
        .map_err(|e| DofError::Codec(format!("Serialization error: {}", e)))
}

/// Decode a payload from bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| DofError::Codec(format!("Deserialization error: {}", e)))
}

/// Encode a payload and write it to `path`, replacing any existing file
pub fn write_payload<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let bytes = encode(value)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read and decode the payload stored at `path`
pub fn read_payload<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DofError::NotFound(path.to_path_buf())
        } else {
            DofError::Io(e)
        }
    })?;
    decode(&bytes)
}
