// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Default Product Codec
//!
//! Products with [`SaveMode::Default`] are serialized with `bincode`, an
//! opaque binary format the engine owns end to end — no custom reader
//! or writer is ever consulted for them. `Custom`-mode products bypass
//! this module entirely; the executor calls the author-supplied closures
//! directly.

use std::fs;
use std::path::Path;

use warp_domain::value_objects::ProductValue;
use warp_domain::WarpError;

/// Writes `value` to `path` with the engine's default binary codec,
/// creating parent directories as needed.
pub fn write_default(path: &Path, value: &ProductValue) -> Result<(), WarpError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(value).map_err(|e| WarpError::Serialization(e.to_string()))?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Reads a product previously written by [`write_default`].
pub fn read_default(path: &Path) -> Result<ProductValue, WarpError> {
    let bytes = fs::read(path)?;
    bincode::deserialize(&bytes).map_err(|e| WarpError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_bytes_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.bin");
        let value = ProductValue::Bytes(vec![1, 2, 3, 4]);

        write_default(&path, &value).unwrap();
        let read_back = read_default(&path).unwrap();

        assert_eq!(read_back, value);
    }

    #[test]
    fn round_trips_text_and_json_values() {
        let dir = tempdir().unwrap();

        let text_path = dir.path().join("t.bin");
        let text = ProductValue::Text("hello".to_string());
        write_default(&text_path, &text).unwrap();
        assert_eq!(read_default(&text_path).unwrap(), text);

        let json_path = dir.path().join("j.bin");
        let json = ProductValue::Json(serde_json::json!({"a": 1, "b": [1, 2, 3]}));
        write_default(&json_path, &json).unwrap();
        assert_eq!(read_default(&json_path).unwrap(), json);
    }

    #[test]
    fn reading_missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        assert!(matches!(read_default(&path), Err(WarpError::Io(_))));
    }
}
