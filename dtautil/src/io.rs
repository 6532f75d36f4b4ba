use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Reads and deserializes a JSON file, with the path attached to any error.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let contents =
        fs_err::read_to_string(path).with_context(|| format!("couldn't read {}", path))?;
    let obj = serde_json::from_str(&contents).with_context(|| format!("couldn't parse {}", path))?;
    Ok(obj)
}
