// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::model::{CommandMapping, CONFIG_FILE_NAME};
use crate::errors::Result;

/// Load a configuration file from a given path and return the decoded JSON.
///
/// This only performs JSON deserialization; it does **not** check that the
/// document is a usable mapping. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let value: Value = serde_json::from_str(&contents)?;

    Ok(value)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads JSON.
/// - Checks for:
///   - a top-level object,
///   - at least one entry,
///   - string values that tokenize into a non-empty command line.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<CommandMapping> {
    let raw = load_from_path(&path)?;
    let mapping = CommandMapping::try_from(raw)?;
    Ok(mapping)
}

/// Default config path: `callbackd.json` in the directory holding the
/// running executable (symlinks resolved).
pub fn default_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe = fs::canonicalize(&exe).unwrap_or(exe);
    let dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_sits_next_to_the_executable() {
        let path = default_config_path().unwrap();
        assert!(path.ends_with(CONFIG_FILE_NAME));
        assert!(path.parent().unwrap().is_dir());
    }
}
