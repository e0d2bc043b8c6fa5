// src/config/mod.rs

//! Configuration loading and validation for callbackd.
//!
//! Responsibilities:
//! - Define the JSON-backed event → command mapping (`model.rs`).
//! - Load the config file from disk (`loader.rs`).
//! - Validate its shape (`validate.rs`). Templates are checked when their
//!   event fires.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{CommandMapping, CONFIG_FILE_NAME};
