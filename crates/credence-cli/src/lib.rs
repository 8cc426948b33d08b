//! # credence CLI Library
//!
//! Subcommand handlers for the `credence` binary. Each `run_*` function
//! returns the process exit code on success: `0` for success or a valid
//! document, `1` for a document that fails verification.

pub mod documents;
pub mod keys;

use std::path::Path;

use anyhow::{Context, Result};

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON: {}", path.display()))
}
