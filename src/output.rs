// ==============================================================================
// output.rs - Report Output
// ==============================================================================
// Description: Serialize analysis results as JSON to a file or stdout
// Author: Matt Barham
// Created: 2026-02-06
// Modified: 2026-02-06
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where a serialized report goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if path.as_os_str() != "-" => OutputTarget::File(path),
            _ => OutputTarget::Stdout,
        }
    }
}

/// Serialize a value as pretty-printed JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize report")
}

/// Write a serializable value to the chosen target
pub fn write_json<T: Serialize>(value: &T, target: &OutputTarget) -> Result<()> {
    let json = to_json(value)?;

    match target {
        OutputTarget::Stdout => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", json).context("Failed to write report to stdout")?;
        }
        OutputTarget::File(path) => {
            write_file(path, &json)?;
            info!("Report written to {:?}", path);
        }
    }

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    std::fs::write(path, contents).with_context(|| format!("Failed to write report to {:?}", path))
}
