// ==============================================================================
// validator.rs - Input File Validation
// ==============================================================================
// Description: Validates uploaded variant files (size, compression, encoding)
// Author: Matt Barham
// Created: 2026-02-05
// Modified: 2026-02-08
// Version: 1.0.0
// Security: Size cap applies before and after decompression
// ==============================================================================

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::parsers::{decode_text, VcfParseError};

/// Default upload cap (100 MB)
pub const DEFAULT_MAX_INPUT_BYTES: usize = 100 * 1024 * 1024;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Client-input errors; the only hard failures of an analysis
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Failed to decompress gzip input: {0}")]
    Decompress(std::io::Error),

    #[error(transparent)]
    Decode(#[from] VcfParseError),

    #[error("Failed to read input file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Decoded upload ready for the interpretation pipeline
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    pub text: String,
    pub size: usize,
    pub compressed: bool,
    pub hash_sha256: String,
    pub validated_at: DateTime<Utc>,
}

pub struct InputValidator {
    max_input_bytes: usize,
}

impl InputValidator {
    pub fn new() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }

    /// Set maximum accepted input size in bytes
    pub fn with_max_input_bytes(mut self, max: usize) -> Self {
        self.max_input_bytes = max;
        self
    }

    /// Read and validate a variant file from disk
    pub fn validate_path(&self, path: &Path) -> Result<ValidatedInput, InputError> {
        info!("Validating file: {}", path.display());

        let bytes = std::fs::read(path).map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })?;

        self.validate_bytes(&bytes)
    }

    /// Validate raw upload bytes
    ///
    /// # Returns
    /// * `Ok(ValidatedInput)` - Decoded text plus fingerprint
    /// * `Err(InputError)` - Oversized, corrupt gzip, or not text
    pub fn validate_bytes(&self, bytes: &[u8]) -> Result<ValidatedInput, InputError> {
        // 1. Size check
        self.check_size(bytes.len())?;
        debug!("Size check passed: {} bytes", bytes.len());

        // 2. Fingerprint the upload as received
        let hash_sha256 = compute_sha256(bytes);
        debug!("SHA-256: {}", hash_sha256);

        // 3. Decompress if gzip
        let compressed = is_gzip(bytes);
        let text = if compressed {
            let decompressed = self.decompress(bytes)?;
            debug!("Decompressed gzip input to {} bytes", decompressed.len());
            decode_text(&decompressed)?.to_string()
        } else {
            decode_text(bytes)?.to_string()
        };

        Ok(ValidatedInput {
            text,
            size: bytes.len(),
            compressed,
            hash_sha256,
            validated_at: Utc::now(),
        })
    }

    fn check_size(&self, size: usize) -> Result<(), InputError> {
        if size > self.max_input_bytes {
            return Err(InputError::TooLarge {
                size,
                max: self.max_input_bytes,
            });
        }
        Ok(())
    }

    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, InputError> {
        let limit = self.max_input_bytes as u64 + 1;
        let mut decoder = GzDecoder::new(bytes).take(limit);
        let mut buffer = Vec::new();

        decoder
            .read_to_end(&mut buffer)
            .map_err(InputError::Decompress)?;

        self.check_size(buffer.len())?;
        Ok(buffer)
    }
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

fn compute_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
