// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for genetic variant file formats
// Author: Matt Barham
// Created: 2026-02-02
// Modified: 2026-02-02
// Version: 1.0.0
// ==============================================================================

pub mod vcf;

pub use vcf::{decode_text, VcfParseError, VcfParser, RSID_PREFIX};
