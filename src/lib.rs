// ==============================================================================
// lib.rs - Pharmacogenomics Processor Library
// ==============================================================================
// Description: Library interface for pharmacogenomic interpretation modules
// Author: Matt Barham
// Created: 2026-02-02
// Modified: 2026-02-09
// Version: 1.0.0
// ==============================================================================

pub mod parsers;
pub mod models;
pub mod knowledge_base;
pub mod classifier;
pub mod phenotype;
pub mod guidelines;
pub mod scoring;
pub mod explanation;
pub mod validator;
pub mod processor;
pub mod output;
