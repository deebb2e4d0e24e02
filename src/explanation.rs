// ==============================================================================
// explanation.rs - Clinical Explanation Hook
// ==============================================================================
// Description: Interface to the external explanation generator and fallbacks
// Author: Matt Barham
// Created: 2026-02-05
// Modified: 2026-02-09
// Version: 1.0.0
// ==============================================================================
// The core supplies (gene, phenotype, drug, citations) and treats whatever
// comes back as opaque text. A provider failure never changes the risk
// result; it degrades to a placeholder with no citations.
// ==============================================================================

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::{ClassifiedVariant, Gene, Phenotype};

/// Summary used when a drug has no gene to explain
pub const NO_MATCH_SUMMARY: &str = "No gene/variant match to generate explanation.";

/// Variant citation handed to (and echoed by) the explanation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub rsid: String,
    pub allele: String,
    pub genotype: String,
}

impl From<&ClassifiedVariant> for Citation {
    fn from(variant: &ClassifiedVariant) -> Self {
        Self {
            rsid: variant.rsid.clone(),
            allele: variant.allele.clone(),
            genotype: variant.genotype_call.clone(),
        }
    }
}

/// Everything the explanation layer is given for one drug
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationRequest {
    pub gene: Gene,
    pub phenotype: Option<Phenotype>,
    pub drug: String,
    pub citations: Vec<Citation>,
}

impl ExplanationRequest {
    pub fn new(
        gene: Gene,
        phenotype: Option<Phenotype>,
        drug: &str,
        variants: &[ClassifiedVariant],
    ) -> Self {
        Self {
            gene,
            phenotype,
            drug: drug.to_string(),
            citations: variants.iter().map(Citation::from).collect(),
        }
    }
}

/// Explanation text plus citations, as returned by a provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub summary: String,
    pub variant_citations: Vec<Citation>,
}

impl Explanation {
    /// Placeholder used when the provider fails or times out
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self {
            summary: format!("Explanation unavailable: {}", reason),
            variant_citations: Vec::new(),
        }
    }

    pub fn no_match() -> Self {
        Self {
            summary: NO_MATCH_SUMMARY.to_string(),
            variant_citations: Vec::new(),
        }
    }
}

/// Explanation provider errors
#[derive(Error, Debug)]
pub enum ExplanationError {
    #[error("Explanation request failed: {0}")]
    Request(String),

    #[error("Explanation timed out after {0} seconds")]
    Timeout(u64),
}

/// External explanation generator
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(&self, request: &ExplanationRequest) -> Result<Explanation, ExplanationError>;
}

/// Deterministic offline provider built from the request alone
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

#[async_trait]
impl ExplanationProvider for TemplateExplainer {
    async fn explain(&self, request: &ExplanationRequest) -> Result<Explanation, ExplanationError> {
        let phenotype = match request.phenotype {
            Some(Phenotype::PM) => "poor metabolizer",
            Some(Phenotype::IM) => "intermediate metabolizer",
            Some(Phenotype::NM) => "normal metabolizer",
            None => "unclassified metabolizer",
        };

        let evidence = if request.citations.is_empty() {
            "No actionable variants were detected, so reference (*1) function is assumed."
                .to_string()
        } else {
            let cited: Vec<String> = request
                .citations
                .iter()
                .map(|c| format!("{} ({}) genotype={}", c.rsid, c.allele, c.genotype))
                .collect();
            format!("Supporting variants: {}.", cited.join("; "))
        };

        Ok(Explanation {
            summary: format!(
                "Patient is predicted to be a {} {} {} for {}. {} Refer to the CPIC guideline for {}-{} dosing.",
                request.gene,
                request.phenotype.map(|p| p.as_str()).unwrap_or("?"),
                phenotype,
                request.drug,
                evidence,
                request.gene,
                request.drug
            ),
            variant_citations: request.citations.clone(),
        })
    }
}
