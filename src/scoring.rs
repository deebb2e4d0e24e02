// ==============================================================================
// scoring.rs - Confidence Scoring
// ==============================================================================
// Description: Bounded confidence score from call quality and phenotype impact
// Author: Matt Barham
// Created: 2026-02-04
// Modified: 2026-02-04
// Version: 1.0.0
// ==============================================================================

use crate::models::{
    ClassifiedVariant, FunctionalEffect, Genotype, Phenotype, PhenotypeMap, FILTER_PASS,
};

/// Confidence when parsing succeeded but nothing actionable was found
pub const NO_VARIANT_CONFIDENCE: f64 = 0.9;

/// Scores are never presented as full certainty
pub const MAX_CONFIDENCE: f64 = 0.99;

const BASE_SCORE: f64 = 0.6;
const HIGH_GQ_THRESHOLD: u32 = 90;
const HIGH_DEPTH_THRESHOLD: u32 = 30;
const QUALITY_INCREMENT: f64 = 0.1;
const LOF_HOM_ALT_INCREMENT: f64 = 0.1;
const LOF_HET_INCREMENT: f64 = 0.05;
const POOR_METABOLIZER_INCREMENT: f64 = 0.05;

/// Compute the confidence score for one analysis
pub fn calculate_confidence(variants: &[ClassifiedVariant], phenotypes: &PhenotypeMap) -> f64 {
    if variants.is_empty() {
        return NO_VARIANT_CONFIDENCE;
    }

    let mut score = BASE_SCORE;

    for variant in variants {
        if variant.genotype_quality >= HIGH_GQ_THRESHOLD {
            score += QUALITY_INCREMENT;
        }
        if variant.depth >= HIGH_DEPTH_THRESHOLD {
            score += QUALITY_INCREMENT;
        }
        if variant.filter == FILTER_PASS {
            score += QUALITY_INCREMENT;
        }

        if variant.effect == FunctionalEffect::LossOfFunction {
            score += match variant.genotype {
                Genotype::HomAlt => LOF_HOM_ALT_INCREMENT,
                Genotype::Het => LOF_HET_INCREMENT,
                Genotype::HomRef | Genotype::Unknown => 0.0,
            };
        }
    }

    let poor_metabolizers = phenotypes.values().filter(|&&p| p == Phenotype::PM).count();
    score += POOR_METABOLIZER_INCREMENT * poor_metabolizers as f64;

    round_to_hundredths(score.min(MAX_CONFIDENCE))
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
