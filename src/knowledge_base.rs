// ==============================================================================
// knowledge_base.rs - Curated Pharmacogenomic Variant Catalogue
// ==============================================================================
// Description: Static rsID → gene/star-allele/effect lookup for tracked genes
// Author: Matt Barham
// Created: 2026-02-03
// Modified: 2026-02-03
// Version: 1.0.0
// ==============================================================================
// Sources: CPIC and PharmVar allele definitions (simplified subset)
// ==============================================================================

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::{FunctionalEffect, Gene};

/// Catalogue entry for a known actionable variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownVariant {
    pub gene: Gene,
    pub allele: &'static str,
    pub effect: FunctionalEffect,
}

const CATALOGUE: [(&str, KnownVariant); 6] = [
    (
        "rs4244285",
        KnownVariant {
            gene: Gene::Cyp2c19,
            allele: "*2",
            effect: FunctionalEffect::LossOfFunction,
        },
    ),
    (
        "rs4986893",
        KnownVariant {
            gene: Gene::Cyp2c19,
            allele: "*3",
            effect: FunctionalEffect::LossOfFunction,
        },
    ),
    (
        "rs3892097",
        KnownVariant {
            gene: Gene::Cyp2d6,
            allele: "*4",
            effect: FunctionalEffect::LossOfFunction,
        },
    ),
    (
        "rs4149056",
        KnownVariant {
            gene: Gene::Slco1b1,
            allele: "*5",
            effect: FunctionalEffect::ReducedFunction,
        },
    ),
    (
        "rs1142345",
        KnownVariant {
            gene: Gene::Tpmt,
            allele: "*3A",
            effect: FunctionalEffect::LossOfFunction,
        },
    ),
    (
        "rs3918290",
        KnownVariant {
            gene: Gene::Dpyd,
            allele: "*2A",
            effect: FunctionalEffect::LossOfFunction,
        },
    ),
];

static VARIANT_DATABASE: LazyLock<HashMap<&'static str, KnownVariant>> =
    LazyLock::new(|| CATALOGUE.into_iter().collect());

/// Look up a reference SNP identifier; a miss is the common case
pub fn lookup(rsid: &str) -> Option<&'static KnownVariant> {
    VARIANT_DATABASE.get(rsid)
}
