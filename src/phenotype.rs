// ==============================================================================
// phenotype.rs - Metabolizer Phenotype Inference
// ==============================================================================
// Description: Aggregates allele dosage per gene and assigns PM/IM/NM
// Author: Matt Barham
// Created: 2026-02-03
// Modified: 2026-02-06
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   dosage: hom-alt → 2, het → 1, otherwise 0
//   loss-of-function dosage goes to `loss`, reduced-function to `reduced`
//   loss >= 2 → PM, loss == 1 → IM,
//   reduced >= 2 → PM, reduced == 1 → IM, else NM
//   Any loss-of-function allele outranks any amount of reduced-function
//   evidence (one LoF allele + two reduced alleles is IM, not PM).
// ==============================================================================

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{ClassifiedVariant, FunctionalEffect, Gene, Phenotype, PhenotypeMap};

/// Allele dosage totals for a single gene
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneDosage {
    pub loss: u32,
    pub reduced: u32,
}

impl GeneDosage {
    pub fn phenotype(&self) -> Phenotype {
        if self.loss >= 2 {
            Phenotype::PM
        } else if self.loss == 1 {
            Phenotype::IM
        } else if self.reduced >= 2 {
            Phenotype::PM
        } else if self.reduced == 1 {
            Phenotype::IM
        } else {
            Phenotype::NM
        }
    }
}

/// Sum per-gene dosage for every tracked gene (zero when no evidence)
pub fn gene_dosages(variants: &[ClassifiedVariant]) -> BTreeMap<Gene, GeneDosage> {
    let mut dosages: BTreeMap<Gene, GeneDosage> =
        Gene::ALL.iter().map(|&gene| (gene, GeneDosage::default())).collect();

    for variant in variants {
        let allele_count = variant.genotype.alt_allele_count();
        let entry = dosages.entry(variant.gene).or_default();

        match variant.effect {
            FunctionalEffect::LossOfFunction => entry.loss += allele_count,
            FunctionalEffect::ReducedFunction => entry.reduced += allele_count,
        }
    }

    dosages
}

/// Infer a phenotype for every tracked gene; missing evidence means NM
pub fn infer_phenotypes(variants: &[ClassifiedVariant]) -> PhenotypeMap {
    gene_dosages(variants)
        .into_iter()
        .map(|(gene, dosage)| {
            let phenotype = dosage.phenotype();
            if phenotype != Phenotype::NM {
                debug!(
                    "{}: loss={} reduced={} → {}",
                    gene, dosage.loss, dosage.reduced, phenotype
                );
            }
            (gene, phenotype)
        })
        .collect()
}
