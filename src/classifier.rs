// ==============================================================================
// classifier.rs - Pharmacogene Classification
// ==============================================================================
// Description: Filters parsed variant records down to actionable PGx calls
// Author: Matt Barham
// Created: 2026-02-03
// Modified: 2026-02-05
// Version: 1.0.0
// ==============================================================================
// Accounting:
//   total_scanned  = every parsed record
//   recognized     = PASS + catalogued + tracked gene + het/hom-alt
//   non_pgx_count  = PASS records that are not recognized
//   Non-PASS records count toward total_scanned only.
// ==============================================================================

use tracing::{debug, info};

use crate::knowledge_base::{self, KnownVariant};
use crate::models::{ClassificationSummary, ClassifiedVariant, VariantRecord};

/// Classify parsed records against the curated knowledge base
pub fn classify_variants(records: &[VariantRecord]) -> ClassificationSummary {
    let mut recognized = Vec::new();
    let mut non_pgx_count = 0;
    let mut filtered_count = 0;

    for record in records {
        if !record.is_pass() {
            filtered_count += 1;
            continue;
        }

        match actionable_match(record) {
            Some(known) => {
                debug!("Recognized {} as {} {}", record.rsid, known.gene, known.allele);
                recognized.push(to_classified(record, known));
            }
            None => non_pgx_count += 1,
        }
    }

    info!(
        "Classified {} records: {} recognized, {} non-PGx, {} failed filter",
        records.len(),
        recognized.len(),
        non_pgx_count,
        filtered_count
    );

    ClassificationSummary {
        recognized,
        total_scanned: records.len(),
        non_pgx_count,
    }
}

/// Map catalogued carrier calls to their effects without the filter gate
///
/// Diagnostic view of what the knowledge base would match in a file,
/// used when inspecting low-quality uploads.
pub fn map_rsids_to_effects(records: &[VariantRecord]) -> Vec<ClassifiedVariant> {
    records
        .iter()
        .filter_map(|record| actionable_match(record).map(|known| to_classified(record, known)))
        .collect()
}

fn actionable_match(record: &VariantRecord) -> Option<&'static KnownVariant> {
    // Catalogue genes are `Gene` values, so every hit is a tracked gene
    knowledge_base::lookup(&record.rsid).filter(|_| record.genotype.carries_alt())
}

fn to_classified(record: &VariantRecord, known: &KnownVariant) -> ClassifiedVariant {
    ClassifiedVariant {
        rsid: record.rsid.clone(),
        gene: known.gene,
        allele: known.allele.to_string(),
        effect: known.effect,
        genotype: record.genotype,
        genotype_call: record.genotype_call.clone(),
        quality: record.quality,
        filter: record.filter.clone(),
        depth: record.depth,
        genotype_quality: record.genotype_quality,
    }
}
