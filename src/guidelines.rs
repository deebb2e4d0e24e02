// ==============================================================================
// guidelines.rs - CPIC Guideline Resolution
// ==============================================================================
// Description: Maps (drug, driver gene, phenotype) to risk and recommendation
// Author: Matt Barham
// Created: 2026-02-04
// Modified: 2026-02-09
// Version: 1.0.0
// ==============================================================================
// Every drug has exactly one driver gene. Unknown drugs and phenotypes with
// no rule resolve to an "Unknown" outcome instead of an error.
// ==============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::models::{Gene, GuidelineOutcome, Phenotype, PhenotypeMap, RiskCategory, Severity};

const EVIDENCE_CPIC_A: &str = "CPIC Level A";
const NO_GUIDELINE: &str = "No CPIC guideline available";
const NO_APPLICABLE_RULE: &str = "No applicable CPIC rule";

/// Guideline row for one phenotype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuidelineRule {
    pub risk_category: RiskCategory,
    pub severity: Severity,
    pub recommendation: &'static str,
    pub evidence_level: &'static str,
}

/// Guideline entry for a drug with its single driver gene
#[derive(Debug, Clone)]
pub struct DrugGuideline {
    pub gene: Gene,
    pub rules: HashMap<Phenotype, GuidelineRule>,
}

impl DrugGuideline {
    fn new(gene: Gene, rules: [(Phenotype, RiskCategory, Severity, &'static str); 3]) -> Self {
        let rules = rules
            .into_iter()
            .map(|(phenotype, risk_category, severity, recommendation)| {
                (
                    phenotype,
                    GuidelineRule {
                        risk_category,
                        severity,
                        recommendation,
                        evidence_level: EVIDENCE_CPIC_A,
                    },
                )
            })
            .collect();

        Self { gene, rules }
    }
}

static CPIC_GUIDELINES: LazyLock<HashMap<&'static str, DrugGuideline>> = LazyLock::new(|| {
    use Phenotype::{IM, NM, PM};
    use RiskCategory::{AdjustDosage, Ineffective, ReducedEfficacy, Safe, Toxic};
    use Severity::{High, Low, Moderate};

    HashMap::from([
        (
            "CLOPIDOGREL",
            DrugGuideline::new(
                Gene::Cyp2c19,
                [
                    (
                        PM,
                        Ineffective,
                        High,
                        "Avoid clopidogrel; use alternative antiplatelet therapy",
                    ),
                    (IM, ReducedEfficacy, Moderate, "Consider alternative therapy"),
                    (NM, Safe, Low, "Standard dosing"),
                ],
            ),
        ),
        (
            "CODEINE",
            DrugGuideline::new(
                Gene::Cyp2d6,
                [
                    (PM, Ineffective, Moderate, "Use alternative analgesic"),
                    (IM, ReducedEfficacy, Low, "Monitor response"),
                    (NM, Safe, Low, "Standard dosing"),
                ],
            ),
        ),
        (
            "WARFARIN",
            DrugGuideline::new(
                Gene::Cyp2c9,
                [
                    (PM, Toxic, High, "Reduce dose significantly and monitor INR closely"),
                    (IM, AdjustDosage, Moderate, "Reduce starting dose"),
                    (NM, Safe, Low, "Standard dosing"),
                ],
            ),
        ),
        (
            "SIMVASTATIN",
            DrugGuideline::new(
                Gene::Slco1b1,
                [
                    (PM, Toxic, High, "Avoid high doses; consider alternative statin"),
                    (IM, AdjustDosage, Moderate, "Use lower dose"),
                    (NM, Safe, Low, "Standard dosing"),
                ],
            ),
        ),
        (
            "AZATHIOPRINE",
            DrugGuideline::new(
                Gene::Tpmt,
                [
                    (PM, Toxic, High, "Avoid use; high risk of myelosuppression"),
                    (IM, AdjustDosage, Moderate, "Reduce dose by 30–70%"),
                    (NM, Safe, Low, "Standard dosing"),
                ],
            ),
        ),
        (
            "FLUOROURACIL",
            DrugGuideline::new(
                Gene::Dpyd,
                [
                    (PM, Toxic, High, "Avoid use; severe toxicity risk"),
                    (IM, AdjustDosage, Moderate, "Reduce starting dose"),
                    (NM, Safe, Low, "Standard dosing"),
                ],
            ),
        ),
    ])
});

/// Normalize a comma-separated drug request
///
/// Entries are trimmed and uppercased; blanks are dropped and duplicates
/// collapse onto their first occurrence.
///
/// # Example
/// ```
/// use pgx_processor::guidelines::parse_drug_list;
///
/// assert_eq!(
///     parse_drug_list(" codeine, Warfarin,,CODEINE "),
///     vec!["CODEINE".to_string(), "WARFARIN".to_string()]
/// );
/// ```
pub fn parse_drug_list(drugs: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    drugs
        .split(',')
        .map(|d| d.trim().to_uppercase())
        .filter(|d| !d.is_empty())
        .filter(|d| seen.insert(d.clone()))
        .collect()
}

/// Driver gene for a drug, if the drug has a guideline
pub fn driver_gene(drug: &str) -> Option<Gene> {
    CPIC_GUIDELINES
        .get(drug.trim().to_uppercase().as_str())
        .map(|guideline| guideline.gene)
}

/// Names of all drugs with a guideline, sorted
pub fn supported_drugs() -> Vec<&'static str> {
    let mut drugs: Vec<&'static str> = CPIC_GUIDELINES.keys().copied().collect();
    drugs.sort_unstable();
    drugs
}

/// Resolve one outcome per requested drug, in request order
pub fn apply_guidelines(phenotypes: &PhenotypeMap, drugs: &str) -> Vec<GuidelineOutcome> {
    parse_drug_list(drugs)
        .iter()
        .map(|drug| resolve_drug(phenotypes, drug))
        .collect()
}

/// Resolve a single (already normalized or raw) drug name
pub fn resolve_drug(phenotypes: &PhenotypeMap, drug: &str) -> GuidelineOutcome {
    let drug = drug.trim().to_uppercase();

    let Some(guideline) = CPIC_GUIDELINES.get(drug.as_str()) else {
        debug!("No guideline for drug {}", drug);
        return unknown_outcome(drug, None, NO_GUIDELINE);
    };

    resolve_with(guideline, drug, phenotypes)
}

/// Resolve a drug against one guideline entry
///
/// A phenotype without a rule yields an Unknown outcome that still names
/// the driver gene.
fn resolve_with(
    guideline: &DrugGuideline,
    drug: String,
    phenotypes: &PhenotypeMap,
) -> GuidelineOutcome {
    let gene = guideline.gene;
    let phenotype = phenotypes.get(&gene).copied().unwrap_or(Phenotype::NM);

    match guideline.rules.get(&phenotype) {
        Some(rule) => GuidelineOutcome {
            drug,
            gene: Some(gene),
            phenotype: Some(phenotype),
            risk_category: rule.risk_category.normalized(),
            severity: rule.severity,
            recommendation: rule.recommendation.to_string(),
            evidence_level: Some(rule.evidence_level.to_string()),
        },
        None => {
            warn!("No {} rule for {} phenotype {}", drug, gene, phenotype);
            unknown_outcome(drug, Some(gene), NO_APPLICABLE_RULE)
        }
    }
}

fn unknown_outcome(drug: String, gene: Option<Gene>, recommendation: &str) -> GuidelineOutcome {
    GuidelineOutcome {
        drug,
        gene,
        phenotype: None,
        risk_category: RiskCategory::Unknown,
        severity: Severity::Unknown,
        recommendation: recommendation.to_string(),
        evidence_level: None,
    }
}
