// ==============================================================================
// models.rs - Pharmacogenomic Data Models
// ==============================================================================
// Description: Data structures shared by the variant interpretation pipeline
// Author: Matt Barham
// Created: 2026-02-02
// Modified: 2026-02-09
// Version: 1.0.0
// ==============================================================================

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Filter verdict that marks a call as passing all quality filters
pub const FILTER_PASS: &str = "PASS";

/// Normalized genotype call for a single-sample biallelic site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Genotype {
    /// Both alleles match the reference (0/0)
    HomRef,
    /// One reference allele, one alternate allele (0/1)
    Het,
    /// Both alleles are non-reference (1/1)
    HomAlt,
    /// Missing, haploid or otherwise unreadable call
    Unknown,
}

impl Genotype {
    /// Classify a `/`-separated allele-index pair
    ///
    /// Phasing must already be normalized (`|` → `/`) by the caller.
    ///
    /// # Examples
    /// ```
    /// use pgx_processor::models::Genotype;
    ///
    /// assert_eq!(Genotype::from_call("0/0"), Genotype::HomRef);
    /// assert_eq!(Genotype::from_call("1/0"), Genotype::Het);
    /// assert_eq!(Genotype::from_call("1/1"), Genotype::HomAlt);
    /// assert_eq!(Genotype::from_call("./."), Genotype::Unknown);
    /// ```
    pub fn from_call(call: &str) -> Self {
        let parts: Vec<&str> = call.split('/').collect();
        if parts.len() != 2 {
            return Genotype::Unknown;
        }

        let (allele1, allele2) = match (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
            (Ok(a), Ok(b)) => (a, b),
            _ => return Genotype::Unknown,
        };

        match (allele1 == 0, allele2 == 0) {
            (true, true) => Genotype::HomRef,
            (true, false) | (false, true) => Genotype::Het,
            (false, false) => Genotype::HomAlt,
        }
    }

    /// Number of non-reference alleles carried (0, 1 or 2)
    pub fn alt_allele_count(&self) -> u32 {
        match self {
            Genotype::HomAlt => 2,
            Genotype::Het => 1,
            Genotype::HomRef | Genotype::Unknown => 0,
        }
    }

    /// True when at least one non-reference allele is present
    pub fn carries_alt(&self) -> bool {
        matches!(self, Genotype::Het | Genotype::HomAlt)
    }
}

/// Normalized variant call parsed from one data line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRecord {
    /// Reference SNP identifier (always starts with "rs")
    pub rsid: String,

    /// Normalized genotype class
    pub genotype: Genotype,

    /// Raw call with phasing removed (e.g., "0/1")
    pub genotype_call: String,

    /// Reference allele (e.g., "G")
    pub ref_allele: String,

    /// Alternate allele (e.g., "A")
    pub alt_allele: String,

    /// QUAL column, 0.0 when missing
    pub quality: f64,

    /// FILTER column verbatim
    pub filter: String,

    /// Read depth (DP), 0 when missing
    pub depth: u32,

    /// Genotype quality (GQ), 0 when missing
    pub genotype_quality: u32,
}

impl VariantRecord {
    pub fn is_pass(&self) -> bool {
        self.filter == FILTER_PASS
    }
}

/// Tracked pharmacogenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Gene {
    #[serde(rename = "CYP2D6")]
    Cyp2d6,
    #[serde(rename = "CYP2C19")]
    Cyp2c19,
    #[serde(rename = "CYP2C9")]
    Cyp2c9,
    #[serde(rename = "SLCO1B1")]
    Slco1b1,
    #[serde(rename = "TPMT")]
    Tpmt,
    #[serde(rename = "DPYD")]
    Dpyd,
}

impl Gene {
    /// The closed set of genes every phenotype map covers
    pub const ALL: [Gene; 6] = [
        Gene::Cyp2d6,
        Gene::Cyp2c19,
        Gene::Cyp2c9,
        Gene::Slco1b1,
        Gene::Tpmt,
        Gene::Dpyd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gene::Cyp2d6 => "CYP2D6",
            Gene::Cyp2c19 => "CYP2C19",
            Gene::Cyp2c9 => "CYP2C9",
            Gene::Slco1b1 => "SLCO1B1",
            Gene::Tpmt => "TPMT",
            Gene::Dpyd => "DPYD",
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Gene::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == upper)
            .ok_or_else(|| format!("Untracked gene: {}", s))
    }
}

/// Functional consequence of a catalogued star allele
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalEffect {
    LossOfFunction,
    ReducedFunction,
}

/// Variant that passed classification against the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedVariant {
    pub rsid: String,
    pub gene: Gene,
    /// Star-allele label (e.g., "*2")
    pub allele: String,
    pub effect: FunctionalEffect,
    pub genotype: Genotype,
    pub genotype_call: String,
    pub quality: f64,
    pub filter: String,
    pub depth: u32,
    pub genotype_quality: u32,
}

/// Metabolizer phenotype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phenotype {
    /// Poor metabolizer
    PM,
    /// Intermediate metabolizer
    IM,
    /// Normal metabolizer
    NM,
}

impl Phenotype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phenotype::PM => "PM",
            Phenotype::IM => "IM",
            Phenotype::NM => "NM",
        }
    }
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phenotype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PM" => Ok(Phenotype::PM),
            "IM" => Ok(Phenotype::IM),
            "NM" => Ok(Phenotype::NM),
            other => Err(format!("Invalid phenotype '{}' (expected PM, IM or NM)", other)),
        }
    }
}

/// Gene → phenotype assignment covering every tracked gene
pub type PhenotypeMap = BTreeMap<Gene, Phenotype>;

/// Clinical risk label from the guideline tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskCategory {
    Safe,
    #[serde(rename = "Adjust Dosage")]
    AdjustDosage,
    Toxic,
    Ineffective,
    #[serde(rename = "Reduced efficacy")]
    ReducedEfficacy,
    Unknown,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Safe => "Safe",
            RiskCategory::AdjustDosage => "Adjust Dosage",
            RiskCategory::Toxic => "Toxic",
            RiskCategory::Ineffective => "Ineffective",
            RiskCategory::ReducedEfficacy => "Reduced efficacy",
            RiskCategory::Unknown => "Unknown",
        }
    }

    /// Display relabeling applied to every resolved outcome
    pub fn normalized(self) -> Self {
        match self {
            RiskCategory::ReducedEfficacy => RiskCategory::AdjustDosage,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::Unknown => "Unknown",
        }
    }
}

/// Guideline resolution for one requested drug
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidelineOutcome {
    pub drug: String,
    pub gene: Option<Gene>,
    pub phenotype: Option<Phenotype>,
    pub risk_category: RiskCategory,
    pub severity: Severity,
    pub recommendation: String,
    pub evidence_level: Option<String>,
}

/// Output of the classifier stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub recognized: Vec<ClassifiedVariant>,
    /// Every parsed record, including non-PASS calls
    pub total_scanned: usize,
    /// PASS calls that did not match a tracked, actionable variant
    pub non_pgx_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk_label: RiskCategory,
    pub confidence_score: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicalRecommendation {
    pub recommendation: String,
    pub evidence_level: Option<String>,
}

/// Per-drug result assembled from the guideline outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrugResult {
    pub drug: String,
    pub primary_gene: Option<Gene>,
    pub diplotype: Option<String>,
    pub phenotype: Option<Phenotype>,
    pub risk_assessment: RiskAssessment,
    pub clinical_recommendation: ClinicalRecommendation,
    /// Classified variants backing the primary gene
    pub detected_variants: Vec<ClassifiedVariant>,
}

/// Aggregate quality metrics for one analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub vcf_parsing_success: bool,
    pub total_variants_scanned: usize,
    pub recognized_pgx_variants: usize,
    pub non_pgx_variants_count: usize,
    pub confidence_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genotype_from_call() {
        assert_eq!(Genotype::from_call("0/0"), Genotype::HomRef);
        assert_eq!(Genotype::from_call("0/1"), Genotype::Het);
        assert_eq!(Genotype::from_call("1/0"), Genotype::Het);
        assert_eq!(Genotype::from_call("1/1"), Genotype::HomAlt);
        assert_eq!(Genotype::from_call("1/2"), Genotype::HomAlt);

        assert_eq!(Genotype::from_call("./."), Genotype::Unknown);
        assert_eq!(Genotype::from_call("0/."), Genotype::Unknown);
        assert_eq!(Genotype::from_call("1"), Genotype::Unknown);
        assert_eq!(Genotype::from_call("0/1/1"), Genotype::Unknown);
        // Phasing is normalized before classification
        assert_eq!(Genotype::from_call("0|1"), Genotype::Unknown);
    }

    #[test]
    fn test_alt_allele_count() {
        assert_eq!(Genotype::HomAlt.alt_allele_count(), 2);
        assert_eq!(Genotype::Het.alt_allele_count(), 1);
        assert_eq!(Genotype::HomRef.alt_allele_count(), 0);
        assert_eq!(Genotype::Unknown.alt_allele_count(), 0);
        assert!(!Genotype::HomRef.carries_alt());
    }

    #[test]
    fn test_gene_parsing() {
        assert_eq!("cyp2c19".parse::<Gene>().unwrap(), Gene::Cyp2c19);
        assert_eq!(" DPYD ".parse::<Gene>().unwrap(), Gene::Dpyd);
        assert!("BRCA1".parse::<Gene>().is_err());
    }

    #[test]
    fn test_phenotype_parsing() {
        assert_eq!("im".parse::<Phenotype>().unwrap(), Phenotype::IM);
        assert!("UM".parse::<Phenotype>().is_err());
    }

    #[test]
    fn test_risk_category_normalization() {
        assert_eq!(RiskCategory::ReducedEfficacy.normalized(), RiskCategory::AdjustDosage);
        assert_eq!(RiskCategory::Toxic.normalized(), RiskCategory::Toxic);
    }

    #[test]
    fn test_label_serde() {
        assert_eq!(serde_json::to_string(&Gene::Slco1b1).unwrap(), "\"SLCO1B1\"");
        assert_eq!(
            serde_json::to_string(&RiskCategory::AdjustDosage).unwrap(),
            "\"Adjust Dosage\""
        );
        assert_eq!(
            serde_json::to_string(&FunctionalEffect::LossOfFunction).unwrap(),
            "\"loss_of_function\""
        );
        assert_eq!(serde_json::to_string(&Genotype::HomAlt).unwrap(), "\"hom_alt\"");
    }
}
