// ==============================================================================
// processor.rs - Core Pharmacogenomic Processing Logic
// ==============================================================================
// Description: Parser → Classifier → Phenotype → Guideline → Scorer pipeline
// Author: Matt Barham
// Created: 2026-02-05
// Modified: 2026-02-09
// Version: 1.0.0
// ==============================================================================
// `run_pipeline` is pure and synchronous. Explanations are requested only
// after it has returned, and can never change its result.
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::classifier::classify_variants;
use crate::explanation::{Explanation, ExplanationError, ExplanationProvider, ExplanationRequest};
use crate::guidelines::apply_guidelines;
use crate::models::{
    ClassifiedVariant, ClinicalRecommendation, DrugResult, Gene, Genotype, GuidelineOutcome,
    PhenotypeMap, QualityMetrics, RiskAssessment,
};
use crate::parsers::VcfParser;
use crate::phenotype::infer_phenotypes;
use crate::scoring::calculate_confidence;
use crate::validator::ValidatedInput;

/// Default bound on a single explanation call
pub const DEFAULT_EXPLANATION_TIMEOUT: Duration = Duration::from_secs(10);

const REFERENCE_ALLELE: &str = "*1";

/// Deterministic output of the interpretation pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    pub phenotypes: PhenotypeMap,
    pub outcomes: Vec<GuidelineOutcome>,
    pub drug_results: Vec<DrugResult>,
    pub quality_metrics: QualityMetrics,
}

/// Drug result with its explanation attached
#[derive(Debug, Clone, Serialize)]
pub struct ExplainedDrugResult {
    #[serde(flatten)]
    pub result: DrugResult,
    pub llm_generated_explanation: Explanation,
}

/// Final analysis report envelope
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub patient_id: String,
    pub generated_at: DateTime<Utc>,
    pub input_sha256: Option<String>,
    pub drug_results: Vec<ExplainedDrugResult>,
    pub quality_metrics: QualityMetrics,
}

/// Run the full interpretation pipeline on decoded VCF text
pub fn run_pipeline(vcf_text: &str, drugs: &str) -> PipelineResult {
    // 1. Parse records
    let mut parser = VcfParser::new();
    let records = parser.parse_str(vcf_text);

    // 2. Classify against the knowledge base
    let classification = classify_variants(&records);
    let recognized = &classification.recognized;

    // 3. Infer phenotypes
    let phenotypes = infer_phenotypes(recognized);

    // 4. Resolve guidelines
    let outcomes = apply_guidelines(&phenotypes, drugs);

    // 5. Score confidence
    let confidence = calculate_confidence(recognized, &phenotypes);

    let drug_results = outcomes
        .iter()
        .map(|outcome| build_drug_result(outcome, recognized, confidence))
        .collect();

    let quality_metrics = QualityMetrics {
        vcf_parsing_success: !records.is_empty(),
        total_variants_scanned: classification.total_scanned,
        recognized_pgx_variants: recognized.len(),
        non_pgx_variants_count: classification.non_pgx_count,
        confidence_score: confidence,
    };

    info!(
        "Pipeline complete: {} drugs, {} PGx variants, confidence {:.2}",
        outcomes.len(),
        recognized.len(),
        confidence
    );

    PipelineResult {
        phenotypes,
        outcomes,
        drug_results,
        quality_metrics,
    }
}

fn build_drug_result(
    outcome: &GuidelineOutcome,
    recognized: &[ClassifiedVariant],
    confidence: f64,
) -> DrugResult {
    let detected_variants = outcome
        .gene
        .map(|gene| variants_for_gene(recognized, gene))
        .unwrap_or_default();

    DrugResult {
        drug: outcome.drug.clone(),
        primary_gene: outcome.gene,
        diplotype: outcome.gene.map(|_| compute_diplotype(&detected_variants)),
        phenotype: outcome.phenotype,
        risk_assessment: RiskAssessment {
            risk_label: outcome.risk_category,
            confidence_score: confidence,
            severity: outcome.severity,
        },
        clinical_recommendation: ClinicalRecommendation {
            recommendation: outcome.recommendation.clone(),
            evidence_level: outcome.evidence_level.clone(),
        },
        detected_variants,
    }
}

fn variants_for_gene(recognized: &[ClassifiedVariant], gene: Gene) -> Vec<ClassifiedVariant> {
    recognized.iter().filter(|v| v.gene == gene).cloned().collect()
}

/// Display diplotype from naive allele counting (no phasing)
///
/// Hom-alt calls contribute their star allele twice, het calls once; the
/// pair is padded with the reference allele and truncated to two.
pub fn compute_diplotype(variants: &[ClassifiedVariant]) -> String {
    let mut alleles: Vec<&str> = Vec::with_capacity(2);

    for variant in variants {
        match variant.genotype {
            Genotype::HomAlt => {
                alleles.push(&variant.allele);
                alleles.push(&variant.allele);
            }
            Genotype::Het => alleles.push(&variant.allele),
            Genotype::HomRef | Genotype::Unknown => {}
        }
    }

    while alleles.len() < 2 {
        alleles.push(REFERENCE_ALLELE);
    }

    format!("{}/{}", alleles[0], alleles[1])
}

/// Assembles explained reports around the pure pipeline
pub struct PgxProcessor<P: ExplanationProvider> {
    provider: P,
    explanation_timeout: Duration,
}

impl<P: ExplanationProvider> PgxProcessor<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            explanation_timeout: DEFAULT_EXPLANATION_TIMEOUT,
        }
    }

    pub fn with_explanation_timeout(mut self, timeout: Duration) -> Self {
        self.explanation_timeout = timeout;
        self
    }

    /// Analyze a validated upload for a comma-separated drug list
    pub async fn analyze(
        &self,
        input: &ValidatedInput,
        drugs: &str,
        patient_id: &str,
    ) -> AnalysisReport {
        let analysis_id = Uuid::new_v4();
        info!("Starting analysis {} ({} bytes input)", analysis_id, input.size);

        let pipeline = run_pipeline(&input.text, drugs);
        let drug_results = self.explain_results(&pipeline).await;

        AnalysisReport {
            analysis_id,
            patient_id: patient_id.to_string(),
            generated_at: Utc::now(),
            input_sha256: Some(input.hash_sha256.clone()),
            drug_results,
            quality_metrics: pipeline.quality_metrics,
        }
    }

    /// Attach explanations to every drug result of a finished pipeline
    pub async fn explain_results(&self, pipeline: &PipelineResult) -> Vec<ExplainedDrugResult> {
        let mut explained = Vec::with_capacity(pipeline.drug_results.len());

        for result in &pipeline.drug_results {
            let explanation = match result.primary_gene {
                Some(gene) => {
                    let request = ExplanationRequest::new(
                        gene,
                        result.phenotype,
                        &result.drug,
                        &result.detected_variants,
                    );
                    self.explain(&request).await
                }
                None => Explanation::no_match(),
            };

            explained.push(ExplainedDrugResult {
                result: result.clone(),
                llm_generated_explanation: explanation,
            });
        }

        explained
    }

    async fn explain(&self, request: &ExplanationRequest) -> Explanation {
        let call = self.provider.explain(request);

        match tokio::time::timeout(self.explanation_timeout, call).await {
            Ok(Ok(explanation)) => explanation,
            Ok(Err(e)) => {
                warn!("Explanation failed for {}: {}", request.drug, e);
                Explanation::unavailable(e)
            }
            Err(_) => {
                let e = ExplanationError::Timeout(self.explanation_timeout.as_secs());
                warn!("Explanation failed for {}: {}", request.drug, e);
                Explanation::unavailable(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::TemplateExplainer;
    use crate::models::{Phenotype, RiskCategory, Severity};
    use crate::validator::InputValidator;
    use async_trait::async_trait;

    const HEADER: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n";

    fn sample_vcf() -> String {
        format!(
            "{}{}",
            HEADER,
            "\
10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT:DP:GQ\t0/1:35:99
22\t42130692\trs3892097\tC\tT\t60\tPASS\t.\tGT:DP:GQ\t0|1:40:95
1\t97450058\trs3918290\tC\tT\t12\tLowQual\t.\tGT:DP:GQ\t1/1:8:20
7\t117559590\trs113993960\tA\tG\t70\tPASS\t.\tGT:DP:GQ\t0/1:50:99
"
        )
    }

    struct FailingExplainer;

    #[async_trait]
    impl ExplanationProvider for FailingExplainer {
        async fn explain(
            &self,
            _request: &ExplanationRequest,
        ) -> Result<Explanation, ExplanationError> {
            Err(ExplanationError::Request("quota exceeded".to_string()))
        }
    }

    struct SlowExplainer;

    #[async_trait]
    impl ExplanationProvider for SlowExplainer {
        async fn explain(
            &self,
            request: &ExplanationRequest,
        ) -> Result<Explanation, ExplanationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            TemplateExplainer.explain(request).await
        }
    }

    #[test]
    fn test_two_intermediate_metabolizers() {
        let result = run_pipeline(&sample_vcf(), "CLOPIDOGREL,CODEINE");

        assert_eq!(result.phenotypes[&Gene::Cyp2c19], Phenotype::IM);
        assert_eq!(result.phenotypes[&Gene::Cyp2d6], Phenotype::IM);
        // LowQual DPYD call is ignored
        assert_eq!(result.phenotypes[&Gene::Dpyd], Phenotype::NM);

        let clopidogrel = &result.drug_results[0];
        assert_eq!(clopidogrel.drug, "CLOPIDOGREL");
        assert_eq!(clopidogrel.risk_assessment.risk_label, RiskCategory::AdjustDosage);
        assert_eq!(clopidogrel.risk_assessment.severity, Severity::Moderate);
        assert_eq!(clopidogrel.diplotype.as_deref(), Some("*2/*1"));
        assert_eq!(clopidogrel.detected_variants.len(), 1);
        assert_eq!(clopidogrel.detected_variants[0].rsid, "rs4244285");

        let codeine = &result.drug_results[1];
        assert_eq!(codeine.risk_assessment.risk_label, RiskCategory::AdjustDosage);
        assert_eq!(codeine.risk_assessment.severity, Severity::Low);
        assert_eq!(codeine.diplotype.as_deref(), Some("*4/*1"));
    }

    #[test]
    fn test_quality_metrics_accounting() {
        let result = run_pipeline(&sample_vcf(), "WARFARIN");
        let metrics = &result.quality_metrics;

        assert!(metrics.vcf_parsing_success);
        assert_eq!(metrics.total_variants_scanned, 4);
        assert_eq!(metrics.recognized_pgx_variants, 2);
        // rs113993960 is PASS but not catalogued; LowQual counts nowhere
        assert_eq!(metrics.non_pgx_variants_count, 1);
        // 0.6 + 2 × (0.1 GQ + 0.1 DP + 0.1 PASS + 0.05 LoF het) = 1.3 → 0.99
        assert_eq!(metrics.confidence_score, 0.99);

        let warfarin = &result.drug_results[0];
        assert_eq!(warfarin.phenotype, Some(Phenotype::NM));
        assert_eq!(warfarin.diplotype.as_deref(), Some("*1/*1"));
        assert!(warfarin.detected_variants.is_empty());
    }

    #[test]
    fn test_no_actionable_variants() {
        let text = format!("{}1\t100\trs1\tA\tG\t50\tPASS\t.\tGT\t0/1\n", HEADER);
        let result = run_pipeline(&text, "simvastatin");

        assert_eq!(result.quality_metrics.confidence_score, 0.9);
        assert_eq!(result.quality_metrics.recognized_pgx_variants, 0);
        assert_eq!(result.outcomes[0].risk_category, RiskCategory::Safe);
    }

    #[test]
    fn test_empty_file_is_success() {
        let result = run_pipeline(HEADER, "CODEINE");

        assert!(!result.quality_metrics.vcf_parsing_success);
        assert_eq!(result.quality_metrics.total_variants_scanned, 0);
        assert_eq!(result.quality_metrics.confidence_score, 0.9);
        assert_eq!(result.outcomes.len(), 1);
    }

    #[test]
    fn test_unknown_drug_result() {
        let result = run_pipeline(&sample_vcf(), "aspirin");
        let aspirin = &result.drug_results[0];

        assert_eq!(aspirin.primary_gene, None);
        assert_eq!(aspirin.diplotype, None);
        assert_eq!(aspirin.phenotype, None);
        assert_eq!(aspirin.risk_assessment.risk_label, RiskCategory::Unknown);
        assert_eq!(aspirin.clinical_recommendation.evidence_level, None);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let vcf = sample_vcf();
        let first = run_pipeline(&vcf, "codeine,clopidogrel,aspirin");
        let second = run_pipeline(&vcf, "codeine,clopidogrel,aspirin");

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_non_finite_quality_is_deterministic() {
        let vcf = "1\t100\trs4244285\tG\tA\tNaN\tPASS\t.\tGT:DP:GQ\t0/1:35:99\n";
        let first = run_pipeline(vcf, "CLOPIDOGREL");
        let second = run_pipeline(vcf, "CLOPIDOGREL");

        assert_eq!(first, second);
        assert_eq!(first.drug_results[0].detected_variants[0].quality, 0.0);
    }

    #[test]
    fn test_compute_diplotype() {
        let result = run_pipeline(
            &format!(
                "{}{}",
                HEADER,
                "\
10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT\t0/1
10\t94780653\trs4986893\tG\tA\t50\tPASS\t.\tGT\t1/1
"
            ),
            "CLOPIDOGREL",
        );

        let clopidogrel = &result.drug_results[0];
        assert_eq!(clopidogrel.phenotype, Some(Phenotype::PM));
        assert_eq!(clopidogrel.diplotype.as_deref(), Some("*2/*3"));
        assert_eq!(compute_diplotype(&[]), "*1/*1");
    }

    #[tokio::test]
    async fn test_analyze_with_template_explainer() {
        let input = InputValidator::new().validate_bytes(sample_vcf().as_bytes()).unwrap();
        let processor = PgxProcessor::new(TemplateExplainer);

        let report = processor.analyze(&input, "CLOPIDOGREL,aspirin", "patient-7").await;

        assert_eq!(report.patient_id, "patient-7");
        assert_eq!(report.input_sha256.as_deref(), Some(input.hash_sha256.as_str()));
        assert_eq!(report.drug_results.len(), 2);

        let clopidogrel = &report.drug_results[0].llm_generated_explanation;
        assert!(clopidogrel.summary.contains("rs4244285"));
        assert_eq!(clopidogrel.variant_citations.len(), 1);

        let aspirin = &report.drug_results[1].llm_generated_explanation;
        assert_eq!(aspirin, &Explanation::no_match());
    }

    #[tokio::test]
    async fn test_explanation_failure_keeps_outcome() {
        let pipeline = run_pipeline(&sample_vcf(), "CLOPIDOGREL");
        let processor = PgxProcessor::new(FailingExplainer);

        let explained = processor.explain_results(&pipeline).await;

        assert_eq!(explained[0].result, pipeline.drug_results[0]);
        let explanation = &explained[0].llm_generated_explanation;
        assert!(explanation.summary.contains("quota exceeded"));
        assert!(explanation.variant_citations.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explanation_timeout_keeps_outcome() {
        let pipeline = run_pipeline(&sample_vcf(), "CODEINE");
        let processor =
            PgxProcessor::new(SlowExplainer).with_explanation_timeout(Duration::from_secs(1));

        let explained = processor.explain_results(&pipeline).await;

        assert_eq!(explained[0].result.risk_assessment.risk_label, RiskCategory::AdjustDosage);
        assert!(explained[0].llm_generated_explanation.summary.contains("timed out"));
        assert!(explained[0].llm_generated_explanation.variant_citations.is_empty());
    }
}
