// ==============================================================================
// main.rs - Pharmacogenomics Processor Entry Point
// ==============================================================================
// Description: Command-line entry point for drug-gene risk interpretation
// Author: Matt Barham
// Created: 2026-02-02
// Modified: 2026-02-09
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pgx_processor::classifier::{classify_variants, map_rsids_to_effects};
use pgx_processor::explanation::TemplateExplainer;
use pgx_processor::guidelines::{driver_gene, resolve_drug, supported_drugs};
use pgx_processor::models::{Gene, Phenotype, PhenotypeMap};
use pgx_processor::output::{write_json, OutputTarget};
use pgx_processor::parsers::VcfParser;
use pgx_processor::phenotype::infer_phenotypes;
use pgx_processor::processor::PgxProcessor;
use pgx_processor::validator::{
    InputError, InputValidator, ValidatedInput, DEFAULT_MAX_INPUT_BYTES,
};

/// Exit status for client-input errors (undecodable or oversized uploads)
const EXIT_INPUT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, env = "PGX_LOG_FORMAT", value_enum, default_value = "compact", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Compact,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Full drug-gene risk report for a variant file
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Comma-separated drug names (case-insensitive)
        #[arg(short, long, env = "PGX_DRUGS")]
        drugs: String,

        /// Patient identifier echoed in the report
        #[arg(short, long, env = "PGX_PATIENT_ID", default_value = "unknown")]
        patient_id: String,

        /// Upper bound on each explanation call, in seconds
        #[arg(long, env = "PGX_EXPLANATION_TIMEOUT_SECS", default_value_t = 10)]
        explanation_timeout_secs: u64,
    },

    /// Dump parsed variant records
    Parse {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Dump inferred metabolizer phenotypes
    Phenotype {
        #[command(flatten)]
        input: InputArgs,

        /// Map catalogued variants regardless of FILTER verdict
        #[arg(long)]
        include_filtered: bool,
    },

    /// Guideline lookup for a drug with a known phenotype
    Manual {
        /// Drug name
        #[arg(short, long)]
        drug: String,

        /// Metabolizer phenotype of the drug's driver gene (PM, IM or NM)
        #[arg(long)]
        phenotype: Phenotype,

        /// Output path (stdout if omitted or "-")
        #[arg(short, long, env = "PGX_OUTPUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Variant file (.vcf or .vcf.gz)
    #[arg(short, long, env = "PGX_INPUT")]
    input: PathBuf,

    /// Output path (stdout if omitted or "-")
    #[arg(short, long, env = "PGX_OUTPUT")]
    output: Option<PathBuf>,

    /// Maximum accepted input size in bytes
    #[arg(long, env = "PGX_MAX_INPUT_BYTES", default_value_t = DEFAULT_MAX_INPUT_BYTES)]
    max_input_bytes: usize,
}

impl InputArgs {
    fn load(&self) -> Result<ValidatedInput> {
        let input = InputValidator::new()
            .with_max_input_bytes(self.max_input_bytes)
            .validate_path(&self.input)?;

        info!(
            "Loaded {:?} ({} bytes, gzip: {})",
            self.input, input.size, input.compressed
        );
        Ok(input)
    }

    fn target(&self) -> OutputTarget {
        OutputTarget::from_option(self.output.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            if e.downcast_ref::<InputError>().is_some() {
                ExitCode::from(EXIT_INPUT_ERROR)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pgx_processor=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the JSON report
    match format {
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Analyze {
            input,
            drugs,
            patient_id,
            explanation_timeout_secs,
        } => {
            let validated = input.load()?;
            let processor = PgxProcessor::new(TemplateExplainer)
                .with_explanation_timeout(Duration::from_secs(explanation_timeout_secs));

            let report = processor.analyze(&validated, &drugs, &patient_id).await;
            info!(
                "Analysis {} complete for {} drug(s)",
                report.analysis_id,
                report.drug_results.len()
            );

            write_json(&report, &input.target())
        }

        Command::Parse { input } => {
            let validated = input.load()?;
            let mut parser = VcfParser::new();
            let records = parser.parse_str(&validated.text);

            write_json(
                &json!({
                    "records": records,
                    "skipped_lines": parser.skipped_count,
                    "lines_without_genotype": parser.no_genotype_count,
                }),
                &input.target(),
            )
        }

        Command::Phenotype {
            input,
            include_filtered,
        } => {
            let validated = input.load()?;
            let records = VcfParser::new().parse_str(&validated.text);

            let variants = if include_filtered {
                map_rsids_to_effects(&records)
            } else {
                classify_variants(&records).recognized
            };
            let phenotypes = infer_phenotypes(&variants);

            write_json(
                &json!({
                    "phenotypes": phenotypes,
                    "variants": variants,
                }),
                &input.target(),
            )
        }

        Command::Manual {
            drug,
            phenotype,
            output,
        } => {
            let mut phenotypes: PhenotypeMap =
                Gene::ALL.iter().map(|&g| (g, Phenotype::NM)).collect();

            match driver_gene(&drug) {
                Some(gene) => {
                    phenotypes.insert(gene, phenotype);
                }
                None => warn!(
                    "No guideline for {}; supported drugs: {}",
                    drug,
                    supported_drugs().join(", ")
                ),
            }

            let outcome = resolve_drug(&phenotypes, &drug);
            write_json(&outcome, &OutputTarget::from_option(output))
                .context("Failed to write guideline outcome")
        }
    }
}
