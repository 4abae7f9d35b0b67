use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

mod config;
mod corpus;
mod encoder;
mod engine;
mod error;
mod index;
mod labeler;
mod models;
mod report;

use crate::config::Settings;
use crate::encoder::FittedEncoder;
use crate::engine::SimilarityEngine;
use crate::error::Error;
use crate::index::VectorIndexClient;
use crate::models::{ApplicationRecord, CasePayload, DecisionSummary, IndexedPoint};

#[derive(Parser)]
#[command(name = "credit-decision-memory")]
#[command(about = "Similarity-based decision support for loan underwriting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the feature encoder on a historical corpus
    Fit {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "encoder.json")]
        out: PathBuf,
    },
    /// Create the collection sized to a fitted encoder
    InitCollection {
        #[arg(long, default_value = "encoder.json")]
        artifact: PathBuf,
    },
    /// Label, encode, and bulk-upsert the historical corpus
    Ingest {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "encoder.json")]
        artifact: PathBuf,
        /// Reference date for outcome labeling; defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Synthetic backshift applied to application dates before labeling
        #[arg(long, default_value_t = 36)]
        shift_months: u32,
    },
    /// Assess a live application against the index
    Assess {
        #[arg(long)]
        application: PathBuf,
        #[arg(long, default_value = "encoder.json")]
        artifact: PathBuf,
        #[arg(long)]
        k: Option<usize>,
    },
    /// Assess a live application and write a markdown decision report
    Report {
        #[arg(long)]
        application: PathBuf,
        #[arg(long, default_value = "encoder.json")]
        artifact: PathBuf,
        #[arg(long)]
        k: Option<usize>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("vector index configuration is incomplete")?;

    match cli.command {
        Commands::Fit { csv, out } => {
            let rows = corpus::load_corpus(&csv)?;
            let applications: Vec<ApplicationRecord> =
                rows.iter().map(|row| row.application()).collect();
            let encoder = encoder::fit(&applications)?;
            encoder.save(&out)?;
            println!(
                "Fitted encoder on {} cases (dimension {}). Artifact written to {}.",
                applications.len(),
                encoder.dimension(),
                out.display()
            );
        }
        Commands::InitCollection { artifact } => {
            let encoder = FittedEncoder::load(&artifact)?;
            let client = VectorIndexClient::new(&settings, encoder.dimension())?;
            client.ensure_collection().await?;
            println!(
                "Collection {} ready (dimension {}).",
                settings.collection,
                encoder.dimension()
            );
        }
        Commands::Ingest {
            csv,
            artifact,
            as_of,
            shift_months,
        } => {
            let rows = corpus::load_corpus(&csv)?;
            let encoder = FittedEncoder::load(&artifact)?;
            let client = VectorIndexClient::new(&settings, encoder.dimension())?;
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

            let mut points = Vec::with_capacity(rows.len());
            for (idx, row) in rows.iter().enumerate() {
                let shifted = labeler::shift_back(row.application_date, shift_months);
                let outcome = labeler::label_outcome(
                    shifted,
                    row.loan_tenure_months,
                    row.fraud(),
                    row.time_to_default_months,
                    as_of,
                );
                points.push(IndexedPoint {
                    id: idx as u64,
                    vector: encoder.transform(&row.application()),
                    payload: CasePayload {
                        application_id: row.application_id.clone(),
                        loan_outcome: outcome,
                        fraud_flag: row.fraud(),
                        fraud_type: row.fraud_type.clone(),
                        loan_type: row.loan_type.clone(),
                        purpose_of_loan: row.purpose_of_loan.clone(),
                        time_to_default_months: row.time_to_default_months,
                    },
                });
            }

            let written = client.upsert(points).await?;
            println!(
                "Ingested {written} historical cases into {}.",
                settings.collection
            );
        }
        Commands::Assess {
            application,
            artifact,
            k,
        } => {
            let (_, summary) = run_assessment(&settings, &application, &artifact, k).await?;
            print_summary(&summary);
        }
        Commands::Report {
            application,
            artifact,
            k,
            out,
        } => {
            let (application, summary) =
                run_assessment(&settings, &application, &artifact, k).await?;
            let report = report::build_report(&application, &summary, Utc::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn run_assessment(
    settings: &Settings,
    application_path: &Path,
    artifact: &Path,
    k: Option<usize>,
) -> anyhow::Result<(ApplicationRecord, DecisionSummary)> {
    let application = load_application(application_path)?;
    let encoder = FittedEncoder::load(artifact)?;
    let client = VectorIndexClient::new(settings, encoder.dimension())?;
    let engine = SimilarityEngine::new(encoder, client);

    let k = k.unwrap_or(settings.default_top_k);
    let summary = engine.assess(&application, k).await?;
    Ok((application, summary))
}

fn load_application(path: &Path) -> anyhow::Result<ApplicationRecord> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let application = serde_json::from_str(&json)
        .map_err(|err| Error::Schema(format!("invalid application record: {err}")))?;
    Ok(application)
}

fn print_summary(summary: &DecisionSummary) {
    println!("Decision Support Summary");
    println!("Similar cases reviewed: {}", summary.total_cases);

    if summary.total_cases == 0 {
        println!("No comparable historical cases found in the index.");
        return;
    }

    println!("- Repaid: {:.1}%", summary.repaid_pct);
    println!("- Defaulted: {:.1}%", summary.defaulted_pct);
    println!("- In progress: {:.1}%", summary.in_progress_pct);
    println!("- Fraud cases: {}", summary.fraud_cases);
    println!("- Average similarity: {:.3}", summary.avg_similarity);
    println!("- Observed risk segment: {}", summary.risk_segment);
}
