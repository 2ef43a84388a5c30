//! Medical diagnosis CLI
//!
//! A command-line tool for running disease predictions, either against
//! the prediction service or in-process, and for browsing recorded
//! patients and diagnoses.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{domains, predict, records};
use diag_lib::{Domain, Language};
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Medical diagnosis CLI
#[derive(Parser)]
#[command(name = "meddiag")]
#[command(author, version, about = "CLI for the Medical Diagnosis prediction service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via MEDDIAG_API_URL env var)
    #[arg(long, env = "MEDDIAG_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List diagnostic domains and their model status
    Domains,

    /// Print the ordered feature names a domain expects
    Schema {
        /// Domain (diabetes, heart, parkinsons)
        domain: Domain,

        /// Language of the field labels (en, es)
        #[arg(long)]
        lang: Option<Language>,
    },

    /// Run a prediction
    Predict(PredictArgs),

    /// Show diagnoses recorded for a patient
    History {
        /// Patient ID
        patient_id: i64,
    },

    /// List registered patients
    Patients,
}

#[derive(clap::Args)]
pub struct PredictArgs {
    /// Domain (diabetes, heart, parkinsons)
    pub domain: Domain,

    /// Feature value, repeatable (e.g. --set Glucose=148)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// JSON object of feature values; --set entries override it
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Language of the result message (en, es)
    #[arg(long)]
    pub lang: Option<Language>,

    /// Patient full name; with --document-number the diagnosis is recorded
    #[arg(long)]
    pub patient_name: Option<String>,

    /// Patient document number
    #[arg(long)]
    pub document_number: Option<String>,

    /// Patient document type
    #[arg(long, default_value = "CC")]
    pub document_type: String,

    /// Patient age
    #[arg(long)]
    pub age: Option<u32>,

    /// Patient gender (M or F)
    #[arg(long)]
    pub gender: Option<String>,

    /// Name of the clinician recording the diagnosis
    #[arg(long)]
    pub recorded_by: Option<String>,

    /// Predict in-process instead of calling the service
    #[arg(long)]
    pub local: bool,

    /// Model directory for --local predictions
    #[arg(long, env = "MODEL_DIR", default_value = "saved_models")]
    pub model_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = config::Config::load()?;

    let api_url = cli
        .api_url
        .or(file_config.api_url)
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let format = cli.format.or(file_config.default_format).unwrap_or_default();
    let language = file_config.default_language.unwrap_or_default();

    match cli.command {
        Commands::Domains => {
            let client = client::ApiClient::new(&api_url)?;
            domains::list_domains(&client, language, format).await?;
        }
        Commands::Schema { domain, lang } => {
            domains::show_schema(domain, lang.unwrap_or(language), format)?;
        }
        Commands::Predict(args) => {
            if args.local {
                predict::predict_local(&args, language, format)?;
            } else {
                let client = client::ApiClient::new(&api_url)?;
                predict::predict_remote(&client, &args, language, format).await?;
            }
        }
        Commands::History { patient_id } => {
            let client = client::ApiClient::new(&api_url)?;
            records::show_history(&client, patient_id, format).await?;
        }
        Commands::Patients => {
            let client = client::ApiClient::new(&api_url)?;
            records::list_patients(&client, format).await?;
        }
    }

    Ok(())
}
