//! Domain catalogue commands

use anyhow::Result;
use colored::Colorize;
use diag_lib::messages::{domain_title, feature_labels};
use diag_lib::{Domain, Language};
use serde::Serialize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_availability, print_json, print_table, OutputFormat};

/// Row for domains table
#[derive(Tabled)]
struct DomainRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Features")]
    features: usize,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Family")]
    family: String,
}

/// List domains known to the service
pub async fn list_domains(client: &ApiClient, language: Language, format: OutputFormat) -> Result<()> {
    let domains = client.domains(language).await?;

    match format {
        OutputFormat::Json => print_json(&domains)?,
        OutputFormat::Table => {
            let rows: Vec<DomainRow> = domains
                .iter()
                .map(|d| DomainRow {
                    domain: d.domain.to_string(),
                    name: if d.title.is_empty() {
                        d.display_name.clone()
                    } else {
                        d.title.clone()
                    },
                    features: d.features.len(),
                    model: color_availability(d.available),
                    family: d
                        .model
                        .as_ref()
                        .map(|m| m.family.clone())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            print_table(&rows);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct Schema {
    domain: Domain,
    title: &'static str,
    features: &'static [&'static str],
    labels: Vec<&'static str>,
}

/// Row for schema table
#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Feature")]
    name: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
}

/// Print the feature order of a domain with localized labels; works offline
pub fn show_schema(domain: Domain, language: Language, format: OutputFormat) -> Result<()> {
    let labels = feature_labels(domain, language);
    match format {
        OutputFormat::Json => print_json(&Schema {
            domain,
            title: domain_title(domain, language),
            features: domain.feature_order(),
            labels,
        })?,
        OutputFormat::Table => {
            println!(
                "{} ({} features)",
                domain_title(domain, language).bold(),
                domain.feature_count()
            );
            let rows: Vec<FeatureRow> = domain
                .feature_order()
                .iter()
                .zip(labels)
                .enumerate()
                .map(|(i, (&name, label))| FeatureRow {
                    position: i,
                    name,
                    label,
                })
                .collect();
            print_table(&rows);
        }
    }
    Ok(())
}
