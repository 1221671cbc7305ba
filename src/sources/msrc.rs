//! MSRC CVRF bulletin source.
//!
//! Fetches monthly security-update documents from the Microsoft Security
//! Response Center CVRF API and flattens them into [`AffectedRow`]s.
//!
//! # Data Source
//!
//! - Period enumeration: `GET {base}/updates`
//! - Monthly document:   `GET {base}/cvrf/{period}` (JSON)
//!
//! A CVRF document carries a product tree (product id to full product name)
//! and a vulnerability list; each vulnerability's remediations reference the
//! KB article, the products it applies to, and the article it supersedes.

use super::BulletinSource;
use crate::error::{BulletinError, Result};
use crate::kb::CveField;
use crate::models::{AffectedRow, KbArticle};
use crate::period::PeriodId;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// Default base URL for the MSRC CVRF v3 API.
pub const MSRC_API_BASE: &str = "https://api.msrc.microsoft.com/cvrf/v3.0";

/// MSRC CVRF data source.
pub struct MsrcSource {
    client: reqwest::Client,
    base_url: String,
}

impl MsrcSource {
    /// Create a source against the public MSRC API.
    pub fn new() -> Self {
        Self::with_base_url(MSRC_API_BASE)
    }

    /// Override the API base URL (useful for mock servers in tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BulletinError::source_fetch(
                "MSRC",
                format!("HTTP {} for {url}", response.status()),
            ));
        }

        Ok(response.json::<T>().await?)
    }
}

impl Default for MsrcSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BulletinSource for MsrcSource {
    async fn fetch_affected(&self, period: &PeriodId) -> Result<Vec<AffectedRow>> {
        info!("Fetching MSRC CVRF document for {period}...");

        let url = format!("{}/cvrf/{}", self.base_url, period);
        let document: CvrfDocument = self.get_json(&url).await?;
        let rows = flatten_document(&document);

        debug!("CVRF {period}: {} affected-software rows", rows.len());
        Ok(rows)
    }

    async fn list_known_periods(&self) -> Result<Vec<String>> {
        let url = format!("{}/updates", self.base_url);
        let updates: UpdatesResponse = self.get_json(&url).await?;
        Ok(updates.value.into_iter().filter_map(|u| u.id).collect())
    }

    fn name(&self) -> &str {
        "MSRC"
    }
}

/// Flatten a CVRF document into one row per (remediation, product) pair.
///
/// Remediations whose description is not a bare article number (e.g.
/// "Release Notes") carry no installable update and are dropped.
fn flatten_document(document: &CvrfDocument) -> Vec<AffectedRow> {
    let products: HashMap<&str, &str> = document
        .product_tree
        .full_product_name
        .iter()
        .filter_map(|p| match (&p.product_id, &p.value) {
            (Some(id), Some(value)) => Some((id.as_str(), value.as_str())),
            _ => None,
        })
        .collect();

    let mut rows = Vec::new();
    for vulnerability in &document.vulnerability {
        for remediation in &vulnerability.remediations {
            let Some(article) = remediation
                .description
                .as_ref()
                .and_then(|d| d.value.as_deref())
            else {
                continue;
            };
            let article = article.trim();
            if article.is_empty() || !article.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }

            for product_id in &remediation.product_id {
                let Some(product_name) = products.get(product_id.as_str()) else {
                    continue;
                };

                rows.push(AffectedRow {
                    full_product_name: (*product_name).to_string(),
                    cves: vulnerability
                        .cve
                        .as_ref()
                        .map(|cve| CveField::One(cve.clone())),
                    kb_articles: vec![KbArticle {
                        id: Some(article.to_string()),
                        url: remediation.url.clone(),
                    }],
                    supersedence: remediation
                        .supercedence
                        .iter()
                        .filter(|s| !s.trim().is_empty())
                        .cloned()
                        .collect(),
                });
            }
        }
    }
    rows
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    value: Vec<UpdateEntry>,
}

#[derive(Debug, Deserialize)]
struct UpdateEntry {
    #[serde(rename = "ID")]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CvrfDocument {
    #[serde(rename = "ProductTree", default)]
    product_tree: ProductTree,
    #[serde(rename = "Vulnerability", default)]
    vulnerability: Vec<Vulnerability>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductTree {
    #[serde(rename = "FullProductName", default)]
    full_product_name: Vec<FullProductName>,
}

#[derive(Debug, Deserialize)]
struct FullProductName {
    #[serde(rename = "ProductID")]
    product_id: Option<String>,
    #[serde(rename = "Value")]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Vulnerability {
    #[serde(rename = "CVE")]
    cve: Option<String>,
    #[serde(rename = "Remediations", default)]
    remediations: Vec<Remediation>,
}

#[derive(Debug, Deserialize)]
struct Remediation {
    #[serde(rename = "Description")]
    description: Option<ValueWrapper>,
    #[serde(rename = "URL")]
    url: Option<String>,
    // MSRC spells it "Supercedence"; either a single fragment or absent.
    #[serde(rename = "Supercedence", default, deserialize_with = "one_or_many")]
    supercedence: Vec<String>,
    #[serde(rename = "ProductID", default)]
    product_id: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ValueWrapper {
    #[serde(rename = "Value")]
    value: Option<String>,
}

/// Accept a supersedence field that is a string, a list, or null.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let field: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(match field {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}
