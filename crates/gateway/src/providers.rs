//! Content providers queried by commands.
//!
//! Providers are external collaborators: each returns a bounded string
//! (or list of strings) within a short timeout, and the interpreter maps
//! any failure to a user-visible fallback instead of leaving a command
//! unanswered.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use meshgate_primitives::{truncate_chars, MAX_TEXT_CHARS};

/// Failures talking to a content provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed (includes timeouts).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response decoded but did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(&'static str),
}

/// The decision-support lookups backing the command grammar.
#[async_trait]
pub trait ContentProviders: Send + Sync + 'static {
    /// Current outages, one message per utility company.
    async fn outage_report(&self) -> Result<Vec<String>, ProviderError>;

    /// One-line grid demand summary.
    async fn demand_summary(&self) -> Result<String, ProviderError>;

    /// One-line subway line status summary.
    async fn transit_status(&self) -> Result<String, ProviderError>;
}

/// Endpoint configuration for [`HttpProviders`].
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    /// Grouped outage detail endpoint.
    pub outages_url: String,
    /// Latest demand sample endpoint.
    pub demand_url: String,
    /// Subway line status endpoint.
    pub transit_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP-backed providers.
pub struct HttpProviders {
    client: reqwest::Client,
    endpoints: ProviderEndpoints,
}

#[derive(Debug, Deserialize)]
struct OutageResponse {
    #[serde(default)]
    resultados: Vec<OutageDetail>,
}

#[derive(Debug, Deserialize)]
struct OutageDetail {
    empresa: String,
    #[serde(default)]
    localidad: Option<String>,
    #[serde(default)]
    total_afectados: u64,
    #[serde(default)]
    normalizacion_estimada: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineStatus {
    linea: String,
    estado: String,
    #[serde(default)]
    fecha_registro: Option<String>,
}

impl HttpProviders {
    /// Build a client over the configured endpoints.
    pub fn new(endpoints: ProviderEndpoints) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(endpoints.timeout)
            .build()?;
        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl ContentProviders for HttpProviders {
    async fn outage_report(&self) -> Result<Vec<String>, ProviderError> {
        let response: OutageResponse = self
            .client
            .get(&self.endpoints.outages_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.resultados.is_empty() {
            return Ok(vec!["Sin cortes reportados".to_string()]);
        }

        // One compact line per company: "EN | Loc 1200@18:30, ..."
        let mut companies: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for outage in response.resultados {
            let hour = outage
                .normalizacion_estimada
                .as_deref()
                .and_then(clock_part)
                .unwrap_or("??");
            let location = outage.localidad.as_deref().unwrap_or("Unk");
            companies
                .entry(company_prefix(&outage.empresa))
                .or_default()
                .push(format!("{location} {}@{hour}", outage.total_afectados));
        }

        Ok(companies
            .into_iter()
            .map(|(prefix, items)| {
                truncate_chars(&format!("{prefix} | {}", items.join(", ")), MAX_TEXT_CHARS)
            })
            .collect())
    }

    async fn demand_summary(&self) -> Result<String, ProviderError> {
        let sample: Value = self
            .client
            .get(&self.endpoints.demand_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !sample.is_object() {
            return Err(ProviderError::Malformed("demand sample is not an object"));
        }

        let time = field_or(&sample, "time_muestra", "??");
        let today = field_or(&sample, "DemHoy", "?");
        let forecast = field_or(&sample, "Predespacho", "?");
        Ok(format!("Demanda {time} | Hoy:{today}MW | Est:{forecast}MW"))
    }

    async fn transit_status(&self) -> Result<String, ProviderError> {
        let lines: Vec<LineStatus> = self
            .client
            .get(&self.endpoints.transit_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if lines.is_empty() {
            return Ok("Sin datos de subte".to_string());
        }

        let stamp = lines[0]
            .fecha_registro
            .as_deref()
            .and_then(clock_part)
            .unwrap_or("??");

        let summary: Vec<String> = lines
            .iter()
            .map(|line| {
                let name = line.linea.replace("Linea ", "");
                format!("{}:{}", name.trim(), summarize_status(&line.estado))
            })
            .collect();

        Ok(truncate_chars(
            &format!("Subte {stamp} | {}", summary.join(" ")),
            MAX_TEXT_CHARS,
        ))
    }
}

/// Short prefix for a utility company name.
fn company_prefix(company: &str) -> String {
    match company {
        "Edenor" => "EN".to_string(),
        "Edesur" => "ES".to_string(),
        other => other.to_string(),
    }
}

/// Pull the `HH:MM` clock out of a `YYYY-MM-DD HH:MM[..]` stamp.
fn clock_part(stamp: &str) -> Option<&str> {
    stamp.split(' ').nth(1)?.get(..5)
}

/// Compress a free-form line status into a short keyword.
fn summarize_status(status: &str) -> String {
    let upper = status.to_uppercase();
    if upper.contains("NORMAL") {
        "OK".to_string()
    } else if upper.contains("OBRAS") || upper.contains("RENOVACION") {
        "OBRAS".to_string()
    } else if upper.contains("INTERRUMPID") || upper.contains("SUSPENDID") {
        "CORTE".to_string()
    } else if upper.contains("DEMORA") {
        "DEMORA".to_string()
    } else if upper.contains("LIMITADO") {
        "LIMIT".to_string()
    } else {
        truncate_chars(status.trim(), 10)
    }
}

/// Stringified field access with a fallback, matching the upstream
/// feeds' loose schemas.
fn field_or(value: &Value, key: &str, fallback: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}
