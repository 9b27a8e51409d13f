//! OpenAQ v3 client.
//!
//! Fetches monitoring locations and their latest measurements.
//! See: https://docs.openaq.org/

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::errors::AppError;
use crate::models::Sensor;

const API_KEY_HEADER: &str = "x-api-key";

/// Client for the OpenAQ API.
#[derive(Debug, Clone)]
pub struct OpenAqClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    country_id: u32,
    page_limit: u32,
}

// --- OpenAQ JSON response types ---

/// `{utc, local}` timestamp pair used throughout the OpenAQ API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAqDatetime {
    pub utc: Option<String>,
}

/// A monitoring location as returned by `/locations`. Untrusted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    pub id: i64,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "lastSeen")]
    pub datetime_last: Option<OpenAqDatetime>,
    #[serde(default, deserialize_with = "lenient_sensors")]
    pub sensors: Vec<Sensor>,
}

/// `null` becomes an empty list and unreadable sensors are dropped, so a bad
/// sensor never costs the whole location.
fn lenient_sensors<'de, D>(deserializer: D) -> Result<Vec<Sensor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match Sensor::deserialize(&v) {
            Ok(sensor) => Some(sensor),
            Err(e) => {
                tracing::debug!("Dropping unreadable sensor {}: {}", v, e);
                None
            }
        })
        .collect())
}

impl RawLocation {
    /// The locality, if present and not blank.
    pub fn locality(&self) -> Option<&str> {
        self.locality
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    /// The raw `datetimeLast.utc` string, if any.
    pub fn last_seen_utc(&self) -> Option<&str> {
        self.datetime_last.as_ref().and_then(|d| d.utc.as_deref())
    }
}

/// A latest-measurement entry from `/locations/{id}/latest`. Untrusted:
/// every field may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeasurement {
    #[serde(default, alias = "sensorId")]
    pub sensors_id: Option<i64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub datetime: Option<OpenAqDatetime>,
}

impl RawMeasurement {
    pub fn utc(&self) -> Option<&str> {
        self.datetime.as_ref().and_then(|d| d.utc.as_deref())
    }
}

/// Extract the `results` array from an OpenAQ response body.
///
/// A missing or non-array `results` yields an empty list. Entries that fail
/// to deserialize are skipped individually.
pub fn parse_results<T: DeserializeOwned>(body: &serde_json::Value, what: &str) -> Vec<T> {
    let Some(results) = body.get("results").and_then(|r| r.as_array()) else {
        tracing::warn!("OpenAQ {} response has no `results` array", what);
        return Vec::new();
    };

    let mut parsed = Vec::with_capacity(results.len());
    for (i, entry) in results.iter().enumerate() {
        match T::deserialize(entry) {
            Ok(item) => parsed.push(item),
            Err(e) => {
                tracing::warn!("Skipping malformed OpenAQ {} entry #{}: {}", what, i, e);
            }
        }
    }
    parsed
}

impl OpenAqClient {
    pub fn new(base_url: &str, api_key: &str, country_id: u32, page_limit: u32) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            country_id,
            page_limit,
        }
    }

    /// Fetch all monitoring locations for the configured country (one page).
    pub async fn fetch_locations(&self) -> Result<Vec<RawLocation>, AppError> {
        let url = format!("{}/locations", self.base_url);
        let query = [
            ("limit", self.page_limit.to_string()),
            ("page", "1".to_string()),
            ("order_by", "id".to_string()),
            ("sort_order", "asc".to_string()),
            ("countries_id", self.country_id.to_string()),
        ];
        let body = self.get_json(&url, &query).await?;
        Ok(parse_results(&body, "location"))
    }

    /// Fetch the latest measurement per sensor for one location.
    pub async fn fetch_latest(&self, location_id: i64) -> Result<Vec<RawMeasurement>, AppError> {
        let url = format!("{}/locations/{}/latest", self.base_url, location_id);
        let query = [
            ("limit", self.page_limit.to_string()),
            ("page", "1".to_string()),
        ];
        let body = self.get_json(&url, &query).await?;
        Ok(parse_results(&body, "measurement"))
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| AppError::InternalError(format!("Invalid API key header: {}", e)))?,
        );

        let response = self
            .client
            .get(url)
            .query(query)
            .headers(headers)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("OpenAQ request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "OpenAQ returned HTTP {} for {}: {}",
                status, url, detail
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("OpenAQ JSON parse error: {}", e))
        })
    }
}
