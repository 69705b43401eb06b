/// ERDDAP griddap Data API Client
///
/// Retrieves gridded ocean model output (Copernicus Marine global physics
/// products and their mirrors) from an ERDDAP server using the griddap
/// `.json` response format.
///
/// API Documentation: https://coastwatch.pfeg.noaa.gov/erddap/griddap/documentation.html
///
/// A griddap query selects one variable over (time, depth, latitude,
/// longitude) with one `[(start):(stop)]` constraint per axis. Single values
/// in parentheses snap to the nearest grid index on the server.

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{MarineDataProvider, ProviderError, Subset, SubsetRequest};

/// Body fragment ERDDAP returns (with HTTP 404) when a query is valid but
/// matches no data.
const NO_MATCHING_RESULTS: &str = "no matching results";

/// Longest error text carried in `ProviderError::Http`.
const MAX_ERROR_CHARS: usize = 200;

// ============================================================================
// griddap Response Structures
// ============================================================================

/// `.json` griddap response
#[derive(Debug, Deserialize)]
pub struct GriddapResponse {
    pub table: GriddapTable,
}

/// Tabular griddap payload: one row per grid cell
#[derive(Debug, Deserialize)]
pub struct GriddapTable {
    #[serde(rename = "columnNames")]
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Basic-auth credentials for servers fronted by a login.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// ============================================================================
// API Client
// ============================================================================

pub struct ErddapClient {
    http: reqwest::blocking::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl ErddapClient {
    /// Build a client with a per-request timeout.
    ///
    /// `credentials` are sent to `base_url` and nowhere else.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        credentials: Option<Credentials>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl MarineDataProvider for ErddapClient {
    fn open_subset(&self, request: &SubsetRequest) -> Result<Subset, ProviderError> {
        let url = build_griddap_url(&self.base_url, request)?;

        let mut builder = self.http.get(url).header("Accept", "application/json");
        if let Some(ref creds) = self.credentials {
            builder = builder.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = builder
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        classify_response(status, &body, &request.variable)
    }
}

/// Turn a griddap response into a `Subset` or a service error.
///
/// A 404 whose body says "no matching results" is a valid query with no
/// data and yields an empty subset. Every other non-2xx status is an error.
pub fn classify_response(
    status: u16,
    body: &str,
    variable: &str,
) -> Result<Subset, ProviderError> {
    if (200..300).contains(&status) {
        return parse_griddap_json(body, variable);
    }

    if status == 404 && body.to_ascii_lowercase().contains(NO_MATCHING_RESULTS) {
        return Ok(Subset::default());
    }

    Err(ProviderError::Http {
        status,
        body: summarize_body(body),
    })
}

// ============================================================================
// URL Construction
// ============================================================================

/// Build the griddap `.json` URL for a subset request.
///
/// Axis order is time, depth, latitude, longitude. The date range is
/// collapsed to midnight of the day.
pub fn build_griddap_url(base_url: &str, request: &SubsetRequest) -> Result<Url, ProviderError> {
    let time = request.date.format("%Y-%m-%dT00:00:00Z");
    let (min_lat, max_lat) = request.latitude_range();
    let (min_lon, max_lon) = request.longitude_range();
    let constraint = format!(
        "{}[({})][({}):({})][({}):({})][({}):({})]",
        request.variable,
        time,
        request.min_depth,
        request.max_depth,
        min_lat,
        max_lat,
        min_lon,
        max_lon
    );

    let endpoint = format!(
        "{}/griddap/{}.json",
        base_url.trim_end_matches('/'),
        request.dataset_id
    );
    let mut url = Url::parse(&endpoint)
        .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
    url.query_pairs_mut().append_key_only(&constraint);
    Ok(url)
}

/// Pull the human-readable message out of an ERDDAP error body.
///
/// ERDDAP errors look like `Error {\n    code=404;\n    message="...";\n}`.
/// Bodies without a `message=` line fall back to their first non-empty line.
fn summarize_body(body: &str) -> String {
    let message = body
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("message="))
        .map(|m| {
            m.trim_end_matches(';')
                .trim()
                .trim_matches('"')
                .replace("\\\"", "\"")
        });

    let text = message.unwrap_or_else(|| {
        body.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
            .to_string()
    });
    text.chars().take(MAX_ERROR_CHARS).collect()
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Parse a griddap `.json` response into a `Subset` for `variable`.
///
/// The depth axis is required; the variable column is optional (its absence
/// means the dataset does not carry the variable at this point).
pub fn parse_griddap_json(body: &str, variable: &str) -> Result<Subset, ProviderError> {
    let response: GriddapResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let table = response.table;

    let depth_idx = table
        .column_names
        .iter()
        .position(|c| c == "depth")
        .ok_or_else(|| ProviderError::MissingColumn("depth".to_string()))?;
    let var_idx = table.column_names.iter().position(|c| c == variable);

    let mut depths: Vec<f64> = Vec::new();
    for row in &table.rows {
        if let Some(depth) = row.get(depth_idx).and_then(cell_to_f64) {
            // Rows repeat each depth once per (lat, lon) cell
            if !depths.contains(&depth) {
                depths.push(depth);
            }
        }
    }

    let values = var_idx.map(|idx| {
        table
            .rows
            .iter()
            .map(|row| row.get(idx).and_then(cell_to_f64))
            .collect()
    });

    Ok(Subset { depths, values })
}

/// Numeric cell value. ERDDAP writes missing values as `null`, and some
/// servers emit `"NaN"` strings.
fn cell_to_f64(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
