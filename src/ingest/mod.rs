//! Marine data providers.
//!
//! The pipeline only ever talks to a `MarineDataProvider`. The production
//! implementation queries an ERDDAP griddap server (`erddap`); tests inject
//! a deterministic stub.

pub mod erddap;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while querying the marine data service.
///
/// These are service-level failures. A query the service answers with no
/// data is not an error; it comes back as an empty `Subset`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Non-2xx HTTP response.
    #[error("HTTP error: {status} {body}")]
    Http { status: u16, body: String },
    /// The request never got a response (DNS, TLS, timeout, ...).
    #[error("Request failed: {0}")]
    Transport(String),
    /// The response body could not be deserialized.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The response table lacks a column the query depends on.
    #[error("Response has no '{0}' column")]
    MissingColumn(String),
    /// The configured base URL cannot be turned into a request URL.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

/// One subset query: a single variable of a dataset on a single day, over a
/// depth range.
///
/// The horizontal footprint starts at (`longitude`, `latitude`) and extends
/// `span` degrees east and north. A span of zero is a point query.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetRequest {
    pub dataset_id: String,
    pub variable: String,
    pub longitude: f64,
    pub latitude: f64,
    pub span: f64,
    pub date: NaiveDate,
    pub min_depth: f64,
    pub max_depth: f64,
}

impl SubsetRequest {
    pub fn longitude_range(&self) -> (f64, f64) {
        (self.longitude, self.longitude + self.span)
    }

    pub fn latitude_range(&self) -> (f64, f64) {
        (self.latitude, self.latitude + self.span)
    }

    /// Restrict the request to a single depth level.
    pub fn at_depth(mut self, depth: f64) -> Self {
        self.min_depth = depth;
        self.max_depth = depth;
        self
    }
}

/// What the service returned for a `SubsetRequest`.
///
/// `values` is the variable's grid flattened in (time, depth, latitude,
/// longitude) order, or `None` when the response did not carry the variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subset {
    pub depths: Vec<f64>,
    pub values: Option<Vec<Option<f64>>>,
}

impl Subset {
    /// The first grid cell as a usable scalar. NaN counts as missing.
    pub fn first_value(&self) -> Option<f64> {
        self.values
            .as_ref()?
            .first()
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}

/// A source of gridded marine data.
pub trait MarineDataProvider {
    fn open_subset(&self, request: &SubsetRequest) -> Result<Subset, ProviderError>;
}

impl<P: MarineDataProvider + ?Sized> MarineDataProvider for &P {
    fn open_subset(&self, request: &SubsetRequest) -> Result<Subset, ProviderError> {
        (**self).open_subset(request)
    }
}
