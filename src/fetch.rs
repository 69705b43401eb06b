//! Marine data fetcher.
//!
//! For one validated point: probe the depth levels the temperature dataset
//! has near the surface, snap the requested depth to the nearest one, then
//! read temperature and salinity at that level.

use crate::config::{AppConfig, VariableConfig};
use crate::ingest::{MarineDataProvider, ProviderError, SubsetRequest};
use crate::logging::{self, Component};
use crate::model::{MarineReading, ValidatedPoint};
use crate::output::format_float;

/// Dataset selection and probe window for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub temperature: VariableConfig,
    pub salinity: VariableConfig,
    pub probe_min_depth: f64,
    pub probe_max_depth: f64,
}

impl FetchSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            temperature: config.temperature.clone(),
            salinity: config.salinity.clone(),
            probe_min_depth: config.depth_probe.min_depth,
            probe_max_depth: config.depth_probe.max_depth,
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// The available level closest to `requested`.
///
/// Equidistant levels resolve to whichever the provider listed first; that
/// order is not something callers should rely on.
pub fn nearest_depth(levels: &[f64], requested: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for &level in levels.iter().filter(|l| l.is_finite()) {
        let distance = (level - requested).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((level, distance)),
        }
    }
    best.map(|(level, _)| level)
}

/// Point query for `var` over the probe window.
fn window_request(var: &VariableConfig, point: &ValidatedPoint, settings: &FetchSettings) -> SubsetRequest {
    SubsetRequest {
        dataset_id: var.dataset_id.clone(),
        variable: var.variable.clone(),
        longitude: point.longitude,
        latitude: point.latitude,
        span: 0.0,
        date: point.date,
        min_depth: settings.probe_min_depth,
        max_depth: settings.probe_max_depth,
    }
}

/// Fetch temperature and salinity for a point.
///
/// Data the service does not have comes back as missing readings. A service
/// failure on any of the three queries is returned as an error; partial
/// readings are discarded.
pub fn fetch_marine_data<P: MarineDataProvider + ?Sized>(
    provider: &P,
    point: &ValidatedPoint,
    settings: &FetchSettings,
) -> Result<MarineReading, ProviderError> {
    let context = format!(
        "{},{}",
        format_float(point.longitude),
        format_float(point.latitude)
    );

    let levels = provider
        .open_subset(&window_request(&settings.temperature, point, settings))?
        .depths;

    let Some(depth) = nearest_depth(&levels, point.requested_depth) else {
        logging::warn(
            Component::Marine,
            Some(&context),
            &format!(
                "No depth levels between {}m and {}m on {}",
                settings.probe_min_depth, settings.probe_max_depth, point.date
            ),
        );
        return Ok(MarineReading::missing());
    };

    logging::info(
        Component::Marine,
        Some(&context),
        &format!(
            "Using nearest depth: {}m (requested: {}m)",
            format_float(depth),
            format_float(point.requested_depth)
        ),
    );

    let temperature = provider
        .open_subset(&window_request(&settings.temperature, point, settings).at_depth(depth))?
        .first_value();

    let salinity = provider
        .open_subset(&window_request(&settings.salinity, point, settings).at_depth(depth))?
        .first_value();

    if temperature.is_none() || salinity.is_none() {
        logging::debug(
            Component::Marine,
            Some(&context),
            &format!(
                "Partial reading at {}m: thetao={:?}, so={:?}",
                format_float(depth),
                temperature,
                salinity
            ),
        );
    }

    Ok(MarineReading {
        temperature,
        salinity,
    })
}
