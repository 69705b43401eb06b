/// Dataset registry for the marine enrichment service.
///
/// Defines the canonical product datasets queried for each variable, along
/// with their metadata. This is the single source of truth for default
/// dataset identifiers; configuration may point a variable at a different
/// dataset (e.g. a reanalysis product or a mirror with its own id).

pub use crate::model::{VAR_SALINITY, VAR_TEMPERATURE};

// ---------------------------------------------------------------------------
// Dataset metadata
// ---------------------------------------------------------------------------

/// Metadata for a single gridded product dataset.
#[derive(Debug)]
pub struct Dataset {
    /// Product dataset identifier as published by the provider.
    pub dataset_id: &'static str,
    /// Variable queried from the dataset.
    pub variable: &'static str,
    /// CF standard long name of the variable.
    pub long_name: &'static str,
    /// Unit the values are reported in.
    pub units: &'static str,
}

/// Global ocean physics analysis and forecast, daily means on a 1/12° grid.
///
/// Sources:
///   - Copernicus Marine product GLOBAL_ANALYSISFORECAST_PHY_001_024
pub static DATASET_REGISTRY: &[Dataset] = &[
    Dataset {
        dataset_id: "cmems_mod_glo_phy-thetao_anfc_0.083deg_P1D-m",
        variable: VAR_TEMPERATURE,
        long_name: "Sea water potential temperature",
        units: "°C",
    },
    Dataset {
        dataset_id: "cmems_mod_glo_phy-so_anfc_0.083deg_P1D-m",
        variable: VAR_SALINITY,
        long_name: "Sea water salinity",
        units: "PSU",
    },
];

/// Look up the registered dataset for a variable.
pub fn dataset_for(variable: &str) -> Option<&'static Dataset> {
    DATASET_REGISTRY.iter().find(|d| d.variable == variable)
}

/// Units label for a variable, or an empty string when it is unregistered.
pub fn units_for(variable: &str) -> &'static str {
    dataset_for(variable).map(|d| d.units).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_output_variable_has_a_dataset() {
        for var in [VAR_TEMPERATURE, VAR_SALINITY] {
            let ds = dataset_for(var).expect("registered");
            assert!(ds.dataset_id.starts_with("cmems_mod_glo_phy-"));
            assert!(ds.dataset_id.contains(var));
        }
    }

    #[test]
    fn dataset_ids_are_unique() {
        let mut ids: Vec<_> = DATASET_REGISTRY.iter().map(|d| d.dataset_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DATASET_REGISTRY.len());
    }

    #[test]
    fn unknown_variable() {
        assert!(dataset_for("uo").is_none());
        assert_eq!(units_for("uo"), "");
        assert_eq!(units_for(VAR_SALINITY), "PSU");
    }
}
