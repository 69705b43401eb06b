//! Marine Data Service Verification
//!
//! Checks that the configured service answers for each dataset the pipeline
//! queries, before committing to a long run. A failed check usually means
//! missing credentials or a wrong server URL.
//!
//! Progress lines go to a caller-supplied writer so a machine-readable report
//! on stdout stays clean.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::config::{ENV_PASSWORD, ENV_USERNAME};
use crate::datasets::{dataset_for, units_for};
use crate::fetch::FetchSettings;
use crate::ingest::{MarineDataProvider, ProviderError, SubsetRequest};

/// South-west corner of the sample area: open ocean in the Gulf of Guinea,
/// covered by every global product.
const SAMPLE_LONGITUDE: f64 = 0.0;
const SAMPLE_LATITUDE: f64 = 0.0;
/// Side of the sample box in degrees. Wider than one 1/12° cell so a single
/// land-masked cell cannot empty the sample.
const SAMPLE_SPAN: f64 = 0.1;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub results: Vec<DatasetVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetVerification {
    pub dataset_id: String,
    pub variable: String,
    pub long_name: Option<String>,
    pub status: VerificationStatus,
    pub service_responsive: bool,
    pub depth_levels: Vec<f64>,
    pub sample_value: Option<f64>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

pub fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

// ============================================================================
// Dataset Verification
// ============================================================================

pub fn verify_dataset<P: MarineDataProvider + ?Sized>(
    provider: &P,
    dataset_id: &str,
    variable: &str,
    min_depth: f64,
    max_depth: f64,
) -> DatasetVerification {
    let mut result = DatasetVerification {
        dataset_id: dataset_id.to_string(),
        variable: variable.to_string(),
        long_name: dataset_for(variable).map(|d| d.long_name.to_string()),
        status: VerificationStatus::Failed,
        service_responsive: false,
        depth_levels: Vec::new(),
        sample_value: None,
        error_message: None,
    };

    let request = SubsetRequest {
        dataset_id: dataset_id.to_string(),
        variable: variable.to_string(),
        longitude: SAMPLE_LONGITUDE,
        latitude: SAMPLE_LATITUDE,
        span: SAMPLE_SPAN,
        date: sample_date(),
        min_depth,
        max_depth,
    };

    match provider.open_subset(&request) {
        Ok(subset) => {
            result.service_responsive = true;
            result.sample_value = subset.first_value();
            result.depth_levels = subset.depths;

            result.status = if result.sample_value.is_some() {
                VerificationStatus::Success
            } else {
                VerificationStatus::PartialSuccess
            };
        }
        Err(err) => {
            result.error_message = Some(describe_failure(&err));
        }
    }

    result
}

fn describe_failure(err: &ProviderError) -> String {
    match err {
        ProviderError::Http { status: 401 | 403, .. } => format!(
            "Authentication error: {}. Set {} and {} (or add them to .env)",
            err, ENV_USERNAME, ENV_PASSWORD
        ),
        _ => err.to_string(),
    }
}

// ============================================================================
// Full Verification Runner
// ============================================================================

/// Check every configured dataset, writing one progress line per dataset to
/// `progress`.
pub fn run_verification<P, W>(
    provider: &P,
    settings: &FetchSettings,
    progress: &mut W,
) -> io::Result<VerificationReport>
where
    P: MarineDataProvider + ?Sized,
    W: Write + ?Sized,
{
    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        results: Vec::new(),
        summary: VerificationSummary::default(),
    };

    writeln!(progress, "🔍 Verifying marine datasets...")?;
    for var in [&settings.temperature, &settings.salinity] {
        let result = verify_dataset(
            provider,
            &var.dataset_id,
            &var.variable,
            settings.probe_min_depth,
            settings.probe_max_depth,
        );

        write!(progress, "  {} ({}", var.dataset_id, var.variable)?;
        if let Some(ref name) = result.long_name {
            write!(progress, ", {}", name)?;
        }
        write!(progress, ") ... ")?;

        match result.status {
            VerificationStatus::Success => {
                writeln!(
                    progress,
                    "✓ OK ({} depth levels, sample {:.2} {})",
                    result.depth_levels.len(),
                    result.sample_value.unwrap_or(f64::NAN),
                    units_for(&var.variable)
                )?;
                report.summary.working += 1;
            }
            VerificationStatus::PartialSuccess => {
                writeln!(progress, "⚠ Responsive but no data in sample area")?;
                report.summary.working += 1;
            }
            VerificationStatus::Failed => {
                writeln!(
                    progress,
                    "✗ FAILED: {}",
                    result.error_message.as_deref().unwrap_or("Unknown")
                )?;
                report.summary.failed += 1;
            }
        }

        report.summary.total += 1;
        report.results.push(result);
    }

    Ok(report)
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!(
        "Datasets:    {}/{} working  ({} failed)",
        report.summary.working, report.summary.total, report.summary.failed
    );
    if report.summary.failed > 0 {
        println!("Check the service URL and credentials ({} / {}).", ENV_USERNAME, ENV_PASSWORD);
    }
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Subset;
    use std::cell::RefCell;

    struct Answer(Result<Subset, ProviderError>);

    impl MarineDataProvider for Answer {
        fn open_subset(&self, _: &SubsetRequest) -> Result<Subset, ProviderError> {
            self.0.clone()
        }
    }

    struct Recording(RefCell<Vec<SubsetRequest>>);

    impl MarineDataProvider for Recording {
        fn open_subset(&self, request: &SubsetRequest) -> Result<Subset, ProviderError> {
            self.0.borrow_mut().push(request.clone());
            Ok(Subset::default())
        }
    }

    #[test]
    fn test_success_with_sample() {
        let provider = Answer(Ok(Subset { depths: vec![0.494, 1.541], values: Some(vec![Some(27.2)]) }));
        let result = verify_dataset(&provider, "ds", "thetao", 0.0, 10.0);
        assert_eq!(result.status, VerificationStatus::Success);
        assert_eq!(result.depth_levels.len(), 2);
        assert_eq!(result.sample_value, Some(27.2));
        assert_eq!(result.long_name.as_deref(), Some("Sea water potential temperature"));
    }

    #[test]
    fn test_partial_when_empty() {
        let result = verify_dataset(&Answer(Ok(Subset::default())), "ds", "so", 0.0, 10.0);
        assert_eq!(result.status, VerificationStatus::PartialSuccess);
        assert!(result.service_responsive);
    }

    #[test]
    fn test_samples_a_small_box() {
        let provider = Recording(RefCell::new(Vec::new()));
        verify_dataset(&provider, "ds", "so", 0.0, 10.0);

        let seen = provider.0.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].longitude_range(), (0.0, 0.1));
        assert_eq!(seen[0].latitude_range(), (0.0, 0.1));
        assert_eq!((seen[0].min_depth, seen[0].max_depth), (0.0, 10.0));
    }

    #[test]
    fn test_auth_failure_hint() {
        let provider = Answer(Err(ProviderError::Http { status: 401, body: "Unauthorized".to_string() }));
        let result = verify_dataset(&provider, "ds", "so", 0.0, 10.0);
        assert_eq!(result.status, VerificationStatus::Failed);
        let msg = result.error_message.unwrap();
        assert!(msg.contains(ENV_USERNAME));
    }

    #[test]
    fn test_report_counts() {
        let provider = Answer(Err(ProviderError::Transport("dns error".to_string())));
        let mut progress = Vec::new();
        let report = run_verification(&provider, &FetchSettings::default(), &mut progress).unwrap();
        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.summary.working, 0);
    }

    #[test]
    fn test_progress_stays_out_of_the_report() {
        let provider = Answer(Ok(Subset { depths: vec![0.494], values: Some(vec![Some(27.2)]) }));
        let mut progress = Vec::new();
        let report = run_verification(&provider, &FetchSettings::default(), &mut progress).unwrap();

        let progress = String::from_utf8(progress).unwrap();
        assert!(progress.starts_with("🔍 Verifying marine datasets..."));
        assert!(progress.contains("cmems_mod_glo_phy-so_anfc_0.083deg_P1D-m (so, Sea water salinity) ... ✓ OK"));
        assert!(progress.contains("sample 27.20 °C"));

        let json = serde_json::to_string_pretty(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["summary"]["working"], 2);
        assert_eq!(parsed["results"][1]["long_name"], "Sea water salinity");
    }
}
