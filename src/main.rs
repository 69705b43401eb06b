use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;

use ocean_enrich::config::{credentials_from_env, AppConfig};
use ocean_enrich::fetch::FetchSettings;
use ocean_enrich::ingest::erddap::ErddapClient;
use ocean_enrich::logging::{init_logger, LogLevel};
use ocean_enrich::model::DEFAULT_DEPTH_M;
use ocean_enrich::pipeline::{self, RunOptions, RunStatus};
use ocean_enrich::verify;

/// Extract sea water temperature and salinity for occurrence records
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input occurrence table
    #[arg(long = "csv", value_name = "PATH", required_unless_present = "check")]
    csv: Option<PathBuf>,

    /// Output table (parent directories are created)
    #[arg(long = "out_csv", value_name = "PATH", required_unless_present = "check")]
    out_csv: Option<PathBuf>,

    /// Depth in meters, snapped to the nearest available level
    #[arg(long, default_value_t = DEFAULT_DEPTH_M)]
    depth: f64,

    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append log entries to this file
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<String>,

    /// Show debug output
    #[arg(short, long)]
    verbose: bool,

    /// Only check that the marine data service answers, then exit
    #[arg(long)]
    check: bool,

    /// Print the check report as JSON
    #[arg(long, requires = "check")]
    json: bool,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            println!("❌ {}", e);
            return;
        }
    };

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::from_name(&config.logging.level)
    };
    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    init_logger(level, log_file.as_deref(), config.logging.timestamps);

    let base_url = match config.base_url() {
        Ok(url) => url,
        Err(e) => {
            println!("❌ {}", e);
            return;
        }
    };

    let client = match ErddapClient::new(base_url, config.service.timeout(), credentials_from_env()) {
        Ok(client) => client,
        Err(e) => {
            println!("❌ Could not set up the marine data client: {}", e);
            return;
        }
    };
    let settings = FetchSettings::from_config(&config);

    if cli.check {
        // With --json, stdout carries the report and nothing else
        let report = if cli.json {
            check_service(&client, &settings, &mut io::stderr())
        } else {
            check_service(&client, &settings, &mut io::stdout())
        };
        let report = match report {
            Ok(report) => report,
            Err(e) => {
                eprintln!("❌ Could not write check progress: {}", e);
                return;
            }
        };

        if cli.json {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("❌ Could not serialize report: {}", e),
            }
        } else {
            verify::print_summary(&report);
        }
        return;
    }

    let (Some(input_path), Some(output_path)) = (cli.csv, cli.out_csv) else {
        return;
    };

    if !cli.depth.is_finite() {
        println!("❌ Invalid depth: {}", cli.depth);
        return;
    }

    let options = RunOptions {
        input_path,
        output_path,
        requested_depth: cli.depth,
        missing_value: config.output.missing_value.clone(),
        fetch: settings,
    };

    let report = pipeline::run(&client, &options);
    match report.status {
        RunStatus::NoInput(_) => println!("No valid data found in the input file."),
        RunStatus::NoValidData => println!("❌ No valid data processed."),
        RunStatus::Written { path, rows } => {
            println!("\n🎉 Data saved to: {} ({} rows)", path.display(), rows)
        }
        RunStatus::WriteFailed(_) => println!("❌ Results could not be saved."),
    }
}

fn check_service(
    client: &ErddapClient,
    settings: &FetchSettings,
    progress: &mut dyn Write,
) -> io::Result<verify::VerificationReport> {
    writeln!(progress, "Service: {}", client.base_url())?;
    verify::run_verification(client, settings, progress)
}
