/// Structured logging for the enrichment pipeline
///
/// Provides context-rich logging with component tags, optional row
/// context, timestamps and severity levels. Supports both console output
/// and an append-only log file for long batch runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::ingest::ProviderError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl LogLevel {
    /// Parse a level name from configuration. Unknown names fall back to Info.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Input,
    Marine,
    Output,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Input => write!(f, "INPUT"),
            Component::Marine => write!(f, "MARINE"),
            Component::Output => write!(f, "OUTPUT"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

/// How a marine service failure is logged.
///
/// A query the service answers with no data never reaches here; it comes
/// back as an empty subset rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Unexpected failure - credentials, connectivity or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: Component, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, component, context_part, message
        );

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, context_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG]{} {}", context_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, component: Component, context: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, context, message);
        }
    }
}

pub fn info(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, context, message);
}

pub fn warn(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, context, message);
}

pub fn error(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, context, message);
}

pub fn debug(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, context, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a marine data service failure
pub fn classify_provider_failure(err: &ProviderError) -> FailureType {
    match err {
        // Authentication and routing problems won't fix themselves row by row
        ProviderError::Http { status: 401 | 403 | 404, .. } => FailureType::Unexpected,
        ProviderError::Http { status, .. } if *status >= 500 => FailureType::Unknown,
        ProviderError::Http { .. } => FailureType::Unexpected,
        ProviderError::Transport(msg) if msg.contains("timed out") => FailureType::Unknown,
        ProviderError::Transport(_) => FailureType::Unexpected,
        // Parse errors suggest API changes
        ProviderError::Parse(_) | ProviderError::MissingColumn(_) => FailureType::Unexpected,
        ProviderError::InvalidUrl(_) => FailureType::Unexpected,
    }
}

/// Log a marine data failure with automatic classification
pub fn log_provider_failure(context: &str, operation: &str, err: &ProviderError) {
    let failure_type = classify_provider_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Unexpected => error(Component::Marine, Some(context), &message),
        FailureType::Unknown => warn(Component::Marine, Some(context), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a pipeline run
pub fn log_run_summary(total: usize, processed: usize, skipped: usize) {
    let message = format!(
        "Run complete: {}/{} rows enriched, {} skipped",
        processed, total, skipped
    );

    if skipped == 0 {
        info(Component::System, None, &message);
    } else if processed == 0 {
        error(Component::System, None, &message);
    } else {
        warn(Component::System, None, &message);
    }
}
