//! Vitals CLI - Command-line interface for the resampling engine
//!
//! Commands:
//! - intraday: Resample one metric over an intraday window
//! - daily: Aggregate heart-rate zones per calendar day
//! - interval: Normalize an interval token
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitals_resample::schema::{DailyHeartRateRequest, IntradayRequest, ValidationError};
use vitals_resample::types::MetricType;
use vitals_resample::{
    ComputeError, EngineConfig, IntervalNormalizer, SeriesEncoder, SeriesProcessor,
    ENGINE_VERSION, PRODUCER_NAME, SCHEMA_VERSION,
};

/// Vitals - resampling and heart-rate zone engine for activity time series
#[derive(Parser)]
#[command(name = "vitals")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Re-bin activity and heart-rate series to coarser intervals", long_about = None)]
struct Cli {
    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resample one metric over an intraday window
    Intraday {
        /// Request file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the payload
        #[arg(long)]
        pretty: bool,
    },

    /// Aggregate heart-rate zones per calendar day
    Daily {
        /// Request file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the payload
        #[arg(long)]
        pretty: bool,
    },

    /// Normalize an interval token for a metric
    Interval {
        /// Interval token, e.g. 1m, 15s, 10h
        token: String,

        /// Metric the interval applies to
        #[arg(long, value_enum, default_value = "steps")]
        metric: MetricArg,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Steps,
    Calories,
    Distance,
    ActiveMinutes,
    HeartRate,
}

impl From<MetricArg> for MetricType {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Steps => MetricType::Steps,
            MetricArg::Calories => MetricType::Calories,
            MetricArg::Distance => MetricType::Distance,
            MetricArg::ActiveMinutes => MetricType::ActiveMinutes,
            MetricArg::HeartRate => MetricType::HeartRate,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing/logging on stderr so stdout stays machine-readable
fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vitals_resample=info,vitals=info".into());

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<(), VitalsCliError> {
    match cli.command {
        Commands::Intraday {
            input,
            output,
            config,
            pretty,
        } => cmd_intraday(&input, &output, config.as_deref(), pretty),

        Commands::Daily {
            input,
            output,
            config,
            pretty,
        } => cmd_daily(&input, &output, config.as_deref(), pretty),

        Commands::Interval { token, metric } => cmd_interval(&token, metric.into()),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_intraday(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), VitalsCliError> {
    let processor = build_processor(config)?;
    let request: IntradayRequest = serde_json::from_str(&read_input(input)?)?;

    let result = processor.intraday(&request)?;
    info!(
        metric = %result.metric,
        interval = %result.interval,
        buckets = result.buckets.len(),
        "intraday series resampled"
    );

    let payload = encoder(pretty).intraday_to_json(&result)?;
    write_output(output, &payload)
}

fn cmd_daily(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    pretty: bool,
) -> Result<(), VitalsCliError> {
    let processor = build_processor(config)?;
    let request: DailyHeartRateRequest = serde_json::from_str(&read_input(input)?)?;

    let series = processor.daily_heart_rate(&request)?;
    info!(
        start_date = %series.start_date,
        end_date = %series.end_date,
        days = series.days.len(),
        "daily heart-rate series aggregated"
    );

    let payload = encoder(pretty).daily_to_json(&series)?;
    write_output(output, &payload)
}

fn cmd_interval(token: &str, metric: MetricType) -> Result<(), VitalsCliError> {
    let spec = IntervalNormalizer::normalize(token, metric)?;
    println!("{spec}");
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), VitalsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Request schema: {}", SCHEMA_VERSION),
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match EngineConfig::from_json(&content) {
                    Ok(parsed) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (trailing_gap: {:?}, zone_duration_millis: {})",
                            parsed.trailing_gap, parsed.zone_duration_millis
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config JSON: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                },
            }
        };
        checks.push(check);
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass requests with --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitals Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitalsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn build_processor(config: Option<&Path>) -> Result<SeriesProcessor, VitalsCliError> {
    let config = match config {
        Some(path) => {
            debug!(path = %path.display(), "loading engine config");
            EngineConfig::from_json(&fs::read_to_string(path)?)?
        }
        None => EngineConfig::default(),
    };
    Ok(SeriesProcessor::with_config(config))
}

fn encoder(pretty: bool) -> SeriesEncoder {
    if pretty {
        SeriesEncoder::pretty()
    } else {
        SeriesEncoder::new()
    }
}

fn read_input(input: &Path) -> Result<String, VitalsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, payload: &str) -> Result<(), VitalsCliError> {
    if output.to_string_lossy() == "-" {
        println!("{}", payload);
    } else {
        fs::write(output, payload)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<ComputeError> for VitalsCliError {
    fn from(e: ComputeError) -> Self {
        VitalsCliError::Compute(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidInterval(_) => (
                        "INVALID_INTERVAL",
                        "Use 1s, 15s, 1m, 15m, or a whole number of hours such as 1h",
                    ),
                    ComputeError::EmptyWindow { .. } => {
                        ("EMPTY_WINDOW", "The window start must be before its end")
                    }
                    ComputeError::MissingZoneDefinition(_) => (
                        "MISSING_ZONES",
                        "Heart-rate requests need zone boundaries",
                    ),
                    ComputeError::DateParseError(_) => {
                        ("DATE_PARSE_ERROR", "Dates are YYYY-MM-DD, times HH:mm or HH:mm:ss")
                    }
                    ComputeError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    ComputeError::InvalidRequest(ValidationError::UnsortedSamples { .. }) => (
                        "VALIDATION_ERROR",
                        "Sort samples by ascending timestamp",
                    ),
                    ComputeError::InvalidRequest(_) => (
                        "VALIDATION_ERROR",
                        "Ensure the request matches vitals.series_request.v1",
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
