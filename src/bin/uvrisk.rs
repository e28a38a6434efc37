//! uvrisk - Command-line interface for Synheart UV
//!
//! Commands:
//! - assess: Adjusted UV index and risk assessment for a location
//! - forecast: Assess an hourly UV forecast and find exposure windows
//! - position: Sun or moon position on the time-correlated display
//! - daylight: Sunrise and sunset for a local date
//! - burn-time: Minutes to burn at an adjusted UV index

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_uv::celestial::{daylight_window, position, sun_position, CelestialPosition};
use synheart_uv::config::UvConfig;
use synheart_uv::pipeline::{assess_uv, UvProcessor};
use synheart_uv::timer::{time_to_burn_minutes_with, ManualClock};
use synheart_uv::types::{Location, UvForecastPoint};
use synheart_uv::{HeuristicEnvironmentSource, UvError, PRODUCER_NAME, UV_VERSION};

/// uvrisk - Sunburn risk and sun exposure engine
#[derive(Parser)]
#[command(name = "uvrisk")]
#[command(author = "Synheart AI Inc")]
#[command(version = UV_VERSION)]
#[command(about = "Estimate sunburn risk from UV index and environment", long_about = None)]
struct Cli {
    /// Log filter (e.g. "info", "synheart_uv=debug"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "json-pretty")]
    output_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Adjusted UV index and risk assessment for a location
    Assess {
        /// Base UV index from the weather source
        #[arg(long)]
        uv: u32,

        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Altitude in meters
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        altitude: f64,

        /// Cloud cover percentage
        #[arg(long, default_value = "0")]
        cloud: f64,

        /// Evaluate at this instant (RFC 3339) instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Use an environmental snapshot file instead of the built-in estimates
        #[arg(long)]
        environment: Option<PathBuf>,
    },

    /// Assess an hourly UV forecast and find exposure windows
    Forecast {
        /// Forecast file: JSON array of {"date", "uv_index"} (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Altitude in meters
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        altitude: f64,

        /// Cloud cover percentage
        #[arg(long, default_value = "0")]
        cloud: f64,
    },

    /// Sun or moon position on the time-correlated display
    Position {
        /// Body to place
        #[arg(value_enum, default_value = "sun")]
        body: Body,

        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Instant (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Sunrise and sunset for a local date
    Daylight {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Local date (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Offset of local time from UTC in seconds; defaults to the config value
        #[arg(long, allow_hyphen_values = true)]
        utc_offset: Option<i32>,
    },

    /// Minutes to burn at an adjusted UV index
    BurnTime {
        /// Adjusted UV index
        #[arg(long)]
        uv: u32,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum Body {
    Sun,
    Moon,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

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

/// Install a stderr subscriber; `--log-level` wins over `RUST_LOG`, default `warn`.
fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), UvCliError> {
    let config = match &cli.config {
        Some(path) => UvConfig::from_file(path)?,
        None => UvConfig::default(),
    };
    tracing::debug!(producer = PRODUCER_NAME, version = UV_VERSION, "starting");

    let output = match cli.command {
        Commands::Assess {
            uv,
            lat,
            lon,
            altitude,
            cloud,
            at,
            environment,
        } => cmd_assess(
            config,
            uv,
            Location::new(lat, lon),
            altitude,
            cloud,
            at,
            environment.as_deref(),
        )?,

        Commands::Forecast {
            input,
            lat,
            lon,
            altitude,
            cloud,
        } => cmd_forecast(config, &input, Location::new(lat, lon), altitude, cloud)?,

        Commands::Position { body, lat, lon, at } => cmd_position(body, lat, lon, at)?,

        Commands::Daylight {
            lat,
            lon,
            date,
            utc_offset,
        } => cmd_daylight(
            lat,
            lon,
            date,
            utc_offset.unwrap_or(config.timer.utc_offset_seconds),
        )?,

        Commands::BurnTime { uv } => cmd_burn_time(&config, uv)?,
    };

    println!("{}", format_output(&output, &cli.output_format)?);
    Ok(())
}

fn cmd_assess(
    config: UvConfig,
    uv: u32,
    location: Location,
    altitude: f64,
    cloud: f64,
    at: Option<DateTime<Utc>>,
    environment: Option<&Path>,
) -> Result<serde_json::Value, UvCliError> {
    if let Some(path) = environment {
        let environment_json = fs::read_to_string(path)?;
        let report = assess_uv(uv, environment_json)?;
        return Ok(serde_json::from_str(&report)?);
    }

    let clock = ManualClock::new(at.unwrap_or_else(Utc::now));
    let mut processor = UvProcessor::new(HeuristicEnvironmentSource::new(altitude), clock, config);
    let report = processor.assess(location, uv, cloud)?;
    Ok(serde_json::to_value(&report)?)
}

fn cmd_forecast(
    config: UvConfig,
    input: &Path,
    location: Location,
    altitude: f64,
    cloud: f64,
) -> Result<serde_json::Value, UvCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let points: Vec<UvForecastPoint> = serde_json::from_str(&input_data)
        .map_err(|e| UvCliError::ParseError(format!("Failed to parse forecast: {}", e)))?;
    if points.is_empty() {
        return Err(UvCliError::EmptyForecast);
    }

    // Evaluate the environment as of the first forecast hour.
    let start = points.iter().map(|p| p.date).min().unwrap_or_else(Utc::now);
    let clock = ManualClock::new(start);
    let mut processor = UvProcessor::new(HeuristicEnvironmentSource::new(altitude), clock, config);
    let report = processor.forecast(location, &points, cloud)?;
    Ok(serde_json::to_value(&report)?)
}

#[derive(Serialize)]
struct PositionOutput {
    body: &'static str,
    at: DateTime<Utc>,
    #[serde(flatten)]
    position: CelestialPosition,
    above_horizon: bool,
}

fn cmd_position(
    body: Body,
    lat: f64,
    lon: f64,
    at: Option<DateTime<Utc>>,
) -> Result<serde_json::Value, UvCliError> {
    check_location(lat, lon)?;
    let at = at.unwrap_or_else(Utc::now);
    let (name, placed) = match body {
        Body::Sun => ("sun", sun_position(&at, lat, lon)),
        Body::Moon => ("moon", position(&at, lat, lon)),
    };
    Ok(serde_json::to_value(PositionOutput {
        body: name,
        at,
        above_horizon: placed.is_above_horizon(),
        position: placed,
    })?)
}

#[derive(Serialize)]
struct DaylightOutput {
    date: NaiveDate,
    utc_offset_seconds: i32,
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
    daylight_minutes: Option<i64>,
}

fn cmd_daylight(
    lat: f64,
    lon: f64,
    date: Option<NaiveDate>,
    utc_offset_seconds: i32,
) -> Result<serde_json::Value, UvCliError> {
    check_location(lat, lon)?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let window = daylight_window(date, utc_offset_seconds, lat, lon);
    Ok(serde_json::to_value(DaylightOutput {
        date,
        utc_offset_seconds,
        sunrise: window.map(|w| w.sunrise),
        sunset: window.map(|w| w.sunset),
        daylight_minutes: window.map(|w| w.duration().num_minutes()),
    })?)
}

#[derive(Serialize)]
struct BurnTimeOutput {
    adjusted_uv_index: u32,
    /// `null` when there is no UV
    time_to_burn_minutes: Option<f64>,
}

fn cmd_burn_time(config: &UvConfig, uv: u32) -> Result<serde_json::Value, UvCliError> {
    let minutes = time_to_burn_minutes_with(config.timer.burn_reference_minutes, uv);
    Ok(serde_json::to_value(BurnTimeOutput {
        adjusted_uv_index: uv,
        time_to_burn_minutes: minutes.is_finite().then_some(minutes),
    })?)
}

fn check_location(lat: f64, lon: f64) -> Result<(), UvCliError> {
    if Location::new(lat, lon).is_valid() {
        Ok(())
    } else {
        Err(UvCliError::Uv(UvError::InvalidInput(format!(
            "location out of range: ({}, {})",
            lat, lon
        ))))
    }
}

fn format_output(value: &serde_json::Value, format: &OutputFormat) -> Result<String, UvCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum UvCliError {
    Io(io::Error),
    Uv(UvError),
    Json(serde_json::Error),
    EmptyForecast,
    ParseError(String),
}

impl From<io::Error> for UvCliError {
    fn from(e: io::Error) -> Self {
        UvCliError::Io(e)
    }
}

impl From<UvError> for UvCliError {
    fn from(e: UvError) -> Self {
        UvCliError::Uv(e)
    }
}

impl From<serde_json::Error> for UvCliError {
    fn from(e: serde_json::Error) -> Self {
        UvCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<UvCliError> for CliError {
    fn from(e: UvCliError) -> Self {
        match e {
            UvCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            UvCliError::Uv(UvError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check the --config file against the documented defaults".to_string()),
            },
            UvCliError::Uv(e) => CliError {
                code: "UV_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check coordinates and input files".to_string()),
            },
            UvCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            UvCliError::EmptyForecast => CliError {
                code: "EMPTY_FORECAST".to_string(),
                message: "No forecast points found in input".to_string(),
                hint: Some("Ensure input is a non-empty JSON array".to_string()),
            },
            UvCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some(
                    "Expected [{\"date\": \"<RFC 3339>\", \"uv_index\": <n>}, ...]".to_string(),
                ),
            },
        }
    }
}
