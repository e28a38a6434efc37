//! Synheart UV - On-device compute engine for sunburn risk and sun exposure
//!
//! Turns a raw UV index plus environmental modifiers (altitude, cloud cover,
//! snow, water, terrain, season) into an adjusted UV index and risk
//! assessment, tracks cumulative exposure against a burn threshold, and
//! places the sun and moon on a time-correlated display.
//!
//! ## Modules
//!
//! - **Composition**: multiplier/additive engine producing [`UvRiskAssessment`]s
//! - **Environment**: validated, cached environmental snapshots from an [`EnvironmentSource`]
//! - **Timer**: exposure timer state machine with sunscreen reminders
//! - **Celestial**: simplified sun/moon positions and daylight windows
//! - **Cache**: bounded least-recently-used cache

pub mod cache;
pub mod celestial;
pub mod composition;
pub mod config;
pub mod environment;
pub mod error;
pub mod forecast;
pub mod pipeline;
pub mod presentation;
pub mod timer;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use cache::BoundedRecencyCache;
pub use celestial::{daylight_window, position, sun_position, CelestialPosition, DaylightWindow};
pub use composition::{compose, compose_breakdown, compose_with_breakdown, MultiplierBreakdown};
pub use config::UvConfig;
pub use environment::{
    EnvironmentSource, EnvironmentalFactorProvider, FixtureEnvironmentSource,
    HeuristicEnvironmentSource,
};
pub use error::UvError;
pub use forecast::{ExposureWindow, ForecastAssessment};
pub use pipeline::{assess_uv, assess_uv_forecast, UvProcessor};
pub use presentation::risk_level_metadata;
pub use timer::{
    time_to_burn_minutes, Clock, ExposureTimer, ManualClock, SystemClock, TimerEvent, TimerPhase,
    TimerState, TransitionError,
};
pub use types::{EnvironmentalFactors, Location, RiskLevel, UvForecastPoint, UvRiskAssessment};

/// Library version embedded in all reports
pub const UV_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "synheart-uv";
