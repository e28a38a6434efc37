//! Pipeline orchestration
//!
//! This module provides the public API for Synheart UV: JSON in, JSON out.
//! The stateless functions compose a base UV index with a caller-supplied
//! environmental snapshot; [`UvProcessor`] additionally owns the provider
//! (and its snapshot cache) and the exposure timer.

use crate::composition::{compose_with_breakdown, MultiplierBreakdown};
use crate::config::UvConfig;
use crate::environment::{
    EnvironmentSource, EnvironmentalFactorProvider, HeuristicEnvironmentSource,
};
use crate::error::UvError;
use crate::forecast::{
    assess_forecast, high_risk_windows, low_risk_windows, peak_assessment, ExposureWindow,
    ForecastAssessment,
};
use crate::presentation::{risk_level_metadata, RiskLevelMetadata};
use crate::timer::{time_to_burn_minutes_with, Clock, ExposureTimer, SystemClock};
use crate::types::{EnvironmentalFactors, Location, RiskLevel, UvForecastPoint, UvRiskAssessment};
use crate::{PRODUCER_NAME, UV_VERSION};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Highest level still reported as a low-risk forecast window
pub const LOW_RISK_WINDOW_LEVEL: RiskLevel = RiskLevel::Moderate;

/// Producer metadata stamped on every report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

impl Producer {
    fn new(instance_id: &str) -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: UV_VERSION.to_string(),
            instance_id: instance_id.to_string(),
        }
    }
}

/// Point-in-time risk report
#[derive(Debug, Clone, Serialize)]
pub struct UvReport {
    pub producer: Producer,
    pub computed_at_utc: String,
    pub location: Location,
    pub assessment: UvRiskAssessment,
    pub breakdown: MultiplierBreakdown,
    /// `None` when there is no UV to burn from
    pub time_to_burn_minutes: Option<f64>,
    pub presentation: &'static RiskLevelMetadata,
}

/// Hourly forecast report
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub producer: Producer,
    pub computed_at_utc: String,
    pub location: Location,
    pub hours: Vec<ForecastAssessment>,
    pub peak: Option<ForecastAssessment>,
    pub low_risk_windows: Vec<ExposureWindow>,
    pub high_risk_windows: Vec<ExposureWindow>,
}

fn build_report(
    base_uv_index: u32,
    env: &EnvironmentalFactors,
    burn_reference_minutes: f64,
    instance_id: &str,
    computed_at: DateTime<Utc>,
) -> UvReport {
    let (assessment, breakdown) = compose_with_breakdown(base_uv_index, env);
    let minutes = time_to_burn_minutes_with(burn_reference_minutes, assessment.adjusted_uv_index);

    UvReport {
        producer: Producer::new(instance_id),
        computed_at_utc: computed_at.to_rfc3339(),
        location: env.location,
        breakdown,
        time_to_burn_minutes: minutes.is_finite().then_some(minutes),
        presentation: risk_level_metadata(assessment.risk_level),
        assessment,
    }
}

fn build_forecast_report(
    points: &[UvForecastPoint],
    env: &EnvironmentalFactors,
    instance_id: &str,
    computed_at: DateTime<Utc>,
) -> ForecastReport {
    // Stage 1: Assess each hour
    let hours = assess_forecast(points, env);

    // Stage 2: Summarize
    ForecastReport {
        producer: Producer::new(instance_id),
        computed_at_utc: computed_at.to_rfc3339(),
        location: env.location,
        peak: peak_assessment(&hours).cloned(),
        low_risk_windows: low_risk_windows(&hours, LOW_RISK_WINDOW_LEVEL),
        high_risk_windows: high_risk_windows(&hours),
        hours,
    }
}

fn parse_environment(environment_json: &str) -> Result<EnvironmentalFactors, UvError> {
    serde_json::from_str(environment_json).map_err(|e| UvError::ParseError(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<String, UvError> {
    serde_json::to_string(value).map_err(|e| UvError::EncodingError(e.to_string()))
}

/// Assess a base UV index against an environmental snapshot.
///
/// # Arguments
/// * `base_uv_index` - UV index reported by the weather source
/// * `environment_json` - Serialized [`EnvironmentalFactors`]
///
/// # Returns
/// A [`UvReport`] as JSON
///
/// # Example
/// ```ignore
/// let report = assess_uv(8, environment_json)?;
/// ```
pub fn assess_uv(base_uv_index: u32, environment_json: String) -> Result<String, UvError> {
    let env = parse_environment(&environment_json)?;
    let report = build_report(
        base_uv_index,
        &env,
        crate::config::DEFAULT_BURN_REFERENCE_MINUTES,
        &Uuid::new_v4().to_string(),
        Utc::now(),
    );
    encode(&report)
}

/// Assess an hourly forecast against an environmental snapshot.
///
/// # Arguments
/// * `forecast_json` - JSON array of `{ "date", "uv_index" }` points
/// * `environment_json` - Serialized [`EnvironmentalFactors`]
///
/// # Returns
/// A [`ForecastReport`] as JSON
pub fn assess_uv_forecast(
    forecast_json: String,
    environment_json: String,
) -> Result<String, UvError> {
    let points: Vec<UvForecastPoint> =
        serde_json::from_str(&forecast_json).map_err(|e| UvError::ParseError(e.to_string()))?;
    let env = parse_environment(&environment_json)?;
    let report = build_forecast_report(&points, &env, &Uuid::new_v4().to_string(), Utc::now());
    encode(&report)
}

/// Stateful processor owning the environmental provider and the exposure timer.
///
/// Use this when snapshots should be cached between calls and assessments
/// should drive the burn timer.
pub struct UvProcessor<
    S: EnvironmentSource = HeuristicEnvironmentSource,
    C: Clock + Clone = SystemClock,
> {
    provider: EnvironmentalFactorProvider<S>,
    timer: ExposureTimer<C>,
    clock: C,
    config: UvConfig,
    instance_id: String,
}

impl Default for UvProcessor {
    fn default() -> Self {
        Self::new(HeuristicEnvironmentSource::default(), SystemClock, UvConfig::default())
    }
}

impl<S: EnvironmentSource, C: Clock + Clone> UvProcessor<S, C> {
    pub fn new(source: S, clock: C, config: UvConfig) -> Self {
        Self {
            provider: EnvironmentalFactorProvider::new(source, &config.provider),
            timer: ExposureTimer::new(clock.clone(), config.timer.clone()),
            clock,
            config,
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Use a fixed instance id instead of a random one
    pub fn with_instance_id(mut self, instance_id: String) -> Self {
        self.instance_id = instance_id;
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn config(&self) -> &UvConfig {
        &self.config
    }

    pub fn provider(&self) -> &EnvironmentalFactorProvider<S> {
        &self.provider
    }

    pub fn timer(&self) -> &ExposureTimer<C> {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut ExposureTimer<C> {
        &mut self.timer
    }

    /// Current environmental snapshot for a location, with cloud cover applied
    pub fn environment(
        &mut self,
        location: Location,
        cloud_cover_pct: f64,
    ) -> Result<EnvironmentalFactors, UvError> {
        let now = self.clock.now();
        Ok(self.provider.fetch(location, now)?.with_cloud_cover(cloud_cover_pct))
    }

    /// Assess current conditions and feed the result to the timer.
    pub fn assess(
        &mut self,
        location: Location,
        base_uv_index: u32,
        cloud_cover_pct: f64,
    ) -> Result<UvReport, UvError> {
        let env = self.environment(location, cloud_cover_pct)?;
        let report = build_report(
            base_uv_index,
            &env,
            self.config.timer.burn_reference_minutes,
            &self.instance_id,
            self.clock.now(),
        );
        self.timer.apply_assessment(&report.assessment);
        Ok(report)
    }

    /// [`Self::assess`], serialized
    pub fn assess_json(
        &mut self,
        location: Location,
        base_uv_index: u32,
        cloud_cover_pct: f64,
    ) -> Result<String, UvError> {
        let report = self.assess(location, base_uv_index, cloud_cover_pct)?;
        encode(&report)
    }

    /// Assess an hourly forecast for a location. Does not touch the timer.
    pub fn forecast(
        &mut self,
        location: Location,
        points: &[UvForecastPoint],
        cloud_cover_pct: f64,
    ) -> Result<ForecastReport, UvError> {
        let env = self.environment(location, cloud_cover_pct)?;
        Ok(build_forecast_report(
            points,
            &env,
            &self.instance_id,
            self.clock.now(),
        ))
    }

    /// [`Self::forecast`] from and to JSON
    pub fn forecast_json(
        &mut self,
        location: Location,
        forecast_json: &str,
        cloud_cover_pct: f64,
    ) -> Result<String, UvError> {
        let points: Vec<UvForecastPoint> =
            serde_json::from_str(forecast_json).map_err(|e| UvError::ParseError(e.to_string()))?;
        let report = self.forecast(location, &points, cloud_cover_pct)?;
        encode(&report)
    }

    /// Save timer state to JSON
    pub fn save_state(&self) -> Result<String, UvError> {
        self.timer.save_state()
    }

    /// Load timer state from JSON
    pub fn load_state(&mut self, json: &str) -> Result<(), UvError> {
        self.timer.load_state(json)
    }
}
