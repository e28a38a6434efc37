//! Core types for the Synheart UV engine
//!
//! This module defines the data structures that flow from the environmental
//! provider into the composition engine and out to callers: environmental
//! snapshots, their sub-conditions, and the resulting risk assessment.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lowest altitude accepted at the provider boundary (meters)
pub const MIN_ALTITUDE_METERS: f64 = -500.0;

/// Highest altitude accepted at the provider boundary (meters)
pub const MAX_ALTITUDE_METERS: f64 = 9000.0;

/// Distance reported when no water body is known (meters)
pub const UNKNOWN_WATER_DISTANCE_METERS: f64 = 1_000_000.0;

/// Geographic location in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Key used to share snapshots between nearby lookups (~100 m grid)
    pub fn cache_key(&self) -> (i64, i64) {
        (
            (self.latitude * 1000.0).round() as i64,
            (self.longitude * 1000.0).round() as i64,
        )
    }

    /// Whether the coordinates are finite and within geographic range
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Snow surface classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnowType {
    #[default]
    None,
    Fresh,
    Packed,
    Melting,
    Icy,
}

impl SnowType {
    /// Fraction of incident UV reflected back toward the observer
    pub fn reflection_factor(&self) -> f64 {
        match self {
            SnowType::None => 0.0,
            SnowType::Fresh => 0.85,
            SnowType::Packed => 0.60,
            SnowType::Icy => 0.50,
            SnowType::Melting => 0.40,
        }
    }

    /// Classify snow from its depth, age and (optional) air temperature.
    pub fn classify(depth_cm: f64, age_days: f64, temperature_c: Option<f64>) -> Self {
        if !depth_cm.is_finite() || depth_cm <= 0.0 {
            return SnowType::None;
        }
        let age = if age_days.is_finite() { age_days.max(0.0) } else { 0.0 };

        match temperature_c {
            Some(t) if t > 0.0 && age > 1.0 => SnowType::Melting,
            Some(t) if t < -5.0 && age > 7.0 => SnowType::Icy,
            _ if age <= 2.0 => SnowType::Fresh,
            _ => SnowType::Packed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SnowType::None => "none",
            SnowType::Fresh => "fresh",
            SnowType::Packed => "packed",
            SnowType::Melting => "melting",
            SnowType::Icy => "icy",
        }
    }
}

/// Snow cover at the observer's location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowConditions {
    pub has_recent_snowfall: bool,
    pub snow_depth_cm: f64,
    /// Ground coverage percentage (0-100)
    pub snow_coverage_pct: f64,
    pub snow_age_days: f64,
    pub snow_type: SnowType,
}

impl Default for SnowConditions {
    fn default() -> Self {
        Self::none()
    }
}

impl SnowConditions {
    /// No snow on the ground
    pub fn none() -> Self {
        Self {
            has_recent_snowfall: false,
            snow_depth_cm: 0.0,
            snow_coverage_pct: 0.0,
            snow_age_days: 0.0,
            snow_type: SnowType::None,
        }
    }

    /// Build conditions from raw measurements, deriving the snow type.
    pub fn from_measurements(
        depth_cm: f64,
        coverage_pct: f64,
        age_days: f64,
        temperature_c: Option<f64>,
    ) -> Self {
        Self {
            has_recent_snowfall: age_days.is_finite() && age_days <= 2.0 && depth_cm > 0.0,
            snow_depth_cm: depth_cm,
            snow_coverage_pct: coverage_pct,
            snow_age_days: age_days,
            snow_type: SnowType::classify(depth_cm, age_days, temperature_c),
        }
        .normalized()
    }

    /// Enforce that coverage is only reported for an actual snow surface.
    pub fn normalized(mut self) -> Self {
        if !self.snow_coverage_pct.is_finite() {
            self.snow_coverage_pct = 0.0;
        }
        self.snow_coverage_pct = self.snow_coverage_pct.clamp(0.0, 100.0);
        if self.snow_type == SnowType::None {
            self.snow_coverage_pct = 0.0;
            self.has_recent_snowfall = false;
        }
        self
    }
}

/// Kind of water body near the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterBodyType {
    #[default]
    None,
    Ocean,
    Sea,
    Lake,
    Reservoir,
    River,
    Pond,
}

impl WaterBodyType {
    pub fn reflection_factor(&self) -> f64 {
        match self {
            WaterBodyType::None => 0.0,
            WaterBodyType::Ocean => 0.25,
            WaterBodyType::Sea => 0.20,
            WaterBodyType::Lake => 0.10,
            WaterBodyType::Reservoir => 0.10,
            WaterBodyType::River => 0.08,
            WaterBodyType::Pond => 0.05,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WaterBodyType::None => "none",
            WaterBodyType::Ocean => "ocean",
            WaterBodyType::Sea => "sea",
            WaterBodyType::Lake => "lake",
            WaterBodyType::Reservoir => "reservoir",
            WaterBodyType::River => "river",
            WaterBodyType::Pond => "pond",
        }
    }
}

/// Rough surface extent of a water body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterBodySize {
    Small,
    Medium,
    Large,
    Massive,
}

impl WaterBodySize {
    pub fn multiplier(&self) -> f64 {
        match self {
            WaterBodySize::Small => 0.5,
            WaterBodySize::Medium => 0.8,
            WaterBodySize::Large => 1.0,
            WaterBodySize::Massive => 1.2,
        }
    }
}

/// A named water body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterBody {
    pub name: String,
    pub body_type: WaterBodyType,
    pub size: WaterBodySize,
    pub coordinates: Location,
}

/// Proximity of the observer to reflective water
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterProximity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_water_body: Option<WaterBody>,
    pub distance_to_water_meters: f64,
    pub water_body_type: WaterBodyType,
    pub is_coastal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coastal_distance_meters: Option<f64>,
}

impl Default for WaterProximity {
    fn default() -> Self {
        Self::none()
    }
}

impl WaterProximity {
    /// No known water nearby
    pub fn none() -> Self {
        Self {
            nearest_water_body: None,
            distance_to_water_meters: UNKNOWN_WATER_DISTANCE_METERS,
            water_body_type: WaterBodyType::None,
            is_coastal: false,
            coastal_distance_meters: None,
        }
    }

    /// Proximity to a known water body at the given distance
    pub fn near(body: WaterBody, distance_meters: f64) -> Self {
        let is_coastal = matches!(body.body_type, WaterBodyType::Ocean | WaterBodyType::Sea);
        Self {
            water_body_type: body.body_type,
            nearest_water_body: Some(body),
            distance_to_water_meters: distance_meters,
            is_coastal,
            coastal_distance_meters: if is_coastal { Some(distance_meters) } else { None },
        }
    }

    /// Size multiplier of the nearest body, 1.0 when the body is unknown
    pub fn size_multiplier(&self) -> f64 {
        self.nearest_water_body
            .as_ref()
            .map(|b| b.size.multiplier())
            .unwrap_or(1.0)
    }
}

/// Terrain classification of the observer's surroundings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    #[default]
    Unknown,
    Coastal,
    Mountainous,
    Urban,
    Rural,
    Desert,
    Forest,
    Grassland,
    Arctic,
}

impl TerrainType {
    pub fn base_multiplier(&self) -> f64 {
        match self {
            TerrainType::Unknown => 1.00,
            TerrainType::Coastal => 1.05,
            TerrainType::Mountainous => 1.10,
            TerrainType::Urban => 0.95,
            TerrainType::Rural => 1.00,
            TerrainType::Desert => 1.10,
            TerrainType::Forest => 0.85,
            TerrainType::Grassland => 1.00,
            TerrainType::Arctic => 1.05,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerrainType::Unknown => "unknown",
            TerrainType::Coastal => "coastal",
            TerrainType::Mountainous => "mountainous",
            TerrainType::Urban => "urban",
            TerrainType::Rural => "rural",
            TerrainType::Desert => "desert",
            TerrainType::Forest => "forest",
            TerrainType::Grassland => "grassland",
            TerrainType::Arctic => "arctic",
        }
    }
}

/// Meteorological season in the observer's hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
    #[default]
    Unknown,
}

impl Season {
    pub fn base_multiplier(&self) -> f64 {
        match self {
            Season::Winter => 0.70,
            Season::Spring => 0.90,
            Season::Summer => 1.10,
            Season::Autumn => 0.85,
            Season::Unknown => 1.00,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Unknown => "unknown",
        }
    }
}

/// Seasonal context for a date and hemisphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalFactors {
    pub season: Season,
    /// Day of year (1-366)
    pub day_of_year: u32,
    pub is_winter_solstice: bool,
    pub is_summer_solstice: bool,
    pub is_equinox: bool,
    pub seasonal_uv_multiplier: f64,
}

impl Default for SeasonalFactors {
    fn default() -> Self {
        Self {
            season: Season::Unknown,
            day_of_year: 1,
            is_winter_solstice: false,
            is_summer_solstice: false,
            is_equinox: false,
            seasonal_uv_multiplier: 1.0,
        }
    }
}

/// Immutable environmental snapshot consumed by the composition engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalFactors {
    pub location: Location,
    pub altitude_meters: f64,
    #[serde(default)]
    pub snow_conditions: SnowConditions,
    #[serde(default)]
    pub water_proximity: WaterProximity,
    #[serde(default)]
    pub terrain_type: TerrainType,
    #[serde(default)]
    pub seasonal_factors: SeasonalFactors,
    /// Cloud cover from the weather source (0-100)
    #[serde(default)]
    pub cloud_cover_pct: f64,
    /// When this snapshot was assembled
    pub fetched_at: DateTime<Utc>,
}

impl EnvironmentalFactors {
    /// Snapshot in which every factor is neutral (multiplier 1.0, additive 0)
    pub fn neutral(location: Location, fetched_at: DateTime<Utc>) -> Self {
        Self {
            location,
            altitude_meters: 0.0,
            snow_conditions: SnowConditions::none(),
            water_proximity: WaterProximity::none(),
            terrain_type: TerrainType::Unknown,
            seasonal_factors: SeasonalFactors::default(),
            cloud_cover_pct: 0.0,
            fetched_at,
        }
    }

    /// Copy of this snapshot with the weather source's cloud cover applied
    pub fn with_cloud_cover(&self, cloud_cover_pct: f64) -> Self {
        Self {
            cloud_cover_pct,
            ..self.clone()
        }
    }

    /// Whether the snapshot has outlived the given time-to-live
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at >= ttl
    }
}

/// UV risk category (standard WHO bands)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl RiskLevel {
    /// Bucket an adjusted UV index
    pub fn from_uv_index(uv_index: u32) -> Self {
        match uv_index {
            0..=2 => RiskLevel::Low,
            3..=5 => RiskLevel::Moderate,
            6..=7 => RiskLevel::High,
            8..=10 => RiskLevel::VeryHigh,
            _ => RiskLevel::Extreme,
        }
    }

    /// Fixed weight of the bucket (0-1)
    pub fn score(&self) -> f64 {
        match self {
            RiskLevel::Low => 0.1,
            RiskLevel::Moderate => 0.3,
            RiskLevel::High => 0.6,
            RiskLevel::VeryHigh => 0.8,
            RiskLevel::Extreme => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
            RiskLevel::Extreme => "extreme",
        }
    }
}

/// Sub-factor that contributed to an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorType {
    Altitude,
    Terrain,
    Cloud,
    Snow,
    Water,
    Season,
}

/// A contributing factor with its own severity and mitigation advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor_type: RiskFactorType,
    pub severity: RiskLevel,
    pub description: String,
    pub mitigation: String,
}

/// Result of composing a base UV index with an environmental snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvRiskAssessment {
    pub base_uv_index: u32,
    pub adjusted_uv_index: u32,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
}

/// One hour of a weather source's UV forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UvForecastPoint {
    pub date: DateTime<Utc>,
    pub uv_index: u32,
}
