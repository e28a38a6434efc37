//! Multiplier composition
//!
//! This module turns a base UV index and an environmental snapshot into an
//! adjusted UV index and a risk assessment.
//!
//! Direct-beam modifiers (altitude, terrain, cloud, season) scale the base
//! index multiplicatively. Surface reflections (snow, water) add photons on
//! top, computed from the unmodified base index.

use crate::types::{
    EnvironmentalFactors, RiskFactor, RiskFactorType, RiskLevel, Season, SeasonalFactors,
    TerrainType, UvRiskAssessment, MAX_ALTITUDE_METERS, MIN_ALTITUDE_METERS,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// UV gain per 1000 m of altitude
pub const ALTITUDE_GAIN_PER_KM: f64 = 0.1;

/// Water farther than this contributes no reflection (meters)
pub const WATER_REFLECTION_RANGE_METERS: f64 = 1000.0;

/// Lower bound on the distance falloff for water within range
const MIN_WATER_PROXIMITY_FACTOR: f64 = 0.1;

const TERRAIN_MULT_RANGE: (f64, f64) = (0.5, 2.0);
const SEASONAL_MULT_RANGE: (f64, f64) = (0.5, 1.5);

/// Cloud cover bands: (lower bound inclusive, factor)
const CLOUD_BANDS: [(f64, f64); 6] = [
    (90.0, 0.30),
    (75.0, 0.50),
    (50.0, 0.70),
    (25.0, 0.85),
    (10.0, 0.95),
    (0.0, 1.00),
];

/// Every intermediate factor of a composition, for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierBreakdown {
    pub altitude_multiplier: f64,
    pub terrain_multiplier: f64,
    pub cloud_factor: f64,
    pub seasonal_multiplier: f64,
    /// Product of the four direct-beam factors
    pub combined_multiplier: f64,
    pub snow_additive: u32,
    pub water_additive: u32,
    pub adjusted_uv_index: u32,
}

/// Altitude multiplier: +10% per 1000 m, altitude clamped to the provider bounds.
pub fn altitude_multiplier(altitude_meters: f64) -> f64 {
    let altitude = if altitude_meters.is_finite() {
        altitude_meters.clamp(MIN_ALTITUDE_METERS, MAX_ALTITUDE_METERS)
    } else {
        0.0
    };
    1.0 + (altitude / 1000.0) * ALTITUDE_GAIN_PER_KM
}

/// Terrain multiplier with mountain and arctic compounding.
pub fn terrain_multiplier(terrain: TerrainType, altitude_meters: f64) -> f64 {
    let mut multiplier = terrain.base_multiplier();
    match terrain {
        TerrainType::Mountainous if altitude_meters > 2000.0 => multiplier *= 1.10,
        TerrainType::Arctic => multiplier *= 1.20,
        _ => {}
    }
    multiplier.clamp(TERRAIN_MULT_RANGE.0, TERRAIN_MULT_RANGE.1)
}

/// Step function of cloud cover percentage.
pub fn cloud_factor(cloud_cover_pct: f64) -> f64 {
    let cover = if cloud_cover_pct.is_finite() {
        cloud_cover_pct.clamp(0.0, 100.0)
    } else {
        0.0
    };
    CLOUD_BANDS
        .iter()
        .find(|(lower, _)| cover >= *lower)
        .map(|(_, factor)| *factor)
        .unwrap_or(1.0)
}

/// Seasonal multiplier from season, solstice/equinox flags and day of year.
pub fn seasonal_multiplier(
    season: Season,
    day_of_year: u32,
    is_summer_solstice: bool,
    is_winter_solstice: bool,
    is_equinox: bool,
) -> f64 {
    let event_adjustment = if is_summer_solstice {
        1.20
    } else if is_winter_solstice {
        0.80
    } else if is_equinox {
        1.10
    } else {
        1.0
    };
    let day = day_of_year.clamp(1, 366) as f64;
    let smooth = 1.0 + 0.1 * (2.0 * PI * day / 365.0).sin();

    (season.base_multiplier() * event_adjustment * smooth)
        .clamp(SEASONAL_MULT_RANGE.0, SEASONAL_MULT_RANGE.1)
}

/// Seasonal multiplier for a set of seasonal factors.
pub fn seasonal_multiplier_for(factors: &SeasonalFactors) -> f64 {
    seasonal_multiplier(
        factors.season,
        factors.day_of_year,
        factors.is_summer_solstice,
        factors.is_winter_solstice,
        factors.is_equinox,
    )
}

/// Effective snow reflectance (reflection factor weighted by coverage)
fn snow_reflectance(env: &EnvironmentalFactors) -> f64 {
    let snow = &env.snow_conditions;
    let coverage = if snow.snow_coverage_pct.is_finite() {
        snow.snow_coverage_pct.clamp(0.0, 100.0)
    } else {
        0.0
    };
    snow.snow_type.reflection_factor() * coverage / 100.0
}

/// Effective water reflectance (type, size and distance falloff)
fn water_reflectance(env: &EnvironmentalFactors) -> f64 {
    let water = &env.water_proximity;
    let distance = water.distance_to_water_meters;
    if !distance.is_finite() || distance >= WATER_REFLECTION_RANGE_METERS {
        return 0.0;
    }
    let proximity = (1.0 - distance.max(0.0) / WATER_REFLECTION_RANGE_METERS)
        .max(MIN_WATER_PROXIMITY_FACTOR);
    water.water_body_type.reflection_factor() * water.size_multiplier() * proximity
}

/// Snow reflection contribution, in whole UV index points.
pub fn snow_additive(base_uv_index: u32, env: &EnvironmentalFactors) -> u32 {
    (base_uv_index as f64 * snow_reflectance(env)).round() as u32
}

/// Water reflection contribution, in whole UV index points.
pub fn water_additive(base_uv_index: u32, env: &EnvironmentalFactors) -> u32 {
    (base_uv_index as f64 * water_reflectance(env)).round() as u32
}

/// Stored seasonal multiplier, neutralised when missing or out of range
fn stored_seasonal_multiplier(factors: &SeasonalFactors) -> f64 {
    let stored = factors.seasonal_uv_multiplier;
    if stored.is_finite() && stored > 0.0 {
        stored.clamp(SEASONAL_MULT_RANGE.0, SEASONAL_MULT_RANGE.1)
    } else {
        1.0
    }
}

/// Compute every factor of a composition.
pub fn compose_breakdown(base_uv_index: u32, env: &EnvironmentalFactors) -> MultiplierBreakdown {
    let altitude_multiplier = altitude_multiplier(env.altitude_meters);
    let terrain_multiplier = terrain_multiplier(env.terrain_type, env.altitude_meters);
    let cloud_factor = cloud_factor(env.cloud_cover_pct);
    let seasonal_multiplier = stored_seasonal_multiplier(&env.seasonal_factors);
    let combined_multiplier =
        altitude_multiplier * terrain_multiplier * cloud_factor * seasonal_multiplier;

    // No UV present: nothing to amplify or reflect.
    if base_uv_index == 0 {
        return MultiplierBreakdown {
            altitude_multiplier,
            terrain_multiplier,
            cloud_factor,
            seasonal_multiplier,
            combined_multiplier,
            snow_additive: 0,
            water_additive: 0,
            adjusted_uv_index: 0,
        };
    }

    let snow_additive = snow_additive(base_uv_index, env);
    let water_additive = water_additive(base_uv_index, env);
    let direct = (base_uv_index as f64 * combined_multiplier).round().max(0.0) as u32;
    // Saturates at u32::MAX for out-of-range readings.
    let adjusted_uv_index = direct
        .saturating_add(snow_additive)
        .saturating_add(water_additive);

    tracing::debug!(
        base_uv_index,
        combined_multiplier,
        snow_additive,
        water_additive,
        adjusted_uv_index,
        "composed uv index"
    );

    MultiplierBreakdown {
        altitude_multiplier,
        terrain_multiplier,
        cloud_factor,
        seasonal_multiplier,
        combined_multiplier,
        snow_additive,
        water_additive,
        adjusted_uv_index,
    }
}

/// Compose a base UV index with an environmental snapshot into an assessment.
///
/// Never fails: invalid or missing fields are neutralised.
pub fn compose(base_uv_index: u32, env: &EnvironmentalFactors) -> UvRiskAssessment {
    compose_with_breakdown(base_uv_index, env).0
}

/// [`compose`], also returning the breakdown the assessment was built from.
pub fn compose_with_breakdown(
    base_uv_index: u32,
    env: &EnvironmentalFactors,
) -> (UvRiskAssessment, MultiplierBreakdown) {
    let breakdown = compose_breakdown(base_uv_index, env);
    let risk_level = RiskLevel::from_uv_index(breakdown.adjusted_uv_index);

    let assessment = UvRiskAssessment {
        base_uv_index,
        adjusted_uv_index: breakdown.adjusted_uv_index,
        risk_score: risk_level.score(),
        risk_level,
        risk_factors: risk_factors(base_uv_index, env, &breakdown),
    };
    (assessment, breakdown)
}

/// Evaluate each sub-factor and keep those of at least moderate severity.
fn risk_factors(
    base_uv_index: u32,
    env: &EnvironmentalFactors,
    breakdown: &MultiplierBreakdown,
) -> Vec<RiskFactor> {
    let candidates = [
        altitude_factor(env.altitude_meters),
        terrain_factor(env.terrain_type, breakdown.terrain_multiplier),
        cloud_risk_factor(base_uv_index, breakdown.cloud_factor),
        snow_factor(env),
        water_factor(env),
        season_factor(&env.seasonal_factors, breakdown.seasonal_multiplier),
    ];

    candidates
        .into_iter()
        .filter(|f| f.severity >= RiskLevel::Moderate)
        .collect()
}

fn altitude_severity(altitude_meters: f64) -> RiskLevel {
    match altitude_meters {
        a if a >= 4500.0 => RiskLevel::Extreme,
        a if a >= 3000.0 => RiskLevel::VeryHigh,
        a if a >= 2000.0 => RiskLevel::High,
        a if a >= 1000.0 => RiskLevel::Moderate,
        _ => RiskLevel::Low,
    }
}

fn altitude_factor(altitude_meters: f64) -> RiskFactor {
    let gain_pct = (altitude_multiplier(altitude_meters) - 1.0) * 100.0;
    RiskFactor {
        factor_type: RiskFactorType::Altitude,
        severity: altitude_severity(altitude_meters),
        description: format!(
            "Altitude of {:.0} m raises UV by about {:.0}%",
            altitude_meters, gain_pct
        ),
        mitigation: "Thinner air filters less UV; use SPF 50+ and reapply more often at altitude"
            .to_string(),
    }
}

fn terrain_factor(terrain: TerrainType, multiplier: f64) -> RiskFactor {
    let severity = if multiplier >= 1.2 {
        RiskLevel::High
    } else if multiplier >= 1.1 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };
    RiskFactor {
        factor_type: RiskFactorType::Terrain,
        severity,
        description: format!(
            "{} terrain scales UV by {:.2}x",
            capitalize(terrain.as_str()),
            multiplier
        ),
        mitigation: "Seek shade where available and wear UV-blocking sunglasses".to_string(),
    }
}

fn cloud_risk_factor(base_uv_index: u32, factor: f64) -> RiskFactor {
    // Clear skies only matter when the sun is already strong.
    let severity = if factor >= 1.0 && base_uv_index >= 8 {
        RiskLevel::High
    } else if factor >= 0.85 && base_uv_index >= 6 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };
    let blocked_pct = (1.0 - factor) * 100.0;
    RiskFactor {
        factor_type: RiskFactorType::Cloud,
        severity,
        description: format!("Cloud cover blocks about {:.0}% of UV", blocked_pct),
        mitigation: "Light cloud gives little protection; do not skip sunscreen on hazy days"
            .to_string(),
    }
}

fn snow_factor(env: &EnvironmentalFactors) -> RiskFactor {
    let reflectance = snow_reflectance(env);
    let severity = match reflectance {
        r if r >= 0.6 => RiskLevel::VeryHigh,
        r if r >= 0.4 => RiskLevel::High,
        r if r >= 0.2 => RiskLevel::Moderate,
        _ => RiskLevel::Low,
    };
    RiskFactor {
        factor_type: RiskFactorType::Snow,
        severity,
        description: format!(
            "{} snow reflects about {:.0}% of UV back at you",
            capitalize(env.snow_conditions.snow_type.as_str()),
            reflectance * 100.0
        ),
        mitigation: "Wear wraparound goggles and cover the underside of the chin and nose"
            .to_string(),
    }
}

fn water_factor(env: &EnvironmentalFactors) -> RiskFactor {
    let reflectance = water_reflectance(env);
    let severity = match reflectance {
        r if r >= 0.2 => RiskLevel::High,
        r if r >= 0.1 => RiskLevel::Moderate,
        _ => RiskLevel::Low,
    };
    RiskFactor {
        factor_type: RiskFactorType::Water,
        severity,
        description: format!(
            "Nearby {} reflects about {:.0}% of UV",
            env.water_proximity.water_body_type.as_str(),
            reflectance * 100.0
        ),
        mitigation: "Use water-resistant sunscreen and reapply after swimming".to_string(),
    }
}

fn season_factor(factors: &SeasonalFactors, multiplier: f64) -> RiskFactor {
    let severity = if multiplier >= 1.2 {
        RiskLevel::High
    } else if multiplier >= 1.05 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };
    RiskFactor {
        factor_type: RiskFactorType::Season,
        severity,
        description: format!(
            "{} sun angle scales UV by {:.2}x",
            capitalize(factors.season.as_str()),
            multiplier
        ),
        mitigation: "Plan outdoor time before 10:00 or after 16:00 when the sun is high"
            .to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Location, SnowConditions, SnowType, WaterBody, WaterBodySize, WaterBodyType,
        WaterProximity,
    };
    use chrono::{TimeZone, Utc};

    fn rural_env(altitude_meters: f64) -> EnvironmentalFactors {
        let mut env = EnvironmentalFactors::neutral(
            Location::new(46.0, 8.0),
            Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
        );
        env.altitude_meters = altitude_meters;
        env.terrain_type = TerrainType::Rural;
        env
    }

    #[test]
    fn test_altitude_multiplier_reference_points() {
        assert_eq!(altitude_multiplier(0.0), 1.0);
        assert!((altitude_multiplier(3500.0) - 1.35).abs() < 1e-9);
        assert!((altitude_multiplier(-2000.0) - 0.95).abs() < 1e-9);
        assert!((altitude_multiplier(20_000.0) - 1.9).abs() < 1e-9);
        assert_eq!(altitude_multiplier(f64::NAN), 1.0);
    }

    #[test]
    fn test_cloud_factor_bands() {
        assert_eq!(cloud_factor(0.0), 1.00);
        assert_eq!(cloud_factor(9.9), 1.00);
        assert_eq!(cloud_factor(10.0), 0.95);
        assert_eq!(cloud_factor(25.0), 0.85);
        assert_eq!(cloud_factor(50.0), 0.70);
        assert_eq!(cloud_factor(75.0), 0.50);
        assert_eq!(cloud_factor(90.0), 0.30);
        assert_eq!(cloud_factor(100.0), 0.30);
        assert_eq!(cloud_factor(-20.0), 1.00);
        assert_eq!(cloud_factor(150.0), 0.30);
    }

    #[test]
    fn test_terrain_compounding() {
        assert!((terrain_multiplier(TerrainType::Mountainous, 1500.0) - 1.10).abs() < 1e-9);
        assert!((terrain_multiplier(TerrainType::Mountainous, 2500.0) - 1.21).abs() < 1e-9);
        assert!((terrain_multiplier(TerrainType::Arctic, 0.0) - 1.26).abs() < 1e-9);
        assert_eq!(terrain_multiplier(TerrainType::Rural, 4000.0), 1.0);
    }

    #[test]
    fn test_seasonal_multiplier_events() {
        let plain = seasonal_multiplier(Season::Summer, 365, false, false, false);
        let solstice = seasonal_multiplier(Season::Summer, 365, true, false, false);
        assert!((plain - 1.10).abs() < 1e-6);
        assert!((solstice - 1.32).abs() < 1e-6);

        let winter = seasonal_multiplier(Season::Winter, 365, false, true, false);
        assert!((winter - 0.56).abs() < 1e-6);
        let floor = seasonal_multiplier(Season::Winter, 280, false, true, false);
        assert!(floor >= 0.5);
    }

    #[test]
    fn test_end_to_end_high_altitude_rural() {
        let env = rural_env(3500.0);
        let assessment = compose(8, &env);

        assert_eq!(assessment.adjusted_uv_index, 11);
        assert_eq!(assessment.risk_level, RiskLevel::Extreme);
        assert_eq!(assessment.risk_score, 1.0);
        assert_eq!(assessment.base_uv_index, 8);

        let types: Vec<RiskFactorType> =
            assessment.risk_factors.iter().map(|f| f.factor_type).collect();
        assert_eq!(types, vec![RiskFactorType::Altitude, RiskFactorType::Cloud]);
        assert_eq!(assessment.risk_factors[0].severity, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_zero_base_uv_stays_zero() {
        let mut env = rural_env(8000.0);
        env.terrain_type = TerrainType::Arctic;
        env.snow_conditions = SnowConditions::from_measurements(50.0, 100.0, 0.5, Some(-10.0));
        let assessment = compose(0, &env);

        assert_eq!(assessment.adjusted_uv_index, 0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_snow_adds_from_unmodified_base() {
        let mut env = rural_env(0.0);
        env.snow_conditions = SnowConditions {
            has_recent_snowfall: true,
            snow_depth_cm: 40.0,
            snow_coverage_pct: 100.0,
            snow_age_days: 1.0,
            snow_type: SnowType::Fresh,
        };
        env.cloud_cover_pct = 60.0;

        let breakdown = compose_breakdown(6, &env);
        // round(6 * 0.85) = 5, independent of the cloud factor
        assert_eq!(breakdown.snow_additive, 5);
        // round(6 * 0.70) = 4
        assert_eq!(breakdown.adjusted_uv_index, 9);

        let assessment = compose(6, &env);
        assert!(assessment
            .risk_factors
            .iter()
            .any(|f| f.factor_type == RiskFactorType::Snow && f.severity == RiskLevel::VeryHigh));
    }

    #[test]
    fn test_compose_with_breakdown_matches_compose() {
        let mut env = rural_env(3500.0);
        env.cloud_cover_pct = 40.0;

        let (assessment, breakdown) = compose_with_breakdown(8, &env);

        assert_eq!(assessment, compose(8, &env));
        assert_eq!(breakdown, compose_breakdown(8, &env));
        assert_eq!(assessment.adjusted_uv_index, breakdown.adjusted_uv_index);
    }

    #[test]
    fn test_huge_base_uv_saturates() {
        let mut env = rural_env(3000.0);
        env.snow_conditions = SnowConditions::from_measurements(50.0, 100.0, 0.5, Some(-10.0));

        let assessment = compose(u32::MAX / 2, &env);

        assert_eq!(assessment.adjusted_uv_index, u32::MAX);
        assert_eq!(assessment.risk_level, RiskLevel::Extreme);
    }

    #[test]
    fn test_water_additive_distance_falloff() {
        let body = WaterBody {
            name: "Lake Geneva".to_string(),
            body_type: WaterBodyType::Lake,
            size: WaterBodySize::Large,
            coordinates: Location::new(46.4, 6.5),
        };
        let mut env = rural_env(0.0);

        env.water_proximity = WaterProximity::near(body.clone(), 0.0);
        assert_eq!(water_additive(10, &env), 1);

        env.water_proximity = WaterProximity::near(body.clone(), 1000.0);
        assert_eq!(water_additive(10, &env), 0);

        let ocean = WaterBody {
            body_type: WaterBodyType::Ocean,
            size: WaterBodySize::Massive,
            ..body
        };
        env.water_proximity = WaterProximity::near(ocean, 100.0);
        // round(10 * 0.25 * 1.2 * 0.9) = round(2.7) = 3
        assert_eq!(water_additive(10, &env), 3);
    }

    #[test]
    fn test_water_proximity_floor() {
        let body = WaterBody {
            name: "Atlantic".to_string(),
            body_type: WaterBodyType::Ocean,
            size: WaterBodySize::Massive,
            coordinates: Location::new(38.7, -9.4),
        };
        let mut env = rural_env(0.0);
        env.water_proximity = WaterProximity::near(body, 990.0);
        // falloff floors at 0.1: round(10 * 0.25 * 1.2 * 0.1) = round(0.3) = 0
        assert_eq!(water_additive(10, &env), 0);
        assert_eq!(water_additive(40, &env), 1);
    }

    #[test]
    fn test_invalid_stored_seasonal_multiplier_is_neutral() {
        let mut env = rural_env(0.0);
        env.seasonal_factors.seasonal_uv_multiplier = f64::NAN;
        assert_eq!(compose(5, &env).adjusted_uv_index, 5);

        env.seasonal_factors.seasonal_uv_multiplier = 9.0;
        // clamped to 1.5
        assert_eq!(compose(4, &env).adjusted_uv_index, 6);
    }

    #[test]
    fn test_low_factors_are_omitted() {
        let env = rural_env(200.0);
        let assessment = compose(2, &env);
        assert!(assessment.risk_factors.is_empty());
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }
}
