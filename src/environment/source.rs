//! Environmental data sources
//!
//! A source answers the individual sub-queries (altitude, snow, water,
//! season, terrain) for a location. The provider fans these out in parallel
//! and validates what comes back.

use super::{classify_terrain, seasonal_factors};
use crate::error::UvError;
use crate::types::{
    Location, Season, SeasonalFactors, SnowConditions, TerrainType, WaterProximity,
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for environmental data sources
pub trait EnvironmentSource: Send + Sync {
    /// Elevation above sea level in meters
    fn altitude(&self, location: &Location) -> Result<f64, UvError>;

    /// Snow on the ground at `at`
    fn snow(&self, location: &Location, at: DateTime<Utc>) -> Result<SnowConditions, UvError>;

    /// Nearest reflective water
    fn water(&self, location: &Location) -> Result<WaterProximity, UvError>;

    /// Seasonal context; defaults to the calendar/hemisphere computation
    fn season(&self, location: &Location, at: DateTime<Utc>) -> Result<SeasonalFactors, UvError> {
        Ok(seasonal_factors(at.date_naive(), location.latitude))
    }

    /// Terrain classification, given the already validated sub-results
    fn terrain(
        &self,
        location: &Location,
        altitude_meters: f64,
        snow: &SnowConditions,
        water: &WaterProximity,
    ) -> TerrainType {
        classify_terrain(location.latitude, altitude_meters, snow, water)
    }
}

/// Fixed answers for tests and offline use.
///
/// A field left as `None` makes the corresponding sub-query fail with
/// [`UvError::SourceUnavailable`] (season and terrain fall back to the
/// computed defaults instead).
#[derive(Debug, Default)]
pub struct FixtureEnvironmentSource {
    pub altitude_meters: Option<f64>,
    pub snow: Option<SnowConditions>,
    pub water: Option<WaterProximity>,
    pub season: Option<SeasonalFactors>,
    pub terrain: Option<TerrainType>,
    altitude_queries: AtomicUsize,
}

impl FixtureEnvironmentSource {
    /// Fixture answering sea level, no snow, no water
    pub fn sea_level() -> Self {
        Self {
            altitude_meters: Some(0.0),
            snow: Some(SnowConditions::none()),
            water: Some(WaterProximity::none()),
            ..Self::default()
        }
    }

    pub fn with_altitude(mut self, altitude_meters: f64) -> Self {
        self.altitude_meters = Some(altitude_meters);
        self
    }

    pub fn with_snow(mut self, snow: SnowConditions) -> Self {
        self.snow = Some(snow);
        self
    }

    pub fn with_water(mut self, water: WaterProximity) -> Self {
        self.water = Some(water);
        self
    }

    pub fn with_season(mut self, season: SeasonalFactors) -> Self {
        self.season = Some(season);
        self
    }

    pub fn with_terrain(mut self, terrain: TerrainType) -> Self {
        self.terrain = Some(terrain);
        self
    }

    /// Number of altitude lookups served so far (one per uncached fetch)
    pub fn altitude_queries(&self) -> usize {
        self.altitude_queries.load(Ordering::Relaxed)
    }
}

impl EnvironmentSource for FixtureEnvironmentSource {
    fn altitude(&self, _location: &Location) -> Result<f64, UvError> {
        self.altitude_queries.fetch_add(1, Ordering::Relaxed);
        self.altitude_meters
            .ok_or_else(|| UvError::SourceUnavailable("altitude".to_string()))
    }

    fn snow(&self, _location: &Location, _at: DateTime<Utc>) -> Result<SnowConditions, UvError> {
        self.snow
            .clone()
            .ok_or_else(|| UvError::SourceUnavailable("snow".to_string()))
    }

    fn water(&self, _location: &Location) -> Result<WaterProximity, UvError> {
        self.water
            .clone()
            .ok_or_else(|| UvError::SourceUnavailable("water".to_string()))
    }

    fn season(&self, location: &Location, at: DateTime<Utc>) -> Result<SeasonalFactors, UvError> {
        match &self.season {
            Some(season) => Ok(season.clone()),
            None => Ok(seasonal_factors(at.date_naive(), location.latitude)),
        }
    }

    fn terrain(
        &self,
        location: &Location,
        altitude_meters: f64,
        snow: &SnowConditions,
        water: &WaterProximity,
    ) -> TerrainType {
        self.terrain
            .unwrap_or_else(|| classify_terrain(location.latitude, altitude_meters, snow, water))
    }
}

/// Rough, deterministic estimates from latitude and calendar alone.
///
/// This is a stand-in for real elevation/snow/hydrography data: it reports
/// a fixed altitude, no water, and seasonal snow at high latitudes or high
/// altitude. Useful for demos and for hosts without a data backend.
#[derive(Debug, Clone, Default)]
pub struct HeuristicEnvironmentSource {
    pub altitude_meters: f64,
}

impl HeuristicEnvironmentSource {
    pub fn new(altitude_meters: f64) -> Self {
        Self { altitude_meters }
    }
}

impl EnvironmentSource for HeuristicEnvironmentSource {
    fn altitude(&self, _location: &Location) -> Result<f64, UvError> {
        Ok(self.altitude_meters)
    }

    fn snow(&self, location: &Location, at: DateTime<Utc>) -> Result<SnowConditions, UvError> {
        let season = seasonal_factors(at.date_naive(), location.latitude).season;
        let latitude = location.latitude.abs();

        let conditions = match season {
            Season::Winter if latitude >= 60.0 || self.altitude_meters >= 1500.0 => {
                SnowConditions::from_measurements(60.0, 90.0, 5.0, Some(-8.0))
            }
            Season::Winter if latitude >= 45.0 => {
                SnowConditions::from_measurements(15.0, 40.0, 3.0, Some(-2.0))
            }
            Season::Spring | Season::Autumn if self.altitude_meters >= 2500.0 => {
                SnowConditions::from_measurements(40.0, 60.0, 4.0, Some(-1.0))
            }
            _ if self.altitude_meters >= 4000.0 => {
                SnowConditions::from_measurements(100.0, 80.0, 10.0, Some(-10.0))
            }
            _ => SnowConditions::none(),
        };
        Ok(conditions)
    }

    fn water(&self, _location: &Location) -> Result<WaterProximity, UvError> {
        Ok(WaterProximity::none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SnowType;
    use chrono::TimeZone;

    #[test]
    fn test_fixture_missing_fields_fail() {
        let source = FixtureEnvironmentSource::default();
        let location = Location::new(0.0, 0.0);

        assert!(matches!(
            source.altitude(&location),
            Err(UvError::SourceUnavailable(_))
        ));
        assert!(source.water(&location).is_err());
        assert!(source.season(&location, Utc::now()).is_ok());
        assert_eq!(source.altitude_queries(), 1);
    }

    #[test]
    fn test_heuristic_winter_snow() {
        let source = HeuristicEnvironmentSource::new(200.0);
        let january = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

        let oslo = source.snow(&Location::new(59.9, 10.7), january).unwrap();
        assert_ne!(oslo.snow_type, SnowType::None);
        assert!(oslo.snow_coverage_pct > 0.0);

        // January is summer in the southern hemisphere.
        let sydney = source.snow(&Location::new(-33.9, 151.2), january).unwrap();
        assert_eq!(sydney.snow_type, SnowType::None);
    }

    #[test]
    fn test_heuristic_high_altitude_snow_year_round() {
        let source = HeuristicEnvironmentSource::new(4500.0);
        let july = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        let snow = source.snow(&Location::new(27.9, 86.9), july).unwrap();
        assert_eq!(snow.snow_type, SnowType::Icy);
    }
}
