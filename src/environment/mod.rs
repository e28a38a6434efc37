//! Environmental factor provider
//!
//! Assembles a validated [`EnvironmentalFactors`] snapshot for a location by
//! querying an [`EnvironmentSource`] for altitude, snow, water and season in
//! parallel. Snapshots are cached per ~100 m grid cell for a fixed
//! time-to-live.
//!
//! A sub-query that fails, panics or returns out-of-range data is replaced by
//! its neutral default, so a snapshot is always produced for a valid location.

mod source;

pub use source::{EnvironmentSource, FixtureEnvironmentSource, HeuristicEnvironmentSource};

use crate::cache::BoundedRecencyCache;
use crate::composition::seasonal_multiplier;
use crate::config::ProviderConfig;
use crate::error::UvError;
use crate::types::{
    EnvironmentalFactors, Location, Season, SeasonalFactors, SnowConditions, TerrainType,
    WaterProximity, MAX_ALTITUDE_METERS, MIN_ALTITUDE_METERS,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Day of year of the March equinox (non-leap calendar)
pub const MARCH_EQUINOX_DAY: u32 = 79;
/// Day of year of the June solstice
pub const JUNE_SOLSTICE_DAY: u32 = 172;
/// Day of year of the September equinox
pub const SEPTEMBER_EQUINOX_DAY: u32 = 265;
/// Day of year of the December solstice
pub const DECEMBER_SOLSTICE_DAY: u32 = 355;

/// Days either side of a solstice/equinox that still count as the event
const EVENT_WINDOW_DAYS: u32 = 1;

/// Latitude beyond which terrain is treated as arctic
const ARCTIC_LATITUDE: f64 = 66.5;
/// Altitude from which terrain is treated as mountainous
const MOUNTAIN_ALTITUDE_METERS: f64 = 1500.0;
/// Coastline distance within which terrain is treated as coastal
const COASTAL_DISTANCE_METERS: f64 = 5000.0;

fn near_day(day_of_year: u32, event_day: u32) -> bool {
    day_of_year.abs_diff(event_day) <= EVENT_WINDOW_DAYS
}

/// Seasonal context for a date at a latitude.
///
/// Seasons are meteorological (three whole months each) and flipped for the
/// southern hemisphere, as are the solstice flags.
pub fn seasonal_factors(date: NaiveDate, latitude: f64) -> SeasonalFactors {
    let northern_season = match date.month() {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        _ => Season::Autumn,
    };
    let southern = latitude < 0.0;
    let season = if southern {
        match northern_season {
            Season::Winter => Season::Summer,
            Season::Spring => Season::Autumn,
            Season::Summer => Season::Winter,
            Season::Autumn => Season::Spring,
            Season::Unknown => Season::Unknown,
        }
    } else {
        northern_season
    };

    let day_of_year = date.ordinal();
    let june = near_day(day_of_year, JUNE_SOLSTICE_DAY);
    let december = near_day(day_of_year, DECEMBER_SOLSTICE_DAY);
    let (is_summer_solstice, is_winter_solstice) = if southern {
        (december, june)
    } else {
        (june, december)
    };
    let is_equinox = near_day(day_of_year, MARCH_EQUINOX_DAY)
        || near_day(day_of_year, SEPTEMBER_EQUINOX_DAY);

    SeasonalFactors {
        season,
        day_of_year,
        is_winter_solstice,
        is_summer_solstice,
        is_equinox,
        seasonal_uv_multiplier: seasonal_multiplier(
            season,
            day_of_year,
            is_summer_solstice,
            is_winter_solstice,
            is_equinox,
        ),
    }
}

/// Terrain class from latitude, altitude and surroundings.
pub fn classify_terrain(
    latitude: f64,
    altitude_meters: f64,
    snow: &SnowConditions,
    water: &WaterProximity,
) -> TerrainType {
    if latitude.abs() >= ARCTIC_LATITUDE {
        TerrainType::Arctic
    } else if altitude_meters >= MOUNTAIN_ALTITUDE_METERS {
        TerrainType::Mountainous
    } else if water.is_coastal
        && water
            .coastal_distance_meters
            .unwrap_or(water.distance_to_water_meters)
            <= COASTAL_DISTANCE_METERS
    {
        TerrainType::Coastal
    } else if snow.snow_coverage_pct >= 75.0 {
        TerrainType::Arctic
    } else {
        TerrainType::Unknown
    }
}

fn valid_altitude(altitude_meters: f64) -> bool {
    altitude_meters.is_finite()
        && (MIN_ALTITUDE_METERS..=MAX_ALTITUDE_METERS).contains(&altitude_meters)
}

fn valid_snow(snow: &SnowConditions) -> bool {
    snow.snow_depth_cm.is_finite()
        && snow.snow_depth_cm >= 0.0
        && snow.snow_age_days.is_finite()
        && snow.snow_coverage_pct.is_finite()
        && (0.0..=100.0).contains(&snow.snow_coverage_pct)
}

fn valid_water(water: &WaterProximity) -> bool {
    let distance_ok = |d: f64| d.is_finite() && d >= 0.0;
    distance_ok(water.distance_to_water_meters)
        && water.coastal_distance_meters.map_or(true, distance_ok)
}

fn valid_season(season: &SeasonalFactors) -> bool {
    (1..=366).contains(&season.day_of_year)
        && season.seasonal_uv_multiplier.is_finite()
        && season.seasonal_uv_multiplier > 0.0
}

/// Resolve one sub-query: keep valid data, otherwise log and fall back.
fn resolve<T>(
    name: &'static str,
    outcome: std::thread::Result<Result<T, UvError>>,
    is_valid: impl Fn(&T) -> bool,
    fallback: impl FnOnce() -> T,
) -> T {
    match outcome {
        Ok(Ok(value)) if is_valid(&value) => value,
        Ok(Ok(_)) => {
            tracing::warn!(source = name, "rejected out-of-bounds environmental data");
            fallback()
        }
        Ok(Err(error)) => {
            tracing::warn!(source = name, %error, "environmental sub-query failed");
            fallback()
        }
        Err(_) => {
            tracing::warn!(source = name, "environmental sub-query panicked");
            fallback()
        }
    }
}

/// Cached, validating front end over an [`EnvironmentSource`]
pub struct EnvironmentalFactorProvider<S: EnvironmentSource> {
    source: S,
    cache: BoundedRecencyCache<(i64, i64), EnvironmentalFactors>,
    ttl: Duration,
}

impl<S: EnvironmentSource> EnvironmentalFactorProvider<S> {
    pub fn new(source: S, config: &ProviderConfig) -> Self {
        Self {
            source,
            cache: BoundedRecencyCache::new(config.cache_capacity),
            ttl: Duration::seconds(config.cache_ttl_seconds),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of snapshots currently cached
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop the cached snapshot for a location, if any
    pub fn invalidate(&mut self, location: &Location) -> bool {
        self.cache.remove(&location.cache_key()).is_some()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Snapshot for `location` as of `at`, served from cache while fresh.
    pub fn fetch(
        &mut self,
        location: Location,
        at: DateTime<Utc>,
    ) -> Result<EnvironmentalFactors, UvError> {
        if !location.is_valid() {
            return Err(UvError::InvalidInput(format!(
                "location out of range: ({}, {})",
                location.latitude, location.longitude
            )));
        }

        let key = location.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            if !cached.is_expired(at, self.ttl) {
                tracing::debug!(?key, "environment cache hit");
                return Ok(cached.clone());
            }
        }

        let snapshot = self.gather(location, at);
        if let Some((evicted, _)) = self.cache.put(key, snapshot.clone()) {
            tracing::debug!(?evicted, "environment cache eviction");
        }
        Ok(snapshot)
    }

    /// Query every sub-source in parallel and build one validated snapshot
    fn gather(&self, location: Location, at: DateTime<Utc>) -> EnvironmentalFactors {
        let source = &self.source;
        let (altitude, snow, water, season) = std::thread::scope(|scope| {
            let altitude = scope.spawn(|| source.altitude(&location));
            let snow = scope.spawn(|| source.snow(&location, at));
            let water = scope.spawn(|| source.water(&location));
            let season = scope.spawn(|| source.season(&location, at));
            (altitude.join(), snow.join(), water.join(), season.join())
        });

        let altitude_meters = resolve("altitude", altitude, |a| valid_altitude(*a), || 0.0);
        let snow_conditions =
            resolve("snow", snow, valid_snow, SnowConditions::none).normalized();
        let water_proximity = resolve("water", water, valid_water, WaterProximity::none);
        let seasonal_factors = resolve("season", season, valid_season, SeasonalFactors::default);
        let terrain_type =
            source.terrain(&location, altitude_meters, &snow_conditions, &water_proximity);

        tracing::debug!(
            latitude = location.latitude,
            longitude = location.longitude,
            altitude_meters,
            terrain = terrain_type.as_str(),
            season = seasonal_factors.season.as_str(),
            "environment snapshot assembled"
        );

        EnvironmentalFactors {
            location,
            altitude_meters,
            snow_conditions,
            water_proximity,
            terrain_type,
            seasonal_factors,
            cloud_cover_pct: 0.0,
            fetched_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SnowType, WaterBody, WaterBodySize, WaterBodyType};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    fn provider(
        source: FixtureEnvironmentSource,
    ) -> EnvironmentalFactorProvider<FixtureEnvironmentSource> {
        EnvironmentalFactorProvider::new(source, &ProviderConfig::default())
    }

    #[test]
    fn test_seasonal_factors_hemispheres() {
        let june_21 = NaiveDate::from_ymd_opt(2023, 6, 21).unwrap();

        let north = seasonal_factors(june_21, 45.0);
        assert_eq!(north.season, Season::Summer);
        assert_eq!(north.day_of_year, 172);
        assert!(north.is_summer_solstice);
        assert!(!north.is_winter_solstice);

        let south = seasonal_factors(june_21, -33.0);
        assert_eq!(south.season, Season::Winter);
        assert!(south.is_winter_solstice);
        assert!(south.seasonal_uv_multiplier < north.seasonal_uv_multiplier);
    }

    #[test]
    fn test_seasonal_factors_event_windows() {
        let day = |ordinal| NaiveDate::from_yo_opt(2023, ordinal).unwrap();

        assert!(seasonal_factors(day(78), 10.0).is_equinox);
        assert!(seasonal_factors(day(80), 10.0).is_equinox);
        assert!(!seasonal_factors(day(81), 10.0).is_equinox);
        assert!(seasonal_factors(day(266), 10.0).is_equinox);
        assert!(seasonal_factors(day(356), 10.0).is_winter_solstice);
        assert!(!seasonal_factors(day(200), 10.0).is_summer_solstice);
    }

    #[test]
    fn test_classify_terrain() {
        let no_snow = SnowConditions::none();
        let no_water = WaterProximity::none();
        assert_eq!(classify_terrain(70.0, 0.0, &no_snow, &no_water), TerrainType::Arctic);
        assert_eq!(classify_terrain(46.0, 2500.0, &no_snow, &no_water), TerrainType::Mountainous);
        assert_eq!(classify_terrain(40.0, 100.0, &no_snow, &no_water), TerrainType::Unknown);

        let beach = WaterProximity::near(
            WaterBody {
                name: "Atlantic".to_string(),
                body_type: WaterBodyType::Ocean,
                size: WaterBodySize::Massive,
                coordinates: Location::new(40.0, -70.0),
            },
            300.0,
        );
        assert_eq!(classify_terrain(40.0, 5.0, &no_snow, &beach), TerrainType::Coastal);
    }

    #[test]
    fn test_fetch_builds_snapshot() {
        let mut provider = provider(FixtureEnvironmentSource::sea_level().with_altitude(3500.0));
        let env = provider.fetch(Location::new(46.5, 8.0), noon()).unwrap();

        assert_eq!(env.altitude_meters, 3500.0);
        assert_eq!(env.terrain_type, TerrainType::Mountainous);
        assert_eq!(env.seasonal_factors.season, Season::Summer);
        assert_eq!(env.cloud_cover_pct, 0.0);
        assert_eq!(env.fetched_at, noon());
    }

    #[test]
    fn test_failed_subqueries_fall_back_to_neutral() {
        let mut provider = provider(FixtureEnvironmentSource::default());
        let env = provider.fetch(Location::new(10.0, 10.0), noon()).unwrap();

        assert_eq!(env.altitude_meters, 0.0);
        assert_eq!(env.snow_conditions, SnowConditions::none());
        assert_eq!(env.water_proximity, WaterProximity::none());
    }

    #[test]
    fn test_out_of_bounds_data_is_rejected() {
        let mut bad_snow = SnowConditions::from_measurements(20.0, 50.0, 1.0, Some(-3.0));
        bad_snow.snow_coverage_pct = 140.0;
        let mut bad_water = WaterProximity::none();
        bad_water.distance_to_water_meters = -5.0;
        bad_water.water_body_type = WaterBodyType::Lake;

        let source = FixtureEnvironmentSource::sea_level()
            .with_altitude(12_000.0)
            .with_snow(bad_snow)
            .with_water(bad_water);
        let mut provider = provider(source);
        let env = provider.fetch(Location::new(10.0, 10.0), noon()).unwrap();

        assert_eq!(env.altitude_meters, 0.0);
        assert_eq!(env.snow_conditions.snow_type, SnowType::None);
        assert_eq!(env.water_proximity.water_body_type, WaterBodyType::None);
    }

    #[test]
    fn test_snapshot_cache_ttl() {
        let mut provider = provider(FixtureEnvironmentSource::sea_level());
        let location = Location::new(51.5, -0.12);

        provider.fetch(location, noon()).unwrap();
        // Same grid cell, within the hour.
        provider
            .fetch(Location::new(51.5002, -0.1201), noon() + Duration::minutes(59))
            .unwrap();
        assert_eq!(provider.source().altitude_queries(), 1);

        provider.fetch(location, noon() + Duration::minutes(60)).unwrap();
        assert_eq!(provider.source().altitude_queries(), 2);
        assert_eq!(provider.cached_len(), 1);

        assert!(provider.invalidate(&location));
        provider.fetch(location, noon() + Duration::minutes(61)).unwrap();
        assert_eq!(provider.source().altitude_queries(), 3);
    }

    #[test]
    fn test_invalid_location() {
        let mut provider = provider(FixtureEnvironmentSource::sea_level());
        assert!(matches!(
            provider.fetch(Location::new(95.0, 0.0), noon()),
            Err(UvError::InvalidInput(_))
        ));
        assert!(provider.fetch(Location::new(f64::NAN, 0.0), noon()).is_err());
    }
}
