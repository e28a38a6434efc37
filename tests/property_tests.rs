use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use synheart_uv::cache::BoundedRecencyCache;
use synheart_uv::celestial::{
    moon_position_at_jd, normalize_degrees, sun_position_at_jd, time_fraction,
};
use synheart_uv::composition::{altitude_multiplier, cloud_factor, compose};
use synheart_uv::types::{
    EnvironmentalFactors, Location, SeasonalFactors, SnowConditions, TerrainType, WaterBody,
    WaterBodySize, WaterBodyType, WaterProximity,
};

/// Generate valid latitude values
fn latitude_strategy() -> impl Strategy<Value = f64> {
    -90.0..=90.0
}

/// Generate valid longitude values
fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

fn terrain_strategy() -> impl Strategy<Value = TerrainType> {
    prop_oneof![
        Just(TerrainType::Unknown),
        Just(TerrainType::Coastal),
        Just(TerrainType::Mountainous),
        Just(TerrainType::Urban),
        Just(TerrainType::Rural),
        Just(TerrainType::Desert),
        Just(TerrainType::Forest),
        Just(TerrainType::Grassland),
        Just(TerrainType::Arctic),
    ]
}

fn water_strategy() -> impl Strategy<Value = WaterProximity> {
    prop_oneof![
        Just(WaterProximity::none()),
        (0.0..2000.0f64).prop_map(|distance| WaterProximity::near(
            WaterBody {
                name: "Pacific".to_string(),
                body_type: WaterBodyType::Ocean,
                size: WaterBodySize::Massive,
                coordinates: Location::new(0.0, -150.0),
            },
            distance,
        )),
    ]
}

/// Arbitrary but well-formed environmental snapshot
fn environment_strategy() -> impl Strategy<Value = EnvironmentalFactors> {
    (
        latitude_strategy(),
        longitude_strategy(),
        -500.0..9000.0f64,
        (0.0..200.0f64, 0.0..100.0f64, 0.0..30.0f64, -20.0..10.0f64),
        water_strategy(),
        terrain_strategy(),
        0.0..100.0f64,
        0.5..1.5f64,
    )
        .prop_map(
            |(lat, lon, altitude, (depth, coverage, age, temp), water, terrain, cloud, seasonal)| {
                EnvironmentalFactors {
                    location: Location::new(lat, lon),
                    altitude_meters: altitude,
                    snow_conditions: SnowConditions::from_measurements(
                        depth,
                        coverage,
                        age,
                        Some(temp),
                    ),
                    water_proximity: water,
                    terrain_type: terrain,
                    seasonal_factors: SeasonalFactors {
                        seasonal_uv_multiplier: seasonal,
                        ..SeasonalFactors::default()
                    },
                    cloud_cover_pct: cloud,
                    fetched_at: Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
                }
            },
        )
}

/// Shortest angular distance between two bearings
fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

proptest! {
    #[test]
    fn test_zero_uv_stays_zero(env in environment_strategy()) {
        let assessment = compose(0, &env);
        prop_assert_eq!(assessment.adjusted_uv_index, 0);
    }

    #[test]
    fn test_altitude_multiplier_monotonic(a in 0.0..9000.0f64, b in 0.0..9000.0f64) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(altitude_multiplier(low) <= altitude_multiplier(high));
    }

    #[test]
    fn test_cloud_factor_monotonic(a in 0.0..=100.0f64, b in 0.0..=100.0f64) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cloud_factor(low) >= cloud_factor(high));
        prop_assert!((0.30..=1.0).contains(&cloud_factor(a)));
    }

    #[test]
    fn test_more_cloud_never_raises_uv(
        env in environment_strategy(),
        base in 0u32..16,
        extra in 0.0..100.0f64,
    ) {
        let clearer = compose(base, &env).adjusted_uv_index;
        let cloudier_env = env.with_cloud_cover((env.cloud_cover_pct + extra).min(100.0));
        prop_assert!(compose(base, &cloudier_env).adjusted_uv_index <= clearer);
    }

    #[test]
    fn test_normalization_is_periodic(theta in -10_000.0..10_000.0f64, k in -100i32..100) {
        let base = normalize_degrees(theta);
        let shifted = normalize_degrees(theta + 360.0 * k as f64);
        prop_assert!((0.0..360.0).contains(&base));
        prop_assert!((0.0..360.0).contains(&shifted));
        prop_assert!(angular_distance(base, shifted) < 1e-6);
    }

    #[test]
    fn test_positions_in_range(
        jd in 2_415_020.0..2_488_070.0f64,
        lat in latitude_strategy(),
        lon in longitude_strategy(),
    ) {
        for position in [moon_position_at_jd(jd, lat, lon), sun_position_at_jd(jd, lat, lon)] {
            prop_assert!((0.0..360.0).contains(&position.azimuth_degrees));
            prop_assert!((-90.0..=90.0).contains(&position.altitude_degrees));
            prop_assert!((0.0..1.0).contains(&position.time_fraction));
        }
    }

    #[test]
    fn test_time_fraction_in_unit_interval(az in 0.0..360.0f64, alt in -90.0..=90.0f64) {
        let fraction = time_fraction(az, alt);
        prop_assert!((0.0..1.0).contains(&fraction));
    }

    #[test]
    fn test_cache_never_exceeds_capacity(
        capacity in 1usize..16,
        ops in proptest::collection::vec((any::<bool>(), 0u8..32), 0..200),
    ) {
        let mut cache = BoundedRecencyCache::new(capacity);
        for (is_put, key) in ops {
            if is_put {
                cache.put(key, key as u32);
            } else {
                let _ = cache.get(&key);
            }
            prop_assert!(cache.len() <= capacity);
            prop_assert_eq!(cache.keys_by_recency().len(), cache.len());
        }
    }

    #[test]
    fn test_cache_evicts_least_recently_touched(capacity in 1usize..12, touched in 0usize..12) {
        let mut cache = BoundedRecencyCache::new(capacity);
        for key in 0..capacity {
            cache.put(key, key);
        }
        let touched = touched % capacity;
        cache.get(&touched);

        let evicted = cache.put(capacity, capacity).map(|(k, _)| k);

        // Key 0 is the oldest unless it was just touched, in which case key 1 is
        // (or, with a single slot, the touched key itself goes).
        let expected = if capacity == 1 {
            0
        } else if touched == 0 {
            1
        } else {
            0
        };
        prop_assert_eq!(evicted, Some(expected));
        prop_assert!(capacity == 1 || cache.contains_key(&touched));
    }
}

#[test]
fn test_end_to_end_high_altitude_scenario() {
    let mut env = EnvironmentalFactors::neutral(
        Location::new(46.5, 8.0),
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap(),
    );
    env.altitude_meters = 3500.0;
    env.terrain_type = TerrainType::Rural;

    let assessment = compose(8, &env);

    assert_eq!(assessment.adjusted_uv_index, 11);
    let minutes = synheart_uv::time_to_burn_minutes(assessment.adjusted_uv_index);
    assert_eq!(minutes.round(), 9.0);
}
