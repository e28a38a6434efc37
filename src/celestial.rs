//! Sun and moon placement
//!
//! Low-order approximations of solar and lunar positions, converted to
//! horizontal coordinates for an observer and mapped onto a 0-1 time-of-day
//! fraction for display. Accuracy is on the order of a degree for the sun
//! and a few degrees for the moon; good enough for a UI, not for navigation.
//!
//! Pipeline: calendar → Julian Day → ecliptic → equatorial → horizontal → time fraction

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};

/// Mean obliquity of the ecliptic (degrees)
pub const OBLIQUITY_DEGREES: f64 = 23.439;

/// Julian Day of the J2000.0 epoch
pub const J2000: f64 = 2_451_545.0;

const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Solar altitude at apparent sunrise/sunset (refraction + solar radius)
pub const SUNRISE_ALTITUDE_DEGREES: f64 = -0.833;

/// Below this |cos(altitude)| the azimuth is undefined and reported as 0
const ZENITH_EPSILON: f64 = 1e-9;

/// Position of a body in the observer's sky
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelestialPosition {
    /// Compass bearing, 0 = north, clockwise (0-360)
    pub azimuth_degrees: f64,
    /// Angle above the horizon (-90 to 90)
    pub altitude_degrees: f64,
    /// Display position within the day (0-1)
    pub time_fraction: f64,
}

impl CelestialPosition {
    pub fn is_above_horizon(&self) -> bool {
        self.altitude_degrees >= 0.0
    }
}

/// Equatorial coordinates (degrees)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Equatorial {
    right_ascension: f64,
    declination: f64,
}

/// Normalize an angle to [0, 360).
pub fn normalize_degrees(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let normalized = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Julian Day for local calendar components at the given UTC offset.
///
/// Returns 0.0 when the components do not form a valid date and time.
pub fn julian_day(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    utc_offset_seconds: i32,
) -> f64 {
    if NaiveDate::from_ymd_opt(year, month, day).is_none()
        || NaiveTime::from_hms_opt(hour, minute, second).is_none()
    {
        return 0.0;
    }

    let (mut y, mut m) = (year as f64, month as f64);
    if month <= 2 {
        y -= 1.0;
        m += 12.0;
    }
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();

    let local_hours = hour as f64 + minute as f64 / 60.0 + second as f64 / 3600.0;
    let utc_hours = local_hours - utc_offset_seconds as f64 / 3600.0;
    let day_fraction = day as f64 + utc_hours / 24.0;

    (365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day_fraction + b - 1524.5
}

/// Julian Day of an instant in any time zone.
pub fn julian_day_for<Tz: TimeZone>(date: &DateTime<Tz>) -> f64 {
    let offset = date.offset().fix().local_minus_utc();
    let local = date.naive_local();
    julian_day(
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second(),
        offset,
    ) + local.nanosecond() as f64 / 1e9 / 86_400.0
}

fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000) / DAYS_PER_CENTURY
}

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Ecliptic longitude/latitude of the moon (degrees), truncated Meeus series.
fn lunar_ecliptic(t: f64) -> (f64, f64) {
    let mean_longitude = normalize_degrees(218.316_447_7 + 481_267.881_234_21 * t);
    let mean_anomaly = normalize_degrees(134.963_396_4 + 477_198.867_505_5 * t);
    let argument_of_latitude = normalize_degrees(93.272_095_0 + 483_202.017_523_3 * t);
    let elongation = normalize_degrees(297.850_192_1 + 445_267.111_403_4 * t);
    let solar_anomaly = normalize_degrees(357.529_109_2 + 35_999.050_290_9 * t);

    let longitude = mean_longitude + 6.289 * sin_deg(mean_anomaly)
        + 1.274 * sin_deg(2.0 * elongation - mean_anomaly)
        + 0.658 * sin_deg(2.0 * elongation)
        + 0.214 * sin_deg(2.0 * mean_anomaly)
        - 0.186 * sin_deg(solar_anomaly)
        - 0.114 * sin_deg(2.0 * argument_of_latitude);
    let latitude = 5.128 * sin_deg(argument_of_latitude)
        + 0.281 * sin_deg(mean_anomaly + argument_of_latitude)
        + 0.278 * sin_deg(mean_anomaly - argument_of_latitude);

    (normalize_degrees(longitude), latitude)
}

/// Ecliptic longitude of the sun (degrees); latitude is taken as zero.
fn solar_ecliptic_longitude(t: f64) -> f64 {
    let mean_longitude = normalize_degrees(280.466_46 + 36_000.769_83 * t);
    let mean_anomaly = normalize_degrees(357.529_11 + 35_999.050_29 * t);
    let center = (1.914_602 - 0.004_817 * t) * sin_deg(mean_anomaly)
        + 0.019_993 * sin_deg(2.0 * mean_anomaly)
        + 0.000_289 * sin_deg(3.0 * mean_anomaly);
    normalize_degrees(mean_longitude + center)
}

fn ecliptic_to_equatorial(longitude: f64, latitude: f64) -> Equatorial {
    let (sin_l, cos_l) = (sin_deg(longitude), cos_deg(longitude));
    let (sin_b, cos_b) = (sin_deg(latitude), cos_deg(latitude));
    let (sin_e, cos_e) = (sin_deg(OBLIQUITY_DEGREES), cos_deg(OBLIQUITY_DEGREES));

    let right_ascension = (sin_l * cos_e - (sin_b / cos_b) * sin_e)
        .atan2(cos_l)
        .to_degrees();
    let declination = (sin_b * cos_e + cos_b * sin_e * sin_l)
        .clamp(-1.0, 1.0)
        .asin()
        .to_degrees();

    Equatorial {
        right_ascension: normalize_degrees(right_ascension),
        declination,
    }
}

/// Greenwich mean sidereal time (degrees)
fn greenwich_mean_sidereal_time(jd: f64) -> f64 {
    let t = centuries_since_j2000(jd);
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * (jd - J2000) + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Equatorial → horizontal for an observer; returns (azimuth, altitude).
fn equatorial_to_horizontal(eq: Equatorial, jd: f64, latitude: f64, longitude: f64) -> (f64, f64) {
    let local_sidereal = normalize_degrees(greenwich_mean_sidereal_time(jd) + longitude);
    let hour_angle = normalize_degrees(local_sidereal - eq.right_ascension);

    let (sin_dec, cos_dec) = (sin_deg(eq.declination), cos_deg(eq.declination));
    let (sin_lat, cos_lat) = (sin_deg(latitude), cos_deg(latitude));
    let (sin_ha, cos_ha) = (sin_deg(hour_angle), cos_deg(hour_angle));

    let sin_alt = (sin_dec * sin_lat + cos_dec * cos_lat * cos_ha).clamp(-1.0, 1.0);
    let altitude = sin_alt.asin();
    let cos_alt = altitude.cos();

    if cos_alt.abs() < ZENITH_EPSILON || cos_lat.abs() < ZENITH_EPSILON {
        return (0.0, altitude.to_degrees());
    }

    let sin_az = -sin_ha * cos_dec / cos_alt;
    let cos_az = (sin_dec - sin_alt * sin_lat) / (cos_alt * cos_lat);
    let azimuth = sin_az.atan2(cos_az).to_degrees();

    (normalize_degrees(azimuth), altitude.to_degrees())
}

/// Quadrant segment of the time-fraction map: azimuth `[start, start + 90)`
/// maps linearly onto `[fraction, fraction + span)`.
struct Quadrant {
    start_azimuth: f64,
    fraction: f64,
    span: f64,
}

const fn quadrant(start_azimuth: f64, fraction: f64, span: f64) -> Quadrant {
    Quadrant {
        start_azimuth,
        fraction,
        span,
    }
}

/// Below the horizon the fraction is proportional to azimuth.
const NIGHT_QUADRANTS: [Quadrant; 4] = [
    quadrant(45.0, 0.125, 0.25),
    quadrant(135.0, 0.375, 0.25),
    quadrant(225.0, 0.625, 0.25),
    quadrant(315.0, 0.875, 0.25),
];

/// Above the horizon the southern sky gets the widest share of the day.
const DAY_QUADRANTS: [Quadrant; 4] = [
    quadrant(45.0, 0.25, 0.125),
    quadrant(135.0, 0.375, 0.25),
    quadrant(225.0, 0.625, 0.125),
    quadrant(315.0, 0.75, 0.5),
];

fn quadrant_fraction(quadrants: &[Quadrant; 4], azimuth: f64) -> f64 {
    let az = normalize_degrees(azimuth);
    // Half-open [start, start + 90); [315, 45) wraps through north.
    let quadrant = if (45.0..135.0).contains(&az) {
        &quadrants[0]
    } else if (135.0..225.0).contains(&az) {
        &quadrants[1]
    } else if (225.0..315.0).contains(&az) {
        &quadrants[2]
    } else {
        &quadrants[3]
    };
    let offset = (az - quadrant.start_azimuth).rem_euclid(360.0);
    quadrant.fraction + offset / 90.0 * quadrant.span
}

fn wrap_unit(fraction: f64) -> f64 {
    let wrapped = fraction.rem_euclid(1.0);
    if wrapped >= 1.0 || !wrapped.is_finite() {
        0.0
    } else {
        wrapped
    }
}

/// Map a horizontal position to a 0-1 display fraction of the day.
pub fn time_fraction(azimuth_degrees: f64, altitude_degrees: f64) -> f64 {
    if altitude_degrees >= 0.0 {
        let base = wrap_unit(quadrant_fraction(&DAY_QUADRANTS, azimuth_degrees));
        // Higher bodies sit closer to the middle of the day.
        let pull = 0.1 * (altitude_degrees.min(90.0) / 90.0);
        wrap_unit(base + (0.5 - base) * pull)
    } else {
        wrap_unit(quadrant_fraction(&NIGHT_QUADRANTS, azimuth_degrees))
    }
}

fn position_from_equatorial(
    eq: Equatorial,
    jd: f64,
    latitude: f64,
    longitude: f64,
) -> CelestialPosition {
    let (azimuth_degrees, altitude_degrees) = equatorial_to_horizontal(eq, jd, latitude, longitude);
    CelestialPosition {
        azimuth_degrees,
        altitude_degrees,
        time_fraction: time_fraction(azimuth_degrees, altitude_degrees),
    }
}

/// Moon position for an observer at the given Julian Day.
pub fn moon_position_at_jd(jd: f64, latitude: f64, longitude: f64) -> CelestialPosition {
    let (lambda, beta) = lunar_ecliptic(centuries_since_j2000(jd));
    position_from_equatorial(ecliptic_to_equatorial(lambda, beta), jd, latitude, longitude)
}

/// Sun position for an observer at the given Julian Day.
pub fn sun_position_at_jd(jd: f64, latitude: f64, longitude: f64) -> CelestialPosition {
    let lambda = solar_ecliptic_longitude(centuries_since_j2000(jd));
    position_from_equatorial(ecliptic_to_equatorial(lambda, 0.0), jd, latitude, longitude)
}

/// Moon position for an observer at a local date and time.
pub fn position<Tz: TimeZone>(
    date: &DateTime<Tz>,
    latitude: f64,
    longitude: f64,
) -> CelestialPosition {
    moon_position_at_jd(julian_day_for(date), latitude, longitude)
}

/// Sun position for an observer at a local date and time.
pub fn sun_position<Tz: TimeZone>(
    date: &DateTime<Tz>,
    latitude: f64,
    longitude: f64,
) -> CelestialPosition {
    sun_position_at_jd(julian_day_for(date), latitude, longitude)
}

/// Whether the sun is up (apparent, including refraction) at an instant.
pub fn is_daylight<Tz: TimeZone>(date: &DateTime<Tz>, latitude: f64, longitude: f64) -> bool {
    sun_position(date, latitude, longitude).altitude_degrees > SUNRISE_ALTITUDE_DEGREES
}

/// Sunrise and sunset bounding a day of daylight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaylightWindow {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl DaylightWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.sunrise && instant < self.sunset
    }

    pub fn duration(&self) -> Duration {
        self.sunset - self.sunrise
    }
}

const SCAN_STEP_MINUTES: i64 = 10;
const BISECTION_STEPS: u32 = 12;

fn sun_elevation_excess(instant: DateTime<Utc>, latitude: f64, longitude: f64) -> f64 {
    sun_position(&instant, latitude, longitude).altitude_degrees - SUNRISE_ALTITUDE_DEGREES
}

/// Refine a horizon crossing between `lo` and `hi` (signs differ).
fn bisect_crossing(
    mut lo: DateTime<Utc>,
    mut hi: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
) -> DateTime<Utc> {
    let lo_sign = sun_elevation_excess(lo, latitude, longitude) > 0.0;
    for _ in 0..BISECTION_STEPS {
        let mid = lo + (hi - lo) / 2;
        if (sun_elevation_excess(mid, latitude, longitude) > 0.0) == lo_sign {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo + (hi - lo) / 2
}

/// First sunrise and following sunset within a local calendar day.
///
/// `None` during polar day or polar night, or when the day holds only one of
/// the two crossings.
pub fn daylight_window(
    date: NaiveDate,
    utc_offset_seconds: i32,
    latitude: f64,
    longitude: f64,
) -> Option<DaylightWindow> {
    let local_midnight = date.and_hms_opt(0, 0, 0)?;
    let start =
        Utc.from_utc_datetime(&local_midnight) - Duration::seconds(utc_offset_seconds as i64);
    let step = Duration::minutes(SCAN_STEP_MINUTES);
    let steps = 24 * 60 / SCAN_STEP_MINUTES;

    let mut sunrise = None;
    let mut previous = start;
    let mut previous_up = sun_elevation_excess(start, latitude, longitude) > 0.0;

    for i in 1..=steps {
        let current = start + step * i as i32;
        let up = sun_elevation_excess(current, latitude, longitude) > 0.0;
        if up != previous_up {
            let crossing = bisect_crossing(previous, current, latitude, longitude);
            match (up, sunrise) {
                (true, None) => sunrise = Some(crossing),
                (false, Some(rise)) => {
                    return Some(DaylightWindow {
                        sunrise: rise,
                        sunset: crossing,
                    })
                }
                _ => {}
            }
        }
        previous = current;
        previous_up = up;
    }
    None
}
