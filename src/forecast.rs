//! Hourly forecast assessment
//!
//! Applies the composition engine to each hour of a UV forecast against one
//! environmental snapshot, and groups the results into exposure windows.

use crate::composition::compose;
use crate::types::{EnvironmentalFactors, RiskLevel, UvForecastPoint, UvRiskAssessment};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of one forecast slot
const SLOT_MINUTES: i64 = 60;

/// Assessment for one forecast hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastAssessment {
    pub date: DateTime<Utc>,
    pub assessment: UvRiskAssessment,
}

/// A contiguous run of forecast hours, `end` exclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_adjusted_uv: u32,
}

impl ExposureWindow {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Assess every forecast point, in chronological order.
pub fn assess_forecast(
    points: &[UvForecastPoint],
    env: &EnvironmentalFactors,
) -> Vec<ForecastAssessment> {
    let mut assessments: Vec<ForecastAssessment> = points
        .iter()
        .map(|point| ForecastAssessment {
            date: point.date,
            assessment: compose(point.uv_index, env),
        })
        .collect();
    assessments.sort_by_key(|a| a.date);
    assessments
}

/// Hour with the highest adjusted UV (earliest on ties)
pub fn peak_assessment(assessments: &[ForecastAssessment]) -> Option<&ForecastAssessment> {
    assessments.iter().fold(None, |best, candidate| match best {
        Some(b) if b.assessment.adjusted_uv_index >= candidate.assessment.adjusted_uv_index => {
            Some(b)
        }
        _ => Some(candidate),
    })
}

/// Windows where every hour is at or below `max_level`
pub fn low_risk_windows(
    assessments: &[ForecastAssessment],
    max_level: RiskLevel,
) -> Vec<ExposureWindow> {
    windows_where(assessments, |a| a.risk_level <= max_level)
}

/// Windows where every hour is High or worse
pub fn high_risk_windows(assessments: &[ForecastAssessment]) -> Vec<ExposureWindow> {
    windows_where(assessments, |a| a.risk_level >= RiskLevel::High)
}

/// Group matching hours into windows; a gap or a non-matching hour closes a window.
fn windows_where(
    assessments: &[ForecastAssessment],
    matches: impl Fn(&UvRiskAssessment) -> bool,
) -> Vec<ExposureWindow> {
    let slot = Duration::minutes(SLOT_MINUTES);
    let mut windows: Vec<ExposureWindow> = Vec::new();
    let mut open: Option<ExposureWindow> = None;

    for item in assessments {
        if !matches(&item.assessment) {
            windows.extend(open.take());
            continue;
        }
        let uv = item.assessment.adjusted_uv_index;
        match open.as_mut() {
            Some(window) if item.date <= window.end => {
                window.end = window.end.max(item.date + slot);
                window.max_adjusted_uv = window.max_adjusted_uv.max(uv);
            }
            _ => {
                windows.extend(open.take());
                open = Some(ExposureWindow {
                    start: item.date,
                    end: item.date + slot,
                    max_adjusted_uv: uv,
                });
            }
        }
    }
    windows.extend(open);
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, h, 0, 0).unwrap()
    }

    fn day_curve() -> Vec<UvForecastPoint> {
        [(7, 1), (8, 2), (9, 4), (10, 6), (11, 8), (12, 9), (13, 8), (14, 6), (15, 4), (16, 2)]
            .into_iter()
            .map(|(h, uv)| UvForecastPoint {
                date: hour(h),
                uv_index: uv,
            })
            .collect()
    }

    fn sea_level() -> EnvironmentalFactors {
        EnvironmentalFactors::neutral(Location::new(0.0, 0.0), hour(0))
    }

    #[test]
    fn test_assess_forecast_sorted() {
        let mut points = day_curve();
        points.reverse();

        let assessments = assess_forecast(&points, &sea_level());

        assert_eq!(assessments.len(), 10);
        assert_eq!(assessments[0].date, hour(7));
        assert_eq!(assessments[5].assessment.adjusted_uv_index, 9);
    }

    #[test]
    fn test_peak_prefers_earliest() {
        let assessments = assess_forecast(&day_curve(), &sea_level());
        let peak = peak_assessment(&assessments).unwrap();
        assert_eq!(peak.date, hour(12));

        let flat: Vec<UvForecastPoint> = (9..12)
            .map(|h| UvForecastPoint {
                date: hour(h),
                uv_index: 5,
            })
            .collect();
        let assessments = assess_forecast(&flat, &sea_level());
        assert_eq!(peak_assessment(&assessments).unwrap().date, hour(9));
        assert!(peak_assessment(&[]).is_none());
    }

    #[test]
    fn test_low_risk_windows() {
        let assessments = assess_forecast(&day_curve(), &sea_level());

        let windows = low_risk_windows(&assessments, RiskLevel::Moderate);

        assert_eq!(
            windows,
            vec![
                ExposureWindow {
                    start: hour(7),
                    end: hour(10),
                    max_adjusted_uv: 4
                },
                ExposureWindow {
                    start: hour(15),
                    end: hour(17),
                    max_adjusted_uv: 4
                },
            ]
        );
        assert_eq!(windows[0].duration(), Duration::hours(3));
    }

    #[test]
    fn test_high_risk_window() {
        let assessments = assess_forecast(&day_curve(), &sea_level());
        let windows = high_risk_windows(&assessments);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, hour(10));
        assert_eq!(windows[0].end, hour(15));
        assert_eq!(windows[0].max_adjusted_uv, 9);
    }

    #[test]
    fn test_gap_splits_window() {
        let points = vec![
            UvForecastPoint {
                date: hour(6),
                uv_index: 1,
            },
            UvForecastPoint {
                date: hour(9),
                uv_index: 1,
            },
        ];
        let assessments = assess_forecast(&points, &sea_level());
        assert_eq!(low_risk_windows(&assessments, RiskLevel::Low).len(), 2);
    }
}
