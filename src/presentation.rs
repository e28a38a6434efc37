//! Presentation metadata for risk levels
//!
//! Display strings and colours are kept out of [`RiskLevel`] itself so the
//! core types stay free of UI concerns. Hosts look them up here.

use crate::types::RiskLevel;
use serde::Serialize;

/// Display metadata for a risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskLevelMetadata {
    pub level: RiskLevel,
    pub label: &'static str,
    /// sRGB hex colour following the WHO UV index palette
    pub color_hex: &'static str,
    pub description: &'static str,
    pub advice: &'static str,
}

const RISK_LEVEL_TABLE: [RiskLevelMetadata; 5] = [
    RiskLevelMetadata {
        level: RiskLevel::Low,
        label: "Low",
        color_hex: "#4EB400",
        description: "Minimal danger from the sun for the average person",
        advice: "Wear sunglasses on bright days",
    },
    RiskLevelMetadata {
        level: RiskLevel::Moderate,
        label: "Moderate",
        color_hex: "#F7E400",
        description: "Moderate risk of harm from unprotected sun exposure",
        advice: "Stay in shade near midday and use SPF 30+",
    },
    RiskLevelMetadata {
        level: RiskLevel::High,
        label: "High",
        color_hex: "#F85900",
        description: "High risk of harm from unprotected sun exposure",
        advice: "Reduce time in the sun between 10:00 and 16:00",
    },
    RiskLevelMetadata {
        level: RiskLevel::VeryHigh,
        label: "Very High",
        color_hex: "#D8001D",
        description: "Very high risk; unprotected skin can burn quickly",
        advice: "Minimise sun exposure and reapply sunscreen every two hours",
    },
    RiskLevelMetadata {
        level: RiskLevel::Extreme,
        label: "Extreme",
        color_hex: "#6B49C8",
        description: "Extreme risk; unprotected skin can burn in minutes",
        advice: "Avoid the sun around midday; cover up and wear a hat",
    },
];

/// Look up display metadata for a risk level
pub fn risk_level_metadata(level: RiskLevel) -> &'static RiskLevelMetadata {
    let index = match level {
        RiskLevel::Low => 0,
        RiskLevel::Moderate => 1,
        RiskLevel::High => 2,
        RiskLevel::VeryHigh => 3,
        RiskLevel::Extreme => 4,
    };
    &RISK_LEVEL_TABLE[index]
}
