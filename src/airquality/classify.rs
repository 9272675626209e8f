//! Status label → [`Tier`] → display attributes.

use serde::Serialize;

use super::types::{Measurement, Tier, TierStyle};

/// Checked in order. The longer "unhealthy" phrases must come before the
/// bare word they contain.
pub const TIER_RULES: &[(&str, Tier)] = &[
    ("good", Tier::Good),
    ("moderate", Tier::Moderate),
    ("unhealthy for sensitive", Tier::UnhealthySensitive),
    ("very unhealthy", Tier::VeryUnhealthy),
    ("unhealthy", Tier::Unhealthy),
    ("hazardous", Tier::Hazardous),
];

/// Case-insensitive substring classification; absent or unmatched labels are
/// [`Tier::Unknown`].
pub fn classify(status: Option<&str>) -> Tier {
    let status = status.unwrap_or("").to_lowercase();
    TIER_RULES
        .iter()
        .find(|(needle, _)| status.contains(needle))
        .map(|(_, tier)| *tier)
        .unwrap_or(Tier::Unknown)
}

impl Tier {
    pub fn style(self) -> TierStyle {
        match self {
            Tier::Good => TierStyle {
                text_color: "text-green-600",
                background_color: "bg-green-100",
                border_color: "border-green-200",
                advisory_icon: "✅",
                advisory_text: "Air quality is satisfactory. Enjoy outdoor activities.",
                advisory_background: "bg-green-50",
                advisory_border: "border-green-200",
                advisory_text_color: "text-green-800",
            },
            Tier::Moderate => TierStyle {
                text_color: "text-yellow-600",
                background_color: "bg-yellow-100",
                border_color: "border-yellow-200",
                advisory_icon: "⚠️",
                advisory_text: "Air quality is acceptable. Sensitive groups should take caution.",
                advisory_background: "bg-yellow-50",
                advisory_border: "border-yellow-200",
                advisory_text_color: "text-yellow-800",
            },
            Tier::UnhealthySensitive => TierStyle {
                text_color: "text-orange-600",
                background_color: "bg-orange-100",
                border_color: "border-orange-200",
                advisory_icon: "⚠️",
                advisory_text: "Sensitive groups should reduce prolonged outdoor activities.",
                advisory_background: "bg-orange-50",
                advisory_border: "border-orange-200",
                advisory_text_color: "text-orange-800",
            },
            Tier::Unhealthy => TierStyle {
                text_color: "text-red-600",
                background_color: "bg-red-100",
                border_color: "border-red-200",
                advisory_icon: "💡",
                advisory_text: "Everyone should limit prolonged outdoor activities.",
                advisory_background: "bg-red-50",
                advisory_border: "border-red-200",
                advisory_text_color: "text-red-800",
            },
            Tier::VeryUnhealthy => TierStyle {
                text_color: "text-purple-600",
                background_color: "bg-purple-100",
                border_color: "border-purple-200",
                advisory_icon: "☠️",
                advisory_text: "Health alert: everyone may experience serious effects.",
                advisory_background: "bg-purple-50",
                advisory_border: "border-purple-200",
                advisory_text_color: "text-purple-800",
            },
            Tier::Hazardous => TierStyle {
                text_color: "text-red-800",
                background_color: "bg-red-200",
                border_color: "border-red-300",
                advisory_icon: "☠️",
                advisory_text: "Health warning: emergency conditions. Avoid outdoor activities.",
                advisory_background: "bg-red-100",
                advisory_border: "border-red-300",
                advisory_text_color: "text-red-900",
            },
            Tier::Unknown => TierStyle {
                text_color: "text-gray-600",
                background_color: "bg-gray-100",
                border_color: "border-gray-200",
                advisory_icon: "ℹ️",
                advisory_text: "",
                advisory_background: "bg-gray-50",
                advisory_border: "border-gray-200",
                advisory_text_color: "text-gray-800",
            },
        }
    }
}

/// How one measurement should be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub tier: Tier,
    pub style: TierStyle,
    /// The measurement's own advisory when it has one, else the tier's.
    pub advisory: String,
}

pub fn classify_measurement(m: &Measurement) -> Classification {
    let tier = classify(m.status.as_deref());
    let style = tier.style();
    let advisory = m
        .advisory
        .clone()
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| style.advisory_text.to_string());
    Classification {
        tier,
        style,
        advisory,
    }
}
