//! Summary analysis
//!
//! Turns a free-text weather summary such as
//! `"2025-06-01: min 12°C / max 31°C, precip% 40, wind 18 km/h"` into the
//! signals the presentation layer needs: extreme temperatures, a visual
//! [`Theme`] and an ordered list of packing [`Tip`]s.
//!
//! Every function here is pure and total. Text without any recognisable
//! signal degrades to absent temperatures, [`Theme::Clear`] and the single
//! [`Tip::Layers`] fallback.
//!
//! Theme classification looks at the most extreme `max` value in the text,
//! while tip generation reacts only to the first `min`/`max` occurrence.
//! The two strategies give different answers for multi-day summaries and
//! both are kept as they are.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)min\s(-?[0-9]+)(?:\s*°?c)?").unwrap());
static MAX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)max\s(-?[0-9]+)(?:\s*°?c)?").unwrap());

/// `max` at or above this classifies as [`Theme::Hot`]
const HOT_THEME_THRESHOLD: i64 = 30;
/// First `min` below this adds [`Tip::Cold`]
const COLD_TIP_THRESHOLD: i64 = 10;
/// First `max` above this adds [`Tip::Hot`]
const HOT_TIP_THRESHOLD: i64 = 28;

/// Temperatures found in a summary, in whatever unit the summary used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureExtract {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Visual classification of a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Clear,
    Cloudy,
    Rain,
    Hot,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Clear, Theme::Cloudy, Theme::Rain, Theme::Hot];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Clear => "clear",
            Theme::Cloudy => "cloudy",
            Theme::Rain => "rain",
            Theme::Hot => "hot",
        }
    }

    /// CSS class applied to the page body, e.g. `theme-rain`
    #[must_use]
    pub fn css_class(self) -> String {
        format!("theme-{}", self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packing advice derived from a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tip {
    RainProtection,
    Windy,
    Cold,
    Hot,
    /// Fallback when nothing else applies
    Layers,
}

impl Tip {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Tip::RainProtection => "Pack a waterproof jacket or umbrella.",
            Tip::Windy => "Expect windy conditions; wear layers and secure loose items.",
            Tip::Cold => "Chilly weather expected; bring warm layers.",
            Tip::Hot => "High temps expected; carry water and sun protection.",
            Tip::Layers => {
                "Weather looks manageable. Dress in layers and check updates before heading out."
            }
        }
    }
}

impl fmt::Display for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything the presentation layer derives from one summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryAnalysis {
    pub temperatures: TemperatureExtract,
    pub theme: Theme,
    pub tips: Vec<Tip>,
}

/// Parse a `-?\d+` capture, saturating instead of failing on overflow
fn parse_saturating(digits: &str) -> i64 {
    digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn all_values<'t>(pattern: &'t Regex, text: &'t str) -> impl Iterator<Item = i64> + 't {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| parse_saturating(m.as_str()))
}

fn first_value(pattern: &Regex, text: &str) -> Option<i64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| parse_saturating(m.as_str()))
}

/// Lowest `min` and highest `max` mentioned anywhere in the text
#[must_use]
pub fn extract_temperatures(text: &str) -> TemperatureExtract {
    TemperatureExtract {
        min: all_values(&MIN_PATTERN, text).min(),
        max: all_values(&MAX_PATTERN, text).max(),
    }
}

/// Pick the theme; precipitation beats heat, heat beats wind
#[must_use]
pub fn classify_theme(text: &str) -> Theme {
    let lowered = text.to_lowercase();

    if lowered.contains("precip") {
        return Theme::Rain;
    }
    if extract_temperatures(text)
        .max
        .is_some_and(|max| max >= HOT_THEME_THRESHOLD)
    {
        return Theme::Hot;
    }
    if lowered.contains("wind") {
        return Theme::Cloudy;
    }
    Theme::Clear
}

/// Collect every applicable tip in a fixed order, or the fallback alone
#[must_use]
pub fn generate_tips(text: &str) -> Vec<Tip> {
    let lowered = text.to_lowercase();
    let mut tips = Vec::new();

    if lowered.contains("precip") || lowered.contains("rain") {
        tips.push(Tip::RainProtection);
    }
    if lowered.contains("wind") {
        tips.push(Tip::Windy);
    }
    if first_value(&MIN_PATTERN, text).is_some_and(|min| min < COLD_TIP_THRESHOLD) {
        tips.push(Tip::Cold);
    }
    if first_value(&MAX_PATTERN, text).is_some_and(|max| max > HOT_TIP_THRESHOLD) {
        tips.push(Tip::Hot);
    }
    if tips.is_empty() {
        tips.push(Tip::Layers);
    }

    tips
}

/// Run all three analyses over one summary
#[must_use]
pub fn analyze(text: &str) -> SummaryAnalysis {
    SummaryAnalysis {
        temperatures: extract_temperatures(text),
        theme: classify_theme(text),
        tips: generate_tips(text),
    }
}
