//! Pattern rules that pull individual features out of report text
//!
//! Every rule is a pure function of the text. `None` means the pattern did
//! not match and the caller substitutes the documented default.

use regex::Regex;
use std::sync::OnceLock;

pub const FESTIVAL_KEYWORDS: [&str; 4] = ["festival", "celebration", "holiday", "gathering"];
pub const RESPIRATORY_KEYWORDS: [&str; 4] = ["respiratory", "breathing", "asthma", "pollution"];
pub const CARDIAC_KEYWORDS: [&str; 3] = ["cardiac", "heart", "chest"];
pub const TRAUMA_KEYWORDS: [&str; 4] = ["trauma", "injury", "accident", "festival"];

/// Trend multipliers written by [`trend_multiplier`]
pub const TREND_INCREASE: f64 = 1.3;
pub const TREND_SPIKE: f64 = 1.5;
pub const TREND_DECREASE: f64 = 0.8;

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static pattern compiles"))
}

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Integer following the case-sensitive `AQI` token
pub fn aqi_value(text: &str) -> Option<f64> {
    static AQI: OnceLock<Regex> = OnceLock::new();
    first_number(pattern(&AQI, r"AQI\s*([0-9]+)"), text)
}

/// First integer after "temperature", optionally suffixed with °C
pub fn temperature(text: &str) -> Option<f64> {
    static TEMPERATURE: OnceLock<Regex> = OnceLock::new();
    first_number(
        pattern(&TEMPERATURE, r"(?i)temperature.*?([0-9]+)°?C?"),
        text,
    )
}

/// First percentage after "occupancy", as a fraction in `[0, 1]`
pub fn hospital_occupancy(text: &str) -> Option<f64> {
    static OCCUPANCY: OnceLock<Regex> = OnceLock::new();
    first_number(pattern(&OCCUPANCY, r"(?i)occupancy.*?([0-9]+)%"), text)
        .map(|pct| (pct / 100.0).clamp(0.0, 1.0))
}

/// Count preceding "beds occupied"
pub fn baseline_admissions(text: &str) -> Option<f64> {
    static BEDS: OnceLock<Regex> = OnceLock::new();
    first_number(pattern(&BEDS, r"(?i)([0-9]+)\s*beds?\s*occupied"), text)
}

/// Share of festival keywords present, in steps of 0.25
pub fn festival_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let hits = FESTIVAL_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .count();
    (hits as f64 / FESTIVAL_KEYWORDS.len() as f64).min(1.0)
}

/// Trend multiplier for a keyword family.
///
/// Returns `None` when no keyword of the family appears or no direction word
/// does. Direction words are checked in the order increase, spike/surge,
/// decrease; the first one present wins.
pub fn trend_multiplier(text: &str, keywords: &[&str]) -> Option<f64> {
    let lower = text.to_lowercase();
    if !keywords.iter().any(|kw| lower.contains(kw)) {
        return None;
    }

    if lower.contains("increase") {
        Some(TREND_INCREASE)
    } else if lower.contains("spike") || lower.contains("surge") {
        Some(TREND_SPIKE)
    } else if lower.contains("decrease") {
        Some(TREND_DECREASE)
    } else {
        None
    }
}
