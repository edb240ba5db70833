//! Reference-range annotator for lab results.
//!
//! Turns a measured value and the free-form reference range printed by the
//! laboratory into a [`Marker`]. Recognised range grammars:
//!
//! | Range text            | Meaning                              | Flags            |
//! |-----------------------|--------------------------------------|------------------|
//! | `13.0 - 17.0`, `0.4-4.0` | inclusive interval                | below → L, above → H |
//! | `< 200`, `<=5.7`      | upper limit (inclusive)              | above → H        |
//! | `> 40`                | lower limit (inclusive)              | below → L        |
//! | `>= 200 Suggestive…`  | diagnostic threshold                 | at/above → H     |
//!
//! Anything else (categorical ranges like `Negative`, garbled text) and any
//! non-numeric value yields [`Marker::None`]. Annotation never fails.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Marker;

const NUMBER: &str = r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)";

static INTERVAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*({NUMBER})\s*(?:-|–|—|to)\s*({NUMBER})\b")).unwrap()
});

static COMPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(>=|=>|≥|<=|=<|≤|>|<)\s*({NUMBER})")).unwrap()
});

/// A parsed reference range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceRange {
    /// `low - high`, both ends inclusive.
    Interval { low: f64, high: f64 },
    /// `< X` / `<= X`: values above X are high.
    UpperLimit(f64),
    /// `> X`: values below X are low.
    LowerLimit(f64),
    /// `>= X`: the value marks a finding at or above X.
    Threshold(f64),
}

impl ReferenceRange {
    pub fn classify(&self, value: f64) -> Marker {
        match *self {
            Self::Interval { low, high } => {
                if value < low {
                    Marker::Low
                } else if value > high {
                    Marker::High
                } else {
                    Marker::None
                }
            }
            Self::UpperLimit(limit) if value > limit => Marker::High,
            Self::LowerLimit(limit) if value < limit => Marker::Low,
            Self::Threshold(limit) if value >= limit => Marker::High,
            _ => Marker::None,
        }
    }
}

/// Parse reference-range text. `None` for categorical or unparseable text.
pub fn parse_range(range: &str) -> Option<ReferenceRange> {
    if let Some(caps) = INTERVAL.captures(range) {
        let low: f64 = caps[1].parse().ok()?;
        let high: f64 = caps[2].parse().ok()?;
        if !low.is_finite() || !high.is_finite() || low > high {
            return None;
        }
        return Some(ReferenceRange::Interval { low, high });
    }

    let caps = COMPARATOR.captures(range)?;
    let limit: f64 = caps[2].parse().ok()?;
    if !limit.is_finite() {
        return None;
    }
    match &caps[1] {
        ">=" | "=>" | "≥" => Some(ReferenceRange::Threshold(limit)),
        ">" => Some(ReferenceRange::LowerLimit(limit)),
        _ => Some(ReferenceRange::UpperLimit(limit)),
    }
}

/// Parse a measured value. Categorical results (`Negative`, `<0.1`,
/// `Reactive`) are not numeric.
pub fn parse_value(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Qualitative marker for a result value against its reference range.
pub fn annotate(value: &str, range: &str) -> Marker {
    let Some(value) = parse_value(value) else {
        return Marker::None;
    };
    parse_range(range)
        .map(|r| r.classify(value))
        .unwrap_or(Marker::None)
}
