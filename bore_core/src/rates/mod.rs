//! # Rate Tables
//!
//! Depth-rate slabs and the built-in telescopic rate table.
//!
//! A rate table is an ordered list of [`SlabRate`]s, each billing the depth
//! that falls inside `[min_depth_ft, max_depth_ft)` at a per-foot rate.
//! Tables are expected to be sorted ascending and contiguous, but the
//! drilling calculator does not enforce that; [`validate_rate_table`] is
//! the place for editors and importers to check it.
//!
//! ## Example
//!
//! ```rust
//! use bore_core::rates::{default_rate_table, parse_rate_table, validate_rate_table};
//!
//! let factory = default_rate_table();
//! assert!(validate_rate_table(&factory).is_empty());
//!
//! // Tables saved by older editors use camelCase keys and string values
//! let imported = parse_rate_table(r#"[{"minDepth": "0", "maxDepth": 300, "rate": "90"}]"#).unwrap();
//! assert_eq!(imported[0].rate, 90.0);
//! ```

pub mod profiles;

pub use profiles::RateProfile;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{BoreError, BoreResult};

/// Upper bound used for the open-ended last slab of a table.
pub const OPEN_ENDED_MAX_DEPTH_FT: f64 = 99_999.0;

/// One tier of a rate table.
///
/// ## JSON Example
///
/// ```json
/// { "min_depth_ft": 300.0, "max_depth_ft": 400.0, "rate": 100.0 }
/// ```
///
/// The camelCase keys `minDepth` / `maxDepth` are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlabRate {
    /// Inclusive lower bound of the slab in feet
    #[serde(alias = "minDepth")]
    pub min_depth_ft: f64,

    /// Upper bound of the slab in feet
    #[serde(alias = "maxDepth")]
    pub max_depth_ft: f64,

    /// Currency per foot for depth inside this slab
    pub rate: f64,
}

impl SlabRate {
    pub const fn new(min_depth_ft: f64, max_depth_ft: f64, rate: f64) -> Self {
        SlabRate {
            min_depth_ft,
            max_depth_ft,
            rate,
        }
    }

    /// Width of the slab in feet (may be zero or negative for malformed slabs)
    pub fn width_ft(&self) -> f64 {
        self.max_depth_ft - self.min_depth_ft
    }
}

/// Build the factory telescopic rate table.
///
/// Returns a fresh `Vec` on every call so no caller can alter the defaults
/// seen by another.
pub fn default_rate_table() -> Vec<SlabRate> {
    vec![
        SlabRate::new(0.0, 300.0, 90.0),
        SlabRate::new(300.0, 400.0, 100.0),
        SlabRate::new(400.0, 500.0, 120.0),
        SlabRate::new(500.0, 600.0, 140.0),
        SlabRate::new(600.0, 700.0, 170.0),
        SlabRate::new(700.0, 800.0, 200.0),
        SlabRate::new(800.0, 900.0, 240.0),
        SlabRate::new(900.0, 1000.0, 290.0),
        SlabRate::new(1000.0, 1100.0, 350.0),
        SlabRate::new(1100.0, OPEN_ENDED_MAX_DEPTH_FT, 420.0),
    ]
}

// ============================================================================
// Import
// ============================================================================

const MIN_KEYS: [&str; 3] = ["min_depth_ft", "minDepth", "min_depth"];
const MAX_KEYS: [&str; 3] = ["max_depth_ft", "maxDepth", "max_depth"];
const RATE_KEYS: [&str; 1] = ["rate"];

/// Parse a rate table from loosely typed JSON.
///
/// Accepts an array of slab objects whose keys are snake_case or camelCase
/// and whose values are numbers or numeric strings. Every value must be
/// finite.
///
/// # Errors
///
/// * `SerializationError` - not JSON, or not an array of objects
/// * `MissingField` - a slab lacks one of its three fields
/// * `InvalidInput` - a field is not a finite number
pub fn parse_rate_table(json: &str) -> BoreResult<Vec<SlabRate>> {
    let value: Value = serde_json::from_str(json).map_err(BoreError::serialization)?;
    rate_table_from_value(&value)
}

/// Coerce an already-parsed JSON value into a rate table.
///
/// See [`parse_rate_table`] for the accepted shapes.
pub fn rate_table_from_value(value: &Value) -> BoreResult<Vec<SlabRate>> {
    let items = value
        .as_array()
        .ok_or_else(|| BoreError::serialization("Rate table must be a JSON array"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let obj = item.as_object().ok_or_else(|| {
                BoreError::serialization(format!("Slab {} must be a JSON object", index))
            })?;
            Ok(SlabRate {
                min_depth_ft: coerce_field(obj, index, &MIN_KEYS)?,
                max_depth_ft: coerce_field(obj, index, &MAX_KEYS)?,
                rate: coerce_field(obj, index, &RATE_KEYS)?,
            })
        })
        .collect()
}

fn coerce_field(obj: &Map<String, Value>, index: usize, keys: &[&str]) -> BoreResult<f64> {
    let field = format!("rates[{}].{}", index, keys[0]);
    let raw = keys
        .iter()
        .find_map(|k| obj.get(*k))
        .ok_or_else(|| BoreError::missing_field(field.clone()))?;

    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(BoreError::invalid_input(
            field,
            raw.to_string(),
            "Expected a finite number",
        )),
    }
}

// ============================================================================
// Validation
// ============================================================================

/// A problem found in a rate table. Issues are advisory: the calculator
/// still produces a number for any table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue")]
pub enum RateTableIssue {
    /// The table has no slabs at all
    Empty,
    /// `max_depth_ft <= min_depth_ft`
    NonPositiveWidth { index: usize },
    /// Rate below zero
    NegativeRate { index: usize },
    /// Slab starts before the previous one
    OutOfOrder { index: usize },
    /// Depth between the previous slab's end and this slab's start is unpriced
    Gap { index: usize, from_ft: f64, to_ft: f64 },
    /// This slab starts before the previous slab ends
    Overlap { index: usize, from_ft: f64, to_ft: f64 },
}

impl std::fmt::Display for RateTableIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateTableIssue::Empty => write!(f, "rate table is empty"),
            RateTableIssue::NonPositiveWidth { index } => {
                write!(f, "slab {}: max depth must exceed min depth", index)
            }
            RateTableIssue::NegativeRate { index } => write!(f, "slab {}: rate is negative", index),
            RateTableIssue::OutOfOrder { index } => {
                write!(f, "slab {}: starts before the previous slab", index)
            }
            RateTableIssue::Gap { index, from_ft, to_ft } => {
                write!(f, "slab {}: {} - {} ft is not priced", index, from_ft, to_ft)
            }
            RateTableIssue::Overlap { index, from_ft, to_ft } => {
                write!(f, "slab {}: {} - {} ft is priced twice", index, from_ft, to_ft)
            }
        }
    }
}

/// Check a rate table for the shape the calculator expects.
///
/// Returns every issue found, in slab order. An empty vector means the
/// table is sorted, contiguous and well formed.
pub fn validate_rate_table(rates: &[SlabRate]) -> Vec<RateTableIssue> {
    if rates.is_empty() {
        return vec![RateTableIssue::Empty];
    }

    let mut issues = Vec::new();
    for (index, slab) in rates.iter().enumerate() {
        if !(slab.max_depth_ft > slab.min_depth_ft) {
            issues.push(RateTableIssue::NonPositiveWidth { index });
        }
        if slab.rate < 0.0 {
            issues.push(RateTableIssue::NegativeRate { index });
        }
        if index == 0 {
            continue;
        }

        let prev = &rates[index - 1];
        if slab.min_depth_ft < prev.min_depth_ft {
            issues.push(RateTableIssue::OutOfOrder { index });
        } else if slab.min_depth_ft > prev.max_depth_ft {
            issues.push(RateTableIssue::Gap {
                index,
                from_ft: prev.max_depth_ft,
                to_ft: slab.min_depth_ft,
            });
        } else if slab.min_depth_ft < prev.max_depth_ft {
            issues.push(RateTableIssue::Overlap {
                index,
                from_ft: slab.min_depth_ft,
                to_ft: prev.max_depth_ft,
            });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_contiguous() {
        let table = default_rate_table();
        assert_eq!(table.len(), 10);
        assert_eq!(table[0].min_depth_ft, 0.0);
        assert_eq!(table.last().unwrap().max_depth_ft, OPEN_ENDED_MAX_DEPTH_FT);
        assert!(validate_rate_table(&table).is_empty());
    }

    #[test]
    fn test_default_table_rates_increase() {
        let table = default_rate_table();
        assert!(table.windows(2).all(|w| w[1].rate > w[0].rate));
    }

    #[test]
    fn test_default_table_is_fresh_each_call() {
        let mut first = default_rate_table();
        first[0].rate = 1.0;
        assert_eq!(default_rate_table()[0].rate, 90.0);
    }

    #[test]
    fn test_serde_accepts_camel_case() {
        let slab: SlabRate =
            serde_json::from_str(r#"{"minDepth": 0, "maxDepth": 300, "rate": 90}"#).unwrap();
        assert_eq!(slab, SlabRate::new(0.0, 300.0, 90.0));

        let json = serde_json::to_string(&slab).unwrap();
        assert!(json.contains("min_depth_ft"));
    }

    #[test]
    fn test_parse_coerces_strings() {
        let table = parse_rate_table(
            r#"[
                {"minDepth": "0", "maxDepth": "300", "rate": " 90 "},
                {"min_depth_ft": 300, "max_depth_ft": 99999, "rate": 120.5}
            ]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0], SlabRate::new(0.0, 300.0, 90.0));
        assert_eq!(table[1].rate, 120.5);
    }

    #[test]
    fn test_parse_missing_field() {
        let err = parse_rate_table(r#"[{"minDepth": 0, "rate": 90}]"#).unwrap_err();
        assert_eq!(err, BoreError::missing_field("rates[0].max_depth_ft"));
    }

    #[test]
    fn test_parse_non_numeric_field() {
        let err = parse_rate_table(r#"[{"minDepth": 0, "maxDepth": 300, "rate": "ninety"}]"#)
            .unwrap_err();
        match err {
            BoreError::InvalidInput { field, .. } => assert_eq!(field, "rates[0].rate"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_rate_table(r#"{"minDepth": 0}"#).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_validate_reports_gap_and_overlap() {
        let table = vec![
            SlabRate::new(0.0, 300.0, 90.0),
            SlabRate::new(320.0, 400.0, 100.0),
            SlabRate::new(390.0, 500.0, 120.0),
        ];
        let issues = validate_rate_table(&table);
        assert_eq!(
            issues,
            vec![
                RateTableIssue::Gap { index: 1, from_ft: 300.0, to_ft: 320.0 },
                RateTableIssue::Overlap { index: 2, from_ft: 390.0, to_ft: 400.0 },
            ]
        );
    }

    #[test]
    fn test_validate_reports_bad_slabs() {
        let table = vec![
            SlabRate::new(100.0, 100.0, -5.0),
            SlabRate::new(0.0, 100.0, 90.0),
        ];
        let issues = validate_rate_table(&table);
        assert!(issues.contains(&RateTableIssue::NonPositiveWidth { index: 0 }));
        assert!(issues.contains(&RateTableIssue::NegativeRate { index: 0 }));
        assert!(issues.contains(&RateTableIssue::OutOfOrder { index: 1 }));
        assert_eq!(validate_rate_table(&[]), vec![RateTableIssue::Empty]);
    }
}
