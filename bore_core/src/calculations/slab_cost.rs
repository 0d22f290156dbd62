//! # Slab-Rate Drilling Cost
//!
//! Prices a borewell job against a tiered ("slab") rate table.
//!
//! ## Algorithm
//!
//! 1. **Re-bore**: the part of a pre-existing bore that is flushed again is
//!    billed at the flat flushing rate, capped at the smaller of the old bore
//!    depth and the new total depth.
//! 2. **Buffer**: on a private copy of the table, the first slab that the
//!    total overshoots by no more than the buffer limit is stretched to the
//!    total, and the next slab's start is pushed to the total. At most one
//!    boundary is adjusted per call.
//! 3. **Drilling**: fresh drilling starts below the old bore. Each slab bills
//!    the overlap of `[min, max)` with `[start, total)`, in table order.
//!
//! The calculation is total: every input, however malformed, yields a
//! result. Negative or zero depths bill nothing, empty tables bill only the
//! re-bore, and unsorted tables are processed as given. No rounding is done.
//!
//! ## Example
//!
//! ```rust
//! use bore_core::calculations::slab_cost::calculate_drilling_cost;
//! use bore_core::rates::SlabRate;
//!
//! let rates = vec![
//!     SlabRate::new(0.0, 300.0, 90.0),
//!     SlabRate::new(300.0, 400.0, 100.0),
//!     SlabRate::new(400.0, 99_999.0, 120.0),
//! ];
//!
//! let result = calculate_drilling_cost(450.0, 0.0, 0.0, &rates, 0.0);
//! assert_eq!(result.total_cost, 43_000.0);
//! assert_eq!(result.breakdown.len(), 3);
//! assert_eq!(result.breakdown[2].range, "400 - 450");
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::rates::{default_rate_table, SlabRate};

/// Input parameters for pricing the drilling part of a job.
///
/// `Default` gives a new bore (no re-bore) priced on the factory table with
/// the buffer disabled.
///
/// ## JSON Example
///
/// ```json
/// {
///   "total_depth_ft": 520.0,
///   "old_bore_depth_ft": 150.0,
///   "flushing_rate": 40.0,
///   "rates": [
///     { "min_depth_ft": 0.0, "max_depth_ft": 300.0, "rate": 90.0 },
///     { "min_depth_ft": 300.0, "max_depth_ft": 99999.0, "rate": 120.0 }
///   ],
///   "buffer_limit_ft": 10.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrillingInput {
    /// Total drilled depth of the job in feet
    pub total_depth_ft: f64,

    /// Depth of the pre-existing bore being flushed, 0 for a new bore
    pub old_bore_depth_ft: f64,

    /// Currency per foot for the flushed portion
    pub flushing_rate: f64,

    /// Slab table, expected ascending by `min_depth_ft`
    pub rates: Vec<SlabRate>,

    /// Overshoot tolerance in feet at a slab boundary, 0 disables it
    pub buffer_limit_ft: f64,
}

impl Default for DrillingInput {
    fn default() -> Self {
        DrillingInput {
            total_depth_ft: 0.0,
            old_bore_depth_ft: 0.0,
            flushing_rate: 0.0,
            rates: default_rate_table(),
            buffer_limit_ft: 0.0,
        }
    }
}

impl DrillingInput {
    /// New bore of the given depth on the factory table.
    pub fn new(total_depth_ft: f64) -> Self {
        DrillingInput {
            total_depth_ft,
            ..Default::default()
        }
    }

    /// Price against a specific rate table.
    pub fn with_rates(mut self, rates: Vec<SlabRate>) -> Self {
        self.rates = rates;
        self
    }

    /// Flush an existing bore of `old_bore_depth_ft` at `flushing_rate`.
    pub fn with_rebore(mut self, old_bore_depth_ft: f64, flushing_rate: f64) -> Self {
        self.old_bore_depth_ft = old_bore_depth_ft;
        self.flushing_rate = flushing_rate;
        self
    }

    pub fn with_buffer(mut self, buffer_limit_ft: f64) -> Self {
        self.buffer_limit_ft = buffer_limit_ft;
        self
    }

    /// Run [`calculate_drilling_cost`] on these inputs.
    pub fn calculate(&self) -> CalculationResult {
        calculate_drilling_cost(
            self.total_depth_ft,
            self.old_bore_depth_ft,
            self.flushing_rate,
            &self.rates,
            self.buffer_limit_ft,
        )
    }
}

/// What a breakdown line bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineKind {
    /// Flushing of the pre-existing bore
    Rebore,
    /// Fresh drilling inside one slab
    #[default]
    Drilling,
}

/// One billed row of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdownLine {
    /// Display-only depth span, e.g. `"300 - 400"`
    pub range: String,

    /// Feet billed on this line (always > 0)
    pub depth_ft: f64,

    /// Currency per foot applied
    pub rate: f64,

    /// `depth_ft * rate`
    pub amount: f64,

    /// Whether this line is the re-bore flush or a drilling slab
    #[serde(default)]
    pub kind: LineKind,
}

impl CostBreakdownLine {
    fn new(kind: LineKind, start_ft: f64, end_ft: f64, rate: f64) -> Self {
        let depth_ft = end_ft - start_ft;
        // Adding 0.0 turns -0.0 into 0.0 so labels never read "-0"
        CostBreakdownLine {
            range: format!("{} - {}", start_ft + 0.0, end_ft + 0.0),
            depth_ft,
            rate,
            amount: depth_ft * rate,
            kind,
        }
    }
}

/// Drilling cost with its audit trail.
///
/// ## JSON Example
///
/// ```json
/// {
///   "total_cost": 40000.0,
///   "breakdown": [
///     { "range": "0 - 200", "depth_ft": 200.0, "rate": 50.0, "amount": 10000.0, "kind": "Rebore" },
///     { "range": "200 - 500", "depth_ft": 300.0, "rate": 100.0, "amount": 30000.0, "kind": "Drilling" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Sum of every line amount
    pub total_cost: f64,

    /// Lines in computation order: re-bore first, then slabs in table order
    pub breakdown: Vec<CostBreakdownLine>,
}

impl CalculationResult {
    fn push(&mut self, line: CostBreakdownLine) {
        self.total_cost += line.amount;
        self.breakdown.push(line);
    }

    /// The re-bore line, if the job flushed an existing bore.
    pub fn rebore_line(&self) -> Option<&CostBreakdownLine> {
        self.breakdown.iter().find(|l| l.kind == LineKind::Rebore)
    }

    /// Feet billed as fresh drilling (re-bore excluded).
    pub fn drilled_depth_ft(&self) -> f64 {
        self.breakdown
            .iter()
            .filter(|l| l.kind == LineKind::Drilling)
            .map(|l| l.depth_ft)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.breakdown.is_empty()
    }
}

/// Price a drilling job against a slab table.
///
/// # Arguments
///
/// * `total_depth_ft` - Total drilled depth; non-positive bills nothing
/// * `old_bore_depth_ft` - Existing bore depth flushed at `flushing_rate`
/// * `flushing_rate` - Currency per foot for the flushed portion
/// * `rates` - Slab table, processed in the order given; never modified
/// * `buffer_limit_ft` - Boundary overshoot tolerance, 0 disables it
///
/// A NaN total or NaN old bore depth bills nothing.
pub fn calculate_drilling_cost(
    total_depth_ft: f64,
    old_bore_depth_ft: f64,
    flushing_rate: f64,
    rates: &[SlabRate],
    buffer_limit_ft: f64,
) -> CalculationResult {
    let mut result = CalculationResult::default();

    if old_bore_depth_ft > 0.0 {
        let rebore_depth_ft = nan_min(total_depth_ft, old_bore_depth_ft);
        if rebore_depth_ft > 0.0 {
            result.push(CostBreakdownLine::new(
                LineKind::Rebore,
                0.0,
                rebore_depth_ft,
                flushing_rate,
            ));
        }
    }

    let effective_rates = apply_buffer(rates, total_depth_ft, buffer_limit_ft);

    let drilling_start_ft = nan_max(0.0, old_bore_depth_ft);
    for slab in &effective_rates {
        let start_ft = nan_max(slab.min_depth_ft, drilling_start_ft);
        let end_ft = nan_min(slab.max_depth_ft, total_depth_ft);
        if end_ft > start_ft {
            result.push(CostBreakdownLine::new(
                LineKind::Drilling,
                start_ft,
                end_ft,
                slab.rate,
            ));
        }
    }

    trace!(
        total_depth_ft,
        old_bore_depth_ft,
        buffer_limit_ft,
        lines = result.breakdown.len(),
        total_cost = result.total_cost,
        "drilling cost calculated"
    );

    result
}

/// Copy `rates` and stretch the first slab whose boundary the total
/// overshoots by at most `buffer_limit_ft`.
fn apply_buffer(rates: &[SlabRate], total_depth_ft: f64, buffer_limit_ft: f64) -> Vec<SlabRate> {
    let mut effective = rates.to_vec();
    if !(buffer_limit_ft > 0.0) {
        return effective;
    }

    let matched = effective.iter().position(|s| {
        total_depth_ft > s.max_depth_ft && total_depth_ft <= s.max_depth_ft + buffer_limit_ft
    });

    if let Some(index) = matched {
        effective[index].max_depth_ft = total_depth_ft;
        if let Some(next) = effective.get_mut(index + 1) {
            next.min_depth_ft = total_depth_ft;
        }
    }
    effective
}

// f64::min/max return the non-NaN operand; a NaN here must instead poison
// the comparison so the affected line is skipped.
fn nan_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_tier() -> Vec<SlabRate> {
        vec![
            SlabRate::new(0.0, 300.0, 90.0),
            SlabRate::new(300.0, 400.0, 100.0),
            SlabRate::new(400.0, 99_999.0, 120.0),
        ]
    }

    fn two_tier() -> Vec<SlabRate> {
        vec![
            SlabRate::new(0.0, 300.0, 90.0),
            SlabRate::new(300.0, 99_999.0, 120.0),
        ]
    }

    #[test]
    fn test_single_slab_covers_depth() {
        let rates = vec![SlabRate::new(0.0, 1000.0, 100.0)];
        let result = calculate_drilling_cost(250.0, 0.0, 0.0, &rates, 0.0);

        assert_eq!(result.total_cost, 25_000.0);
        assert_eq!(result.breakdown.len(), 1);
        let line = &result.breakdown[0];
        assert_eq!(line.depth_ft, 250.0);
        assert_eq!(line.rate, 100.0);
        assert_eq!(line.amount, 25_000.0);
        assert_eq!(line.range, "0 - 250");
        assert_eq!(line.kind, LineKind::Drilling);
    }

    #[test]
    fn test_multi_slab_split() {
        let result = calculate_drilling_cost(450.0, 0.0, 0.0, &three_tier(), 0.0);

        assert_eq!(result.total_cost, 43_000.0);
        let amounts: Vec<f64> = result.breakdown.iter().map(|l| l.amount).collect();
        assert_eq!(amounts, vec![27_000.0, 10_000.0, 6_000.0]);
        let ranges: Vec<&str> = result.breakdown.iter().map(|l| l.range.as_str()).collect();
        assert_eq!(ranges, vec!["0 - 300", "300 - 400", "400 - 450"]);
    }

    #[test]
    fn test_rebore_then_drilling() {
        let rates = vec![SlabRate::new(0.0, 99_999.0, 100.0)];
        let result = calculate_drilling_cost(500.0, 200.0, 50.0, &rates, 0.0);

        assert_eq!(result.breakdown.len(), 2);
        let rebore = &result.breakdown[0];
        assert_eq!(rebore.kind, LineKind::Rebore);
        assert_eq!(rebore.range, "0 - 200");
        assert_eq!(rebore.depth_ft, 200.0);
        assert_eq!(rebore.rate, 50.0);
        assert_eq!(rebore.amount, 10_000.0);

        let drill = &result.breakdown[1];
        assert_eq!(drill.range, "200 - 500");
        assert_eq!(drill.amount, 30_000.0);
        assert_eq!(result.total_cost, 40_000.0);
        assert_eq!(result.drilled_depth_ft(), 300.0);
    }

    #[test]
    fn test_old_bore_deeper_than_total() {
        let result = calculate_drilling_cost(150.0, 200.0, 50.0, &three_tier(), 0.0);

        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.rebore_line().unwrap().depth_ft, 150.0);
        assert_eq!(result.total_cost, 7_500.0);
    }

    #[test]
    fn test_rebore_skips_shallow_slabs() {
        // Old bore ends inside the second slab: first slab bills nothing new
        let result = calculate_drilling_cost(450.0, 350.0, 40.0, &three_tier(), 0.0);

        assert_eq!(result.breakdown.len(), 3);
        assert_eq!(result.breakdown[1].range, "350 - 400");
        assert_eq!(result.breakdown[1].amount, 5_000.0);
        assert_eq!(result.breakdown[2].amount, 6_000.0);
        assert_eq!(result.total_cost, 14_000.0 + 5_000.0 + 6_000.0);
    }

    #[test]
    fn test_buffer_absorbs_overshoot() {
        let rates = two_tier();
        let result = calculate_drilling_cost(305.0, 0.0, 0.0, &rates, 10.0);

        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.breakdown[0].range, "0 - 305");
        assert_eq!(result.breakdown[0].rate, 90.0);
        assert_eq!(result.total_cost, 27_450.0);

        // Caller's table is untouched
        assert_eq!(rates, two_tier());
    }

    #[test]
    fn test_buffer_upper_edge_is_inclusive() {
        let result = calculate_drilling_cost(310.0, 0.0, 0.0, &two_tier(), 10.0);
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.total_cost, 310.0 * 90.0);
    }

    #[test]
    fn test_overshoot_beyond_buffer_spills() {
        let result = calculate_drilling_cost(311.0, 0.0, 0.0, &two_tier(), 10.0);
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[1].range, "300 - 311");
        assert_eq!(result.total_cost, 27_000.0 + 11.0 * 120.0);
    }

    #[test]
    fn test_exact_boundary_does_not_trigger_buffer() {
        let with_buffer = calculate_drilling_cost(300.0, 0.0, 0.0, &two_tier(), 10.0);
        let without = calculate_drilling_cost(300.0, 0.0, 0.0, &two_tier(), 0.0);
        assert_eq!(with_buffer, without);
        assert_eq!(with_buffer.breakdown.len(), 1);
    }

    #[test]
    fn test_buffer_adjusts_only_first_match() {
        // Overlapping table: both the first and second slabs end within
        // 10 ft of the total, only the first is stretched.
        let rates = vec![
            SlabRate::new(0.0, 300.0, 90.0),
            SlabRate::new(300.0, 302.0, 100.0),
            SlabRate::new(302.0, 99_999.0, 120.0),
        ];
        let result = calculate_drilling_cost(305.0, 0.0, 0.0, &rates, 10.0);

        // Slab 0 -> [0, 305); slab 1 -> [305, 302) skipped; slab 2 -> [302, 305)
        let ranges: Vec<&str> = result.breakdown.iter().map(|l| l.range.as_str()).collect();
        assert_eq!(ranges, vec!["0 - 305", "302 - 305"]);
        assert_eq!(result.total_cost, 305.0 * 90.0 + 3.0 * 120.0);
    }

    #[test]
    fn test_buffer_on_last_slab_has_no_successor() {
        let rates = vec![SlabRate::new(0.0, 300.0, 90.0)];
        let result = calculate_drilling_cost(305.0, 0.0, 0.0, &rates, 10.0);
        assert_eq!(result.total_cost, 305.0 * 90.0);
    }

    #[test]
    fn test_idempotent_and_non_mutating() {
        let rates = three_tier();
        let first = calculate_drilling_cost(405.0, 120.0, 45.0, &rates, 10.0);
        let second = calculate_drilling_cost(405.0, 120.0, 45.0, &rates, 10.0);
        assert_eq!(first, second);
        assert_eq!(first.total_cost.to_bits(), second.total_cost.to_bits());
        assert_eq!(rates, three_tier());
    }

    #[test]
    fn test_degenerate_depths() {
        for depth in [0.0, -5.0, f64::NAN] {
            let result = calculate_drilling_cost(depth, 0.0, 0.0, &three_tier(), 0.0);
            assert_eq!(result.total_cost, 0.0);
            assert!(result.is_empty());
        }
    }

    #[test]
    fn test_nan_old_bore_bills_nothing() {
        let result = calculate_drilling_cost(450.0, f64::NAN, 50.0, &three_tier(), 0.0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_negative_old_bore_is_new_bore() {
        let result = calculate_drilling_cost(450.0, -20.0, 50.0, &three_tier(), 0.0);
        assert!(result.rebore_line().is_none());
        assert_eq!(result.total_cost, 43_000.0);
    }

    #[test]
    fn test_empty_table_bills_only_rebore() {
        let result = calculate_drilling_cost(450.0, 100.0, 30.0, &[], 10.0);
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.total_cost, 3_000.0);
    }

    #[test]
    fn test_unsorted_table_processed_in_given_order() {
        let rates = vec![
            SlabRate::new(300.0, 99_999.0, 120.0),
            SlabRate::new(0.0, 300.0, 90.0),
        ];
        let result = calculate_drilling_cost(350.0, 0.0, 0.0, &rates, 0.0);
        assert_eq!(result.breakdown[0].rate, 120.0);
        assert_eq!(result.breakdown[1].rate, 90.0);
        assert_eq!(result.total_cost, 50.0 * 120.0 + 300.0 * 90.0);
    }

    #[test]
    fn test_fractional_depth() {
        let result = calculate_drilling_cost(300.5, 0.0, 0.0, &two_tier(), 0.0);
        assert_eq!(result.breakdown[1].range, "300 - 300.5");
        assert!((result.total_cost - (27_000.0 + 60.0)).abs() < 1e-9);
    }

    #[test]
    fn test_negative_zero_boundary_labels_as_zero() {
        let rates = vec![SlabRate::new(-0.0, 1000.0, 100.0)];
        let result = calculate_drilling_cost(250.0, 0.0, 0.0, &rates, 0.0);
        assert_eq!(result.breakdown.len(), 1);
        assert_eq!(result.breakdown[0].range, "0 - 250");
        assert_eq!(result.total_cost, 25_000.0);

        let rebore = calculate_drilling_cost(-0.0, 0.0, 40.0, &rates, 0.0);
        assert!(rebore.is_empty());
    }

    #[test]
    fn test_default_input_uses_factory_table() {
        let input = DrillingInput::new(450.0);
        assert_eq!(input.rates, default_rate_table());
        let result = input.calculate();
        assert_eq!(result.total_cost, 27_000.0 + 10_000.0 + 50.0 * 120.0);
    }

    #[test]
    fn test_builder_matches_free_function() {
        let input = DrillingInput::new(305.0)
            .with_rates(two_tier())
            .with_rebore(100.0, 40.0)
            .with_buffer(10.0);
        let direct = calculate_drilling_cost(305.0, 100.0, 40.0, &two_tier(), 10.0);
        assert_eq!(input.calculate(), direct);
        assert_eq!(direct.total_cost, 4_000.0 + 205.0 * 90.0);
    }

    #[test]
    fn test_input_json_defaults() {
        let input: DrillingInput = serde_json::from_str(r#"{"total_depth_ft": 250.0}"#).unwrap();
        assert_eq!(input.old_bore_depth_ft, 0.0);
        assert_eq!(input.rates, default_rate_table());
    }

    #[test]
    fn test_result_serialization() {
        let rates = vec![SlabRate::new(0.0, 99_999.0, 100.0)];
        let result = calculate_drilling_cost(500.0, 200.0, 50.0, &rates, 0.0);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"kind\":\"Rebore\""));
        assert!(json.contains("\"total_cost\":40000.0"));
    }
}
