//! # Invoice Totals
//!
//! Assembles the full bill for a job: slab-priced drilling, casing pipe per
//! diameter, flat charges, itemized extras and a flat discount.
//!
//! Like the drilling calculator, [`calculate_invoice`] never fails. Callers
//! that want to flag bad form input (negative depths, oversized discounts)
//! use [`InvoiceInput::validate`] separately.
//!
//! ## Example
//!
//! ```rust
//! use bore_core::calculations::invoice::{calculate_invoice, CasingEntry, FlatCharges, InvoiceInput};
//! use bore_core::calculations::slab_cost::DrillingInput;
//! use bore_core::rates::SlabRate;
//!
//! let input = InvoiceInput {
//!     drilling: DrillingInput::new(250.0).with_rates(vec![SlabRate::new(0.0, 1000.0, 100.0)]),
//!     casings: vec![CasingEntry::new(7.0, 40.0, 450.0)],
//!     charges: FlatCharges { bata: 1000.0, transport: 2500.0, extra_time: 0.0 },
//!     extras: Vec::new(),
//!     discount: 500.0,
//! };
//!
//! let totals = calculate_invoice(&input);
//! assert_eq!(totals.drilling.total_cost, 25_000.0);
//! assert_eq!(totals.casing_total, 18_000.0);
//! assert_eq!(totals.grand_total, 25_000.0 + 18_000.0 + 3_500.0 - 500.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::slab_cost::{CalculationResult, DrillingInput};
use crate::errors::{BoreError, BoreResult};

/// Casing pipe installed for one diameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasingEntry {
    /// Nominal pipe diameter in inches (e.g. 7.0, 10.0)
    pub diameter_in: f64,

    /// Length of pipe in feet
    pub depth_ft: f64,

    /// Currency per foot of pipe
    pub rate: f64,
}

impl CasingEntry {
    pub fn new(diameter_in: f64, depth_ft: f64, rate: f64) -> Self {
        CasingEntry {
            diameter_in,
            depth_ft,
            rate,
        }
    }

    pub fn amount(&self) -> f64 {
        self.depth_ft * self.rate
    }
}

/// Fixed per-job charges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatCharges {
    /// Crew daily allowance
    pub bata: f64,

    /// Rig transport to and from site
    pub transport: f64,

    /// Charge for time beyond the quoted schedule
    pub extra_time: f64,
}

impl FlatCharges {
    pub fn total(&self) -> f64 {
        self.bata + self.transport + self.extra_time
    }
}

/// A free-form billable item (pump fitting, cap, extra labour).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraItem {
    pub description: String,
    pub amount: f64,
}

impl ExtraItem {
    pub fn new(description: impl Into<String>, amount: f64) -> Self {
        ExtraItem {
            description: description.into(),
            amount,
        }
    }
}

/// Everything needed to price one job.
///
/// ## JSON Example
///
/// ```json
/// {
///   "drilling": { "total_depth_ft": 450.0, "buffer_limit_ft": 10.0 },
///   "casings": [
///     { "diameter_in": 7.0, "depth_ft": 40.0, "rate": 450.0 },
///     { "diameter_in": 10.0, "depth_ft": 20.0, "rate": 700.0 }
///   ],
///   "charges": { "bata": 1000.0, "transport": 2500.0, "extra_time": 0.0 },
///   "extras": [ { "description": "Well cap", "amount": 350.0 } ],
///   "discount": 1000.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceInput {
    pub drilling: DrillingInput,
    pub casings: Vec<CasingEntry>,
    pub charges: FlatCharges,
    pub extras: Vec<ExtraItem>,
    /// Flat amount subtracted from the subtotal
    pub discount: f64,
}

impl InvoiceInput {
    /// Check form input before it is saved or printed.
    ///
    /// The totals are computable regardless; this only reports values an
    /// operator most likely mistyped.
    pub fn validate(&self) -> BoreResult<()> {
        let d = &self.drilling;
        non_negative("drilling.total_depth_ft", d.total_depth_ft)?;
        non_negative("drilling.old_bore_depth_ft", d.old_bore_depth_ft)?;
        non_negative("drilling.flushing_rate", d.flushing_rate)?;
        non_negative("drilling.buffer_limit_ft", d.buffer_limit_ft)?;

        for (i, casing) in self.casings.iter().enumerate() {
            if !(casing.diameter_in > 0.0) {
                return Err(BoreError::invalid_input(
                    format!("casings[{}].diameter_in", i),
                    casing.diameter_in.to_string(),
                    "Diameter must be positive",
                ));
            }
            non_negative(&format!("casings[{}].depth_ft", i), casing.depth_ft)?;
            non_negative(&format!("casings[{}].rate", i), casing.rate)?;
        }

        non_negative("charges.bata", self.charges.bata)?;
        non_negative("charges.transport", self.charges.transport)?;
        non_negative("charges.extra_time", self.charges.extra_time)?;

        for (i, extra) in self.extras.iter().enumerate() {
            if extra.description.trim().is_empty() {
                return Err(BoreError::missing_field(format!("extras[{}].description", i)));
            }
            non_negative(&format!("extras[{}].amount", i), extra.amount)?;
        }

        non_negative("discount", self.discount)?;
        let subtotal = calculate_invoice(self).subtotal;
        if self.discount > subtotal {
            return Err(BoreError::invalid_input(
                "discount",
                self.discount.to_string(),
                format!("Discount exceeds subtotal of {:.2}", subtotal),
            ));
        }
        Ok(())
    }
}

fn non_negative(field: &str, value: f64) -> BoreResult<()> {
    if value.is_nan() || value < 0.0 {
        return Err(BoreError::invalid_input(
            field,
            value.to_string(),
            "Value cannot be negative",
        ));
    }
    Ok(())
}

/// Casing billed for one diameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasingLine {
    pub diameter_in: f64,
    /// Total feet across all entries of this diameter
    pub depth_ft: f64,
    /// Rate of the first entry of this diameter
    pub rate: f64,
    /// Sum of each entry's own `depth_ft * rate`
    pub amount: f64,
}

/// Priced invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Slab-rate drilling cost with breakdown
    pub drilling: CalculationResult,

    /// One line per casing diameter, in first-seen order
    pub casing_lines: Vec<CasingLine>,
    pub casing_total: f64,

    pub flat_charges_total: f64,
    pub extras_total: f64,

    /// Drilling + casing + flat charges + extras
    pub subtotal: f64,
    pub discount: f64,

    /// `subtotal - discount`, unrounded
    pub grand_total: f64,
}

/// Price a whole invoice. Calls the drilling calculator exactly once.
pub fn calculate_invoice(input: &InvoiceInput) -> InvoiceTotals {
    let drilling = input.drilling.calculate();

    let casing_lines = group_casings(&input.casings);
    let casing_total: f64 = casing_lines.iter().map(|l| l.amount).sum();
    let flat_charges_total = input.charges.total();
    let extras_total: f64 = input.extras.iter().map(|e| e.amount).sum();

    let subtotal = drilling.total_cost + casing_total + flat_charges_total + extras_total;
    let grand_total = subtotal - input.discount;

    trace!(subtotal, grand_total, "invoice totals calculated");

    InvoiceTotals {
        drilling,
        casing_lines,
        casing_total,
        flat_charges_total,
        extras_total,
        subtotal,
        discount: input.discount,
        grand_total,
    }
}

fn group_casings(casings: &[CasingEntry]) -> Vec<CasingLine> {
    let mut lines: Vec<CasingLine> = Vec::new();
    for entry in casings {
        if entry.depth_ft == 0.0 && entry.amount() == 0.0 {
            continue;
        }
        match lines.iter_mut().find(|l| l.diameter_in == entry.diameter_in) {
            Some(line) => {
                line.depth_ft += entry.depth_ft;
                line.amount += entry.amount();
            }
            None => lines.push(CasingLine {
                diameter_in: entry.diameter_in,
                depth_ft: entry.depth_ft,
                rate: entry.rate,
                amount: entry.amount(),
            }),
        }
    }
    lines
}
