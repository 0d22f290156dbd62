//! # Quotation Calculations
//!
//! Pure pricing functions. Each calculation follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Result` / `*Totals` - Calculation output (JSON-serializable)
//! - `calculate_*(...)` - Pure function with no error states
//!
//! Both calculations are total over their inputs. In-progress form values
//! (a depth of `0` typed before the rest) must always produce a number, so
//! validation lives on the input types rather than in the calculators.
//!
//! ## Available Calculations
//!
//! - [`slab_cost`] - Tiered slab-rate drilling cost with re-bore and buffer handling
//! - [`invoice`] - Full invoice: drilling, casing, flat charges, extras, discount

pub mod invoice;
pub mod slab_cost;

// Re-export commonly used types
pub use invoice::{
    calculate_invoice, CasingEntry, ExtraItem, FlatCharges, InvoiceInput, InvoiceTotals,
};
pub use slab_cost::{
    calculate_drilling_cost, CalculationResult, CostBreakdownLine, DrillingInput, LineKind,
};
