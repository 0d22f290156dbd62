//! # bore_core - Borewell Drilling Quotation Engine
//!
//! `bore_core` prices borewell drilling jobs. Given a drilled depth, an
//! optional pre-existing bore to flush, and a tiered rate table, it computes
//! the drilling cost with a line-by-line breakdown, then assembles a full
//! invoice with casing, flat charges, extras and discount.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Calculations are pure functions over plain values
//! - **Always a number**: Calculators have no error states, so a live total
//!   can be shown while the operator is still typing
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Validation at the edges**: Loose user data is checked on import and
//!   in the form layer, never inside the calculators
//!
//! ## Quick Start
//!
//! ```rust
//! use bore_core::calculations::slab_cost::calculate_drilling_cost;
//! use bore_core::rates::default_rate_table;
//!
//! let rates = default_rate_table();
//! let result = calculate_drilling_cost(450.0, 0.0, 0.0, &rates, 10.0);
//!
//! for line in &result.breakdown {
//!     println!("{} ft: {} x {} = {}", line.range, line.depth_ft, line.rate, line.amount);
//! }
//! assert_eq!(result.total_cost, 43_000.0);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Slab-rate drilling cost and invoice totals
//! - [`rates`] - Slab records, the factory table, import, validation, profiles
//! - [`invoice_book`] - Container for saved invoices and rate profiles
//! - [`file_io`] - Book files with atomic saves and locking
//! - [`config`] - TOML application configuration
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod config;
pub mod errors;
pub mod file_io;
pub mod invoice_book;
pub mod rates;

// Re-export commonly used types at crate root for convenience
pub use calculations::{
    calculate_drilling_cost, calculate_invoice, CalculationResult, DrillingInput, InvoiceInput,
};
pub use errors::{BoreError, BoreResult};
pub use file_io::{load_book, save_book, with_locked_book, FileLock};
pub use invoice_book::InvoiceBook;
pub use rates::{default_rate_table, SlabRate};
