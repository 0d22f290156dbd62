//! # Invoice Book
//!
//! The `InvoiceBook` struct is the root container for a business's saved
//! quotations and rate profiles. Books serialize to `.bqi` files as
//! human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! InvoiceBook
//! ├── meta: BookMetadata (version, business, owner, timestamps)
//! ├── settings: BookSettings (active profile, quote defaults, numbering)
//! ├── profiles: BTreeMap<String, RateProfile> (named rate tables)
//! └── invoices: HashMap<Uuid, Invoice> (all saved invoices)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bore_core::invoice_book::{CustomerInfo, InvoiceBook};
//! use bore_core::calculations::{DrillingInput, InvoiceInput};
//!
//! let mut book = InvoiceBook::new("Sri Ganesh Borewells", "Ravi");
//!
//! let input = InvoiceInput {
//!     drilling: DrillingInput::new(450.0).with_rates(book.active_rates()),
//!     ..Default::default()
//! };
//! let id = book.add_invoice(CustomerInfo::new("Lakshmi Farms"), input);
//! assert_eq!(book.get_invoice(&id).unwrap().number, 1);
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::invoice::{calculate_invoice, InvoiceInput, InvoiceTotals};
use crate::errors::{BoreError, BoreResult};
use crate::rates::profiles::FACTORY_PROFILE;
use crate::rates::{default_rate_table, RateProfile, SlabRate};

/// Current schema version for .bqi files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root container for invoices and rate profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceBook {
    /// Book metadata (version, business, owner)
    pub meta: BookMetadata,

    /// Defaults applied to new quotations
    pub settings: BookSettings,

    /// Rate profiles keyed by name (sorted for stable files)
    pub profiles: BTreeMap<String, RateProfile>,

    /// Saved invoices, keyed by UUID
    pub invoices: HashMap<Uuid, Invoice>,
}

impl InvoiceBook {
    /// Create a new book holding only the factory rate profile.
    pub fn new(business_name: impl Into<String>, owner: impl Into<String>) -> Self {
        let now = Utc::now();
        let factory = RateProfile::factory();
        let mut profiles = BTreeMap::new();
        profiles.insert(factory.name.clone(), factory);

        InvoiceBook {
            meta: BookMetadata {
                version: SCHEMA_VERSION.to_string(),
                business_name: business_name.into(),
                owner: owner.into(),
                created: now,
                modified: now,
            },
            settings: BookSettings::default(),
            profiles,
            invoices: HashMap::new(),
        }
    }

    /// Record an invoice and assign it the next sequential number.
    ///
    /// Returns the UUID assigned to the invoice.
    pub fn add_invoice(&mut self, customer: CustomerInfo, input: InvoiceInput) -> Uuid {
        let id = Uuid::new_v4();
        let number = self.settings.next_invoice_number;
        self.settings.next_invoice_number += 1;
        self.invoices.insert(
            id,
            Invoice {
                number,
                customer,
                issued: Utc::now(),
                input,
            },
        );
        self.touch();
        id
    }

    /// Remove an invoice by UUID.
    ///
    /// Numbers are never reused after removal.
    pub fn remove_invoice(&mut self, id: &Uuid) -> BoreResult<Invoice> {
        let invoice = self
            .invoices
            .remove(id)
            .ok_or_else(|| BoreError::invoice_not_found(id))?;
        self.touch();
        Ok(invoice)
    }

    pub fn get_invoice(&self, id: &Uuid) -> Option<&Invoice> {
        self.invoices.get(id)
    }

    pub fn invoice_count(&self) -> usize {
        self.invoices.len()
    }

    /// All invoices ordered by invoice number.
    pub fn invoices_by_number(&self) -> Vec<(&Uuid, &Invoice)> {
        let mut list: Vec<_> = self.invoices.iter().collect();
        list.sort_by_key(|(_, inv)| inv.number);
        list
    }

    /// Add or replace a rate profile by name.
    pub fn upsert_profile(&mut self, profile: RateProfile) {
        self.profiles.insert(profile.name.clone(), profile);
        self.touch();
    }

    /// Remove a profile. If it was active, the factory table becomes active.
    pub fn remove_profile(&mut self, name: &str) -> BoreResult<RateProfile> {
        let profile = self
            .profiles
            .remove(name)
            .ok_or_else(|| BoreError::profile_not_found(name))?;
        if self.settings.active_profile == name {
            self.settings.active_profile = FACTORY_PROFILE.to_string();
        }
        self.touch();
        Ok(profile)
    }

    pub fn profile(&self, name: &str) -> Option<&RateProfile> {
        self.profiles.get(name)
    }

    /// Select the profile used for new quotations.
    pub fn set_active_profile(&mut self, name: &str) -> BoreResult<()> {
        if !self.profiles.contains_key(name) {
            return Err(BoreError::profile_not_found(name));
        }
        self.settings.active_profile = name.to_string();
        self.touch();
        Ok(())
    }

    /// Slabs of the active profile, or the factory table if it is missing.
    ///
    /// Always returns an owned copy so edits to the quotation never reach
    /// the stored profile.
    pub fn active_rates(&self) -> Vec<SlabRate> {
        self.profiles
            .get(&self.settings.active_profile)
            .map(|p| p.slabs.clone())
            .unwrap_or_else(default_rate_table)
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

impl Default for InvoiceBook {
    fn default() -> Self {
        InvoiceBook::new("", "")
    }
}

/// Book metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Business name printed on quotations
    pub business_name: String,

    /// Person responsible for the book
    pub owner: String,

    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Per-book quotation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookSettings {
    /// Profile whose slabs seed new quotations
    pub active_profile: String,

    /// Default re-bore flushing rate per foot
    pub flushing_rate: f64,

    /// Default boundary buffer in feet
    pub buffer_limit_ft: f64,

    /// Number given to the next saved invoice
    pub next_invoice_number: u32,
}

impl Default for BookSettings {
    fn default() -> Self {
        BookSettings {
            active_profile: FACTORY_PROFILE.to_string(),
            flushing_rate: 0.0,
            buffer_limit_ft: 0.0,
            next_invoice_number: 1,
        }
    }
}

/// Customer details printed on an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl CustomerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        CustomerInfo {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A saved quotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Sequential number within the book
    pub number: u32,
    pub customer: CustomerInfo,
    pub issued: DateTime<Utc>,
    /// Inputs as entered; totals are recomputed on demand
    pub input: InvoiceInput,
}

impl Invoice {
    pub fn totals(&self) -> InvoiceTotals {
        calculate_invoice(&self.input)
    }
}
