//! # Error Types
//!
//! Structured error types for bore_core. The drilling calculator and the
//! invoice aggregator never fail; these errors belong to the layers around
//! them (rate table import, profile editing, form validation, file and
//! config I/O).
//!
//! ## Example
//!
//! ```rust
//! use bore_core::errors::{BoreError, BoreResult};
//!
//! fn validate_depth(depth_ft: f64) -> BoreResult<()> {
//!     if depth_ft < 0.0 {
//!         return Err(BoreError::InvalidInput {
//!             field: "total_depth_ft".to_string(),
//!             value: depth_ft.to_string(),
//!             reason: "Depth cannot be negative".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for bore_core operations
pub type BoreResult<T> = Result<T, BoreError>;

/// Structured error type for everything outside the pure calculators.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum BoreError {
    /// An input value is invalid (negative, non-numeric, out of range)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Slab index outside the rate table
    #[error("Slab {index} not found (table has {len} slabs)")]
    SlabNotFound { index: usize, len: usize },

    /// Named rate profile does not exist
    #[error("Rate profile not found: {name}")]
    ProfileNotFound { name: String },

    /// Invoice id not present in the book
    #[error("Invoice not found: {id}")]
    InvoiceNotFound { id: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Configuration file could not be read or parsed
    #[error("Config error in '{path}': {reason}")]
    ConfigError { path: String, reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl BoreError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BoreError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        BoreError::MissingField {
            field: field.into(),
        }
    }

    pub fn slab_not_found(index: usize, len: usize) -> Self {
        BoreError::SlabNotFound { index, len }
    }

    pub fn profile_not_found(name: impl Into<String>) -> Self {
        BoreError::ProfileNotFound { name: name.into() }
    }

    pub fn invoice_not_found(id: impl ToString) -> Self {
        BoreError::InvoiceNotFound { id: id.to_string() }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BoreError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        BoreError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from any displayable error
    pub fn serialization(reason: impl ToString) -> Self {
        BoreError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Create a ConfigError
    pub fn config_error(path: impl Into<String>, reason: impl Into<String>) -> Self {
        BoreError::ConfigError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BoreError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            BoreError::InvalidInput { .. } => "INVALID_INPUT",
            BoreError::MissingField { .. } => "MISSING_FIELD",
            BoreError::SlabNotFound { .. } => "SLAB_NOT_FOUND",
            BoreError::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            BoreError::InvoiceNotFound { .. } => "INVOICE_NOT_FOUND",
            BoreError::FileError { .. } => "FILE_ERROR",
            BoreError::FileLocked { .. } => "FILE_LOCKED",
            BoreError::SerializationError { .. } => "SERIALIZATION_ERROR",
            BoreError::ConfigError { .. } => "CONFIG_ERROR",
            BoreError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error =
            BoreError::invalid_input("casings[0].depth_ft", "-20", "Depth cannot be negative");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: BoreError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BoreError::missing_field("rate").error_code(), "MISSING_FIELD");
        assert_eq!(BoreError::slab_not_found(4, 2).error_code(), "SLAB_NOT_FOUND");
        assert_eq!(BoreError::profile_not_found("Winter").error_code(), "PROFILE_NOT_FOUND");
    }

    #[test]
    fn test_only_lock_errors_are_recoverable() {
        assert!(BoreError::file_locked("book.bqi", "ravi", "now").is_recoverable());
        assert!(!BoreError::serialization("bad json").is_recoverable());
    }

    #[test]
    fn test_slab_not_found_message() {
        let err = BoreError::slab_not_found(5, 3);
        assert_eq!(err.to_string(), "Slab 5 not found (table has 3 slabs)");
    }
}
