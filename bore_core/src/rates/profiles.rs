//! Named, editable rate tables.
//!
//! Operators keep several pricing schedules (factory rates, a discounted
//! schedule for repeat customers, hard-rock rates) and pick one per job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{default_rate_table, validate_rate_table, RateTableIssue, SlabRate};
use crate::errors::{BoreError, BoreResult};

/// Name of the built-in profile holding the factory table.
pub const FACTORY_PROFILE: &str = "Factory";

/// Width given to a slab appended with [`RateProfile::add_slab`].
pub const DEFAULT_SLAB_WIDTH_FT: f64 = 100.0;

/// A named rate table.
///
/// ## JSON Example
///
/// ```json
/// {
///   "name": "Hard Rock",
///   "slabs": [
///     { "min_depth_ft": 0.0, "max_depth_ft": 300.0, "rate": 110.0 },
///     { "min_depth_ft": 300.0, "max_depth_ft": 99999.0, "rate": 150.0 }
///   ],
///   "updated": "2025-01-15T10:30:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateProfile {
    /// Display name, unique within an invoice book
    pub name: String,

    /// Slabs in ascending depth order
    pub slabs: Vec<SlabRate>,

    /// Last edit time
    pub updated: DateTime<Utc>,
}

impl RateProfile {
    /// Create a profile from an existing table.
    pub fn new(name: impl Into<String>, slabs: Vec<SlabRate>) -> Self {
        RateProfile {
            name: name.into(),
            slabs,
            updated: Utc::now(),
        }
    }

    /// The built-in factory schedule.
    pub fn factory() -> Self {
        RateProfile::new(FACTORY_PROFILE, default_rate_table())
    }

    /// Append a slab that continues from the current deepest slab.
    ///
    /// Returns the index of the new slab.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bore_core::rates::RateProfile;
    ///
    /// let mut profile = RateProfile::new("Custom", Vec::new());
    /// profile.add_slab(90.0);
    /// let idx = profile.add_slab(100.0);
    /// assert_eq!(profile.slabs[idx].min_depth_ft, 100.0);
    /// assert_eq!(profile.slabs[idx].max_depth_ft, 200.0);
    /// ```
    pub fn add_slab(&mut self, rate: f64) -> usize {
        let start = self.slabs.last().map_or(0.0, |s| s.max_depth_ft);
        self.slabs
            .push(SlabRate::new(start, start + DEFAULT_SLAB_WIDTH_FT, rate));
        self.touch();
        debug!(profile = %self.name, start_ft = start, rate, "slab appended");
        self.slabs.len() - 1
    }

    /// Insert a slab at the position that keeps `min_depth_ft` ascending.
    ///
    /// Slabs with an equal start are placed after the existing ones.
    pub fn insert_slab(&mut self, slab: SlabRate) -> usize {
        let index = self
            .slabs
            .partition_point(|s| s.min_depth_ft <= slab.min_depth_ft);
        self.slabs.insert(index, slab);
        self.touch();
        debug!(profile = %self.name, index, "slab inserted");
        index
    }

    /// Replace the slab at `index`.
    pub fn update_slab(&mut self, index: usize, slab: SlabRate) -> BoreResult<()> {
        let len = self.slabs.len();
        let target = self
            .slabs
            .get_mut(index)
            .ok_or_else(|| BoreError::slab_not_found(index, len))?;
        *target = slab;
        self.touch();
        debug!(profile = %self.name, index, "slab updated");
        Ok(())
    }

    /// Remove and return the slab at `index`.
    pub fn remove_slab(&mut self, index: usize) -> BoreResult<SlabRate> {
        if index >= self.slabs.len() {
            return Err(BoreError::slab_not_found(index, self.slabs.len()));
        }
        let removed = self.slabs.remove(index);
        self.touch();
        debug!(profile = %self.name, index, "slab removed");
        Ok(removed)
    }

    /// Problems with this profile's table (see [`validate_rate_table`]).
    pub fn issues(&self) -> Vec<RateTableIssue> {
        validate_rate_table(&self.slabs)
    }

    pub fn is_valid(&self) -> bool {
        self.issues().is_empty()
    }

    fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

impl Default for RateProfile {
    fn default() -> Self {
        RateProfile::factory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_profile() {
        let profile = RateProfile::factory();
        assert_eq!(profile.name, FACTORY_PROFILE);
        assert_eq!(profile.slabs, default_rate_table());
        assert!(profile.is_valid());
    }

    #[test]
    fn test_add_slab_to_empty_profile() {
        let mut profile = RateProfile::new("Empty", Vec::new());
        assert!(!profile.is_valid());

        let idx = profile.add_slab(95.0);
        assert_eq!(idx, 0);
        assert_eq!(profile.slabs[0], SlabRate::new(0.0, 100.0, 95.0));
        assert!(profile.is_valid());
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut profile = RateProfile::new(
            "Two",
            vec![SlabRate::new(0.0, 300.0, 90.0), SlabRate::new(400.0, 500.0, 120.0)],
        );
        let idx = profile.insert_slab(SlabRate::new(300.0, 400.0, 100.0));
        assert_eq!(idx, 1);
        assert!(profile.is_valid());
    }

    #[test]
    fn test_update_and_remove() {
        let mut profile = RateProfile::factory();
        profile
            .update_slab(0, SlabRate::new(0.0, 300.0, 85.0))
            .unwrap();
        assert_eq!(profile.slabs[0].rate, 85.0);

        let removed = profile.remove_slab(9).unwrap();
        assert_eq!(removed.rate, 420.0);
        assert_eq!(profile.slabs.len(), 9);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut profile = RateProfile::new("One", vec![SlabRate::new(0.0, 100.0, 90.0)]);
        assert_eq!(
            profile.remove_slab(3).unwrap_err(),
            BoreError::slab_not_found(3, 1)
        );
        assert!(profile
            .update_slab(1, SlabRate::new(0.0, 1.0, 1.0))
            .is_err());
    }

    #[test]
    fn test_profile_serialization() {
        let profile = RateProfile::factory();
        let json = serde_json::to_string_pretty(&profile).unwrap();
        let roundtrip: RateProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, roundtrip);
    }
}
