use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// One cached per-phase average for a house, stamped with the week it was
/// computed in. Never updated in place; a refresh replaces the house's set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HouseStats {
    pub id: String,
    pub house: String,
    pub phase_id: String,
    pub phase_label: String,
    pub average_days: u32,
    pub student_count: u32,
    pub calculated_at: DateTime<Utc>,
    pub week_number: u32,
    pub year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn list_house_stats(&self, house: &str) -> Result<Vec<HouseStats>, StoreError> {
        let prefix = keys::house_stats_prefix(house)?;
        Self::scan_prefix_values(&self.house_stats, &prefix)
    }

    /// Deletes every cached record of `house` (any week) and writes
    /// `records` in a single atomic batch. Returns how many old records
    /// were removed.
    pub fn replace_house_stats(
        &self,
        house: &str,
        records: &[HouseStats],
    ) -> Result<usize, StoreError> {
        let prefix = keys::house_stats_prefix(house)?;
        let mut batch = sled::Batch::default();

        let mut removed = 0usize;
        for item in self.house_stats.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            batch.remove(key);
            removed += 1;
        }

        for record in records {
            if record.house != house {
                return Err(StoreError::Validation(format!(
                    "house stats record {} belongs to {}, not {}",
                    record.id, record.house, house
                )));
            }
            let key = keys::house_stats_key(
                house,
                record.year,
                record.week_number,
                &record.phase_id,
                &record.id,
            )?;
            batch.insert(key.as_bytes(), Self::serialize(record)?);
        }

        self.house_stats.apply_batch(batch)?;
        Ok(removed)
    }
}
