use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// Curriculum phase. `order` defines the sequencing used for "later phase"
/// checks and for the `Phase N` labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub order: i32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Expected number of days a phase takes; the fallback estimate when a
/// measured duration is not available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTimeline {
    pub phase_id: String,
    pub expected_days: u32,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn upsert_phase(&self, phase: &Phase) -> Result<(), StoreError> {
        let key = keys::phase_key(&phase.id)?;
        self.phases.insert(key.as_bytes(), Self::serialize(phase)?)?;
        Ok(())
    }

    pub fn get_phase(&self, phase_id: &str) -> Result<Option<Phase>, StoreError> {
        let key = keys::phase_key(phase_id)?;
        match self.phases.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// All phases, ascending by `order` (ties broken by id).
    pub fn list_phases(&self) -> Result<Vec<Phase>, StoreError> {
        let mut phases: Vec<Phase> = Self::all_values(&self.phases)?;
        phases.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(phases)
    }

    pub fn upsert_phase_timeline(&self, timeline: &PhaseTimeline) -> Result<(), StoreError> {
        let key = keys::phase_timeline_key(&timeline.phase_id)?;
        self.phase_timelines
            .insert(key.as_bytes(), Self::serialize(timeline)?)?;
        Ok(())
    }

    pub fn list_phase_timelines(&self) -> Result<Vec<PhaseTimeline>, StoreError> {
        Self::all_values(&self.phase_timelines)
    }
}
