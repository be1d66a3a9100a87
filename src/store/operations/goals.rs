use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::FULL_ACHIEVEMENT_PERCENTAGE;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyGoal {
    pub id: String,
    pub student_id: String,
    pub phase_id: String,
    pub topic_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReflection {
    pub id: String,
    pub goal_id: String,
    /// 0..=100
    pub achieved_percentage: u8,
    pub created_at: DateTime<Utc>,
}

impl DailyReflection {
    pub fn is_fully_achieved(&self) -> bool {
        self.achieved_percentage == FULL_ACHIEVEMENT_PERCENTAGE
    }
}

impl Store {
    pub fn create_goal(&self, goal: &DailyGoal) -> Result<(), StoreError> {
        let key = keys::goal_key(&goal.student_id, &goal.id)?;
        self.daily_goals
            .insert(key.as_bytes(), Self::serialize(goal)?)?;
        Ok(())
    }

    pub fn list_goals_by_student(&self, student_id: &str) -> Result<Vec<DailyGoal>, StoreError> {
        let prefix = keys::goal_prefix(student_id)?;
        Self::scan_prefix_values(&self.daily_goals, &prefix)
    }

    pub fn create_reflection(&self, reflection: &DailyReflection) -> Result<(), StoreError> {
        if reflection.achieved_percentage > FULL_ACHIEVEMENT_PERCENTAGE {
            return Err(StoreError::Validation(format!(
                "achieved_percentage must be within 0..=100, got {}",
                reflection.achieved_percentage
            )));
        }
        let key = keys::reflection_key(
            &reflection.goal_id,
            reflection.created_at.timestamp_millis(),
            &reflection.id,
        )?;
        self.daily_reflections
            .insert(key.as_bytes(), Self::serialize(reflection)?)?;
        Ok(())
    }

    /// Reflections on a goal, oldest first.
    pub fn list_reflections_by_goal(
        &self,
        goal_id: &str,
    ) -> Result<Vec<DailyReflection>, StoreError> {
        let prefix = keys::reflection_prefix(goal_id)?;
        Self::scan_prefix_values(&self.daily_reflections, &prefix)
    }

    /// The first reflection returned for a goal. Later reflections on the
    /// same goal are never looked at by the statistics job.
    pub fn first_reflection_for_goal(
        &self,
        goal_id: &str,
    ) -> Result<Option<DailyReflection>, StoreError> {
        let prefix = keys::reflection_prefix(goal_id)?;
        match self.daily_reflections.scan_prefix(prefix.as_bytes()).next() {
            Some(item) => {
                let (_, value) = item?;
                Ok(Some(Self::deserialize(&value)?))
            }
            None => Ok(None),
        }
    }
}
