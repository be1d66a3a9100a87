use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;

use crate::store::keys;
use crate::store::{Store, StoreError};

/// A mentee account as seen by the statistics job. Owned by the user
/// management subsystem; this service only reads house membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub house: Option<String>,
    /// Earliest date the student could have any activity. Students without
    /// one are not yet measurable and are skipped by the statistics job.
    #[serde(default)]
    pub campus_joining_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn map_tx_error(error: sled::transaction::TransactionError<StoreError>) -> StoreError {
    match error {
        sled::transaction::TransactionError::Abort(store_error) => store_error,
        sled::transaction::TransactionError::Storage(storage_error) => {
            StoreError::Sled(storage_error)
        }
    }
}

impl Store {
    /// Inserts or replaces a student and keeps the house index in step.
    pub fn upsert_student(&self, student: &Student) -> Result<(), StoreError> {
        let user_key = keys::user_key(&student.id)?;
        let user_bytes = Self::serialize(student)?;
        let new_index_key = student
            .house
            .as_deref()
            .map(|house| keys::users_by_house_key(house, &student.id))
            .transpose()?;
        let student_id = student.id.clone();

        (&self.users, &self.users_by_house)
            .transaction(|(tx_users, tx_index)| {
                if let Some(old_raw) = tx_users.get(user_key.as_bytes())? {
                    let old: Student = serde_json::from_slice(&old_raw).map_err(|error| {
                        sled::transaction::ConflictableTransactionError::Abort(
                            StoreError::Serialization(error),
                        )
                    })?;
                    if let Some(old_house) = old.house.as_deref() {
                        let old_index_key = keys::users_by_house_key(old_house, &student_id)
                            .map_err(sled::transaction::ConflictableTransactionError::Abort)?;
                        tx_index.remove(old_index_key.as_bytes())?;
                    }
                }

                tx_users.insert(user_key.as_bytes(), user_bytes.as_slice())?;
                if let Some(index_key) = &new_index_key {
                    tx_index.insert(index_key.as_bytes(), student_id.as_bytes())?;
                }
                Ok(())
            })
            .map_err(map_tx_error)
    }

    pub fn get_student(&self, student_id: &str) -> Result<Option<Student>, StoreError> {
        let key = keys::user_key(student_id)?;
        match self.users.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Students whose stored house equals `house` exactly. No case folding.
    pub fn list_students_by_house(&self, house: &str) -> Result<Vec<Student>, StoreError> {
        let prefix = keys::users_by_house_prefix(house)?;
        let mut students = Vec::new();

        for item in self.users_by_house.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            let student_id = match std::str::from_utf8(&value) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(error = %e, house, "Invalid UTF-8 in house index");
                    continue;
                }
            };
            match self.get_student(student_id)? {
                Some(student) if student.house.as_deref() == Some(house) => {
                    students.push(student)
                }
                _ => {
                    tracing::warn!(house, student_id, "Dangling house index entry");
                }
            }
        }

        Ok(students)
    }

    pub fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let mut students: Vec<Student> = Self::all_values(&self.users)?;
        students.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(students)
    }
}
