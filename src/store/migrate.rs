use crate::store::keys;
use crate::store::operations::users::Student;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_users_by_house_index", m002_users_by_house_index),
    ]
}

/// Applies every migration newer than the stored version.
///
/// Each migration must be idempotent: a crash between the migration body and
/// `set_version` re-runs it on the next start. Versions only move forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt schema version ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rebuilds the house index from the users tree, for stores whose users were
/// written by a loader that did not maintain it.
fn m002_users_by_house_index(store: &Store) -> Result<(), StoreError> {
    let mut indexed = 0usize;
    for item in store.users.iter() {
        let (_, value) = item?;
        let student: Student = Store::deserialize(&value)?;
        let Some(house) = student.house.as_deref() else {
            continue;
        };
        let key = keys::users_by_house_key(house, &student.id)?;
        store
            .users_by_house
            .insert(key.as_bytes(), student.id.as_bytes())?;
        indexed += 1;
    }
    tracing::info!(indexed, "Rebuilt users_by_house index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        run(&store).unwrap();
        let first = get_current_version(&store).unwrap();
        run(&store).unwrap();
        let second = get_current_version(&store).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn downgrade_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db2");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        set_version(&store, 3).unwrap();
        let err = set_version(&store, 2).unwrap_err();
        assert!(matches!(err, StoreError::Migration { .. }));
    }

    #[test]
    fn index_is_rebuilt_for_raw_user_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db3");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        let student = Student {
            id: "s1".to_string(),
            name: "Asha".to_string(),
            house: Some("Malhar".to_string()),
            campus_joining_date: Some(Utc::now()),
            created_at: Utc::now(),
        };
        // Written straight into the primary tree, bypassing upsert_student.
        store
            .users
            .insert(b"s1", serde_json::to_vec(&student).unwrap())
            .unwrap();
        assert!(store.list_students_by_house("Malhar").unwrap().is_empty());

        run(&store).unwrap();
        assert_eq!(store.list_students_by_house("Malhar").unwrap().len(), 1);
    }
}
