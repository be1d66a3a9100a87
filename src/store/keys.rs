use crate::store::StoreError;

const SEPARATOR: char = ':';

/// 组成复合 key 的片段不能包含分隔符，否则前缀扫描会串到别的实体
fn segment<'a>(field: &str, value: &'a str) -> Result<&'a str, StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{field} must not be empty")));
    }
    if value.contains(SEPARATOR) {
        return Err(StoreError::Validation(format!(
            "{field} must not contain '{SEPARATOR}': {value}"
        )));
    }
    Ok(value)
}

pub fn user_key(user_id: &str) -> Result<String, StoreError> {
    Ok(segment("user_id", user_id)?.to_string())
}

pub fn users_by_house_key(house: &str, user_id: &str) -> Result<String, StoreError> {
    Ok(format!(
        "{}:{}",
        segment("house", house)?,
        segment("user_id", user_id)?
    ))
}

pub fn users_by_house_prefix(house: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("house", house)?))
}

pub fn phase_key(phase_id: &str) -> Result<String, StoreError> {
    Ok(segment("phase_id", phase_id)?.to_string())
}

pub fn phase_timeline_key(phase_id: &str) -> Result<String, StoreError> {
    phase_key(phase_id)
}

pub fn goal_key(student_id: &str, goal_id: &str) -> Result<String, StoreError> {
    Ok(format!(
        "{}:{}",
        segment("student_id", student_id)?,
        segment("goal_id", goal_id)?
    ))
}

pub fn goal_prefix(student_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("student_id", student_id)?))
}

/// Reflections sort oldest-first under their goal. Pre-epoch timestamps
/// have no zero-padded encoding that keeps that order and are rejected.
pub fn reflection_key(
    goal_id: &str,
    timestamp_ms: i64,
    reflection_id: &str,
) -> Result<String, StoreError> {
    let ts = u64::try_from(timestamp_ms).map_err(|_| {
        StoreError::Validation(format!(
            "reflection timestamp must not precede 1970-01-01, got {timestamp_ms} ms"
        ))
    })?;
    Ok(format!(
        "{}:{:020}:{}",
        segment("goal_id", goal_id)?,
        ts,
        segment("reflection_id", reflection_id)?
    ))
}

pub fn reflection_prefix(goal_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("goal_id", goal_id)?))
}

pub fn house_stats_key(
    house: &str,
    year: i32,
    week_number: u32,
    phase_id: &str,
    stat_id: &str,
) -> Result<String, StoreError> {
    Ok(format!(
        "{}:{:04}-{:02}:{}:{}",
        segment("house", house)?,
        year,
        week_number,
        segment("phase_id", phase_id)?,
        segment("stat_id", stat_id)?
    ))
}

pub fn house_stats_prefix(house: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("house", house)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflection_key_orders_by_time_asc() {
        let older = reflection_key("g1", 1_000, "r9").unwrap();
        let newer = reflection_key("g1", 2_000, "r1").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn pre_epoch_reflection_key_is_rejected() {
        let err = reflection_key("g1", -1, "r1").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(reflection_key("g1", 0, "r1").is_ok());
    }

    #[test]
    fn separator_in_segment_is_rejected() {
        let err = goal_key("student:1", "g1").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn house_prefix_does_not_match_longer_house_name() {
        let key = house_stats_key("Malhar2", 2025, 3, "p1", "s1").unwrap();
        let prefix = house_stats_prefix("Malhar").unwrap();
        assert!(!key.starts_with(&prefix));
    }
}
