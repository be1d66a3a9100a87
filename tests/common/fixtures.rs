use chrono::{DateTime, Duration, Utc};

use house_stats_backend::store::operations::goals::{DailyGoal, DailyReflection};
use house_stats_backend::store::operations::phases::{Phase, PhaseTimeline};
use house_stats_backend::store::operations::users::Student;
use house_stats_backend::store::Store;

use super::app::test_now;

pub fn days_ago(days: i64) -> DateTime<Utc> {
    test_now() - Duration::days(days)
}

pub fn seed_phase(store: &Store, name: &str, order: i32) -> Phase {
    let phase = Phase {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.to_string(),
        order,
        start_date: None,
        end_date: None,
        created_at: days_ago(365),
    };
    store.upsert_phase(&phase).expect("upsert seed phase");
    phase
}

/// Phases named `Phase A`, `Phase B`, ... with orders 1..=count.
pub fn seed_phases(store: &Store, count: usize) -> Vec<Phase> {
    (0..count)
        .map(|idx| {
            let letter = char::from(b'A' + idx as u8);
            seed_phase(store, &format!("Phase {letter}"), idx as i32 + 1)
        })
        .collect()
}

pub fn seed_timeline(store: &Store, phase: &Phase, expected_days: u32) -> PhaseTimeline {
    let timeline = PhaseTimeline {
        phase_id: phase.id.clone(),
        expected_days,
        updated_at: days_ago(30),
    };
    store
        .upsert_phase_timeline(&timeline)
        .expect("upsert seed timeline");
    timeline
}

pub fn seed_student(store: &Store, house: &str, joined: bool) -> Student {
    let id = uuid::Uuid::new_v4().to_string();
    let student = Student {
        name: format!("student-{}", &id[..8]),
        id,
        house: Some(house.to_string()),
        campus_joining_date: joined.then(|| days_ago(200)),
        created_at: days_ago(200),
    };
    store.upsert_student(&student).expect("upsert seed student");
    student
}

pub fn seed_goal(store: &Store, student: &Student, phase: &Phase, at: DateTime<Utc>) -> DailyGoal {
    let goal = DailyGoal {
        id: uuid::Uuid::new_v4().to_string(),
        student_id: student.id.clone(),
        phase_id: phase.id.clone(),
        topic_id: "topic-1".to_string(),
        created_at: at,
    };
    store.create_goal(&goal).expect("create seed goal");
    goal
}

pub fn seed_reflection(
    store: &Store,
    goal: &DailyGoal,
    achieved_percentage: u8,
    at: DateTime<Utc>,
) -> DailyReflection {
    let reflection = DailyReflection {
        id: uuid::Uuid::new_v4().to_string(),
        goal_id: goal.id.clone(),
        achieved_percentage,
        created_at: at,
    };
    store
        .create_reflection(&reflection)
        .expect("create seed reflection");
    reflection
}

/// A goal in `phase` started `started_days_ago` and fully achieved after
/// `took_days`.
pub fn seed_completed_phase(
    store: &Store,
    student: &Student,
    phase: &Phase,
    started_days_ago: i64,
    took_days: i64,
) -> DailyGoal {
    let start = days_ago(started_days_ago);
    let goal = seed_goal(store, student, phase, start);
    seed_reflection(store, &goal, 100, start + Duration::days(took_days));
    goal
}
