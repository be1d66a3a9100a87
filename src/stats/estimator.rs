//! Per-student phase duration estimate.
//!
//! For one student and one phase the student falls into exactly one
//! [`PhaseProgress`] state, checked in this order:
//!
//! 1. no goals in the phase but goals in a strictly later phase: `Skipped`
//! 2. no goals in the phase or any later phase: `NotReached`
//! 3. goals in the phase and at least one 100% reflection: `Completed`
//! 4. goals in the phase but nothing fully achieved: `InProgress`

use std::fmt::Display;

use chrono::{DateTime, Utc};

use crate::constants::MILLIS_PER_DAY;
use crate::store::operations::goals::{DailyGoal, DailyReflection};
use crate::store::operations::phases::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseProgress {
    NotReached,
    Skipped,
    InProgress,
    Completed { days: u32 },
}

impl PhaseProgress {
    /// Days this student adds to the phase average, if any. Skipped and
    /// in-progress students contribute the phase's expected days; a missing
    /// or zero expectation means they contribute nothing.
    pub fn contribution(self, expected_days: Option<u32>) -> Option<u32> {
        match self {
            Self::NotReached => None,
            Self::Skipped | Self::InProgress => expected_days.filter(|days| *days > 0),
            Self::Completed { days } => Some(days),
        }
    }
}

/// Whole days from `start` to `end`, rounded up and never negative.
pub fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let ms = (end - start).num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    let days = (ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Classifies one student against `phases[index]`.
///
/// `phases` must already be filtered and sorted by order; `goals` are all of
/// the student's goals. `first_reflection` is called once per goal of the
/// phase and must return only the first reflection stored for that goal. A
/// failed lookup is logged and that goal is treated as having no reflection.
pub fn estimate_phase<E, F>(
    goals: &[DailyGoal],
    phases: &[Phase],
    index: usize,
    mut first_reflection: F,
) -> PhaseProgress
where
    E: Display,
    F: FnMut(&DailyGoal) -> Result<Option<DailyReflection>, E>,
{
    let Some(phase) = phases.get(index) else {
        return PhaseProgress::NotReached;
    };

    let phase_goals: Vec<&DailyGoal> = goals.iter().filter(|g| g.phase_id == phase.id).collect();

    let Some(start) = phase_goals.iter().map(|g| g.created_at).min() else {
        let has_later_phase = phases[index + 1..]
            .iter()
            .any(|later| goals.iter().any(|g| g.phase_id == later.id));
        return if has_later_phase {
            PhaseProgress::Skipped
        } else {
            PhaseProgress::NotReached
        };
    };

    let mut completed_at: Option<DateTime<Utc>> = None;
    for goal in &phase_goals {
        match first_reflection(goal) {
            Ok(Some(reflection)) if reflection.is_fully_achieved() => {
                completed_at = Some(match completed_at {
                    Some(current) => current.max(reflection.created_at),
                    None => reflection.created_at,
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    goal_id = %goal.id,
                    phase_id = %phase.id,
                    error = %e,
                    "Reflection lookup failed, continuing with remaining goals"
                );
            }
        }
    }

    match completed_at {
        Some(end) => PhaseProgress::Completed {
            days: days_between(start, end),
        },
        None => PhaseProgress::InProgress,
    }
}
