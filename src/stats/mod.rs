//! House (cohort) phase-duration statistics with a weekly persisted cache.
//!
//! Reads are served only from the cache for the current week; computing
//! fresh averages is an explicit, expensive admin action.

pub mod aggregate;
pub mod estimator;
pub mod week;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::cache::{ttl, QueryCache};
use crate::clock::Clock;
use crate::constants::{EXCLUDED_PHASE_NAME, HOUSES};
use crate::store::operations::goals::{DailyGoal, DailyReflection};
use crate::store::operations::house_stats::HouseStats;
use crate::store::operations::phases::{Phase, PhaseTimeline};
use crate::store::operations::users::Student;
use crate::store::{Store, StoreError};

use self::aggregate::average_days;
use self::estimator::estimate_phase;
use self::week::{phase_label, phase_label_number, WeekKey};

const PHASES_CACHE_KEY: &str = "reference:phases";
const TIMELINES_CACHE_KEY: &str = "reference:phase_timelines";
const REFERENCE_CACHE_PATTERN: &str = "reference:";

#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Document-store operations the statistics job depends on.
pub trait StatsSource: Send + Sync {
    fn phases(&self) -> Result<Vec<Phase>, StoreError>;

    fn phase_timelines(&self) -> Result<Vec<PhaseTimeline>, StoreError>;

    fn students_in_house(&self, house: &str) -> Result<Vec<Student>, StoreError>;

    fn goals_for_student(&self, student_id: &str) -> Result<Vec<DailyGoal>, StoreError>;

    /// Only the first stored reflection of a goal is ever inspected.
    fn first_reflection(&self, goal_id: &str) -> Result<Option<DailyReflection>, StoreError>;

    fn house_stats(&self, house: &str) -> Result<Vec<HouseStats>, StoreError>;

    /// Atomically replaces every cached record of `house` with `records`.
    fn replace_house_stats(&self, house: &str, records: &[HouseStats])
        -> Result<usize, StoreError>;
}

impl StatsSource for Store {
    fn phases(&self) -> Result<Vec<Phase>, StoreError> {
        self.list_phases()
    }

    fn phase_timelines(&self) -> Result<Vec<PhaseTimeline>, StoreError> {
        self.list_phase_timelines()
    }

    fn students_in_house(&self, house: &str) -> Result<Vec<Student>, StoreError> {
        self.list_students_by_house(house)
    }

    fn goals_for_student(&self, student_id: &str) -> Result<Vec<DailyGoal>, StoreError> {
        self.list_goals_by_student(student_id)
    }

    fn first_reflection(&self, goal_id: &str) -> Result<Option<DailyReflection>, StoreError> {
        self.first_reflection_for_goal(goal_id)
    }

    fn house_stats(&self, house: &str) -> Result<Vec<HouseStats>, StoreError> {
        self.list_house_stats(house)
    }

    fn replace_house_stats(
        &self,
        house: &str,
        records: &[HouseStats],
    ) -> Result<usize, StoreError> {
        Store::replace_house_stats(self, house, records)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseAverage {
    pub phase_label: String,
    pub average_days: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseRefreshOutcome {
    pub house: String,
    pub phase_count: usize,
    pub averages: Vec<HouseAverage>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub houses: Vec<HouseRefreshOutcome>,
    pub total_phases: usize,
    pub message: String,
}

/// Non-excluded phases sorted by order, plus expected days per phase id.
struct ReferenceData {
    phases: Vec<Phase>,
    expected_days: HashMap<String, u32>,
}

pub struct HouseStatsService {
    source: Arc<dyn StatsSource>,
    clock: Arc<dyn Clock>,
    reference_cache: QueryCache,
    reference_ttl: Duration,
}

impl HouseStatsService {
    pub fn new(source: Arc<dyn StatsSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            reference_cache: QueryCache::new(clock.clone()),
            clock,
            reference_ttl: ttl::LONG,
        }
    }

    pub fn with_reference_ttl(mut self, reference_ttl: Duration) -> Self {
        self.reference_ttl = reference_ttl;
        self
    }

    pub fn reference_cache(&self) -> &QueryCache {
        &self.reference_cache
    }

    pub fn current_week(&self) -> WeekKey {
        WeekKey::at(self.clock.now())
    }

    /// Cached averages for `house` for the current week, ordered by phase
    /// number. Empty when nothing was computed this week or the store could
    /// not be read; never triggers a recomputation.
    pub fn get_house_averages(&self, house: &str) -> Vec<HouseAverage> {
        let week = self.current_week();

        let cached = match self.source.house_stats(house) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::error!(house, error = %e, "Failed to read cached house stats");
                return Vec::new();
            }
        };

        let mut this_week: Vec<HouseStats> = cached
            .into_iter()
            .filter(|s| s.week_number == week.week_number && s.year == week.year)
            .collect();

        if this_week.is_empty() {
            tracing::warn!(
                house,
                week = week.week_number,
                year = week.year,
                "No cached house stats for current week"
            );
            return Vec::new();
        }

        this_week.sort_by_key(|s| phase_label_number(&s.phase_label));
        tracing::debug!(house, week = week.week_number, "Serving cached house stats");

        this_week
            .into_iter()
            .map(|s| HouseAverage {
                phase_label: s.phase_label,
                average_days: s.average_days,
            })
            .collect()
    }

    pub fn has_current_week_stats(&self, house: &str) -> bool {
        let week = self.current_week();
        match self.source.house_stats(house) {
            Ok(stats) => stats
                .iter()
                .any(|s| s.week_number == week.week_number && s.year == week.year),
            Err(e) => {
                tracing::warn!(house, error = %e, "Failed to check house stats freshness");
                false
            }
        }
    }

    /// Recomputes every phase average for `house` and replaces the house's
    /// cached records. Expensive: one reflection read per goal per student.
    /// Phases and expected durations are re-read, never served stale.
    pub fn calculate_and_cache_house_averages(
        &self,
        house: &str,
    ) -> Result<Vec<HouseAverage>, StatsError> {
        self.reference_cache
            .invalidate_pattern(REFERENCE_CACHE_PATTERN);
        let reference = self.load_reference()?;
        self.refresh_house(house, &reference)
    }

    /// Recomputes every house in turn over one read of the reference data.
    /// A failing house yields an empty result with its error text and does
    /// not stop the others.
    pub fn calculate_all_house_stats(&self) -> RefreshSummary {
        self.reference_cache
            .invalidate_pattern(REFERENCE_CACHE_PATTERN);
        let reference = self.load_reference().map_err(|e| e.to_string());

        let mut houses = Vec::with_capacity(HOUSES.len());
        for &house in HOUSES {
            let result = reference.as_ref().map_err(String::clone).and_then(|reference| {
                self.refresh_house(house, reference)
                    .map_err(|e| e.to_string())
            });
            let outcome = match result {
                Ok(averages) => HouseRefreshOutcome {
                    house: house.to_string(),
                    phase_count: averages.len(),
                    averages,
                    error: None,
                },
                Err(message) => {
                    tracing::error!(house, error = %message, "Failed to calculate house stats");
                    HouseRefreshOutcome {
                        house: house.to_string(),
                        phase_count: 0,
                        averages: Vec::new(),
                        error: Some(message),
                    }
                }
            };
            houses.push(outcome);
        }

        let total_phases = houses.iter().map(|h| h.phase_count).sum();
        RefreshSummary {
            houses,
            total_phases,
            message: format!(
                "Successfully recalculated house statistics! Updated {total_phases} phase averages across all houses."
            ),
        }
    }

    fn load_reference(&self) -> Result<ReferenceData, StoreError> {
        let expected_days: HashMap<String, u32> = self
            .cached_timelines()?
            .into_iter()
            .map(|t| (t.phase_id, t.expected_days))
            .collect();

        let mut phases: Vec<Phase> = self
            .cached_phases()?
            .into_iter()
            .filter(|p| p.name != EXCLUDED_PHASE_NAME)
            .collect();
        phases.sort_by_key(|p| p.order);

        Ok(ReferenceData {
            phases,
            expected_days,
        })
    }

    fn refresh_house(
        &self,
        house: &str,
        reference: &ReferenceData,
    ) -> Result<Vec<HouseAverage>, StatsError> {
        tracing::info!(house, "Starting house stats calculation");

        let students = self.source.students_in_house(house)?;
        tracing::info!(house, students = students.len(), "Resolved house members");

        let phases = &reference.phases;
        let mut measurable: Vec<Vec<DailyGoal>> = Vec::with_capacity(students.len());
        for student in &students {
            if student.campus_joining_date.is_none() {
                tracing::debug!(house, student_id = %student.id, "Skipping student without joining date");
                continue;
            }
            measurable.push(self.source.goals_for_student(&student.id)?);
        }

        let week = self.current_week();
        let now = self.clock.now();
        let mut records = Vec::with_capacity(phases.len());
        let mut averages = Vec::with_capacity(phases.len());

        for (index, phase) in phases.iter().enumerate() {
            let fallback = reference.expected_days.get(&phase.id).copied();
            let contributions: Vec<u32> = measurable
                .iter()
                .filter_map(|goals| {
                    estimate_phase(goals, phases, index, |goal: &DailyGoal| {
                        self.source.first_reflection(&goal.id)
                    })
                    .contribution(fallback)
                })
                .collect();

            let average = average_days(&contributions);
            let label = phase_label(index + 1);
            tracing::info!(
                house,
                phase = %phase.name,
                label = %label,
                average_days = average.average_days,
                students = average.student_count,
                "Computed phase average"
            );

            records.push(HouseStats {
                id: uuid::Uuid::new_v4().to_string(),
                house: house.to_string(),
                phase_id: phase.id.clone(),
                phase_label: label.clone(),
                average_days: average.average_days,
                student_count: average.student_count,
                calculated_at: now,
                week_number: week.week_number,
                year: week.year,
                created_at: now,
                updated_at: now,
            });
            averages.push(HouseAverage {
                phase_label: label,
                average_days: average.average_days,
            });
        }

        let removed = self.source.replace_house_stats(house, &records)?;
        tracing::info!(
            house,
            removed,
            written = records.len(),
            week = week.week_number,
            year = week.year,
            "Replaced cached house stats"
        );

        Ok(averages)
    }

    fn cached_phases(&self) -> Result<Vec<Phase>, StoreError> {
        self.reference_cache
            .get_or_fetch(PHASES_CACHE_KEY, self.reference_ttl, || self.source.phases())
    }

    fn cached_timelines(&self) -> Result<Vec<PhaseTimeline>, StoreError> {
        self.reference_cache
            .get_or_fetch(TIMELINES_CACHE_KEY, self.reference_ttl, || {
                self.source.phase_timelines()
            })
    }
}
