pub const META: &str = "meta";

// Reference data
pub const PHASES: &str = "phases";
pub const PHASE_TIMELINES: &str = "phase_timelines";

// Activity data written by upstream subsystems
pub const USERS: &str = "users";
pub const DAILY_GOALS: &str = "daily_goals";
pub const DAILY_REFLECTIONS: &str = "daily_reflections";

// Weekly statistics cache
pub const HOUSE_STATS: &str = "house_stats";

// Secondary index trees
pub const USERS_BY_HOUSE: &str = "users_by_house";
