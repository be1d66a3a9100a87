/// 参与统计的全部 house（cohort），顺序即批量重算顺序
pub const HOUSES: &[&str] = &["Bageshree", "Malhar", "Bhairav"];

/// 不参与阶段统计的 phase 名称（精确匹配）
pub const EXCLUDED_PHASE_NAME: &str = "Self Learning Space";

/// 阶段标签前缀，完整标签形如 "Phase 3"
pub const PHASE_LABEL_PREFIX: &str = "Phase ";

/// reflection 达成度满分，只有满分才算完成
pub const FULL_ACHIEVEMENT_PERCENTAGE: u8 = 100;

/// 每天毫秒数
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// 每周毫秒数
pub const MILLIS_PER_WEEK: i64 = 7 * MILLIS_PER_DAY;

/// 默认参考数据缓存 TTL（秒）
pub const DEFAULT_REFERENCE_CACHE_TTL_SECS: u64 = 900;

pub fn is_known_house(house: &str) -> bool {
    HOUSES.contains(&house)
}
