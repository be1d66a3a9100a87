use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseAverage {
    pub average_days: u32,
    pub student_count: u32,
}

/// Arithmetic mean of the contributed durations, rounded half-up to a whole
/// day. No contributions gives an average of 0 over 0 students.
pub fn average_days(contributions: &[u32]) -> PhaseAverage {
    if contributions.is_empty() {
        return PhaseAverage {
            average_days: 0,
            student_count: 0,
        };
    }

    let n = contributions.len() as u64;
    let sum: u64 = contributions.iter().map(|&d| u64::from(d)).sum();
    // round(sum / n) == floor((2 * sum + n) / (2 * n))
    let rounded = (2 * sum + n) / (2 * n);

    PhaseAverage {
        average_days: u32::try_from(rounded).unwrap_or(u32::MAX),
        student_count: u32::try_from(n).unwrap_or(u32::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_contributions_average_to_zero() {
        assert_eq!(
            average_days(&[]),
            PhaseAverage {
                average_days: 0,
                student_count: 0
            }
        );
    }

    #[test]
    fn mean_is_rounded_half_up() {
        assert_eq!(average_days(&[3, 5, 4]).average_days, 4);
        assert_eq!(average_days(&[3, 4]).average_days, 4);
        assert_eq!(average_days(&[1, 2, 2]).average_days, 2);
        assert_eq!(average_days(&[1, 1, 2]).average_days, 1);
        assert_eq!(average_days(&[0]).average_days, 0);
    }

    #[test]
    fn student_count_matches_contributions() {
        assert_eq!(average_days(&[7, 7, 7, 7]).student_count, 4);
    }
}
