//! Achievement codes and their messages.
//!
//! A closed set of variants, each carrying its typed parameters and a
//! pure formatting function per audience. The dedup ledger stores the
//! `code()` string together with a context computed by the rule that
//! fired (e.g. the month being ranked, or the streak length).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Achievement {
    /// Top-3 total hours over the previous month. 1-based rank.
    MonthlyRank { rank: u8 },
    ConsecutiveDays { days: u32 },
    /// Cumulative hours this month crossed a 10-hour boundary.
    MonthlyHours { hours: u32 },
    /// Distinct usage days this month reached 10, 20 or 30.
    MonthlyVisits { count: u32 },
    /// First check-in system-wide for the day.
    FirstArrival,
    WeekendWarrior,
    LateFinisher,
}

impl Achievement {
    pub fn code(&self) -> String {
        match self {
            Achievement::MonthlyRank { rank } => format!("monthly_rank_{}", rank),
            Achievement::ConsecutiveDays { .. } => "consecutive_days".to_string(),
            Achievement::MonthlyHours { .. } => "monthly_hours".to_string(),
            Achievement::MonthlyVisits { count } => format!("monthly_visits_{}", count),
            Achievement::FirstArrival => "first_arrival".to_string(),
            Achievement::WeekendWarrior => "weekend_warrior".to_string(),
            Achievement::LateFinisher => "late_finisher".to_string(),
        }
    }

    /// Short congratulation shown on the terminal the student used.
    pub fn student_message(&self) -> String {
        match self {
            Achievement::MonthlyRank { rank: 1 } => {
                "You were last month's most dedicated user!!!".to_string()
            }
            Achievement::MonthlyRank { rank: 2 } => {
                "You were last month's second most dedicated user!!".to_string()
            }
            Achievement::MonthlyRank { rank: _ } => {
                "You ranked third in study room hours last month!".to_string()
            }
            Achievement::ConsecutiveDays { days } => {
                format!("{} days in a row! Keep it up!", days)
            }
            Achievement::MonthlyHours { hours } => {
                format!("You passed {} study hours this month!", hours)
            }
            Achievement::MonthlyVisits { count: 10 } => {
                "Your 10th visit this month! Steady progress toward your goal!".to_string()
            }
            Achievement::MonthlyVisits { count: 20 } => {
                "Amazing, your 20th visit this month! Effort builds confidence.".to_string()
            }
            Achievement::MonthlyVisits { count } => {
                format!("Visit number {} this month! You are a genius of effort!!", count)
            }
            Achievement::FirstArrival => {
                "First one in! Have a great day of studying!".to_string()
            }
            Achievement::WeekendWarrior => {
                "Studying on the weekend, impressive!".to_string()
            }
            Achievement::LateFinisher => {
                "Well done staying so late! Great work today!".to_string()
            }
        }
    }

    /// Formal line appended to the guardian notification.
    pub fn guardian_message(&self, name: &str) -> String {
        match self {
            Achievement::MonthlyRank { rank } => format!(
                "We are pleased to report that {} ranked number {} school-wide in study room hours last month.",
                name, rank
            ),
            Achievement::ConsecutiveDays { days } => format!(
                "{} has now used the study room {} days in a row.",
                name, days
            ),
            Achievement::MonthlyHours { hours } => format!(
                "{}'s study room time this month has passed {} hours.",
                name, hours
            ),
            Achievement::MonthlyVisits { count } => format!(
                "{} has visited the study room {} times this month.",
                name, count
            ),
            Achievement::FirstArrival => format!(
                "{} was the first student in the study room today.",
                name
            ),
            Achievement::WeekendWarrior => format!(
                "{} spent part of the weekend studying in the study room.",
                name
            ),
            Achievement::LateFinisher => format!(
                "{} kept studying until late today.",
                name
            ),
        }
    }

    /// Title granted by ranking achievements; None for the others.
    pub fn title(&self) -> Option<&'static str> {
        match self {
            Achievement::MonthlyRank { rank: 1 } => Some(TITLE_FIRST),
            Achievement::MonthlyRank { rank: 2 } => Some(TITLE_SECOND),
            Achievement::MonthlyRank { rank: _ } => Some(TITLE_THIRD),
            _ => None,
        }
    }
}

pub const TITLE_FIRST: &str = "Top Seat";
pub const TITLE_SECOND: &str = "Second Seat";
pub const TITLE_THIRD: &str = "Third Seat";

/// Strict ordering of titles for monotonic upgrades; unknown or absent
/// titles rank lowest.
pub fn title_rank(title: Option<&str>) -> u8 {
    match title {
        Some(TITLE_FIRST) => 3,
        Some(TITLE_SECOND) => 2,
        Some(TITLE_THIRD) => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_ledger_convention() {
        assert_eq!(Achievement::MonthlyRank { rank: 2 }.code(), "monthly_rank_2");
        assert_eq!(Achievement::MonthlyVisits { count: 20 }.code(), "monthly_visits_20");
        assert_eq!(Achievement::LateFinisher.code(), "late_finisher");
    }

    #[test]
    fn titles_only_for_ranks() {
        assert_eq!(Achievement::MonthlyRank { rank: 1 }.title(), Some(TITLE_FIRST));
        assert_eq!(Achievement::FirstArrival.title(), None);
    }

    #[test]
    fn title_ordering_is_strict() {
        assert!(title_rank(Some(TITLE_FIRST)) > title_rank(Some(TITLE_SECOND)));
        assert!(title_rank(Some(TITLE_SECOND)) > title_rank(Some(TITLE_THIRD)));
        assert!(title_rank(Some(TITLE_THIRD)) > title_rank(None));
    }
}
