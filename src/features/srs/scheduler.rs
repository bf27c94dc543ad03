use chrono::{Duration, NaiveDateTime};

use crate::data::models::Difficulty;

/// Forgetting-curve review intervals in hours: 1h, 8h, 1d, 3d, 1wk, 2wk, 1mo.
pub const REVIEW_INTERVALS: [f64; 7] = [1.0, 8.0, 24.0, 72.0, 168.0, 336.0, 720.0];

/// Scheduling outcome for a single review.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleUpdate {
    pub next_interval_hours: f64,
    pub mastery_level: i32,
}

/// Computes the next interval and mastery level from one review outcome.
///
/// Pure: the caller turns the relative interval into an absolute time with
/// [`due_at`] and its own clock.
pub fn next_review(
    difficulty: Difficulty,
    current_interval_hours: f64,
    mastery_level: i32,
    view_count: i32,
) -> ScheduleUpdate {
    // A record that has never been scheduled carries a zero interval; the
    // multiplier branches start from the first rung instead.
    let current = if current_interval_hours > 0.0 {
        current_interval_hours
    } else {
        REVIEW_INTERVALS[0]
    };

    let (next_interval_hours, mastery_level) = match difficulty {
        // Start over from the first rung
        Difficulty::Again => (REVIEW_INTERVALS[0], (mastery_level - 20).max(0)),
        // Shortened growth, mastery slips a little
        Difficulty::Hard => (
            (current * 1.2).max(REVIEW_INTERVALS[0]),
            (mastery_level - 10).max(0),
        ),
        // Walk the ladder until it runs out, then keep growing
        Difficulty::Normal => {
            let interval = if (view_count as usize) < REVIEW_INTERVALS.len() {
                REVIEW_INTERVALS[view_count as usize]
            } else {
                current * 1.5
            };
            (interval, (mastery_level + 10).min(100))
        }
        // Double up, mastery jumps
        Difficulty::Easy => (current * 2.0, (mastery_level + 20).min(100)),
    };

    ScheduleUpdate {
        next_interval_hours,
        mastery_level,
    }
}

/// Interval used by the accuracy-driven update path: the recomputed mastery
/// percentage picks a rung through fixed thresholds.
pub fn mastery_interval_hours(mastery_level: i32) -> f64 {
    if mastery_level >= 80 {
        REVIEW_INTERVALS[(mastery_level as usize / 15).min(6)]
    } else if mastery_level >= 60 {
        REVIEW_INTERVALS[2]
    } else if mastery_level >= 40 {
        REVIEW_INTERVALS[1]
    } else {
        REVIEW_INTERVALS[0]
    }
}

/// Absolute review time for a relative interval.
pub fn due_at(now: NaiveDateTime, interval_hours: f64) -> NaiveDateTime {
    now + Duration::seconds((interval_hours * 3600.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const DIFFICULTIES: [Difficulty; 4] = [
        Difficulty::Again,
        Difficulty::Hard,
        Difficulty::Normal,
        Difficulty::Easy,
    ];

    #[test]
    fn intervals_positive_and_mastery_in_range() {
        for difficulty in DIFFICULTIES {
            for mastery in [0, 5, 50, 95, 100] {
                for (interval, views) in [(0.0, 0), (1.0, 1), (24.0, 3), (720.0, 12)] {
                    let update = next_review(difficulty, interval, mastery, views);
                    assert!(update.next_interval_hours > 0.0);
                    assert!((0..=100).contains(&update.mastery_level));
                }
            }
        }
    }

    #[test]
    fn again_always_resets_to_first_rung() {
        for interval in [0.0, 1.0, 168.0, 720.0] {
            let update = next_review(Difficulty::Again, interval, 50, 9);
            assert_eq!(update.next_interval_hours, REVIEW_INTERVALS[0]);
        }
        assert_eq!(next_review(Difficulty::Again, 720.0, 50, 9).mastery_level, 30);
        assert_eq!(next_review(Difficulty::Again, 1.0, 10, 1).mastery_level, 0);
    }

    #[test]
    fn hard_shrinks_growth_but_never_below_first_rung() {
        let update = next_review(Difficulty::Hard, 10.0, 50, 3);
        assert_eq!(update.next_interval_hours, 12.0);
        assert_eq!(update.mastery_level, 40);

        // First-ever review: zero interval is promoted to the first rung
        let update = next_review(Difficulty::Hard, 0.0, 0, 0);
        assert!(update.next_interval_hours >= REVIEW_INTERVALS[0]);
        assert_eq!(update.mastery_level, 0);
    }

    #[test]
    fn normal_walks_the_ladder_then_multiplies() {
        for views in 0..7 {
            let update = next_review(Difficulty::Normal, 1.0, 0, views);
            assert_eq!(update.next_interval_hours, REVIEW_INTERVALS[views as usize]);
        }
        let update = next_review(Difficulty::Normal, 720.0, 50, 7);
        assert_eq!(update.next_interval_hours, 1080.0);
        assert_eq!(update.mastery_level, 60);
    }

    #[test]
    fn easy_doubles_even_from_zero() {
        assert_eq!(next_review(Difficulty::Easy, 24.0, 10, 3).next_interval_hours, 48.0);
        assert_eq!(
            next_review(Difficulty::Easy, 0.0, 0, 0).next_interval_hours,
            REVIEW_INTERVALS[0] * 2.0
        );
    }

    #[test]
    fn mastery_moves_one_way_per_difficulty_class() {
        for mastery in [0, 10, 50, 90, 100] {
            assert!(next_review(Difficulty::Again, 8.0, mastery, 2).mastery_level <= mastery);
            assert!(next_review(Difficulty::Hard, 8.0, mastery, 2).mastery_level <= mastery);
            assert!(next_review(Difficulty::Normal, 8.0, mastery, 2).mastery_level >= mastery);
            assert!(next_review(Difficulty::Easy, 8.0, mastery, 2).mastery_level >= mastery);
        }
    }

    #[test]
    fn threshold_mapping_picks_the_expected_rungs() {
        assert_eq!(mastery_interval_hours(0), 1.0);
        assert_eq!(mastery_interval_hours(39), 1.0);
        assert_eq!(mastery_interval_hours(40), 8.0);
        assert_eq!(mastery_interval_hours(59), 8.0);
        assert_eq!(mastery_interval_hours(60), 24.0);
        assert_eq!(mastery_interval_hours(79), 24.0);
        // 80/15 = 5 -> two weeks
        assert_eq!(mastery_interval_hours(80), 336.0);
        assert_eq!(mastery_interval_hours(89), 336.0);
        // 90/15 = 6 -> one month, same as a perfect score
        assert_eq!(mastery_interval_hours(90), 720.0);
        assert_eq!(mastery_interval_hours(100), 720.0);
    }

    #[test]
    fn due_at_adds_fractional_hours() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(due_at(now, 1.0), now + Duration::hours(1));
        assert_eq!(due_at(now, 1.5), now + Duration::minutes(90));
    }
}
