use chrono::{Duration, Local, NaiveDateTime, NaiveTime, Timelike, Utc};
use diesel::prelude::*;

use crate::data::models::{
    ActivityEntry, DailyStat, Difficulty, LearningRecord, NewStudySession, ReminderStatus,
    StudyCard, UserStats,
};
use crate::data::repositories::LearningRecordRepository;
use crate::features::srs::scheduler;

/// Hours of the local day when a fragment-time reminder may fire.
const REMINDER_HOURS: [u32; 3] = [10, 15, 20];
/// How many due cards the reminder probe fetches.
const REMINDER_PROBE_LIMIT: i64 = 5;
/// How far back the activity feed reaches, and how many entries it keeps.
const ACTIVITY_WINDOW_DAYS: i64 = 7;
const ACTIVITY_LIMIT: i64 = 20;

/// The core SRS engine: records review outcomes and answers the due-queue,
/// statistics and reminder queries built on the learning records.
pub struct SrsEngine<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> SrsEngine<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        SrsEngine { conn }
    }

    /// Records one review outcome and reschedules the card.
    ///
    /// The record is created lazily on first review. Counter updates, the
    /// recomputed mastery level and the session log entry commit as a single
    /// transaction. The raw difficulty only goes to the session log; the
    /// persisted schedule follows the recomputed accuracy thresholds.
    pub fn record_review(
        &mut self,
        user_id: i32,
        card_id: i32,
        difficulty: Difficulty,
        is_correct: bool,
        time_spent: i32,
    ) -> Result<LearningRecord, diesel::result::Error> {
        let now = Utc::now().naive_utc();

        self.conn.transaction(|conn| {
            let record = match LearningRecordRepository::find(conn, user_id, card_id)? {
                Some(record) => record,
                None => LearningRecordRepository::create(
                    conn,
                    user_id,
                    card_id,
                    now,
                    scheduler::due_at(now, scheduler::REVIEW_INTERVALS[0]),
                )?,
            };

            let view_count = record.view_count + 1;
            let correct_count = record.correct_count + i32::from(is_correct);
            let wrong_count = record.wrong_count + i32::from(!is_correct);
            // Running accuracy percentage, never nudged incrementally
            let mastery_level = correct_count * 100 / view_count;

            let interval = scheduler::mastery_interval_hours(mastery_level);
            let next_review_at = scheduler::due_at(now, interval);

            let updated = LearningRecordRepository::update_after_review(
                conn,
                record.record_id,
                view_count,
                correct_count,
                wrong_count,
                now,
                next_review_at,
                mastery_level,
            )?;

            LearningRecordRepository::append_session(
                conn,
                &NewStudySession {
                    user_id,
                    card_id,
                    difficulty: difficulty.as_str(),
                    is_correct,
                    time_spent,
                    session_date: now,
                },
            )?;

            Ok(updated)
        })
    }

    /// Cards due for review, longest overdue first.
    pub fn due_cards(
        &mut self,
        user_id: i32,
        limit: i64,
    ) -> Result<Vec<(LearningRecord, StudyCard)>, diesel::result::Error> {
        let now = Utc::now().naive_utc();
        LearningRecordRepository::due_with_cards(self.conn, user_id, now, limit)
    }

    /// Per-user statistics. All counts run in one transaction so the mastery
    /// buckets always sum to the total.
    pub fn user_stats(&mut self, user_id: i32) -> Result<UserStats, diesel::result::Error> {
        let now = Utc::now().naive_utc();
        let today_start = start_of_local_day();

        self.conn.transaction(|conn| {
            Ok(UserStats {
                total_cards: LearningRecordRepository::count_all(conn, user_id)?,
                new_cards: LearningRecordRepository::count_mastery_between(conn, user_id, 0, 1)?,
                learning_cards: LearningRecordRepository::count_mastery_between(
                    conn, user_id, 1, 40,
                )?,
                review_cards: LearningRecordRepository::count_mastery_between(
                    conn, user_id, 40, 80,
                )?,
                mastered_cards: LearningRecordRepository::count_mastery_between(
                    conn, user_id, 80, 101,
                )?,
                due_cards: LearningRecordRepository::count_due(conn, user_id, now)?,
                today_reviewed: LearningRecordRepository::count_viewed_since(
                    conn,
                    user_id,
                    today_start,
                )?,
            })
        })
    }

    /// Reminder payload for the fragment-time windows. Quiet outside the
    /// reminder hours or when nothing is due.
    pub fn fragment_reminder(
        &mut self,
        user_id: i32,
        local_now: NaiveDateTime,
    ) -> Result<ReminderStatus, diesel::result::Error> {
        if !in_reminder_window(local_now) {
            return Ok(ReminderStatus::quiet());
        }

        let now = Utc::now().naive_utc();
        let due =
            LearningRecordRepository::due_with_cards(self.conn, user_id, now, REMINDER_PROBE_LIMIT)?;
        if due.is_empty() {
            return Ok(ReminderStatus::quiet());
        }

        let due_count = due.len() as i64;
        Ok(ReminderStatus {
            should_remind: true,
            due_count,
            message: Some(format!(
                "You have {} cards due for review. A spare minute is enough to go over them.",
                due_count
            )),
        })
    }

    /// Review activity for the trailing week: the newest session entries and
    /// a per-day review/correct series derived from them.
    pub fn recent_activity(
        &mut self,
        user_id: i32,
    ) -> Result<(Vec<ActivityEntry>, Vec<DailyStat>), diesel::result::Error> {
        let since = Utc::now().naive_utc() - Duration::days(ACTIVITY_WINDOW_DAYS);
        let rows =
            LearningRecordRepository::recent_sessions(self.conn, user_id, since, ACTIVITY_LIMIT)?;

        let today = Utc::now().date_naive();
        let daily = (0..ACTIVITY_WINDOW_DAYS)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                let mut review_count = 0;
                let mut correct_count = 0;
                for (session, _) in &rows {
                    if session.session_date.date() == date {
                        review_count += 1;
                        if session.is_correct {
                            correct_count += 1;
                        }
                    }
                }
                DailyStat {
                    date: date.format("%Y-%m-%d").to_string(),
                    review_count,
                    correct_count,
                }
            })
            .collect();

        let entries = rows
            .into_iter()
            .map(|(session, (title, subject))| ActivityEntry {
                id: session.session_id,
                card_title: title,
                subject,
                difficulty: session.difficulty,
                is_correct: session.is_correct,
                time_spent: session.time_spent,
                date: session.session_date,
            })
            .collect();

        Ok((entries, daily))
    }
}

/// Whether a local time falls in the first half hour of a reminder hour.
pub fn in_reminder_window(local_now: NaiveDateTime) -> bool {
    REMINDER_HOURS.contains(&local_now.hour()) && local_now.minute() < 30
}

/// Start of the local day, in the store's UTC timeline.
fn start_of_local_day() -> NaiveDateTime {
    let now = Local::now();
    now.with_time(NaiveTime::MIN)
        .single()
        .map(|midnight| midnight.naive_utc())
        // Local midnight can be skipped around DST changes
        .unwrap_or_else(|| now.date_naive().and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{learning_records, study_cards, study_sessions, users};
    use chrono::NaiveDate;
    use diesel_migrations::MigrationHarness;

    fn test_conn() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(crate::MIGRATIONS).unwrap();
        conn
    }

    fn last_rowid(conn: &mut SqliteConnection) -> i32 {
        diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("last_insert_rowid()"))
            .get_result(conn)
            .unwrap()
    }

    fn seed_user(conn: &mut SqliteConnection, email: &str) -> i32 {
        diesel::insert_into(users::table)
            .values((
                users::email.eq(email),
                users::username.eq("tester"),
                users::password.eq("hash"),
            ))
            .execute(conn)
            .unwrap();
        last_rowid(conn)
    }

    fn seed_card(conn: &mut SqliteConnection, user_id: i32, title: &str) -> i32 {
        diesel::insert_into(study_cards::table)
            .values((
                study_cards::user_id.eq(user_id),
                study_cards::title.eq(title),
                study_cards::subject.eq("math"),
                study_cards::core_point.eq("core"),
            ))
            .execute(conn)
            .unwrap();
        last_rowid(conn)
    }

    #[allow(clippy::too_many_arguments)]
    fn seed_record(
        conn: &mut SqliteConnection,
        user_id: i32,
        card_id: i32,
        view: i32,
        correct: i32,
        wrong: i32,
        mastery: i32,
        last_viewed_at: NaiveDateTime,
        next_review_at: NaiveDateTime,
    ) {
        diesel::insert_into(learning_records::table)
            .values((
                learning_records::user_id.eq(user_id),
                learning_records::card_id.eq(card_id),
                learning_records::view_count.eq(view),
                learning_records::correct_count.eq(correct),
                learning_records::wrong_count.eq(wrong),
                learning_records::mastery_level.eq(mastery),
                learning_records::last_viewed_at.eq(last_viewed_at),
                learning_records::next_review_at.eq(next_review_at),
            ))
            .execute(conn)
            .unwrap();
    }

    fn session_count(conn: &mut SqliteConnection) -> i64 {
        study_sessions::table.count().get_result(conn).unwrap()
    }

    #[test]
    fn first_review_lazily_creates_and_schedules_a_month_out() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let card_id = seed_card(&mut conn, user_id, "card");

        let record = SrsEngine::new(&mut conn)
            .record_review(user_id, card_id, Difficulty::Normal, true, 30)
            .unwrap();

        assert_eq!(record.view_count, 1);
        assert_eq!(record.correct_count, 1);
        assert_eq!(record.wrong_count, 0);
        // One correct answer scores a perfect running accuracy, which lands
        // on the top rung of the interval ladder
        assert_eq!(record.mastery_level, 100);
        assert_eq!(
            record.next_review_at - record.last_viewed_at,
            Duration::hours(720)
        );
        assert_eq!(session_count(&mut conn), 1);
    }

    #[test]
    fn wrong_answer_recomputes_mastery_and_shortens_the_interval() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let card_id = seed_card(&mut conn, user_id, "card");
        let now = Utc::now().naive_utc();
        seed_record(&mut conn, user_id, card_id, 10, 3, 7, 30, now, now);

        let record = SrsEngine::new(&mut conn)
            .record_review(user_id, card_id, Difficulty::Again, false, 12)
            .unwrap();

        assert_eq!(record.view_count, 11);
        assert_eq!(record.correct_count, 3);
        assert_eq!(record.wrong_count, 8);
        assert_eq!(record.mastery_level, 27);
        // Below the 40-percent threshold the schedule falls back to one hour
        assert_eq!(
            record.next_review_at - record.last_viewed_at,
            Duration::hours(1)
        );
    }

    #[test]
    fn counters_reconcile_over_any_sequence() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let card_id = seed_card(&mut conn, user_id, "card");

        let outcomes = [true, false, true, true, false, false, true];
        for (i, correct) in outcomes.into_iter().enumerate() {
            let record = SrsEngine::new(&mut conn)
                .record_review(user_id, card_id, Difficulty::Normal, correct, 5)
                .unwrap();
            assert_eq!(record.view_count, i as i32 + 1);
            assert_eq!(record.view_count, record.correct_count + record.wrong_count);
            assert!((0..=100).contains(&record.mastery_level));
        }
        assert_eq!(session_count(&mut conn), outcomes.len() as i64);

        let records: i64 = learning_records::table.count().get_result(&mut conn).unwrap();
        assert_eq!(records, 1);
    }

    #[test]
    fn due_cards_order_oldest_first_with_weakest_tie_break() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let overdue_long = seed_card(&mut conn, user_id, "overdue-long");
        let overdue_short = seed_card(&mut conn, user_id, "overdue-short");
        let not_due = seed_card(&mut conn, user_id, "not-due");
        let now = Utc::now().naive_utc();

        seed_record(&mut conn, user_id, overdue_long, 5, 5, 0, 50, now, now - Duration::hours(2));
        seed_record(&mut conn, user_id, overdue_short, 5, 0, 5, 50, now, now - Duration::hours(1));
        seed_record(&mut conn, user_id, not_due, 5, 2, 3, 50, now, now + Duration::hours(1));

        let due = SrsEngine::new(&mut conn).due_cards(user_id, 10).unwrap();
        let ids: Vec<i32> = due.iter().map(|(record, _)| record.card_id).collect();
        assert_eq!(ids, vec![overdue_long, overdue_short]);

        // Equal due times: fewest correct answers surfaces first
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "b@example.com");
        let strong = seed_card(&mut conn, user_id, "strong");
        let weak = seed_card(&mut conn, user_id, "weak");
        let due_at = now - Duration::hours(3);
        seed_record(&mut conn, user_id, strong, 5, 3, 2, 60, now, due_at);
        seed_record(&mut conn, user_id, weak, 5, 0, 5, 0, now, due_at);

        let due = SrsEngine::new(&mut conn).due_cards(user_id, 10).unwrap();
        let ids: Vec<i32> = due.iter().map(|(record, _)| record.card_id).collect();
        assert_eq!(ids, vec![weak, strong]);
    }

    #[test]
    fn mastered_cards_never_come_due() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let card_id = seed_card(&mut conn, user_id, "done");
        let now = Utc::now().naive_utc();
        seed_record(&mut conn, user_id, card_id, 10, 10, 0, 100, now, now - Duration::days(30));

        let mut engine = SrsEngine::new(&mut conn);
        assert!(engine.due_cards(user_id, 10).unwrap().is_empty());
        assert_eq!(engine.user_stats(user_id).unwrap().due_cards, 0);
    }

    #[test]
    fn stats_buckets_sum_to_total() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let now = Utc::now().naive_utc();
        let future = now + Duration::days(1);

        for (mastery, last_viewed) in [
            (0, now),
            (10, now),
            (39, now),
            (40, now),
            (79, now),
            (85, now - Duration::days(3)),
            (100, now - Duration::days(3)),
        ] {
            let card_id = seed_card(&mut conn, user_id, "card");
            seed_record(&mut conn, user_id, card_id, 5, 3, 2, mastery, last_viewed, future);
        }

        let stats = SrsEngine::new(&mut conn).user_stats(user_id).unwrap();
        assert_eq!(stats.total_cards, 7);
        assert_eq!(stats.new_cards, 1);
        assert_eq!(stats.learning_cards, 2);
        assert_eq!(stats.review_cards, 2);
        assert_eq!(stats.mastered_cards, 2);
        assert_eq!(
            stats.new_cards + stats.learning_cards + stats.review_cards + stats.mastered_cards,
            stats.total_cards
        );
        assert_eq!(stats.today_reviewed, 5);
    }

    #[test]
    fn reminder_window_covers_the_first_half_hour() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(in_reminder_window(date.and_hms_opt(10, 0, 0).unwrap()));
        assert!(in_reminder_window(date.and_hms_opt(15, 29, 59).unwrap()));
        assert!(in_reminder_window(date.and_hms_opt(20, 15, 0).unwrap()));
        assert!(!in_reminder_window(date.and_hms_opt(10, 30, 0).unwrap()));
        assert!(!in_reminder_window(date.and_hms_opt(9, 10, 0).unwrap()));
        assert!(!in_reminder_window(date.and_hms_opt(21, 0, 0).unwrap()));
    }

    #[test]
    fn reminder_fires_only_with_due_cards() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let in_window = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(10, 5, 0)
            .unwrap();
        let out_of_window = in_window.with_hour(11).unwrap();

        let status = SrsEngine::new(&mut conn)
            .fragment_reminder(user_id, in_window)
            .unwrap();
        assert!(!status.should_remind);

        let card_id = seed_card(&mut conn, user_id, "due");
        let now = Utc::now().naive_utc();
        seed_record(&mut conn, user_id, card_id, 1, 0, 1, 0, now, now - Duration::hours(1));

        let status = SrsEngine::new(&mut conn)
            .fragment_reminder(user_id, in_window)
            .unwrap();
        assert!(status.should_remind);
        assert_eq!(status.due_count, 1);
        assert!(status.message.is_some());

        let status = SrsEngine::new(&mut conn)
            .fragment_reminder(user_id, out_of_window)
            .unwrap();
        assert!(!status.should_remind);
    }

    #[test]
    fn recent_activity_joins_cards_and_buckets_by_day() {
        let mut conn = test_conn();
        let user_id = seed_user(&mut conn, "a@example.com");
        let card_id = seed_card(&mut conn, user_id, "algebra");

        let mut engine = SrsEngine::new(&mut conn);
        engine
            .record_review(user_id, card_id, Difficulty::Normal, true, 10)
            .unwrap();
        engine
            .record_review(user_id, card_id, Difficulty::Hard, false, 20)
            .unwrap();

        let (entries, daily) = engine.recent_activity(user_id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].card_title, "algebra");
        assert_eq!(entries[0].subject, "math");
        assert_eq!(daily.len(), 7);
        // Both reviews happened just now, so they land in today's bucket
        let today = daily.last().unwrap();
        assert_eq!(today.review_count, 2);
        assert_eq!(today.correct_count, 1);
    }
}
