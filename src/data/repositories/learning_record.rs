use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::data::models::{
    LearningRecord, NewLearningRecord, NewStudySession, StudyCard, StudySession,
};
use crate::schema::{learning_records, study_cards, study_sessions};

pub struct LearningRecordRepository;

impl LearningRecordRepository {
    pub fn find(
        conn: &mut SqliteConnection,
        user_id: i32,
        card_id: i32,
    ) -> Result<Option<LearningRecord>, diesel::result::Error> {
        learning_records::table
            .filter(learning_records::user_id.eq(user_id))
            .filter(learning_records::card_id.eq(card_id))
            .select(LearningRecord::as_select())
            .first(conn)
            .optional()
    }

    /// Inserts a zeroed record for a card seen for the first time.
    pub fn create(
        conn: &mut SqliteConnection,
        user_id: i32,
        card_id: i32,
        last_viewed_at: NaiveDateTime,
        next_review_at: NaiveDateTime,
    ) -> Result<LearningRecord, diesel::result::Error> {
        diesel::insert_into(learning_records::table)
            .values(&NewLearningRecord {
                user_id,
                card_id,
                view_count: 0,
                correct_count: 0,
                wrong_count: 0,
                last_viewed_at,
                next_review_at,
                mastery_level: 0,
            })
            .execute(conn)?;

        learning_records::table
            .filter(learning_records::user_id.eq(user_id))
            .filter(learning_records::card_id.eq(card_id))
            .select(LearningRecord::as_select())
            .first(conn)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_after_review(
        conn: &mut SqliteConnection,
        record_id: i32,
        view_count: i32,
        correct_count: i32,
        wrong_count: i32,
        last_viewed_at: NaiveDateTime,
        next_review_at: NaiveDateTime,
        mastery_level: i32,
    ) -> Result<LearningRecord, diesel::result::Error> {
        diesel::update(learning_records::table.filter(learning_records::record_id.eq(record_id)))
            .set((
                learning_records::view_count.eq(view_count),
                learning_records::correct_count.eq(correct_count),
                learning_records::wrong_count.eq(wrong_count),
                learning_records::last_viewed_at.eq(last_viewed_at),
                learning_records::next_review_at.eq(next_review_at),
                learning_records::mastery_level.eq(mastery_level),
            ))
            .execute(conn)?;

        learning_records::table
            .filter(learning_records::record_id.eq(record_id))
            .select(LearningRecord::as_select())
            .first(conn)
    }

    /// Records that are due for review, joined with their cards.
    ///
    /// Longest-overdue first; ties go to the card answered correctly the
    /// fewest times. Fully mastered cards never come back.
    pub fn due_with_cards(
        conn: &mut SqliteConnection,
        user_id: i32,
        now: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<(LearningRecord, StudyCard)>, diesel::result::Error> {
        learning_records::table
            .inner_join(study_cards::table)
            .filter(learning_records::user_id.eq(user_id))
            .filter(learning_records::next_review_at.le(now))
            .filter(learning_records::mastery_level.lt(100))
            .order((
                learning_records::next_review_at.asc(),
                learning_records::correct_count.asc(),
            ))
            .limit(limit)
            .select((LearningRecord::as_select(), StudyCard::as_select()))
            .load(conn)
    }

    pub fn count_due(
        conn: &mut SqliteConnection,
        user_id: i32,
        now: NaiveDateTime,
    ) -> Result<i64, diesel::result::Error> {
        learning_records::table
            .filter(learning_records::user_id.eq(user_id))
            .filter(learning_records::next_review_at.le(now))
            .filter(learning_records::mastery_level.lt(100))
            .count()
            .get_result(conn)
    }

    pub fn count_all(
        conn: &mut SqliteConnection,
        user_id: i32,
    ) -> Result<i64, diesel::result::Error> {
        learning_records::table
            .filter(learning_records::user_id.eq(user_id))
            .count()
            .get_result(conn)
    }

    /// Counts records whose mastery level falls in `lo..hi`.
    pub fn count_mastery_between(
        conn: &mut SqliteConnection,
        user_id: i32,
        lo: i32,
        hi: i32,
    ) -> Result<i64, diesel::result::Error> {
        learning_records::table
            .filter(learning_records::user_id.eq(user_id))
            .filter(learning_records::mastery_level.ge(lo))
            .filter(learning_records::mastery_level.lt(hi))
            .count()
            .get_result(conn)
    }

    pub fn count_viewed_since(
        conn: &mut SqliteConnection,
        user_id: i32,
        since: NaiveDateTime,
    ) -> Result<i64, diesel::result::Error> {
        learning_records::table
            .filter(learning_records::user_id.eq(user_id))
            .filter(learning_records::last_viewed_at.ge(since))
            .count()
            .get_result(conn)
    }

    pub fn append_session(
        conn: &mut SqliteConnection,
        entry: &NewStudySession,
    ) -> Result<(), diesel::result::Error> {
        diesel::insert_into(study_sessions::table)
            .values(entry)
            .execute(conn)?;
        Ok(())
    }

    /// Session log entries since `since`, newest first, with card title and
    /// subject for display.
    pub fn recent_sessions(
        conn: &mut SqliteConnection,
        user_id: i32,
        since: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<(StudySession, (String, String))>, diesel::result::Error> {
        study_sessions::table
            .inner_join(study_cards::table)
            .filter(study_sessions::user_id.eq(user_id))
            .filter(study_sessions::session_date.ge(since))
            .order(study_sessions::session_date.desc())
            .limit(limit)
            .select((
                StudySession::as_select(),
                (study_cards::title, study_cards::subject),
            ))
            .load(conn)
    }
}
