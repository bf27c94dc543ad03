use chrono::NaiveDateTime;
use diesel::result::Error as DieselError;
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{learning_records, study_sessions};

/// How well the learner answered a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Again,
    Hard,
    Normal,
    Easy,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Again => "again",
            Difficulty::Hard => "hard",
            Difficulty::Normal => "normal",
            Difficulty::Easy => "easy",
        }
    }
}

/// Coarse learning state derived from the mastery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    New,
    Learning,
    Review,
    Mastered,
}

impl ReviewStatus {
    pub fn from_mastery(mastery_level: i32) -> Self {
        match mastery_level {
            m if m >= 80 => ReviewStatus::Mastered,
            m if m >= 40 => ReviewStatus::Review,
            m if m >= 1 => ReviewStatus::Learning,
            _ => ReviewStatus::New,
        }
    }
}

/// One learner's scheduling state for one card
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = learning_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct LearningRecord {
    pub record_id: i32,
    pub user_id: i32,
    pub card_id: i32,
    pub view_count: i32,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub last_viewed_at: NaiveDateTime,
    pub next_review_at: NaiveDateTime,
    pub mastery_level: i32,
}

#[derive(Insertable)]
#[diesel(table_name = learning_records)]
pub struct NewLearningRecord {
    pub user_id: i32,
    pub card_id: i32,
    pub view_count: i32,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub last_viewed_at: NaiveDateTime,
    pub next_review_at: NaiveDateTime,
    pub mastery_level: i32,
}

/// One append-only entry in the study session log
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = study_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub session_id: i32,
    pub user_id: i32,
    pub card_id: i32,
    pub difficulty: String,
    pub is_correct: bool,
    pub time_spent: i32,
    pub session_date: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = study_sessions)]
pub struct NewStudySession<'a> {
    pub user_id: i32,
    pub card_id: i32,
    pub difficulty: &'a str,
    pub is_correct: bool,
    pub time_spent: i32,
    pub session_date: NaiveDateTime,
}

/// Review submission payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub card_id: i32,
    pub difficulty: Difficulty,
    #[serde(default = "default_is_correct")]
    pub is_correct: bool,
    #[serde(default)]
    pub time_spent: i32,
}

fn default_is_correct() -> bool {
    true
}

/// Learning state block embedded in card and review responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningProgress {
    pub status: ReviewStatus,
    pub review_count: i32,
    pub correct_count: i32,
    pub last_review_at: NaiveDateTime,
    pub next_review_at: NaiveDateTime,
    pub accuracy: i32,
}

impl LearningProgress {
    pub fn from_record(record: &LearningRecord) -> Self {
        let accuracy = if record.view_count > 0 {
            ((record.correct_count as f32 / record.view_count as f32) * 100.0).round() as i32
        } else {
            0
        };

        LearningProgress {
            status: ReviewStatus::from_mastery(record.mastery_level),
            review_count: record.view_count,
            correct_count: record.correct_count,
            last_review_at: record.last_viewed_at,
            next_review_at: record.next_review_at,
            accuracy,
        }
    }
}

// Errors shared by the study and card handlers
#[derive(Error, Debug)]
pub enum StudyError {
    #[error("Not logged in")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("Card not found")]
    CardNotFound,
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Database error")]
    DatabaseError(#[from] DieselError),
}
