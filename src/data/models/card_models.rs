use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::srs_models::{LearningProgress, LearningRecord};
use crate::schema::study_cards;

/// A study card as stored
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = study_cards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StudyCard {
    pub card_id: i32,
    pub user_id: i32,
    pub title: String,
    pub subject: String,
    pub core_point: String,
    pub confusion_point: Option<String>,
    pub example: Option<String>,
    pub difficulty: String,
    pub tags: Option<String>,
    pub sketch_prompt: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = study_cards)]
pub struct NewStudyCard<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub subject: &'a str,
    pub core_point: &'a str,
    pub confusion_point: Option<&'a str>,
    pub example: Option<&'a str>,
    pub difficulty: &'a str,
    pub tags: Option<&'a str>,
    pub sketch_prompt: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

/// Request payload for creating a card
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Subject must not be empty"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Core point must not be empty"))]
    pub core_point: String,
    pub confusion_point: Option<String>,
    pub example: Option<String>,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub sketch_prompt: Option<String>,
}

/// Query filters for the card list
#[derive(Debug, Deserialize)]
pub struct CardListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Card shaped for API responses, joined with its learning state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: i32,
    pub title: String,
    pub subject: String,
    pub core_point: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confusion_point: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    pub difficulty: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sketch_prompt: Option<String>,
    pub created_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_progress: Option<LearningProgress>,
}

impl CardView {
    pub fn new(card: StudyCard, record: Option<&LearningRecord>) -> Self {
        let tags = card
            .tags
            .as_deref()
            .map(|tags| tags.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        CardView {
            id: card.card_id,
            title: card.title,
            subject: card.subject,
            core_point: card.core_point,
            confusion_point: card.confusion_point,
            example: card.example,
            difficulty: card.difficulty,
            tags,
            sketch_prompt: card.sketch_prompt,
            created_at: card.created_at,
            learning_progress: record.map(LearningProgress::from_record),
        }
    }
}

/// Page bookkeeping for list responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Standard API response format
#[derive(Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}
