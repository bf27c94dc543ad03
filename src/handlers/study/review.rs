use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::data::models::{CardView, LearningProgress, ReviewRequest, StudyError, UserStats};
use crate::data::repositories::CardRepository;
use crate::features::srs::SrsEngine;
use crate::{DbPool, utils};

#[derive(Deserialize)]
pub struct DueQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueueResponse {
    pub success: bool,
    pub due_cards: Vec<CardView>,
    pub stats: UserStats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub learning_progress: LearningProgress,
}

/// GET /api/study/review: the due queue plus stats for the study page.
pub async fn review_queue(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Query(params): Query<DueQuery>,
) -> Result<Json<ReviewQueueResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let mut engine = SrsEngine::new(&mut conn);
    let due = engine.due_cards(user_id, limit)?;
    let stats = engine.user_stats(user_id)?;

    let due_cards = due
        .into_iter()
        .map(|(record, card)| CardView::new(card, Some(&record)))
        .collect();

    Ok(Json(ReviewQueueResponse {
        success: true,
        due_cards,
        stats,
    }))
}

/// POST /api/study/review: records one review outcome.
pub async fn submit_review(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    // The record is created lazily, so only the card itself must exist
    if !CardRepository::exists(&mut conn, payload.card_id)? {
        return Err(StudyError::CardNotFound);
    }

    let record = SrsEngine::new(&mut conn).record_review(
        user_id,
        payload.card_id,
        payload.difficulty,
        payload.is_correct,
        payload.time_spent,
    )?;

    Ok(Json(ReviewResponse {
        success: true,
        learning_progress: LearningProgress::from_record(&record),
    }))
}
