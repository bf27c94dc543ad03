use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use crate::data::models::{
    ApiResponse, CardListParams, CardView, CreateCardRequest, NewStudyCard, Pagination, StudyError,
};
use crate::data::repositories::{CardRepository, LearningRecordRepository};
use crate::{DbPool, utils};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListResponse {
    pub success: bool,
    pub cards: Vec<CardView>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub success: bool,
    pub card: CardView,
}

pub async fn list_cards(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Query(params): Query<CardListParams>,
) -> Result<Json<CardListResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    let (cards, total) = CardRepository::list(&mut conn, user_id, &params)?;

    let card_ids: Vec<i32> = cards.iter().map(|card| card.card_id).collect();
    let records = CardRepository::records_for_cards(&mut conn, user_id, &card_ids)?;

    let cards = cards
        .into_iter()
        .map(|card| {
            let record = records.iter().find(|record| record.card_id == card.card_id);
            CardView::new(card, record)
        })
        .collect();

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    Ok(Json(CardListResponse {
        success: true,
        cards,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        },
    }))
}

pub async fn create_card(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Json(payload): Json<CreateCardRequest>,
) -> Result<Json<CardResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    payload.validate()?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    let tags = if payload.tags.is_empty() {
        None
    } else {
        Some(payload.tags.join(","))
    };

    let card = CardRepository::create(
        &mut conn,
        &NewStudyCard {
            user_id,
            title: &payload.title,
            subject: &payload.subject,
            core_point: &payload.core_point,
            confusion_point: payload.confusion_point.as_deref(),
            example: payload.example.as_deref(),
            difficulty: payload.difficulty.as_deref().unwrap_or("medium"),
            tags: tags.as_deref(),
            sketch_prompt: payload.sketch_prompt.as_deref(),
            created_at: Utc::now().naive_utc(),
        },
    )?;

    Ok(Json(CardResponse {
        success: true,
        card: CardView::new(card, None),
    }))
}

pub async fn view_card(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Path(card_id): Path<i32>,
) -> Result<Json<CardResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    let card = CardRepository::find_for_user(&mut conn, card_id, user_id)?
        .ok_or(StudyError::CardNotFound)?;
    let record = LearningRecordRepository::find(&mut conn, user_id, card_id)?;

    Ok(Json(CardResponse {
        success: true,
        card: CardView::new(card, record.as_ref()),
    }))
}

pub async fn delete_card(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
    Path(card_id): Path<i32>,
) -> Result<Json<ApiResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    if CardRepository::find_for_user(&mut conn, card_id, user_id)?.is_none() {
        return Err(StudyError::CardNotFound);
    }

    CardRepository::delete_cascade(&mut conn, card_id)?;

    Ok(Json(ApiResponse {
        success: true,
        message: "Card deleted successfully".to_string(),
    }))
}
