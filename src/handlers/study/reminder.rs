use axum::{extract::State, Json};
use chrono::Local;
use serde::Serialize;

use crate::data::models::{ReminderStatus, StudyError};
use crate::features::srs::SrsEngine;
use crate::{DbPool, utils};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub success: bool,
    #[serde(flatten)]
    pub reminder: ReminderStatus,
}

/// GET /api/study/reminder: whether the fragment-time nudge should show.
pub async fn fragment_reminder(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
) -> Result<Json<ReminderResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    let reminder =
        SrsEngine::new(&mut conn).fragment_reminder(user_id, Local::now().naive_local())?;

    Ok(Json(ReminderResponse {
        success: true,
        reminder,
    }))
}
