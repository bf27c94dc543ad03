use axum::{extract::State, Json};
use serde::Serialize;

use crate::data::models::{ActivityEntry, DailyStat, StudyError, UserStats};
use crate::features::srs::SrsEngine;
use crate::{DbPool, utils};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsResponse {
    pub success: bool,
    pub stats: UserStats,
    pub recent_activity: Vec<ActivityEntry>,
    pub daily_stats: Vec<DailyStat>,
}

/// GET /api/user/stats: dashboard statistics with the recent activity feed.
pub async fn user_stats(
    State(pool): State<DbPool>,
    session: tower_sessions::Session,
) -> Result<Json<UserStatsResponse>, StudyError> {
    let user_id = utils::get_current_user_id(&session)
        .await
        .ok_or(StudyError::Unauthorized)?;

    let mut conn = pool.get().map_err(|e| {
        log::error!("Failed to get DB connection: {}", e);
        StudyError::StoreUnavailable(e.to_string())
    })?;

    let mut engine = SrsEngine::new(&mut conn);
    let stats = engine.user_stats(user_id)?;
    let (recent_activity, daily_stats) = engine.recent_activity(user_id)?;

    Ok(Json(UserStatsResponse {
        success: true,
        stats,
        recent_activity,
        daily_stats,
    }))
}
