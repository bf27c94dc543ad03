use chrono::NaiveDateTime;
use serde::Serialize;

/// Per-user scheduling statistics for the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_cards: i64,
    pub new_cards: i64,
    pub learning_cards: i64,
    pub review_cards: i64,
    pub mastered_cards: i64,
    pub due_cards: i64,
    pub today_reviewed: i64,
}

/// Fragment-time reminder payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderStatus {
    pub should_remind: bool,
    pub due_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReminderStatus {
    pub fn quiet() -> Self {
        ReminderStatus {
            should_remind: false,
            due_count: 0,
            message: None,
        }
    }
}

/// One recent review, joined with its card for display
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i32,
    pub card_title: String,
    pub subject: String,
    pub difficulty: String,
    pub is_correct: bool,
    pub time_spent: i32,
    pub date: NaiveDateTime,
}

/// Reviews and correct answers for one day of the trailing week
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: String,
    pub review_count: i64,
    pub correct_count: i64,
}
