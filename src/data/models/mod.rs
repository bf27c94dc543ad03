pub mod auth_models;
pub mod card_models;
pub mod srs_models;
pub mod stats_models;
pub mod user_models;

pub use auth_models::{AuthError, LoginError, LoginForm, RegisterError, RegisterForm};
pub use card_models::{
    ApiResponse, CardListParams, CardView, CreateCardRequest, NewStudyCard, Pagination, StudyCard,
};
pub use srs_models::{
    Difficulty, LearningProgress, LearningRecord, NewLearningRecord, NewStudySession,
    ReviewRequest, ReviewStatus, StudyError, StudySession,
};
pub use stats_models::{ActivityEntry, DailyStat, ReminderStatus, UserStats};
pub use user_models::{NewUser, User};
