pub mod reminder;
pub mod review;
pub mod stats;

pub use reminder::fragment_reminder;
pub use review::{review_queue, submit_review};
pub use stats::user_stats;
