// Handlers module

pub mod analytics;
pub mod chat;
pub mod health;
pub mod images;
pub mod sessions;

pub use analytics::{glucose_summary_handler, weekly_glucose_handler};
pub use chat::{chat_handler, run_streamed_turn};
pub use health::{health_handler, root_handler};
pub use images::{analyze_food_handler, analyze_glucose_handler, analyze_image_handler};
pub use sessions::{delete_session_handler, list_sessions_handler, session_history_handler};
