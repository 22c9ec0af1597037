//! HTTP routes for Bridgeway

pub mod answers;
pub mod auth_routes;
pub mod events_ws;
pub mod health;
pub mod helpers;
pub mod points;
pub mod profile;
pub mod questions;

pub use answers::handle_answers_request;
pub use auth_routes::handle_auth_request;
pub use events_ws::handle_events_ws;
pub use health::{health_check, readiness_check, version_info};
pub use points::handle_points_request;
pub use profile::handle_profile_request;
pub use questions::handle_questions_request;
