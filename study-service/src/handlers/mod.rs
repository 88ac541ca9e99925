pub mod assignments;
pub mod health;
pub mod submissions;

use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

pub use assignments::{
    count_assignments, create_assignment, delete_assignment, get_assignment, list_assignments,
    update_assignment,
};
pub use health::{health_check, metrics_endpoint, readiness_check, root};
pub use submissions::{create_submission, grade_submission, list_my_submissions, list_review_queue};

/// Parses a path identifier, rejecting anything that is not a 24-digit hex ObjectId.
pub(crate) fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    Ok(ObjectId::parse_str(raw.trim())?)
}
