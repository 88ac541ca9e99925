use mongodb::bson::{oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Awaiting peer review.
    #[default]
    Pending,
    #[serde(alias = "graded")]
    Completed,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Submission document as stored in the `submissions` collection.
///
/// Fields the service does not interpret (assignment title, PDF link, notes
/// and so on) are kept in `payload` and stored at the top level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub submitted_by: String,
    pub status: SubmissionStatus,
    #[serde(
        rename = "givenMark",
        default,
        deserialize_with = "super::lenient::optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub given_mark: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub payload: Document,
}

impl Submission {
    pub fn new(submitted_by: String, status: SubmissionStatus, payload: Document) -> Self {
        Self {
            id: None,
            submitted_by,
            status,
            given_mark: None,
            feedback: None,
            payload,
        }
    }
}

/// Grading result merged onto an existing submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub given_mark: f64,
    pub feedback: String,
    pub status: SubmissionStatus,
}
