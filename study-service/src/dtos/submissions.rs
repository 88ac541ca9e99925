use crate::models::{Grade, Submission, SubmissionStatus};
use mongodb::bson::{self, Bson};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use service_core::error::AppError;
use validator::Validate;

/// Keys a client may not smuggle in through the free-form payload.
const RESERVED_PAYLOAD_KEYS: [&str; 3] = ["_id", "givenMark", "feedback"];

/// Body of `POST /submissions`. Everything besides the named fields is
/// stored as-is.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    #[validate(email(message = "submitted_by must be an email address"))]
    pub submitted_by: String,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl CreateSubmissionRequest {
    pub fn into_submission(mut self) -> Result<Submission, AppError> {
        for key in RESERVED_PAYLOAD_KEYS {
            self.payload.remove(key);
        }
        let payload = bson::to_document(&self.payload).map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Unsupported submission payload: {}", e))
        })?;
        Ok(Submission::new(self.submitted_by, self.status, payload))
    }
}

/// Body of `PATCH /submissions/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GradeSubmissionRequest {
    #[serde(rename = "givenMark")]
    #[validate(range(min = 0.0, message = "Given mark cannot be negative"))]
    pub given_mark: f64,
    pub feedback: String,
    pub status: SubmissionStatus,
}

impl GradeSubmissionRequest {
    pub fn into_grade(self) -> Grade {
        Grade {
            given_mark: self.given_mark,
            feedback: self.feedback,
            status: self.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmissionResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub submitted_by: String,
    pub status: SubmissionStatus,
    #[serde(rename = "givenMark", default, skip_serializing_if = "Option::is_none")]
    pub given_mark: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        let payload = match Bson::Document(s.payload).into_relaxed_extjson() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: s.id.map(|id| id.to_hex()).unwrap_or_default(),
            submitted_by: s.submitted_by,
            status: s.status,
            given_mark: s.given_mark,
            feedback: s.feedback,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_keys_are_dropped_from_payload() {
        let request: CreateSubmissionRequest = serde_json::from_value(json!({
            "submitted_by": "a@x.com",
            "_id": "65f000000000000000000000",
            "givenMark": 100,
            "pdf": "https://files.example/a.pdf"
        }))
        .unwrap();

        let submission = request.into_submission().unwrap();
        assert_eq!(submission.status, SubmissionStatus::Pending);
        assert_eq!(submission.given_mark, None);
        assert!(!submission.payload.contains_key("_id"));
        assert!(!submission.payload.contains_key("givenMark"));
        assert_eq!(
            submission.payload.get_str("pdf").unwrap(),
            "https://files.example/a.pdf"
        );
    }

    #[test]
    fn submitter_must_be_an_email() {
        let request: CreateSubmissionRequest =
            serde_json::from_value(json!({ "submitted_by": "someone" })).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn grade_rejects_unknown_status() {
        let parsed = serde_json::from_value::<GradeSubmissionRequest>(json!({
            "givenMark": 7,
            "feedback": "ok",
            "status": "archived"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn response_flattens_payload() {
        let submission = Submission {
            id: Some(mongodb::bson::oid::ObjectId::new()),
            submitted_by: "a@x.com".to_string(),
            status: SubmissionStatus::Completed,
            given_mark: Some(9.0),
            feedback: Some("nice".to_string()),
            payload: mongodb::bson::doc! { "note": "hi" },
        };

        let value = serde_json::to_value(SubmissionResponse::from(submission)).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["givenMark"], 9.0);
        assert_eq!(value["note"], "hi");
        assert_eq!(value["_id"].as_str().unwrap().len(), 24);
    }
}
