use crate::models::{Assignment, DifficultyLevel};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /assignments` and `PUT /assignments/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub difficulty_level: DifficultyLevel,
    #[validate(length(min = 1, message = "Due date is required"))]
    pub due_date: String,
    #[validate(url(message = "Thumbnail must be a valid URL"))]
    pub thumbnail: String,
    #[validate(range(min = 0.0, message = "Marks cannot be negative"))]
    pub marks: f64,
    #[serde(default)]
    pub description: String,
}

impl AssignmentInput {
    pub fn into_assignment(self) -> Assignment {
        Assignment {
            id: None,
            title: self.title,
            difficulty_level: self.difficulty_level,
            due_date: self.due_date,
            thumbnail: self.thumbnail,
            marks: self.marks,
            description: self.description,
        }
    }
}

/// Query of `GET /assignments`.
///
/// `page` and `size` are kept as raw strings: a value that is not a number
/// disables pagination instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentListParams {
    pub level: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

/// Query of `GET /assignmentCount`.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentCountParams {
    pub level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub difficulty_level: DifficultyLevel,
    pub due_date: String,
    pub thumbnail: String,
    pub marks: f64,
    pub description: String,
}

impl From<Assignment> for AssignmentResponse {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: a.title,
            difficulty_level: a.difficulty_level,
            due_date: a.due_date,
            thumbnail: a.thumbnail,
            marks: a.marks,
            description: a.description,
        }
    }
}
