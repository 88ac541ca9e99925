use crate::models::{Assignment, DifficultyLevel, Grade, Submission};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

/// Equality filter for assignment listing and counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub level: Option<DifficultyLevel>,
}

impl AssignmentFilter {
    pub fn from_level(level: Option<&str>) -> Result<Self, AppError> {
        let level = match level.map(str::trim).filter(|l| !l.is_empty()) {
            Some(raw) => Some(
                raw.parse::<DifficultyLevel>()
                    .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?,
            ),
            None => None,
        };
        Ok(Self { level })
    }

    pub fn matches(&self, assignment: &Assignment) -> bool {
        self.level
            .map_or(true, |level| assignment.difficulty_level == level)
    }
}

/// Offset/limit window. A `limit` of 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Page {
    /// Builds the window from raw `page`/`size` query values.
    ///
    /// No window is applied when `size` is missing or not a number; a missing
    /// or non-numeric `page` counts as the first page. Negative values are
    /// rejected.
    pub fn from_params(page: Option<&str>, size: Option<&str>) -> Result<Option<Self>, AppError> {
        let Some(size) = size.and_then(|s| s.trim().parse::<i64>().ok()) else {
            return Ok(None);
        };
        let page = page.and_then(|p| p.trim().parse::<i64>().ok()).unwrap_or(0);

        if size < 0 || page < 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "page and size must not be negative"
            )));
        }

        let (page, size) = (page as u64, size as u64);
        // The driver sends skip as a signed 64-bit value.
        let skip = page
            .checked_mul(size)
            .filter(|skip| *skip <= i64::MAX as u64)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("page * size is out of range")))?;

        Ok(Some(Self { skip, limit: size }))
    }
}

/// Visibility rules for submission listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFilter {
    All,
    /// Pending submissions by anyone except this email.
    PendingExcept(String),
    /// Every submission by this email.
    OwnedBy(String),
}

impl SubmissionFilter {
    pub fn matches(&self, submission: &Submission) -> bool {
        match self {
            SubmissionFilter::All => true,
            SubmissionFilter::PendingExcept(email) => {
                submission.submitted_by != *email
                    && submission.status == crate::models::SubmissionStatus::Pending
            }
            SubmissionFilter::OwnedBy(email) => submission.submitted_by == *email,
        }
    }
}

/// Result of a single-document update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<ObjectId>,
}

/// Storage seam for the service. Handlers only see this trait; the binary
/// wires in [`MongoStore`](super::MongoStore) and tests use
/// [`InMemoryStore`](super::InMemoryStore).
#[async_trait]
pub trait StudyStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<ObjectId, AppError>;

    async fn list_assignments(
        &self,
        filter: &AssignmentFilter,
        page: Option<Page>,
    ) -> Result<Vec<Assignment>, AppError>;

    async fn count_assignments(&self, filter: &AssignmentFilter) -> Result<u64, AppError>;

    async fn find_assignment(&self, id: ObjectId) -> Result<Option<Assignment>, AppError>;

    /// Returns the number of removed documents.
    async fn delete_assignment(&self, id: ObjectId) -> Result<u64, AppError>;

    /// Overwrites the editable fields of assignment `id`. With `upsert`, a
    /// missing assignment is created under `id`.
    async fn replace_assignment_fields(
        &self,
        id: ObjectId,
        assignment: &Assignment,
        upsert: bool,
    ) -> Result<UpdateOutcome, AppError>;

    async fn insert_submission(&self, submission: &Submission) -> Result<ObjectId, AppError>;

    async fn list_submissions(&self, filter: &SubmissionFilter)
        -> Result<Vec<Submission>, AppError>;

    async fn grade_submission(&self, id: ObjectId, grade: &Grade)
        -> Result<UpdateOutcome, AppError>;

    /// Releases connections. Called once after the server has drained.
    async fn shutdown(&self) {}
}
