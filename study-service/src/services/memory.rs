use crate::models::{Assignment, Grade, Submission};
use crate::services::store::{AssignmentFilter, Page, StudyStore, SubmissionFilter, UpdateOutcome};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Process-local store with the same filter and update semantics as
/// [`MongoStore`](super::MongoStore). Documents are kept in insertion order.
/// After [`StudyStore::shutdown`] the health check reports the store as down.
#[derive(Default)]
pub struct InMemoryStore {
    assignments: Mutex<Vec<Assignment>>,
    submissions: Mutex<Vec<Submission>>,
    closed: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<Vec<T>>, name: &str) -> Result<MutexGuard<'a, Vec<T>>, AppError> {
    mutex
        .lock()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("{} store mutex poisoned: {}", name, e)))
}

fn apply_page<T>(items: impl Iterator<Item = T>, page: Option<Page>) -> Vec<T> {
    match page {
        None => items.collect(),
        Some(Page { skip, limit: 0 }) => items.skip(skip as usize).collect(),
        Some(Page { skip, limit }) => items.skip(skip as usize).take(limit as usize).collect(),
    }
}

#[async_trait]
impl StudyStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::ServiceUnavailable(anyhow::anyhow!(
                "in-memory store is closed"
            )));
        }
        Ok(())
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        let mut stored = assignment.clone();
        stored.id = Some(id);
        lock(&self.assignments, "assignment")?.push(stored);
        Ok(id)
    }

    async fn list_assignments(
        &self,
        filter: &AssignmentFilter,
        page: Option<Page>,
    ) -> Result<Vec<Assignment>, AppError> {
        let assignments = lock(&self.assignments, "assignment")?;
        Ok(apply_page(
            assignments.iter().filter(|a| filter.matches(a)).cloned(),
            page,
        ))
    }

    async fn count_assignments(&self, filter: &AssignmentFilter) -> Result<u64, AppError> {
        let assignments = lock(&self.assignments, "assignment")?;
        Ok(assignments.iter().filter(|a| filter.matches(a)).count() as u64)
    }

    async fn find_assignment(&self, id: ObjectId) -> Result<Option<Assignment>, AppError> {
        let assignments = lock(&self.assignments, "assignment")?;
        Ok(assignments.iter().find(|a| a.id == Some(id)).cloned())
    }

    async fn delete_assignment(&self, id: ObjectId) -> Result<u64, AppError> {
        let mut assignments = lock(&self.assignments, "assignment")?;
        match assignments.iter().position(|a| a.id == Some(id)) {
            Some(index) => {
                assignments.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn replace_assignment_fields(
        &self,
        id: ObjectId,
        assignment: &Assignment,
        upsert: bool,
    ) -> Result<UpdateOutcome, AppError> {
        let mut assignments = lock(&self.assignments, "assignment")?;
        let mut replacement = assignment.clone();
        replacement.id = Some(id);

        if let Some(existing) = assignments.iter_mut().find(|a| a.id == Some(id)) {
            let modified = u64::from(*existing != replacement);
            *existing = replacement;
            return Ok(UpdateOutcome {
                matched: 1,
                modified,
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(UpdateOutcome::default());
        }

        assignments.push(replacement);
        Ok(UpdateOutcome {
            matched: 0,
            modified: 0,
            upserted_id: Some(id),
        })
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        let mut stored = submission.clone();
        stored.id = Some(id);
        lock(&self.submissions, "submission")?.push(stored);
        Ok(id)
    }

    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, AppError> {
        let submissions = lock(&self.submissions, "submission")?;
        Ok(submissions
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn grade_submission(
        &self,
        id: ObjectId,
        grade: &Grade,
    ) -> Result<UpdateOutcome, AppError> {
        let mut submissions = lock(&self.submissions, "submission")?;
        let Some(submission) = submissions.iter_mut().find(|s| s.id == Some(id)) else {
            return Ok(UpdateOutcome::default());
        };

        let unchanged = submission.given_mark == Some(grade.given_mark)
            && submission.feedback.as_deref() == Some(grade.feedback.as_str())
            && submission.status == grade.status;

        submission.given_mark = Some(grade.given_mark);
        submission.feedback = Some(grade.feedback.clone());
        submission.status = grade.status;

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(!unchanged),
            upserted_id: None,
        })
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DifficultyLevel, SubmissionStatus};
    use mongodb::bson::doc;

    fn assignment(title: &str, level: DifficultyLevel) -> Assignment {
        Assignment {
            id: None,
            title: title.to_string(),
            difficulty_level: level,
            due_date: "2024-06-01".to_string(),
            thumbnail: "https://img.example/a.png".to_string(),
            marks: 10.0,
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn size_zero_means_unlimited() {
        let store = InMemoryStore::new();
        for i in 0..3 {
            store
                .insert_assignment(&assignment(&format!("a{}", i), DifficultyLevel::Easy))
                .await
                .unwrap();
        }

        let all = store
            .list_assignments(&AssignmentFilter::default(), Some(Page { skip: 0, limit: 0 }))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn update_only_leaves_missing_ids_alone() {
        let store = InMemoryStore::new();
        let id = ObjectId::new();

        let outcome = store
            .replace_assignment_fields(id, &assignment("x", DifficultyLevel::Hard), false)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::default());
        assert!(store.find_assignment(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_keeps_the_requested_id() {
        let store = InMemoryStore::new();
        let id = ObjectId::new();

        let outcome = store
            .replace_assignment_fields(id, &assignment("x", DifficultyLevel::Hard), true)
            .await
            .unwrap();
        assert_eq!(outcome.upserted_id, Some(id));
        assert_eq!(store.find_assignment(id).await.unwrap().unwrap().title, "x");
    }

    #[tokio::test]
    async fn regrading_with_same_values_reports_no_modification() {
        let store = InMemoryStore::new();
        let id = store
            .insert_submission(&Submission::new(
                "a@x.com".into(),
                SubmissionStatus::Pending,
                doc! {},
            ))
            .await
            .unwrap();
        let grade = Grade {
            given_mark: 5.0,
            feedback: "ok".to_string(),
            status: SubmissionStatus::Completed,
        };

        let first = store.grade_submission(id, &grade).await.unwrap();
        let second = store.grade_submission(id, &grade).await.unwrap();
        assert_eq!((first.matched, first.modified), (1, 1));
        assert_eq!((second.matched, second.modified), (1, 0));
    }

    #[tokio::test]
    async fn shutdown_marks_the_store_unhealthy() {
        let store = InMemoryStore::new();
        assert!(store.health_check().await.is_ok());

        store.shutdown().await;

        assert!(matches!(
            store.health_check().await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }
}
