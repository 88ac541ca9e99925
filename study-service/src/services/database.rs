use crate::config::MongoConfig;
use crate::models::{Assignment, Grade, Submission, SubmissionStatus};
use crate::services::store::{AssignmentFilter, Page, StudyStore, SubmissionFilter, UpdateOutcome};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    options::{
        ClientOptions, Credential, FindOptions, IndexOptions, ServerApi, ServerApiVersion,
        UpdateOptions,
    },
    results::UpdateResult,
    Client as MongoClient, Collection, Database, IndexModel,
};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use service_core::error::AppError;

const ASSIGNMENTS: &str = "assignments";
const SUBMISSIONS: &str = "submissions";

/// MongoDB-backed store. Cloning shares the driver's connection pool.
#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        tracing::info!(database = %config.database, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::ConfigError(anyhow::Error::new(e))
        })?;
        options.app_name = Some("study-service".to_string());

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.expose_secret().clone())
                    .build(),
            );
        }

        if config.stable_api {
            options.server_api = Some(
                ServerApi::builder()
                    .version(ServerApiVersion::V1)
                    .strict(true)
                    .deprecation_errors(true)
                    .build(),
            );
        }

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(&config.database);
        tracing::info!(database = %config.database, "MongoDB client ready");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for study-service");

        let level_index = IndexModel::builder()
            .keys(doc! { "difficultyLevel": 1 })
            .options(
                IndexOptions::builder()
                    .name("difficulty_level_lookup".to_string())
                    .build(),
            )
            .build();

        self.assignments()
            .create_index(level_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create difficultyLevel index on assignments collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on assignments.difficultyLevel");

        let reviewer_index = IndexModel::builder()
            .keys(doc! { "submitted_by": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("submitter_status_lookup".to_string())
                    .build(),
            )
            .build();

        self.submissions()
            .create_index(reviewer_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create (submitted_by, status) index on submissions collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on submissions.(submitted_by, status)");

        Ok(())
    }

    pub fn assignments(&self) -> Collection<Assignment> {
        self.db.collection(ASSIGNMENTS)
    }

    pub fn submissions(&self) -> Collection<Submission> {
        self.db.collection(SUBMISSIONS)
    }

    /// Untyped view of a collection, for reads that tolerate malformed documents.
    fn raw(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

pub(crate) fn assignment_filter_doc(filter: &AssignmentFilter) -> Document {
    let mut query = doc! {};
    if let Some(level) = filter.level {
        query.insert("difficultyLevel", level.to_string());
    }
    query
}

pub(crate) fn submission_filter_doc(filter: &SubmissionFilter) -> Document {
    match filter {
        SubmissionFilter::All => doc! {},
        SubmissionFilter::PendingExcept(email) => doc! {
            "submitted_by": { "$ne": email },
            "status": SubmissionStatus::Pending.to_string(),
        },
        SubmissionFilter::OwnedBy(email) => doc! { "submitted_by": email },
    }
}

pub(crate) fn find_options(page: Option<Page>) -> Option<FindOptions> {
    page.map(|page| {
        FindOptions::builder()
            .skip(page.skip)
            .limit(page.limit as i64)
            .build()
    })
}

/// `$set` of every editable assignment field.
pub(crate) fn assignment_update_doc(assignment: &Assignment) -> Result<Document, AppError> {
    let mut fields = bson::to_document(assignment).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to serialize assignment: {}", e))
    })?;
    fields.remove("_id");
    Ok(doc! { "$set": fields })
}

pub(crate) fn grade_update_doc(grade: &Grade) -> Document {
    doc! {
        "$set": {
            "givenMark": grade.given_mark,
            "feedback": grade.feedback.as_str(),
            "status": grade.status.to_string(),
        }
    }
}

/// Decodes each document on its own; documents that do not fit the model are
/// logged and left out instead of failing the whole listing.
pub(crate) fn decode_documents<T>(documents: Vec<Document>, collection: &str) -> Vec<T>
where
    T: DeserializeOwned,
{
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").cloned();
            match bson::from_document(document) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(
                        collection,
                        id = ?id,
                        "Skipping malformed document: {}",
                        e
                    );
                    None
                }
            }
        })
        .collect()
}

fn inserted_object_id(inserted: Bson) -> Result<ObjectId, AppError> {
    inserted.as_object_id().ok_or_else(|| {
        AppError::DatabaseError(anyhow::anyhow!(
            "Store returned a non-ObjectId identifier: {}",
            inserted
        ))
    })
}

fn update_outcome(result: UpdateResult) -> UpdateOutcome {
    UpdateOutcome {
        matched: result.matched_count,
        modified: result.modified_count,
        upserted_id: result.upserted_id.and_then(|id| id.as_object_id()),
    }
}

#[async_trait]
impl StudyStore for MongoStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn insert_assignment(&self, assignment: &Assignment) -> Result<ObjectId, AppError> {
        let result = self
            .assignments()
            .insert_one(assignment, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert assignment: {}", e);
                AppError::from(e)
            })?;
        inserted_object_id(result.inserted_id)
    }

    async fn list_assignments(
        &self,
        filter: &AssignmentFilter,
        page: Option<Page>,
    ) -> Result<Vec<Assignment>, AppError> {
        let cursor = self
            .raw(ASSIGNMENTS)
            .find(assignment_filter_doc(filter), find_options(page))
            .await
            .map_err(|e| {
                tracing::error!("Failed to list assignments: {}", e);
                AppError::from(e)
            })?;

        let documents: Vec<Document> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect assignments: {}", e);
            AppError::from(e)
        })?;
        Ok(decode_documents(documents, ASSIGNMENTS))
    }

    async fn count_assignments(&self, filter: &AssignmentFilter) -> Result<u64, AppError> {
        self.assignments()
            .count_documents(assignment_filter_doc(filter), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count assignments: {}", e);
                AppError::from(e)
            })
    }

    async fn find_assignment(&self, id: ObjectId) -> Result<Option<Assignment>, AppError> {
        self.assignments()
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(assignment_id = %id, "Failed to find assignment: {}", e);
                AppError::from(e)
            })
    }

    async fn delete_assignment(&self, id: ObjectId) -> Result<u64, AppError> {
        let result = self
            .assignments()
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(assignment_id = %id, "Failed to delete assignment: {}", e);
                AppError::from(e)
            })?;
        Ok(result.deleted_count)
    }

    async fn replace_assignment_fields(
        &self,
        id: ObjectId,
        assignment: &Assignment,
        upsert: bool,
    ) -> Result<UpdateOutcome, AppError> {
        // An upsert on an `_id` equality filter inserts under that same `_id`.
        let options = UpdateOptions::builder().upsert(upsert).build();
        let result = self
            .assignments()
            .update_one(doc! { "_id": id }, assignment_update_doc(assignment)?, options)
            .await
            .map_err(|e| {
                tracing::error!(assignment_id = %id, "Failed to update assignment: {}", e);
                AppError::from(e)
            })?;
        Ok(update_outcome(result))
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<ObjectId, AppError> {
        let result = self
            .submissions()
            .insert_one(submission, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert submission: {}", e);
                AppError::from(e)
            })?;
        inserted_object_id(result.inserted_id)
    }

    async fn list_submissions(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, AppError> {
        let cursor = self
            .raw(SUBMISSIONS)
            .find(submission_filter_doc(filter), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list submissions: {}", e);
                AppError::from(e)
            })?;

        let documents: Vec<Document> = cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect submissions: {}", e);
            AppError::from(e)
        })?;
        Ok(decode_documents(documents, SUBMISSIONS))
    }

    async fn grade_submission(
        &self,
        id: ObjectId,
        grade: &Grade,
    ) -> Result<UpdateOutcome, AppError> {
        let result = self
            .submissions()
            .update_one(doc! { "_id": id }, grade_update_doc(grade), None)
            .await
            .map_err(|e| {
                tracing::error!(submission_id = %id, "Failed to grade submission: {}", e);
                AppError::from(e)
            })?;
        Ok(update_outcome(result))
    }

    async fn shutdown(&self) {
        tracing::info!("Closing MongoDB client");
        self.client.clone().shutdown().await;
    }
}
