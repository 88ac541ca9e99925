use crate::config::IdentitySource;
use crate::dtos::{
    CreateSubmissionRequest, GradeSubmissionRequest, InsertAck, SubmissionResponse, UpdateAck,
};
use crate::handlers::parse_object_id;
use crate::middleware::CallerIdentity;
use crate::services::metrics;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// POST /submissions
pub async fn create_submission(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<InsertAck>), AppError> {
    request.validate()?;

    // A gateway-authenticated caller can only submit as themselves.
    if state.config.identity.source == IdentitySource::Header {
        if let Some(email) = caller.email() {
            if !email.eq_ignore_ascii_case(&request.submitted_by) {
                return Err(AppError::Forbidden(anyhow::anyhow!(
                    "submitted_by does not match the authenticated user"
                )));
            }
        }
    }

    let submission = request.into_submission()?;
    let id = state.store.insert_submission(&submission).await?;
    metrics::record_submission_created();

    tracing::info!(
        submission_id = %id,
        submitted_by = %submission.submitted_by,
        status = %submission.status,
        "Submission created"
    );

    Ok((StatusCode::CREATED, Json(InsertAck::new(id.to_hex()))))
}

/// GET /submissions
///
/// Pending submissions from other users, i.e. the caller's review queue.
pub async fn list_review_queue(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    let submissions = state
        .store
        .list_submissions(&caller.review_queue())
        .await?;

    Ok(Json(
        submissions
            .into_iter()
            .map(SubmissionResponse::from)
            .collect(),
    ))
}

/// GET /my-submissions
pub async fn list_my_submissions(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    let submissions = state
        .store
        .list_submissions(&caller.own_submissions())
        .await?;

    Ok(Json(
        submissions
            .into_iter()
            .map(SubmissionResponse::from)
            .collect(),
    ))
}

/// PATCH /submissions/:id
pub async fn grade_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<GradeSubmissionRequest>,
) -> Result<Json<UpdateAck>, AppError> {
    let id = parse_object_id(&id)?;
    request.validate()?;

    let grade = request.into_grade();
    let outcome = state.store.grade_submission(id, &grade).await?;

    if outcome.matched == 0 {
        return Err(AppError::NotFound(anyhow::anyhow!("Submission not found")));
    }

    if outcome.modified > 0 {
        metrics::record_submission_graded(grade.status);
    }
    tracing::info!(
        submission_id = %id,
        given_mark = grade.given_mark,
        status = %grade.status,
        "Submission graded"
    );

    Ok(Json(UpdateAck {
        acknowledged: true,
        matched_count: outcome.matched,
        modified_count: outcome.modified,
        upserted_count: 0,
        upserted_id: None,
    }))
}
