use crate::config::AssignmentUpdatePolicy;
use crate::dtos::{
    AssignmentCountParams, AssignmentInput, AssignmentListParams, AssignmentResponse,
    CountResponse, DeleteAck, InsertAck, UpdateAck,
};
use crate::handlers::parse_object_id;
use crate::services::{metrics, AssignmentFilter, Page};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// POST /assignments
pub async fn create_assignment(
    State(state): State<AppState>,
    Json(input): Json<AssignmentInput>,
) -> Result<(StatusCode, Json<InsertAck>), AppError> {
    input.validate()?;

    let assignment = input.into_assignment();
    let id = state.store.insert_assignment(&assignment).await?;
    metrics::record_assignment_created();

    tracing::info!(
        assignment_id = %id,
        title = %assignment.title,
        level = %assignment.difficulty_level,
        "Assignment created"
    );

    Ok((StatusCode::CREATED, Json(InsertAck::new(id.to_hex()))))
}

/// GET /assignments?level=&page=&size=
pub async fn list_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentListParams>,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    let filter = AssignmentFilter::from_level(params.level.as_deref())?;
    let page = Page::from_params(params.page.as_deref(), params.size.as_deref())?;

    let assignments = state.store.list_assignments(&filter, page).await?;

    Ok(Json(
        assignments
            .into_iter()
            .map(AssignmentResponse::from)
            .collect(),
    ))
}

/// GET /assignmentCount?level=
pub async fn count_assignments(
    State(state): State<AppState>,
    Query(params): Query<AssignmentCountParams>,
) -> Result<Json<CountResponse>, AppError> {
    let filter = AssignmentFilter::from_level(params.level.as_deref())?;
    let count = state.store.count_assignments(&filter).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /assignments/:id
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let id = parse_object_id(&id)?;

    let assignment = state
        .store
        .find_assignment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Assignment not found")))?;

    Ok(Json(AssignmentResponse::from(assignment)))
}

/// DELETE /assignments/:id
///
/// Deleting an unknown assignment is not an error; the ack reports 0.
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let id = parse_object_id(&id)?;

    let deleted = state.store.delete_assignment(id).await?;
    metrics::record_assignment_deleted(deleted);

    tracing::info!(assignment_id = %id, deleted, "Assignment delete processed");

    Ok(Json(DeleteAck::new(deleted)))
}

/// PUT /assignments/:id
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AssignmentInput>,
) -> Result<Json<UpdateAck>, AppError> {
    let id = parse_object_id(&id)?;
    input.validate()?;

    let upsert = state.config.assignments.update_policy == AssignmentUpdatePolicy::Upsert;
    let outcome = state
        .store
        .replace_assignment_fields(id, &input.into_assignment(), upsert)
        .await?;

    if outcome.matched == 0 && outcome.upserted_id.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Assignment not found")));
    }

    tracing::info!(
        assignment_id = %id,
        matched = outcome.matched,
        modified = outcome.modified,
        upserted = outcome.upserted_id.is_some(),
        "Assignment updated"
    );

    Ok(Json(UpdateAck {
        acknowledged: true,
        matched_count: outcome.matched,
        modified_count: outcome.modified,
        upserted_count: u64::from(outcome.upserted_id.is_some()),
        upserted_id: outcome.upserted_id.map(|id| id.to_hex()),
    }))
}
