use crate::config::IdentitySource;
use crate::services::SubmissionFilter;
use crate::startup::AppState;
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use service_core::error::AppError;
use validator::ValidateEmail;

/// Header carrying the authenticated user's email, set by the gateway.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Email of the user making the request, if one was supplied.
///
/// Resolved from `X-User-Email` or, when the service runs with
/// `IDENTITY_SOURCE=query`, from the unverified `email` query parameter.
/// In header mode a request naming itself only through `?email=` is
/// rejected with 401. `None` means no caller was named; submission
/// listings are then unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub Option<String>);

#[derive(Debug, Deserialize)]
struct EmailQuery {
    email: Option<String>,
}

impl CallerIdentity {
    pub fn email(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Pending work awaiting review that the caller did not submit.
    pub fn review_queue(&self) -> SubmissionFilter {
        match &self.0 {
            Some(email) => SubmissionFilter::PendingExcept(email.clone()),
            None => SubmissionFilter::All,
        }
    }

    /// Everything the caller submitted.
    pub fn own_submissions(&self) -> SubmissionFilter {
        match &self.0 {
            Some(email) => SubmissionFilter::OwnedBy(email.clone()),
            None => SubmissionFilter::All,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn query_email(parts: &Parts) -> Result<Option<String>, AppError> {
    let Query(query) = Query::<EmailQuery>::try_from_uri(&parts.uri)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid query string: {}", e)))?;
    Ok(non_empty(query.email.as_deref()))
}

#[async_trait]
impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let email = match state.config.identity.source {
            IdentitySource::Header => {
                let email = non_empty(
                    parts
                        .headers
                        .get(USER_EMAIL_HEADER)
                        .and_then(|v| v.to_str().ok()),
                );
                match &email {
                    Some(email) if !email.validate_email() => {
                        return Err(AppError::Unauthorized(anyhow::anyhow!(
                            "Invalid {} header",
                            USER_EMAIL_HEADER
                        )));
                    }
                    // `?email=` without the header is refused, not ignored.
                    None if query_email(parts)?.is_some() => {
                        return Err(AppError::Unauthorized(anyhow::anyhow!(
                            "The email query parameter is not accepted; send {}",
                            USER_EMAIL_HEADER
                        )));
                    }
                    _ => {}
                }
                email
            }
            IdentitySource::Query => query_email(parts)?,
        };

        if let Some(email) = &email {
            tracing::Span::current().record("caller", email.as_str());
        }

        Ok(CallerIdentity(email))
    }
}
