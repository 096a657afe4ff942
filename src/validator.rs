//! Request extractors that reject with an [`AppError`] body.
//!
//! Malformed bodies are rejected with 400; bodies that parse but break a
//! field rule are rejected with 422. A path id that does not parse names
//! nothing, so it is a 404. A query string that does not parse is a 400.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        path::ErrorKind as PathErrorKind,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use lectern_core::AppError;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let error_msg = rejection.body_text();

    if error_msg.contains("missing field") {
        let field = error_msg
            .split("missing field `")
            .nth(1)
            .and_then(|s| s.split('`').next())
            .unwrap_or("unknown");
        return AppError::bad_request(anyhow!("{} is required", field));
    }

    if error_msg.contains("invalid type") || error_msg.contains("unknown variant") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

/// Turns a path key such as `course_id` into `Course`.
fn resource_label(key: &str) -> String {
    let name = key.strip_suffix("_id").unwrap_or(key).replace('_', " ");
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Resource".to_string(),
    }
}

fn path_rejection_to_error(rejection: PathRejection) -> AppError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(inner) => {
            let key = match inner.kind() {
                PathErrorKind::ParseErrorAtKey { key, .. }
                | PathErrorKind::DeserializeError { key, .. }
                | PathErrorKind::InvalidUtf8InPathParam { key } => Some(key.as_str()),
                _ => None,
            };
            match key {
                Some(key) => AppError::not_found(format!("{} not found", resource_label(key))),
                None => AppError::not_found("Resource not found"),
            }
        }
        other => AppError::infrastructure(anyhow!("path extraction failed: {}", other.body_text())),
    }
}

fn query_rejection_to_error(rejection: QueryRejection) -> AppError {
    tracing::debug!(reason = %rejection.body_text(), "Rejected query string");
    AppError::bad_request(anyhow!("Invalid query parameters"))
}

/// [`Path`] with structured rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection_to_error)?;
        Ok(ValidPath(value))
    }
}

/// [`Query`] with structured rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection_to_error)?;
        Ok(ValidQuery(value))
    }
}
