use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gupta_core::error::CoreError;
use gupta_db::error::EventStoreError;

use crate::response::StatusResponse;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce the `{"status": "error", "message": ...}`
/// envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `gupta_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<EventStoreError> for AppError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::Core(core) => AppError::Core(core),
            EventStoreError::Storage(db) => AppError::Database(db),
        }
    }
}

/// Malformed query strings (e.g. a duplicated parameter) are client parse
/// errors and use the same envelope as every other error.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Core(CoreError::Parse(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::MissingField(_) | CoreError::Parse(_) | CoreError::InvalidArgument { .. } => {
                    (StatusCode::BAD_REQUEST, core.to_string())
                }
                CoreError::AlreadySaved(_) => (StatusCode::CONFLICT, core.to_string()),
            },
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, axum::Json(StatusResponse::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(status_of(CoreError::MissingField("body")), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CoreError::Parse("eof".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(CoreError::InvalidArgument {
                field: "start".into(),
                message: "expected an integer".into(),
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn query_rejections_become_parse_errors() {
        use axum::extract::Query;
        use gupta_core::query::RawEventQuery;

        let uri = "/getEvents?applicationId=1&applicationId=2&start=0"
            .parse()
            .unwrap();
        let rejection = Query::<RawEventQuery>::try_from_uri(&uri).unwrap_err();

        let err = AppError::from(rejection);
        assert!(matches!(err, AppError::Core(CoreError::Parse(_))));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn already_saved_maps_to_409() {
        let err = EventStoreError::Core(CoreError::AlreadySaved(3));
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn storage_errors_are_sanitized() {
        let err = EventStoreError::Storage(sqlx::Error::PoolTimedOut);
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
