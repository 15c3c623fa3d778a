// src/shared/error.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use super::shared_structs::GenericResponse;

/// Failure raised by a sale store. Propagated verbatim; the service never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The store cannot serve requests (e.g. a poisoned in-memory lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by `SaleService`.
///
/// An absent sale on lookup is `Ok(None)`, not an error; `NotFound` is only
/// raised where the operation cannot proceed without the sale (delete).
#[derive(Debug, Error)]
pub enum SaleError {
    #[error("sale {0} not found")]
    NotFound(i64),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SaleError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type SaleResult<T> = Result<T, SaleError>;

impl ResponseError for SaleError {
    fn status_code(&self) -> StatusCode {
        match self {
            SaleError::NotFound(_) => StatusCode::NOT_FOUND,
            SaleError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SaleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Store details stay in the logs.
            SaleError::Store(e) => {
                tracing::error!(error = %e, "store failure while handling request");
                "Internal error while processing the sale".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(GenericResponse::error(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_kind() {
        assert_eq!(SaleError::NotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            SaleError::invalid("period 'weekly'").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SaleError::from(StoreError::Unavailable("lock poisoned".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_name_the_offending_value() {
        assert_eq!(SaleError::NotFound(42).to_string(), "sale 42 not found");
        assert!(SaleError::invalid("unknown profit period: 'unknown'")
            .to_string()
            .contains("'unknown'"));
    }
}
