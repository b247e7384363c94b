use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use reel_types::api::{Status, StatusResponse};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    /// Bad login or a bad/expired token. The message never says which
    /// part was wrong.
    #[error("invalid credentials")]
    InvalidCredential,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("username already exists")]
    DuplicateUsername,

    /// A collaborator (database, hasher, signer, storage) failed, or the
    /// request deadline passed. `step` names what was being attempted.
    #[error("{step} failed")]
    Upstream {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn upstream(step: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Upstream {
            step,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateUsername => StatusCode::CONFLICT,
            Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Tags a collaborator error with the step that produced it.
pub trait UpstreamExt<T> {
    fn upstream(self, step: &'static str) -> ApiResult<T>;
}

impl<T, E: Into<anyhow::Error>> UpstreamExt<T> for Result<T, E> {
    fn upstream(self, step: &'static str) -> ApiResult<T> {
        self.map_err(|e| ApiError::upstream(step, e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Upstream { step, source } = &self {
            error!("{} failed: {:#}", step, source);
        }

        let status = self.status();
        let body = Json(StatusResponse {
            status: Status {
                status_code: i32::from(status.as_u16()),
                status_msg: self.to_string(),
            },
        });

        (status, body).into_response()
    }
}
