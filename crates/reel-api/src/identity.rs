use axum::http::{HeaderMap, header};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::token::TokenKeys;

/// The caller a response is computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Authenticated { id: i64, name: String },
}

impl Viewer {
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Authenticated { id, .. } => Some(*id),
            Self::Anonymous => None,
        }
    }
}

/// No token means an anonymous viewer. A token that fails verification is
/// an error, never a silent fallback to anonymous.
pub fn resolve(keys: &TokenKeys, token: Option<&str>) -> ApiResult<Viewer> {
    let token = match token.map(str::trim) {
        None | Some("") => return Ok(Viewer::Anonymous),
        Some(token) => token,
    };

    let claims = keys.verify(token).map_err(|e| {
        debug!("Token rejected: {}", e);
        ApiError::InvalidCredential
    })?;

    Ok(Viewer::Authenticated {
        id: claims.sub,
        name: claims.username,
    })
}

/// The token a request presents: the `token` parameter if set, otherwise an
/// `Authorization: Bearer` header.
pub fn presented_token<'a>(param: Option<&'a str>, headers: &'a HeaderMap) -> Option<&'a str> {
    param.filter(|t| !t.is_empty()).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    })
}
