//! Identity extraction.
//!
//! Token minting, JWKS verification, and session policy are treated as an
//! already-solved externality (§1 out-of-scope): by the time a request
//! reaches a handler it is assumed to carry a resolved user id. This
//! extractor reads that id off a header set by whatever sits in front of
//! this service (a gateway, a sidecar, or — in local/dev use — the caller
//! directly).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

const USER_ID_HEADER: &str = "x-user-id";

/// Resolved caller identity. `uid` is opaque; nothing here interprets it.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uid = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or((StatusCode::UNAUTHORIZED, "missing resolved user identity"))?;

        let email = parts
            .headers
            .get("x-user-email")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(AuthUser { uid, email })
    }
}
