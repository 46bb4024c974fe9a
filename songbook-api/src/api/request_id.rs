//! Request id extraction
//!
//! `SetRequestIdLayer` stamps every incoming request with `x-request-id`
//! (keeping a client-supplied value). Handlers read it back with
//! [`RequestId`] so error bodies carry the same id as the response header.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The current request's id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            // Only reachable when the router runs without the request-id layer
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(RequestId(id))
    }
}
