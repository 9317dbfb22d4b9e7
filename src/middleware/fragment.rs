use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

pub const HX_REQUEST: &str = "hx-request";

/// Whether the request came from HTMX (`HX-Request: true`) and wants a
/// fragment instead of a full page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HxRequest(pub bool);

#[async_trait]
impl<S> FromRequestParts<S> for HxRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_fragment = parts
            .headers
            .get(HX_REQUEST)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(HxRequest(is_fragment))
    }
}
