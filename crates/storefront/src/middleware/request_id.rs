//! Request ID middleware for correlating logs, Sentry events and responses.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID accepted as-is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Take the upstream request ID when it is sane, otherwise mint a UUID v4.
fn resolve_request_id(upstream: Option<&str>) -> String {
    upstream
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Ensure every request carries an ID.
///
/// The ID is recorded on the current span, tagged on the Sentry scope and
/// echoed in the `x-request-id` response header.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_is_kept() {
        assert_eq!(resolve_request_id(Some("abc-123_x")), "abc-123_x");
    }

    #[test]
    fn test_bad_upstream_id_is_replaced() {
        let id = resolve_request_id(Some("has spaces\"and quotes"));
        assert!(Uuid::parse_str(&id).is_ok());

        let id = resolve_request_id(Some(&"a".repeat(MAX_REQUEST_ID_LEN + 1)));
        assert!(Uuid::parse_str(&id).is_ok());

        let id = resolve_request_id(None);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
