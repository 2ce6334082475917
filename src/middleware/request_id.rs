use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest caller-supplied ID that is kept
const MAX_REQUEST_ID_LEN: usize = 64;

/// Correlation ID for one request
///
/// Front-ends may send their own ID in `x-request-id` so a swipe can be traced
/// from the client through the engine logs. Anything that is not a short token
/// of ASCII letters, digits, `-`, `_` or `.` is replaced by a fresh UUID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts a caller-supplied ID, or `None` if it is not a safe token
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_REQUEST_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn incoming(request: &Request) -> Option<Self> {
        let raw = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
        Self::parse(raw)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attaches a [`RequestId`] to the request and echoes it in the response
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::incoming(&request).unwrap_or_else(RequestId::generate);
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    // parse() only admits visible ASCII, so this holds for every ID
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Span for `TraceLayer`
///
/// Records the route template (`/investors/:investor_id/score`) rather than the
/// concrete path, so investor IDs appear only where handlers log them.
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let extensions = request.extensions();
    let request_id = extensions
        .get::<RequestId>()
        .map_or("unknown", RequestId::as_str);
    let route = extensions
        .get::<MatchedPath>()
        .map_or("unmatched", MatchedPath::as_str);

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        route = %route,
        request_id = %request_id,
    )
}
