//! Error classification: maps transport/decode failures and HTTP status
//! codes onto a typed, retry-aware taxonomy.
pub use kube_core::ErrorResponse;
use thiserror::Error;

/// Possible errors when sending or decoding a request against the Kubernetes API.
#[derive(Error, Debug)]
pub enum Error {
    /// `400 Bad Request`: the server rejected the request as malformed.
    #[error("bad request: {0}")]
    BadRequest(#[source] ErrorResponse),

    /// `401 Unauthorized`: no valid credentials were presented.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[source] ErrorResponse),

    /// `403 Forbidden`: the credentials presented are not authorized for this call.
    #[error("forbidden: {0}")]
    Forbidden(#[source] ErrorResponse),

    /// `404 Not Found`.
    #[error("not found: {0}")]
    NotFound(#[source] ErrorResponse),

    /// `409 Conflict` with reason `AlreadyExists`.
    #[error("already exists: {0}")]
    AlreadyExists(#[source] ErrorResponse),

    /// `409 Conflict` for any other reason (e.g. a stale `resourceVersion`).
    #[error("conflict: {0}")]
    Conflict(#[source] ErrorResponse),

    /// `410 Gone`: the watch's `resourceVersion` has been compacted away;
    /// the caller must relist and discard its resume token.
    #[error("resource version too old: {0}")]
    Gone(#[source] ErrorResponse),

    /// `422 Unprocessable Entity`: semantically invalid request body.
    #[error("invalid: {0}")]
    Invalid(#[source] ErrorResponse),

    /// `429 Too Many Requests`: the caller should back off and retry.
    #[error("throttled: {0}")]
    Throttled(#[source] ErrorResponse),

    /// Any `5xx`. Safe to retry with backoff.
    #[error("server error ({status}): {0}", status = .0.code)]
    ServerError(#[source] ErrorResponse),

    /// An error response the classifier could not map to a more specific
    /// variant (unexpected status code, or an error body instead of one).
    #[error("api error: {0}")]
    Api(#[source] ErrorResponse),

    /// The connection failed, or the server closed it mid-response.
    /// Safe to retry with backoff.
    #[error("transport error: {0}")]
    TransportError(#[source] tower::BoxError),

    /// The response body was not valid JSON, or did not match the
    /// requested type's shape. Never safe to blindly retry.
    #[error("malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// Failed to assemble the outgoing request (bad query parameters, a
    /// descriptor that doesn't support this operation, an unbuildable URI).
    #[error("request error: {0}")]
    Request(#[from] kube_core::Error),

    /// `http::Error` while assembling a request.
    #[error("http error: {0}")]
    HttpError(#[from] http::Error),

    /// The descriptor does not advertise the capability this call requires.
    /// Raised before any I/O is attempted.
    #[error("operation not supported by this resource: {0}")]
    UnsupportedOperation(String),

    /// The in-flight call was cancelled (e.g. the watch task's
    /// `CancellationToken` fired).
    #[error("operation cancelled")]
    Cancelled,

    /// A [`crate::client::Config`] could not be turned into a working
    /// transport stack (bad TLS material, an unparsable header value).
    #[error("invalid client configuration: {0}")]
    ConfigError(String),
}

impl From<kube_core::request::Error> for Error {
    fn from(e: kube_core::request::Error) -> Self {
        match e {
            kube_core::request::Error::Validation(e) => Error::Request(e),
            kube_core::request::Error::BuildRequest(e) => Error::HttpError(e),
            kube_core::request::Error::SerializeBody(e) => Error::MalformedResponse(e),
        }
    }
}

impl Error {
    /// Whether retrying this exact call, unmodified, might succeed.
    ///
    /// `Gone` is deliberately NOT retryable here: the caller must first
    /// drop its resume token and relist, which is a different call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ServerError(_) | Error::TransportError(_) | Error::Throttled(_))
    }
}

/// Classify a non-2xx HTTP response into a typed [`Error`], given its
/// status code and decoded [`ErrorResponse`] body.
pub fn classify(status: http::StatusCode, body: ErrorResponse) -> Error {
    match (status.as_u16(), body.reason.as_str()) {
        (400, _) => Error::BadRequest(body),
        (401, _) => Error::Unauthenticated(body),
        (403, _) => Error::Forbidden(body),
        (404, _) => Error::NotFound(body),
        (409, "AlreadyExists") => Error::AlreadyExists(body),
        (409, _) => Error::Conflict(body),
        (410, _) => Error::Gone(body),
        (422, _) => Error::Invalid(body),
        (429, _) => Error::Throttled(body),
        (500..=599, _) => Error::ServerError(body),
        _ => Error::Api(body),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn resp(code: u16, reason: &str) -> ErrorResponse {
        ErrorResponse {
            status: "Failure".into(),
            message: "boom".into(),
            reason: reason.into(),
            code,
        }
    }

    #[test]
    fn classifies_conflict_vs_already_exists() {
        assert!(matches!(
            classify(http::StatusCode::CONFLICT, resp(409, "AlreadyExists")),
            Error::AlreadyExists(_)
        ));
        assert!(matches!(
            classify(http::StatusCode::CONFLICT, resp(409, "Conflict")),
            Error::Conflict(_)
        ));
    }

    #[test]
    fn five_xx_is_retryable_gone_is_not() {
        assert!(classify(http::StatusCode::BAD_GATEWAY, resp(502, "")).is_retryable());
        assert!(!classify(http::StatusCode::GONE, resp(410, "Expired")).is_retryable());
    }

    #[test]
    fn throttled_is_retryable() {
        assert!(classify(http::StatusCode::TOO_MANY_REQUESTS, resp(429, "")).is_retryable());
    }
}
