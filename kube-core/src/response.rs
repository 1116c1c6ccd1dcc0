//! Generic api response types: the server's `Status` object, and the
//! `ResourceOrStatus` sum the Response Decoder produces for delete calls.
use serde::Deserialize;

fn is_zero(n: &u16) -> bool {
    *n == 0
}
fn is_zero_u32(n: &u32) -> bool {
    *n == 0
}

/// A Kubernetes status object, returned instead of a resource body on some
/// operations (most commonly `delete`) and on every non-2xx response.
#[derive(Deserialize, Debug, Clone)]
pub struct Status {
    /// Suggested HTTP return code (0 if unset).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub code: u16,
    /// `Success` or `Failure`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// Human-readable description of the status.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Machine-readable reason, e.g. `AlreadyExists`. Clarifies but never
    /// overrides the HTTP status code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Reason-specific extended data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

/// Extended detail on a [`Status`].
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    /// Name of the resource the status describes, if a single one applies.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Group of the resource the status describes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Kind of the resource the status describes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// UID of the resource the status describes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    /// Detailed per-field causes, when available.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<StatusCause>,
    /// Seconds to wait before retrying, for some failure reasons (e.g. `Throttled`).
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub retry_after_seconds: u32,
}

/// A single cause contributing to a [`StatusDetails`].
#[derive(Deserialize, Debug, Clone)]
pub struct StatusCause {
    /// Machine-readable cause.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Human-readable cause.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// JSON-path-like pointer to the offending field.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field: String,
}

/// The result of a delete call: either the deleted object (if the server
/// echoed it back) or a server acknowledgement with no object body.
///
/// The Response Decoder distinguishes the two by inspecting the decoded
/// JSON `kind` field: `"Status"` selects `Status`, anything else selects
/// `Resource`.
#[derive(Debug, Clone)]
pub enum ResourceOrStatus<R> {
    /// The full, typed resource as it existed immediately before deletion.
    Resource(R),
    /// A bare server acknowledgement, with no object body.
    Status(Status),
}

impl<R> ResourceOrStatus<R> {
    /// The resource, if this is the `Resource` variant.
    pub fn resource(self) -> Option<R> {
        match self {
            Self::Resource(r) => Some(r),
            Self::Status(_) => None,
        }
    }

    /// The status, if this is the `Status` variant.
    pub fn status(self) -> Option<Status> {
        match self {
            Self::Resource(_) => None,
            Self::Status(s) => Some(s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Status;

    #[test]
    fn status_deserializes_with_details() {
        let raw = r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Success","details":{"name":"some-app","group":"clux.dev","kind":"foos","uid":"1234-some-uid"}}"#;
        let s: Status = serde_json::from_str(raw).unwrap();
        assert_eq!(s.details.unwrap().name, "some-app");
    }

    #[test]
    fn status_deserializes_without_name() {
        let raw = r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Success","details":{"group":"clux.dev","kind":"foos","uid":"1234-some-uid"}}"#;
        let s: Status = serde_json::from_str(raw).unwrap();
        assert_eq!(s.details.unwrap().name, "");
    }
}
