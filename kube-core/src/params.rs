//! Per-verb option bundles: query parameters and bodies for list/get/watch/
//! patch/delete calls, ported from apimachinery's `types.go` Optionals.
use serde::Serialize;

use crate::error::Error;

/// Options recognized by `list` and `deleteCollection`.
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    /// Restrict results by label. Populated via [`crate::selector`] encoding.
    pub label_selector: Option<String>,
    /// Restrict results by field. Populated via [`crate::selector`] encoding.
    pub field_selector: Option<String>,
    /// Server-defined opaque cursor.
    pub resource_version: Option<String>,
    /// Positive integer page size.
    pub limit: Option<u32>,
    /// Opaque continuation token from a previous page.
    pub continue_token: Option<String>,
    /// Total wait for a list call, in seconds. Must be `< 295`.
    pub timeout_seconds: Option<u32>,
    /// Request pretty-printed JSON.
    pub pretty: bool,
}

impl ListOptions {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if let Some(t) = self.timeout_seconds {
            if t >= 295 {
                return Err(Error::RequestValidation("timeoutSeconds must be < 295s".into()));
            }
        }
        Ok(())
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if let Some(l) = &self.label_selector {
            qp.append_pair("labelSelector", l);
        }
        if let Some(f) = &self.field_selector {
            qp.append_pair("fieldSelector", f);
        }
        if let Some(rv) = &self.resource_version {
            qp.append_pair("resourceVersion", rv);
        }
        if let Some(limit) = self.limit {
            qp.append_pair("limit", &limit.to_string());
        }
        if let Some(c) = &self.continue_token {
            qp.append_pair("continue", c);
        }
        if let Some(t) = self.timeout_seconds {
            qp.append_pair("timeoutSeconds", &t.to_string());
        }
        if self.pretty {
            qp.append_pair("pretty", "true");
        }
    }
}

/// Options recognized by `watch`, layered on top of [`ListOptions`].
#[derive(Clone, Debug, Default)]
pub struct WatchParams {
    /// See [`ListOptions`].
    pub list: ListOptions,
    /// Whether `Bookmark` events should be forwarded to the caller.
    pub allow_watch_bookmarks: bool,
}

impl WatchParams {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        self.list.validate()
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        self.list.populate_qp(qp);
        if self.allow_watch_bookmarks {
            qp.append_pair("allowWatchBookmarks", "true");
        }
        qp.append_pair("watch", "true");
    }
}

/// Options recognized by `get`.
#[derive(Clone, Debug, Default)]
pub struct ReadOptions {
    /// Request pretty-printed JSON.
    pub pretty: bool,
    /// Allow a stale read at a known cursor.
    pub resource_version: Option<String>,
}

impl ReadOptions {
    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if self.pretty {
            qp.append_pair("pretty", "true");
        }
        if let Some(rv) = &self.resource_version {
            qp.append_pair("resourceVersion", rv);
        }
    }
}

/// Options recognized by `create`/`update`.
#[derive(Default, Clone, Debug)]
pub struct PostParams {
    /// Whether to run this as a dry run.
    pub dry_run: bool,
    /// Name of the actor making the change.
    pub field_manager: Option<String>,
}

impl PostParams {
    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if self.dry_run {
            qp.append_pair("dryRun", "All");
        }
        if let Some(fm) = &self.field_manager {
            qp.append_pair("fieldManager", fm);
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if let Some(fm) = &self.field_manager {
            if fm.len() > 128 {
                return Err(Error::RequestValidation("field_manager too long".into()));
            }
        }
        Ok(())
    }
}

/// The `fieldValidation` directive used by server-side apply.
#[derive(Clone, Debug)]
pub enum ValidationDirective {
    /// Fail the request on any unknown or duplicate field.
    Strict,
    /// Warn on unknown or duplicate fields, but still succeed.
    Warn,
    /// Silently drop/ignore unknown or duplicate fields.
    Ignore,
}

impl ValidationDirective {
    /// The wire string for this directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Warn => "Warn",
            Self::Ignore => "Ignore",
        }
    }
}

/// A patch, tagged with its Kubernetes merge strategy.
///
/// See the system spec's Request Builder component for the exact
/// `Content-Type` string each variant maps to.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum Patch<T: Serialize> {
    /// Server-side apply. Requires `PatchParams::field_manager`.
    Apply(T),
    /// RFC 6902 JSON patch.
    Json(T),
    /// RFC 7386 JSON merge patch.
    Merge(T),
    /// Kubernetes strategic merge patch.
    Strategic(T),
}

impl<T: Serialize> Patch<T> {
    pub(crate) fn is_apply(&self) -> bool {
        matches!(self, Patch::Apply(_))
    }

    /// The exact `Content-Type` header value for this patch strategy.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Apply(_) => "application/apply-patch+yaml",
            Self::Json(_) => "application/json-patch+json",
            Self::Merge(_) => "application/merge-patch+json",
            Self::Strategic(_) => "application/strategic-merge-patch+json",
        }
    }

    pub(crate) fn serialize(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Apply(p) | Self::Json(p) | Self::Merge(p) | Self::Strategic(p) => serde_json::to_vec(p),
        }
    }
}

/// Options recognized by `patch`.
#[derive(Default, Clone, Debug)]
pub struct PatchParams {
    /// Whether to run this as a dry run.
    pub dry_run: bool,
    /// Force an `Apply` patch through on conflicts. Only valid with `Patch::Apply`.
    pub force: bool,
    /// Name of the actor making the change. Required for `Patch::Apply`.
    pub field_manager: Option<String>,
    /// Server-side validation directive. Only valid with `Patch::Apply`.
    pub field_validation: Option<ValidationDirective>,
}

impl PatchParams {
    pub(crate) fn validate<T: Serialize>(&self, patch: &Patch<T>) -> Result<(), Error> {
        if let Some(fm) = &self.field_manager {
            if fm.len() > 128 {
                return Err(Error::RequestValidation("field_manager too long".into()));
            }
        }
        if self.force && !patch.is_apply() {
            return Err(Error::RequestValidation("force only applies to Patch::Apply".into()));
        }
        Ok(())
    }

    pub(crate) fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if self.dry_run {
            qp.append_pair("dryRun", "All");
        }
        if self.force {
            qp.append_pair("force", "true");
        }
        if let Some(fm) = &self.field_manager {
            qp.append_pair("fieldManager", fm);
        }
        if let Some(fv) = &self.field_validation {
            qp.append_pair("fieldValidation", fv.as_str());
        }
    }

    /// Construct params for a server-side apply patch under `manager`.
    pub fn apply(manager: &str) -> Self {
        Self {
            field_manager: Some(manager.into()),
            ..Self::default()
        }
    }
}

/// Propagation policy for garbage collection on delete.
#[derive(Clone, Debug, Serialize)]
pub enum PropagationPolicy {
    /// Orphan the dependents.
    Orphan,
    /// Delete dependents in the background.
    Background,
    /// Cascading delete of dependents before the owner.
    Foreground,
}

/// Conditions that must hold for a delete to proceed; a `409 Conflict` is
/// returned by the server otherwise.
#[derive(Default, Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Preconditions {
    /// Required resource version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    /// Required UID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// Options recognized by `delete`/`deleteCollection`, also sent as the
/// request body.
#[derive(Default, Clone, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    /// Whether to run this as a dry run.
    #[serde(serialize_with = "dry_run_all_ser", skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    /// Seconds before the object should be deleted; 0 means immediately.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_seconds: Option<u32>,
    /// Garbage collection strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagation_policy: Option<PropagationPolicy>,
    /// Conditions that must be met for the delete to proceed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Preconditions>,
}

impl DeleteOptions {
    pub(crate) fn is_default(&self) -> bool {
        !self.dry_run
            && self.grace_period_seconds.is_none()
            && self.propagation_policy.is_none()
            && self.preconditions.is_none()
    }
}

// The server's dryRun query parameter is a plain "All"/absent, but the
// request body encodes it as a single-element array.
fn dry_run_all_ser<S>(t: &bool, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::ser::Serializer,
{
    use serde::ser::SerializeTuple;
    if *t {
        let mut tup = s.serialize_tuple(1)?;
        tup.serialize_element("All")?;
        tup.end()
    } else {
        s.serialize_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delete_options_default_serializes_empty() {
        let ser = serde_json::to_string(&DeleteOptions::default()).unwrap();
        assert_eq!(ser, "{}");
    }

    #[test]
    fn delete_options_dry_run_serializes_as_tuple() {
        let dp = DeleteOptions {
            dry_run: true,
            ..Default::default()
        };
        let ser = serde_json::to_string(&dp).unwrap();
        assert_eq!(ser, "{\"dryRun\":[\"All\"]}");
    }

    #[test]
    fn patch_params_populate_qp_matches_field_validation() {
        let pp = PatchParams {
            field_validation: Some(ValidationDirective::Warn),
            ..Default::default()
        };
        let mut qp = form_urlencoded::Serializer::new(String::from("some/resource?"));
        pp.populate_qp(&mut qp);
        assert_eq!(qp.finish(), "some/resource?&fieldValidation=Warn");
    }

    #[test]
    fn patch_params_force_requires_apply() {
        let pp = PatchParams {
            force: true,
            ..Default::default()
        };
        let err = pp.validate(&Patch::Merge(serde_json::json!({}))).unwrap_err();
        assert!(matches!(err, Error::RequestValidation(_)));
    }

    #[test]
    fn list_options_rejects_long_timeout() {
        let lp = ListOptions {
            timeout_seconds: Some(295),
            ..Default::default()
        };
        assert!(lp.validate().is_err());
    }
}
