//! Opaque, registered metadata describing one Kubernetes kind/version.
//!
//! A [`ResourceDescriptor`] is the core's sole source of truth about what a
//! kind/version is called, where it lives, and which verbs it supports. It
//! is produced once, externally, at process start (by a generated resource
//! catalog, a discovery client, or by hand) and never mutated afterwards.
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Whether a resource lives under a namespace or at cluster level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Lives at the cluster level, e.g. `Namespace`, `Node`, `ClusterRole`.
    ClusterScoped,
    /// Lives under a namespace, e.g. `Pod`, `Deployment`, `Secret`.
    NamespaceScoped,
}

/// A single verb a resource may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// `get`
    Readable,
    /// `list`
    Listable,
    /// `create`
    Creatable,
    /// `update`
    Replaceable,
    /// `patch`
    Patchable,
    /// `delete`
    Deletable,
    /// `deletecollection`
    CollectionDeletable,
    /// has a `status` subresource
    StatusHaving,
    /// has a `scale` subresource
    Scalable,
    /// `watch`
    Watchable,
    /// has a `log` subresource
    Loggable,
    /// can be evicted (pods)
    Evictable,
}

/// Error raised while registering an inconsistent [`ResourceDescriptor`].
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// A capability implies a subresource that was not registered.
    #[error("capability {0:?} requires a registered subresource, but none was provided")]
    MissingSubresource(Capability),
}

/// Immutable, registered metadata for one Kubernetes kind/version.
///
/// See [module docs](self) and the system spec's Data Model section for the
/// invariants this type upholds: it is constructed once, validated at
/// construction time, and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// API group, empty for the core group (`v1`).
    pub group: String,
    /// API version, e.g. `v1`, `v1beta1`.
    pub version: String,
    /// Resource name in its plural form, e.g. `pods`.
    pub plural: String,
    /// Singular PascalCase kind name, e.g. `Pod`.
    pub singular: String,
    /// PascalCase kind, e.g. `Pod`. Usually equal to `singular`.
    pub kind: String,
    /// Namespace or cluster scoped.
    pub scope: Scope,
    /// Verbs this resource supports.
    capabilities: HashSet<Capability>,
    /// subresource name -> path suffix, e.g. `"status" -> "status"`.
    subresources: HashMap<String, String>,
}

impl ResourceDescriptor {
    /// Construct and validate a new descriptor.
    ///
    /// Fails if a registered capability requires a subresource
    /// (`StatusHaving` -> `status`, `Scalable` -> `scale`, `Loggable` ->
    /// `log`) that isn't present in `subresources`.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        plural: impl Into<String>,
        singular: impl Into<String>,
        kind: impl Into<String>,
        scope: Scope,
        capabilities: impl IntoIterator<Item = Capability>,
        subresources: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, DescriptorError> {
        let capabilities: HashSet<Capability> = capabilities.into_iter().collect();
        let subresources: HashMap<String, String> = subresources.into_iter().collect();

        for (cap, name) in [
            (Capability::StatusHaving, "status"),
            (Capability::Scalable, "scale"),
            (Capability::Loggable, "log"),
        ] {
            if capabilities.contains(&cap) && !subresources.contains_key(name) {
                return Err(DescriptorError::MissingSubresource(cap));
            }
        }

        Ok(Self {
            group: group.into(),
            version: version.into(),
            plural: plural.into(),
            singular: singular.into(),
            kind: kind.into(),
            scope,
            capabilities,
            subresources,
        })
    }

    /// The `apiVersion` string used on the wire: `version` for the core
    /// group, `group/version` otherwise.
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Whether this descriptor advertises `cap`.
    pub fn supports(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }

    /// The path suffix registered for `name`, if any.
    pub fn subresource_path(&self, name: &str) -> Option<&str> {
        self.subresources.get(name).map(String::as_str)
    }

    /// All registered capabilities.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.capabilities.iter().copied()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pod_descriptor() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "",
            "v1",
            "pods",
            "Pod",
            "Pod",
            Scope::NamespaceScoped,
            [
                Capability::Readable,
                Capability::Listable,
                Capability::Creatable,
                Capability::Deletable,
                Capability::Watchable,
                Capability::StatusHaving,
                Capability::Loggable,
                Capability::Evictable,
            ],
            [
                ("status".to_string(), "status".to_string()),
                ("log".to_string(), "log".to_string()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn api_version_core_group() {
        let d = pod_descriptor();
        assert_eq!(d.api_version(), "v1");
    }

    #[test]
    fn api_version_named_group() {
        let d = ResourceDescriptor::new("apps", "v1", "deployments", "Deployment", "Deployment", Scope::NamespaceScoped, [], []).unwrap();
        assert_eq!(d.api_version(), "apps/v1");
    }

    #[test]
    fn capability_without_subresource_rejected() {
        let err = ResourceDescriptor::new(
            "",
            "v1",
            "pods",
            "Pod",
            "Pod",
            Scope::NamespaceScoped,
            [Capability::StatusHaving],
            [],
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::MissingSubresource(Capability::StatusHaving)));
    }

    #[test]
    fn supports_reflects_registered_capabilities() {
        let d = pod_descriptor();
        assert!(d.supports(Capability::Listable));
        assert!(!d.supports(Capability::Scalable));
    }
}
