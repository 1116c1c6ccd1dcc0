//! Maps a descriptor plus scope/namespace/name/subresource to a URL path.
use crate::{
    descriptor::{ResourceDescriptor, Scope},
    error::Error,
};

/// How a request is scoped to a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceSelector {
    /// No namespace restriction; only legal for List/Watch on namespaced kinds.
    AllNamespaces,
    /// A specific namespace.
    Namespace(String),
    /// The client's configured default namespace.
    DefaultNamespace,
}

/// Whether the caller's operation requires a single, concrete namespace
/// (i.e. `AllNamespaces` is illegal for it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceRequirement {
    /// `AllNamespaces` is accepted (List, Watch).
    Optional,
    /// A concrete namespace is required (Create, Update, Delete-by-name, ...).
    Required,
}

/// Build the path component of a request URL.
///
/// `default_ns` resolves [`NamespaceSelector::DefaultNamespace`].
pub fn resource_path(
    descriptor: &ResourceDescriptor,
    ns: &NamespaceSelector,
    requirement: NamespaceRequirement,
    default_ns: &str,
    name: Option<&str>,
    subresource: Option<&str>,
) -> Result<String, Error> {
    if let Some(n) = name {
        if n.is_empty() {
            return Err(Error::RequestValidation("name must not be empty".into()));
        }
    }
    if let Some(sr) = subresource {
        if descriptor.subresource_path(sr).is_none() {
            return Err(Error::RequestValidation(format!(
                "subresource {sr:?} is not registered for {}",
                descriptor.kind
            )));
        }
    }

    let mut path = if descriptor.group.is_empty() {
        format!("/api/{}", descriptor.version)
    } else {
        format!("/apis/{}/{}", descriptor.group, descriptor.version)
    };

    match descriptor.scope {
        Scope::ClusterScoped => {
            path.push('/');
            path.push_str(&descriptor.plural);
        }
        Scope::NamespaceScoped => match ns {
            NamespaceSelector::AllNamespaces => {
                if requirement == NamespaceRequirement::Required {
                    return Err(Error::RequestValidation(
                        "AllNamespaces is not valid for this operation".into(),
                    ));
                }
                path.push('/');
                path.push_str(&descriptor.plural);
            }
            NamespaceSelector::Namespace(n) => {
                path.push_str("/namespaces/");
                path.push_str(n);
                path.push('/');
                path.push_str(&descriptor.plural);
            }
            NamespaceSelector::DefaultNamespace => {
                path.push_str("/namespaces/");
                path.push_str(default_ns);
                path.push('/');
                path.push_str(&descriptor.plural);
            }
        },
    }

    if let Some(n) = name {
        path.push('/');
        path.push_str(n);
        if let Some(sr) = subresource {
            path.push('/');
            path.push_str(sr);
        }
    }

    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{Capability, ResourceDescriptor};

    fn pods() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "",
            "v1",
            "pods",
            "Pod",
            "Pod",
            Scope::NamespaceScoped,
            [Capability::Readable, Capability::StatusHaving],
            [("status".to_string(), "status".to_string())],
        )
        .unwrap()
    }

    fn nodes() -> ResourceDescriptor {
        ResourceDescriptor::new("", "v1", "nodes", "Node", "Node", Scope::ClusterScoped, [], []).unwrap()
    }

    fn deployments() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "apps",
            "v1",
            "deployments",
            "Deployment",
            "Deployment",
            Scope::NamespaceScoped,
            [],
            [],
        )
        .unwrap()
    }

    #[test]
    fn core_cluster_scoped_path() {
        let p = resource_path(&nodes(), &NamespaceSelector::AllNamespaces, NamespaceRequirement::Optional, "default", None, None).unwrap();
        assert_eq!(p, "/api/v1/nodes");
        assert!(!p.contains("/namespaces/"));
    }

    #[test]
    fn named_group_namespaced_path_with_name() {
        let p = resource_path(
            &deployments(),
            &NamespaceSelector::Namespace("apps-ns".into()),
            NamespaceRequirement::Required,
            "default",
            Some("web"),
            None,
        )
        .unwrap();
        assert_eq!(p, "/apis/apps/v1/namespaces/apps-ns/deployments/web");
    }

    #[test]
    fn namespaced_path_has_exactly_one_namespaces_segment() {
        let p = resource_path(&pods(), &NamespaceSelector::Namespace("ns1".into()), NamespaceRequirement::Optional, "default", None, None).unwrap();
        assert_eq!(p.matches("/namespaces/").count(), 1);
    }

    #[test]
    fn subresource_path_appends_suffix() {
        let p = resource_path(
            &pods(),
            &NamespaceSelector::Namespace("ns1".into()),
            NamespaceRequirement::Required,
            "default",
            Some("web"),
            Some("status"),
        )
        .unwrap();
        assert_eq!(p, "/api/v1/namespaces/ns1/pods/web/status");
    }

    #[test]
    fn unregistered_subresource_fails() {
        let err = resource_path(
            &pods(),
            &NamespaceSelector::Namespace("ns1".into()),
            NamespaceRequirement::Required,
            "default",
            Some("web"),
            Some("scale"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::RequestValidation(_)));
    }

    #[test]
    fn all_namespaces_rejected_when_required() {
        let err = resource_path(&pods(), &NamespaceSelector::AllNamespaces, NamespaceRequirement::Required, "default", None, None).unwrap_err();
        assert!(matches!(err, Error::RequestValidation(_)));
    }

    #[test]
    fn empty_name_rejected() {
        let err = resource_path(
            &pods(),
            &NamespaceSelector::Namespace("ns1".into()),
            NamespaceRequirement::Required,
            "default",
            Some(""),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::RequestValidation(_)));
    }
}
