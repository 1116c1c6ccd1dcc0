//! Read-only accessors over any value carrying an [`ObjectMeta`], and a
//! best-effort plural-name inference helper for registering descriptors.
use std::collections::BTreeMap;

use std::sync::LazyLock;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Any value that embeds an [`ObjectMeta`].
///
/// Implemented for [`crate::object::Object`] and for any `k8s_openapi` type
/// via its `Metadata` trait, so [`ResourceExt`] works uniformly over both
/// generated and hand-registered kinds.
pub trait HasMeta {
    /// Borrow the embedded metadata.
    fn meta(&self) -> &ObjectMeta;
    /// Mutably borrow the embedded metadata.
    fn meta_mut(&mut self) -> &mut ObjectMeta;
}

impl<K> HasMeta for K
where
    K: k8s_openapi::Metadata<Ty = ObjectMeta>,
{
    fn meta(&self) -> &ObjectMeta {
        self.metadata()
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        self.metadata_mut()
    }
}

/// Convenience read/write accessors over a resource's metadata.
pub trait ResourceExt: HasMeta {
    /// The resource's name. Panics if unset (e.g. a `generateName`-only
    /// object that hasn't round-tripped through the server yet).
    fn name(&self) -> String;
    /// The namespace the resource lives in, if namespaced.
    fn namespace(&self) -> Option<String>;
    /// The opaque resource-version cursor, if known.
    fn resource_version(&self) -> Option<String>;
    /// The resource's unique ID.
    fn uid(&self) -> Option<String>;
    /// The resource's labels.
    fn labels(&self) -> &BTreeMap<String, String>;
    /// Mutable access to the resource's labels.
    fn labels_mut(&mut self) -> &mut BTreeMap<String, String>;
    /// The resource's annotations.
    fn annotations(&self) -> &BTreeMap<String, String>;
    /// Mutable access to the resource's annotations.
    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String>;
    /// The resource's owner references.
    fn owner_references(&self) -> &[OwnerReference];
    /// The resource's finalizers.
    fn finalizers(&self) -> &[String];
}

static EMPTY_MAP: LazyLock<BTreeMap<String, String>> = LazyLock::new(BTreeMap::new);

impl<K: HasMeta> ResourceExt for K {
    fn name(&self) -> String {
        self.meta().name.clone().expect(".metadata.name missing")
    }

    fn namespace(&self) -> Option<String> {
        self.meta().namespace.clone()
    }

    fn resource_version(&self) -> Option<String> {
        self.meta().resource_version.clone()
    }

    fn uid(&self) -> Option<String> {
        self.meta().uid.clone()
    }

    fn labels(&self) -> &BTreeMap<String, String> {
        self.meta().labels.as_ref().unwrap_or(&EMPTY_MAP)
    }

    fn labels_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.meta_mut().labels.get_or_insert_with(BTreeMap::new)
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        self.meta().annotations.as_ref().unwrap_or(&EMPTY_MAP)
    }

    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        self.meta_mut().annotations.get_or_insert_with(BTreeMap::new)
    }

    fn owner_references(&self) -> &[OwnerReference] {
        self.meta().owner_references.as_deref().unwrap_or_default()
    }

    fn finalizers(&self) -> &[String] {
        self.meta().finalizers.as_deref().unwrap_or_default()
    }
}

/// Best-effort English pluralizer for a PascalCase kind name.
///
/// Used only when registering a [`crate::descriptor::ResourceDescriptor`]
/// without an explicit plural. Can fail for CRDs with irregular
/// pluralisations; callers that know the real plural should pass it
/// explicitly instead.
pub fn to_plural(word: &str) -> String {
    if word == "endpoints" || word == "endpointslices" {
        return word.to_owned();
    } else if word == "nodemetrics" {
        return "nodes".to_owned();
    } else if word == "podmetrics" {
        return "pods".to_owned();
    }

    if word.ends_with('s') || word.ends_with('x') || word.ends_with('z') || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }

    if word.ends_with('y') {
        if let Some(c) = word.chars().nth(word.len() - 2) {
            if !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') {
                let mut chars = word.chars();
                chars.next_back();
                return format!("{}ies", chars.as_str());
            }
        }
    }

    format!("{word}s")
}

#[cfg(test)]
mod test {
    use super::to_plural;

    #[test]
    fn test_to_plural_native() {
        #[rustfmt::skip]
        let native_kinds = vec![
            ("APIService", "apiservices"),
            ("Binding", "bindings"),
            ("CertificateSigningRequest", "certificatesigningrequests"),
            ("ClusterRole", "clusterroles"), ("ClusterRoleBinding", "clusterrolebindings"),
            ("ComponentStatus", "componentstatuses"),
            ("ConfigMap", "configmaps"),
            ("ControllerRevision", "controllerrevisions"),
            ("CronJob", "cronjobs"),
            ("CSIDriver", "csidrivers"), ("CSINode", "csinodes"), ("CSIStorageCapacity", "csistoragecapacities"),
            ("CustomResourceDefinition", "customresourcedefinitions"),
            ("DaemonSet", "daemonsets"),
            ("Deployment", "deployments"),
            ("Endpoints", "endpoints"), ("EndpointSlice", "endpointslices"),
            ("Event", "events"),
            ("FlowSchema", "flowschemas"),
            ("HorizontalPodAutoscaler", "horizontalpodautoscalers"),
            ("Ingress", "ingresses"), ("IngressClass", "ingressclasses"),
            ("Job", "jobs"),
            ("Lease", "leases"),
            ("LimitRange", "limitranges"),
            ("LocalSubjectAccessReview", "localsubjectaccessreviews"),
            ("MutatingWebhookConfiguration", "mutatingwebhookconfigurations"),
            ("Namespace", "namespaces"),
            ("NetworkPolicy", "networkpolicies"),
            ("Node", "nodes"),
            ("PersistentVolumeClaim", "persistentvolumeclaims"),
            ("PersistentVolume", "persistentvolumes"),
            ("PodDisruptionBudget", "poddisruptionbudgets"),
            ("Pod", "pods"),
            ("PodSecurityPolicy", "podsecuritypolicies"),
            ("PodTemplate", "podtemplates"),
            ("PriorityClass", "priorityclasses"),
            ("PriorityLevelConfiguration", "prioritylevelconfigurations"),
            ("ReplicaSet", "replicasets"),
            ("ReplicationController", "replicationcontrollers"),
            ("ResourceQuota", "resourcequotas"),
            ("Role", "roles"), ("RoleBinding", "rolebindings"),
            ("RuntimeClass", "runtimeclasses"),
            ("Secret", "secrets"),
            ("SelfSubjectAccessReview", "selfsubjectaccessreviews"),
            ("SelfSubjectRulesReview", "selfsubjectrulesreviews"),
            ("ServiceAccount", "serviceaccounts"),
            ("Service", "services"),
            ("StatefulSet", "statefulsets"),
            ("StorageClass", "storageclasses"), ("StorageVersion", "storageversions"),
            ("SubjectAccessReview", "subjectaccessreviews"),
            ("TokenReview", "tokenreviews"),
            ("ValidatingWebhookConfiguration", "validatingwebhookconfigurations"),
            ("VolumeAttachment", "volumeattachments"),
        ];
        for (kind, plural) in native_kinds {
            assert_eq!(to_plural(&kind.to_ascii_lowercase()), plural);
        }
    }
}
