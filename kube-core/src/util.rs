//! Per-resource extension verbs layered on the generic [`crate::request::Request`].
use chrono::Utc;

use crate::{
    params::{Patch, PatchParams},
    path::NamespaceSelector,
    request::{Error, Request},
};

impl<'a> Request<'a> {
    /// Trigger a rolling restart via a strategic-merge patch that stamps
    /// `spec.template.metadata.annotations` with a restart timestamp.
    ///
    /// Only meaningful for workload kinds carrying a pod template
    /// (`Deployment`, `DaemonSet`, `StatefulSet`, `ReplicaSet`); the
    /// descriptor does not gate this, since the annotation is accepted
    /// and ignored by any kind that happens to have the field.
    pub fn restart(&self, ns: &NamespaceSelector, name: &str) -> Result<http::Request<Vec<u8>>, Error> {
        let patch = serde_json::json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            "kubectl.kubernetes.io/restartedAt": Utc::now().to_rfc3339()
                        }
                    }
                }
            }
        });
        self.patch(ns, name, &PatchParams::default(), &Patch::Strategic(patch))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{Capability, ResourceDescriptor, Scope};

    fn deployments() -> ResourceDescriptor {
        ResourceDescriptor::new("apps", "v1", "deployments", "Deployment", "Deployment", Scope::NamespaceScoped, [
            Capability::Patchable,
        ], [])
        .unwrap()
    }

    #[test]
    fn restart_sends_strategic_merge_patch() {
        let d = deployments();
        let r = Request::new(&d, "default");
        let req = r.restart(&NamespaceSelector::Namespace("ns".into()), "web").unwrap();
        assert_eq!(
            req.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/strategic-merge-patch+json"
        );
        let body = String::from_utf8(req.body().clone()).unwrap();
        assert!(body.contains("kubectl.kubernetes.io/restartedAt"));
    }
}
