//! Status, scale, log, and eviction subresource verbs.
//!
//! Each verb here is gated on the handle's descriptor the same way the core
//! CRUD verbs in [`super::core_methods`] are: a missing capability or an
//! unregistered subresource path fails with [`Error::UnsupportedOperation`]
//! before any request is built.
use std::fmt::Debug;

use futures::Stream;
use serde::{de::DeserializeOwned, Serialize};

use super::{Api, Capability, DeleteOptions, Patch, PatchParams, PostParams, Status};
use crate::error::Error;

pub use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec, ScaleStatus};

/// Parameters for fetching a `log` subresource.
#[derive(Default, Clone, Debug)]
pub struct LogParams {
    /// The container for which to stream logs. Defaults to the only
    /// container if there is just one in the pod.
    pub container: Option<String>,
    /// Follow the log stream. Pair with [`Api::log_stream`] rather than
    /// [`Api::logs`], or the call never returns.
    pub follow: bool,
    /// Number of bytes to read before terminating the output.
    pub limit_bytes: Option<i64>,
    /// Pretty-print the output.
    pub pretty: bool,
    /// Return the previous terminated container's logs.
    pub previous: bool,
    /// Only return logs newer than this many seconds.
    pub since_seconds: Option<i64>,
    /// Only return this many lines from the end of the log.
    pub tail_lines: Option<i64>,
    /// Prefix each line with an RFC3339 timestamp.
    pub timestamps: bool,
}

impl LogParams {
    fn populate_qp(&self, qp: &mut form_urlencoded::Serializer<String>) {
        if let Some(c) = &self.container {
            qp.append_pair("container", c);
        }
        if self.follow {
            qp.append_pair("follow", "true");
        }
        if let Some(lb) = self.limit_bytes {
            qp.append_pair("limitBytes", &lb.to_string());
        }
        if self.pretty {
            qp.append_pair("pretty", "true");
        }
        if self.previous {
            qp.append_pair("previous", "true");
        }
        if let Some(s) = self.since_seconds {
            qp.append_pair("sinceSeconds", &s.to_string());
        }
        if let Some(t) = self.tail_lines {
            qp.append_pair("tailLines", &t.to_string());
        }
        if self.timestamps {
            qp.append_pair("timestamps", "true");
        }
    }
}

/// Parameters for an `eviction` subresource create.
#[derive(Default, Clone, Debug)]
pub struct EvictParams {
    /// Delete options to apply to the evicted pod.
    pub delete_options: Option<DeleteOptions>,
    /// Query parameters for the eviction POST itself (`dryRun`).
    pub post_options: PostParams,
}

impl<K> Api<K>
where
    K: Clone + DeserializeOwned + Debug,
{
    /// Fetch the `status` subresource. Returns the whole `K`: metadata,
    /// spec, and status.
    pub async fn get_status(&self, name: &str) -> Result<K, Error> {
        self.require(Capability::StatusHaving)?;
        self.require_subresource("status")?;
        let req = self.request().get_subresource(&self.namespace, name, "status")?;
        self.client.request(req).await
    }

    /// Replace the `status` subresource. `.spec` is ignored by the server.
    pub async fn replace_status(&self, name: &str, opts: &PostParams, data: Vec<u8>) -> Result<K, Error> {
        self.require(Capability::StatusHaving)?;
        self.require_subresource("status")?;
        let req = self.request().update_subresource(&self.namespace, name, "status", opts, data)?;
        self.client.request(req).await
    }

    /// Patch the `status` subresource with the merge strategy encoded in `patch`.
    pub async fn patch_status<P: Serialize + Debug>(&self, name: &str, opts: &PatchParams, patch: &Patch<P>) -> Result<K, Error> {
        self.require(Capability::StatusHaving)?;
        self.require_subresource("status")?;
        let req = self.request().patch_subresource(&self.namespace, name, "status", opts, patch)?;
        self.client.request(req).await
    }

    /// Fetch the `scale` subresource.
    pub async fn get_scale(&self, name: &str) -> Result<Scale, Error> {
        self.require(Capability::Scalable)?;
        self.require_subresource("scale")?;
        let req = self.request().get_subresource(&self.namespace, name, "scale")?;
        self.client.request(req).await
    }

    /// Replace the `scale` subresource (e.g. to change `spec.replicas`).
    pub async fn update_scale(&self, name: &str, opts: &PostParams, data: Vec<u8>) -> Result<Scale, Error> {
        self.require(Capability::Scalable)?;
        self.require_subresource("scale")?;
        let req = self.request().update_subresource(&self.namespace, name, "scale", opts, data)?;
        self.client.request(req).await
    }

    /// Fetch logs for `name`'s `log` subresource as a single buffered string.
    pub async fn logs(&self, name: &str, lp: &LogParams) -> Result<String, Error> {
        let req = self.log_request(name, lp)?;
        self.client.request_text(req).await
    }

    /// Fetch logs for `name` as a stream of lines, without buffering the
    /// full response. Intended for use with `LogParams { follow: true, .. }`.
    pub async fn log_stream(&self, name: &str, lp: &LogParams) -> Result<impl Stream<Item = Result<String, Error>>, Error> {
        let req = self.log_request(name, lp)?;
        self.client.request_text_stream(req).await
    }

    /// Create an eviction for `name`, subject to the server's disruption budget checks.
    pub async fn evict(&self, name: &str, ep: &EvictParams) -> Result<Status, Error> {
        self.require(Capability::Evictable)?;
        self.require_subresource("eviction")?;
        let body = serde_json::to_vec(&serde_json::json!({
            "apiVersion": "policy/v1",
            "kind": "Eviction",
            "metadata": { "name": name },
            "deleteOptions": ep.delete_options,
        }))
        .map_err(Error::MalformedResponse)?;
        let req = self.request().evict(&self.namespace, name, &ep.post_options, body)?;
        self.client.request(req).await
    }

    fn log_request(&self, name: &str, lp: &LogParams) -> Result<http::Request<Vec<u8>>, Error> {
        self.require(Capability::Loggable)?;
        self.require_subresource("log")?;
        let path = self.request().subresource_path(&self.namespace, name, "log")?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        lp.populate_qp(&mut qp);
        http::Request::get(qp.finish()).body(vec![]).map_err(Error::HttpError)
    }
}

#[cfg(test)]
mod test {
    use kube_core::descriptor::{Capability, ResourceDescriptor, Scope};

    use super::*;
    use crate::Client;

    fn pods() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "",
            "v1",
            "pods",
            "Pod",
            "Pod",
            Scope::NamespaceScoped,
            [Capability::Loggable, Capability::Evictable],
            [("log".to_string(), "log".to_string())],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn scale_requires_scalable_capability() {
        let (mock_service, _handle) = tower_test::mock::pair::<http::Request<crate::client::Body>, http::Response<crate::client::Body>>();
        let client = Client::new(mock_service, "default");
        let api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client, pods(), "ns");
        let err = api.get_scale("p1").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }

    #[tokio::test]
    async fn log_requires_registered_subresource() {
        let (mock_service, _handle) = tower_test::mock::pair::<http::Request<crate::client::Body>, http::Response<crate::client::Body>>();
        let client = Client::new(mock_service, "default");
        let descriptor = ResourceDescriptor::new("", "v1", "pods", "Pod", "Pod", Scope::NamespaceScoped, [], []).unwrap();
        let api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client, descriptor, "ns");
        let err = api.logs("p1", &LogParams::default()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }
}
