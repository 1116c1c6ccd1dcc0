//! Assembles method, path, query, headers and body for each verb.
use serde::Serialize;
use thiserror::Error;

use crate::{
    descriptor::ResourceDescriptor,
    params::{DeleteOptions, ListOptions, Patch, PatchParams, PostParams, ReadOptions, WatchParams},
    path::{resource_path, NamespaceRequirement, NamespaceSelector},
};

pub(crate) const JSON_MIME: &str = "application/json";
pub(crate) const WATCH_MIME: &str = "application/json;stream=watch";

/// Errors raised while building a request.
#[derive(Debug, Error)]
pub enum Error {
    /// Path resolution or option validation failed.
    #[error("failed to validate request: {0}")]
    Validation(#[from] crate::error::Error),
    /// `http::request::Builder` rejected the assembled request.
    #[error("failed to build request: {0}")]
    BuildRequest(#[source] http::Error),
    /// The request body failed to serialize.
    #[error("failed to serialize body: {0}")]
    SerializeBody(#[source] serde_json::Error),
}

/// Builds HTTP requests for one resource kind against a fixed descriptor.
///
/// A `Request` is cheap to construct per call; it borrows no connection and
/// performs no I/O — see `kube-client::Client` for the Transport Adapter
/// that actually sends what this type builds.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    descriptor: &'a ResourceDescriptor,
    default_namespace: &'a str,
}

impl<'a> Request<'a> {
    /// Build requests against `descriptor`, resolving
    /// [`crate::path::NamespaceSelector::DefaultNamespace`] to `default_namespace`.
    pub fn new(descriptor: &'a ResourceDescriptor, default_namespace: &'a str) -> Self {
        Self {
            descriptor,
            default_namespace,
        }
    }

    fn path(
        &self,
        ns: &NamespaceSelector,
        req: NamespaceRequirement,
        name: Option<&str>,
        subresource: Option<&str>,
    ) -> Result<String, Error> {
        Ok(resource_path(self.descriptor, ns, req, self.default_namespace, name, subresource)?)
    }

    /// `GET /{plural}` with list options.
    pub fn list(&self, ns: &NamespaceSelector, opts: &ListOptions) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate()?;
        let path = self.path(ns, NamespaceRequirement::Optional, None, None)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::get(qp.finish()).body(vec![]).map_err(Error::BuildRequest)
    }

    /// `GET /{plural}?watch=true` resuming from `resource_version` if set on `opts.list`.
    pub fn watch(&self, ns: &NamespaceSelector, opts: &WatchParams) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate()?;
        let path = self.path(ns, NamespaceRequirement::Optional, None, None)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::get(qp.finish())
            .header(http::header::ACCEPT, WATCH_MIME)
            .body(vec![])
            .map_err(Error::BuildRequest)
    }

    /// `GET /{plural}/{name}`.
    pub fn get(&self, ns: &NamespaceSelector, name: &str, opts: &ReadOptions) -> Result<http::Request<Vec<u8>>, Error> {
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), None)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::get(qp.finish()).body(vec![]).map_err(Error::BuildRequest)
    }

    /// `POST /{plural}`.
    pub fn create(&self, ns: &NamespaceSelector, opts: &PostParams, body: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate()?;
        let path = self.path(ns, NamespaceRequirement::Required, None, None)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::post(qp.finish())
            .header(http::header::CONTENT_TYPE, JSON_MIME)
            .body(body)
            .map_err(Error::BuildRequest)
    }

    /// `PUT /{plural}/{name}`.
    pub fn update(&self, ns: &NamespaceSelector, name: &str, opts: &PostParams, body: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate()?;
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), None)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::put(qp.finish())
            .header(http::header::CONTENT_TYPE, JSON_MIME)
            .body(body)
            .map_err(Error::BuildRequest)
    }

    /// `PATCH /{plural}/{name}` with the content type selected by `patch`.
    pub fn patch<T: Serialize>(&self, ns: &NamespaceSelector, name: &str, opts: &PatchParams, patch: &Patch<T>) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate(patch)?;
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), None)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::patch(qp.finish())
            .header(http::header::ACCEPT, JSON_MIME)
            .header(http::header::CONTENT_TYPE, patch.content_type())
            .body(patch.serialize().map_err(Error::SerializeBody)?)
            .map_err(Error::BuildRequest)
    }

    /// `DELETE /{plural}/{name}`.
    pub fn delete(&self, ns: &NamespaceSelector, name: &str, opts: &DeleteOptions) -> Result<http::Request<Vec<u8>>, Error> {
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), None)?;
        let body = serde_json::to_vec(opts).map_err(Error::SerializeBody)?;
        http::Request::delete(format!("{path}?"))
            .header(http::header::CONTENT_TYPE, JSON_MIME)
            .body(body)
            .map_err(Error::BuildRequest)
    }

    /// `DELETE /{plural}` (a collection), restricted by `list_opts` selectors.
    pub fn delete_collection(&self, ns: &NamespaceSelector, opts: &DeleteOptions, list_opts: &ListOptions) -> Result<http::Request<Vec<u8>>, Error> {
        let path = self.path(ns, NamespaceRequirement::Optional, None, None)?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        if let Some(l) = &list_opts.label_selector {
            qp.append_pair("labelSelector", l);
        }
        if let Some(f) = &list_opts.field_selector {
            qp.append_pair("fieldSelector", f);
        }
        let body = if opts.is_default() {
            vec![]
        } else {
            serde_json::to_vec(opts).map_err(Error::SerializeBody)?
        };
        http::Request::delete(qp.finish())
            .header(http::header::CONTENT_TYPE, JSON_MIME)
            .body(body)
            .map_err(Error::BuildRequest)
    }

    /// `GET`/`PUT` on a registered subresource (e.g. `status`, `scale`).
    pub fn get_subresource(&self, ns: &NamespaceSelector, name: &str, subresource: &str) -> Result<http::Request<Vec<u8>>, Error> {
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), Some(subresource))?;
        http::Request::get(path).body(vec![]).map_err(Error::BuildRequest)
    }

    /// See [`Request::get_subresource`].
    pub fn update_subresource(&self, ns: &NamespaceSelector, name: &str, subresource: &str, opts: &PostParams, body: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate()?;
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), Some(subresource))?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::put(qp.finish())
            .header(http::header::CONTENT_TYPE, JSON_MIME)
            .body(body)
            .map_err(Error::BuildRequest)
    }

    /// `PATCH` on a registered subresource, with the content type selected by `patch`.
    pub fn patch_subresource<T: Serialize>(
        &self,
        ns: &NamespaceSelector,
        name: &str,
        subresource: &str,
        opts: &PatchParams,
        patch: &Patch<T>,
    ) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate(patch)?;
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), Some(subresource))?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::patch(qp.finish())
            .header(http::header::ACCEPT, JSON_MIME)
            .header(http::header::CONTENT_TYPE, patch.content_type())
            .body(patch.serialize().map_err(Error::SerializeBody)?)
            .map_err(Error::BuildRequest)
    }

    /// The path for a registered subresource, with no query string appended
    /// (callers append their own, e.g. log or eviction-specific params).
    pub fn subresource_path(&self, ns: &NamespaceSelector, name: &str, subresource: &str) -> Result<String, Error> {
        self.path(ns, NamespaceRequirement::Required, Some(name), Some(subresource))
    }

    /// `POST .../{name}/eviction`.
    pub fn evict(&self, ns: &NamespaceSelector, name: &str, opts: &PostParams, body: Vec<u8>) -> Result<http::Request<Vec<u8>>, Error> {
        opts.validate()?;
        let path = self.path(ns, NamespaceRequirement::Required, Some(name), Some("eviction"))?;
        let mut qp = form_urlencoded::Serializer::new(format!("{path}?"));
        opts.populate_qp(&mut qp);
        http::Request::post(qp.finish())
            .header(http::header::CONTENT_TYPE, JSON_MIME)
            .body(body)
            .map_err(Error::BuildRequest)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{Capability, ResourceDescriptor, Scope};

    fn pods() -> ResourceDescriptor {
        ResourceDescriptor::new(
            "",
            "v1",
            "pods",
            "Pod",
            "Pod",
            Scope::NamespaceScoped,
            [Capability::Listable, Capability::Watchable, Capability::StatusHaving],
            [("status".to_string(), "status".to_string())],
        )
        .unwrap()
    }

    #[test]
    fn list_request_has_no_query_when_options_empty() {
        let d = pods();
        let r = Request::new(&d, "default");
        let req = r.list(&NamespaceSelector::Namespace("ns".into()), &ListOptions::default()).unwrap();
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/pods?");
        assert_eq!(req.method(), http::Method::GET);
    }

    #[test]
    fn watch_request_sets_watch_true_and_accept_header() {
        let d = pods();
        let r = Request::new(&d, "default");
        let opts = WatchParams {
            list: ListOptions {
                resource_version: Some("103".into()),
                ..Default::default()
            },
            allow_watch_bookmarks: true,
        };
        let req = r.watch(&NamespaceSelector::Namespace("ns".into()), &opts).unwrap();
        let uri = req.uri().to_string();
        assert!(uri.ends_with("resourceVersion=103&allowWatchBookmarks=true&watch=true"));
        assert_eq!(req.headers().get(http::header::ACCEPT).unwrap(), WATCH_MIME);
    }

    #[test]
    fn delete_sets_json_content_type_and_body() {
        let d = pods();
        let r = Request::new(&d, "default");
        let req = r.delete(&NamespaceSelector::Namespace("ns".into()), "p1", &DeleteOptions::default()).unwrap();
        assert_eq!(req.method(), http::Method::DELETE);
        assert_eq!(req.body(), b"{}");
    }

    #[test]
    fn patch_sets_strategy_specific_content_type() {
        let d = pods();
        let r = Request::new(&d, "default");
        let patch = Patch::Merge(serde_json::json!({"spec": {}}));
        let req = r
            .patch(&NamespaceSelector::Namespace("ns".into()), "p1", &PatchParams::default(), &patch)
            .unwrap();
        assert_eq!(
            req.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/merge-patch+json"
        );
    }

    #[test]
    fn subresource_path_is_exact() {
        let d = pods();
        let r = Request::new(&d, "default");
        let req = r.get_subresource(&NamespaceSelector::Namespace("ns".into()), "p1", "status").unwrap();
        assert_eq!(req.uri(), "/api/v1/namespaces/ns/pods/p1/status");
    }
}
