//! The base CRUD + list/watch verbs, each gated on the handle's
//! [`ResourceDescriptor`] before any request is built.
use std::fmt::Debug;

use futures::Stream;
use serde::{de::DeserializeOwned, Serialize};

use super::{
    Api, Capability, DeleteOptions, ListOptions, Patch, PatchParams, PostParams, ReadOptions,
    ResourceOrStatus, WatchParams,
};
use crate::{error::Error, WatchEvent};
use kube_core::object::ObjectList;

impl<K> Api<K>
where
    K: Clone + DeserializeOwned + Debug,
{
    /// Get a named resource. Fails with [`Error::NotFound`] if it doesn't exist.
    pub async fn get(&self, name: &str) -> Result<K, Error> {
        self.get_with(name, &ReadOptions::default()).await
    }

    /// [`Api::get`], returning `None` instead of erroring on `404`.
    pub async fn get_opt(&self, name: &str) -> Result<Option<K>, Error> {
        self.client.request_opt(self.get_request(name, &ReadOptions::default())?).await
    }

    /// [`Api::get`] at an explicit, possibly-stale `resourceVersion`.
    pub async fn get_with(&self, name: &str, opts: &ReadOptions) -> Result<K, Error> {
        self.client.request(self.get_request(name, opts)?).await
    }

    fn get_request(&self, name: &str, opts: &ReadOptions) -> Result<http::Request<Vec<u8>>, Error> {
        self.require(Capability::Readable)?;
        Ok(self.request().get(&self.namespace, name, opts)?)
    }

    /// List resources matching `opts`' selectors.
    pub async fn list(&self, opts: &ListOptions) -> Result<ObjectList<K>, Error> {
        self.require(Capability::Listable)?;
        let req = self.request().list(&self.namespace, opts)?;
        self.client.request(req).await
    }

    /// Create a resource from a value serializing to `K`.
    pub async fn create(&self, opts: &PostParams, data: &K) -> Result<K, Error>
    where
        K: Serialize,
    {
        self.require(Capability::Creatable)?;
        let body = serde_json::to_vec(data).map_err(Error::MalformedResponse)?;
        let req = self.request().create(&self.namespace, opts, body)?;
        self.client.request(req).await
    }

    /// Replace a resource entirely. `data.metadata.resource_version` must
    /// be set to the version last observed, or the server returns
    /// [`Error::Conflict`].
    pub async fn replace(&self, name: &str, opts: &PostParams, data: &K) -> Result<K, Error>
    where
        K: Serialize,
    {
        self.require(Capability::Replaceable)?;
        let body = serde_json::to_vec(data).map_err(Error::MalformedResponse)?;
        let req = self.request().update(&self.namespace, name, opts, body)?;
        self.client.request(req).await
    }

    /// Patch a resource with the merge strategy encoded in `patch`.
    pub async fn patch<P: Serialize + Debug>(&self, name: &str, opts: &PatchParams, patch: &Patch<P>) -> Result<K, Error> {
        self.require(Capability::Patchable)?;
        let req = self.request().patch(&self.namespace, name, opts, patch)?;
        self.client.request(req).await
    }

    /// Delete a named resource. The server echoes the deleted object on
    /// some code paths, and returns a bare [`kube_core::response::Status`]
    /// on others — see [`ResourceOrStatus`].
    pub async fn delete(&self, name: &str, opts: &DeleteOptions) -> Result<ResourceOrStatus<K>, Error> {
        self.require(Capability::Deletable)?;
        let req = self.request().delete(&self.namespace, name, opts)?;
        self.client.request_resource_or_status(req).await
    }

    /// Delete every resource matching `list_opts`' selectors.
    pub async fn delete_collection(
        &self,
        opts: &DeleteOptions,
        list_opts: &ListOptions,
    ) -> Result<ResourceOrStatus<ObjectList<K>>, Error> {
        self.require(Capability::CollectionDeletable)?;
        let req = self.request().delete_collection(&self.namespace, opts, list_opts)?;
        self.client.request_resource_or_status(req).await
    }

    /// Trigger a rolling restart by patching `spec.template.metadata.annotations`
    /// with a restart timestamp. See [`kube_core::request::Request::restart`].
    pub async fn restart(&self, name: &str) -> Result<K, Error> {
        self.require(Capability::Patchable)?;
        let req = self.request().restart(&self.namespace, name)?;
        self.client.request(req).await
    }

    /// Watch for changes, resuming from `opts.list.resource_version` if set.
    ///
    /// Consider [`kube_runtime`](https://docs.rs/kube-runtime)'s managed
    /// watch engine instead of calling this directly: a raw watch stream
    /// can terminate for many reasons and must be re-issued with the last
    /// observed `resourceVersion`.
    pub async fn watch(&self, opts: &WatchParams) -> Result<impl Stream<Item = Result<WatchEvent<K>, Error>>, Error>
    where
        K: 'static,
    {
        self.require(Capability::Watchable)?;
        let req = self.request().watch(&self.namespace, opts)?;
        self.client.request_events::<K>(req).await
    }
}

#[cfg(test)]
mod test {
    use kube_core::descriptor::{Capability, ResourceDescriptor, Scope};

    use super::*;
    use crate::Client;

    fn unwatchable_pods() -> ResourceDescriptor {
        ResourceDescriptor::new("", "v1", "pods", "Pod", "Pod", Scope::NamespaceScoped, [Capability::Readable], []).unwrap()
    }

    #[tokio::test]
    async fn unsupported_capability_fails_before_any_request_is_built() {
        let (mock_service, _handle) = tower_test::mock::pair::<http::Request<crate::client::Body>, http::Response<crate::client::Body>>();
        let client = Client::new(mock_service, "default");
        let api: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client, unwatchable_pods(), "ns");
        let err = api.list(&ListOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }
}
