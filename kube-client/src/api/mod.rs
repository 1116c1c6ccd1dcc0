//! Generic resource dispatch: a handle over one resource kind that checks
//! its [`ResourceDescriptor`]'s advertised capabilities before building or
//! sending any request.
use std::{fmt::Debug, marker::PhantomData};

mod core_methods;
mod subresource;
pub use subresource::{EvictParams, LogParams, Scale, ScaleSpec, ScaleStatus};

pub use kube_core::{
    descriptor::{Capability, ResourceDescriptor, Scope},
    gvk::{GroupVersionKind, GroupVersionResource},
    metadata::{ListMeta, ObjectMeta, TypeMeta},
    object::{NotUsed, Object, ObjectList},
    params::{
        DeleteOptions, ListOptions, Patch, PatchParams, Preconditions, PostParams, PropagationPolicy,
        ReadOptions, ValidationDirective, WatchParams,
    },
    path::NamespaceSelector,
    response::{ResourceOrStatus, Status},
    request::Request,
    HasMeta, ResourceExt,
};

use crate::{error::Error, Client};

/// A generic handle over one Kubernetes resource kind `K`, scoped to a
/// namespace selection.
///
/// `Api` holds no compile-time knowledge of `K`'s verbs: every call checks
/// `descriptor.supports(..)` (or `descriptor.subresource_path(..)`) first
/// and returns [`Error::UnsupportedOperation`] before any request is built
/// or sent if the check fails.
#[derive(Clone)]
pub struct Api<K> {
    pub(crate) descriptor: ResourceDescriptor,
    pub(crate) client: Client,
    pub(crate) namespace: NamespaceSelector,
    _marker: PhantomData<fn() -> K>,
}

impl<K> Api<K> {
    /// A handle for a cluster-scoped kind, or a namespaced kind viewed
    /// across all namespaces (list/watch only).
    pub fn all(client: Client, descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            client,
            namespace: NamespaceSelector::AllNamespaces,
            _marker: PhantomData,
        }
    }

    /// A handle restricted to one namespace.
    pub fn namespaced(client: Client, descriptor: ResourceDescriptor, ns: &str) -> Self {
        Self {
            descriptor,
            client,
            namespace: NamespaceSelector::Namespace(ns.to_string()),
            _marker: PhantomData,
        }
    }

    /// A handle restricted to the client's configured default namespace.
    pub fn default_namespaced(client: Client, descriptor: ResourceDescriptor) -> Self {
        Self {
            descriptor,
            client,
            namespace: NamespaceSelector::DefaultNamespace,
            _marker: PhantomData,
        }
    }

    /// Consume self and return the underlying [`Client`].
    pub fn into_client(self) -> Client {
        self.client
    }

    /// The registered metadata this handle dispatches against.
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn request(&self) -> Request<'_> {
        Request::new(&self.descriptor, self.client.default_namespace())
    }

    pub(crate) fn require(&self, cap: Capability) -> Result<(), Error> {
        if self.descriptor.supports(cap) {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation(format!(
                "{} does not support {cap:?}",
                self.descriptor.kind
            )))
        }
    }

    pub(crate) fn require_subresource(&self, name: &str) -> Result<(), Error> {
        if self.descriptor.subresource_path(name).is_some() {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation(format!(
                "{} has no {name:?} subresource registered",
                self.descriptor.kind
            )))
        }
    }
}

impl<K> From<Api<K>> for Client {
    fn from(api: Api<K>) -> Self {
        api.client
    }
}

impl<K> Debug for Api<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("descriptor", &self.descriptor)
            .field("namespace", &self.namespace)
            .finish()
    }
}
