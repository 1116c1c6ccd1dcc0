//! The Transport Adapter, Response Decoder, Generic Dispatcher and Error
//! Classifier: everything needed to drive typed verbs against an already
//! configured Kubernetes API connection.
//!
//! This crate does not resolve kubeconfig files, TLS trust anchors, or
//! credentials — it receives an already-built [`tower::Service`] stack (see
//! [`Client::new`]) and builds/sends/decodes requests against it. Resource
//! type discovery and informer-style caching live outside this crate too;
//! see the system spec's Non-goals.
//!
//! ```rust,no_run
//! use kube_client::{Api, Client};
//! use kube_core::params::ListOptions;
//! use k8s_openapi::api::core::v1::Pod;
//!
//! # async fn doc() -> Result<(), kube_client::Error> {
//! let client = Client::new(tower::service_fn(|_req| async {
//!     unimplemented!("an already-configured transport")
//! }), "default");
//! let pods: Api<Pod> = Api::default_namespaced(client, kube_core::descriptor::ResourceDescriptor::new(
//!     "", "v1", "pods", "Pod", "Pod", kube_core::descriptor::Scope::NamespaceScoped,
//!     [kube_core::descriptor::Capability::Listable], [],
//! ).unwrap());
//! let list = pods.list(&ListOptions::default()).await?;
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod client;
pub mod error;

#[doc(inline)]
pub use api::Api;
#[doc(inline)]
pub use client::Client;
#[doc(inline)]
pub use error::Error;

/// `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Re-exports from `kube-core`: descriptors, selectors, options, the
/// request builder, and the watch-event/status wire types.
pub use kube_core as core;
pub use kube_core::{WatchEvent, ErrorResponse};
