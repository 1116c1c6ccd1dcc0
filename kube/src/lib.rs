//! Thin facade over this workspace's three crates, for a single-dependency
//! consumer experience.
//!
//! - [`kube_core`] (always available, re-exported as [`core`]) — descriptors,
//!   selectors, options, path/request building, watch-event and status types.
//!   No I/O.
//! - [`kube_client`] (the `client` feature, on by default) — [`Client`], the
//!   generic [`Api`] dispatcher, and the HTTP error classifier.
//! - [`kube_runtime`] (the `runtime` feature, on by default, implies
//!   `client`) — the managed, reconnecting [`watcher`].
//!
//! None of these crates resolve kubeconfig files, TLS trust anchors, or
//! credentials, and none cache objects or run informers/workqueues/leader
//! election — see the system spec's Non-goals. Callers bring an
//! already-resolved [`client::Config`] (or their own `tower::Service` stack)
//! and a registered [`core::descriptor::ResourceDescriptor`] per kind.
//!
//! ```rust,no_run
//! use kube::{Api, Client};
//! use kube::core::params::ListOptions;
//! use k8s_openapi::api::core::v1::Pod;
//!
//! # async fn doc() -> Result<(), kube::Error> {
//! let client = Client::new(tower::service_fn(|_req| async {
//!     unimplemented!("an already-configured transport")
//! }), "default");
//! let pods: Api<Pod> = Api::default_namespaced(client, kube::core::descriptor::ResourceDescriptor::new(
//!     "", "v1", "pods", "Pod", "Pod", kube::core::descriptor::Scope::NamespaceScoped,
//!     [kube::core::descriptor::Capability::Listable], [],
//! ).unwrap());
//! let list = pods.list(&ListOptions::default()).await?;
//! # Ok(())
//! # }
//! ```
#![deny(missing_docs)]
#![deny(unsafe_code)]

#[doc(inline)]
pub use kube_core as core;

#[cfg(feature = "client")]
#[doc(inline)]
pub use kube_client::{api, client, error, Api, Client, Error};

#[cfg(feature = "runtime")]
#[doc(inline)]
pub use kube_runtime::{retry, watcher};

#[cfg(feature = "client")]
/// `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(all(test, feature = "client"))]
mod test {
    use super::*;
    use core::descriptor::{Capability, ResourceDescriptor, Scope};

    #[test]
    fn facade_reexports_wire_up_an_api_handle() {
        let (mock_service, _handle) =
            tower_test::mock::pair::<http::Request<client::Body>, http::Response<client::Body>>();
        let client = Client::new(mock_service, "default");
        let descriptor = ResourceDescriptor::new(
            "",
            "v1",
            "pods",
            "Pod",
            "Pod",
            Scope::NamespaceScoped,
            [Capability::Listable],
            [],
        )
        .unwrap();
        let _pods: Api<k8s_openapi::api::core::v1::Pod> = Api::namespaced(client, descriptor, "ns");
    }
}
