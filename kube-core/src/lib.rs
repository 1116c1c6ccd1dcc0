//! Wire-format and request-building primitives shared by the transport and
//! watch layers: resource descriptors, selector encoding, path resolution,
//! request assembly and response types. No networking lives here.

pub mod descriptor;
pub use descriptor::{Capability, ResourceDescriptor, Scope};

pub mod selector;
pub use selector::{FieldSelector, LabelSelector};

pub mod path;
pub use path::{NamespaceRequirement, NamespaceSelector};

pub mod gvk;
pub use gvk::{GroupVersionKind, GroupVersionResource};

pub mod metadata;
pub use metadata::TypeMeta;

pub mod object;
pub use object::{NotUsed, Object, ObjectList};

pub mod watch;
pub use watch::WatchEvent;

pub mod params;

pub mod request;
pub use request::Request;

mod resource;
pub use resource::{to_plural, HasMeta, ResourceExt};

pub mod response;
pub use response::{ResourceOrStatus, Status};

mod util;

mod error;
pub use error::{Error, ErrorResponse};

/// Result type used throughout `kube-core`.
pub type Result<T, E = Error> = std::result::Result<T, E>;
