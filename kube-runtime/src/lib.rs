//! The watch engine: a managed, reconnecting watch task layered on top of
//! [`kube_client`]'s Generic Dispatcher.
//!
//! Informer caches, workqueues, and leader election are out of scope here —
//! see the system spec's Non-goals. This crate owns exactly one thing: the
//! reconnect loop that turns a raw, fallible [`Api::watch`](kube_client::Api::watch)
//! stream into a managed, typed event feed.
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod retry;
pub mod watcher;

#[doc(inline)]
pub use retry::{BackoffKind, RetryPolicy, RetryStrategy};
#[doc(inline)]
pub use watcher::{watch, watch_all, Event, TerminationCause, WatchHandle, WatchSink, WatchState};
