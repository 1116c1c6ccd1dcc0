//! The watch engine: a managed, reconnecting watch task over one resource
//! kind, built on top of [`Api::watch`](kube_client::Api::watch).
//!
//! A raw watch stream can terminate at any time — the server closes idle
//! connections, load balancers drop long-lived requests, `resourceVersion`s
//! get compacted out from under a slow consumer. [`watch`] hides all of
//! that: it drives the reconnect loop, tracks the resume cursor, and only
//! ever bothers the caller with resource events or a final, unrecoverable
//! termination.
use std::{fmt, sync::Arc};

use futures::StreamExt;
use kube_client::{
    core::{
        descriptor::Capability,
        params::{ListOptions, WatchParams},
        ResourceExt,
    },
    Api, Error, WatchEvent,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::retry::{RetryBackoff, RetryStrategy};

/// One change observed on the watched resource kind.
#[derive(Debug, Clone)]
pub enum Event<K> {
    /// The resource was added or changed; `K` is its current state.
    Applied(K),
    /// The resource was deleted.
    Deleted(K),
    /// The server checkpointed its progress without an accompanying
    /// change. Carries the `resourceVersion` the watch has now observed up
    /// to, for callers that want to track liveness without caring about
    /// individual objects.
    Bookmark {
        /// The bookmarked `resourceVersion`.
        resource_version: String,
    },
}

/// Why a watch task stopped for good.
#[derive(Debug, Clone)]
pub enum TerminationCause {
    /// [`WatchHandle::cancel`] was called, or the handle was dropped.
    Cancelled,
    /// The configured [`RetryStrategy`] ran out of reconnect attempts.
    RetryBudgetExhausted(Arc<Error>),
    /// The server returned an error that is never safe to retry verbatim
    /// (e.g. the descriptor stopped advertising `watch`, or credentials
    /// were rejected).
    NonRetryableError(Arc<Error>),
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCause::Cancelled => write!(f, "cancelled"),
            TerminationCause::RetryBudgetExhausted(e) => write!(f, "retry budget exhausted: {e}"),
            TerminationCause::NonRetryableError(e) => write!(f, "non-retryable error: {e}"),
        }
    }
}

/// What the watch task does with observed events and its own lifecycle.
///
/// Implement this directly for full control, or build one from a closure
/// with [`sink_fn`] when you only care about [`Event`]s.
pub trait WatchSink<K>: Send + 'static {
    /// Called for every event delivered in order. The watch task awaits
    /// this before processing the next event or reconnecting.
    fn on_event(&mut self, event: Event<K>) -> impl std::future::Future<Output = ()> + Send;

    /// Called when the server reports an error that the engine is about to
    /// retry. Default: ignored.
    fn on_retrying_error(&mut self, _error: &Error) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }

    /// Called exactly once, when the task stops for good.
    fn on_terminated(&mut self, _cause: TerminationCause) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}

/// Adapts a `FnMut(Event<K>)` closure into a [`WatchSink`] that ignores
/// errors and termination.
pub struct EventOnly<F>(F);

impl<K, F> WatchSink<K> for EventOnly<F>
where
    F: FnMut(Event<K>) + Send + 'static,
    K: Send + 'static,
{
    async fn on_event(&mut self, event: Event<K>) {
        (self.0)(event)
    }
}

/// Wrap a closure as a [`WatchSink`] that only cares about events.
pub fn sink_fn<K, F>(f: F) -> EventOnly<F>
where
    F: FnMut(Event<K>) + Send + 'static,
{
    EventOnly(f)
}

/// The watch task's current position in its reconnect state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Created but not yet polled.
    Idle,
    /// Issuing (or re-issuing) the watch request.
    Connecting,
    /// Connected, reading events off the stream.
    Streaming,
    /// Between a terminated connection and the next connect attempt.
    Reconnecting,
    /// Stopped; no further transitions.
    Terminated,
}

/// A handle over a running watch task.
///
/// Dropping the handle cancels the task, the same as calling
/// [`cancel`](Self::cancel) — the underlying [`Api::watch`] call and any
/// in-flight backoff sleep are torn down immediately, with no further
/// reconnect attempt.
pub struct WatchHandle {
    cancel: CancellationToken,
    state: Arc<Mutex<WatchState>>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watch task. Idempotent: calling this more than once, or
    /// after the task has already terminated on its own, is a no-op.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The task's current state.
    pub fn state(&self) -> WatchState {
        *self.state.lock()
    }

    /// Wait for the task to terminate, for tests or graceful shutdown.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Start a managed watch over `api`, delivering events to `sink` until
/// cancelled or until `retry` permanently gives up.
///
/// `base_opts` seeds label/field selectors and `allow_watch_bookmarks`;
/// its `resource_version` is overwritten by the engine as the resume
/// cursor advances, and cleared whenever the server reports `410 Gone`.
pub fn watch<K, S>(api: Api<K>, base_opts: WatchParams, retry: RetryStrategy, mut sink: S) -> WatchHandle
where
    K: Clone + DeserializeOwned + ResourceExt + fmt::Debug + Send + Sync + 'static,
    S: WatchSink<K>,
{
    let cancel = CancellationToken::new();
    let state = Arc::new(Mutex::new(WatchState::Idle));

    let task_cancel = cancel.clone();
    let task_state = state.clone();
    let task = tokio::spawn(async move {
        let cause = run(api, base_opts, retry, &mut sink, &task_cancel, &task_state).await;
        *task_state.lock() = WatchState::Terminated;
        sink.on_terminated(cause).await;
    });

    WatchHandle { cancel, state, task }
}

async fn run<K, S>(
    api: Api<K>,
    mut opts: WatchParams,
    retry: RetryStrategy,
    sink: &mut S,
    cancel: &CancellationToken,
    state: &Mutex<WatchState>,
) -> TerminationCause
where
    K: Clone + DeserializeOwned + ResourceExt + fmt::Debug + Send + Sync + 'static,
    S: WatchSink<K>,
{
    if !api.descriptor().supports(Capability::Watchable) {
        return TerminationCause::NonRetryableError(Arc::new(Error::UnsupportedOperation(format!(
            "{} does not support watch",
            api.descriptor().kind
        ))));
    }

    let mut backoff = RetryBackoff::new(retry);

    loop {
        if cancel.is_cancelled() {
            return TerminationCause::Cancelled;
        }

        *state.lock() = WatchState::Connecting;
        let stream = match api.watch(&opts).await {
            Ok(stream) => stream,
            Err(err) => {
                let gone = matches!(err, Error::Gone(_));
                if gone {
                    debug!("resource version expired, dropping resume token");
                    opts.list.resource_version = None;
                }
                match handle_failure::<K, S>(&err, gone, &mut backoff, sink, cancel, state).await {
                    Ok(()) => continue,
                    Err(cause) => return cause,
                }
            }
        };
        futures::pin_mut!(stream);

        *state.lock() = WatchState::Streaming;
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return TerminationCause::Cancelled,
                next = stream.next() => next,
            };

            let Some(item) = next else {
                // Server closed the stream cleanly; reconnect.
                debug!("watch stream ended, reconnecting");
                break;
            };

            match item {
                Ok(WatchEvent::Added(obj)) | Ok(WatchEvent::Modified(obj)) => {
                    if let Some(rv) = obj.resource_version() {
                        opts.list.resource_version = Some(rv);
                    }
                    backoff.reset();
                    sink.on_event(Event::Applied(obj)).await;
                }
                Ok(WatchEvent::Deleted(obj)) => {
                    if let Some(rv) = obj.resource_version() {
                        opts.list.resource_version = Some(rv);
                    }
                    backoff.reset();
                    sink.on_event(Event::Deleted(obj)).await;
                }
                Ok(WatchEvent::Bookmark(bm)) => {
                    opts.list.resource_version = Some(bm.metadata.resource_version.clone());
                    backoff.reset();
                    if opts.allow_watch_bookmarks {
                        sink.on_event(Event::Bookmark {
                            resource_version: bm.metadata.resource_version,
                        })
                        .await;
                    }
                }
                Ok(WatchEvent::Error(err_resp)) => {
                    let gone = err_resp.code == 410;
                    let err = kube_client::error::classify(
                        http::StatusCode::from_u16(err_resp.code).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR),
                        err_resp,
                    );
                    if gone {
                        debug!("resource version expired, dropping resume token");
                        opts.list.resource_version = None;
                    }
                    match handle_failure::<K, S>(&err, gone, &mut backoff, sink, cancel, state).await {
                        Ok(()) => break,
                        Err(cause) => return cause,
                    }
                }
                Err(err) => match handle_failure::<K, S>(&err, false, &mut backoff, sink, cancel, state).await {
                    Ok(()) => break,
                    Err(cause) => return cause,
                },
            }
        }
    }
}

/// Decide whether `err` ends the task or is retried, sleeping for the
/// backoff delay in the latter case. `Ok(())` means "reconnect"; `Err`
/// carries the final [`TerminationCause`].
///
/// `force_retry` overrides [`Error::is_retryable`] for `410 Gone`: per the
/// watch engine's termination-cause table, `Gone` always reconnects (from
/// an empty resume token), it just isn't safe to retry the exact same
/// request unmodified the way a transport error is.
async fn handle_failure<K, S>(
    err: &Error,
    force_retry: bool,
    backoff: &mut RetryBackoff,
    sink: &mut S,
    cancel: &CancellationToken,
    state: &Mutex<WatchState>,
) -> Result<(), TerminationCause>
where
    S: WatchSink<K>,
{
    if !force_retry && !err.is_retryable() {
        return Err(TerminationCause::NonRetryableError(Arc::new(clone_error(err))));
    }

    sink.on_retrying_error(err).await;

    let Some(delay) = backoff.next_delay() else {
        return Err(TerminationCause::RetryBudgetExhausted(Arc::new(clone_error(err))));
    };

    warn!(attempt = backoff.attempts(), delay_ms = %delay.as_millis(), "watch stream failed, reconnecting");
    *state.lock() = WatchState::Reconnecting;
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(TerminationCause::Cancelled),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

/// [`Error`] isn't [`Clone`]; re-render it into an equivalent owned value
/// for storage in a [`TerminationCause`] that may outlive the original.
fn clone_error(err: &Error) -> Error {
    Error::TransportError(err.to_string().into())
}

/// Convenience for watching with [`ListOptions::default`] and bookmarks
/// enabled, the common case for controllers that just want change events.
pub fn watch_all<K, S>(api: Api<K>, retry: RetryStrategy, sink: S) -> WatchHandle
where
    K: Clone + DeserializeOwned + ResourceExt + fmt::Debug + Send + Sync + 'static,
    S: WatchSink<K>,
{
    watch(
        api,
        WatchParams {
            list: ListOptions::default(),
            allow_watch_bookmarks: true,
        },
        retry,
        sink,
    )
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use k8s_openapi::api::core::v1::Pod;
    use kube_client::core::descriptor::{ResourceDescriptor, Scope};

    use super::*;
    use crate::retry::{BackoffKind, RetryPolicy};

    fn watchable_pods() -> ResourceDescriptor {
        ResourceDescriptor::new("", "v1", "pods", "Pod", "Pod", Scope::NamespaceScoped, [Capability::Watchable], []).unwrap()
    }

    #[tokio::test]
    async fn unwatchable_descriptor_terminates_without_any_io() {
        let (mock_service, handle) =
            tower_test::mock::pair::<http::Request<kube_client::client::Body>, http::Response<kube_client::client::Body>>();
        drop(handle); // any call on this mock would panic: proves no request is built
        let client = kube_client::Client::new(mock_service, "default");
        let descriptor =
            ResourceDescriptor::new("", "v1", "pods", "Pod", "Pod", Scope::NamespaceScoped, [Capability::Readable], []).unwrap();
        let api: Api<Pod> = Api::namespaced(client, descriptor, "ns");

        let handle = watch_all(api, RetryStrategy::default(), sink_fn(|_: Event<Pod>| {}));
        handle.join().await;
    }

    #[tokio::test]
    async fn cancel_during_reconnect_backoff_terminates_immediately() {
        let (mock_service, handle) =
            tower_test::mock::pair::<http::Request<kube_client::client::Body>, http::Response<kube_client::client::Body>>();
        let client = kube_client::Client::new(mock_service, "default");
        let api: Api<Pod> = Api::namespaced(client, watchable_pods(), "ns");

        let retry = RetryStrategy {
            policy: RetryPolicy::Forever,
            backoff: BackoffKind::Fixed(Duration::from_secs(3600)),
            initial_delay: Duration::from_secs(3600),
            jitter: 0.0,
        };
        let watch_handle = watch_all(api, retry, sink_fn(|_: Event<Pod>| {}));

        tokio::spawn(async move {
            futures::pin_mut!(handle);
            let (_req, send) = handle.next_request().await.expect("service not called");
            send.send_error(std::io::Error::other("connection reset"));
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(watch_handle.state(), WatchState::Reconnecting);
        watch_handle.cancel();
        watch_handle.join().await;
    }

    #[tokio::test]
    async fn gone_error_drops_resume_token_and_reconnects() {
        let (mock_service, handle) =
            tower_test::mock::pair::<http::Request<kube_client::client::Body>, http::Response<kube_client::client::Body>>();
        let client = kube_client::Client::new(mock_service, "default");
        let api: Api<Pod> = Api::namespaced(client, watchable_pods(), "ns");

        let retry = RetryStrategy {
            policy: RetryPolicy::MaxAttempts(1),
            backoff: BackoffKind::Fixed(Duration::from_millis(1)),
            initial_delay: Duration::from_millis(1),
            jitter: 0.0,
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let watch_handle = watch_all(api, retry, sink_fn(move |e: Event<Pod>| seen2.lock().push(format!("{e:?}"))));

        let mock = tokio::spawn(async move {
            futures::pin_mut!(handle);

            // First connection starts from an empty resume cursor.
            let (first, send) = handle.next_request().await.expect("first request");
            assert!(!first.uri().to_string().contains("resourceVersion"));
            let body = format!(
                "{}\n{}\n",
                serde_json::json!({"type": "ADDED", "object": {
                    "apiVersion": "v1", "kind": "Pod",
                    "metadata": {"name": "p1", "resourceVersion": "101"},
                    "spec": {"containers": [{"name": "c", "image": "nginx"}]}
                }}),
                serde_json::json!({"type": "ERROR", "object": {
                    "status": "Failure", "message": "too old resource version", "reason": "Expired", "code": 410
                }}),
            );
            send.send_response(
                http::Response::builder()
                    .body(kube_client::client::Body::from(body.into_bytes()))
                    .unwrap(),
            );

            // The 410 must drop the resume token: the reconnect carries no
            // resourceVersion even though an Added event already advanced it.
            let (second, send) = handle.next_request().await.expect("second request");
            assert!(!second.uri().to_string().contains("resourceVersion"));
            send.send_error(std::io::Error::other("connection reset"));
        });

        watch_handle.join().await;
        mock.await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("Applied"), "expected the Added event to reach the sink: {seen:?}");
    }

    #[tokio::test]
    async fn bookmark_forward_is_gated_by_allow_watch_bookmarks() {
        async fn run(allow: bool) -> Vec<String> {
            let (mock_service, handle) = tower_test::mock::pair::<
                http::Request<kube_client::client::Body>,
                http::Response<kube_client::client::Body>,
            >();
            let client = kube_client::Client::new(mock_service, "default");
            let api: Api<Pod> = Api::namespaced(client, watchable_pods(), "ns");

            let seen = Arc::new(Mutex::new(Vec::new()));
            let seen2 = seen.clone();
            let watch_handle = watch(
                api,
                WatchParams {
                    list: ListOptions::default(),
                    allow_watch_bookmarks: allow,
                },
                RetryStrategy {
                    policy: RetryPolicy::Never,
                    ..RetryStrategy::default()
                },
                sink_fn(move |e: Event<Pod>| seen2.lock().push(format!("{e:?}"))),
            );

            let mock = tokio::spawn(async move {
                futures::pin_mut!(handle);
                let (_req, send) = handle.next_request().await.expect("request");
                // A bookmark followed by a non-retryable-under-this-policy error
                // gives the task a deterministic, single-request lifetime.
                let body = format!(
                    "{}\n{}\n",
                    serde_json::json!({"type": "BOOKMARK", "object": {
                        "apiVersion": "v1", "kind": "Pod",
                        "metadata": {"resourceVersion": "200"}
                    }}),
                    serde_json::json!({"type": "ERROR", "object": {
                        "status": "Failure", "message": "boom", "reason": "InternalError", "code": 500
                    }}),
                );
                send.send_response(
                    http::Response::builder()
                        .body(kube_client::client::Body::from(body.into_bytes()))
                        .unwrap(),
                );
            });

            watch_handle.join().await;
            mock.await.unwrap();
            seen.lock().clone()
        }

        let forwarded = run(true).await;
        assert_eq!(forwarded.len(), 1);
        assert!(forwarded[0].contains("Bookmark"));

        let suppressed = run(false).await;
        assert!(suppressed.is_empty(), "bookmark must not reach the sink when not requested: {suppressed:?}");
    }
}
