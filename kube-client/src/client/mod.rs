//! Transport Adapter and Response Decoder.
//!
//! [`Client`] sends already-built requests through a caller-supplied
//! `tower::Service` and decodes the responses: a whole-body JSON decode for
//! ordinary calls, a `kind`-tagged decode into [`ResourceOrStatus`] for
//! delete calls, and a newline-delimited streaming decode into
//! [`WatchEvent`] for watches. It performs no kubeconfig, TLS, or credential
//! resolution of its own — callers hand it an already-configured service
//! stack.
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use kube_core::{
    response::{ResourceOrStatus, Status},
    ErrorResponse, WatchEvent,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::{
    codec::{FramedRead, LinesCodec, LinesCodecError},
    io::StreamReader,
};
use tower::{buffer::Buffer, util::BoxService, BoxError, Layer, Service, ServiceExt};
use tower_http::map_response_body::MapResponseBodyLayer;

mod body;
pub use body::{Body, BodyDataStream, IntoBodyDataStream};

mod config;
pub use config::{AuthInfo, Config, TlsConfig};

use crate::error::{classify, Error};

/// Client for sending already-built requests against a Kubernetes API
/// server and decoding their responses.
#[derive(Clone)]
pub struct Client {
    // - `Buffer` for cheap clone
    // - `BoxService` for dynamic response future type
    inner: Buffer<BoxService<Request<Body>, Response<Body>, BoxError>, Request<Body>>,
    default_namespace: String,
}

impl Client {
    /// Build a `Client` around an already-configured `Service` stack.
    ///
    /// The stack is responsible for anything the Transport Adapter itself
    /// does not do: TLS, authentication, base-URI resolution. See the
    /// wider ecosystem's `ConfigExt`-style ext traits for assembling one.
    pub fn new<S, B, T>(service: S, default_namespace: T) -> Self
    where
        S: Service<Request<Body>, Response = Response<B>> + Send + 'static,
        S::Future: Send + 'static,
        S::Error: Into<BoxError>,
        B: http_body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
        T: Into<String>,
    {
        let service = MapResponseBodyLayer::new(Body::wrap_body)
            .layer(service)
            .map_err(Into::into);
        Self {
            inner: Buffer::new(BoxService::new(service), 1024),
            default_namespace: default_namespace.into(),
        }
    }

    /// The namespace used when a caller resolves
    /// [`kube_core::NamespaceSelector::DefaultNamespace`].
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Send a pre-built request and return the raw response, without
    /// decoding or classifying its status.
    pub async fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Body>, Error> {
        let mut svc = self.inner.clone();
        svc.ready()
            .await
            .map_err(Error::TransportError)?
            .call(request.map(Body::from))
            .await
            .map_err(Error::TransportError)
    }

    async fn text(&self, request: Request<Vec<u8>>) -> Result<(StatusCode, String), Error> {
        let res = self.send(request).await?;
        let status = res.status();
        let bytes = res
            .into_body()
            .collect()
            .await
            .map_err(Error::TransportError)?
            .to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok((status, text))
    }

    fn classify_error_body(status: StatusCode, text: &str) -> Error {
        match serde_json::from_str::<ErrorResponse>(text) {
            Ok(body) => classify(status, body),
            Err(_) => classify(status, ErrorResponse {
                status: status.to_string(),
                code: status.as_u16(),
                message: text.to_string(),
                reason: "Unknown".into(),
            }),
        }
    }

    /// Decode the response body as `T`, classifying any non-2xx status as
    /// a typed [`Error`] instead.
    pub async fn request<T: DeserializeOwned>(&self, request: Request<Vec<u8>>) -> Result<T, Error> {
        let (status, text) = self.text(request).await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(Self::classify_error_body(status, &text));
        }
        serde_json::from_str(&text).map_err(Error::MalformedResponse)
    }

    /// Decode the response body as `T` on success and `None` on `404 Not
    /// Found`, propagating every other error.
    pub async fn request_opt<T: DeserializeOwned>(&self, request: Request<Vec<u8>>) -> Result<Option<T>, Error> {
        match self.request(request).await {
            Ok(v) => Ok(Some(v)),
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Decode the response body as either `T` or a [`Status`], branching
    /// on the JSON `kind` field. Used for delete calls, which echo the
    /// deleted object on some code paths and a bare status on others.
    pub async fn request_resource_or_status<T: DeserializeOwned>(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<ResourceOrStatus<T>, Error> {
        let (status, text) = self.text(request).await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(Self::classify_error_body(status, &text));
        }
        let v: Value = serde_json::from_str(&text).map_err(Error::MalformedResponse)?;
        if v.get("kind").and_then(Value::as_str) == Some("Status") {
            Ok(ResourceOrStatus::Status(
                serde_json::from_str(&text).map_err(Error::MalformedResponse)?,
            ))
        } else {
            Ok(ResourceOrStatus::Resource(
                serde_json::from_str(&text).map_err(Error::MalformedResponse)?,
            ))
        }
    }

    /// Get the response body as a plain string (e.g. a `log` subresource).
    pub async fn request_text(&self, request: Request<Vec<u8>>) -> Result<String, Error> {
        let (status, text) = self.text(request).await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(Self::classify_error_body(status, &text));
        }
        Ok(text)
    }

    /// Stream the response body as successive text lines (e.g. a `log`
    /// subresource with `follow: true`), without buffering the whole body.
    pub async fn request_text_stream(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<impl Stream<Item = Result<String, Error>>, Error> {
        let res = self.send(request).await?;
        let status = res.status();
        if status.is_client_error() || status.is_server_error() {
            let bytes = res.into_body().collect().await.map_err(Error::TransportError)?.to_bytes();
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(Self::classify_error_body(status, &text));
        }

        let frames = FramedRead::new(
            StreamReader::new(res.into_body().into_stream().map_err(std::io::Error::other)),
            LinesCodec::new(),
        );

        Ok(frames.map(|res| match res {
            Ok(line) => Ok(line),
            Err(LinesCodecError::Io(e)) => Err(Error::TransportError(Box::new(e))),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Err(Error::TransportError("log line exceeded max length".into()))
            }
        }))
    }

    /// Send a watch request and decode its response as a stream of
    /// newline-delimited [`WatchEvent`]s, without buffering the whole body.
    pub async fn request_events<T>(
        &self,
        request: Request<Vec<u8>>,
    ) -> Result<impl Stream<Item = Result<WatchEvent<T>, Error>>, Error>
    where
        T: Clone + DeserializeOwned,
    {
        let res = self.send(request).await?;
        let status = res.status();
        if status.is_client_error() || status.is_server_error() {
            let bytes = res.into_body().collect().await.map_err(Error::TransportError)?.to_bytes();
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(Self::classify_error_body(status, &text));
        }

        let frames = FramedRead::new(
            StreamReader::new(res.into_body().into_stream().map_err(std::io::Error::other)),
            LinesCodec::new(),
        );

        Ok(frames.filter_map(|res| async {
            match res {
                Ok(line) => match serde_json::from_str::<WatchEvent<T>>(&line) {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => {
                        if e.is_eof() {
                            return None;
                        }
                        if let Ok(e_resp) = serde_json::from_str::<ErrorResponse>(&line) {
                            return Some(Err(classify(StatusCode::from_u16(e_resp.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), e_resp)));
                        }
                        Some(Err(Error::MalformedResponse(e)))
                    }
                },
                Err(LinesCodecError::Io(e)) => Some(Err(Error::TransportError(Box::new(e)))),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    Some(Err(Error::TransportError("watch line exceeded max length".into())))
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use futures::pin_mut;
    use http::{Request, Response};
    use k8s_openapi::api::core::v1::Pod;
    use tower_test::mock;

    use crate::{api::Api, Client};

    #[tokio::test]
    async fn test_mock() {
        let (mock_service, handle) = mock::pair::<Request<super::Body>, Response<super::Body>>();
        let spawned = tokio::spawn(async move {
            pin_mut!(handle);
            let (request, send) = handle.next_request().await.expect("service not called");
            assert_eq!(request.method(), http::Method::GET);
            assert_eq!(request.uri().to_string(), "/api/v1/namespaces/default/pods/test");
            let pod: Pod = serde_json::from_value(serde_json::json!({
                "apiVersion": "v1",
                "kind": "Pod",
                "metadata": { "name": "test" },
                "spec": { "containers": [{ "name": "test", "image": "test-image" }] }
            }))
            .unwrap();
            send.send_response(
                Response::builder()
                    .body(super::Body::from(serde_json::to_vec(&pod).unwrap()))
                    .unwrap(),
            );
        });

        let descriptor = kube_core::descriptor::ResourceDescriptor::new(
            "",
            "v1",
            "pods",
            "Pod",
            "Pod",
            kube_core::descriptor::Scope::NamespaceScoped,
            [kube_core::descriptor::Capability::Readable],
            [],
        )
        .unwrap();
        let pods: Api<Pod> = Api::default_namespaced(Client::new(mock_service, "default"), descriptor);
        let pod = pods.get("test").await.unwrap();
        assert_eq!(pod.metadata.name.unwrap(), "test");
        spawned.await.unwrap();
    }
}
