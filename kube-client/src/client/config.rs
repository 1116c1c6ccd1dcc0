//! The transport configuration this crate *receives* rather than resolves.
//!
//! Kubeconfig parsing, exec-plugin credential resolution, and trust-anchor
//! loading from disk are all external collaborators (see the system spec's
//! Non-goals) — by the time a [`Config`] reaches [`Client::new_with_config`]
//! every field is already a concrete value, not a reference to something on
//! disk.
use std::time::Duration;

use http::{
    header::{HeaderValue, AUTHORIZATION, USER_AGENT},
    Request, Uri,
};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_timeout::TimeoutConnector;
use hyper_util::{client::legacy::connect::HttpConnector, rt::TokioExecutor};
use rustls::{
    pki_types::{CertificateDer, PrivateKeyDer},
    ClientConfig, RootCertStore,
};
use secrecy::{ExposeSecret, SecretString};
use tower::{Layer, Service, ServiceBuilder, ServiceExt};
use tower_http::trace::TraceLayer;

use crate::{client::Body, error::Error, Client};

/// Client certificate/key and trust anchors, already decoded from whatever
/// kubeconfig or in-cluster source produced them.
#[derive(Clone)]
pub struct TlsConfig {
    /// DER-encoded CA certificates to trust, in addition to the platform's
    /// native roots.
    pub root_certs: Vec<Vec<u8>>,
    /// DER-encoded client certificate chain and private key, for mutual TLS.
    pub client_identity: Option<(Vec<Vec<u8>>, Vec<u8>)>,
}

/// Already-resolved credentials to attach to every outgoing request.
#[derive(Clone)]
pub enum AuthInfo {
    /// A bearer token, sent as `Authorization: Bearer <token>`.
    BearerToken(SecretString),
}

/// Transport configuration accepted (never resolved) by this crate.
///
/// See the system spec's External Interfaces section for the exact shape
/// this mirrors.
#[derive(Clone)]
pub struct Config {
    /// Scheme + host + port of the API server.
    pub cluster_url: Uri,
    /// Namespace used to resolve [`kube_core::path::NamespaceSelector::DefaultNamespace`].
    pub default_namespace: String,
    /// TLS trust anchors and optional client identity.
    pub tls: Option<TlsConfig>,
    /// Pre-resolved credentials.
    pub auth: Option<AuthInfo>,
    /// `User-Agent` header value sent with every request.
    pub user_agent: String,
    /// Per-request read timeout.
    pub read_timeout: Option<Duration>,
    /// Per-request write timeout.
    pub write_timeout: Option<Duration>,
}

impl Config {
    fn rustls_client_config(&self) -> Result<ClientConfig, Error> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        if let Some(tls) = &self.tls {
            for der in &tls.root_certs {
                roots
                    .add(CertificateDer::from(der.clone()))
                    .map_err(|e| Error::ConfigError(e.to_string()))?;
            }
        }

        let builder = ClientConfig::builder().with_root_certificates(roots);
        let config = match self.tls.as_ref().and_then(|t| t.client_identity.as_ref()) {
            Some((chain, key)) => {
                let chain: Vec<CertificateDer<'static>> = chain.iter().cloned().map(CertificateDer::from).collect();
                let key = PrivateKeyDer::try_from(key.clone()).map_err(|e| Error::ConfigError(e.to_string()))?;
                builder
                    .with_client_auth_cert(chain, key)
                    .map_err(|e| Error::ConfigError(e.to_string()))?
            }
            None => builder.with_no_client_auth(),
        };
        Ok(config)
    }

    fn auth_header(&self) -> Result<Option<HeaderValue>, Error> {
        match &self.auth {
            Some(AuthInfo::BearerToken(token)) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|e| Error::ConfigError(e.to_string()))?;
                value.set_sensitive(true);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

impl Client {
    /// Build a [`Client`] with the reference workspace's default transport
    /// stack (hyper + rustls + a `TraceLayer`), from a fully-resolved
    /// [`Config`].
    ///
    /// This is a convenience over [`Client::new`] for the common case; it
    /// does no kubeconfig/credential resolution of its own.
    pub fn new_with_config(config: Config) -> Result<Client, Error> {
        let tls_config = config.rustls_client_config()?;
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let https = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);
        let mut timeout = TimeoutConnector::new(https);
        timeout.set_read_timeout(config.read_timeout);
        timeout.set_write_timeout(config.write_timeout);

        let hyper_client = hyper_util::client::legacy::Client::builder(TokioExecutor::new()).build(timeout);

        let base_uri = config.cluster_url.clone();
        let auth_header = config.auth_header()?;
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| Error::ConfigError(e.to_string()))?;

        let service = ServiceBuilder::new()
            .layer(BaseUriLayer { base_uri })
            .layer(HeaderLayer {
                name: USER_AGENT,
                value: Some(user_agent),
            })
            .layer(HeaderLayer {
                name: AUTHORIZATION,
                value: auth_header,
            })
            .layer(TraceLayer::new_for_http())
            .service(hyper_client)
            .map_err(Into::into)
            .boxed();

        Ok(Client::new(service, config.default_namespace))
    }
}

#[derive(Clone)]
struct BaseUriLayer {
    base_uri: Uri,
}

impl<S> Layer<S> for BaseUriLayer {
    type Service = BaseUriService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BaseUriService {
            inner,
            base_uri: self.base_uri.clone(),
        }
    }
}

#[derive(Clone)]
struct BaseUriService<S> {
    inner: S,
    base_uri: Uri,
}

impl<S> Service<Request<Body>> for BaseUriService<S>
where
    S: Service<Request<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut parts = self.base_uri.clone().into_parts();
        parts.path_and_query = req.uri().path_and_query().cloned();
        if let Ok(uri) = Uri::from_parts(parts) {
            *req.uri_mut() = uri;
        }
        self.inner.call(req)
    }
}

/// Sets a header on every outgoing request if not already present, unless
/// `value` is `None` (in which case this layer is a no-op pass-through).
#[derive(Clone)]
struct HeaderLayer {
    name: http::HeaderName,
    value: Option<HeaderValue>,
}

impl<S> Layer<S> for HeaderLayer {
    type Service = HeaderService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeaderService {
            inner,
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

#[derive(Clone)]
struct HeaderService<S> {
    inner: S,
    name: http::HeaderName,
    value: Option<HeaderValue>,
}

impl<S, B> Service<Request<B>> for HeaderService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if let Some(value) = &self.value {
            req.headers_mut().entry(self.name.clone()).or_insert_with(|| value.clone());
        }
        self.inner.call(req)
    }
}
