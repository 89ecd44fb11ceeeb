// ABOUTME: Hyper-based HTTP adapters for the registry and control plane.
// ABOUTME: One short-lived http1 connection per request, no TLS, no auth.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::net::TcpStream;

use super::orchestrator::{Orchestrator, PlatformError};
use super::registry::{ACCEPTED_MANIFEST_TYPES, Manifest, ManifestRegistry, RegistryError};
use super::spec::{RegisteredSpec, RevisionRef, ServiceRuntimeState, ServiceSpec};

#[derive(Debug, Error)]
#[error("invalid endpoint (expected host:port): {0}")]
pub struct InvalidEndpoint(pub String);

/// A plain-TCP HTTP/1.1 client for one endpoint.
///
/// Session setup (TLS, credentials) is a collaborator concern and lives
/// outside this tool; these adapters speak to an already-authenticated
/// local gateway or registry.
#[derive(Debug, Clone)]
struct HttpClient {
    authority: String,
}

impl HttpClient {
    fn new(endpoint: &str) -> Result<Self, InvalidEndpoint> {
        let authority = endpoint
            .strip_prefix("http://")
            .unwrap_or(endpoint)
            .trim_end_matches('/');
        if authority.is_empty() || authority.contains('/') || authority.contains("://") {
            return Err(InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            authority: authority.to_string(),
        })
    }

    async fn send(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(StatusCode, Option<String>, Bytes), String> {
        let stream = TcpStream::connect(&self.authority)
            .await
            .map_err(|e| format!("failed to connect to {}: {}", self.authority, e))?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| format!("HTTP handshake failed: {e}"))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("connection error: {}", e);
            }
        });

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(hyper::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?
            .to_bytes();

        Ok((status, content_type, body))
    }

    fn builder(&self, method: Method, path: &str) -> hyper::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(path)
            .header(hyper::header::HOST, &self.authority)
    }
}

fn body_text(body: &Bytes) -> String {
    String::from_utf8_lossy(body).trim().to_string()
}

// =============================================================================
// Registry adapter (Docker Registry HTTP API v2)
// =============================================================================

/// `ManifestRegistry` over the Docker Registry HTTP API v2:
/// `GET`/`PUT /v2/<repository>/manifests/<tag>`.
pub struct HttpRegistry {
    client: HttpClient,
}

impl HttpRegistry {
    pub fn connect(endpoint: &str) -> Result<Self, InvalidEndpoint> {
        Ok(Self {
            client: HttpClient::new(endpoint)?,
        })
    }

    fn manifest_path(repository: &str, tag: &str) -> String {
        // Repository grammar forbids characters needing escapes; the tag is
        // encoded because attempt tags come from user-adjacent input.
        format!("/v2/{}/manifests/{}", repository, urlencoding::encode(tag))
    }
}

#[async_trait]
impl ManifestRegistry for HttpRegistry {
    async fn get_manifest(&self, repository: &str, tag: &str) -> Result<Manifest, RegistryError> {
        let request = self
            .client
            .builder(Method::GET, &Self::manifest_path(repository, tag))
            .header(hyper::header::ACCEPT, ACCEPTED_MANIFEST_TYPES.join(", "))
            .body(Full::new(Bytes::new()))
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let (status, content_type, body) = self
            .client
            .send(request)
            .await
            .map_err(RegistryError::Transport)?;

        match status {
            StatusCode::NOT_FOUND => Err(RegistryError::ImageNotFound {
                repository: repository.to_string(),
                tag: tag.to_string(),
            }),
            s if s.is_success() => Ok(Manifest {
                media_type: content_type.unwrap_or_else(|| super::registry::MANIFEST_V2.to_string()),
                payload: body,
            }),
            s => Err(RegistryError::Transport(format!(
                "unexpected status {} fetching {}:{}: {}",
                s,
                repository,
                tag,
                body_text(&body)
            ))),
        }
    }

    async fn put_manifest(
        &self,
        repository: &str,
        tag: &str,
        manifest: &Manifest,
    ) -> Result<(), RegistryError> {
        let request = self
            .client
            .builder(Method::PUT, &Self::manifest_path(repository, tag))
            .header(hyper::header::CONTENT_TYPE, &manifest.media_type)
            .body(Full::new(manifest.payload.clone()))
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        let (status, _, body) = self
            .client
            .send(request)
            .await
            .map_err(RegistryError::Transport)?;

        if status.is_success() {
            Ok(())
        } else if status.is_client_error() {
            Err(RegistryError::WriteRejected(format!(
                "{}:{}: {} {}",
                repository,
                tag,
                status,
                body_text(&body)
            )))
        } else {
            Err(RegistryError::Transport(format!(
                "unexpected status {} writing {}:{}",
                status, repository, tag
            )))
        }
    }
}

// =============================================================================
// Control-plane adapter
// =============================================================================

/// `Orchestrator` over a JSON control-plane gateway:
///
/// - `GET  /v1/clusters/{cluster}/services/{service}` → `ServiceRuntimeState`
/// - `GET  /v1/revisions/{family}/{revision}`         → `ServiceSpec`
/// - `POST /v1/revisions`                             → `RegisteredSpec`
/// - `PUT  /v1/clusters/{cluster}/services/{service}/target-revision`
pub struct HttpOrchestrator {
    client: HttpClient,
}

impl HttpOrchestrator {
    pub fn connect(endpoint: &str) -> Result<Self, InvalidEndpoint> {
        Ok(Self {
            client: HttpClient::new(endpoint)?,
        })
    }

    fn service_path(cluster: &str, service: &str) -> String {
        format!(
            "/v1/clusters/{}/services/{}",
            urlencoding::encode(cluster),
            urlencoding::encode(service)
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        let request = self
            .client
            .builder(Method::GET, path)
            .body(Full::new(Bytes::new()))
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        let (status, _, body) = self
            .client
            .send(request)
            .await
            .map_err(PlatformError::Transport)?;

        match status {
            StatusCode::NOT_FOUND => Err(PlatformError::NotFound(body_text(&body))),
            s if s.is_success() => serde_json::from_slice(&body).map_err(|e| {
                PlatformError::Transport(format!("malformed response from {path}: {e}"))
            }),
            s => Err(PlatformError::Rejected(format!(
                "{} {}",
                s,
                body_text(&body)
            ))),
        }
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        payload: &impl serde::Serialize,
    ) -> Result<Bytes, PlatformError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| PlatformError::Transport(format!("failed to encode request: {e}")))?;

        let request = self
            .client
            .builder(method, path)
            .header(hyper::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        let (status, _, body) = self
            .client
            .send(request)
            .await
            .map_err(PlatformError::Transport)?;

        match status {
            StatusCode::NOT_FOUND => Err(PlatformError::NotFound(body_text(&body))),
            s if s.is_success() => Ok(body),
            s => Err(PlatformError::Rejected(format!(
                "{} {}",
                s,
                body_text(&body)
            ))),
        }
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ServiceRuntimeState, PlatformError> {
        self.get_json(&Self::service_path(cluster, service)).await
    }

    async fn describe_spec(&self, revision: &RevisionRef) -> Result<ServiceSpec, PlatformError> {
        let path = format!(
            "/v1/revisions/{}/{}",
            urlencoding::encode(revision.family()),
            revision.revision()
        );
        self.get_json(&path).await
    }

    async fn register_spec(&self, spec: &ServiceSpec) -> Result<RegisteredSpec, PlatformError> {
        let body = self.send_json(Method::POST, "/v1/revisions", spec).await?;
        serde_json::from_slice(&body).map_err(|e| {
            PlatformError::Transport(format!("malformed registration response: {e}"))
        })
    }

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        target: &RevisionRef,
    ) -> Result<(), PlatformError> {
        let path = format!("{}/target-revision", Self::service_path(cluster, service));
        let payload = serde_json::json!({ "revision": target });
        self.send_json(Method::PUT, &path, &payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_accepts_host_port() {
        assert!(HttpClient::new("localhost:5000").is_ok());
        assert!(HttpClient::new("http://registry.internal:5000").is_ok());
        assert!(HttpClient::new("registry.internal:5000/").is_ok());
    }

    #[test]
    fn endpoint_rejects_paths_and_schemes() {
        assert!(HttpClient::new("").is_err());
        assert!(HttpClient::new("localhost:5000/v2").is_err());
        assert!(HttpClient::new("https://registry.internal").is_err());
    }

    #[test]
    fn manifest_path_encodes_tag() {
        assert_eq!(
            HttpRegistry::manifest_path("team/app", "01ABC"),
            "/v2/team/app/manifests/01ABC"
        );
    }
}
