// ABOUTME: Image registry contract: fetch and write manifests by tag.
// ABOUTME: Retagging is a manifest copy, never a content rebuild.

use async_trait::async_trait;
use bytes::Bytes;

/// Docker schema 1 manifest media type.
pub const MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";
/// Docker schema 2 manifest media type.
pub const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// OCI image manifest media type.
pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// Manifest media types a retag accepts, legacy first.
pub const ACCEPTED_MANIFEST_TYPES: [&str; 3] = [MANIFEST_V1, MANIFEST_V2, OCI_MANIFEST];

/// An image manifest as stored by the registry: a media type plus the raw
/// document. The payload is opaque here; copying it verbatim is what makes a
/// retag byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub media_type: String,
    pub payload: Bytes,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// No image exists under the requested tag.
    #[error("image not found: {repository}:{tag}")]
    ImageNotFound { repository: String, tag: String },

    /// The registry refused the manifest write (malformed manifest, quota).
    #[error("registry rejected write: {0}")]
    WriteRejected(String),

    /// The registry could not be reached.
    #[error("registry transport error: {0}")]
    Transport(String),
}

/// The image registry, reduced to the two manifest operations retagging
/// needs.
#[async_trait]
pub trait ManifestRegistry: Send + Sync {
    /// Fetch the manifest a tag currently points at, accepting any of
    /// [`ACCEPTED_MANIFEST_TYPES`].
    async fn get_manifest(&self, repository: &str, tag: &str) -> Result<Manifest, RegistryError>;

    /// Write a manifest under a tag in the same repository.
    async fn put_manifest(
        &self,
        repository: &str,
        tag: &str,
        manifest: &Manifest,
    ) -> Result<(), RegistryError>;

    /// Point `to_tag` at the content currently under `from_tag`.
    ///
    /// Not idempotent when `to_tag` already exists with different content: a
    /// re-invocation overwrites it. Callers must mint `to_tag` values that
    /// are never reused across attempts, or they will clobber a prior
    /// attempt's pinned artifact.
    async fn retag(
        &self,
        repository: &str,
        from_tag: &str,
        to_tag: &str,
    ) -> Result<(), RegistryError> {
        let manifest = self.get_manifest(repository, from_tag).await?;
        self.put_manifest(repository, to_tag, &manifest).await
    }
}
