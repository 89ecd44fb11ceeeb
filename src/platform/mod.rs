// ABOUTME: Collaborator contracts with the orchestration platform and registry.
// ABOUTME: Data model, async traits, and the hyper HTTP adapters.

mod http;
mod orchestrator;
mod registry;
mod spec;

pub use http::{HttpOrchestrator, HttpRegistry, InvalidEndpoint};
pub use orchestrator::{Orchestrator, PlatformError};
pub use registry::{
    ACCEPTED_MANIFEST_TYPES, MANIFEST_V1, MANIFEST_V2, Manifest, ManifestRegistry, OCI_MANIFEST,
    RegistryError,
};
pub use spec::{
    ContainerDef, InvalidRevision, ParseRevisionRefError, RegisteredSpec, RevisionRef,
    RevisionSelector, ServiceRuntimeState, ServiceSpec,
};
