// ABOUTME: Test doubles for the promotion pipeline's collaborators.
// ABOUTME: In-memory platform, registry, history, and a recording sink.

// Each test binary only uses some of these helpers.
#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;

use stevedore::history::{HistoryEntry, HistoryError, HistoryStore};
use stevedore::notify::{NotificationSink, Severity};
use stevedore::platform::{
    MANIFEST_V2, Manifest, ManifestRegistry, Orchestrator, PlatformError, RegisteredSpec,
    RegistryError, RevisionRef, ServiceRuntimeState, ServiceSpec,
};

/// What the stub platform does when a service is repointed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutBehavior {
    /// The service immediately settles on the target revision.
    Converge,
    /// The rollout stays in flight forever (two deployments).
    NeverConverge,
    /// The first N describes after the cut-over fail with a transport
    /// error; after that the service is settled.
    FlakyThenConverge(usize),
    /// Every describe after the cut-over fails definitively.
    FailDefinitively,
}

pub struct StubPlatform {
    pub behavior: RolloutBehavior,
    state: Mutex<ServiceRuntimeState>,
    specs: Mutex<HashMap<String, ServiceSpec>>,
    next_revision: Mutex<u64>,
    rolling_out: Mutex<bool>,
    transient_failures: Mutex<usize>,
    pub registered: Mutex<Vec<RegisteredSpec>>,
    pub updates: Mutex<Vec<(String, String, RevisionRef)>>,
}

impl StubPlatform {
    pub fn new(live: ServiceRuntimeState, next_revision: u64) -> Self {
        Self {
            behavior: RolloutBehavior::Converge,
            state: Mutex::new(live),
            specs: Mutex::new(HashMap::new()),
            next_revision: Mutex::new(next_revision),
            rolling_out: Mutex::new(false),
            transient_failures: Mutex::new(0),
            registered: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
        }
    }

    pub fn with_behavior(mut self, behavior: RolloutBehavior) -> Self {
        self.behavior = behavior;
        if let RolloutBehavior::FlakyThenConverge(failures) = behavior {
            *self.transient_failures.lock() = failures;
        }
        self
    }

    pub fn insert_spec(&self, revision: &RevisionRef, spec: ServiceSpec) {
        self.specs.lock().insert(revision.to_string(), spec);
    }

    pub fn registered_specs(&self) -> Vec<RegisteredSpec> {
        self.registered.lock().clone()
    }

    pub fn update_calls(&self) -> Vec<(String, String, RevisionRef)> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl Orchestrator for StubPlatform {
    async fn describe_service(
        &self,
        _cluster: &str,
        _service: &str,
    ) -> Result<ServiceRuntimeState, PlatformError> {
        if *self.rolling_out.lock() {
            match self.behavior {
                RolloutBehavior::FailDefinitively => {
                    return Err(PlatformError::NotFound("service vanished".into()));
                }
                RolloutBehavior::FlakyThenConverge(_) => {
                    let mut left = self.transient_failures.lock();
                    if *left > 0 {
                        *left -= 1;
                        return Err(PlatformError::Transport("gateway unreachable".into()));
                    }
                }
                _ => {}
            }
        }
        Ok(self.state.lock().clone())
    }

    async fn describe_spec(&self, revision: &RevisionRef) -> Result<ServiceSpec, PlatformError> {
        self.specs
            .lock()
            .get(&revision.to_string())
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(revision.to_string()))
    }

    async fn register_spec(&self, spec: &ServiceSpec) -> Result<RegisteredSpec, PlatformError> {
        let mut next = self.next_revision.lock();
        let registered = RegisteredSpec {
            spec: spec.clone(),
            revision: *next,
        };
        *next += 1;
        self.specs
            .lock()
            .insert(registered.revision_ref().to_string(), spec.clone());
        self.registered.lock().push(registered.clone());
        Ok(registered)
    }

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        target: &RevisionRef,
    ) -> Result<(), PlatformError> {
        self.updates
            .lock()
            .push((cluster.to_string(), service.to_string(), target.clone()));
        *self.rolling_out.lock() = true;
        *self.state.lock() = match self.behavior {
            RolloutBehavior::NeverConverge => ServiceRuntimeState {
                active_revision: target.clone(),
                deployment_count: 2,
            },
            _ => ServiceRuntimeState {
                active_revision: target.clone(),
                deployment_count: 1,
            },
        };
        Ok(())
    }
}

#[derive(Default)]
pub struct StubRegistry {
    manifests: Mutex<HashMap<(String, String), Manifest>>,
    pub puts: Mutex<Vec<(String, String)>>,
}

impl StubRegistry {
    pub fn seeded(tags: &[(&str, &str)]) -> Self {
        let registry = Self::default();
        for (repository, tag) in tags {
            registry.manifests.lock().insert(
                (repository.to_string(), tag.to_string()),
                Manifest {
                    media_type: MANIFEST_V2.to_string(),
                    payload: Bytes::from(format!("{{\"ref\":\"{repository}:{tag}\"}}")),
                },
            );
        }
        registry
    }

    pub fn put_calls(&self) -> Vec<(String, String)> {
        self.puts.lock().clone()
    }

    pub fn manifest(&self, repository: &str, tag: &str) -> Option<Manifest> {
        self.manifests
            .lock()
            .get(&(repository.to_string(), tag.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ManifestRegistry for StubRegistry {
    async fn get_manifest(&self, repository: &str, tag: &str) -> Result<Manifest, RegistryError> {
        self.manifest(repository, tag)
            .ok_or_else(|| RegistryError::ImageNotFound {
                repository: repository.to_string(),
                tag: tag.to_string(),
            })
    }

    async fn put_manifest(
        &self,
        repository: &str,
        tag: &str,
        manifest: &Manifest,
    ) -> Result<(), RegistryError> {
        self.puts
            .lock()
            .push((repository.to_string(), tag.to_string()));
        self.manifests
            .lock()
            .insert((repository.to_string(), tag.to_string()), manifest.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemHistory {
    entries: Mutex<HashMap<(String, String), Vec<HistoryEntry>>>,
}

impl MemHistory {
    pub fn entries_for(&self, cluster: &str, service: &str) -> Vec<HistoryEntry> {
        self.entries
            .lock()
            .get(&(cluster.to_string(), service.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl HistoryStore for MemHistory {
    async fn push_state(
        &self,
        cluster: &str,
        service: &str,
        revision: u64,
        message: &str,
    ) -> Result<(), HistoryError> {
        self.entries
            .lock()
            .entry((cluster.to_string(), service.to_string()))
            .or_default()
            .push(HistoryEntry {
                revision,
                message: message.to_string(),
                recorded_at: Utc::now(),
            });
        Ok(())
    }

    async fn latest(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<Option<HistoryEntry>, HistoryError> {
        Ok(self.entries_for(cluster, service).into_iter().next_back())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, severity: Severity, message: &str) {
        self.messages.lock().push((severity, message.to_string()));
    }
}
