// ABOUTME: Pure derivation of a candidate spec from a baseline spec.
// ABOUTME: Rewrites in-scope images to the attempt tag; everything else copies.

use thiserror::Error;

use crate::platform::{ContainerDef, ServiceSpec};
use crate::types::{AttemptId, ImageOptions, ImageRef, MalformedReferenceError, RegistryScope};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// An in-scope container's repository has no `--image` option.
    #[error("no image option supplied for repository {0}")]
    MissingImageOption(String),

    #[error(transparent)]
    MalformedReference(#[from] MalformedReferenceError),
}

/// What happens to containers whose image is hosted outside the in-scope
/// registry.
///
/// The historical behavior drops them from the derived spec, which silently
/// removes external sidecars from the service on every deploy. That looks
/// unintentional, so both behaviors are offered and the caller must pick one
/// (`--keep-external` selects `Keep`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalImagePolicy {
    /// Exclude out-of-scope containers from the derived spec (historical).
    #[default]
    Drop,
    /// Pass out-of-scope containers through with their reference unchanged.
    Keep,
}

/// One registry copy the attempt must perform before registering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetagOp {
    pub repository: String,
    pub from_tag: String,
}

/// Derive the candidate spec for one attempt.
///
/// Pure and synchronous: no registry or platform calls. Every in-scope
/// container is re-pointed at `name:attempt`, and must have a caller-supplied
/// option for its repository. All other container fields and every top-level
/// field are copied from the baseline unchanged; the candidate is built as a
/// fresh value, never by patching the baseline in place.
pub fn transform(
    baseline: &ServiceSpec,
    attempt: &AttemptId,
    options: &ImageOptions,
    policy: ExternalImagePolicy,
    scope: &RegistryScope,
) -> Result<ServiceSpec, TransformError> {
    let mut container_defs = Vec::with_capacity(baseline.container_defs.len());

    for container in &baseline.container_defs {
        let image = ImageRef::parse(&container.image)?;

        if !scope.contains(&image) {
            match policy {
                ExternalImagePolicy::Drop => continue,
                ExternalImagePolicy::Keep => container_defs.push(container.clone()),
            }
            continue;
        }

        if options.get(image.repository()).is_none() {
            return Err(TransformError::MissingImageOption(
                image.repository().to_string(),
            ));
        }

        container_defs.push(ContainerDef {
            name: container.name.clone(),
            image: format!("{}:{}", image.name(), attempt.as_tag()),
            extra: container.extra.clone(),
        });
    }

    Ok(ServiceSpec {
        family: baseline.family.clone(),
        container_defs,
        cpu: baseline.cpu.clone(),
        memory: baseline.memory.clone(),
        network_mode: baseline.network_mode.clone(),
        execution_role_arn: baseline.execution_role_arn.clone(),
        task_role_arn: baseline.task_role_arn.clone(),
        volumes: baseline.volumes.clone(),
        placement_constraints: baseline.placement_constraints.clone(),
        compatibilities: baseline.compatibilities.clone(),
    })
}

/// The registry copies implied by a baseline: one per in-scope container,
/// from the option's source tag. The attempt tag is the destination for all
/// of them.
pub fn plan_retags(
    baseline: &ServiceSpec,
    options: &ImageOptions,
    scope: &RegistryScope,
) -> Result<Vec<RetagOp>, TransformError> {
    let mut plan = Vec::new();

    for container in &baseline.container_defs {
        let image = ImageRef::parse(&container.image)?;
        if !scope.contains(&image) {
            continue;
        }

        let option = options.get(image.repository()).ok_or_else(|| {
            TransformError::MissingImageOption(image.repository().to_string())
        })?;

        plan.push(RetagOp {
            repository: option.repository().to_string(),
            from_tag: option.tag().to_string(),
        });
    }

    Ok(plan)
}
