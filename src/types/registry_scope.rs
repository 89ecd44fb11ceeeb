// ABOUTME: Classifier for image references hosted by the in-scope registry.
// ABOUTME: A pure predicate built once at startup and passed explicitly.

use regex::Regex;

use super::ImageRef;

/// Decides whether an image reference is hosted by the registry this tool is
/// allowed to retag. Anything else is out of scope and must pass through a
/// deployment untouched.
///
/// Built once from a host pattern and handed to callers explicitly; there is
/// no process-global matcher.
#[derive(Debug, Clone)]
pub struct RegistryScope {
    host_pattern: Regex,
}

/// Regional ECR endpoints: `<account>.dkr.ecr.<region>.amazonaws.com`, where
/// the region is `<partition>-<compass>-<zone>`.
const ECR_HOST_PATTERN: &str = r"^[0-9]+\.dkr\.ecr\.(us|ca|eu|ap|sa)-(east|west|central|northeast|southeast|south)-[12]\.amazonaws\.com$";

impl RegistryScope {
    /// Scope covering the regional endpoints of AWS ECR.
    pub fn aws_ecr() -> Self {
        Self {
            // The pattern is a compile-time constant and known valid.
            host_pattern: Regex::new(ECR_HOST_PATTERN).expect("ECR host pattern is valid"),
        }
    }

    /// Scope matching an arbitrary host pattern, mainly for tests and
    /// non-AWS registries.
    pub fn from_pattern(host_pattern: Regex) -> Self {
        Self { host_pattern }
    }

    /// Whether this reference is hosted in-scope. References with no host at
    /// all (Docker Hub shorthand) are out of scope.
    pub fn contains(&self, reference: &ImageRef) -> bool {
        reference
            .host()
            .is_some_and(|host| self.host_pattern.is_match(host))
    }
}
