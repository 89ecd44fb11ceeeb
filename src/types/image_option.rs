// ABOUTME: Caller-supplied source tags for repositories being promoted.
// ABOUTME: Parses --image repo:tag flags and answers per-repository lookups.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::image_ref::{is_valid_repo_path, is_valid_tag};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid image option (expected repository:tag): {0}")]
pub struct InvalidImageOption(pub String);

/// One `--image repository:tag` flag: which tag of a repository should be
/// promoted by this attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOption {
    repository: String,
    tag: String,
}

impl ImageOption {
    pub fn new(repository: &str, tag: &str) -> Result<Self, InvalidImageOption> {
        if !is_valid_repo_path(repository) || !is_valid_tag(tag) {
            return Err(InvalidImageOption(format!("{repository}:{tag}")));
        }
        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The source tag whose content gets pinned under the attempt tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl FromStr for ImageOption {
    type Err = InvalidImageOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repository, tag) = s
            .rsplit_once(':')
            .ok_or_else(|| InvalidImageOption(s.to_string()))?;
        Self::new(repository, tag)
    }
}

impl fmt::Display for ImageOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// The full set of options supplied for one attempt, looked up by repository
/// while transforming a baseline spec.
#[derive(Debug, Clone, Default)]
pub struct ImageOptions(Vec<ImageOption>);

impl ImageOptions {
    pub fn get(&self, repository: &str) -> Option<&ImageOption> {
        self.0.iter().find(|opt| opt.repository() == repository)
    }
}

impl FromIterator<ImageOption> for ImageOptions {
    fn from_iter<I: IntoIterator<Item = ImageOption>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_and_tag() {
        let opt: ImageOption = "app:v1.2".parse().unwrap();
        assert_eq!(opt.repository(), "app");
        assert_eq!(opt.tag(), "v1.2");
    }

    #[test]
    fn parses_nested_repository() {
        let opt: ImageOption = "team/app:release-7".parse().unwrap();
        assert_eq!(opt.repository(), "team/app");
    }

    #[test]
    fn rejects_missing_tag() {
        assert!("app".parse::<ImageOption>().is_err());
    }

    #[test]
    fn rejects_invalid_repository() {
        assert!("App:v1".parse::<ImageOption>().is_err());
        assert!(":v1".parse::<ImageOption>().is_err());
    }

    #[test]
    fn rejects_invalid_tag() {
        assert!("app:".parse::<ImageOption>().is_err());
        assert!("app:.v1".parse::<ImageOption>().is_err());
    }

    #[test]
    fn lookup_by_repository() {
        let options: ImageOptions = ["app:v1", "worker:v2"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(options.get("worker").unwrap().tag(), "v2");
        assert!(options.get("missing").is_none());
    }
}
