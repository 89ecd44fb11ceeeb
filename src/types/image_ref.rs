// ABOUTME: Container image reference parsing and validation.
// ABOUTME: Handles formats like registry.host/repo:tag and bare repo:tag.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedReferenceError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid repository name: {0}")]
    InvalidRepository(String),

    #[error("invalid tag: {0}")]
    InvalidTag(String),
}

/// A parsed container image reference.
///
/// Split into an optional registry host, a repository path, and a tag.
/// Immutable once constructed; `Display` reproduces the canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    host: Option<String>,
    repository: String,
    tag: String,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, MalformedReferenceError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(MalformedReferenceError::Empty);
        }

        // Split off the tag. A colon after the last slash is a tag separator;
        // a colon before it belongs to a registry port.
        let (without_tag, tag) = match input.rsplit_once(':') {
            Some((before, after)) if !after.contains('/') => (before, after.to_string()),
            _ => (input, "latest".to_string()),
        };

        if !is_valid_tag(&tag) {
            return Err(MalformedReferenceError::InvalidTag(tag));
        }

        let (host, repository) = split_host(without_tag);

        if repository.is_empty() || !repository.split('/').all(is_valid_repo_component) {
            return Err(MalformedReferenceError::InvalidRepository(
                repository.to_string(),
            ));
        }

        Ok(Self {
            host: host.map(str::to_string),
            repository: repository.to_string(),
            tag,
        })
    }

    /// Registry host, if the reference carries one.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Repository path without the host (e.g. `app` or `team/app`).
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Host-qualified name without the tag (e.g. `host/team/app`).
    pub fn name(&self) -> String {
        match &self.host {
            Some(host) => format!("{}/{}", host, self.repository),
            None => self.repository.clone(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The same name pointed at a different tag.
    pub fn with_tag(&self, tag: &str) -> Result<Self, MalformedReferenceError> {
        if !is_valid_tag(tag) {
            return Err(MalformedReferenceError::InvalidTag(tag.to_string()));
        }
        Ok(Self {
            host: self.host.clone(),
            repository: self.repository.clone(),
            tag: tag.to_string(),
        })
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name(), self.tag)
    }
}

/// A host is present when the first path component looks like a hostname:
/// it contains a dot or a port colon, or is "localhost".
fn split_host(input: &str) -> (Option<&str>, &str) {
    match input.split_once('/') {
        Some((first, rest))
            if first.contains('.') || first.contains(':') || first == "localhost" =>
        {
            (Some(first), rest)
        }
        _ => (None, input),
    }
}

/// A repository path: one or more `/`-joined valid components.
pub(crate) fn is_valid_repo_path(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(is_valid_repo_component)
}

/// One repository path component: lowercase alphanumerics joined by
/// `.`, `_`, `__`, or runs of `-`.
fn is_valid_repo_component(component: &str) -> bool {
    let bytes = component.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    let mut prev_sep = 0usize; // consecutive separator count
    let mut prev_byte = 0u8;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'a'..=b'z' | b'0'..=b'9' => prev_sep = 0,
            b'.' | b'_' => {
                if i == 0 {
                    return false;
                }
                // `.` never repeats; `_` at most twice
                let limit = if b == b'_' { 2 } else { 1 };
                if prev_sep >= limit || (prev_sep > 0 && prev_byte != b) {
                    return false;
                }
                prev_sep += 1;
            }
            b'-' => {
                if i == 0 {
                    return false;
                }
                if prev_sep > 0 && prev_byte != b'-' {
                    return false;
                }
                prev_sep += 1;
            }
            _ => return false,
        }
        prev_byte = b;
    }
    prev_sep == 0
}

/// Tags are word characters plus `.` and `-`, 1 to 128 long, and must not
/// start with a separator.
pub(crate) fn is_valid_tag(tag: &str) -> bool {
    let bytes = tag.as_bytes();
    if bytes.is_empty() || bytes.len() > 128 {
        return false;
    }
    let word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    word(bytes[0]) && bytes[1..].iter().all(|&b| word(b) || b == b'.' || b == b'-')
}
