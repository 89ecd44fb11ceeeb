// ABOUTME: Unique, time-sortable identifier for one deployment attempt.
// ABOUTME: Doubles as the registry tag pinned to every promoted image.

use std::fmt;
use std::str::FromStr;

use ulid::Ulid;

/// Identifier minted exactly once per promotion attempt.
///
/// The same value is used as the tag written to every retagged image, and is
/// embedded in the history message, so one attempt can be correlated across
/// registry and platform logs. ULIDs are time-sortable, which keeps
/// attempt-derived tags ordered and never reused across attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Ulid);

impl AttemptId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// The 26-character Crockford base32 form, valid as an image tag.
    pub fn as_tag(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttemptId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}
