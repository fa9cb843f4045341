//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example, a
//! [`BranchName`] with a [`RemoteName`] even though both are `String` under the
//! hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or contains whitespace.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() || v.chars().any(char::is_whitespace) {
                    None
                } else {
                    Some(Self(v))
                }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline run (one update → commit → tag → push sequence).
///
/// Backed by a UUID v7, so identifiers sort by creation time. Propagated through
/// spans so all activity from a single run can be correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipelineRunId(Uuid);

impl PipelineRunId {
    /// Generates a new time-ordered run identifier.
    pub fn new_time_ordered() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for PipelineRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (configuration / Git names)
// ---------------------------------------------------------------------------

string_id! {
    /// A Git branch name (e.g. `"main"`).
    BranchName
}

string_id! {
    /// A Git remote name (e.g. `"origin"`).
    RemoteName
}

// ---------------------------------------------------------------------------

/// Identifies a GitHub repository in `"owner/name"` format.
///
/// Compared byte-for-byte against the `repository.full_name` field of incoming
/// deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Parses an `owner/name` identifier.
    ///
    /// Returns `None` unless the value has exactly one `/` with a non-empty,
    /// whitespace-free segment on each side.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let (owner, name) = v.split_once('/')?;
        let valid_segment =
            |s: &str| !s.is_empty() && !s.contains('/') && !s.chars().any(char::is_whitespace);
        if valid_segment(owner) && valid_segment(name) {
            Some(Self(v))
        } else {
            None
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `full_name` names this repository.
    pub fn matches(&self, full_name: &str) -> bool {
        self.0 == full_name
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// The version identifier of an upstream release, taken from `release.tag_name`.
///
/// The value is handed to the update script as its only argument and becomes
/// part of a git ref (`v<version>`), so it is restricted to ASCII alphanumerics
/// and `.`, `-`, `_`, `+`, and may not start with `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Creates a [`ReleaseVersion`], returning `None` if the value is empty,
    /// starts with `-`, or contains characters outside the permitted set.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        let permitted = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+');
        if v.is_empty() || v.starts_with('-') || !v.chars().all(permitted) {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The annotated tag created for this version: `v<version>`.
    pub fn tag_name(&self) -> String {
        format!("v{}", self.0)
    }
}

impl std::fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_id_requires_owner_and_name() {
        assert!(RepositoryId::new("org/repo").is_some());
        assert!(RepositoryId::new("org").is_none());
        assert!(RepositoryId::new("/repo").is_none());
        assert!(RepositoryId::new("org/").is_none());
        assert!(RepositoryId::new("a/b/c").is_none());
        assert!(RepositoryId::new("org/my repo").is_none());
    }

    #[test]
    fn repository_id_matches_exact_full_name() {
        let id = RepositoryId::new("braintree/braintree_ios").unwrap();
        assert!(id.matches("braintree/braintree_ios"));
        assert!(!id.matches("braintree/braintree_android"));
        assert!(!id.matches("Braintree/braintree_ios"));
    }

    #[test]
    fn release_version_accepts_common_tag_shapes() {
        for tag in ["4.2.0", "6.0.0-beta.1", "1.0.0+build.5", "2024_01"] {
            assert!(ReleaseVersion::new(tag).is_some(), "{tag} should be accepted");
        }
    }

    #[test]
    fn release_version_rejects_option_like_and_unsafe_values() {
        for tag in ["", "-rf", "4.2.0; rm", "4.2 .0", "v1/../x", "$(id)"] {
            assert!(ReleaseVersion::new(tag).is_none(), "{tag:?} should be rejected");
        }
    }

    #[test]
    fn release_version_tag_name_is_v_prefixed() {
        let v = ReleaseVersion::new("4.2.0").unwrap();
        assert_eq!(v.tag_name(), "v4.2.0");
    }

    #[test]
    fn run_ids_are_unique_v7_uuids() {
        let first = PipelineRunId::new_time_ordered();
        let second = PipelineRunId::new_time_ordered();
        assert_ne!(first, second);
        assert_eq!(first.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn string_ids_reject_empty_and_whitespace() {
        assert!(BranchName::new("main").is_some());
        assert!(BranchName::new("").is_none());
        assert!(RemoteName::new("my remote").is_none());
    }
}
