//! Event envelope decoding and the "release published" predicate.
//!
//! A verified delivery is decoded into a minimal envelope and then classified:
//! it is actionable only when the event type is `release`, the action is
//! `published`, and the repository is the configured target. Everything else
//! is acknowledged and ignored, so the platform does not treat it as a failed
//! delivery.

use serde::Deserialize;

use crate::{EventError, ReleaseAsset, ReleaseEvent, ReleaseVersion, RepositoryId};

/// The `X-GitHub-Event` value of release events.
pub const RELEASE_EVENT_TYPE: &str = "release";

/// The `action` value of a newly published release.
pub const PUBLISHED_ACTION: &str = "published";

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    action: Option<String>,
    repository: RepositoryRef,
    #[serde(default)]
    release: Option<ReleasePayload>,
}

#[derive(Debug, Deserialize)]
struct RepositoryRef {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct ReleasePayload {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a well-formed delivery was not acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event type header was absent or not `release`.
    EventType {
        /// The received header value.
        event_type: Option<String>,
    },
    /// The delivery concerns a different repository.
    Repository {
        /// The received `repository.full_name`.
        full_name: String,
    },
    /// The release action was not `published` (e.g. `created`, `edited`).
    Action {
        /// The received `action` value.
        action: Option<String>,
    },
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventType { event_type } => {
                write!(f, "event type {}", event_type.as_deref().unwrap_or("<none>"))
            }
            Self::Repository { full_name } => write!(f, "repository {full_name}"),
            Self::Action { action } => {
                write!(f, "action {}", action.as_deref().unwrap_or("<none>"))
            }
        }
    }
}

/// Result of filtering a decoded delivery. Ignoring is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The delivery announces a newly published release of the target repository.
    Actionable(ReleaseEvent),
    /// The delivery is valid but not actionable.
    Ignored(IgnoreReason),
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Decodes a verified body and applies the release-published predicate.
///
/// The body must already have passed signature verification.
///
/// # Errors
///
/// - [`EventError::Malformed`] when the body is not a JSON object with
///   `repository.full_name`, or when an actionable release lacks `tag_name`.
/// - [`EventError::MissingRelease`] when an actionable event has no `release`.
/// - [`EventError::InvalidVersion`] when the tag is not a usable version.
pub fn filter_delivery(
    body: &[u8],
    event_type: Option<&str>,
    target: &RepositoryId,
) -> Result<FilterOutcome, EventError> {
    let envelope: Envelope = serde_json::from_slice(body).map_err(|e| EventError::Malformed {
        message: e.to_string(),
    })?;

    if event_type != Some(RELEASE_EVENT_TYPE) {
        return Ok(FilterOutcome::Ignored(IgnoreReason::EventType {
            event_type: event_type.map(str::to_string),
        }));
    }
    if !target.matches(&envelope.repository.full_name) {
        return Ok(FilterOutcome::Ignored(IgnoreReason::Repository {
            full_name: envelope.repository.full_name,
        }));
    }
    if envelope.action.as_deref() != Some(PUBLISHED_ACTION) {
        return Ok(FilterOutcome::Ignored(IgnoreReason::Action {
            action: envelope.action,
        }));
    }

    let release = envelope.release.ok_or(EventError::MissingRelease)?;
    let tag_name = release.tag_name.ok_or_else(|| EventError::Malformed {
        message: "release.tag_name is missing".to_string(),
    })?;
    let version = ReleaseVersion::new(tag_name.as_str())
        .ok_or(EventError::InvalidVersion { tag_name })?;

    Ok(FilterOutcome::Actionable(ReleaseEvent {
        repository: envelope.repository.full_name,
        action: PUBLISHED_ACTION.to_string(),
        version,
        assets: release.assets,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
