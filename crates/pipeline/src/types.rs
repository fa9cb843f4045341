//! Shared value types for the releasebot domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the data that flows through one delivery: the raw [`WebhookDelivery`], the
//! decoded [`ReleaseEvent`], and the [`PipelineRun`] created from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PipelineRunId, ReleaseVersion};

// ---------------------------------------------------------------------------
// Deliveries and events
// ---------------------------------------------------------------------------

/// One inbound webhook request, borrowed from the HTTP layer.
///
/// Scoped to a single request; nothing in it outlives the response.
#[derive(Debug, Clone, Copy)]
pub struct WebhookDelivery<'a> {
    /// Raw request body. Signatures are computed over these exact bytes.
    pub body: &'a [u8],
    /// Value of the `X-Hub-Signature-256` header, if present.
    pub signature: Option<&'a str>,
    /// Value of the `X-GitHub-Event` header, if present.
    pub event_type: Option<&'a str>,
}

// ---------------------------------------------------------------------------

/// A downloadable asset attached to a release.
///
/// Passed through to the pipeline unexamined; the update script fetches the
/// artifacts itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    /// File name of the asset (e.g. `"Braintree.xcframework.zip"`).
    #[serde(default)]
    pub name: String,

    /// Public download URL of the asset.
    #[serde(default)]
    pub browser_download_url: String,
}

// ---------------------------------------------------------------------------

/// An actionable "release published" event for the configured repository.
///
/// Only produced by [`crate::filter_delivery`] after the predicate has matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEvent {
    /// `repository.full_name` of the delivery.
    pub repository: String,
    /// The `action` field (always `"published"` for actionable events).
    pub action: String,
    /// The release tag, validated as a version string.
    pub version: ReleaseVersion,
    /// The release assets, in the order the platform listed them.
    pub assets: Vec<ReleaseAsset>,
}

// ---------------------------------------------------------------------------
// Pipeline runs
// ---------------------------------------------------------------------------

/// One execution of the update → commit → tag → push sequence.
///
/// Created when an actionable event is accepted and dropped when the executor
/// returns its result.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    /// Time-ordered identifier used to correlate log output.
    pub id: PipelineRunId,
    /// The version being published.
    pub version: ReleaseVersion,
    /// The assets attached to the upstream release.
    pub assets: Vec<ReleaseAsset>,
    /// When the run was accepted.
    pub accepted_at: Timestamp,
}

impl PipelineRun {
    /// Creates a run for an accepted release event.
    pub fn from_event(event: ReleaseEvent) -> Self {
        Self {
            id: PipelineRunId::new_time_ordered(),
            version: event.version,
            assets: event.assets,
            accepted_at: Timestamp::now(),
        }
    }

    /// Commit message for this run: `Update to <product> <version>`.
    pub fn commit_message(&self, product_name: &str) -> String {
        format!("Update to {} {}", product_name, self.version)
    }

    /// Annotation message for the release tag: `Version <version>`.
    pub fn tag_message(&self) -> String {
        format!("Version {}", self.version)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
