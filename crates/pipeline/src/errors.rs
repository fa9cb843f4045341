//! Error and retry-policy types for the releasebot domain.
//!
//! Each concern owns its error enum:
//!
//! - [`ConfigError`]: the process refuses to start.
//! - [`SignatureError`]: the delivery is rejected as unauthenticated.
//! - [`EventError`]: the delivery is rejected as malformed.
//! - [`CommandError`]: one external process invocation failed.
//! - [`PipelineError`]: a pipeline run failed at a named [`PipelineStep`].
//!
//! [`RetryPolicy`] is a cross-cutting concern: pipeline failures report whether
//! a later redelivery of the same release could succeed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is worth retrying and, if so, after what delay.
///
/// - `Retryable`: timeouts, non-zero exits of the update script, push rejections.
/// - `NonRetryable`: the version is already tagged; a redelivery would fail the
///   same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means the caller
        /// applies its own schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Startup configuration is invalid; the service must not start.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A required secret was not supplied or is empty.
    #[error("{variable} environment variable is required")]
    MissingSecret {
        /// Name of the environment variable that carries the secret.
        variable: &'static str,
    },

    /// A required secret still holds the documented placeholder value.
    #[error("{variable} is still set to its placeholder value")]
    PlaceholderSecret {
        /// Name of the environment variable that carries the secret.
        variable: &'static str,
    },

    /// A non-secret setting has an invalid value.
    #[error("invalid {field}: {message}")]
    InvalidValue {
        /// Name of the offending setting.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Delivery verification and decoding
// ---------------------------------------------------------------------------

/// A delivery failed signature verification.
///
/// The variants exist for logging; the HTTP layer never reports which check
/// failed beyond the status code.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// No `X-Hub-Signature-256` header was present.
    #[error("no signature provided")]
    Missing,

    /// The header is not of the form `sha256=<64 hex digits>`.
    #[error("signature header is malformed")]
    Malformed,

    /// The digest does not match the body under the shared secret.
    #[error("invalid signature")]
    Mismatch,
}

/// A verified delivery could not be decoded into a usable event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The body is not JSON or lacks required envelope fields.
    #[error("malformed event envelope: {message}")]
    Malformed {
        /// Decoder message (logged, never returned to the caller).
        message: String,
    },

    /// The event is actionable but carries no `release` object.
    #[error("release event has no release object")]
    MissingRelease,

    /// `release.tag_name` is not a usable version string.
    #[error("release tag {tag_name:?} is not a valid version")]
    InvalidVersion {
        /// The rejected tag name.
        tag_name: String,
    },
}

// ---------------------------------------------------------------------------
// External commands
// ---------------------------------------------------------------------------

/// One external process invocation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The process could not be started (missing binary, bad working directory).
    #[error("failed to start {program}: {message}")]
    Spawn {
        /// Program that was being started.
        program: String,
        /// OS error description.
        message: String,
    },

    /// The process did not finish within its time budget and was killed.
    #[error("{program} timed out after {after:?}")]
    TimedOut {
        /// Program that was killed.
        program: String,
        /// Configured time budget.
        after: Duration,
    },

    /// The process exited unsuccessfully.
    #[error("{program} exited with status {}", display_status(.status))]
    Failed {
        /// Program that failed.
        program: String,
        /// Exit code, or `None` if the process was terminated by a signal.
        status: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
}

fn display_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

impl CommandError {
    /// Captured standard error, if the process ran to completion.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// The steps of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Rewrite GitHub URLs so remote operations carry the access token.
    CredentialSetup,
    /// Check for an existing release tag and record the starting `HEAD`.
    Preflight,
    /// Run the external update script with the version argument.
    UpdateScript,
    /// `git add .`
    Stage,
    /// `git commit`
    Commit,
    /// `git tag -a`
    Tag,
    /// `git push <remote> <branch> --tags`
    Push,
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CredentialSetup => "credential setup",
            Self::Preflight => "preflight",
            Self::UpdateScript => "update script",
            Self::Stage => "stage",
            Self::Commit => "commit",
            Self::Tag => "tag",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// A pipeline run failed; the remaining steps were not attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A step's command failed.
    #[error("{step} step failed: {source}")]
    StepFailed {
        /// The step that failed.
        step: PipelineStep,
        /// The underlying command failure.
        #[source]
        source: CommandError,
    },

    /// The tag for this version already exists: the release was applied by an
    /// earlier run and this delivery is a redelivery.
    #[error("tag {tag} already exists")]
    TagAlreadyExists {
        /// The existing tag name.
        tag: String,
        /// Where the existing tag was noticed: [`PipelineStep::Preflight`]
        /// normally, [`PipelineStep::Tag`] if it appeared mid-run.
        step: PipelineStep,
    },
}

impl PipelineError {
    /// The step at which the run stopped.
    pub fn step(&self) -> PipelineStep {
        match self {
            Self::StepFailed { step, .. } | Self::TagAlreadyExists { step, .. } => *step,
        }
    }

    /// The underlying command failure, if a command failed.
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            Self::StepFailed { source, .. } => Some(source),
            Self::TagAlreadyExists { .. } => None,
        }
    }

    /// Whether a redelivery of the same release could succeed.
    ///
    /// An existing tag never goes away on its own, so it is not retryable.
    /// The run is still reported as a failed delivery and logged at `warn`.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::TagAlreadyExists { .. } => RetryPolicy::NonRetryable,
            Self::StepFailed { .. } => RetryPolicy::Retryable { after: None },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
