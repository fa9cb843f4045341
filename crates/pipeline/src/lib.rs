//! Core release-automation domain for releasebot.
//!
//! This crate contains every domain concept, newtype identifier, value type and
//! error type used throughout the service: the immutable [`ServiceConfig`], the
//! webhook [`signature`] verifier, the release [`event`] filter, and the
//! [`CommandRunner`] port through which the executor reaches external
//! processes.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no network or
//! process I/O. It defines *what* is needed; infrastructure crates (`git`,
//! `listener`) define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryId`, `ReleaseVersion`, `PipelineRunId`, etc.) |
//! | [`types`] | Shared value types (`ReleaseEvent`, `PipelineRun`, `Timestamp`, etc.) |
//! | [`config`] | The validated, process-wide [`ServiceConfig`] |
//! | [`signature`] | HMAC-SHA256 delivery verification |
//! | [`event`] | Envelope decoding and the "release published" predicate |
//! | [`runner`] | The [`CommandRunner`] port and command value types |
//! | [`errors`] | Error taxonomy and retry-policy types |

pub mod config;
pub mod errors;
pub mod event;
pub mod identifiers;
pub mod runner;
pub mod signature;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{ConfigInput, ExecutorSettings, ServiceConfig};
pub use errors::{
    CommandError, ConfigError, EventError, PipelineError, PipelineStep, RetryPolicy,
    SignatureError,
};
pub use event::{filter_delivery, FilterOutcome, IgnoreReason, RELEASE_EVENT_TYPE};
pub use identifiers::{BranchName, PipelineRunId, ReleaseVersion, RemoteName, RepositoryId};
pub use runner::{CommandArg, CommandOutput, CommandRunner, CommandSpec};
pub use signature::{sign, verify_signature, SIGNATURE_PREFIX};
pub use types::{PipelineRun, ReleaseAsset, ReleaseEvent, Timestamp, WebhookDelivery};
