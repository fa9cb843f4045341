//! releasebot process and git infrastructure.
//!
//! Implements the [`pipeline::CommandRunner`] port by spawning real processes
//! with `tokio::process`, and knows the exact git command lines the release
//! pipeline needs.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Process spawning, output capture, timeout enforcement
//! and git CLI details live here. The executor sees only
//! [`pipeline::CommandRunner`] and the [`CommandSpec`](pipeline::CommandSpec)
//! values built by [`GitCommands`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`process`] | [`ProcessCommandRunner`]: spawn, capture, kill on timeout |
//! | [`commands`] | [`GitCommands`]: the update-script and git command lines of one run |

pub mod commands;
pub mod process;

pub use commands::{is_existing_tag_failure, lists_tag, GitCommands, GITHUB_BASE_URL};
pub use process::ProcessCommandRunner;
