//! releasebot pipeline executor.
//!
//! [`PipelineExecutor`] turns an actionable [`pipeline::ReleaseEvent`] into a
//! [`pipeline::PipelineRun`] and drives its steps in strict order:
//!
//! 1. credential setup (`git config` URL rewrite carrying the access token)
//! 2. preflight: stop if `v<version>` is already tagged, record `HEAD`
//! 3. the external update script, called with the version
//! 4. `git add .`, `git commit`, `git tag -a`, `git push <remote> <branch> --tags`
//!
//! The first failing step ends the run; from step 3 on, a failure resets the
//! work tree to the recorded `HEAD`. Runs are mutually exclusive: the
//! working tree, index and branch head are one shared resource, so a trigger
//! arriving during a run waits for it and then runs, in arrival order.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The executor sequences commands built by
//! [`git::GitCommands`] through an injected [`pipeline::CommandRunner`]. It
//! contains no process or HTTP code of its own.

pub mod executor;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use executor::{PipelineExecutor, RunReport};
