//! Serialized execution of release pipeline runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use git::{is_existing_tag_failure, lists_tag, GitCommands};
use pipeline::{
    CommandOutput, CommandRunner, CommandSpec, PipelineError, PipelineRun, PipelineRunId,
    PipelineStep, ReleaseEvent, ReleaseVersion, RetryPolicy, ServiceConfig, Timestamp,
};
use tokio::sync::Mutex;
use tracing::Instrument;

/// Summary of a successful run, returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Identifier of the run.
    pub run_id: PipelineRunId,
    /// Version that was published.
    pub version: ReleaseVersion,
    /// When the delivery was accepted for execution.
    pub accepted_at: Timestamp,
    /// Time spent waiting for an earlier run to finish.
    pub queued_for: Duration,
    /// Time spent executing the steps.
    pub duration: Duration,
}

/// Runs the release pipeline, at most one run at a time.
///
/// Concurrent callers queue on a fair mutex and are served in arrival order.
/// The lock guard lives only for the duration of one run, so a failed or
/// timed-out run never blocks the next one.
///
/// A run first checks that the release tag does not exist yet and records
/// `HEAD`. Once the update script has started, any failure resets the work
/// tree to that revision, so a failed or repeated delivery never leaves a
/// commit behind for the next push.
pub struct PipelineExecutor {
    config: Arc<ServiceConfig>,
    runner: Arc<dyn CommandRunner>,
    run_lock: Mutex<()>,
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("settings", &self.config.executor)
            .finish_non_exhaustive()
    }
}

impl PipelineExecutor {
    /// Creates an executor that runs its commands through `runner`.
    pub fn new(config: Arc<ServiceConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            run_lock: Mutex::new(()),
        }
    }

    /// Executes one pipeline run for `event`.
    ///
    /// Waits for any active run to finish first.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] naming the first step that failed; later steps
    /// are not attempted.
    pub async fn execute(&self, event: ReleaseEvent) -> Result<RunReport, PipelineError> {
        let run = PipelineRun::from_event(event);
        let span = tracing::info_span!("pipeline_run", run_id = %run.id, version = %run.version);

        async move {
            let waiting = Instant::now();
            let _guard = self.run_lock.lock().await;
            let queued_for = waiting.elapsed();
            tracing::info!(
                assets = run.assets.len(),
                accepted_at = %run.accepted_at,
                queued_for = ?queued_for,
                "pipeline run started"
            );

            let started = Instant::now();
            let result = self.run_steps(&run).await;
            let duration = started.elapsed();

            match &result {
                Ok(()) => tracing::info!(?duration, "pipeline run succeeded"),
                Err(err) => match err.retry_policy() {
                    RetryPolicy::NonRetryable => tracing::warn!(
                        error = %err,
                        step = %err.step(),
                        "pipeline run stopped; version already published"
                    ),
                    RetryPolicy::Retryable { .. } => tracing::error!(
                        error = %err,
                        step = %err.step(),
                        "pipeline run failed"
                    ),
                },
            }

            result.map(|()| RunReport {
                run_id: run.id,
                version: run.version.clone(),
                accepted_at: run.accepted_at,
                queued_for,
                duration,
            })
        }
        .instrument(span)
        .await
    }

    async fn run_steps(&self, run: &PipelineRun) -> Result<(), PipelineError> {
        let commands = GitCommands::new(&self.config.executor);

        self.step(
            PipelineStep::CredentialSetup,
            commands.credential_rewrite(self.config.access_token()),
        )
        .await?;

        let tag = run.version.tag_name();
        let listed = self.step(PipelineStep::Preflight, commands.list_tag(run)).await?;
        if lists_tag(&listed.stdout, &tag) {
            return Err(PipelineError::TagAlreadyExists {
                tag,
                step: PipelineStep::Preflight,
            });
        }
        let head = self
            .step(PipelineStep::Preflight, commands.head_revision())
            .await?;
        let start = head.stdout.trim();

        let result = self.apply(&commands, run).await;
        if let Err(err) = &result {
            self.roll_back(&commands, run, start, err).await;
        }
        result
    }

    /// The steps that change the work tree, its history or the remote.
    async fn apply(&self, commands: &GitCommands<'_>, run: &PipelineRun) -> Result<(), PipelineError> {
        self.step(PipelineStep::UpdateScript, commands.update_script(run))
            .await?;
        self.step(PipelineStep::Stage, commands.stage_all()).await?;
        self.step(PipelineStep::Commit, commands.commit(run)).await?;
        self.step(PipelineStep::Tag, commands.annotated_tag(run))
            .await
            .map_err(|err| match err {
                PipelineError::StepFailed { source, .. } if is_existing_tag_failure(&source) => {
                    PipelineError::TagAlreadyExists {
                        tag: run.version.tag_name(),
                        step: PipelineStep::Tag,
                    }
                }
                other => other,
            })?;
        self.step(PipelineStep::Push, commands.push()).await?;

        Ok(())
    }

    /// Restores the work tree to `start` after a failed step.
    ///
    /// The release tag is deleted only when this run created it, that is when
    /// the push failed. Rollback failures are logged; the original error stands.
    async fn roll_back(
        &self,
        commands: &GitCommands<'_>,
        run: &PipelineRun,
        start: &str,
        err: &PipelineError,
    ) {
        tracing::warn!(revision = %start, failed_step = %err.step(), "restoring work tree");

        let mut specs = Vec::with_capacity(3);
        if err.step() == PipelineStep::Push {
            specs.push(commands.delete_tag(run));
        }
        specs.push(commands.reset_hard(start));
        specs.push(commands.clean());

        for spec in specs {
            if let Err(rollback_err) = self.runner.run(&spec).await {
                tracing::error!(command = %spec, error = %rollback_err, "rollback command failed");
            }
        }
    }

    async fn step(
        &self,
        step: PipelineStep,
        spec: CommandSpec,
    ) -> Result<CommandOutput, PipelineError> {
        tracing::debug!(%step, command = %spec, "running step");

        match self.runner.run(&spec).await {
            Ok(output) => {
                if self.config.debug {
                    tracing::info!(%step, stdout = %output.stdout.trim_end(), "step output");
                }
                Ok(output)
            }
            Err(source) => {
                if let Some(stderr) = source.stderr() {
                    tracing::error!(%step, stderr = %stderr.trim_end(), "step stderr");
                }
                Err(PipelineError::StepFailed { step, source })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
