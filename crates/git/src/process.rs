//! Process-backed [`CommandRunner`].

use std::process::Stdio;

use async_trait::async_trait;
use pipeline::{CommandArg, CommandError, CommandOutput, CommandRunner, CommandSpec};

/// Runs commands as child processes of the service.
///
/// Standard input is closed, standard output and error are captured. A process
/// that outlives its [`CommandSpec::timeout`] is killed and reported as
/// [`CommandError::TimedOut`].
#[derive(Debug, Clone, Default)]
pub struct ProcessCommandRunner;

impl ProcessCommandRunner {
    /// Creates a runner.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let program = spec.program().to_string();
        tracing::debug!(command = %spec, dir = %spec.current_dir().display(), "spawning command");

        let child = tokio::process::Command::new(spec.program())
            .args(spec.args().iter().map(CommandArg::expose))
            .current_dir(spec.current_dir())
            // Never block on an interactive credential prompt.
            .env("GIT_TERMINAL_PROMPT", "0")
            // Untranslated messages; existing-tag detection matches on them.
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(spec.timeout(), child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| CommandError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?,
            Err(_) => {
                tracing::warn!(command = %spec, after = ?spec.timeout(), "command timed out; killed");
                return Err(CommandError::TimedOut {
                    program,
                    after: spec.timeout(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(CommandError::Failed {
                program,
                status: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn sh(script: &str, timeout: Duration) -> CommandSpec {
        CommandSpec::new("sh", std::env::temp_dir(), timeout)
            .arg("-c")
            .arg(script)
    }

    #[tokio::test]
    async fn captures_stdout_of_successful_command() {
        let output = ProcessCommandRunner::new()
            .run(&sh("echo hello; echo oops >&2", Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_failure_with_captured_output() {
        let err = ProcessCommandRunner::new()
            .run(&sh("echo partial; echo broken >&2; exit 3", Duration::from_secs(10)))
            .await
            .unwrap_err();
        match err {
            CommandError::Failed { program, status, stdout, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(status, Some(3));
                assert_eq!(stdout.trim(), "partial");
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let spec = CommandSpec::new(
            "releasebot-no-such-program",
            std::env::temp_dir(),
            Duration::from_secs(1),
        );
        let err = ProcessCommandRunner::new().run(&spec).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn slow_command_times_out_promptly() {
        let started = Instant::now();
        let err = ProcessCommandRunner::new()
            .run(&sh("sleep 30", Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn runs_under_the_c_locale() {
        let output = ProcessCommandRunner::new()
            .run(&sh("echo $LC_ALL", Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "C");
    }

    #[tokio::test]
    async fn real_git_reports_an_existing_tag_recognisably() {
        let repo = tempfile::tempdir().unwrap();
        let git = |args: &[&str]| {
            let spec = CommandSpec::new("git", repo.path(), Duration::from_secs(30))
                .arg("-c")
                .arg("user.name=releasebot")
                .arg("-c")
                .arg("user.email=releasebot@example.invalid");
            args.iter().fold(spec, |spec, arg| spec.arg(*arg))
        };
        let runner = ProcessCommandRunner::new();

        runner.run(&git(&["init", "-q"])).await.unwrap();
        runner
            .run(&git(&["commit", "-q", "--allow-empty", "-m", "initial"]))
            .await
            .unwrap();
        runner
            .run(&git(&["tag", "-a", "v4.2.0", "-m", "Version 4.2.0"]))
            .await
            .unwrap();

        let listed = runner.run(&git(&["tag", "--list", "v4.2.0"])).await.unwrap();
        assert!(crate::lists_tag(&listed.stdout, "v4.2.0"));

        let err = runner
            .run(&git(&["tag", "-a", "v4.2.0", "-m", "Version 4.2.0"]))
            .await
            .unwrap_err();
        assert!(crate::is_existing_tag_failure(&err), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn arguments_are_not_shell_interpreted() {
        let spec = CommandSpec::new("echo", std::env::temp_dir(), Duration::from_secs(10))
            .arg("4.2.0; exit 1");
        let output = ProcessCommandRunner::new().run(&spec).await.unwrap();
        assert_eq!(output.stdout.trim(), "4.2.0; exit 1");
    }
}
