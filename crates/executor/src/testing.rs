//! In-memory [`CommandRunner`] for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{CommandArg, CommandError, CommandOutput, CommandRunner, CommandSpec};

/// Records every command instead of running it.
///
/// Commands are recorded as a single line, `program arg1 arg2 ...`, with
/// secrets exposed. A command whose line starts with a registered prefix fails
/// once with the registered error. Successful commands print `ran <program>`
/// unless a canned standard output was registered for them. The runner also tracks how many commands were in
/// flight at once, which tests use to detect overlapping runs.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, CommandError)>>,
    responses: Mutex<Vec<(String, String)>>,
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingRunner {
    /// Creates a runner where every command succeeds immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every command take `delay` before completing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes the next command whose line starts with `prefix` fail with `error`.
    pub fn failing_on(self, prefix: &str, error: CommandError) -> Self {
        self.fail_next(prefix, error);
        self
    }

    /// Registers a failure after construction; the first matching command consumes it.
    pub fn fail_next(&self, prefix: &str, error: CommandError) {
        lock(&self.failures).push((prefix.to_string(), error));
    }

    /// Makes every successful command whose line starts with `prefix` print `stdout`.
    pub fn responding(self, prefix: &str, stdout: &str) -> Self {
        self.respond(prefix, stdout);
        self
    }

    /// Registers a canned standard output after construction.
    pub fn respond(&self, prefix: &str, stdout: &str) {
        lock(&self.responses).push((prefix.to_string(), stdout.to_string()));
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// The largest number of commands observed in flight at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Builds the `Failed` error git prints for an existing tag.
    pub fn tag_exists(tag: &str) -> CommandError {
        CommandError::Failed {
            program: "git".to_string(),
            status: Some(128),
            stdout: String::new(),
            stderr: format!("fatal: tag '{tag}' already exists\n"),
        }
    }

    /// Builds a plain non-zero exit error.
    pub fn exit_failure(program: &str, code: i32) -> CommandError {
        CommandError::Failed {
            program: program.to_string(),
            status: Some(code),
            stdout: String::new(),
            stderr: "simulated failure\n".to_string(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn render(spec: &CommandSpec) -> String {
    std::iter::once(spec.program())
        .chain(spec.args().iter().map(CommandArg::expose))
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let line = render(spec);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        lock(&self.calls).push(line.clone());
        let failure = {
            let mut failures = lock(&self.failures);
            failures
                .iter()
                .position(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|index| failures.remove(index).1)
        };
        self.active.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = failure {
            return Err(error);
        }
        let stdout = lock(&self.responses)
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map_or_else(|| format!("ran {}", spec.program()), |(_, stdout)| stdout.clone());
        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
        })
    }
}
