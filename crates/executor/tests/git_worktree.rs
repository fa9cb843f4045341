//! Pipeline runs against real git repositories: a work tree pushing to a bare
//! `origin`, with the update script as a small shell script.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use executor::PipelineExecutor;
use git::ProcessCommandRunner;
use pipeline::{ConfigInput, PipelineError, PipelineStep, ReleaseEvent, ReleaseVersion, ServiceConfig};
use tempfile::TempDir;

const IDEMPOTENT_SCRIPT: &str = r#"echo "$1" > VERSION"#;

// Output differs on every call, like a build that embeds a timestamp.
const CHANGING_SCRIPT: &str = r#"n=$(cat ../counter 2>/dev/null || echo 0)
n=$((n + 1))
echo "$n" > ../counter
echo "$1 build $n" > VERSION"#;

fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("LC_ALL", "C")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

struct Fixture {
    root: TempDir,
    work: PathBuf,
    origin: PathBuf,
    executor: PipelineExecutor,
}

impl Fixture {
    fn new(script_body: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let origin = root.path().join("origin.git");
        let work = root.path().join("work");
        std::fs::create_dir(&origin).unwrap();
        std::fs::create_dir(&work).unwrap();

        run_git(&origin, &["init", "-q", "--bare"]);
        run_git(&work, &["init", "-q"]);
        run_git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(&work, &["config", "user.name", "releasebot"]);
        run_git(&work, &["config", "user.email", "releasebot@example.invalid"]);
        run_git(&work, &["config", "commit.gpgsign", "false"]);
        run_git(&work, &["config", "tag.gpgsign", "false"]);
        std::fs::write(work.join("README"), "package\n").unwrap();
        run_git(&work, &["add", "."]);
        run_git(&work, &["commit", "-q", "-m", "initial"]);
        run_git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);
        run_git(&work, &["push", "-q", "origin", "main"]);

        let script = root.path().join("update.sh");
        std::fs::write(&script, format!("#!/bin/sh\nset -e\n{script_body}\n")).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut input = ConfigInput::with_secrets("webhook-secret", "ghp_worktree");
        input.workdir = work.clone();
        input.update_script = script.to_string_lossy().into_owned();
        let config = Arc::new(ServiceConfig::from_input(input).unwrap());
        let executor = PipelineExecutor::new(config, Arc::new(ProcessCommandRunner::new()));

        Self {
            root,
            work,
            origin,
            executor,
        }
    }

    async fn publish(&self, version: &str) -> Result<(), PipelineError> {
        self.executor
            .execute(ReleaseEvent {
                repository: "braintree/braintree_ios".into(),
                action: "published".into(),
                version: ReleaseVersion::new(version).unwrap(),
                assets: Vec::new(),
            })
            .await
            .map(|_| ())
    }

    fn pushed_subjects(&self) -> Vec<String> {
        run_git(&self.origin, &["log", "--format=%s", "main"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn work_tree_status(&self) -> String {
        run_git(&self.work, &["status", "--porcelain"])
    }
}

fn already_published(version: &str) -> PipelineError {
    PipelineError::TagAlreadyExists {
        tag: format!("v{version}"),
        step: PipelineStep::Preflight,
    }
}

#[tokio::test]
async fn redelivery_with_identical_script_output_is_refused_cleanly() {
    let fixture = Fixture::new(IDEMPOTENT_SCRIPT);

    fixture.publish("4.2.0").await.unwrap();
    let err = fixture.publish("4.2.0").await.unwrap_err();

    assert_eq!(err, already_published("4.2.0"));
    assert_eq!(
        fixture.pushed_subjects(),
        ["Update to Braintree iOS SDK 4.2.0", "initial"]
    );
    assert_eq!(fixture.work_tree_status(), "");
}

#[tokio::test]
async fn redelivery_with_changing_script_output_adds_no_commit() {
    let fixture = Fixture::new(CHANGING_SCRIPT);

    fixture.publish("4.2.0").await.unwrap();
    let err = fixture.publish("4.2.0").await.unwrap_err();
    assert_eq!(err, already_published("4.2.0"));

    // The script never ran for the redelivery.
    let counter = std::fs::read_to_string(fixture.root.path().join("counter")).unwrap();
    assert_eq!(counter.trim(), "1");

    fixture.publish("4.3.0").await.unwrap();
    assert_eq!(
        fixture.pushed_subjects(),
        [
            "Update to Braintree iOS SDK 4.3.0",
            "Update to Braintree iOS SDK 4.2.0",
            "initial",
        ]
    );
    assert_eq!(run_git(&fixture.origin, &["tag", "--list"]), "v4.2.0\nv4.3.0\n");
}

#[tokio::test]
async fn failed_push_leaves_no_local_commit_or_tag() {
    let fixture = Fixture::new(IDEMPOTENT_SCRIPT);
    let start = run_git(&fixture.work, &["rev-parse", "HEAD"]);
    let origin_url = fixture.origin.to_str().unwrap().to_string();
    let missing = fixture.root.path().join("missing.git");
    run_git(&fixture.work, &["remote", "set-url", "origin", missing.to_str().unwrap()]);

    let err = fixture.publish("4.2.0").await.unwrap_err();
    assert_eq!(err.step(), PipelineStep::Push);
    assert_eq!(run_git(&fixture.work, &["rev-parse", "HEAD"]), start);
    assert_eq!(run_git(&fixture.work, &["tag", "--list"]), "");
    assert_eq!(fixture.work_tree_status(), "");

    // Once the remote is reachable again the same release goes through once.
    run_git(&fixture.work, &["remote", "set-url", "origin", &origin_url]);
    fixture.publish("4.2.0").await.unwrap();
    assert_eq!(
        fixture.pushed_subjects(),
        ["Update to Braintree iOS SDK 4.2.0", "initial"]
    );
}

#[tokio::test]
async fn failing_script_leaves_work_tree_untouched() {
    let fixture = Fixture::new("echo partial > VERSION\necho junk > notes.txt\nexit 3");

    let err = fixture.publish("4.2.0").await.unwrap_err();

    assert_eq!(err.step(), PipelineStep::UpdateScript);
    assert_eq!(fixture.work_tree_status(), "");
    assert_eq!(fixture.pushed_subjects(), ["initial"]);
}
