//! Command-line and environment configuration.
//!
//! Every flag has an environment-variable twin, so the service can be
//! configured entirely from its environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use pipeline::config::{
    ConfigInput, DEFAULT_BRANCH, DEFAULT_GIT_TIMEOUT_SECS, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT,
    DEFAULT_PRODUCT_NAME, DEFAULT_REMOTE, DEFAULT_SCRIPT_TIMEOUT_SECS, DEFAULT_TARGET_REPOSITORY,
    DEFAULT_UPDATE_SCRIPT,
};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Listens for GitHub release webhooks and publishes the matching package update.
#[derive(Parser)]
#[command(name = "releasebot", version, about)]
pub struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Shared secret used to verify webhook signatures.
    #[arg(long, env = "GITHUB_SECRET", hide_env_values = true)]
    pub github_secret: Option<String>,

    /// Access token used to push to the package repository.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Upstream repository (`owner/name`) whose releases trigger an update.
    #[arg(long, env = "BRAINTREE_REPO", default_value = DEFAULT_TARGET_REPOSITORY)]
    pub target_repo: String,

    /// Verbose logging, including ignored events and command output.
    #[arg(
        long,
        env = "DEBUG",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,

    /// Product name used in commit messages.
    #[arg(long, env = "PRODUCT_NAME", default_value = DEFAULT_PRODUCT_NAME)]
    pub product_name: String,

    /// Working tree the update script and git operate on.
    #[arg(long, env = "RELEASEBOT_WORKDIR", default_value = ".")]
    pub workdir: PathBuf,

    /// Update script, called with the release version as its only argument.
    #[arg(long, env = "UPDATE_SCRIPT", default_value = DEFAULT_UPDATE_SCRIPT)]
    pub update_script: String,

    /// Git remote to push to.
    #[arg(long, env = "GIT_REMOTE", default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Branch to push.
    #[arg(long, env = "GIT_BRANCH", default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Seconds the update script may run before it is killed.
    #[arg(long, env = "UPDATE_SCRIPT_TIMEOUT_SECS", default_value_t = DEFAULT_SCRIPT_TIMEOUT_SECS)]
    pub script_timeout_secs: u64,

    /// Seconds each git command may run before it is killed.
    #[arg(long, env = "GIT_TIMEOUT_SECS", default_value_t = DEFAULT_GIT_TIMEOUT_SECS)]
    pub git_timeout_secs: u64,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP/gRPC collector endpoint; spans are exported when set.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Args {
    /// Converts the parsed arguments into unvalidated domain configuration.
    pub fn into_config_input(self) -> ConfigInput {
        ConfigInput {
            listen_addr: SocketAddr::new(self.host, self.port),
            webhook_secret: self.github_secret,
            access_token: self.github_token,
            target_repository: self.target_repo,
            debug: self.debug,
            max_body_bytes: self.max_body_bytes,
            workdir: self.workdir,
            update_script: self.update_script,
            product_name: self.product_name,
            remote: self.remote,
            branch: self.branch,
            script_timeout: Duration::from_secs(self.script_timeout_secs),
            git_timeout: Duration::from_secs(self.git_timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
