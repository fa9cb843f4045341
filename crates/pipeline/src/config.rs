//! The process-wide service configuration.
//!
//! [`ServiceConfig`] is built once at startup from a [`ConfigInput`] (which the
//! CLI fills from flags and environment variables), validated, and then shared
//! read-only by every component. Nothing downstream reads the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::{BranchName, ConfigError, RemoteName, RepositoryId};

/// Documented placeholder for the webhook secret; never accepted.
pub const WEBHOOK_SECRET_PLACEHOLDER: &str = "your-webhook-secret";

/// Documented placeholder for the access token; never accepted.
pub const ACCESS_TOKEN_PLACEHOLDER: &str = "your-github-token";

/// Environment variable carrying the webhook secret.
pub const WEBHOOK_SECRET_VAR: &str = "GITHUB_SECRET";

/// Environment variable carrying the access token.
pub const ACCESS_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Port the listener binds when none is configured.
pub const DEFAULT_PORT: u16 = 3000;
/// Upstream repository whose releases are acted on.
pub const DEFAULT_TARGET_REPOSITORY: &str = "braintree/braintree_ios";
/// Product name used in commit messages.
pub const DEFAULT_PRODUCT_NAME: &str = "Braintree iOS SDK";
/// Update script, relative to the work tree.
pub const DEFAULT_UPDATE_SCRIPT: &str = "./update-framework.sh";
/// Remote a run pushes to.
pub const DEFAULT_REMOTE: &str = "origin";
/// Branch a run pushes.
pub const DEFAULT_BRANCH: &str = "main";
/// Time budget for the update script.
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 900;
/// Time budget for each git command.
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 120;

/// GitHub caps webhook payloads at 25 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Unvalidated input
// ---------------------------------------------------------------------------

/// Raw configuration values as collected from the environment.
///
/// Converted into a [`ServiceConfig`] by [`ServiceConfig::from_input`].
#[derive(Clone)]
pub struct ConfigInput {
    /// Socket address the listener binds.
    pub listen_addr: SocketAddr,
    /// Webhook secret; required.
    pub webhook_secret: Option<String>,
    /// Access token for pushes; required.
    pub access_token: Option<String>,
    /// Upstream repository, `owner/name`.
    pub target_repository: String,
    /// Verbose logging of ignored events and command output.
    pub debug: bool,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Work tree the update script and git run in.
    pub workdir: PathBuf,
    /// Update script, called with the version as its only argument.
    pub update_script: String,
    /// Product name used in commit messages.
    pub product_name: String,
    /// Remote to push to.
    pub remote: String,
    /// Branch to push.
    pub branch: String,
    /// Time budget for the update script.
    pub script_timeout: Duration,
    /// Time budget for each git command.
    pub git_timeout: Duration,
}

impl ConfigInput {
    /// Input carrying the given secrets and every other setting at its default.
    pub fn with_secrets(webhook_secret: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            webhook_secret: Some(webhook_secret.into()),
            access_token: Some(access_token.into()),
            target_repository: DEFAULT_TARGET_REPOSITORY.to_string(),
            debug: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            workdir: PathBuf::from("."),
            update_script: DEFAULT_UPDATE_SCRIPT.to_string(),
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            script_timeout: Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SECS),
            git_timeout: Duration::from_secs(DEFAULT_GIT_TIMEOUT_SECS),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Settings consumed by the pipeline executor.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Working tree the update script and git operate on.
    pub workdir: PathBuf,
    /// The external update procedure, invoked with the version as its only argument.
    pub update_script: String,
    /// Product name used in commit messages.
    pub product_name: String,
    /// Remote pushed to.
    pub remote: RemoteName,
    /// Branch pushed to.
    pub branch: BranchName,
    /// Time budget for the update script.
    pub script_timeout: Duration,
    /// Time budget for each git command.
    pub git_timeout: Duration,
}

/// Immutable, validated process configuration.
///
/// Secrets are wrapped in [`SecretString`] so they never reach `Debug` output.
#[derive(Debug)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds.
    pub listen_addr: SocketAddr,
    webhook_secret: SecretString,
    access_token: SecretString,
    /// Only releases of this repository are acted on.
    pub target_repository: RepositoryId,
    /// Verbose logging of ignored events and captured process output.
    pub debug: bool,
    /// Upper bound on accepted request bodies.
    pub max_body_bytes: usize,
    /// Settings for the pipeline executor.
    pub executor: ExecutorSettings,
}

impl ServiceConfig {
    /// Validates raw input.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingSecret`] if a secret is absent or empty.
    /// - [`ConfigError::PlaceholderSecret`] if a secret equals its documented placeholder.
    /// - [`ConfigError::InvalidValue`] for any other unusable setting.
    pub fn from_input(input: ConfigInput) -> Result<Self, ConfigError> {
        let webhook_secret = required_secret(
            input.webhook_secret,
            WEBHOOK_SECRET_VAR,
            WEBHOOK_SECRET_PLACEHOLDER,
        )?;
        let access_token =
            required_secret(input.access_token, ACCESS_TOKEN_VAR, ACCESS_TOKEN_PLACEHOLDER)?;

        let target_repository =
            RepositoryId::new(input.target_repository.as_str()).ok_or_else(|| {
                invalid(
                    "target repository",
                    format!("{:?} is not in owner/name form", input.target_repository),
                )
            })?;
        let remote = RemoteName::new(input.remote.as_str())
            .ok_or_else(|| invalid("git remote", format!("{:?}", input.remote)))?;
        let branch = BranchName::new(input.branch.as_str())
            .ok_or_else(|| invalid("git branch", format!("{:?}", input.branch)))?;

        if input.update_script.trim().is_empty() {
            return Err(invalid("update script", "must not be empty".to_string()));
        }
        if input.product_name.trim().is_empty() {
            return Err(invalid("product name", "must not be empty".to_string()));
        }
        if input.max_body_bytes == 0 {
            return Err(invalid("max body bytes", "must be positive".to_string()));
        }
        if input.script_timeout.is_zero() || input.git_timeout.is_zero() {
            return Err(invalid("timeout", "must be positive".to_string()));
        }

        Ok(Self {
            listen_addr: input.listen_addr,
            webhook_secret,
            access_token,
            target_repository,
            debug: input.debug,
            max_body_bytes: input.max_body_bytes,
            executor: ExecutorSettings {
                workdir: input.workdir,
                update_script: input.update_script,
                product_name: input.product_name,
                remote,
                branch,
                script_timeout: input.script_timeout,
                git_timeout: input.git_timeout,
            },
        })
    }

    /// The shared webhook secret.
    pub fn webhook_secret(&self) -> &SecretString {
        &self.webhook_secret
    }

    /// The upstream access token.
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }
}

fn required_secret(
    value: Option<String>,
    variable: &'static str,
    placeholder: &str,
) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(value.unwrap_or_default());
    let exposed = secret.expose_secret();
    if exposed.trim().is_empty() {
        return Err(ConfigError::MissingSecret { variable });
    }
    if exposed == placeholder {
        return Err(ConfigError::PlaceholderSecret { variable });
    }
    Ok(secret)
}

fn invalid(field: &'static str, message: String) -> ConfigError {
    ConfigError::InvalidValue { field, message }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
