//! External tools the release run shells out to.

use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info, warn};

/// External tool errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("{program} exited with {}: {stderr}", .code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Result type for external tool runs.
pub type ToolResult<T> = Result<T, ToolError>;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExternalCommand {
    /// Creates a new command.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Runs the command in `workdir` with extra environment variables and
    /// waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started or exits non-zero.
    pub fn run(&self, workdir: &Path, env: &[(&str, &str)]) -> ToolResult<CommandOutput> {
        info!(program = %self.program, args = ?self.args, "running command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .envs(env.iter().copied())
            .current_dir(workdir)
            .output()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            warn!(
                program = %self.program,
                code = ?output.status.code(),
                stderr = %result.stderr,
                "command failed"
            );
            return Err(ToolError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: result.stderr,
            });
        }

        debug!(program = %self.program, stdout = %result.stdout, "command finished");
        Ok(result)
    }
}

/// Secrets handed to the release builder through its environment.
#[derive(Clone, PartialEq, Eq)]
pub struct BuildSecrets {
    pub token: String,
    pub fingerprint: String,
}

impl std::fmt::Debug for BuildSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildSecrets")
            .field("token", &"<redacted>")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Builds and publishes release artifacts.
pub trait ReleaseBuilder {
    /// Directory the builder writes artifacts to, relative to the work directory.
    fn output_dir(&self) -> &Path;

    /// Runs the build.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder fails.
    fn build(&self, workdir: &Path, secrets: &BuildSecrets) -> ToolResult<CommandOutput>;
}

/// Brings dependency manifests in line before the release commit.
pub trait DependencyTidy {
    /// Runs the tidy step.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool fails.
    fn tidy(&self, workdir: &Path) -> ToolResult<CommandOutput>;
}

/// [`ReleaseBuilder`] that runs an external command such as `goreleaser`.
#[derive(Debug, Clone)]
pub struct CommandReleaseBuilder {
    command: ExternalCommand,
    output_dir: std::path::PathBuf,
    token_env: String,
    fingerprint_env: String,
}

impl CommandReleaseBuilder {
    /// Creates a builder around `command`, writing to `output_dir`.
    #[must_use]
    pub fn new(command: ExternalCommand, output_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            command,
            output_dir: output_dir.into(),
            token_env: "GITHUB_TOKEN".to_string(),
            fingerprint_env: "GPG_FINGERPRINT".to_string(),
        }
    }

    /// Sets the environment variable names for the token and fingerprint.
    #[must_use]
    pub fn with_env_names(
        mut self,
        token_env: impl Into<String>,
        fingerprint_env: impl Into<String>,
    ) -> Self {
        self.token_env = token_env.into();
        self.fingerprint_env = fingerprint_env.into();
        self
    }
}

impl ReleaseBuilder for CommandReleaseBuilder {
    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn build(&self, workdir: &Path, secrets: &BuildSecrets) -> ToolResult<CommandOutput> {
        self.command.run(
            workdir,
            &[
                (self.token_env.as_str(), secrets.token.as_str()),
                (self.fingerprint_env.as_str(), secrets.fingerprint.as_str()),
            ],
        )
    }
}

/// [`DependencyTidy`] that runs an external command such as `go mod tidy`.
#[derive(Debug, Clone)]
pub struct CommandTidy {
    command: ExternalCommand,
}

impl CommandTidy {
    /// Creates a tidy step around `command`.
    #[must_use]
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

impl DependencyTidy for CommandTidy {
    fn tidy(&self, workdir: &Path) -> ToolResult<CommandOutput> {
        self.command.run(workdir, &[])
    }
}
