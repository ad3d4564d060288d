//! The code quality pass applied to every rendered module.

use std::future::Future;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::QualityError;

/// Turns rendered code into its final form, or rejects it.
pub trait CodeImprover: Send + Sync + 'static {
    fn improve(&self, code: String) -> impl Future<Output = Result<String, QualityError>> + Send;
}

/// Leaves code unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl CodeImprover for Passthrough {
    async fn improve(&self, code: String) -> Result<String, QualityError> {
        Ok(code)
    }
}

/// Pipes code through an external program (for example `ruff format -`)
/// that reads the module on stdin and prints the result on stdout.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Builds the command from an argv list; `None` if it is empty.
    #[must_use]
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl CodeImprover for ExternalCommand {
    async fn improve(&self, code: String) -> Result<String, QualityError> {
        let spawn_error = |source| QualityError::Spawn {
            command: self.program.clone(),
            source,
        };

        debug!(command = %self.program, "Running code quality pass");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            spawn_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin is not available",
            ))
        })?;
        let write = async move {
            stdin.write_all(code.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(spawn_error)?;

        if !output.status.success() {
            return Err(QualityError::Rejected {
                command: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written.map_err(spawn_error)?;

        String::from_utf8(output.stdout).map_err(|_| QualityError::InvalidOutput(self.program.clone()))
    }
}
