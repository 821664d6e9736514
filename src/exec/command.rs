// src/exec/command.rs

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{LeadtimeError, Result};
use crate::exec::backend::{ProcessJob, ProcessingBackend};
use crate::types::RUN_TIME_FORMAT;

/// Runs an external command per job.
///
/// The command line goes through `sh -c` with the input keys as positional
/// arguments (`$1..$n`). The job is also described in the environment:
/// `LEADTIME_RUN_TIME`, `LEADTIME_STEP`, `LEADTIME_INPUT_KEYS` (space
/// separated) and `LEADTIME_OUTPUT_KEY`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    cmd: String,
    timeout: Option<Duration>,
}

impl CommandBackend {
    pub fn new(cmd: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            cmd: cmd.into(),
            timeout,
        }
    }

    fn build(&self, job: &ProcessJob) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            // `$0` is the script name; inputs start at `$1`.
            c.arg("-c").arg(&self.cmd).arg("leadtime");
            c
        };

        cmd.args(job.input_keys())
            .env("LEADTIME_RUN_TIME", job.run_time.format(RUN_TIME_FORMAT).to_string())
            .env("LEADTIME_STEP", job.step.to_string())
            .env("LEADTIME_INPUT_KEYS", job.input_keys().join(" "))
            .env("LEADTIME_OUTPUT_KEY", &job.output_key)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, job: &ProcessJob) -> Result<()> {
        let failed = |reason: String| LeadtimeError::ProcessingFailed {
            step: job.step,
            reason,
        };

        info!(
            run_time = %job.run_time,
            step = job.step,
            output_key = %job.output_key,
            cmd = %self.cmd,
            "starting processing command"
        );

        let mut child = self
            .build(job)
            .spawn()
            .map_err(|e| failed(format!("spawning '{}': {e}", self.cmd)))?;

        if let Some(stdout) = child.stdout.take() {
            let step = job.step;
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(step, "stdout: {}", line);
                }
            });
        }

        // Always consume stderr so buffers don't fill; log at debug.
        if let Some(stderr) = child.stderr.take() {
            let step = job.step;
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(step, "stderr: {}", line);
                }
            });
        }

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(step = job.step, timeout = ?limit, "processing command timed out");
                    // Dropping the child kills it.
                    return Err(failed(format!("timed out after {}s", limit.as_secs())));
                }
            },
            None => child.wait().await,
        }
        .map_err(|e| failed(format!("waiting for '{}': {e}", self.cmd)))?;

        let code = status.code().unwrap_or(-1);
        info!(
            step = job.step,
            exit_code = code,
            success = status.success(),
            "processing command exited"
        );

        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("command exited with code {code}")))
        }
    }
}

impl ProcessingBackend for CommandBackend {
    fn process<'a>(
        &'a self,
        job: &'a ProcessJob,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.run(job))
    }
}
