//! Supervised runs of the external mapfile generator.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, StagingError};
use crate::path::dataset_id;

/// stdout marker for one successfully hashed file, printed in `--debug` mode.
pub const SUCCESS_MARKER: &str = "SUCCESS";

fn default_command() -> Vec<String> {
    vec!["esgmapfile".to_string()]
}

fn default_project() -> String {
    "e3sm".to_string()
}

fn default_max_processes() -> usize {
    4
}

/// Mapfile generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapfileConfig {
    /// Program and leading arguments, e.g. a `conda run` wrapper
    #[serde(default = "default_command")]
    pub command: Vec<String>,
    pub ini_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_project")]
    pub project: String,
    #[serde(default = "default_max_processes")]
    pub max_processes: usize,
}

impl MapfileConfig {
    pub fn new(ini_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: default_command(),
            ini_dir: ini_dir.into(),
            output_dir: output_dir.into(),
            project: default_project(),
            max_processes: default_max_processes(),
        }
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of one generator run.
#[derive(Debug, Clone)]
pub struct MapfileOutcome {
    pub basepath: PathBuf,
    /// stdout lines that reported a hashed file
    pub successes: usize,
    /// stderr, line by line
    pub stderr: Vec<String>,
    /// None if the process was never started or died from a signal
    pub exit_code: Option<i32>,
    pub cancelled: bool,
    exit_ok: bool,
}

impl MapfileOutcome {
    fn cancelled_before_start(basepath: &Path) -> Self {
        Self {
            basepath: basepath.to_path_buf(),
            successes: 0,
            stderr: Vec::new(),
            exit_code: None,
            cancelled: true,
            exit_ok: false,
        }
    }

    pub fn succeeded(&self) -> bool {
        !self.cancelled && self.stderr.is_empty() && self.exit_ok
    }
}

/// Runs the mapfile generator as a child process.
pub struct MapfileSupervisor {
    config: MapfileConfig,
    progress: Arc<AtomicUsize>,
}

impl MapfileSupervisor {
    pub fn new(config: MapfileConfig) -> Self {
        Self {
            config,
            progress: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared count of `SUCCESS` lines seen across runs.
    pub fn progress(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.progress)
    }

    /// Full argument list after the program name.
    pub fn arguments(&self, basepath: &Path) -> Vec<String> {
        let mut args: Vec<String> = self.config.command.iter().skip(1).cloned().collect();
        args.extend([
            "make".to_string(),
            "--debug".to_string(),
            "--outdir".to_string(),
            self.config.output_dir.display().to_string(),
            "-i".to_string(),
            self.config.ini_dir.display().to_string(),
            "--project".to_string(),
            self.config.project.clone(),
            "--max-processes".to_string(),
            self.config.max_processes.to_string(),
            basepath.display().to_string(),
        ]);
        args
    }

    /// Generate mapfiles for one dataset directory.
    ///
    /// Cancellation sends SIGTERM to the child and returns once the child
    /// has exited, without waiting for its output to drain. Descendants of
    /// the child are left alone.
    #[instrument(skip(self, cancel), fields(basepath = %basepath.display()))]
    pub async fn generate(&self, basepath: &Path, cancel: &CancellationToken) -> Result<MapfileOutcome> {
        let program = self.config.command.first().ok_or(StagingError::EmptyCommand)?;
        if cancel.is_cancelled() {
            return Ok(MapfileOutcome::cancelled_before_start(basepath));
        }

        let dataset = dataset_id(basepath).unwrap_or_else(|| basepath.display().to_string());
        info!(dataset = %dataset, "Generating mapfile");

        let args = self.arguments(basepath);
        debug!(program = %program, args = ?args, "Spawning mapfile generator");
        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| StagingError::Spawn {
                program: program.clone(),
                source,
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(std::io::Error::other("child output pipes were not captured").into());
        };
        let mut out_lines = BufReader::new(stdout).split(b'\n');
        let mut err_lines = BufReader::new(stderr).split(b'\n');

        let mut successes = 0;
        let mut captured = Vec::new();
        let mut cancelled = false;
        let mut out_open = true;
        let mut err_open = true;
        let mut exited: Option<ExitStatus> = None;

        while out_open || err_open {
            tokio::select! {
                _ = cancel.cancelled(), if !cancelled => {
                    warn!(dataset = %dataset, "Cancelling mapfile generation");
                    cancelled = true;
                    if let Err(e) = request_termination(&mut child) {
                        warn!(error = %e, "Failed to signal mapfile generator");
                    }
                }
                // descendants may keep the pipes open after the child is gone
                status = child.wait(), if cancelled => {
                    exited = Some(status?);
                    break;
                }
                segment = out_lines.next_segment(), if out_open => match segment? {
                    Some(bytes) => {
                        let line = decode_line(bytes);
                        if line.contains(SUCCESS_MARKER) {
                            successes += 1;
                            self.progress.fetch_add(1, Ordering::Relaxed);
                        }
                        debug!(line = %line, "mapfile stdout");
                    }
                    None => out_open = false,
                },
                segment = err_lines.next_segment(), if err_open => match segment? {
                    Some(bytes) => {
                        let line = decode_line(bytes);
                        warn!(line = %line, "mapfile stderr");
                        captured.push(line);
                    }
                    None => err_open = false,
                },
            }
        }
        drop(out_lines);
        drop(err_lines);

        let status = match exited {
            Some(status) => status,
            None => child.wait().await?,
        };
        let outcome = MapfileOutcome {
            basepath: basepath.to_path_buf(),
            successes,
            stderr: captured,
            exit_code: status.code(),
            cancelled,
            exit_ok: status.success(),
        };

        if outcome.succeeded() {
            info!(dataset = %dataset, files = successes, "Mapfile generation complete");
        } else {
            warn!(
                dataset = %dataset,
                exit_code = ?outcome.exit_code,
                stderr_lines = outcome.stderr.len(),
                cancelled,
                "Mapfile generation failed"
            );
        }
        Ok(outcome)
    }

    /// Run the generator once per directory, in order, until cancelled.
    pub async fn generate_all<'a, I>(&self, basepaths: I, cancel: &CancellationToken) -> Result<Vec<MapfileOutcome>>
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let mut outcomes = Vec::new();
        for basepath in basepaths {
            if cancel.is_cancelled() {
                break;
            }
            outcomes.push(self.generate(basepath, cancel).await?);
        }
        Ok(outcomes)
    }
}

/// Output line without its terminator, with invalid UTF-8 replaced.
fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        // already reaped
        return Ok(());
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
