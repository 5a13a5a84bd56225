use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::Semaphore;

use super::error::GatewayError;
use super::CommandGateway;
use crate::config::AppConfig;

const STDERR_EXCERPT_LEN: usize = 2048;

/// Runs `barman -f json <verb> [args...]` as a subprocess.
///
/// Arguments are handed to the OS as a vector, never through a shell, so a
/// path parameter always stays a single argument. At most `max_concurrent`
/// processes run at the same time; further calls wait for a permit. The
/// permit belongs to the child process, not to the caller: a cancelled call
/// leaves the child running and its permit taken until it exits.
pub struct BarmanGateway {
    binary: String,
    prefix: Option<Vec<String>>,
    permits: Arc<Semaphore>,
}

impl BarmanGateway {
    pub fn new(binary: impl Into<String>, prefix: Option<Vec<String>>, max_concurrent: usize) -> Self {
        BarmanGateway {
            binary: binary.into(),
            prefix: prefix.filter(|p| !p.is_empty()),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.barman_bin.clone(),
            config.active_prefix(),
            config.max_concurrent_commands,
        )
    }

    /// Full argument vector for one invocation, prefix included.
    pub fn command_line(&self, verb: &str, args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 8);
        if let Some(prefix) = &self.prefix {
            argv.extend(prefix.iter().cloned());
        }
        argv.push(self.binary.clone());
        argv.push("-f".to_string());
        argv.push("json".to_string());
        argv.push(verb.to_string());
        argv.extend(args.iter().cloned());
        argv
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl CommandGateway for BarmanGateway {
    async fn execute(&self, verb: &str, args: &[String]) -> Result<Value, GatewayError> {
        let argv = self.command_line(verb, args);
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| GatewayError::Decode {
                reason: "empty command line".into(),
                exit_code: None,
                stderr: String::new(),
            })?;

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| GatewayError::Closed)?;
        tracing::debug!(?argv, "Running barman command");

        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                tracing::error!(%source, program = %program, verb, "Failed to start barman command");
                GatewayError::Spawn {
                    program: program.clone(),
                    source,
                }
            })?;

        // The wait runs in its own task so the permit is released only when
        // the child has exited, even if this future is dropped first.
        let waiter = tokio::spawn(async move {
            let output = child.wait_with_output().await;
            drop(permit);
            output
        });
        let output = waiter
            .await
            .map_err(|_| GatewayError::Closed)?
            .map_err(|source| GatewayError::Spawn {
                program: program.clone(),
                source,
            })?;

        let exit_code = output.status.code();
        if !output.status.success() {
            tracing::warn!(verb, ?exit_code, "barman exited with a failure status");
        }
        decode_output(&output.stdout, exit_code, &output.stderr)
    }
}

/// Decodes captured standard output. A non-zero exit with a valid document
/// still yields the document; the caller inspects it for tool errors.
pub fn decode_output(stdout: &[u8], exit_code: Option<i32>, stderr: &[u8]) -> Result<Value, GatewayError> {
    let failed_exit = match exit_code {
        Some(0) => None,
        other => Some(other.unwrap_or(-1)),
    };
    let decode_error = |reason: String| GatewayError::Decode {
        reason,
        exit_code: failed_exit,
        stderr: stderr_excerpt(stderr),
    };

    let text = std::str::from_utf8(stdout)
        .map_err(|e| decode_error(format!("output is not valid UTF-8: {}", e)))?;
    if text.trim().is_empty() {
        return Err(decode_error("no output".into()));
    }
    serde_json::from_str(text).map_err(|e| decode_error(format!("output is not valid JSON: {}", e)))
}

fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(STDERR_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
