/// Error types for barman invocations
use thiserror::Error;

/// Failures turned into typed results at the gateway boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The binary (or prefix program) could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Standard output was empty, not UTF-8 or not JSON
    #[error("barman output could not be decoded: {reason}")]
    Decode {
        reason: String,
        /// Exit code when the process did not exit cleanly
        exit_code: Option<i32>,
        /// First part of standard error, for the error page
        stderr: String,
    },

    /// The spawn limiter was shut down
    #[error("command gateway is shutting down")]
    Closed,
}

impl GatewayError {
    /// Short label used in logs and on the error page.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Spawn { .. } => "spawn",
            GatewayError::Decode { .. } => "decode",
            GatewayError::Closed => "closed",
        }
    }
}
