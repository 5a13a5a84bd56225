//! Invocation of the external backup tool.
//!
//! Every call becomes exactly one subprocess whose standard output is decoded
//! as a JSON document. Failures come back as [`GatewayError`] values.

pub mod command;
pub mod error;
pub mod payload;

use async_trait::async_trait;
use serde_json::Value;

pub use command::{decode_output, BarmanGateway};
pub use error::GatewayError;
pub use payload::{tool_errors, tool_notices};

/// Fixed sub-commands used by the dashboard.
pub mod verbs {
    pub const LIST_SERVER: &str = "list-server";
    pub const STATUS: &str = "status";
    pub const CHECK: &str = "check";
    pub const LIST_BACKUP: &str = "list-backup";
    pub const SHOW_SERVER: &str = "show-server";
    pub const SHOW_BACKUP: &str = "show-backup";
    pub const DELETE: &str = "delete";
    pub const BACKUP: &str = "backup";
}

#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Runs one verb with positional arguments and returns the decoded output.
    async fn execute(&self, verb: &str, args: &[String]) -> Result<Value, GatewayError>;
}
