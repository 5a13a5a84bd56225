use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One backup target as reported by `list-server`. Everything beyond the
/// name is passed through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub details: Value,
}

impl ServerDescriptor {
    /// Name escaped for use as a single URL path segment.
    pub fn path_name(&self) -> String {
        urlencoding::encode(&self.name).into_owned()
    }
}
