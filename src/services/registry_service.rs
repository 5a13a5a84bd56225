use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::gateway::{tool_errors, verbs, CommandGateway, GatewayError};
use crate::models::ServerDescriptor;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("barman reported an error: {}", .0.join("; "))]
    Tool(Vec<String>),

    #[error("unexpected list-server output: {0}")]
    UnexpectedShape(String),
}

/// Known backup targets shown in the navigation menu.
///
/// Readers get the current snapshot without touching the gateway. A refresh
/// builds a whole new list and swaps it in only when the call succeeded, so a
/// failed refresh leaves the previous list in place. Refreshes run one at a
/// time, so the snapshot always comes from the latest `list-server` call.
pub struct ServerRegistry {
    gateway: Arc<dyn CommandGateway>,
    snapshot: RwLock<Arc<Vec<ServerDescriptor>>>,
    refreshing: tokio::sync::Mutex<()>,
}

impl ServerRegistry {
    pub fn new(gateway: Arc<dyn CommandGateway>) -> Self {
        ServerRegistry {
            gateway,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            refreshing: tokio::sync::Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<Vec<ServerDescriptor>> {
        self.snapshot.read().clone()
    }

    pub async fn refresh(&self) -> Result<usize, RegistryError> {
        let _running = self.refreshing.lock().await;
        let payload = self.gateway.execute(verbs::LIST_SERVER, &[]).await?;
        let servers = servers_from_payload(&payload)?;
        let count = servers.len();
        *self.snapshot.write() = Arc::new(servers);
        tracing::info!(count, "Server list refreshed");
        Ok(count)
    }
}

/// Reads `list-server` output: either barman's `{"name": {...}}` object or an
/// array of objects carrying a `name` field.
pub fn servers_from_payload(payload: &Value) -> Result<Vec<ServerDescriptor>, RegistryError> {
    let errors = tool_errors(payload);
    if !errors.is_empty() {
        return Err(RegistryError::Tool(errors));
    }

    match payload {
        Value::Object(map) => Ok(map
            .iter()
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, details)| ServerDescriptor {
                name: name.clone(),
                description: description_of(details),
                details: details.clone(),
            })
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let name = item
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| RegistryError::UnexpectedShape("server entry without a name".into()))?;
                Ok(ServerDescriptor {
                    name: name.to_string(),
                    description: description_of(item),
                    details: item.clone(),
                })
            })
            .collect(),
        other => Err(RegistryError::UnexpectedShape(format!(
            "expected an object or array, got {}",
            crate::utils::json_type_name(other)
        ))),
    }
}

fn description_of(details: &Value) -> Option<String> {
    match details {
        Value::String(s) => Some(s.clone()),
        other => other
            .get("description")
            .and_then(|d| d.as_str())
            .map(|s| s.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Replays queued results in order.
    struct ScriptedGateway {
        results: Mutex<Vec<Result<Value, GatewayError>>>,
    }

    impl ScriptedGateway {
        fn new(mut results: Vec<Result<Value, GatewayError>>) -> Arc<Self> {
            results.reverse();
            Arc::new(ScriptedGateway {
                results: Mutex::new(results),
            })
        }
    }

    #[async_trait]
    impl CommandGateway for ScriptedGateway {
        async fn execute(&self, verb: &str, _args: &[String]) -> Result<Value, GatewayError> {
            assert_eq!(verb, "list-server");
            self.results.lock().pop().expect("no scripted result left")
        }
    }

    fn names(registry: &ServerRegistry) -> Vec<String> {
        registry.current().iter().map(|s| s.name.clone()).collect()
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot() {
        let gw = ScriptedGateway::new(vec![
            Ok(json!({"pg": {"description": "main"}, "pg2": {"description": "replica"}})),
            Ok(json!({"pg3": {"description": "new"}})),
        ]);
        let registry = ServerRegistry::new(gw);
        assert!(registry.current().is_empty());

        assert_eq!(registry.refresh().await.unwrap(), 2);
        assert_eq!(names(&registry), vec!["pg", "pg2"]);
        assert_eq!(registry.current()[0].description.as_deref(), Some("main"));

        registry.refresh().await.unwrap();
        assert_eq!(names(&registry), vec!["pg3"]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_known_good_list() {
        let gw = ScriptedGateway::new(vec![
            Ok(json!({"pg": {"description": "main"}})),
            Err(GatewayError::Decode {
                reason: "no output".into(),
                exit_code: Some(1),
                stderr: String::new(),
            }),
            Ok(json!({"_ERROR": ["connection refused"]})),
            Ok(json!("garbage")),
        ]);
        let registry = ServerRegistry::new(gw);
        registry.refresh().await.unwrap();
        let before = registry.current();

        assert!(matches!(registry.refresh().await, Err(RegistryError::Gateway(_))));
        assert_eq!(registry.current(), before);
        assert!(matches!(registry.refresh().await, Err(RegistryError::Tool(_))));
        assert_eq!(registry.current(), before);
        assert!(matches!(registry.refresh().await, Err(RegistryError::UnexpectedShape(_))));
        assert_eq!(names(&registry), vec!["pg"]);
    }

    /// First call answers slowly with `old`, later calls answer at once with `new`.
    struct SlowFirstGateway {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl CommandGateway for SlowFirstGateway {
        async fn execute(&self, _verb: &str, _args: &[String]) -> Result<Value, GatewayError> {
            let first = {
                let mut calls = self.calls.lock();
                *calls += 1;
                *calls == 1
            };
            if first {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                Ok(json!({"old": {}}))
            } else {
                Ok(json!({"new": {}}))
            }
        }
    }

    #[tokio::test]
    async fn overlapping_refreshes_keep_the_latest_result() {
        let registry = ServerRegistry::new(Arc::new(SlowFirstGateway { calls: Mutex::new(0) }));
        let (first, second) = tokio::join!(registry.refresh(), async {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            registry.refresh().await
        });
        first.unwrap();
        second.unwrap();
        assert_eq!(names(&registry), vec!["new"]);
    }

    #[test]
    fn array_payloads_need_names() {
        let servers = servers_from_payload(&json!([{"name": "a", "description": "x"}])).unwrap();
        assert_eq!(servers[0].name, "a");
        assert!(servers_from_payload(&json!([{"description": "x"}])).is_err());
    }

    #[test]
    fn notice_keys_are_not_servers() {
        let servers = servers_from_payload(&json!({"_WARNING": ["w"], "pg": "Main server"})).unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].description.as_deref(), Some("Main server"));
    }
}
