use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::{ClientError, ContentApi};
use crate::ledger::{BackupEntry, BackupLedger};
use crate::plan::{ActionKind, ActionSpec, Plan};

/// Delay between consecutive actions. Serialization device for the remote's
/// rate limits; ordering does not depend on it.
pub const DEFAULT_PACE: Duration = Duration::from_millis(200);

/// Per-action outcome, appended in plan order. The execution log is the sole
/// surface of truth for what happened.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub action: String,
    pub success: bool,
    pub message: String,
}

/// Snapshot an item onto the ledger ahead of a mutation. A failed fetch
/// still pushes an entry with an empty snapshot so the mutation stays
/// poppable.
async fn backup_item<C: ContentApi + ?Sized>(
    api: &C,
    ledger: &mut BackupLedger,
    endpoint: &str,
    id: &str,
) {
    let snapshot = match api.fetch_item(endpoint, id).await {
        Ok(v) => v,
        Err(e) => {
            warn!(endpoint, id, error = %e, "backup fetch failed, recording empty snapshot");
            Value::Object(serde_json::Map::new())
        }
    };
    ledger.push(BackupEntry {
        endpoint: endpoint.to_string(),
        item_id: id.to_string(),
        snapshot,
    });
}

fn record(spec: &ActionSpec, outcome: Result<String, ClientError>) -> ExecutionRecord {
    let (success, message) = match outcome {
        Ok(msg) => (true, msg),
        Err(e) => (false, e.to_string()),
    };
    ExecutionRecord {
        id: spec.id.to_string(),
        action: spec.action.clone(),
        success,
        message,
    }
}

/// Walk a reviewed plan in order: one result per action, failures never
/// abort the remaining actions, and no action is dispatched before the
/// previous one's result is recorded.
pub async fn apply_plan<C: ContentApi + ?Sized>(
    api: &C,
    ledger: &mut BackupLedger,
    endpoint: &str,
    plan: &Plan,
    pace: Duration,
) -> Vec<ExecutionRecord> {
    let mut results = Vec::with_capacity(plan.actions.len());
    for (i, spec) in plan.actions.iter().enumerate() {
        let id = spec.id.to_string();
        let rec = match spec.kind() {
            Some(ActionKind::Create) => {
                record(spec, api.create_item(endpoint, &spec.changes).await)
            }
            Some(ActionKind::Update) => {
                backup_item(api, ledger, endpoint, &id).await;
                record(spec, api.update_item(endpoint, &id, &spec.changes).await)
            }
            Some(ActionKind::Delete) => {
                backup_item(api, ledger, endpoint, &id).await;
                record(spec, api.delete_item(endpoint, &id).await)
            }
            None => ExecutionRecord {
                id: id.clone(),
                action: spec.action.clone(),
                success: false,
                message: "Unknown action".to_string(),
            },
        };
        debug!(id = %rec.id, action = %rec.action, success = rec.success, "action executed");
        results.push(rec);
        if i + 1 < plan.actions.len() {
            tokio::time::sleep(pace).await;
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ContentItem;
    use async_trait::async_trait;
    use serde_json::{json, Map};
    use std::sync::Mutex;

    /// Scripted stand-in for the remote API that records every call.
    #[derive(Default)]
    struct ScriptedApi {
        calls: Mutex<Vec<String>>,
        fail_fetch_item: bool,
        fail_update: bool,
    }

    impl ScriptedApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
        fn note(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ContentApi for ScriptedApi {
        async fn fetch_items(&self, endpoint: &str) -> Result<Vec<ContentItem>, ClientError> {
            self.note(format!("fetch_items {endpoint}"));
            Ok(Vec::new())
        }
        async fn fetch_item(&self, endpoint: &str, id: &str) -> Result<Value, ClientError> {
            self.note(format!("fetch_item {endpoint}/{id}"));
            if self.fail_fetch_item {
                Err(ClientError::Status {
                    status: 404,
                    body: "gone".to_string(),
                })
            } else {
                Ok(json!({"id": id, "title": "Old", "content": "Body"}))
            }
        }
        async fn create_item(
            &self,
            endpoint: &str,
            _changes: &Map<String, Value>,
        ) -> Result<String, ClientError> {
            self.note(format!("create {endpoint}"));
            Ok("New item created with ID 101".to_string())
        }
        async fn update_item(
            &self,
            endpoint: &str,
            id: &str,
            _changes: &Map<String, Value>,
        ) -> Result<String, ClientError> {
            self.note(format!("update {endpoint}/{id}"));
            if self.fail_update {
                Err(ClientError::Status {
                    status: 500,
                    body: "server error".to_string(),
                })
            } else {
                Ok(format!("ID {id} updated."))
            }
        }
        async fn delete_item(&self, endpoint: &str, id: &str) -> Result<String, ClientError> {
            self.note(format!("delete {endpoint}/{id}"));
            Ok(format!("ID {id} deleted."))
        }
    }

    fn plan_of(text: &str) -> Plan {
        Plan::from_model_output(text).unwrap()
    }

    #[tokio::test]
    async fn one_record_per_action_in_plan_order() {
        let api = ScriptedApi::default();
        let mut ledger = BackupLedger::new();
        let plan = plan_of(
            r#"{"actions":[
                {"id":"new","action":"create","changes":{"title":"A"}},
                {"id":1,"action":"update","changes":{"title":"B"}},
                {"id":2,"action":"delete","changes":{}},
                {"id":3,"action":"publish","changes":{}}
            ]}"#,
        );

        let results = apply_plan(&api, &mut ledger, "posts", &plan, Duration::ZERO).await;
        assert_eq!(results.len(), 4);
        assert_eq!(
            results.iter().map(|r| r.action.as_str()).collect::<Vec<_>>(),
            vec!["create", "update", "delete", "publish"]
        );
        assert_eq!(results[0].id, "new");
        assert_eq!(results[1].id, "1");
        assert_eq!(results[2].id, "2");
    }

    #[tokio::test]
    async fn backup_precedes_every_mutation() {
        let api = ScriptedApi::default();
        let mut ledger = BackupLedger::new();
        let plan = plan_of(
            r#"{"actions":[
                {"id":1,"action":"update","changes":{"title":"B"}},
                {"id":2,"action":"delete","changes":{}}
            ]}"#,
        );

        apply_plan(&api, &mut ledger, "posts", &plan, Duration::ZERO).await;
        assert_eq!(
            api.calls(),
            vec![
                "fetch_item posts/1",
                "update posts/1",
                "fetch_item posts/2",
                "delete posts/2"
            ]
        );
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.pop().unwrap().item_id, "2");
    }

    #[tokio::test]
    async fn create_skips_backup() {
        let api = ScriptedApi::default();
        let mut ledger = BackupLedger::new();
        let plan = plan_of(r#"{"actions":[{"id":"new","action":"create","changes":{}}]}"#);

        let results = apply_plan(&api, &mut ledger, "pages", &plan, Duration::ZERO).await;
        assert!(results[0].success);
        assert_eq!(api.calls(), vec!["create pages"]);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn failed_backup_fetch_still_pushes_and_mutates() {
        let api = ScriptedApi {
            fail_fetch_item: true,
            ..Default::default()
        };
        let mut ledger = BackupLedger::new();
        let plan = plan_of(r#"{"actions":[{"id":5,"action":"delete","changes":{}}]}"#);

        let results = apply_plan(&api, &mut ledger, "posts", &plan, Duration::ZERO).await;
        assert!(results[0].success);
        assert_eq!(api.calls(), vec!["fetch_item posts/5", "delete posts/5"]);

        let entry = ledger.pop().unwrap();
        assert_eq!(entry.item_id, "5");
        assert_eq!(entry.snapshot, json!({}));
    }

    #[tokio::test]
    async fn unknown_action_makes_no_network_calls() {
        let api = ScriptedApi::default();
        let mut ledger = BackupLedger::new();
        let plan = plan_of(r#"{"actions":[{"id":1,"action":"archive","changes":{}}]}"#);

        let results = apply_plan(&api, &mut ledger, "posts", &plan, Duration::ZERO).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert_eq!(results[0].message, "Unknown action");
        assert!(api.calls().is_empty());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn failure_does_not_abort_remaining_actions() {
        let api = ScriptedApi {
            fail_update: true,
            ..Default::default()
        };
        let mut ledger = BackupLedger::new();
        let plan = plan_of(
            r#"{"actions":[
                {"id":1,"action":"update","changes":{"title":"B"}},
                {"id":2,"action":"delete","changes":{}}
            ]}"#,
        );

        let results = apply_plan(&api, &mut ledger, "posts", &plan, Duration::ZERO).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].message, "HTTP 500: server error");
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn delete_scenario_backs_up_then_deletes() {
        // "Delete post 42" end to end, minus the model call.
        let api = ScriptedApi::default();
        let mut ledger = BackupLedger::new();
        let plan = plan_of(r#"{"actions":[{"id":42,"action":"delete","changes":{}}]}"#);

        let results = apply_plan(&api, &mut ledger, "posts", &plan, Duration::ZERO).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "42");
        assert_eq!(results[0].action, "delete");
        assert!(results[0].success);
        assert_eq!(results[0].message, "ID 42 deleted.");
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn empty_plan_produces_empty_log() {
        let api = ScriptedApi::default();
        let mut ledger = BackupLedger::new();
        let results =
            apply_plan(&api, &mut ledger, "posts", &Plan::empty(), Duration::ZERO).await;
        assert!(results.is_empty());
        assert!(api.calls().is_empty());
    }
}
