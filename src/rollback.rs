use serde_json::{Map, Value};
use tracing::info;

use crate::client::ContentApi;
use crate::ledger::BackupLedger;

/// Undo the most recent backed-up mutation by re-applying its original title
/// and content. Other snapshot fields are intentionally discarded. The entry
/// comes off the ledger either way; a second call reaches the next one down.
pub async fn rollback_last<C: ContentApi + ?Sized>(
    api: &C,
    ledger: &mut BackupLedger,
) -> (bool, String) {
    let Some(entry) = ledger.pop() else {
        return (false, "No backup available.".to_string());
    };

    let mut changes = Map::new();
    changes.insert(
        "title".to_string(),
        entry.snapshot.get("title").cloned().unwrap_or(Value::Null),
    );
    changes.insert(
        "content".to_string(),
        entry.snapshot.get("content").cloned().unwrap_or(Value::Null),
    );

    match api.update_item(&entry.endpoint, &entry.item_id, &changes).await {
        Ok(_) => {
            info!(endpoint = %entry.endpoint, id = %entry.item_id, "rolled back");
            (true, format!("ID {} rolled back.", entry.item_id))
        }
        Err(e) => (false, e.to_string()),
    }
}
