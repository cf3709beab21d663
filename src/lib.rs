pub mod client;
pub mod context;
pub mod errlog;
pub mod executor;
pub mod ledger;
pub mod plan;
pub mod planner;
pub mod rollback;
pub mod routing;
pub mod site;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::client::{ClientError, ContentApi, ContentItem, RemoteClient};
    pub use crate::context::{PageContext, ScrapeOutcome};
    pub use crate::executor::ExecutionRecord;
    pub use crate::ledger::{BackupEntry, BackupLedger};
    pub use crate::plan::{ActionKind, ActionSpec, ActionTarget, Plan};
    pub use crate::planner::{GeneratedPlan, LlmPlanner, PlanFailure, PlanRequest, Planner};
    pub use crate::routing::EndpointRouter;
    pub use crate::site::{Site, SiteStore};
    pub use crate::Copydesk;
}

use anyhow::{bail, Result};
use std::time::Duration;
use tracing::info;

use crate::client::{ClientError, ContentApi, ContentItem, RemoteClient};
use crate::executor::{apply_plan, ExecutionRecord, DEFAULT_PACE};
use crate::ledger::BackupLedger;
use crate::plan::Plan;
use crate::planner::{GeneratedPlan, PlanRequest, Planner};
use crate::site::Site;

/// One editing session against one site. Owns the remote client, the plan
/// generator, and the backup ledger that rollback consumes; independent
/// sessions never share state.
pub struct Copydesk {
    client: RemoteClient,
    planner: Option<Box<dyn Planner>>,
    ledger: BackupLedger,
    session_id: String,
    pace: Duration,
}

impl Copydesk {
    pub fn new(site: &Site) -> Result<Self> {
        let client = RemoteClient::new(site)?;
        let pace = std::env::var("COPYDESK_PACE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PACE);
        Ok(Self {
            client,
            planner: None,
            ledger: BackupLedger::new(),
            session_id: uuid::Uuid::new_v4().to_string(),
            pace,
        })
    }

    pub fn with_planner(mut self, planner: Box<dyn Planner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn ledger(&self) -> &BackupLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut BackupLedger {
        &mut self.ledger
    }

    pub fn set_pace(&mut self, pace: Duration) {
        self.pace = pace;
    }

    /// Current snapshot of a collection. `Err` means the remote state could
    /// not be established, which callers must not confuse with "no items".
    pub async fn items(&self, endpoint: &str) -> Result<Vec<ContentItem>, ClientError> {
        self.client.fetch_items(endpoint).await
    }

    /// Quick credential/URL check.
    pub async fn probe(&self) -> bool {
        self.client.probe().await
    }

    /// Build a plan for human review. Only the item count reaches the
    /// model, never item bodies. Nothing is applied here.
    pub async fn propose(
        &self,
        command: &str,
        endpoint: &str,
        extra_context: Option<serde_json::Value>,
    ) -> Result<GeneratedPlan> {
        let Some(planner) = &self.planner else {
            bail!("no planner configured for this session");
        };
        let items = self.client.fetch_items(endpoint).await?;
        let req = PlanRequest {
            command: command.to_string(),
            content_type: endpoint.to_string(),
            item_count: items.len(),
            extra_context,
        };
        Ok(planner.propose(&req).await)
    }

    /// Execute a reviewed plan. One record per action, in plan order.
    pub async fn apply(&mut self, plan: &Plan, endpoint: &str) -> Vec<ExecutionRecord> {
        info!(
            session = %self.session_id,
            endpoint,
            actions = plan.actions.len(),
            "applying plan"
        );
        apply_plan(&self.client, &mut self.ledger, endpoint, plan, self.pace).await
    }

    /// Restore the most recently backed-up item.
    pub async fn rollback_last(&mut self) -> (bool, String) {
        rollback::rollback_last(&self.client, &mut self.ledger).await
    }
}
