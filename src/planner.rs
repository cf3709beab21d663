use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::plan::Plan;

const SYSTEM_PROMPT: &str = "You are an expert WordPress content editor. \
Receive a natural language command and details about content items. \
Return a JSON object with a key 'actions' that is a list of actions. \
Each action must have 'id' (post id or 'new'), 'action' (create, update, delete), \
and 'changes' (a dictionary mapping field names to new values). Do not include extra text.";

const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1/chat/completions";
// Low temperature keeps repeated commands close to deterministic.
const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 800;

/// Everything the model is told about the session. Item bodies are never
/// sent; the count keeps the request bounded regardless of catalog size.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub command: String,
    pub content_type: String,
    pub item_count: usize,
    pub extra_context: Option<Value>,
}

impl PlanRequest {
    fn user_message(&self) -> String {
        let mut msg = format!(
            "User command: {}\nContent type: {}\nNumber of items: {}.\n\
             For each item, generate the necessary changes as a JSON object.",
            self.command, self.content_type, self.item_count
        );
        if let Some(ctx) = &self.extra_context {
            msg.push_str("\nExtra context: ");
            msg.push_str(&ctx.to_string());
        }
        msg
    }
}

/// Why a generated plan came back empty. The caller still gets a plan; this
/// is how tests and hosts tell "nothing to do" from "the call fell over".
#[derive(Debug, Error)]
pub enum PlanFailure {
    #[error("{0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model reply carried no content")]
    NoContent,
    #[error("model reply was not a plan: {0}")]
    BadJson(String),
}

/// A plan is always produced; `failure` records why it may be empty.
#[derive(Debug)]
pub struct GeneratedPlan {
    pub plan: Plan,
    pub failure: Option<PlanFailure>,
}

impl GeneratedPlan {
    pub fn degraded(failure: PlanFailure) -> Self {
        Self {
            plan: Plan::empty(),
            failure: Some(failure),
        }
    }
}

/// Turns a free-text command into a reviewable plan. Implementations must
/// not fail: any breakage degrades to an empty plan.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn propose(&self, req: &PlanRequest) -> GeneratedPlan;
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Plan generator backed by a chat-completions endpoint.
pub struct LlmPlanner {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl LlmPlanner {
    pub fn new(api_key: String) -> Self {
        let url = std::env::var("COPYDESK_LLM_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LLM_URL.to_string());
        let model = std::env::var("COPYDESK_MODEL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            http: reqwest::Client::new(),
            url,
            api_key,
            model,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        Ok(Self::new(key))
    }

    async fn complete(&self, req: &PlanRequest) -> Result<String, PlanFailure> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": req.user_message()},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PlanFailure::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PlanFailure::Status { status, body });
        }
        let reply: ChatReply = resp
            .json()
            .await
            .map_err(|e| PlanFailure::Transport(e.to_string()))?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(PlanFailure::NoContent)
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn propose(&self, req: &PlanRequest) -> GeneratedPlan {
        let text = match self.complete(req).await {
            Ok(t) => t,
            Err(f) => {
                warn!(error = %f, "plan generation degraded to empty plan");
                return GeneratedPlan::degraded(f);
            }
        };
        match Plan::from_model_output(&text) {
            Some(plan) => GeneratedPlan {
                plan,
                failure: None,
            },
            None => {
                warn!("model reply was not valid plan JSON");
                GeneratedPlan::degraded(PlanFailure::BadJson(truncated(&text, 200)))
            }
        }
    }
}

fn truncated(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
