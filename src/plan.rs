use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier carried by a proposed action: an existing item id, or the
/// "new" sentinel for creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionTarget {
    Id(i64),
    Key(String),
}

impl ActionTarget {
    pub fn is_new(&self) -> bool {
        matches!(self, ActionTarget::Key(k) if k == "new")
    }
}

impl Default for ActionTarget {
    fn default() -> Self {
        ActionTarget::Key("new".to_string())
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTarget::Id(n) => write!(f, "{n}"),
            ActionTarget::Key(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    /// Kinds outside this set are reported per-action at execution time,
    /// never rejected while parsing a plan.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One proposed operation. Every field defaults so a partially formed action
/// degrades to a per-action failure instead of discarding the whole plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(default)]
    pub id: ActionTarget,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub changes: Map<String, Value>,
}

impl ActionSpec {
    pub fn kind(&self) -> Option<ActionKind> {
        ActionKind::parse(&self.action)
    }
}

/// Ordered list of proposed actions awaiting human review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<ActionSpec>,
}

impl Plan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Parse model output. Anything without a well-formed `actions` array
    /// reads as `None`; callers collapse that to the empty plan.
    pub fn from_model_output(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}
