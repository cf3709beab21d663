use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Auxiliary page content handed over by the scraping collaborator. The
/// scraper itself is external; this is its wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContext {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub meta: serde_json::Map<String, Value>,
    #[serde(default)]
    pub youtube: String,
}

/// A scrape either yields page content or an `{"error": ...}` object.
/// `Failed` must stay first: an all-defaulted `PageContext` would otherwise
/// swallow error payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    Failed { error: String },
    Page(PageContext),
}

impl ScrapeOutcome {
    /// Render for prompt embedding. Merged into the model request as-is,
    /// errors included, so the model sees what the operator saw.
    pub fn to_context_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_payload_deserializes() {
        let out: ScrapeOutcome = serde_json::from_str(
            r#"{"text":"Body text","images":["a.jpg"],"meta":{"description":"d"},"youtube":""}"#,
        )
        .unwrap();
        match out {
            ScrapeOutcome::Page(p) => {
                assert_eq!(p.text, "Body text");
                assert_eq!(p.images, vec!["a.jpg"]);
            }
            ScrapeOutcome::Failed { .. } => panic!("expected page"),
        }
    }

    #[test]
    fn error_payload_wins_over_page_shape() {
        let out: ScrapeOutcome = serde_json::from_str(r#"{"error":"timed out"}"#).unwrap();
        assert!(matches!(out, ScrapeOutcome::Failed { error } if error == "timed out"));
    }

    #[test]
    fn context_value_roundtrips() {
        let out = ScrapeOutcome::Page(PageContext {
            text: "t".to_string(),
            ..Default::default()
        });
        let v = out.to_context_value();
        assert_eq!(v.get("text").unwrap(), "t");
    }
}
