/// Keyword rules mapping a raw command to a collection endpoint. This lives
/// outside the executor on purpose: callers may swap in their own rules (or
/// bypass routing entirely) and any endpoint string is accepted downstream.
#[derive(Debug, Clone)]
pub struct EndpointRouter {
    rules: Vec<(String, String)>,
    fallback: String,
}

impl Default for EndpointRouter {
    fn default() -> Self {
        Self::new(
            vec![
                ("listing".to_string(), "hp_listing".to_string()),
                ("page".to_string(), "pages".to_string()),
            ],
            "posts",
        )
    }
}

impl EndpointRouter {
    pub fn new(rules: Vec<(String, String)>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    /// First keyword hit wins; matching is case-insensitive.
    pub fn classify(&self, command: &str) -> &str {
        let lc = command.to_lowercase();
        for (keyword, endpoint) in &self.rules {
            if lc.contains(keyword.as_str()) {
                return endpoint;
            }
        }
        &self.fallback
    }
}
