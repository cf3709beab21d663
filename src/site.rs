use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One remote target. Immutable once saved; the API root and the Basic auth
/// credentials for every request derive from these three fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub url: String,
    pub username: String,
    pub app_password: String,
}

impl Site {
    pub fn api_root(&self) -> String {
        format!("{}/wp-json/wp/v2", self.url.trim_end_matches('/'))
    }
}

/// Saved site connections, one `sites.toml` per user. Stands in for the
/// host's credential store: same list-of-connections interface, plain TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteStore {
    #[serde(default)]
    pub sites: Vec<Site>,
}

impl SiteStore {
    pub fn default_path() -> Result<PathBuf> {
        let proj = ProjectDirs::from("dev", "copydesk", "copydesk")
            .context("unable to determine config directory")?;
        Ok(proj.config_dir().join("sites.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Select by URL fragment, or the first saved site when none is given.
    pub fn find(&self, fragment: Option<&str>) -> Option<&Site> {
        match fragment {
            Some(f) => self.sites.iter().find(|s| s.url.contains(f)),
            None => self.sites.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(url: &str) -> Site {
        Site {
            url: url.to_string(),
            username: "editor".to_string(),
            app_password: "secret".to_string(),
        }
    }

    #[test]
    fn api_root_strips_trailing_slash() {
        assert_eq!(
            site("https://example.com/").api_root(),
            "https://example.com/wp-json/wp/v2"
        );
        assert_eq!(
            site("https://example.com").api_root(),
            "https://example.com/wp-json/wp/v2"
        );
    }

    #[test]
    fn store_roundtrips_through_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf").join("sites.toml");

        let store = SiteStore {
            sites: vec![site("https://a.example"), site("https://b.example")],
        };
        store.save(&path).unwrap();

        let loaded = SiteStore::load(&path).unwrap();
        assert_eq!(loaded.sites.len(), 2);
        assert_eq!(loaded.sites[0].url, "https://a.example");
    }

    #[test]
    fn missing_file_loads_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SiteStore::load(&tmp.path().join("none.toml")).unwrap();
        assert!(store.sites.is_empty());
    }

    #[test]
    fn find_matches_fragment_or_defaults_to_first() {
        let store = SiteStore {
            sites: vec![site("https://a.example"), site("https://b.example")],
        };
        assert_eq!(store.find(Some("b.ex")).unwrap().url, "https://b.example");
        assert_eq!(store.find(None).unwrap().url, "https://a.example");
        assert!(store.find(Some("missing")).is_none());
    }
}
