//! Marketplace configuration: a TOML file layered under environment
//! overrides, so deployments can keep secrets out of the file.

use std::path::Path;

use {
    serde::{Deserialize, Serialize},
    skilldock_common::{Context, Result},
};

const ENV_REPO: &str = "SKILLDOCK_REPO";
const ENV_API_BASE: &str = "SKILLDOCK_API_BASE";
const ENV_READ_TOKEN: &str = "SKILLDOCK_READ_TOKEN";
const ENV_WRITE_TOKEN: &str = "SKILLDOCK_WRITE_TOKEN";
const ENV_CONNECTOR_URL: &str = "SKILLDOCK_CONNECTOR_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Repository slug, `owner/name`.
    pub repo: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Token used for all reads. Public marketplaces can run without one.
    #[serde(default)]
    pub read_token: Option<String>,
    /// Token used for writes; absent means the deployment is read-only.
    #[serde(default)]
    pub write_token: Option<String>,
    /// Base URL clients use to redeem tokens out of band.
    #[serde(default = "default_connector_url")]
    pub connector_url: String,
    /// Path of the published-package registry within the repository.
    #[serde(default = "default_registry_path")]
    pub registry_path: String,
    /// Path of the access policy document within the repository.
    #[serde(default = "default_access_path")]
    pub access_path: String,
}

fn default_api_base() -> String {
    "https://api.github.com".into()
}

fn default_connector_url() -> String {
    "http://localhost:8787".into()
}

fn default_registry_path() -> String {
    ".marketplace/registry.json".into()
}

fn default_access_path() -> String {
    ".marketplace/access.json".into()
}

impl MarketplaceConfig {
    /// Minimal config for a repository, everything else defaulted.
    #[must_use]
    pub fn for_repo(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            api_base: default_api_base(),
            read_token: None,
            write_token: None,
            connector_url: default_connector_url(),
            registry_path: default_registry_path(),
            access_path: default_access_path(),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing marketplace config")
    }

    /// Read the config file, then layer environment overrides on top.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        Ok(Self::from_toml(&text)?.with_env_overrides())
    }

    /// Apply `SKILLDOCK_*` environment variables over the file values.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var(ENV_REPO) {
            self.repo = v;
        }
        if let Ok(v) = std::env::var(ENV_API_BASE) {
            self.api_base = v;
        }
        if let Ok(v) = std::env::var(ENV_READ_TOKEN) {
            self.read_token = Some(v);
        }
        if let Ok(v) = std::env::var(ENV_WRITE_TOKEN) {
            self.write_token = Some(v);
        }
        if let Ok(v) = std::env::var(ENV_CONNECTOR_URL) {
            self.connector_url = v;
        }
        self
    }

    /// Token for the write store: the write token when configured, else the
    /// read token.
    #[must_use]
    pub fn effective_write_token(&self) -> Option<&str> {
        self.write_token.as_deref().or(self.read_token.as_deref())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::io::Write as _};

    #[test]
    fn defaults_fill_missing_fields() {
        let config = MarketplaceConfig::from_toml(r#"repo = "acme/skills""#).unwrap();
        assert_eq!(config.repo, "acme/skills");
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.registry_path, ".marketplace/registry.json");
        assert_eq!(config.access_path, ".marketplace/access.json");
        assert!(config.read_token.is_none());
    }

    #[test]
    fn write_token_falls_back_to_read_token() {
        let mut config = MarketplaceConfig::for_repo("acme/skills");
        assert!(config.effective_write_token().is_none());
        config.read_token = Some("r".into());
        assert_eq!(config.effective_write_token(), Some("r"));
        config.write_token = Some("w".into());
        assert_eq!(config.effective_write_token(), Some("w"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "repo = \"acme/skills\"\nread_token = \"tok\"\nregistry_path = \"registry.json\""
        )
        .unwrap();

        let config = MarketplaceConfig::load(file.path()).unwrap();
        assert_eq!(config.repo, "acme/skills");
        assert_eq!(config.read_token.as_deref(), Some("tok"));
        assert_eq!(config.registry_path, "registry.json");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(MarketplaceConfig::from_toml("repo = [not toml").is_err());
    }
}
