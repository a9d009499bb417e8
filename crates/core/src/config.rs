use std::{env, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self { Self { port: DEFAULT_PORT } }
}

fn default_port() -> u16 { DEFAULT_PORT }

/// GitHub settings. App and installation ids are kept as written and only parsed when a
/// comment is published, so a bad publisher credential never stops the webhook server.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// Shared secret for `X-Hub-Signature-256`. Empty means every delivery is rejected.
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default, deserialize_with = "id_string")]
    pub app_id: Option<String>,
    pub private_key: Option<String>,
    /// When set, comments are posted as this installation instead of the bare app.
    #[serde(default, deserialize_with = "id_string")]
    pub installation_id: Option<String>,
    /// Override for the REST API base, e.g. a GitHub Enterprise host.
    pub api_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Id {
    Number(u64),
    Text(String),
}

// Accept both `app_id: 123` and `app_id: "123"` in config.yml.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    }))
}

impl Config {
    /// Load `config.yml` (if present) and apply environment overrides on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Config = if path.exists() {
            let file = BufReader::new(
                File::open(path)
                    .with_context(|| format!("Failed to open config file {}", path.display()))?,
            );
            serde_yaml::from_reader(file)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Apply `GITHUB_*` overrides from `lookup`. Empty values count as unset.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let github = &mut self.github;
        if let Some(secret) = lookup("GITHUB_WEBHOOK_SECRET") {
            github.webhook_secret = secret;
        }
        if let Some(app_id) = lookup("GITHUB_APP_ID") {
            github.app_id = Some(app_id);
        }
        if let Some(private_key) = lookup("GITHUB_PRIVATE_KEY") {
            github.private_key = Some(normalize_pem(&private_key));
        }
        if let Some(installation_id) = lookup("GITHUB_INSTALLATION_ID") {
            github.installation_id = Some(installation_id);
        }
        if let Some(api_url) = lookup("GITHUB_API_URL") {
            github.api_url = Some(api_url);
        }
    }
}

// Keys pasted into a single-line env var usually carry literal `\n` escapes.
fn normalize_pem(value: &str) -> String {
    if value.contains("\\n") { value.replace("\\n", "\n") } else { value.to_string() }
}
