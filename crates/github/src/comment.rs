use anyhow::{Context, Result, anyhow};
use axum::http::StatusCode;
use jsonwebtoken::EncodingKey;
use octocrab::{
    Octocrab,
    models::{AppId, InstallationId},
};
use pr_sandbox_core::config::GitHubConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommentError {
    #[error("Missing GITHUB_APP_ID or GITHUB_PRIVATE_KEY environment variables")]
    MissingCredentials,
    /// Authentication or API failure. The source is only ever logged.
    #[error("Failed to create review comment")]
    Upstream(#[source] anyhow::Error),
}

impl CommentError {
    pub fn status(&self) -> StatusCode { StatusCode::INTERNAL_SERVER_ERROR }

    pub fn body(&self) -> Value { json!({ "error": self.to_string() }) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    App,
    Installation(InstallationId),
}

/// GitHub App credentials for a single publish call.
pub struct AppAuth {
    app_id: AppId,
    key: EncodingKey,
    mode: AuthMode,
    api_url: Option<String>,
}

impl AppAuth {
    pub fn from_config(config: &GitHubConfig) -> Result<Self, CommentError> {
        let (Some(app_id), Some(private_key)) =
            (non_empty(&config.app_id), non_empty(&config.private_key))
        else {
            return Err(CommentError::MissingCredentials);
        };
        let app_id = parse_id("GITHUB_APP_ID", app_id).map_err(CommentError::Upstream)?;
        let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
            .context("Failed to parse GitHub App private key")
            .map_err(CommentError::Upstream)?;
        let mode = match non_empty(&config.installation_id) {
            Some(id) => AuthMode::Installation(
                parse_id("GITHUB_INSTALLATION_ID", id).map_err(CommentError::Upstream)?.into(),
            ),
            None => AuthMode::App,
        };
        Ok(Self { app_id: app_id.into(), key, mode, api_url: config.api_url.clone() })
    }

    pub fn mode(&self) -> AuthMode { self.mode }

    fn app_client(&self) -> Result<Octocrab> {
        let mut builder = Octocrab::builder().app(self.app_id, self.key.clone());
        if let Some(api_url) = &self.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .with_context(|| format!("Invalid GitHub API URL {api_url}"))?;
        }
        builder.build().context("Failed to create GitHub client")
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_id(key: &str, value: &str) -> Result<u64> {
    value.parse().with_context(|| format!("{key} must be an integer, got {value:?}"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    pub id: u64,
    pub url: String,
}

impl ReviewComment {
    /// `{"ok": true, "commentId": .., "commentUrl": ..}`
    pub fn receipt(&self) -> Value {
        json!({ "ok": true, "commentId": self.id, "commentUrl": self.url })
    }
}

#[derive(Deserialize)]
struct AuthenticatedApp {
    id: u64,
    slug: Option<String>,
}

#[derive(Deserialize)]
struct CreatedComment {
    id: u64,
    html_url: String,
}

#[derive(Serialize)]
struct CreateComment<'a> {
    body: &'a str,
}

/// Post `body` as a comment on pull request `owner/repo#pr_number`, authenticating as the
/// configured GitHub App. Credentials are re-read from `config` on every call.
pub async fn publish_comment(
    config: &GitHubConfig,
    owner: &str,
    repo: &str,
    pr_number: u64,
    body: &str,
) -> Result<ReviewComment, CommentError> {
    let auth = AppAuth::from_config(config).inspect_err(|e| {
        if let CommentError::Upstream(source) = e {
            tracing::error!("Failed to create review comment: {source:?}");
        }
    })?;
    create_comment(&auth, owner, repo, pr_number, body).await.map_err(|e| {
        tracing::error!(owner, repo, pr_number, "Failed to create review comment: {e:?}");
        CommentError::Upstream(e)
    })
}

async fn create_comment(
    auth: &AppAuth,
    owner: &str,
    repo: &str,
    pr_number: u64,
    body: &str,
) -> Result<ReviewComment> {
    let app_client = auth.app_client()?;
    let app: Option<AuthenticatedApp> = app_client
        .get("/app", None::<&()>)
        .await
        .context("Failed to fetch authenticated app")?;
    let app = app.ok_or_else(|| anyhow!("Authenticated app lookup returned no data"))?;
    tracing::info!(
        "Authenticated as app {} ({})",
        app.slug.as_deref().unwrap_or("[unknown]"),
        app.id
    );

    let client = match auth.mode {
        AuthMode::App => app_client,
        AuthMode::Installation(installation_id) => {
            app_client.installation(installation_id).with_context(|| {
                format!("Failed to create client for installation {installation_id}")
            })?
        }
    };
    let created: CreatedComment = client
        .post(
            format!("/repos/{owner}/{repo}/issues/{pr_number}/comments"),
            Some(&CreateComment { body }),
        )
        .await
        .with_context(|| format!("Failed to create comment on {owner}/{repo}#{pr_number}"))?;
    tracing::info!("Created comment {} on {}/{}#{}", created.id, owner, repo, pr_number);
    Ok(ReviewComment { id: created.id, url: created.html_url })
}
