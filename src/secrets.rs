//! Startup-time sources for database credentials.
//!
//! A provider is consulted exactly once, while [`AppConfig`](crate::config::AppConfig)
//! is being built; handlers only ever see the resolved configuration.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecretSource {
    /// `DATABASE_URL` from the environment is used as-is.
    Env,
    /// A mounted JSON file, e.g. a container orchestrator secret.
    File(PathBuf),
    /// A secret-store endpoint returning the JSON document over HTTP.
    Http { url: String, token: Option<String> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DatabaseSecret {
    pub database_url: Option<String>,
}

#[async_trait]
pub trait SecretProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn database_secret(&self) -> Result<DatabaseSecret, ConfigError>;
}

pub fn provider_for(source: &SecretSource) -> Result<Box<dyn SecretProvider>, ConfigError> {
    Ok(match source {
        SecretSource::Env => Box::new(EnvSecretProvider),
        SecretSource::File(path) => Box::new(FileSecretProvider::new(path.clone())),
        SecretSource::Http { url, token } => {
            Box::new(HttpSecretProvider::new(url.clone(), token.clone())?)
        }
    })
}

pub struct EnvSecretProvider;

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    fn name(&self) -> &'static str {
        "env"
    }

    // The environment was already read into the base configuration.
    async fn database_secret(&self) -> Result<DatabaseSecret, ConfigError> {
        Ok(DatabaseSecret::default())
    }
}

pub struct FileSecretProvider {
    path: PathBuf,
}

impl FileSecretProvider {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SecretProvider for FileSecretProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn database_secret(&self) -> Result<DatabaseSecret, ConfigError> {
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

pub struct HttpSecretProvider {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpSecretProvider {
    pub fn new(url: String, token: Option<String>) -> Result<Self, ConfigError> {
        let client = Client::builder().build()?;
        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl SecretProvider for HttpSecretProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn database_secret(&self) -> Result<DatabaseSecret, ConfigError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let secret = request
            .send()
            .await?
            .error_for_status()?
            .json::<DatabaseSecret>()
            .await?;
        Ok(secret)
    }
}
