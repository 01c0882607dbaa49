use anyhow::Context;
use tokio::sync::RwLock;

use super::api_client::ScoringClient;
use super::models::RuntimeSettings;
use super::settings_store::{apply_env_overrides, SettingsStore};

pub struct CoreService {
    settings_store: SettingsStore,
    settings: RwLock<RuntimeSettings>,
    http: reqwest::Client,
}

impl CoreService {
    /// Loads persisted settings, applies environment overrides and then the
    /// per-run service URL override, if any.
    pub async fn new(service_url_override: Option<String>) -> anyhow::Result<Self> {
        Self::with_store(SettingsStore::new(), service_url_override).await
    }

    pub async fn with_store(
        settings_store: SettingsStore,
        service_url_override: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut settings = settings_store.load().await.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default settings");
            RuntimeSettings::default()
        });
        apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
        if let Some(url) = service_url_override {
            settings.service_url = url;
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("CvMatchClient/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            settings_store,
            settings: RwLock::new(settings),
            http,
        })
    }

    pub async fn get_settings(&self) -> RuntimeSettings {
        self.settings.read().await.clone()
    }

    pub fn settings_path(&self) -> &std::path::PathBuf {
        self.settings_store.path()
    }

    pub async fn scoring_client(&self) -> anyhow::Result<ScoringClient> {
        let settings = self.settings.read().await;
        ScoringClient::new(self.http.clone(), &settings)
    }

    /// Persists a new service root after checking that it parses.
    pub async fn save_service_url(&self, url: &str) -> anyhow::Result<RuntimeSettings> {
        let mut updated = self.settings_store.load().await.with_context(|| {
            format!(
                "refusing to overwrite unreadable settings file {}",
                self.settings_store.path().display()
            )
        })?;
        updated.service_url = url.trim().to_string();
        ScoringClient::new(self.http.clone(), &updated)?;

        self.settings_store.save(&updated).await?;
        tracing::info!(service_url = %updated.service_url, "service URL saved");

        let mut current = self.settings.write().await;
        current.service_url = updated.service_url.clone();
        Ok(updated)
    }
}
