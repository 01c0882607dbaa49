use std::path::PathBuf;

use anyhow::Context;

use super::models::RuntimeSettings;

pub const SERVICE_URL_ENV: &str = "CV_MATCH_SERVICE_URL";
pub const API_PREFIX_ENV: &str = "CV_MATCH_API_PREFIX";

pub struct SettingsStore {
    file_path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            file_path: settings_path(),
        }
    }

    pub fn new_with_path(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }

    pub async fn load(&self) -> anyhow::Result<RuntimeSettings> {
        if !tokio::fs::try_exists(&self.file_path)
            .await
            .unwrap_or(false)
        {
            return Ok(RuntimeSettings::default());
        }

        let content = tokio::fs::read_to_string(&self.file_path)
            .await
            .with_context(|| {
                format!("failed to read settings file {}", self.file_path.display())
            })?;

        let parsed = serde_json::from_str::<RuntimeSettings>(&content).with_context(|| {
            format!("invalid JSON in settings file {}", self.file_path.display())
        })?;

        Ok(parsed)
    }

    pub async fn save(&self, settings: &RuntimeSettings) -> anyhow::Result<()> {
        if let Some(parent) = self.file_path.parent() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create settings directory {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(settings).context("failed to serialize settings")?;
        tokio::fs::write(&self.file_path, json)
            .await
            .with_context(|| {
                format!("failed to write settings file {}", self.file_path.display())
            })?;
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment values win over the persisted file. Blank values are ignored.
pub fn apply_env_overrides<F>(settings: &mut RuntimeSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(SERVICE_URL_ENV).filter(|v| !v.trim().is_empty()) {
        settings.service_url = url.trim().to_string();
    }

    if let Some(prefix) = lookup(API_PREFIX_ENV) {
        settings.api_prefix = prefix.trim().to_string();
    }
}

fn settings_path() -> PathBuf {
    app_data_root().join("client-settings.json")
}

pub fn app_data_root() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(local_app_data) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(local_app_data).join("CvMatch");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("CvMatch");
        }
    }

    if let Some(path) = dirs::data_local_dir() {
        return path.join("CvMatch");
    }

    PathBuf::from(".").join("CvMatch")
}
