use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::errors::CoreError;
use super::models::{AnalysisResponse, RuntimeSettings, ServiceInfo, UploadCandidate};

const ANALYZE_PATH: &str = "analyze";
const CV_FILE_FIELD: &str = "cv_file";
const JOB_OFFER_FIELD: &str = "job_offer";
const FALLBACK_ERROR_DETAIL: &str = "Analysis failed";

/// HTTP client for the scoring service.
pub struct ScoringClient {
    client: Client,
    root_url: Url,
    analyze_url: Url,
}

impl ScoringClient {
    pub fn new(client: Client, settings: &RuntimeSettings) -> anyhow::Result<Self> {
        let trimmed = settings.service_url.trim();
        let root_text = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let root_url = Url::parse(&root_text)
            .with_context(|| format!("invalid service URL '{}'", settings.service_url))?;

        let prefix = settings.api_prefix.trim().trim_matches('/');
        let api_base = if prefix.is_empty() {
            root_url.clone()
        } else {
            root_url
                .join(&format!("{prefix}/"))
                .with_context(|| format!("invalid API prefix '{}'", settings.api_prefix))?
        };
        let analyze_url = api_base.join(ANALYZE_PATH)?;

        Ok(Self {
            client,
            root_url,
            analyze_url,
        })
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    pub fn analyze_url(&self) -> &Url {
        &self.analyze_url
    }

    pub async fn analyze(
        &self,
        file: &UploadCandidate,
        job_offer: &str,
    ) -> Result<AnalysisResponse, CoreError> {
        let bytes = file.read_bytes().await.map_err(|err| {
            tracing::error!(file = %file.name, error = %err, "failed to read CV before upload");
            CoreError::FileUnreadable {
                name: file.name.clone(),
                reason: err.to_string(),
            }
        })?;

        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|_| CoreError::UnsupportedFileType {
                media_type: file.media_type.clone(),
            })?;

        let form = Form::new()
            .part(CV_FILE_FIELD, part)
            .text(JOB_OFFER_FIELD, job_offer.to_string());

        let response = self
            .client
            .post(self.analyze_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(url = %self.analyze_url, error = %err, "failed to reach analysis service");
                CoreError::Connection(err.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            tracing::error!(url = %self.analyze_url, error = %err, "failed to read analysis response");
            CoreError::Connection(err.to_string())
        })?;

        if !status.is_success() {
            let detail = error_detail(&body);
            tracing::warn!(status = status.as_u16(), %detail, "analysis rejected by service");
            return Err(CoreError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        tracing::debug!(response = %body, "analysis response received");

        serde_json::from_str::<AnalysisResponse>(&body)
            .map_err(|err| CoreError::InvalidResponse(err.to_string()))
    }

    /// True iff the service root answers with a 2xx status.
    pub async fn check_health(&self) -> bool {
        match self.client.get(self.root_url.clone()).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(url = %self.root_url, error = %err, "health probe failed");
                false
            }
        }
    }

    pub async fn service_info(&self) -> Option<ServiceInfo> {
        let response = self.client.get(self.root_url.clone()).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }

        response.json::<ServiceInfo>().await.ok()
    }
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .get("detail")
                .and_then(Value::as_str)
                .filter(|detail| !detail.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_ERROR_DETAIL.to_string())
}
