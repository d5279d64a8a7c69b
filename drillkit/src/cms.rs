//! microCMS management API client for draft/published transitions.

use async_trait::async_trait;
use drillkit_core::contract::{ContentStatus, PublishTarget};
use drillkit_core::error::{DrillError, Result};
use reqwest::StatusCode;
use serde::Serialize;

use crate::load_config::MicroCmsSettings;

const ENDPOINT: &str = "drills";
const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

#[derive(Serialize)]
struct StatusBody {
    status: [&'static str; 1],
}

fn status_value(status: ContentStatus) -> &'static str {
    match status {
        ContentStatus::Draft => "DRAFT",
        ContentStatus::Published => "PUBLISH",
    }
}

pub struct MicroCmsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MicroCmsClient {
    pub fn new(http: reqwest::Client, settings: &MicroCmsSettings) -> Self {
        let base_url = format!(
            "https://{}.microcms-management.io/api/v1",
            settings.service_domain
        );
        tracing::info!(base_url = %base_url, "Initialized microCMS management client");
        Self {
            http,
            base_url,
            api_key: settings.api_key.clone(),
        }
    }

    /// Point the client at another API root, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn status_url(&self, content_id: &str) -> String {
        format!("{}/contents/{}/{}/status", self.base_url, ENDPOINT, content_id)
    }
}

#[async_trait]
impl PublishTarget for MicroCmsClient {
    async fn set_status(&self, content_id: &str, status: ContentStatus) -> Result<()> {
        let url = self.status_url(content_id);
        tracing::info!(content_id, ?status, url = %url, "Updating content status");

        let response = self
            .http
            .patch(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&StatusBody {
                status: [status_value(status)],
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, content_id, "microCMS request failed");
                DrillError::Publish(format!("request to {url} failed: {e}"))
            })?;

        let code = response.status();
        if code == StatusCode::OK || code == StatusCode::ACCEPTED {
            tracing::info!(content_id, status = %code, "Content status updated");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!(content_id, status = %code, body = %body, "microCMS rejected status change");
        Err(DrillError::Publish(format!("status {code}: {body}")))
    }
}
