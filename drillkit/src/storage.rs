//! Supabase Storage adapter for [`ObjectStore`].
//!
//! Objects are written with upsert semantics, so re-uploading a content
//! derived key is harmless. Public URLs have the fixed shape
//! `{project}/storage/v1/object/public/{bucket}/{key}`, which is what lets a
//! delete recover the key from a stored URL.

use std::path::Path;

use async_trait::async_trait;
use drillkit_core::contract::ObjectStore;
use drillkit_core::error::{DrillError, Result};
use reqwest::Url;

use crate::load_config::SupabaseSettings;

pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(http: reqwest::Client, settings: &SupabaseSettings) -> Result<Self> {
        Url::parse(&settings.url).map_err(|e| {
            DrillError::Config(format!("invalid SUPABASE_URL '{}': {e}", settings.url))
        })?;
        tracing::info!(
            url = %settings.url,
            bucket = %settings.bucket,
            "Initialized Supabase storage client"
        );
        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            service_role_key: settings.service_role_key.clone(),
            bucket: settings.bucket.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key)
    }

    fn public_path_prefix(&self) -> String {
        format!("/storage/v1/object/public/{}/", self.bucket)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, local_file: &Path, key: &str, content_type: &str) -> Result<String> {
        let body = std::fs::read(local_file).map_err(|e| {
            tracing::error!(error = ?e, path = %local_file.display(), "Failed to read file for upload");
            DrillError::upload(&format!("reading {}", local_file.display()), e)
        })?;
        tracing::info!(key, content_type, size = body.len(), "Uploading object");

        let response = self
            .http
            .post(self.object_url(key))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, key, "Storage upload request failed");
                DrillError::upload(key, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(key, %status, body = %text, "Storage rejected upload");
            return Err(DrillError::Upload(format!("{key}: status {status}: {text}")));
        }

        let url = self.public_url_for(key);
        tracing::info!(key, url = %url, "Uploaded object");
        Ok(url)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        tracing::info!(key, "Deleting object");
        let response = self
            .http
            .delete(self.object_url(key))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, key, "Storage delete request failed");
                DrillError::backend(&format!("delete object {key}"), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(key, %status, body = %text, "Storage rejected delete");
            return Err(DrillError::Backend(format!(
                "delete object {key}: status {status}: {text}"
            )));
        }
        Ok(())
    }

    fn public_url_for(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, key
        )
    }

    fn key_from_url(&self, url: &str) -> Result<String> {
        let parsed =
            Url::parse(url).map_err(|e| DrillError::Parse(format!("invalid URL '{url}': {e}")))?;
        let prefix = self.public_path_prefix();
        let path = parsed.path();
        path.strip_prefix(&prefix)
            .or_else(|| path.strip_prefix(prefix.trim_start_matches('/')))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                DrillError::Parse(format!(
                    "URL '{url}' does not match the storage format for bucket '{}'",
                    self.bucket
                ))
            })
    }
}
