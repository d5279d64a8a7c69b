//! Front-end cache revalidation after a registration batch.

use async_trait::async_trait;
use drillkit_core::contract::Revalidator;
use drillkit_core::error::{DrillError, Result};

use crate::load_config::RevalidateSettings;

/// Cache tag covering every drill listing page.
pub const DRILLS_CACHE_TAG: &str = "drills";

pub struct HttpRevalidator {
    http: reqwest::Client,
    app_url: String,
    token: String,
}

impl HttpRevalidator {
    pub fn new(http: reqwest::Client, settings: &RevalidateSettings) -> Self {
        Self {
            http,
            app_url: settings.app_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        }
    }
}

#[async_trait]
impl Revalidator for HttpRevalidator {
    async fn revalidate(&self, tag: &str) -> Result<()> {
        let url = format!("{}/api/revalidate", self.app_url);
        let response = self
            .http
            .get(&url)
            .query(&[("tag", tag), ("secret", self.token.as_str())])
            .send()
            .await
            .map_err(|e| DrillError::backend("revalidate", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DrillError::Backend(format!(
                "revalidate: status {status}: {body}"
            )));
        }
        tracing::info!(tag, "Revalidated front-end cache");
        Ok(())
    }
}

/// Revalidate the drills tag when configured. Failures are logged, never returned.
pub async fn revalidate_drills<V: Revalidator + ?Sized>(revalidator: Option<&V>) {
    let Some(revalidator) = revalidator else {
        tracing::info!("Revalidation skipped: APP_URL or REVALIDATE_TOKEN not set");
        return;
    };
    if let Err(e) = revalidator.revalidate(DRILLS_CACHE_TAG).await {
        tracing::warn!(error = %e, "Cache revalidation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drillkit_core::contract::MockRevalidator;

    #[tokio::test]
    async fn failures_are_swallowed() {
        let mut revalidator = MockRevalidator::new();
        revalidator
            .expect_revalidate()
            .withf(|tag| tag == DRILLS_CACHE_TAG)
            .times(1)
            .returning(|_| Err(DrillError::Backend("status 401".into())));
        revalidate_drills(Some(&revalidator)).await;
    }

    #[tokio::test]
    async fn unset_revalidator_is_a_no_op() {
        revalidate_drills::<MockRevalidator>(None).await;
    }
}
