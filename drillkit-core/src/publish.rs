//! Publish workflow: move a draft content record to published.

use tracing::{error, info};

use crate::contract::{ContentStatus, PublishTarget};
use crate::error::{DrillError, Result};

/// Single status transition, no retry. Backend failures surface as `DrillError::Publish`.
pub async fn publish<P>(target: &P, content_id: &str) -> Result<()>
where
    P: PublishTarget + ?Sized,
{
    let content_id = content_id.trim();
    if content_id.is_empty() {
        return Err(DrillError::InvalidInput(
            "content id must not be empty".to_string(),
        ));
    }

    info!(content_id, "[PUBLISH] Publishing content");
    match target.set_status(content_id, ContentStatus::Published).await {
        Ok(()) => {
            info!(content_id, "[PUBLISH] Published successfully");
            Ok(())
        }
        Err(DrillError::Publish(msg)) => {
            error!(content_id, error = %msg, "[PUBLISH][ERROR] Publish rejected");
            Err(DrillError::Publish(msg))
        }
        Err(e) => {
            error!(content_id, error = %e, "[PUBLISH][ERROR] Publish failed");
            Err(DrillError::Publish(e.to_string()))
        }
    }
}
