//! Deletion workflow: remove a drill, its stored files and the tags only it used.
//!
//! Orphan tags are decided before anything is deleted: a tag linked to
//! exactly one drill (the one going away) is removed afterwards, every other
//! tag is kept. Removing the record is the only step whose failure stops the
//! run; file and tag cleanup after it is best effort.

use tracing::{error, info, warn};

use crate::contract::{
    Confirmer, DeletionPlan, DrillField, MetadataRepository, ObjectStore, Tag,
};
use crate::error::{DrillError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The operator declined; nothing was touched.
    Cancelled,
    Deleted(DeletionReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub drill_id: String,
    pub deleted_files: Vec<String>,
    pub failed_files: Vec<String>,
    pub deleted_tags: Vec<String>,
    pub failed_tags: Vec<String>,
    pub kept_tags: Vec<String>,
}

pub struct Deleter<'a, S, R, C> {
    store: &'a S,
    repo: &'a R,
    confirmer: &'a C,
}

impl<'a, S, R, C> Deleter<'a, S, R, C>
where
    S: ObjectStore,
    R: MetadataRepository,
    C: Confirmer,
{
    pub fn new(store: &'a S, repo: &'a R, confirmer: &'a C) -> Self {
        Self {
            store,
            repo,
            confirmer,
        }
    }

    /// Work out what deleting `title` would remove, without changing anything.
    pub async fn plan(&self, title: &str) -> Result<DeletionPlan> {
        let drill = self
            .repo
            .find_drill(DrillField::Title, title)
            .await?
            .ok_or_else(|| DrillError::NotFound(format!("drill with title '{title}'")))?;
        info!(drill_id = %drill.id, title = %drill.title, "[DELETE] Found drill");

        let tags = self.repo.find_tags_for_drill(&drill.id).await?;
        let (orphan_tags, kept_tags) = self.partition_orphans(tags).await;

        let pdf_key = self.resolve_key(&drill.pdf_url, "PDF");
        let thumbnail_key = self.resolve_key(&drill.thumbnail_url, "thumbnail");

        Ok(DeletionPlan {
            drill,
            pdf_key,
            thumbnail_key,
            orphan_tags,
            kept_tags,
        })
    }

    pub async fn delete(&self, title: &str, force: bool) -> Result<DeletionOutcome> {
        let plan = self.plan(title).await?;

        if !force && !self.confirmer.confirm(&plan)? {
            info!(title, "[DELETE] Operation cancelled by operator");
            return Ok(DeletionOutcome::Cancelled);
        }

        self.execute(plan).await.map(DeletionOutcome::Deleted)
    }

    async fn execute(&self, plan: DeletionPlan) -> Result<DeletionReport> {
        let mut report = DeletionReport {
            drill_id: plan.drill.id.clone(),
            kept_tags: plan.kept_tags.iter().map(|t| t.name.clone()).collect(),
            ..Default::default()
        };

        info!(drill_id = %plan.drill.id, "[DELETE] Deleting drill record");
        if let Err(e) = self.repo.delete_drill(&plan.drill.id).await {
            error!(drill_id = %plan.drill.id, error = %e, "[DELETE][ERROR] Failed to delete drill");
            return Err(e);
        }

        for key in plan.file_keys() {
            info!(key, "[DELETE] Deleting stored file");
            match self.store.delete(key).await {
                Ok(()) => report.deleted_files.push(key.to_string()),
                Err(e) => {
                    error!(key, error = %e, "[DELETE][ERROR] Failed to delete file");
                    report.failed_files.push(key.to_string());
                }
            }
        }

        for tag in &plan.orphan_tags {
            info!(tag = %tag.name, "[DELETE] Deleting unused tag");
            match self.repo.delete_tag(&tag.id).await {
                Ok(()) => report.deleted_tags.push(tag.name.clone()),
                Err(e) => {
                    error!(tag = %tag.name, error = %e, "[DELETE][ERROR] Failed to delete tag");
                    report.failed_tags.push(tag.name.clone());
                }
            }
        }

        info!(
            drill_id = %report.drill_id,
            files = report.deleted_files.len(),
            tags = report.deleted_tags.len(),
            "[DELETE] Deletion complete"
        );
        Ok(report)
    }

    /// Split tags into (orphans, kept). A tag whose usage cannot be counted is kept.
    async fn partition_orphans(&self, tags: Vec<Tag>) -> (Vec<Tag>, Vec<Tag>) {
        let mut orphans = Vec::new();
        let mut kept = Vec::new();
        for tag in tags {
            match self.repo.count_drills_for_tag(&tag.id).await {
                Ok(1) => orphans.push(tag),
                Ok(count) => {
                    info!(tag = %tag.name, count, "Tag still in use, keeping");
                    kept.push(tag);
                }
                Err(e) => {
                    warn!(tag = %tag.name, error = %e, "Failed to count usage for tag, keeping it");
                    kept.push(tag);
                }
            }
        }
        (orphans, kept)
    }

    fn resolve_key(&self, url: &str, kind: &str) -> Option<String> {
        match self.store.key_from_url(url) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(
                    url,
                    kind,
                    error = %e,
                    "Could not parse storage URL, the file will not be deleted"
                );
                None
            }
        }
    }
}
