//! Registration workflow: fingerprint -> lookup -> render -> upload -> record.
//!
//! Each input PDF is processed on its own. Identical content is detected by
//! the public URL its content-derived storage key would produce; a match only
//! resyncs the drill's tags. Failures are isolated per file and reported, the
//! batch keeps going, and nothing already done is rolled back.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, error, info};

use crate::contract::{DrillField, MetadataRepository, NewDrill, ObjectStore, ThumbnailRenderer};
use crate::error::{DrillError, Result};
use crate::fingerprint::{file_fingerprint, StorageKeys};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// One `register` invocation.
#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub pdf_paths: Vec<PathBuf>,
    pub tags: Vec<String>,
    pub description: Option<String>,
    /// Only valid for a single input file.
    pub title_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Registered { drill_id: String, title: String },
    /// Content was already registered; only its tag set was replaced.
    TagsUpdated { drill_id: String, title: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub files: Vec<FileReport>,
}

impl RegistrationReport {
    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
            .count()
    }

    pub fn registered(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Registered { .. }))
            .count()
    }

    pub fn updated(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::TagsUpdated { .. }))
            .count()
    }
}

/// Split a comma-separated tag list: trimmed, empties dropped, first occurrence wins.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Blank descriptions are stored as absent.
pub fn normalize_description(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// File name without its extension.
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub struct Registrar<'a, S, R, T> {
    store: &'a S,
    repo: &'a R,
    renderer: &'a T,
}

impl<'a, S, R, T> Registrar<'a, S, R, T>
where
    S: ObjectStore,
    R: MetadataRepository,
    T: ThumbnailRenderer,
{
    pub fn new(store: &'a S, repo: &'a R, renderer: &'a T) -> Self {
        Self {
            store,
            repo,
            renderer,
        }
    }

    /// Register every file of the request in order.
    ///
    /// Only a batch-level problem (a title override with several inputs) is
    /// returned as an error; per-file failures end up in the report.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegistrationReport> {
        if request.title_override.is_some() && request.pdf_paths.len() > 1 {
            error!(
                files = request.pdf_paths.len(),
                "Refusing title override for multiple files"
            );
            return Err(DrillError::InvalidInput(
                "cannot specify --title when registering multiple files".to_string(),
            ));
        }

        info!(
            files = request.pdf_paths.len(),
            tags = ?request.tags,
            "[REGISTER] Starting registration batch"
        );

        let mut report = RegistrationReport::default();
        for path in &request.pdf_paths {
            info!(path = %path.display(), "[REGISTER] Processing file");
            let outcome = match self.register_file(path, request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "[REGISTER][ERROR] File aborted");
                    FileOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.files.push(FileReport {
                path: path.clone(),
                outcome,
            });
        }

        info!(
            registered = report.registered(),
            updated = report.updated(),
            failed = report.failed(),
            "[REGISTER] Batch finished"
        );
        Ok(report)
    }

    async fn register_file(&self, path: &Path, request: &RegisterRequest) -> Result<FileOutcome> {
        let fingerprint = file_fingerprint(path)?;
        debug!(path = %path.display(), fingerprint = %fingerprint, "Computed file hash");

        let keys = StorageKeys::from_fingerprint(&fingerprint);
        let pdf_url = self.store.public_url_for(&keys.pdf);

        if let Some(existing) = self.repo.find_drill(DrillField::PdfUrl, &pdf_url).await? {
            info!(
                drill_id = %existing.id,
                title = %existing.title,
                "[REGISTER] Drill already exists, skipping upload and updating tags"
            );
            self.sync_tags(&existing.id, &request.tags).await?;
            return Ok(FileOutcome::TagsUpdated {
                drill_id: existing.id,
                title: existing.title,
            });
        }

        // Dropping the guard removes the rendered image on every path out of here.
        let thumbnail = TempPath::from_path(self.renderer.render(path)?);

        info!(key = %keys.pdf, "[REGISTER] Uploading PDF");
        let uploaded_pdf_url = self.store.upload(path, &keys.pdf, PDF_CONTENT_TYPE).await?;

        info!(key = %keys.thumbnail, "[REGISTER] Uploading thumbnail");
        let thumbnail_url = self
            .store
            .upload(&thumbnail, &keys.thumbnail, THUMBNAIL_CONTENT_TYPE)
            .await?;

        let title = request
            .title_override
            .clone()
            .unwrap_or_else(|| title_from_path(path));

        let drill_id = self
            .repo
            .create_drill(NewDrill {
                title: title.clone(),
                description: request.description.clone(),
                pdf_url: uploaded_pdf_url,
                thumbnail_url,
            })
            .await?;
        info!(drill_id = %drill_id, title = %title, "[REGISTER] Drill registered");

        self.sync_tags(&drill_id, &request.tags).await?;
        Ok(FileOutcome::Registered { drill_id, title })
    }

    /// Upsert every tag by name, then make them the drill's complete tag set.
    async fn sync_tags(&self, drill_id: &str, tags: &[String]) -> Result<()> {
        let mut tag_ids = Vec::with_capacity(tags.len());
        for name in tags {
            let id = self.repo.upsert_tag(name).await?;
            debug!(tag = %name, tag_id = %id, "Upserted tag");
            tag_ids.push(id);
        }
        self.repo.replace_links(drill_id, tag_ids).await?;
        info!(drill_id, tags = tags.len(), "[REGISTER] Tags synchronised");
        Ok(())
    }
}
