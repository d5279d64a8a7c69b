//! # contract: seams between the drill workflows and the outside world
//!
//! Every external collaborator a workflow talks to is described here as a
//! trait, together with the plain data types that cross the boundary:
//!
//! - [`ObjectStore`]: key-addressed file storage with public URLs.
//! - [`MetadataRepository`]: drills, tags and the links between them.
//! - [`PublishTarget`]: draft/published status of a content record.
//! - [`ThumbnailRenderer`]: first-page rasterisation of a PDF.
//! - [`Confirmer`]: operator confirmation before a destructive delete.
//! - [`Revalidator`]: cache invalidation of the public front end.
//!
//! Concrete HTTP adapters live in the `drillkit` binary crate. Workflows are
//! generic over these traits so tests can substitute mocks or in-memory fakes.
//!
//! ## Mocking & Testing
//! Each trait is annotated for `mockall`; with the `test-export-mocks` feature
//! (on by default) the generated `Mock*` types are exported for downstream
//! integration tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[allow(unused_imports)]
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A registered drill as stored by the metadata backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drill {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub pdf_url: String,
    pub thumbnail_url: String,
}

/// Fields needed to create a drill; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDrill {
    pub title: String,
    pub description: Option<String>,
    pub pdf_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Lookup keys accepted by [`MetadataRepository::find_drill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillField {
    Title,
    PdfUrl,
}

impl DrillField {
    /// Column name in the `drills` table.
    pub fn column(&self) -> &'static str {
        match self {
            DrillField::Title => "title",
            DrillField::PdfUrl => "pdf_url",
        }
    }
}

/// Lifecycle state of a content record. Publishing is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    Draft,
    Published,
}

/// Key-addressed object storage.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`, returning its public URL.
    async fn upload(&self, local_file: &Path, key: &str, content_type: &str) -> Result<String>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Public URL an object stored under `key` is (or would be) served from.
    fn public_url_for(&self, key: &str) -> String;

    /// Inverse of [`ObjectStore::public_url_for`]. Fails with `DrillError::Parse`
    /// when the URL does not belong to this store.
    fn key_from_url(&self, url: &str) -> Result<String>;
}

/// Persistence for drills, tags and drill-tag links.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// Insert a drill and return the backend-assigned id.
    async fn create_drill(&self, drill: NewDrill) -> Result<String>;

    async fn find_drill(&self, field: DrillField, value: &str) -> Result<Option<Drill>>;

    /// Remove a drill together with its tag links.
    async fn delete_drill(&self, drill_id: &str) -> Result<()>;

    /// Return the id of the tag named `name`, creating it when absent.
    async fn upsert_tag(&self, name: &str) -> Result<String>;

    async fn find_tags_for_drill(&self, drill_id: &str) -> Result<Vec<Tag>>;

    /// Number of drills linked to the tag.
    async fn count_drills_for_tag(&self, tag_id: &str) -> Result<u64>;

    async fn delete_tag(&self, tag_id: &str) -> Result<()>;

    /// Drop every existing link of the drill, then link exactly `tag_ids`.
    async fn replace_links(&self, drill_id: &str, tag_ids: Vec<String>) -> Result<()>;
}

/// Status transitions of content records (draft -> published).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PublishTarget: Send + Sync {
    async fn set_status(&self, content_id: &str, status: ContentStatus) -> Result<()>;
}

/// Renders the first page of a PDF into an image next to the source file.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ThumbnailRenderer: Send + Sync {
    /// Returns the path of the generated image. The caller owns (and removes) it.
    fn render(&self, source_pdf: &Path) -> Result<PathBuf>;
}

/// Everything a delete is about to remove, shown to the operator before acting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    pub drill: Drill,
    pub pdf_key: Option<String>,
    pub thumbnail_key: Option<String>,
    pub orphan_tags: Vec<Tag>,
    pub kept_tags: Vec<Tag>,
}

impl DeletionPlan {
    /// Storage keys that resolved from the drill's URLs, in deletion order.
    pub fn file_keys(&self) -> Vec<&str> {
        [self.pdf_key.as_deref(), self.thumbnail_key.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Operator confirmation for destructive operations.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Confirmer: Send + Sync {
    /// `Ok(true)` only on an explicit affirmative answer.
    fn confirm(&self, plan: &DeletionPlan) -> Result<bool>;
}

/// Invalidates cached pages of the public site for a cache tag.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Revalidator: Send + Sync {
    async fn revalidate(&self, tag: &str) -> Result<()>;
}
