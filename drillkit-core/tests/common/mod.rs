//! In-memory backends shared by the workflow integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use drillkit_core::contract::{
    Confirmer, DeletionPlan, Drill, DrillField, MetadataRepository, NewDrill, ObjectStore, Tag,
    ThumbnailRenderer,
};
use drillkit_core::{DrillError, Result};

pub const PUBLIC_BASE: &str = "https://files.test/storage/v1/object/public/drills";

/// Object store keeping uploaded bytes in a map.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
    pub uploads: Mutex<Vec<String>>,
    /// Uploads and deletes of keys starting with this prefix fail.
    pub fail_prefix: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn fail_on(&self, prefix: &str) {
        *self.fail_prefix.lock().unwrap() = Some(prefix.to_string());
    }

    fn should_fail(&self, key: &str) -> bool {
        self.fail_prefix
            .lock()
            .unwrap()
            .as_deref()
            .map(|p| key.starts_with(p))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, local_file: &Path, key: &str, _content_type: &str) -> Result<String> {
        if self.should_fail(key) {
            return Err(DrillError::Upload(format!("injected failure for {key}")));
        }
        let bytes = std::fs::read(local_file)?;
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(self.public_url_for(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.should_fail(key) {
            return Err(DrillError::Upload(format!("injected failure for {key}")));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url_for(&self, key: &str) -> String {
        format!("{PUBLIC_BASE}/{key}")
    }

    fn key_from_url(&self, url: &str) -> Result<String> {
        url.strip_prefix(&format!("{PUBLIC_BASE}/"))
            .map(str::to_string)
            .ok_or_else(|| DrillError::Parse(format!("not a store URL: {url}")))
    }
}

#[derive(Default)]
struct RepoState {
    next_id: u32,
    drills: BTreeMap<String, Drill>,
    tags: BTreeMap<String, Tag>,
    links: BTreeSet<(String, String)>,
}

/// Metadata repository with the same uniqueness rules as the real tables.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<RepoState>,
}

impl MemoryRepository {
    pub fn drills(&self) -> Vec<Drill> {
        self.state.lock().unwrap().drills.values().cloned().collect()
    }

    pub fn tag_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .tags
            .values()
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn tag_id(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .tags
            .values()
            .find(|t| t.name == name)
            .map(|t| t.id.clone())
    }

    pub fn link_count(&self) -> usize {
        self.state.lock().unwrap().links.len()
    }

    pub fn tags_of(&self, title: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let Some(drill) = state.drills.values().find(|d| d.title == title) else {
            return Vec::new();
        };
        let mut names: Vec<String> = state
            .links
            .iter()
            .filter(|(d, _)| *d == drill.id)
            .filter_map(|(_, t)| state.tags.get(t).map(|t| t.name.clone()))
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl MetadataRepository for MemoryRepository {
    async fn create_drill(&self, drill: NewDrill) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("drill-{}", state.next_id);
        state.drills.insert(
            id.clone(),
            Drill {
                id: id.clone(),
                title: drill.title,
                description: drill.description,
                pdf_url: drill.pdf_url,
                thumbnail_url: drill.thumbnail_url,
            },
        );
        Ok(id)
    }

    async fn find_drill(&self, field: DrillField, value: &str) -> Result<Option<Drill>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .drills
            .values()
            .find(|d| match field {
                DrillField::Title => d.title == value,
                DrillField::PdfUrl => d.pdf_url == value,
            })
            .cloned())
    }

    async fn delete_drill(&self, drill_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.links.retain(|(d, _)| d != drill_id);
        state.drills.remove(drill_id);
        Ok(())
    }

    async fn upsert_tag(&self, name: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if let Some(tag) = state.tags.values().find(|t| t.name == name) {
            return Ok(tag.id.clone());
        }
        state.next_id += 1;
        let id = format!("tag-{}", state.next_id);
        state.tags.insert(
            id.clone(),
            Tag {
                id: id.clone(),
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    async fn find_tags_for_drill(&self, drill_id: &str) -> Result<Vec<Tag>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .links
            .iter()
            .filter(|(d, _)| d == drill_id)
            .filter_map(|(_, t)| state.tags.get(t).cloned())
            .collect())
    }

    async fn count_drills_for_tag(&self, tag_id: &str) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state.links.iter().filter(|(_, t)| t == tag_id).count() as u64)
    }

    async fn delete_tag(&self, tag_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.links.retain(|(_, t)| t != tag_id);
        state.tags.remove(tag_id);
        Ok(())
    }

    async fn replace_links(&self, drill_id: &str, tag_ids: Vec<String>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.links.retain(|(d, _)| d != drill_id);
        for tag_id in tag_ids {
            state.links.insert((drill_id.to_string(), tag_id));
        }
        Ok(())
    }
}

/// Writes a small fake JPEG next to the PDF and remembers where.
#[derive(Default)]
pub struct FakeRenderer {
    pub rendered: Mutex<Vec<PathBuf>>,
    pub fail: bool,
}

impl FakeRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn rendered(&self) -> Vec<PathBuf> {
        self.rendered.lock().unwrap().clone()
    }
}

impl ThumbnailRenderer for FakeRenderer {
    fn render(&self, source_pdf: &Path) -> Result<PathBuf> {
        if self.fail {
            return Err(DrillError::Render {
                path: source_pdf.to_path_buf(),
                output: "convert: no images defined".to_string(),
            });
        }
        let out = source_pdf.with_extension("jpg");
        std::fs::write(&out, b"\xff\xd8\xff fake jpeg")?;
        self.rendered.lock().unwrap().push(out.clone());
        Ok(out)
    }
}

/// Fixed operator answer that also records the plan it was shown.
pub struct Answer {
    pub yes: bool,
    pub shown: Mutex<Option<DeletionPlan>>,
}

impl Answer {
    pub fn new(yes: bool) -> Self {
        Self {
            yes,
            shown: Mutex::new(None),
        }
    }
}

impl Confirmer for Answer {
    fn confirm(&self, plan: &DeletionPlan) -> Result<bool> {
        *self.shown.lock().unwrap() = Some(plan.clone());
        Ok(self.yes)
    }
}

/// Write a PDF-looking file into `dir`.
pub fn write_pdf(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("%PDF-1.4\n{body}\n%%EOF")).unwrap();
    path
}
