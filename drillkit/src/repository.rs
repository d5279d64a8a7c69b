#![doc = "PostgREST adapter for the drill metadata tables (`drills`, `tags`, `drill_tags`)."]
//
//! # Metadata repository over Supabase PostgREST
//!
//! Implements [`MetadataRepository`] with plain REST calls against
//! `{project}/rest/v1`. Filters use PostgREST's `column=eq.value` syntax,
//! tag upserts rely on the unique `tags.name` constraint, and usage counts
//! are read from the `Content-Range` header of a `Prefer: count=exact` query.
//!
//! Every non-success response becomes `DrillError::Backend` with the status
//! and response body, so the workflow logs say what the backend refused.

use async_trait::async_trait;
use drillkit_core::contract::{Drill, DrillField, MetadataRepository, NewDrill, Tag};
use drillkit_core::error::{DrillError, Result};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::load_config::SupabaseSettings;

const DRILLS: &str = "drills";
const TAGS: &str = "tags";
const DRILL_TAGS: &str = "drill_tags";

#[derive(Serialize)]
struct LinkRow<'a> {
    drill_id: &'a str,
    tag_id: &'a str,
}

#[derive(Serialize)]
struct TagName<'a> {
    name: &'a str,
}

/// Row of `drill_tags?select=tags(id,name)`.
#[derive(Deserialize)]
struct LinkedTag {
    tags: Option<Tag>,
}

pub struct PostgrestRepository {
    http: reqwest::Client,
    rest_url: String,
    service_role_key: String,
}

/// Total from a `Content-Range` value such as `0-0/42` or `*/0`.
pub fn content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl PostgrestRepository {
    pub fn new(http: reqwest::Client, settings: &SupabaseSettings) -> Self {
        tracing::info!(url = %settings.url, "Initialized PostgREST repository");
        Self {
            http,
            rest_url: format!("{}/rest/v1", settings.url.trim_end_matches('/')),
            service_role_key: settings.service_role_key.clone(),
        }
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.rest_url, table))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
    }

    async fn send(&self, builder: RequestBuilder, context: &str) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = ?e, context, "PostgREST request failed");
            DrillError::backend(context, e)
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!(context, %status, body = %body, "PostgREST returned an error");
        Err(DrillError::Backend(format!(
            "{context}: status {status}: {body}"
        )))
    }

    async fn rows<T: for<'de> Deserialize<'de>>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<Vec<T>> {
        self.send(builder, context)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| DrillError::backend(context, e))
    }

    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let tags: Vec<Tag> = self
            .rows(
                self.request(Method::GET, TAGS)
                    .query(&[("select", "id,name".to_string()), ("name", eq(name))]),
                "find tag",
            )
            .await?;
        Ok(tags.into_iter().next())
    }
}

#[async_trait]
impl MetadataRepository for PostgrestRepository {
    async fn create_drill(&self, drill: NewDrill) -> Result<String> {
        tracing::info!(title = %drill.title, "Inserting drill");
        let created: Vec<Drill> = self
            .rows(
                self.request(Method::POST, DRILLS)
                    .header("Prefer", "return=representation")
                    .json(&drill),
                "insert drill",
            )
            .await?;
        created
            .into_iter()
            .next()
            .map(|d| d.id)
            .ok_or_else(|| DrillError::Backend("insert drill: no drill id returned".to_string()))
    }

    async fn find_drill(&self, field: DrillField, value: &str) -> Result<Option<Drill>> {
        tracing::debug!(field = field.column(), value, "Looking up drill");
        let drills: Vec<Drill> = self
            .rows(
                self.request(Method::GET, DRILLS).query(&[
                    ("select", "*".to_string()),
                    (field.column(), eq(value)),
                    ("limit", "1".to_string()),
                ]),
                "find drill",
            )
            .await?;
        Ok(drills.into_iter().next())
    }

    async fn delete_drill(&self, drill_id: &str) -> Result<()> {
        self.send(
            self.request(Method::DELETE, DRILL_TAGS)
                .query(&[("drill_id", eq(drill_id))]),
            "delete drill links",
        )
        .await?;
        self.send(
            self.request(Method::DELETE, DRILLS)
                .query(&[("id", eq(drill_id))]),
            "delete drill",
        )
        .await?;
        tracing::info!(drill_id, "Deleted drill and its links");
        Ok(())
    }

    async fn upsert_tag(&self, name: &str) -> Result<String> {
        let upserted: Vec<Tag> = self
            .rows(
                self.request(Method::POST, TAGS)
                    .query(&[("on_conflict", "name")])
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&[TagName { name }]),
                "upsert tag",
            )
            .await?;
        if let Some(tag) = upserted.into_iter().next() {
            return Ok(tag.id);
        }
        // Some PostgREST setups return nothing for a merged duplicate.
        self.find_tag_by_name(name)
            .await?
            .map(|t| t.id)
            .ok_or_else(|| DrillError::Backend(format!("failed to retrieve tag id for {name}")))
    }

    async fn find_tags_for_drill(&self, drill_id: &str) -> Result<Vec<Tag>> {
        let linked: Vec<LinkedTag> = self
            .rows(
                self.request(Method::GET, DRILL_TAGS).query(&[
                    ("select", "tags(id,name)".to_string()),
                    ("drill_id", eq(drill_id)),
                ]),
                "find drill tags",
            )
            .await?;
        Ok(linked.into_iter().filter_map(|l| l.tags).collect())
    }

    async fn count_drills_for_tag(&self, tag_id: &str) -> Result<u64> {
        let response = self
            .send(
                self.request(Method::GET, DRILL_TAGS)
                    .query(&[("select", "drill_id".to_string()), ("tag_id", eq(tag_id))])
                    .header("Prefer", "count=exact")
                    .header("Range-Unit", "items")
                    .header("Range", "0-0"),
                "count tag usage",
            )
            .await?;
        response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total)
            .ok_or_else(|| {
                DrillError::Backend(format!(
                    "count tag usage: missing or invalid Content-Range for tag {tag_id}"
                ))
            })
    }

    async fn delete_tag(&self, tag_id: &str) -> Result<()> {
        self.send(
            self.request(Method::DELETE, TAGS)
                .query(&[("id", eq(tag_id))]),
            "delete tag",
        )
        .await?;
        Ok(())
    }

    async fn replace_links(&self, drill_id: &str, tag_ids: Vec<String>) -> Result<()> {
        self.send(
            self.request(Method::DELETE, DRILL_TAGS)
                .query(&[("drill_id", eq(drill_id))]),
            "clear drill links",
        )
        .await?;
        if tag_ids.is_empty() {
            return Ok(());
        }
        let links: Vec<LinkRow<'_>> = tag_ids
            .iter()
            .map(|tag_id| LinkRow {
                drill_id,
                tag_id: tag_id.as_str(),
            })
            .collect();
        self.send(
            self.request(Method::POST, DRILL_TAGS)
                .header("Prefer", "return=minimal")
                .json(&links),
            "link tags",
        )
        .await?;
        tracing::info!(drill_id, links = links.len(), "Linked tags to drill");
        Ok(())
    }
}
