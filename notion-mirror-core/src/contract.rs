//! # contract: the seams between the pull pipeline and the outside world
//!
//! This module defines the data shapes exchanged with the Notion workspace and
//! the traits through which the pipeline reaches every external collaborator:
//!
//! - [`WorkspaceApi`]: page metadata and cursor-paginated block children.
//! - [`AssetSource`]: raw bytes behind an image URL.
//! - [`BlockRenderer`]: turns an ordered block sequence into markdown text.
//!
//! ## Mocking & Testing
//! - The async traits are annotated for `mockall`, so consumers can generate
//!   deterministic mocks (`MockWorkspaceApi`, `MockAssetSource`) with the
//!   default `test-export-mocks` feature.
//!
//! ## Wire types
//! - [`Page`], [`Block`] and [`BlockPage`] mirror Notion's JSON objects. Only
//!   the fields the pipeline inspects are typed; everything else is kept as
//!   `serde_json::Value` so the renderer sees the block exactly as served.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;

/// Block type of a sub-page sitting directly in the outline.
pub const CHILD_PAGE: &str = "child_page";
/// Block type of a cross-link into a database page.
pub const LINK_TO_PAGE: &str = "link_to_page";
/// Block type of an embedded image.
pub const IMAGE: &str = "image";

/// A page as returned by `GET /v1/pages/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Page {
    /// Plain text of the page's `title`-typed property, when it holds any text.
    pub fn title(&self) -> Option<String> {
        self.properties
            .values()
            .find(|p| property_type(p) == Some("title"))
            .and_then(|p| rich_text_value(p.get("title")))
    }

    /// Plain text of a `title` or `rich_text` property.
    pub fn text_property(&self, name: &str) -> Option<String> {
        let property = self.properties.get(name)?;
        match property_type(property)? {
            kind @ ("title" | "rich_text") => rich_text_value(property.get(kind)),
            _ => None,
        }
    }

    /// Option name of a `select` or `status` property.
    pub fn select_property(&self, name: &str) -> Option<String> {
        let property = self.properties.get(name)?;
        match property_type(property)? {
            kind @ ("select" | "status") => property
                .get(kind)?
                .get("name")?
                .as_str()
                .map(str::to_owned),
            _ => None,
        }
    }
}

fn property_type(property: &Value) -> Option<&str> {
    property.get("type").and_then(Value::as_str)
}

fn rich_text_value(rich_text: Option<&Value>) -> Option<String> {
    let text = plain_text(rich_text?);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Concatenated `plain_text` of a Notion rich-text array.
pub fn plain_text(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// One content unit under a page. `payload` holds every other field of the
/// block object, including the type-specific object keyed by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Block {
    /// Builds a block whose type-specific object is `content`.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, content: Value) -> Self {
        let kind = kind.into();
        let mut payload = Map::new();
        payload.insert(kind.clone(), content);
        Block {
            id: id.into(),
            kind,
            has_children: false,
            payload,
        }
    }

    pub fn child_page(id: impl Into<String>, title: &str) -> Self {
        Block::new(id, CHILD_PAGE, json!({ "title": title }))
    }

    pub fn link_to_page(id: impl Into<String>, page_id: &str) -> Self {
        Block::new(id, LINK_TO_PAGE, json!({ "type": "page_id", "page_id": page_id }))
    }

    /// An image stored in Notion's own file storage.
    pub fn hosted_image(id: impl Into<String>, url: &str) -> Self {
        Block::new(
            id,
            IMAGE,
            json!({ "type": "file", "file": { "url": url }, "caption": [] }),
        )
    }

    /// The type-specific object, e.g. `{"rich_text": [...]}` for a paragraph.
    pub fn content(&self) -> Option<&Value> {
        self.payload.get(&self.kind)
    }

    /// True for blocks that give the parent page outline structure.
    pub fn is_outline_entry(&self) -> bool {
        self.kind == CHILD_PAGE || self.kind == LINK_TO_PAGE
    }

    /// Target page of a `link_to_page` block.
    pub fn linked_page_id(&self) -> Option<&str> {
        if self.kind != LINK_TO_PAGE {
            return None;
        }
        self.content()?.get("page_id")?.as_str()
    }

    /// URL of an image block whose bytes live in Notion's file storage.
    pub fn hosted_image_url(&self) -> Option<&str> {
        if self.kind != IMAGE {
            return None;
        }
        self.content()?.get("file")?.get("url")?.as_str()
    }

    /// Points a hosted image block at `url`. Returns false for any other block.
    pub fn set_hosted_image_url(&mut self, url: String) -> bool {
        if self.kind != IMAGE {
            return false;
        }
        match self
            .payload
            .get_mut(IMAGE)
            .and_then(|image| image.get_mut("file"))
            .and_then(Value::as_object_mut)
        {
            Some(file) => {
                file.insert("url".to_owned(), Value::String(url));
                true
            }
            None => false,
        }
    }
}

/// One page of `GET /v1/blocks/{id}/children`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPage {
    #[serde(default)]
    pub results: Vec<Block>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Read access to the remote workspace.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Fetch a page's metadata record.
    async fn retrieve_page(&self, page_id: &str) -> Result<Page>;

    /// Fetch one page of a block's direct children.
    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<String>,
        page_size: u32,
    ) -> Result<BlockPage>;
}

/// Fetches the bytes behind an asset URL.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Converts an ordered block sequence into a markdown body.
pub trait BlockRenderer: Send + Sync {
    fn render(&self, blocks: &[Block]) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_database_properties() {
        let page: Page = serde_json::from_value(json!({
            "object": "page",
            "id": "p1",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Intro" }] },
                "slug": { "type": "rich_text", "rich_text": [{ "plain_text": "intro" }] },
                "Status": { "type": "select", "select": { "name": "Publish" } },
                "Empty": { "type": "rich_text", "rich_text": [] }
            }
        }))
        .unwrap();

        assert_eq!(page.title().as_deref(), Some("Intro"));
        assert_eq!(page.text_property("Name").as_deref(), Some("Intro"));
        assert_eq!(page.text_property("slug").as_deref(), Some("intro"));
        assert_eq!(page.select_property("Status").as_deref(), Some("Publish"));
        assert_eq!(page.text_property("Empty"), None);
        assert_eq!(page.select_property("Missing"), None);
    }

    #[test]
    fn block_keeps_unknown_fields_and_exposes_links() {
        let block: Block = serde_json::from_value(json!({
            "object": "block",
            "id": "b1",
            "type": "link_to_page",
            "has_children": false,
            "link_to_page": { "type": "page_id", "page_id": "target" }
        }))
        .unwrap();

        assert_eq!(block.kind, "link_to_page");
        assert!(block.is_outline_entry());
        assert_eq!(block.linked_page_id(), Some("target"));
        assert_eq!(block.payload.get("object"), Some(&json!("block")));
    }

    #[test]
    fn rewrites_hosted_image_url_only() {
        let mut image = Block::hosted_image("i1", "https://example.com/a.png");
        assert!(image.set_hosted_image_url("/img/1.png".into()));
        assert_eq!(image.hosted_image_url(), Some("/img/1.png"));

        let mut external = Block::new(
            "i2",
            IMAGE,
            json!({ "type": "external", "external": { "url": "https://x.test/a.png" } }),
        );
        assert_eq!(external.hosted_image_url(), None);
        assert!(!external.set_hosted_image_url("/img/2.png".into()));
    }
}
