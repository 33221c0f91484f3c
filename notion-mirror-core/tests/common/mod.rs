//! In-memory stand-ins for the Notion API and image hosting.
#![allow(dead_code)]

use async_trait::async_trait;
use notion_mirror_core::contract::{AssetSource, Block, BlockPage, Page, WorkspaceApi};
use notion_mirror_core::Error;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const SHOT_URL: &str = "https://s3.us-west-2.amazonaws.com/secure.notion-static.com/abcd-1234/shot.png?X-Amz-Signature=first";
pub const SHOT_URL_RESIGNED: &str = "https://s3.us-west-2.amazonaws.com/secure.notion-static.com/abcd-1234/shot.png?X-Amz-Signature=second";
/// hash_of_string("abcd-1234")
pub const SHOT_FILE: &str = "341831405.png";

pub fn png_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
    bytes
}

pub fn titled_page(id: &str, title: &str) -> Page {
    serde_json::from_value(json!({
        "id": id,
        "properties": {
            "title": { "type": "title", "title": [{ "plain_text": title }] }
        }
    }))
    .unwrap()
}

pub fn database_page(id: &str, name: &str, slug: &str, status: Option<&str>) -> Page {
    let mut properties = json!({
        "Name": { "type": "title", "title": [{ "plain_text": name }] },
        "slug": { "type": "rich_text", "rich_text": [{ "plain_text": slug }] }
    });
    if let Some(status) = status {
        properties["Status"] = json!({ "type": "select", "select": { "name": status } });
    }
    serde_json::from_value(json!({ "id": id, "properties": properties })).unwrap()
}

pub fn paragraph(id: &str, text: &str) -> Block {
    Block::new(
        id,
        "paragraph",
        json!({ "rich_text": [{ "plain_text": text }] }),
    )
}

/// Serves pages and children from maps, splitting child lists into pages of
/// the requested size with offset cursors.
#[derive(Default)]
pub struct FakeWorkspace {
    pages: HashMap<String, Page>,
    children: HashMap<String, Vec<Block>>,
    failing: HashSet<String>,
    pub calls: AtomicUsize,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Page, children: Vec<Block>) -> Self {
        self.children.insert(page.id.clone(), children);
        self.pages.insert(page.id.clone(), page);
        self
    }

    /// Every call touching `id` answers with a server error.
    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_owned());
        self
    }

    fn check(&self, id: &str) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(id) {
            return Err(Error::Api {
                status: 500,
                url: format!("fake://{id}"),
                body: "boom".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WorkspaceApi for FakeWorkspace {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page, Error> {
        self.check(page_id)?;
        self.pages.get(page_id).cloned().ok_or_else(|| Error::Api {
            status: 404,
            url: format!("fake://pages/{page_id}"),
            body: "object_not_found".into(),
        })
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<String>,
        page_size: u32,
    ) -> Result<BlockPage, Error> {
        self.check(block_id)?;
        let all = self.children.get(block_id).cloned().unwrap_or_default();
        let start = start_cursor.map(|c| c.parse::<usize>().unwrap()).unwrap_or(0);
        let end = (start + page_size as usize).min(all.len());
        let has_more = end < all.len();
        Ok(BlockPage {
            results: all[start..end].to_vec(),
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }
}

/// Serves fixed bytes per URL and counts downloads.
#[derive(Default)]
pub struct FakeAssets {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    pub fetches: AtomicUsize,
}

impl FakeAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.lock().unwrap().insert(url.to_owned(), body);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetSource for FakeAssets {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Api {
                status: 404,
                url: url.to_owned(),
                body: String::new(),
            })
    }
}
