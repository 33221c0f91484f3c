use std::sync::Arc;
use tracing::debug;

use crate::contract::{Block, Page, WorkspaceApi};
use crate::error::Result;
use crate::rate_limit::RateLimiter;

/// Largest page size the Notion API accepts for block children.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Rate-limited access to the workspace. Every remote call waits for a token
/// first; child listings follow `next_cursor` until the server stops sending one.
pub struct PaginatedFetcher {
    api: Arc<dyn WorkspaceApi>,
    limiter: RateLimiter,
    page_size: u32,
}

impl PaginatedFetcher {
    pub fn new(api: Arc<dyn WorkspaceApi>, limiter: RateLimiter) -> Self {
        PaginatedFetcher {
            api,
            limiter,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
        self.limiter.acquire().await;
        self.api.retrieve_page(page_id).await
    }

    /// Every direct child of `block_id`, in server order.
    ///
    /// Pages are appended as received; cursors never overlap, so nothing is
    /// merged or deduplicated. The first transport error is returned as is.
    pub async fn fetch_all_children(&self, block_id: &str) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        let mut requests = 0usize;

        loop {
            self.limiter.acquire().await;
            let page = self
                .api
                .list_block_children(block_id, cursor.take(), self.page_size)
                .await?;
            requests += 1;
            blocks.extend(page.results);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(
            block_id,
            children = blocks.len(),
            requests,
            "Fetched all block children"
        );
        Ok(blocks)
    }
}
