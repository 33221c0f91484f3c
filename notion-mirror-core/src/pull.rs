//! High-level pipeline: walks a Notion outline and mirrors it to markdown.
//!
//! This module provides the top-level orchestration for a "pull". Starting
//! from the configured root page it:
//!   - Retrieves each page and all of its children through the rate-limited [`PaginatedFetcher`]
//!   - Classifies the page (see [`classify`]) as an outline container, a database page or a plain page
//!   - Recurses into containers, pushing a layout level for each visible one
//!   - Caches embedded images through [`ImageAssetCache`] and rewrites their URLs
//!   - Renders content pages through a [`BlockRenderer`] and writes them at the [`LayoutStrategy`] path
//!   - Sweeps markdown files and images that the walk did not produce again
//!
//! # Major Types
//! - [`PageTreeWalker`]: owns all per-run state (sidebar position, layout, image cache)
//! - [`PullReport`]: what was written, skipped and removed
//!
//! # Error Handling
//! Workspace API and filesystem errors abort the walk and are returned as is;
//! files written before the failure stay on disk and no cleanup runs. Image
//! failures and database pages without a Status are logged and the walk goes on.
//!
//! # Navigation
//! - Main entrypoint: [`pull`]

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::classify::{classify, NodeKind, Reached};
use crate::config::PullConfig;
use crate::contract::{AssetSource, Block, BlockRenderer, Page, WorkspaceApi, CHILD_PAGE, LINK_TO_PAGE};
use crate::error::Result;
use crate::fetch::PaginatedFetcher;
use crate::images::{ImageAssetCache, BROKEN_IMAGE_REFERENCE};
use crate::layout::{layout_for, LayoutContext, LayoutStrategy, MARKDOWN_EXTENSION};
use crate::rate_limit::RateLimiter;

/// Title of the synthetic top-level container that never becomes a directory.
pub const OUTLINE_TITLE: &str = "Outline";

#[derive(Debug, Default)]
pub struct PullReport {
    pub pages_written: Vec<PathBuf>,
    /// IDs of pages that were visited but not written.
    pub pages_skipped: Vec<String>,
    pub images_downloaded: usize,
    pub image_failures: usize,
    pub markdown_removed: Vec<PathBuf>,
    pub images_removed: Vec<PathBuf>,
}

/// Front matter block at the top of every written page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub sidebar_position: u32,
    pub slug: String,
}

impl FrontMatter {
    /// The YAML block between `---` fences. Values that YAML would read as
    /// something other than a string come out quoted.
    pub fn to_block(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(format!("---\n{yaml}---\n"))
    }
}

pub struct PageTreeWalker {
    fetcher: PaginatedFetcher,
    images: ImageAssetCache,
    layout: Box<dyn LayoutStrategy>,
    renderer: Arc<dyn BlockRenderer>,
    status_tag: String,
    sidebar_position: u32,
    report: PullReport,
}

impl PageTreeWalker {
    pub fn new(
        fetcher: PaginatedFetcher,
        images: ImageAssetCache,
        layout: Box<dyn LayoutStrategy>,
        renderer: Arc<dyn BlockRenderer>,
        status_tag: impl Into<String>,
    ) -> Self {
        PageTreeWalker {
            fetcher,
            images,
            layout,
            renderer,
            status_tag: status_tag.into(),
            sidebar_position: 0,
            report: PullReport::default(),
        }
    }

    pub fn sidebar_position(&self) -> u32 {
        self.sidebar_position
    }

    /// Walks the outline below `root_page_id`. The root never adds a level.
    pub async fn walk(&mut self, root_page_id: &str) -> Result<()> {
        info!(root_page_id, "Walking outline");
        self.visit(
            root_page_id.to_owned(),
            LayoutContext::root(),
            Reached::OutlineEntry,
            true,
        )
        .await
    }

    /// Runs both cleanup sweeps and returns the report. Call only after
    /// [`walk`](Self::walk) succeeded.
    pub fn finish(mut self) -> Result<PullReport> {
        self.report.markdown_removed = self.layout.cleanup_old_files()?;
        self.report.images_removed = self.images.cleanup_old_images()?;
        self.report.images_downloaded = self.images.downloads();
        info!(
            written = self.report.pages_written.len(),
            skipped = self.report.pages_skipped.len(),
            images_downloaded = self.report.images_downloaded,
            image_failures = self.report.image_failures,
            markdown_removed = self.report.markdown_removed.len(),
            images_removed = self.report.images_removed.len(),
            "Pull finished"
        );
        Ok(self.report)
    }

    fn visit(
        &mut self,
        page_id: String,
        context: LayoutContext,
        reached: Reached,
        hide_level: bool,
    ) -> BoxFuture<'_, Result<()>> {
        async move {
            let page = self.fetcher.retrieve_page(&page_id).await?;
            let Some(title) = page.title() else {
                warn!(page_id = %page_id, "Page has no usable title, skipping");
                self.report.pages_skipped.push(page_id);
                return Ok(());
            };
            let children = self.fetcher.fetch_all_children(&page_id).await?;

            let kind = classify(&children, reached);
            debug!(page_id = %page_id, title = %title, ?kind, "Classified page");
            match kind {
                NodeKind::OutlineContainer => {
                    self.visit_container(&title, children, context, hide_level)
                        .await
                }
                NodeKind::DatabasePage => {
                    self.write_database_page(&page, &title, children, &context)
                        .await
                }
                NodeKind::PlainContentPage => {
                    self.write_plain_page(&page, &title, children, &context)
                        .await
                }
            }
        }
        .boxed()
    }

    async fn visit_container(
        &mut self,
        title: &str,
        children: Vec<Block>,
        context: LayoutContext,
        hide_level: bool,
    ) -> Result<()> {
        let level = if hide_level || title == OUTLINE_TITLE {
            context
        } else {
            self.layout.new_level(&context, title)
        };

        for child in children {
            match child.kind.as_str() {
                CHILD_PAGE => {
                    self.visit(child.id, level.clone(), Reached::OutlineEntry, false)
                        .await?
                }
                LINK_TO_PAGE => match child.linked_page_id() {
                    Some(target) => {
                        self.visit(target.to_owned(), level.clone(), Reached::CrossLink, false)
                            .await?
                    }
                    None => debug!(block_id = %child.id, "Cross-link without a page target"),
                },
                _ => {}
            }
        }
        Ok(())
    }

    async fn write_database_page(
        &mut self,
        page: &Page,
        title: &str,
        mut blocks: Vec<Block>,
        context: &LayoutContext,
    ) -> Result<()> {
        self.rewrite_images(&page.id, &mut blocks).await;
        self.sidebar_position += 1;

        let name = page.text_property("Name").unwrap_or_else(|| title.to_owned());
        let slug = page
            .text_property("slug")
            .unwrap_or_else(|| page.id.clone());

        match page.select_property("Status") {
            Some(status) if status == self.status_tag => {
                let front = FrontMatter {
                    title: Some(name.clone()),
                    sidebar_position: self.sidebar_position,
                    slug,
                };
                let path = self
                    .layout
                    .path_for_page(context, &page.id, &name, MARKDOWN_EXTENSION);
                self.write_page(&path, &front, &blocks).await?;
                self.layout.page_was_seen(context, &page.id, &name);
            }
            Some(status) => {
                info!(
                    page_id = %page.id,
                    name = %name,
                    status = %status,
                    "Skipping database page that is not marked {}",
                    self.status_tag
                );
                self.report.pages_skipped.push(page.id.clone());
            }
            None => {
                warn!(page_id = %page.id, name = %name, "Database page has no Status property, not writing it");
                self.report.pages_skipped.push(page.id.clone());
            }
        }
        Ok(())
    }

    async fn write_plain_page(
        &mut self,
        page: &Page,
        title: &str,
        mut blocks: Vec<Block>,
        context: &LayoutContext,
    ) -> Result<()> {
        self.rewrite_images(&page.id, &mut blocks).await;
        self.sidebar_position += 1;

        let front = FrontMatter {
            title: None,
            sidebar_position: self.sidebar_position,
            slug: page.id.clone(),
        };
        let path = self
            .layout
            .path_for_page(context, &page.id, title, MARKDOWN_EXTENSION);
        self.write_page(&path, &front, &blocks).await?;
        self.layout.page_was_seen(context, &page.id, title);
        Ok(())
    }

    /// Points every hosted image at its cached copy. Failures leave a
    /// placeholder reference and do not stop the page.
    async fn rewrite_images(&mut self, page_id: &str, blocks: &mut [Block]) {
        for block in blocks.iter_mut() {
            let Some(url) = block.hosted_image_url().map(str::to_owned) else {
                continue;
            };
            let reference = match self.images.resolve(&url).await {
                Ok(reference) => reference,
                Err(e) => {
                    error!(page_id, url = %url, error = %e, "Could not cache image");
                    self.report.image_failures += 1;
                    BROKEN_IMAGE_REFERENCE.to_owned()
                }
            };
            block.set_hosted_image_url(reference);
        }
    }

    async fn write_page(&mut self, path: &Path, front: &FrontMatter, blocks: &[Block]) -> Result<()> {
        let body = self.renderer.render(blocks);
        let document = format!("{}\n{body}", front.to_block()?);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, document).await?;
        info!(path = %path.display(), sidebar_position = front.sidebar_position, "Wrote page");
        self.report.pages_written.push(path.to_path_buf());
        Ok(())
    }
}

/// Mirrors the outline below `config.root_page` into the configured
/// directories and removes output that no longer has a source.
pub async fn pull(
    config: &PullConfig,
    api: Arc<dyn WorkspaceApi>,
    assets: Arc<dyn AssetSource>,
    renderer: Arc<dyn BlockRenderer>,
) -> Result<PullReport> {
    info!("[PULL] Starting pull");
    config.trace_loaded();

    tokio::fs::create_dir_all(&config.markdown_output_path).await?;
    tokio::fs::create_dir_all(&config.image_output_path).await?;

    let fetcher = PaginatedFetcher::new(api, RateLimiter::default());
    let images = ImageAssetCache::open(&config.image_output_path, &config.image_prefix(), assets);
    let layout = layout_for(config.layout, &config.markdown_output_path);

    let mut walker = PageTreeWalker::new(fetcher, images, layout, renderer, config.status_tag.clone());
    if let Err(e) = walker.walk(&config.root_page).await {
        error!(error = %e, "[PULL][ERROR] Walk aborted, skipping cleanup");
        return Err(e);
    }
    walker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_matter_layout() {
        let front = FrontMatter {
            title: Some("Intro".into()),
            sidebar_position: 1,
            slug: "intro".into(),
        };
        assert_eq!(
            front.to_block().unwrap(),
            "---\ntitle: Intro\nsidebar_position: 1\nslug: intro\n---\n"
        );

        let plain = FrontMatter {
            title: None,
            sidebar_position: 7,
            slug: "abc-123".into(),
        };
        assert_eq!(
            plain.to_block().unwrap(),
            "---\nsidebar_position: 7\nslug: abc-123\n---\n"
        );
    }

    fn parse_back(front: &FrontMatter) -> serde_yaml::Value {
        let block = front.to_block().unwrap();
        let yaml = block
            .strip_prefix("---\n")
            .and_then(|rest| rest.strip_suffix("---\n"))
            .expect("fenced block");
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn values_yaml_would_retype_stay_strings() {
        for value in ["123", "true", "null", "1.5", "~", "Setup: step one", "- list", "#tag"] {
            let front = FrontMatter {
                title: Some(value.into()),
                sidebar_position: 3,
                slug: value.into(),
            };
            let parsed = parse_back(&front);
            assert_eq!(parsed["slug"], serde_yaml::Value::String(value.into()), "slug {value:?}");
            assert_eq!(parsed["title"], serde_yaml::Value::String(value.into()), "title {value:?}");
            assert_eq!(parsed["sidebar_position"], serde_yaml::Value::from(3));
        }
    }

    #[test]
    fn multi_line_title_survives() {
        let front = FrontMatter {
            title: Some("Line\nBreak".into()),
            sidebar_position: 1,
            slug: "line-break".into(),
        };
        let parsed = parse_back(&front);
        assert_eq!(parsed["title"], serde_yaml::Value::String("Line\nBreak".into()));
    }
}
