//! Where pages land on disk.
//!
//! A [`LayoutStrategy`] turns a page's position in the outline into a file
//! path and remembers which markdown files from the previous run have not been
//! produced again. Two strategies ship:
//!
//! - [`HierarchicalNamedLayout`]: one directory per outline container, files
//!   named after page titles (`Docs/Getting-Started/Intro.md`).
//! - [`FlatGuidLayout`]: every file directly under the root, named by page ID.
//!
//! Path computation is pure. The only side effects are the seen-tracking in
//! [`LayoutStrategy::page_was_seen`] and the deletions in
//! [`LayoutStrategy::cleanup_old_files`], which must run once, after the walk.
//!
//! Sanitizing is lossy, so two siblings can map to the same name ("a/b" and
//! "a_b"). The hierarchical layout remembers which title or page claimed a
//! name during the run; a later sibling that lands on a taken name gets a
//! short suffix instead of overwriting it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::LayoutKind;
use crate::error::Result;
use crate::images::hash_of_string;
use crate::stale::StalePathSet;

pub const MARKDOWN_EXTENSION: &str = ".md";

/// Logical path of ancestor containers, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutContext {
    segments: Vec<String>,
}

impl LayoutContext {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new context one level below this one.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        LayoutContext { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

pub trait LayoutStrategy: Send {
    /// Context for the children of a container titled `title`. The same
    /// title under the same parent always yields the same context.
    fn new_level(&mut self, context: &LayoutContext, title: &str) -> LayoutContext;

    /// Output path for a page. `extension` includes the leading dot.
    fn path_for_page(
        &self,
        context: &LayoutContext,
        id: &str,
        title: &str,
        extension: &str,
    ) -> PathBuf;

    /// Keeps the page's markdown file out of the cleanup sweep.
    fn page_was_seen(&mut self, context: &LayoutContext, id: &str, title: &str);

    /// Deletes markdown files no page claimed during this run.
    fn cleanup_old_files(&mut self) -> Result<Vec<PathBuf>>;
}

/// Builds the strategy selected in config, rooted at `root`.
pub fn layout_for(kind: LayoutKind, root: &Path) -> Box<dyn LayoutStrategy> {
    match kind {
        LayoutKind::Hierarchical => Box::new(HierarchicalNamedLayout::open(root)),
        LayoutKind::Flat => Box::new(FlatGuidLayout::open(root)),
    }
}

fn existing_markdown(root: &Path) -> StalePathSet {
    StalePathSet::scan(root, usize::MAX, |path| {
        path.extension()
            .is_some_and(|ext| ext == "md" || ext == "mdx")
    })
}

/// Makes a title usable as a single path segment.
///
/// Reserved characters become `_`, whitespace becomes `-`, and leading or
/// trailing separators and dots are dropped.
pub fn sanitize_segment(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == '_' || c == '-' || c == '.');
    if trimmed.is_empty() {
        "untitled".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Up to eight alphanumerics of `id`, for telling clashing names apart.
fn short_id(id: &str) -> String {
    id.chars().filter(char::is_ascii_alphanumeric).take(8).collect()
}

pub struct HierarchicalNamedLayout {
    root: PathBuf,
    stale: StalePathSet,
    /// Directory segments handed out this run, keyed by full logical path,
    /// with the raw title that claimed them.
    levels: HashMap<Vec<String>, String>,
    /// Files claimed this run and the page ID that owns each.
    pages: HashMap<PathBuf, String>,
}

impl HierarchicalNamedLayout {
    /// Starts a run rooted at `root`, treating every markdown file already
    /// there as stale until seen.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let stale = existing_markdown(&root);
        HierarchicalNamedLayout {
            root,
            stale,
            levels: HashMap::new(),
            pages: HashMap::new(),
        }
    }

    fn base_path(&self, context: &LayoutContext, stem: &str, extension: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in context.segments() {
            path.push(segment);
        }
        path.push(format!("{stem}{extension}"));
        path
    }

    pub fn stale(&self) -> &StalePathSet {
        &self.stale
    }
}

impl LayoutStrategy for HierarchicalNamedLayout {
    fn new_level(&mut self, context: &LayoutContext, title: &str) -> LayoutContext {
        let plain = context.child(sanitize_segment(title));
        let claimed_by = self.levels.get(plain.segments()).cloned();
        let level = match claimed_by {
            Some(owner) if owner != title => {
                let suffixed = context.child(format!(
                    "{}-{:08x}",
                    sanitize_segment(title),
                    hash_of_string(title)
                ));
                warn!(
                    title,
                    clashes_with = %owner,
                    directory = %suffixed.segments().join("/"),
                    "Sibling containers share a directory name, suffixing"
                );
                suffixed
            }
            _ => plain,
        };
        self.levels
            .entry(level.segments().to_vec())
            .or_insert_with(|| title.to_owned());
        level
    }

    fn path_for_page(
        &self,
        context: &LayoutContext,
        id: &str,
        title: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = sanitize_segment(title);
        let plain = self.base_path(context, &stem, extension);
        match self.pages.get(&plain) {
            Some(owner) if owner != id => {
                self.base_path(context, &format!("{stem}-{}", short_id(id)), extension)
            }
            _ => plain,
        }
    }

    fn page_was_seen(&mut self, context: &LayoutContext, id: &str, title: &str) {
        let path = self.path_for_page(context, id, title, MARKDOWN_EXTENSION);
        let plain = self.base_path(context, &sanitize_segment(title), MARKDOWN_EXTENSION);
        if path != plain && !self.pages.contains_key(&path) {
            warn!(page_id = id, path = %path.display(), "Sibling pages share a file name, suffixing");
        }
        self.pages.entry(path.clone()).or_insert_with(|| id.to_owned());
        self.stale.mark_seen(&path);
    }

    fn cleanup_old_files(&mut self) -> Result<Vec<PathBuf>> {
        self.stale.sweep()
    }
}

pub struct FlatGuidLayout {
    root: PathBuf,
    stale: StalePathSet,
}

impl FlatGuidLayout {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let stale = existing_markdown(&root);
        FlatGuidLayout { root, stale }
    }

    pub fn stale(&self) -> &StalePathSet {
        &self.stale
    }
}

impl LayoutStrategy for FlatGuidLayout {
    fn new_level(&mut self, context: &LayoutContext, _title: &str) -> LayoutContext {
        context.clone()
    }

    fn path_for_page(
        &self,
        _context: &LayoutContext,
        id: &str,
        _title: &str,
        extension: &str,
    ) -> PathBuf {
        self.root.join(format!("{}{}", sanitize_segment(id), extension))
    }

    fn page_was_seen(&mut self, context: &LayoutContext, id: &str, title: &str) {
        let path = self.path_for_page(context, id, title, MARKDOWN_EXTENSION);
        self.stale.mark_seen(&path);
    }

    fn cleanup_old_files(&mut self) -> Result<Vec<PathBuf>> {
        self.stale.sweep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_segment("Docs"), "Docs");
        assert_eq!(sanitize_segment("Getting Started"), "Getting-Started");
        assert_eq!(sanitize_segment("a/b: c?"), "a_b_-c");
        assert_eq!(sanitize_segment("  .hidden. "), "hidden");
        assert_eq!(sanitize_segment("///"), "untitled");
    }

    #[test]
    fn context_extension_leaves_parent_untouched() {
        let root = LayoutContext::root();
        let docs = root.child("Docs");
        assert!(root.is_root());
        assert_eq!(docs.segments(), ["Docs".to_owned()]);
    }
}
