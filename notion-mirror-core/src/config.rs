use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Status option that marks a database page ready for publishing.
pub const DEFAULT_STATUS_TAG: &str = "Publish";

/// Everything a pull needs to know besides credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullConfig {
    /// ID of the outline page the walk starts from.
    pub root_page: String,
    pub markdown_output_path: PathBuf,
    pub image_output_path: PathBuf,
    /// Prefix used when markdown references a cached image. Defaults to the
    /// image output path.
    #[serde(default)]
    pub image_prefix: Option<String>,
    #[serde(default)]
    pub layout: LayoutKind,
    #[serde(default = "default_status_tag")]
    pub status_tag: String,
}

fn default_status_tag() -> String {
    DEFAULT_STATUS_TAG.to_owned()
}

impl PullConfig {
    pub fn new(
        root_page: impl Into<String>,
        markdown_output_path: impl Into<PathBuf>,
        image_output_path: impl Into<PathBuf>,
    ) -> Self {
        PullConfig {
            root_page: root_page.into(),
            markdown_output_path: markdown_output_path.into(),
            image_output_path: image_output_path.into(),
            image_prefix: None,
            layout: LayoutKind::default(),
            status_tag: default_status_tag(),
        }
    }

    /// Image reference prefix with any trailing slash stripped.
    pub fn image_prefix(&self) -> String {
        let prefix = match &self.image_prefix {
            Some(prefix) => prefix.clone(),
            None => self.image_output_path.to_string_lossy().into_owned(),
        };
        prefix.trim_end_matches('/').to_owned()
    }

    pub fn trace_loaded(&self) {
        info!(
            root_page = %self.root_page,
            markdown_output_path = %self.markdown_output_path.display(),
            image_output_path = %self.image_output_path.display(),
            layout = ?self.layout,
            "Loaded PullConfig"
        );
        debug!(?self, "PullConfig loaded (full debug)");
    }
}

/// Selects how outline positions map to files on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LayoutKind {
    /// Nested directories named after container titles.
    #[default]
    Hierarchical,
    /// Every page directly under the root, named by its ID.
    Flat,
}

impl From<String> for LayoutKind {
    fn from(s: String) -> Self {
        LayoutKind::from(s.as_str())
    }
}

impl From<&str> for LayoutKind {
    fn from(s: &str) -> Self {
        match s {
            "hierarchical" | "Hierarchical" | "HierarchicalNamed" | "named" => {
                LayoutKind::Hierarchical
            }
            "flat" | "Flat" | "FlatGuid" | "guid" => LayoutKind::Flat,
            other => {
                tracing::warn!(
                    kind = other,
                    "Unknown layout kind, defaulting to Hierarchical"
                );
                LayoutKind::Hierarchical
            }
        }
    }
}
