/// `load_config` module: loads the static YAML config file into a [`CliConfig`].
///
/// This is the only place where user-supplied YAML is parsed. Secrets are not
/// read from the file; the Notion token comes from `NOTION_TOKEN` when the
/// client is built.
///
/// # Errors
/// Failures surface as `anyhow::Error` with the offending path in the message.
///
/// Accepted schema:
///
/// ```yaml
/// pull:
///   root_page: 0f1e2d3c4b5a69788796a5b4c3d2e1f0
///   markdown_output_path: docs
///   image_output_path: static/notion_images
///   image_prefix: /notion_images   # optional
///   layout: hierarchical           # or flat
///   status_tag: Publish            # optional
/// ```
use anyhow::Result;
use notion_mirror_core::config::PullConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub pull: PullConfig,
}

/// Loads a static YAML config file (no secrets).
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.pull.root_page.trim().is_empty() {
        error!(config_path = ?path_ref, "pull.root_page is empty");
        return Err(anyhow::anyhow!("pull.root_page must not be empty"));
    }

    config.pull.trace_loaded();
    Ok(config)
}
