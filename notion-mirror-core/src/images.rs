//! Local cache for images embedded in pages.
//!
//! Notion serves uploaded images from signed, short-lived URLs. The cache keys
//! each image on something stable instead: the file ID embedded in a
//! secure-storage URL, or the whole URL when there is no such ID. The key is
//! hashed into the local filename (`<hash>.<ext>`), the extension is sniffed
//! from the downloaded bytes, and an image whose hash already has a file is
//! never downloaded again.
//!
//! Files that exist at the start of a run and are not referenced again are
//! removed by [`ImageAssetCache::cleanup_old_images`].

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use crate::contract::AssetSource;
use crate::error::{Error, Result};
use crate::stale::StalePathSet;

/// Reference written into a page when an image could not be cached.
pub const BROKEN_IMAGE_REFERENCE: &str = "broken-image";

static SECURE_STORAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"secure\.notion-static\.com/([^/?#]+)/").expect("secure storage pattern is valid")
});

/// The part of `url` that identifies the image across re-signed URLs.
pub fn dedup_key(url: &str) -> &str {
    SECURE_STORAGE
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map_or(url, |id| id.as_str())
}

/// 31-multiplier rolling hash over UTF-16 code units, wrapped to 32 bits.
pub fn hash_of_string(s: &str) -> u32 {
    let hash = s
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.unsigned_abs()
}

pub struct ImageAssetCache {
    dir: PathBuf,
    prefix: String,
    source: Arc<dyn AssetSource>,
    /// Hash stem to filename, for files on disk or written this run.
    known: HashMap<String, String>,
    stale: StalePathSet,
    downloads: usize,
}

impl ImageAssetCache {
    /// Opens the cache over `dir`. Markdown references become `<prefix>/<file>`.
    pub fn open(dir: impl Into<PathBuf>, prefix: &str, source: Arc<dyn AssetSource>) -> Self {
        let dir = dir.into();
        let stale = StalePathSet::scan(&dir, 1, |path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.starts_with('.'))
        });

        let known = stale
            .iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                let name = path.file_name()?.to_str()?;
                Some((stem.to_owned(), name.to_owned()))
            })
            .collect();

        ImageAssetCache {
            dir,
            prefix: prefix.trim_end_matches('/').to_owned(),
            source,
            known,
            stale,
            downloads: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of images fetched from the network so far.
    pub fn downloads(&self) -> usize {
        self.downloads
    }

    pub fn stale(&self) -> &StalePathSet {
        &self.stale
    }

    /// Local reference for the image at `url`, downloading it on first sight.
    pub async fn resolve(&mut self, url: &str) -> Result<String> {
        let stem = hash_of_string(dedup_key(url)).to_string();

        if let Some(filename) = self.known.get(&stem) {
            self.stale.mark_seen(&self.dir.join(filename));
            debug!(url, filename = %filename, "Image already cached");
            return Ok(self.reference(filename));
        }

        let bytes = self.source.fetch(url).await?;
        let format = image::guess_format(&bytes).map_err(|_| Error::UnrecognizedImage {
            url: url.to_owned(),
        })?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let filename = format!("{stem}.{extension}");
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, &bytes).await?;
        self.downloads += 1;
        info!(url, path = %path.display(), bytes = bytes.len(), "Cached image");

        let reference = self.reference(&filename);
        self.known.insert(stem, filename);
        Ok(reference)
    }

    fn reference(&self, filename: &str) -> String {
        if self.prefix.is_empty() {
            filename.to_owned()
        } else {
            format!("{}/{}", self.prefix, filename)
        }
    }

    /// Deletes cached images no page referenced during this run.
    pub fn cleanup_old_images(&mut self) -> Result<Vec<PathBuf>> {
        let removed = self.stale.sweep()?;
        for path in &removed {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                self.known.remove(stem);
            }
        }
        Ok(removed)
    }
}
