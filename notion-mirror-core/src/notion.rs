use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::contract::{AssetSource, BlockPage, Page, WorkspaceApi};
use crate::error::{Error, Result};

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
/// API version pinned in the `Notion-Version` header.
pub const NOTION_VERSION: &str = "2022-06-28";
/// Environment variable holding the integration token.
pub const TOKEN_ENV: &str = "NOTION_TOKEN";

/// REST client for the parts of the Notion API a pull needs.
pub struct NotionClient {
    http: Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Self {
        NotionClient {
            http: Client::new(),
            base_url: NOTION_API_BASE.to_owned(),
            token: token.into(),
        }
    }

    /// Points the client at another API root (e.g. a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn new_from_env() -> Result<Self> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                info!(token_len = token.len(), "Initialized NotionClient from environment");
                Ok(Self::new(token))
            }
            Ok(_) => {
                error!("{TOKEN_ENV} is empty");
                Err(Error::Config(format!("{TOKEN_ENV} is empty")))
            }
            Err(e) => {
                error!(error = ?e, "{TOKEN_ENV} missing in environment");
                Err(Error::Config(format!("{TOKEN_ENV} environment variable not set: {e}")))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(url, ?query, "Calling Notion API");
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url, "Failed to reach Notion API");
                e
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(status = %status, url, "Notion API returned error. Response body: {body}");
            return Err(Error::Api {
                status: status.as_u16(),
                url: url.to_owned(),
                body,
            });
        }

        let text = resp.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl WorkspaceApi for NotionClient {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
        let url = format!("{}/pages/{}", self.base_url, page_id);
        self.get_json(&url, &[]).await
    }

    async fn list_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<String>,
        page_size: u32,
    ) -> Result<BlockPage> {
        let url = format!("{}/blocks/{}/children", self.base_url, block_id);
        let mut query = vec![("page_size", page_size.to_string())];
        if let Some(cursor) = start_cursor {
            query.push(("start_cursor", cursor));
        }
        self.get_json(&url, &query).await
    }
}

/// Plain HTTP GET for image bytes. Signed storage URLs need no extra auth.
#[derive(Default)]
pub struct HttpAssetSource {
    http: Client,
}

impl HttpAssetSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}
