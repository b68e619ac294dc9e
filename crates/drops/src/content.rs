//! Content client: GROQ queries against the Sanity HTTP query API.
//!
//! Two read-only queries: every collection with the listing projection, and a
//! single collection by slug with the detail projection. Transport failures
//! and 5xx/429 responses are retried per [RetryConfig]; everything else is
//! returned to the caller as-is.

use crate::config::{ContentConfig, RetryConfig};
use alloy::primitives::Address;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::{sleep, Duration};

/// Listing projection.
pub const LIST_COLLECTIONS_QUERY: &str = r#"*[_type == "collection"]{
    _id,
    description,
    nftCollectionName,
    mainImage {
        asset
    },
    slug {
        current
    }
}"#;

/// Detail projection, bound to `$slug`.
pub const COLLECTION_BY_SLUG_QUERY: &str = r#"*[_type == "collection" && slug.current == $slug][0]{
    _id,
    title,
    address,
    description,
    nftCollectionName,
    previewImage {
        asset
    },
    slug {
        current
    }
}"#;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("content API returned HTTP {0}")]
    Status(u16),
    #[error("content API error: {0}")]
    Api(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl ContentError {
    fn is_retryable(&self) -> bool {
        match self {
            ContentError::Http(e) => e.is_connect() || e.is_timeout(),
            ContentError::Status(code) => *code == 429 || *code >= 500,
            ContentError::Api(_) | ContentError::Decode(_) => false,
        }
    }
}

/// Projected fields missing from a document come back as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference to an uploaded asset (`{"_ref": "image-..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub asset: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

/// One collection card on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nft_collection_name: String,
    pub main_image: Option<Image>,
    pub slug: Slug,
}

/// A drop as shown on its detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// DropERC721 contract address as entered in the content store.
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nft_collection_name: String,
    pub preview_image: Option<Image>,
    pub slug: Slug,
}

impl Collection {
    pub fn contract_address(&self) -> Result<Address, ContentError> {
        self.address
            .trim()
            .parse::<Address>()
            .map_err(|e| ContentError::Decode(format!("collection {} address: {}", self.id, e)))
    }
}

/// HTTP client for the content store query API.
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    query_url: String,
    retry: RetryConfig,
}

impl ContentClient {
    pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
        let http = reqwest::Client::builder().no_proxy().build()?;
        Ok(Self {
            http,
            query_url: config.query_url(),
            retry: config.retry.clone(),
        })
    }

    /// All collections, listing projection. An empty dataset yields an empty vec.
    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>, ContentError> {
        let result: Option<Vec<CollectionSummary>> = self.fetch(LIST_COLLECTIONS_QUERY, &[]).await?;
        let collections = result.unwrap_or_default();
        tracing::debug!(count = collections.len(), "fetched collections");
        Ok(collections)
    }

    /// One collection by slug; `None` when no record matches.
    pub async fn collection_by_slug(&self, slug: &str) -> Result<Option<Collection>, ContentError> {
        let collection: Option<Collection> = self
            .fetch(COLLECTION_BY_SLUG_QUERY, &[("slug", Value::String(slug.to_string()))])
            .await?;
        if collection.is_none() {
            tracing::debug!(slug, "no collection for slug");
        }
        Ok(collection)
    }

    /// Runs `query` with `$name` parameters (JSON-encoded) and decodes `result`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, Value)],
    ) -> Result<T, ContentError> {
        let mut pairs: Vec<(String, String)> = vec![("query".to_string(), query.to_string())];
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(&pairs).await {
                Ok(v) => return decode_result(v),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let base = Duration::from_millis(self.retry.backoff_ms(attempt));
                    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..100));
                    tracing::warn!(reason = %e, attempt, "content query failed, retrying...");
                    sleep(base + jitter).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, pairs: &[(String, String)]) -> Result<Value, ContentError> {
        let resp = self.http.get(&self.query_url).query(pairs).send().await?;
        let status = resp.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ContentError::Status(status.as_u16()));
        }
        let json: Value = resp.json().await?;
        if let Some(err) = json.get("error") {
            let msg = err
                .get("description")
                .and_then(|d| d.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(ContentError::Api(msg));
        }
        if !status.is_success() {
            return Err(ContentError::Status(status.as_u16()));
        }
        Ok(json)
    }
}

fn decode_result<T: DeserializeOwned>(mut body: Value) -> Result<T, ContentError> {
    let result = body
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| ContentError::Decode("Missing result".into()))?;
    serde_json::from_value(result).map_err(|e| ContentError::Decode(e.to_string()))
}
