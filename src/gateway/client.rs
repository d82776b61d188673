//! HTTP client for the grove content services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::cache::EntityCache;
use super::models::{
    Identity, PageCursor, PagedPosts, PagedPostsBody, Post, PostBody, Publication,
    PublicationBody,
};
use super::{Gateway, GatewayError};

/// Client for the grove/pebbles content services.
///
/// Single-entity fetches (post by uid, identity by id, publication by label)
/// are memoized for the lifetime of the client: one remote call per key,
/// shared by concurrent callers. Paged queries are never cached.
pub struct GroveClient {
    client: reqwest::Client,
    base_url: String,
    posts: EntityCache<Post>,
    identities: EntityCache<Identity>,
    publications: EntityCache<Publication>,
}

impl GroveClient {
    /// Create a new grove client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the grove services (e.g. "http://pebbles.o5.no")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        // Ensure base_url doesn't have a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            posts: EntityCache::new(),
            identities: EntityCache::new(),
            publications: EntityCache::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        client: &reqwest::Client,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        debug!(url = %url, "Fetching from grove");

        let response = client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("decoding {} failed: {}", url, e)))
    }
}

#[async_trait]
impl Gateway for GroveClient {
    async fn fetch_posts(
        &self,
        query: &str,
        cursor: PageCursor,
    ) -> Result<PagedPosts, GatewayError> {
        let url = format!("{}/posts/{}", self.base_url, query);
        let params = [
            ("offset", cursor.offset.to_string()),
            ("limit", cursor.limit.to_string()),
        ];
        let body: PagedPostsBody = Self::get_json(&self.client, url, &params).await?;
        Ok(body.into())
    }

    async fn fetch_post(&self, uid: &str) -> Result<Arc<Post>, GatewayError> {
        let url = format!("{}/posts/{}", self.base_url, uid);
        let client = self.client.clone();
        self.posts
            .get_or_fetch(uid, async move {
                let body: PostBody = Self::get_json(&client, url, &[]).await?;
                Ok(Arc::new(body.post))
            })
            .await
    }

    async fn fetch_identity(&self, id: u64) -> Result<Arc<Identity>, GatewayError> {
        let url = format!("{}/identities/{}", self.base_url, id);
        let client = self.client.clone();
        self.identities
            .get_or_fetch(&id.to_string(), async move {
                let identity: Identity = Self::get_json(&client, url, &[]).await?;
                Ok(Arc::new(identity))
            })
            .await
    }

    async fn fetch_publication(&self, label: &str) -> Result<Arc<Publication>, GatewayError> {
        let url = format!("{}/publications/{}", self.base_url, label);
        let client = self.client.clone();
        self.publications
            .get_or_fetch(label, async move {
                let body: PublicationBody = Self::get_json(&client, url, &[]).await?;
                Ok(Arc::new(body.publication))
            })
            .await
    }
}
