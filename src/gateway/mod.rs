//! Typed access to the remote content services.
//!
//! Three logical services back the export: posts (tracks and artists),
//! identities (uploaders) and publications. The [`Gateway`] trait is the
//! seam the pipeline depends on; [`GroveClient`] is the HTTP implementation.

mod cache;
mod client;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use client::GroveClient;
pub use models::{Identity, PageCursor, PagedPosts, Post, Publication};

/// Failure of a remote fetch.
///
/// `Clone` so memoized results can be shared between callers.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    #[error("Request failed with status {status}: {url}")]
    Status { status: u16, url: String },

    #[error("{0}")]
    Transport(String),
}

impl GatewayError {
    /// HTTP status code, if the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            GatewayError::Transport(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }
}

/// Fetch operations against the content services.
///
/// Implementations memoize the single-entity fetches per key for their own
/// lifetime; callers for the same uid/id/label share one remote call.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// One page of posts matching a catalog query.
    async fn fetch_posts(
        &self,
        query: &str,
        cursor: PageCursor,
    ) -> Result<PagedPosts, GatewayError>;

    /// A single post by uid. Memoized.
    async fn fetch_post(&self, uid: &str) -> Result<Arc<Post>, GatewayError>;

    /// An identity by numeric id. Memoized.
    async fn fetch_identity(&self, id: u64) -> Result<Arc<Identity>, GatewayError>;

    /// A publication by label. Memoized.
    async fn fetch_publication(&self, label: &str) -> Result<Arc<Publication>, GatewayError>;
}
