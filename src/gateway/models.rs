//! Wire models for the grove/pebbles services.
//!
//! Only the fields this tool consumes are modeled; everything else in the
//! remote documents is ignored by serde.

use serde::Deserialize;

/// A grove post. Both tracks and artists come back as posts, with the
/// document shape varying by klass, so the document is one loose struct.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub uid: String,
    pub created_by: Option<u64>,
    pub document: PostDocument,
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub struct PostDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
}

/// A member of an artist document (band lineups).
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct Member {
    pub name: String,
}

/// An identity from the identities service.
#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub profile: IdentityProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProfile {
    pub name: String,
}

/// A publication from the publications service, or a synthesized stand-in
/// when the lookup fails.
#[derive(Debug, Clone, Deserialize)]
pub struct Publication {
    #[serde(default)]
    pub label: Option<String>,
    pub title: String,
}

/// One page of a paged posts query.
#[derive(Debug, Clone)]
pub struct PagedPosts {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub offset: u32,
    pub limit: u32,
    pub last_page: bool,
}

/// Cursor for advancing through a paged posts query.
#[derive(Debug, Clone, Copy)]
pub struct PageCursor {
    pub offset: u32,
    pub limit: u32,
}

impl PageCursor {
    pub fn first(limit: u32) -> Self {
        Self { offset: 0, limit }
    }

    /// The cursor for the page after the one this pagination came from.
    pub fn after(pagination: &Pagination) -> Self {
        Self {
            offset: pagination.offset + pagination.limit,
            limit: pagination.limit,
        }
    }
}

// Response envelopes. The grove API wraps each post in its own envelope in
// paged responses, and single entities in a body-level field.

#[derive(Debug, Deserialize)]
pub(crate) struct PagedPostsBody {
    pub posts: Vec<PostEnvelope>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostEnvelope {
    pub post: Post,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostBody {
    pub post: Post,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublicationBody {
    pub publication: Publication,
}

impl From<PagedPostsBody> for PagedPosts {
    fn from(body: PagedPostsBody) -> Self {
        Self {
            posts: body.posts.into_iter().map(|env| env.post).collect(),
            pagination: body.pagination,
        }
    }
}
