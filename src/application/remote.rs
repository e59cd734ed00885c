//! Trait describing the external blog API collaborator.
//!
//! The application layer owns the contract; infrastructure supplies the
//! HTTP adapter. Wire records mirror the remote resource shapes, with
//! integer ids and foreign keys left as the API delivers them.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePostRecord {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUserRecord {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePhotoRecord {
    pub id: u64,
    pub url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommentRecord {
    pub id: u64,
    pub post_id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTodoRecord {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub completed: bool,
}

/// Id echoed back by the external create endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CreatedPostRecord {
    pub id: u64,
}

/// Payload for the external create and update endpoints. Bodies are plain
/// text; the store strips markup before handing content over.
#[derive(Debug, Clone)]
pub struct RemoteWriteParams {
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait BlogApi: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<RemotePostRecord>, ApiError>;

    async fn list_users(&self) -> Result<Vec<RemoteUserRecord>, ApiError>;

    async fn list_photos(&self) -> Result<Vec<RemotePhotoRecord>, ApiError>;

    async fn list_comments(&self) -> Result<Vec<RemoteCommentRecord>, ApiError>;

    async fn list_todos(&self) -> Result<Vec<RemoteTodoRecord>, ApiError>;

    async fn create_post(&self, params: RemoteWriteParams)
    -> Result<CreatedPostRecord, ApiError>;

    async fn update_post(&self, id: u64, params: RemoteWriteParams) -> Result<(), ApiError>;

    async fn delete_post(&self, id: u64) -> Result<(), ApiError>;
}
