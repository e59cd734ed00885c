//! The post synchronization store: single source of truth for posts and
//! comments, mediating between presentation collaborators and the external
//! API.
//!
//! The store owns its collection exclusively and is the only writer; readers
//! receive owned snapshots. Operations take `&mut self`, so two operations
//! can never overlap on one store value.

use std::sync::Arc;

use metrics::counter;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::error::StoreError;
use crate::application::notify::{Notification, Notifier};
use crate::application::remote::{ApiError, BlogApi, RemoteWriteParams};
use crate::application::sync::{RemoteSnapshot, join_remote, merge_collections, plain_text};
use crate::domain::posts::{Comment, LOCAL_ID_FLOOR, Post, PostDraft, PostId};

const FETCH_ERROR_STATE: &str = "Failed to fetch posts";
const CREATE_ERROR_STATE: &str = "Failed to create post";
const UPDATE_ERROR_STATE: &str = "Failed to update post";
const DELETE_ERROR_STATE: &str = "Failed to delete post";

const FETCH_FAILURE_MESSAGE: &str = "Failed to load posts";
const CREATE_SUCCESS_MESSAGE: &str = "Post created successfully";
const UPDATE_SUCCESS_MESSAGE: &str = "Post updated successfully";
const DELETE_SUCCESS_MESSAGE: &str = "Post deleted successfully";
const COMMENT_SUCCESS_MESSAGE: &str = "Your comment has been posted.";

/// Read-only view of the collection handed to presentation collaborators.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub posts: Vec<Post>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct PostStore {
    api: Arc<dyn BlogApi>,
    notifier: Arc<dyn Notifier>,
    posts: Vec<Post>,
    loading: bool,
    error: Option<String>,
    next_local_id: u64,
}

impl PostStore {
    pub fn new(api: Arc<dyn BlogApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            posts: Vec::new(),
            loading: false,
            error: None,
            next_local_id: LOCAL_ID_FLOOR,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Last operation's failure reason; cleared by the next successful fetch.
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            posts: self.posts.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }

    /// Fetch the five remote record sets concurrently, join them into
    /// enriched posts, and replace the collection while keeping
    /// session-local posts in front.
    ///
    /// Fail-fast: the first failing read aborts the join; the previous
    /// collection stays untouched and the failure becomes the
    /// collection-level error.
    pub async fn fetch_posts(&mut self) -> Result<(), StoreError> {
        self.loading = true;
        counter!("inklet_fetch_total").increment(1);

        let result = self.load_remote_snapshot().await;
        self.loading = false;

        match result {
            Ok(snapshot) => {
                let fetched = join_remote(snapshot, OffsetDateTime::now_utc());
                let existing = std::mem::take(&mut self.posts);
                self.posts = merge_collections(existing, fetched);
                self.error = None;
                debug!(posts = self.posts.len(), "collection replaced from remote fetch");
                Ok(())
            }
            Err(err) => {
                counter!("inklet_fetch_error_total").increment(1);
                warn!(error = %err, "remote fetch failed, keeping previous collection");
                self.error = Some(FETCH_ERROR_STATE.to_string());
                self.notifier
                    .notify(Notification::destructive("Error", FETCH_FAILURE_MESSAGE));
                Err(StoreError::remote("fetch", err))
            }
        }
    }

    /// Register the post with the external API, then insert it at the front
    /// of the collection under a freshly allocated session-local id.
    ///
    /// The external echo only seeds the id; on external failure nothing is
    /// inserted.
    pub async fn create_post(&mut self, draft: PostDraft) -> Result<Post, StoreError> {
        self.loading = true;
        counter!("inklet_remote_write_total").increment(1);

        let params = RemoteWriteParams {
            title: draft.title.clone(),
            body: plain_text(&draft.content),
        };
        let echoed = self.api.create_post(params).await;
        self.loading = false;

        match echoed {
            Ok(created) => {
                let id = self.allocate_local_id(Some(created.id));
                let post = Post {
                    id,
                    title: draft.title,
                    excerpt: draft.excerpt,
                    content: draft.content,
                    image: draft.image,
                    category: draft.category,
                    author: draft.author,
                    created_at: draft.created_at,
                    comments: Vec::new(),
                    user: None,
                    photo: None,
                    todos: Vec::new(),
                };
                self.posts.insert(0, post.clone());
                debug!(id = %post.id, "post created");
                self.notifier
                    .notify(Notification::success("Success!", CREATE_SUCCESS_MESSAGE));
                Ok(post)
            }
            Err(err) => Err(self.write_failure("create", CREATE_ERROR_STATE, err)),
        }
    }

    /// Replace the stored post with the matching id in place.
    ///
    /// Remote-backed ids first push the new title and plain-text body to the
    /// external API; the local replacement only happens after that write
    /// succeeds. A missing id is a silent no-op.
    pub async fn update_post(&mut self, post: Post) -> Result<(), StoreError> {
        self.loading = true;
        let result = self.push_remote_update(&post).await;
        self.loading = false;

        match result {
            Ok(()) => {
                if let Some(slot) = self
                    .posts
                    .iter_mut()
                    .find(|existing| existing.id == post.id)
                {
                    *slot = post;
                }
                self.notifier
                    .notify(Notification::success("Success!", UPDATE_SUCCESS_MESSAGE));
                Ok(())
            }
            Err(err) => Err(self.write_failure("update", UPDATE_ERROR_STATE, err)),
        }
    }

    /// Remove the post with the matching id; absent ids are a no-op that
    /// still succeeds. Remote-backed ids also issue the external delete.
    pub async fn delete_post(&mut self, id: &PostId) -> Result<(), StoreError> {
        self.loading = true;
        let result = match id.remote_backed() {
            Some(remote_id) => {
                counter!("inklet_remote_write_total").increment(1);
                self.api.delete_post(remote_id).await
            }
            None => Ok(()),
        };
        self.loading = false;

        match result {
            Ok(()) => {
                self.posts.retain(|post| &post.id != id);
                self.notifier
                    .notify(Notification::success("Success!", DELETE_SUCCESS_MESSAGE));
                Ok(())
            }
            Err(err) => Err(self.write_failure("delete", DELETE_ERROR_STATE, err)),
        }
    }

    /// Append a comment to the matching post. Comments never reach the
    /// external API, and a post id that matches nothing still reports
    /// success to the caller.
    pub fn add_comment(
        &mut self,
        post_id: &PostId,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.clone(),
            author: author.into(),
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
        };

        if let Some(post) = self.posts.iter_mut().find(|post| &post.id == post_id) {
            post.comments.push(comment.clone());
        }
        self.notifier.notify(Notification::success(
            "Comment added!",
            COMMENT_SUCCESS_MESSAGE,
        ));
        comment
    }

    async fn load_remote_snapshot(&self) -> Result<RemoteSnapshot, ApiError> {
        let (posts, users, photos, comments, todos) = tokio::try_join!(
            self.api.list_posts(),
            self.api.list_users(),
            self.api.list_photos(),
            self.api.list_comments(),
            self.api.list_todos(),
        )?;

        Ok(RemoteSnapshot {
            posts,
            users,
            photos,
            comments,
            todos,
        })
    }

    async fn push_remote_update(&self, post: &Post) -> Result<(), ApiError> {
        let Some(remote_id) = post.id.remote_backed() else {
            return Ok(());
        };

        counter!("inklet_remote_write_total").increment(1);
        self.api
            .update_post(
                remote_id,
                RemoteWriteParams {
                    title: post.title.clone(),
                    body: plain_text(&post.content),
                },
            )
            .await
    }

    /// Session-local ids start at [`LOCAL_ID_FLOOR`]. The remote echo seeds
    /// the value but the allocator never moves backwards, so repeated
    /// creates cannot reuse an id within a session.
    fn allocate_local_id(&mut self, echoed: Option<u64>) -> PostId {
        let seeded = echoed.and_then(|id| id.checked_add(LOCAL_ID_FLOOR));
        let mut value = match seeded {
            Some(candidate) if candidate >= self.next_local_id => candidate,
            _ => self.next_local_id,
        };
        while self.id_taken(value) {
            value += 1;
        }
        self.next_local_id = value + 1;
        PostId::from_number(value)
    }

    fn id_taken(&self, value: u64) -> bool {
        let id = PostId::from_number(value);
        self.posts.iter().any(|post| post.id == id)
    }

    fn write_failure(
        &mut self,
        operation: &'static str,
        state: &str,
        err: ApiError,
    ) -> StoreError {
        counter!("inklet_remote_write_error_total").increment(1);
        warn!(error = %err, operation, "external write failed, local mutation skipped");
        self.error = Some(state.to_string());
        self.notifier.notify(Notification::destructive("Error", state));
        StoreError::remote(operation, err)
    }
}
