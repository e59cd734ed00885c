//! Pure join and merge rules applied during a fetch.
//!
//! Keeping these free of I/O lets the synchronization semantics be tested
//! without a live API or notification collaborator.

use time::OffsetDateTime;

use crate::application::remote::{
    RemoteCommentRecord, RemotePhotoRecord, RemotePostRecord, RemoteTodoRecord, RemoteUserRecord,
};
use crate::domain::posts::{
    Comment, PhotoAttachment, Post, PostId, TodoItem, UserProfile, derive_excerpt,
    placeholder_image,
};

pub(crate) const DEFAULT_CATEGORY: &str = "General";
const FALLBACK_AUTHOR: &str = "API User";
const FALLBACK_COMMENT_AUTHOR: &str = "User";

/// The five remote record sets read concurrently during a fetch.
#[derive(Debug, Clone, Default)]
pub(crate) struct RemoteSnapshot {
    pub posts: Vec<RemotePostRecord>,
    pub users: Vec<RemoteUserRecord>,
    pub photos: Vec<RemotePhotoRecord>,
    pub comments: Vec<RemoteCommentRecord>,
    pub todos: Vec<RemoteTodoRecord>,
}

/// Correlate the five record sets into enriched posts.
///
/// Per post: at most one author (user id match), at most one cover photo
/// (photo id equals post id), zero or more comments (post id foreign key),
/// and zero or more todos belonging to the same user.
pub(crate) fn join_remote(snapshot: RemoteSnapshot, fetched_at: OffsetDateTime) -> Vec<Post> {
    let RemoteSnapshot {
        posts,
        users,
        photos,
        comments,
        todos,
    } = snapshot;

    posts
        .into_iter()
        .map(|record| {
            let id = PostId::from_number(record.id);
            let user = users.iter().find(|user| user.id == record.user_id);
            let photo = photos.iter().find(|photo| photo.id == record.id);

            let post_comments = comments
                .iter()
                .filter(|comment| comment.post_id == record.id)
                .map(|comment| Comment {
                    id: comment.id.to_string(),
                    post_id: id.clone(),
                    author: comment_author(comment),
                    content: comment.body.clone(),
                    created_at: fetched_at,
                })
                .collect();

            let user_todos = todos
                .iter()
                .filter(|todo| todo.user_id == record.user_id)
                .map(|todo| TodoItem {
                    id: todo.id,
                    title: todo.title.clone(),
                    completed: todo.completed,
                })
                .collect();

            let image = photo
                .map(|photo| photo.url.clone())
                .unwrap_or_else(|| placeholder_image(&id));

            Post {
                title: record.title,
                excerpt: derive_excerpt(&record.body),
                content: format!("<p>{}</p>", record.body),
                image,
                category: DEFAULT_CATEGORY.to_string(),
                author: user
                    .map(|user| user.name.clone())
                    .unwrap_or_else(|| FALLBACK_AUTHOR.to_string()),
                created_at: fetched_at,
                comments: post_comments,
                user: user.map(|user| UserProfile {
                    id: user.id,
                    name: user.name.clone(),
                    username: user.username.clone(),
                    email: user.email.clone(),
                }),
                photo: photo.map(|photo| PhotoAttachment {
                    url: photo.url.clone(),
                    thumbnail_url: photo.thumbnail_url.clone(),
                }),
                todos: user_todos,
                id,
            }
        })
        .collect()
}

/// Posts created this session stay ahead of the freshly fetched ones; the
/// previously held remote posts are replaced wholesale.
pub(crate) fn merge_collections(existing: Vec<Post>, fetched: Vec<Post>) -> Vec<Post> {
    let mut merged: Vec<Post> = existing
        .into_iter()
        .filter(|post| post.id.survives_fetch())
        .collect();
    merged.extend(fetched);
    merged
}

/// The external API stores plain bodies; strip all markup before a write.
pub(crate) fn plain_text(html: &str) -> String {
    ammonia::Builder::empty().clean(html).to_string()
}

fn comment_author(record: &RemoteCommentRecord) -> String {
    if !record.email.is_empty() {
        record.email.clone()
    } else if !record.name.is_empty() {
        record.name.clone()
    } else {
        FALLBACK_COMMENT_AUTHOR.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::posts::EXCERPT_CHARS;
    use time::macros::datetime;

    fn post_record(id: u64, user_id: u64, body: &str) -> RemotePostRecord {
        RemotePostRecord {
            id,
            user_id,
            title: format!("post {id}"),
            body: body.to_string(),
        }
    }

    fn snapshot_with_one_post() -> RemoteSnapshot {
        RemoteSnapshot {
            posts: vec![post_record(1, 7, "short body")],
            users: vec![RemoteUserRecord {
                id: 7,
                name: "Leanne Graham".to_string(),
                username: "Bret".to_string(),
                email: "leanne@example.org".to_string(),
            }],
            photos: vec![RemotePhotoRecord {
                id: 1,
                url: "https://photos.example/1".to_string(),
                thumbnail_url: "https://photos.example/1/thumb".to_string(),
            }],
            comments: vec![
                RemoteCommentRecord {
                    id: 11,
                    post_id: 1,
                    name: "first".to_string(),
                    email: "ann@example.org".to_string(),
                    body: "nice".to_string(),
                },
                RemoteCommentRecord {
                    id: 12,
                    post_id: 2,
                    name: "other post".to_string(),
                    email: "bob@example.org".to_string(),
                    body: "elsewhere".to_string(),
                },
            ],
            todos: vec![RemoteTodoRecord {
                id: 21,
                user_id: 7,
                title: "todo".to_string(),
                completed: false,
            }],
        }
    }

    #[test]
    fn join_correlates_by_foreign_keys() {
        let fetched_at = datetime!(2026-01-01 00:00 UTC);
        let posts = join_remote(snapshot_with_one_post(), fetched_at);

        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.id, PostId::new("1"));
        assert_eq!(post.author, "Leanne Graham");
        assert_eq!(post.image, "https://photos.example/1");
        assert_eq!(post.content, "<p>short body</p>");
        assert_eq!(post.category, DEFAULT_CATEGORY);
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].author, "ann@example.org");
        assert_eq!(post.comments[0].post_id, post.id);
        assert_eq!(post.todos.len(), 1);
        assert!(post.user.is_some());
        assert!(post.photo.is_some());
    }

    #[test]
    fn join_falls_back_when_matches_are_absent() {
        let snapshot = RemoteSnapshot {
            posts: vec![post_record(3, 99, &"x".repeat(EXCERPT_CHARS + 10))],
            ..RemoteSnapshot::default()
        };

        let posts = join_remote(snapshot, datetime!(2026-01-01 00:00 UTC));
        let post = &posts[0];
        assert_eq!(post.author, "API User");
        assert_eq!(post.image, "https://picsum.photos/seed/3/800/400");
        assert!(post.user.is_none());
        assert!(post.photo.is_none());
        assert!(post.comments.is_empty());
        assert!(post.todos.is_empty());
        assert_eq!(post.excerpt.chars().count(), EXCERPT_CHARS + 3);
    }

    #[test]
    fn merge_keeps_session_local_posts_in_front() {
        let fetched_at = datetime!(2026-01-01 00:00 UTC);
        let old_remote = join_remote(snapshot_with_one_post(), fetched_at);
        let mut local = old_remote[0].clone();
        local.id = PostId::new("1042");
        local.title = "kept".to_string();

        let existing = vec![local.clone(), old_remote[0].clone()];
        let fetched = join_remote(snapshot_with_one_post(), fetched_at);
        let merged = merge_collections(existing, fetched);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], local);
        assert_eq!(merged[1].id, PostId::new("1"));
    }

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(plain_text("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(plain_text("no markup"), "no markup");
    }
}
