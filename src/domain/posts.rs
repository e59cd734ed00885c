//! Post and comment entities plus the id-space rules that drive write routing.

use std::fmt;

use serde::Serialize;
use time::OffsetDateTime;

/// Highest id the external API assigns to posts of its own.
pub const REMOTE_ID_MAX: u64 = 100;
/// Lowest id handed to posts created in this session.
pub const LOCAL_ID_FLOOR: u64 = 1000;
/// Character budget for derived excerpts, excluding the ellipsis marker.
pub const EXCERPT_CHARS: usize = 120;

const PLACEHOLDER_IMAGE_BASE: &str = "https://picsum.photos/seed";

/// Post identifier spanning two id spaces: small integers assigned by the
/// external API, and session-local values (numeric ids at or above
/// [`LOCAL_ID_FLOOR`], or non-numeric strings) assigned at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_number(value: u64) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// The numeric id when the post originates from the external API.
    ///
    /// Mutating or deleting a remote-backed post must also attempt the
    /// corresponding external write; everything else stays in memory.
    pub fn remote_backed(&self) -> Option<u64> {
        self.as_number().filter(|value| *value <= REMOTE_ID_MAX)
    }

    /// Whether the post outlives a fetch.
    ///
    /// Non-numeric ids and numeric ids at or above [`LOCAL_ID_FLOOR`] are
    /// preserved and placed ahead of the freshly fetched remote posts; the
    /// rest of the collection is replaced wholesale.
    pub fn survives_fetch(&self) -> bool {
        match self.as_number() {
            Some(value) => value >= LOCAL_ID_FLOOR,
            None => true,
        }
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: String,
    pub post_id: PostId,
    pub author: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Author record attached to remotely fetched posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// Cover photo matched to a remotely fetched post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoAttachment {
    pub url: String,
    pub thumbnail_url: String,
}

/// Informational todo attached to the author of a remotely fetched post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodoItem {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

/// A blog post with its embedded, append-only comment sequence.
///
/// The enrichment fields (`user`, `photo`, `todos`) are populated only for
/// posts that came out of a remote fetch; session-local posts never carry
/// them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image: String,
    pub category: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub comments: Vec<Comment>,
    pub user: Option<UserProfile>,
    pub photo: Option<PhotoAttachment>,
    pub todos: Vec<TodoItem>,
}

/// Fields supplied when creating a post; the id and the empty comment
/// sequence are assigned by the store.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub image: String,
    pub category: String,
    pub author: String,
    pub created_at: OffsetDateTime,
}

/// First [`EXCERPT_CHARS`] characters of `body`, with an ellipsis marker
/// appended when the body was truncated.
pub fn derive_excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Deterministic placeholder cover image keyed by post id.
pub fn placeholder_image(id: &PostId) -> String {
    format!("{PLACEHOLDER_IMAGE_BASE}/{id}/800/400")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_up_to_one_hundred_are_remote_backed() {
        assert_eq!(PostId::new("1").remote_backed(), Some(1));
        assert_eq!(PostId::new("100").remote_backed(), Some(100));
        assert_eq!(PostId::new("101").remote_backed(), None);
        assert_eq!(PostId::new("1042").remote_backed(), None);
        assert_eq!(PostId::new("draft-7").remote_backed(), None);
    }

    #[test]
    fn session_local_ids_survive_a_fetch() {
        assert!(PostId::new("1000").survives_fetch());
        assert!(PostId::new("1042").survives_fetch());
        assert!(PostId::new("draft-7").survives_fetch());
        assert!(!PostId::new("5").survives_fetch());
        assert!(!PostId::new("999").survives_fetch());
    }

    #[test]
    fn short_bodies_pass_through_unmarked() {
        assert_eq!(derive_excerpt("brief"), "brief");
        assert_eq!(
            derive_excerpt(&"a".repeat(EXCERPT_CHARS)),
            "a".repeat(EXCERPT_CHARS)
        );
    }

    #[test]
    fn long_bodies_truncate_with_ellipsis() {
        let body = "b".repeat(EXCERPT_CHARS + 50);
        let excerpt = derive_excerpt(&body);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        let body = "é".repeat(EXCERPT_CHARS + 1);
        let excerpt = derive_excerpt(&body);
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 3);
    }

    #[test]
    fn placeholder_image_is_keyed_by_id() {
        let id = PostId::new("42");
        assert_eq!(
            placeholder_image(&id),
            "https://picsum.photos/seed/42/800/400"
        );
    }
}
