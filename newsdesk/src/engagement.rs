//! Reader engagement: likes and comments.

use chrono::NaiveDateTime;
use log::{info, warn};
use newsdesk_core::db::{BackendConnection, ConnectionMethods};
use newsdesk_core::AutoPk;
use serde::{Deserialize, Serialize};

use crate::models::{Comment, Post, PostLike, Profile};
use crate::settings::load_settings;
use crate::validate;
use crate::{now, DataObject, DataObjectOps, DataResult, Error, Result};

/// Longest comment accepted, in characters.
pub const MAX_COMMENT_CHARS: usize = 1000;
/// Display name of authors who give none.
pub const ANONYMOUS: &str = "Anonymous";

fn public_post(conn: &impl ConnectionMethods, post_id: i64) -> Result<Post> {
    Post::query()
        .filter(Post::public())
        .and(Post::fields().id().eq(post_id))
        .load_first(conn)?
        .ok_or_else(|| Error::not_found(format!("Article {post_id}")))
}

/// Record a like of `post_id` by `visitor` and return the new like
/// count. Each visitor can like a post once; later likes fail with
/// [`Error::AlreadyLiked`] and leave the count unchanged.
pub fn like_article(
    conn: &mut impl BackendConnection,
    post_id: i64,
    visitor: &str,
) -> Result<i64> {
    let visitor = validate::required("visitor", visitor)?;
    let tx = conn.transaction()?;
    public_post(&tx, post_id)?;
    let mut like = PostLike {
        id: AutoPk::uninitialized(),
        post_id,
        visitor,
        created_at: now(),
    };
    match like.save(&tx) {
        Ok(()) => {}
        Err(e) if e.is_constraint_violation() => {
            warn!("Visitor {} already liked post {post_id}", like.visitor);
            return Err(Error::AlreadyLiked);
        }
        Err(e) => return Err(e.into()),
    }
    tx.increment_where(Post::TABLE, "likes", 1, Post::fields().id().eq(post_id))?;
    let likes = Post::get(&tx, post_id)?.likes;
    tx.commit()?;
    Ok(likes)
}

/// Whether `visitor` has liked `post_id`.
pub fn has_liked(conn: &impl ConnectionMethods, post_id: i64, visitor: &str) -> Result<bool> {
    let f = PostLike::fields();
    let count = PostLike::query()
        .filter(f.post_id().eq(post_id))
        .and(f.visitor().eq(visitor.trim()))
        .count(conn)?;
    Ok(count > 0)
}

/// Who is writing a comment.
#[derive(Clone, Debug, PartialEq)]
pub enum CommentAuthor {
    /// A signed-in reader.
    Member(Profile),
    /// A reader who is not signed in, with the name they gave, if any.
    Guest(Option<String>),
}

impl CommentAuthor {
    /// Name shown with the comment.
    pub fn display_name(&self) -> String {
        match self {
            CommentAuthor::Member(profile) => profile.display_name(),
            CommentAuthor::Guest(name) => {
                validate::optional(name.as_deref()).unwrap_or_else(|| ANONYMOUS.to_string())
            }
        }
    }

    fn profile_id(&self) -> Option<i64> {
        match self {
            CommentAuthor::Member(profile) => *profile.id,
            CommentAuthor::Guest(_) => None,
        }
    }
}

/// A comment as shown under an article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub author: String,
    /// First letter of the author's name, for the avatar bubble.
    pub initial: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl CommentView {
    fn from_comment(comment: Comment) -> Result<Self> {
        let initial: String = comment
            .author
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();
        Ok(CommentView {
            id: comment.id.saved()?,
            post_id: comment.post_id,
            author: comment.author,
            initial,
            content: comment.content,
            created_at: comment.created_at,
        })
    }
}

/// Add a comment to a published article. Refused when public
/// comments are switched off in the site settings.
pub fn add_comment(
    conn: &impl ConnectionMethods,
    post_id: i64,
    author: &CommentAuthor,
    content: &str,
) -> Result<CommentView> {
    if !load_settings(conn)?.public_comments {
        warn!("Comment on post {post_id} refused, comments are disabled");
        return Err(Error::CommentsDisabled);
    }
    let content = validate::required("content", content)?;
    let content = validate::max_chars("content", content, MAX_COMMENT_CHARS)?;
    public_post(conn, post_id)?;
    let mut comment = Comment {
        id: AutoPk::uninitialized(),
        post_id,
        profile_id: author.profile_id(),
        author: author.display_name(),
        content,
        created_at: now(),
    };
    comment.save(conn)?;
    info!("New comment {} on post {post_id}", comment.id);
    CommentView::from_comment(comment)
}

/// Comments on a post, newest first.
pub fn list_comments(conn: &impl ConnectionMethods, post_id: i64) -> Result<Vec<CommentView>> {
    Comment::query()
        .filter(Comment::fields().post_id().eq(post_id))
        .order_desc("created_at")
        .order_desc("id")
        .load(conn)?
        .into_iter()
        .map(CommentView::from_comment)
        .collect()
}
