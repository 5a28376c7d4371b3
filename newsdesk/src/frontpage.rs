//! Reads behind the public pages. Only published posts that are not in
//! the trash are ever returned.

use newsdesk_core::db::ConnectionMethods;
use newsdesk_core::query::escape_like;
use newsdesk_core::Query;
use serde::Serialize;

use crate::engagement::{list_comments, CommentView};
use crate::models::Post;
use crate::settings::load_settings;
use crate::slug::{category_from_segment, category_title};
use crate::{DataObject, DataResult, Error, Result};

/// Number of stories on the home page: one breaking story, four top
/// stories and eight more stories.
pub const HOME_PAGE_SIZE: i32 = 13;
const TOP_STORIES: usize = 4;
/// Stories in the hero carousel.
pub const HERO_SIZE: i32 = 3;
/// Default length of the latest-news list.
pub const DEFAULT_LATEST: i32 = 8;
/// Top stories beside an article.
pub const SIDEBAR_SIZE: i32 = 4;
/// Most results a search returns.
pub const SEARCH_LIMIT: i32 = 50;

fn newest() -> Query<Post> {
    Post::query()
        .filter(Post::public())
        .order_desc("created_at")
        .order_desc("id")
}

/// The home page layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HomePage {
    pub breaking: Option<Post>,
    pub top_stories: Vec<Post>,
    pub more_stories: Vec<Post>,
}

/// The newest stories arranged for the home page.
pub fn home_page(conn: &impl ConnectionMethods) -> Result<HomePage> {
    let mut posts = newest().limit(HOME_PAGE_SIZE).load(conn)?.into_iter();
    let breaking = posts.next();
    let top_stories = posts.by_ref().take(TOP_STORIES).collect();
    let more_stories = posts.collect();
    Ok(HomePage {
        breaking,
        top_stories,
        more_stories,
    })
}

/// Stories for the hero carousel.
pub fn hero(conn: &impl ConnectionMethods) -> Result<Vec<Post>> {
    Ok(newest().limit(HERO_SIZE).load(conn)?)
}

/// The `limit` newest stories, [`DEFAULT_LATEST`] if not given. The
/// limit is clamped to between 1 and [`SEARCH_LIMIT`].
pub fn latest(conn: &impl ConnectionMethods, limit: Option<i32>) -> Result<Vec<Post>> {
    let limit = limit.unwrap_or(DEFAULT_LATEST).clamp(1, SEARCH_LIMIT);
    Ok(newest().limit(limit).load(conn)?)
}

/// A category listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryPage {
    /// Heading, e.g. `Human rights` for `human-rights`.
    pub title: String,
    /// The URL segment the page was requested with.
    pub segment: String,
    pub posts: Vec<Post>,
}

/// Published stories in the category named by a URL segment, newest
/// first. An unknown category yields an empty page.
pub fn category_page(conn: &impl ConnectionMethods, segment: &str) -> Result<CategoryPage> {
    let category = category_from_segment(segment);
    let posts = newest()
        .and(Post::fields().category().ilike(escape_like(&category)))
        .load(conn)?;
    Ok(CategoryPage {
        title: category_title(segment),
        segment: segment.to_string(),
        posts,
    })
}

/// An article page with its discussion.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArticlePage {
    pub post: Post,
    /// Newest first.
    pub comments: Vec<CommentView>,
    /// Whether readers may add comments.
    pub comments_enabled: bool,
}

/// The published article with `slug` in the category named by `segment`.
pub fn article_by_slug(
    conn: &impl ConnectionMethods,
    segment: &str,
    slug: &str,
) -> Result<ArticlePage> {
    let f = Post::fields();
    let category = category_from_segment(segment);
    let post = newest()
        .and(f.category().ilike(escape_like(&category)))
        .and(f.slug().eq(slug))
        .load_first(conn)?
        .ok_or_else(|| Error::not_found(format!("Article {segment}/{slug}")))?;
    let comments = list_comments(conn, post.id.saved()?)?;
    let comments_enabled = load_settings(conn)?.public_comments;
    Ok(ArticlePage {
        post,
        comments,
        comments_enabled,
    })
}

/// An article page with the top stories sidebar.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArticleWithSidebar {
    pub post: Post,
    /// Newest other stories.
    pub top_stories: Vec<Post>,
}

/// The published article with `id` and up to [`SIDEBAR_SIZE`] other stories.
pub fn article_by_id(conn: &impl ConnectionMethods, id: i64) -> Result<ArticleWithSidebar> {
    let f = Post::fields();
    let post = newest()
        .and(f.id().eq(id))
        .load_first(conn)?
        .ok_or_else(|| Error::not_found(format!("Article {id}")))?;
    let top_stories = newest()
        .and(f.id().ne(id))
        .limit(SIDEBAR_SIZE)
        .load(conn)?;
    Ok(ArticleWithSidebar { post, top_stories })
}

/// Published stories whose title or summary contains `q`, ignoring
/// case, newest first. A blank query returns the newest stories.
pub fn search(conn: &impl ConnectionMethods, q: &str) -> Result<Vec<Post>> {
    let q = q.trim();
    let mut query = newest().limit(SEARCH_LIMIT);
    if !q.is_empty() {
        let f = Post::fields();
        query = query.and(f.title().icontains(q).or(f.summary().icontains(q)));
    }
    Ok(query.load(conn)?)
}
