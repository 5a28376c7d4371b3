//! Editorial dashboard operations: writing posts, publishing them and
//! moving them through the trash.
//!
//! Deleting a post from the dashboard only moves it to the trash by
//! stamping `deleted_at`. It can be restored from there, or destroyed
//! for good.

use std::fmt;
use std::str::FromStr;

use log::{info, warn};
use newsdesk_core::db::ConnectionMethods;
use newsdesk_core::query::{escape_like, BoolExpr};
use newsdesk_core::{AutoPk, SqlVal, ToSql};
use serde::{Deserialize, Serialize};

use crate::models::{update_fields, Comment, Post, Subscriber};
use crate::slug::{slugify, with_suffix};
use crate::validate;
use crate::{now, DataObject, DataObjectOps, DataResult, Error, Result};

/// Category preselected in the editor form.
pub const DEFAULT_CATEGORY: &str = "Politics";

/// Categories offered by the editor form.
pub const CATEGORIES: &[&str] = &[
    "Politics",
    "Human Rights",
    "Exclusive",
    "Diplomacy",
    "Business",
    "Tech",
];

/// The editor form. A blank slug is derived from the title.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDraft {
    pub title: String,
    pub subtitle: Option<String>,
    pub slug: Option<String>,
    pub category: String,
    pub summary: String,
    pub content: String,
    pub image_url: Option<String>,
    pub image_caption: Option<String>,
    pub is_published: bool,
}

impl Default for PostDraft {
    fn default() -> Self {
        PostDraft {
            title: String::new(),
            subtitle: None,
            slug: None,
            category: DEFAULT_CATEGORY.to_string(),
            summary: String::new(),
            content: String::new(),
            image_url: None,
            image_caption: None,
            is_published: false,
        }
    }
}

impl PostDraft {
    /// An unpublished draft with the required fields filled in.
    pub fn new(title: &str, category: &str, summary: &str, content: &str) -> Self {
        PostDraft {
            title: title.to_string(),
            category: category.to_string(),
            summary: summary.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    /// The form prefilled from an existing post.
    pub fn from_post(post: &Post) -> Self {
        PostDraft {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            slug: Some(post.slug.clone()),
            category: post.category.clone(),
            summary: post.summary.clone(),
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            image_caption: post.image_caption.clone(),
            is_published: post.is_published,
        }
    }

    /// Mark the draft for immediate publication.
    pub fn published(mut self) -> Self {
        self.is_published = true;
        self
    }

    fn validated(&self) -> Result<ValidDraft> {
        let title = validate::required("title", &self.title)?;
        let category = validate::required("category", &self.category)?;
        let summary = validate::required("summary", &self.summary)?;
        let content = validate::required("content", &self.content)?;
        let image_url = match validate::optional(self.image_url.as_deref()) {
            Some(url) => Some(validate::link("image_url", &url)?),
            None => None,
        };
        let slug = match validate::optional(self.slug.as_deref()) {
            Some(slug) => slugify(&slug),
            None => slugify(&title),
        };
        if slug.is_empty() {
            return Err(Error::invalid(
                "slug",
                "must contain at least one letter or digit",
            ));
        }
        Ok(ValidDraft {
            title,
            subtitle: validate::optional(self.subtitle.as_deref()),
            slug,
            category,
            summary,
            content,
            image_url,
            image_caption: validate::optional(self.image_caption.as_deref()),
            is_published: self.is_published,
        })
    }
}

struct ValidDraft {
    title: String,
    subtitle: Option<String>,
    slug: String,
    category: String,
    summary: String,
    content: String,
    image_url: Option<String>,
    image_caption: Option<String>,
    is_published: bool,
}

/// First free slug in `category`, trying `base`, `base-2`, `base-3`, ...
/// The post `except` does not count as taking a slug.
fn unique_slug(
    conn: &impl ConnectionMethods,
    category: &str,
    base: &str,
    except: Option<i64>,
) -> Result<String> {
    let f = Post::fields();
    let mut n = 1;
    loop {
        let candidate = with_suffix(base, n);
        let mut query = Post::query()
            .filter(f.category().ilike(escape_like(category)))
            .and(f.slug().eq(candidate.as_str()));
        if let Some(id) = except {
            query = query.and(f.id().ne(id));
        }
        if query.count(conn)? == 0 {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Create a post written by `author_id`.
pub fn create_post(
    conn: &impl ConnectionMethods,
    author_id: Option<i64>,
    draft: &PostDraft,
) -> Result<Post> {
    let draft = draft.validated()?;
    let slug = unique_slug(conn, &draft.category, &draft.slug, None)?;
    let mut post = Post {
        id: AutoPk::uninitialized(),
        title: draft.title,
        subtitle: draft.subtitle,
        slug,
        category: draft.category,
        summary: draft.summary,
        content: draft.content,
        image_url: draft.image_url,
        image_caption: draft.image_caption,
        is_published: draft.is_published,
        author_id,
        likes: 0,
        created_at: now(),
        updated_at: None,
        deleted_at: None,
    };
    post.save(conn)?;
    info!("Created post {} at {}", post.id, post.path());
    Ok(post)
}

/// Any post, including drafts and trashed posts.
pub fn get_post(conn: &impl ConnectionMethods, id: i64) -> Result<Post> {
    Post::try_get(conn, id)?.ok_or_else(|| Error::not_found(format!("Post {id}")))
}

/// Replace the editable fields of a post with those of `draft`.
pub fn update_post(conn: &impl ConnectionMethods, id: i64, draft: &PostDraft) -> Result<Post> {
    let stored = get_post(conn, id)?;
    let draft = if validate::optional(draft.slug.as_deref()).is_some() {
        draft.validated()?
    } else {
        // A blank slug keeps the published URL.
        PostDraft {
            slug: Some(stored.slug),
            ..draft.clone()
        }
        .validated()?
    };
    let slug = unique_slug(conn, &draft.category, &draft.slug, Some(id))?;
    update_fields::<Post>(
        conn,
        Post::fields().id().eq(id),
        vec![
            ("title", draft.title.into()),
            ("subtitle", draft.subtitle.into()),
            ("slug", slug.into()),
            ("category", draft.category.into()),
            ("summary", draft.summary.into()),
            ("content", draft.content.into()),
            ("image_url", draft.image_url.into()),
            ("image_caption", draft.image_caption.into()),
            ("is_published", draft.is_published.into()),
            ("updated_at", now().into()),
        ],
    )?;
    info!("Updated post {id}");
    get_post(conn, id)
}

/// Publish or unpublish a post.
pub fn set_published(conn: &impl ConnectionMethods, id: i64, published: bool) -> Result<Post> {
    get_post(conn, id)?;
    update_fields::<Post>(
        conn,
        Post::fields().id().eq(id),
        vec![
            ("is_published", published.into()),
            ("updated_at", now().into()),
        ],
    )?;
    info!(
        "Post {id} {}",
        if published { "published" } else { "unpublished" }
    );
    get_post(conn, id)
}

/// Which live posts the dashboard lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Published,
    Draft,
}

impl StatusFilter {
    fn expr(self) -> BoolExpr {
        let f = Post::fields();
        match self {
            StatusFilter::All => BoolExpr::True,
            StatusFilter::Published => f.is_published().eq(true),
            StatusFilter::Draft => f.is_published().eq(false),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "published" => Ok(StatusFilter::Published),
            "draft" | "drafts" => Ok(StatusFilter::Draft),
            other => Err(Error::invalid(
                "status",
                format!("expected all, published or draft, got {other:?}"),
            )),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "all",
            StatusFilter::Published => "published",
            StatusFilter::Draft => "draft",
        })
    }
}

/// Posts not in the trash matching `status`, newest first.
pub fn list_posts(conn: &impl ConnectionMethods, status: StatusFilter) -> Result<Vec<Post>> {
    Ok(Post::query()
        .filter(Post::live())
        .and(status.expr())
        .order_desc("created_at")
        .order_desc("id")
        .load(conn)?)
}

/// Move a post to the trash. Trashing an already trashed post keeps
/// its original trash time.
pub fn trash_post(conn: &impl ConnectionMethods, id: i64) -> Result<Post> {
    get_post(conn, id)?;
    let f = Post::fields();
    let changed = update_fields::<Post>(
        conn,
        f.id().eq(id).and(f.deleted_at().is_null()),
        vec![("deleted_at", now().to_sql())],
    )?;
    if changed > 0 {
        info!("Moved post {id} to the trash");
    }
    get_post(conn, id)
}

/// Trashed posts, most recently trashed first.
pub fn list_trash(conn: &impl ConnectionMethods) -> Result<Vec<Post>> {
    Ok(Post::query()
        .filter(Post::fields().deleted_at().is_not_null())
        .order_desc("deleted_at")
        .order_desc("id")
        .load(conn)?)
}

/// Take a post out of the trash. It keeps its publication state.
pub fn restore_post(conn: &impl ConnectionMethods, id: i64) -> Result<Post> {
    get_post(conn, id)?;
    update_fields::<Post>(
        conn,
        Post::fields().id().eq(id),
        vec![("deleted_at", SqlVal::Null)],
    )?;
    info!("Restored post {id}");
    get_post(conn, id)
}

/// Permanently delete a trashed post together with its comments and likes.
pub fn destroy_post(conn: &impl ConnectionMethods, id: i64) -> Result<()> {
    let post = get_post(conn, id)?;
    if !post.is_trashed() {
        warn!("Refusing to destroy post {id}, it is not in the trash");
        return Err(Error::NotInTrash(id));
    }
    post.delete(conn)?;
    info!("Destroyed post {id}");
    Ok(())
}

/// Counts shown on the dashboard overview.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub published: i64,
    pub drafts: i64,
    pub trashed: i64,
    pub comments: i64,
    pub subscribers: i64,
}

/// Gather the dashboard overview counts.
pub fn dashboard_stats(conn: &impl ConnectionMethods) -> Result<DashboardStats> {
    let f = Post::fields();
    Ok(DashboardStats {
        published: Post::query()
            .filter(Post::live())
            .and(f.is_published().eq(true))
            .count(conn)?,
        drafts: Post::query()
            .filter(Post::live())
            .and(f.is_published().eq(false))
            .count(conn)?,
        trashed: Post::query()
            .filter(f.deleted_at().is_not_null())
            .count(conn)?,
        comments: Comment::query().count(conn)?,
        subscribers: Subscriber::query().count(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_slug_is_derived_from_title() {
        let draft = PostDraft::new("  Lake Levels Rise  ", "Environment", "s", "c");
        let valid = draft.validated().unwrap();
        assert_eq!(valid.title, "Lake Levels Rise");
        assert_eq!(valid.slug, "lake-levels-rise");
    }

    #[test]
    fn given_slug_is_normalized() {
        let mut draft = PostDraft::new("Title", "Tech", "s", "c");
        draft.slug = Some("My Custom Slug!".to_string());
        assert_eq!(draft.validated().unwrap().slug, "my-custom-slug");
    }

    #[test]
    fn required_fields() {
        let draft = PostDraft::new("Title", "Tech", "  ", "c");
        assert!(matches!(
            draft.validated(),
            Err(Error::Validation {
                field: "summary",
                ..
            })
        ));
        let draft = PostDraft::new("!!!", "Tech", "s", "c");
        assert!(matches!(
            draft.validated(),
            Err(Error::Validation { field: "slug", .. })
        ));
    }

    #[test]
    fn image_url_must_be_http() {
        let mut draft = PostDraft::new("Title", "Tech", "s", "c");
        draft.image_url = Some("ftp://example.com/a.png".to_string());
        assert!(draft.validated().is_err());
        draft.image_url = Some("   ".to_string());
        assert_eq!(draft.validated().unwrap().image_url, None);
    }

    #[test]
    fn status_filter_parses() {
        assert_eq!(
            "Published".parse::<StatusFilter>().unwrap(),
            StatusFilter::Published
        );
        assert_eq!("drafts".parse::<StatusFilter>().unwrap(), StatusFilter::Draft);
        assert!("archived".parse::<StatusFilter>().is_err());
        assert_eq!(StatusFilter::default().to_string(), "all");
    }
}
