//! Database models. Each model maps one table; the `*Fields` structs
//! provide typed column handles for building query filters:
//! ```
//! use newsdesk::models::Post;
//! use newsdesk::{DataObject, DataResult};
//!
//! let f = Post::fields();
//! let q = Post::query().filter(Post::public()).and(f.category().eq("Politics"));
//! ```

use chrono::{NaiveDateTime, Utc};
use newsdesk_core::db::{Column, ConnectionMethods, Row};
use newsdesk_core::internal::DataObjectInternal;
use newsdesk_core::query::{BoolExpr, FieldExpr};
use newsdesk_core::{
    AutoPk, DataObject, DataResult, PrimaryKeyType, Query, SqlType, SqlVal, ToSql,
};
use serde::{Deserialize, Serialize};

use crate::slug::category_segment;

/// Implements the data-layer traits for a model struct declared
/// alongside. The primary key comes first, followed by every other
/// column in table order.
macro_rules! model {
    (
        $model:ident, $fields:ident, table = $table:literal, auto_pk = $auto:literal,
        pk $pk:ident: $pkty:ty => $pksql:ident as $pkexpr:ty,
        { $($field:ident: $fty:ty => $sql:ident),* $(,)? }
    ) => {
        #[doc = concat!("Typed column handles for [`", stringify!($model), "`].")]
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $fields;
        #[allow(missing_docs)]
        impl $fields {
            pub fn $pk(&self) -> FieldExpr<$pkexpr> {
                FieldExpr::new(stringify!($pk))
            }
            $(
                pub fn $field(&self) -> FieldExpr<$fty> {
                    FieldExpr::new(stringify!($field))
                }
            )*
        }

        impl DataResult for $model {
            type DBO = Self;
            const COLUMNS: &'static [Column] = &[
                Column::new(stringify!($pk), SqlType::$pksql),
                $(Column::new(stringify!($field), SqlType::$sql)),*
            ];
            fn from_row(row: &Row) -> newsdesk_core::Result<Self> {
                let mut idx = 0usize;
                let mut next = || {
                    idx += 1;
                    idx - 1
                };
                Ok($model {
                    $pk: row.get(next())?,
                    $($field: row.get(next())?),*
                })
            }
            fn query() -> Query<Self> {
                Query::new($table)
            }
        }

        impl DataObjectInternal for $model {
            const NON_PK_COLUMNS: &'static [Column] =
                &[$(Column::new(stringify!($field), SqlType::$sql)),*];
            fn pk_mut(&mut self) -> &mut impl PrimaryKeyType {
                &mut self.$pk
            }
            fn non_pk_values(&self) -> Vec<SqlVal> {
                vec![$(self.$field.to_sql()),*]
            }
        }

        impl DataObject for $model {
            type PKType = $pkty;
            type Fields = $fields;
            const PKCOL: &'static str = stringify!($pk);
            const TABLE: &'static str = $table;
            const AUTO_PK: bool = $auto;
            fn pk(&self) -> &$pkty {
                &self.$pk
            }
        }
    };
}

/// Set the named columns of every `T` row matching `filter`, leaving
/// the other columns alone. Returns the number of rows changed.
pub(crate) fn update_fields<T: DataObject>(
    conn: &impl ConnectionMethods,
    filter: BoolExpr,
    values: Vec<(&'static str, SqlVal)>,
) -> newsdesk_core::Result<usize> {
    let mut columns = Vec::with_capacity(values.len());
    let mut vals = Vec::with_capacity(values.len());
    for (name, val) in values {
        let column = T::COLUMNS
            .iter()
            .find(|c| c.name() == name)
            .copied()
            .ok_or_else(|| {
                newsdesk_core::Error::Internal(format!("{} has no column {name}", T::TABLE))
            })?;
        columns.push(column);
        vals.push(val);
    }
    conn.update_where(T::TABLE, &columns, &vals, filter)
}

/// A news article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: AutoPk<i64>,
    pub title: String,
    pub subtitle: Option<String>,
    pub slug: String,
    pub category: String,
    pub summary: String,
    pub content: String,
    pub image_url: Option<String>,
    pub image_caption: Option<String>,
    pub is_published: bool,
    pub author_id: Option<i64>,
    pub likes: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
    /// Set when the post is in the trash.
    pub deleted_at: Option<NaiveDateTime>,
}
model!(Post, PostFields, table = "posts", auto_pk = true,
    pk id: AutoPk<i64> => BigInt as i64,
    {
        title: String => Text,
        subtitle: Option<String> => Text,
        slug: String => Text,
        category: String => Text,
        summary: String => Text,
        content: String => Text,
        image_url: Option<String> => Text,
        image_caption: Option<String> => Text,
        is_published: bool => Bool,
        author_id: Option<i64> => BigInt,
        likes: i64 => BigInt,
        created_at: NaiveDateTime => Timestamp,
        updated_at: Option<NaiveDateTime> => Timestamp,
        deleted_at: Option<NaiveDateTime> => Timestamp,
    }
);

impl Post {
    /// Posts not in the trash.
    pub fn live() -> BoolExpr {
        Post::fields().deleted_at().is_null()
    }

    /// Posts readers can see: published and not in the trash.
    pub fn public() -> BoolExpr {
        Post::fields().is_published().eq(true).and(Post::live())
    }

    /// Whether readers can see this post.
    pub fn is_public(&self) -> bool {
        self.is_published && self.deleted_at.is_none()
    }

    /// Whether the post is in the trash.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Public path of the article page, `/<category>/<slug>`.
    pub fn path(&self) -> String {
        format!("/{}/{}", category_segment(&self.category), self.slug)
    }
}

/// A reader comment on a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: AutoPk<i64>,
    pub post_id: i64,
    /// Signed-in author, if any.
    pub profile_id: Option<i64>,
    /// Display name captured when the comment was written.
    pub author: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}
model!(Comment, CommentFields, table = "comments", auto_pk = true,
    pk id: AutoPk<i64> => BigInt as i64,
    {
        post_id: i64 => BigInt,
        profile_id: Option<i64> => BigInt,
        author: String => Text,
        content: String => Text,
        created_at: NaiveDateTime => Timestamp,
    }
);

/// A newsletter subscriber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: AutoPk<i64>,
    pub email: String,
    pub created_at: NaiveDateTime,
}
model!(Subscriber, SubscriberFields, table = "subscribers", auto_pk = true,
    pk id: AutoPk<i64> => BigInt as i64,
    {
        email: String => Text,
        created_at: NaiveDateTime => Timestamp,
    }
);

/// Primary key of the only [`SiteSettings`] row.
pub const SETTINGS_ID: i64 = 1;

/// Site-wide settings. There is exactly one row, with id [`SETTINGS_ID`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub id: i64,
    pub site_name: String,
    pub site_description: String,
    /// When on, the public site answers with a maintenance notice.
    pub maintenance_mode: bool,
    /// When off, readers cannot add comments.
    pub public_comments: bool,
    pub email_notifications: bool,
    pub facebook_url: String,
    pub twitter_url: String,
    pub instagram_url: String,
    pub updated_at: Option<NaiveDateTime>,
}
model!(SiteSettings, SiteSettingsFields, table = "site_settings", auto_pk = false,
    pk id: i64 => BigInt as i64,
    {
        site_name: String => Text,
        site_description: String => Text,
        maintenance_mode: bool => Bool,
        public_comments: bool => Bool,
        email_notifications: bool => Bool,
        facebook_url: String => Text,
        twitter_url: String => Text,
        instagram_url: String => Text,
        updated_at: Option<NaiveDateTime> => Timestamp,
    }
);

impl Default for SiteSettings {
    fn default() -> Self {
        SiteSettings {
            id: SETTINGS_ID,
            site_name: "Capital News".to_string(),
            site_description: "Reporting on the issues that matter in the Great Lakes Region."
                .to_string(),
            maintenance_mode: false,
            public_comments: true,
            email_notifications: true,
            facebook_url: "https://facebook.com/capitalnews".to_string(),
            twitter_url: "https://twitter.com/capitalnews".to_string(),
            instagram_url: "https://instagram.com/capitalnews".to_string(),
            updated_at: None,
        }
    }
}

/// A registered user. Administrators can use the editorial dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: AutoPk<i64>,
    pub email: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
}
model!(Profile, ProfileFields, table = "profiles", auto_pk = true,
    pk id: AutoPk<i64> => BigInt as i64,
    {
        email: String => Text,
        full_name: Option<String> => Text,
        username: Option<String> => Text,
        avatar_url: Option<String> => Text,
        password_hash: String => Text,
        is_admin: bool => Bool,
        created_at: NaiveDateTime => Timestamp,
    }
);

impl Profile {
    /// Name shown next to the user's comments.
    pub fn display_name(&self) -> String {
        [&self.full_name, &self.username]
            .into_iter()
            .flatten()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .unwrap_or("Anonymous")
            .to_string()
    }
}

/// A signed-in session, identified by an opaque bearer token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub profile_id: i64,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
model!(Session, SessionFields, table = "sessions", auto_pk = false,
    pk token: String => Text as String,
    {
        profile_id: i64 => BigInt,
        created_at: NaiveDateTime => Timestamp,
        expires_at: NaiveDateTime => Timestamp,
    }
);

impl Session {
    /// Whether the session can no longer be used.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().naive_utc()
    }
}

/// One visitor's like of a post. A visitor can like a post once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostLike {
    pub id: AutoPk<i64>,
    pub post_id: i64,
    pub visitor: String,
    pub created_at: NaiveDateTime,
}
model!(PostLike, PostLikeFields, table = "post_likes", auto_pk = true,
    pk id: AutoPk<i64> => BigInt as i64,
    {
        post_id: i64 => BigInt,
        visitor: String => Text,
        created_at: NaiveDateTime => Timestamp,
    }
);
