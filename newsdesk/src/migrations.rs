//! Embedded schema migrations for the newsdesk tables.

pub use newsdesk_core::migrations::{Migration, Migrations};

const INIT_UP: &str = r#"
CREATE TABLE profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT,
    username TEXT,
    avatar_url TEXT,
    password_hash TEXT NOT NULL,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE TABLE sessions (
    token TEXT NOT NULL PRIMARY KEY,
    profile_id INTEGER NOT NULL REFERENCES profiles (id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
CREATE TABLE posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    subtitle TEXT,
    slug TEXT NOT NULL,
    category TEXT NOT NULL,
    summary TEXT NOT NULL,
    content TEXT NOT NULL,
    image_url TEXT,
    image_caption TEXT,
    is_published INTEGER NOT NULL DEFAULT 0,
    author_id INTEGER REFERENCES profiles (id) ON DELETE SET NULL,
    likes INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    deleted_at TEXT
);
CREATE INDEX posts_public_idx ON posts (is_published, deleted_at, created_at);
CREATE INDEX posts_slug_idx ON posts (category, slug);
CREATE TABLE comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
    profile_id INTEGER REFERENCES profiles (id) ON DELETE SET NULL,
    author TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX comments_post_idx ON comments (post_id, created_at);
CREATE TABLE subscribers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);
CREATE TABLE site_settings (
    id INTEGER NOT NULL PRIMARY KEY CHECK (id = 1),
    site_name TEXT NOT NULL,
    site_description TEXT NOT NULL,
    maintenance_mode INTEGER NOT NULL DEFAULT 0,
    public_comments INTEGER NOT NULL DEFAULT 1,
    email_notifications INTEGER NOT NULL DEFAULT 1,
    facebook_url TEXT NOT NULL,
    twitter_url TEXT NOT NULL,
    instagram_url TEXT NOT NULL,
    updated_at TEXT
);
INSERT INTO site_settings (
    id, site_name, site_description, maintenance_mode, public_comments,
    email_notifications, facebook_url, twitter_url, instagram_url
) VALUES (
    1, 'Capital News', 'Reporting on the issues that matter in the Great Lakes Region.', 0, 1,
    1, 'https://facebook.com/capitalnews', 'https://twitter.com/capitalnews',
    'https://instagram.com/capitalnews'
);
"#;

const INIT_DOWN: &str = r#"
DROP TABLE site_settings;
DROP TABLE subscribers;
DROP TABLE comments;
DROP TABLE posts;
DROP TABLE sessions;
DROP TABLE profiles;
"#;

const LIKES_UP: &str = r#"
CREATE TABLE post_likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
    visitor TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (post_id, visitor)
);
"#;

const LIKES_DOWN: &str = "DROP TABLE post_likes;";

/// Name of the first migration, which creates the core tables.
pub const INIT: &str = "20250112_093000_init";
/// Name of the migration adding per-visitor like tracking.
pub const POST_LIKES: &str = "20250203_141500_post_likes";

/// All newsdesk migrations, oldest first.
pub fn get_migrations() -> Migrations {
    Migrations::new(vec![
        Migration::new(INIT).with_sql("sqlite", INIT_UP, INIT_DOWN),
        Migration::new(POST_LIKES).with_sql("sqlite", LIKES_UP, LIKES_DOWN),
    ])
}
