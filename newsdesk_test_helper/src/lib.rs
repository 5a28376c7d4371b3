//! Test helpers to set up migrated databases and fill them with
//! articles, accounts and sessions.
#![deny(missing_docs)]

use std::path::Path;

use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::Fake;
use newsdesk::db::{connect, BackendConnection, Connection, ConnectionSpec};
use newsdesk::editorial::{self, PostDraft};
use newsdesk::models::{Post, Profile, Session};
use newsdesk::{auth, migrations};

/// Password given to every account made by this crate.
pub const PASSWORD: &str = "correct-horse-battery";

/// Initialise logging for a test. Safe to call more than once.
pub fn setup_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Populate the database schema.
pub fn setup_db(conn: &mut impl BackendConnection) {
    let applied = migrations::get_migrations().migrate(conn).unwrap();
    log::info!("applied migrations {applied:?}");
}

/// Create a migrated in-memory sqlite [`Connection`].
pub fn sqlite_connection() -> Connection {
    setup_logging();
    let mut conn = connect(&sqlite_connspec()).unwrap();
    setup_db(&mut conn);
    conn
}

/// Create a sqlite [`ConnectionSpec`] for an in-memory database.
pub fn sqlite_connspec() -> ConnectionSpec {
    ConnectionSpec::new("sqlite", ":memory:")
}

/// Create a migrated sqlite database file at `path` and return its
/// [`ConnectionSpec`]. Unlike an in-memory database it can be shared
/// by a pool of connections.
pub fn sqlite_file(path: &Path) -> ConnectionSpec {
    setup_logging();
    let spec = ConnectionSpec::new("sqlite", path.to_string_lossy());
    let mut conn = connect(&spec).unwrap();
    setup_db(&mut conn);
    spec
}

/// A draft with `title` in `category` and generated summary and body.
pub fn draft(title: &str, category: &str) -> PostDraft {
    let summary: String = Sentence(6..12).fake();
    let content: String = Paragraph(3..6).fake();
    PostDraft::new(title, category, &summary, &content)
}

/// Create and publish a post.
pub fn publish_post(conn: &Connection, title: &str, category: &str) -> Post {
    editorial::create_post(conn, None, &draft(title, category).published()).unwrap()
}

/// Create an unpublished post.
pub fn draft_post(conn: &Connection, title: &str, category: &str) -> Post {
    editorial::create_post(conn, None, &draft(title, category)).unwrap()
}

/// Register a reader with [`PASSWORD`].
pub fn reader(conn: &Connection, email: &str) -> Profile {
    auth::sign_up(conn, email, PASSWORD, None).unwrap()
}

/// Register an administrator with [`PASSWORD`] and sign them in.
pub fn admin_session(conn: &Connection, email: &str) -> Session {
    auth::create_admin(conn, email, PASSWORD, Some("Desk Editor")).unwrap();
    auth::sign_in(conn, email, PASSWORD, chrono::Duration::hours(1)).unwrap()
}

/// The id of a saved post.
pub fn post_id(post: &Post) -> i64 {
    post.id.saved().unwrap()
}
