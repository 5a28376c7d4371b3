#![doc(hidden)]
//! This library is not stable, and usage is strongly discouraged.
//!
//! It holds the commands behind the `newsdesk` binary so they can be
//! exercised from tests.
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use newsdesk::config::{NewsdeskConfig, CONFIG_DIR};
use newsdesk::db::{self, Connection};
use newsdesk::editorial::{self, PostDraft, StatusFilter};
use newsdesk::engagement::{self, CommentAuthor};
use newsdesk::models::Post;
use newsdesk::settings::{self, SettingFlag};
use newsdesk::{auth, frontpage, migrations, storage, subscribers};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub fn base_dir() -> Result<PathBuf> {
    std::env::current_dir()
        .map(|d| d.join(CONFIG_DIR))
        .map_err(|e| e.into())
}

/// The configuration in `.newsdesk/`, with environment overrides applied.
pub fn load_config() -> Result<NewsdeskConfig> {
    let mut config = NewsdeskConfig::load_or_default(base_dir()?)?;
    config.apply_env()?;
    Ok(config)
}

pub fn connect() -> Result<Connection> {
    let config = load_config()?;
    debug!(
        "connecting to {} database {}",
        config.database.backend_name, config.database.conn_str
    );
    Ok(db::connect(&config.database)?)
}

pub fn init(name: &str, connstr: &str) -> Result<()> {
    if db::get_backend(name).is_none() {
        eprintln!("Unknown backend {name}");
        std::process::exit(1);
    };

    let spec = db::ConnectionSpec::new(name, connstr);
    db::connect(&spec)?; // ensure we can
    let dir = base_dir()?;
    fs::create_dir_all(&dir)?;
    let mut config = NewsdeskConfig::load_or_default(&dir)?;
    config.database = spec;
    config.save(&dir)?;
    println!("Wrote {}", dir.join("config.json").display());
    Ok(())
}

pub fn migrate() -> Result<()> {
    let mut conn = connect()?;
    let ms = migrations::get_migrations();
    let to_apply = ms.unapplied_migrations(&conn)?.len();
    println!("{to_apply} migrations to apply");
    for name in ms.migrate(&mut conn)? {
        println!("Applied migration {name}");
    }
    Ok(())
}

pub fn rollback(to: Option<&str>) -> Result<()> {
    let mut conn = connect()?;
    let ms = migrations::get_migrations();
    match to {
        Some(to) => {
            if ms.get_migration(to).is_none() {
                eprintln!("No such migration!");
                std::process::exit(1);
            }
            let rolled_back = ms.rollback_to(&mut conn, to)?;
            if rolled_back.is_empty() {
                eprintln!("That is the latest migration, not rolling back to anything. If you expected something to happen, try specifying the migration to rollback to.");
            }
            for name in rolled_back {
                println!("Rolled back migration {name}");
            }
        }
        None => match ms.rollback_latest(&mut conn)? {
            Some(name) => println!("Rolled back migration {name}"),
            None => {
                eprintln!("No migrations applied!");
                std::process::exit(1)
            }
        },
    }
    Ok(())
}

pub fn list_migrations() -> Result<()> {
    let conn = connect()?;
    let ms = migrations::get_migrations();
    let unapplied = ms.unapplied_migrations(&conn)?;
    for m in ms.all_migrations() {
        let m_state = match unapplied.contains(&m) {
            true => "not applied",
            false => "applied",
        };
        println!("Migration '{}' ({})", m.name(), m_state);
    }
    Ok(())
}

pub fn add_user(email: &str, password: &str, name: Option<&str>, admin: bool) -> Result<()> {
    let conn = connect()?;
    let profile = if admin {
        auth::create_admin(&conn, email, password, name)?
    } else {
        auth::sign_up(&conn, email, password, name)?
    };
    println!(
        "Created {} {} ({})",
        if admin { "administrator" } else { "user" },
        profile.email,
        profile.id
    );
    Ok(())
}

/// Post fields given on the command line. Unset fields keep their
/// current value when editing.
#[derive(Debug, Default)]
pub struct PostArgs {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub content_file: Option<PathBuf>,
    pub image_url: Option<String>,
    pub image_caption: Option<String>,
}

impl PostArgs {
    fn apply(self, draft: &mut PostDraft) -> Result<()> {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(summary) = self.summary {
            draft.summary = summary;
        }
        if let Some(path) = self.content_file {
            draft.content = fs::read_to_string(path)?;
        } else if let Some(content) = self.content {
            draft.content = content;
        }
        for (slot, value) in [
            (&mut draft.subtitle, self.subtitle),
            (&mut draft.slug, self.slug),
            (&mut draft.image_url, self.image_url),
            (&mut draft.image_caption, self.image_caption),
        ] {
            if value.is_some() {
                *slot = value;
            }
        }
        Ok(())
    }
}

fn print_post_line(post: &Post) {
    let state = if post.is_trashed() {
        "trashed"
    } else if post.is_published {
        "published"
    } else {
        "draft"
    };
    println!(
        "{:>5}  {:<9}  {:<12}  {}  ({} likes)",
        post.id.unwrap_or_default(),
        state,
        post.category,
        post.title,
        post.likes
    );
}

fn print_post(post: &Post) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(post)?);
    Ok(())
}

pub fn create_post(args: PostArgs, publish: bool) -> Result<()> {
    let conn = connect()?;
    let mut draft = PostDraft::default();
    args.apply(&mut draft)?;
    draft.is_published = publish;
    let post = editorial::create_post(&conn, None, &draft)?;
    println!("Created post {} at {}", post.id, post.path());
    Ok(())
}

pub fn edit_post(id: i64, args: PostArgs) -> Result<()> {
    let conn = connect()?;
    let mut draft = PostDraft::from_post(&editorial::get_post(&conn, id)?);
    args.apply(&mut draft)?;
    let post = editorial::update_post(&conn, id, &draft)?;
    println!("Updated post {} at {}", post.id, post.path());
    Ok(())
}

pub fn show_post(id: i64) -> Result<()> {
    let conn = connect()?;
    print_post(&editorial::get_post(&conn, id)?)
}

pub fn list_posts(status: StatusFilter) -> Result<()> {
    let conn = connect()?;
    let posts = editorial::list_posts(&conn, status)?;
    if posts.is_empty() {
        println!("No {status} posts");
    }
    posts.iter().for_each(print_post_line);
    Ok(())
}

pub fn set_published(id: i64, published: bool) -> Result<()> {
    let conn = connect()?;
    let post = editorial::set_published(&conn, id, published)?;
    println!(
        "Post {} is {}",
        post.id,
        if post.is_published { "published" } else { "a draft" }
    );
    Ok(())
}

pub fn trash_post(id: i64) -> Result<()> {
    let conn = connect()?;
    editorial::trash_post(&conn, id)?;
    println!("Moved post {id} to the trash");
    Ok(())
}

pub fn restore_post(id: i64) -> Result<()> {
    let conn = connect()?;
    editorial::restore_post(&conn, id)?;
    println!("Restored post {id}");
    Ok(())
}

pub fn destroy_post(id: i64) -> Result<()> {
    let conn = connect()?;
    editorial::destroy_post(&conn, id)?;
    println!("Permanently deleted post {id}");
    Ok(())
}

pub fn list_trash() -> Result<()> {
    let conn = connect()?;
    let posts = editorial::list_trash(&conn)?;
    if posts.is_empty() {
        println!("The trash is empty");
    }
    posts.iter().for_each(print_post_line);
    Ok(())
}

pub fn stats() -> Result<()> {
    let conn = connect()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&editorial::dashboard_stats(&conn)?)?
    );
    Ok(())
}

pub fn search(q: &str) -> Result<()> {
    let conn = connect()?;
    let posts = frontpage::search(&conn, q)?;
    println!("{} results", posts.len());
    for post in posts {
        println!(
            "{:>5}  {}  {}",
            post.id.unwrap_or_default(),
            post.path(),
            post.title
        );
    }
    Ok(())
}

pub fn add_comment(post_id: i64, content: &str, author: Option<String>) -> Result<()> {
    let conn = connect()?;
    let comment = engagement::add_comment(&conn, post_id, &CommentAuthor::Guest(author), content)?;
    println!("Added comment {} by {}", comment.id, comment.author);
    Ok(())
}

pub fn list_comments(post_id: i64) -> Result<()> {
    let conn = connect()?;
    for comment in engagement::list_comments(&conn, post_id)? {
        println!(
            "[{}] {} ({}): {}",
            comment.id,
            comment.author,
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.content
        );
    }
    Ok(())
}

pub fn like(post_id: i64, visitor: &str) -> Result<()> {
    let mut conn = connect()?;
    let likes = engagement::like_article(&mut conn, post_id, visitor)?;
    println!("Post {post_id} has {likes} likes");
    Ok(())
}

pub fn subscribe(email: &str) -> Result<()> {
    let conn = connect()?;
    let subscriber = subscribers::subscribe(&conn, email)?;
    println!("Subscribed {}", subscriber.email);
    Ok(())
}

pub fn list_subscribers() -> Result<()> {
    let conn = connect()?;
    for subscriber in subscribers::list_subscribers(&conn)? {
        println!(
            "{}  {}",
            subscriber.created_at.format("%Y-%m-%d"),
            subscriber.email
        );
    }
    Ok(())
}

pub fn show_settings() -> Result<()> {
    let conn = connect()?;
    let current = settings::load_settings(&conn)?;
    println!("{}", serde_json::to_string_pretty(&current)?);
    Ok(())
}

pub fn toggle_setting(flag: SettingFlag) -> Result<()> {
    let conn = connect()?;
    let enabled = settings::toggle(&conn, flag)?;
    println!("{flag} is {}", if enabled { "on" } else { "off" });
    Ok(())
}

pub fn set_setting(flag: SettingFlag, value: bool) -> Result<()> {
    let conn = connect()?;
    let enabled = settings::set_flag(&conn, flag, Some(value))?;
    println!("{flag} is {}", if enabled { "on" } else { "off" });
    Ok(())
}

pub fn upload(path: &Path) -> Result<()> {
    let config = load_config()?;
    let bytes = fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stored = storage::upload_image(
        &config.bucket(),
        &name,
        &bytes,
        config.storage.max_upload_bytes,
    )?;
    println!("{}", stored.url);
    Ok(())
}

pub fn serve(listen: Option<String>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(listen) = listen {
        config.listen = listen;
    }
    let mut conn = db::connect(&config.database)?;
    let applied = migrations::get_migrations().migrate(&mut conn)?;
    for name in applied {
        info!("Applied migration {name}");
    }
    drop(conn);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(newsdesk_server::serve(&config))?;
    Ok(())
}

pub fn handle_error(r: Result<()>) {
    if let Err(e) = r {
        eprintln!("Encountered unexpected error: {e}");
        std::process::exit(1);
    }
}
