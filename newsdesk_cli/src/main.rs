use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use newsdesk::editorial::StatusFilter;
use newsdesk::settings::SettingFlag;
use newsdesk_cli::*;

#[derive(Parser)]
#[command(
    name = "newsdesk",
    version,
    about = "Runs and administers a newsdesk site",
    max_term_width = 100
)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database connection in .newsdesk/config.json.
    Init {
        /// Database backend to use. Only 'sqlite' is supported.
        #[arg(value_name = "BACKEND")]
        backend: String,
        /// Database connection string. Format depends on backend.
        #[arg(value_name = "CONNECTION")]
        connection: String,
    },
    /// Apply all unapplied migrations.
    Migrate,
    /// Undo migrations. Without a name, only the latest one.
    Rollback {
        /// Migration to roll back to. It stays applied.
        name: Option<String>,
    },
    /// List migrations and whether they are applied.
    List,
    /// Manage user accounts.
    #[command(subcommand)]
    User(UserCommand),
    /// Write and manage posts.
    #[command(subcommand)]
    Post(PostCommand),
    /// List posts in the trash.
    Trash,
    /// Show the dashboard counts.
    Stats,
    /// Search published posts by title and summary.
    Search {
        #[arg(value_name = "Q")]
        query: String,
    },
    /// Add or read comments.
    #[command(subcommand)]
    Comment(CommentCommand),
    /// Like a published post.
    Like {
        id: i64,
        /// Key identifying the reader.
        #[arg(long)]
        visitor: String,
    },
    /// Subscribe an email address to the newsletter.
    Subscribe { email: String },
    /// List newsletter subscribers.
    Subscribers,
    /// Show or change site settings.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Upload an image for use in posts and print its URL.
    Upload { file: PathBuf },
    /// Run the HTTP server.
    Serve {
        /// Address to listen on, overriding the configuration.
        #[arg(long)]
        listen: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Register an account.
    Add {
        email: String,
        password: String,
        /// Full name shown with comments.
        #[arg(long)]
        name: Option<String>,
        /// Give the account access to the editorial dashboard.
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Args)]
struct PostFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    subtitle: Option<String>,
    /// Derived from the title when not given.
    #[arg(long)]
    slug: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    summary: Option<String>,
    /// Article body as HTML.
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,
    /// Read the article body from a file.
    #[arg(long, value_name = "FILE")]
    content_file: Option<PathBuf>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    image_caption: Option<String>,
}

impl From<PostFields> for PostArgs {
    fn from(f: PostFields) -> Self {
        PostArgs {
            title: f.title,
            subtitle: f.subtitle,
            slug: f.slug,
            category: f.category,
            summary: f.summary,
            content: f.content,
            content_file: f.content_file,
            image_url: f.image_url,
            image_caption: f.image_caption,
        }
    }
}

#[derive(Subcommand)]
enum PostCommand {
    /// Create a post. It stays a draft unless --publish is given.
    Create {
        #[command(flatten)]
        fields: PostFields,
        #[arg(long)]
        publish: bool,
    },
    /// Change fields of a post.
    Edit {
        id: i64,
        #[command(flatten)]
        fields: PostFields,
    },
    /// Print a post as JSON.
    Show { id: i64 },
    /// List posts not in the trash.
    List {
        /// all, published or draft.
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
    Publish { id: i64 },
    Unpublish { id: i64 },
    /// Move a post to the trash.
    Trash { id: i64 },
    /// Take a post out of the trash.
    Restore { id: i64 },
    /// Permanently delete a post in the trash.
    Destroy { id: i64 },
}

#[derive(Subcommand)]
enum CommentCommand {
    /// Comment on a published post.
    Add {
        id: i64,
        content: String,
        /// Name shown with the comment.
        #[arg(long)]
        author: Option<String>,
    },
    /// List the comments on a post, newest first.
    List { id: i64 },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the site settings as JSON.
    Show,
    /// Flip a setting: maintenance-mode, public-comments or email-notifications.
    Toggle { flag: SettingFlag },
    /// Switch a setting on or off.
    Set {
        flag: SettingFlag,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let result = match cli.command {
        Commands::Init {
            backend,
            connection,
        } => init(&backend, &connection),
        Commands::Migrate => migrate(),
        Commands::Rollback { name } => rollback(name.as_deref()),
        Commands::List => list_migrations(),
        Commands::User(UserCommand::Add {
            email,
            password,
            name,
            admin,
        }) => add_user(&email, &password, name.as_deref(), admin),
        Commands::Post(cmd) => match cmd {
            PostCommand::Create { fields, publish } => create_post(fields.into(), publish),
            PostCommand::Edit { id, fields } => edit_post(id, fields.into()),
            PostCommand::Show { id } => show_post(id),
            PostCommand::List { status } => list_posts(status),
            PostCommand::Publish { id } => set_published(id, true),
            PostCommand::Unpublish { id } => set_published(id, false),
            PostCommand::Trash { id } => trash_post(id),
            PostCommand::Restore { id } => restore_post(id),
            PostCommand::Destroy { id } => destroy_post(id),
        },
        Commands::Trash => list_trash(),
        Commands::Stats => stats(),
        Commands::Search { query } => search(&query),
        Commands::Comment(CommentCommand::Add {
            id,
            content,
            author,
        }) => add_comment(id, &content, author),
        Commands::Comment(CommentCommand::List { id }) => list_comments(id),
        Commands::Like { id, visitor } => like(id, &visitor),
        Commands::Subscribe { email } => subscribe(&email),
        Commands::Subscribers => list_subscribers(),
        Commands::Settings(SettingsCommand::Show) => show_settings(),
        Commands::Settings(SettingsCommand::Toggle { flag }) => toggle_setting(flag),
        Commands::Settings(SettingsCommand::Set { flag, value }) => set_setting(flag, value),
        Commands::Upload { file } => upload(&file),
        Commands::Serve { listen } => serve(listen),
    };
    handle_error(result);
}
