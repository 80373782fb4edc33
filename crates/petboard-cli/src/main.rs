//! Petboard command-line client.
//!
//! Drives the forum app over HTTP. Each invocation applies one user intent,
//! waits for every request (and follow-up) to complete, then prints the
//! resulting view.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! petboard list --sort likes
//! petboard list featured --page 2
//! petboard list --tags "dog, training"
//! petboard show 42
//!
//! # Signed in
//! export PETBOARD_TOKEN=... PETBOARD_USER_ID=7
//! petboard like 42
//! petboard comment 42 "Try a lick mat" --reply-to 311
//! petboard create --title "Crate training" --content "<p>Tips?</p>" --tags dog
//! ```

mod render;

use std::io::{self, Write};

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use petboard_app::{AppAction, ForumApp, Runtime};
use petboard_client::{ClientConfig, TransportError, http::HttpTransport};
use petboard_core::{CommentDraft, ForumDraft, SharedIdentity, Viewer};
use petboard_proto::{CommentId, ForumId, ListKind, SortBy, SortDir, UserId};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Petboard forum client
#[derive(Parser, Debug)]
#[command(name = "petboard")]
#[command(about = "Browse and post to the petboard community forum")]
#[command(version)]
struct Args {
    /// Backend origin
    #[arg(long, env = "PETBOARD_BASE_URL", default_value = petboard_client::DEFAULT_BASE_URL)]
    base_url: String,

    /// Bearer token of the signed-in user
    #[arg(long, env = "PETBOARD_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// User ID the token belongs to
    #[arg(long, env = "PETBOARD_USER_ID")]
    user_id: Option<UserId>,

    /// Posts per list page
    #[arg(long, default_value = "10")]
    page_size: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a page of a forum list
    List(ListArgs),
    /// Show a forum post with a page of its comments
    Show {
        /// Forum post ID
        forum_id: ForumId,
        /// 1-based comment page
        #[arg(long, default_value = "1")]
        comments_page: u32,
    },
    /// Like or unlike a forum post
    Like {
        /// Forum post ID
        forum_id: ForumId,
    },
    /// Comment on a forum post
    Comment {
        /// Forum post ID
        forum_id: ForumId,
        /// Comment text
        text: String,
        /// Reply to this comment instead of posting at the top level
        #[arg(long)]
        reply_to: Option<CommentId>,
    },
    /// Edit one of your comments
    EditComment {
        /// Forum post ID
        forum_id: ForumId,
        /// Comment ID
        comment_id: CommentId,
        /// New comment text
        text: String,
    },
    /// Delete a comment and its replies
    DeleteComment {
        /// Forum post ID
        forum_id: ForumId,
        /// Comment ID
        comment_id: CommentId,
    },
    /// Publish a new forum post
    Create(PostArgs),
    /// Replace one of your forum posts
    Update {
        /// Forum post ID
        forum_id: ForumId,
        #[command(flatten)]
        post: PostArgs,
    },
    /// Delete one of your forum posts
    Delete {
        /// Forum post ID
        forum_id: ForumId,
    },
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Which list to show
    #[arg(value_enum, default_value = "all")]
    list: ListArg,

    /// 1-based page number
    #[arg(long, default_value = "1")]
    page: u32,

    /// Sort key
    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,

    /// Free-text search over titles and content
    #[arg(long, conflicts_with = "tags")]
    search: Option<String>,

    /// Comma-separated tags to match
    #[arg(long)]
    tags: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct PostArgs {
    /// Post title
    #[arg(long)]
    title: String,

    /// Post body (HTML)
    #[arg(long)]
    content: String,

    /// Comma-separated tags
    #[arg(long, default_value = "")]
    tags: String,
}

impl PostArgs {
    fn draft(&self) -> ForumDraft {
        ForumDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ListArg {
    All,
    Mine,
    Featured,
}

impl From<ListArg> for ListKind {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::All => ListKind::All,
            ListArg::Mine => ListKind::Mine,
            ListArg::Featured => ListKind::Featured,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Created,
    Likes,
    Comments,
}

impl From<SortArg> for SortBy {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Created => SortBy::CreatedAt,
            SortArg::Likes => SortBy::LikesCount,
            SortArg::Comments => SortBy::CommentsCount,
        }
    }
}

/// CLI failures.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// The HTTP client could not be built.
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),

    /// Writing output failed.
    #[error("output failed: {0}")]
    Output(#[from] io::Error),

    /// `--token` and `--user-id` must be given together.
    #[error("--token and --user-id must be given together")]
    PartialIdentity,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    run(args).await?;
    Ok(())
}

async fn run(args: Args) -> Result<(), CliError> {
    let viewer = match (args.token, args.user_id) {
        (Some(token), Some(user_id)) => Some(Viewer::new(user_id, token)),
        (None, None) => None,
        _ => return Err(CliError::PartialIdentity),
    };
    let identity = match viewer.clone() {
        Some(viewer) => SharedIdentity::signed_in(viewer),
        None => SharedIdentity::anonymous(),
    };

    let config = ClientConfig { page_size: args.page_size, ..ClientConfig::new(args.base_url) };
    tracing::debug!(base_url = %config.base_url, signed_in = viewer.is_some(), "starting");

    let transport = HttpTransport::new(config.clone(), identity)?;
    let app = ForumApp::new(viewer.map(|v| v.user_id), &config);
    let mut session = Session { runtime: Runtime::new(app, transport) };

    let screen = session.execute(args.command).await;
    let mut out = io::stdout().lock();
    session.print(&mut out, &screen)?;
    out.flush()?;
    Ok(())
}

/// What to print once a command has settled.
enum Screen {
    List(ListKind),
    Detail,
    Status,
}

struct Session {
    runtime: Runtime<HttpTransport>,
}

impl Session {
    /// Apply `intent` and wait for everything it started to finish.
    async fn apply(&mut self, intent: impl FnOnce(&mut ForumApp) -> Vec<AppAction>) {
        self.runtime.apply(intent);
        self.runtime.settle().await;
    }

    async fn execute(&mut self, command: Command) -> Screen {
        match command {
            Command::List(list) => {
                let kind = list.list.into();
                self.list(kind, &list).await;
                Screen::List(kind)
            },
            Command::Show { forum_id, comments_page } => {
                self.apply(|app| app.open_forum(forum_id)).await;
                if comments_page > 1 {
                    self.apply(|app| app.load_comments(comments_page - 1)).await;
                }
                Screen::Detail
            },
            Command::Like { forum_id } => {
                self.apply(|app| app.open_forum(forum_id)).await;
                self.apply(ForumApp::toggle_like).await;
                Screen::Detail
            },
            Command::Comment { forum_id, text, reply_to } => {
                let draft = match reply_to {
                    Some(parent_id) => CommentDraft::reply(parent_id, text),
                    None => CommentDraft::new(text),
                };
                self.apply(|app| app.open_forum(forum_id)).await;
                self.apply(|app| app.add_comment(&draft)).await;
                Screen::Detail
            },
            Command::EditComment { forum_id, comment_id, text } => {
                self.apply(|app| app.open_forum(forum_id)).await;
                self.apply(|app| app.update_comment(comment_id, &text)).await;
                Screen::Detail
            },
            Command::DeleteComment { forum_id, comment_id } => {
                self.apply(|app| app.open_forum(forum_id)).await;
                self.apply(|app| app.delete_comment(comment_id)).await;
                Screen::Detail
            },
            Command::Create(post) => {
                self.apply(|app| app.create_forum(&post.draft())).await;
                Screen::Status
            },
            Command::Update { forum_id, post } => {
                self.apply(|app| app.open_forum(forum_id)).await;
                self.apply(|app| app.update_forum(forum_id, &post.draft())).await;
                Screen::Detail
            },
            Command::Delete { forum_id } => {
                self.apply(|app| app.open_forum(forum_id)).await;
                self.apply(|app| app.delete_forum(forum_id)).await;
                Screen::Status
            },
        }
    }

    /// Load the first page with the requested filter, then move to the
    /// requested page once the page count is known.
    async fn list(&mut self, kind: ListKind, args: &ListArgs) {
        if let Some(sort) = args.sort {
            let dir = if args.asc { SortDir::Asc } else { SortDir::Desc };
            self.apply(|app| app.set_sort(kind, sort.into(), dir)).await;
        }
        match (&args.search, &args.tags) {
            (Some(term), _) => self.apply(|app| app.set_search_term(kind, term)).await,
            (None, Some(tags)) => self.apply(|app| app.set_tag_search_term(kind, tags)).await,
            (None, None) if args.sort.is_none() => self.apply(|app| app.load_list(kind)).await,
            (None, None) => {},
        }
        if args.page > 1 {
            self.apply(|app| app.set_page(kind, args.page - 1)).await;
        }
    }

    fn print(&self, out: &mut impl Write, screen: &Screen) -> io::Result<()> {
        let app = self.runtime.app();
        match screen {
            Screen::List(kind) => {
                if let Some(view) = app.list(*kind) {
                    render::list(out, view)?;
                }
            },
            Screen::Detail => render::detail(out, app.detail())?,
            Screen::Status => {},
        }
        render::status(out, app.status_message())
    }
}
