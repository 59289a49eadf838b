//! CLI entry point for blog-ng

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_ng::{commands, server, Blog};

#[derive(Parser)]
#[command(name = "blog-ng")]
#[command(author = "Yukang Chen")]
#[command(version)]
#[command(about = "A small personal blog with an RSS feed and an admin API", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,

        /// Username of the first author
        #[arg(short, long, default_value = "admin")]
        author: String,

        /// Password for the first author
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create a new post source file
    New {
        /// Title of the new post
        title: String,

        /// Slug (defaults to the slugified title)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Import posts from source/_posts into the store
    Import,

    /// List blog content
    List {
        /// Type of content to list (post, page, tag, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Print the RSS feed
    Feed {
        /// Number of posts (capped by feed.limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Print an argon2 hash for an author's password_hash
    HashPassword {
        password: String,
    },

    /// Start the blog server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "blog_ng=debug,tower_http=debug,info"
    } else {
        "blog_ng=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };

    match cli.command {
        Commands::Init {
            folder,
            author,
            password,
        } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            let hash = password
                .as_deref()
                .map(server::auth::hash_password)
                .transpose()?;
            tracing::info!("Initializing blog in {:?}", target_dir);
            commands::init::init_site(&target_dir, &author, hash.as_deref())?;
            println!("Initialized empty blog in {:?}", target_dir);
        }

        Commands::New { title, slug } => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Creating new post: {}", title);
            commands::new::run(&blog, &title, slug.as_deref())?;
        }

        Commands::Import => {
            let blog = Blog::new(&base_dir)?;
            commands::import::run(&blog)?;
        }

        Commands::List { r#type } => {
            let blog = Blog::new(&base_dir)?;
            commands::list::run(&blog, &r#type)?;
        }

        Commands::Feed { limit } => {
            let blog = Blog::new(&base_dir)?;
            commands::feed::run(&blog, limit)?;
        }

        Commands::HashPassword { password } => {
            println!("{}", server::auth::hash_password(&password)?);
        }

        Commands::Server { port, ip } => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(&blog, &ip, port).await?;
        }

        Commands::Version => {
            println!("blog-ng version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
