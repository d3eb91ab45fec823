//! CLI entry point for postlist

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postlist::commands::generate::GenerateOutcome;

#[derive(Parser)]
#[command(name = "postlist")]
#[command(version)]
#[command(about = "A paginated blog post listing backed by a headless content source", long_about = None)]
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
    /// Generate the static listing page
    #[command(alias = "g")]
    Generate {
        /// Regenerate even if the last build is still fresh
        #[arg(short, long)]
        force: bool,
    },

    /// Start the listing server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// Browse the listing in the terminal
    #[command(alias = "b")]
    Browse {
        /// Show draft content under this preview ref
        #[arg(long)]
        preview_ref: Option<String>,
    },

    /// Print the first page of posts
    List,

    /// Clean the public folder and cache
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postlist=debug,info"
    } else {
        "postlist=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Generate { force } => {
            let blog = postlist::Blog::new(&base_dir)?;
            tracing::info!("Generating listing...");

            match postlist::commands::generate::run(&blog, force).await? {
                GenerateOutcome::Generated { posts } => {
                    println!("Generated listing with {} posts!", posts)
                }
                GenerateOutcome::Fresh { remaining } => {
                    println!("Listing is up to date ({}s until revalidation)", remaining)
                }
            }
        }

        Commands::Server { port, ip } => {
            let blog = postlist::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            postlist::server::start(&blog, &ip, port).await?;
        }

        Commands::Browse { preview_ref } => {
            let blog = postlist::Blog::new(&base_dir)?;
            postlist::commands::browse::run(&blog, preview_ref).await?;
        }

        Commands::List => {
            let blog = postlist::Blog::new(&base_dir)?;
            postlist::commands::list::run(&blog).await?;
        }

        Commands::Clean => {
            let blog = postlist::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("postlist version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
