use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use bookmark_page_merge::categories::CategoryMap;
use bookmark_page_merge::merge::{self, DedupStrategy, MergeOptions};
use bookmark_page_merge::videos::{self, FetchOptions};
use bookmark_page_merge::{parse_export, progress, render};

#[derive(Parser)]
#[command(name = "bookmark-page-merge")]
#[command(about = "Merge browser bookmark exports into a static bookmark page", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge a NETSCAPE bookmark export into the bookmark page
    Merge {
        /// Bookmark export (bookmark.html)
        #[arg(short, long, default_value = "bookmark.html")]
        source: PathBuf,

        /// Page to update in place
        #[arg(short, long, default_value = "bookmarks.html")]
        target: PathBuf,

        /// Category config (JSON) extending the built-in mapping
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Duplicate detection: per-item or first-url
        #[arg(long, value_enum, default_value_t = DedupStrategy::PerItem)]
        dedup: DedupStrategy,

        /// Category whose nav link new links are placed after
        #[arg(long, default_value = "tools")]
        nav_anchor: String,

        /// Dry run - show what would be merged without writing
        #[arg(short, long)]
        dry_run: bool,

        /// Skip the backup copy of the target page
        #[arg(long)]
        no_backup: bool,
    },

    /// Print the parsed export as card grids, one per category
    Preview {
        /// Bookmark export (bookmark.html)
        #[arg(short, long, default_value = "bookmark.html")]
        source: PathBuf,

        /// Category config (JSON) extending the built-in mapping
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Fetch a creator's video list and print the defaultVideos array
    FetchVideos {
        /// Account id
        #[arg(short, long, default_value = videos::DEFAULT_MID)]
        mid: String,

        /// Videos per page
        #[arg(long, default_value_t = videos::DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Listing endpoint
        #[arg(long, default_value = videos::DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Print views >= 10000 as "1.2w"
        #[arg(long)]
        compact_views: bool,
    },

    /// List the folder → category mapping in effect
    ListCategories {
        /// Category config (JSON) extending the built-in mapping
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Merge { source, target, config, dedup, nav_anchor, dry_run, no_backup } => {
            info!("📥 Merging {:?} into {:?}", source, target);
            let categories = CategoryMap::load_or_builtin(config.as_deref())?;
            let options = MergeOptions { dedup, nav_anchor };
            let report = merge::merge_files(&source, &target, &categories, options, dry_run, !no_backup)?;
            println!("{}", report);
            info!("✅ Done!");
        }

        Commands::Preview { source, config } => {
            let categories = CategoryMap::load_or_builtin(config.as_deref())?;
            let content = std::fs::read_to_string(&source)
                .with_context(|| format!("Failed to read bookmark export {:?}", source))?;
            let buckets = parse_export(&content, &categories);
            info!("✅ Parsed {} bookmarks in {} categories", buckets.total_bookmarks(), buckets.len());

            for (category, items) in buckets.iter() {
                println!("=== CATEGORY: {} ===", category);
                println!("{}", render::render_preview_grid(category, items));
                println!("=== END CATEGORY ===");
            }
        }

        Commands::FetchVideos { mid, page_size, endpoint, compact_views } => {
            let options = FetchOptions { endpoint, mid, page_size, compact_views };
            let spinner = progress::create_spinner("Fetching video list...");
            spinner.enable_steady_tick(std::time::Duration::from_millis(120));
            match videos::fetch_videos(&options).await {
                Ok(output) => {
                    progress::finish_with_success(&spinner, "Request finished");
                    println!("{}", output);
                }
                Err(e) => {
                    warn!("⚠️  Video request failed: {}", e);
                    progress::finish_with_error(&spinner, &e.to_string());
                    println!("{}", e.output());
                }
            }
        }

        Commands::ListCategories { config } => {
            let categories = CategoryMap::load_or_builtin(config.as_deref())?;
            categories.print_summary();
        }
    }

    Ok(())
}
