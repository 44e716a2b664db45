//! ShelfScan CLI - scan book covers and manage the local catalog

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use shelfscan_core::BookStatus;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reading status as accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    ToRead,
    Reading,
    Finished,
}

impl From<StatusArg> for BookStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::ToRead => BookStatus::ToRead,
            StatusArg::Reading => BookStatus::Reading,
            StatusArg::Finished => BookStatus::Finished,
        }
    }
}

#[derive(Parser)]
#[command(name = "shelfscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a cover image and add the book to the catalog
    Scan {
        /// Cover image file (jpeg/png/webp)
        image: String,

        /// Override the detected title
        #[arg(long)]
        title: Option<String>,

        /// Override the detected author
        #[arg(long)]
        author: Option<String>,

        /// Override the detected genre
        #[arg(long)]
        genre: Option<String>,

        /// Initial reading status
        #[arg(long, value_enum, default_value = "to-read")]
        status: StatusArg,

        /// Analyze and print the result without adding it
        #[arg(long)]
        dry_run: bool,
    },

    /// Add a book by hand, without scanning
    Add {
        title: String,

        /// Author name
        #[arg(short, long, default_value = "")]
        author: String,

        /// Genre label (defaults to the catalog's default genre)
        #[arg(short, long)]
        genre: Option<String>,

        /// Initial reading status
        #[arg(long, value_enum, default_value = "to-read")]
        status: StatusArg,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List catalog entries
    List {
        /// Filter by reading status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Case-insensitive search over title, author and genre
        #[arg(short, long)]
        search: Option<String>,

        /// Only favorites
        #[arg(long)]
        favorites: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one catalog entry
    Show {
        /// Record id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Write the stored cover image to this file
        #[arg(long)]
        cover_out: Option<String>,
    },

    /// Update status, progress, notes or the favorite flag
    Update {
        /// Record id
        id: String,

        /// New reading status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Current page
        #[arg(long)]
        current_page: Option<u32>,

        /// Total pages
        #[arg(long)]
        total_pages: Option<u32>,

        /// Replace the notes
        #[arg(long)]
        notes: Option<String>,

        /// Set or clear the favorite flag
        #[arg(long)]
        favorite: Option<bool>,
    },

    /// Delete a catalog entry
    Delete {
        /// Record id
        id: String,
    },

    /// Catalog statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the whole catalog as CSV
    Export {
        /// Output file path
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "shelfscan_cli=debug,shelfscan_core=debug"
    } else {
        "shelfscan_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Scan {
            image,
            title,
            author,
            genre,
            status,
            dry_run,
        } => {
            commands::scan(
                &image,
                commands::ScanOverrides {
                    title,
                    author,
                    genre,
                    status: status.into(),
                },
                dry_run,
            )
            .await
        }

        Commands::Add {
            title,
            author,
            genre,
            status,
            notes,
        } => commands::add(title, author, genre, status.into(), notes).await,

        Commands::List {
            status,
            search,
            favorites,
            json,
        } => commands::list(status.map(Into::into), search.as_deref(), favorites, json).await,

        Commands::Show { id, json, cover_out } => {
            commands::show(&id, json, cover_out.as_deref()).await
        }

        Commands::Update {
            id,
            status,
            current_page,
            total_pages,
            notes,
            favorite,
        } => {
            commands::update(
                &id,
                status.map(Into::into),
                current_page,
                total_pages,
                notes,
                favorite,
            )
            .await
        }

        Commands::Delete { id } => commands::delete(&id).await,

        Commands::Stats { json } => commands::stats(json).await,

        Commands::Export { output } => commands::export(&output).await,
    }
}
