use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flashlearn", version, about = "Flashcard study tool", long_about = None)]
pub struct Cli {
    /// Directory holding the study database and logs.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Skip file logging.
    #[arg(long, global = true)]
    pub no_log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage collections.
    #[command(subcommand)]
    Collection(CollectionCommand),
    /// Manage cards.
    #[command(subcommand)]
    Card(CardCommand),
    /// List cards due for review.
    Due(DueArgs),
    /// Record a review outcome (known|later|hard) for one card.
    Review(ReviewArgs),
    /// Show daily and lifetime statistics.
    Stats,
    /// Write a JSON backup of all collections and cards.
    Export(ExportArgs),
    /// Replace all collections and cards with a JSON backup.
    Import(ImportArgs),
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommand {
    /// Create a collection.
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List collections.
    List,
    /// Change a collection's name or description.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a collection and all of its cards.
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Add a card to a collection.
    Add {
        collection_id: String,
        front: String,
        back: String,
    },
    /// List cards of one collection.
    List { collection_id: String },
    /// Change a card's front or back text.
    Edit {
        id: String,
        #[arg(long)]
        front: Option<String>,
        #[arg(long)]
        back: Option<String>,
    },
    /// Delete a card.
    Delete { id: String },
}

#[derive(Args, Debug, Clone)]
pub struct DueArgs {
    /// Restrict to one collection.
    #[arg(long)]
    pub collection: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    pub card_id: String,
    pub outcome: String,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Output file; defaults to `flashlearn-backup-<date>.json` in the
    /// current directory. Use `-` for stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Backup file to read.
    pub file: PathBuf,
}
