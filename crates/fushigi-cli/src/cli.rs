use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use fushigi_core::models::{Context, SourceMode};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fushigi")]
#[command(about = "Practice Japanese grammar and keep a study journal from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to a JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding config and FUSHIGI_API_URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Sync with the backend before running the command
    #[arg(long, global = true)]
    pub sync: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull grammar, journal and sentence data from the backend
    Sync {
        /// Also reload from disk and pick new daily practice sets
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse grammar points
    Grammar {
        #[command(subcommand)]
        command: GrammarCommands,
    },
    /// Read and write journal entries
    Journal {
        #[command(subcommand)]
        command: JournalCommands,
    },
    /// Browse sentences tagged with grammar points
    #[command(alias = "sentence")]
    Sentences {
        #[command(subcommand)]
        command: SentenceCommands,
    },
    /// Show the state of each local collection
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum GrammarCommands {
    /// List grammar points
    List {
        /// Only show points matching this text
        #[arg(short, long)]
        search: Option<String>,
        /// Only show points for this context (spoken, written, business)
        #[arg(long)]
        context: Option<Context>,
        /// Number of points to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one grammar point
    Show {
        /// Grammar point ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's practice set
    Daily {
        /// Which practice set to show
        #[arg(long, value_enum, default_value_t = PracticeMode::Random)]
        mode: PracticeMode,
        /// Pick a new set instead of today's
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum JournalCommands {
    /// List journal entries
    List {
        /// Only show entries whose title or content matches this text
        #[arg(short, long)]
        search: Option<String>,
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Submit a new journal entry
    #[command(alias = "add")]
    Submit {
        /// Entry title
        #[arg(short, long)]
        title: String,
        /// Entry content (read from stdin when omitted)
        content: Vec<String>,
        /// Keep the entry private
        #[arg(long)]
        private: bool,
    },
}

#[derive(Subcommand)]
pub enum SentenceCommands {
    /// List tagged sentences
    List {
        /// Only show sentences from this journal entry
        #[arg(long, value_name = "ID")]
        journal: Option<Uuid>,
        /// Only show sentences tagged with this grammar point
        #[arg(long, value_name = "ID")]
        grammar: Option<Uuid>,
        /// Number of sentences to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PracticeMode {
    Random,
    Srs,
}

impl From<PracticeMode> for SourceMode {
    fn from(mode: PracticeMode) -> Self {
        match mode {
            PracticeMode::Random => Self::Random,
            PracticeMode::Srs => Self::Srs,
        }
    }
}
