//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Daily English: reading backend for professional English learners.
///
/// Manages articles, runs the AI reading-aid pipeline and serves the REST
/// API used by the learner app.
#[derive(Parser, Debug)]
#[command(name = "daily-english")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the database file.
    ///
    /// Defaults to `.daily-english/daily-english.db` in the current
    /// directory.
    #[arg(short, long, env = "DATABASE_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory with prompt template overrides.
    #[arg(long, env = "PROMPT_DIR", global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the database.
    ///
    /// Creates the database file and schema.
    #[command(after_help = r#"Examples:
  daily-english init                     # Initialize in current directory
  daily-english init --force             # Re-initialize (destroys existing data)
  daily-english --db-path ./de.db init   # Initialize with custom path
"#)]
    Init {
        /// Force re-initialization (destroys existing data).
        #[arg(short, long)]
        force: bool,
    },

    /// Start the REST API server.
    ///
    /// Routes are served under `/$API_PREFIX` (default `api`). CORS is
    /// allowed for `$CORS_ORIGIN`. Stops on Ctrl-C.
    #[command(after_help = r#"Examples:
  daily-english serve                          # http://127.0.0.1:3000/api
  daily-english serve --host 0.0.0.0 -p 8080   # Listen on all interfaces
  ZHIPU_API_KEY=... daily-english serve        # With an LLM key for AI routes
"#)]
    Serve {
        /// Host to bind to.
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Port to listen on.
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Article operations (add, list, show, process, validate).
    #[command(subcommand)]
    Article(ArticleCommands),

    /// Prompt template operations.
    #[command(subcommand)]
    Prompts(PromptCommands),
}

/// Article subcommands.
#[derive(Subcommand, Debug)]
pub enum ArticleCommands {
    /// Add an article from a text file.
    ///
    /// Paragraphs are separated by blank lines. The word count is computed
    /// from the text.
    #[command(after_help = r#"Examples:
  daily-english article add triage.txt --title "AI triage" --domain AI --difficulty intermediate
  daily-english article add - --title "Rates" --domain finance --difficulty advanced < rates.txt
"#)]
    Add {
        /// Text file (`-` for stdin).
        file: PathBuf,

        /// Article title. Defaults to the file name without extension.
        #[arg(short, long)]
        title: Option<String>,

        /// Domain: AI, finance, economics, technology, sociology.
        #[arg(long)]
        domain: String,

        /// Difficulty: beginner, intermediate, advanced.
        #[arg(long)]
        difficulty: String,

        /// Source URL.
        #[arg(long)]
        source_url: Option<String>,

        /// Author.
        #[arg(long)]
        author: Option<String>,
    },

    /// List released articles, newest first.
    List {
        /// Filter by domain.
        #[arg(long)]
        domain: Option<String>,

        /// Filter by difficulty.
        #[arg(long)]
        difficulty: Option<String>,

        /// Substring search over title and content.
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of articles.
        #[arg(short, long, default_value = "10")]
        limit: u32,

        /// Articles to skip.
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Show one article.
    Show {
        /// Article ID.
        id: String,
    },

    /// Run the AI pipeline on an article.
    ///
    /// Classifies the article, maps its argument, extracts reasoning
    /// language and writes comprehension questions. Requires an API key
    /// for the configured `LLM_PROVIDER`.
    Process {
        /// Article ID.
        id: String,
    },

    /// Ask the LLM whether an article suits the course.
    Validate {
        /// Article ID.
        id: String,
    },
}

/// Prompt template subcommands.
#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// Write the default prompt templates for editing.
    ///
    /// Existing files are left untouched.
    Init {
        /// Target directory. Defaults to `~/.config/daily-english/prompts/`.
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}
