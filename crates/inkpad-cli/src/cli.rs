use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "inkpad")]
#[command(about = "Rich-text notes that live locally and follow you when you sign in")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the local note mirror
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// CLI profile name for the Supabase backend configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Quick capture: inkpad "my thought here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note and make it active
    #[command(alias = "new")]
    Add {
        /// Note title (defaults to "Untitled Note", or the first line of text)
        #[arg(short, long)]
        title: Option<String>,
        /// Note text, one paragraph per line
        content: Vec<String>,
    },
    /// List notes, newest first
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a note as plain text
    Show {
        /// Note ID or unique ID prefix (active note when omitted)
        id: Option<String>,
    },
    /// Make a note the active note
    Open {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Edit a note in $EDITOR; the title follows the first line
    Edit {
        /// Note ID or unique ID prefix (active note when omitted)
        id: Option<String>,
    },
    /// Rename a note
    Rename {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        title: String,
    },
    /// Delete a note (requires a signed-in session)
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Search titles and note text
    Search {
        /// Search query
        query: String,
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Word, character and sentence counts for a note
    Stats {
        /// Note ID or unique ID prefix (active note when omitted)
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a .txt or .md file as a new note
    Import {
        /// File to import
        path: PathBuf,
        /// MIME type to check instead of the file extension
        #[arg(long, value_name = "TYPE")]
        mime_type: Option<String>,
    },
    /// Export a note as plain text
    Export {
        /// Note ID or unique ID prefix (active note when omitted)
        id: Option<String>,
        /// Output path; use a directory to keep the suggested file name
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the Supabase account session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Name of the notes table
        #[arg(long, value_name = "TABLE")]
        notes_table: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile and where its backend settings come from
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email/password; local notes move into an empty account
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account with email/password
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password (at least 6 characters)
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for the profile
    Status,
    /// Sign out and clear the stored session
    Logout,
}
