//! Clap derive structures for the `livewrite` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// livewrite -- live views over Appwrite documents and files
#[derive(Debug, Parser)]
#[command(
    name = "livewrite",
    version,
    about = "Read and watch Appwrite documents, collections, and buckets",
    long_about = "Fetch Appwrite resources once, or keep them open and print every change\n\
        delivered over the realtime channel until interrupted.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "LIVEWRITE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// REST endpoint, e.g. https://cloud.appwrite.io/v1 (overrides profile)
    #[arg(long, short = 'e', env = "LIVEWRITE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Project identifier (overrides profile)
    #[arg(long, env = "LIVEWRITE_PROJECT", global = true)]
    pub project: Option<String>,

    /// Server API key
    #[arg(long, env = "LIVEWRITE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LIVEWRITE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "LIVEWRITE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LIVEWRITE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Do not subscribe list views to realtime channels
    #[arg(long, global = true)]
    pub no_realtime: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read or watch a single document
    #[command(alias = "doc")]
    Document(DocumentArgs),

    /// Read or watch the documents of a collection
    #[command(alias = "col")]
    Collection(CollectionArgs),

    /// Read or watch the files of a storage bucket
    Bucket(BucketArgs),

    /// Resolve or download a single file
    File(FileArgs),

    /// Show or watch the signed-in account
    Account(AccountArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Query strings passed through to the backend unchanged.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Query string (repeatable), e.g. '{"method":"limit","values":[10]}'
    #[arg(long = "query", short = 'Q')]
    pub queries: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DOCUMENT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DocumentArgs {
    #[command(subcommand)]
    pub command: DocumentCommand,
}

#[derive(Debug, Args)]
pub struct DocumentTarget {
    /// Database identifier
    pub database: String,

    /// Collection identifier
    pub collection: String,

    /// Document identifier
    pub document: String,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// Fetch a document once
    Get(DocumentTarget),

    /// Print the document every time it changes
    Watch(DocumentTarget),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COLLECTION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub command: CollectionCommand,
}

#[derive(Debug, Args)]
pub struct CollectionTarget {
    /// Database identifier
    pub database: String,

    /// Collection identifier
    pub collection: String,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    /// List documents once
    #[command(alias = "ls")]
    List(CollectionTarget),

    /// Print the document list every time it changes
    Watch(CollectionTarget),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BUCKET
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BucketArgs {
    #[command(subcommand)]
    pub command: BucketCommand,
}

#[derive(Debug, Args)]
pub struct BucketTarget {
    /// Bucket identifier
    pub bucket: String,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Debug, Subcommand)]
pub enum BucketCommand {
    /// List files once
    #[command(alias = "ls")]
    List(BucketTarget),

    /// Print the file list every time it changes
    Watch(BucketTarget),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FILE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FileArgs {
    #[command(subcommand)]
    pub command: FileCommand,
}

#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Show a file's metadata
    Info {
        /// Bucket identifier
        bucket: String,

        /// File identifier
        file: String,
    },

    /// Print the download URL without fetching anything
    Url {
        /// Bucket identifier
        bucket: String,

        /// File identifier
        file: String,
    },

    /// Download a file's content
    Download {
        /// Bucket identifier
        bucket: String,

        /// File identifier
        file: String,

        /// Write to this path instead of stdout
        #[arg(long = "out", short = 'O')]
        out: Option<PathBuf>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ACCOUNT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommand,
}

#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Show the account for the configured credentials
    Show,

    /// Print the account every time it changes
    Watch,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key, e.g. "endpoint", "project", "auth_mode"
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the profile's API key or session secret in the system keyring
    SetSecret {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
