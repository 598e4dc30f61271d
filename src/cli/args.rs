use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "certifyme-rs")]
#[command(version = "1.0.0")]
#[command(about = "Exercise the CertifyMe credential API across regional servers")]
#[command(long_about = None)]
pub struct Cli {
    /// Server profile key from the config file
    #[arg(short, long, global = true, default_value = "main", env = "CERTIFYME_SERVER")]
    pub server: String,

    /// Config file path [default: ~/.config/certifyme-rs/servers.yaml]
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output raw tab-separated values and compact JSON (no formatting)
    #[arg(short, long, global = true)]
    pub raw: bool,

    /// Ask for the API token instead of reading it from the environment or config
    #[arg(long, global = true)]
    pub prompt_token: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the create, verify, edit and cleanup workflow
    Run {
        /// Servers to run against (repeatable; defaults to --server)
        #[arg(long = "on", value_name = "KEY")]
        servers: Vec<String>,
        /// Run against every configured server
        #[arg(long, conflicts_with = "servers")]
        all: bool,
    },
    /// Credential operations
    Credential {
        #[command(subcommand)]
        command: CredentialCommands,
    },
    /// Template operations
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Folder operations
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Analytics queries
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommands,
    },
    /// Token checks
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Configured server profiles
    Servers {
        #[command(subcommand)]
        command: ServersCommands,
    },
    /// Handle cache management
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Generate shell completion scripts
    Completion {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Create a credential from a JSON payload
    Create {
        /// JSON payload, or @file to read it from a file
        payload: String,
    },
    /// Show a credential
    Get { id: String },
    /// Edit a credential
    Edit {
        id: String,
        /// JSON payload, or @file to read it from a file
        payload: Option<String>,
    },
    /// Delete a credential
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Create a template from a JSON payload
    Create {
        /// JSON payload, or @file to read it from a file
        payload: String,
    },
    /// Show a template
    Get { id: String },
    /// Edit a template
    Edit {
        id: String,
        /// JSON payload, or @file to read it from a file
        payload: Option<String>,
    },
    /// Delete a template
    Delete { id: String },
    /// Copy a template
    Copy {
        id: String,
        /// JSON payload, or @file to read it from a file
        payload: String,
    },
    /// List all templates of an institution
    List { institution_id: String },
    /// List the credentials issued from a template
    Credentials { id: String },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder, retrying with a new name on collisions
    Create {
        name: String,
        /// Extra JSON fields merged into the payload
        #[arg(long)]
        extra: Option<String>,
    },
    /// Show a folder
    Get { id: String },
    /// List all folders of an institution
    List { institution_id: String },
    /// Delete a folder
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum AnalyticsCommands {
    /// Issuance analytics for a template
    Template { id: String },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Check whether the server accepts the token
    Check,
}

#[derive(Subcommand)]
pub enum ServersCommands {
    /// List configured server profiles
    List,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cached handles
    Show,
    /// Clear cached handles of the selected server
    Clear {
        /// Clear every server's cache
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum CompletionCommands {
    /// Generate bash completion script
    Bash,
    /// Generate zsh completion script
    Zsh,
    /// Generate fish completion script
    Fish,
    /// Generate PowerShell completion script
    PowerShell,
}

impl CompletionCommands {
    pub fn shell(&self) -> Shell {
        match self {
            CompletionCommands::Bash => Shell::Bash,
            CompletionCommands::Zsh => Shell::Zsh,
            CompletionCommands::Fish => Shell::Fish,
            CompletionCommands::PowerShell => Shell::PowerShell,
        }
    }
}
