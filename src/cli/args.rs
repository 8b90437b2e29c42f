use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// LazyMaint: cache trimming and backup/restore for Kodi
#[derive(Parser, Debug)]
#[command(
    name = "lazymaint",
    version,
    about = "Keep a Kodi installation's caches small and its configuration backed up",
    long_about = "LazyMaint trims Kodi's temp and thumbnail caches oldest-first, clears\n\
                   downloaded packages, and backs up or restores addons, userdata and media.",
    after_help = "EXAMPLES:\n  \
        lazymaint status                        Show cache and data sizes\n  \
        lazymaint soft-clean                    Trim caches to the soft budget\n  \
        lazymaint soft-clean --budget-mb 20     Trim caches to 20 MB\n  \
        lazymaint auto-clean                    Quiet clean for startup scripts\n  \
        lazymaint hard-clean -y                 Wipe caches and the texture database\n  \
        lazymaint backup --dest ~/backups       Back up to a timestamped zip\n  \
        lazymaint restore ~/backups/kodi.zip    Replace data from a backup\n  \
        lazymaint log export ~/Desktop          Copy kodi.log somewhere"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Kodi home directory (overrides config)
    #[arg(long, global = true, value_name = "DIR", env = "LAZYMAINT_KODI_HOME")]
    pub home: Option<PathBuf>,

    /// Config file to use instead of ~/.lazymaint/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode: no progress, only the final result
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show sizes of Kodi's cache and data directories
    Status,

    /// Trim temp and thumbnails to a budget, clear packages, remove old log
    SoftClean {
        /// Budget in MB (defaults to soft_clean_budget_mb)
        #[arg(long, value_name = "MB")]
        budget_mb: Option<u64>,
    },

    /// Soft clean with the auto budget and no progress output
    AutoClean,

    /// Completely clear temp, packages and thumbnails and delete the texture database
    HardClean {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Trim a single directory to a budget, oldest files first
    Trim {
        /// Directory to trim
        path: PathBuf,

        /// Budget in MB
        #[arg(long, value_name = "MB")]
        budget_mb: u64,
    },

    /// Back up addons, userdata and media into a zip archive
    Backup {
        /// Archive name (defaults to kodi_backup_<timestamp>.zip)
        #[arg(long)]
        name: Option<String>,

        /// Directory to write the archive to (defaults to backup_dir)
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// Overwrite an existing archive without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Restore addons, userdata and media from a backup archive
    Restore {
        /// Archive to restore
        archive: PathBuf,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Wipe userdata and all addons except this one
    FreshStart {
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Read, export or clear kodi.log
    Log {
        #[command(subcommand)]
        action: LogAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum LogAction {
    /// Print the log
    Read,

    /// Copy the log into a directory
    Export {
        /// Destination directory
        dest: PathBuf,
    },

    /// Truncate the log
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset to default configuration
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Write the default configuration file
    Init,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
