//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use zoomrec_core::{DateRange, DateRangeError, TracingOutputFormat};

/// zoom-recordings - Download your Zoom cloud recordings
#[derive(Debug, Parser)]
#[command(name = "zoom-recordings")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "ZOOM_RECORDINGS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, global = true, value_name = "FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    // --- OAuth app settings ---
    /// Zoom OAuth client ID
    #[arg(long, global = true, env = "ZOOM_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Zoom OAuth client secret
    #[arg(long, global = true, env = "ZOOM_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Local port for the OAuth redirect (default 8085)
    #[arg(long, global = true, env = "ZOOM_CALLBACK_PORT")]
    pub callback_port: Option<u16>,

    /// Where the OAuth token is stored
    #[arg(long, global = true)]
    pub token_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize this tool with your Zoom account
    Login,

    /// Remove the stored token
    Logout,

    /// List cloud recordings in a date range
    List(DateArgs),

    /// Download cloud recordings in a date range
    Download {
        #[command(flatten)]
        dates: DateArgs,

        /// Directory to save recordings to (default ".")
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
}

/// Date range flags shared by `list` and `download`.
#[derive(Debug, Clone, Default, Args)]
pub struct DateArgs {
    /// Start date (YYYY-MM-DD). Defaults to 24 hours ago.
    #[arg(long, short)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long, short)]
    pub to: Option<String>,
}

impl DateArgs {
    /// Resolves the flags against the local clock.
    pub fn resolve(&self) -> Result<DateRange, DateRangeError> {
        DateRange::resolve(self.from.as_deref(), self.to.as_deref())
    }
}
