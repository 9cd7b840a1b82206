use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "embedr",
    version,
    about = "Resolve video host embed pages into directly playable stream URLs"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "EMBEDR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Number of extraction attempts
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// User-Agent sent with every request
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an embed URL into a playable stream
    Extract {
        /// Embed page URL
        url: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,

        /// Write the result to a file instead of stdout
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Resolve the embed URL of a catalog movie or episode record
    Catalog {
        /// JSON record file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,

        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// List hosts with dedicated extraction rules
    Hosts {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        output: OutputFormat,
    },

    /// Show or reset the configuration file
    Config {
        #[arg(long)]
        show: bool,

        #[arg(long, conflicts_with = "show")]
        reset: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    pub fn output_format(&self) -> Option<OutputFormat> {
        match self {
            Self::Extract { output, .. }
            | Self::Catalog { output, .. }
            | Self::Hosts { output } => Some(*output),
            Self::Config { .. } | Self::Completions { .. } => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    JsonCompact,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact)
    }
}
