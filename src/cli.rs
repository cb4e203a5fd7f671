use clap::{Parser, Subcommand};
use rp_core::QualityTier;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelpress")]
#[command(author, version, about = "Best-effort tiered video downsizing")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a video file to fit a size target
    Compress {
        /// Input video
        #[arg(required = true)]
        input: PathBuf,

        /// Directory for the compressed file and thumbnail
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Size target in MiB (overrides config)
        #[arg(long)]
        target_mb: Option<f64>,

        /// Quality tier: premium, high, balanced or fast (overrides config)
        #[arg(short, long)]
        quality: Option<QualityTier>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },
}
