//! CLI parse: clap types for shortsmith. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// shortsmith - YouTube Shorts scripts and images from a single topic
#[derive(Parser)]
#[command(name = "shortsmith")]
#[command(about = "Generate YouTube Shorts scripts, image prompts and images for a topic")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a script and images for a topic, then bundle them for delivery
    Generate {
        /// Topic for the video; asked for interactively when omitted
        topic: Option<String>,
        /// Maximum number of images to generate
        #[arg(long)]
        max_images: Option<usize>,
        /// Directory for generated run files
        #[arg(long)]
        output: Option<PathBuf>,
        /// Directory bundles are written to
        #[arg(long)]
        bundle_dir: Option<PathBuf>,
        /// Use the interactive profile (3 images, shorter cooldown)
        #[arg(long)]
        interactive: bool,
        /// Keep generated run files after delivery
        #[arg(long)]
        keep: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Extract image prompts from a text file
    Prompts {
        /// File containing generated text
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the offline fallback script for a topic
    Fallback {
        /// Topic for the script
        topic: String,
    },
    /// Report credentials and configuration problems
    Check,
    /// Print the effective configuration
    Config {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
