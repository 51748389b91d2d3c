//! Command-line overrides for the blur settings.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;
use crate::config::BlurMode;

/// Blur command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "kawase", about = "Kawase blur")]
pub struct CliArgs {
    /// Blur iterations (2-15).
    #[arg(long)]
    pub passes: Option<u32>,

    /// Resolution divisor for the blur temporaries (1-4).
    #[arg(long)]
    pub downsample: Option<u32>,

    /// Write the result back into the source image.
    #[arg(long)]
    pub copy_back: Option<bool>,

    /// Pass execution mode.
    #[arg(long, value_enum)]
    pub mode: Option<BlurMode>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(passes) = args.passes {
            self.blur.pass_count = passes;
        }
        if let Some(downsample) = args.downsample {
            self.blur.downsample = downsample;
        }
        if let Some(copy_back) = args.copy_back {
            self.blur.copy_back = copy_back;
        }
        if let Some(mode) = args.mode {
            self.blur.mode = mode;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
