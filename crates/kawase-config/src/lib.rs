//! Configuration for the Kawase blur.
//!
//! Settings persist to disk as a RON file, can be hot-reloaded, and accept
//! CLI overrides via clap. [`BlurSettings::to_blur_config`] validates them
//! into the renderer's [`kawase_render::BlurConfig`].

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{BlurMode, BlurSettings, Config, DebugConfig, InjectionPoint, default_config_dir};
pub use error::ConfigError;
