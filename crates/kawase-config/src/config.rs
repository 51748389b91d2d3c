//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use kawase_render::{BlurConfig, DEFAULT_TARGET_NAME, ExecutionMode, MAX_PASS_COUNT, MIN_PASS_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest supported downsample factor.
pub const MAX_DOWNSAMPLE: u32 = 4;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Blur effect settings.
    pub blur: BlurSettings,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// How the blur issues its passes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum BlurMode {
    /// One GPU pass per blur iteration.
    #[default]
    Discrete,
    /// All iterations inside a single GPU pass.
    Inline,
}

impl From<BlurMode> for ExecutionMode {
    fn from(mode: BlurMode) -> Self {
        match mode {
            BlurMode::Discrete => ExecutionMode::Discrete,
            BlurMode::Inline => ExecutionMode::Inline,
        }
    }
}

/// Point in the host frame where the blur is injected.
///
/// Carried for the host; the blur itself does not depend on it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum InjectionPoint {
    BeforeOpaques,
    AfterOpaques,
    BeforeTransparents,
    #[default]
    AfterTransparents,
    BeforePostProcessing,
    AfterPostProcessing,
}

/// Blur effect settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlurSettings {
    /// Blur iterations (2 - 15).
    pub pass_count: u32,
    /// Resolution divisor for the blur temporaries (1 - 4).
    pub downsample: u32,
    /// Write the result back into the frame color instead of redirecting it.
    pub copy_back: bool,
    /// Pass execution mode.
    pub mode: BlurMode,
    /// Where the host runs the blur.
    pub injection: InjectionPoint,
    /// Name the result is published under when `copy_back` is off.
    pub target_name: String,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Directory of `.wgsl` files overriding the built-in shader.
    pub shader_dir: Option<PathBuf>,
}

impl Default for BlurSettings {
    fn default() -> Self {
        Self {
            pass_count: 5,
            downsample: 1,
            copy_back: false,
            mode: BlurMode::Discrete,
            injection: InjectionPoint::AfterTransparents,
            target_name: DEFAULT_TARGET_NAME.to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            shader_dir: None,
        }
    }
}

impl BlurSettings {
    /// Check the ranges the blur schedule is defined for.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PASS_COUNT..=MAX_PASS_COUNT).contains(&self.pass_count) {
            return Err(ConfigError::InvalidPassCount {
                value: self.pass_count,
                min: MIN_PASS_COUNT,
                max: MAX_PASS_COUNT,
            });
        }
        if !(1..=MAX_DOWNSAMPLE).contains(&self.downsample) {
            return Err(ConfigError::InvalidDownsample {
                value: self.downsample,
                min: 1,
                max: MAX_DOWNSAMPLE,
            });
        }
        Ok(())
    }

    /// Validate and convert into the renderer's blur parameters.
    pub fn to_blur_config(&self) -> Result<BlurConfig, ConfigError> {
        self.validate()?;
        Ok(BlurConfig {
            pass_count: self.pass_count,
            downsample: self.downsample,
            copy_back: self.copy_back,
            mode: self.mode.into(),
            target_name: self.target_name.clone(),
        })
    }
}

/// Platform config directory for the blur tool, if one exists.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kawase-blur"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
