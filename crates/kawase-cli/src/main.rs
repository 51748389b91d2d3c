//! Headless Kawase blur of an image file.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p kawase-cli -- in.png out.png --passes 8 --downsample 2`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use kawase_config::{CliArgs, Config, ConfigError, default_config_dir};
use kawase_render::{
    BlurOutcome, FrameError, GpuError, KAWASE_SHADER_NAME, KawaseBlur, ShaderError,
    ShaderLibrary, WgpuFrame, init_headless_blocking, read_rgba8, upload_rgba8,
};
use tracing::{error, info, warn};

/// File looked up in `debug.shader_dir` to override the built-in shader.
const SHADER_OVERRIDE_FILE: &str = "kawase_blur.wgsl";

#[derive(Parser, Debug)]
#[command(name = "kawase", about = "Blur an image with a multi-pass Kawase filter")]
struct Cli {
    /// Image to blur.
    input: PathBuf,

    /// Where to write the blurred PNG.
    output: PathBuf,

    #[command(flatten)]
    settings: CliArgs,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("image I/O failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("readback returned {actual} bytes for a {width}x{height} image")]
    PixelBuffer { actual: usize, width: u32, height: u32 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_dir = cli
        .settings
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".kawase"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&cli.settings);

    kawase_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    match run(&cli.input, &cli.output, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path, output: &Path, config: &Config) -> Result<(), CliError> {
    let blur_config = config.blur.to_blur_config()?;
    info!(
        passes = blur_config.pass_count,
        downsample = blur_config.downsample,
        copy_back = blur_config.copy_back,
        "Blurring {} ({:?} mode, injected {:?})",
        input.display(),
        blur_config.mode,
        config.blur.injection
    );

    let image = image::open(input)?.to_rgba8();
    let (width, height) = image.dimensions();

    let gpu = init_headless_blocking()?;
    let shaders = load_shaders(&gpu.device, config)?;
    let source = upload_rgba8(
        &gpu.device,
        &gpu.queue,
        "frame-color",
        image.as_raw(),
        width,
        height,
    )?;

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kawase-frame"),
        });
    let mut blur = KawaseBlur::new(blur_config);
    let (outcome, result) = {
        let mut frame = WgpuFrame::new(&gpu.device, &gpu.queue, &mut encoder, &shaders, source)?;
        let outcome = blur.run(&mut frame)?;
        (outcome, frame.into_color_texture())
    };
    gpu.queue.submit([encoder.finish()]);
    blur.teardown();

    match outcome {
        BlurOutcome::Skipped => warn!("Blur skipped, writing the input unchanged"),
        BlurOutcome::Applied { passes, .. } => info!("Submitted {passes} GPU pass(es)"),
    }

    let (out_width, out_height) = (result.width(), result.height());
    let pixels = read_rgba8(&gpu.device, &gpu.queue, &result)?;
    let actual = pixels.len();
    let blurred = image::RgbaImage::from_raw(out_width, out_height, pixels).ok_or(
        CliError::PixelBuffer {
            actual,
            width: out_width,
            height: out_height,
        },
    )?;
    blurred.save(output)?;

    info!("Wrote {out_width}x{out_height} to {}", output.display());
    Ok(())
}

/// Load the blur shader, preferring an override from `debug.shader_dir`.
fn load_shaders(device: &wgpu::Device, config: &Config) -> Result<ShaderLibrary, ShaderError> {
    let Some(dir) = &config.debug.shader_dir else {
        let mut shaders = ShaderLibrary::new();
        shaders.load_builtin(device)?;
        return Ok(shaders);
    };

    let mut shaders = ShaderLibrary::new().with_shader_dir(dir);
    match shaders.load_from_file(device, KAWASE_SHADER_NAME, SHADER_OVERRIDE_FILE) {
        Ok(_) => {}
        Err(ShaderError::FileNotFound { path }) => {
            warn!("No shader override at {}, using built-in", path.display());
            shaders.load_builtin(device)?;
        }
        Err(err) => return Err(err),
    }
    Ok(shaders)
}
