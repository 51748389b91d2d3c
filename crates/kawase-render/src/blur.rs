//! Per-frame Kawase blur driver.
//!
//! [`KawaseBlur`] owns the blur configuration and the shader-bound material.
//! The material is built on the first frame that needs it, rebuilt when the
//! host reports it stale, and released exactly once by [`KawaseBlur::teardown`]
//! or on drop.

use crate::emitter::{
    DiscreteEmitter, Emitted, ExecutionMode, InlineEmitter, PassEmitter, Temporaries,
};
use crate::host::{BlurHost, temp_extent};
use crate::schedule::{MIN_PASS_COUNT, build_schedule};

/// Name the blurred image is published under when it replaces the frame color.
pub const DEFAULT_TARGET_NAME: &str = "_BlurTexture";

/// Blur parameters for one schedule invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct BlurConfig {
    /// Blur iterations. Values below 2 are clamped to 2. Hosts may cap the
    /// draws per frame, see [`BlurHost::reserve_draws`].
    pub pass_count: u32,
    /// Integer divisor applied to the temporaries' resolution.
    pub downsample: u32,
    /// Draw the result back into the source instead of redirecting the frame
    /// color. Inline execution always copies back.
    pub copy_back: bool,
    pub mode: ExecutionMode,
    /// Published name of the result when `copy_back` is off.
    pub target_name: String,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            pass_count: 5,
            downsample: 1,
            copy_back: false,
            mode: ExecutionMode::Discrete,
            target_name: DEFAULT_TARGET_NAME.to_string(),
        }
    }
}

/// Result of running the blur for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlurOutcome<I> {
    /// The material could not be built; nothing was submitted.
    Skipped,
    Applied {
        /// Image holding the blurred frame.
        output: I,
        /// Host passes submitted, copy-back included.
        passes: usize,
    },
}

/// Kawase blur effect bound to a host material type.
pub struct KawaseBlur<M> {
    config: BlurConfig,
    material: Option<M>,
}

impl<M> KawaseBlur<M> {
    pub fn new(config: BlurConfig) -> Self {
        Self {
            config,
            material: None,
        }
    }

    pub fn config(&self) -> &BlurConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: BlurConfig) {
        self.config = config;
    }

    /// Whether a material is currently held.
    pub fn has_material(&self) -> bool {
        self.material.is_some()
    }

    /// Run the blur on `host`'s current frame color.
    ///
    /// Returns [`BlurOutcome::Skipped`] with a warning when the material
    /// cannot be built. Allocation and submission failures are returned to
    /// the caller; nothing is retried.
    pub fn run<H>(&mut self, host: &mut H) -> Result<BlurOutcome<H::Image>, H::Error>
    where
        H: BlurHost<Material = M>,
    {
        if self
            .material
            .as_ref()
            .is_some_and(|material| !host.is_material_current(material))
        {
            log::debug!("Kawase material no longer matches the frame, rebuilding");
            self.material = None;
        }

        if self.material.is_none() {
            match host.create_material() {
                Ok(material) => self.material = Some(material),
                Err(err) => {
                    log::warn!("Kawase blur skipped for this frame: {err}");
                    return Ok(BlurOutcome::Skipped);
                }
            }
        }
        let Some(material) = self.material.as_ref() else {
            return Ok(BlurOutcome::Skipped);
        };

        let emitted = enqueue(&self.config, host, material)?;
        Ok(BlurOutcome::Applied {
            output: emitted.output,
            passes: emitted.passes,
        })
    }

    /// Release the material. Consumes the effect so it cannot run again.
    pub fn teardown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(material) = self.material.take() {
            log::debug!("Releasing Kawase blur material");
            drop(material);
        }
    }
}

impl<M> Drop for KawaseBlur<M> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Allocate the temporaries, build the schedule and hand it to the emitter
/// selected by `config.mode`.
fn enqueue<H: BlurHost>(
    config: &BlurConfig,
    host: &mut H,
    material: &H::Material,
) -> Result<Emitted<H::Image>, H::Error> {
    host.reserve_draws(frame_draw_count(config))?;

    let source = host.source();
    let extent = temp_extent(host.extent(source)?, config.downsample);
    let temps = Temporaries {
        a: host.allocate_like(source, extent, "kawase-temp-a")?,
        b: host.allocate_like(source, extent, "kawase-temp-b")?,
    };
    log::trace!(
        "Kawase temporaries {}x{} (downsample {})",
        extent.width,
        extent.height,
        config.downsample
    );

    match config.mode {
        ExecutionMode::Discrete => {
            let emitter = DiscreteEmitter {
                copy_back: config.copy_back,
                target_name: &config.target_name,
            };
            emit_with(&emitter, config, host, material, source, temps)
        }
        ExecutionMode::Inline => {
            if !config.copy_back {
                log::debug!("Inline Kawase blur always copies back to the source");
            }
            emit_with(&InlineEmitter, config, host, material, source, temps)
        }
    }
}

/// Draws one frame issues: one per blur step, plus the discrete copy-back.
fn frame_draw_count(config: &BlurConfig) -> usize {
    let steps = config.pass_count.max(MIN_PASS_COUNT) as usize;
    match config.mode {
        ExecutionMode::Discrete if config.copy_back => steps + 1,
        _ => steps,
    }
}

fn emit_with<E: PassEmitter, H: BlurHost>(
    emitter: &E,
    config: &BlurConfig,
    host: &mut H,
    material: &H::Material,
    source: H::Image,
    temps: Temporaries<H::Image>,
) -> Result<Emitted<H::Image>, H::Error> {
    let schedule = build_schedule(
        config.pass_count,
        source,
        temps.a,
        temps.b,
        emitter.final_target(source),
    );
    emitter.emit(host, material, &schedule, source, temps)
}
