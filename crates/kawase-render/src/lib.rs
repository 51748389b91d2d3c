//! Kawase blur for wgpu: ping-pong pass scheduling over two downsampled
//! temporaries, with discrete and inline execution backends.

pub mod blur;
pub mod command;
pub mod emitter;
pub mod gpu;
pub mod host;
pub mod schedule;
pub mod shader;
pub mod wgpu_host;

pub use blur::{BlurConfig, BlurOutcome, DEFAULT_TARGET_NAME, KawaseBlur};
pub use command::{BlurCommand, Draw, DrawKind, RecordedPass, ReplayError};
pub use emitter::{DiscreteEmitter, Emitted, ExecutionMode, InlineEmitter, PassEmitter, Temporaries};
pub use gpu::{GpuContext, GpuError, init_headless_blocking, read_rgba8, upload_rgba8};
pub use host::{BlurHost, Extent, temp_extent};
pub use schedule::{
    BlurSchedule, FinalTarget, MAX_PASS_COUNT, MIN_PASS_COUNT, PassDescriptor, build_schedule,
    sample_offset,
};
pub use shader::{KAWASE_SHADER_NAME, KAWASE_SHADER_SOURCE, ShaderError, ShaderLibrary};
pub use wgpu_host::{FrameError, ImageId, KawaseMaterial, KawaseParams, WgpuFrame};
