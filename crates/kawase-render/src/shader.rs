//! Named shader registry and the built-in Kawase shader.
//!
//! The blur looks its shader up by [`KAWASE_SHADER_NAME`]. An empty slot is
//! the "unassigned shader" case: the host refuses to build a material and the
//! frame is skipped.

use log::{debug, info};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

/// Library key of the blur shader.
pub const KAWASE_SHADER_NAME: &str = "kawase_blur";

/// WGSL for the blur and copy draws. Both share `vs_fullscreen`.
pub const KAWASE_SHADER_SOURCE: &str = r#"
struct KawaseParams {
    texel_size: vec2<f32>,
    offset: f32,
    pad: f32,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: KawaseParams;
@group(1) @binding(0) var input_tex: texture_2d<f32>;
@group(1) @binding(1) var input_sampler: sampler;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_kawase(in: VertexOutput) -> @location(0) vec4<f32> {
    let tap = params.texel_size * params.offset;
    var color = textureSample(input_tex, input_sampler, in.uv);
    color += textureSample(input_tex, input_sampler, in.uv + vec2<f32>( tap.x,  tap.y));
    color += textureSample(input_tex, input_sampler, in.uv + vec2<f32>(-tap.x,  tap.y));
    color += textureSample(input_tex, input_sampler, in.uv + vec2<f32>( tap.x, -tap.y));
    color += textureSample(input_tex, input_sampler, in.uv + vec2<f32>(-tap.x, -tap.y));
    return color * 0.2;
}

@fragment
fn fs_copy(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(input_tex, input_sampler, in.uv);
}
"#;

/// Error types for shader loading operations.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("shader '{name}' not found in library")]
    NotLoaded { name: String },

    #[error("no shader directory configured for file-based loading")]
    NoShaderDir,
}

/// Compiled shader modules by name.
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
    shader_dir: Option<PathBuf>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            shader_dir: None,
        }
    }

    /// Set the directory `.wgsl` overrides are loaded from.
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    /// Compile [`KAWASE_SHADER_SOURCE`] under [`KAWASE_SHADER_NAME`].
    pub fn load_builtin(
        &mut self,
        device: &wgpu::Device,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.load_from_source(device, KAWASE_SHADER_NAME, KAWASE_SHADER_SOURCE)
    }

    /// Load a shader from a WGSL source string.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        debug!("Loading shader '{}' from source", name);

        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        let module = Arc::new(module);
        let replaced = self
            .modules
            .insert(name.to_string(), Arc::clone(&module))
            .is_some();

        if replaced {
            info!("Replaced shader '{}'", name);
        } else {
            info!("Loaded shader '{}'", name);
        }

        Ok(module)
    }

    /// Load a shader from a file in the shader directory.
    pub fn load_from_file(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        filename: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        let shader_dir = self.shader_dir.as_ref().ok_or(ShaderError::NoShaderDir)?;
        let path = shader_dir.join(filename);

        debug!("Loading shader '{}' from file: {:?}", name, path);

        if !path.exists() {
            return Err(ShaderError::FileNotFound { path });
        }

        let source = std::fs::read_to_string(&path)?;
        self.load_from_source(device, name, &source)
    }

    pub fn get(&self, name: &str) -> Option<Arc<wgpu::ShaderModule>> {
        self.modules.get(name).cloned()
    }

    /// Like [`get`](Self::get), but reports a missing entry as an error.
    pub fn require(&self, name: &str) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        self.get(name).ok_or_else(|| ShaderError::NotLoaded {
            name: name.to_string(),
        })
    }

    /// Unassign a shader. Returns whether it was loaded.
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.modules.remove(name).is_some();
        if removed {
            info!("Unloaded shader '{}'", name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}
