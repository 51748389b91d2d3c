//! [`BlurHost`] over wgpu.
//!
//! [`WgpuFrame`] is a frame-scoped image arena around a command encoder. It
//! imports the frame color texture, hands out transient textures, and turns
//! every resolved draw of a [`RecordedPass`] into its own render pass.
//! [`KawaseMaterial`] holds the pipelines and the per-draw uniform slots and
//! is kept by the blur between frames.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::command::{Draw, DrawKind, RecordedPass, ReplayError};
use crate::gpu::BLUR_TEXTURE_USAGE;
use crate::host::{BlurHost, Extent};
use crate::shader::{KAWASE_SHADER_NAME, ShaderLibrary};

/// Uniform slots available to one frame. Each draw consumes one.
pub const MAX_DRAWS_PER_FRAME: u32 = 32;

/// Index into a [`WgpuFrame`]'s image arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(usize);

/// Errors raised by the wgpu host.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("cannot allocate '{label}' at {width}x{height} (max {max})")]
    Allocation {
        label: &'static str,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("image {0:?} does not belong to this frame")]
    UnknownImage(ImageId),

    #[error("shader '{name}' is not loaded")]
    ShaderMissing { name: &'static str },

    #[error("frame color is missing usage {missing:?}")]
    UnsupportedUsage { missing: wgpu::TextureUsages },

    #[error("material built for {material:?} cannot render to {target:?}")]
    FormatMismatch {
        material: wgpu::TextureFormat,
        target: wgpu::TextureFormat,
    },

    #[error("{requested} blur draws requested, {available} uniform slots left this frame")]
    ParamSlotsExhausted { requested: usize, available: usize },

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Per-draw shader parameters.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct KawaseParams {
    /// Reciprocal size of the render target.
    pub texel_size: [f32; 2],
    pub offset: f32,
    pub pad: f32,
}

impl KawaseParams {
    pub fn new(target: Extent, offset: f32) -> Self {
        Self {
            texel_size: [1.0 / target.width as f32, 1.0 / target.height as f32],
            offset,
            pad: 0.0,
        }
    }
}

/// Pipelines and uniform storage for blur and copy draws of one format.
pub struct KawaseMaterial {
    format: wgpu::TextureFormat,
    blur_pipeline: wgpu::RenderPipeline,
    copy_pipeline: wgpu::RenderPipeline,
    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
    slot_stride: u32,
}

impl KawaseMaterial {
    /// Build pipelines rendering to `format` from a module containing
    /// `vs_fullscreen`, `fs_kawase` and `fs_copy`.
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> Self {
        let params_size = std::mem::size_of::<KawaseParams>() as u64;
        let slot_stride = device
            .limits()
            .min_uniform_buffer_offset_alignment
            .max(params_size as u32);

        let params_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kawase-params-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(params_size),
                },
                count: None,
            }],
        });

        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kawase-texture-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kawase-layout"),
            bind_group_layouts: &[&params_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let blur_pipeline =
            create_fullscreen_pipeline(device, shader, &layout, "fs_kawase", format, "kawase-blur");
        let copy_pipeline =
            create_fullscreen_pipeline(device, shader, &layout, "fs_copy", format, "kawase-copy");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kawase-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kawase-params"),
            size: u64::from(slot_stride) * u64::from(MAX_DRAWS_PER_FRAME),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kawase-params-bg"),
            layout: &params_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &params_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(params_size),
                }),
            }],
        });

        log::debug!("Built Kawase material for {format:?} (uniform stride {slot_stride})");

        Self {
            format,
            blur_pipeline,
            copy_pipeline,
            texture_bgl,
            sampler,
            params_buffer,
            params_bind_group,
            slot_stride,
        }
    }

    /// Color format the pipelines render to.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn pipeline(&self, kind: DrawKind) -> &wgpu::RenderPipeline {
        match kind {
            DrawKind::Blur => &self.blur_pipeline,
            DrawKind::Copy => &self.copy_pipeline,
        }
    }
}

/// Create a fullscreen render pipeline with the given fragment entry point.
fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    fragment_entry: &str,
    target_format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

struct FrameImage {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl FrameImage {
    fn new(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn extent(&self) -> Extent {
        Extent::new(self.texture.width(), self.texture.height())
    }
}

fn lookup(images: &[FrameImage], id: ImageId) -> Result<&FrameImage, FrameError> {
    images.get(id.0).ok_or(FrameError::UnknownImage(id))
}

/// One frame of blur work recorded into `encoder`.
///
/// Transient images live until the frame is dropped. The material's uniform
/// slots are rewritten every frame, so at most one frame per material may be
/// in a single queue submission.
pub struct WgpuFrame<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    encoder: &'a mut wgpu::CommandEncoder,
    shaders: &'a ShaderLibrary,
    images: Vec<FrameImage>,
    source_format: wgpu::TextureFormat,
    color: ImageId,
    published: HashMap<String, ImageId>,
    next_slot: u32,
}

impl<'a> WgpuFrame<'a> {
    /// Start a frame whose color image is `color`.
    ///
    /// `color` must be renderable and sampleable.
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        encoder: &'a mut wgpu::CommandEncoder,
        shaders: &'a ShaderLibrary,
        color: wgpu::Texture,
    ) -> Result<Self, FrameError> {
        let required =
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        let missing = required - color.usage();
        if !missing.is_empty() {
            return Err(FrameError::UnsupportedUsage { missing });
        }

        let source_format = color.format();
        Ok(Self {
            device,
            queue,
            encoder,
            shaders,
            images: vec![FrameImage::new(color)],
            source_format,
            color: ImageId(0),
            published: HashMap::new(),
            next_slot: 0,
        })
    }

    /// The current frame color, following any redirect.
    pub fn color(&self) -> ImageId {
        self.color
    }

    pub fn texture(&self, id: ImageId) -> Result<&wgpu::Texture, FrameError> {
        lookup(&self.images, id).map(|image| &image.texture)
    }

    /// Image published under `name` by a redirect this frame.
    pub fn published(&self, name: &str) -> Option<ImageId> {
        self.published.get(name).copied()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// End the frame and keep only the current color texture.
    pub fn into_color_texture(mut self) -> wgpu::Texture {
        self.images.swap_remove(self.color.0).texture
    }

    /// Fail unless `draws` more uniform slots are free.
    fn check_slots(&self, draws: usize) -> Result<(), FrameError> {
        let available = (MAX_DRAWS_PER_FRAME - self.next_slot) as usize;
        if draws > available {
            return Err(FrameError::ParamSlotsExhausted {
                requested: draws,
                available,
            });
        }
        Ok(())
    }

    fn draw(
        &mut self,
        material: &KawaseMaterial,
        label: &str,
        draw: &Draw<ImageId>,
    ) -> Result<(), FrameError> {
        let source = lookup(&self.images, draw.source)?;
        let target = lookup(&self.images, draw.target)?;
        let target_format = target.texture.format();
        if target_format != material.format {
            return Err(FrameError::FormatMismatch {
                material: material.format,
                target: target_format,
            });
        }

        let dynamic_offset = self.next_slot * material.slot_stride;
        self.next_slot += 1;

        let params = KawaseParams::new(target.extent(), draw.sample_offset);
        self.queue.write_buffer(
            &material.params_buffer,
            u64::from(dynamic_offset),
            bytemuck::bytes_of(&params),
        );

        let texture_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kawase-source-bg"),
            layout: &material.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&material.sampler),
                },
            ],
        });

        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        pass.set_pipeline(material.pipeline(draw.kind));
        pass.set_bind_group(0, &material.params_bind_group, &[dynamic_offset]);
        pass.set_bind_group(1, &texture_bind_group, &[]);
        pass.draw(0..3, 0..1);

        Ok(())
    }
}

impl BlurHost for WgpuFrame<'_> {
    type Image = ImageId;
    type Material = KawaseMaterial;
    type Error = FrameError;

    fn source(&self) -> ImageId {
        self.color
    }

    fn extent(&self, image: ImageId) -> Result<Extent, FrameError> {
        lookup(&self.images, image).map(FrameImage::extent)
    }

    fn allocate_like(
        &mut self,
        template: ImageId,
        extent: Extent,
        label: &'static str,
    ) -> Result<ImageId, FrameError> {
        let format = lookup(&self.images, template)?.texture.format();
        let max = self.device.limits().max_texture_dimension_2d;
        if extent.width == 0 || extent.height == 0 || extent.width > max || extent.height > max {
            return Err(FrameError::Allocation {
                label,
                width: extent.width,
                height: extent.height,
                max,
            });
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: BLUR_TEXTURE_USAGE,
            view_formats: &[],
        });
        log::trace!("Allocated {label}: {}x{} {format:?}", extent.width, extent.height);

        self.images.push(FrameImage::new(texture));
        Ok(ImageId(self.images.len() - 1))
    }

    fn create_material(&mut self) -> Result<KawaseMaterial, FrameError> {
        let shader = self
            .shaders
            .require(KAWASE_SHADER_NAME)
            .map_err(|_| FrameError::ShaderMissing {
                name: KAWASE_SHADER_NAME,
            })?;
        Ok(KawaseMaterial::new(self.device, &shader, self.source_format))
    }

    fn reserve_draws(&mut self, draws: usize) -> Result<(), FrameError> {
        self.check_slots(draws)
    }

    fn is_material_current(&self, material: &KawaseMaterial) -> bool {
        material.format == self.source_format
    }

    fn submit(
        &mut self,
        material: &KawaseMaterial,
        pass: RecordedPass<ImageId>,
    ) -> Result<(), FrameError> {
        let draws = pass.replay()?;
        self.check_slots(draws.len())?;
        log::debug!(
            "{}: {} draw(s), reads {:?}, writes {:?}",
            pass.label,
            draws.len(),
            pass.reads,
            pass.writes
        );
        for draw in &draws {
            self.draw(material, &pass.label, draw)?;
        }
        Ok(())
    }

    fn redirect(&mut self, name: &str, image: ImageId) -> Result<(), FrameError> {
        lookup(&self.images, image)?;
        self.color = image;
        self.published.insert(name.to_string(), image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blur::{BlurConfig, BlurOutcome, KawaseBlur};
    use crate::emitter::ExecutionMode;
    use crate::gpu::{create_test_device_queue, read_rgba8, upload_rgba8};

    /// White square in the middle of a black 16x16 image.
    fn square_image() -> Vec<u8> {
        let mut pixels = vec![0u8; 16 * 16 * 4];
        for y in 6..10 {
            for x in 6..10 {
                let i = (y * 16 + x) * 4;
                pixels[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
            }
        }
        pixels
    }

    struct FrameRun {
        result: Result<BlurOutcome<ImageId>, FrameError>,
        images: usize,
        output: wgpu::Texture,
    }

    fn run_frame(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders: &ShaderLibrary,
        config: BlurConfig,
    ) -> FrameRun {
        let source = upload_rgba8(device, queue, "frame-color", &square_image(), 16, 16).unwrap();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kawase-test"),
        });
        let mut blur = KawaseBlur::new(config);
        let run = {
            let mut frame = WgpuFrame::new(device, queue, &mut encoder, shaders, source).unwrap();
            let result = blur.run(&mut frame);
            FrameRun {
                result,
                images: frame.image_count(),
                output: frame.into_color_texture(),
            }
        };
        queue.submit([encoder.finish()]);
        run
    }

    fn blur_once(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shaders: &ShaderLibrary,
        config: BlurConfig,
    ) -> (BlurOutcome<ImageId>, wgpu::Texture) {
        let run = run_frame(device, queue, shaders, config);
        (run.result.unwrap(), run.output)
    }

    #[test]
    fn test_params_uniform_size() {
        assert_eq!(std::mem::size_of::<KawaseParams>(), 16);
    }

    #[test]
    fn test_params_use_target_texel_size() {
        let params = KawaseParams::new(Extent::new(200, 50), 2.5);
        assert_eq!(params.texel_size, [0.005, 0.02]);
        assert_eq!(params.offset, 2.5);
    }

    #[test]
    fn test_frame_rejects_unrenderable_color() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("copy-only"),
            size: wgpu::Extent3d {
                width: 4,
                height: 4,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let shaders = ShaderLibrary::new();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let result = WgpuFrame::new(&device, &queue, &mut encoder, &shaders, texture);
        assert!(matches!(result, Err(FrameError::UnsupportedUsage { .. })));
    }

    #[test]
    fn test_allocation_rejects_oversized_extent() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let shaders = ShaderLibrary::new();
        let source = upload_rgba8(&device, &queue, "src", &[0u8; 16], 2, 2).unwrap();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let mut frame = WgpuFrame::new(&device, &queue, &mut encoder, &shaders, source).unwrap();
        let color = frame.color();
        let huge = Extent::new(u32::MAX, 1);
        assert!(matches!(
            frame.allocate_like(color, huge, "huge"),
            Err(FrameError::Allocation { .. })
        ));
        let temp = frame.allocate_like(color, Extent::new(1, 1), "tiny").unwrap();
        assert_eq!(frame.extent(temp).unwrap(), Extent::new(1, 1));
        assert_eq!(frame.image_count(), 2);
    }

    #[test]
    fn test_missing_shader_skips_blur() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let shaders = ShaderLibrary::new();
        let (outcome, output) = blur_once(&device, &queue, &shaders, BlurConfig::default());
        assert_eq!(outcome, BlurOutcome::Skipped);
        assert_eq!(read_rgba8(&device, &queue, &output).unwrap(), square_image());
    }

    #[test]
    fn test_copy_back_blurs_in_place() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut shaders = ShaderLibrary::new();
        shaders.load_builtin(&device).unwrap();
        let config = BlurConfig {
            pass_count: 3,
            downsample: 2,
            copy_back: true,
            ..Default::default()
        };
        let (outcome, output) = blur_once(&device, &queue, &shaders, config);
        assert_eq!(
            outcome,
            BlurOutcome::Applied {
                output: ImageId(0),
                passes: 4
            }
        );
        assert_eq!((output.width(), output.height()), (16, 16));

        let pixels = read_rgba8(&device, &queue, &output).unwrap();
        let red = |x: usize, y: usize| pixels[(y * 16 + x) * 4];
        // Energy spreads out of the square and the edges soften.
        assert!(red(7, 7) < 255, "center should lose intensity");
        assert!(red(4, 7) > 0, "blur should reach outside the square");
    }

    #[test]
    fn test_zero_copy_redirects_to_downsampled_temporary() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut shaders = ShaderLibrary::new();
        shaders.load_builtin(&device).unwrap();
        let config = BlurConfig {
            pass_count: 4,
            downsample: 2,
            copy_back: false,
            ..Default::default()
        };
        let (outcome, output) = blur_once(&device, &queue, &shaders, config);
        let BlurOutcome::Applied { output: id, passes } = outcome else {
            panic!("blur was skipped");
        };
        assert_ne!(id, ImageId(0));
        assert_eq!(passes, 4);
        assert_eq!((output.width(), output.height()), (8, 8));
    }

    #[test]
    fn test_inline_mode_matches_discrete_copy_back() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut shaders = ShaderLibrary::new();
        shaders.load_builtin(&device).unwrap();
        let discrete = BlurConfig {
            pass_count: 5,
            downsample: 1,
            copy_back: true,
            mode: ExecutionMode::Discrete,
            ..Default::default()
        };
        let inline = BlurConfig {
            mode: ExecutionMode::Inline,
            ..discrete.clone()
        };

        let (_, discrete_out) = blur_once(&device, &queue, &shaders, discrete);
        let (outcome, inline_out) = blur_once(&device, &queue, &shaders, inline);
        assert_eq!(
            outcome,
            BlurOutcome::Applied {
                output: ImageId(0),
                passes: 1
            }
        );
        assert_eq!((inline_out.width(), inline_out.height()), (16, 16));

        // The inline backend writes its last draw straight into the source
        // while the discrete one adds a copy, so only the blur footprint is
        // compared.
        let d = read_rgba8(&device, &queue, &discrete_out).unwrap();
        let i = read_rgba8(&device, &queue, &inline_out).unwrap();
        let d_lit = d.chunks_exact(4).filter(|p| p[0] > 0).count();
        let i_lit = i.chunks_exact(4).filter(|p| p[0] > 0).count();
        assert!(d_lit > 16 && i_lit > 16);
    }

    #[test]
    fn test_pass_count_above_slot_limit_encodes_nothing() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut shaders = ShaderLibrary::new();
        shaders.load_builtin(&device).unwrap();
        let config = BlurConfig {
            pass_count: 32,
            copy_back: true,
            ..Default::default()
        };
        let run = run_frame(&device, &queue, &shaders, config);
        assert!(matches!(
            run.result,
            Err(FrameError::ParamSlotsExhausted {
                requested: 33,
                available: 32
            })
        ));
        // No temporaries were allocated and the frame color is untouched.
        assert_eq!(run.images, 1);
        assert_eq!(
            read_rgba8(&device, &queue, &run.output).unwrap(),
            square_image()
        );

        let at_limit = BlurConfig {
            pass_count: 31,
            copy_back: true,
            ..Default::default()
        };
        let run = run_frame(&device, &queue, &shaders, at_limit);
        assert!(matches!(run.result, Ok(BlurOutcome::Applied { passes: 32, .. })));
    }

    #[test]
    fn test_submit_checks_whole_pass_against_slots() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut shaders = ShaderLibrary::new();
        shaders.load_builtin(&device).unwrap();
        let source = upload_rgba8(&device, &queue, "src", &[0u8; 64], 4, 4).unwrap();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let mut frame = WgpuFrame::new(&device, &queue, &mut encoder, &shaders, source).unwrap();
        let material = frame.create_material().unwrap();
        let color = frame.color();
        let temp = frame.allocate_like(color, Extent::new(4, 4), "temp").unwrap();

        let too_many = (0..MAX_DRAWS_PER_FRAME + 1).fold(RecordedPass::new("big"), |pass, i| {
            if i % 2 == 0 {
                pass.blur(temp, color, 1.5)
            } else {
                pass.blur(color, temp, 1.5)
            }
        });
        assert!(matches!(
            frame.submit(&material, too_many),
            Err(FrameError::ParamSlotsExhausted { .. })
        ));
        // The refused pass consumed no slots.
        assert!(frame.reserve_draws(MAX_DRAWS_PER_FRAME as usize).is_ok());
    }

    #[test]
    fn test_create_material_requires_kawase_shader() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let mut shaders = ShaderLibrary::new();
        let source = upload_rgba8(&device, &queue, "src", &[0u8; 16], 2, 2).unwrap();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        {
            let mut frame =
                WgpuFrame::new(&device, &queue, &mut encoder, &shaders, source.clone()).unwrap();
            assert!(matches!(
                frame.create_material(),
                Err(FrameError::ShaderMissing {
                    name: KAWASE_SHADER_NAME
                })
            ));
        }
        shaders.load_builtin(&device).unwrap();
        let mut frame = WgpuFrame::new(&device, &queue, &mut encoder, &shaders, source).unwrap();
        let material = frame.create_material().unwrap();
        assert_eq!(material.format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn test_redirect_publishes_name() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let shaders = ShaderLibrary::new();
        let source = upload_rgba8(&device, &queue, "src", &[0u8; 64], 4, 4).unwrap();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let mut frame = WgpuFrame::new(&device, &queue, &mut encoder, &shaders, source).unwrap();
        let temp = frame
            .allocate_like(frame.color(), Extent::new(2, 2), "temp")
            .unwrap();
        frame.redirect("_BlurTexture", temp).unwrap();
        assert_eq!(frame.color(), temp);
        assert_eq!(frame.published("_BlurTexture"), Some(temp));
        assert!(matches!(
            frame.redirect("bogus", ImageId(99)),
            Err(FrameError::UnknownImage(_))
        ));
    }
}
