//! The frame-side collaborator a blur runs against.

use std::fmt;

use crate::command::RecordedPass;

/// Width and height of a 2D image in texels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Size of the blur temporaries for a source of size `source`.
///
/// Each side is `floor(side / downsample)`, never smaller than one texel. A
/// `downsample` of zero is treated as one.
pub fn temp_extent(source: Extent, downsample: u32) -> Extent {
    let downsample = downsample.max(1);
    Extent {
        width: (source.width / downsample).max(1),
        height: (source.height / downsample).max(1),
    }
}

/// Everything a blur needs from the surrounding frame.
///
/// The host owns every image. Temporaries returned by
/// [`allocate_like`](BlurHost::allocate_like) live for the rest of the frame
/// and are never released by the blur itself.
pub trait BlurHost {
    /// Opaque image handle.
    type Image: Copy + Eq + fmt::Debug;
    /// Shader-bound state the blur keeps between frames.
    type Material;
    type Error: std::error::Error + 'static;

    /// The current frame color image.
    fn source(&self) -> Self::Image;

    fn extent(&self, image: Self::Image) -> Result<Extent, Self::Error>;

    /// Allocate a frame-scoped image with `template`'s format, no depth and
    /// a single sample.
    fn allocate_like(
        &mut self,
        template: Self::Image,
        extent: Extent,
        label: &'static str,
    ) -> Result<Self::Image, Self::Error>;

    /// Build the blur material. Failure means the shader is unavailable and
    /// the frame is skipped.
    fn create_material(&mut self) -> Result<Self::Material, Self::Error>;

    /// Announce how many draws the blur is about to issue this frame.
    ///
    /// Called before any image is allocated or pass submitted, so a host
    /// with a per-frame draw limit can refuse the frame without leaving
    /// partial work behind.
    fn reserve_draws(&mut self, _draws: usize) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Whether a material built on an earlier frame still fits this one.
    fn is_material_current(&self, _material: &Self::Material) -> bool {
        true
    }

    /// Record one pass, executing its commands in order.
    fn submit(
        &mut self,
        material: &Self::Material,
        pass: RecordedPass<Self::Image>,
    ) -> Result<(), Self::Error>;

    /// Make `image` the frame color for the rest of the frame and publish it
    /// under `name`.
    fn redirect(&mut self, name: &str, image: Self::Image) -> Result<(), Self::Error>;
}
