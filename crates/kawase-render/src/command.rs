//! Command vocabulary for blur pass bodies.
//!
//! A [`RecordedPass`] is what an emitter hands to a [`crate::BlurHost`]: a
//! label, the images the pass declares it reads and writes, and an ordered
//! list of stateful [`BlurCommand`]s. Commands are order-sensitive: a draw
//! uses whatever render target and sample offset were set before it.

use std::fmt;

/// A single low-level command inside a pass body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlurCommand<I> {
    /// Bind the image subsequent draws render into.
    SetRenderTarget(I),
    /// Set the `sampleOffset` shader parameter for subsequent blur draws.
    SetSampleOffset(f32),
    /// Full-screen Kawase draw sampling `source`.
    DrawBlur { source: I },
    /// Full-screen copy of `source` into the bound target.
    Copy { source: I },
}

/// Which shader entry a resolved [`Draw`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    Blur,
    Copy,
}

/// A draw with its render state resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Draw<I> {
    pub kind: DrawKind,
    pub source: I,
    pub target: I,
    pub sample_offset: f32,
}

/// Errors found while resolving a pass body into draws.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplayError {
    #[error("pass '{label}' draws before binding a render target")]
    NoRenderTarget { label: String },

    #[error("pass '{label}' samples {image} while rendering into it")]
    ReadWriteHazard { label: String, image: String },
}

/// A pass as declared to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedPass<I> {
    pub label: String,
    pub reads: Vec<I>,
    pub writes: Vec<I>,
    pub commands: Vec<BlurCommand<I>>,
}

impl<I: Copy + PartialEq + fmt::Debug> RecordedPass<I> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reads: Vec::new(),
            writes: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Declare an image this pass samples.
    pub fn read(mut self, image: I) -> Self {
        if !self.reads.contains(&image) {
            self.reads.push(image);
        }
        self
    }

    /// Declare an image this pass renders into.
    pub fn write(mut self, image: I) -> Self {
        if !self.writes.contains(&image) {
            self.writes.push(image);
        }
        self
    }

    pub fn command(mut self, command: BlurCommand<I>) -> Self {
        self.commands.push(command);
        self
    }

    /// Append bind-target, set-offset and draw for one blur step.
    pub fn blur(self, target: I, source: I, sample_offset: f32) -> Self {
        self.command(BlurCommand::SetRenderTarget(target))
            .command(BlurCommand::SetSampleOffset(sample_offset))
            .command(BlurCommand::DrawBlur { source })
    }

    /// Append bind-target and a plain copy of `source`.
    pub fn copy(self, target: I, source: I) -> Self {
        self.command(BlurCommand::SetRenderTarget(target))
            .command(BlurCommand::Copy { source })
    }

    /// Number of draw commands in the body.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, BlurCommand::DrawBlur { .. } | BlurCommand::Copy { .. }))
            .count()
    }

    /// Walk the body in order and resolve each draw against the state set
    /// before it.
    pub fn replay(&self) -> Result<Vec<Draw<I>>, ReplayError> {
        let mut target = None;
        let mut sample_offset = 0.0;
        let mut draws = Vec::with_capacity(self.draw_count());

        for command in &self.commands {
            let (kind, source) = match *command {
                BlurCommand::SetRenderTarget(image) => {
                    target = Some(image);
                    continue;
                }
                BlurCommand::SetSampleOffset(offset) => {
                    sample_offset = offset;
                    continue;
                }
                BlurCommand::DrawBlur { source } => (DrawKind::Blur, source),
                BlurCommand::Copy { source } => (DrawKind::Copy, source),
            };

            let target = target.ok_or_else(|| ReplayError::NoRenderTarget {
                label: self.label.clone(),
            })?;
            if source == target {
                return Err(ReplayError::ReadWriteHazard {
                    label: self.label.clone(),
                    image: format!("{source:?}"),
                });
            }
            draws.push(Draw {
                kind,
                source,
                target,
                sample_offset,
            });
        }

        Ok(draws)
    }
}
