//! Execution backends that turn a [`BlurSchedule`] into host passes.
//!
//! [`DiscreteEmitter`] submits one pass per blur step so the host can track
//! each image dependency on its own. [`InlineEmitter`] submits a single
//! pass whose body contains every step, declared once and conservatively.

use crate::command::RecordedPass;
use crate::host::BlurHost;
use crate::schedule::{BlurSchedule, FinalTarget};

/// How a schedule is issued to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One host pass per blur step.
    #[default]
    Discrete,
    /// The whole schedule inside one host pass.
    Inline,
}

/// The two frame-scoped ping-pong images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Temporaries<I> {
    pub a: I,
    pub b: I,
}

/// What an emitter left behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Emitted<I> {
    /// Image holding the blurred frame.
    pub output: I,
    /// Host passes submitted.
    pub passes: usize,
}

/// A strategy for issuing a schedule.
pub trait PassEmitter {
    /// Where the last blur step of the schedule should write.
    fn final_target<I: Copy>(&self, source: I) -> FinalTarget<I>;

    /// Submit `schedule` to `host`. `source` is the frame color the schedule
    /// started from.
    fn emit<H: BlurHost>(
        &self,
        host: &mut H,
        material: &H::Material,
        schedule: &BlurSchedule<H::Image>,
        source: H::Image,
        temps: Temporaries<H::Image>,
    ) -> Result<Emitted<H::Image>, H::Error>;
}

/// One host pass per schedule entry, with optional copy-back.
///
/// With `copy_back` the result is drawn back into the source slot by an
/// extra pass. Without it the last temporary is published under
/// `target_name` and becomes the frame color.
#[derive(Clone, Copy, Debug)]
pub struct DiscreteEmitter<'a> {
    pub copy_back: bool,
    pub target_name: &'a str,
}

impl PassEmitter for DiscreteEmitter<'_> {
    fn final_target<I: Copy>(&self, _source: I) -> FinalTarget<I> {
        FinalTarget::Spare
    }

    fn emit<H: BlurHost>(
        &self,
        host: &mut H,
        material: &H::Material,
        schedule: &BlurSchedule<H::Image>,
        source: H::Image,
        _temps: Temporaries<H::Image>,
    ) -> Result<Emitted<H::Image>, H::Error> {
        for (k, step) in schedule.passes().iter().enumerate() {
            let pass = RecordedPass::new(format!("kawase-blur-{k}"))
                .read(step.read)
                .write(step.write)
                .blur(step.write, step.read, step.sample_offset);
            log::debug!(
                "kawase-blur-{k}: {:?} -> {:?} offset {}",
                step.read,
                step.write,
                step.sample_offset
            );
            host.submit(material, pass)?;
        }

        let blurred = schedule.output();
        if self.copy_back {
            let pass = RecordedPass::new("kawase-copy-back")
                .read(blurred)
                .write(source)
                .copy(source, blurred);
            host.submit(material, pass)?;
            Ok(Emitted {
                output: source,
                passes: schedule.len() + 1,
            })
        } else {
            host.redirect(self.target_name, blurred)?;
            log::debug!("published {blurred:?} as '{}'", self.target_name);
            Ok(Emitted {
                output: blurred,
                passes: schedule.len(),
            })
        }
    }
}

/// The whole schedule in one host pass, last draw straight into the source.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineEmitter;

impl PassEmitter for InlineEmitter {
    fn final_target<I: Copy>(&self, source: I) -> FinalTarget<I> {
        FinalTarget::Image(source)
    }

    fn emit<H: BlurHost>(
        &self,
        host: &mut H,
        material: &H::Material,
        schedule: &BlurSchedule<H::Image>,
        source: H::Image,
        temps: Temporaries<H::Image>,
    ) -> Result<Emitted<H::Image>, H::Error> {
        // Declared once for the whole body; the host sees no per-draw
        // dependencies, so the command order below is the only ordering.
        let pass = schedule.passes().iter().fold(
            RecordedPass::new("kawase-blur-inline")
                .read(source)
                .write(temps.a)
                .write(temps.b)
                .write(source),
            |pass, step| pass.blur(step.write, step.read, step.sample_offset),
        );
        log::debug!("kawase-blur-inline: {} draws", pass.draw_count());
        host.submit(material, pass)?;

        Ok(Emitted {
            output: schedule.output(),
            passes: 1,
        })
    }
}
