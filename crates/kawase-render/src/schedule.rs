//! Ping-pong scheduling for an N-pass Kawase blur.
//!
//! [`build_schedule`] is a pure function of the pass count and the image
//! handles it is given: the first pass reads the source into temporary `A`,
//! intermediate passes alternate between `B` and `A`, and the last pass
//! writes to whatever [`FinalTarget`] the caller picked. No pass ever reads
//! and writes the same image.

use std::fmt;

/// Smallest pass count the ping-pong routing is defined for.
pub const MIN_PASS_COUNT: u32 = 2;

/// Largest pass count exposed through configuration.
pub const MAX_PASS_COUNT: u32 = 15;

/// Where the last pass of a schedule writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalTarget<I> {
    /// The temporary the final pass does not read from.
    Spare,
    /// A caller-chosen image, usually the source slot for copy-back.
    ///
    /// Must not be either temporary: the final pass may read from it, and
    /// hosts reject a draw that samples its own render target.
    Image(I),
}

/// One blur draw: sample `read`, render into `write`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassDescriptor<I> {
    pub read: I,
    pub write: I,
    /// Tap distance in destination texels.
    pub sample_offset: f32,
}

/// Ordered blur passes plus the image that holds the result.
#[derive(Clone, Debug, PartialEq)]
pub struct BlurSchedule<I> {
    passes: Vec<PassDescriptor<I>>,
    output: I,
}

impl<I: Copy> BlurSchedule<I> {
    /// Passes in submission order.
    pub fn passes(&self) -> &[PassDescriptor<I>] {
        &self.passes
    }

    /// Image written by the final pass.
    pub fn output(&self) -> I {
        self.output
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

/// Sample offset for pass `pass` (0-indexed).
///
/// The first pass uses 1.5; every later pass `k` uses `k + 0.5`, so passes 0
/// and 1 share the same footprint and the radius grows by one texel per pass
/// after that.
pub fn sample_offset(pass: u32) -> f32 {
    if pass == 0 {
        1.5
    } else {
        pass as f32 + 0.5
    }
}

/// Build the pass list for a `pass_count`-pass blur of `source` through the
/// temporaries `temp_a` and `temp_b`.
///
/// `temp_a` and `temp_b` must be distinct from each other and from `source`.
/// A `pass_count` below [`MIN_PASS_COUNT`] is clamped up to it.
pub fn build_schedule<I>(
    pass_count: u32,
    source: I,
    temp_a: I,
    temp_b: I,
    final_target: FinalTarget<I>,
) -> BlurSchedule<I>
where
    I: Copy + PartialEq + fmt::Debug,
{
    debug_assert!(
        temp_a != temp_b && temp_a != source && temp_b != source,
        "temporaries must be distinct from each other and from the source: \
         source={source:?} a={temp_a:?} b={temp_b:?}"
    );

    let pass_count = if pass_count < MIN_PASS_COUNT {
        log::warn!(
            "Kawase blur needs at least {MIN_PASS_COUNT} passes, got {pass_count}; clamping"
        );
        MIN_PASS_COUNT
    } else {
        pass_count
    };

    let mut passes = Vec::with_capacity(pass_count as usize);
    passes.push(PassDescriptor {
        read: source,
        write: temp_a,
        sample_offset: sample_offset(0),
    });

    let mut current = temp_a;
    let mut spare = temp_b;
    for pass in 1..pass_count - 1 {
        passes.push(PassDescriptor {
            read: current,
            write: spare,
            sample_offset: sample_offset(pass),
        });
        std::mem::swap(&mut current, &mut spare);
    }

    let output = match final_target {
        FinalTarget::Spare => spare,
        FinalTarget::Image(image) => image,
    };
    debug_assert!(
        output != current,
        "final target {output:?} is also the final pass input"
    );
    passes.push(PassDescriptor {
        read: current,
        write: output,
        sample_offset: sample_offset(pass_count - 1),
    });

    BlurSchedule { passes, output }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Img {
        Source,
        A,
        B,
    }

    fn spare_schedule(pass_count: u32) -> BlurSchedule<Img> {
        build_schedule(pass_count, Img::Source, Img::A, Img::B, FinalTarget::Spare)
    }

    #[test]
    fn test_pass_count_matches_request() {
        for n in MIN_PASS_COUNT..=MAX_PASS_COUNT {
            assert_eq!(spare_schedule(n).len(), n as usize, "pass count {n}");
            let copy_back = build_schedule(
                n,
                Img::Source,
                Img::A,
                Img::B,
                FinalTarget::Image(Img::Source),
            );
            assert_eq!(copy_back.len(), n as usize, "copy-back pass count {n}");
        }
    }

    #[test]
    fn test_no_pass_reads_its_own_target() {
        for n in MIN_PASS_COUNT..=MAX_PASS_COUNT {
            for target in [FinalTarget::Spare, FinalTarget::Image(Img::Source)] {
                let schedule = build_schedule(n, Img::Source, Img::A, Img::B, target);
                for (k, pass) in schedule.passes().iter().enumerate() {
                    assert_ne!(pass.read, pass.write, "pass {k} of {n} is a read-write hazard");
                }
            }
        }
    }

    #[test]
    fn test_sample_offsets() {
        assert_eq!(sample_offset(0), 1.5);
        assert_eq!(sample_offset(1), 1.5);
        assert_eq!(sample_offset(2), 2.5);
        assert_eq!(sample_offset(14), 14.5);

        for n in MIN_PASS_COUNT..=MAX_PASS_COUNT {
            let schedule = spare_schedule(n);
            let offsets: Vec<f32> = schedule.passes().iter().map(|p| p.sample_offset).collect();
            assert_eq!(offsets[0], 1.5);
            assert_eq!(offsets[1], 1.5);
            assert_eq!(*offsets.last().unwrap(), n as f32 - 0.5);
            for (k, offset) in offsets.iter().enumerate().skip(1) {
                assert_eq!(*offset, k as f32 + 0.5);
            }
        }
    }

    #[test]
    fn test_two_passes_skip_the_intermediate_loop() {
        let schedule = spare_schedule(2);
        assert_eq!(
            schedule.passes(),
            &[
                PassDescriptor {
                    read: Img::Source,
                    write: Img::A,
                    sample_offset: 1.5,
                },
                PassDescriptor {
                    read: Img::A,
                    write: Img::B,
                    sample_offset: 1.5,
                },
            ]
        );
        assert_eq!(schedule.output(), Img::B);
    }

    #[test]
    fn test_five_passes_ping_pong() {
        let schedule = spare_schedule(5);
        let routes: Vec<(Img, Img)> = schedule.passes().iter().map(|p| (p.read, p.write)).collect();
        assert_eq!(
            routes,
            vec![
                (Img::Source, Img::A),
                (Img::A, Img::B),
                (Img::B, Img::A),
                (Img::A, Img::B),
                (Img::B, Img::A),
            ]
        );
        assert_eq!(schedule.output(), Img::A);

        for pair in schedule.passes().windows(2) {
            assert_eq!(pair[0].write, pair[1].read, "each pass reads the previous output");
            assert_ne!((pair[0].read, pair[0].write), (pair[1].read, pair[1].write));
        }
    }

    #[test]
    fn test_final_image_target_overrides_spare() {
        let schedule = build_schedule(
            3,
            Img::Source,
            Img::A,
            Img::B,
            FinalTarget::Image(Img::Source),
        );
        let last = schedule.passes().last().unwrap();
        assert_eq!(last.write, Img::Source);
        assert_eq!(last.read, Img::B);
        assert_eq!(schedule.output(), Img::Source);
    }

    #[test]
    fn test_schedule_is_deterministic() {
        for n in MIN_PASS_COUNT..=MAX_PASS_COUNT {
            assert_eq!(spare_schedule(n), spare_schedule(n));
        }
    }

    #[test]
    fn test_pass_count_below_minimum_is_clamped() {
        assert_eq!(spare_schedule(0), spare_schedule(2));
        assert_eq!(spare_schedule(1), spare_schedule(2));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "also the final pass input")]
    fn test_final_target_on_last_input_is_rejected() {
        // Three passes end reading B, so B cannot also be the output.
        build_schedule(3, Img::Source, Img::A, Img::B, FinalTarget::Image(Img::B));
    }
}
