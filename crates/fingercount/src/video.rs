//! Frame sources.

pub mod sequence;

use crate::image::Image;
use crate::timer::Timer;

/// A source of video frames, such as a camera or a directory of recorded frames.
pub trait FrameSource {
    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` once the source has no more frames. An error means the frame could not
    /// be acquired (for a camera: the read failed).
    fn read(&mut self) -> anyhow::Result<Option<Image>>;

    /// Returns profiling timers of this source.
    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}
