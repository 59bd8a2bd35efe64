//! Presenting annotated frames.
//!
//! A [`RenderSink`] receives every frame after the overlay has been drawn, and decides whether the
//! loop keeps going.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::image::Image;

/// What the display loop should do after a frame was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

/// Destination for annotated frames.
pub trait RenderSink {
    /// Presents `frame` to the user.
    fn show(&mut self, frame: &Image) -> anyhow::Result<Control>;
}

/// Writes every frame as a numbered PNG file into a directory.
///
/// With a frame limit, [`Control::Stop`] is returned once that many frames were written, which
/// plays the role of the user pressing a key to quit.
pub struct ImageDirSink {
    dir: PathBuf,
    written: usize,
    limit: Option<usize>,
}

impl ImageDirSink {
    /// Creates the sink, creating `dir` if it does not exist yet.
    pub fn create<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
            limit: None,
        })
    }

    /// Stops the loop after `limit` frames.
    pub fn limit(self, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }

    /// Number of frames written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl RenderSink for ImageDirSink {
    fn show(&mut self, frame: &Image) -> anyhow::Result<Control> {
        let path = self.dir.join(format!("frame_{:05}.png", self.written));
        frame
            .save(&path)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        self.written += 1;

        match self.limit {
            Some(limit) if self.written >= limit => Ok(Control::Stop),
            _ => Ok(Control::Continue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_numbered_frames_until_limit() {
        let dir = std::env::temp_dir().join(format!("fingercount-sink-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let mut sink = ImageDirSink::create(&dir).unwrap().limit(2);
        let frame = Image::new(2, 2);
        assert_eq!(sink.show(&frame).unwrap(), Control::Continue);
        assert_eq!(sink.show(&frame).unwrap(), Control::Stop);
        assert_eq!(sink.written(), 2);
        assert!(dir.join("frame_00000.png").is_file());
        assert!(dir.join("frame_00001.png").is_file());

        fs::remove_dir_all(&dir).unwrap();
    }
}
