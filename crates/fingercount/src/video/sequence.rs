//! Frames stored as numbered image files.

use std::{
    borrow::Cow,
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};

use crate::image::{is_supported_path, Image};
use crate::timer::Timer;

use super::FrameSource;

/// Reads every JPEG or PNG file of a directory as one frame, in file name order.
///
/// Runs of digits in file names are compared by value, so `2.png` comes before `10.png` and frames
/// do not need zero-padded names.
///
/// Decoded frames are converted to RGBA, whatever their on-disk color layout is.
pub struct ImageSequence {
    frames: Vec<PathBuf>,
    next: usize,
    t_decode: Timer,
}

impl ImageSequence {
    /// Opens a directory of frames.
    ///
    /// Fails if `dir` cannot be read or does not contain any supported image file.
    pub fn open<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        Self::open_impl(dir.as_ref())
    }

    fn open_impl(dir: &Path) -> anyhow::Result<Self> {
        let mut frames = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("failed to open frame directory '{}'", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && is_supported_path(&path) {
                frames.push(path);
            }
        }
        if frames.is_empty() {
            bail!("no JPEG or PNG frames found in '{}'", dir.display());
        }
        frames.sort_by(|a, b| {
            natural_cmp(&file_name(a), &file_name(b)).then_with(|| a.cmp(b))
        });

        log::info!("found {} frames in '{}'", frames.len(), dir.display());
        Ok(Self {
            frames,
            next: 0,
            t_decode: Timer::new("decode"),
        })
    }

    /// Returns the total number of frames in the sequence.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn file_name(path: &Path) -> Cow<'_, str> {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
}

/// Compares two file names, treating runs of ASCII digits as numbers.
fn natural_cmp(mut a: &str, mut b: &str) -> Ordering {
    let digits = |s: &str| s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();

    loop {
        let (Some(ca), Some(cb)) = (a.chars().next(), b.chars().next()) else {
            return a.len().cmp(&b.len());
        };

        let (da, db) = (digits(a), digits(b));
        let ord = if da > 0 && db > 0 {
            let na = a[..da].trim_start_matches('0');
            let nb = b[..db].trim_start_matches('0');
            a = &a[da..];
            b = &b[db..];
            na.len().cmp(&nb.len()).then_with(|| na.cmp(nb))
        } else {
            a = &a[ca.len_utf8()..];
            b = &b[cb.len_utf8()..];
            ca.cmp(&cb)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

impl FrameSource for ImageSequence {
    fn read(&mut self) -> anyhow::Result<Option<Image>> {
        let Some(path) = self.frames.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        log::trace!("reading frame '{}'", path.display());
        let image = self.t_decode.time(|| Image::load(path))?;
        Ok(Some(image))
    }

    fn timers(&self) -> Vec<&Timer> {
        vec![&self.t_decode]
    }
}
