//! Landmark storage shared by all hand-related code.

use crate::image::Resolution;

type Position = [f32; 3];

/// An ordered list of landmark positions.
///
/// The order is defined by whoever produced the landmarks and carries meaning (for hands, index 0
/// is always the wrist), so this type never reorders its contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Landmarks {
    positions: Box<[Position]>,
}

impl Landmarks {
    /// Creates a new [`Landmarks`] collection containing `len` preallocated landmarks.
    ///
    /// All landmarks will start with all coordinates at `0.0`.
    pub fn new(len: usize) -> Self {
        Self {
            positions: vec![[0.0, 0.0, 0.0]; len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Landmark> + Clone + '_ {
        self.positions.iter().map(|&pos| Landmark::new(pos))
    }

    pub fn set(&mut self, index: usize, landmark: Landmark) {
        self.positions[index] = landmark.pos;
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn map_positions(&mut self, mut f: impl FnMut(Position) -> Position) {
        for pos in self.positions.iter_mut() {
            *pos = f(*pos);
        }
    }

    /// Scales normalized X/Y coordinates to pixel coordinates of an image with resolution `res`.
    ///
    /// Z is left alone; providers express it relative to the wrist, not to the image.
    pub fn scale_to(&mut self, res: Resolution) {
        let (w, h) = (res.width() as f32, res.height() as f32);
        self.map_positions(|[x, y, z]| [x * w, y * h, z]);
    }
}

impl From<Vec<Position>> for Landmarks {
    fn from(positions: Vec<Position>) -> Self {
        Self {
            positions: positions.into_boxed_slice(),
        }
    }
}

/// A single landmark.
///
/// X and Y are image coordinates (either normalized or in pixels), Z is a relative depth estimate.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
pub struct Landmark {
    pos: [f32; 3],
}

impl Landmark {
    pub fn new(position: [f32; 3]) -> Self {
        Self { pos: position }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos[0]
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos[1]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn scale_to_pixels() {
        let mut lms = Landmarks::from(vec![[0.5, 0.25, -0.1], [1.0, 1.0, 0.3]]);
        lms.scale_to(Resolution::new(640, 480));

        assert_relative_eq!(lms.positions()[0][0], 320.0);
        assert_relative_eq!(lms.positions()[0][1], 120.0);
        assert_relative_eq!(lms.positions()[0][2], -0.1);
        assert_relative_eq!(lms.positions()[1][0], 640.0);
        assert_relative_eq!(lms.positions()[1][1], 480.0);
    }

    #[test]
    fn map_positions_keeps_order() {
        let mut lms = Landmarks::new(3);
        let mut i = 0.0;
        lms.map_positions(|_| {
            i += 1.0;
            [i, -i, 0.0]
        });
        let xs = lms.iter().map(|lm| lm.x()).collect::<Vec<_>>();
        assert_eq!(xs, [1.0, 2.0, 3.0]);
        assert_relative_eq!(lms.positions()[2][1], -3.0);
    }
}
