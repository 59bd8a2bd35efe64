//! Classification of fingers into extended and curled.
//!
//! This is a fixed geometric heuristic, not a learned model. Each finger compares its tip with a
//! reference joint below it:
//!
//! - The index, middle, ring and pinky fingers are extended when the tip is *above* the PIP joint
//!   (smaller Y, since Y points down in image coordinates). Handedness does not matter.
//! - The thumb folds sideways across the palm instead of downwards, so it is compared on the X
//!   axis against its IP joint. Which direction counts as "extended" depends on the handedness and
//!   on whether the camera image is mirrored (see [`Mirror`]).
//!
//! A tip that is exactly level with its reference joint counts as curled.
//!
//! # Coordinate space
//!
//! Landmarks may be normalized (`[0, 1]`) or in pixels, but both coordinates of all landmarks of a
//! hand must use the same space, with X pointing right and Y pointing down. Since only signs of
//! differences are compared, scaling the coordinates does not change the result.

use std::fmt;

use crate::hand::landmark::{HandObservation, Handedness, LandmarkIdx};
use crate::landmark::Landmarks;

/// The five fingers, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers, in the order used by [`FingerStates`].
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// The landmark at the tip of this finger.
    pub fn tip(self) -> LandmarkIdx {
        match self {
            Finger::Thumb => LandmarkIdx::ThumbTip,
            Finger::Index => LandmarkIdx::IndexFingerTip,
            Finger::Middle => LandmarkIdx::MiddleFingerTip,
            Finger::Ring => LandmarkIdx::RingFingerTip,
            Finger::Pinky => LandmarkIdx::PinkyTip,
        }
    }

    /// The joint the tip is compared against.
    ///
    /// For the thumb this is the joint right below the tip, for all other fingers it is two joints
    /// below the tip.
    pub fn reference(self) -> LandmarkIdx {
        match self {
            Finger::Thumb => LandmarkIdx::ThumbIp,
            Finger::Index => LandmarkIdx::IndexFingerPip,
            Finger::Middle => LandmarkIdx::MiddleFingerPip,
            Finger::Ring => LandmarkIdx::RingFingerPip,
            Finger::Pinky => LandmarkIdx::PinkyPip,
        }
    }
}

/// Per-finger "extended" flags of one hand, in the order of [`Finger::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FingerStates([bool; 5]);

impl FingerStates {
    pub fn new(states: [bool; 5]) -> Self {
        Self(states)
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger as usize]
    }

    /// Returns the number of extended fingers.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&extended| extended).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Finger, bool)> + '_ {
        Finger::ALL.into_iter().zip(self.0)
    }

    pub fn as_array(&self) -> [bool; 5] {
        self.0
    }
}

/// Formats the states as a 5-digit mask, thumb first (`01101`).
impl fmt::Display for FingerStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for extended in self.0 {
            f.write_str(if extended { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Camera mirroring convention of the image the landmarks were estimated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirror {
    /// The image is mirrored horizontally, like a selfie preview. A raised right thumb points
    /// towards smaller X.
    #[default]
    Selfie,
    /// The image is not mirrored (the camera looks at the subject like a bystander would).
    World,
}

/// Decides the direction of the thumb comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbRule {
    mirror: Mirror,
}

impl ThumbRule {
    pub fn new(mirror: Mirror) -> Self {
        Self { mirror }
    }

    pub fn mirror(&self) -> Mirror {
        self.mirror
    }

    /// Returns whether a thumb whose tip is at `tip_x` and whose IP joint is at `ref_x` is extended.
    pub fn is_extended(&self, handedness: Handedness, tip_x: f32, ref_x: f32) -> bool {
        let points_left = match (handedness, self.mirror) {
            (Handedness::Right, Mirror::Selfie) | (Handedness::Left, Mirror::World) => true,
            (Handedness::Left, Mirror::Selfie) | (Handedness::Right, Mirror::World) => false,
        };

        if points_left {
            tip_x < ref_x
        } else {
            tip_x > ref_x
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("hand has no handedness, cannot classify the thumb")]
    UnknownHandedness,
    #[error("finger classification needs {required} landmarks, got {actual}")]
    MissingLandmarks { required: usize, actual: usize },
}

/// Number of landmarks needed so that every tip and reference joint is present.
const REQUIRED_LANDMARKS: usize = LandmarkIdx::PinkyTip as usize + 1;

/// Classifies every finger of one hand as extended or curled.
///
/// `landmarks` must be in the 21-point hand order (see [`LandmarkIdx`]) and in a coordinate space
/// where Y points down. See the [module documentation](self) for the rules.
///
/// # Errors
///
/// This never guesses: if `landmarks` is too short or `handedness` is [`None`], an error is
/// returned instead of a partial result.
pub fn classify(
    landmarks: &Landmarks,
    handedness: Option<Handedness>,
    rule: ThumbRule,
) -> Result<FingerStates, ClassifyError> {
    if landmarks.len() < REQUIRED_LANDMARKS {
        return Err(ClassifyError::MissingLandmarks {
            required: REQUIRED_LANDMARKS,
            actual: landmarks.len(),
        });
    }
    let handedness = handedness.ok_or(ClassifyError::UnknownHandedness)?;

    let pos = |idx: LandmarkIdx| landmarks.positions()[idx as usize];

    let mut states = [false; 5];
    for (finger, state) in Finger::ALL.into_iter().zip(&mut states) {
        let [tip_x, tip_y, _] = pos(finger.tip());
        let [ref_x, ref_y, _] = pos(finger.reference());
        *state = match finger {
            Finger::Thumb => rule.is_extended(handedness, tip_x, ref_x),
            _ => tip_y < ref_y,
        };
    }

    Ok(FingerStates(states))
}

/// Classifies the fingers of a [`HandObservation`].
pub fn classify_observation(
    hand: &HandObservation,
    rule: ThumbRule,
) -> Result<FingerStates, ClassifyError> {
    classify(hand.landmarks(), hand.handedness(), rule)
}
