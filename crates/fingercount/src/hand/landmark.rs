//! The 21-point hand landmark model.

use std::{fmt, str::FromStr};

use nalgebra::{Point2, Rotation2, Vector2};

use crate::hand::fingers::FingerStates;
use crate::image::{draw, Color, Image, Resolution};
use crate::landmark::{Landmark, Landmarks};

/// A single detected hand, as reported by a landmark provider.
#[derive(Debug, Clone, PartialEq)]
pub struct HandObservation {
    landmarks: Landmarks,
    handedness: Option<Handedness>,
    presence: f32,
}

impl HandObservation {
    pub const NUM_LANDMARKS: usize = 21;

    /// Creates an observation from landmarks in provider order.
    ///
    /// `handedness` is [`None`] if the provider did not classify the hand.
    ///
    /// # Errors
    ///
    /// Returns an error if `landmarks` does not contain exactly [`Self::NUM_LANDMARKS`] entries.
    pub fn new(
        landmarks: Landmarks,
        handedness: Option<Handedness>,
    ) -> Result<Self, ObservationError> {
        if landmarks.len() != Self::NUM_LANDMARKS {
            return Err(ObservationError::LandmarkCount {
                expected: Self::NUM_LANDMARKS,
                actual: landmarks.len(),
            });
        }
        Ok(Self {
            landmarks,
            handedness,
            presence: 1.0,
        })
    }

    /// Attaches the provider's presence confidence.
    pub fn with_presence(self, presence: f32) -> Self {
        Self { presence, ..self }
    }

    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    /// Returns a landmark by name.
    pub fn landmark(&self, idx: LandmarkIdx) -> Landmark {
        // `new` guarantees all 21 landmarks are present.
        Landmark::new(self.landmarks.positions()[idx as usize])
    }

    pub fn handedness(&self) -> Option<Handedness> {
        self.handedness
    }

    /// Presence confidence reported by the provider, from 0.0 to 1.0.
    pub fn presence(&self) -> f32 {
        self.presence
    }

    /// Returns a copy with all landmarks mapped from normalized to pixel coordinates of an image of
    /// resolution `res`.
    pub fn to_pixels(&self, res: Resolution) -> Self {
        let mut this = self.clone();
        this.landmarks.scale_to(res);
        this
    }

    /// Returns an iterator over the landmarks that surround the palm.
    pub fn palm_landmarks(&self) -> impl Iterator<Item = Landmark> + '_ {
        PALM_LANDMARKS.iter().map(|lm| self.landmark(*lm))
    }

    /// Computes the center of the palm by averaging the landmarks around it.
    pub fn palm_center(&self) -> [f32; 2] {
        let (mut x, mut y) = (0.0, 0.0);
        for lm in self.palm_landmarks() {
            x += lm.x();
            y += lm.y();
        }
        let count = PALM_LANDMARKS.len() as f32;
        [x / count, y / count]
    }

    /// Computes the clockwise rotation of the palm compared to an upright position.
    ///
    /// A rotation of 0° means that fingers are pointed upwards. Only meaningful in pixel
    /// coordinates, since normalized coordinates distort angles on non-square images.
    pub fn rotation_radians(&self) -> f32 {
        let p = self.landmark(LandmarkIdx::MiddleFingerMcp);
        let finger = Point2::new(p.x(), p.y());
        let p = self.landmark(LandmarkIdx::Wrist);
        let wrist = Point2::new(p.x(), p.y());

        let rel = wrist - finger;
        Rotation2::rotation_between(&Vector2::y(), &rel).angle()
    }

    /// Draws the hand skeleton, the palm center and rotation, its handedness and the given finger
    /// states.
    ///
    /// The observation must already be in pixel coordinates of `target`.
    pub fn draw(&self, target: &mut Image, states: Option<&FingerStates>) {
        let px = |lm: Landmark| (lm.x().round() as i32, lm.y().round() as i32);

        for (a, b) in CONNECTIVITY {
            draw::line(target, px(self.landmark(*a)), px(self.landmark(*b))).color(Color::GREEN);
        }
        for lm in self.landmarks.iter() {
            let (x, y) = px(lm);
            draw::dot(target, x, y);
        }

        let [cx, cy] = self.palm_center();
        let (cx, cy) = (cx.round() as i32, cy.round() as i32);
        draw::dot(target, cx, cy).diameter(7).color(Color::BLUE);
        let rotation = format!("{:.1} deg", self.rotation_radians().to_degrees());
        draw::text(target, cx, cy + 6, &rotation)
            .align_top()
            .color(Color::WHITE);

        let label = match (self.handedness, states) {
            (Some(hand), Some(states)) => format!("{hand} {states}"),
            (Some(hand), None) => hand.to_string(),
            (None, _) => "?".to_string(),
        };
        let (x, y) = px(self.landmark(LandmarkIdx::Wrist));
        draw::text(target, x, y + 10, &label)
            .align_top()
            .color(Color::WHITE);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservationError {
    #[error("expected {expected} hand landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },
}

/// Which hand an observation belongs to, from the subject's own perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Handedness::Left => "Left",
            Handedness::Right => "Right",
        })
    }
}

/// Parses the labels used by MediaPipe (`"Left"` / `"Right"`), ignoring ASCII case.
impl FromStr for Handedness {
    type Err = UnknownHandedness;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("left") {
            Ok(Handedness::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Ok(Handedness::Right)
        } else {
            Err(UnknownHandedness(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown handedness label '{0}'")]
pub struct UnknownHandedness(String);

/// Names for the hand landmarks.
///
/// # Terminology
///
/// - **CMC**: [Carpometacarpal joint], the lowest joint of the thumb, located near the wrist.
/// - **MCP**: [Metacarpophalangeal joint], the lower joint forming the knuckles near the palm of
///   the hand.
/// - **IP**: Interphalangeal joint, the only joint of the thumb above its MCP.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: This landmark is just placed on the tip of the finger, above the DIP.
///
/// [Carpometacarpal joint]: https://en.wikipedia.org/wiki/Carpometacarpal_joint
/// [Metacarpophalangeal joint]: https://en.wikipedia.org/wiki/Metacarpophalangeal_joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

const PALM_LANDMARKS: &[LandmarkIdx] = {
    use LandmarkIdx::*;
    &[
        Wrist,
        ThumbCmc,
        IndexFingerMcp,
        MiddleFingerMcp,
        RingFingerMcp,
        PinkyMcp,
    ]
};

/// Pairs of landmarks connected by a bone, for drawing the hand skeleton.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Surround the palm:
        (Wrist, ThumbCmc),
        (ThumbCmc, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, Wrist),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::test::HandBuilder;

    #[test]
    fn rejects_wrong_landmark_count() {
        let err = HandObservation::new(Landmarks::new(20), Some(Handedness::Left)).unwrap_err();
        assert_eq!(
            err,
            ObservationError::LandmarkCount {
                expected: 21,
                actual: 20
            }
        );
        assert!(HandObservation::new(Landmarks::new(22), None).is_err());
        assert!(HandObservation::new(Landmarks::new(21), None).is_ok());
    }

    #[test]
    fn parse_handedness() {
        assert_eq!("Left".parse::<Handedness>(), Ok(Handedness::Left));
        assert_eq!("RIGHT".parse::<Handedness>(), Ok(Handedness::Right));
        assert!("Both".parse::<Handedness>().is_err());
        assert!("".parse::<Handedness>().is_err());
        assert_eq!(Handedness::Right.to_string(), "Right");
    }

    #[test]
    fn to_pixels_scales_every_landmark() {
        let hand = HandBuilder::right()
            .at(LandmarkIdx::Wrist, 0.5, 0.75)
            .build()
            .to_pixels(Resolution::new(640, 480));

        let wrist = hand.landmark(LandmarkIdx::Wrist);
        assert_relative_eq!(wrist.x(), 320.0);
        assert_relative_eq!(wrist.y(), 360.0);
        assert_eq!(hand.landmarks().len(), 21);
        assert_eq!(hand.handedness(), Some(Handedness::Right));
    }

    #[test]
    fn upright_hand_has_no_rotation() {
        let hand = HandBuilder::right()
            .at(LandmarkIdx::Wrist, 100.0, 200.0)
            .at(LandmarkIdx::MiddleFingerMcp, 100.0, 120.0)
            .build();
        assert_relative_eq!(hand.rotation_radians(), 0.0);

        let tilted = HandBuilder::right()
            .at(LandmarkIdx::Wrist, 100.0, 200.0)
            .at(LandmarkIdx::MiddleFingerMcp, 180.0, 200.0)
            .build();
        assert_relative_eq!(
            tilted.rotation_radians().abs(),
            std::f32::consts::FRAC_PI_2,
            epsilon = 1e-5
        );
    }

    #[test]
    fn palm_center_averages_palm_landmarks() {
        use LandmarkIdx::*;

        let mut builder = HandBuilder::right();
        for (i, lm) in PALM_LANDMARKS.iter().enumerate() {
            builder = builder.at(*lm, i as f32 * 10.0, 100.0 - i as f32 * 10.0);
        }
        // Non-palm landmarks must not move the center.
        let hand = builder.at(IndexFingerTip, 900.0, -900.0).build();

        let [x, y] = hand.palm_center();
        assert_relative_eq!(x, 25.0);
        assert_relative_eq!(y, 75.0);
        assert_eq!(hand.palm_landmarks().count(), 6);
    }

    #[test]
    fn connectivity_covers_every_landmark() {
        let mut seen = [false; HandObservation::NUM_LANDMARKS];
        for (a, b) in CONNECTIVITY {
            seen[*a as usize] = true;
            seen[*b as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn draw_stays_in_bounds() {
        let hand = HandBuilder::open_palm(Handedness::Left)
            .build()
            .to_pixels(Resolution::new(64, 48));
        let mut image = Image::new(64, 48);
        hand.draw(&mut image, None);
        // Landmarks near the border must be clipped, not panic.
        let edge = HandBuilder::right()
            .at(LandmarkIdx::PinkyTip, -5.0, 1000.0)
            .build();
        edge.draw(&mut image, None);
    }
}
