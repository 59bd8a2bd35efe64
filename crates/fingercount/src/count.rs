//! Per-frame aggregation of raised fingers.

use std::fmt;

use rayon::prelude::*;

use crate::hand::fingers::{classify_observation, ClassifyError, FingerStates, ThumbRule};
use crate::hand::landmark::HandObservation;

/// The number of raised fingers across all hands of one frame.
///
/// Each frame is counted from scratch; nothing is carried over from previous frames.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameCount {
    total: usize,
    hands: Vec<Result<FingerStates, ClassifyError>>,
}

impl FrameCount {
    fn from_outcomes(hands: Vec<Result<FingerStates, ClassifyError>>) -> Self {
        let mut total = 0;
        for (i, outcome) in hands.iter().enumerate() {
            match outcome {
                Ok(states) => total += states.count(),
                Err(e) => log::warn!("skipping hand #{i} in this frame: {e}"),
            }
        }
        Self { total, hands }
    }

    /// Total number of extended fingers.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Classification result of each hand, in the order the hands were passed in.
    ///
    /// Hands that could not be classified contribute nothing to [`FrameCount::total`].
    pub fn hands(&self) -> &[Result<FingerStates, ClassifyError>] {
        &self.hands
    }

    /// Number of hands that were classified successfully.
    pub fn classified_hands(&self) -> usize {
        self.hands.iter().filter(|outcome| outcome.is_ok()).count()
    }
}

impl fmt::Display for FrameCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingers: {}", self.total)
    }
}

/// Classifies every hand and sums up their extended fingers.
///
/// A hand that cannot be classified (eg. because its handedness is unknown) is skipped for this
/// frame. No hands at all results in a count of 0.
pub fn count_frame(hands: &[HandObservation], rule: ThumbRule) -> FrameCount {
    FrameCount::from_outcomes(
        hands
            .iter()
            .map(|hand| classify_observation(hand, rule))
            .collect(),
    )
}

/// Like [`count_frame`], but classifies the hands in parallel.
///
/// Hands are independent of each other, so the result is always identical to [`count_frame`].
pub fn count_frame_par(hands: &[HandObservation], rule: ThumbRule) -> FrameCount {
    FrameCount::from_outcomes(
        hands
            .par_iter()
            .map(|hand| classify_observation(hand, rule))
            .collect(),
    )
}
