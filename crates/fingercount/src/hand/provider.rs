//! Sources of [`HandObservation`]s.
//!
//! Hand localization and landmark regression are done by a pretrained network outside of this
//! crate. [`LandmarkProvider`] is the seam where its results enter; [`ReplayProvider`] feeds back
//! a recording of MediaPipe's hand landmarker output, one JSON object per frame:
//!
//! ```json
//! {"hands":[{"handedness":"Right","score":0.97,"landmarks":[{"x":0.51,"y":0.83,"z":0.0}, ...]}]}
//! ```

use std::io::BufRead;

use anyhow::Context;
use serde::Deserialize;

use crate::hand::fingers::{Mirror, ThumbRule};
use crate::hand::landmark::{HandObservation, Handedness};
use crate::image::Image;
use crate::landmark::Landmarks;

/// Detector settings, fixed when a provider is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderConfig {
    max_hands: usize,
    min_detection_confidence: f32,
    min_tracking_confidence: f32,
    mirror: Mirror,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            max_hands: 2,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            mirror: Mirror::Selfie,
        }
    }
}

impl ProviderConfig {
    /// Sets the maximum number of hands reported per frame.
    ///
    /// # Panics
    ///
    /// This method panics when `max_hands` is 0.
    pub fn max_hands(self, max_hands: usize) -> Self {
        assert!(max_hands > 0, "`max_hands` must be at least 1");
        Self { max_hands, ..self }
    }

    /// Sets the confidence a new hand needs in order to be reported.
    ///
    /// # Panics
    ///
    /// This method panics when `confidence` is outside of `0.0..=1.0` or NaN.
    pub fn min_detection_confidence(self, confidence: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&confidence),
            "detection confidence must be in range 0.0..=1.0"
        );
        Self {
            min_detection_confidence: confidence,
            ..self
        }
    }

    /// Sets the confidence below which a tracked hand is considered lost.
    ///
    /// # Panics
    ///
    /// This method panics when `confidence` is outside of `0.0..=1.0` or NaN.
    pub fn min_tracking_confidence(self, confidence: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&confidence),
            "tracking confidence must be in range 0.0..=1.0"
        );
        Self {
            min_tracking_confidence: confidence,
            ..self
        }
    }

    /// Sets the mirroring convention of the camera feed.
    pub fn mirror(self, mirror: Mirror) -> Self {
        Self { mirror, ..self }
    }

    /// Returns the thumb rule matching the configured mirroring convention.
    pub fn thumb_rule(&self) -> ThumbRule {
        ThumbRule::new(self.mirror)
    }
}

/// Trait for anything that can locate hands in a frame.
pub trait LandmarkProvider {
    /// Returns the hands visible in `frame`, with landmarks normalized to `[0, 1]`.
    ///
    /// Finding no hands is not an error.
    fn hands(&mut self, frame: &Image) -> anyhow::Result<Vec<HandObservation>>;
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: Option<String>,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct FrameJson {
    #[serde(default)]
    hands: Vec<HandJson>,
}

/// Replays recorded landmark provider output.
///
/// Every call to [`LandmarkProvider::hands`] consumes one line of the recording. Blank lines are
/// frames without hands. Once the recording is exhausted, no more hands are reported.
pub struct ReplayProvider<R> {
    reader: R,
    config: ProviderConfig,
    line_no: usize,
    line: String,
    tracking: bool,
}

impl<R: BufRead> ReplayProvider<R> {
    pub fn new(reader: R, config: ProviderConfig) -> Self {
        Self {
            reader,
            config,
            line_no: 0,
            line: String::new(),
            tracking: false,
        }
    }

    fn next_frame(&mut self) -> anyhow::Result<Option<FrameJson>> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let line = self.line.trim();
        if line.is_empty() {
            return Ok(Some(FrameJson { hands: Vec::new() }));
        }
        let frame = serde_json::from_str(line)
            .with_context(|| format!("malformed landmark recording at line {}", self.line_no))?;
        Ok(Some(frame))
    }

    fn convert(&self, hand: HandJson) -> Option<HandObservation> {
        if hand.landmarks.len() != HandObservation::NUM_LANDMARKS {
            log::warn!(
                "line {}: expected {} landmarks, got {}",
                self.line_no,
                HandObservation::NUM_LANDMARKS,
                hand.landmarks.len()
            );
            return None;
        }

        let handedness = match hand.handedness.as_deref().map(str::parse::<Handedness>) {
            Some(Ok(handedness)) => Some(handedness),
            Some(Err(e)) => {
                log::debug!("line {}: {}", self.line_no, e);
                None
            }
            None => None,
        };

        let landmarks = Landmarks::from(
            hand.landmarks
                .iter()
                .map(|lm| [lm.x, lm.y, lm.z])
                .collect::<Vec<_>>(),
        );
        let observation = HandObservation::new(landmarks, handedness).ok()?;
        Some(observation.with_presence(hand.score))
    }
}

impl<R: BufRead> LandmarkProvider for ReplayProvider<R> {
    fn hands(&mut self, frame: &Image) -> anyhow::Result<Vec<HandObservation>> {
        let Some(recorded) = self.next_frame()? else {
            log::trace!("landmark recording exhausted");
            return Ok(Vec::new());
        };

        // Tracking state is per frame, not per hand: if the previous frame had any hand, every hand
        // in this one is held to the tracking threshold, including hands that just appeared.
        let threshold = if self.tracking {
            self.config.min_tracking_confidence
        } else {
            self.config.min_detection_confidence
        };

        let mut hands = recorded
            .hands
            .into_iter()
            .filter(|hand| hand.score >= threshold)
            .filter_map(|hand| self.convert(hand))
            .collect::<Vec<_>>();
        hands.sort_by(|a, b| b.presence().total_cmp(&a.presence()));
        hands.truncate(self.config.max_hands);

        self.tracking = !hands.is_empty();
        log::trace!(
            "line {}: {} hand(s) in {}x{} frame",
            self.line_no,
            hands.len(),
            frame.width(),
            frame.height()
        );
        Ok(hands)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use approx::assert_relative_eq;

    use super::*;
    use crate::hand::landmark::LandmarkIdx;

    fn hand_json(handedness: &str, score: f32, count: usize) -> String {
        let landmarks = (0..count)
            .map(|i| format!(r#"{{"x":{},"y":0.5,"z":0.0}}"#, i as f32 / 100.0))
            .collect::<Vec<_>>()
            .join(",");
        format!(r#"{{"handedness":"{handedness}","score":{score},"landmarks":[{landmarks}]}}"#)
    }

    fn frame_json(hands: &[String]) -> String {
        format!(r#"{{"hands":[{}]}}"#, hands.join(","))
    }

    fn replay(lines: &[String], config: ProviderConfig) -> ReplayProvider<Cursor<String>> {
        ReplayProvider::new(Cursor::new(lines.join("\n")), config)
    }

    #[test]
    fn parses_hands() {
        let lines = [frame_json(&[hand_json("Left", 0.9, 21)])];
        let mut provider = replay(&lines, ProviderConfig::default());
        let hands = provider.hands(&Image::new(1, 1)).unwrap();

        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].handedness(), Some(Handedness::Left));
        assert_relative_eq!(hands[0].presence(), 0.9);
        assert_relative_eq!(hands[0].landmark(LandmarkIdx::PinkyTip).x(), 0.2);
    }

    #[test]
    fn empty_and_exhausted_frames() {
        let lines = [frame_json(&[]), String::new(), r#"{}"#.to_string()];
        let mut provider = replay(&lines, ProviderConfig::default());
        let frame = Image::new(1, 1);
        for _ in 0..5 {
            assert!(provider.hands(&frame).unwrap().is_empty());
        }
    }

    #[test]
    fn gating() {
        let lines = [frame_json(&[
            hand_json("Left", 0.3, 21),
            hand_json("Right", 0.7, 21),
            hand_json("Right", 0.95, 21),
            hand_json("Left", 0.8, 21),
            hand_json("Left", 0.99, 20),
        ])];

        let mut provider = replay(&lines, ProviderConfig::default().max_hands(2));
        let hands = provider.hands(&Image::new(1, 1)).unwrap();
        assert_eq!(hands.len(), 2);
        assert_relative_eq!(hands[0].presence(), 0.95);
        assert_relative_eq!(hands[1].presence(), 0.8);

        let mut provider = replay(
            &lines,
            ProviderConfig::default()
                .max_hands(4)
                .min_detection_confidence(0.1),
        );
        assert_eq!(provider.hands(&Image::new(1, 1)).unwrap().len(), 4);
    }

    #[test]
    fn tracking_threshold_applies_after_first_detection() {
        let lines = [
            frame_json(&[hand_json("Right", 0.6, 21)]),
            frame_json(&[hand_json("Right", 0.35, 21)]),
            frame_json(&[]),
            frame_json(&[hand_json("Right", 0.35, 21)]),
        ];
        let config = ProviderConfig::default()
            .min_detection_confidence(0.5)
            .min_tracking_confidence(0.3);
        let mut provider = replay(&lines, config);
        let frame = Image::new(1, 1);

        assert_eq!(provider.hands(&frame).unwrap().len(), 1);
        assert_eq!(provider.hands(&frame).unwrap().len(), 1);
        assert_eq!(provider.hands(&frame).unwrap().len(), 0);
        // Tracking was lost, so the detection threshold applies again.
        assert_eq!(provider.hands(&frame).unwrap().len(), 0);
    }

    #[test]
    fn tracking_threshold_covers_new_hands() {
        let lines = [
            frame_json(&[hand_json("Right", 0.9, 21)]),
            frame_json(&[hand_json("Right", 0.9, 21), hand_json("Left", 0.4, 21)]),
        ];
        let config = ProviderConfig::default()
            .min_detection_confidence(0.8)
            .min_tracking_confidence(0.3);
        let mut provider = replay(&lines, config);
        let frame = Image::new(1, 1);

        assert_eq!(provider.hands(&frame).unwrap().len(), 1);
        // The left hand was not seen before, but the frame is already being tracked.
        let hands = provider.hands(&frame).unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[1].handedness(), Some(Handedness::Left));
    }

    #[test]
    fn unknown_handedness_label() {
        let lines = [frame_json(&[hand_json("Ambidextrous", 0.9, 21)])];
        let mut provider = replay(&lines, ProviderConfig::default());
        let hands = provider.hands(&Image::new(1, 1)).unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].handedness(), None);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let lines = [frame_json(&[]), "{not json".to_string()];
        let mut provider = replay(&lines, ProviderConfig::default());
        let frame = Image::new(1, 1);
        provider.hands(&frame).unwrap();
        let err = provider.hands(&frame).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    #[should_panic]
    fn rejects_confidence_out_of_range() {
        let _ = ProviderConfig::default().min_detection_confidence(1.5);
    }

    #[test]
    #[should_panic]
    fn rejects_zero_hands() {
        let _ = ProviderConfig::default().max_hands(0);
    }

    #[test]
    fn thumb_rule_follows_mirror() {
        let config = ProviderConfig::default();
        assert_eq!(config.thumb_rule().mirror(), Mirror::Selfie);
        let config = config.mirror(Mirror::World);
        assert_eq!(config.thumb_rule().mirror(), Mirror::World);
    }
}
