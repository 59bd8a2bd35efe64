//! The frame loop: acquire, locate hands, count fingers, draw, show.

use crate::count::{count_frame, FrameCount};
use crate::gui::{Control, RenderSink};
use crate::hand::fingers::ThumbRule;
use crate::hand::provider::{LandmarkProvider, ProviderConfig};
use crate::image::{draw, Color, Image};
use crate::timer::{FpsCounter, Timer};
use crate::video::FrameSource;

/// Counts raised fingers in every frame and overlays the result.
pub struct CountingPipeline<P> {
    provider: P,
    rule: ThumbRule,
    t_hands: Timer,
    t_count: Timer,
    t_draw: Timer,
}

impl<P: LandmarkProvider> CountingPipeline<P> {
    /// Creates a pipeline around `provider`.
    ///
    /// `config` should be the configuration the provider was created with; the pipeline uses its
    /// mirroring convention for the thumb.
    pub fn new(provider: P, config: &ProviderConfig) -> Self {
        Self {
            provider,
            rule: config.thumb_rule(),
            t_hands: Timer::new("hands"),
            t_count: Timer::new("count"),
            t_draw: Timer::new("draw"),
        }
    }

    /// Returns profiling timers of the pipeline stages.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_hands, &self.t_count, &self.t_draw].into_iter()
    }

    /// Processes a single frame: counts the raised fingers and draws hands and count onto it.
    pub fn process(&mut self, frame: &mut Image) -> anyhow::Result<FrameCount> {
        let hands = self.t_hands.time(|| self.provider.hands(frame))?;
        let count = self.t_count.time(|| count_frame(&hands, self.rule));
        log::trace!("{} hand(s), {}", hands.len(), count);

        let _guard = self.t_draw.start();
        let res = frame.resolution();
        for (hand, outcome) in hands.iter().zip(count.hands()) {
            hand.to_pixels(res).draw(frame, outcome.as_ref().ok());
        }
        let label = count.to_string();
        draw::text(frame, 10, 10, &label)
            .align_left()
            .align_top()
            .large()
            .color(Color::MAGENTA);

        Ok(count)
    }

    /// Runs the loop until `source` runs out of frames or `sink` asks to stop.
    ///
    /// Returns the number of processed frames.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> anyhow::Result<usize>
    where
        S: FrameSource,
        K: RenderSink,
    {
        let mut fps = FpsCounter::new("fingercount");
        let mut frames = 0;
        while let Some(mut frame) = source.read()? {
            let count = self.process(&mut frame)?;
            log::debug!("frame {frames}: {count}");
            frames += 1;

            let control = sink.show(&frame)?;
            fps.tick_with(self.timers().chain(source.timers()));
            if control == Control::Stop {
                log::info!("sink requested stop after {frames} frames");
                break;
            }
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::hand::fingers::Mirror;
    use crate::hand::landmark::{HandObservation, Handedness};
    use crate::test::HandBuilder;

    /// Provider returning pre-built observations, one batch per frame.
    struct Scripted(VecDeque<Vec<HandObservation>>);

    impl LandmarkProvider for Scripted {
        fn hands(&mut self, _: &Image) -> anyhow::Result<Vec<HandObservation>> {
            Ok(self.0.pop_front().unwrap_or_default())
        }
    }

    struct Frames(usize);

    impl FrameSource for Frames {
        fn read(&mut self) -> anyhow::Result<Option<Image>> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Ok(Some(Image::new(64, 48)))
        }
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn read(&mut self) -> anyhow::Result<Option<Image>> {
            anyhow::bail!("camera read failed")
        }
    }

    #[derive(Default)]
    struct Collect {
        shown: usize,
        stop_after: Option<usize>,
    }

    impl RenderSink for Collect {
        fn show(&mut self, _: &Image) -> anyhow::Result<Control> {
            self.shown += 1;
            Ok(match self.stop_after {
                Some(n) if self.shown >= n => Control::Stop,
                _ => Control::Continue,
            })
        }
    }

    fn scripted(batches: Vec<Vec<HandObservation>>) -> Scripted {
        Scripted(batches.into())
    }

    #[test]
    fn process_counts_and_draws() {
        let provider = scripted(vec![vec![
            HandBuilder::open_palm(Handedness::Right).build(),
            HandBuilder::fist(Handedness::Left).build(),
        ]]);
        let mut pipeline = CountingPipeline::new(provider, &ProviderConfig::default());

        let mut frame = Image::new(64, 48);
        let count = pipeline.process(&mut frame).unwrap();
        assert_eq!(count.total(), 5);
        // Both wrists sit at normalized (0.5, 0.8).
        assert_ne!(frame.get(32, 38), Color::NULL);
        // Palm center of the right hand, normalized (0.497, 0.62).
        assert_eq!(frame.get(32, 30), Color::BLUE);

        let count = pipeline.process(&mut Image::new(64, 48)).unwrap();
        assert_eq!(count.total(), 0);
    }

    #[test]
    fn mirror_config_reaches_classifier() {
        let hand = HandBuilder::open_palm(Handedness::Right).build();
        let config = ProviderConfig::default().mirror(Mirror::World);
        let mut pipeline = CountingPipeline::new(scripted(vec![vec![hand]]), &config);
        assert_eq!(pipeline.process(&mut Image::new(8, 8)).unwrap().total(), 4);
    }

    #[test]
    fn run_until_source_is_exhausted() {
        let mut pipeline = CountingPipeline::new(scripted(vec![]), &ProviderConfig::default());
        let mut sink = Collect::default();
        assert_eq!(pipeline.run(&mut Frames(3), &mut sink).unwrap(), 3);
        assert_eq!(sink.shown, 3);
    }

    #[test]
    fn run_until_sink_stops() {
        let mut pipeline = CountingPipeline::new(scripted(vec![]), &ProviderConfig::default());
        let mut sink = Collect {
            stop_after: Some(2),
            ..Default::default()
        };
        assert_eq!(pipeline.run(&mut Frames(10), &mut sink).unwrap(), 2);
    }

    #[test]
    fn source_errors_propagate() {
        let mut pipeline = CountingPipeline::new(scripted(vec![]), &ProviderConfig::default());
        let err = pipeline
            .run(&mut FailingSource, &mut Collect::default())
            .unwrap_err();
        assert!(err.to_string().contains("camera read failed"));
    }
}
