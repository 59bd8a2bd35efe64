use std::{env, fs::File, io::BufReader};

use anyhow::{bail, Context};
use fingercount::{
    gui::ImageDirSink,
    hand::{
        fingers::Mirror,
        provider::{ProviderConfig, ReplayProvider},
    },
    pipeline::CountingPipeline,
    video::sequence::ImageSequence,
};

const USAGE: &str =
    "usage: fingercount <frames-dir> <landmarks.jsonl> <out-dir> [--world] [--frames N]";

/// Maximum number of hands to count per frame.
const MAX_HANDS: usize = 2;
/// Minimum score of a hand that was not present in the previous frame.
const MIN_DETECTION_CONFIDENCE: f32 = 0.5;
/// Minimum score of a hand while hands are being tracked.
const MIN_TRACKING_CONFIDENCE: f32 = 0.5;

fn main() -> anyhow::Result<()> {
    fingercount::init_logger!();

    let mut mirror = Mirror::Selfie;
    let mut frame_limit = None;
    let mut positional = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--world" => mirror = Mirror::World,
            "--frames" => {
                let value = args
                    .next()
                    .with_context(|| format!("'--frames' needs a value\n{USAGE}"))?;
                let limit = value
                    .parse::<usize>()
                    .with_context(|| format!("invalid frame count '{value}'"))?;
                if limit == 0 {
                    bail!("'--frames' must be at least 1");
                }
                frame_limit = Some(limit);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(());
            }
            flag if flag.starts_with("--") => bail!("unknown flag '{flag}'\n{USAGE}"),
            other => positional.push(other.to_string()),
        }
    }
    let [frames, landmarks, out] = <[String; 3]>::try_from(positional)
        .map_err(|args| anyhow::anyhow!("expected 3 arguments, got {}\n{USAGE}", args.len()))?;

    let config = ProviderConfig::default()
        .max_hands(MAX_HANDS)
        .min_detection_confidence(MIN_DETECTION_CONFIDENCE)
        .min_tracking_confidence(MIN_TRACKING_CONFIDENCE)
        .mirror(mirror);

    let recording = File::open(&landmarks)
        .with_context(|| format!("failed to open landmark recording '{landmarks}'"))?;
    let provider = ReplayProvider::new(BufReader::new(recording), config);

    let mut source = ImageSequence::open(&frames)?;
    let mut sink = ImageDirSink::create(&out)?;
    if let Some(limit) = frame_limit {
        sink = sink.limit(limit);
    }
    let mut pipeline = CountingPipeline::new(provider, &config);

    let processed = pipeline.run(&mut source, &mut sink)?;
    log::info!("wrote {processed} annotated frames to '{out}'");

    Ok(())
}
