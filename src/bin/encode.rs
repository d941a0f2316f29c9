//! Encode Demo Application
//!
//! Pushes a generated test tone through a feed and writes the encoder's
//! output stream to a file.
//!
//! ```text
//! stream-encode <output> [seconds] [format]
//! ```
//!
//! The container is guessed from the output filename unless `format` names
//! one. Remaining settings come from the per-user config file.

use anyhow::{bail, Context, Result};
use std::f32::consts::TAU;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stream_encoder::{
    audio::{AudioFormat, Buffer},
    sink::Feed,
    EncodedRead, Encoder, EncoderConfig,
};

const TONE_HZ: f32 = 440.0;
const CHUNK_FRAMES: usize = 1024;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(output) = args.next() else {
        bail!("usage: stream-encode <output> [seconds] [format]");
    };
    let seconds: f64 = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid duration: {}", s))?,
        None => 5.0,
    };

    let mut config = EncoderConfig::load_or_default()?;
    config.filename = Some(output.clone());
    if let Some(format) = args.next() {
        config.format_short_name = Some(format);
    }

    let feed = Arc::new(Feed::new());
    let mut encoder = Encoder::with_config(config);
    encoder.attach(feed.clone())?;

    let format = encoder
        .actual_format()
        .context("encoder attached without a negotiated format")?;
    tracing::info!("Encoding {:.1}s of {} Hz tone to {}", seconds, TONE_HZ, output);

    let producer = {
        let feed = feed.clone();
        std::thread::Builder::new()
            .name("tone".into())
            .spawn(move || push_tone(&feed, format, seconds))?
    };

    let mut file = BufWriter::new(File::create(&output).with_context(|| format!("creating {}", output))?);
    let start = Instant::now();
    let mut written = 0usize;
    loop {
        match encoder.get_buffer(true) {
            EncodedRead::Data(buffer) => {
                file.write_all(buffer.data())?;
                written += buffer.size();
            }
            EncodedRead::EndOfStream => break,
            EncodedRead::NoData => bail!("encoder stopped before end of stream"),
        }
    }
    file.flush()?;

    if producer.join().is_err() {
        bail!("tone thread panicked");
    }
    encoder.detach();

    let stats = encoder.stats();
    tracing::info!(
        "Wrote {} bytes in {:?} ({} frames, {} packets, {} dropped)",
        written,
        start.elapsed(),
        stats.frames_encoded,
        stats.packets_written,
        stats.frames_dropped
    );
    Ok(())
}

fn push_tone(feed: &Feed, format: AudioFormat, seconds: f64) {
    let item = feed.new_item();
    let channels = format.channels();
    let rate = format.sample_rate as f32;
    let total = (seconds * format.sample_rate as f64) as usize;

    let mut frame = 0usize;
    let mut samples = Vec::with_capacity(CHUNK_FRAMES * channels);
    while frame < total {
        let count = CHUNK_FRAMES.min(total - frame);
        samples.clear();
        for n in frame..frame + count {
            let value = 0.5 * (TAU * TONE_HZ * n as f32 / rate).sin();
            samples.extend(std::iter::repeat(value).take(channels));
        }

        let position = frame as f64 / format.sample_rate as f64;
        feed.push(Buffer::from_f32(Some(item), position, format, &samples));
        frame += count;
    }

    feed.end_of_stream();
}
