//! Example: Sample a WAV file step by step
//!
//! Feeds a WAV file into a block capture in 20 ms chunks and prints a report
//! for every sampling step.
//!
//! Usage: cargo run --example sample_wav -- <file.wav> [spectrum|amplitude]

use audio_sensor::{AudioSampler, BlockCapture, SampleType, SamplingPipeline, SensorConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: sample_wav <file.wav> [spectrum|amplitude]")?;
    let sample_type = match args.next().as_deref() {
        Some("amplitude") => SampleType::Amplitude,
        _ => SampleType::Spectrum,
    };

    let mut reader = hound::WavReader::open(&path)?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    // Configure sensor
    let mut config = SensorConfig::default();
    config.set_sample_type(sample_type);
    config.set_buffer_length(8);

    let mut pipeline = SamplingPipeline::new(config, BlockCapture::new(spec.sample_rate));
    pipeline.set_sampling_enabled(true);
    println!("{}", pipeline.shape());

    let step_frames = (spec.sample_rate as f32 * pipeline.config().step_duration_secs()) as usize;
    let chunk_len = step_frames.max(1) * spec.channels as usize;

    for chunk in samples.chunks(chunk_len) {
        match spec.channels {
            1 => pipeline.capture_mut().push_mono(chunk),
            _ => pipeline.capture_mut().push_interleaved(chunk),
        }
        let outcome = pipeline.step()?;
        if let Some(report) = outcome.report() {
            let [left, right] = pipeline.rms_level();
            println!(
                "  step {:>2}  complete: {:<5}  rms: {:.3} / {:.3}",
                report.step_index, report.window_complete, left, right
            );
        }
    }

    Ok(())
}
