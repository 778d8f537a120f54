//! Example: Calibrate a sensor and save the expansion factors
//!
//! Runs a WAV file through the pipeline in calibration mode and writes the
//! resulting calibration profile as JSON.
//!
//! Usage: cargo run --example calibrate -- <file.wav> <profile.json>

use audio_sensor::{AudioSampler, BlockCapture, SamplingPipeline, SensorConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let wav_path = args.next().ok_or("usage: calibrate <file.wav> <profile.json>")?;
    let profile_path = args.next().ok_or("usage: calibrate <file.wav> <profile.json>")?;

    let mut reader = hound::WavReader::open(&wav_path)?;
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

    let mut config = SensorConfig::default();
    config.set_normalize(true);

    let mut pipeline = SamplingPipeline::new(config, BlockCapture::new(spec.sample_rate));
    pipeline.set_sampling_enabled(true);
    pipeline.set_calibrating(true);

    let step_frames = (spec.sample_rate as f32 * pipeline.config().step_duration_secs()) as usize;
    let chunk_len = step_frames.max(1) * spec.channels as usize;

    let mut steps = 0;
    let mut clipping_steps = 0;
    for chunk in samples.chunks(chunk_len) {
        match spec.channels {
            1 => pipeline.capture_mut().push_mono(chunk),
            _ => pipeline.capture_mut().push_interleaved(chunk),
        }
        if let Some(report) = pipeline.step()?.report() {
            steps += 1;
            if report.clipping {
                clipping_steps += 1;
            }
        }
    }

    let profile = pipeline.calibration_profile();
    std::fs::write(&profile_path, serde_json::to_string_pretty(&profile)?)?;

    println!("Calibration Results:");
    println!("  Steps: {} ({} clipping)", steps, clipping_steps);
    println!("  Factors: {}", profile.expansion_factors.len());
    println!(
        "  Max factor: {:.2}",
        profile.expansion_factors.iter().copied().fold(0.0f32, f32::max)
    );
    println!("  Saved to {}", profile_path);

    Ok(())
}
