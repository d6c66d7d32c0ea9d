/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/
//! Simulates the frame loop of a visualization host: every frame, a synthetic
//! byte spectrum with a four-on-the-floor kick drum (120 BPM at 60 FPS) and
//! random hi-hats is aggregated and fed into a peak detector. Run with
//! `cargo run --example synthetic-spectrum`.

use log::LevelFilter;
use rand::Rng;
use spectral_peak::{
    NamedBand, PeakDetector, PeakDetectorConfig, SpectralAggregator,
    DEFAULT_MIN_CENTER_FREQUENCY_HZ,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SAMPLE_RATE_HZ: f32 = 44100.0;
const BIN_COUNT: usize = 1024;
const FRAMES_PER_SECOND: usize = 60;
/// 120 BPM at 60 FPS.
const FRAMES_PER_BEAT: usize = 30;

fn init_logger() {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .with_colors(true)
        .with_utc_timestamps()
        .init()
        .unwrap();
}

/// Creates the byte spectrum of one frame.
fn synthesize_frame(frame: usize, rng: &mut impl Rng) -> Vec<u8> {
    let mut bins = (0..BIN_COUNT)
        .map(|_| rng.random_range(0..12_u8))
        .collect::<Vec<_>>();

    // Kick drum: loud bass that fades out.
    let phase = (frame % FRAMES_PER_BEAT) as i32;
    let kick = 250.0 * 0.75_f32.powi(phase);
    bins[..7].iter_mut().for_each(|bin| *bin = bin.saturating_add(kick as u8));

    // Hi-hat: occasional broadband noise in the treble range.
    if rng.random_bool(0.2) {
        bins[240..640]
            .iter_mut()
            .for_each(|bin| *bin = bin.saturating_add(rng.random_range(40..120)));
    }
    bins
}

fn main() {
    init_logger();

    let config = PeakDetectorConfig::default()
        .with_frequency_range(20.0, 140.0)
        .unwrap()
        .with_frames_per_peak(FRAMES_PER_BEAT as u32 / 2);
    let mut detector = PeakDetector::new(config);

    let beats = Arc::new(AtomicUsize::new(0));
    let beats_cpy = beats.clone();
    detector.on_peak_with(
        move |energy, label: &String| {
            let beat = beats_cpy.fetch_add(1, Ordering::SeqCst) + 1;
            println!("{label} #{beat}: energy={energy:.3}");
        },
        String::from("kick"),
    );

    let mut rng = rand::rng();
    for frame in 0..(FRAMES_PER_SECOND * 4) {
        let bins = synthesize_frame(frame, &mut rng);
        let spectrum = SpectralAggregator::new(&bins, SAMPLE_RATE_HZ).unwrap();

        detector.update_from_spectrum(&spectrum);

        if frame % FRAMES_PER_SECOND == 0 {
            let bands = spectrum
                .octave_bands(1, DEFAULT_MIN_CENTER_FREQUENCY_HZ)
                .unwrap();
            log::info!(
                "frame {frame}: centroid={:.0} Hz, treble={:.1}, octaves={:?}",
                spectrum.spectral_centroid(),
                spectrum.energy_of_band(NamedBand::Treble),
                spectrum
                    .log_averages(&bands)
                    .unwrap()
                    .iter()
                    .map(|avg| *avg as u8)
                    .collect::<Vec<_>>()
            );
        }
    }

    println!(
        "Detected {} kicks in {} frames",
        beats.load(Ordering::SeqCst),
        detector.frame_count()
    );
}
