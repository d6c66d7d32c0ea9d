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

//! spectral-peak derives higher-level information from the frequency bins of
//! an audio spectrum, as produced once per frame by an external FFT engine:
//!
//! - **Aggregation** ([`SpectralAggregator`]): energy at a frequency, in a
//!   frequency range, or in a [`NamedBand`] such as the bass; the spectral
//!   centroid; linear band averages; averages over 1/n-octave bands
//!   ([`octave_bands`]).
//! - **Peak detection** ([`PeakDetector`]): a frame-synchronous onset
//!   detector that fires when the energy of a frequency range rises sharply
//!   above a self-adjusting baseline.
//!
//! This crate never performs the Fourier transform itself. It neither
//! captures audio nor talks to audio devices.
//!
//! ## Example
//! ```rust
//! use spectral_peak::{PeakDetector, PeakDetectorConfig, SpectralAggregator};
//!
//! // Byte frequency bins (0..=255) of the latest frame from your FFT engine.
//! let bins = [0_u8; 512];
//! let spectrum = SpectralAggregator::new(&bins, 44100.0).unwrap();
//!
//! let centroid_hz = spectrum.spectral_centroid();
//! let bars = spectrum.linear_averages(16).unwrap();
//!
//! let mut detector = PeakDetector::new(PeakDetectorConfig::default());
//! detector.on_peak(|energy| println!("peak with energy {energy}"));
//! // Call this once per frame.
//! let peak = detector.update_from_spectrum(&spectrum);
//! assert!(peak.is_none());
//! ```
//!
//! ## Representation of frequency bins
//! All aggregations accept normalized `f32` magnitudes as well as `u8`
//! magnitudes in range `0..=255`, see [`Magnitude`]. Results are reported in
//! the units of the representation.

#![no_std]
#![deny(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    // clippy::restriction,
    // clippy::pedantic
)]
// now allow a few rules which are denied by the above statement
// --> they are ridiculous and not necessary
#![allow(
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::fallible_impl_from
)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::all)]

extern crate alloc;

#[cfg_attr(test, macro_use)]
#[cfg(test)]
extern crate std;

#[cfg(test)]
#[macro_use]
extern crate assert2;

#[cfg(test)]
#[macro_use]
extern crate float_cmp;

mod averaging;
mod band;
mod f32;
mod magnitude;
mod peak_detector;
mod spectral_aggregator;

#[cfg(test)]
mod test_utils;

pub use averaging::Averaging;
pub use band::{
    octave_bands, FrequencyBand, NamedBand, DEFAULT_MIN_CENTER_FREQUENCY_HZ,
    DEFAULT_OCTAVE_DIVISION,
};
pub use f32::{F32Energy, F32Frequency, InvalidF32Error};
pub use magnitude::Magnitude;
pub use peak_detector::{
    InvalidConfigError, PeakDetector, PeakDetectorConfig, PeakInfo, CUTOFF_MULTIPLIER, DECAY_RATE,
};
pub use spectral_aggregator::{
    FrequencyInput, SpectralAggregator, SpectrumError, DEFAULT_LINEAR_GROUPS,
};
