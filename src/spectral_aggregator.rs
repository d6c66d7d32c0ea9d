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
//! Module for [`SpectralAggregator`].
//!
//! All aggregations are computed on demand from the frequency bins of the
//! current frame. Nothing is cached between calls.

use crate::averaging::{Accumulator, Averaging};
use crate::band::{octave_bands, FrequencyBand, NamedBand};
use crate::f32::{F32Frequency, InvalidF32Error};
use crate::magnitude::Magnitude;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::str::FromStr;
use thiserror::Error;

/// Number of groups of [`SpectralAggregator::linear_averages`] when `0` is
/// passed.
pub const DEFAULT_LINEAR_GROUPS: usize = 16;

/// Possible errors when aggregating frequency bins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrumError {
    /// The input is neither a valid frequency nor a known band name.
    #[error("invalid frequency input: {0:?} is neither a frequency (Hz) nor a band name")]
    InvalidFrequencyInput(String),
    #[error("the spectrum must have at least one frequency bin")]
    EmptySpectrum,
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),
    #[error("can't partition {bins} bins into {groups} groups")]
    InvalidGroupCount { groups: usize, bins: usize },
    #[error("at least one frequency band is required")]
    NoBands,
    /// The bands end before the frequency of the given bin. They must cover
    /// the spectrum up to Nyquist.
    #[error("all {bands} bands are exhausted at bin {bin} ({frequency_hz} Hz)")]
    BandsExhausted {
        bands: usize,
        bin: usize,
        frequency_hz: f32,
    },
    #[error(
        "the octave division and the minimum center frequency must let the band centers grow"
    )]
    InvalidOctaveDivision,
    #[error("the f32 value is not a valid frequency value")]
    InvalidF32(#[from] InvalidF32Error),
}

/// First argument of [`SpectralAggregator::energy_in_range`]: either a
/// frequency or one of the predefined [`NamedBand`]s.
///
/// Parsing from a string first checks the band names and then falls back to
/// a number, so `"bass"` and `"440"` are both valid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FrequencyInput {
    /// A frequency in Hertz.
    Hz(f32),
    /// A named band. Expands to its fixed `(low, high)` pair.
    Band(NamedBand),
}

impl From<f32> for FrequencyInput {
    fn from(value: f32) -> Self {
        Self::Hz(value)
    }
}

impl From<NamedBand> for FrequencyInput {
    fn from(value: NamedBand) -> Self {
        Self::Band(value)
    }
}

impl FromStr for FrequencyInput {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(band) = s.parse::<NamedBand>() {
            return Ok(Self::Band(band));
        }
        s.trim()
            .parse::<f32>()
            .map(Self::Hz)
            .map_err(|_| SpectrumError::InvalidFrequencyInput(s.to_string()))
    }
}

/// Computes aggregated values over the frequency bins of one frame, as
/// produced by an external spectrum analysis (FFT) engine.
///
/// The bins are ordered from the lowest to the highest frequency and span
/// `0..nyquist`. The aggregator only borrows them, so it is cheap to create a
/// new one for every frame.
///
/// ## Example
/// ```rust
/// use spectral_peak::{FrequencyInput, NamedBand, SpectralAggregator};
///
/// // Typically, these are the byte frequency bins of your FFT engine.
/// let bins: [u8; 8] = [200, 180, 90, 40, 20, 10, 5, 0];
/// let spectrum = SpectralAggregator::new(&bins, 44100.0).unwrap();
///
/// let bass = spectrum.energy_of_band(NamedBand::Bass);
/// let bass_input = "bass".parse::<FrequencyInput>().unwrap();
/// let same = spectrum.energy_in_range(bass_input, None);
/// assert_eq!(Ok(bass), same);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SpectralAggregator<'a, T: Magnitude> {
    bins: &'a [T],
    nyquist_hz: f32,
}

impl<'a, T: Magnitude> SpectralAggregator<'a, T> {
    /// Creates a new aggregator over the bins of the current frame. The
    /// Nyquist frequency is derived as `sample_rate_hz / 2`.
    pub fn new(bins: &'a [T], sample_rate_hz: f32) -> Result<Self, SpectrumError> {
        if bins.is_empty() {
            return Err(SpectrumError::EmptySpectrum);
        }
        let sample_rate = F32Frequency::try_from(sample_rate_hz)
            .map_err(|_| SpectrumError::InvalidSampleRate(sample_rate_hz))?;
        if sample_rate.raw() == 0.0 {
            return Err(SpectrumError::InvalidSampleRate(sample_rate_hz));
        }

        Ok(Self {
            bins,
            nyquist_hz: sample_rate.raw() / 2.0,
        })
    }

    /// Returns the underlying frequency bins.
    #[must_use]
    pub const fn bins(&self) -> &'a [T] {
        self.bins
    }

    /// Returns the number of frequency bins.
    #[must_use]
    pub const fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Returns the Nyquist frequency, i.e., the highest frequency the bins
    /// represent.
    #[must_use]
    pub const fn nyquist_hz(&self) -> f32 {
        self.nyquist_hz
    }

    /// Returns the width of a single bin in Hertz.
    #[must_use]
    pub fn bin_width_hz(&self) -> f32 {
        self.nyquist_hz / self.bins.len() as f32
    }

    /// Maps a frequency to the nearest bin: `round(freq / nyquist * bins)`.
    ///
    /// Frequencies at or above Nyquist map to the last bin.
    #[must_use]
    pub fn frequency_to_index(&self, frequency_hz: f32) -> usize {
        let len = self.bins.len();
        let index = libm::roundf(frequency_hz / self.nyquist_hz * len as f32);
        // Saturating cast: negative values become 0.
        let index = index as usize;
        if index >= len {
            log::debug!(
                "{frequency_hz} Hz is not below nyquist ({} Hz), using the last bin",
                self.nyquist_hz
            );
            len - 1
        } else {
            index
        }
    }

    /// Returns the energy (magnitude) at a frequency or in a frequency range.
    ///
    /// - `low` is a [`NamedBand`]: returns the average over its fixed range.
    ///   `high_hz` is ignored.
    /// - `low` is a frequency and `high_hz` is `None`: returns the value of
    ///   the single bin nearest to that frequency.
    /// - `low` is a frequency and `high_hz` is `Some`: returns the arithmetic
    ///   mean over all bins in the inclusive index range of both frequencies.
    ///   The order of both frequencies doesn't matter.
    ///
    /// The result is in the units of the bin representation `T`.
    pub fn energy_in_range(
        &self,
        low: impl Into<FrequencyInput>,
        high_hz: Option<f32>,
    ) -> Result<f32, SpectrumError> {
        match low.into() {
            FrequencyInput::Band(band) => Ok(self.energy_of_band(band)),
            FrequencyInput::Hz(frequency) => {
                let frequency = validate_frequency(frequency)?;
                match high_hz {
                    None => Ok(self.bins[self.frequency_to_index(frequency)].to_f32()),
                    Some(high) => Ok(self.mean_between(frequency, validate_frequency(high)?)),
                }
            }
        }
    }

    /// Returns the value of the single bin nearest to `frequency_hz`.
    pub fn energy_at(&self, frequency_hz: f32) -> Result<f32, SpectrumError> {
        self.energy_in_range(frequency_hz, None)
    }

    /// Returns the average over the bins between both frequencies.
    pub fn energy_between(&self, low_hz: f32, high_hz: f32) -> Result<f32, SpectrumError> {
        self.energy_in_range(low_hz, Some(high_hz))
    }

    /// Returns the average over the bins of the given [`NamedBand`].
    #[must_use]
    pub fn energy_of_band(&self, band: NamedBand) -> f32 {
        let (low, high) = band.range_hz();
        self.mean_between(low, high)
    }

    /// Arithmetic mean over the inclusive bin range. Frequencies must be
    /// valid.
    pub(crate) fn mean_between(&self, a_hz: f32, b_hz: f32) -> f32 {
        let (low, high) = if a_hz > b_hz { (b_hz, a_hz) } else { (a_hz, b_hz) };
        let low_index = self.frequency_to_index(low);
        let high_index = self.frequency_to_index(high);
        let range = &self.bins[low_index..=high_index];
        let total = range.iter().map(|bin| bin.to_f32()).sum::<f32>();
        total / range.len() as f32
    }

    /// Returns the spectral centroid in Hertz, i.e., the magnitude-weighted
    /// mean frequency. Returns `0.0` for a silent spectrum.
    #[must_use]
    pub fn spectral_centroid(&self) -> f32 {
        // f64 keeps the weighted sum exact for large byte spectra.
        let (weighted_sum, total) = self.bins.iter().enumerate().fold(
            (0.0_f64, 0.0_f64),
            |(weighted_sum, total), (index, bin)| {
                let magnitude = f64::from(bin.to_f32());
                (weighted_sum + index as f64 * magnitude, total + magnitude)
            },
        );

        let mean_index = if total == 0.0 {
            0.0
        } else {
            weighted_sum / total
        };
        (mean_index * f64::from(self.bin_width_hz())) as f32
    }

    /// Partitions the bins into `group_count` contiguous groups of equal
    /// width (`bins / group_count`) and summarizes each group with a running
    /// pairwise average (see [`Averaging::RunningPairwise`]).
    ///
    /// `group_count == 0` selects [`DEFAULT_LINEAR_GROUPS`]. Bins that don't
    /// fill a whole group are folded into the last group, so the result
    /// always has `group_count` values.
    pub fn linear_averages(&self, group_count: usize) -> Result<Vec<f32>, SpectrumError> {
        self.linear_averages_with(group_count, Averaging::RunningPairwise)
    }

    /// Like [`Self::linear_averages`] but with a custom [`Averaging`] mode.
    pub fn linear_averages_with(
        &self,
        group_count: usize,
        averaging: Averaging,
    ) -> Result<Vec<f32>, SpectrumError> {
        let group_count = if group_count == 0 {
            DEFAULT_LINEAR_GROUPS
        } else {
            group_count
        };
        let len = self.bins.len();
        if group_count > len {
            return Err(SpectrumError::InvalidGroupCount {
                groups: group_count,
                bins: len,
            });
        }

        let step = len / group_count;
        let mut groups = vec![Accumulator::new(averaging); group_count];
        for (index, bin) in self.bins.iter().enumerate() {
            let group = (index / step).min(group_count - 1);
            groups[group].push(bin.to_f32());
        }

        // Each group has at least one bin as `step >= 1`.
        Ok(groups.iter().map(|acc| acc.get().unwrap_or(0.0)).collect())
    }

    /// Summarizes the bins per frequency band, typically bands created by
    /// [`Self::octave_bands`]. The bands must be ascending and must not
    /// overlap.
    ///
    /// The bins are walked in order; whenever the (rounded) frequency of a
    /// bin is above the upper edge of the current band, the walk moves on to
    /// the next band. It moves on by at most one band per bin. Bins below the
    /// first band count towards the first band. Bands that no bin reached
    /// report `0.0`.
    ///
    /// Fails with [`SpectrumError::BandsExhausted`] if the bands end before
    /// the last bin.
    pub fn log_averages(&self, bands: &[FrequencyBand]) -> Result<Vec<f32>, SpectrumError> {
        self.log_averages_with(bands, Averaging::RunningPairwise)
    }

    /// Like [`Self::log_averages`] but with a custom [`Averaging`] mode.
    pub fn log_averages_with(
        &self,
        bands: &[FrequencyBand],
        averaging: Averaging,
    ) -> Result<Vec<f32>, SpectrumError> {
        if bands.is_empty() {
            return Err(SpectrumError::NoBands);
        }

        let len = self.bins.len() as f32;
        let mut averages = vec![Accumulator::new(averaging); bands.len()];
        let mut band_index = 0;
        for (index, bin) in self.bins.iter().enumerate() {
            let frequency_hz = libm::roundf(index as f32 * self.nyquist_hz / len);
            if frequency_hz > bands[band_index].hi() {
                band_index += 1;
                if band_index == bands.len() {
                    return Err(SpectrumError::BandsExhausted {
                        bands: bands.len(),
                        bin: index,
                        frequency_hz,
                    });
                }
            }
            averages[band_index].push(bin.to_f32());
        }

        Ok(averages.iter().map(|acc| acc.get().unwrap_or(0.0)).collect())
    }

    /// Generates 1/`n`-octave bands from `min_center_frequency_hz` up to the
    /// Nyquist frequency of this spectrum. See [`octave_bands`] and
    /// [`crate::DEFAULT_OCTAVE_DIVISION`] and
    /// [`crate::DEFAULT_MIN_CENTER_FREQUENCY_HZ`] for typical values.
    pub fn octave_bands(
        &self,
        n: u32,
        min_center_frequency_hz: f32,
    ) -> Result<Vec<FrequencyBand>, SpectrumError> {
        octave_bands(n, min_center_frequency_hz, self.nyquist_hz)
    }
}

fn validate_frequency(frequency_hz: f32) -> Result<f32, SpectrumError> {
    F32Frequency::try_from(frequency_hz)
        .map(F32Frequency::raw)
        .map_err(|_| SpectrumError::InvalidFrequencyInput(format!("{frequency_hz}")))
}
