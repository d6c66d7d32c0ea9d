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
//! Module for [`PeakDetector`], a frame-synchronous onset ("beat") detector
//! with an adaptive threshold.
//!
//! Each frame, the detector is fed the normalized energy of a frequency range.
//! A peak is detected when the energy is rising, above the hard
//! [`PeakDetectorConfig::threshold`], and above an adaptive cutoff. On every
//! peak, the cutoff jumps to [`CUTOFF_MULTIPLIER`] times the peak energy. It
//! stays there for [`PeakDetectorConfig::frames_per_peak`] quiet frames and
//! then decays by [`DECAY_RATE`] per frame, but never below the threshold.

use crate::f32::{F32Energy, F32Frequency, InvalidF32Error};
use crate::magnitude::Magnitude;
use crate::spectral_aggregator::SpectralAggregator;
use alloc::boxed::Box;
use core::fmt::{Debug, Formatter};
use thiserror::Error;

/// Factor applied to the cutoff on every quiet frame after the debounce
/// window.
pub const DECAY_RATE: f32 = 0.95;

/// Factor between the energy of a detected peak and the new cutoff.
pub const CUTOFF_MULTIPLIER: f32 = 1.5;

/// Possible errors when creating a [`PeakDetectorConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidConfigError {
    #[error("the threshold {0} is not in range (0.0, 1.0)")]
    InvalidThreshold(f32),
    #[error("the low frequency ({0}) must not be above the high frequency ({1})")]
    ReversedFrequencies(F32Frequency, F32Frequency),
    #[error("the f32 value is not a valid frequency value")]
    InvalidF32(#[from] InvalidF32Error),
}

/// Immutable configuration of a [`PeakDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDetectorConfig {
    low_freq: F32Frequency,
    high_freq: F32Frequency,
    threshold: F32Energy,
    frames_per_peak: u32,
}

impl PeakDetectorConfig {
    /// Default lower edge of the observed frequency range.
    pub const DEFAULT_LOW_FREQ_HZ: f32 = 40.0;
    /// Default upper edge of the observed frequency range.
    pub const DEFAULT_HIGH_FREQ_HZ: f32 = 20000.0;
    /// Default hard threshold for normalized energy.
    pub const DEFAULT_THRESHOLD: f32 = 0.35;
    /// Default minimum number of frames between two peaks.
    pub const DEFAULT_FRAMES_PER_PEAK: u32 = 20;

    /// Creates a new validated configuration.
    ///
    /// # Arguments
    /// - `low_freq_hz`, `high_freq_hz`: The frequency range whose energy is
    ///   observed by [`PeakDetector::update_from_spectrum`].
    /// - `threshold`: Minimum normalized energy of a peak, in range
    ///   `(0.0, 1.0)`.
    /// - `frames_per_peak`: Length of the debounce window in frames.
    pub fn new(
        low_freq_hz: f32,
        high_freq_hz: f32,
        threshold: f32,
        frames_per_peak: u32,
    ) -> Result<Self, InvalidConfigError> {
        let low_freq = F32Frequency::try_from(low_freq_hz)?;
        let high_freq = F32Frequency::try_from(high_freq_hz)?;
        if low_freq > high_freq {
            return Err(InvalidConfigError::ReversedFrequencies(low_freq, high_freq));
        }

        let threshold = F32Energy::try_from(threshold)
            .ok()
            .filter(|t| t.raw() > 0.0 && t.raw() < 1.0)
            .ok_or(InvalidConfigError::InvalidThreshold(threshold))?;

        Ok(Self {
            low_freq,
            high_freq,
            threshold,
            frames_per_peak,
        })
    }

    /// Returns a copy with a different frequency range.
    pub fn with_frequency_range(
        self,
        low_freq_hz: f32,
        high_freq_hz: f32,
    ) -> Result<Self, InvalidConfigError> {
        Self::new(
            low_freq_hz,
            high_freq_hz,
            self.threshold(),
            self.frames_per_peak,
        )
    }

    /// Returns a copy with a different threshold.
    pub fn with_threshold(self, threshold: f32) -> Result<Self, InvalidConfigError> {
        Self::new(
            self.low_freq_hz(),
            self.high_freq_hz(),
            threshold,
            self.frames_per_peak,
        )
    }

    /// Returns a copy with a different debounce window.
    #[must_use]
    pub const fn with_frames_per_peak(mut self, frames_per_peak: u32) -> Self {
        self.frames_per_peak = frames_per_peak;
        self
    }

    #[must_use]
    pub const fn low_freq_hz(&self) -> f32 {
        self.low_freq.raw()
    }

    #[must_use]
    pub const fn high_freq_hz(&self) -> f32 {
        self.high_freq.raw()
    }

    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold.raw()
    }

    #[must_use]
    pub const fn frames_per_peak(&self) -> u32 {
        self.frames_per_peak
    }
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            low_freq: F32Frequency::new_unchecked(Self::DEFAULT_LOW_FREQ_HZ),
            high_freq: F32Frequency::new_unchecked(Self::DEFAULT_HIGH_FREQ_HZ),
            threshold: F32Energy::new_unchecked(Self::DEFAULT_THRESHOLD),
            frames_per_peak: Self::DEFAULT_FRAMES_PER_PEAK,
        }
    }
}

/// Information about a detected peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakInfo {
    /// Normalized energy of the frame that triggered the peak.
    pub energy: f32,
    /// Zero-based number of the frame (update) that triggered the peak.
    pub frame: u64,
}

type PeakCallback = Box<dyn FnMut(f32) + Send>;

/// Adaptive peak detector. A frame is a peak if its energy is rising, above
/// the configured threshold, and above the adaptive cutoff. See
/// [`Self::update`].
///
/// The detector is driven by exactly one call site, once per frame. It
/// applies no internal locking, so hosts must serialize calls to
/// [`Self::update`]. A registered callback must not update the detector it
/// is registered on; the borrow checker enforces this.
///
/// ## Example
/// ```rust
/// use spectral_peak::{PeakDetector, PeakDetectorConfig};
///
/// let mut detector = PeakDetector::new(PeakDetectorConfig::default());
/// detector.on_peak_with(
///     |energy, channel: &u8| println!("channel {channel}: peak with energy {energy}"),
///     0,
/// );
///
/// // Call this once per frame with the normalized energy of that frame.
/// for energy in [0.1, 0.5, 0.2] {
///     detector.update(energy);
/// }
/// ```
pub struct PeakDetector {
    // read-only fields
    config: PeakDetectorConfig,
    // mutable fields
    /// Adaptive threshold. Starts at zero; after the first decay, it never
    /// falls below the configured threshold.
    cutoff: f32,
    /// Energy of the latest frame.
    energy: f32,
    previous_energy: f32,
    frames_since_last_peak: u32,
    is_detected: bool,
    frame_count: u64,
    on_peak: Option<PeakCallback>,
}

impl PeakDetector {
    /// Creates a new detector in the quiescent state.
    #[must_use]
    pub const fn new(config: PeakDetectorConfig) -> Self {
        Self {
            config,
            cutoff: 0.0,
            energy: 0.0,
            previous_energy: 0.0,
            frames_since_last_peak: 0,
            is_detected: false,
            frame_count: 0,
            on_peak: None,
        }
    }

    /// Registers the callback that is invoked synchronously with the energy
    /// of every detected peak. Replaces a previously registered callback.
    pub fn on_peak(&mut self, callback: impl FnMut(f32) + Send + 'static) {
        if self.on_peak.is_some() {
            log::debug!("replacing the registered peak callback");
        }
        self.on_peak = Some(Box::new(callback));
    }

    /// Like [`Self::on_peak`] but additionally binds an auxiliary value that
    /// is passed to every invocation of the callback.
    pub fn on_peak_with<A: Send + 'static>(
        &mut self,
        mut callback: impl FnMut(f32, &A) + Send + 'static,
        auxiliary: A,
    ) {
        self.on_peak(move |energy| callback(energy, &auxiliary));
    }

    /// Removes the registered callback, if any.
    pub fn clear_on_peak(&mut self) {
        self.on_peak = None;
    }

    /// Feeds the normalized energy (`0.0..=1.0`) of the latest frame into the
    /// detector. Returns `Some` if this frame is a peak. In that case, the
    /// registered callback was invoked before this function returns.
    ///
    /// On a peak, the cutoff jumps to [`CUTOFF_MULTIPLIER`] times the energy.
    /// It stays there for [`PeakDetectorConfig::frames_per_peak`] quiet frames
    /// and then decays by [`DECAY_RATE`] per quiet frame, but never below the
    /// threshold.
    ///
    /// Any input is accepted. `NaN` never triggers a peak.
    pub fn update(&mut self, energy: f32) -> Option<PeakInfo> {
        let frame = self.frame_count;
        self.frame_count += 1;
        self.energy = energy;

        let threshold = self.config.threshold();
        let is_rising = energy - self.previous_energy > 0.0;
        let peak = if energy > self.cutoff && energy > threshold && is_rising {
            if let Some(callback) = self.on_peak.as_mut() {
                callback(energy);
            }
            self.is_detected = true;
            self.cutoff = energy * CUTOFF_MULTIPLIER;
            self.frames_since_last_peak = 0;

            log::debug!("peak at frame {frame}: energy={energy}, new cutoff={}", self.cutoff);
            Some(PeakInfo { energy, frame })
        } else {
            self.is_detected = false;
            if self.frames_since_last_peak <= self.config.frames_per_peak() {
                self.frames_since_last_peak = self.frames_since_last_peak.saturating_add(1);
            } else {
                self.cutoff = libm::fmaxf(self.cutoff * DECAY_RATE, threshold);
            }
            None
        };

        log::trace!(
            "frame {frame}: energy={energy}, cutoff={}, frames_since_last_peak={}",
            self.cutoff,
            self.frames_since_last_peak
        );

        self.previous_energy = energy;
        peak
    }

    /// Measures the energy of the configured frequency range in the given
    /// spectrum, normalizes it by [`Magnitude::FULL_SCALE`], and feeds it into
    /// [`Self::update`].
    pub fn update_from_spectrum<T: Magnitude>(
        &mut self,
        spectrum: &SpectralAggregator<'_, T>,
    ) -> Option<PeakInfo> {
        let energy = spectrum.mean_between(self.config.low_freq_hz(), self.config.high_freq_hz());
        self.update(energy / T::FULL_SCALE)
    }

    /// Restores the initial state. Keeps the configuration and the callback.
    pub fn reset(&mut self) {
        let on_peak = self.on_peak.take();
        *self = Self::new(self.config);
        self.on_peak = on_peak;
    }

    /// Whether the latest frame was a peak.
    #[must_use]
    pub const fn is_detected(&self) -> bool {
        self.is_detected
    }

    /// Normalized energy of the latest frame.
    #[must_use]
    pub const fn current_value(&self) -> f32 {
        self.energy
    }

    /// Normalized energy of the frame before the next update, i.e., of the
    /// latest frame. Starts at `0.0`.
    #[must_use]
    pub const fn previous_energy(&self) -> f32 {
        self.previous_energy
    }

    #[must_use]
    pub const fn frames_since_last_peak(&self) -> u32 {
        self.frames_since_last_peak
    }

    /// Current adaptive cutoff.
    #[must_use]
    pub const fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Number of updates so far.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[must_use]
    pub const fn config(&self) -> &PeakDetectorConfig {
        &self.config
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::new(PeakDetectorConfig::default())
    }
}

impl Debug for PeakDetector {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PeakDetector")
            .field("config", &self.config)
            .field("cutoff", &self.cutoff)
            .field("energy", &self.energy)
            .field("previous_energy", &self.previous_energy)
            .field("frames_since_last_peak", &self.frames_since_last_peak)
            .field("is_detected", &self.is_detected)
            .field("frame_count", &self.frame_count)
            .field("on_peak", &self.on_peak.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use itertools::Itertools;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::{Arc, Mutex};
    use std::vec;
    use std::vec::Vec;

    /// Feeds all energies and returns the frames with peaks.
    fn simulate(detector: &mut PeakDetector, energies: &[f32]) -> Vec<u64> {
        energies
            .iter()
            .flat_map(|&energy| detector.update(energy))
            .map(|info| info.frame)
            .collect()
    }

    #[test]
    fn is_send() {
        fn accept<I: Send>() {}

        accept::<PeakDetector>();
    }

    #[test]
    fn default_config() {
        let config = PeakDetectorConfig::default();
        check!(config.low_freq_hz() == 40.0);
        check!(config.high_freq_hz() == 20000.0);
        check!(config.threshold() == 0.35);
        check!(config.frames_per_peak() == 20);
        check!(PeakDetectorConfig::new(40.0, 20000.0, 0.35, 20) == Ok(config));
    }

    #[test]
    fn config_validation() {
        check!(
            PeakDetectorConfig::new(40.0, 20000.0, 0.0, 20)
                == Err(InvalidConfigError::InvalidThreshold(0.0))
        );
        check!(
            PeakDetectorConfig::new(40.0, 20000.0, 1.0, 20)
                == Err(InvalidConfigError::InvalidThreshold(1.0))
        );
        check!(PeakDetectorConfig::new(40.0, 20000.0, f32::NAN, 20).is_err());
        check!(matches!(
            PeakDetectorConfig::new(200.0, 100.0, 0.5, 20),
            Err(InvalidConfigError::ReversedFrequencies(_, _))
        ));
        check!(matches!(
            PeakDetectorConfig::new(-1.0, 100.0, 0.5, 20),
            Err(InvalidConfigError::InvalidF32(_))
        ));

        let config = PeakDetectorConfig::default()
            .with_threshold(0.6)
            .unwrap()
            .with_frequency_range(20.0, 140.0)
            .unwrap()
            .with_frames_per_peak(5);
        check!(config == PeakDetectorConfig::new(20.0, 140.0, 0.6, 5).unwrap());
        check!(PeakDetectorConfig::default().with_threshold(1.5).is_err());
    }

    #[test]
    fn initial_state() {
        let detector = PeakDetector::default();
        check!(detector.cutoff() == 0.0);
        check!(detector.frames_since_last_peak() == 0);
        check!(!detector.is_detected());
        check!(detector.current_value() == 0.0);
        check!(detector.frame_count() == 0);
    }

    #[test]
    fn first_rising_frame_above_threshold_triggers() {
        let mut detector = PeakDetector::default();
        check!(detector.update(0.4) == Some(PeakInfo { energy: 0.4, frame: 0 }));
        check!(detector.is_detected());
        check!(approx_eq!(f32, detector.cutoff(), 0.6, ulps = 2));
        check!(detector.frames_since_last_peak() == 0);
    }

    #[test]
    fn rising_then_falling_sequence() {
        let mut detector = PeakDetector::default();
        let mut detected = vec![];
        let mut peaks = vec![];
        for energy in [0.1, 0.5, 0.9, 0.3, 0.1] {
            if detector.update(energy).is_some() {
                peaks.push(energy);
            }
            detected.push(detector.is_detected());
            check!(detector.current_value() == energy);
        }
        // 0.5 rises above threshold and the initial cutoff of zero. 0.9 is
        // still above the raised cutoff of 0.75, so it triggers again.
        check!(peaks == [0.5, 0.9]);
        check!(detected == [false, true, true, false, false]);
        check!(detector.frames_since_last_peak() == 2);
        check!(approx_eq!(f32, detector.cutoff(), 1.35, ulps = 2));
    }

    #[test]
    fn raised_cutoff_suppresses_smaller_rise() {
        let mut detector = PeakDetector::default();
        // 0.7 is below the cutoff of 0.75 set by 0.5.
        check!(simulate(&mut detector, &[0.1, 0.5, 0.7, 0.3, 0.1]) == [1]);
    }

    #[test]
    fn falling_or_flat_energy_never_triggers() {
        let mut detector = PeakDetector::default();
        check!(simulate(&mut detector, &[0.0; 100]).is_empty());

        let mut detector = PeakDetector::default();
        check!(simulate(&mut detector, &[0.9, 0.9, 0.9]) == [0]);

        let mut detector = PeakDetector::default();
        check!(simulate(&mut detector, &[f32::NAN, f32::NAN, 0.2]).is_empty());
    }

    #[test]
    fn debounce_prevents_retriggering() {
        // Without debouncing, every 0.55 frame would be a peak.
        let energies = (0..500)
            .map(|i| if i % 2 == 0 { 0.4 } else { 0.55 })
            .collect::<Vec<_>>();
        let mut detector = PeakDetector::default();
        let peaks = simulate(&mut detector, &energies);

        check!(peaks.len() > 2);
        let frames_per_peak = u64::from(detector.config().frames_per_peak());
        for (a, b) in peaks.iter().tuple_windows() {
            check!(b - a > frames_per_peak);
        }
    }

    #[test]
    fn cutoff_decays_after_debounce_window() {
        let config = PeakDetectorConfig::default().with_frames_per_peak(2);
        let mut detector = PeakDetector::new(config);
        detector.update(0.6);
        check!(approx_eq!(f32, detector.cutoff(), 0.9, ulps = 2));

        // counter 0 -> 1 -> 2 -> 3, cutoff unchanged
        for expected_counter in 1..=3 {
            detector.update(0.0);
            check!(detector.frames_since_last_peak() == expected_counter);
            check!(approx_eq!(f32, detector.cutoff(), 0.9, ulps = 2));
        }

        detector.update(0.0);
        check!(detector.frames_since_last_peak() == 3);
        check!(approx_eq!(f32, detector.cutoff(), 0.9 * DECAY_RATE, epsilon = 0.000_001));

        for _ in 0..100 {
            detector.update(0.0);
        }
        check!(detector.cutoff() == config.threshold());
    }

    #[test]
    fn frame_counter_saturates_with_unbounded_window() {
        let config = PeakDetectorConfig::default().with_frames_per_peak(u32::MAX);
        let mut detector = PeakDetector::new(config);
        detector.update(0.6);
        detector.frames_since_last_peak = u32::MAX - 1;

        for _ in 0..3 {
            check!(detector.update(0.0).is_none());
            check!(detector.frames_since_last_peak() == u32::MAX);
        }
        // The window never ends, so the cutoff never decays.
        check!(approx_eq!(f32, detector.cutoff(), 0.9, ulps = 2));
    }

    #[test]
    fn cutoff_never_falls_below_threshold() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut detector = PeakDetector::default();
        let threshold = detector.config().threshold();
        let mut decayed = false;
        for _ in 0..10_000 {
            detector.update(rng.random::<f32>());
            decayed |= detector.cutoff() != 0.0;
            if decayed {
                check!(detector.cutoff() >= threshold);
            }
        }
        check!(decayed);
    }

    #[test]
    fn callback_receives_energy_and_auxiliary_value() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let mut detector = PeakDetector::default();
        let received_cpy = received.clone();
        detector.on_peak_with(
            move |energy, aux: &u32| received_cpy.lock().unwrap().push((energy, *aux)),
            42,
        );

        simulate(&mut detector, &[0.1, 0.5, 0.7, 0.3]);
        check!(*received.lock().unwrap() == [(0.5, 42)]);
    }

    #[test]
    fn registering_replaces_callback() {
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));
        let mut detector = PeakDetector::default();

        let first_cpy = first.clone();
        detector.on_peak(move |_| *first_cpy.lock().unwrap() += 1);
        let second_cpy = second.clone();
        detector.on_peak(move |_| *second_cpy.lock().unwrap() += 1);

        // Registration alone has no effect on the state.
        check!(detector.frame_count() == 0);
        check!(detector.cutoff() == 0.0);

        detector.update(0.5);
        check!(*first.lock().unwrap() == 0);
        check!(*second.lock().unwrap() == 1);

        detector.clear_on_peak();
        detector.reset();
        check!(detector.update(0.5).is_some());
        check!(*second.lock().unwrap() == 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let count = Arc::new(Mutex::new(0));
        let count_cpy = count.clone();
        let mut detector = PeakDetector::default();
        detector.on_peak(move |_| *count_cpy.lock().unwrap() += 1);
        simulate(&mut detector, &[0.5, 0.1, 0.1]);

        detector.reset();
        check!(detector.cutoff() == 0.0);
        check!(detector.frame_count() == 0);
        check!(detector.frames_since_last_peak() == 0);
        check!(detector.previous_energy() == 0.0);

        // callback survives the reset
        detector.update(0.5);
        check!(*count.lock().unwrap() == 2);
    }

    #[test]
    fn update_from_byte_spectrum() {
        let mut detector = PeakDetector::default();
        let silence = [0_u8; 512];
        let loud = [255_u8; 512];

        let spectrum = SpectralAggregator::new(&silence, 44100.0).unwrap();
        check!(detector.update_from_spectrum(&spectrum) == None);
        check!(detector.current_value() == 0.0);

        let spectrum = SpectralAggregator::new(&loud, 44100.0).unwrap();
        check!(
            detector.update_from_spectrum(&spectrum) == Some(PeakInfo { energy: 1.0, frame: 1 })
        );
    }

    #[test]
    fn detect_kicks_in_synthetic_frames() {
        let config = PeakDetectorConfig::new(20.0, 140.0, 0.35, 10).unwrap();
        let mut detector = PeakDetector::new(config);

        let peaks = test_utils::kick_frames(24, 120)
            .iter()
            .flat_map(|frame| {
                let spectrum = SpectralAggregator::new(frame, 44100.0).unwrap();
                detector.update_from_spectrum(&spectrum)
            })
            .map(|info| info.frame)
            .collect::<Vec<_>>();

        // One kick every 24 frames, starting at frame 0.
        check!(peaks == [0, 24, 48, 72, 96]);
    }
}
