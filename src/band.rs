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
//! Frequency bands: the fixed table of [`NamedBand`]s and geometrically
//! constructed 1/n-octave [`FrequencyBand`]s.

use crate::f32::F32Frequency;
use crate::spectral_aggregator::SpectrumError;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use core::str::FromStr;

/// Default octave division for [`octave_bands`]: third-octave bands.
pub const DEFAULT_OCTAVE_DIVISION: u32 = 3;

/// Default center frequency of the first band created by [`octave_bands`].
pub const DEFAULT_MIN_CENTER_FREQUENCY_HZ: f32 = 15.625;

/// Well-known frequency ranges with a fixed `[low, high]` pair in Hz.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NamedBand {
    /// 20 Hz to 140 Hz.
    Bass,
    /// 140 Hz to 400 Hz.
    LowMid,
    /// 400 Hz to 2600 Hz.
    Mid,
    /// 2600 Hz to 5200 Hz.
    HighMid,
    /// 5200 Hz to 14000 Hz.
    Treble,
}

impl NamedBand {
    /// All named bands in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Bass,
        Self::LowMid,
        Self::Mid,
        Self::HighMid,
        Self::Treble,
    ];

    // (name, low Hz, high Hz), indexed by discriminant.
    const TABLE: [(&'static str, f32, f32); 5] = [
        ("bass", 20.0, 140.0),
        ("lowMid", 140.0, 400.0),
        ("mid", 400.0, 2600.0),
        ("highMid", 2600.0, 5200.0),
        ("treble", 5200.0, 14000.0),
    ];

    #[inline]
    const fn entry(self) -> (&'static str, f32, f32) {
        Self::TABLE[self as usize]
    }

    /// The name used when parsing, such as `"lowMid"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.entry().0
    }

    /// Returns the `(low, high)` frequency pair in Hz.
    #[must_use]
    pub const fn range_hz(self) -> (f32, f32) {
        let (_, low, high) = self.entry();
        (low, high)
    }
}

impl FromStr for NamedBand {
    type Err = SpectrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|band| band.name() == s)
            .ok_or_else(|| SpectrumError::InvalidFrequencyInput(s.to_string()))
    }
}

impl Display for NamedBand {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A contiguous frequency range described by its lower edge, center, and
/// upper edge (Hz). Immutable once constructed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrequencyBand {
    low: f32,
    ctr: f32,
    hi: f32,
}

impl FrequencyBand {
    /// Creates a band. The caller is responsible for `low <= ctr <= hi`.
    #[must_use]
    pub const fn new(low: f32, ctr: f32, hi: f32) -> Self {
        Self { low, ctr, hi }
    }

    /// Lower edge (Hz).
    #[must_use]
    pub const fn low(&self) -> f32 {
        self.low
    }

    /// Center frequency (Hz).
    #[must_use]
    pub const fn ctr(&self) -> f32 {
        self.ctr
    }

    /// Upper edge (Hz).
    #[must_use]
    pub const fn hi(&self) -> f32 {
        self.hi
    }
}

/// Generates 1/`n`-octave bands, starting with a band centered at
/// `min_center_frequency_hz`, until the upper edge of the last band reaches or
/// exceeds `nyquist_hz`. That last band is part of the result.
///
/// Each center is `2^(1/n)` times the previous one. Edges are
/// `2^(1/(2n))` below and above the center, and the lower edge of every band
/// but the first is the upper edge of its predecessor.
///
/// The result is a pure function of the three arguments. Fails with
/// [`SpectrumError::InvalidOctaveDivision`] if the centers could not grow,
/// i.e., for `n == 0`, for an `n` so large that `2^(1/n)` rounds to `1.0`, or
/// for a zero or subnormal minimum center.
pub fn octave_bands(
    n: u32,
    min_center_frequency_hz: f32,
    nyquist_hz: f32,
) -> Result<Vec<FrequencyBand>, SpectrumError> {
    if n == 0 {
        return Err(SpectrumError::InvalidOctaveDivision);
    }
    let min_ctr = F32Frequency::try_from(min_center_frequency_hz)?.raw();
    let nyquist = F32Frequency::try_from(nyquist_hz)?.raw();
    // Zero or subnormal centers would never grow.
    if !min_ctr.is_normal() {
        return Err(SpectrumError::InvalidOctaveDivision);
    }

    let n = n as f32;
    let center_step = libm::powf(2.0, 1.0 / n);
    let edge_factor = libm::powf(2.0, 1.0 / (2.0 * n));
    // Huge divisions round the step to exactly 1.0.
    if center_step <= 1.0 {
        return Err(SpectrumError::InvalidOctaveDivision);
    }

    let mut bands = Vec::new();
    let mut last = FrequencyBand::new(min_ctr / edge_factor, min_ctr, min_ctr * edge_factor);
    bands.push(last);

    while last.hi < nyquist {
        let ctr = last.ctr * center_step;
        if ctr <= last.ctr {
            return Err(SpectrumError::InvalidOctaveDivision);
        }
        last = FrequencyBand::new(last.hi, ctr, ctr * edge_factor);
        bands.push(last);
    }

    log::trace!(
        "created {} 1/{}-octave bands from {} Hz up to {} Hz",
        bands.len(),
        n,
        min_ctr,
        nyquist
    );

    Ok(bands)
}
