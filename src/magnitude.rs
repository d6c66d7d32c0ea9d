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
//! Abstraction over the representation of frequency bin magnitudes.
//!
//! Spectrum analysis engines either emit normalized floating point
//! magnitudes or byte magnitudes in range `0..=255` (for example, the
//! `getByteFrequencyData` family of APIs). All aggregations of this crate
//! work on both. See [`Magnitude`].

/// A single, non-negative magnitude of a frequency bin.
///
/// All aggregations convert values to [`f32`] via [`Magnitude::to_f32`] and
/// report results in the units of the representation. Divide by
/// [`Magnitude::FULL_SCALE`] to get a normalized value in range `0.0..=1.0`.
pub trait Magnitude: Copy {
    /// The maximum value of the representation.
    const FULL_SCALE: f32;

    /// Returns the magnitude as [`f32`] without normalization.
    fn to_f32(self) -> f32;

    /// Returns the magnitude normalized to range `0.0..=1.0`.
    #[inline]
    fn normalized(self) -> f32 {
        self.to_f32() / Self::FULL_SCALE
    }
}

impl Magnitude for f32 {
    const FULL_SCALE: f32 = 1.0;

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }
}

impl Magnitude for u8 {
    const FULL_SCALE: f32 = u8::MAX as f32;

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_magnitude() {
        check!(0_u8.to_f32() == 0.0);
        check!(255_u8.to_f32() == 255.0);
        check!(255_u8.normalized() == 1.0);
        check!(approx_eq!(f32, 51_u8.normalized(), 0.2, epsilon = 0.0001));
    }

    #[test]
    fn test_f32_magnitude() {
        check!(0.25_f32.to_f32() == 0.25);
        check!(0.25_f32.normalized() == 0.25);
    }
}
