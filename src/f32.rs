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
//! Module for convenient handling of primitive [`f32`] types.
//!
//! In a nutshell, this exports restricted type wrappers around [`f32`] values
//! with certain guarantees to be valid numbers.

use core::fmt::{Display, Formatter};
use core::ops::RangeInclusive;
use thiserror::Error;

/// The underlying value is not valid, i.e., not finite or not in a finite
/// range.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InvalidF32Error {
    #[error("value is not a number (NaN)")]
    NAN,
    #[error("value is infinite")]
    Infinite,
    #[error("finite value {0} is not in finite range {1:?}")]
    NotInRange(f32 /* finite */, RangeInclusive<f32>),
}

/// A finite f32 that is [`Ord`] and [`Eq`].
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub(crate) struct FiniteF32(f32 /* finite: not NaN or infinite */);

impl Ord for FiniteF32 {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        // Never `None`: both values are finite.
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(core::cmp::Ordering::Equal)
    }
}

impl Eq for FiniteF32 {}

impl TryFrom<f32> for FiniteF32 {
    type Error = InvalidF32Error;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value.is_nan() {
            Err(InvalidF32Error::NAN)
        } else if value.is_infinite() {
            Err(InvalidF32Error::Infinite)
        } else {
            debug_assert!(value.is_finite());
            Ok(Self(value))
        }
    }
}

fn f32_is_finite_and_in_range(
    value: f32,
    range: RangeInclusive<f32>,
) -> Result<FiniteF32, InvalidF32Error> {
    let finite_f32 = FiniteF32::try_from(value)?;
    if range.contains(&finite_f32.0) {
        Ok(finite_f32)
    } else {
        Err(InvalidF32Error::NotInRange(value, range))
    }
}

/// A frequency in range `0.0..Infinity` (Hertz).
///
/// Unlike sample rates, frequencies of band edges and centers regularly have
/// a fractional part (`15.625 Hz`, `19.686 Hz`, ...), so they are allowed.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Ord, Eq)]
#[repr(transparent)]
pub struct F32Frequency(FiniteF32);

impl F32Frequency {
    const VALID_RANGE: RangeInclusive<f32> = 0.0..=f32::MAX;

    /// Wraps a value that is known to be valid, such as a constant.
    pub(crate) const fn new_unchecked(value: f32) -> Self {
        Self(FiniteF32(value))
    }

    /// Returns the underlying raw value.
    #[must_use]
    pub const fn raw(self) -> f32 {
        self.0 .0
    }
}

impl TryFrom<f32> for F32Frequency {
    type Error = InvalidF32Error;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        // base assertions
        let _ = FiniteF32::try_from(value)?;

        // check negative zero
        if value.is_sign_negative() {
            Err(InvalidF32Error::NotInRange(value, Self::VALID_RANGE))
        } else {
            f32_is_finite_and_in_range(value, Self::VALID_RANGE).map(Self)
        }
    }
}

impl Display for F32Frequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} Hz", self.raw())
    }
}

/// A normalized energy value in range `0.0..=1.0`.
#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Ord, Eq)]
#[repr(transparent)]
pub struct F32Energy(FiniteF32);

impl F32Energy {
    const VALID_RANGE: RangeInclusive<f32> = 0.0..=1.0;

    /// Wraps a value that is known to be valid, such as a constant.
    pub(crate) const fn new_unchecked(value: f32) -> Self {
        Self(FiniteF32(value))
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn raw(self) -> f32 {
        self.0 .0
    }
}

impl TryFrom<f32> for F32Energy {
    type Error = InvalidF32Error;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        f32_is_finite_and_in_range(value, Self::VALID_RANGE).map(Self)
    }
}

impl Display for F32Energy {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_f32_finite() {
        check!(FiniteF32::try_from(0.0) == Ok(FiniteF32(0.0)));
        check!(FiniteF32::try_from(-42.0) == Ok(FiniteF32(-42.0)));
        check!(FiniteF32::try_from(f32::NAN) == Err(InvalidF32Error::NAN));
        check!(FiniteF32::try_from(f32::INFINITY) == Err(InvalidF32Error::Infinite));
        check!(FiniteF32::try_from(f32::NEG_INFINITY) == Err(InvalidF32Error::Infinite));
    }

    #[test]
    fn test_type_f32_frequency() {
        check!(F32Frequency::try_from(f32::NAN) == Err(InvalidF32Error::NAN));
        check!(F32Frequency::try_from(f32::INFINITY) == Err(InvalidF32Error::Infinite));
        check!(
            F32Frequency::try_from(-0.0)
                == Err(InvalidF32Error::NotInRange(-0.0, F32Frequency::VALID_RANGE))
        );
        check!(
            F32Frequency::try_from(-42.0)
                == Err(InvalidF32Error::NotInRange(-42.0, F32Frequency::VALID_RANGE))
        );

        check!(F32Frequency::try_from(0.0).map(F32Frequency::raw) == Ok(0.0));
        check!(F32Frequency::try_from(15.625).map(F32Frequency::raw) == Ok(15.625));
        check!(F32Frequency::try_from(22050.0).map(F32Frequency::raw) == Ok(22050.0));
    }

    #[test]
    fn test_type_f32_energy() {
        check!(F32Energy::try_from(f32::NAN) == Err(InvalidF32Error::NAN));
        check!(
            F32Energy::try_from(-0.1)
                == Err(InvalidF32Error::NotInRange(-0.1, F32Energy::VALID_RANGE))
        );
        check!(
            F32Energy::try_from(1.1)
                == Err(InvalidF32Error::NotInRange(1.1, F32Energy::VALID_RANGE))
        );
        check!(F32Energy::try_from(0.0).map(F32Energy::raw) == Ok(0.0));
        check!(F32Energy::try_from(1.0).map(F32Energy::raw) == Ok(1.0));
    }
}
