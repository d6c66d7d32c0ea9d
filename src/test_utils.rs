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

//! Synthetic spectra for tests. Real FFT output is not needed to test the
//! aggregations; these fixtures make the expected values easy to derive by
//! hand.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::vec;
use std::vec::Vec;

/// Number of bins of [`kick_frames`], as emitted by an FFT of size 1024.
pub const KICK_FRAME_BINS: usize = 512;

/// Bins with the values `0.0, 1.0, 2.0, ...`.
pub fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32).collect()
}

/// Silent bins except for bin `index`.
pub fn impulse(len: usize, index: usize, value: f32) -> Vec<f32> {
    let mut bins = vec![0.0; len];
    bins[index] = value;
    bins
}

/// Reproducible random bins in range `0.0..1.0`.
pub fn pseudo_random_spectrum(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random::<f32>()).collect()
}

/// Byte spectra of `count` frames at a sample rate of 44.1 kHz. Every
/// `period` frames, a kick drum hits: the bass bins (0 to 3, i.e., up to
/// ~140 Hz) jump to 240 and fade out by 30 % per frame. All other bins carry
/// a constant low noise floor.
pub fn kick_frames(period: usize, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|frame| {
            let phase = (frame % period) as f32;
            let bass = (240.0 * libm::powf(0.7, phase)) as u8;
            let mut bins = vec![3_u8; KICK_FRAME_BINS];
            bins[..4].fill(bass);
            bins
        })
        .collect()
}
