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
//! Accumulators used to summarize a group of frequency bins into one value.

/// How the bins of one group (linear group or octave band) are combined.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Averaging {
    /// Running pairwise average: the accumulator starts with the first value
    /// and is replaced by `(acc + next) / 2` for every following value.
    ///
    /// This is not an arithmetic mean. Later values of a group weigh more
    /// than earlier ones. Established visualizations depend on exactly this
    /// behavior, therefore it is the default.
    #[default]
    RunningPairwise,
    /// Arithmetic mean of all values of a group.
    Mean,
}

/// Incremental accumulator for one group. Created empty, fed value by value.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Accumulator {
    mode: Averaging,
    value: Option<f32>,
    count: u32,
}

impl Accumulator {
    pub(crate) const fn new(mode: Averaging) -> Self {
        Self {
            mode,
            value: None,
            count: 0,
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, next: f32) {
        self.count += 1;
        self.value = Some(match (self.mode, self.value) {
            (_, None) => next,
            (Averaging::RunningPairwise, Some(acc)) => (acc + next) / 2.0,
            // Kept as a sum until `finish`.
            (Averaging::Mean, Some(acc)) => acc + next,
        });
    }

    /// Returns the result or `None` if no value was pushed.
    #[inline]
    pub(crate) fn get(&self) -> Option<f32> {
        match self.mode {
            Averaging::RunningPairwise => self.value,
            Averaging::Mean => self.value.map(|sum| sum / self.count as f32),
        }
    }
}
