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
//! Module for [`BandAnalyzer`]: reduces a magnitude spectrum to a small
//! number of per-band averages.

use crate::DetectorConfig;

/// Partitions a magnitude spectrum into logarithmically spaced frequency
/// bands and computes the average magnitude per band.
///
/// Band `i` covers the frequency range
/// `(nyquist / 2^(band_count - i), nyquist / 2^(band_count - 1 - i)]`,
/// with band 0 starting at 0 Hz, so each band is one octave wide and the
/// last band ends at the Nyquist frequency. The bin index ranges are
/// precomputed once; computing the averages is a single `O(buffer_size)`
/// pass with no allocation.
#[derive(Debug)]
pub(crate) struct BandAnalyzer {
    /// Inclusive `(low, high)` bin index range per band. Monotonically
    /// non-decreasing; the last high edge is `buffer_size / 2`.
    edges: Vec<(usize, usize)>,
    averages: Vec<f32>,
}

impl BandAnalyzer {
    /// Precomputes the band edges for the given (already validated)
    /// configuration.
    pub fn new(config: &DetectorConfig) -> Self {
        let nyquist = config.sampling_rate as f32 / 2.0;
        let edges = (0..config.band_count)
            .map(|i| {
                let low_freq = if i == 0 {
                    0.0
                } else {
                    libm::truncf(nyquist / libm::powf(2.0, (config.band_count - i) as f32))
                };
                let high_freq =
                    libm::truncf(nyquist / libm::powf(2.0, (config.band_count - 1 - i) as f32));
                let low = freq_to_index(low_freq, config);
                let high = freq_to_index(high_freq, config);
                debug_assert!(low <= high);
                (low, high)
            })
            .collect();
        Self {
            edges,
            averages: vec![0.0; config.band_count],
        }
    }

    /// Computes the per-band average magnitudes of `spectrum` into an
    /// internal buffer and returns it. The caller guarantees that
    /// `spectrum.len()` matches the configured buffer size.
    pub fn compute_bands(&mut self, spectrum: &[f32]) -> &[f32] {
        for (average, &(low, high)) in self.averages.iter_mut().zip(&self.edges) {
            // The range is inclusive and never empty by construction.
            let sum: f32 = spectrum[low..=high].iter().sum();
            *average = sum / (high - low + 1) as f32;
        }
        &self.averages
    }

    #[cfg(test)]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

/// Maps a frequency in Hz to the nearest spectrum bin index, clamped to 0
/// below half a bin's bandwidth and to `buffer_size / 2` close to the
/// Nyquist frequency.
fn freq_to_index(freq: f32, config: &DetectorConfig) -> usize {
    let bandwidth = config.bandwidth();
    let nyquist = config.sampling_rate as f32 / 2.0;
    if freq < bandwidth {
        return 0;
    }
    if freq > nyquist - bandwidth {
        return config.buffer_size / 2;
    }
    let fraction = freq / config.sampling_rate as f32;
    libm::roundf(config.buffer_size as f32 * fraction) as usize
}
