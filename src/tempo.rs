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
//! Module for [`TempoEstimator`]: infers the dominant onset periodicity
//! (tempo) from a stream of onset values.

use crate::util::wrap_index;
use core::cmp::Ordering;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

/// Center of the tempo-plausibility prior.
const REFERENCE_BPM: f32 = 120.0;

/// Number of recent BPM estimates kept for the median-smoothed readout.
const BPM_HISTORY_LEN: usize = 9;

/// Scores every candidate lag with an exponentially smoothed delayed
/// correlation of the onset signal against itself, weighted by a
/// log-Gaussian tempo prior centered at 120 BPM.
///
/// For lag `i`, the accumulator tracks the running cross-product of the
/// current onset with the onset `i` frames ago:
///
/// ```text
/// output[i] += (1 - smooth_decay) * (onset[t] * onset[t - i] - output[i])
/// ```
///
/// With the default `smooth_decay` of 0.997 the effective memory is about
/// 333 frames (~8 s at the default frame period), which is what makes the
/// estimate a short-horizon one.
#[derive(Debug)]
pub(crate) struct TempoEstimator {
    /// Circular onset history; one slot per candidate lag.
    onsets: Vec<f32>,
    /// Smoothed correlation per lag. The only per-frame mutable table.
    outputs: Vec<f32>,
    /// Tempo-plausibility prior per lag, precomputed at construction.
    /// `weights[0]` is 0 so that lag 0 is never selectable.
    weights: Vec<f32>,
    /// BPM equivalent per lag, `60 / (frame_period * i)`.
    bpms: Vec<f32>,
    idx: usize,
    smooth_decay: f32,
    current_lag: usize,
    bpm_history: ConstGenericRingBuffer<f32, BPM_HISTORY_LEN>,
}

impl TempoEstimator {
    /// `octave_width` is the width of the tempo prior in octaves; the
    /// original estimator derives it as twice the analyzer's bin bandwidth.
    pub fn new(max_lag: usize, smooth_decay: f32, frame_period: f32, octave_width: f32) -> Self {
        let mut bpms = vec![0.0; max_lag];
        let mut weights = vec![0.0; max_lag];
        for i in 1..max_lag {
            let bpm = 60.0 / (frame_period * i as f32);
            let deviation = libm::logf(bpm / REFERENCE_BPM) / libm::logf(2.0) / octave_width;
            bpms[i] = bpm;
            weights[i] = libm::expf(-0.5 * deviation * deviation);
        }
        // bpm[0] would be a division by zero; the weight of 0 keeps the
        // lag out of every argmax.
        bpms[0] = f32::INFINITY;

        Self {
            onsets: vec![0.0; max_lag],
            outputs: vec![0.0; max_lag],
            weights,
            bpms,
            idx: 0,
            smooth_decay,
            current_lag: 0,
            bpm_history: ConstGenericRingBuffer::new(),
        }
    }

    /// Feeds one onset value, updates all lag accumulators and re-selects
    /// the best-scoring lag.
    pub fn update(&mut self, onset: f32) {
        let max_lag = self.onsets.len();
        self.onsets[self.idx] = onset;

        for i in 0..max_lag {
            let delayed = self.onsets[wrap_index(self.idx as isize - i as isize, max_lag)];
            self.outputs[i] += (1.0 - self.smooth_decay) * (onset * delayed - self.outputs[i]);
        }

        self.idx += 1;
        if self.idx >= max_lag {
            self.idx = 0;
        }

        self.current_lag = self.select_lag();
        if self.current_lag > 0 {
            self.bpm_history.push(self.bpms[self.current_lag]);
        }
    }

    /// Argmax of `sqrt(weight[i] * output[i])` over lags `1..max_lag`.
    /// Negative radicands (correlation products can be negative) and
    /// non-finite scores count as 0. Strictly-greater comparison, so the
    /// first maximum wins and a tie never flips the estimate.
    fn select_lag(&self) -> usize {
        let mut best_score = 0.0_f32;
        let mut best_lag = 0;
        for i in 1..self.outputs.len() {
            let radicand = self.weights[i] * self.outputs[i];
            if !(radicand.is_finite() && radicand > 0.0) {
                continue;
            }
            let score = libm::sqrtf(radicand);
            if score > best_score {
                best_score = score;
                best_lag = i;
            }
        }
        best_lag
    }

    /// The currently estimated tempo as a lag in frames. 0 means no lag has
    /// scored yet (warm-up).
    pub fn current_lag(&self) -> usize {
        self.current_lag
    }

    /// BPM equivalent of a lag. Only meaningful for `lag > 0`.
    pub fn lag_bpm(&self, lag: usize) -> f32 {
        self.bpms[lag]
    }

    /// Median of the recent BPM estimates, a readout that does not jump on
    /// a single-frame flip of the argmax. `None` during warm-up.
    pub fn bpm(&self) -> Option<f32> {
        if self.bpm_history.is_empty() {
            return None;
        }
        let mut values = [0.0_f32; BPM_HISTORY_LEN];
        let len = self.bpm_history.len();
        for (slot, &value) in values.iter_mut().zip(self.bpm_history.iter()) {
            *slot = value;
        }
        values[..len].sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Some(values[len / 2])
    }

    /// Returns the estimator to its stream-start state without
    /// reallocating.
    pub fn reset(&mut self) {
        self.onsets.fill(0.0);
        self.outputs.fill(0.0);
        self.idx = 0;
        self.current_lag = 0;
        self.bpm_history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DetectorConfig;
    use assert2::check;

    fn default_estimator() -> TempoEstimator {
        let config = DetectorConfig::default();
        TempoEstimator::new(
            config.max_lag,
            config.smooth_decay,
            config.frame_period(),
            config.bandwidth() * 2.0,
        )
    }

    #[test]
    fn weights_center_on_reference_tempo() {
        let estimator = default_estimator();
        // lag 22 ~= 117 BPM at the default frame period, the closest lag
        // to 120 BPM. Its prior must beat far-away tempos.
        check!(estimator.weights[22] > estimator.weights[99]);
        check!(estimator.weights[0] == 0.0);
    }

    #[test]
    fn silent_stream_never_selects_a_lag() {
        let mut estimator = default_estimator();
        for _ in 0..500 {
            estimator.update(0.0);
        }
        check!(estimator.current_lag() == 0);
        check!(estimator.bpm() == None);
    }

    #[test]
    fn impulse_train_locks_onto_its_period() {
        for period in [25_usize, 40] {
            let mut estimator = default_estimator();
            for frame in 0..2000 {
                let onset = if frame % period == 0 { 1.0 } else { 0.0 };
                estimator.update(onset);
            }
            check!(
                estimator.current_lag() == period,
                "expected lag {period}, got {}",
                estimator.current_lag()
            );
            check!(estimator.bpm().is_some());
        }
    }

    #[test]
    fn negative_correlation_products_score_zero() {
        let mut estimator = default_estimator();
        // Alternating onset signs make odd-lag products negative. This must
        // not panic on sqrt of a negative radicand and never select an
        // odd lag.
        for frame in 0..600 {
            let onset = if frame % 2 == 0 { 1.0 } else { -1.0 };
            estimator.update(onset);
        }
        let lag = estimator.current_lag();
        check!(lag % 2 == 0, "odd lag {lag} has a negative correlation");
    }

    #[test]
    fn reset_clears_the_estimate() {
        let mut estimator = default_estimator();
        for frame in 0..500 {
            estimator.update(if frame % 25 == 0 { 1.0 } else { 0.0 });
        }
        check!(estimator.current_lag() != 0);
        estimator.reset();
        check!(estimator.current_lag() == 0);
        check!(estimator.bpm() == None);
    }
}
