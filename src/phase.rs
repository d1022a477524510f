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
//! Module for [`PhaseScorer`]: decides, frame by frame, whether "now" is
//! aligned with the beat grid implied by the current tempo estimate.

use crate::util::wrap_index;

/// Scores each frame's alignment with an assumed beat grid across a rolling
/// window of frames.
///
/// For every alignment lag `j` around the current tempo, the score
/// ("notation") of the frame is the current onset plus the score of the
/// frame `j` frames ago, minus a quadratic log-ratio penalty for `j`
/// deviating from the tempo. The frame is a candidate beat iff, after
/// writing its own score, it holds the maximum of the whole window.
///
/// Scores are cumulative, so after every write the window minimum is
/// subtracted from all slots to keep the values from drifting off.
#[derive(Debug)]
pub(crate) struct PhaseScorer {
    notations: Vec<f32>,
    change_threshold: f32,
}

impl PhaseScorer {
    pub fn new(ring_buffer_size: usize, change_threshold: f32) -> Self {
        Self {
            notations: vec![0.0; ring_buffer_size],
            change_threshold,
        }
    }

    /// Scores the frame written at ring slot `write_idx` and returns whether
    /// it is a candidate beat.
    ///
    /// During warm-up (`tempo == 0`) and when the tempo is too large for the
    /// window, the raw onset is written, the window is still normalized, and
    /// the frame is never a candidate.
    pub fn update(&mut self, onset: f32, tempo: usize, write_idx: usize) -> bool {
        let len = self.notations.len();
        debug_assert!(write_idx < len);

        let low = tempo / 2;
        let high = len.min(2 * tempo);
        if tempo == 0 || low >= high {
            self.notations[write_idx] = onset;
            self.normalize();
            return false;
        }

        let penalty_scale = self.change_threshold * 100.0;
        let mut best = f32::NEG_INFINITY;
        for j in low..high {
            let aligned = self.notations[wrap_index(write_idx as isize - j as isize, len)];
            let deviation = libm::logf(j as f32 / tempo as f32);
            let notation = onset + aligned - penalty_scale * deviation * deviation;
            // Strictly greater: on a tie the earlier (smaller) j stays.
            if notation > best {
                best = notation;
            }
        }
        self.notations[write_idx] = best;

        self.normalize();
        index_of_max(&self.notations) == write_idx
    }

    /// Subtracts the window minimum from every slot. Afterwards the minimum
    /// is exactly 0.
    fn normalize(&mut self) {
        let minimum = self
            .notations
            .iter()
            .copied()
            .fold(f32::INFINITY, f32::min);
        for notation in &mut self.notations {
            *notation -= minimum;
        }
    }

    #[cfg(test)]
    pub fn notations(&self) -> &[f32] {
        &self.notations
    }

    /// Clears all scores, returning the window to its stream-start state.
    pub fn reset(&mut self) {
        self.notations.fill(0.0);
    }
}

/// Index of the maximum value, scanning in ascending order with a
/// strictly-greater comparison: ties resolve to the lowest index, every
/// run.
fn index_of_max(values: &[f32]) -> usize {
    let mut max = values[0];
    let mut max_idx = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > max {
            max = value;
            max_idx = i;
        }
    }
    max_idx
}
