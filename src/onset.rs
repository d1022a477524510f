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
//! Module for [`OnsetComputer`]: turns per-band averages into one scalar
//! onset (spectral flux) value per frame.

/// Floor for magnitudes before `log10`. Silence would otherwise produce
/// `-inf` and poison the flux sum.
const MAGNITUDE_EPSILON: f32 = 1e-12;

/// Reference level the per-band state starts at. Matches the original
/// estimator: the first frame produces a strongly negative onset instead of
/// a spurious positive spike.
const INITIAL_BAND_LEVEL: f32 = 100.0;

/// Converts per-band average magnitudes to a perceptual (dB-like) scale and
/// reduces the frame-to-frame change to one scalar onset value.
///
/// The previous frame's scaled values are kept per band and updated in
/// place on every call; this running reference is what makes the output a
/// flux rather than a loudness.
#[derive(Debug)]
pub(crate) struct OnsetComputer {
    previous_bands: Vec<f32>,
}

impl OnsetComputer {
    pub fn new(band_count: usize) -> Self {
        Self {
            previous_bands: vec![INITIAL_BAND_LEVEL; band_count],
        }
    }

    /// Computes the summed onset across all bands. The result can be
    /// negative (energy dropping). Non-positive or non-finite magnitudes
    /// are clamped, never an error.
    pub fn compute_onset(&mut self, bands: &[f32]) -> f32 {
        debug_assert_eq!(bands.len(), self.previous_bands.len());
        let mut onset = 0.0;
        for (previous, &average) in self.previous_bands.iter_mut().zip(bands) {
            // fmaxf returns the non-NaN operand, so this also catches NaN
            // averages from degenerate input.
            let average = libm::fmaxf(average, MAGNITUDE_EPSILON);
            let scaled = libm::fmaxf(-100.0, 20.0 * libm::log10f(average) + 160.0) * 0.025;
            onset += scaled - *previous;
            *previous = scaled;
        }
        onset
    }

    /// Returns the per-band state to its stream-start value.
    pub fn reset(&mut self) {
        self.previous_bands.fill(INITIAL_BAND_LEVEL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use float_cmp::approx_eq;

    #[test]
    fn steady_input_converges_to_zero_onset() {
        let mut computer = OnsetComputer::new(12);
        let bands = [0.5_f32; 12];

        // First frame: large transient against the initial reference.
        let first = computer.compute_onset(&bands);
        check!(first < 0.0);

        // Every following frame of the same spectrum is flux-free.
        for _ in 0..10 {
            let onset = computer.compute_onset(&bands);
            check!(approx_eq!(f32, onset, 0.0, epsilon = 1e-5));
        }
    }

    #[test]
    fn silence_is_clamped_not_a_crash() {
        let mut computer = OnsetComputer::new(12);
        let silent = [0.0_f32; 12];
        let onset = computer.compute_onset(&silent);
        check!(onset.is_finite());
        let onset = computer.compute_onset(&silent);
        check!(approx_eq!(f32, onset, 0.0, epsilon = 1e-5));
    }

    #[test]
    fn energy_increase_yields_positive_onset() {
        let mut computer = OnsetComputer::new(12);
        let quiet = [1e-6_f32; 12];
        let loud = [1.0_f32; 12];

        computer.compute_onset(&quiet);
        computer.compute_onset(&quiet);
        let onset = computer.compute_onset(&loud);
        // Per band: (20*log10(1) + 160) * 0.025 = 4.0 vs
        // (20*log10(1e-6) + 160) * 0.025 = 1.0, i.e. +3.0 each.
        check!(approx_eq!(f32, onset, 36.0, epsilon = 1e-3));
    }

    #[test]
    fn nan_magnitudes_degrade_to_the_floor() {
        let mut computer = OnsetComputer::new(2);
        let onset = computer.compute_onset(&[f32::NAN, 1.0]);
        check!(onset.is_finite());
    }

    #[test]
    fn reset_restores_the_initial_transient() {
        let mut computer = OnsetComputer::new(12);
        let bands = [0.5_f32; 12];
        let first = computer.compute_onset(&bands);
        computer.compute_onset(&bands);
        computer.reset();
        let after_reset = computer.compute_onset(&bands);
        check!(approx_eq!(f32, first, after_reset, epsilon = 1e-6));
    }
}
