//! Synthetic spectrum frames for tests. The detector itself never computes
//! spectra; these helpers stand in for the platform's FFT.

/// An all-zero spectrum, i.e. perfect silence.
pub fn silent_frame(len: usize) -> Vec<f32> {
    vec![0.0; len]
}

/// A spectrum with the same magnitude in every bin. Switching between two
/// flat levels produces a clean, band-independent onset impulse.
pub fn flat_frame(len: usize, magnitude: f32) -> Vec<f32> {
    vec![magnitude; len]
}
