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
//! spectral-beat-detector detects beats and estimates tempo in a live stream
//! of audio spectral frames.
//!
//! The caller feeds one magnitude spectrum (e.g., 1024 FFT bins from the
//! platform's audio subsystem) per analysis tick into
//! [`BeatDetector::update_and_detect_beat`]. Internally, each tick runs a
//! small pipeline:
//!
//! 1. band analysis - the spectrum is partitioned into logarithmically
//!    spaced frequency bands and averaged per band,
//! 2. onset computation - the per-band averages are moved to a dB-like
//!    scale and the summed frame-to-frame change becomes one scalar onset
//!    value (spectral flux),
//! 3. tempo estimation - a bank of exponentially smoothed delayed
//!    correlations scores how periodic the onset signal is at each candidate
//!    lag; a log-Gaussian prior around 120 BPM picks the most plausible lag,
//! 4. phase scoring - each frame's alignment with the assumed beat grid is
//!    scored against a rolling window; the current frame is a beat candidate
//!    iff it is the window's maximum,
//! 5. rate limiting - an optional gate enforces a minimum inter-beat
//!    spacing derived from the tempo before the beat is reported.
//!
//! Everything is synchronous and single-threaded; one tick is
//! `O(band_count + max_lag + ring_buffer_size)` and performs no allocation,
//! so the detector comfortably meets the real-time deadline of one frame
//! duration (~23 ms at 44100 Hz / 1024 samples).
//!
//! ## Example
//! ```rust
//! use spectral_beat_detector::{BeatDetector, DetectorConfig};
//!
//! let mut detector = BeatDetector::new(DetectorConfig::default()).unwrap();
//!
//! // Call this once per spectrum coming from your FFT/audio subsystem.
//! let spectrum = vec![0.0_f32; 1024];
//! let beat = detector.update_and_detect_beat(&spectrum).unwrap();
//! assert!(beat.is_none());
//! ```

mod band;
mod beat_detector;
mod config;
mod gate;
mod onset;
mod phase;
mod tempo;
mod util;

#[cfg(test)]
mod test_utils;

pub use beat_detector::{BeatDetector, BeatInfo, InvalidFrameError};
pub use config::{ConfigError, DetectorConfig};
