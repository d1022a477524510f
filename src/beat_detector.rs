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
//! Module for [`BeatDetector`].

use crate::band::BandAnalyzer;
use crate::config::{ConfigError, DetectorConfig};
use crate::gate::BeatGate;
use crate::onset::OnsetComputer;
use crate::phase::PhaseScorer;
use crate::tempo::TempoEstimator;

/// Information about an emitted beat.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeatInfo {
    /// Number of the frame the beat fired on, counted from stream start.
    pub frame_index: u64,
    /// The tempo estimate at emission time, as a lag in frames.
    pub tempo_lag: usize,
    /// BPM equivalent of `tempo_lag`.
    pub bpm: f32,
}

/// The spectrum frame passed to the detector does not have the configured
/// length. The detector never truncates or pads silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("spectrum frame has {actual} values, the detector is configured for {expected}")]
pub struct InvalidFrameError {
    /// The configured `buffer_size`.
    pub expected: usize,
    /// Length of the frame that was passed.
    pub actual: usize,
}

/// Streaming beat and tempo detector over audio spectral frames.
///
/// One instance owns all state for one audio stream: feed it one magnitude
/// spectrum per analysis tick via [`Self::update_and_detect_beat`] and it
/// answers, synchronously, whether that tick is a beat. The instance is not
/// reentrant and must not be shared between streams; start a second stream
/// with a second instance or [`Self::reset`].
///
/// ## Example
/// ```rust
/// use spectral_beat_detector::{BeatDetector, DetectorConfig};
///
/// let mut detector = BeatDetector::new(DetectorConfig::default()).unwrap();
/// // One spectrum per tick, e.g. from your platform's FFT.
/// let spectrum = vec![0.0_f32; 1024];
/// if let Some(beat) = detector.update_and_detect_beat(&spectrum).unwrap() {
///     println!("beat! ~{:.0} bpm", beat.bpm);
/// }
/// ```
#[derive(Debug)]
pub struct BeatDetector {
    config: DetectorConfig,
    bands: BandAnalyzer,
    onset: OnsetComputer,
    tempo: TempoEstimator,
    phase: PhaseScorer,
    gate: BeatGate,
    /// Raw onset per recent frame, kept for diagnostics/visualization.
    onsets: Vec<f32>,
    /// Circular write position shared by the onset and notation rings.
    ring_pos: usize,
    frame_count: u64,
    warned_degenerate_input: bool,
}

impl BeatDetector {
    /// Creates a detector for one audio stream. All buffers are sized here
    /// once; processing a frame allocates nothing.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bands = BandAnalyzer::new(&config);
        let onset = OnsetComputer::new(config.band_count);
        let tempo = TempoEstimator::new(
            config.max_lag,
            config.smooth_decay,
            config.frame_period(),
            config.bandwidth() * 2.0,
        );
        let phase = PhaseScorer::new(config.ring_buffer_size, config.change_threshold);
        let gate = BeatGate::new(config.limit_beats, config.limit_amount);
        Ok(Self {
            onsets: vec![0.0; config.ring_buffer_size],
            config,
            bands,
            onset,
            tempo,
            phase,
            gate,
            ring_pos: 0,
            frame_count: 0,
            warned_degenerate_input: false,
        })
    }

    /// Consumes one spectrum frame and returns whether this tick is a beat.
    ///
    /// This is supposed to be called exactly once per analysis tick, with
    /// frames in order and none dropped or duplicated. `spectrum` must hold
    /// non-negative magnitudes and exactly `buffer_size` values.
    ///
    /// Returns at most one beat per tick. Degenerate magnitudes (zero,
    /// negative, NaN) are clamped internally and logged once per stream,
    /// never an error.
    pub fn update_and_detect_beat(
        &mut self,
        spectrum: &[f32],
    ) -> Result<Option<BeatInfo>, InvalidFrameError> {
        if spectrum.len() != self.config.buffer_size {
            return Err(InvalidFrameError {
                expected: self.config.buffer_size,
                actual: spectrum.len(),
            });
        }
        if !self.warned_degenerate_input
            && spectrum.iter().any(|m| !m.is_finite() || *m < 0.0)
        {
            log::warn!("spectrum contains non-finite or negative magnitudes; clamping");
            self.warned_degenerate_input = true;
        }

        let bands = self.bands.compute_bands(spectrum);
        let onset = self.onset.compute_onset(bands);
        self.onsets[self.ring_pos] = onset;

        self.tempo.update(onset);
        let tempo_lag = self.tempo.current_lag();

        let candidate = self.phase.update(onset, tempo_lag, self.ring_pos);
        let emit = self.gate.decide(candidate, tempo_lag);

        let info = emit.then(|| {
            let bpm = self.tempo.lag_bpm(tempo_lag);
            log::debug!(
                "beat at frame {} (lag {tempo_lag}, ~{bpm:.1} bpm)",
                self.frame_count
            );
            BeatInfo {
                frame_index: self.frame_count,
                tempo_lag,
                bpm,
            }
        });

        self.ring_pos += 1;
        if self.ring_pos >= self.config.ring_buffer_size {
            self.ring_pos = 0;
        }
        self.frame_count += 1;

        Ok(info)
    }

    /// Returns the detector to its stream-start state without reallocating.
    /// Use this instead of constructing a new instance when the same
    /// configuration analyzes a new stream.
    pub fn reset(&mut self) {
        self.onset.reset();
        self.tempo.reset();
        self.phase.reset();
        self.gate.reset();
        self.onsets.fill(0.0);
        self.ring_pos = 0;
        self.frame_count = 0;
        self.warned_degenerate_input = false;
    }

    /// The configuration the detector was built with.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Duration of one analysis frame in seconds.
    pub fn frame_period(&self) -> f32 {
        self.config.frame_period()
    }

    /// The current tempo estimate as a lag in frames; 0 during warm-up.
    pub fn tempo_lag(&self) -> usize {
        self.tempo.current_lag()
    }

    /// Median-smoothed BPM readout; `None` during warm-up.
    pub fn bpm(&self) -> Option<f32> {
        self.tempo.bpm()
    }

    /// Raw onset values of the recent frames, in ring order. Useful for
    /// driving visualizations.
    pub fn onset_history(&self) -> &[f32] {
        &self.onsets
    }

    /// Number of frames consumed since stream start (or the last reset).
    pub fn frames_processed(&self) -> u64 {
        self.frame_count
    }
}
