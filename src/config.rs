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
//! Configuration surface of the detector. All tuning knobs live in
//! [`DetectorConfig`]; misconfiguration is rejected once at construction
//! time, never at tick time.

/// Configuration for a [`crate::BeatDetector`].
///
/// The defaults correspond to a 1024-bin spectrum at 44100 Hz and are a good
/// starting point for music playback. All buffers of the detector are sized
/// from this configuration once; the per-tick processing cost is
/// `O(band_count + max_lag + ring_buffer_size)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Length of each incoming spectrum frame (number of FFT bins).
    /// Frames with a different length are rejected.
    pub buffer_size: usize,
    /// Sample rate of the audio stream the spectra were computed from, in Hz.
    pub sampling_rate: u32,
    /// Number of logarithmically spaced frequency bands the spectrum is
    /// reduced to before onset computation.
    pub band_count: usize,
    /// Number of candidate lags (in frames) the tempo estimator scores.
    /// The estimated tempo is always one of `1..max_lag`.
    pub max_lag: usize,
    /// One-pole smoothing factor of the delayed-correlation accumulators,
    /// in `(0, 1)`. The effective memory is about `1 / (1 - smooth_decay)`
    /// frames.
    pub smooth_decay: f32,
    /// Length of the rolling window (in frames) used for phase scoring.
    pub ring_buffer_size: usize,
    /// Strength of the penalty applied when a frame's alignment lag deviates
    /// from the current tempo estimate.
    pub change_threshold: f32,
    /// Whether to rate-limit emitted beats based on the current tempo.
    pub limit_beats: bool,
    /// Divisor for the rate limit: with limiting enabled, a beat is only
    /// emitted when more than `tempo / limit_amount` frames have passed
    /// since the previous one.
    pub limit_amount: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            sampling_rate: 44100,
            band_count: 12,
            max_lag: 100,
            smooth_decay: 0.997,
            ring_buffer_size: 120,
            change_threshold: 0.1,
            limit_beats: false,
            limit_amount: 2,
        }
    }
}

impl DetectorConfig {
    /// Duration of one analysis frame in seconds.
    pub fn frame_period(&self) -> f32 {
        self.buffer_size as f32 / self.sampling_rate as f32
    }

    /// Frequency resolution used to clamp band edges. Matches the original
    /// estimator: half the width of one FFT bin.
    pub(crate) fn bandwidth(&self) -> f32 {
        (2.0 / self.buffer_size as f32) * (self.sampling_rate as f32 / 2.0) * 0.5
    }

    /// Checks all invariants of the configuration. Called by
    /// [`crate::BeatDetector::new`]; a failing configuration never reaches
    /// the per-tick code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size < 2 {
            return Err(ConfigError::BufferSizeTooSmall(self.buffer_size));
        }
        if self.sampling_rate == 0 {
            return Err(ConfigError::SamplingRateZero);
        }
        if self.band_count == 0 {
            return Err(ConfigError::BandCountZero);
        }
        // More bands than usable spectrum bins can not partition [0, N/2].
        if self.band_count > self.buffer_size / 2 + 1 {
            return Err(ConfigError::TooManyBands {
                band_count: self.band_count,
                buffer_size: self.buffer_size,
            });
        }
        if self.max_lag < 2 {
            return Err(ConfigError::MaxLagTooSmall(self.max_lag));
        }
        if self.ring_buffer_size == 0 {
            return Err(ConfigError::RingBufferSizeZero);
        }
        if !(self.smooth_decay > 0.0 && self.smooth_decay < 1.0) {
            return Err(ConfigError::SmoothDecayOutOfRange(self.smooth_decay));
        }
        if !self.change_threshold.is_finite() || self.change_threshold < 0.0 {
            return Err(ConfigError::ChangeThresholdInvalid(self.change_threshold));
        }
        if self.limit_beats && self.limit_amount == 0 {
            return Err(ConfigError::LimitAmountZero);
        }
        Ok(())
    }
}

/// Fatal configuration error, reported by [`crate::BeatDetector::new`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// `buffer_size` must be at least 2.
    #[error("buffer_size must be at least 2, got {0}")]
    BufferSizeTooSmall(usize),
    /// `sampling_rate` must be positive.
    #[error("sampling_rate must be positive")]
    SamplingRateZero,
    /// `band_count` must be at least 1.
    #[error("band_count must be at least 1")]
    BandCountZero,
    /// `band_count` exceeds the number of usable spectrum bins.
    #[error("band_count {band_count} is too large for buffer_size {buffer_size}")]
    TooManyBands {
        /// Configured number of bands.
        band_count: usize,
        /// Configured spectrum length.
        buffer_size: usize,
    },
    /// `max_lag` must be at least 2 so that at least lag 1 is selectable.
    #[error("max_lag must be at least 2, got {0}")]
    MaxLagTooSmall(usize),
    /// `ring_buffer_size` must be at least 1.
    #[error("ring_buffer_size must be at least 1")]
    RingBufferSizeZero,
    /// `smooth_decay` must lie strictly between 0 and 1.
    #[error("smooth_decay must be in (0, 1), got {0}")]
    SmoothDecayOutOfRange(f32),
    /// `change_threshold` must be finite and non-negative.
    #[error("change_threshold must be finite and non-negative, got {0}")]
    ChangeThresholdInvalid(f32),
    /// `limit_amount` must be at least 1 when `limit_beats` is enabled.
    #[error("limit_amount must be at least 1 when limit_beats is enabled")]
    LimitAmountZero,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn default_config_is_valid() {
        check!(DetectorConfig::default().validate() == Ok(()));
    }

    #[test]
    fn frame_period_matches_defaults() {
        let config = DetectorConfig::default();
        // 1024 / 44100 ~= 23.2 ms
        check!((config.frame_period() - 0.02322).abs() < 1e-4);
    }

    #[test]
    fn rejects_too_many_bands() {
        let config = DetectorConfig {
            buffer_size: 8,
            ..Default::default()
        };
        check!(
            config.validate()
                == Err(ConfigError::TooManyBands {
                    band_count: 12,
                    buffer_size: 8,
                })
        );
    }

    #[test]
    fn rejects_degenerate_scalars() {
        let base = DetectorConfig::default;

        let config = DetectorConfig {
            buffer_size: 1,
            ..base()
        };
        check!(config.validate() == Err(ConfigError::BufferSizeTooSmall(1)));

        let config = DetectorConfig {
            sampling_rate: 0,
            ..base()
        };
        check!(config.validate() == Err(ConfigError::SamplingRateZero));

        let config = DetectorConfig {
            band_count: 0,
            ..base()
        };
        check!(config.validate() == Err(ConfigError::BandCountZero));

        let config = DetectorConfig {
            max_lag: 1,
            ..base()
        };
        check!(config.validate() == Err(ConfigError::MaxLagTooSmall(1)));

        let config = DetectorConfig {
            ring_buffer_size: 0,
            ..base()
        };
        check!(config.validate() == Err(ConfigError::RingBufferSizeZero));

        let config = DetectorConfig {
            smooth_decay: 1.0,
            ..base()
        };
        check!(config.validate() == Err(ConfigError::SmoothDecayOutOfRange(1.0)));

        let config = DetectorConfig {
            change_threshold: f32::NAN,
            ..base()
        };
        check!(matches!(
            config.validate(),
            Err(ConfigError::ChangeThresholdInvalid(_))
        ));

        let config = DetectorConfig {
            limit_beats: true,
            limit_amount: 0,
            ..base()
        };
        check!(config.validate() == Err(ConfigError::LimitAmountZero));
    }
}
