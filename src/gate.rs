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
//! Module for [`BeatGate`]: optional rate limiting between candidate beats
//! and the emitted beat event.

/// Applies a minimum inter-beat spacing derived from the current tempo
/// before a candidate beat is emitted.
///
/// The frames-since-beat counter advances every frame, candidate or not,
/// before the emission check; this matches the original detector and means
/// the spacing between two emitted beats is always strictly greater than
/// `tempo / limit_amount` frames.
#[derive(Debug)]
pub(crate) struct BeatGate {
    limit_beats: bool,
    limit_amount: u32,
    frames_since_beat: u32,
}

impl BeatGate {
    pub fn new(limit_beats: bool, limit_amount: u32) -> Self {
        Self {
            limit_beats,
            limit_amount,
            frames_since_beat: 0,
        }
    }

    /// Called exactly once per frame. Returns whether the beat event fires
    /// on this tick.
    ///
    /// `tempo == 0` (warm-up) suppresses emission; the rate limit divisor
    /// would be meaningless without a tempo.
    pub fn decide(&mut self, candidate: bool, tempo: usize) -> bool {
        self.frames_since_beat = self.frames_since_beat.saturating_add(1);

        if !candidate || tempo == 0 {
            return false;
        }

        if self.limit_beats {
            let min_spacing = tempo as u32 / self.limit_amount;
            if self.frames_since_beat > min_spacing {
                self.frames_since_beat = 0;
                true
            } else {
                false
            }
        } else {
            self.frames_since_beat = 0;
            true
        }
    }

    pub fn reset(&mut self) {
        self.frames_since_beat = 0;
    }
}
