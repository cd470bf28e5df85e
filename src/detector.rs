//! Multi-pitch facade: composes the ring buffer, spectral analyzer, and
//! peak selector behind a single `process` entry point.

use crate::config::AnalyzerConfig;
use crate::peak::{select_peaks, Maximum, PeakSelectorConfig, K_MAXIMA};
use crate::ring_buffer::RingBuffer;
use crate::spectral::SpectralAnalyzer;
use crate::temperament::Temperament;

/// Result of one `process` call: up to [`K_MAXIMA`] detected peaks,
/// ordered by ascending bin index (and thus ascending frequency).
#[derive(Debug, Clone, Default)]
pub struct MultiPitchResult {
    pub valid: bool,
    pub maxima: Vec<Maximum>,
}

impl MultiPitchResult {
    /// The lowest-frequency accepted peak, if any.
    pub fn primary(&self) -> Option<&Maximum> {
        self.maxima.first()
    }
}

/// Streaming multi-pitch detector. Owns all analysis state; `process`
/// must be called from a single thread in audio-stream order (see the
/// crate-level docs for the ordering and real-time constraints this
/// implies).
pub struct MultiPitchDetector {
    hop_size: usize,
    ring: RingBuffer,
    spectral: SpectralAnalyzer,
    config: AnalyzerConfig,
}

impl MultiPitchDetector {
    pub fn new(sample_rate: f64, fft_size: usize, hop_size: usize, a_reference: f64) -> Self {
        tracing::debug!(sample_rate, fft_size, hop_size, a_reference, "constructing multi-pitch detector");
        Self {
            hop_size,
            ring: RingBuffer::new(fft_size),
            spectral: SpectralAnalyzer::new(sample_rate, fft_size, hop_size),
            config: AnalyzerConfig {
                a_reference,
                ..AnalyzerConfig::default()
            },
        }
    }

    /// Accumulate `samples` (typically `hop_size` of them) into the
    /// analysis frame and produce a detection result for the updated
    /// frame. An empty `samples` slice leaves the frame unchanged but
    /// still analyzes it; a block longer than the frame keeps only its
    /// tail.
    pub fn process(&mut self, samples: &[f64]) -> MultiPitchResult {
        let frame = self.ring.push(samples);
        let spectral = self.spectral.analyze(frame);

        let selector_config = PeakSelectorConfig {
            a_reference: self.config.a_reference,
            temperament: self.config.temperament,
            key: self.config.key,
            fundamental_filter: self.config.fundamental_filter,
            octave_filter: self.config.octave_filter,
            downsample: self.config.downsample,
            min_magnitude: self.config.min_magnitude,
        };

        let maxima = select_peaks(spectral.mag, spectral.dmag, spectral.freq, &selector_config);
        debug_assert!(maxima.len() <= K_MAXIMA);

        MultiPitchResult {
            valid: !maxima.is_empty(),
            maxima,
        }
    }

    pub fn set_reference(&mut self, hz: f64) {
        tracing::debug!(hz, "set reference frequency");
        self.config.set_reference(hz);
    }

    pub fn set_temperament(&mut self, temperament: Temperament) {
        tracing::debug!(%temperament, "set temperament");
        self.config.set_temperament(temperament);
    }

    pub fn set_key(&mut self, key: i32) {
        self.config.set_key(key);
        tracing::debug!(key = self.config.key, "set key");
    }

    pub fn set_fundamental_filter(&mut self, enabled: bool) {
        self.config.set_fundamental_filter(enabled);
    }

    pub fn set_octave_filter(&mut self, enabled: bool) {
        self.config.set_octave_filter(enabled);
    }

    pub fn set_downsample(&mut self, enabled: bool) {
        self.config.set_downsample(enabled);
    }

    pub fn set_min_magnitude(&mut self, magnitude: f64) {
        self.config.set_min_magnitude(magnitude);
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Fixed FFT/analysis-frame size.
    pub fn fft_size(&self) -> usize {
        self.ring.len()
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Reset to a state bit-identical to a freshly constructed analyzer
    /// with the current configuration preserved.
    pub fn reset(&mut self) {
        tracing::trace!("resetting multi-pitch detector state");
        self.ring.reset();
        self.spectral.reset();
    }
}
