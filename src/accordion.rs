//! Accordion reed tuning: grouping several near-coincident spectral
//! peaks into the reeds of one nominal note, plus their beat frequencies.

use crate::config::REED_MIN_MAGNITUDE;
use crate::detector::MultiPitchDetector;
use crate::peak::Maximum;
use crate::spectrum::{DecimatedSpectrum, SpectrumAnalyzer};
use crate::temperament::Temperament;

const MIN_MAX_REEDS: usize = 1;
const MAX_MAX_REEDS: usize = 4;
const MIN_REED_SPREAD: f64 = 10.0;
const MAX_REED_SPREAD: f64 = 100.0;

/// Default analysis frame size, matching [`crate::detector::MultiPitchDetector`]'s
/// own default: the accordion facade hardcodes the same analysis constants
/// since its public constructor (per spec section 6) takes reed parameters
/// in their place, not FFT sizing.
const DEFAULT_FFT_SIZE: usize = 16384;
const DEFAULT_HOP_SIZE: usize = 1024;

/// One reed within a detected group: its frequency, cents deviation from
/// the group's reference, and magnitude (used as a confidence proxy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReedInfo {
    pub frequency: f64,
    pub cents: f64,
    pub magnitude: f64,
}

/// Result of one accordion `process` call.
#[derive(Debug, Clone)]
pub struct AccordionResult {
    pub valid: bool,
    pub note_name: &'static str,
    pub octave: i32,
    pub ref_frequency: f64,
    pub reeds: Vec<ReedInfo>,
    pub beat_frequencies: Vec<f64>,
    pub spectrum: Option<DecimatedSpectrum>,
}

impl Default for AccordionResult {
    fn default() -> Self {
        Self {
            valid: false,
            note_name: "",
            octave: 0,
            ref_frequency: 0.0,
            reeds: Vec::new(),
            beat_frequencies: Vec::new(),
            spectrum: None,
        }
    }
}

impl AccordionResult {
    pub fn reed_count(&self) -> usize {
        self.reeds.len()
    }

    pub fn average_cents(&self) -> f64 {
        if self.reeds.is_empty() {
            return 0.0;
        }
        self.reeds.iter().map(|r| r.cents).sum::<f64>() / self.reeds.len() as f64
    }
}

/// Group `maxima` (already sorted by ascending bin/frequency, as
/// returned by [`crate::peak::select_peaks`]) into reeds of the note
/// carried by the strongest (first) peak: same note or an adjacent
/// semitone, within `reed_spread_cents` of the primary peak's reference
/// frequency, capped at `max_reeds` and returned sorted by frequency.
pub fn group_reeds(maxima: &[Maximum], max_reeds: usize, reed_spread_cents: f64) -> Vec<ReedInfo> {
    let Some(primary) = maxima.first() else {
        return Vec::new();
    };

    let mut reeds: Vec<ReedInfo> = Vec::with_capacity(max_reeds);
    for m in maxima {
        if reeds.len() >= max_reeds {
            break;
        }

        if (m.note - primary.note).abs() > 1 {
            continue;
        }

        let cents_from_ref = if primary.ref_frequency > 0.0 {
            1200.0 * (m.frequency / primary.ref_frequency).log2()
        } else {
            m.cents
        };

        if cents_from_ref.abs() > reed_spread_cents {
            continue;
        }

        reeds.push(ReedInfo {
            frequency: m.frequency,
            cents: cents_from_ref,
            magnitude: m.magnitude,
        });
    }

    reeds.sort_by(|a, b| a.frequency.partial_cmp(&b.frequency).unwrap());
    reeds
}

/// Detector for accordion reed tuning: finds multiple frequency peaks
/// that correspond to one musical note, typically 2-4 reeds tuned
/// slightly apart for tremolo/musette effects.
pub struct AccordionDetector {
    detector: MultiPitchDetector,
    spectrum: Option<SpectrumAnalyzer>,
    max_reeds: usize,
    reed_spread_cents: f64,
}

impl AccordionDetector {
    /// `max_reeds` is clamped to `[1, 4]`, `reed_spread_cents` to `[10,
    /// 100]`. The analysis frame and hop are fixed at construction
    /// (matching [`DEFAULT_FFT_SIZE`]/[`DEFAULT_HOP_SIZE`]) since this
    /// facade's public constructor takes reed parameters in their place.
    pub fn new(sample_rate: f64, a_reference: f64, max_reeds: usize, reed_spread_cents: f64) -> Self {
        let max_reeds = max_reeds.clamp(MIN_MAX_REEDS, MAX_MAX_REEDS);
        let reed_spread_cents = reed_spread_cents.clamp(MIN_REED_SPREAD, MAX_REED_SPREAD);
        tracing::debug!(sample_rate, a_reference, max_reeds, reed_spread_cents, "constructing accordion detector");

        let mut detector = MultiPitchDetector::new(sample_rate, DEFAULT_FFT_SIZE, DEFAULT_HOP_SIZE, a_reference);
        detector.set_octave_filter(false);
        detector.set_min_magnitude(REED_MIN_MAGNITUDE);

        Self {
            detector,
            spectrum: Some(SpectrumAnalyzer::new(sample_rate, DEFAULT_FFT_SIZE)),
            max_reeds,
            reed_spread_cents,
        }
    }

    /// Enable or disable the extra display-spectrum FFT pass. Enabled by
    /// default; disabling it skips `analyze`'s second FFT entirely.
    pub fn with_spectrum(mut self, enabled: bool) -> Self {
        if !enabled {
            self.spectrum = None;
        }
        self
    }

    pub fn process(&mut self, samples: &[f64]) -> AccordionResult {
        let multi_result = self.detector.process(samples);
        let spectrum = self.spectrum.as_mut().map(|s| s.analyze(samples));

        if !multi_result.valid || multi_result.maxima.is_empty() {
            return AccordionResult {
                spectrum,
                ..AccordionResult::default()
            };
        }

        let reeds = group_reeds(&multi_result.maxima, self.max_reeds, self.reed_spread_cents);
        if reeds.is_empty() {
            return AccordionResult {
                spectrum,
                ..AccordionResult::default()
            };
        }

        let beat_frequencies = reeds.windows(2).map(|pair| (pair[0].frequency - pair[1].frequency).abs()).collect();

        let primary = &multi_result.maxima[0];

        AccordionResult {
            valid: true,
            note_name: primary.note_name,
            octave: primary.octave,
            ref_frequency: primary.ref_frequency,
            reeds,
            beat_frequencies,
            spectrum,
        }
    }

    pub fn set_reference(&mut self, hz: f64) {
        self.detector.set_reference(hz);
    }

    pub fn set_temperament(&mut self, temperament: Temperament) {
        self.detector.set_temperament(temperament);
    }

    pub fn set_key(&mut self, key: i32) {
        self.detector.set_key(key);
    }

    pub fn set_max_reeds(&mut self, count: usize) {
        self.max_reeds = count.clamp(MIN_MAX_REEDS, MAX_MAX_REEDS);
        tracing::debug!(max_reeds = self.max_reeds, "set max reeds");
    }

    pub fn set_reed_spread(&mut self, cents: f64) {
        self.reed_spread_cents = cents.clamp(MIN_REED_SPREAD, MAX_REED_SPREAD);
        tracing::debug!(reed_spread_cents = self.reed_spread_cents, "set reed spread");
    }

    pub fn reset(&mut self) {
        self.detector.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maximum(note: i32, note_name: &'static str, octave: i32, frequency: f64, ref_frequency: f64, magnitude: f64) -> Maximum {
        Maximum {
            frequency,
            ref_frequency,
            note,
            cents: 1200.0 * (frequency / ref_frequency).log2(),
            note_name,
            octave,
            magnitude,
        }
    }

    #[test]
    fn group_reeds_keeps_only_close_peaks_within_spread() {
        let maxima = vec![
            maximum(57, "A", 4, 440.0, 440.0, 1.0),
            maximum(57, "A", 4, 443.0, 440.0, 0.8),
            maximum(59, "B", 4, 493.88, 493.88, 0.9),
        ];
        let reeds = group_reeds(&maxima, 4, 50.0);
        assert_eq!(reeds.len(), 2);
        assert_eq!(reeds[0].frequency, 440.0);
        assert_eq!(reeds[1].frequency, 443.0);
    }

    #[test]
    fn group_reeds_respects_max_reeds_cap() {
        let maxima = vec![
            maximum(57, "A", 4, 438.0, 440.0, 1.0),
            maximum(57, "A", 4, 440.0, 440.0, 0.9),
            maximum(57, "A", 4, 442.0, 440.0, 0.8),
            maximum(57, "A", 4, 444.0, 440.0, 0.7),
        ];
        let reeds = group_reeds(&maxima, 2, 50.0);
        assert_eq!(reeds.len(), 2);
    }

    #[test]
    fn group_reeds_rejects_peaks_outside_spread() {
        let maxima = vec![maximum(57, "A", 4, 440.0, 440.0, 1.0), maximum(57, "A", 4, 460.0, 440.0, 0.5)];
        let reeds = group_reeds(&maxima, 4, 10.0);
        assert_eq!(reeds.len(), 1);
    }

    #[test]
    fn empty_maxima_yields_no_reeds() {
        assert!(group_reeds(&[], 4, 50.0).is_empty());
    }

    #[test]
    fn set_max_reeds_clamps_to_one_through_four() {
        let mut det = AccordionDetector::new(11025.0, 440.0, 4, 50.0);
        det.set_max_reeds(0);
        assert_eq!(det.max_reeds, 1);
        det.set_max_reeds(99);
        assert_eq!(det.max_reeds, 4);
    }

    #[test]
    fn set_reed_spread_clamps_to_ten_through_hundred() {
        let mut det = AccordionDetector::new(11025.0, 440.0, 4, 50.0);
        det.set_reed_spread(0.0);
        assert_eq!(det.reed_spread_cents, 10.0);
        det.set_reed_spread(1000.0);
        assert_eq!(det.reed_spread_cents, 100.0);
    }

    #[test]
    fn silence_is_invalid_but_spectrum_present_when_enabled() {
        let mut det = AccordionDetector::new(11025.0, 440.0, 4, 50.0);
        let result = det.process(&[0.0; 1024]);
        assert!(!result.valid);
        assert!(result.spectrum.is_some());
    }

    #[test]
    fn disabling_spectrum_skips_the_extra_pass() {
        let mut det = AccordionDetector::new(11025.0, 440.0, 4, 50.0).with_spectrum(false);
        let result = det.process(&[0.0; 1024]);
        assert!(result.spectrum.is_none());
    }
}
