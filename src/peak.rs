//! Multi-peak selection with octave/harmonic suppression.

use crate::note::{nearest_note, note_name, octave};
use crate::temperament::{reference_frequency, Temperament};

/// Maximum number of simultaneous peaks reported per frame.
pub const K_MAXIMA: usize = 8;

/// One detected spectral peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Maximum {
    /// Phase-refined frequency, Hz.
    pub frequency: f64,
    /// Temperament-mapped reference frequency for `note`, Hz.
    pub ref_frequency: f64,
    /// Chromatic note index.
    pub note: i32,
    /// Signed cents deviation from `ref_frequency`.
    pub cents: f64,
    /// Pitch-class name, e.g. "A".
    pub note_name: &'static str,
    /// Octave number.
    pub octave: i32,
    /// Normalized, scaled magnitude.
    pub magnitude: f64,
}

/// Options governing which bins are accepted as peaks.
#[derive(Debug, Clone, Copy)]
pub struct PeakSelectorConfig {
    pub a_reference: f64,
    pub temperament: Temperament,
    pub key: i32,
    pub fundamental_filter: bool,
    pub octave_filter: bool,
    pub downsample: bool,
    pub min_magnitude: f64,
}

/// Select up to [`K_MAXIMA`] peaks from a frame's magnitude/difference/
/// frequency arrays, in ascending bin-index (and thus ascending
/// frequency) order.
///
/// `limit` is re-checked at every loop iteration rather than cached: the
/// octave cap can shrink the remaining scan range mid-loop once a low
/// fundamental has been accepted, and a cached bound would silently
/// under-suppress harmonics.
pub fn select_peaks(mag: &[f64], dmag: &[f64], freq: &[f64], config: &PeakSelectorConfig) -> Vec<Maximum> {
    let range = mag.len();
    let max_val = mag.iter().cloned().fold(0.0f64, f64::max);
    if max_val < config.min_magnitude {
        return Vec::new();
    }

    let mut accepted: Vec<Maximum> = Vec::with_capacity(K_MAXIMA);
    let mut limit = range.saturating_sub(1);
    let mut k = 1usize;

    while k < range.saturating_sub(1) && k < limit && accepted.len() < K_MAXIMA {
        if !is_candidate(mag, dmag, k, max_val, config.min_magnitude) {
            k += 1;
            continue;
        }

        if freq[k] <= 0.0 {
            k += 1;
            continue;
        }

        let cents_from_a = 12.0 * (freq[k] / config.a_reference).log2();
        if cents_from_a.is_nan() {
            k += 1;
            continue;
        }

        let note = nearest_note(freq[k], config.a_reference);
        if note < 0 {
            k += 1;
            continue;
        }

        if config.fundamental_filter {
            if let Some(first) = accepted.first() {
                if note.rem_euclid(12) != first.note.rem_euclid(12) {
                    k += 1;
                    continue;
                }
            }
        }

        let ref_frequency = reference_frequency(note, config.temperament, config.key, config.a_reference);
        let cents = 1200.0 * (freq[k] / ref_frequency).log2();

        accepted.push(Maximum {
            frequency: freq[k],
            ref_frequency,
            note,
            cents,
            note_name: note_name(note),
            octave: octave(note),
            magnitude: mag[k],
        });

        if config.octave_filter && !config.downsample && limit > k * 2 {
            limit = k * 2 - 1;
        }

        k += 1;
    }

    accepted
}

#[inline]
fn is_candidate(mag: &[f64], dmag: &[f64], k: usize, max_val: f64, min_magnitude: f64) -> bool {
    if mag[k] <= min_magnitude || mag[k] <= max_val / 4.0 {
        return false;
    }
    if k + 1 >= dmag.len() {
        return false;
    }
    dmag[k] > 0.0 && dmag[k + 1] < 0.0
}
