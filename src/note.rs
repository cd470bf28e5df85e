//! Chromatic note indexing.
//!
//! A note index is a plain integer: 0 is C0, and each unit is one
//! semitone. Octave is `index / 12`, pitch class is `index % 12`.

/// Semitones per octave.
pub const OCTAVE: i32 = 12;

/// Note index of A4 (nine semitones into the fifth octave counted from C0).
pub const C5_OFFSET: i32 = 57;

/// A's position within an octave (0 = C).
pub const A_OFFSET: i32 = 9;

/// Pitch class names, indexed by `note.rem_euclid(12)`.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Pitch class (0..11) of a note index, defined for negative indices too.
#[inline]
pub fn pitch_class(note: i32) -> i32 {
    note.rem_euclid(OCTAVE)
}

/// Octave number of a note index (floor division, so negative notes fall
/// into octave -1 and below rather than wrapping into octave 0).
#[inline]
pub fn octave(note: i32) -> i32 {
    note.div_euclid(OCTAVE)
}

/// Pitch class name for a note index.
#[inline]
pub fn note_name(note: i32) -> &'static str {
    NOTE_NAMES[pitch_class(note) as usize]
}

/// Round-half-away-from-zero, matching the source's `int(round(cf))`
/// semantics used to map a continuous cents-from-reference value to an
/// integer note index.
#[inline]
pub fn round_half_away_from_zero(x: f64) -> f64 {
    if x >= 0.0 {
        (x + 0.5).floor()
    } else {
        (x - 0.5).ceil()
    }
}

/// Note index nearest to `frequency`, relative to `a_reference` (the
/// frequency of A4) under equal temperament.
///
/// `note = round(12 * log2(frequency / a_reference)) + C5_OFFSET`
#[inline]
pub fn nearest_note(frequency: f64, a_reference: f64) -> i32 {
    let cents = OCTAVE as f64 * (frequency / a_reference).log2();
    round_half_away_from_zero(cents) as i32 + C5_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_class_and_octave_at_zero() {
        assert_eq!(pitch_class(0), 0);
        assert_eq!(octave(0), 0);
        assert_eq!(note_name(0), "C");
    }

    #[test]
    fn pitch_class_wraps_negative_indices() {
        assert_eq!(pitch_class(-1), 11);
        assert_eq!(octave(-1), -1);
        assert_eq!(note_name(-1), "B");
    }

    #[test]
    fn a4_is_c5_offset() {
        assert_eq!(pitch_class(C5_OFFSET), A_OFFSET);
        assert_eq!(octave(C5_OFFSET), 4);
        assert_eq!(note_name(C5_OFFSET), "A");
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_half_away_from_zero(0.5), 1.0);
        assert_eq!(round_half_away_from_zero(-0.5), -1.0);
        assert_eq!(round_half_away_from_zero(1.4999), 1.0);
        assert_eq!(round_half_away_from_zero(1.5001), 2.0);
    }

    #[test]
    fn nearest_note_pure_a4() {
        assert_eq!(nearest_note(440.0, 440.0), C5_OFFSET);
    }

    #[test]
    fn nearest_note_ten_cents_sharp_stays_on_a4() {
        // 2^(10/1200) is a tenth of a semitone above A4; still rounds to A4.
        let f = 440.0 * 2f64.powf(10.0 / 1200.0);
        assert_eq!(nearest_note(f, 440.0), C5_OFFSET);
    }
}
