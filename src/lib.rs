//! Real-time multi-pitch analysis with temperament-aware reference
//! frequencies and accordion reed grouping.
//!
//! The core pipeline ([`MultiPitchDetector::process`] and
//! [`AccordionDetector::process`]) has no fatal-error path: silence,
//! clipping, and out-of-range input all resolve to `valid: false`
//! results rather than an `Err`, so neither type returns `Result`. See
//! `DESIGN.md` for the rationale.

mod accordion;
mod config;
mod detector;
mod note;
mod peak;
mod ring_buffer;
mod spectral;
mod spectrum;
mod temperament;
mod window;

pub use accordion::{group_reeds, AccordionDetector, AccordionResult, ReedInfo};
pub use config::{AnalyzerConfig, DEFAULT_MIN_MAGNITUDE, REED_MIN_MAGNITUDE};
pub use detector::{MultiPitchDetector, MultiPitchResult};
pub use note::{nearest_note, note_name, octave, pitch_class};
pub use peak::{select_peaks, Maximum, PeakSelectorConfig, K_MAXIMA};
pub use spectrum::{DecimatedSpectrum, SpectrumAnalyzer as DisplaySpectrumAnalyzer};
pub use temperament::{reference_frequency, Temperament};
