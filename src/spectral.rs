//! Windowed DFT with phase-vocoder frequency refinement.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::window::hamming;

/// Empirical magnitude normalizer applied to the scaled spectrum.
pub const SCALE: f64 = 2048.0;

/// Result of analyzing one frame: magnitude, refined frequency, and the
/// bin-to-bin magnitude difference used by peak selection, all over the
/// analysis range `0..range`.
pub struct SpectralFrame<'a> {
    pub mag: &'a [f64],
    pub freq: &'a [f64],
    pub dmag: &'a [f64],
}

/// Owns the FFT plan, window, and phase-vocoder state for one analysis
/// window size. `analyze` is allocation-free after construction.
pub struct SpectralAnalyzer {
    fft_size: usize,
    hop_size: usize,
    sample_rate: f64,
    range: usize,
    expect: f64,
    oversample: f64,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    scratch: Vec<Complex<f64>>,
    prev_phase: Vec<f64>,
    mag: Vec<f64>,
    freq: Vec<f64>,
    dmag: Vec<f64>,
}

impl SpectralAnalyzer {
    /// `range` is `floor(fft_size * 7/16)`: the analysis excludes the
    /// upper 9/16 of bins, where aliasing artifacts dominate at the
    /// targeted sample rates and pitched content is sparse.
    pub fn new(sample_rate: f64, fft_size: usize, hop_size: usize) -> Self {
        let range = fft_size * 7 / 16;
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft_size,
            hop_size,
            sample_rate,
            range,
            expect: 2.0 * PI * hop_size as f64 / fft_size as f64,
            oversample: fft_size as f64 / hop_size as f64,
            fft,
            window: hamming(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            prev_phase: vec![0.0; range],
            mag: vec![0.0; range],
            freq: vec![0.0; range],
            dmag: vec![0.0; range],
        }
    }

    #[inline]
    pub fn range(&self) -> usize {
        self.range
    }

    /// Window, DFT, and phase-refine `frame` (length `fft_size`),
    /// returning borrowed `mag`/`freq`/`dmag` slices of length `range`.
    pub fn analyze(&mut self, frame: &[f64]) -> SpectralFrame<'_> {
        debug_assert_eq!(frame.len(), self.fft_size);

        for (i, (&s, &w)) in frame.iter().zip(self.window.iter()).enumerate() {
            self.scratch[i] = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        // Zero the DC bin.
        self.scratch[0] = Complex::new(0.0, 0.0);

        for k in 1..self.range {
            let bin = self.scratch[k] / SCALE;
            let mag = bin.norm();
            let phase = bin.arg();

            let mut dp = phase - self.prev_phase[k] - k as f64 * self.expect;
            dp = wrap_phase(dp);

            let df = self.oversample * dp / (2.0 * PI);
            self.freq[k] = (k as f64 + df) * self.sample_rate / self.fft_size as f64;

            self.mag[k] = mag;
            self.prev_phase[k] = phase;
        }
        // mag[0] (the zeroed DC bin) never changes, so this pass always
        // compares against the current frame's magnitudes.
        for k in 1..self.range {
            self.dmag[k] = self.mag[k] - self.mag[k - 1];
        }

        SpectralFrame {
            mag: &self.mag,
            freq: &self.freq,
            dmag: &self.dmag,
        }
    }

    /// Reset phase-vocoder and magnitude memory to a freshly-constructed
    /// state.
    pub fn reset(&mut self) {
        self.prev_phase.fill(0.0);
        self.mag.fill(0.0);
        self.freq.fill(0.0);
        self.dmag.fill(0.0);
    }
}

/// Unwrap a phase difference to `(-pi, pi]` by subtracting the nearest
/// even multiple of pi, matching the phase vocoder's `qpd` adjustment.
#[inline]
fn wrap_phase(dp: f64) -> f64 {
    let mut qpd = (dp / PI) as i64;
    if qpd >= 0 {
        qpd += qpd & 1;
    } else {
        qpd -= qpd & 1;
    }
    dp - PI * qpd as f64
}
