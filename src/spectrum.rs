//! Decimated magnitude spectrum for display, independent of the
//! phase-vocoder analysis path.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::window::hamming;

/// Lower bound of the displayed frequency range.
const DISPLAY_MIN_HZ: f64 = 20.0;
/// Upper bound of the displayed frequency range.
const DISPLAY_MAX_HZ: f64 = 2000.0;
/// Zero-padding factor applied before the display FFT, trading
/// computation for finer bin spacing in the rendered spectrum.
const ZERO_PAD: usize = 16;

/// A decimated magnitude spectrum over `DISPLAY_MIN_HZ..=DISPLAY_MAX_HZ`,
/// normalized so the strongest displayed bin reads `1.0`.
#[derive(Debug, Clone, Default)]
pub struct DecimatedSpectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

/// Computes a [`DecimatedSpectrum`] from raw (unwindowed) samples. Owns
/// its own FFT plan and window, independent of
/// [`crate::spectral::SpectralAnalyzer`]'s analysis-range FFT, so
/// enabling or disabling display has no effect on pitch detection.
pub struct SpectrumAnalyzer {
    sample_rate: f64,
    fft_size: usize,
    padded_size: usize,
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    scratch: Vec<Complex<f64>>,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f64, fft_size: usize) -> Self {
        let padded_size = fft_size * ZERO_PAD;
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(padded_size);

        Self {
            sample_rate,
            fft_size,
            padded_size,
            fft,
            window: hamming(fft_size),
            scratch: vec![Complex::new(0.0, 0.0); padded_size],
        }
    }

    /// Window the last `fft_size` samples of `samples` (zero-padding on
    /// the left if shorter), zero-pad for display resolution, and return
    /// the normalized magnitude spectrum restricted to the musical
    /// display range.
    pub fn analyze(&mut self, samples: &[f64]) -> DecimatedSpectrum {
        for c in self.scratch.iter_mut() {
            *c = Complex::new(0.0, 0.0);
        }

        let tail = &samples[samples.len().saturating_sub(self.fft_size)..];
        let offset = self.fft_size - tail.len();
        for (i, (&s, &w)) in tail.iter().zip(self.window[offset..].iter()).enumerate() {
            self.scratch[offset + i] = Complex::new(s * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        let bin_width = self.sample_rate / self.padded_size as f64;
        let nyquist_bin = self.padded_size / 2;

        let start_bin = (DISPLAY_MIN_HZ / bin_width).floor().max(0.0) as usize;
        let end_bin = ((DISPLAY_MAX_HZ / bin_width).ceil() as usize).min(nyquist_bin);

        let mut frequencies = Vec::with_capacity(end_bin.saturating_sub(start_bin));
        let mut magnitudes = Vec::with_capacity(end_bin.saturating_sub(start_bin));
        let mut max_mag = 0.0f64;

        for bin in start_bin..end_bin {
            let mag = self.scratch[bin].norm();
            frequencies.push(bin as f64 * bin_width);
            magnitudes.push(mag);
            max_mag = max_mag.max(mag);
        }

        if max_mag > 0.0 {
            for m in magnitudes.iter_mut() {
                *m /= max_mag;
            }
        }

        DecimatedSpectrum { frequencies, magnitudes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn peaks_near_tone_frequency() {
        let sample_rate = 11025.0;
        let fft_size = 1024;
        let freq = 440.0;
        let samples: Vec<f64> = (0..fft_size)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect();

        let mut analyzer = SpectrumAnalyzer::new(sample_rate, fft_size);
        let spectrum = analyzer.analyze(&samples);

        let (peak_idx, _) = spectrum
            .magnitudes
            .iter()
            .enumerate()
            .fold((0, 0.0f64), |(bi, bm), (i, &m)| if m > bm { (i, m) } else { (bi, bm) });
        let peak_freq = spectrum.frequencies[peak_idx];
        assert!((peak_freq - freq).abs() < 5.0, "peak at {peak_freq}, expected near {freq}");
    }

    #[test]
    fn frequencies_stay_within_display_range() {
        let mut analyzer = SpectrumAnalyzer::new(11025.0, 1024);
        let spectrum = analyzer.analyze(&[0.0; 1024]);
        assert!(spectrum.frequencies.iter().all(|&f| (DISPLAY_MIN_HZ..=DISPLAY_MAX_HZ + 50.0).contains(&f)));
    }

    #[test]
    fn silence_yields_zero_magnitudes() {
        let mut analyzer = SpectrumAnalyzer::new(11025.0, 1024);
        let spectrum = analyzer.analyze(&[0.0; 1024]);
        assert!(spectrum.magnitudes.iter().all(|&m| m == 0.0));
    }
}
