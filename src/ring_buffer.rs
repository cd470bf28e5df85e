//! Streaming sample accumulation with one-frame-lag amplitude normalization.

/// Smallest peak value divided into, preventing near-silent frames from
/// being amplified into noise.
const MIN_PEAK: f64 = 0.125;

/// Fixed-length analysis frame, filled by successive `push` calls.
///
/// Each call shifts the frame left and appends the new samples (discarding
/// the oldest content), then returns a *normalized* copy divided by the
/// previous call's peak magnitude — not the current one. This one-frame-lag
/// normalization is intentional: dividing by a peak measured from the
/// about-to-be-analyzed frame would make onset transients look spectrally
/// small, since that peak is itself produced by the transient.
///
/// The raw (unnormalized) samples are what persist across calls; only the
/// value handed to the caller is scaled, so the accumulated signal never
/// compounds normalization from earlier frames.
pub struct RingBuffer {
    raw: Vec<f64>,
    normalized: Vec<f64>,
    previous_peak: f64,
}

impl RingBuffer {
    /// Create a zeroed frame of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            raw: vec![0.0; len],
            normalized: vec![0.0; len],
            previous_peak: MIN_PEAK,
        }
    }

    /// Number of samples held in the frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Shift in `samples`, then return the normalized frame.
    ///
    /// If `samples` is empty the frame is left unchanged and is still
    /// normalized (by the same previous peak again). If `samples` is
    /// longer than the frame, only its last `len()` samples are kept.
    pub fn push(&mut self, samples: &[f64]) -> &[f64] {
        let n = self.raw.len();
        let shift = samples.len().min(n);

        if shift > 0 {
            self.raw.copy_within(shift.., 0);
            let tail_start = n - shift;
            let src_start = samples.len() - shift;
            self.raw[tail_start..].copy_from_slice(&samples[src_start..]);
        }

        let peak = self
            .raw
            .iter()
            .fold(0.0f64, |acc, &s| acc.max(s.abs()))
            .max(MIN_PEAK);

        let norm = self.previous_peak;
        self.previous_peak = peak;

        for (o, &s) in self.normalized.iter_mut().zip(self.raw.iter()) {
            *o = s / norm;
        }

        &self.normalized
    }

    /// Reset to a freshly-constructed state.
    pub fn reset(&mut self) {
        self.raw.fill(0.0);
        self.normalized.fill(0.0);
        self.previous_peak = MIN_PEAK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_normalizes_by_minimum_peak() {
        let mut rb = RingBuffer::new(8);
        let out = rb.push(&[0.0; 4]);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn shift_discards_oldest_samples() {
        let mut rb = RingBuffer::new(4);
        rb.push(&[1.0, 2.0, 3.0, 4.0]);
        let out = rb.push(&[5.0]);
        // Oldest (1.0) dropped, 5.0 appended at the tail; normalized by
        // the *previous* peak (4.0 from the first push), not this one.
        assert_eq!(out.len(), 4);
        assert_eq!(out[3], 5.0 / 4.0);
        assert_eq!(out[0], 2.0 / 4.0);
    }

    #[test]
    fn block_longer_than_frame_keeps_only_the_tail() {
        let mut rb = RingBuffer::new(3);
        let out = rb.push(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out, &[3.0 / 0.125, 4.0 / 0.125, 5.0 / 0.125]);
    }

    #[test]
    fn empty_block_leaves_raw_frame_unchanged() {
        let mut rb = RingBuffer::new(4);
        rb.push(&[1.0, 2.0, 3.0, 4.0]);
        let raw_before = rb.raw.clone();
        rb.push(&[]);
        assert_eq!(rb.raw, raw_before);
    }

    #[test]
    fn normalization_lags_by_one_call_and_raw_samples_persist() {
        let mut rb = RingBuffer::new(2);
        let first = rb.push(&[0.5, 0.5]); // normalized by MIN_PEAK (first call)
        assert_eq!(first, &[4.0, 4.0]);
        let second = rb.push(&[1.0, 1.0]); // normalized by 0.5 (previous raw peak)
        assert_eq!(second, &[2.0, 2.0]);
        // Raw samples are untouched by the first call's normalization.
        assert_eq!(rb.raw, vec![1.0, 1.0]);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut rb = RingBuffer::new(4);
        rb.push(&[1.0, 2.0, 3.0, 4.0]);
        rb.reset();
        assert!(rb.raw.iter().all(|&s| s == 0.0));
        assert_eq!(rb.previous_peak, MIN_PEAK);
    }
}
