//! Overlap-Save block convolution
//!
//! Keeps a sliding window of the most recent N samples (K - 1 carried from
//! the previous block plus H = N - K + 1 fresh ones), multiplies its
//! spectrum against the cached kernel spectrum and discards the first K - 1
//! circularly-aliased samples of every inverse transform.

use crate::error::DspError;
use crate::spectrum::SpectralTransform;

/// Streaming FIR filter using the Overlap-Save method
pub struct OverlapSaveFilter {
    /// Kernel length K
    kernel_len: usize,

    /// Transform size N (power of two >= K)
    fft_size: usize,

    /// Hop size H = N - K + 1
    hop_size: usize,

    transform: SpectralTransform,

    /// Cached kernel spectrum
    kernel_re: Vec<f32>,
    kernel_im: Vec<f32>,

    /// Sliding input window of the most recent N samples
    window: Vec<f32>,

    /// Spectrum scratch, length N/2 + 1
    re: Vec<f32>,
    im: Vec<f32>,

    /// Inverse-transform output, length N
    conv: Vec<f32>,

    /// Valid output samples of the latest block, length H
    out_block: Vec<f32>,

    in_pos: usize,
    out_pos: usize,
}

impl OverlapSaveFilter {
    /// Create an Overlap-Save filter for `kernel`
    ///
    /// # Arguments
    /// * `kernel` - FIR impulse response, length K
    /// * `fft_size` - target transform size, rounded up to a power of two
    ///
    /// # Errors
    /// Same construction contract as [`OverlapAddFilter`](super::OverlapAddFilter).
    pub fn new(kernel: &[f32], fft_size: usize) -> Result<Self, DspError> {
        let n = fft_size.next_power_of_two().max(2);
        let k = kernel.len();

        if k == 0 || k > n {
            return Err(DspError::InvalidKernelSize {
                kernel_len: k,
                fft_size: n,
            });
        }

        // K <= N guarantees a positive hop
        let hop = n + 1 - k;

        let mut transform = SpectralTransform::new(n)?;
        let bins = transform.num_bins();

        let mut padded = vec![0.0; n];
        padded[..k].copy_from_slice(kernel);
        let mut kernel_re = vec![0.0; bins];
        let mut kernel_im = vec![0.0; bins];
        transform.forward(&padded, &mut kernel_re, &mut kernel_im);

        Ok(Self {
            kernel_len: k,
            fft_size: n,
            hop_size: hop,
            transform,
            kernel_re,
            kernel_im,
            window: vec![0.0; n],
            re: vec![0.0; bins],
            im: vec![0.0; bins],
            conv: vec![0.0; n],
            out_block: vec![0.0; hop],
            in_pos: 0,
            out_pos: 0,
        })
    }

    /// Kernel length K
    pub fn kernel_len(&self) -> usize {
        self.kernel_len
    }

    /// Transform size N
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Hop size H = N - K + 1
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Feed one sample, receive one sample of the latest finished block
    ///
    /// Output lags input by H - 1 calls; the first H - 1 returned samples of
    /// a fresh stream are zero.
    pub fn process(&mut self, sample: f32) -> f32 {
        self.window[self.kernel_len - 1 + self.in_pos] = sample;
        self.in_pos += 1;

        if self.in_pos == self.hop_size {
            self.process_block();
            self.in_pos = 0;
            self.out_pos = 0;
        }

        let out = self.out_block[self.out_pos];
        self.out_pos += 1;
        out
    }

    fn process_block(&mut self) {
        self.transform.forward(&self.window, &mut self.re, &mut self.im);

        for j in 0..self.re.len() {
            let re = self.re[j] * self.kernel_re[j] - self.im[j] * self.kernel_im[j];
            let im = self.re[j] * self.kernel_im[j] + self.im[j] * self.kernel_re[j];
            self.re[j] = re;
            self.im[j] = im;
        }

        self.transform.inverse(&self.re, &self.im, &mut self.conv);

        // Keep only the trailing H samples; the first K - 1 are aliased
        self.out_block
            .copy_from_slice(&self.conv[self.kernel_len - 1..]);

        // Carry the newest K - 1 input samples into the next window
        self.window.copy_within(self.hop_size.., 0);
    }

    /// Filter a whole buffer, flushing so the result matches direct-form
    /// convolution exactly
    ///
    /// # Returns
    /// Output of length `signal.len() + K - 1`
    pub fn apply_to(&mut self, signal: &[f32]) -> Vec<f32> {
        self.reset();

        if signal.is_empty() {
            return Vec::new();
        }

        let total = signal.len() + self.kernel_len - 1;
        let warmup = self.hop_size - 1;
        let mut output = Vec::with_capacity(total);

        let mut calls = 0;
        for &x in signal {
            let y = self.process(x);
            if calls >= warmup {
                output.push(y);
            }
            calls += 1;
        }
        // Zero-input flush until the stream delay has drained
        while output.len() < total {
            let y = self.process(0.0);
            if calls >= warmup {
                output.push(y);
            }
            calls += 1;
        }

        output
    }

    /// Clear all stream state; the instance can then filter an unrelated
    /// new stream
    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.out_block.fill(0.0);
        self.in_pos = 0;
        self.out_pos = 0;
    }
}
