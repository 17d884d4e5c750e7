//! Overlap-Add block convolution
//!
//! Streams arbitrary-length input through frequency-domain multiplication:
//! each hop of H = N - K + 1 fresh samples is zero-padded to N, transformed,
//! multiplied against the cached kernel spectrum and inverse-transformed;
//! the leading K - 1 samples of every block are summed with the tail carried
//! from previous blocks.

use crate::error::DspError;
use crate::spectrum::SpectralTransform;

/// Streaming FIR filter using the Overlap-Add method
pub struct OverlapAddFilter {
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

    /// Current input block zero-padded to N (tail stays zero)
    frame: Vec<f32>,

    /// Spectrum scratch, length N/2 + 1
    re: Vec<f32>,
    im: Vec<f32>,

    /// Inverse-transform output, length N
    conv: Vec<f32>,

    /// Tail carried into following blocks, length K - 1
    tail: Vec<f32>,

    /// Finished output samples of the latest block, length H
    out_block: Vec<f32>,

    in_pos: usize,
    out_pos: usize,
}

impl OverlapAddFilter {
    /// Create an Overlap-Add filter for `kernel`
    ///
    /// # Arguments
    /// * `kernel` - FIR impulse response, length K
    /// * `fft_size` - target transform size, rounded up to a power of two
    ///
    /// # Errors
    /// `InvalidKernelSize` if the kernel is empty or longer than the
    /// transform size.
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
            frame: vec![0.0; n],
            re: vec![0.0; bins],
            im: vec![0.0; bins],
            conv: vec![0.0; n],
            tail: vec![0.0; k - 1],
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
        self.frame[self.in_pos] = sample;
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
        self.transform.forward(&self.frame, &mut self.re, &mut self.im);

        for j in 0..self.re.len() {
            let re = self.re[j] * self.kernel_re[j] - self.im[j] * self.kernel_im[j];
            let im = self.re[j] * self.kernel_im[j] + self.im[j] * self.kernel_re[j];
            self.re[j] = re;
            self.im[j] = im;
        }

        self.transform.inverse(&self.re, &self.im, &mut self.conv);

        let hop = self.hop_size;
        let tail_len = self.tail.len();

        for i in 0..hop {
            let carried = if i < tail_len { self.tail[i] } else { 0.0 };
            self.out_block[i] = self.conv[i] + carried;
        }

        // Slide the tail forward by one hop; when K - 1 > H the old tail
        // still overlaps the new one
        for j in 0..tail_len {
            let carried = if hop + j < tail_len { self.tail[hop + j] } else { 0.0 };
            self.tail[j] = self.conv[hop + j] + carried;
        }
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
        self.frame.fill(0.0);
        self.tail.fill(0.0);
        self.out_block.fill(0.0);
        self.in_pos = 0;
        self.out_pos = 0;
    }
}
