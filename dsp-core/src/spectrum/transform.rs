//! In-place real-valued FFT for power-of-two lengths
//!
//! Packs N real samples into an N/2-point complex FFT (radix-2
//! decimation-in-time) and unpacks the result into the N/2+1 unique bins of
//! the real-signal spectrum. Twiddle and packing tables are precomputed per
//! instance, so independently constructed transforms never share state.

use num_complex::Complex;
use std::f32::consts::PI;

use crate::error::DspError;

/// Forward/inverse DFT of real sequences with power-of-two length
///
/// Single precision throughout. All buffers are allocated at construction
/// and reused on every call; instances are not safe for concurrent use.
pub struct SpectralTransform {
    /// Transform size N
    size: usize,

    /// Half size N/2 (length of the internal complex FFT)
    half: usize,

    /// Bit-reversal permutation for the half-size FFT
    rev: Vec<usize>,

    /// Forward twiddles w_j = e^(-2*pi*i*j / (N/2)), j = 0..N/4
    fwd_twiddles: Vec<Complex<f32>>,

    /// Inverse twiddles (conjugates of the forward table)
    inv_twiddles: Vec<Complex<f32>>,

    /// Packing coefficients e^(-2*pi*i*k / N), k = 0..=N/2
    pack: Vec<Complex<f32>>,

    /// Complex working buffer, length N/2
    scratch: Vec<Complex<f32>>,
}

impl SpectralTransform {
    /// Create a transform for real sequences of length `size`
    ///
    /// # Errors
    /// Returns `DspError::InvalidSize` unless `size` is a power of two >= 2.
    pub fn new(size: usize) -> Result<Self, DspError> {
        if size < 2 || !size.is_power_of_two() {
            return Err(DspError::InvalidSize(size));
        }

        let half = size / 2;

        // Bit-reversal table for the half-size FFT
        let mut rev = vec![0usize; half];
        for i in 1..half {
            rev[i] = rev[i >> 1] >> 1 | if i & 1 == 1 { half >> 1 } else { 0 };
        }

        let fwd_twiddles: Vec<Complex<f32>> = (0..half / 2)
            .map(|j| Complex::from_polar(1.0, -2.0 * PI * j as f32 / half as f32))
            .collect();
        let inv_twiddles: Vec<Complex<f32>> = fwd_twiddles.iter().map(|w| w.conj()).collect();

        let pack: Vec<Complex<f32>> = (0..=half)
            .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f32 / size as f32))
            .collect();

        Ok(Self {
            size,
            half,
            rev,
            fwd_twiddles,
            inv_twiddles,
            pack,
            scratch: vec![Complex::new(0.0, 0.0); half],
        })
    }

    /// Transform size N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of unique frequency bins (N/2 + 1)
    pub fn num_bins(&self) -> usize {
        self.half + 1
    }

    /// Forward transform of `samples` into `re`/`im` spectrum halves
    ///
    /// # Arguments
    /// * `samples` - input sequence, length N
    /// * `re`, `im` - output bins, length N/2 + 1 each
    ///
    /// DC and Nyquist bins are purely real: `im[0] == im[N/2] == 0`.
    pub fn forward(&mut self, samples: &[f32], re: &mut [f32], im: &mut [f32]) {
        assert_eq!(samples.len(), self.size);
        assert_eq!(re.len(), self.num_bins());
        assert_eq!(im.len(), self.num_bins());

        // Pack adjacent sample pairs as complex values
        for k in 0..self.half {
            self.scratch[k] = Complex::new(samples[2 * k], samples[2 * k + 1]);
        }

        fft_in_place(&mut self.scratch, &self.rev, &self.fwd_twiddles);

        // Unpack: X[k] = E[k] - i * w[k] * O[k], where E/O are the even/odd
        // parts recovered from the packed half-size spectrum
        let z0 = self.scratch[0];
        re[0] = z0.re + z0.im;
        im[0] = 0.0;
        re[self.half] = z0.re - z0.im;
        im[self.half] = 0.0;

        for k in 1..self.half {
            let zk = self.scratch[k];
            let zc = self.scratch[self.half - k].conj();
            let even = (zk + zc) * 0.5;
            let odd = (zk - zc) * 0.5;
            let x = even - Complex::<f32>::i() * self.pack[k] * odd;
            re[k] = x.re;
            im[k] = x.im;
        }
    }

    /// Inverse transform: exact algebraic inverse of [`forward`](Self::forward)
    ///
    /// # Arguments
    /// * `re`, `im` - spectrum halves, length N/2 + 1 each
    /// * `samples` - output sequence, length N
    pub fn inverse(&mut self, re: &[f32], im: &[f32], samples: &mut [f32]) {
        assert_eq!(re.len(), self.num_bins());
        assert_eq!(im.len(), self.num_bins());
        assert_eq!(samples.len(), self.size);

        // Repack the N/2+1 bins into the half-size complex spectrum
        for k in 0..self.half {
            let xk = Complex::new(re[k], im[k]);
            let xc = Complex::new(re[self.half - k], -im[self.half - k]);
            let even = (xk + xc) * 0.5;
            let odd = (xk - xc) * 0.5;
            self.scratch[k] = even + Complex::<f32>::i() * self.pack[k].conj() * odd;
        }

        fft_in_place(&mut self.scratch, &self.rev, &self.inv_twiddles);

        // De-interleave with the 1/(N/2) inverse-FFT normalization
        let scale = 1.0 / self.half as f32;
        for k in 0..self.half {
            samples[2 * k] = self.scratch[k].re * scale;
            samples[2 * k + 1] = self.scratch[k].im * scale;
        }
    }

    /// Magnitude spectrum |X[k]| of `samples`
    ///
    /// # Arguments
    /// * `samples` - input sequence, length N
    /// * `normalized` - divide each bin by N/2
    pub fn magnitude_spectrum(&mut self, samples: &[f32], normalized: bool) -> Vec<f32> {
        let mut re = vec![0.0; self.num_bins()];
        let mut im = vec![0.0; self.num_bins()];
        self.forward(samples, &mut re, &mut im);

        let scale = if normalized { 1.0 / self.half as f32 } else { 1.0 };
        re.iter()
            .zip(im.iter())
            .map(|(&r, &i)| (r * r + i * i).sqrt() * scale)
            .collect()
    }

    /// Power spectrum |X[k]|^2 of `samples`
    ///
    /// # Arguments
    /// * `samples` - input sequence, length N
    /// * `normalized` - divide each bin by N/2
    pub fn power_spectrum(&mut self, samples: &[f32], normalized: bool) -> Vec<f32> {
        let mut re = vec![0.0; self.num_bins()];
        let mut im = vec![0.0; self.num_bins()];
        self.forward(samples, &mut re, &mut im);

        let scale = if normalized { 1.0 / self.half as f32 } else { 1.0 };
        re.iter()
            .zip(im.iter())
            .map(|(&r, &i)| (r * r + i * i) * scale)
            .collect()
    }
}

/// In-place radix-2 decimation-in-time complex FFT
///
/// `twiddles` holds len/2 roots of unity for the full size; inner stages
/// stride through the same table.
fn fft_in_place(buf: &mut [Complex<f32>], rev: &[usize], twiddles: &[Complex<f32>]) {
    let m = buf.len();

    for i in 0..m {
        let j = rev[i];
        if j > i {
            buf.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= m {
        let stride = m / len;
        let mut start = 0;
        while start < m {
            for j in 0..len / 2 {
                let w = twiddles[j * stride];
                let a = buf[start + j];
                let b = buf[start + j + len / 2] * w;
                buf[start + j] = a + b;
                buf[start + j + len / 2] = a - b;
            }
            start += len;
        }
        len <<= 1;
    }
}
