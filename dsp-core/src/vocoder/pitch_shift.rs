//! Phase-vocoder pitch shifter
//!
//! Analysis-modification-resynthesis over heavily overlapped frames: each
//! frame is windowed and transformed, per-bin phases are unwrapped into
//! instantaneous frequencies, bins are remapped by the shift factor, and a
//! per-bin accumulated synthesis phase drives the inverse transform so the
//! overlap-added output stays phase-continuous across frames.

use std::f32::consts::{PI, TAU};

use crate::error::DspError;
use crate::spectrum::{generate_periodic_window, SpectralTransform, WindowType};

/// Pitch shifter configuration
#[derive(Debug, Clone, Copy)]
pub struct PitchShiftConfig {
    /// Frame size N (power of two)
    pub fft_size: usize,

    /// Hop size H between analysis frames; H << N, typically N/16
    pub hop_size: usize,

    /// Multiplicative pitch-shift factor (1.0 = unchanged)
    pub shift: f32,

    /// Pitch-shifted signal level in the output mix
    pub wet: f32,

    /// Time-aligned original signal level in the output mix
    pub dry: f32,
}

impl Default for PitchShiftConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            hop_size: 64,
            shift: 1.0,
            wet: 1.0,
            dry: 0.0,
        }
    }
}

/// Streaming pitch-shift engine
///
/// Feeds a delay line sample by sample; every H samples one frame is
/// analyzed, stretched and resynthesized. Each `process` call returns one
/// sample of the fully overlapped output region.
pub struct PitchShifter {
    config: PitchShiftConfig,

    /// Frame size N and bin count N/2 + 1
    fft_size: usize,
    num_bins: usize,
    hop_size: usize,

    transform: SpectralTransform,

    /// Periodic Hann analysis/synthesis window, length N
    window: Vec<f32>,

    /// Overlap-add gain H / sum(w^2) compensating the double windowing
    gain: f32,

    /// Expected per-hop phase advance 2*pi*j*H/N per bin
    expected_advance: Vec<f32>,

    /// Input delay line, length N; a frame fires when it fills
    delay_line: Vec<f32>,
    in_offset: usize,

    /// Overlap-add accumulator, length N
    accumulator: Vec<f32>,

    /// Finished output samples of the latest frame, length H
    out_block: Vec<f32>,
    out_pos: usize,

    /// Dry-path delay matching the wet stream lag of N - 1 calls
    dry_delay: Vec<f32>,
    dry_pos: usize,

    /// Windowed frame / resynthesized frame scratch, length N
    frame: Vec<f32>,

    /// Spectrum scratch, length N/2 + 1
    re: Vec<f32>,
    im: Vec<f32>,
    magnitude: Vec<f32>,
    frequency: Vec<f32>,
    stretched_mag: Vec<f32>,
    stretched_freq: Vec<f32>,

    /// Cross-frame phase state
    prev_phase: Vec<f32>,
    phase_acc: Vec<f32>,
}

impl PitchShifter {
    /// Create a pitch shifter from `config`
    ///
    /// # Errors
    /// `InvalidSize` unless the frame size is a power of two >= 2;
    /// `InvalidHopSize` unless `0 < hop_size < fft_size`.
    pub fn new(config: PitchShiftConfig) -> Result<Self, DspError> {
        let transform = SpectralTransform::new(config.fft_size)?;
        let n = config.fft_size;
        let hop = config.hop_size;

        if hop == 0 || hop >= n {
            return Err(DspError::InvalidHopSize {
                hop_size: hop,
                frame_size: n,
            });
        }

        let window = generate_periodic_window(WindowType::Hann, n);
        let window_energy: f32 = window.iter().map(|&w| w * w).sum();
        let gain = hop as f32 / window_energy;

        let num_bins = n / 2 + 1;
        let expected_advance: Vec<f32> = (0..num_bins)
            .map(|j| TAU * j as f32 * hop as f32 / n as f32)
            .collect();

        Ok(Self {
            config,
            fft_size: n,
            num_bins,
            hop_size: hop,
            transform,
            window,
            gain,
            expected_advance,
            delay_line: vec![0.0; n],
            in_offset: n - hop,
            accumulator: vec![0.0; n],
            out_block: vec![0.0; hop],
            out_pos: 0,
            dry_delay: vec![0.0; n - 1],
            dry_pos: 0,
            frame: vec![0.0; n],
            re: vec![0.0; num_bins],
            im: vec![0.0; num_bins],
            magnitude: vec![0.0; num_bins],
            frequency: vec![0.0; num_bins],
            stretched_mag: vec![0.0; num_bins],
            stretched_freq: vec![0.0; num_bins],
            prev_phase: vec![0.0; num_bins],
            phase_acc: vec![0.0; num_bins],
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PitchShiftConfig {
        &self.config
    }

    /// Frame size N
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Hop size H
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Feed one sample, receive one output sample
    ///
    /// The raw stream lags the input by N - 1 calls (one frame plus the
    /// H - 1 calls spent filling the current hop); the dry path is delayed
    /// identically so both stay time-aligned in the mix. [`apply_to`]
    /// discards the hop warm-up, leaving the N - H frame latency.
    ///
    /// [`apply_to`]: Self::apply_to
    pub fn process(&mut self, sample: f32) -> f32 {
        self.delay_line[self.in_offset] = sample;
        self.in_offset += 1;

        if self.in_offset == self.fft_size {
            self.process_frame();
        }

        let wet = self.out_block[self.out_pos];
        self.out_pos += 1;

        let delayed = self.dry_delay[self.dry_pos];
        self.dry_delay[self.dry_pos] = sample;
        self.dry_pos = (self.dry_pos + 1) % self.dry_delay.len();

        self.config.wet * wet + self.config.dry * delayed
    }

    fn process_frame(&mut self) {
        let n = self.fft_size;
        let hop = self.hop_size;
        let shift = self.config.shift;

        // Analysis
        for i in 0..n {
            self.frame[i] = self.delay_line[i] * self.window[i];
        }
        self.transform.forward(&self.frame, &mut self.re, &mut self.im);

        // Phase unwrapping: remove the expected advance and fold the
        // residual into (-pi, pi] to get each bin's true per-hop advance
        for j in 0..self.num_bins {
            let re = self.re[j];
            let im = self.im[j];
            self.magnitude[j] = (re * re + im * im).sqrt();

            let phase = im.atan2(re);
            let delta = phase - self.prev_phase[j];
            self.prev_phase[j] = phase;

            let deviation = wrap_phase(delta - self.expected_advance[j]);
            self.frequency[j] = self.expected_advance[j] + deviation;
        }

        // Spectral stretch: remap source bins by the shift factor,
        // summing magnitudes that land on the same destination
        self.stretched_mag.fill(0.0);
        self.stretched_freq.fill(0.0);
        for j in 0..self.num_bins {
            let dest = (j as f32 * shift).round() as usize;
            if dest >= self.num_bins {
                break;
            }
            self.stretched_mag[dest] += self.magnitude[j];
            self.stretched_freq[dest] = self.frequency[j] * shift;
        }

        // Synthesis phase accumulation; untouched bins carry no magnitude
        // and advance no phase
        for j in 0..self.num_bins {
            self.phase_acc[j] = wrap_phase(self.phase_acc[j] + self.stretched_freq[j]);
            self.re[j] = self.stretched_mag[j] * self.phase_acc[j].cos();
            self.im[j] = self.stretched_mag[j] * self.phase_acc[j].sin();
        }

        // Resynthesis and overlap-add
        self.transform.inverse(&self.re, &self.im, &mut self.frame);
        for i in 0..n {
            self.accumulator[i] += self.frame[i] * self.window[i] * self.gain;
        }

        self.out_block.copy_from_slice(&self.accumulator[..hop]);
        self.accumulator.copy_within(hop.., 0);
        self.accumulator[n - hop..].fill(0.0);

        self.delay_line.copy_within(hop.., 0);
        self.in_offset = n - hop;
        self.out_pos = 0;
    }

    /// Shift a whole buffer, returning an equally long output
    ///
    /// The first H - 1 stream samples are discarded and the tail is
    /// flushed with zero input, so output sample i is the processed
    /// input sample i - (N - H).
    pub fn apply_to(&mut self, signal: &[f32]) -> Vec<f32> {
        self.reset();

        let warmup = self.hop_size - 1;
        let mut output = Vec::with_capacity(signal.len());

        let mut calls = 0;
        for &x in signal {
            let y = self.process(x);
            if calls >= warmup {
                output.push(y);
            }
            calls += 1;
        }
        while output.len() < signal.len() {
            output.push(self.process(0.0));
        }

        output
    }

    /// Start a new stream session: clears the delay lines, the overlap
    /// accumulator and all cross-frame phase state
    pub fn reset(&mut self) {
        self.delay_line.fill(0.0);
        self.accumulator.fill(0.0);
        self.out_block.fill(0.0);
        self.dry_delay.fill(0.0);
        self.prev_phase.fill(0.0);
        self.phase_acc.fill(0.0);
        self.in_offset = self.fft_size - self.hop_size;
        self.out_pos = 0;
        self.dry_pos = 0;
    }
}

/// Fold a phase value into (-pi, pi]
fn wrap_phase(phase: f32) -> f32 {
    PI - (PI - phase).rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(len: usize, period_bins: f32, n: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU * period_bins * i as f32 / n as f32).sin())
            .collect()
    }

    #[test]
    fn test_wrap_phase_range() {
        for x in [-10.0f32, -PI, -0.5, 0.0, 0.5, PI, 10.0, 123.4] {
            let w = wrap_phase(x);
            assert!(w > -PI - 1e-6 && w <= PI + 1e-6, "{} -> {}", x, w);
            // Same angle modulo 2*pi
            assert!(((x - w) / TAU - ((x - w) / TAU).round()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_construction_errors() {
        let bad_size = PitchShiftConfig {
            fft_size: 1000,
            ..Default::default()
        };
        assert_eq!(
            PitchShifter::new(bad_size).err(),
            Some(DspError::InvalidSize(1000))
        );

        let bad_hop = PitchShiftConfig {
            fft_size: 256,
            hop_size: 256,
            ..Default::default()
        };
        assert_eq!(
            PitchShifter::new(bad_hop).err(),
            Some(DspError::InvalidHopSize {
                hop_size: 256,
                frame_size: 256
            })
        );
    }

    #[test]
    fn test_unity_shift_reproduces_input() {
        let n = 256;
        let hop = 16;
        let config = PitchShiftConfig {
            fft_size: n,
            hop_size: hop,
            shift: 1.0,
            wet: 1.0,
            dry: 0.0,
        };
        let mut shifter = PitchShifter::new(config).unwrap();

        let len = 6 * n;
        let signal = sine(len, 12.3, n);
        let output = shifter.apply_to(&signal);

        // Whole-buffer output is aligned at the N - H frame latency
        let latency = n - hop;
        for i in 2 * n..len {
            let expected = signal[i - latency];
            assert!(
                (output[i] - expected).abs() < 1e-2,
                "sample {}: {} vs {}",
                i,
                output[i],
                expected
            );
        }
    }

    #[test]
    fn test_octave_shift_doubles_dominant_bin() {
        let n = 256;
        let source_bin = 20.0;
        let config = PitchShiftConfig {
            fft_size: n,
            hop_size: 16,
            shift: 2.0,
            wet: 1.0,
            dry: 0.0,
        };
        let mut shifter = PitchShifter::new(config).unwrap();

        let signal = sine(8 * n, source_bin, n);
        let output = shifter.apply_to(&signal);

        // Spectrum of a steady-state chunk of the output
        let mut transform = SpectralTransform::new(n).unwrap();
        let chunk = &output[4 * n..5 * n];
        let mag = transform.magnitude_spectrum(chunk, false);

        let (peak, _) = mag
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        assert!(
            (peak as f32 - 2.0 * source_bin).abs() <= 2.0,
            "peak bin {} for source bin {}",
            peak,
            source_bin
        );
    }

    #[test]
    fn test_half_shift_halves_dominant_bin() {
        let n = 256;
        let source_bin = 40.0;
        let config = PitchShiftConfig {
            fft_size: n,
            hop_size: 16,
            shift: 0.5,
            wet: 1.0,
            dry: 0.0,
        };
        let mut shifter = PitchShifter::new(config).unwrap();

        let signal = sine(8 * n, source_bin, n);
        let output = shifter.apply_to(&signal);

        let mut transform = SpectralTransform::new(n).unwrap();
        let mag = transform.magnitude_spectrum(&output[4 * n..5 * n], false);

        let (peak, _) = mag
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        assert!(
            (peak as f32 - 0.5 * source_bin).abs() <= 2.0,
            "peak bin {} for source bin {}",
            peak,
            source_bin
        );
    }

    #[test]
    fn test_dry_path_is_exact_delayed_copy() {
        let n = 128;
        let hop = 8;
        let config = PitchShiftConfig {
            fft_size: n,
            hop_size: hop,
            shift: 1.7,
            wet: 0.0,
            dry: 1.0,
        };
        let mut shifter = PitchShifter::new(config).unwrap();

        let signal: Vec<f32> = (0..400).map(|i| (i as f32 * 0.61).sin()).collect();
        let output = shifter.apply_to(&signal);

        let delay = n - hop;
        for i in delay..signal.len() {
            assert_eq!(output[i], signal[i - delay], "sample {}", i);
        }
    }

    #[test]
    fn test_reset_reproduces_stream() {
        let config = PitchShiftConfig {
            fft_size: 128,
            hop_size: 8,
            shift: 1.3,
            ..Default::default()
        };
        let mut shifter = PitchShifter::new(config).unwrap();

        let signal: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.217).sin()).collect();
        let first = shifter.apply_to(&signal);
        let second = shifter.apply_to(&signal);

        assert_eq!(first, second);
    }

    #[test]
    fn test_amplitude_preserved_at_unity_shift() {
        let n = 256;
        let config = PitchShiftConfig {
            fft_size: n,
            hop_size: 16,
            ..Default::default()
        };
        let mut shifter = PitchShifter::new(config).unwrap();

        let signal = sine(8 * n, 24.0, n);
        let output = shifter.apply_to(&signal);

        let rms = |s: &[f32]| (s.iter().map(|&x| x * x).sum::<f32>() / s.len() as f32).sqrt();
        let in_rms = rms(&signal[2 * n..6 * n]);
        let out_rms = rms(&output[3 * n..7 * n]);

        assert!(
            (in_rms - out_rms).abs() / in_rms < 0.05,
            "rms {} vs {}",
            in_rms,
            out_rms
        );
    }
}
