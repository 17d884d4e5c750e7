//! FIR filtering via block convolution
//!
//! Two streaming frequency-domain strategies plus a direct-form reference,
//! behind one whole-signal entry point with a method selector.

pub mod overlap_add;
pub mod overlap_save;

pub use overlap_add::OverlapAddFilter;
pub use overlap_save::OverlapSaveFilter;

use crate::error::DspError;

/// Kernels shorter than this are cheaper to run in direct form
const FFT_KERNEL_THRESHOLD: usize = 64;

/// Strategy selector for [`convolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolutionMethod {
    /// Pick direct form for short kernels, Overlap-Save otherwise
    Auto,

    /// Time-domain convolution
    Direct,

    /// FFT block convolution, Overlap-Add
    OverlapAdd,

    /// FFT block convolution, Overlap-Save
    OverlapSave,
}

/// Direct-form full convolution
///
/// # Returns
/// Output of length `signal.len() + kernel.len() - 1`
pub fn direct_convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }

    let mut output = vec![0.0; signal.len() + kernel.len() - 1];
    for (i, &x) in signal.iter().enumerate() {
        for (j, &h) in kernel.iter().enumerate() {
            output[i + j] += x * h;
        }
    }
    output
}

/// Filter a whole signal with the selected convolution strategy
///
/// All strategies produce the full convolution of length
/// `signal.len() + kernel.len() - 1`. FFT strategies use a transform size of
/// four kernel lengths rounded up to a power of two.
///
/// # Errors
/// `InvalidKernelSize` if the kernel is empty.
pub fn convolve(
    signal: &[f32],
    kernel: &[f32],
    method: ConvolutionMethod,
) -> Result<Vec<f32>, DspError> {
    if kernel.is_empty() {
        return Err(DspError::InvalidKernelSize {
            kernel_len: 0,
            fft_size: 0,
        });
    }

    let method = match method {
        ConvolutionMethod::Auto if kernel.len() < FFT_KERNEL_THRESHOLD => {
            ConvolutionMethod::Direct
        }
        ConvolutionMethod::Auto => ConvolutionMethod::OverlapSave,
        chosen => chosen,
    };

    match method {
        ConvolutionMethod::Direct => Ok(direct_convolve(signal, kernel)),
        ConvolutionMethod::OverlapAdd => {
            Ok(OverlapAddFilter::new(kernel, 4 * kernel.len())?.apply_to(signal))
        }
        ConvolutionMethod::OverlapSave => {
            Ok(OverlapSaveFilter::new(kernel, 4 * kernel.len())?.apply_to(signal))
        }
        ConvolutionMethod::Auto => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signal(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (i as f32 * 0.173).sin() + 0.3 * (i as f32 * 0.511).cos())
            .collect()
    }

    #[test]
    fn test_direct_convolve_known_case() {
        let output = direct_convolve(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 0.0, -1.0]);
        assert_eq!(output, vec![1.0, 2.0, 2.0, 2.0, 2.0, -4.0, -5.0]);
    }

    #[test]
    fn test_strategies_agree_across_kernel_lengths() {
        let signal = test_signal(500);

        for kernel_len in [1usize, 2, 7, 64, 257] {
            let kernel: Vec<f32> = (0..kernel_len)
                .map(|i| ((i * 13 % 11) as f32 - 5.0) * 0.02)
                .collect();

            let direct = convolve(&signal, &kernel, ConvolutionMethod::Direct).unwrap();
            let ola = convolve(&signal, &kernel, ConvolutionMethod::OverlapAdd).unwrap();
            let ols = convolve(&signal, &kernel, ConvolutionMethod::OverlapSave).unwrap();

            assert_eq!(direct.len(), signal.len() + kernel_len - 1);
            assert_eq!(ola.len(), direct.len());
            assert_eq!(ols.len(), direct.len());

            for i in 0..direct.len() {
                assert!(
                    (direct[i] - ola[i]).abs() < 1e-3,
                    "K={} OLA sample {}: {} vs {}",
                    kernel_len,
                    i,
                    ola[i],
                    direct[i]
                );
                assert!(
                    (direct[i] - ols[i]).abs() < 1e-3,
                    "K={} OLS sample {}: {} vs {}",
                    kernel_len,
                    i,
                    ols[i],
                    direct[i]
                );
            }
        }
    }

    #[test]
    fn test_auto_selects_consistent_result() {
        let signal = test_signal(128);

        let short: Vec<f32> = vec![0.2; 9];
        let auto = convolve(&signal, &short, ConvolutionMethod::Auto).unwrap();
        let direct = convolve(&signal, &short, ConvolutionMethod::Direct).unwrap();
        assert_eq!(auto, direct);

        let long: Vec<f32> = vec![0.01; 100];
        let auto = convolve(&signal, &long, ConvolutionMethod::Auto).unwrap();
        let direct = convolve(&signal, &long, ConvolutionMethod::Direct).unwrap();
        for i in 0..auto.len() {
            assert!((auto[i] - direct[i]).abs() < 1e-3);
        }
    }

    #[test]
    fn test_empty_kernel_rejected() {
        assert!(convolve(&[1.0], &[], ConvolutionMethod::Auto).is_err());
    }
}
