//! Spectral DSP Core
//!
//! Real-valued FFT, streaming block convolution (Overlap-Add and
//! Overlap-Save) and a phase-vocoder pitch shifter, all single precision
//! and allocation-free after construction.

pub mod convolution;
pub mod error;
pub mod spectrum;
pub mod vocoder;

pub use convolution::{convolve, ConvolutionMethod, OverlapAddFilter, OverlapSaveFilter};
pub use error::DspError;
pub use spectrum::{SpectralTransform, WindowType};
pub use vocoder::{PitchShiftConfig, PitchShifter};
