//! Error types for construction-time validation
//!
//! All validation happens when an engine is built. Once constructed, every
//! `process`/`apply_to` call completes without a recoverable error path.

use thiserror::Error;

/// Errors reported while constructing a transform or streaming engine
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DspError {
    /// Transform size is not a power of two >= 2
    #[error("transform size must be a power of two >= 2, got {0}")]
    InvalidSize(usize),

    /// Kernel does not fit into the requested transform size
    #[error("kernel length {kernel_len} must be non-zero and fit transform size {fft_size}")]
    InvalidKernelSize { kernel_len: usize, fft_size: usize },

    /// Hop size is incompatible with the frame size
    #[error("hop size {hop_size} must be positive and smaller than frame size {frame_size}")]
    InvalidHopSize { hop_size: usize, frame_size: usize },
}
