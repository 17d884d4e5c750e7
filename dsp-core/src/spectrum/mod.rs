//! Real-valued spectral transform and windowing

pub mod transform;
pub mod windowing;

pub use transform::SpectralTransform;
pub use windowing::{apply_window, generate_periodic_window, generate_window, WindowType};
