//! Phase-vocoder effects

pub mod pitch_shift;

pub use pitch_shift::{PitchShiftConfig, PitchShifter};
