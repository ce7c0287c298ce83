//! Error types for the charge-field core.

use thiserror::Error;

/// Errors produced when building particle stores, scenes and render targets.
///
/// The numeric kernels themselves never fail; these errors surface caller
/// contract violations at the boundaries that receive sizes and names.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Width or height was zero (or their product overflowed) for an image.
    #[error("invalid dimensions: width and height must be at least 2")]
    InvalidDimensions,

    /// Two arrays that must share a length did not.
    #[error("length mismatch for '{name}': expected {expected}, got {got}")]
    LengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// The integration time step was not a positive finite number.
    #[error("invalid time step {0}: dt must be positive and finite")]
    InvalidTimeStep(f32),

    /// A render kernel name was not recognised.
    #[error("unknown kernel: {0}")]
    UnknownKernel(String),

    /// An integration method name was not recognised.
    #[error("unknown integration method: {0}")]
    UnknownMethod(String),

    /// A scene preset name was not recognised.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// Particle records could not be decoded.
    #[error("invalid particles: {0}")]
    InvalidParticles(String),

    /// Writing an output artifact failed.
    #[error("i/o error: {0}")]
    Io(String),
}
