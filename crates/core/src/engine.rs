//! The `Engine` trait implemented by particle simulations.
//!
//! The trait is object-safe so a host can hold any simulation as `dyn Engine`
//! and hand its particle store to the renderer between frames.

use crate::error::FieldError;
use crate::particles::ParticleSet;
use serde_json::Value;

/// A frame-based particle simulation.
///
/// Each [`step`](Engine::step) advances one frame (which may be several
/// integrator substeps). The renderer only needs [`particles`](Engine::particles).
pub trait Engine {
    /// Advance the simulation by one frame.
    fn step(&mut self) -> Result<(), FieldError>;

    /// The current particle state.
    fn particles(&self) -> &ParticleSet;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all parameters, their types, ranges and defaults.
    fn param_schema(&self) -> Value;
}
