#![deny(unsafe_code)]
//! Core types for the charge-field point-charge system.
//!
//! Provides the structure-of-arrays `ParticleSet`, the render-form field
//! evaluators (`ScalarEvaluator`, `LaneEvaluator`) and physics-form
//! `field_vector`, the diverging RGBA colormap, the `Engine` trait, the
//! `Scene` description with presets, the `Xorshift64` PRNG and parameter
//! helpers.

pub mod color;
pub mod engine;
pub mod error;
pub mod field;
pub mod params;
pub mod particles;
pub mod prng;
pub mod scene;

pub use engine::Engine;
pub use error::FieldError;
pub use field::{FieldEvaluator, FieldParams, LaneEvaluator, ScalarEvaluator};
pub use particles::{is_fixed_mass, Kinematics, Particle, ParticleSet};
pub use prng::Xorshift64;
pub use scene::{Preset, Scene};
