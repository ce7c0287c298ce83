#![deny(unsafe_code)]
//! Point-charge particle simulation.
//!
//! Charged particles move in the `[-1, 1]²` box under the physics-form
//! Coulomb field of every other particle, with medium friction and reflecting
//! walls. Particles with infinite mass are fixed field sources.
//!
//! One [`Engine::step`] is a frame: `steps` integrator ticks of `dt / steps`
//! each, with the medium friction spread evenly across them.

pub mod integrator;

use charge_field_core::error::FieldError;
use charge_field_core::field::FieldParams;
use charge_field_core::params::{param_f32, param_f32_in, param_string, param_usize_in};
use charge_field_core::{Engine, ParticleSet, Scene};
use serde_json::{json, Value};

pub use integrator::{
    bounce, find_forces, friction_per_substep, update_charges, update_charges_in_place, Forces,
    IntegrationMethod, Integrator, StepParams, UpdateMode,
};

/// Default frame time step.
const DEFAULT_DT: f32 = 0.01;
/// Largest accepted frame time step.
const MAX_DT: f32 = 1.0;
/// Default ticks per frame.
const DEFAULT_STEPS: usize = 1;
const MAX_STEPS: usize = 1000;
/// Default medium friction: none.
const DEFAULT_MEDIUM_FRICTION: f32 = 0.0;
/// Default wall elasticity: perfectly elastic.
const DEFAULT_WALL_ELASTICITY: f32 = 1.0;
const DEFAULT_METHOD: &str = "euler";
const DEFAULT_UPDATE_MODE: &str = "double_buffered";

/// Simulation parameters.
///
/// Use [`Default`] for one Euler tick of `0.01` per frame, no friction and
/// elastic walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    /// Time advanced per frame.
    pub dt: f32,
    /// Integrator ticks per frame.
    pub steps: usize,
    /// Fraction of velocity lost per frame, in `[0, 1]`.
    pub medium_friction: f32,
    /// Fraction of velocity kept on a wall hit, in `[0, 1]`.
    pub wall_elasticity: f32,
    pub method: IntegrationMethod,
    pub update_mode: UpdateMode,
    /// Physics-form field constants.
    pub field: FieldParams,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            steps: DEFAULT_STEPS,
            medium_friction: DEFAULT_MEDIUM_FRICTION,
            wall_elasticity: DEFAULT_WALL_ELASTICITY,
            method: IntegrationMethod::Euler,
            update_mode: UpdateMode::DoubleBuffered,
            field: FieldParams::PHYSICS,
        }
    }
}

impl PhysicsParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    ///
    /// Ranged values are clamped. A `dt` that is not positive and finite is
    /// rejected with `FieldError::InvalidTimeStep`, and unknown `method` or
    /// `update_mode` names with `FieldError::UnknownMethod`.
    pub fn from_json(params: &Value) -> Result<Self, FieldError> {
        let dt = param_f32(params, "dt", DEFAULT_DT);
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(FieldError::InvalidTimeStep(dt));
        }
        Ok(Self {
            dt: dt.min(MAX_DT),
            steps: param_usize_in(params, "steps", DEFAULT_STEPS, 1, MAX_STEPS),
            medium_friction: param_f32_in(
                params,
                "medium_friction",
                DEFAULT_MEDIUM_FRICTION,
                0.0,
                1.0,
            ),
            wall_elasticity: param_f32_in(
                params,
                "wall_elasticity",
                DEFAULT_WALL_ELASTICITY,
                0.0,
                1.0,
            ),
            method: IntegrationMethod::from_name(&param_string(params, "method", DEFAULT_METHOD))?,
            update_mode: UpdateMode::from_name(&param_string(
                params,
                "update_mode",
                DEFAULT_UPDATE_MODE,
            ))?,
            field: FieldParams::from_json(params, FieldParams::PHYSICS),
        })
    }

    /// Per-tick constants for one frame.
    pub fn step_params(&self) -> StepParams {
        StepParams {
            dt: self.dt / self.steps as f32,
            friction: friction_per_substep(self.medium_friction, self.steps),
            wall_elasticity: self.wall_elasticity,
            field: self.field,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "dt": self.dt,
            "steps": self.steps,
            "medium_friction": self.medium_friction,
            "wall_elasticity": self.wall_elasticity,
            "method": self.method.name(),
            "update_mode": self.update_mode.name(),
            "k": self.field.k,
            "softening": self.field.softening,
        })
    }
}

/// Charged-particle simulation.
pub struct ChargeSystem {
    particles: ParticleSet,
    params: PhysicsParams,
    integrator: Integrator,
    frames: usize,
}

impl ChargeSystem {
    /// Creates a simulation over `particles`.
    pub fn new(particles: ParticleSet, params: PhysicsParams) -> Self {
        let integrator = Integrator::new(params.method, params.update_mode, particles.len());
        log::debug!(
            "charge system: {} particles, method {}, {} steps of {}",
            particles.len(),
            params.method.name(),
            params.steps,
            params.dt / params.steps as f32
        );
        Self {
            particles,
            params,
            integrator,
            frames: 0,
        }
    }

    /// Creates a simulation from a scene's particles and `physics` params.
    pub fn from_scene(scene: &Scene) -> Result<Self, FieldError> {
        let params = PhysicsParams::from_json(&scene.physics)?;
        Ok(Self::new(ParticleSet::from_records(&scene.particles), params))
    }

    /// Mutable access for adding or editing particles between frames.
    pub fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }

    pub fn physics_params(&self) -> PhysicsParams {
        self.params
    }

    /// Frames advanced since construction.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Engine for ChargeSystem {
    fn step(&mut self) -> Result<(), FieldError> {
        let step = self.params.step_params();
        self.integrator
            .advance(&mut self.particles, self.params.steps, step);
        self.frames += 1;
        log::trace!(
            "frame {}: kinetic energy {}",
            self.frames,
            self.particles.kinetic_energy()
        );
        Ok(())
    }

    fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    fn params(&self) -> Value {
        self.params.to_json()
    }

    fn param_schema(&self) -> Value {
        json!({
            "dt": {
                "type": "number",
                "default": DEFAULT_DT,
                "min": 0.0,
                "max": MAX_DT,
                "description": "Time advanced per frame (must be positive)"
            },
            "steps": {
                "type": "integer",
                "default": DEFAULT_STEPS,
                "min": 1,
                "max": MAX_STEPS,
                "description": "Integrator ticks per frame"
            },
            "medium_friction": {
                "type": "number",
                "default": DEFAULT_MEDIUM_FRICTION,
                "min": 0.0,
                "max": 1.0,
                "description": "Fraction of velocity lost per frame"
            },
            "wall_elasticity": {
                "type": "number",
                "default": DEFAULT_WALL_ELASTICITY,
                "min": 0.0,
                "max": 1.0,
                "description": "Fraction of velocity kept on a wall hit"
            },
            "method": {
                "type": "string",
                "default": DEFAULT_METHOD,
                "options": IntegrationMethod::list_names(),
                "description": "Integration method"
            },
            "update_mode": {
                "type": "string",
                "default": DEFAULT_UPDATE_MODE,
                "options": ["double_buffered", "in_place"],
                "description": "Euler write strategy; in_place depends on particle order"
            },
            "k": {
                "type": "number",
                "default": FieldParams::PHYSICS.k,
                "description": "Coulomb scale"
            },
            "softening": {
                "type": "number",
                "default": FieldParams::PHYSICS.softening,
                "description": "Squared distance below which a pair exerts no force"
            }
        })
    }
}
