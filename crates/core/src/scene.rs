//! Reproducible description of a charge scene.
//!
//! A [`Scene`] captures everything needed to recreate an image: canvas size,
//! particle records, physics and render parameters, PRNG seed and the number
//! of frames to integrate before rendering. Two equal scenes produce
//! byte-identical images.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::particles::Particle;
use crate::prng::Xorshift64;

/// Charge magnitude used by the presets.
pub const PRESET_CHARGE: f32 = 800.0;

/// Particle count of the `random` preset.
const RANDOM_COUNT: usize = 16;

/// Random particles are placed inside `[-RANDOM_EXTENT, RANDOM_EXTENT]²`.
const RANDOM_EXTENT: f32 = 0.9;

const PRESET_NAMES: &[&str] = &["dipole", "quadrupole", "ring", "random"];

/// Reproducible description of one rendered scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub particles: Vec<Particle>,
    /// Integrator parameters.
    #[serde(default = "empty_object")]
    pub physics: Value,
    /// Renderer parameters.
    #[serde(default = "empty_object")]
    pub render: Value,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub frames: usize,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Scene {
    /// Creates an empty scene with default params and no frames.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            particles: Vec::new(),
            physics: empty_object(),
            render: empty_object(),
            seed: 0,
            frames: 0,
        }
    }

    /// Creates a scene populated from a named preset.
    pub fn from_preset(
        name: &str,
        width: usize,
        height: usize,
        seed: u64,
    ) -> Result<Self, FieldError> {
        let preset = Preset::from_name(name)?;
        Ok(Self {
            particles: preset.particles(seed),
            seed,
            ..Self::new(width, height)
        })
    }

    /// Checks that the image is at least 2×2, that its RGBA buffer size
    /// fits in `usize`, and that every particle has finite charge, position
    /// and velocity. Mass may be infinite (fixed) but not `NaN` or non-positive.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.width < 2 || self.height < 2 {
            return Err(FieldError::InvalidDimensions);
        }
        self.width
            .checked_mul(self.height)
            .and_then(|px| px.checked_mul(4))
            .ok_or(FieldError::InvalidDimensions)?;
        for (i, p) in self.particles.iter().enumerate() {
            if ![p.q, p.x, p.y, p.vx, p.vy].iter().all(|v| v.is_finite()) {
                return Err(FieldError::InvalidParticles(format!(
                    "particle {i} has a non-finite charge, position or velocity"
                )));
            }
            if !(p.m > 0.0) {
                return Err(FieldError::InvalidParticles(format!(
                    "particle {i} has mass {}, expected a positive value or null",
                    p.m
                )));
            }
        }
        Ok(())
    }
}

/// Built-in particle layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// One positive and one negative mobile charge.
    Dipole,
    /// Four fixed charges of alternating sign around a mobile probe.
    Quadrupole,
    /// Eight mobile charges of alternating sign on a circle.
    Ring,
    /// Seeded random positions and signs.
    Random,
}

impl Preset {
    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        match name {
            "dipole" => Ok(Preset::Dipole),
            "quadrupole" => Ok(Preset::Quadrupole),
            "ring" => Ok(Preset::Ring),
            "random" => Ok(Preset::Random),
            _ => Err(FieldError::UnknownPreset(name.to_string())),
        }
    }

    pub fn list_names() -> &'static [&'static str] {
        PRESET_NAMES
    }

    /// Particle records for this preset. Only `Random` uses `seed`.
    pub fn particles(self, seed: u64) -> Vec<Particle> {
        let q = PRESET_CHARGE;
        match self {
            Preset::Dipole => vec![
                Particle::at_rest(-0.4, 0.0, q, 1.0),
                Particle::at_rest(0.4, 0.0, -q, 1.0),
            ],
            Preset::Quadrupole => vec![
                Particle::fixed(-0.5, 0.5, q),
                Particle::fixed(0.5, 0.5, -q),
                Particle::fixed(0.5, -0.5, q),
                Particle::fixed(-0.5, -0.5, -q),
                Particle::at_rest(0.1, 0.05, q / 8.0, 1.0),
            ],
            Preset::Ring => (0..8)
                .map(|i| {
                    let angle = i as f32 * std::f32::consts::FRAC_PI_4;
                    let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                    Particle::at_rest(0.6 * angle.cos(), 0.6 * angle.sin(), sign * q, 1.0)
                })
                .collect(),
            Preset::Random => {
                let mut rng = Xorshift64::new(seed);
                (0..RANDOM_COUNT)
                    .map(|_| {
                        let x = rng.next_range(-RANDOM_EXTENT, RANDOM_EXTENT);
                        let y = rng.next_range(-RANDOM_EXTENT, RANDOM_EXTENT);
                        Particle::at_rest(x, y, rng.next_sign() * q, 1.0)
                    })
                    .collect()
            }
        }
    }
}
