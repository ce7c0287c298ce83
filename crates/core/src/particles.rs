//! Structure-of-arrays particle store.
//!
//! A [`ParticleSet`] keeps mass and charge once, plus two [`Kinematics`]
//! buffers (positions and velocities): `current` is what every reader sees,
//! `next` is where the integrator writes a tick before [`ParticleSet::swap_buffers`].
//! Index `j` refers to the same particle in every array.
//!
//! [`Particle`] records exist only for scene input and output.

use serde::{ser::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FieldError;

/// Number of `N`-long blocks in the packed layout: mass, charge, x, y, vx, vy.
pub const PACKED_FIELDS: usize = 6;

/// Returns true when `m` is an IEEE-754 infinity, the marker of a fixed charge.
///
/// Checks the bit pattern directly: all exponent bits set and an empty
/// mantissa. `NaN` shares the exponent but has mantissa bits, so it is not
/// fixed. The sign bit is ignored.
pub fn is_fixed_mass(m: f32) -> bool {
    let bits = m.to_bits();
    let exponent = (bits >> 23) & 0xff;
    let mantissa = bits & 0x007f_ffff;
    exponent == 0xff && mantissa == 0
}

/// One particle as it appears in scene files and CLI output.
///
/// A `null` mass is read as `+∞` (fixed charge) and written back as `null`.
/// A `NaN` mass has no JSON form and fails to serialize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub q: f32,
    #[serde(
        default = "unit_mass",
        serialize_with = "serialize_mass",
        deserialize_with = "deserialize_mass"
    )]
    pub m: f32,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub vx: f32,
    #[serde(default)]
    pub vy: f32,
}

impl Particle {
    /// A particle at rest.
    pub fn at_rest(x: f32, y: f32, q: f32, m: f32) -> Self {
        Self {
            q,
            m,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    /// An immovable charge.
    pub fn fixed(x: f32, y: f32, q: f32) -> Self {
        Self::at_rest(x, y, q, f32::INFINITY)
    }

    pub fn is_fixed(&self) -> bool {
        is_fixed_mass(self.m)
    }
}

fn unit_mass() -> f32 {
    1.0
}

fn serialize_mass<S: Serializer>(m: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if m.is_nan() {
        Err(S::Error::custom("particle mass is NaN"))
    } else if is_fixed_mass(*m) {
        serializer.serialize_none()
    } else {
        serializer.serialize_some(m)
    }
}

fn deserialize_mass<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::INFINITY))
}

/// Positions and velocities of every particle, one array per component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kinematics {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
}

impl Kinematics {
    /// `n` particles at the origin, at rest.
    pub fn zeroed(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            y: vec![0.0; n],
            vx: vec![0.0; n],
            vy: vec![0.0; n],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Copies all four arrays from `other` without reallocating.
    pub fn copy_from(&mut self, other: &Kinematics) {
        self.x.copy_from_slice(&other.x);
        self.y.copy_from_slice(&other.y);
        self.vx.copy_from_slice(&other.vx);
        self.vy.copy_from_slice(&other.vy);
    }

    fn push(&mut self, x: f32, y: f32, vx: f32, vy: f32) {
        self.x.push(x);
        self.y.push(y);
        self.vx.push(vx);
        self.vy.push(vy);
    }
}

/// Borrowed view used by double-buffered integrators: read `current`, write `next`.
pub struct StepBuffers<'a> {
    pub mass: &'a [f32],
    pub charge: &'a [f32],
    pub current: &'a Kinematics,
    pub next: &'a mut Kinematics,
}

/// Borrowed view used by the in-place integrator.
pub struct InPlaceBuffers<'a> {
    pub mass: &'a [f32],
    pub charge: &'a [f32],
    pub state: &'a mut Kinematics,
}

/// Read-only view over a packed buffer of [`PACKED_FIELDS`] blocks.
#[derive(Debug, Clone, Copy)]
pub struct PackedView<'a> {
    pub mass: &'a [f32],
    pub charge: &'a [f32],
    pub x: &'a [f32],
    pub y: &'a [f32],
    pub vx: &'a [f32],
    pub vy: &'a [f32],
}

impl<'a> PackedView<'a> {
    /// Splits `buffer` into six `n`-long blocks.
    ///
    /// Returns `FieldError::LengthMismatch` unless `buffer.len() == 6 * n`.
    pub fn new(n: usize, buffer: &'a [f32]) -> Result<Self, FieldError> {
        check_packed_len(n, buffer.len())?;
        let (mass, rest) = buffer.split_at(n);
        let (charge, rest) = rest.split_at(n);
        let (x, rest) = rest.split_at(n);
        let (y, rest) = rest.split_at(n);
        let (vx, vy) = rest.split_at(n);
        Ok(Self {
            mass,
            charge,
            x,
            y,
            vx,
            vy,
        })
    }
}

fn check_packed_len(n: usize, got: usize) -> Result<(), FieldError> {
    let expected = n
        .checked_mul(PACKED_FIELDS)
        .ok_or(FieldError::InvalidDimensions)?;
    if got != expected {
        return Err(FieldError::LengthMismatch {
            name: "packed buffer".into(),
            expected,
            got,
        });
    }
    Ok(())
}

/// Double-buffered structure-of-arrays particle store.
#[derive(Debug, Clone, Default)]
pub struct ParticleSet {
    mass: Vec<f32>,
    charge: Vec<f32>,
    current: Kinematics,
    next: Kinematics,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the store from particle records, preserving their order.
    pub fn from_records(records: &[Particle]) -> Self {
        let mut set = Self::new();
        records.iter().for_each(|p| set.push(*p));
        set
    }

    /// Builds the store from a packed `mass, charge, x, y, vx, vy` buffer.
    pub fn from_packed(n: usize, buffer: &[f32]) -> Result<Self, FieldError> {
        let view = PackedView::new(n, buffer)?;
        Ok(Self {
            mass: view.mass.to_vec(),
            charge: view.charge.to_vec(),
            current: Kinematics {
                x: view.x.to_vec(),
                y: view.y.to_vec(),
                vx: view.vx.to_vec(),
                vy: view.vy.to_vec(),
            },
            next: Kinematics::zeroed(n),
        })
    }

    /// Writes the current state into a packed buffer of length `6 * len()`.
    pub fn write_packed(&self, out: &mut [f32]) -> Result<(), FieldError> {
        check_packed_len(self.len(), out.len())?;
        self.copy_packed(out);
        Ok(())
    }

    /// Allocating form of [`ParticleSet::write_packed`].
    pub fn to_packed(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.len() * PACKED_FIELDS];
        self.copy_packed(&mut out);
        out
    }

    /// `out` must hold exactly `6 * len()` values.
    fn copy_packed(&self, out: &mut [f32]) {
        let n = self.len();
        debug_assert_eq!(out.len(), n * PACKED_FIELDS);
        let blocks = [
            &self.mass,
            &self.charge,
            &self.current.x,
            &self.current.y,
            &self.current.vx,
            &self.current.vy,
        ];
        // chunks_mut(0) panics, and an empty buffer has nothing to write.
        if n > 0 {
            out.chunks_mut(n)
                .zip(blocks)
                .for_each(|(dst, src)| dst.copy_from_slice(src));
        }
    }

    /// Appends a particle. Grows both buffers so they stay the same length.
    pub fn push(&mut self, p: Particle) {
        self.mass.push(p.m);
        self.charge.push(p.q);
        self.current.push(p.x, p.y, p.vx, p.vy);
        self.next.push(p.x, p.y, p.vx, p.vy);
    }

    pub fn len(&self) -> usize {
        debug_assert!(
            self.charge.len() == self.mass.len()
                && self.current.len() == self.mass.len()
                && self.next.len() == self.mass.len(),
            "particle arrays out of step"
        );
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn mass(&self) -> &[f32] {
        &self.mass
    }

    pub fn charge(&self) -> &[f32] {
        &self.charge
    }

    pub fn x(&self) -> &[f32] {
        &self.current.x
    }

    pub fn y(&self) -> &[f32] {
        &self.current.y
    }

    pub fn vx(&self) -> &[f32] {
        &self.current.vx
    }

    pub fn vy(&self) -> &[f32] {
        &self.current.vy
    }

    pub fn current(&self) -> &Kinematics {
        &self.current
    }

    /// Record for particle `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<Particle> {
        (i < self.len()).then(|| Particle {
            q: self.charge[i],
            m: self.mass[i],
            x: self.current.x[i],
            y: self.current.y[i],
            vx: self.current.vx[i],
            vy: self.current.vy[i],
        })
    }

    /// All particles as records, in store order.
    pub fn records(&self) -> Vec<Particle> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    /// Splits the store for a double-buffered tick.
    pub fn step_buffers(&mut self) -> StepBuffers<'_> {
        StepBuffers {
            mass: &self.mass,
            charge: &self.charge,
            current: &self.current,
            next: &mut self.next,
        }
    }

    /// Splits the store for an in-place tick.
    pub fn in_place_buffers(&mut self) -> InPlaceBuffers<'_> {
        InPlaceBuffers {
            mass: &self.mass,
            charge: &self.charge,
            state: &mut self.current,
        }
    }

    /// Makes `next` the new `current`. Swaps the four array pairs, copies nothing.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Total momentum `Σ m·v` of the mobile particles.
    pub fn momentum(&self) -> (f32, f32) {
        self.mobile_indices().fold((0.0, 0.0), |(px, py), i| {
            let m = self.mass[i];
            (px + m * self.current.vx[i], py + m * self.current.vy[i])
        })
    }

    /// Total kinetic energy `Σ m·|v|²/2` of the mobile particles.
    pub fn kinetic_energy(&self) -> f32 {
        self.mobile_indices()
            .map(|i| {
                let (vx, vy) = (self.current.vx[i], self.current.vy[i]);
                0.5 * self.mass[i] * (vx * vx + vy * vy)
            })
            .sum()
    }

    fn mobile_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&i| !is_fixed_mass(self.mass[i]))
    }
}
