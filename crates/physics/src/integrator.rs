//! Fixed-step integrators for charged particles in the `[-1, 1]²` box.
//!
//! Every method works on the double buffer of a [`ParticleSet`]: stages read
//! the pre-tick `current` arrays and the result lands in `next`, followed by a
//! swap. All particles in one tick therefore see the same positions, whatever
//! order they are visited in. [`update_charges_in_place`] is the cheaper,
//! order-dependent alternative for explicit Euler.
//!
//! Particles whose mass is infinite (see [`is_fixed_mass`]) act only as field
//! sources and never move.

use charge_field_core::field::{field_vector, FieldParams};
use charge_field_core::particles::{InPlaceBuffers, StepBuffers};
use charge_field_core::{is_fixed_mass, FieldError, Kinematics, ParticleSet};

/// Available integration methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationMethod {
    /// Explicit Euler: one field evaluation per tick.
    Euler,
    /// Explicit midpoint: field re-evaluated at the half-step state.
    Midpoint,
    /// Heun: average of the fields at the start and the Euler-predicted end.
    ///
    /// The averaged force is applied over the full `dt`. This deliberately
    /// departs from the shortcut of applying the summed forces over `dt/2`,
    /// which also advances positions by only `v·dt/2`.
    Heun,
    /// Classic fourth-order Runge-Kutta on velocities.
    Rk4,
}

const METHOD_NAMES: &[&str] = &["euler", "midpoint", "heun", "rk4"];

impl IntegrationMethod {
    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        match name {
            "euler" => Ok(IntegrationMethod::Euler),
            "midpoint" => Ok(IntegrationMethod::Midpoint),
            "heun" => Ok(IntegrationMethod::Heun),
            "rk4" => Ok(IntegrationMethod::Rk4),
            _ => Err(FieldError::UnknownMethod(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegrationMethod::Euler => "euler",
            IntegrationMethod::Midpoint => "midpoint",
            IntegrationMethod::Heun => "heun",
            IntegrationMethod::Rk4 => "rk4",
        }
    }

    pub fn list_names() -> &'static [&'static str] {
        METHOD_NAMES
    }
}

/// How explicit Euler writes its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Read `current`, write `next`, swap. Order-independent.
    DoubleBuffered,
    /// Overwrite `current` particle by particle. Later particles see the
    /// already-moved earlier ones, so results depend on particle order.
    InPlace,
}

impl UpdateMode {
    pub fn from_name(name: &str) -> Result<Self, FieldError> {
        match name {
            "double_buffered" => Ok(UpdateMode::DoubleBuffered),
            "in_place" => Ok(UpdateMode::InPlace),
            _ => Err(FieldError::UnknownMethod(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UpdateMode::DoubleBuffered => "double_buffered",
            UpdateMode::InPlace => "in_place",
        }
    }
}

/// Per-tick constants shared by every method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    /// Time step of one tick.
    pub dt: f32,
    /// Velocity factor applied once per tick.
    pub friction: f32,
    /// Velocity factor applied on a wall hit (sign flip included by the bounce).
    pub wall_elasticity: f32,
    /// Physics-form field constants.
    pub field: FieldParams,
}

/// One velocity/position update: `v += F·(k·dt·q/m)`, `v *= friction`, `x += v·dt`.
#[derive(Debug, Clone, Copy)]
struct Kick {
    dt: f32,
    friction: f32,
    k: f32,
    /// Wall elasticity, or `None` for intermediate stages that skip the walls.
    walls: Option<f32>,
}

impl Kick {
    fn with_dt(self, dt: f32) -> Self {
        Self { dt, ..self }
    }

    fn without_walls(self) -> Self {
        Self {
            walls: None,
            ..self
        }
    }

    /// Advances one mobile particle. `(fx, fy)` is the field at its position.
    #[inline]
    fn apply(&self, m: f32, q: f32, state: Motion, fx: f32, fy: f32) -> Motion {
        let scale = self.k * self.dt * q / m;
        let mut vx = (state.vx + fx * scale) * self.friction;
        let mut vy = (state.vy + fy * scale) * self.friction;
        let mut x = state.x + vx * self.dt;
        let mut y = state.y + vy * self.dt;
        if let Some(elasticity) = self.walls {
            (x, vx) = bounce(x, vx, elasticity);
            (y, vy) = bounce(y, vy, elasticity);
        }
        Motion { x, y, vx, vy }
    }
}

impl From<StepParams> for Kick {
    fn from(p: StepParams) -> Self {
        Self {
            dt: p.dt,
            friction: p.friction,
            k: p.field.k,
            walls: Some(p.wall_elasticity),
        }
    }
}

/// Position and velocity of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Motion {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
}

impl Motion {
    #[inline]
    fn load(k: &Kinematics, j: usize) -> Self {
        Self {
            x: k.x[j],
            y: k.y[j],
            vx: k.vx[j],
            vy: k.vy[j],
        }
    }

    #[inline]
    fn store(self, k: &mut Kinematics, j: usize) {
        k.x[j] = self.x;
        k.y[j] = self.y;
        k.vx[j] = self.vx;
        k.vy[j] = self.vy;
    }
}

/// Reflects a coordinate that reached a wall at `±1`.
///
/// Returns the mirrored position and the velocity scaled by `-elasticity`.
/// A single reflection: a position past `±3` stays out of the box.
pub fn bounce(position: f32, velocity: f32, elasticity: f32) -> (f32, f32) {
    if position >= 1.0 {
        (2.0 - position, velocity * -elasticity)
    } else if position <= -1.0 {
        (-2.0 - position, velocity * -elasticity)
    } else {
        (position, velocity)
    }
}

/// Converts a medium friction in `[0, 1]` applied over a whole frame into the
/// per-tick velocity factor for `substeps` ticks.
pub fn friction_per_substep(medium_friction: f32, substeps: usize) -> f32 {
    if medium_friction > 0.0 {
        (1.0 - medium_friction).powf(1.0 / substeps.max(1) as f32)
    } else {
        1.0
    }
}

/// Advances `particles` by `steps` explicit-Euler ticks, double-buffered.
pub fn update_charges(
    particles: &mut ParticleSet,
    steps: usize,
    dt: f32,
    friction: f32,
    wall_elasticity: f32,
    field: FieldParams,
) {
    debug_assert!(dt > 0.0 && dt.is_finite(), "dt must be positive, got {dt}");
    let kick = Kick::from(StepParams {
        dt,
        friction,
        wall_elasticity,
        field,
    });
    for _ in 0..steps {
        let StepBuffers {
            mass,
            charge,
            current,
            next,
        } = particles.step_buffers();
        for (j, (&m, &q)) in mass.iter().zip(charge).enumerate() {
            let state = Motion::load(current, j);
            let moved = if is_fixed_mass(m) {
                state
            } else {
                let (fx, fy) = field_vector(
                    state.x,
                    state.y,
                    charge,
                    &current.x,
                    &current.y,
                    field.softening,
                );
                kick.apply(m, q, state, fx, fy)
            };
            moved.store(next, j);
        }
        particles.swap_buffers();
    }
}

/// Like [`update_charges`] but overwrites each particle as soon as it moves.
pub fn update_charges_in_place(
    particles: &mut ParticleSet,
    steps: usize,
    dt: f32,
    friction: f32,
    wall_elasticity: f32,
    field: FieldParams,
) {
    debug_assert!(dt > 0.0 && dt.is_finite(), "dt must be positive, got {dt}");
    let kick = Kick::from(StepParams {
        dt,
        friction,
        wall_elasticity,
        field,
    });
    let InPlaceBuffers {
        mass,
        charge,
        state,
    } = particles.in_place_buffers();
    for _ in 0..steps {
        for (j, (&m, &q)) in mass.iter().zip(charge).enumerate() {
            if is_fixed_mass(m) {
                continue;
            }
            let current = Motion::load(state, j);
            let (fx, fy) = field_vector(
                current.x,
                current.y,
                charge,
                &state.x,
                &state.y,
                field.softening,
            );
            kick.apply(m, q, current, fx, fy).store(state, j);
        }
    }
}

/// Field vectors for every particle.
#[derive(Debug, Clone, Default)]
pub struct Forces {
    pub fx: Vec<f32>,
    pub fy: Vec<f32>,
}

impl Forces {
    fn zeroed(n: usize) -> Self {
        Self {
            fx: vec![0.0; n],
            fy: vec![0.0; n],
        }
    }

    /// `self = (self + other) / 2`
    fn average_with(&mut self, other: &Forces) {
        self.fx
            .iter_mut()
            .zip(&other.fx)
            .for_each(|(a, b)| *a = (*a + b) * 0.5);
        self.fy
            .iter_mut()
            .zip(&other.fy)
            .for_each(|(a, b)| *a = (*a + b) * 0.5);
    }
}

/// Evaluates the physics-form field at every particle position of `at`.
pub fn find_forces(charge: &[f32], at: &Kinematics, softening: f32, out: &mut Forces) {
    debug_assert!(out.fx.len() == charge.len() && out.fy.len() == charge.len());
    for j in 0..charge.len() {
        let (fx, fy) = field_vector(at.x[j], at.y[j], charge, &at.x, &at.y, softening);
        out.fx[j] = fx;
        out.fy[j] = fy;
    }
}

/// Applies `forces` to the state in `from`, writing the result into `to`.
///
/// Fixed particles are copied unchanged.
fn apply_forces(
    mass: &[f32],
    charge: &[f32],
    from: &Kinematics,
    forces: &Forces,
    kick: Kick,
    to: &mut Kinematics,
) {
    for (j, (&m, &q)) in mass.iter().zip(charge).enumerate() {
        let state = Motion::load(from, j);
        let moved = if is_fixed_mass(m) {
            state
        } else {
            kick.apply(m, q, state, forces.fx[j], forces.fy[j])
        };
        moved.store(to, j);
    }
}

/// Runs any [`IntegrationMethod`] with scratch storage allocated once.
///
/// The scratch arrays are resized only when the particle count changes.
#[derive(Debug, Clone)]
pub struct Integrator {
    method: IntegrationMethod,
    mode: UpdateMode,
    forces: [Forces; 4],
    stages: [Kinematics; 4],
}

impl Integrator {
    pub fn new(method: IntegrationMethod, mode: UpdateMode, particle_count: usize) -> Self {
        let mode = if method != IntegrationMethod::Euler && mode == UpdateMode::InPlace {
            log::warn!(
                "in-place updates are only available for euler; {} stays double-buffered",
                method.name()
            );
            UpdateMode::DoubleBuffered
        } else {
            mode
        };
        let mut integrator = Self {
            method,
            mode,
            forces: Default::default(),
            stages: Default::default(),
        };
        integrator.ensure_len(particle_count);
        integrator
    }

    pub fn method(&self) -> IntegrationMethod {
        self.method
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    fn ensure_len(&mut self, n: usize) {
        if self.method == IntegrationMethod::Euler || self.forces[0].fx.len() == n {
            return;
        }
        log::debug!("sizing {} scratch for {n} particles", self.method.name());
        self.forces = std::array::from_fn(|_| Forces::zeroed(n));
        self.stages = std::array::from_fn(|_| Kinematics::zeroed(n));
    }

    /// Advances `particles` by `steps` ticks.
    pub fn advance(&mut self, particles: &mut ParticleSet, steps: usize, params: StepParams) {
        debug_assert!(
            params.dt > 0.0 && params.dt.is_finite(),
            "dt must be positive, got {}",
            params.dt
        );
        let StepParams {
            dt,
            friction,
            wall_elasticity,
            field,
        } = params;
        match (self.method, self.mode) {
            (IntegrationMethod::Euler, UpdateMode::DoubleBuffered) => {
                update_charges(particles, steps, dt, friction, wall_elasticity, field)
            }
            (IntegrationMethod::Euler, UpdateMode::InPlace) => {
                update_charges_in_place(particles, steps, dt, friction, wall_elasticity, field)
            }
            (method, _) => {
                self.ensure_len(particles.len());
                let kick = Kick::from(params);
                for _ in 0..steps {
                    let buffers = particles.step_buffers();
                    match method {
                        IntegrationMethod::Midpoint => self.midpoint(buffers, kick, field),
                        IntegrationMethod::Heun => self.heun(buffers, kick, field),
                        _ => self.rk4(buffers, kick, field),
                    }
                    particles.swap_buffers();
                }
            }
        }
    }

    fn midpoint(&mut self, b: StepBuffers<'_>, kick: Kick, field: FieldParams) {
        let forces = &mut self.forces[0];
        find_forces(b.charge, b.current, field.softening, forces);
        // Half step into `next`, then re-evaluate the field there.
        let half = kick.with_dt(kick.dt * 0.5).without_walls();
        apply_forces(b.mass, b.charge, b.current, forces, half, b.next);
        find_forces(b.charge, b.next, field.softening, forces);
        apply_forces(b.mass, b.charge, b.current, forces, kick, b.next);
    }

    fn heun(&mut self, b: StepBuffers<'_>, kick: Kick, field: FieldParams) {
        let [start, end, ..] = &mut self.forces;
        find_forces(b.charge, b.current, field.softening, start);
        apply_forces(b.mass, b.charge, b.current, start, kick.without_walls(), b.next);
        find_forces(b.charge, b.next, field.softening, end);
        start.average_with(end);
        apply_forces(b.mass, b.charge, b.current, start, kick, b.next);
    }

    fn rk4(&mut self, b: StepBuffers<'_>, kick: Kick, field: FieldParams) {
        let [f1, f2, f3, f4] = &mut self.forces;
        let [k1, k2, k3, k4] = &mut self.stages;
        let soft = field.softening;
        let inner = kick.without_walls();
        let half = inner.with_dt(kick.dt * 0.5);

        find_forces(b.charge, b.current, soft, f1);
        apply_forces(b.mass, b.charge, b.current, f1, half, k1);
        find_forces(b.charge, k1, soft, f2);
        apply_forces(b.mass, b.charge, b.current, f2, half, k2);
        find_forces(b.charge, k2, soft, f3);
        apply_forces(b.mass, b.charge, b.current, f3, inner, k3);
        find_forces(b.charge, k3, soft, f4);
        apply_forces(b.mass, b.charge, b.current, f4, inner, k4);

        // Friction is applied inside each stage, so the first two stages are
        // re-run over the full step instead of rescaling their half steps.
        apply_forces(b.mass, b.charge, b.current, f1, inner, k1);
        apply_forces(b.mass, b.charge, b.current, f2, inner, k2);

        let walls = kick.walls.unwrap_or(1.0);
        for (j, &m) in b.mass.iter().enumerate() {
            let start = Motion::load(b.current, j);
            if is_fixed_mass(m) {
                start.store(b.next, j);
                continue;
            }
            let mut vx = (k1.vx[j] + 2.0 * k2.vx[j] + 2.0 * k3.vx[j] + k4.vx[j]) / 6.0;
            let mut vy = (k1.vy[j] + 2.0 * k2.vy[j] + 2.0 * k3.vy[j] + k4.vy[j]) / 6.0;
            let mut x = start.x + vx * kick.dt;
            let mut y = start.y + vy * kick.dt;
            (x, vx) = bounce(x, vx, walls);
            (y, vy) = bounce(y, vy, walls);
            Motion { x, y, vx, vy }.store(b.next, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charge_field_core::Particle;

    const ALL_METHODS: [IntegrationMethod; 4] = [
        IntegrationMethod::Euler,
        IntegrationMethod::Midpoint,
        IntegrationMethod::Heun,
        IntegrationMethod::Rk4,
    ];

    fn params(dt: f32, friction: f32) -> StepParams {
        StepParams {
            dt,
            friction,
            wall_elasticity: 1.0,
            field: FieldParams::PHYSICS,
        }
    }

    fn particle(x: f32, y: f32, vx: f32, vy: f32, q: f32, m: f32) -> Particle {
        Particle { q, m, x, y, vx, vy }
    }

    fn advance(set: &mut ParticleSet, method: IntegrationMethod, steps: usize, p: StepParams) {
        Integrator::new(method, UpdateMode::DoubleBuffered, set.len()).advance(set, steps, p);
    }

    // ---- walls ----

    #[test]
    fn bounce_reflects_about_right_wall() {
        let (x, v) = bounce(1.05, 0.5, 1.0);
        assert!((x - 0.95).abs() < 1e-6, "x = {x}");
        assert_eq!(v, -0.5);
    }

    #[test]
    fn bounce_reflects_about_left_wall_with_damping() {
        let (x, v) = bounce(-1.2, -1.0, 0.5);
        assert!((x + 0.8).abs() < 1e-6, "x = {x}");
        assert_eq!(v, 0.5);
    }

    #[test]
    fn bounce_leaves_interior_points_alone() {
        assert_eq!(bounce(0.99, 3.0, 0.2), (0.99, 3.0));
    }

    #[test]
    fn bounce_is_a_single_reflection() {
        let (x, _) = bounce(3.5, 1.0, 1.0);
        assert_eq!(x, -1.5);
    }

    #[test]
    fn particle_past_the_wall_lands_mirrored() {
        // Starts at 0.95 moving right; one tick of dt = 0.01 at vx = 10 reaches 1.05.
        let mut set = ParticleSet::from_records(&[particle(0.95, 0.0, 10.0, 0.0, 0.0, 1.0)]);
        update_charges(&mut set, 1, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        assert!((set.x()[0] - 0.95).abs() < 1e-5, "x = {}", set.x()[0]);
        assert_eq!(set.vx()[0], -10.0);
    }

    // ---- friction ----

    #[test]
    fn friction_per_substep_composes_to_frame_friction() {
        let f = friction_per_substep(0.3, 4);
        assert!((f.powi(4) - 0.7).abs() < 1e-5);
        assert_eq!(friction_per_substep(0.0, 10), 1.0);
        assert_eq!(friction_per_substep(0.5, 0), 0.5);
    }

    #[test]
    fn friction_damps_a_free_particle() {
        let mut set = ParticleSet::from_records(&[particle(0.0, 0.0, 1.0, 0.0, 0.0, 1.0)]);
        update_charges(&mut set, 3, 0.001, 0.5, 1.0, FieldParams::PHYSICS);
        assert_eq!(set.vx()[0], 0.125);
    }

    // ---- fixed charges ----

    #[test]
    fn fixed_charge_never_moves() {
        for method in ALL_METHODS {
            let mut set = ParticleSet::from_records(&[
                particle(0.1, 0.2, 0.3, -0.3, 50.0, f32::INFINITY),
                particle(-0.3, 0.0, 0.0, 0.0, -800.0, 1.0),
            ]);
            advance(&mut set, method, 200, params(0.01, 1.0));
            assert_eq!(set.x()[0], 0.1, "{method:?}");
            assert_eq!(set.y()[0], 0.2, "{method:?}");
            assert_eq!(set.vx()[0], 0.3, "{method:?}");
        }
    }

    #[test]
    fn fixed_charge_never_moves_in_place() {
        let mut set = ParticleSet::from_records(&[
            Particle::fixed(0.0, 0.0, 800.0),
            particle(0.2, 0.0, 0.0, 0.0, 800.0, 1.0),
        ]);
        update_charges_in_place(&mut set, 5, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        assert_eq!((set.x()[0], set.y()[0]), (0.0, 0.0));
        assert!(set.x()[1] > 0.2, "like charge should be pushed away");
    }

    #[test]
    fn nan_mass_is_integrated_not_fixed() {
        let mut set = ParticleSet::from_records(&[
            particle(0.0, 0.0, 0.0, 0.0, 1.0, f32::NAN),
            particle(0.5, 0.0, 0.0, 0.0, 1.0, 1.0),
        ]);
        update_charges(&mut set, 1, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        assert!(set.vx()[0].is_nan());
    }

    // ---- forces ----

    #[test]
    fn opposite_charges_attract_like_charges_repel() {
        let mut attract = ParticleSet::from_records(&[
            particle(-0.2, 0.0, 0.0, 0.0, 800.0, 1.0),
            particle(0.2, 0.0, 0.0, 0.0, -800.0, 1.0),
        ]);
        update_charges(&mut attract, 2, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        assert!(attract.x()[0] > -0.2 && attract.x()[1] < 0.2);

        let mut repel = ParticleSet::from_records(&[
            particle(-0.2, 0.0, 0.0, 0.0, 800.0, 1.0),
            particle(0.2, 0.0, 0.0, 0.0, 800.0, 1.0),
        ]);
        update_charges(&mut repel, 2, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        assert!(repel.x()[0] < -0.2 && repel.x()[1] > 0.2);
    }

    #[test]
    fn one_euler_tick_matches_hand_computation() {
        let mut set = ParticleSet::from_records(&[
            particle(0.0, 0.0, 0.0, 0.0, 2.0, 4.0),
            particle(0.5, 0.0, 0.0, 0.0, 1.0, f32::INFINITY),
        ]);
        let field = FieldParams {
            k: 1.0,
            softening: 1e-6,
        };
        update_charges(&mut set, 1, 0.1, 1.0, 1.0, field);
        // E at origin from q=1 at 0.5: dx = -0.5, q/r²/r = 1/0.25/0.5 = 8, Fx = -4.
        // v = -4 · (1·0.1·2/4) = -0.2, x = -0.02.
        assert!((set.vx()[0] + 0.2).abs() < 1e-6, "vx = {}", set.vx()[0]);
        assert!((set.x()[0] + 0.02).abs() < 1e-6, "x = {}", set.x()[0]);
    }

    #[test]
    fn zero_steps_change_nothing() {
        let records = [particle(0.3, 0.1, 1.0, 1.0, 800.0, 1.0)];
        let mut set = ParticleSet::from_records(&records);
        update_charges(&mut set, 0, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        assert_eq!(set.records(), records);
    }

    // ---- ordering ----

    #[test]
    fn double_buffering_is_order_independent() {
        let records = [
            particle(-0.3, 0.1, 0.0, 0.2, 800.0, 1.0),
            particle(0.25, -0.2, 0.1, 0.0, -400.0, 2.0),
            particle(0.05, 0.4, -0.1, 0.0, 600.0, 1.5),
        ];
        let mut forward = ParticleSet::from_records(&records);
        let reversed_records: Vec<Particle> = records.iter().rev().copied().collect();
        let mut reversed = ParticleSet::from_records(&reversed_records);
        update_charges(&mut forward, 20, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        update_charges(&mut reversed, 20, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        for i in 0..3 {
            let a = forward.get(i).unwrap();
            let b = reversed.get(2 - i).unwrap();
            assert!((a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5);
        }
    }

    #[test]
    fn in_place_differs_from_double_buffered() {
        let records = [
            particle(-0.1, 0.0, 0.0, 0.0, 800.0, 1.0),
            particle(0.1, 0.0, 0.0, 0.0, 800.0, 1.0),
        ];
        let mut buffered = ParticleSet::from_records(&records);
        let mut in_place = ParticleSet::from_records(&records);
        update_charges(&mut buffered, 1, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        update_charges_in_place(&mut in_place, 1, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
        // The first particle moves identically; the second sees it already moved.
        assert_eq!(buffered.x()[0], in_place.x()[0]);
        assert_ne!(buffered.x()[1], in_place.x()[1]);
    }

    // ---- symmetry and conservation ----

    #[test]
    fn mirrored_pair_stays_mirrored() {
        for method in ALL_METHODS {
            let mut set = ParticleSet::from_records(&[
                particle(-0.3, 0.2, 0.1, 0.0, 800.0, 1.0),
                particle(0.3, -0.2, -0.1, 0.0, 800.0, 1.0),
            ]);
            advance(&mut set, method, 300, params(0.01, 0.99));
            assert_eq!(set.x()[0], -set.x()[1], "{method:?}");
            assert_eq!(set.y()[0], -set.y()[1], "{method:?}");
            assert_eq!(set.vx()[0], -set.vx()[1], "{method:?}");
            assert_eq!(set.vy()[0], -set.vy()[1], "{method:?}");
        }
    }

    #[test]
    fn momentum_decays_under_friction() {
        let mut set = ParticleSet::from_records(&[
            particle(-0.25, 0.0, 0.2, 0.1, 100.0, 1.0),
            particle(0.25, 0.1, 0.1, 0.0, -100.0, 2.0),
        ]);
        let magnitude = |s: &ParticleSet| {
            let (px, py) = s.momentum();
            (px * px + py * py).sqrt()
        };
        let mut previous = magnitude(&set);
        for _ in 0..10 {
            update_charges(&mut set, 1, 0.01, 0.9, 1.0, FieldParams::PHYSICS);
            let now = magnitude(&set);
            assert!(now <= previous + 1e-6, "{now} > {previous}");
            previous = now;
        }
        assert!(previous < 0.5 * 0.5);
    }

    #[test]
    fn lone_particle_moves_in_a_straight_line() {
        for method in ALL_METHODS {
            let mut set = ParticleSet::from_records(&[particle(0.0, 0.0, 0.5, -0.25, 800.0, 1.0)]);
            advance(&mut set, method, 10, params(0.01, 1.0));
            assert!((set.x()[0] - 0.05).abs() < 1e-5, "{method:?}: x = {}", set.x()[0]);
            assert!((set.y()[0] + 0.025).abs() < 1e-5, "{method:?}: y = {}", set.y()[0]);
            assert_eq!(set.vx()[0], 0.5, "{method:?}");
        }
    }

    #[test]
    fn higher_order_methods_agree_with_fine_euler() {
        let records = [
            Particle::fixed(0.0, 0.0, 800.0),
            particle(0.3, 0.0, 0.0, 0.4, -10.0, 1.0),
        ];
        let mut reference = ParticleSet::from_records(&records);
        update_charges(&mut reference, 1000, 0.0001, 1.0, 1.0, FieldParams::PHYSICS);
        for method in [IntegrationMethod::Midpoint, IntegrationMethod::Heun, IntegrationMethod::Rk4] {
            let mut set = ParticleSet::from_records(&records);
            advance(&mut set, method, 10, params(0.01, 1.0));
            let dx = set.x()[1] - reference.x()[1];
            let dy = set.y()[1] - reference.y()[1];
            assert!((dx * dx + dy * dy).sqrt() < 1e-2, "{method:?} drifted");
        }
    }

    // ---- registry ----

    #[test]
    fn method_names_round_trip() {
        for name in IntegrationMethod::list_names() {
            assert_eq!(IntegrationMethod::from_name(name).unwrap().name(), *name);
        }
        assert!(matches!(
            IntegrationMethod::from_name("verlet"),
            Err(FieldError::UnknownMethod(_))
        ));
    }

    #[test]
    fn in_place_falls_back_for_higher_order_methods() {
        let integrator = Integrator::new(IntegrationMethod::Rk4, UpdateMode::InPlace, 3);
        assert_eq!(integrator.mode(), UpdateMode::DoubleBuffered);
        let euler = Integrator::new(IntegrationMethod::Euler, UpdateMode::InPlace, 3);
        assert_eq!(euler.mode(), UpdateMode::InPlace);
    }

    #[test]
    fn integrator_resizes_scratch_when_particles_are_added() {
        let mut set = ParticleSet::from_records(&[particle(0.0, 0.0, 0.0, 0.0, 1.0, 1.0)]);
        let mut integrator = Integrator::new(IntegrationMethod::Heun, UpdateMode::DoubleBuffered, 1);
        integrator.advance(&mut set, 1, params(0.01, 1.0));
        set.push(particle(0.5, 0.5, 0.0, 0.0, 1.0, 1.0));
        integrator.advance(&mut set, 1, params(0.01, 1.0));
        assert_eq!(set.len(), 2);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn mobile() -> impl Strategy<Value = Particle> {
            (
                -0.9_f32..0.9,
                -0.9_f32..0.9,
                -1.0_f32..1.0,
                -1.0_f32..1.0,
                -800.0_f32..800.0,
                0.5_f32..5.0,
            )
                .prop_map(|(x, y, vx, vy, q, m)| particle(x, y, vx, vy, q, m))
        }

        proptest! {
            #[test]
            fn fixed_charges_stay_put(
                others in prop::collection::vec(mobile(), 0..6),
                fx in -0.9_f32..0.9,
                fy in -0.9_f32..0.9,
                q in -800.0_f32..800.0,
                steps in 1_usize..30,
            ) {
                let mut records = vec![Particle::fixed(fx, fy, q)];
                records.extend(others);
                let mut set = ParticleSet::from_records(&records);
                update_charges(&mut set, steps, 0.01, 0.98, 0.8, FieldParams::PHYSICS);
                prop_assert_eq!(set.x()[0], fx);
                prop_assert_eq!(set.y()[0], fy);
            }

            #[test]
            fn slow_particles_stay_in_the_box(
                records in prop::collection::vec(mobile(), 1..6),
                steps in 1_usize..30,
            ) {
                // Without charges the speed stays below one box width per tick.
                let neutral: Vec<Particle> = records
                    .into_iter()
                    .map(|p| Particle { q: 0.0, ..p })
                    .collect();
                let mut set = ParticleSet::from_records(&neutral);
                update_charges(&mut set, steps, 0.01, 1.0, 1.0, FieldParams::PHYSICS);
                for (&x, &y) in set.x().iter().zip(set.y()) {
                    prop_assert!((-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y));
                }
            }
        }
    }
}
