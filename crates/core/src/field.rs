//! Point-charge field evaluation.
//!
//! Two related formulas share this module:
//!
//! - the **render** form, a scalar `Σ k·q / max(r², ε)` that clamps close
//!   charges to the value at distance `√ε`;
//! - the **physics** form, a vector `Σ q·(dx, dy) / (r²·√r²)` that skips any
//!   charge closer than `√ε` (which also removes the self term).
//!
//! The render form is evaluated one image row at a time: [`FieldEvaluator::prepare_row`]
//! caches `(y - y_l)²` for every charge, and [`FieldEvaluator::strength`] reuses
//! that cache for every pixel in the row. [`ScalarEvaluator`] is the reference
//! implementation, [`LaneEvaluator`] processes [`LANES`] charges per iteration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::color::{strength_to_rgba, strength_to_rgba_lanes};
use crate::params::param_f32;

/// Charges processed per iteration by [`LaneEvaluator`].
pub const LANES: usize = 4;

/// A group of [`LANES`] values operated on together.
pub type Lane = [f32; LANES];

/// Scale constant and softening floor for one use of the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldParams {
    /// Global scale `k`.
    pub k: f32,
    /// Softening floor `ε`, a squared distance.
    pub softening: f32,
}

impl FieldParams {
    /// Constants used when rendering.
    pub const RENDER: FieldParams = FieldParams {
        k: 0.001,
        softening: 0.00003,
    };

    /// Constants used by the integrator.
    pub const PHYSICS: FieldParams = FieldParams {
        k: 0.00003,
        softening: 0.0003,
    };

    /// Reads `k` and `softening` from `params`, falling back to `defaults`.
    pub fn from_json(params: &Value, defaults: FieldParams) -> Self {
        Self {
            k: param_f32(params, "k", defaults.k),
            softening: param_f32(params, "softening", defaults.softening),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "k": self.k,
            "softening": self.softening,
        })
    }
}

/// Evaluates the render-form field along one image row at a time.
pub trait FieldEvaluator {
    /// Constants this evaluator applies.
    fn params(&self) -> FieldParams;

    /// Fills `dy_squared[l]` with `(y - ys[l])²` for the row at world `y`.
    fn prepare_row(&self, y: f32, ys: &[f32], dy_squared: &mut [f32]) {
        debug_assert_eq!(ys.len(), dy_squared.len());
        dy_squared.iter_mut().zip(ys).for_each(|(d, &py)| {
            let dy = y - py;
            *d = dy * dy;
        });
    }

    /// Field strength at world `x` on the row last passed to `prepare_row`.
    fn strength(&self, x: f32, q: &[f32], xs: &[f32], dy_squared: &[f32]) -> f32;

    /// Maps a strength to RGBA bytes. Every implementation produces the same bytes.
    fn rgba(&self, s: f32) -> [u8; 4] {
        strength_to_rgba(s)
    }
}

/// Reference evaluator: one charge per iteration, `k` applied per term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarEvaluator {
    params: FieldParams,
}

impl ScalarEvaluator {
    pub fn new(params: FieldParams) -> Self {
        Self { params }
    }
}

impl Default for ScalarEvaluator {
    fn default() -> Self {
        Self::new(FieldParams::RENDER)
    }
}

impl FieldEvaluator for ScalarEvaluator {
    fn params(&self) -> FieldParams {
        self.params
    }

    fn strength(&self, x: f32, q: &[f32], xs: &[f32], dy_squared: &[f32]) -> f32 {
        debug_assert!(q.len() == xs.len() && q.len() == dy_squared.len());
        let FieldParams { k, softening } = self.params;
        q.iter()
            .zip(xs)
            .zip(dy_squared)
            .map(|((&q, &px), &dy2)| {
                let dx = x - px;
                k * q / (dx * dx + dy2).max(softening)
            })
            .sum()
    }
}

/// Lane evaluator: [`LANES`] charges per iteration, `k` applied once.
///
/// Charge counts that are not a multiple of [`LANES`] finish with a scalar
/// tail. Results match [`ScalarEvaluator`] up to summation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneEvaluator {
    params: FieldParams,
}

impl LaneEvaluator {
    pub fn new(params: FieldParams) -> Self {
        Self { params }
    }
}

impl Default for LaneEvaluator {
    fn default() -> Self {
        Self::new(FieldParams::RENDER)
    }
}

impl FieldEvaluator for LaneEvaluator {
    fn params(&self) -> FieldParams {
        self.params
    }

    fn strength(&self, x: f32, q: &[f32], xs: &[f32], dy_squared: &[f32]) -> f32 {
        debug_assert!(q.len() == xs.len() && q.len() == dy_squared.len());
        let FieldParams { k, softening } = self.params;
        let x128 = splat(x);
        let floor128 = splat(softening);

        let q_chunks = q.chunks_exact(LANES);
        let x_chunks = xs.chunks_exact(LANES);
        let d_chunks = dy_squared.chunks_exact(LANES);
        let (q_tail, x_tail, d_tail) = (
            q_chunks.remainder(),
            x_chunks.remainder(),
            d_chunks.remainder(),
        );

        let mut acc = splat(0.0);
        for ((qc, xc), dc) in q_chunks.zip(x_chunks).zip(d_chunks) {
            let dx = sub(load(xc), x128);
            let r2 = max(add(mul(dx, dx), load(dc)), floor128);
            acc = add(acc, div(load(qc), r2));
        }

        let mut sum = acc[0] + acc[1] + acc[2] + acc[3];
        for ((&q, &px), &dy2) in q_tail.iter().zip(x_tail).zip(d_tail) {
            let dx = px - x;
            sum += q / (dx * dx + dy2).max(softening);
        }
        k * sum
    }

    fn rgba(&self, s: f32) -> [u8; 4] {
        strength_to_rgba_lanes(s)
    }
}

#[inline(always)]
pub fn splat(v: f32) -> Lane {
    [v; LANES]
}

#[inline(always)]
fn load(s: &[f32]) -> Lane {
    std::array::from_fn(|i| s[i])
}

#[inline(always)]
fn add(a: Lane, b: Lane) -> Lane {
    std::array::from_fn(|i| a[i] + b[i])
}

#[inline(always)]
fn sub(a: Lane, b: Lane) -> Lane {
    std::array::from_fn(|i| a[i] - b[i])
}

#[inline(always)]
fn mul(a: Lane, b: Lane) -> Lane {
    std::array::from_fn(|i| a[i] * b[i])
}

#[inline(always)]
fn div(a: Lane, b: Lane) -> Lane {
    std::array::from_fn(|i| a[i] / b[i])
}

#[inline(always)]
fn max(a: Lane, b: Lane) -> Lane {
    std::array::from_fn(|i| a[i].max(b[i]))
}

/// Render-form strength at a single point, without a row cache.
pub fn field_strength(
    x: f32,
    y: f32,
    q: &[f32],
    xs: &[f32],
    ys: &[f32],
    params: FieldParams,
) -> f32 {
    debug_assert!(q.len() == xs.len() && q.len() == ys.len());
    q.iter()
        .zip(xs)
        .zip(ys)
        .map(|((&q, &px), &py)| {
            let dx = x - px;
            let dy = y - py;
            params.k * q / (dx * dx + dy * dy).max(params.softening)
        })
        .sum()
}

/// Physics-form field vector at `(x, y)`.
///
/// Sums `q_l·(dx, dy)/(r²·√r²)` with `(dx, dy) = (x - x_l, y - y_l)` over every
/// charge with `r² ≥ softening`; closer charges contribute nothing. The scale
/// `k` is left to the caller.
pub fn field_vector(
    x: f32,
    y: f32,
    q: &[f32],
    xs: &[f32],
    ys: &[f32],
    softening: f32,
) -> (f32, f32) {
    debug_assert!(q.len() == xs.len() && q.len() == ys.len());
    let mut fx = 0.0_f32;
    let mut fy = 0.0_f32;
    for ((&q, &px), &py) in q.iter().zip(xs).zip(ys) {
        let dx = x - px;
        let dy = y - py;
        let r2 = dx * dx + dy * dy;
        if r2 >= softening {
            let t = q / r2 / r2.sqrt();
            fx += dx * t;
            fy += dy * t;
        }
    }
    (fx, fy)
}
