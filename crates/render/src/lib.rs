#![deny(unsafe_code)]
//! Kernel registry and scene renderer.
//!
//! Renders the render-form field of a particle set into an RGBA8 buffer
//! covering the `[-1, 1]²` box. Column `c` maps to `x = -1 + c·dx` and row
//! `r` to `y = 1 - r·dy`, so the top row is `y = 1`. An optional grid overlay
//! paints gray lines at multiples of a world-space spacing; intersections are
//! the same gray.
//!
//! Both the CLI and the benchmarks select a field kernel through [`Kernel`].

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

use charge_field_core::color::{grid_spacing, is_grid_line, GRID_RGBA};
use charge_field_core::error::FieldError;
use charge_field_core::field::{FieldEvaluator, FieldParams, LaneEvaluator, ScalarEvaluator};
use charge_field_core::params::{param_string, param_usize_in};
use serde_json::{json, Value};

/// All available kernel names.
const KERNEL_NAMES: &[&str] = &["scalar", "lanes"];

const DEFAULT_KERNEL: &str = "lanes";

/// Largest accepted number of grid divisions.
const MAX_GRID_DIVISIONS: usize = 20;

/// Enumeration of the field kernels.
///
/// Wraps each evaluator and delegates [`FieldEvaluator`] methods.
/// Use [`Kernel::from_name`] for string-based construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// One charge per iteration.
    Scalar(ScalarEvaluator),
    /// Four charges per iteration.
    Lanes(LaneEvaluator),
}

impl Kernel {
    /// Constructs a kernel by name.
    ///
    /// Returns `FieldError::UnknownKernel` if the name is not recognized.
    pub fn from_name(name: &str, params: FieldParams) -> Result<Self, FieldError> {
        match name {
            "scalar" => Ok(Kernel::Scalar(ScalarEvaluator::new(params))),
            "lanes" => Ok(Kernel::Lanes(LaneEvaluator::new(params))),
            _ => Err(FieldError::UnknownKernel(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Scalar(_) => "scalar",
            Kernel::Lanes(_) => "lanes",
        }
    }

    /// Returns a slice of all recognized kernel names.
    pub fn list_kernels() -> &'static [&'static str] {
        KERNEL_NAMES
    }
}

impl FieldEvaluator for Kernel {
    fn params(&self) -> FieldParams {
        match self {
            Kernel::Scalar(e) => e.params(),
            Kernel::Lanes(e) => e.params(),
        }
    }

    fn prepare_row(&self, y: f32, ys: &[f32], dy_squared: &mut [f32]) {
        match self {
            Kernel::Scalar(e) => e.prepare_row(y, ys, dy_squared),
            Kernel::Lanes(e) => e.prepare_row(y, ys, dy_squared),
        }
    }

    fn strength(&self, x: f32, q: &[f32], xs: &[f32], dy_squared: &[f32]) -> f32 {
        match self {
            Kernel::Scalar(e) => e.strength(x, q, xs, dy_squared),
            Kernel::Lanes(e) => e.strength(x, q, xs, dy_squared),
        }
    }

    fn rgba(&self, s: f32) -> [u8; 4] {
        match self {
            Kernel::Scalar(e) => e.rgba(s),
            Kernel::Lanes(e) => e.rgba(s),
        }
    }
}

/// Renderer settings read from a scene's `render` object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Grid divisions across the box; 0 disables the grid.
    pub grid: usize,
    /// Field kernel, carrying the render-form `k` and softening.
    pub kernel: Kernel,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            grid: 0,
            kernel: Kernel::Lanes(LaneEvaluator::new(FieldParams::RENDER)),
        }
    }
}

impl RenderParams {
    /// Extracts settings from a JSON object, falling back to defaults.
    ///
    /// Returns `FieldError::UnknownKernel` for an unrecognized `kernel`.
    pub fn from_json(params: &Value) -> Result<Self, FieldError> {
        let field = FieldParams::from_json(params, FieldParams::RENDER);
        Ok(Self {
            grid: param_usize_in(params, "grid", 0, 0, MAX_GRID_DIVISIONS),
            kernel: Kernel::from_name(&param_string(params, "kernel", DEFAULT_KERNEL), field)?,
        })
    }

    /// World-space distance between grid lines, 0 when disabled.
    pub fn grid_spacing(&self) -> f32 {
        grid_spacing(self.grid)
    }

    pub fn to_json(&self) -> Value {
        let field = self.kernel.params();
        json!({
            "grid": self.grid,
            "kernel": self.kernel.name(),
            "k": field.k,
            "softening": field.softening,
        })
    }
}

/// Renders the field of charges `(q, xs, ys)` into `buffer`.
///
/// `buffer` must hold `width·height·4` bytes and is fully overwritten.
/// `scratch` must be as long as `q`; it receives the cached `(y - y_l)²`
/// terms of each row and is left holding those of the last row.
/// A `grid_spacing` of 0 or less disables the overlay.
#[allow(clippy::too_many_arguments)]
pub fn render_scene<E: FieldEvaluator + ?Sized>(
    width: usize,
    height: usize,
    buffer: &mut [u8],
    q: &[f32],
    xs: &[f32],
    ys: &[f32],
    scratch: &mut [f32],
    grid_spacing: f32,
    evaluator: &E,
) {
    debug_assert!(width >= 2 && height >= 2, "image must be at least 2x2");
    debug_assert_eq!(buffer.len(), width * height * 4);
    debug_assert!(q.len() == xs.len() && q.len() == ys.len() && q.len() == scratch.len());
    if width == 0 || height == 0 {
        return;
    }
    let dx = 2.0 / (width - 1) as f32;
    let dy = 2.0 / (height - 1) as f32;

    for (ry, row) in buffer.chunks_exact_mut(width * 4).enumerate() {
        let y = 1.0 - ry as f32 * dy;
        evaluator.prepare_row(y, ys, scratch);
        for (rx, pixel) in row.chunks_exact_mut(4).enumerate() {
            let x = -1.0 + rx as f32 * dx;
            let s = evaluator.strength(x, q, xs, scratch);
            pixel.copy_from_slice(&evaluator.rgba(s));
        }
    }

    if grid_spacing > 0.0 {
        apply_grid(width, height, buffer, grid_spacing, dx, dy);
    }
}

/// Paints every column within `dx` and every row within `dy` of a grid line.
fn apply_grid(width: usize, height: usize, buffer: &mut [u8], spacing: f32, dx: f32, dy: f32) {
    for c in 0..width {
        let x = -1.0 + c as f32 * dx;
        if is_grid_line(x, spacing, dx) {
            buffer
                .chunks_exact_mut(4)
                .skip(c)
                .step_by(width)
                .for_each(|pixel| pixel.copy_from_slice(&GRID_RGBA));
        }
    }
    for (r, row) in buffer.chunks_exact_mut(width * 4).enumerate().take(height) {
        let y = 1.0 - r as f32 * dy;
        if is_grid_line(y, spacing, dy) {
            row.chunks_exact_mut(4)
                .for_each(|pixel| pixel.copy_from_slice(&GRID_RGBA));
        }
    }
}
