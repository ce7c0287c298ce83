//! Allocating RGBA8 rendering of a [`ParticleSet`].
//!
//! This module is always available (no feature gate) so that the `png`
//! snapshot path and callers that only need raw pixels share one entry point.

use charge_field_core::error::FieldError;
use charge_field_core::field::FieldEvaluator;
use charge_field_core::ParticleSet;

use crate::{render_scene, RenderParams};

/// Renders `particles` into a fresh `width·height·4` RGBA8 buffer.
///
/// Returns `FieldError::InvalidDimensions` if either side is below 2 or the
/// buffer size overflows `usize`.
pub fn render_rgba(
    width: usize,
    height: usize,
    particles: &ParticleSet,
    params: &RenderParams,
) -> Result<Vec<u8>, FieldError> {
    if width < 2 || height < 2 {
        return Err(FieldError::InvalidDimensions);
    }
    let len = width
        .checked_mul(height)
        .and_then(|px| px.checked_mul(4))
        .ok_or(FieldError::InvalidDimensions)?;
    log::debug!(
        "rendering {width}x{height} with {} kernel, {} charges, grid {}",
        params.kernel.name(),
        particles.len(),
        params.grid
    );
    let mut buffer = vec![0u8; len];
    let mut scratch = vec![0.0_f32; particles.len()];
    render_scene(
        width,
        height,
        &mut buffer,
        particles.charge(),
        particles.x(),
        particles.y(),
        &mut scratch,
        params.grid_spacing(),
        &params.kernel,
    );
    log::trace!("rendered with k = {}", params.kernel.params().k);
    Ok(buffer)
}
