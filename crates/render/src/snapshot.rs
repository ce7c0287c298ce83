//! PNG output of a rendered RGBA8 buffer.
//!
//! This module is feature-gated behind `png` (default on) so that pixel-only
//! builds do not pull in the `image` crate. Rendering itself lives in
//! [`crate::pixel`] (always available).

use charge_field_core::error::FieldError;
use charge_field_core::ParticleSet;
use std::path::Path;

use crate::pixel::render_rgba;
use crate::RenderParams;

/// Writes an RGBA8 buffer of `width·height` pixels as a PNG image.
///
/// Returns `FieldError::InvalidDimensions` if the dimensions overflow `u32`,
/// or `FieldError::Io` on a size mismatch or write failure.
pub fn write_png(rgba: Vec<u8>, width: usize, height: usize, path: &Path) -> Result<(), FieldError> {
    let w = u32::try_from(width).map_err(|_| FieldError::InvalidDimensions)?;
    let h = u32::try_from(height).map_err(|_| FieldError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| FieldError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| FieldError::Io(e.to_string()))?;
    log::debug!("wrote {width}x{height} snapshot to {}", path.display());
    Ok(())
}

/// Renders `particles` and writes the result to `path`.
pub fn render_png(
    width: usize,
    height: usize,
    particles: &ParticleSet,
    params: &RenderParams,
    path: &Path,
) -> Result<(), FieldError> {
    let rgba = render_rgba(width, height, particles, params)?;
    write_png(rgba, width, height, path)
}
