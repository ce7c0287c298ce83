//! Field-strength to RGBA mapping and the grid-line test.
//!
//! The colormap is diverging: positive strength drives red, negative strength
//! drives blue, and green carries `|S|/15` regardless of sign. Every channel
//! saturates at 255 and alpha is always opaque.
//!
//! [`strength_to_rgba_lanes`] computes the same bytes as [`strength_to_rgba`]
//! with one operation over all four channels, driven by the per-channel
//! constant vectors below.

use crate::field::{splat, Lane};

/// Divisor applied to `|S|` for the green channel.
pub const GREEN_DIVISOR: f32 = 15.0;

/// Color written over grid-line pixels, alpha included.
pub const GRID_RGBA: [u8; 4] = [160, 160, 160, 160];

/// Sign applied to `S` per channel (R, G, B, A).
pub const CHANNEL_SIGNS: Lane = [1.0, 1.0, -1.0, 0.0];

/// Divisor applied per channel after the sign.
pub const CHANNEL_DIVISORS: Lane = [1.0, GREEN_DIVISOR, 1.0, 1.0];

/// Offset added per channel after clamping.
pub const CHANNEL_OFFSETS: Lane = [0.0, 0.0, 0.0, 255.0];

/// Channels that take an absolute value before clamping.
const CHANNEL_ABS: [bool; 4] = [false, true, false, false];

/// Maps a field strength to `[R, G, B, A]`.
///
/// Values are clamped to [0, 255] and truncated toward zero. `NaN` maps to 0
/// in every color channel.
pub fn strength_to_rgba(s: f32) -> [u8; 4] {
    let red = s.clamp(0.0, 255.0);
    let green = (s / GREEN_DIVISOR).abs().clamp(0.0, 255.0);
    let blue = (-s).clamp(0.0, 255.0);
    [red as u8, green as u8, blue as u8, 255]
}

/// Lane form of [`strength_to_rgba`]; produces identical bytes.
pub fn strength_to_rgba_lanes(s: f32) -> [u8; 4] {
    let s128 = splat(s);
    let channels: Lane = std::array::from_fn(|i| {
        let v = s128[i] * CHANNEL_SIGNS[i] / CHANNEL_DIVISORS[i];
        let v = if CHANNEL_ABS[i] { v.abs() } else { v };
        // f32::max/min discard NaN, which sends NaN channels (and 0·∞ in alpha) to 0.
        v.max(0.0).min(255.0) + CHANNEL_OFFSETS[i]
    });
    channels.map(|c| c as u8)
}

/// True when world coordinate `c` lies within `tolerance` of a multiple of `spacing`.
///
/// Rounds `c / spacing` to the nearest integer, ties to even.
pub fn is_grid_line(c: f32, spacing: f32, tolerance: f32) -> bool {
    let diff = (c / spacing).round_ties_even() * spacing - c;
    diff <= tolerance && diff >= -tolerance
}

/// Converts a number of grid divisions across the `[-1, 1]` box into a
/// spacing. Zero divisions disables the grid.
pub fn grid_spacing(divisions: usize) -> f32 {
    if divisions == 0 {
        0.0
    } else {
        2.0 / divisions as f32
    }
}
