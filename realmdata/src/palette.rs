//! Deterministic color assignment for political entities.
//!
//! Repeated runs over the same input must reproduce the same coloring so map
//! exports can be diffed, and no two siblings under one parent may share a
//! color. Hues are taken from a 64-step wheel visited in bit-reversed order,
//! so consecutive ordinals land far apart on the wheel; the whole wheel is
//! rotated by a per-parent seed so sibling groups look different from each
//! other. Ordinals past 63 reuse the wheel in a different lightness band.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const HUE_STEPS: u32 = 64;
const LIGHTNESS_BANDS: [f32; 3] = [0.50, 0.36, 0.64];
const SATURATION: f32 = 0.85;

/// Color for the `ordinal`-th child of the parent identified by `seed`.
///
/// Deterministic and order-stable; distinct from every other ordinal under
/// the same seed for sibling groups of up to 192 entries.
pub fn sibling_color(seed: u64, ordinal: usize) -> [u8; 3] {
    let idx = (ordinal as u32) % HUE_STEPS;
    let band = (ordinal / HUE_STEPS as usize) % LIGHTNESS_BANDS.len();
    // Rotate by a seed-derived offset; the shift is uniform across the
    // group, so within-group distinctness is unaffected.
    let rotation = (seed % 360) as f32;
    let hue = (bit_reverse6(idx) as f32 / HUE_STEPS as f32 * 360.0 + rotation) % 360.0;
    hsl_to_rgb(hue, SATURATION, LIGHTNESS_BANDS[band])
}

/// Generates a deterministic color from a string.
pub fn hash_color(s: &str) -> [u8; 3] {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    let hash = hasher.finish();

    let r = (hash & 0xFF) as u8;
    let g = ((hash >> 8) & 0xFF) as u8;
    let b = ((hash >> 16) & 0xFF) as u8;

    // Boost channels to avoid muddy colors
    [
        r.saturating_add(50),
        g.saturating_add(50),
        b.saturating_add(50),
    ]
}

/// Reverse the low 6 bits of `v`.
fn bit_reverse6(v: u32) -> u32 {
    let mut out = 0;
    for bit in 0..6 {
        out |= ((v >> bit) & 1) << (5 - bit);
    }
    out
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [
        ((r1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((b1 + m) * 255.0).round() as u8,
    ]
}
