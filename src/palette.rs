use std::collections::VecDeque;

use rand::{seq::SliceRandom, Rng};

use crate::color::{Cell, Color};

/// The fixed swatch palette the picker starts with.
#[rustfmt::skip]
pub const DEFAULT_PALETTE: [Color; 36] = [
    Color::from_rgb24(0xDB2500), Color::from_rgb24(0xFF5106), Color::from_rgb24(0xFF8C6E),
    Color::from_rgb24(0xFF0C00), Color::from_rgb24(0xFFEE00), Color::from_rgb24(0xDDBC9D),
    Color::from_rgb24(0x35728A), Color::from_rgb24(0x582627), Color::from_rgb24(0xEA8746),
    Color::from_rgb24(0x2EEDEC), Color::from_rgb24(0x7B549A), Color::from_rgb24(0x7B9A54),
    Color::from_rgb24(0x281EFF), Color::from_rgb24(0x4998E9), Color::from_rgb24(0x7B7AFF),
    Color::from_rgb24(0xC9AEC7), Color::from_rgb24(0x9550F0), Color::from_rgb24(0x10702E),
    Color::from_rgb24(0x140079), Color::from_rgb24(0x600080), Color::from_rgb24(0x3001E2),
    Color::from_rgb24(0xA035FF), Color::from_rgb24(0x0B1675), Color::from_rgb24(0x382681),
    Color::from_rgb24(0x51FF06), Color::from_rgb24(0x8CFF6E), Color::from_rgb24(0x0CFF00),
    Color::from_rgb24(0xEEFF00), Color::from_rgb24(0x358A72), Color::from_rgb24(0x631A09),
    Color::from_rgb24(0x000000), Color::from_rgb24(0x444444), Color::from_rgb24(0x888888),
    Color::from_rgb24(0xBBBBBB), Color::from_rgb24(0xDDDDDD), Color::from_rgb24(0xFFFFFF),
];

pub const HISTORY_CAP: usize = 10;

/// Recently-picked paint values, newest first.
///
/// A value already anywhere in the history is not re-added and keeps its
/// position; once the cap is reached the oldest entry falls off the back.
#[derive(Clone, Debug, Default)]
pub struct ColorHistory {
    entries: VecDeque<Cell>,
}

impl ColorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pick. Returns whether the value was actually added.
    pub fn push(&mut self, paint: Cell) -> bool {
        if self.entries.contains(&paint) {
            return false;
        }
        if self.entries.len() >= HISTORY_CAP {
            self.entries.pop_back();
        }
        self.entries.push_front(paint);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generate `size` visually-spread swatches: small requests shuffle the
/// default palette, larger ones space hues around the HSL wheel at two
/// saturations, dedup, and shuffle.
pub fn generate_palette(size: usize, rng: &mut impl Rng) -> Vec<Color> {
    if size == 0 {
        return Vec::new();
    }
    if size <= DEFAULT_PALETTE.len() {
        let mut res = DEFAULT_PALETTE[..size].to_vec();
        res.shuffle(rng);
        return res;
    }
    let mut colors = Vec::with_capacity(size * 2);
    let h_step = 360.0 / ((size + 1) as f32);
    for i in 0..size {
        for s_val in (3..=9).step_by(6) {
            colors.push(hsl_to_rgb(h_step * (i as f32), (s_val as f32) / 10.0, 0.5));
        }
    }
    colors.sort_unstable_by_key(|color| color.rgb24());
    colors.dedup();
    colors.shuffle(rng);

    if colors.len() < size {
        // hue spacing collapsed too many duplicates; enumerate a lattice
        colors = Vec::with_capacity(12 * 12 * 12);
        for r in (64..256).step_by(16) {
            for g in (64..256).step_by(16) {
                for b in (64..256).step_by(16) {
                    colors.push(Color::rgb(r as u8, g as u8, b as u8));
                }
            }
        }
        colors.shuffle(rng);
    }
    colors.truncate(size);
    assert_eq!(size, colors.len(), "could not create enough colors");
    colors
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    // https://en.wikipedia.org/wiki/HSL_and_HSV#HSL_to_RGB
    let h = h.clamp(0.0, 360.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h_prime = h / 60.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match h_prime {
        0.0..=1.001 => (c, x, 0.0),
        1.0..=2.001 => (x, c, 0.0),
        2.0..=3.001 => (0.0, c, x),
        3.0..=4.001 => (0.0, x, c),
        4.0..=5.001 => (x, 0.0, c),
        5.0..=6.001 => (c, 0.0, x),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let (r, g, b) = (r1 + m, g1 + m, b1 + m);
    Color::rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}
