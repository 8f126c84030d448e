//! Per-atom coloring.
//!
//! Every scheme maps an atom of a structure to an RGB triple. `Uniform`
//! ignores the atom and uses the representation's `color` parameter.

use glam::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::data::Structure;

/// How atoms are colored.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// CPK-like element colors.
    #[default]
    Element,
    /// One color per chain name.
    Chainname,
    /// Rainbow along the residue number range.
    Residueindex,
    /// The `color` parameter for everything.
    Uniform,
}

impl ColorScheme {
    /// Serialized names.
    pub const ALL: [&'static str; 4] = ["element", "chainname", "residueindex", "uniform"];
}

/// A color ramp defined by N evenly-spaced color stops.
#[derive(Debug, Clone)]
pub struct ColorRamp {
    stops: Vec<[f32; 3]>,
}

impl ColorRamp {
    /// Ramp through the given stops. Needs at least two.
    #[must_use]
    pub fn new(stops: Vec<[f32; 3]>) -> Self {
        Self { stops }
    }

    /// Interpolate the ramp at position `t` in [0, 1].
    #[must_use]
    pub fn sample(&self, t: f32) -> [f32; 3] {
        let t = t.clamp(0.0, 1.0);
        let n = self.stops.len().saturating_sub(1).max(1);
        let scaled = t * n as f32;
        let idx = (scaled as usize).min(n - 1);
        let frac = scaled - idx as f32;
        let a = self.stops[idx];
        let b = self.stops.get(idx + 1).copied().unwrap_or(a);
        [
            a[0] + (b[0] - a[0]) * frac,
            a[1] + (b[1] - a[1]) * frac,
            a[2] + (b[2] - a[2]) * frac,
        ]
    }
}

impl Default for ColorRamp {
    /// Red → Yellow → Blue
    fn default() -> Self {
        Self {
            stops: vec![
                [0.84, 0.19, 0.15],
                [1.0, 1.0, 0.75],
                [0.27, 0.46, 0.71],
            ],
        }
    }
}

const CHAIN_PALETTE: [[f32; 3]; 8] = [
    [0.55, 0.83, 0.78],
    [1.0, 1.0, 0.7],
    [0.75, 0.73, 0.85],
    [0.98, 0.5, 0.45],
    [0.5, 0.69, 0.83],
    [0.99, 0.71, 0.38],
    [0.7, 0.87, 0.41],
    [0.99, 0.8, 0.9],
];

fn element_color(element: &str) -> [f32; 3] {
    match element.to_ascii_uppercase().as_str() {
        "H" => [1.0, 1.0, 1.0],
        "C" => [0.56, 0.56, 0.56],
        "N" => [0.19, 0.31, 0.97],
        "O" => [1.0, 0.05, 0.05],
        "S" => [1.0, 1.0, 0.19],
        "P" => [1.0, 0.5, 0.0],
        _ => [1.0, 0.08, 0.58],
    }
}

fn chain_color(chain: &str) -> [f32; 3] {
    let hash = chain
        .bytes()
        .fold(0_usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
    CHAIN_PALETTE[hash % CHAIN_PALETTE.len()]
}

/// Colors atoms of one structure with one scheme.
#[derive(Debug, Clone)]
pub struct Colormaker {
    scheme: ColorScheme,
    uniform: [f32; 3],
    ramp: ColorRamp,
    resno_range: (i32, i32),
}

impl Colormaker {
    /// Colormaker for `structure`.
    #[must_use]
    pub fn new(scheme: ColorScheme, uniform: [f32; 3], structure: &Structure) -> Self {
        let resno_range = (0..structure.atom_count())
            .map(|i| structure.resno(i))
            .fold(None, |acc: Option<(i32, i32)>, r| match acc {
                None => Some((r, r)),
                Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
            })
            .unwrap_or((0, 0));
        Self {
            scheme,
            uniform,
            ramp: ColorRamp::default(),
            resno_range,
        }
    }

    /// Color of atom `index`.
    #[must_use]
    pub fn atom_color(&self, structure: &Structure, index: usize) -> [f32; 3] {
        match self.scheme {
            ColorScheme::Element => element_color(structure.element(index)),
            ColorScheme::Chainname => chain_color(structure.chain(index)),
            ColorScheme::Residueindex => {
                let (lo, hi) = self.resno_range;
                let span = (hi - lo).max(1) as f32;
                self.ramp.sample((structure.resno(index) - lo) as f32 / span)
            }
            ColorScheme::Uniform => self.uniform,
        }
    }

    /// Flat `[r, g, b, ...]` colors for `atoms`.
    #[must_use]
    pub fn atom_colors(&self, structure: &Structure, atoms: &[usize]) -> Vec<f32> {
        atoms
            .iter()
            .flat_map(|&i| self.atom_color(structure, i))
            .collect()
    }
}

/// Repeat one color `count` times as a flat array.
#[must_use]
pub fn uniform_colors(color: [f32; 3], count: usize) -> Vec<f32> {
    color.repeat(count)
}

/// Convert a `0xRRGGBB` literal to RGB floats.
#[must_use]
pub fn hex(rgb: u32) -> [f32; 3] {
    let c = Vec3::new(
        ((rgb >> 16) & 0xff) as f32,
        ((rgb >> 8) & 0xff) as f32,
        (rgb & 0xff) as f32,
    ) / 255.0;
    c.to_array()
}
