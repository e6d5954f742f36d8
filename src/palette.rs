//! Color sourcing: the curated soft-color pool, scheme presets, and the
//! random pastel generators the overlay effects draw from.

use std::sync::OnceLock;

use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::{
    config::{AlphaRange, ColorScheme},
    foundation::{
        core::{Rgb8, Rgba8},
        error::{FondraError, FondraResult},
    },
};

/// Curated warm-neutral base colors the pastel pool starts from.
pub const BASE_COLORS: [Rgb8; 20] = [
    Rgb8::new(245, 222, 179),
    Rgb8::new(255, 228, 196),
    Rgb8::new(240, 248, 255),
    Rgb8::new(255, 250, 240),
    Rgb8::new(253, 245, 230),
    Rgb8::new(250, 235, 215),
    Rgb8::new(255, 239, 213),
    Rgb8::new(255, 228, 225),
    Rgb8::new(255, 240, 245),
    Rgb8::new(248, 248, 255),
    Rgb8::new(240, 255, 255),
    Rgb8::new(255, 182, 193),
    Rgb8::new(173, 216, 230),
    Rgb8::new(144, 238, 144),
    Rgb8::new(255, 218, 185),
    Rgb8::new(230, 230, 250),
    Rgb8::new(255, 255, 224),
    Rgb8::new(255, 228, 181),
    Rgb8::new(240, 255, 240),
    Rgb8::new(255, 245, 238),
];

const VIBRANT: [Rgb8; 6] = [
    Rgb8::new(255, 99, 132),
    Rgb8::new(54, 162, 235),
    Rgb8::new(255, 205, 86),
    Rgb8::new(75, 192, 192),
    Rgb8::new(153, 102, 255),
    Rgb8::new(255, 159, 64),
];

const OCEAN: [Rgb8; 6] = [
    Rgb8::new(0, 119, 190),
    Rgb8::new(0, 180, 216),
    Rgb8::new(144, 224, 239),
    Rgb8::new(173, 232, 244),
    Rgb8::new(202, 240, 248),
    Rgb8::new(233, 247, 251),
];

const SUNSET: [Rgb8; 6] = [
    Rgb8::new(255, 94, 77),
    Rgb8::new(255, 154, 0),
    Rgb8::new(255, 206, 84),
    Rgb8::new(255, 238, 173),
    Rgb8::new(129, 212, 250),
    Rgb8::new(224, 247, 250),
];

const FOREST: [Rgb8; 6] = [
    Rgb8::new(46, 125, 50),
    Rgb8::new(76, 175, 80),
    Rgb8::new(129, 199, 132),
    Rgb8::new(165, 214, 167),
    Rgb8::new(200, 230, 201),
    Rgb8::new(232, 245, 233),
];

const MONOCHROME: [Rgb8; 6] = [
    Rgb8::new(33, 33, 33),
    Rgb8::new(97, 97, 97),
    Rgb8::new(158, 158, 158),
    Rgb8::new(189, 189, 189),
    Rgb8::new(224, 224, 224),
    Rgb8::new(245, 245, 245),
];

/// Number of random soft colors appended to [`BASE_COLORS`] when a pool is
/// built (base count times two).
const RANDOM_SOFT_COUNT: usize = BASE_COLORS.len() * 2;

/// The curated base colors plus a batch of generated soft colors, built once
/// and shared by every pipeline in the process.
#[derive(Clone, Debug)]
pub struct ColorPool {
    colors: Vec<Rgb8>,
}

static GLOBAL_POOL: OnceLock<ColorPool> = OnceLock::new();

impl ColorPool {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut colors = BASE_COLORS.to_vec();
        colors.extend((0..RANDOM_SOFT_COUNT).map(|_| soft_color(rng)));
        Self { colors }
    }

    /// Process-wide pool, generated from ambient entropy on first use.
    pub fn global() -> &'static ColorPool {
        GLOBAL_POOL.get_or_init(|| ColorPool::new(&mut rand::thread_rng()))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb8] {
        &self.colors
    }

    /// `n` distinct colors sampled without replacement.
    pub fn pick(&self, n: usize, rng: &mut impl Rng) -> FondraResult<Vec<Rgb8>> {
        if n > self.colors.len() {
            return Err(FondraError::PaletteExhausted {
                requested: n,
                available: self.colors.len(),
            });
        }
        Ok(self
            .colors
            .choose_multiple(rng, n)
            .copied()
            .collect())
    }
}

/// Random color with every channel in the soft band [180, 255] and channel
/// spread at most 60.
///
/// If the first draw spreads wider than 60, all three channels are redrawn
/// uniformly from the band within 30 of the original mean. A single pass,
/// no retries.
pub fn soft_color(rng: &mut impl Rng) -> Rgb8 {
    let mut ch = [0i32; 3];
    for c in &mut ch {
        *c = rng.gen_range(180..=255);
    }
    let max = ch.iter().copied().max().unwrap_or(0);
    let min = ch.iter().copied().min().unwrap_or(0);
    if max - min > 60 {
        let mean = (ch[0] + ch[1] + ch[2]) / 3;
        let lo = (mean - 30).max(180);
        let hi = (mean + 30).min(255);
        for c in &mut ch {
            *c = rng.gen_range(lo..hi);
        }
    }
    Rgb8::new(ch[0] as u8, ch[1] as u8, ch[2] as u8)
}

/// Random mid-to-bright RGBA for decorative elements; channels in [100, 255],
/// alpha drawn from the caller's band.
pub fn random_rgba(alpha: AlphaRange, rng: &mut impl Rng) -> Rgba8 {
    Rgba8::new(
        rng.gen_range(100..=255),
        rng.gen_range(100..=255),
        rng.gen_range(100..=255),
        alpha.sample(rng),
    )
}

/// HSL to RGB, all inputs in [0, 1].
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb8 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h.rem_euclid(1.0)) * 6.0;
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
    let to_u8 = |v: f32| ((v + m) * 255.0).clamp(0.0, 255.0) as u8;
    Rgb8::new(to_u8(r1), to_u8(g1), to_u8(b1))
}

/// Six analogous colors stepping 30 degrees of hue from a random base, with
/// jittered pastel saturation and lightness.
pub fn analogous(base_hue: f32, rng: &mut impl Rng) -> Vec<Rgb8> {
    (0..6)
        .map(|i| {
            let hue = (base_hue + i as f32 * 30.0 / 360.0).rem_euclid(1.0);
            let saturation = 0.3 + rng.gen_range(0.0..1.0f32) * 0.4;
            let lightness = 0.7 + rng.gen_range(0.0..1.0f32) * 0.2;
            hsl_to_rgb(hue, saturation, lightness)
        })
        .collect()
}

/// Four gradient colors for one image, per the configured scheme.
pub fn palette_for(
    scheme: ColorScheme,
    pool: &ColorPool,
    rng: &mut impl Rng,
) -> FondraResult<Vec<Rgb8>> {
    let preset: &[Rgb8] = match scheme {
        ColorScheme::Pastel => return pool.pick(4, rng),
        ColorScheme::Analogous => {
            let colors = analogous(rng.gen_range(0.0..1.0), rng);
            return Ok(colors.into_iter().take(4).collect());
        }
        ColorScheme::Vibrant => &VIBRANT,
        ColorScheme::Ocean => &OCEAN,
        ColorScheme::Sunset => &SUNSET,
        ColorScheme::Forest => &FOREST,
        ColorScheme::Monochrome => &MONOCHROME,
    };
    Ok(preset.choose_multiple(rng, 4).copied().collect())
}
