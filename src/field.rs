//! Gradient field synthesis: 16 parametric patterns mapping pixel position to
//! a position along a multi-stop color ramp.

use rand::Rng;
use rand::seq::SliceRandom as _;

use crate::foundation::{
    core::{ImageRgb, Rgb8},
    error::{FondraError, FondraResult},
};

const SQRT_2: f32 = std::f32::consts::SQRT_2;
const TAU: f32 = std::f32::consts::TAU;

/// Wave patterns complete this many full periods across the canvas.
const WAVE_CYCLES: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Horizontal,
    Vertical,
    Diagonal,
    DiagonalReverse,
    Radial,
    RadialSquare,
    RadialEllipse,
    MultiRadial,
    Conic,
    Spiral,
    WaveHorizontal,
    WaveVertical,
    Cross,
    Triangle,
    Diamond,
    FourCorner,
}

impl Pattern {
    pub const ALL: [Pattern; 16] = [
        Pattern::Horizontal,
        Pattern::Vertical,
        Pattern::Diagonal,
        Pattern::DiagonalReverse,
        Pattern::Radial,
        Pattern::RadialSquare,
        Pattern::RadialEllipse,
        Pattern::MultiRadial,
        Pattern::Conic,
        Pattern::Spiral,
        Pattern::WaveHorizontal,
        Pattern::WaveVertical,
        Pattern::Cross,
        Pattern::Triangle,
        Pattern::Diamond,
        Pattern::FourCorner,
    ];

    /// Name lookup used by the CLI; unrecognized names fall back to the
    /// four-corner blend rather than failing the task.
    pub fn from_name(name: &str) -> Pattern {
        match name {
            "horizontal" => Pattern::Horizontal,
            "vertical" => Pattern::Vertical,
            "diagonal" => Pattern::Diagonal,
            "diagonal_reverse" => Pattern::DiagonalReverse,
            "radial" => Pattern::Radial,
            "radial_square" => Pattern::RadialSquare,
            "radial_ellipse" => Pattern::RadialEllipse,
            "multi_radial" => Pattern::MultiRadial,
            "conic" => Pattern::Conic,
            "spiral" => Pattern::Spiral,
            "wave_horizontal" => Pattern::WaveHorizontal,
            "wave_vertical" => Pattern::WaveVertical,
            "cross" => Pattern::Cross,
            "triangle" => Pattern::Triangle,
            "diamond" => Pattern::Diamond,
            _ => Pattern::FourCorner,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Pattern {
        *Self::ALL.choose(rng).unwrap_or(&Pattern::FourCorner)
    }
}

/// Linear blend from `colors[0]` to `colors[1]`; `t` in [0, 1]. Extra palette
/// entries only participate in the four-corner pattern.
fn ramp(colors: &[Rgb8], t: f32) -> Rgb8 {
    lerp(colors[0], colors[1], t.clamp(0.0, 1.0))
}

fn lerp(a: Rgb8, b: Rgb8, t: f32) -> Rgb8 {
    let mix = |x: u8, y: u8| (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8;
    Rgb8::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

/// Normalized axis positions in [0, 1]; a 1-wide axis collapses to 0.5.
fn axis(len: u32) -> Vec<f32> {
    if len <= 1 {
        return vec![0.5; len as usize];
    }
    let denom = (len - 1) as f32;
    (0..len).map(|i| i as f32 / denom).collect()
}

/// Renders the gradient field for `pattern` over a `width x height` canvas.
///
/// Requires at least two colors. Gradient and partition patterns blend or
/// split between `colors[0]` and `colors[1]`; only the four-corner blend
/// consumes four entries, cycling the palette when fewer are supplied.
#[tracing::instrument(skip(colors), fields(w = width, h = height))]
pub fn generate(
    width: u32,
    height: u32,
    colors: &[Rgb8],
    pattern: Pattern,
) -> FondraResult<ImageRgb> {
    if colors.len() < 2 {
        return Err(FondraError::config(
            "gradient field needs at least 2 colors",
        ));
    }
    let mut img = ImageRgb::new(width, height)?;
    let xs = axis(width);
    let ys = axis(height);

    match pattern {
        // Separable along x: build one row, replicate.
        Pattern::Horizontal => {
            fill_rows_from_row(&mut img, &xs, |xn| ramp(colors, xn));
        }
        Pattern::WaveHorizontal => {
            fill_rows_from_row(&mut img, &xs, |xn| {
                ramp(colors, (xn * TAU * WAVE_CYCLES).sin() * 0.5 + 0.5)
            });
        }
        // Constant along x: one color per row.
        Pattern::Vertical => {
            fill_rows_from_column(&mut img, &ys, |yn| ramp(colors, yn));
        }
        Pattern::WaveVertical => {
            fill_rows_from_column(&mut img, &ys, |yn| {
                ramp(colors, (yn * TAU * WAVE_CYCLES).sin() * 0.5 + 0.5)
            });
        }
        Pattern::Diagonal => {
            fill_grid(&mut img, &xs, &ys, |xn, yn| ramp(colors, (xn + yn) / 2.0));
        }
        Pattern::DiagonalReverse => {
            fill_grid(&mut img, &xs, &ys, |xn, yn| {
                ramp(colors, (xn - yn) / 2.0 + 0.5)
            });
        }
        Pattern::Radial => {
            fill_centered(&mut img, &xs, &ys, |cx, cy| {
                ramp(colors, (cx * cx + cy * cy).sqrt() / SQRT_2)
            });
        }
        Pattern::RadialSquare => {
            fill_centered(&mut img, &xs, &ys, |cx, cy| {
                ramp(colors, cx.abs().max(cy.abs()) / SQRT_2)
            });
        }
        Pattern::RadialEllipse => {
            fill_centered(&mut img, &xs, &ys, |cx, cy| {
                ramp(colors, (cx * cx + 2.0 * cy * cy).sqrt() / 3f32.sqrt())
            });
        }
        Pattern::MultiRadial => {
            fill_centered(&mut img, &xs, &ys, |cx, cy| {
                let d1 = ((cx + 0.5).powi(2) + (cy + 0.5).powi(2)).sqrt();
                let d2 = ((cx - 0.5).powi(2) + (cy - 0.5).powi(2)).sqrt();
                ramp(colors, d1.min(d2) / SQRT_2)
            });
        }
        Pattern::Conic => {
            fill_centered(&mut img, &xs, &ys, |cx, cy| {
                ramp(colors, (cy.atan2(cx) + std::f32::consts::PI) / TAU)
            });
        }
        Pattern::Spiral => {
            fill_centered(&mut img, &xs, &ys, |cx, cy| {
                let angle = (cy.atan2(cx) + std::f32::consts::PI) / TAU;
                let r = (cx * cx + cy * cy).sqrt() / SQRT_2;
                ramp(colors, (angle + r).fract())
            });
        }
        Pattern::Diamond => {
            fill_centered(&mut img, &xs, &ys, |cx, cy| {
                ramp(colors, (cx.abs() + cy.abs()) / 2.0)
            });
        }
        Pattern::Cross => {
            let (c0, c1) = (colors[0], colors[1]);
            fill_grid(&mut img, &xs, &ys, |xn, yn| {
                if (xn - 0.5).abs() < 0.25 || (yn - 0.5).abs() < 0.25 {
                    c0
                } else {
                    c1
                }
            });
        }
        Pattern::Triangle => {
            let (c0, c1) = (colors[0], colors[1]);
            fill_grid(&mut img, &xs, &ys, |xn, yn| {
                if xn + yn <= 1.0 && xn - yn >= 0.0 { c0 } else { c1 }
            });
        }
        Pattern::FourCorner => {
            let corner = |i: usize| colors[i % colors.len()];
            let (tl, tr, bl, br) = (corner(0), corner(1), corner(2), corner(3));
            // Per-column top/bottom rows precomputed, rows blend between them.
            let top: Vec<Rgb8> = xs.iter().map(|&xn| lerp(tl, tr, xn)).collect();
            let bottom: Vec<Rgb8> = xs.iter().map(|&xn| lerp(bl, br, xn)).collect();
            for (y, &yn) in ys.iter().enumerate() {
                for x in 0..width as usize {
                    img.put_pixel(x as u32, y as u32, lerp(top[x], bottom[x], yn));
                }
            }
        }
    }
    Ok(img)
}

fn fill_rows_from_row(img: &mut ImageRgb, xs: &[f32], f: impl Fn(f32) -> Rgb8) {
    let mut row = Vec::with_capacity(xs.len() * 3);
    for &xn in xs {
        row.extend_from_slice(&f(xn).channels());
    }
    for chunk in img.data.chunks_exact_mut(row.len()) {
        chunk.copy_from_slice(&row);
    }
}

fn fill_rows_from_column(img: &mut ImageRgb, ys: &[f32], f: impl Fn(f32) -> Rgb8) {
    let row_len = img.width as usize * 3;
    for (y, &yn) in ys.iter().enumerate() {
        let c = f(yn).channels();
        for px in img.data[y * row_len..(y + 1) * row_len].chunks_exact_mut(3) {
            px.copy_from_slice(&c);
        }
    }
}

fn fill_grid(img: &mut ImageRgb, xs: &[f32], ys: &[f32], f: impl Fn(f32, f32) -> Rgb8) {
    for (y, &yn) in ys.iter().enumerate() {
        for (x, &xn) in xs.iter().enumerate() {
            img.put_pixel(x as u32, y as u32, f(xn, yn));
        }
    }
}

/// Like [`fill_grid`] but with coordinates recentered to [-1, 1].
fn fill_centered(img: &mut ImageRgb, xs: &[f32], ys: &[f32], f: impl Fn(f32, f32) -> Rgb8) {
    for (y, &yn) in ys.iter().enumerate() {
        let cy = yn * 2.0 - 1.0;
        for (x, &xn) in xs.iter().enumerate() {
            img.put_pixel(x as u32, y as u32, f(xn * 2.0 - 1.0, cy));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two() -> Vec<Rgb8> {
        vec![Rgb8::new(0, 0, 0), Rgb8::new(255, 255, 255)]
    }

    fn four() -> Vec<Rgb8> {
        vec![
            Rgb8::new(255, 0, 0),
            Rgb8::new(0, 255, 0),
            Rgb8::new(0, 0, 255),
            Rgb8::new(255, 255, 0),
        ]
    }

    #[test]
    fn ramp_blends_only_the_first_two_colors() {
        let colors = four();
        assert_eq!(ramp(&colors, 0.0), colors[0]);
        assert_eq!(ramp(&colors, 1.0), colors[1]);
        assert_eq!(ramp(&colors, -5.0), colors[0]);
        assert_eq!(ramp(&colors, 5.0), colors[1]);
    }

    #[test]
    fn horizontal_with_four_colors_ends_at_the_second() {
        let colors = four();
        let img = generate(16, 1, &colors, Pattern::Horizontal).unwrap();
        assert_eq!(img.pixel(0, 0), colors[0]);
        assert_eq!(img.pixel(15, 0), colors[1]);
    }

    #[test]
    fn too_few_colors_is_config_error() {
        let one = vec![Rgb8::new(1, 2, 3)];
        assert!(generate(8, 8, &one, Pattern::Horizontal).is_err());
    }

    #[test]
    fn horizontal_varies_only_along_x() {
        let img = generate(16, 8, &two(), Pattern::Horizontal).unwrap();
        for y in 1..8 {
            for x in 0..16 {
                assert_eq!(img.pixel(x, y), img.pixel(x, 0));
            }
        }
        assert_eq!(img.pixel(0, 0), Rgb8::new(0, 0, 0));
        assert_eq!(img.pixel(15, 0), Rgb8::new(255, 255, 255));
    }

    #[test]
    fn vertical_varies_only_along_y() {
        let img = generate(8, 16, &two(), Pattern::Vertical).unwrap();
        for y in 0..16 {
            for x in 1..8 {
                assert_eq!(img.pixel(x, y), img.pixel(0, y));
            }
        }
        assert_eq!(img.pixel(0, 0), Rgb8::new(0, 0, 0));
        assert_eq!(img.pixel(0, 15), Rgb8::new(255, 255, 255));
    }

    #[test]
    fn radial_is_darkest_at_center() {
        let img = generate(33, 33, &two(), Pattern::Radial).unwrap();
        let center = img.pixel(16, 16);
        let corner = img.pixel(0, 0);
        assert!(center.r < corner.r);
        assert_eq!(center, Rgb8::new(0, 0, 0));
    }

    #[test]
    fn four_corner_matches_palette_corners() {
        let colors = four();
        let img = generate(17, 17, &colors, Pattern::FourCorner).unwrap();
        assert_eq!(img.pixel(0, 0), colors[0]);
        assert_eq!(img.pixel(16, 0), colors[1]);
        assert_eq!(img.pixel(0, 16), colors[2]);
        assert_eq!(img.pixel(16, 16), colors[3]);
    }

    #[test]
    fn cross_partitions_into_two_colors() {
        let colors = four();
        let img = generate(32, 32, &colors, Pattern::Cross).unwrap();
        for y in 0..32 {
            for x in 0..32 {
                let p = img.pixel(x, y);
                assert!(p == colors[0] || p == colors[1]);
            }
        }
        // Center sits inside both bands, corners outside.
        assert_eq!(img.pixel(16, 16), colors[0]);
        assert_eq!(img.pixel(0, 0), colors[1]);
    }

    #[test]
    fn four_identical_corners_give_a_constant_buffer() {
        let c = Rgb8::new(200, 180, 160);
        let colors = vec![c; 4];
        let img = generate(12, 9, &colors, Pattern::FourCorner).unwrap();
        for y in 0..9 {
            for x in 0..12 {
                assert_eq!(img.pixel(x, y), c);
            }
        }
    }

    #[test]
    fn unknown_name_falls_back_to_four_corner() {
        assert_eq!(Pattern::from_name("no_such_pattern"), Pattern::FourCorner);
        assert_eq!(Pattern::from_name("spiral"), Pattern::Spiral);
    }

    #[test]
    fn every_pattern_renders_on_tiny_canvases() {
        let colors = four();
        for pattern in Pattern::ALL {
            for (w, h) in [(1, 1), (1, 7), (7, 1), (5, 4)] {
                let img = generate(w, h, &colors, pattern).unwrap();
                assert_eq!(img.data.len(), (w * h * 3) as usize, "{pattern:?}");
            }
        }
    }
}
