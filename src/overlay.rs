//! Decorative overlay stage: raster primitives on a transparent RGBA layer,
//! the element painters (bubbles, curves, particles, shapes, watermarks,
//! grid), alpha compositing onto the gradient field, and the three
//! whole-image treatments (lighting, depth blur, color overlay).

use kurbo::Point;
use rand::Rng;

use crate::{
    config::AlphaRange,
    curves::{self, CurveKind, Harmonic},
    foundation::{
        core::{ImageRgb, OverlayLayer, Rgb8, Rgba8},
        error::FondraResult,
    },
    palette,
    post,
};

/// `a..b` draw that tolerates empty or inverted ranges.
fn range_f64(rng: &mut impl Rng, lo: f64, hi: f64) -> f64 {
    if hi <= lo { lo } else { rng.gen_range(lo..hi) }
}

fn range_i64(rng: &mut impl Rng, lo: i64, hi: i64) -> i64 {
    if hi <= lo { lo } else { rng.gen_range(lo..hi) }
}

/// Accumulates decorative elements on one transparent layer. Primitives use
/// plain pixel replacement on the layer (last write wins); translucency only
/// enters when the finished layer is merged over the base image.
pub struct OverlayCompositor {
    layer: OverlayLayer,
}

impl OverlayCompositor {
    pub fn new(width: u32, height: u32) -> FondraResult<Self> {
        Ok(Self {
            layer: OverlayLayer::new(width, height)?,
        })
    }

    fn width(&self) -> i64 {
        i64::from(self.layer.width)
    }

    fn height(&self) -> i64 {
        i64::from(self.layer.height)
    }

    // --- raster primitives ---------------------------------------------

    fn fill_circle(&mut self, cx: i64, cy: i64, radius: i64, color: Rgba8) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.layer.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn outline_circle(&mut self, cx: i64, cy: i64, radius: i64, color: Rgba8) {
        let (outer, inner) = (radius * radius, (radius - 1).max(0) * (radius - 1).max(0));
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = dx * dx + dy * dy;
                if d2 <= outer && d2 > inner {
                    self.layer.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgba8) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.layer.put(x, y, color);
            }
        }
    }

    /// Even-odd scanline fill.
    fn fill_polygon(&mut self, verts: &[Point], color: Rgba8) {
        if verts.len() < 3 {
            return;
        }
        let y_min = verts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let y_max = verts.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let y_lo = (y_min.floor() as i64).max(0);
        let y_hi = (y_max.ceil() as i64).min(self.height() - 1);

        for y in y_lo..=y_hi {
            let scan = y as f64 + 0.5;
            let mut xs: Vec<f64> = Vec::new();
            for i in 0..verts.len() {
                let (a, b) = (verts[i], verts[(i + 1) % verts.len()]);
                if (a.y <= scan && b.y > scan) || (b.y <= scan && a.y > scan) {
                    xs.push(a.x + (scan - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            xs.sort_by(|p, q| p.partial_cmp(q).unwrap_or(std::cmp::Ordering::Equal));
            for pair in xs.chunks_exact(2) {
                let x0 = pair[0].round() as i64;
                let x1 = pair[1].round() as i64;
                for x in x0..=x1 {
                    self.layer.put(x, y, color);
                }
            }
        }
    }

    fn stroke_segment(&mut self, a: Point, b: Point, width: f64, color: Rgba8) {
        let half = width / 2.0;
        let pad = half.ceil() as i64 + 1;
        let x_lo = (a.x.min(b.x).floor() as i64 - pad).max(0);
        let x_hi = (a.x.max(b.x).ceil() as i64 + pad).min(self.width() - 1);
        let y_lo = (a.y.min(b.y).floor() as i64 - pad).max(0);
        let y_hi = (a.y.max(b.y).ceil() as i64 + pad).min(self.height() - 1);

        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len2 = dx * dx + dy * dy;
        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                let (px, py) = (x as f64 - a.x, y as f64 - a.y);
                let t = if len2 > 0.0 {
                    ((px * dx + py * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (ex, ey) = (px - t * dx, py - t * dy);
                if ex * ex + ey * ey <= half * half {
                    self.layer.put(x, y, color);
                }
            }
        }
    }

    /// Polyline stroke; a segment is skipped when either endpoint falls off
    /// the canvas, which is what keeps runaway curve tails from smearing a
    /// clipped line across the border.
    fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Rgba8) {
        for pair in points.windows(2) {
            if self.layer.contains(pair[0]) && self.layer.contains(pair[1]) {
                self.stroke_segment(pair[0], pair[1], width, color);
            }
        }
    }

    // --- element painters ------------------------------------------------

    /// Translucent circles; half of them get a small near-white highlight
    /// offset toward the upper left.
    pub fn add_bubbles(&mut self, count: u32, alpha: AlphaRange, rng: &mut impl Rng) {
        for _ in 0..count {
            let x = range_i64(rng, 0, self.width());
            let y = range_i64(rng, 0, self.height());
            let radius = rng.gen_range(10..=50i64);
            let color = palette::random_rgba(alpha, rng);
            self.fill_circle(x, y, radius, color);

            if rng.gen_bool(0.5) {
                let hl = Rgba8::new(250, 250, 250, color.a.saturating_add(20));
                self.fill_circle(x - radius / 4, y - radius / 4, (radius / 4).max(1), hl);
            }
        }
    }

    /// Small scattered marks in four styles.
    pub fn add_particles(&mut self, count: u32, alpha: AlphaRange, rng: &mut impl Rng) {
        for _ in 0..count {
            let x = range_i64(rng, 0, self.width());
            let y = range_i64(rng, 0, self.height());
            let size = rng.gen_range(1..=4i64);
            let color = palette::random_rgba(alpha, rng);
            match rng.gen_range(0..4u8) {
                0 => self.fill_circle(x, y, size, color),
                1 => {
                    // four-pointed star
                    for d in -size..=size {
                        self.layer.put(x + d, y, color);
                        self.layer.put(x, y + d, color);
                    }
                    let diag = (size + 1) / 2;
                    for d in -diag..=diag {
                        self.layer.put(x + d, y + d, color);
                        self.layer.put(x + d, y - d, color);
                    }
                }
                2 => {
                    for d in -size..=size {
                        self.layer.put(x + d, y, color);
                        self.layer.put(x, y + d, color);
                    }
                }
                _ => self.outline_circle(x, y, size + 1, color),
            }
        }
    }

    /// Strokes `count` random curves, each from a family in `kinds`.
    pub fn add_curves(
        &mut self,
        count: u32,
        kinds: &[CurveKind],
        alpha: AlphaRange,
        rng: &mut impl Rng,
    ) {
        let (w, h) = (self.width() as f64, self.height() as f64);
        for _ in 0..count {
            let kind = CurveKind::random(kinds, rng);
            let points = sample_curve(kind, w, h, rng);
            let color = palette::random_rgba(alpha, rng);
            let width = rng.gen_range(1..=3) as f64;
            self.stroke_polyline(&points, width, color);
        }
    }

    /// Abstract blobs, organic clusters and soft rectangles.
    pub fn add_shapes(&mut self, count: u32, alpha: AlphaRange, rng: &mut impl Rng) {
        for _ in 0..count {
            let x = range_i64(rng, 0, self.width());
            let y = range_i64(rng, 0, self.height());
            let size = rng.gen_range(15..=50i64);
            let a = alpha.sample(rng);
            let base = palette::hsl_to_rgb(
                rng.gen_range(0.0..1.0),
                0.3 + rng.gen_range(0.0..1.0f32) * 0.4,
                0.7 + rng.gen_range(0.0..1.0f32) * 0.2,
            );
            let color = Rgba8::new(base.r, base.g, base.b, a);

            match rng.gen_range(0..3u8) {
                0 => {
                    // irregular blob: jittered radius around a ring of vertices
                    let n = rng.gen_range(6..=12usize);
                    let verts: Vec<Point> = (0..n)
                        .map(|i| {
                            let angle = std::f64::consts::TAU * i as f64 / n as f64;
                            let r = size as f64 * (0.7 + rng.gen_range(0.0..1.0) * 0.6);
                            Point::new(x as f64 + r * angle.cos(), y as f64 + r * angle.sin())
                        })
                        .collect();
                    self.fill_polygon(&verts, color);
                }
                1 => {
                    // organic cluster of three overlapping discs
                    for _ in 0..3 {
                        let ox = range_i64(rng, -size / 2, size / 2 + 1);
                        let oy = range_i64(rng, -size / 2, size / 2 + 1);
                        self.fill_circle(x + ox, y + oy, size / 2, color);
                    }
                }
                _ => {
                    let half = size / 2;
                    self.fill_rect(x - half, y - half, x + half, y + half, color);
                }
            }
        }
    }

    /// Faint white texture marks: short lines, crosses, diamond outlines.
    pub fn add_watermarks(&mut self, count: u32, opacity: u8, rng: &mut impl Rng) {
        let color = Rgba8::new(255, 255, 255, opacity);
        for _ in 0..count {
            let x = range_i64(rng, 0, self.width()) as f64;
            let y = range_i64(rng, 0, self.height()) as f64;
            let size = rng.gen_range(20..=60i64) as f64;
            match rng.gen_range(0..3u8) {
                0 => {
                    let angle = range_f64(rng, 0.0, std::f64::consts::TAU);
                    let end = Point::new(x + size * angle.cos(), y + size * angle.sin());
                    self.stroke_segment(Point::new(x, y), end, 1.0, color);
                }
                1 => {
                    let half = size / 2.0;
                    self.stroke_segment(
                        Point::new(x - half, y),
                        Point::new(x + half, y),
                        1.0,
                        color,
                    );
                    self.stroke_segment(
                        Point::new(x, y - half),
                        Point::new(x, y + half),
                        1.0,
                        color,
                    );
                }
                _ => {
                    let half = size / 2.0;
                    let verts = [
                        Point::new(x, y - half),
                        Point::new(x + half, y),
                        Point::new(x, y + half),
                        Point::new(x - half, y),
                    ];
                    for i in 0..4 {
                        self.stroke_segment(verts[i], verts[(i + 1) % 4], 1.0, color);
                    }
                }
            }
        }
    }

    /// Sparse grid of translucent pastel cells; each cell is drawn with
    /// probability 0.7.
    pub fn add_grid(&mut self, cell: u32, opacity: u8, rng: &mut impl Rng) {
        let cell = i64::from(cell.max(1));
        let mut y = 0;
        while y < self.height() {
            let mut x = 0;
            while x < self.width() {
                if rng.gen_range(0.0..1.0f32) <= 0.7 {
                    let c = palette::hsl_to_rgb(
                        rng.gen_range(0.0..1.0),
                        0.2 + rng.gen_range(0.0..1.0f32) * 0.3,
                        0.8 + rng.gen_range(0.0..1.0f32) * 0.15,
                    );
                    self.fill_rect(
                        x,
                        y,
                        x + cell - 1,
                        y + cell - 1,
                        Rgba8::new(c.r, c.g, c.b, opacity),
                    );
                }
                x += cell;
            }
            y += cell;
        }
    }

    /// Merges the layer over `base` with straight-alpha "over" blending and
    /// consumes the compositor.
    pub fn composite_over(self, base: &mut ImageRgb) {
        debug_assert_eq!(base.width, self.layer.width);
        debug_assert_eq!(base.height, self.layer.height);
        for (dst, src) in base
            .data
            .chunks_exact_mut(3)
            .zip(self.layer.data.chunks_exact(4))
        {
            let a = u16::from(src[3]);
            if a == 0 {
                continue;
            }
            for c in 0..3 {
                let over = u16::from(src[c]) * a + u16::from(dst[c]) * (255 - a);
                dst[c] = ((over + 127) / 255) as u8;
            }
        }
    }
}

/// Randomized parameters for one curve of the given family, sized to a
/// `w x h` canvas.
fn sample_curve(kind: CurveKind, w: f64, h: f64, rng: &mut impl Rng) -> Vec<Point> {
    let center = Point::new(
        range_f64(rng, w * 0.2, w * 0.8),
        range_f64(rng, h * 0.2, h * 0.8),
    );
    match kind {
        CurveKind::Bezier => {
            let p0 = Point::new(range_f64(rng, 0.0, w), range_f64(rng, 0.0, h));
            let p1 = Point::new(range_f64(rng, 0.0, w), range_f64(rng, 0.0, h));
            let p2 = Point::new(range_f64(rng, 0.0, w), range_f64(rng, 0.0, h));
            let p3 = Point::new(range_f64(rng, 0.0, w), range_f64(rng, 0.0, h));
            curves::cubic_bezier(p0, p1, p2, p3, 50)
        }
        CurveKind::Sine => {
            let start = Point::new(range_f64(rng, 0.0, w / 2.0), range_f64(rng, 0.0, h));
            curves::sine_wave(
                start,
                range_f64(rng, 100.0, 400.0),
                range_f64(rng, 20.0, 80.0),
                range_f64(rng, 1.0, 4.0),
                100,
            )
        }
        CurveKind::Spiral => curves::spiral(
            center,
            range_f64(rng, 50.0, 150.0),
            range_f64(rng, 2.0, 5.0),
            100,
        ),
        CurveKind::Lissajous => curves::lissajous(
            center,
            rng.gen_range(2..=6) as f64,
            rng.gen_range(2..=6) as f64,
            range_f64(rng, 0.0, std::f64::consts::PI),
            range_f64(rng, 30.0, 100.0),
            200,
        ),
        CurveKind::Rose => curves::rose(
            center,
            rng.gen_range(3..=8) as f64,
            range_f64(rng, 40.0, 120.0),
            200,
        ),
        CurveKind::Butterfly => curves::butterfly(center, range_f64(rng, 30.0, 80.0) / 4.0, 800),
        CurveKind::Fourier => {
            let n_harmonics = rng.gen_range(5..=15usize);
            let base_amp = range_f64(rng, h / 8.0, h / 4.0);
            let decay = range_f64(rng, 0.5, 1.5);
            let harmonics: Vec<Harmonic> = (0..n_harmonics)
                .map(|i| {
                    let amp = base_amp / ((i + 1) as f64).powf(decay);
                    Harmonic {
                        amp_x: amp,
                        amp_y: amp,
                        phase_x: range_f64(rng, 0.0, std::f64::consts::TAU),
                        phase_y: range_f64(rng, 0.0, std::f64::consts::TAU),
                    }
                })
                .collect();
            curves::fourier(center, 1.0, &harmonics, 1200)
        }
        CurveKind::Heart => curves::heart(
            center,
            range_f64(rng, 100.0, 300.0) / 2.0,
            range_f64(rng, 0.0, std::f64::consts::TAU),
            400,
        ),
        CurveKind::Wormhole => {
            let min_dim = w.min(h);
            curves::wormhole(
                center,
                range_f64(rng, min_dim / 8.0, min_dim / 3.0),
                range_f64(rng, 0.1, 0.4),
                300,
            )
        }
    }
}

/// Soft radial light spots blended straight into the RGB base: concentric
/// discs of decreasing weight toward the rim.
pub fn apply_lighting(img: &mut ImageRgb, count: u32, rng: &mut impl Rng) {
    let (w, h) = (i64::from(img.width), i64::from(img.height));
    for _ in 0..count {
        let cx = range_i64(rng, 0, w);
        let cy = range_i64(rng, 0, h);
        let radius = rng.gen_range(30..=80i64);
        let strength = rng.gen_range(0.10..0.25f32);

        let x_lo = (cx - radius).max(0);
        let x_hi = (cx + radius).min(w - 1);
        let y_lo = (cy - radius).max(0);
        let y_hi = (cy + radius).min(h - 1);
        for y in y_lo..=y_hi {
            for x in x_lo..=x_hi {
                let d2 = ((x - cx) * (x - cx) + (y - cy) * (y - cy)) as f32;
                let r2 = (radius * radius) as f32;
                if d2 > r2 {
                    continue;
                }
                let weight = strength * (1.0 - (d2 / r2).sqrt());
                let p = img.pixel(x as u32, y as u32);
                let lift = |v: u8| (f32::from(v) + (255.0 - f32::from(v)) * weight) as u8;
                img.put_pixel(x as u32, y as u32, Rgb8::new(lift(p.r), lift(p.g), lift(p.b)));
            }
        }
    }
}

/// Blends a blurred copy of the image through a random elliptical depth mask,
/// leaving the ellipse interior sharp and the far field softened.
pub fn apply_depth_blur(img: &mut ImageRgb, rng: &mut impl Rng) -> FondraResult<()> {
    let mut blurred = img.clone();
    post::apply_blur(&mut blurred, 2.0)?;

    let (w, h) = (f64::from(img.width), f64::from(img.height));
    let cx = range_f64(rng, 0.3 * w, 0.7 * w) as f32;
    let cy = range_f64(rng, 0.3 * h, 0.7 * h) as f32;
    let rx = (range_f64(rng, 0.25 * w, 0.5 * w) as f32).max(1.0);
    let ry = (range_f64(rng, 0.25 * h, 0.5 * h) as f32).max(1.0);

    for y in 0..img.height {
        for x in 0..img.width {
            let nx = (x as f32 - cx) / rx;
            let ny = (y as f32 - cy) / ry;
            let mask = (nx * nx + ny * ny).sqrt().clamp(0.0, 1.0);
            if mask == 0.0 {
                continue;
            }
            let sharp = img.pixel(x, y);
            let soft = blurred.pixel(x, y);
            let mix = |a: u8, b: u8| {
                (f32::from(a) + (f32::from(b) - f32::from(a)) * mask).round() as u8
            };
            img.put_pixel(
                x,
                y,
                Rgb8::new(mix(sharp.r, soft.r), mix(sharp.g, soft.g), mix(sharp.b, soft.b)),
            );
        }
    }
    Ok(())
}

/// Nudges every pixel 10% toward one random light tint.
pub fn apply_color_overlay(img: &mut ImageRgb, rng: &mut impl Rng) {
    let tint = [
        rng.gen_range(200..=255u8),
        rng.gen_range(200..=255u8),
        rng.gen_range(200..=255u8),
    ];
    for px in img.data.chunks_exact_mut(3) {
        for c in 0..3 {
            px[c] = (f32::from(px[c]) * 0.9 + f32::from(tint[c]) * 0.1).round() as u8;
        }
    }
}
