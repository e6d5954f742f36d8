//! Parametric curve evaluators. Every function samples a closed-form curve at
//! `n` evenly spaced parameter values and returns the points in parameter
//! order; rasterization happens elsewhere.

use std::f64::consts::{PI, TAU};

use kurbo::Point;
use rand::Rng;
use rand::seq::SliceRandom as _;

/// Curve families the overlay stage may draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Bezier,
    Sine,
    Spiral,
    Lissajous,
    Rose,
    Butterfly,
    Fourier,
    Heart,
    Wormhole,
}

impl CurveKind {
    pub const ALL: [CurveKind; 9] = [
        CurveKind::Bezier,
        CurveKind::Sine,
        CurveKind::Spiral,
        CurveKind::Lissajous,
        CurveKind::Rose,
        CurveKind::Butterfly,
        CurveKind::Fourier,
        CurveKind::Heart,
        CurveKind::Wormhole,
    ];

    /// The families drawn by default; the showier ones are opt-in.
    pub fn default_set() -> Vec<CurveKind> {
        vec![
            CurveKind::Bezier,
            CurveKind::Sine,
            CurveKind::Spiral,
            CurveKind::Lissajous,
            CurveKind::Rose,
        ]
    }

    pub fn random(kinds: &[CurveKind], rng: &mut impl Rng) -> CurveKind {
        *kinds.choose(rng).unwrap_or(&CurveKind::Bezier)
    }
}

/// Inclusive linspace over [0, 1] with at least two samples.
fn params(n: usize) -> impl Iterator<Item = f64> {
    let n = n.max(2);
    let denom = (n - 1) as f64;
    (0..n).map(move |i| i as f64 / denom)
}

pub fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, n: usize) -> Vec<Point> {
    params(n)
        .map(|t| {
            let u = 1.0 - t;
            let (b0, b1, b2, b3) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            Point::new(
                b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
                b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
            )
        })
        .collect()
}

/// Horizontal sine trace starting at `start`, spanning `length` pixels.
pub fn sine_wave(start: Point, length: f64, amplitude: f64, frequency: f64, n: usize) -> Vec<Point> {
    params(n)
        .map(|t| {
            Point::new(
                start.x + t * length,
                start.y + amplitude * (frequency * TAU * t).sin(),
            )
        })
        .collect()
}

/// Archimedean spiral from the center out to `max_radius` over `turns`
/// revolutions. Non-positive turns collapse to the center point.
pub fn spiral(center: Point, max_radius: f64, turns: f64, n: usize) -> Vec<Point> {
    let total = turns * TAU;
    params(n)
        .map(|t| {
            if total <= 0.0 {
                return center;
            }
            let theta = t * total;
            let r = max_radius * t;
            Point::new(center.x + r * theta.cos(), center.y + r * theta.sin())
        })
        .collect()
}

pub fn lissajous(center: Point, a: f64, b: f64, delta: f64, scale: f64, n: usize) -> Vec<Point> {
    params(n)
        .map(|t| {
            let theta = t * TAU;
            Point::new(
                center.x + scale * (a * theta + delta).sin(),
                center.y + scale * (b * theta).sin(),
            )
        })
        .collect()
}

/// Rose curve r = scale * cos(k * theta).
pub fn rose(center: Point, k: f64, scale: f64, n: usize) -> Vec<Point> {
    params(n)
        .map(|t| {
            let theta = t * TAU;
            let r = scale * (k * theta).cos();
            Point::new(center.x + r * theta.cos(), center.y + r * theta.sin())
        })
        .collect()
}

/// The classic butterfly transcendental curve, traced over t in [0, 12pi].
pub fn butterfly(center: Point, scale: f64, n: usize) -> Vec<Point> {
    params(n)
        .map(|u| {
            let t = u * 12.0 * PI;
            let r = (t.cos().exp() - 2.0 * (4.0 * t).cos() + (t / 12.0).sin().powi(5)) * scale;
            Point::new(center.x + r * t.sin(), center.y - r * t.cos())
        })
        .collect()
}

/// One term of a Fourier trace.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Harmonic {
    pub amp_x: f64,
    pub amp_y: f64,
    pub phase_x: f64,
    pub phase_y: f64,
}

/// Sum of harmonics of `fundamental`, traced over t in [0, 4pi].
pub fn fourier(center: Point, fundamental: f64, harmonics: &[Harmonic], n: usize) -> Vec<Point> {
    params(n)
        .map(|u| {
            let t = u * 4.0 * PI;
            let mut p = center;
            for (i, h) in harmonics.iter().enumerate() {
                let freq = fundamental * (i + 1) as f64;
                p.x += h.amp_x * (freq * t + h.phase_x).sin();
                p.y += h.amp_y * (freq * t + h.phase_y).cos();
            }
            p
        })
        .collect()
}

/// The parametric heart, normalized so `scale` is roughly its half-height,
/// rotated by `rotation` radians. Image rows grow downward, so y is negated.
pub fn heart(center: Point, scale: f64, rotation: f64, n: usize) -> Vec<Point> {
    let (sin_r, cos_r) = rotation.sin_cos();
    params(n)
        .map(|u| {
            let t = u * TAU;
            let x = 16.0 * t.sin().powi(3) / 17.0;
            let y = (13.0 * t.cos()
                - 5.0 * (2.0 * t).cos()
                - 2.0 * (3.0 * t).cos()
                - (4.0 * t).cos())
                / 17.0;
            let (rx, ry) = (x * cos_r - y * sin_r, x * sin_r + y * cos_r);
            Point::new(center.x + scale * rx, center.y - scale * ry)
        })
        .collect()
}

/// Ring with angle-dependent radial distortion, the lobed "wormhole" look.
pub fn wormhole(center: Point, radius: f64, distortion: f64, n: usize) -> Vec<Point> {
    params(n)
        .map(|u| {
            let theta = u * TAU;
            Point::new(
                center.x + radius * (1.0 + distortion * (3.0 * theta).sin()) * theta.cos(),
                center.y + radius * (1.0 + distortion * (2.0 * theta).cos()) * theta.sin(),
            )
        })
        .collect()
}
