//! Post-processing: separable Gaussian blur in Q16 fixed point and additive
//! Gaussian grain. Both operate on the RGB buffer in place.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::foundation::{
    core::ImageRgb,
    error::{FondraError, FondraResult},
};

/// Noise standard deviation is `intensity * NOISE_SIGMA_SCALE` gray levels.
const NOISE_SIGMA_SCALE: f32 = 50.0;

/// Separable Gaussian blur with sigma = `radius` and kernel half-width
/// `ceil(3 * sigma)`. A non-positive radius leaves the image untouched.
#[tracing::instrument(skip(img), fields(w = img.width, h = img.height))]
pub fn apply_blur(img: &mut ImageRgb, radius: f32) -> FondraResult<()> {
    if !(radius > 0.0) {
        return Ok(());
    }
    let half = (radius * 3.0).ceil().max(1.0) as u32;
    let kernel = gaussian_kernel_q16(half, radius)?;

    let mut tmp = vec![0u8; img.data.len()];
    horizontal_pass(&img.data, &mut tmp, img.width, img.height, &kernel);
    vertical_pass(&tmp, &mut img.data, img.width, img.height, &kernel);
    Ok(())
}

/// Fixed-point Gaussian weights summing to exactly 1 << 16, residual folded
/// into the center tap.
fn gaussian_kernel_q16(radius: u32, sigma: f32) -> FondraResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FondraError::config("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(FondraError::config("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let adjusted = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = adjusted as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let dx = ki as i32 - radius;
                let sx = (x + dx).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 3;
                for c in 0..3 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 3;
            for c in 0..3 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let dy = ki as i32 - radius;
                let sy = (y + dy).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 3;
                for c in 0..3 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 3;
            for c in 0..3 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

/// Adds zero-mean Gaussian grain, per channel, clamped to [0, 255]. Intensity
/// 0 leaves the image untouched.
#[tracing::instrument(skip(img, rng), fields(w = img.width, h = img.height))]
pub fn apply_noise(img: &mut ImageRgb, intensity: f32, rng: &mut impl Rng) -> FondraResult<()> {
    if !(intensity > 0.0) {
        return Ok(());
    }
    let sigma = intensity * NOISE_SIGMA_SCALE;
    let normal = Normal::new(0.0f32, sigma)
        .map_err(|e| FondraError::config(format!("noise sigma invalid: {e}")))?;
    for byte in &mut img.data {
        let v = f32::from(*byte) + normal.sample(rng);
        *byte = v.round().clamp(0.0, 255.0) as u8;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgb8;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn impulse(w: u32, h: u32) -> ImageRgb {
        let mut img = ImageRgb::new(w, h).unwrap();
        img.put_pixel(w / 2, h / 2, Rgb8::new(255, 255, 255));
        img
    }

    #[test]
    fn zero_radius_blur_is_identity() {
        let mut img = impulse(5, 5);
        let before = img.clone();
        apply_blur(&mut img, 0.0).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn blur_on_constant_image_is_identity() {
        let mut img = ImageRgb::new(6, 4).unwrap();
        for b in &mut img.data {
            *b = 137;
        }
        let before = img.clone();
        apply_blur(&mut img, 2.0).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn blur_spreads_and_conserves_energy() {
        let mut img = impulse(9, 9);
        apply_blur(&mut img, 1.0).unwrap();
        let nonzero = img.data.chunks_exact(3).filter(|p| p[0] > 0).count();
        assert!(nonzero > 1);
        let sum: u32 = img.data.chunks_exact(3).map(|p| u32::from(p[0])).sum();
        assert!((sum as i32 - 255).abs() <= 8, "sum={sum}");
    }

    #[test]
    fn kernel_sums_to_one_in_q16() {
        for (radius, sigma) in [(1u32, 0.5f32), (3, 1.0), (6, 2.0), (24, 8.0)] {
            let k = gaussian_kernel_q16(radius, sigma).unwrap();
            assert_eq!(k.len() as u32, 2 * radius + 1);
            assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
        }
    }

    #[test]
    fn zero_intensity_noise_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut img = impulse(4, 4);
        let before = img.clone();
        apply_noise(&mut img, 0.0, &mut rng).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn noise_perturbs_most_pixels_within_clamp() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut img = ImageRgb::new(32, 32).unwrap();
        for b in &mut img.data {
            *b = 128;
        }
        apply_noise(&mut img, 0.5, &mut rng).unwrap();
        let changed = img.data.iter().filter(|&&b| b != 128).count();
        assert!(changed > img.data.len() / 2);
    }
}
