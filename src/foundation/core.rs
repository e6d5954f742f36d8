use crate::foundation::error::{FondraError, FondraResult};

pub use kurbo::Point;

/// Opaque 8-bit RGB triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn as_f32(self) -> [f32; 3] {
        [f32::from(self.r), f32::from(self.g), f32::from(self.b)]
    }
}

/// Straight-alpha 8-bit RGBA (r,g,b NOT premultiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

/// Opaque RGB pixel buffer, row-major, `width*height*3` bytes.
///
/// This is both the gradient field and the finished image: the pipeline
/// produces one per invocation and each stage consumes its predecessor's
/// buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRgb {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageRgb {
    pub fn new(width: u32, height: u32) -> FondraResult<Self> {
        let len = buffer_len(width, height, 3)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn from_data(width: u32, height: u32, data: Vec<u8>) -> FondraResult<Self> {
        let expected = buffer_len(width, height, 3)?;
        if data.len() != expected {
            return Err(FondraError::config(
                "ImageRgb data must be width*height*3 bytes",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb8 {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        Rgb8::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, c: Rgb8) {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        self.data[i] = c.r;
        self.data[i + 1] = c.g;
        self.data[i + 2] = c.b;
    }
}

/// Transparent straight-alpha RGBA layer, row-major, `width*height*4` bytes.
///
/// Decorative primitives set pixels directly (last write wins, matching the
/// drawing model the overlay reproduces); the layer is merged onto an
/// [`ImageRgb`] base with standard "over" blending and then discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayLayer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl OverlayLayer {
    pub fn new(width: u32, height: u32) -> FondraResult<Self> {
        let len = buffer_len(width, height, 4)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    /// Bounds-checked pixel write; coordinates outside the canvas are ignored.
    pub fn put(&mut self, x: i64, y: i64, c: Rgba8) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[i] = c.r;
        self.data[i + 1] = c.g;
        self.data[i + 2] = c.b;
        self.data[i + 3] = c.a;
    }

    pub fn get(&self, x: u32, y: u32) -> Rgba8 {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Rgba8::new(
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < f64::from(self.width) && p.y < f64::from(self.height)
    }
}

fn buffer_len(width: u32, height: u32, channels: usize) -> FondraResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| FondraError::config("pixel buffer size overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_rgb_pixel_roundtrip() {
        let mut img = ImageRgb::new(4, 3).unwrap();
        img.put_pixel(3, 2, Rgb8::new(10, 20, 30));
        assert_eq!(img.pixel(3, 2), Rgb8::new(10, 20, 30));
        assert_eq!(img.pixel(0, 0), Rgb8::new(0, 0, 0));
    }

    #[test]
    fn overlay_put_ignores_out_of_bounds() {
        let mut layer = OverlayLayer::new(2, 2).unwrap();
        layer.put(-1, 0, Rgba8::new(1, 2, 3, 4));
        layer.put(2, 0, Rgba8::new(1, 2, 3, 4));
        layer.put(0, 5, Rgba8::new(1, 2, 3, 4));
        assert!(layer.data.iter().all(|&b| b == 0));

        layer.put(1, 1, Rgba8::new(9, 8, 7, 6));
        assert_eq!(layer.get(1, 1), Rgba8::new(9, 8, 7, 6));
    }

    #[test]
    fn from_data_rejects_wrong_length() {
        assert!(ImageRgb::from_data(2, 2, vec![0u8; 11]).is_err());
        assert!(ImageRgb::from_data(2, 2, vec![0u8; 12]).is_ok());
    }
}
