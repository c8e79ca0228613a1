use image::RgbaImage;
use nalgebra::{Vector2, Vector4};

struct MipLevel {
    pixels: Vec<Vector4<f32>>,
    width: usize,
    height: usize,
}

impl MipLevel {
    fn load(&self, x: i32, y: i32) -> Vector4<f32> {
        let x = x.rem_euclid(self.width as i32) as usize;
        let y = y.rem_euclid(self.height as i32) as usize;
        self.pixels[y * self.width + x]
    }

    /// Bilinear lookup with wrapping; `v = 0` is the bottom row.
    fn sample(&self, uv: Vector2<f32>) -> Vector4<f32> {
        let x = uv.x * self.width as f32 - 0.5;
        let y = (1.0 - uv.y) * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let top = self.load(x0, y0) * (1.0 - fx) + self.load(x0 + 1, y0) * fx;
        let bottom = self.load(x0, y0 + 1) * (1.0 - fx) + self.load(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    fn downsample(&self) -> Self {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        let mut pixels = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                let (x, y) = (2 * x as i32, 2 * y as i32);
                let sum = self.load(x, y) + self.load(x + 1, y) + self.load(x, y + 1) + self.load(x + 1, y + 1);
                pixels.push(sum * 0.25);
            }
        }

        Self { pixels, width, height }
    }
}

/// Linear-space RGBA texture with a full box-filtered mip chain.
pub struct Texture2D {
    levels: Vec<MipLevel>,
}

impl Texture2D {
    pub fn width(&self) -> usize {
        self.levels[0].width
    }

    pub fn height(&self) -> usize {
        self.levels[0].height
    }

    pub fn mip_count(&self) -> usize {
        self.levels.len()
    }

    /// Trilinear sample with the level picked from the uv footprint of one
    /// pixel, offset by `mip_bias`.
    pub fn sample_grad(&self, uv: Vector2<f32>, ddx: Vector2<f32>, ddy: Vector2<f32>, mip_bias: f32) -> Vector4<f32> {
        let size = Vector2::new(self.width() as f32, self.height() as f32);
        let footprint = ddx.component_mul(&size).norm().max(ddy.component_mul(&size).norm());

        let max_level = (self.levels.len() - 1) as f32;
        let lod = footprint.max(f32::MIN_POSITIVE).log2() + mip_bias;
        let lod = if lod.is_nan() { 0.0 } else { lod.clamp(0.0, max_level) };

        let lower = lod.floor() as usize;
        let upper = (lower + 1).min(self.levels.len() - 1);
        let t = lod - lower as f32;

        let a = self.levels[lower].sample(uv);
        if t == 0.0 { return a }
        a * (1.0 - t) + self.levels[upper].sample(uv) * t
    }
}

impl From<RgbaImage> for Texture2D {
    fn from(value: RgbaImage) -> Self {
        let base = MipLevel {
            pixels: value.pixels().map(|p| {
                let srgb = |c: u8| (c as f32 / 255.0).powf(2.2);
                Vector4::new(srgb(p[0]), srgb(p[1]), srgb(p[2]), p[3] as f32 / 255.0)
            }).collect(),
            width: value.width() as usize,
            height: value.height() as usize,
        };

        let mut levels = vec![base];
        while let Some(last) = levels.last().filter(|l| l.width > 1 || l.height > 1) {
            let next = last.downsample();
            levels.push(next);
        }

        Self { levels }
    }
}
