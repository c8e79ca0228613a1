use image::RgbImage;
use nalgebra::{Vector2, Vector3};
use rayon::slice::{ChunksMut, ParallelSliceMut};
use crate::colour::{saturate, Colour};
use crate::config::MsaaMode;

/// Depth a sample holds before any geometry lands on it.
pub const DEPTH_CLEAR: f32 = 1.0;

/// Standard D3D subsample positions in 1/16ths of a pixel, relative to the
/// pixel centre, with +y pointing down the image.
const PATTERN_1X: [(i8, i8); 1] = [(0, 0)];
const PATTERN_2X: [(i8, i8); 2] = [(4, 4), (-4, -4)];
const PATTERN_4X: [(i8, i8); 4] = [(-2, -6), (6, -2), (-6, 2), (2, 6)];
const PATTERN_8X: [(i8, i8); 8] = [(1, -3), (-1, 3), (5, 1), (-3, -5), (-5, 5), (-7, -1), (3, 7), (7, -7)];

pub fn sample_positions(mode: MsaaMode) -> Vec<Vector2<f32>> {
    let pattern: &[(i8, i8)] = match mode {
        MsaaMode::None => &PATTERN_1X,
        MsaaMode::Msaa2x => &PATTERN_2X,
        MsaaMode::Msaa4x => &PATTERN_4X,
        MsaaMode::Msaa8x => &PATTERN_8X,
    };

    pattern.iter().map(|&(x, y)| Vector2::new(x as f32, y as f32) / 16.0).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColourBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Colour>,
}

impl ColourBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Vector3::zeros())
    }

    pub fn filled(width: usize, height: usize, colour: Colour) -> Self {
        Self { width, height, pixels: vec![colour; width * height] }
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Colour>) -> Self {
        assert_eq!(pixels.len(), width * height, "pixel count does not match image size");
        Self { width, height, pixels }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Colour] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Colour] {
        &mut self.pixels
    }

    /// Rows for a parallel pass; an empty image has none.
    pub fn par_rows_mut(&mut self) -> ChunksMut<'_, Colour> {
        self.pixels.par_chunks_mut(self.width.max(1))
    }

    pub fn get(&self, x: usize, y: usize) -> Colour {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, colour: Colour) {
        self.pixels[y * self.width + x] = colour;
    }

    #[inline(always)]
    pub fn load(&self, x: i32, y: i32) -> Colour {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.pixels[y * self.width + x]
    }

    pub fn sample_bilinear(&self, uv: Vector2<f32>) -> Colour {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let top = self.load(x0, y0) * (1.0 - fx) + self.load(x0 + 1, y0) * fx;
        let bottom = self.load(x0, y0 + 1) * (1.0 - fx) + self.load(x0 + 1, y0 + 1) * fx;
        top * (1.0 - fy) + bottom * fy
    }

    pub fn copy_from(&mut self, other: &ColourBuffer) {
        assert_eq!((self.width, self.height), (other.width, other.height), "buffer sizes differ");
        self.pixels.copy_from_slice(&other.pixels);
    }

    /// 8-bit copy of the buffer; values are clamped to [0, 1].
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let colour = self.get(x as usize, y as usize);
            image::Rgb([
                (saturate(colour.x) * 255.0 + 0.5) as u8,
                (saturate(colour.y) * 255.0 + 0.5) as u8,
                (saturate(colour.z) * 255.0 + 0.5) as u8,
            ])
        })
    }
}

/// Depth and motion of one subsample, the inputs to velocity dilation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MotionSample {
    pub depth: f32,
    /// `uv_now - uv_previous`.
    pub velocity: Vector2<f32>,
}

/// Multisampled colour, depth and velocity targets.
///
/// Subsamples of a pixel are stored contiguously, so row `y` occupies
/// `width * sample_count` entries.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    width: usize,
    height: usize,
    mode: MsaaMode,
    positions: Vec<Vector2<f32>>,
    colours: Vec<Colour>,
    depths: Vec<f32>,
    velocities: Vec<Vector2<f32>>,
}

impl SampleBuffer {
    pub fn new(width: usize, height: usize, mode: MsaaMode) -> Self {
        let count = width * height * mode.sample_count();
        Self {
            width,
            height,
            mode,
            positions: sample_positions(mode),
            colours: vec![Vector3::zeros(); count],
            depths: vec![DEPTH_CLEAR; count],
            velocities: vec![Vector2::zeros(); count],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mode(&self) -> MsaaMode {
        self.mode
    }

    pub fn sample_count(&self) -> usize {
        self.positions.len()
    }

    /// Offset of subsample `sample` from its pixel centre, in pixels.
    pub fn sample_position(&self, sample: usize) -> Vector2<f32> {
        self.positions[sample]
    }

    pub fn clear(&mut self, colour: Colour) {
        self.colours.iter_mut().for_each(|c| *c = colour);
        self.depths.iter_mut().for_each(|d| *d = DEPTH_CLEAR);
        self.velocities.iter_mut().for_each(|v| *v = Vector2::zeros());
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize, sample: usize) -> usize {
        (y * self.width + x) * self.positions.len() + sample
    }

    #[inline(always)]
    fn clamped_index(&self, x: i32, y: i32, sample: usize) -> usize {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        self.index(x, y, sample)
    }

    pub fn colour(&self, x: i32, y: i32, sample: usize) -> Colour {
        self.colours[self.clamped_index(x, y, sample)]
    }

    pub fn depth(&self, x: i32, y: i32, sample: usize) -> f32 {
        self.depths[self.clamped_index(x, y, sample)]
    }

    pub fn velocity(&self, x: i32, y: i32, sample: usize) -> Vector2<f32> {
        self.velocities[self.clamped_index(x, y, sample)]
    }

    pub fn motion(&self, x: i32, y: i32, sample: usize) -> MotionSample {
        let index = self.clamped_index(x, y, sample);
        MotionSample { depth: self.depths[index], velocity: self.velocities[index] }
    }

    pub fn write(&mut self, x: usize, y: usize, sample: usize, colour: Colour, depth: f32, velocity: Vector2<f32>) {
        let index = self.index(x, y, sample);
        self.colours[index] = colour;
        self.depths[index] = depth;
        self.velocities[index] = velocity;
    }

    pub fn set_colour(&mut self, x: usize, y: usize, sample: usize, colour: Colour) {
        let index = self.index(x, y, sample);
        self.colours[index] = colour;
    }

    pub fn set_velocity(&mut self, x: usize, y: usize, sample: usize, velocity: Vector2<f32>) {
        let index = self.index(x, y, sample);
        self.velocities[index] = velocity;
    }

    pub fn fill_with(&mut self, mut f: impl FnMut(usize, usize) -> (Colour, f32, Vector2<f32>)) {
        for y in 0..self.height {
            for x in 0..self.width {
                let (colour, depth, velocity) = f(x, y);
                for sample in 0..self.sample_count() {
                    self.write(x, y, sample, colour, depth, velocity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_stay_inside_half_a_pixel() {
        for mode in MsaaMode::ALL {
            let positions = sample_positions(mode);
            assert_eq!(positions.len(), mode.sample_count());
            for p in positions {
                assert!(p.x.abs() < 0.5 && p.y.abs() < 0.5);
            }
        }
    }

    #[test]
    fn load_clamps_to_edge() {
        let mut buffer = ColourBuffer::new(2, 2);
        buffer.set(1, 1, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(buffer.load(5, 7), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(buffer.load(-1, -1), Vector3::zeros());
    }

    #[test]
    fn bilinear_at_texel_centre_is_exact() {
        let mut buffer = ColourBuffer::new(4, 4);
        buffer.set(2, 1, Vector3::new(1.0, 0.5, 0.25));
        let uv = Vector2::new(2.5 / 4.0, 1.5 / 4.0);
        assert_eq!(buffer.sample_bilinear(uv), Vector3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn bilinear_between_texels_averages() {
        let mut buffer = ColourBuffer::new(2, 1);
        buffer.set(1, 0, Vector3::new(1.0, 1.0, 1.0));
        let sampled = buffer.sample_bilinear(Vector2::new(0.5, 0.5));
        assert!((sampled.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sample_buffer_clear_resets_depth_and_velocity() {
        let mut samples = SampleBuffer::new(3, 2, MsaaMode::Msaa4x);
        samples.write(1, 1, 3, Vector3::new(1.0, 1.0, 1.0), 0.25, Vector2::new(0.1, 0.2));
        assert_eq!(samples.depth(1, 1, 3), 0.25);

        samples.clear(Vector3::new(0.5, 0.5, 0.5));
        assert_eq!(samples.depth(1, 1, 3), DEPTH_CLEAR);
        assert_eq!(samples.velocity(1, 1, 3), Vector2::zeros());
        assert_eq!(samples.colour(1, 1, 3), Vector3::new(0.5, 0.5, 0.5));
    }
}
