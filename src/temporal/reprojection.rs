use nalgebra::Vector2;
use crate::buffer::ColourBuffer;
use crate::colour::{floor_zero_colour, Colour};
use crate::config::ResolveConfiguration;
use crate::filter::FilterKernel;
use crate::resolve::LuminanceWeighting;

pub struct Reprojection {
    kernel: FilterKernel,
    luminance: LuminanceWeighting,
    standard: bool,
}

impl Reprojection {
    pub fn new(config: &ResolveConfiguration) -> Self {
        Self {
            kernel: FilterKernel::reprojection(config),
            luminance: LuminanceWeighting::new(config),
            standard: config.use_standard_reprojection,
        }
    }

    /// History at `uv`, or `None` when `uv` falls outside the previous frame.
    pub fn sample(&self, history: &ColourBuffer, uv: Vector2<f32>) -> Option<Colour> {
        if uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 {
            return None;
        }

        if self.standard {
            return Some(history.sample_bilinear(uv));
        }

        Some(self.sample_filtered(history, uv))
    }

    /// 4x4 taps around the reprojected position weighted by the kernel.
    fn sample_filtered(&self, history: &ColourBuffer, uv: Vector2<f32>) -> Colour {
        let position = Vector2::new(uv.x * history.width() as f32, uv.y * history.height() as f32);
        // Texel whose centre is the nearest one up and to the left of `position`.
        let origin = (position - Vector2::repeat(0.5)).map(f32::floor);
        let mut sum = Colour::zeros();
        let mut total_weight = 0.0;

        for tap_y in -1..=2 {
            for tap_x in -1..=2 {
                let texel_x = origin.x + tap_x as f32;
                let texel_y = origin.y + tap_y as f32;

                let colour = history.load(texel_x as i32, texel_y as i32);
                let distance = Vector2::new(texel_x + 0.5, texel_y + 0.5) - position;
                let weight = self.kernel.weight_2d(distance.x, distance.y) * self.luminance.weight(&colour);

                sum += colour * weight;
                total_weight += weight;
            }
        }

        // Kernels with negative lobes can cancel out exactly on a texel edge.
        if total_weight.abs() < 1e-6 {
            return history.sample_bilinear(uv);
        }

        floor_zero_colour(sum / total_weight)
    }
}
