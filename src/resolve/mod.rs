//! Spatial MSAA resolve: one colour per pixel from the filtered subsamples
//! of the pixel and its neighbours.

use nalgebra::Vector2;
use rayon::prelude::*;
use crate::buffer::{ColourBuffer, SampleBuffer};
use crate::colour::{floor_zero_colour, luminance, Colour};
use crate::config::ResolveConfiguration;
use crate::filter::FilterKernel;

/// Denominators below this are raised to it before dividing.
pub const WEIGHT_EPSILON: f32 = 1e-4;

#[inline(always)]
pub fn guard_denominator(d: f32) -> f32 {
    if d < WEIGHT_EPSILON { WEIGHT_EPSILON } else { d }
}

/// `1 / (1 + exposure * L)` weighting that stops bright outliers from
/// dominating a filtered sum.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LuminanceWeighting {
    enabled: bool,
    exposure: f32,
}

impl LuminanceWeighting {
    pub fn new(config: &ResolveConfiguration) -> Self {
        Self {
            enabled: config.inverse_luminance_filtering,
            exposure: config.filter_exposure(),
        }
    }

    #[inline(always)]
    pub fn weight(&self, colour: &Colour) -> f32 {
        if self.enabled {
            1.0 / guard_denominator(1.0 + luminance(colour) * self.exposure)
        } else {
            1.0
        }
    }
}

pub struct MsaaResolve {
    kernel: FilterKernel,
    sample_radius: i32,
    luminance: LuminanceWeighting,
    standard: bool,
}

impl MsaaResolve {
    pub fn new(config: &ResolveConfiguration) -> Self {
        Self {
            kernel: FilterKernel::resolve(config),
            sample_radius: config.sample_radius(),
            luminance: LuminanceWeighting::new(config),
            standard: config.use_standard_resolve,
        }
    }

    pub fn resolve(&self, samples: &SampleBuffer, output: &mut ColourBuffer) {
        output.par_rows_mut()
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = self.resolve_pixel(samples, x, y);
                }
            });
    }

    pub fn resolve_pixel(&self, samples: &SampleBuffer, x: usize, y: usize) -> Colour {
        if self.standard {
            return standard_resolve(samples, x, y);
        }

        let (x, y) = (x as i32, y as i32);
        let radius = self.kernel.radius();
        let mut sum = Colour::zeros();
        let mut total_weight = 0.0;

        for offset_y in -self.sample_radius..=self.sample_radius {
            for offset_x in -self.sample_radius..=self.sample_radius {
                let pixel_offset = Vector2::new(offset_x as f32, offset_y as f32);

                for sample in 0..samples.sample_count() {
                    let offset = pixel_offset + samples.sample_position(sample);
                    if offset.x.abs() > radius || offset.y.abs() > radius { continue }

                    let colour = floor_zero_colour(samples.colour(x + offset_x, y + offset_y, sample));
                    let weight = self.kernel.weight_2d(offset.x, offset.y) * self.luminance.weight(&colour);

                    sum += colour * weight;
                    total_weight += weight;
                }
            }
        }

        floor_zero_colour(sum / total_weight)
    }
}

/// Unweighted average of the pixel's own subsamples; a straight copy with a
/// single sample.
pub fn standard_resolve(samples: &SampleBuffer, x: usize, y: usize) -> Colour {
    let (x, y) = (x as i32, y as i32);
    let count = samples.sample_count();
    if count == 1 {
        return samples.colour(x, y, 0);
    }

    let sum = (0..count).fold(Colour::zeros(), |acc, sample| acc + samples.colour(x, y, sample));
    sum / count as f32
}
