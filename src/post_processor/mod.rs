use std::path::Path;
use image::ImageResult;
use log::info;
use rayon::prelude::*;
use crate::buffer::ColourBuffer;
use crate::colour::{convert_colour_to_u32, floor_zero_colour, saturate, Colour};

pub struct PostProcessorOptions {
    /// Exposure in stops applied before tone mapping.
    pub manual_exposure: f32,
    pub tone_map: bool,
    /// Unsharp mask strength applied to the tone-mapped image; 0 disables it.
    pub sharpening_amount: f32,
}

impl Default for PostProcessorOptions {
    fn default() -> Self {
        Self {
            manual_exposure: -2.5,
            tone_map: true,
            sharpening_amount: 0.0,
        }
    }
}

/// Turns the resolved HDR image into the window's `0x00RRGGBB` buffer.
pub struct PostProcessor {
    options: PostProcessorOptions,
    display: ColourBuffer,
    sharpened: ColourBuffer,
}

impl PostProcessor {
    pub fn new(width: usize, height: usize, options: PostProcessorOptions) -> Self {
        Self {
            options,
            display: ColourBuffer::new(width, height),
            sharpened: ColourBuffer::new(width, height),
        }
    }

    pub fn options_mut(&mut self) -> &mut PostProcessorOptions {
        &mut self.options
    }

    pub fn process(&mut self, source: &ColourBuffer, buffer: &mut [u32]) {
        if buffer.len() != self.display.pixels().len() || source.pixels().len() != buffer.len() {
            panic!("Buffer length does not match image size");
        }

        let exposure = self.options.manual_exposure.exp2();
        let tone_map = self.options.tone_map;

        self.display.pixels_mut()
            .par_iter_mut()
            .zip(source.pixels().par_iter())
            .for_each(|(display, colour)| {
                let exposed = colour * exposure;
                *display = if tone_map { Self::tone_map(exposed) } else { exposed };
            });

        let amount = self.options.sharpening_amount;
        let presented = if amount > 0.0 {
            sharpen(&self.display, amount, &mut self.sharpened);
            &self.sharpened
        } else {
            &self.display
        };

        buffer.par_iter_mut()
            .zip(presented.pixels().par_iter())
            .for_each(|(out, colour)| {
                let encoded = if tone_map { encode_gamma(*colour) } else { *colour };
                *out = convert_colour_to_u32(encoded);
            });
    }

    /// Filmic curve fitted to the ACES reference transform, still linear.
    fn tone_map(colour: Colour) -> Colour {
        colour.map(|x| {
            let x = x.max(0.0);
            let mapped = (x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14);
            mapped.clamp(0.0, 1.0)
        })
    }
}

fn encode_gamma(colour: Colour) -> Colour {
    colour.map(|x| saturate(x).powf(1.0 / 2.2))
}

/// Unsharp mask over the four direct neighbours, edge-clamped.
pub fn sharpen(source: &ColourBuffer, amount: f32, target: &mut ColourBuffer) {
    let centre_weight = 1.0 + 4.0 * amount;

    target.par_rows_mut()
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for (x, pixel) in row.iter_mut().enumerate() {
                let x = x as i32;
                let neighbours = source.load(x - 1, y)
                    + source.load(x + 1, y)
                    + source.load(x, y - 1)
                    + source.load(x, y + 1);

                *pixel = floor_zero_colour(source.load(x, y) * centre_weight - neighbours * amount);
            }
        });
}

pub fn save_screenshot(source: &ColourBuffer, exposure: f32, path: impl AsRef<Path>) -> ImageResult<()> {
    let scale = exposure.exp2();
    let exposed = ColourBuffer::from_pixels(
        source.width(),
        source.height(),
        source.pixels().iter().map(|c| encode_gamma(PostProcessor::tone_map(c * scale))).collect(),
    );

    exposed.to_rgb_image().save(path.as_ref())?;
    info!("Saved screenshot to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn sharpen_leaves_flat_images_alone() {
        let source = ColourBuffer::filled(4, 3, Vector3::new(0.2, 0.4, 0.6));
        let mut target = ColourBuffer::new(4, 3);
        sharpen(&source, 0.7, &mut target);
        for pixel in target.pixels() {
            assert!((pixel - Vector3::new(0.2, 0.4, 0.6)).norm() < 1e-6);
        }
    }

    #[test]
    fn sharpen_boosts_an_isolated_pixel() {
        let mut source = ColourBuffer::new(3, 3);
        source.set(1, 1, Vector3::new(1.0, 1.0, 1.0));
        let mut target = ColourBuffer::new(3, 3);
        sharpen(&source, 0.5, &mut target);

        assert_eq!(target.get(1, 1), Vector3::new(3.0, 3.0, 3.0));
        // Neighbours would go negative and are floored.
        assert_eq!(target.get(0, 1), Vector3::zeros());
    }

    #[test]
    fn zero_sharpening_is_a_copy() {
        let mut source = ColourBuffer::new(2, 2);
        source.set(0, 1, Vector3::new(0.5, 2.0, 0.0));
        let mut target = ColourBuffer::new(2, 2);
        sharpen(&source, 0.0, &mut target);
        assert_eq!(target, source);
    }

    #[test]
    fn tone_map_is_monotonic_and_bounded() {
        let mut previous = -1.0;
        for i in 0..100 {
            let mapped = PostProcessor::tone_map(Vector3::repeat(i as f32 * 0.25)).x;
            assert!(mapped >= previous && mapped <= 1.0);
            previous = mapped;
        }
        assert_eq!(PostProcessor::tone_map(Vector3::zeros()), Vector3::zeros());
    }

    #[test]
    fn process_packs_every_pixel() {
        let options = PostProcessorOptions { manual_exposure: 0.0, tone_map: false, sharpening_amount: 0.0 };
        let mut processor = PostProcessor::new(2, 1, options);
        let source = ColourBuffer::from_pixels(2, 1, vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 4.0)]);
        let mut buffer = vec![0; 2];
        processor.process(&source, &mut buffer);
        assert_eq!(buffer, vec![0x00FF0000, 0x000000FF]);
    }

    #[test]
    fn sharpening_runs_on_the_tone_mapped_image() {
        // A very bright texel next to a dark one: sharpening in HDR would drive
        // the dark side far below zero and the bright side far above one.
        let source = ColourBuffer::from_pixels(3, 1, vec![
            Vector3::repeat(0.05),
            Vector3::repeat(0.05),
            Vector3::repeat(64.0),
        ]);
        let options = |sharpening_amount| PostProcessorOptions { manual_exposure: 0.0, tone_map: true, sharpening_amount };

        let mut plain = vec![0; 3];
        PostProcessor::new(3, 1, options(0.0)).process(&source, &mut plain);

        let mut sharpened = vec![0; 3];
        let mut processor = PostProcessor::new(3, 1, options(0.5));
        processor.process(&source, &mut sharpened);

        let mapped = |x: f32| PostProcessor::tone_map(Vector3::repeat(x)).x;
        let expected_edge = mapped(0.05) * 2.0 - (mapped(0.05) + mapped(64.0)) * 0.5;
        let edge = processor.sharpened.get(1, 0).x;
        assert!((edge - expected_edge.max(0.0)).abs() < 1e-6, "{edge}");

        assert_eq!(plain[2], sharpened[2]);
        assert!(sharpened[1] & 0xFF < plain[1] & 0xFF);
    }

    #[test]
    fn empty_image_is_a_no_op() {
        let mut processor = PostProcessor::new(0, 0, PostProcessorOptions { sharpening_amount: 0.5, ..Default::default() });
        let mut buffer = Vec::new();
        processor.process(&ColourBuffer::new(0, 0), &mut buffer);
        assert!(buffer.is_empty());
    }
}
