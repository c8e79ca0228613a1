//! Temporal anti-aliasing: reprojects last frame's output, bounds it by the
//! current frame's neighbourhood and blends the two.
//!
//! A frame goes through two full-image passes, each parallel over rows: the
//! spatial MSAA resolve, then the temporal blend, which reads only the
//! finished spatial buffer and last frame's history.

use log::{debug, info};
use nalgebra::Vector2;
use rayon::prelude::*;
use crate::buffer::{ColourBuffer, SampleBuffer};
use crate::colour::{luminance, saturate, Colour};
use crate::config::{ClampMode, DilationMode, ResolveConfiguration};
use crate::error::{ResolveError, ResolveResult};
use crate::resolve::{guard_denominator, LuminanceWeighting, MsaaResolve};

pub mod clamp;
pub mod dilation;
pub mod history;
pub mod reprojection;

use clamp::{clamp_history, compute_clamp_box};
use dilation::dilate_velocity;
use history::HistoryBuffers;
use reprojection::Reprojection;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TemporalBlend {
    blend_factor: f32,
    /// Low and high frequency weights when temporal colour weighting is on.
    frequency_weights: Option<(f32, f32)>,
    luminance: LuminanceWeighting,
}

impl TemporalBlend {
    pub fn new(config: &ResolveConfiguration) -> Self {
        Self {
            blend_factor: config.temporal_aa_blend_factor,
            frequency_weights: config
                .use_temporal_colour_weighting
                .then_some((config.low_freq_weight, config.hi_freq_weight)),
            luminance: LuminanceWeighting::new(config),
        }
    }

    /// A blend factor of 0 returns `current` and 1 returns `history`, exactly.
    pub fn blend(&self, current: Colour, history: Colour) -> Colour {
        let mut current_weight = saturate(1.0 - self.blend_factor);
        let mut history_weight = saturate(self.blend_factor);

        if let Some((low, high)) = self.frequency_weights {
            history_weight *= 1.0 / guard_denominator(luminance(&history) + low);
            current_weight *= 1.0 / guard_denominator(luminance(&current) + high);
        }

        current_weight *= self.luminance.weight(&current);
        history_weight *= self.luminance.weight(&history);

        let t = history_weight / (current_weight + history_weight);
        current * (1.0 - t) + history * t
    }
}

pub struct TemporalPass {
    reprojection: Reprojection,
    blend: TemporalBlend,
    clamp_mode: ClampMode,
    variance_clip_gamma: f32,
    dilation_mode: DilationMode,
}

impl TemporalPass {
    pub fn new(config: &ResolveConfiguration) -> Self {
        Self {
            reprojection: Reprojection::new(config),
            blend: TemporalBlend::new(config),
            clamp_mode: config.neighborhood_clamp_mode,
            variance_clip_gamma: config.variance_clip_gamma,
            dilation_mode: config.dilation_mode,
        }
    }

    pub fn run(&self, samples: &SampleBuffer, current: &ColourBuffer, history: &ColourBuffer, target: &mut ColourBuffer) {
        target.par_rows_mut()
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = self.resolve_pixel(samples, current, history, x, y);
                }
            });
    }

    pub fn resolve_pixel(&self, samples: &SampleBuffer, current: &ColourBuffer, history: &ColourBuffer, x: usize, y: usize) -> Colour {
        let current_colour = current.get(x, y);

        let velocity = dilate_velocity(samples, x, y, self.dilation_mode);
        let uv = Vector2::new(
            (x as f32 + 0.5) / current.width() as f32,
            (y as f32 + 0.5) / current.height() as f32,
        );

        let Some(history_colour) = self.reprojection.sample(history, uv - velocity) else {
            return current_colour;
        };

        let (x, y) = (x as i32, y as i32);
        let mut window = [Colour::zeros(); 9];
        for (i, colour) in window.iter_mut().enumerate() {
            let dx = i as i32 % 3 - 1;
            let dy = i as i32 / 3 - 1;
            *colour = current.load(x + dx, y + dy);
        }

        let bounds = compute_clamp_box(&window, self.clamp_mode, self.variance_clip_gamma);
        let clamped = clamp_history(history_colour, &bounds, self.clamp_mode);

        self.blend.blend(current_colour, clamped)
    }
}

/// Owns the history and turns each frame's samples into a resolved image.
pub struct TemporalResolver {
    width: usize,
    height: usize,
    spatial: ColourBuffer,
    history: HistoryBuffers,
    last_committed: Option<u64>,
}

impl TemporalResolver {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            spatial: ColourBuffer::new(width, height),
            history: HistoryBuffers::new(width, height),
            last_committed: None,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) { return }

        info!("Resizing temporal resolver to {width}x{height}, history dropped");
        *self = Self { last_committed: self.last_committed, ..Self::new(width, height) };
    }

    /// Forgets history; the next frame is committed without blending.
    pub fn reset_history(&mut self) {
        info!("Temporal history reset");
        self.history.invalidate();
    }

    pub fn has_history(&self) -> bool {
        self.history.is_valid()
    }

    /// The last committed frame, which the next frame reprojects.
    pub fn output(&self) -> &ColourBuffer {
        self.history.latest()
    }

    pub fn spatial(&self) -> &ColourBuffer {
        &self.spatial
    }

    pub fn resolve_frame(&mut self, frame_index: u64, samples: &SampleBuffer, config: &ResolveConfiguration) -> ResolveResult<&ColourBuffer> {
        config.validate()?;

        if (samples.width(), samples.height()) != (self.width, self.height) {
            return Err(ResolveError::Dimensions {
                width: self.width,
                height: self.height,
                got_width: samples.width(),
                got_height: samples.height(),
            });
        }

        if let Some(last_committed) = self.last_committed {
            if frame_index <= last_committed {
                return Err(ResolveError::FrameOrder { frame_index, last_committed });
            }
        }

        MsaaResolve::new(config).resolve(samples, &mut self.spatial);

        let temporal = config.enable_temporal_aa && !config.use_standard_resolve;
        let (previous, target) = self.history.split();
        match previous {
            Some(previous) if temporal => TemporalPass::new(config).run(samples, &self.spatial, previous, target),
            _ => target.copy_from(&self.spatial),
        }
        self.history.commit();

        debug!("Resolved frame {frame_index} ({:?}, temporal: {temporal})", config.msaa_mode);
        self.last_committed = Some(frame_index);

        Ok(self.history.latest())
    }
}
