//! Per-frame sub-pixel camera jitter.
//!
//! The sequence is a pure function of the frame index; the only state lives
//! in [`JitterTracker`], which remembers last frame's jitter so the rasterizer
//! can strip the jitter delta out of static geometry's velocity.

use nalgebra::{Matrix4, Vector2, Vector3};
use crate::config::{JitterMode, ResolveConfiguration};

/// Van der Corput radical inverse in base 2.
pub fn radical_inverse_base2(index: u32) -> f32 {
    index.reverse_bits() as f32 * (1.0 / 4_294_967_296.0)
}

/// The `index`-th point of an `count`-point Hammersley set, in [0, 1)^2.
pub fn hammersley_2d(index: u64, count: u64) -> Vector2<f32> {
    Vector2::new(index as f32 / count as f32, radical_inverse_base2(index as u32))
}

/// Jitter for `frame_index`: a point in [-1, 1]^2 multiplied by `scale`.
pub fn next_jitter(frame_index: u64, mode: JitterMode, scale: f32) -> Vector2<f32> {
    let jitter = match mode {
        JitterMode::None => return Vector2::zeros(),
        JitterMode::Uniform2x => {
            if frame_index % 2 == 0 { Vector2::new(-0.5, -0.5) } else { Vector2::new(0.5, 0.5) }
        }
        JitterMode::Hammersley4x | JitterMode::Hammersley8x | JitterMode::Hammersley16x => {
            let count = mode.period();
            hammersley_2d(frame_index % count, count) * 2.0 - Vector2::new(1.0, 1.0)
        }
    };

    jitter * scale
}

/// Offsets a projection so the rasterized image moves by `jitter` half-pixels.
/// The translation is applied in clip space, so it is independent of depth.
pub fn jitter_projection(projection: &Matrix4<f32>, jitter: Vector2<f32>, width: usize, height: usize) -> Matrix4<f32> {
    let offset = Vector3::new(jitter.x / width as f32, -jitter.y / height as f32, 0.0);
    Matrix4::new_translation(&offset) * projection
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FrameJitter {
    pub jitter: Vector2<f32>,
    /// Half of the change in jitter since the previous frame.
    pub offset: Vector2<f32>,
}

#[derive(Default)]
pub struct JitterTracker {
    previous: Vector2<f32>,
}

impl JitterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, frame_index: u64, config: &ResolveConfiguration) -> FrameJitter {
        let jitter = if config.jitter_enabled() {
            next_jitter(frame_index, config.jitter_mode, config.jitter_scale)
        } else {
            Vector2::zeros()
        };

        let offset = (jitter - self.previous) * 0.5;
        self.previous = jitter;

        FrameJitter { jitter, offset }
    }

    pub fn reset(&mut self) {
        self.previous = Vector2::zeros();
    }
}
