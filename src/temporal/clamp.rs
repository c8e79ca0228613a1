use crate::colour::Colour;
use crate::config::ClampMode;

const CLIP_EPSILON: f32 = 0.000001;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NeighborhoodBox {
    pub min: Colour,
    pub max: Colour,
    /// Mean of the window; the point clipping pulls towards.
    pub mean: Colour,
}

impl NeighborhoodBox {
    pub fn contains(&self, colour: &Colour) -> bool {
        (0..3).all(|i| colour[i] >= self.min[i] && colour[i] <= self.max[i])
    }
}

/// Bounds for history derived from the current frame's samples around a pixel.
pub fn compute_clamp_box(window: &[Colour], mode: ClampMode, gamma: f32) -> NeighborhoodBox {
    let count = window.len() as f32;
    let mut min = window[0];
    let mut max = window[0];
    let mut m1 = Colour::zeros();
    let mut m2 = Colour::zeros();

    for colour in window {
        min = min.inf(colour);
        max = max.sup(colour);
        m1 += colour;
        m2 += colour.component_mul(colour);
    }

    let mean = m1 / count;

    if mode == ClampMode::VarianceClip {
        let variance = m2 / count - mean.component_mul(&mean);
        let sigma = variance.map(|v| v.abs().sqrt());
        return NeighborhoodBox {
            min: mean - sigma * gamma,
            max: mean + sigma * gamma,
            mean,
        };
    }

    NeighborhoodBox { min, max, mean }
}

pub fn clamp_history(history: Colour, bounds: &NeighborhoodBox, mode: ClampMode) -> Colour {
    match mode {
        ClampMode::Disabled => history,
        ClampMode::RgbClamp => clamp_componentwise(history, bounds),
        ClampMode::RgbClip | ClampMode::VarianceClip => clip_towards_mean(history, bounds),
    }
}

fn clamp_componentwise(history: Colour, bounds: &NeighborhoodBox) -> Colour {
    Colour::from_fn(|i, _| {
        let c = history[i];
        if c < bounds.min[i] {
            bounds.min[i]
        } else if c > bounds.max[i] {
            bounds.max[i]
        } else {
            c
        }
    })
}

/// Shortens the ray from the mean to `history` until it ends inside the box.
fn clip_towards_mean(history: Colour, bounds: &NeighborhoodBox) -> Colour {
    let mut ray = history - bounds.mean;
    let ray_max = bounds.max - bounds.mean;
    let ray_min = bounds.min - bounds.mean;
    let mut clipped = false;

    for i in 0..3 {
        if ray[i] > ray_max[i] + CLIP_EPSILON {
            ray *= ray_max[i] / ray[i];
            clipped = true;
        }
    }
    for i in 0..3 {
        if ray[i] < ray_min[i] - CLIP_EPSILON {
            ray *= ray_min[i] / ray[i];
            clipped = true;
        }
    }

    if clipped { bounds.mean + ray } else { history }
}
