use nalgebra::Vector2;
use std::ops::RangeInclusive;

/// Pixels whose area a screen-space triangle can touch, clipped to the target.
pub struct BoundingBox {
    min: Vector2<usize>,
    max: Vector2<usize>,
}

impl BoundingBox {
    pub fn calculate(vertex_positions: [Vector2<f32>; 3], width: usize, height: usize) -> Option<Self> {
        let mut min = Vector2::repeat(f32::INFINITY);
        let mut max = Vector2::repeat(f32::NEG_INFINITY);

        for vertex in &vertex_positions {
            min = min.inf(vertex);
            max = max.sup(vertex);
        }

        if !(min.x < width as f32 && min.y < height as f32 && max.x >= 0.0 && max.y >= 0.0) {
            return None;
        }

        let clamp = Vector2::new(width as f32 - 1.0, height as f32 - 1.0);
        Some(Self {
            min: Vector2::new(min.x.floor().max(0.0) as usize, min.y.floor().max(0.0) as usize),
            max: Vector2::new(max.x.floor().min(clamp.x) as usize, max.y.floor().min(clamp.y) as usize),
        })
    }

    pub fn x_iter(&self) -> RangeInclusive<usize> {
        self.min.x..=self.max.x
    }

    pub fn y_iter(&self) -> RangeInclusive<usize> {
        self.min.y..=self.max.y
    }
}
