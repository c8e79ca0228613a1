use nalgebra::Vector2;
use crate::buffer::{MotionSample, SampleBuffer};
use crate::config::DilationMode;

pub fn average_velocity(centre: impl IntoIterator<Item = MotionSample>) -> Vector2<f32> {
    let mut sum = Vector2::zeros();
    let mut count = 0usize;
    for sample in centre {
        sum += sample.velocity;
        count += 1;
    }

    if count == 0 { sum } else { sum / count as f32 }
}

/// Velocity of the nearest sample; the first one wins a tie.
pub fn nearest_depth_velocity(window: impl IntoIterator<Item = MotionSample>) -> Vector2<f32> {
    let mut best: Option<MotionSample> = None;
    for sample in window {
        match best {
            Some(current) if !(sample.depth < current.depth) => {}
            _ => best = Some(sample),
        }
    }

    best.map_or_else(Vector2::zeros, |sample| sample.velocity)
}

/// Longest velocity in the window; the first one wins a tie.
pub fn greatest_velocity(window: impl IntoIterator<Item = MotionSample>) -> Vector2<f32> {
    let mut best: Option<(f32, Vector2<f32>)> = None;
    for sample in window {
        let magnitude = sample.velocity.norm_squared();
        match best {
            Some((current, _)) if !(magnitude > current) => {}
            _ => best = Some((magnitude, sample.velocity)),
        }
    }

    best.map_or_else(Vector2::zeros, |(_, velocity)| velocity)
}

/// Velocity used to reproject pixel `(x, y)`, drawn from its 3x3
/// neighbourhood (all subsamples, scan order, edge-clamped).
pub fn dilate_velocity(samples: &SampleBuffer, x: usize, y: usize, mode: DilationMode) -> Vector2<f32> {
    let (x, y) = (x as i32, y as i32);
    let count = samples.sample_count();

    let window = (-1..=1).flat_map(move |dy| {
        (-1..=1).flat_map(move |dx| (0..count).map(move |sample| samples.motion(x + dx, y + dy, sample)))
    });

    match mode {
        DilationMode::CenterAverage => average_velocity((0..count).map(|sample| samples.motion(x, y, sample))),
        DilationMode::DilateNearestDepth => nearest_depth_velocity(window),
        DilationMode::DilateGreatestVelocity => greatest_velocity(window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use crate::config::MsaaMode;

    fn neighbourhood() -> SampleBuffer {
        let mut samples = SampleBuffer::new(3, 3, MsaaMode::None);
        samples.fill_with(|x, y| {
            let velocity = Vector2::new(x as f32 * 0.01, y as f32 * 0.01);
            (Vector3::zeros(), 0.5, velocity)
        });
        samples
    }

    #[test]
    fn nearest_depth_picks_the_closest_cell() {
        let mut samples = neighbourhood();
        samples.write(2, 0, 0, Vector3::zeros(), 0.1, Vector2::new(0.3, -0.7));

        let velocity = dilate_velocity(&samples, 1, 1, DilationMode::DilateNearestDepth);
        assert_eq!(velocity, Vector2::new(0.3, -0.7));
    }

    #[test]
    fn nearest_depth_tie_keeps_first() {
        let samples = neighbourhood();
        assert_eq!(dilate_velocity(&samples, 1, 1, DilationMode::DilateNearestDepth), Vector2::new(0.0, 0.0));
    }

    #[test]
    fn centre_average_uses_own_samples() {
        let mut samples = SampleBuffer::new(3, 3, MsaaMode::Msaa2x);
        samples.write(1, 1, 0, Vector3::zeros(), 0.5, Vector2::new(0.2, 0.0));
        samples.write(1, 1, 1, Vector3::zeros(), 0.5, Vector2::new(0.0, 0.4));
        samples.write(0, 0, 0, Vector3::zeros(), 0.0, Vector2::new(9.0, 9.0));

        let velocity = dilate_velocity(&samples, 1, 1, DilationMode::CenterAverage);
        assert!((velocity - Vector2::new(0.1, 0.2)).norm() < 1e-6);
    }

    #[test]
    fn greatest_velocity_picks_longest() {
        let mut samples = neighbourhood();
        samples.write(0, 2, 0, Vector3::zeros(), 0.9, Vector2::new(-1.0, 0.5));
        assert_eq!(dilate_velocity(&samples, 1, 1, DilationMode::DilateGreatestVelocity), Vector2::new(-1.0, 0.5));
    }

    #[test]
    fn window_clamps_at_the_border() {
        let mut samples = neighbourhood();
        samples.write(0, 0, 0, Vector3::zeros(), 0.05, Vector2::new(0.25, 0.25));
        assert_eq!(dilate_velocity(&samples, 0, 0, DilationMode::DilateNearestDepth), Vector2::new(0.25, 0.25));
    }
}
