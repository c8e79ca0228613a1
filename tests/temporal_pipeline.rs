use msaa_filter::config::{ClampMode, MsaaMode};
use msaa_filter::mesh::Mesh;
use msaa_filter::post_processor::PostProcessorOptions;
use msaa_filter::rasterizer::storage::Storage;
use msaa_filter::rasterizer::RasterOptions;
use msaa_filter::renderer::{CameraMatrices, DrawCall, Renderer, RendererOptions};
use msaa_filter::{ColourBuffer, ResolveConfiguration, ResolveError, SampleBuffer, TemporalResolver};
use nalgebra::{Matrix4, Vector2, Vector3};

const WIDTH: usize = 12;
const HEIGHT: usize = 8;

/// Hard-edged stripes that differ per subsample, so the resolve has work to do.
fn striped_samples(mode: MsaaMode, phase: usize, velocity: Vector2<f32>) -> SampleBuffer {
    let mut samples = SampleBuffer::new(WIDTH, HEIGHT, mode);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            for sample in 0..samples.sample_count() {
                let on = (x + y + sample + phase) % 3 == 0;
                let colour = if on { Vector3::new(4.0, 2.0, 0.5) } else { Vector3::new(0.05, 0.1, 0.2) };
                samples.write(x, y, sample, colour, 0.5, velocity);
            }
        }
    }
    samples
}

fn max_difference(a: &ColourBuffer, b: &ColourBuffer) -> f32 {
    a.pixels().iter().zip(b.pixels()).map(|(a, b)| (a - b).amax()).fold(0.0, f32::max)
}

/// Smooth ramps in every channel, so no window has a flat channel.
fn gradient_samples(mode: MsaaMode) -> SampleBuffer {
    let mut samples = SampleBuffer::new(WIDTH, HEIGHT, mode);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            for sample in 0..samples.sample_count() {
                let colour = Vector3::new(
                    0.3 * x as f32 + 0.01 * sample as f32,
                    0.2 * y as f32,
                    0.5 + 0.05 * (x + y) as f32,
                );
                samples.write(x, y, sample, colour, 0.5, Vector2::zeros());
            }
        }
    }
    samples
}

fn assert_converges(samples: &SampleBuffer, config: &ResolveConfiguration) {
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);
    for frame in 0..8 {
        resolver.resolve_frame(frame, samples, config).unwrap();
        let difference = max_difference(resolver.output(), resolver.spatial());
        assert!(difference < 1e-3, "{:?} frame {frame}: {difference}", config.neighborhood_clamp_mode);
    }
}

#[test]
fn static_scene_converges_to_the_spatial_resolve() {
    for mode in ClampMode::ALL {
        let config = ResolveConfiguration { neighborhood_clamp_mode: mode, ..Default::default() };
        assert_converges(&gradient_samples(MsaaMode::Msaa4x), &config);
    }

    let config = ResolveConfiguration { neighborhood_clamp_mode: ClampMode::RgbClip, ..Default::default() };
    assert_converges(&striped_samples(MsaaMode::Msaa8x, 0, Vector2::zeros()), &config);
}

#[test]
fn single_sample_standard_resolve_is_a_copy() {
    let config = ResolveConfiguration {
        msaa_mode: MsaaMode::None,
        use_standard_resolve: true,
        ..Default::default()
    };
    let samples = striped_samples(MsaaMode::None, 1, Vector2::zeros());
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);

    for frame in 0..3 {
        let output = resolver.resolve_frame(frame, &samples, &config).unwrap();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                assert_eq!(output.get(x, y), samples.colour(x as i32, y as i32, 0));
            }
        }
    }
}

#[test]
fn zero_blend_factor_shows_only_the_current_frame() {
    let config = ResolveConfiguration { temporal_aa_blend_factor: 0.0, ..Default::default() };
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);

    resolver.resolve_frame(0, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config).unwrap();
    resolver.resolve_frame(1, &striped_samples(MsaaMode::Msaa4x, 1, Vector2::zeros()), &config).unwrap();

    assert_eq!(resolver.output(), resolver.spatial());
}

#[test]
fn full_blend_without_clamp_holds_history() {
    let config = ResolveConfiguration {
        temporal_aa_blend_factor: 1.0,
        neighborhood_clamp_mode: ClampMode::Disabled,
        use_standard_reprojection: true,
        ..Default::default()
    };
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);

    resolver.resolve_frame(0, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config).unwrap();
    let first = resolver.output().clone();
    resolver.resolve_frame(1, &striped_samples(MsaaMode::Msaa4x, 2, Vector2::zeros()), &config).unwrap();

    assert!(max_difference(resolver.output(), &first) < 1e-4);
    assert!(max_difference(resolver.spatial(), &first) > 0.1);
}

#[test]
fn off_screen_reprojection_drops_history() {
    let config = ResolveConfiguration::default();
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);

    resolver.resolve_frame(0, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config).unwrap();
    // Every pixel claims to have come from far to the left of the screen.
    resolver.resolve_frame(1, &striped_samples(MsaaMode::Msaa4x, 1, Vector2::new(2.0, 0.0)), &config).unwrap();

    assert_eq!(resolver.output(), resolver.spatial());
}

#[test]
fn reset_history_restarts_accumulation() {
    let config = ResolveConfiguration::default();
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);

    resolver.resolve_frame(0, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config).unwrap();
    resolver.reset_history();
    assert!(!resolver.has_history());

    resolver.resolve_frame(1, &striped_samples(MsaaMode::Msaa4x, 1, Vector2::zeros()), &config).unwrap();
    assert_eq!(resolver.output(), resolver.spatial());
}

#[test]
fn sharpening_leaves_the_resolved_image_untouched() {
    let config = ResolveConfiguration { sharpening_amount: 0.5, ..Default::default() };
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);

    resolver.resolve_frame(0, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config).unwrap();

    assert_eq!(resolver.output(), resolver.spatial());
}

#[test]
fn whole_pixel_motion_lines_history_up() {
    let config = ResolveConfiguration {
        temporal_aa_blend_factor: 1.0,
        neighborhood_clamp_mode: ClampMode::Disabled,
        ..Default::default()
    };
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);
    resolver.resolve_frame(0, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config).unwrap();

    // Phase 2 is phase 0 moved one pixel to the right.
    let velocity = Vector2::new(1.0 / WIDTH as f32, 0.0);
    resolver.resolve_frame(1, &striped_samples(MsaaMode::Msaa4x, 2, velocity), &config).unwrap();

    // The leftmost column came from off screen. The columns next to either
    // border saw a different edge clamp last frame.
    for y in 0..HEIGHT {
        for x in 2..WIDTH - 1 {
            let difference = (resolver.output().get(x, y) - resolver.spatial().get(x, y)).amax();
            assert!(difference < 1e-4, "({x}, {y}): {difference}");
        }
        assert_eq!(resolver.output().get(0, y), resolver.spatial().get(0, y));
    }
}

#[test]
fn sub_pixel_motion_interpolates_history() {
    let config = ResolveConfiguration {
        temporal_aa_blend_factor: 1.0,
        neighborhood_clamp_mode: ClampMode::Disabled,
        inverse_luminance_filtering: false,
        ..Default::default()
    };
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);
    let samples = gradient_samples(MsaaMode::Msaa4x);
    resolver.resolve_frame(0, &samples, &config).unwrap();
    let previous = resolver.output().clone();

    // 0.3 pixels to the right: each pixel now reads history from the left
    // half of a texel.
    let mut moved = samples.clone();
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            for sample in 0..moved.sample_count() {
                moved.set_velocity(x, y, sample, Vector2::new(0.3 / WIDTH as f32, 0.0));
            }
        }
    }
    resolver.resolve_frame(1, &moved, &config).unwrap();

    // Columns whose filter taps all see the ramp, not the clamped border.
    for y in 0..HEIGHT {
        for x in 3..WIDTH - 2 {
            let expected = previous.get(x - 1, y) * 0.3 + previous.get(x, y) * 0.7;
            let difference = (resolver.output().get(x, y) - expected).amax();
            assert!(difference < 1e-4, "({x}, {y}): {difference}");
        }
    }
}

#[test]
fn empty_images_resolve_to_nothing() {
    let config = ResolveConfiguration::default();
    let mut resolver = TemporalResolver::new(0, 0);
    let empty = SampleBuffer::new(0, 0, MsaaMode::Msaa4x);

    assert!(resolver.resolve_frame(0, &empty, &config).unwrap().pixels().is_empty());
    assert!(resolver.resolve_frame(1, &empty, &config).is_ok());

    resolver.resize(WIDTH, 0);
    let flat = SampleBuffer::new(WIDTH, 0, MsaaMode::Msaa4x);
    assert!(resolver.resolve_frame(2, &flat, &config).is_ok());
}

#[test]
fn frames_must_move_forward() {
    let config = ResolveConfiguration::default();
    let samples = striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros());
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);

    resolver.resolve_frame(10, &samples, &config).unwrap();
    let err = resolver.resolve_frame(9, &samples, &config).unwrap_err();
    assert_eq!(err, ResolveError::FrameOrder { frame_index: 9, last_committed: 10 });
    assert!(resolver.resolve_frame(11, &samples, &config).is_ok());
}

#[test]
fn resize_requires_matching_samples() {
    let config = ResolveConfiguration::default();
    let mut resolver = TemporalResolver::new(WIDTH, HEIGHT);
    resolver.resolve_frame(0, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config).unwrap();

    resolver.resize(WIDTH * 2, HEIGHT);
    assert!(!resolver.has_history());
    assert!(matches!(
        resolver.resolve_frame(1, &striped_samples(MsaaMode::Msaa4x, 0, Vector2::zeros()), &config),
        Err(ResolveError::Dimensions { width, height, got_width, got_height })
            if (width, height, got_width, got_height) == (WIDTH * 2, HEIGHT, WIDTH, HEIGHT)
    ));

    let wide = SampleBuffer::new(WIDTH * 2, HEIGHT, MsaaMode::Msaa4x);
    assert!(resolver.resolve_frame(2, &wide, &config).is_ok());
}

#[test]
fn renderer_draws_a_lit_scene() {
    let config = ResolveConfiguration::default();
    let mut renderer = Renderer::new(32, 24, &config, RendererOptions {
        raster_options: RasterOptions { cull_backfaces: true, background_colour: Vector3::new(1.0, 1.0, 1.0) },
        post_processor_options: PostProcessorOptions::default(),
    });

    let texture = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
    let storage = renderer.storage_mut();
    storage.set_texture2ds(vec![texture.into()]);
    storage.set_vec3(Storage::LIGHT_DIRECTION, Vector3::new(0.0, 0.0, -1.0));
    storage.set_vec3(Storage::LIGHT_COLOUR, Vector3::new(8.0, 8.0, 8.0));
    storage.set_vec3(Storage::AMBIENT, Vector3::zeros());

    let camera = CameraMatrices {
        view: Matrix4::new_translation(&Vector3::new(0.0, 0.0, -3.0)),
        view_rotation: Matrix4::identity(),
        projection: Matrix4::new_perspective(32.0 / 24.0, 1.0, 0.1, 50.0),
    };
    let cube = Mesh::cube();
    let draws = [DrawCall {
        mesh: &cube,
        model: Matrix4::identity(),
        previous_model: Matrix4::identity(),
        albedo: Vector3::new(1.0, 0.0, 0.0),
    }];

    let mut buffer = vec![0; 32 * 24];
    for _ in 0..4 {
        renderer.render(&camera, &draws, &config, &mut buffer).unwrap();
    }
    assert_eq!(renderer.frame_index(), 4);

    // The cube's front face fills the centre; the corner shows the background.
    let centre = renderer.output().get(16, 12);
    assert!(centre.x > 1.0 && centre.y < 1e-3 && centre.z < 1e-3, "{centre:?}");
    assert!((renderer.output().get(0, 0) - Vector3::new(1.0, 1.0, 1.0)).norm() < 1e-3);
    assert_eq!(buffer[12 * 32 + 16] & 0xFFFF, 0);
    assert!(buffer[12 * 32 + 16] >> 16 > 0);
}

#[test]
fn renderer_rejects_bad_settings_before_drawing() {
    let config = ResolveConfiguration { resolve_filter_diameter: 0.25, ..Default::default() };
    let mut renderer = Renderer::new(4, 4, &ResolveConfiguration::default(), RendererOptions {
        raster_options: RasterOptions { cull_backfaces: true, background_colour: Vector3::zeros() },
        post_processor_options: PostProcessorOptions::default(),
    });

    let camera = CameraMatrices {
        view: Matrix4::identity(),
        view_rotation: Matrix4::identity(),
        projection: Matrix4::identity(),
    };
    let mut buffer = vec![0; 16];
    assert!(matches!(renderer.render(&camera, &[], &config, &mut buffer), Err(ResolveError::Config(_))));
    assert_eq!(renderer.frame_index(), 0);
}
