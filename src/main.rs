use log::{debug, error, info, warn};
use minifb::{Key, KeyRepeat};
use msaa_filter::config::{cycle, ClampMode, DilationMode, FilterType, JitterMode, MsaaMode, ResolveConfiguration};
use msaa_filter::mesh::Mesh;
use msaa_filter::post_processor::PostProcessorOptions;
use msaa_filter::rasterizer::storage::Storage;
use msaa_filter::rasterizer::RasterOptions;
use msaa_filter::renderer::{CameraMatrices, DrawCall, Renderer, RendererOptions};
use nalgebra::{Matrix4, Point3, Rotation3, Translation3, Vector3};
use std::time::Instant;

/// High-frequency checkerboard; the worst case for aliasing under motion.
fn checker_texture(size: u32, squares: u32) -> image::RgbaImage {
    let square = size / squares;
    image::RgbaImage::from_fn(size, size, |x, y| {
        if (x / square + y / square) % 2 == 0 {
            image::Rgba([230, 230, 230, 255])
        } else {
            image::Rgba([25, 25, 25, 255])
        }
    })
}

struct PerspectiveCamera {
    position: Point3<f32>,
    rotation: Vector3<f32>,
    view: Matrix4<f32>,
    view_rotation: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    fn new(position: Point3<f32>, rotation: Vector3<f32>, fov: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let mut camera = Self {
            position,
            rotation,
            view: Matrix4::identity(),
            view_rotation: Matrix4::identity(),
            projection: Self::perspective_projection(fov, aspect, z_near, z_far),
        };
        camera.update_view();
        camera
    }

    fn perspective_projection(fovy: f32, aspect: f32, z_near: f32, z_far: f32) -> Matrix4<f32> {
        let m11 = 1.0 / (aspect * (fovy/2.0).tan());
        let m22 = 1.0 / (fovy/2.0).tan();
        let m33 = -(z_far + z_near) / (z_far - z_near);
        let m34 = -(2.0 * z_far * z_near) / (z_far - z_near);

        Matrix4::new(
            m11, 0.0, 0.0, 0.0,
            0.0, m22, 0.0, 0.0,
            0.0, 0.0, m33, m34,
            0.0, 0.0, -1.0, 0.0,
        )
    }

    fn update_view(&mut self) {
        let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), self.rotation.z);
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), self.rotation.x);
        let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotation.y);

        let rotate = roll * pitch * yaw;

        let translate = Translation3::from(-self.position.coords);

        self.view_rotation = Matrix4::from(rotate);
        self.view = self.view_rotation * Matrix4::from(translate);
    }

    fn matrices(&self) -> CameraMatrices {
        CameraMatrices {
            view: self.view,
            view_rotation: self.view_rotation,
            projection: self.projection,
        }
    }
}

/// Applies `change` to a copy of `config` and keeps it only if it validates.
fn try_update(config: &mut ResolveConfiguration, change: impl FnOnce(&mut ResolveConfiguration)) {
    let mut candidate = config.clone();
    change(&mut candidate);

    match candidate.validate() {
        Ok(()) => *config = candidate,
        Err(err) => warn!("Rejected setting change: {err}"),
    }
}

fn handle_settings_keys(window: &minifb::Window, config: &mut ResolveConfiguration) {
    let pressed = |key| window.is_key_pressed(key, KeyRepeat::No);

    if pressed(Key::T) {
        try_update(config, |c| c.enable_temporal_aa = !c.enable_temporal_aa);
        info!("Temporal AA: {}", config.enable_temporal_aa);
    }
    if pressed(Key::R) {
        try_update(config, |c| c.use_standard_resolve = !c.use_standard_resolve);
        info!("Standard resolve: {}", config.use_standard_resolve);
    }
    if pressed(Key::F) {
        try_update(config, |c| c.resolve_filter_type = cycle(&FilterType::ALL, c.resolve_filter_type));
        info!("Resolve filter: {:?}", config.resolve_filter_type);
    }
    if pressed(Key::G) {
        try_update(config, |c| c.reprojection_filter = cycle(&FilterType::ALL, c.reprojection_filter));
        info!("Reprojection filter: {:?}", config.reprojection_filter);
    }
    if pressed(Key::C) {
        try_update(config, |c| c.neighborhood_clamp_mode = cycle(&ClampMode::ALL, c.neighborhood_clamp_mode));
        info!("Neighborhood clamp: {:?}", config.neighborhood_clamp_mode);
    }
    if pressed(Key::J) {
        try_update(config, |c| c.jitter_mode = cycle(&JitterMode::ALL, c.jitter_mode));
        info!("Jitter: {:?}", config.jitter_mode);
    }
    if pressed(Key::V) {
        try_update(config, |c| c.dilation_mode = cycle(&DilationMode::ALL, c.dilation_mode));
        info!("Dilation: {:?}", config.dilation_mode);
    }
    if pressed(Key::M) {
        try_update(config, |c| c.msaa_mode = cycle(&MsaaMode::ALL, c.msaa_mode));
        info!("MSAA: {:?}", config.msaa_mode);
    }
}

fn main() {
    env_logger::init();

    const WIDTH: usize = 640;
    const HEIGHT: usize = 360;

    let mut config = ResolveConfiguration::default();

    let mut buffer = vec![0; WIDTH * HEIGHT];
    let mut renderer = Renderer::new(WIDTH, HEIGHT, &config, RendererOptions {
        raster_options: RasterOptions {
            cull_backfaces: true,
            background_colour: Vector3::new(4.0, 6.0, 9.0),
        },
        post_processor_options: PostProcessorOptions::default(),
    });

    let storage = renderer.storage_mut();
    storage.set_texture2ds(vec![checker_texture(256, 16).into()]);
    storage.set_vec3(Storage::LIGHT_DIRECTION, Vector3::new(-0.4, -1.0, -0.3).normalize());
    storage.set_vec3(Storage::LIGHT_COLOUR, Vector3::new(16.0, 15.0, 13.0));
    storage.set_vec3(Storage::AMBIENT, Vector3::new(1.5, 1.8, 2.4));

    let fovy = 60.0 * (std::f32::consts::PI / 180.0); // 60 degrees fov y
    let aspect_ratio = WIDTH as f32 / HEIGHT as f32;
    let near = 0.1;
    let far = 100.0;

    let mut camera = PerspectiveCamera::new(
        Point3::new(0.0, 1.5, 4.0),
        Vector3::new(0.2, 0.0, 0.0),
        fovy,
        aspect_ratio,
        near,
        far,
    );

    let ground = Mesh::plane(20.0, 20.0);
    let cube = Mesh::cube();
    let ground_model = Matrix4::identity();
    let cube_model = |time: f32| {
        Matrix4::new_translation(&Vector3::new(0.0, 0.75, 0.0))
            * Matrix4::from(Rotation3::from_axis_angle(&Vector3::y_axis(), time * 0.8))
            * Matrix4::new_scaling(1.2)
    };

    let mut window = match minifb::Window::new("MSAA Filter", WIDTH, HEIGHT, minifb::WindowOptions::default()) {
        Ok(window) => window,
        Err(err) => {
            error!("Unable to open window: {err}");
            return;
        }
    };
    window.set_target_fps(60);

    let start = Instant::now();
    let mut previous_time = 0.0;
    let mut now = Instant::now();
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let movement_speed = 0.05;
        let rotation_speed = 0.02;

        let yaw = camera.rotation.y;
        if window.is_key_down(Key::W) {
            camera.position.x += movement_speed * yaw.sin();
            camera.position.z -= movement_speed * yaw.cos();
        }
        if window.is_key_down(Key::S) {
            camera.position.x -= movement_speed * yaw.sin();
            camera.position.z += movement_speed * yaw.cos();
        }
        if window.is_key_down(Key::A) {
            camera.position.x -= movement_speed * yaw.cos();
            camera.position.z -= movement_speed * yaw.sin();
        }
        if window.is_key_down(Key::D) {
            camera.position.x += movement_speed * yaw.cos();
            camera.position.z += movement_speed * yaw.sin();
        }

        if window.is_key_down(Key::Left) {
            camera.rotation.y -= rotation_speed;
        }
        if window.is_key_down(Key::Right) {
            camera.rotation.y += rotation_speed;
        }
        if window.is_key_down(Key::Up) {
            camera.rotation.x -= rotation_speed;
        }
        if window.is_key_down(Key::Down) {
            camera.rotation.x += rotation_speed;
        }

        handle_settings_keys(&window, &mut config);
        if window.is_key_pressed(Key::H, KeyRepeat::No) {
            renderer.reset_history();
            info!("History reset");
        }
        camera.update_view();

        let time = start.elapsed().as_secs_f32();
        let draws = [
            DrawCall { mesh: &ground, model: ground_model, previous_model: ground_model, albedo: Vector3::new(1.0, 1.0, 1.0) },
            DrawCall { mesh: &cube, model: cube_model(time), previous_model: cube_model(previous_time), albedo: Vector3::new(1.0, 0.35, 0.2) },
        ];
        previous_time = time;

        if let Err(err) = renderer.render(&camera.matrices(), &draws, &config, &mut buffer) {
            error!("Frame {} failed: {err}", renderer.frame_index());
        }

        if window.is_key_pressed(Key::P, KeyRepeat::No) {
            if let Err(err) = renderer.save_screenshot(config.manual_exposure, "screenshot.png") {
                error!("Unable to save screenshot: {err}");
            }
        }

        if let Err(err) = window.update_with_buffer(&buffer, WIDTH, HEIGHT) {
            error!("Unable to present frame: {err}");
            break;
        }
        debug!("{:?} fps", 1.0 / now.elapsed().as_secs_f64());
        now = Instant::now();
    }
}
