use std::path::Path;
use std::time::Instant;
use image::ImageResult;
use log::{debug, warn};
use nalgebra::{Matrix4, Vector3};
use crate::buffer::ColourBuffer;
use crate::config::ResolveConfiguration;
use crate::error::ResolveResult;
use crate::jitter::{jitter_projection, FrameJitter, JitterTracker};
use crate::mesh::Mesh;
use crate::post_processor::{save_screenshot, PostProcessor, PostProcessorOptions};
use crate::rasterizer::storage::Storage;
use crate::rasterizer::{RasterOptions, Rasterizer};
use crate::shader::SceneShader;
use crate::temporal::TemporalResolver;

pub struct RendererOptions {
    pub raster_options: RasterOptions,
    pub post_processor_options: PostProcessorOptions,
}

/// Camera transforms for one frame, before jitter.
pub struct CameraMatrices {
    pub view: Matrix4<f32>,
    /// The view with its translation removed, for the background.
    pub view_rotation: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub model: Matrix4<f32>,
    pub previous_model: Matrix4<f32>,
    pub albedo: Vector3<f32>,
}

/// Last frame's jittered transforms, the reference for velocity.
#[derive(Copy, Clone)]
struct PreviousFrame {
    view_projection: Matrix4<f32>,
    rotation_view_projection: Matrix4<f32>,
}

pub struct Renderer {
    width: usize,
    height: usize,
    rasterizer: Rasterizer,
    resolver: TemporalResolver,
    post_processor: PostProcessor,
    jitter: JitterTracker,
    frame_index: u64,
    previous_frame: Option<PreviousFrame>,
}

impl Renderer {
    pub fn new(width: usize, height: usize, config: &ResolveConfiguration, options: RendererOptions) -> Self {
        Self {
            width,
            height,
            rasterizer: Rasterizer::new(width, height, config.msaa_mode, options.raster_options),
            resolver: TemporalResolver::new(width, height),
            post_processor: PostProcessor::new(width, height, options.post_processor_options),
            jitter: JitterTracker::new(),
            frame_index: 0,
            previous_frame: None,
        }
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        self.rasterizer.storage_mut()
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn output(&self) -> &ColourBuffer {
        self.resolver.output()
    }

    /// Drops temporal history; the next frame starts accumulating afresh.
    pub fn reset_history(&mut self) {
        self.resolver.reset_history();
        self.jitter.reset();
        self.previous_frame = None;
    }

    pub fn render(
        &mut self,
        camera: &CameraMatrices,
        draws: &[DrawCall],
        config: &ResolveConfiguration,
        buffer: &mut [u32],
    ) -> ResolveResult<()> {
        config.validate()?;

        let now = Instant::now();
        let frame_jitter = self.jitter.advance(self.frame_index, config);
        self.rasterize(camera, draws, config, frame_jitter);
        debug!("Rasterization took {} ns", now.elapsed().as_nanos());

        let now = Instant::now();
        self.resolver.resolve_frame(self.frame_index, self.rasterizer.samples(), config)?;
        debug!("Resolve took {} ns", now.elapsed().as_nanos());

        let now = Instant::now();
        let options = self.post_processor.options_mut();
        options.manual_exposure = config.manual_exposure;
        options.sharpening_amount = config.display_sharpening();
        self.post_processor.process(self.resolver.output(), buffer);
        debug!("Post processing took {} ns", now.elapsed().as_nanos());

        self.frame_index += 1;
        Ok(())
    }

    fn rasterize(&mut self, camera: &CameraMatrices, draws: &[DrawCall], config: &ResolveConfiguration, frame_jitter: FrameJitter) {
        let projection = jitter_projection(&camera.projection, frame_jitter.jitter, self.width, self.height);
        let current = PreviousFrame {
            view_projection: projection * camera.view,
            rotation_view_projection: projection * camera.view_rotation,
        };
        let previous = self.previous_frame.take().unwrap_or(current);

        self.rasterizer.set_msaa_mode(config.msaa_mode);
        self.rasterizer.begin_frame(frame_jitter.offset, config.mip_bias);
        self.rasterizer.clear();

        let storage = self.rasterizer.storage_mut();
        storage.set_mat4(Storage::VIEW_PROJECTION, current.view_projection);
        storage.set_mat4(Storage::PREVIOUS_VIEW_PROJECTION, previous.view_projection);

        for draw in draws {
            let storage = self.rasterizer.storage_mut();
            storage.set_mat4(Storage::MODEL, draw.model);
            storage.set_mat4(Storage::PREVIOUS_MODEL, draw.previous_model);
            storage.set_vec3(Storage::ALBEDO, draw.albedo);
            self.rasterizer.draw_mesh(draw.mesh, &SceneShader);
        }

        match current.rotation_view_projection.try_inverse() {
            Some(inverse) => self.rasterizer.fill_background_velocity(&inverse, &previous.rotation_view_projection),
            None => warn!("Camera projection is not invertible, background velocity left at zero"),
        }

        self.previous_frame = Some(current);
    }

    pub fn save_screenshot(&self, exposure: f32, path: impl AsRef<Path>) -> ImageResult<()> {
        save_screenshot(self.resolver.output(), exposure, path)
    }
}
