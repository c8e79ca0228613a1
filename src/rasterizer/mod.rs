//! MSAA scene rasterizer producing per-subsample colour, depth and velocity.
//!
//! Coverage and depth are evaluated at every subsample; the fragment shader
//! runs once per pixel and triangle, at the first covered subsample, and its
//! result is broadcast to all covered subsamples.

use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use crate::buffer::{SampleBuffer, DEPTH_CLEAR};
use crate::colour::Colour;
use crate::config::MsaaMode;
use crate::mesh::{Face, Mesh};
use crate::rasterizer::bounding_box::BoundingBox;
use crate::rasterizer::storage::Storage;
use crate::shader::{FragmentShaderInputVariables, Shader, VertexShaderInputVariables, VertexShaderOutputVariables};

pub mod texture2d;
mod bounding_box;
pub mod storage;

pub struct RasterOptions {
    pub cull_backfaces: bool,
    pub background_colour: Colour,
}

pub struct Rasterizer {
    width: usize,
    height: usize,
    samples: SampleBuffer,
    storage: Storage,
    viewport: Matrix4<f32>,
    options: RasterOptions,
    /// Half the jitter delta since last frame, in pixels.
    jitter_offset: Vector2<f32>,
    mip_bias: f32,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize, msaa_mode: MsaaMode, options: RasterOptions) -> Self {
        let viewport = Self::build_viewport_matrix((0.0, 0.0), width as f32, height as f32);

        let mut samples = SampleBuffer::new(width, height, msaa_mode);
        samples.clear(options.background_colour);

        Self {
            width,
            height,
            samples,
            storage: Storage::default(),
            viewport,
            options,
            jitter_offset: Vector2::zeros(),
            mip_bias: 0.0,
        }
    }

    fn build_viewport_matrix(margin: (f32, f32), width: f32, height: f32) -> Matrix4<f32> {
        Matrix4::new(
            width / 2.0, 0.0,           0.0, margin.0 + width / 2.0,
            0.0,       -height / 2.0, 0.0, margin.1 + height / 2.0,
            0.0,       0.0 ,         1.0, 0.0,
            0.0 ,      0.0,          0.0, 1.0
        )
    }

    pub fn set_msaa_mode(&mut self, msaa_mode: MsaaMode) {
        if self.samples.mode() == msaa_mode { return }

        self.samples = SampleBuffer::new(self.width, self.height, msaa_mode);
        self.samples.clear(self.options.background_colour);
    }

    /// Per-frame inputs that are not shader uniforms.
    pub fn begin_frame(&mut self, jitter_offset: Vector2<f32>, mip_bias: f32) {
        self.jitter_offset = jitter_offset;
        self.mip_bias = mip_bias;
    }

    pub fn clear(&mut self) {
        self.samples.clear(self.options.background_colour);
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    fn calculate_barycentric_coordinates2(
        vertex_positions: &[Vector2<f32>; 3],
        area: f32,
        pixel: Vector2<f32>,
    ) -> Vector3<f32> {
        let [a, b, c] = vertex_positions;

        let alpha = (
            (b.x - pixel.x) * (c.y - pixel.y) -
                (c.x - pixel.x) * (b.y - pixel.y)
        ) / area;

        let beta = (
            (c.x - pixel.x) * (a.y - pixel.y) -
                (a.x - pixel.x) * (c.y - pixel.y)
        ) / area;

        let gamma = 1.0 - alpha - beta;

        Vector3::new(alpha, beta, gamma)
    }

    /// Twice the signed area; negative for triangles wound counter-clockwise in NDC.
    fn signed_area(vertex_positions: &[Vector2<f32>; 3]) -> f32 {
        let [a, b, c] = vertex_positions;
        (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
    }

    /// Perspective-correct weights from screen-space barycentrics.
    fn perspective_correct(bary_coords: Vector3<f32>, inverse_w: &Vector3<f32>) -> Vector3<f32> {
        let bary_clip = bary_coords.component_mul(inverse_w);
        bary_clip / (bary_clip.x + bary_clip.y + bary_clip.z)
    }

    /// Triangles entirely outside one clip plane, or crossing the camera plane
    /// (there is no clipper), are dropped.
    fn triangle_outside_screen(vertex_positions: &[Vector4<f32>; 3]) -> bool {
        if vertex_positions.iter().any(|v| v.w <= 0.0) {
            return true;
        }

        let outside = |test: fn(&Vector4<f32>) -> bool| vertex_positions.iter().all(test);
        outside(|v| v.x < -v.w) || outside(|v| v.x > v.w)
            || outside(|v| v.y < -v.w) || outside(|v| v.y > v.w)
            || outside(|v| v.z < -v.w) || outside(|v| v.z > v.w)
    }

    fn draw_triangle(&mut self, vertex_positions: [Vector4<f32>; 3], vertex_outputs: &[VertexShaderOutputVariables; 3], shader: &impl Shader) {
        if Self::triangle_outside_screen(&vertex_positions) { return }

        let screen_coords_pre_perspective = vertex_positions.map(|v| self.viewport * v);
        let screen_coords_2d = screen_coords_pre_perspective.map(|v| v.xy() / v.w);

        let area = Self::signed_area(&screen_coords_2d);
        if area.abs() <= f32::EPSILON || !area.is_finite() { return }
        if self.options.cull_backfaces && area > 0.0 { return }

        let Some(bounding_box) = BoundingBox::calculate(screen_coords_2d, self.width, self.height) else { return };

        let inverse_w = Vector3::new(
            1.0 / vertex_positions[0].w,
            1.0 / vertex_positions[1].w,
            1.0 / vertex_positions[2].w,
        );
        // NDC depth mapped from [-1, 1] to [0, 1]; linear in screen space.
        let depths = Vector3::new(
            vertex_positions[0].z * inverse_w.x * 0.5 + 0.5,
            vertex_positions[1].z * inverse_w.y * 0.5 + 0.5,
            vertex_positions[2].z * inverse_w.z * 0.5 + 0.5,
        );

        let sample_count = self.samples.sample_count();
        let mut sample_depths = [0.0; 8];

        for y in bounding_box.y_iter() {
            for x in bounding_box.x_iter() {
                let centre = Vector2::new(x as f32 + 0.5, y as f32 + 0.5);
                let mut coverage = 0u32;
                let mut shading_point = None;

                for sample in 0..sample_count {
                    let position = centre + self.samples.sample_position(sample);
                    let bary_coords = Self::calculate_barycentric_coordinates2(&screen_coords_2d, area, position);
                    if (bary_coords.x < 0.0) || (bary_coords.y < 0.0) || (bary_coords.z < 0.0) { continue; }

                    let depth = bary_coords.dot(&depths);
                    if !(depth >= 0.0 && depth < self.samples.depth(x as i32, y as i32, sample)) { continue; }

                    coverage |= 1 << sample;
                    sample_depths[sample] = depth;
                    shading_point.get_or_insert((position, bary_coords));
                }

                let Some((position, bary_coords)) = shading_point else { continue };

                let bary_dx = Self::calculate_barycentric_coordinates2(&screen_coords_2d, area, position + Vector2::new(1.0, 0.0));
                let bary_dy = Self::calculate_barycentric_coordinates2(&screen_coords_2d, area, position + Vector2::new(0.0, 1.0));

                let input_vars = FragmentShaderInputVariables::new(
                    vertex_outputs,
                    Self::perspective_correct(bary_coords, &inverse_w),
                    Self::perspective_correct(bary_dx, &inverse_w),
                    Self::perspective_correct(bary_dy, &inverse_w),
                    self.mip_bias,
                    &self.storage,
                );
                let previous_position = input_vars.get_previous_position();
                let Some(colour) = shader.fragment(input_vars) else { continue };

                let velocity = self.velocity(position, previous_position);

                for sample in 0..sample_count {
                    if coverage & (1 << sample) != 0 {
                        self.samples.write(x, y, sample, colour, sample_depths[sample], velocity);
                    }
                }
            }
        }
    }

    fn size(&self) -> Vector2<f32> {
        Vector2::new(self.width as f32, self.height as f32)
    }

    /// `uv_now - uv_previous` for a point now at pixel `position`, with the
    /// jitter change removed.
    fn velocity(&self, position: Vector2<f32>, previous_position: Vector4<f32>) -> Vector2<f32> {
        let size = self.size();
        let previous_ndc = previous_position.xy() / previous_position.w;
        let previous_uv = Vector2::new(previous_ndc.x * 0.5 + 0.5, 0.5 - previous_ndc.y * 0.5);

        position.component_div(&size) - previous_uv - self.jitter_offset.component_div(&size)
    }

    /// Gives samples no geometry touched the velocity of an infinitely distant
    /// background. Both matrices should carry the camera rotation only.
    pub fn fill_background_velocity(&mut self, inverse_view_projection: &Matrix4<f32>, previous_view_projection: &Matrix4<f32>) {
        let size = self.size();

        for y in 0..self.height {
            for x in 0..self.width {
                let centre = Vector2::new(x as f32 + 0.5, y as f32 + 0.5);
                for sample in 0..self.samples.sample_count() {
                    if self.samples.depth(x as i32, y as i32, sample) < DEPTH_CLEAR { continue; }

                    let position = centre + self.samples.sample_position(sample);
                    let uv = position.component_div(&size);
                    let far = Vector4::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 1.0, 1.0);

                    let direction = inverse_view_projection * far;
                    let previous_position = previous_view_projection * direction;

                    let velocity = self.velocity(position, previous_position);
                    self.samples.set_velocity(x, y, sample, velocity);
                }
            }
        }
    }

    pub fn draw_mesh(&mut self, mesh: &Mesh, shader: &impl Shader) {
        let faces = mesh.faces.iter().map(|face| {
            let vertex_outputs = self.run_vertex_shader(face, shader);
            let vertex_positions = [
                vertex_outputs[0].position,
                vertex_outputs[1].position,
                vertex_outputs[2].position,
            ];

            (vertex_positions, vertex_outputs)
        }).collect::<Vec<_>>();

        for (vertex_positions, vertex_outputs) in faces {
            self.draw_triangle(vertex_positions, &vertex_outputs, shader);
        }
    }

    fn run_vertex_shader(&self, face: &Face, shader: &impl Shader) -> [VertexShaderOutputVariables; 3] {
        face.vertices.map(|vertex| {
            shader.vertex(VertexShaderInputVariables {
                position: vertex.position,
                texture_coords: vertex.texture_coords,
                normal: vertex.normals,
                storage: &self.storage,
            })
        })
    }
}
