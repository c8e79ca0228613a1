use crate::rasterizer::storage::Storage;
use nalgebra::{Vector2, Vector3, Vector4};

pub trait Shader : Send + Sync {
    fn vertex(&self, input_vars: VertexShaderInputVariables) -> VertexShaderOutputVariables;
    fn fragment(&self, input_vars: FragmentShaderInputVariables) -> Option<Vector3<f32>>;
}

/// Textured, directionally lit geometry. The model transform of the current
/// and previous frame come from storage so moving objects get real velocity.
pub struct SceneShader;

impl Shader for SceneShader {
    fn vertex(&self, input_vars: VertexShaderInputVariables) -> VertexShaderOutputVariables {
        let storage = input_vars.storage;
        let model = storage.get_mat4(Storage::MODEL);
        let previous_model = storage.get_mat4(Storage::PREVIOUS_MODEL);

        let position = storage.get_mat4(Storage::VIEW_PROJECTION) * model * input_vars.position;
        let previous_position = storage.get_mat4(Storage::PREVIOUS_VIEW_PROJECTION) * previous_model * input_vars.position;
        let normal = (model * input_vars.normal.push(0.0)).xyz();

        VertexShaderOutputVariables {
            position,
            previous_position,
            vec2: vec![input_vars.texture_coords.xy()],
            vec3: vec![normal],
        }
    }

    fn fragment(&self, input_vars: FragmentShaderInputVariables) -> Option<Vector3<f32>> {
        let storage = input_vars.storage;
        let uvs = input_vars.get_input_vec2(0);
        let (ddx, ddy) = input_vars.get_input_vec2_gradients(0);

        let texture = storage.get_texture2d(0);
        let albedo = texture.sample_grad(uvs, ddx, ddy, input_vars.mip_bias).xyz()
            .component_mul(&storage.get_vec3(Storage::ALBEDO));

        let normal = input_vars.get_input_vec3(0).normalize();
        let light_direction = storage.get_vec3(Storage::LIGHT_DIRECTION);
        let n_dot_l = normal.dot(&-light_direction).max(0.0);

        let lighting = storage.get_vec3(Storage::LIGHT_COLOUR) * n_dot_l + storage.get_vec3(Storage::AMBIENT);
        Some(albedo.component_mul(&lighting))
    }
}

pub struct VertexShaderInputVariables<'a> {
    pub position: Vector4<f32>,
    pub texture_coords: Vector3<f32>,
    pub normal: Vector3<f32>,

    pub storage: &'a Storage,
}

#[derive(Default)]
pub struct VertexShaderOutputVariables {
    pub position: Vector4<f32>,
    /// Clip-space position in the previous frame, used for velocity.
    pub previous_position: Vector4<f32>,

    pub vec2: Vec<Vector2<f32>>,
    pub vec3: Vec<Vector3<f32>>,
}

pub struct FragmentShaderInputVariables<'a> {
    vertex_shader_output_variables: &'a [VertexShaderOutputVariables; 3],
    bary_coords: Vector3<f32>,
    /// Perspective-correct barycentrics one pixel to the right and one below.
    bary_dx: Vector3<f32>,
    bary_dy: Vector3<f32>,

    pub mip_bias: f32,
    pub storage: &'a Storage,
}

impl<'a> FragmentShaderInputVariables<'a> {
    pub fn new(
        vertex_shader_output_variables: &'a [VertexShaderOutputVariables; 3],
        bary_coords: Vector3<f32>,
        bary_dx: Vector3<f32>,
        bary_dy: Vector3<f32>,
        mip_bias: f32,
        storage: &'a Storage,
    ) -> Self {
        Self {
            vertex_shader_output_variables,
            bary_coords,
            bary_dx,
            bary_dy,
            mip_bias,
            storage,
        }
    }

    fn interpolate_vec2(&self, index: usize, bary: Vector3<f32>) -> Vector2<f32> {
        self.vertex_shader_output_variables[0].vec2[index] * bary.x +
        self.vertex_shader_output_variables[1].vec2[index] * bary.y +
        self.vertex_shader_output_variables[2].vec2[index] * bary.z
    }

    pub fn get_previous_position(&self) -> Vector4<f32> {
        self.vertex_shader_output_variables[0].previous_position * self.bary_coords.x +
        self.vertex_shader_output_variables[1].previous_position * self.bary_coords.y +
        self.vertex_shader_output_variables[2].previous_position * self.bary_coords.z
    }

    pub fn get_input_vec2(&self, index: usize) -> Vector2<f32> {
        self.interpolate_vec2(index, self.bary_coords)
    }

    /// Screen-space derivatives of a vec2 input, one pixel along x and y.
    pub fn get_input_vec2_gradients(&self, index: usize) -> (Vector2<f32>, Vector2<f32>) {
        let centre = self.interpolate_vec2(index, self.bary_coords);
        (
            self.interpolate_vec2(index, self.bary_dx) - centre,
            self.interpolate_vec2(index, self.bary_dy) - centre,
        )
    }

    pub fn get_input_vec3(&self, index: usize) -> Vector3<f32> {
        self.vertex_shader_output_variables[0].vec3[index] * self.bary_coords.x +
        self.vertex_shader_output_variables[1].vec3[index] * self.bary_coords.y +
        self.vertex_shader_output_variables[2].vec3[index] * self.bary_coords.z
    }
}
