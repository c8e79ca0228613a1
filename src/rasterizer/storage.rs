use nalgebra::{Matrix4, Vector3};
use crate::rasterizer::texture2d::Texture2D;

#[derive(Default)]
pub struct Storage {
    textures2d: Vec<Texture2D>,
    vec3s: Vec<Vector3<f32>>,
    mat4s: Vec<Matrix4<f32>>,
}

impl Storage {
    pub const VIEW_PROJECTION: usize = 0;
    pub const PREVIOUS_VIEW_PROJECTION: usize = 1;
    pub const MODEL: usize = 2;
    pub const PREVIOUS_MODEL: usize = 3;

    pub const LIGHT_DIRECTION: usize = 0;
    pub const LIGHT_COLOUR: usize = 1;
    pub const AMBIENT: usize = 2;
    pub const ALBEDO: usize = 3;

    pub fn set_texture2ds(&mut self, textures: Vec<Texture2D>) {
        self.textures2d = textures;
    }

    pub fn get_texture2d(&self, index: usize) -> &Texture2D {
        &self.textures2d[index]
    }

    pub fn set_vec3(&mut self, index: usize, value: Vector3<f32>) {
        if self.vec3s.len() <= index {
            self.vec3s.resize(index + 1, Vector3::zeros());
        }
        self.vec3s[index] = value;
    }

    pub fn get_vec3(&self, index: usize) -> Vector3<f32> {
        self.vec3s[index]
    }

    pub fn set_mat4(&mut self, index: usize, value: Matrix4<f32>) {
        if self.mat4s.len() <= index {
            self.mat4s.resize(index + 1, Matrix4::identity());
        }
        self.mat4s[index] = value;
    }

    pub fn get_mat4(&self, index: usize) -> &Matrix4<f32> {
        &self.mat4s[index]
    }
}
