use nalgebra::{Vector3, Vector4};

pub struct Mesh {
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(faces: Vec<Face>) -> Self {
        Self {
            faces,
        }
    }

    /// A square in the y = 0 plane facing +y, with texture coordinates
    /// repeated `uv_scale` times across it.
    pub fn plane(half_size: f32, uv_scale: f32) -> Self {
        let corner = |x: f32, z: f32| Vertex {
            position: Vector4::new(x * half_size, 0.0, z * half_size, 1.0),
            texture_coords: Vector3::new((x + 1.0) * 0.5 * uv_scale, (1.0 - z) * 0.5 * uv_scale, 0.0),
            normals: Vector3::y(),
        };

        let quad = [corner(-1.0, 1.0), corner(1.0, 1.0), corner(1.0, -1.0), corner(-1.0, -1.0)];
        Self::new(Self::quad_faces(quad).to_vec())
    }

    /// An axis-aligned unit cube centred on the origin, each face mapped to
    /// the full texture.
    pub fn cube() -> Self {
        let mut faces = Vec::with_capacity(12);

        for normal in [Vector3::<f32>::x(), -Vector3::x(), Vector3::y(), -Vector3::y(), Vector3::z(), -Vector3::z()] {
            // Any vector not parallel to the normal gives the face's tangent frame.
            let up = if normal.y.abs() > 0.5 { Vector3::z() } else { Vector3::y() };
            let right = up.cross(&normal);
            let up = normal.cross(&right);

            let corner = |u: f32, v: f32| Vertex {
                position: (normal + right * u + up * v).scale(0.5).push(1.0),
                texture_coords: Vector3::new((u + 1.0) * 0.5, (v + 1.0) * 0.5, 0.0),
                normals: normal,
            };

            let quad = [corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0)];
            faces.extend(Self::quad_faces(quad));
        }

        Self::new(faces)
    }

    /// Two counter-clockwise triangles from four counter-clockwise corners.
    fn quad_faces(quad: [Vertex; 4]) -> [Face; 2] {
        [
            Face::new([quad[0], quad[1], quad[2]]),
            Face::new([quad[0], quad[2], quad[3]]),
        ]
    }
}

#[derive(Default, Copy, Clone)]
pub struct Face {
    pub vertices: [Vertex; 3],
}

impl Face {
    pub fn new(vertices: [Vertex; 3]) -> Self {
        Self {
            vertices,
        }
    }
}

#[derive(Default, Copy, Clone)]
pub struct Vertex {
    pub position: Vector4<f32>,
    pub texture_coords: Vector3<f32>,
    pub normals: Vector3<f32>,
}

impl Vertex {
    pub fn from_pos(position: Vector4<f32>) -> Self {
        Self {
            position,
            texture_coords: Vector3::new(0.0, 0.0, 1.0),
            normals: Vector3::new(0.0, 0.0, 1.0),
        }
    }
}
