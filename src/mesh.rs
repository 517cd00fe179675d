//! Vertex format, GPU-resident models and spatial transforms.
//!
//! - [`Vertex3d`] is the vertex format used by every model and shader
//! - [`Model`] owns the vertex and index buffers of one loaded mesh
//! - [`Transform`] places a model in the world
//!
//! # Vertex Layout
//!
//! The [`Vertex3d`] struct uses the following GPU layout (32 bytes per vertex):
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//!
//! Every WGSL vertex stage in `assets/shaders/` reads these three locations.

use crate::gpu::GpuContext;
use glam::{EulerRot, Mat4, Quat, Vec3};

/// A vertex with position, normal, and texture coordinates.
///
/// `#[repr(C)]` plus [`bytemuck::Pod`] lets vertex slices be uploaded as raw bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Position in model space.
    pub position: [f32; 3],
    /// Surface normal, normalized.
    pub normal: [f32; 3],
    /// Texture coordinates with the origin at the bottom-left.
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// GPU-resident mesh geometry with vertex and index buffers.
///
/// Models are immutable once uploaded. Build one from a file with
/// [`SetupContext::load_model`](crate::SetupContext::load_model) or from
/// [`RawGeometry::upload`](crate::RawGeometry::upload).
#[derive(Debug)]
pub struct Model {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    label: String,
}

impl Model {
    /// Uploads vertices and triangle-list indices to the GPU.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32], label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertices")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Indices")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        log::debug!(
            "uploaded model '{label}': {} vertices, {} triangles",
            vertices.len(),
            indices.len() / 3
        );

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            label: label.to_string(),
        }
    }

    /// Number of indices drawn per call.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Position, rotation and scale of an object in world space.
///
/// The model matrix is `translate * rotate * scale`, so scaling happens in model
/// space before the object is rotated and moved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// The model matrix `T * R * S`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(self.scale)
    }

    /// Rotation as XYZ Euler angles in radians.
    pub fn euler(&self) -> Vec3 {
        quat_to_euler(self.rotation)
    }

    /// Rotation as XYZ Euler angles in degrees, as shown in the inspector.
    pub fn euler_degrees(&self) -> Vec3 {
        radians_to_degrees(self.euler())
    }

    pub fn set_euler(&mut self, euler: Vec3) {
        self.rotation = quat_from_euler(euler);
    }

    pub fn set_euler_degrees(&mut self, degrees: Vec3) {
        self.set_euler(degrees_to_radians(degrees));
    }
}

/// Builds a rotation from XYZ Euler angles in radians.
///
/// The X rotation is applied first, then Y, then Z (`R = Rz * Ry * Rx`).
pub fn quat_from_euler(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::ZYX, euler.z, euler.y, euler.x)
}

/// Inverse of [`quat_from_euler`].
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    Vec3::new(x, y, z)
}

pub(crate) fn degrees_to_radians(v: Vec3) -> Vec3 {
    Vec3::new(v.x.to_radians(), v.y.to_radians(), v.z.to_radians())
}

pub(crate) fn radians_to_degrees(v: Vec3) -> Vec3 {
    Vec3::new(v.x.to_degrees(), v.y.to_degrees(), v.z.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
        assert_eq!(Vertex3d::LAYOUT.array_stride, 32);
    }

    #[test]
    fn transform_scales_before_rotating_and_translating() {
        let transform = Transform::new()
            .position(Vec3::new(10.0, 0.0, 0.0))
            .rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2))
            .scale(Vec3::new(2.0, 1.0, 1.0));

        // (1,0,0) scaled to (2,0,0), rotated to (0,2,0), moved to (10,2,0).
        let p = transform.matrix().transform_point3(Vec3::X);
        assert_vec3_near(p, Vec3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn default_transform_is_identity() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn euler_order_is_x_then_y_then_z() {
        let euler = Vec3::new(0.3, -0.4, 0.5);
        let expected =
            Quat::from_rotation_z(0.5) * Quat::from_rotation_y(-0.4) * Quat::from_rotation_x(0.3);
        let q = quat_from_euler(euler);
        assert!(q.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn euler_degrees_round_trip() {
        let mut transform = Transform::new();
        transform.set_euler_degrees(Vec3::new(30.0, 45.0, -60.0));
        assert_vec3_near(transform.euler_degrees(), Vec3::new(30.0, 45.0, -60.0));
    }

    #[test]
    fn incrementing_euler_x_keeps_other_axes() {
        let mut transform = Transform::new();
        for _ in 0..10 {
            let mut euler = transform.euler();
            euler.x += 1f32.to_radians();
            transform.set_euler(euler);
        }
        assert_vec3_near(transform.euler_degrees(), Vec3::new(10.0, 0.0, 0.0));
    }
}
