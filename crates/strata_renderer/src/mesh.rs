use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: (mem::size_of::<[f32; 3]>() * 2) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// World-space triangles drawn by both shading styles.
#[derive(Clone, Debug, Default)]
pub struct SceneGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl SceneGeometry {
    /// A floor with two rows of pillars, sized around the default light volume.
    pub fn demo_hall() -> Self {
        let mut scene = SceneGeometry::default();
        let floor = Vec3::splat(0.55);
        let stone = Vec3::new(0.8, 0.78, 0.72);

        scene.push_quad(Vec3::ZERO, Vec3::Y, Vec3::X, 20.0, 10.0, floor);

        for i in 0..7 {
            let x = -12.0 + i as f32 * 4.0;
            for z in [-4.0, 4.0] {
                scene.push_box(Vec3::new(x, 9.0, z), Vec3::new(0.5, 9.0, 0.5), stone);
            }
        }

        scene
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    // `u` must be a unit axis perpendicular to `normal`; winding is CCW seen from `normal`.
    fn push_quad(&mut self, center: Vec3, normal: Vec3, u: Vec3, half_u: f32, half_v: f32, color: Vec3) {
        let v = normal.cross(u);
        let base = self.vertices.len() as u32;
        let corners = [
            center - u * half_u - v * half_v,
            center + u * half_u - v * half_v,
            center + u * half_u + v * half_v,
            center - u * half_u + v * half_v,
        ];

        self.vertices.extend(corners.iter().map(|corner| Vertex {
            position: corner.to_array(),
            normal: normal.to_array(),
            color: color.to_array(),
        }));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    fn push_box(&mut self, center: Vec3, half: Vec3, color: Vec3) {
        for normal in [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z] {
            let u = if normal.x != 0.0 { Vec3::Z } else { Vec3::X };
            let v = normal.cross(u);
            self.push_quad(
                center + normal * half.dot(normal.abs()),
                normal,
                u,
                half.dot(u.abs()),
                half.dot(v.abs()),
                color,
            );
        }
    }
}

pub struct GpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuGeometry {
    pub fn upload(device: &wgpu::Device, scene: &SceneGeometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Vertex Buffer"),
            contents: bytemuck::cast_slice(&scene.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Index Buffer"),
            contents: bytemuck::cast_slice(&scene.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: scene.indices.len() as u32,
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_hall_is_well_formed() {
        let scene = SceneGeometry::demo_hall();
        // floor plus 14 six-sided pillars
        assert_eq!(scene.triangle_count(), 2 + 14 * 12);
        assert!(scene.indices.iter().all(|&i| (i as usize) < scene.vertices.len()));
        for vertex in &scene.vertices {
            let length = Vec3::from_array(vertex.normal).length();
            assert!((length - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn triangles_face_their_normals() {
        let scene = SceneGeometry::demo_hall();
        for triangle in scene.indices.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]]
                .map(|i| Vec3::from_array(scene.vertices[i as usize].position));
            let normal = Vec3::from_array(scene.vertices[triangle[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
        }
    }

    #[test]
    fn vertex_stride_matches_layout() {
        assert_eq!(Vertex::desc().array_stride, 36);
    }
}
