use strata_core::camera::CameraSnapshot;
use strata_lights::{GpuLight, LightSetHeader, LightStore};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub params: [f32; 4], // near, far, viewport width, viewport height
    pub eye: [f32; 4],
}

impl CameraUniform {
    pub fn from_snapshot(snapshot: &CameraSnapshot) -> Self {
        Self {
            view_proj: snapshot.view_proj().to_cols_array_2d(),
            view: snapshot.view.to_cols_array_2d(),
            inv_proj: snapshot.inv_proj.to_cols_array_2d(),
            inv_view: snapshot.inv_view.to_cols_array_2d(),
            params: [
                snapshot.near,
                snapshot.far,
                snapshot.viewport_width as f32,
                snapshot.viewport_height as f32,
            ],
            eye: snapshot.eye().extend(1.0).to_array(),
        }
    }
}

/// Camera uniform plus the light set, bound as group 0 by every shading pass.
pub struct GlobalResources {
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    pub camera_buffer: wgpu::Buffer,
    /// Header (active count) followed by `capacity` lights.
    pub light_buffer: wgpu::Buffer,
    light_capacity: u32,
}

impl GlobalResources {
    pub fn new(device: &wgpu::Device, lights: &LightStore) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Global Bind Group Layout"),
            entries: &[
                // --- BINDING 0: Camera ---
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // --- BINDING 1: Light Set ---
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Set Buffer"),
            contents: &light_set_bytes(lights),
            // STORAGE for the animator and the bin pass, COPY_SRC for validation readback
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Global Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            layout,
            bind_group,
            camera_buffer,
            light_buffer,
            light_capacity: lights.capacity(),
        }
    }

    pub fn light_capacity(&self) -> u32 {
        self.light_capacity
    }

    pub fn light_records_size(&self) -> u64 {
        self.light_capacity as u64 * std::mem::size_of::<GpuLight>() as u64
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, snapshot: &CameraSnapshot) {
        let uniform = CameraUniform::from_snapshot(snapshot);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Rewrites only the header; positions live on the device once uploaded.
    pub fn update_light_count(&self, queue: &wgpu::Queue, header: LightSetHeader) {
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&header));
    }
}

fn light_set_bytes(lights: &LightStore) -> Vec<u8> {
    let records = lights.to_gpu();
    let mut bytes = Vec::with_capacity(LightSetHeader::SIZE as usize + records.len() * 32);
    bytes.extend_from_slice(bytemuck::bytes_of(&lights.header()));
    bytes.extend_from_slice(bytemuck::cast_slice(&records));
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use strata_lights::Light;

    #[test]
    fn camera_uniform_is_288_bytes() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 288);
    }

    #[test]
    fn light_set_starts_with_header() {
        let light = Light {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec3::ONE,
            radius: 2.0,
        };
        let store = LightStore::new(vec![light; 3], 2);
        let bytes = light_set_bytes(&store);

        assert_eq!(bytes.len(), 16 + 3 * 32);
        assert_eq!(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 2);
        let first: GpuLight = bytemuck::pod_read_unaligned(&bytes[16..48]);
        assert_eq!(first.position, [1.0, 2.0, 3.0]);
        assert_eq!(first.radius, 2.0);
    }
}
