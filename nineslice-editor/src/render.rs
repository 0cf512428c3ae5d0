//! GPU draw path for the nine-slice mesh.
//!
//! One pipeline, one textured triangle-list draw per frame. The index buffer is
//! written once at startup since the triangulation never changes; the vertex
//! buffer is rewritten from the exported mesh every frame.

use anyhow::{Result, bail};
use image::RgbaImage;
use nineslice::mesh::FLOATS_PER_VERTEX;
use nineslice::{INDEX_COUNT, INDICES, MeshBuffers, SliceSource, VERTEX_COUNT, Vertex};
use wgpu::util::DeviceExt;

/// Screen-size uniform used to map pixel positions to clip space.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScreenUniform {
    pub size: [f32; 2],
    /// Uniform buffers need 16-byte alignment.
    pub _padding: [f32; 2],
}

const FLOAT: wgpu::BufferAddress = std::mem::size_of::<f32>() as wgpu::BufferAddress;

/// Attributes of the packed `x, y, u, v, r, g, b, a` vertex.
const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
    // pos
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x2,
    },
    // uv
    wgpu::VertexAttribute {
        offset: FLOAT * 2,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x2,
    },
    // color
    wgpu::VertexAttribute {
        offset: FLOAT * 4,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x4,
    },
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: FLOAT * FLOATS_PER_VERTEX as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Rejects images the device cannot hold as a single 2D texture.
fn check_texture_size(width: u32, height: u32, max_dimension: u32) -> Result<()> {
    if width == 0 || height == 0 {
        bail!("source image is empty ({}x{})", width, height);
    }
    if width > max_dimension || height > max_dimension {
        bail!(
            "source image {}x{} exceeds the GPU texture limit of {}px per side",
            width,
            height,
            max_dimension
        );
    }
    Ok(())
}

/// The source image uploaded to the GPU.
///
/// Meshes are sliced from this directly, so the texture the renderer binds is
/// always the one the mesh was built for.
pub struct SourceTexture {
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

impl SliceSource for SourceTexture {
    fn dimensions(&self) -> (u32, u32) {
        self.size
    }
}

/// Pipeline and buffers for drawing one nine-slice mesh.
pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    screen_buffer: wgpu::Buffer,
    screen_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

impl MeshRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Nine-slice Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let screen_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Screen Uniform Buffer"),
            contents: bytemuck::cast_slice(&[ScreenUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let screen_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Screen Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let screen_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Screen Bind Group"),
            layout: &screen_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: screen_buffer.as_entire_binding(),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Source Texture Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Nine-slice Pipeline Layout"),
            bind_group_layouts: &[&screen_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Nine-slice Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Inverted middle bands flip winding; they must still draw.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Nine-slice Vertex Buffer"),
            size: (std::mem::size_of::<Vertex>() * VERTEX_COUNT) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Nine-slice Index Buffer"),
            contents: bytemuck::cast_slice(&INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::info!("Created nine-slice pipeline ({:?})", surface_format);

        Self {
            pipeline,
            texture_bind_group_layout,
            sampler,
            screen_buffer,
            screen_bind_group,
            vertex_buffer,
            index_buffer,
        }
    }

    /// Uploads the source image and binds it with the renderer's sampler.
    pub fn upload_texture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
    ) -> Result<SourceTexture> {
        let (width, height) = image.dimensions();
        check_texture_size(width, height, device.limits().max_texture_dimension_2d)?;
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Nine-slice Source"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Source Texture Bind Group"),
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        log::debug!("Uploaded {}x{} source texture", width, height);
        Ok(SourceTexture {
            bind_group,
            size: (width, height),
        })
    }

    pub fn update_screen(&self, queue: &wgpu::Queue, width: u32, height: u32) {
        let uniform = ScreenUniform {
            size: [width.max(1) as f32, height.max(1) as f32],
            _padding: [0.0; 2],
        };
        queue.write_buffer(&self.screen_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Writes the exported vertices; indices are already resident.
    pub fn upload_mesh(&self, queue: &wgpu::Queue, buffers: MeshBuffers<'_>) {
        queue.write_buffer(&self.vertex_buffer, 0, buffers.vertex_bytes());
    }

    /// Records the single indexed draw for the last uploaded mesh.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, texture: &'a SourceTexture) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.screen_bind_group, &[]);
        pass.set_bind_group(1, &texture.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..INDEX_COUNT as u32, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_packed_vertex() {
        let layout = vertex_layout();
        assert_eq!(
            layout.array_stride,
            std::mem::size_of::<Vertex>() as wgpu::BufferAddress
        );
        let offsets: Vec<_> = layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16]);
    }

    #[test]
    fn test_texture_size_checked_against_device_limit() {
        let limit = wgpu::Limits::default().max_texture_dimension_2d;
        assert!(check_texture_size(800, 600, limit).is_ok());
        assert!(check_texture_size(limit, limit, limit).is_ok());

        let err = check_texture_size(limit + 1, 16, limit).unwrap_err();
        assert!(err.to_string().contains("texture limit"));
        assert!(check_texture_size(16, 0, limit).is_err());
    }

    #[test]
    fn test_screen_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<ScreenUniform>(), 16);
    }
}
