//! Renderer: wgpu context, one-time model upload, and the per-frame
//! transform/draw pass.

use std::num::NonZeroU64;
use std::sync::Arc;

use wgpu::{
    util::DeviceExt,
    AddressMode, BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState,
    ColorWrites, CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device,
    DeviceDescriptor, Extent3d, Features, FilterMode, FragmentState, IndexFormat, Instance,
    InstanceDescriptor, Limits, LoadOp, Operations, Origin3d, PipelineLayoutDescriptor,
    PowerPreference, PresentMode, Queue, RenderPassColorAttachment, RenderPassDescriptor,
    RenderPipeline, RenderPipelineDescriptor, Sampler, SamplerDescriptor, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    TexelCopyBufferLayout, TexelCopyTextureInfo, TextureAspect, TextureDescriptor,
    TextureDimension, TextureFormat, TextureSampleType, TextureUsages, TextureView,
    TextureViewDescriptor, TextureViewDimension, VertexBufferLayout, VertexState, VertexStepMode,
};
use winit::{dpi::PhysicalSize, window::Window};

use asset::{mesh::MeshData, texture::TextureData};
use corelib::{camera::Camera, light::PhongLight, shade::ShadeMode, spin};
use glam::{Mat4, Vec3, vec3};

pub mod error;
pub mod uniforms;

pub use crate::error::RenderError;
use crate::uniforms::SceneUniform;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Background of the original demo, light gray.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.8,
    g: 0.8,
    b: 0.8,
    a: 1.0,
};

/// One vertex buffer per attribute, the way the mesh data is planarized:
/// position, normal, tangent, bitangent, texcoord.
const VERTEX_LAYOUTS: [VertexBufferLayout<'static>; 5] = [
    VertexBufferLayout {
        array_stride: 12,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    },
    VertexBufferLayout {
        array_stride: 12,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![1 => Float32x3],
    },
    VertexBufferLayout {
        array_stride: 12,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![2 => Float32x3],
    },
    VertexBufferLayout {
        array_stride: 12,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![3 => Float32x3],
    },
    VertexBufferLayout {
        array_stride: 8,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![4 => Float32x2],
    },
];

/// Per-attribute vertex buffers plus the index buffer. Created and filled
/// exactly once, the first time the parsed model becomes available; never
/// resized or swapped afterwards.
struct ModelBuffers {
    position_buf: Buffer,
    normal_buf: Buffer,
    tangent_buf: Buffer,
    bitangent_buf: Buffer,
    texcoord_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
}

/// Explicit render context: every piece of GPU and scene state the frame
/// loop touches lives here, passed around by reference instead of sitting
/// in globals.
pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & bindings
    pipeline: RenderPipeline,
    scene_buf: Buffer,
    scene_bg: BindGroup,
    material_bgl: BindGroupLayout,
    material_bg: BindGroup,
    color_sampler: Sampler,
    normal_sampler: Sampler,
    color_view: TextureView,
    normal_view: TextureView,

    // Loaded-model slot; empty until the OBJ parse lands.
    model: Option<ModelBuffers>,

    // Scene constants
    camera: Camera,
    light: PhongLight,
    mode: ShadeMode,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an `Arc<Window>`. Any failing step aborts
    /// initialization with a typed error; nothing panics.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> Result<Self, RenderError> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shader ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Model WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/model.wgsl").into()),
        });

        // ==== Scene uniform ====
        let camera = Camera::new_perspective(
            vec3(0.0, 400.0, 200.0),
            Vec3::ZERO,
            Vec3::Y,
            30f32.to_radians(),
            1.0,
            5000.0,
            width as f32 / height as f32,
        );
        let light = PhongLight::default();
        let mode = ShadeMode::default();

        let scene_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Scene BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        NonZeroU64::new(std::mem::size_of::<SceneUniform>() as u64).unwrap(),
                    ),
                },
                count: None,
            }],
        });

        let scene_init = SceneUniform::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            light.position,
            &light,
            mode,
        );
        let scene_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene UBO"),
            contents: bytemuck::bytes_of(&scene_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let scene_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene BG"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buf.as_entire_binding(),
            }],
        });

        // ==== Material bind group ====
        // Both maps start as 1x1 placeholders (white color, flat +Z normal)
        // so the pipeline can draw before the image decodes finish, in any
        // completion order.
        let material_bgl = create_material_bgl(&device);
        let color_sampler = create_map_sampler(&device, "Color Sampler");
        let normal_sampler = create_map_sampler(&device, "Normal Sampler");
        let color_view = create_map_texture(
            &device,
            &queue,
            &TextureData::solid([255, 255, 255, 255]),
            true,
            "Color Placeholder",
        );
        let normal_view = create_map_texture(
            &device,
            &queue,
            &TextureData::solid([128, 128, 255, 255]),
            false,
            "Normal Placeholder",
        );
        let material_bg = create_material_bg(
            &device,
            &material_bgl,
            &color_view,
            &color_sampler,
            &normal_view,
            &normal_sampler,
        );

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Model PipelineLayout"),
            bind_group_layouts: &[&scene_bgl, &material_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &VERTEX_LAYOUTS,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                // The original demo never enables face culling, and the
                // winding-reversal load flag would fight it anyway.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            scene_buf,
            scene_bg,
            material_bgl,
            material_bg,
            color_sampler,
            normal_sampler,
            color_view,
            normal_view,
            model: None,
            camera,
            light,
            mode,
            depth_view,
            width,
            height,
        })
    }

    /// Populate the vertex/index buffers from parsed mesh data. The frame
    /// loop calls this exactly once per session, on the first (and only)
    /// successful parse.
    pub fn upload_model(&mut self, mesh: &MeshData) {
        let position_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Positions"),
            contents: bytemuck::cast_slice(&mesh.positions),
            usage: BufferUsages::VERTEX,
        });
        let normal_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Normals"),
            contents: bytemuck::cast_slice(&mesh.normals),
            usage: BufferUsages::VERTEX,
        });
        let tangent_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Tangents"),
            contents: bytemuck::cast_slice(&mesh.tangents),
            usage: BufferUsages::VERTEX,
        });
        let bitangent_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Bitangents"),
            contents: bytemuck::cast_slice(&mesh.bitangents),
            usage: BufferUsages::VERTEX,
        });
        let texcoord_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Texcoords"),
            contents: bytemuck::cast_slice(&mesh.texcoords),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });

        log::info!(
            "Model uploaded: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        self.model = Some(ModelBuffers {
            position_buf,
            normal_buf,
            tangent_buf,
            bitangent_buf,
            texcoord_buf,
            index_buf,
            index_count: mesh.indices.len() as u32,
        });
    }

    /// Install the base color map (sRGB) and rebuild the material bindings.
    pub fn set_color_map(&mut self, tex: &TextureData) {
        self.color_view = create_map_texture(&self.device, &self.queue, tex, true, "Color Map");
        self.rebuild_material_bg();
    }

    /// Install the normal map (linear) and rebuild the material bindings.
    pub fn set_normal_map(&mut self, tex: &TextureData) {
        self.normal_view = create_map_texture(&self.device, &self.queue, tex, false, "Normal Map");
        self.rebuild_material_bg();
    }

    pub fn set_shade_mode(&mut self, mode: ShadeMode) {
        self.mode = mode;
    }

    fn rebuild_material_bg(&mut self) {
        self.material_bg = create_material_bg(
            &self.device,
            &self.material_bgl,
            &self.color_view,
            &self.color_sampler,
            &self.normal_view,
            &self.normal_sampler,
        );
    }

    /// Render one frame at the given rotation angle.
    ///
    /// While the model slot is empty this touches the GPU not at all (no
    /// clear, no uniform write, no draw), mirroring the original's early
    /// return before the OBJ parse lands.
    pub fn render(&mut self, angle_deg: f32) -> Result<(), SurfaceError> {
        let Some(model) = self.model.as_ref() else {
            return Ok(());
        };

        // --- transform uniforms for this frame
        let model_mat = spin::model_matrix(angle_deg);
        let mv = self.camera.view() * model_mat;
        let mvp = self.camera.proj() * mv;
        let light_view_pos = self.camera.view() * self.light.position;
        let scene = SceneUniform::new(mvp, mv, light_view_pos, &self.light, self.mode);
        self.queue
            .write_buffer(&self.scene_buf, 0, bytemuck::bytes_of(&scene));

        // --- frame & pass
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.scene_bg, &[]);
            rpass.set_bind_group(1, &self.material_bg, &[]);
            rpass.set_vertex_buffer(0, model.position_buf.slice(..));
            rpass.set_vertex_buffer(1, model.normal_buf.slice(..));
            rpass.set_vertex_buffer(2, model.tangent_buf.slice(..));
            rpass.set_vertex_buffer(3, model.bitangent_buf.slice(..));
            rpass.set_vertex_buffer(4, model.texcoord_buf.slice(..));
            rpass.set_index_buffer(model.index_buf.slice(..), IndexFormat::Uint32);
            rpass.draw_indexed(0..model.index_count, 0, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    /// Reconfigure the surface & recreate the depth view. The window is
    /// fixed-size; this only runs for surface recovery and DPI churn, so
    /// the camera aspect is deliberately left alone.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

fn create_material_bgl(device: &Device) -> BindGroupLayout {
    let texture_entry = |binding| BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    let sampler_entry = |binding| BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("Material BGL"),
        entries: &[
            texture_entry(0),
            sampler_entry(1),
            texture_entry(2),
            sampler_entry(3),
        ],
    })
}

fn create_material_bg(
    device: &Device,
    layout: &BindGroupLayout,
    color_view: &TextureView,
    color_sampler: &Sampler,
    normal_view: &TextureView,
    normal_sampler: &Sampler,
) -> BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Material BG"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(color_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(color_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(normal_view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(normal_sampler),
            },
        ],
    })
}

/// Clamp-to-edge, linear-filtered sampler for both maps.
fn create_map_sampler(device: &Device, label: &str) -> Sampler {
    device.create_sampler(&SamplerDescriptor {
        label: Some(label),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        mipmap_filter: FilterMode::Nearest,
        ..Default::default()
    })
}

/// Upload RGBA8 texture data; color maps as sRGB, normal maps as linear.
fn create_map_texture(
    device: &Device,
    queue: &Queue,
    data: &TextureData,
    srgb: bool,
    label: &str,
) -> TextureView {
    let format = if srgb {
        TextureFormat::Rgba8UnormSrgb
    } else {
        TextureFormat::Rgba8Unorm
    };
    let size = Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        &data.data,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );
    texture.create_view(&TextureViewDescriptor::default())
}
