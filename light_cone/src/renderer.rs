//! Rendering system for the light cone editor
//!
//! Instanced quads shaded into ring markers for reference frames, and a
//! line list for cone edges, worldline trajectories, isochrones, and axes.

use common::{Camera2D, CameraUniform, GraphicsContext};
use wgpu::util::DeviceExt;

use crate::frames::Diagram;
use crate::relativity::{self, C};
use crate::trajectories::{self, TrajectoryParams};

/// Instance data for frame markers
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
}

impl MarkerInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        2 => Float32x3,
        3 => Float32,
        4 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MarkerInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Quad vertex for instanced rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Line vertex with color
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    fn new(x: f64, t: f64, color: [f32; 4]) -> Self {
        Self {
            position: [x as f32, t as f32, 0.0],
            color,
        }
    }
}

const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
];

const TRAJECTORY_SAMPLES: usize = 64;

/// Everything the renderer needs to rebuild a frame's geometry
pub struct Scene<'a> {
    pub diagram: &'a Diagram,
    pub selected: usize,
    pub tau: f64,
    pub show_past_cones: bool,
    /// In-flight drag preview: (x, t, would be a valid placement)
    pub preview: Option<(f64, f64, bool)>,
    /// Visible world extents: (x_min, t_min, x_max, t_max)
    pub view: (f64, f64, f64, f64),
}

pub struct Renderer {
    marker_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    line_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    max_instances: usize,
    max_line_vertices: usize,
}

impl Renderer {
    pub fn new(ctx: &GraphicsContext, max_instances: usize, max_line_vertices: usize) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Light Cone Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lightcone.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let marker_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Marker Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_marker",
                buffers: &[QuadVertex::layout(), MarkerInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_marker",
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_line",
                buffers: &[LineVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_line",
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (std::mem::size_of::<MarkerInstance>() * max_instances) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Buffer"),
            size: (std::mem::size_of::<LineVertex>() * max_line_vertices) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            marker_pipeline,
            line_pipeline,
            quad_buffer,
            instance_buffer,
            line_buffer,
            camera_buffer,
            camera_bind_group,
            max_instances,
            max_line_vertices,
        }
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera2D) {
        let uniform = CameraUniform::from_camera_2d(camera);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Rebuild the GPU buffers for the scene.
    /// Returns (instance count, line vertex count) for the draw calls.
    pub fn update_scene(&self, queue: &wgpu::Queue, scene: &Scene) -> (u32, u32) {
        let instances = self.build_instances(scene);
        let lines = self.build_lines(scene);

        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&lines));

        (instances.len() as u32, lines.len() as u32)
    }

    fn build_instances(&self, scene: &Scene) -> Vec<MarkerInstance> {
        let marker_radius = ((scene.view.3 - scene.view.1) * 0.015) as f32;
        let mut instances = Vec::new();

        for (i, frame) in scene.diagram.frames.iter().enumerate() {
            let color = if i == scene.selected {
                [1.0, 1.0, 1.0, 1.0]
            } else if frame.source.is_none() {
                [1.0, 0.85, 0.3, 1.0]
            } else {
                [1.0, 0.6, 0.25, 1.0]
            };
            instances.push(MarkerInstance {
                position: [frame.x as f32, frame.t as f32, 0.0],
                radius: marker_radius,
                color,
            });
        }

        if let Some((x, t, valid)) = scene.preview {
            let color = if valid {
                [0.3, 1.0, 0.4, 0.8]
            } else {
                [1.0, 0.25, 0.25, 0.8]
            };
            instances.push(MarkerInstance {
                position: [x as f32, t as f32, 0.0],
                radius: marker_radius * 0.8,
                color,
            });
        }

        instances.truncate(self.max_instances);
        instances
    }

    fn build_lines(&self, scene: &Scene) -> Vec<LineVertex> {
        let mut lines = Vec::new();
        let (x_min, t_min, x_max, t_max) = scene.view;

        // Axes
        let axis = [0.3, 0.3, 0.4, 0.6];
        lines.push(LineVertex::new(x_min, 0.0, axis));
        lines.push(LineVertex::new(x_max, 0.0, axis));
        lines.push(LineVertex::new(0.0, t_min, axis));
        lines.push(LineVertex::new(0.0, t_max, axis));

        // Light cone edges for every frame, at slope dx/dt = ±c
        for (i, frame) in scene.diagram.frames.iter().enumerate() {
            let bright = if i == scene.selected { 0.55 } else { 0.25 };
            let color = [1.0, 0.95, 0.5, bright];

            let up = t_max - frame.t;
            if up > 0.0 {
                lines.push(LineVertex::new(frame.x, frame.t, color));
                lines.push(LineVertex::new(frame.x + up * C, frame.t + up, color));
                lines.push(LineVertex::new(frame.x, frame.t, color));
                lines.push(LineVertex::new(frame.x - up * C, frame.t + up, color));
            }

            if scene.show_past_cones {
                let down = frame.t - t_min;
                if down > 0.0 {
                    let past = [0.6, 0.6, 1.0, bright * 0.6];
                    lines.push(LineVertex::new(frame.x, frame.t, past));
                    lines.push(LineVertex::new(frame.x + down * C, frame.t - down, past));
                    lines.push(LineVertex::new(frame.x, frame.t, past));
                    lines.push(LineVertex::new(frame.x - down * C, frame.t - down, past));
                }
            }
        }

        // Worldlines: the accelerated path from each frame's source,
        // colored by how close the local slope is to light speed
        for frame in &scene.diagram.frames {
            let Some(source_index) = frame.source else {
                continue;
            };
            let source = scene.diagram.frames[source_index];

            let params = TrajectoryParams {
                start_x: source.x,
                start_t: source.t,
                end_x: frame.x,
                end_t: frame.t,
                initial_velocity: 0.0,
                points: TRAJECTORY_SAMPLES,
            };
            let Ok(trajectory) = trajectories::hyperbolic_trajectory(&params) else {
                continue;
            };

            for pair in trajectory.points.windows(2) {
                let ratio =
                    relativity::velocity_ratio(pair[1].0 - source.x, pair[1].1 - source.t) as f32;
                let color = [0.3 + 0.7 * ratio, 0.8 - 0.5 * ratio, 1.0 - 0.7 * ratio, 0.95];
                lines.push(LineVertex::new(pair[0].0, pair[0].1, color));
                lines.push(LineVertex::new(pair[1].0, pair[1].1, color));
            }
        }

        // Isochrone through the selected frame, measured from its source
        if let Some(selected) = scene.diagram.frames.get(scene.selected) {
            let (origin, target) = match selected.source {
                Some(s) => (scene.diagram.frames[s], Some(*selected)),
                None => (*selected, None),
            };
            let points =
                trajectories::isochrone_points(scene.tau, &origin, target.as_ref(), x_min, x_max);
            let color = [0.4, 1.0, 0.7, 0.8];
            for pair in points.windows(2) {
                lines.push(LineVertex::new(pair[0].0, pair[0].1, color));
                lines.push(LineVertex::new(pair[1].0, pair[1].1, color));
            }
        }

        lines.truncate(self.max_line_vertices);
        if lines.len() % 2 == 1 {
            lines.pop();
        }
        lines
    }

    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        num_instances: u32,
        num_line_vertices: u32,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.015,
                        g: 0.015,
                        b: 0.04,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.line_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.line_buffer.slice(..));
        render_pass.draw(0..num_line_vertices, 0..1);

        render_pass.set_pipeline(&self.marker_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.draw(0..6, 0..num_instances);
    }
}
