//! Rendering system for the causal gravity sandbox
//!
//! Two pipelines: instanced quads shaded into circles for masses and
//! objects, and a line list for fronts, trails, geodesics, and the
//! version grid tint.

use common::{Camera2D, CameraUniform, GraphicsContext};
use glam::Vec2;
use std::f32::consts::TAU;
use wgpu::util::DeviceExt;

use crate::masses::MassKind;
use crate::physics;
use crate::sim::GravitySim;

/// Instance data for GPU rendering
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CircleInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
}

impl CircleInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        2 => Float32x3,
        3 => Float32,
        4 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CircleInstance>() as wgpu::BufferAddress,
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

    fn new(p: Vec2, color: [f32; 4]) -> Self {
        Self {
            position: [p.x, p.y, 0.0],
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

const FRONT_RING_SEGMENTS: usize = 64;

pub struct Renderer {
    circle_pipeline: wgpu::RenderPipeline,
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
            label: Some("Gravity Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/gravity.wgsl").into()),
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

        let circle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Circle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_instanced",
                buffers: &[QuadVertex::layout(), CircleInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_instanced",
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
            size: (std::mem::size_of::<CircleInstance>() * max_instances) as u64,
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
            circle_pipeline,
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

    /// Rebuild the GPU buffers from the current simulation state.
    /// Returns (instance count, line vertex count) for the draw calls.
    pub fn update_scene(&self, queue: &wgpu::Queue, sim: &GravitySim) -> (u32, u32) {
        let instances = self.build_instances(sim);
        let lines = self.build_lines(sim);

        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&lines));

        (instances.len() as u32, lines.len() as u32)
    }

    fn build_instances(&self, sim: &GravitySim) -> Vec<CircleInstance> {
        let mut instances = Vec::new();

        for mass in &sim.masses {
            let (radius, color) = match mass.kind {
                MassKind::Normal => (
                    (mass.mass / 1000.0).powf(1.0 / 3.0) * 6.0,
                    [1.0, 0.9, 0.5, 1.0],
                ),
                MassKind::Planet => (
                    (mass.mass / 1000.0).powf(1.0 / 3.0) * 6.0,
                    [0.4, 0.7, 1.0, 1.0],
                ),
                MassKind::BlackHole => (
                    physics::schwarzschild_radius(mass.mass).max(4.0),
                    [0.25, 0.05, 0.35, 1.0],
                ),
            };
            instances.push(CircleInstance {
                position: [mass.position.x, mass.position.y, 0.0],
                radius,
                color,
            });
        }

        for ship in &sim.spacecraft {
            instances.push(CircleInstance {
                position: [ship.position.x, ship.position.y, 0.0],
                radius: 5.0,
                color: [0.2, 0.9, 0.3, 1.0],
            });
        }

        for laser in &sim.lasers {
            instances.push(CircleInstance {
                position: [laser.position.x, laser.position.y, 0.0],
                radius: 3.0,
                color: [1.0, 0.2 + 0.6 * laser.redshift, 0.2, 1.0],
            });
        }

        for clock in &sim.clocks {
            // Slower clocks shift toward red
            let t = 1.0 - clock.rate.clamp(0.0, 1.0);
            instances.push(CircleInstance {
                position: [clock.position.x, clock.position.y, 0.0],
                radius: 6.0,
                color: [0.5 + 0.5 * t, 0.6 * (1.0 - t), 1.0 - t, 1.0],
            });
        }

        instances.truncate(self.max_instances);
        instances
    }

    fn build_lines(&self, sim: &GravitySim) -> Vec<LineVertex> {
        let mut lines = Vec::new();
        let latest = sim.store.latest_version().max(1) as f32;

        // Version grid: a small tick at each cell center, brighter the more
        // recent the causal information recorded there
        for gx in 0..sim.store.cols() {
            for gy in 0..sim.store.rows() {
                let version = sim.store.cell_version(gx as i32, gy as i32);
                let center = sim.store.cell_center(gx, gy);
                let age = version as f32 / latest;
                let color = [0.2 + 0.6 * age, 0.25, 0.45 - 0.2 * age, 0.35];
                let half = 3.0;
                lines.push(LineVertex::new(center - Vec2::new(half, 0.0), color));
                lines.push(LineVertex::new(center + Vec2::new(half, 0.0), color));
                lines.push(LineVertex::new(center - Vec2::new(0.0, half), color));
                lines.push(LineVertex::new(center + Vec2::new(0.0, half), color));
            }
        }

        // Propagation fronts as expanding rings, fading as they grow
        let diagonal = sim.world.length();
        for front in &sim.fronts {
            let radius = front.radius(sim.sim_time, sim.store.spacing);
            if radius <= 0.0 {
                continue;
            }
            let alpha = (1.0 - radius / diagonal).clamp(0.0, 1.0) * 0.8;
            let color = match front.kind {
                MassKind::BlackHole => [0.8, 0.3, 1.0, alpha],
                _ if front.mass_change < 0.0 => [1.0, 0.5, 0.2, alpha],
                _ => [0.3, 0.8, 1.0, alpha],
            };
            for i in 0..FRONT_RING_SEGMENTS {
                let a0 = TAU * i as f32 / FRONT_RING_SEGMENTS as f32;
                let a1 = TAU * (i + 1) as f32 / FRONT_RING_SEGMENTS as f32;
                lines.push(LineVertex::new(
                    front.origin + Vec2::new(a0.cos(), a0.sin()) * radius,
                    color,
                ));
                lines.push(LineVertex::new(
                    front.origin + Vec2::new(a1.cos(), a1.sin()) * radius,
                    color,
                ));
            }
        }

        // Trails and geodesics as polylines
        for ship in &sim.spacecraft {
            push_polyline(&mut lines, &ship.trail, [0.2, 0.9, 0.3, 0.5]);
        }
        for laser in &sim.lasers {
            push_polyline(&mut lines, &laser.trail, [1.0, 0.3, 0.3, 0.6]);
        }
        for curve in &sim.geodesics {
            push_polyline(&mut lines, curve, [0.3, 0.9, 0.9, 0.8]);
        }

        lines.truncate(self.max_line_vertices);
        // LineList needs an even vertex count
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
                        r: 0.02,
                        g: 0.02,
                        b: 0.05,
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

        render_pass.set_pipeline(&self.circle_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.draw(0..6, 0..num_instances);
    }
}

fn push_polyline(lines: &mut Vec<LineVertex>, points: &[Vec2], color: [f32; 4]) {
    for pair in points.windows(2) {
        lines.push(LineVertex::new(pair[0], color));
        lines.push(LineVertex::new(pair[1], color));
    }
}
