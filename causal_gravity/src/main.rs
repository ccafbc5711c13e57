//! Causal Gravity Sandbox
//!
//! A 2D Newtonian gravity playground where changes to the mass field do
//! not act instantaneously: every mutation spawns a propagation front that
//! carries the new field outward at a fixed finite speed, and every probe
//! object (spacecraft, lasers, clocks) only ever reacts to the
//! configuration that has causally reached its grid cell.
//!
//! Controls:
//! - 1/2/3/4/5/6: Select tool (mass, black hole, spacecraft, laser, clock, geodesic)
//! - Left click: Place / grow (drag to aim spacecraft and lasers)
//! - Right click: Shrink / remove
//! - Space: Pause/resume simulation
//! - P: Scatter a ring of planets
//! - R: Clear everything
//! - Scroll: Zoom, WASD/arrows: Pan

mod equations_ui;
mod geodesics;
mod masses;
mod objects;
mod physics;
mod propagation;
mod renderer;
mod sim;
mod versioning;

use common::{Camera2D, GraphicsContext};
use equations_ui::{draw_equations_sidebar, CAUSAL_GRAVITY_EQUATIONS, CAUSAL_GRAVITY_VARIABLES};
use glam::{Vec2, Vec3};
use masses::MassKind;
use renderer::Renderer;
use sim::{GravitySim, WORLD_SIZE};
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

const MAX_INSTANCES: usize = 4000;
const MAX_LINE_VERTICES: usize = 200_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    Mass,
    BlackHole,
    Spacecraft,
    Laser,
    Clock,
    Geodesic,
}

impl Tool {
    fn label(&self) -> &'static str {
        match self {
            Tool::Mass => "Mass",
            Tool::BlackHole => "Black hole",
            Tool::Spacecraft => "Spacecraft",
            Tool::Laser => "Laser",
            Tool::Clock => "Clock",
            Tool::Geodesic => "Geodesic",
        }
    }
}

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: Renderer,
    camera: Camera2D,
    sim: GravitySim,
    egui: EguiState,
    tool: Tool,
    cursor: Vec2,
    aim_start: Option<Vec2>,
}

impl App {
    fn new(ctx: GraphicsContext) -> Self {
        let renderer = Renderer::new(&ctx, MAX_INSTANCES, MAX_LINE_VERTICES);

        let mut camera = Camera2D::new(ctx.aspect_ratio());
        camera.position = Vec3::new(WORLD_SIZE / 2.0, WORLD_SIZE / 2.0, 0.0);
        camera.zoom = WORLD_SIZE * 0.55;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            camera,
            sim: GravitySim::new(),
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
            tool: Tool::Mass,
            cursor: Vec2::ZERO,
            aim_start: None,
        }
    }

    fn cursor_world(&self) -> Vec2 {
        self.camera
            .screen_to_world(self.cursor, (self.ctx.size.width, self.ctx.size.height))
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
    }

    fn update(&mut self, dt: f32) {
        self.sim.update(dt);
    }

    fn handle_mouse(&mut self, button: MouseButton, state: ElementState) {
        let world = self.cursor_world();

        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => match self.tool {
                Tool::Mass => self.sim.click_mass(MassKind::Normal, world, false),
                Tool::BlackHole => self.sim.click_mass(MassKind::BlackHole, world, false),
                Tool::Spacecraft | Tool::Laser => self.aim_start = Some(world),
                Tool::Clock => self.sim.add_clock(world),
                Tool::Geodesic => self.sim.add_geodesic(world),
            },
            (MouseButton::Left, ElementState::Released) => {
                if let Some(start) = self.aim_start.take() {
                    let dir = world - start;
                    match self.tool {
                        Tool::Spacecraft => self.sim.add_spacecraft(start, dir),
                        Tool::Laser => self.sim.add_laser(start, dir),
                        _ => {}
                    }
                }
            }
            (MouseButton::Right, ElementState::Pressed) => match self.tool {
                Tool::Mass => self.sim.click_mass(MassKind::Normal, world, true),
                Tool::BlackHole => self.sim.click_mass(MassKind::BlackHole, world, true),
                _ => self.aim_start = None,
            },
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        match key {
            KeyCode::Digit1 => self.tool = Tool::Mass,
            KeyCode::Digit2 => self.tool = Tool::BlackHole,
            KeyCode::Digit3 => self.tool = Tool::Spacecraft,
            KeyCode::Digit4 => self.tool = Tool::Laser,
            KeyCode::Digit5 => self.tool = Tool::Clock,
            KeyCode::Digit6 => self.tool = Tool::Geodesic,
            KeyCode::Space => self.sim.paused = !self.sim.paused,
            KeyCode::KeyP => self.sim.scatter_preset(10),
            KeyCode::KeyR => self.sim.clear(),
            KeyCode::Escape => self.aim_start = None,
            KeyCode::ArrowUp | KeyCode::KeyW => self.camera.position.y += self.camera.zoom * 0.1,
            KeyCode::ArrowDown | KeyCode::KeyS => self.camera.position.y -= self.camera.zoom * 0.1,
            KeyCode::ArrowLeft | KeyCode::KeyA => self.camera.position.x -= self.camera.zoom * 0.1,
            KeyCode::ArrowRight | KeyCode::KeyD => self.camera.position.x += self.camera.zoom * 0.1,
            _ => {}
        }
    }

    fn handle_scroll(&mut self, delta: f32) {
        self.camera.zoom *= 1.0 - delta * 0.1;
        self.camera.zoom = self.camera.zoom.clamp(50.0, 2000.0);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(&self.ctx.queue, &self.camera);
        let (num_instances, num_line_vertices) =
            self.renderer.update_scene(&self.ctx.queue, &self.sim);

        // Build egui UI
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let sim = &mut self.sim;
        let tool = self.tool;
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            draw_equations_sidebar(
                ctx,
                "Causal Gravity",
                CAUSAL_GRAVITY_EQUATIONS,
                CAUSAL_GRAVITY_VARIABLES,
            );

            egui::TopBottomPanel::top("status").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("Tool: {}", tool.label()));
                    ui.separator();
                    ui.label(format!("t = {:.1}s", sim.sim_time));
                    ui.separator();
                    ui.label(format!("Masses: {}", sim.masses.len()));
                    ui.separator();
                    ui.label(format!(
                        "Version: {} ({} kept)",
                        sim.store.latest_version(),
                        sim.store.history.len()
                    ));
                    ui.separator();
                    ui.label(format!("Fronts: {}", sim.fronts.len()));
                    ui.separator();
                    if sim.paused {
                        ui.label(egui::RichText::new("PAUSED").color(egui::Color32::YELLOW));
                    } else {
                        ui.label(egui::RichText::new("RUNNING").color(egui::Color32::GREEN));
                    }
                });
            });

            egui::Window::new("Geodesic Settings")
                .default_open(false)
                .show(ctx, |ui| {
                    let mut changed = false;
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut sim.geodesic_settings.curve_step, 1.0..=12.0)
                                .text("curve step"),
                        )
                        .changed();
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut sim.geodesic_settings.max_steps, 100..=5000)
                                .text("max steps"),
                        )
                        .changed();
                    if changed {
                        sim.recalculate_geodesics();
                    }
                });
        });

        self.egui
            .state
            .handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self
            .egui
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui
                .renderer
                .update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer
            .render(&mut encoder, &view, num_instances, num_line_vertices);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui
                .renderer
                .render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui
            .state
            .on_window_event(&self.ctx.window, event)
            .consumed
    }
}

fn main() {
    let (ctx, event_loop) = pollster::block_on(GraphicsContext::new(
        "Causal Gravity Sandbox - Rust/wgpu",
        1280,
        720,
    ));

    let mut app = App::new(ctx);
    let mut last_time = std::time::Instant::now();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { ref event, .. } => {
                    let consumed = app.handle_window_event(event);

                    if !consumed {
                        match event {
                            WindowEvent::CloseRequested => elwt.exit(),
                            WindowEvent::Resized(size) => app.resize(*size),
                            WindowEvent::CursorMoved { position, .. } => {
                                app.cursor = Vec2::new(position.x as f32, position.y as f32);
                            }
                            WindowEvent::MouseInput { button, state, .. } => {
                                app.handle_mouse(*button, *state);
                            }
                            WindowEvent::KeyboardInput {
                                event:
                                    KeyEvent {
                                        physical_key: PhysicalKey::Code(key),
                                        state,
                                        ..
                                    },
                                ..
                            } => app.handle_key(*key, *state),
                            WindowEvent::MouseWheel { delta, .. } => {
                                let scroll = match delta {
                                    MouseScrollDelta::LineDelta(_, y) => *y,
                                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                                };
                                app.handle_scroll(scroll);
                            }
                            WindowEvent::RedrawRequested => {
                                let now = std::time::Instant::now();
                                let dt = (now - last_time).as_secs_f32().min(0.1);
                                last_time = now;

                                app.update(dt);
                                match app.render() {
                                    Ok(_) => {}
                                    Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                                    Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                                    Err(e) => eprintln!("Render error: {:?}", e),
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Event::AboutToWait => {
                    app.ctx.window.request_redraw();
                }
                _ => {}
            }
        })
        .expect("Event loop error");
}
