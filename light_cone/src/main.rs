//! Light Cone Diagram Editor
//!
//! An interactive Minkowski diagram: space runs horizontally, coordinate
//! time runs up. Drag inside a frame's future light cone to launch a new
//! accelerated observer toward that event; the editor computes the
//! hyperbolic worldline, the proper time aboard, and the cumulative
//! velocity along the whole causal chain. Placements outside the light
//! cone are rejected continuously while dragging.
//!
//! Controls:
//! - Left drag from empty space: Create a frame reachable from the selection
//! - Left drag on a marker: Move that frame (causal links stay enforced)
//! - Right click / Escape: Cancel the current drag
//! - Delete: Remove the selected frame and its descendants
//! - D: Load the twin paradox demo, R: Reset, C: Toggle past cones
//! - Scroll: Zoom, W/A/S/arrows: Pan

mod equations_ui;
mod frames;
mod relativity;
mod renderer;
mod trajectories;

use common::{Camera2D, GraphicsContext};
use equations_ui::{draw_equations_sidebar, LIGHT_CONE_EQUATIONS, LIGHT_CONE_VARIABLES};
use frames::Diagram;
use glam::{Vec2, Vec3};
use renderer::{Renderer, Scene};
use trajectories::{twin_paradox_demo, TwinParadoxConfig};
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
    window::CursorIcon,
};

const MAX_INSTANCES: usize = 512;
const MAX_LINE_VERTICES: usize = 100_000;

/// Interaction state machine for frame creation and movement
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// Dragging a prospective frame out of `source`'s future light cone
    NewFrame { source: usize },
    /// Dragging an existing frame, remembering where it started
    ExistingFrame { index: usize, original: (f64, f64) },
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
    diagram: Diagram,
    selected: usize,
    drag: DragState,
    cursor: Vec2,
    tau: f64,
    show_past_cones: bool,
    egui: EguiState,
}

impl App {
    fn new(ctx: GraphicsContext) -> Self {
        let renderer = Renderer::new(&ctx, MAX_INSTANCES, MAX_LINE_VERTICES);

        let mut camera = Camera2D::new(ctx.aspect_ratio());
        camera.position = Vec3::new(0.0, 140.0, 0.0);
        camera.zoom = 170.0;

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
            diagram: Diagram::new(),
            selected: 0,
            drag: DragState::Idle,
            cursor: Vec2::ZERO,
            tau: 50.0,
            show_past_cones: false,
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        }
    }

    fn cursor_world(&self) -> (f64, f64) {
        let w = self
            .camera
            .screen_to_world(self.cursor, (self.ctx.size.width, self.ctx.size.height));
        (w.x as f64, w.y as f64)
    }

    /// Visible world extents as (x_min, t_min, x_max, t_max)
    fn view_extents(&self) -> (f64, f64, f64, f64) {
        let half_w = (self.camera.zoom * self.camera.aspect_ratio) as f64;
        let half_h = self.camera.zoom as f64;
        let cx = self.camera.position.x as f64;
        let cy = self.camera.position.y as f64;
        (cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Frame marker under the cursor, if any
    fn frame_at_cursor(&self) -> Option<usize> {
        let (x, t) = self.cursor_world();
        let pick_radius = (self.camera.zoom * 0.035) as f64;

        self.diagram
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                let d = ((f.x - x).powi(2) + (f.t - t).powi(2)).sqrt();
                d <= pick_radius
            })
            .min_by(|a, b| {
                let da = (a.1.x - x).powi(2) + (a.1.t - t).powi(2);
                let db = (b.1.x - x).powi(2) + (b.1.t - t).powi(2);
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
    }

    fn handle_mouse(&mut self, button: MouseButton, state: ElementState) {
        let (x, t) = self.cursor_world();

        match (button, state) {
            (MouseButton::Left, ElementState::Pressed) => {
                if let Some(index) = self.frame_at_cursor() {
                    self.selected = index;
                    if index != 0 {
                        let frame = self.diagram.frames[index];
                        self.drag = DragState::ExistingFrame {
                            index,
                            original: (frame.x, frame.t),
                        };
                    }
                } else {
                    let source = self.selected;
                    let src = self.diagram.frames[source];
                    if relativity::is_reachable_from(x, t, &src) {
                        self.drag = DragState::NewFrame { source };
                    }
                }
            }
            (MouseButton::Left, ElementState::Released) => {
                if let DragState::NewFrame { source } = self.drag {
                    if let Some(index) = self.diagram.add_frame(x, t, source) {
                        self.selected = index;
                    }
                }
                self.drag = DragState::Idle;
                self.ctx.window.set_cursor_icon(CursorIcon::Default);
            }
            (MouseButton::Right, ElementState::Pressed) => self.cancel_drag(),
            _ => {}
        }
    }

    fn handle_cursor_moved(&mut self) {
        let (x, t) = self.cursor_world();

        match self.drag {
            DragState::NewFrame { source } => {
                let src = self.diagram.frames[source];
                let valid = relativity::is_reachable_from(x, t, &src);
                self.ctx.window.set_cursor_icon(if valid {
                    CursorIcon::Crosshair
                } else {
                    CursorIcon::NotAllowed
                });
            }
            DragState::ExistingFrame { index, .. } => {
                // Moves apply live; an invalid target leaves the model as-is
                let moved = self.diagram.move_frame(index, x, t);
                self.ctx.window.set_cursor_icon(if moved {
                    CursorIcon::Grabbing
                } else {
                    CursorIcon::NotAllowed
                });
            }
            DragState::Idle => {}
        }
    }

    fn cancel_drag(&mut self) {
        if let DragState::ExistingFrame { index, original } = self.drag {
            self.diagram.move_frame(index, original.0, original.1);
        }
        self.drag = DragState::Idle;
        self.ctx.window.set_cursor_icon(CursorIcon::Default);
    }

    fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        match key {
            KeyCode::Escape => self.cancel_drag(),
            KeyCode::Delete | KeyCode::Backspace => {
                if self.selected != 0 {
                    let removed = self.diagram.remove_frame(self.selected);
                    log::info!("removed {} frame(s)", removed);
                    self.selected = 0;
                    self.drag = DragState::Idle;
                }
            }
            KeyCode::KeyD => self.load_demo(),
            KeyCode::KeyR => {
                self.diagram = Diagram::new();
                self.selected = 0;
                self.drag = DragState::Idle;
            }
            KeyCode::KeyC => self.show_past_cones = !self.show_past_cones,
            KeyCode::ArrowUp | KeyCode::KeyW => self.camera.position.y += self.camera.zoom * 0.1,
            KeyCode::ArrowDown | KeyCode::KeyS => self.camera.position.y -= self.camera.zoom * 0.1,
            KeyCode::ArrowLeft | KeyCode::KeyA => self.camera.position.x -= self.camera.zoom * 0.1,
            KeyCode::ArrowRight => self.camera.position.x += self.camera.zoom * 0.1,
            _ => {}
        }
    }

    fn handle_scroll(&mut self, delta: f32) {
        self.camera.zoom *= 1.0 - delta * 0.1;
        self.camera.zoom = self.camera.zoom.clamp(20.0, 1000.0);
    }

    fn load_demo(&mut self) {
        let frames = twin_paradox_demo(&TwinParadoxConfig::default());
        self.diagram = Diagram::from_frames(frames);
        self.selected = self.diagram.frames.len() - 1;
        self.drag = DragState::Idle;
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(&self.ctx.queue, &self.camera);

        let preview = match self.drag {
            DragState::NewFrame { source } => {
                let (x, t) = self.cursor_world();
                let src = self.diagram.frames[source];
                Some((x, t, relativity::is_reachable_from(x, t, &src)))
            }
            _ => None,
        };

        let scene = Scene {
            diagram: &self.diagram,
            selected: self.selected,
            tau: self.tau,
            show_past_cones: self.show_past_cones,
            preview,
            view: self.view_extents(),
        };
        let (num_instances, num_line_vertices) =
            self.renderer.update_scene(&self.ctx.queue, &scene);

        // Build egui UI
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let window_size = (self.ctx.size.width, self.ctx.size.height);
        let camera = self.camera.clone();
        let diagram = &self.diagram;
        let selected = self.selected;
        let tau = &mut self.tau;
        let show_past_cones = &mut self.show_past_cones;
        let mut load_demo_clicked = false;

        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            draw_equations_sidebar(
                ctx,
                "Light Cones & Proper Time",
                LIGHT_CONE_EQUATIONS,
                LIGHT_CONE_VARIABLES,
            );

            let total = relativity::cumulative_physics(&diagram.frames, selected);
            egui::TopBottomPanel::top("status").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("Frames: {}", diagram.frames.len()));
                    ui.separator();
                    ui.label(format!("Selected: #{selected}"));
                    ui.separator();
                    ui.label(format!("v = {:.3}c", total.velocity));
                    ui.separator();
                    ui.label(format!(
                        "τ = {:.1}  T = {:.1}",
                        total.proper_time, total.coordinate_time
                    ));
                    ui.separator();
                    let dilation = if total.coordinate_time > 0.0 {
                        (total.coordinate_time - total.proper_time) / total.coordinate_time * 100.0
                    } else {
                        0.0
                    };
                    ui.label(format!("Dilation: {:.2}%", dilation));
                });
            });

            egui::Window::new("Diagram").show(ctx, |ui| {
                ui.add(egui::Slider::new(tau, 1.0..=200.0).text("isochrone τ"));
                ui.checkbox(show_past_cones, "Show past cones");
                if ui.button("Twin paradox demo").clicked() {
                    load_demo_clicked = true;
                }
                let analysis = trajectories::cumulative_trajectory(&diagram.frames);
                ui.separator();
                ui.label(format!(
                    "Whole chain: τ {:.1} over T {:.1} ({:.2}% dilation)",
                    analysis.total.proper_time,
                    analysis.total.coordinate_time,
                    analysis.total.time_dilation_percentage
                ));
            });

            // One draggable cartouche per frame with its chain physics
            for i in 0..diagram.frames.len() {
                let frame = diagram.frames[i];
                let physics = relativity::cumulative_physics(&diagram.frames, i);
                let anchor = camera.world_to_screen(
                    Vec2::new(frame.x as f32, frame.t as f32),
                    window_size,
                );

                egui::Area::new(egui::Id::new(("cartouche", i)))
                    .movable(true)
                    .default_pos(egui::pos2(anchor.x + 14.0, anchor.y - 28.0))
                    .show(ctx, |ui| {
                        egui::Frame::popup(ui.style()).show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(format!("#{i}"))
                                    .strong()
                                    .color(egui::Color32::LIGHT_YELLOW),
                            );
                            ui.label(format!("x {:.1}, t {:.1}", frame.x, frame.t));
                            ui.label(format!(
                                "v {:.3}c  τ {:.1}",
                                physics.velocity, physics.proper_time
                            ));
                        });
                    });
            }
        });

        if load_demo_clicked {
            self.load_demo();
        }

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
        "Light Cone Editor - Rust/wgpu",
        1280,
        720,
    ));

    let mut app = App::new(ctx);

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
                                app.handle_cursor_moved();
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
                            WindowEvent::RedrawRequested => match app.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                                Err(e) => eprintln!("Render error: {:?}", e),
                            },
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
