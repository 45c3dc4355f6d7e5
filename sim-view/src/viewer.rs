//! Interactive hair viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the head mesh, the strand
//! field, the collider volumes and the camera, and implements
//! [`eframe::App`] to animate the head and draw the strands with an egui
//! painter.

use eframe::App;
use glam::{Quat, Vec3};
use hair_core::{
    collider::SphereCollider,
    config::Config,
    dynamics::StrandDynamics,
    field::{StrandField, StrandSegment},
    mesh::Mesh,
    transform::HeadTransform,
};

const SKIN: Vec3 = Vec3::new(0.9, 0.75, 0.65);
const HAIR: Vec3 = Vec3::new(0.12, 0.08, 0.05);

/// Builds the stand-in head: a unit sphere with a dark cap tilted toward
/// the back of the head.
pub fn demo_head() -> Mesh {
    let mut mesh = Mesh::uv_sphere(1.0, 32, 48, SKIN);
    mesh.paint_cap(Vec3::new(0.0, 1.0, -0.35), 0.35, HAIR);
    mesh
}

/// Orbit camera with an orthographic projection.
///
/// `theta` spins around the vertical axis and `phi` tilts, both in
/// degrees. `zoom` is pixels per world unit; `pan` is a screen offset.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub theta: f32,
    pub phi: f32,
    pub zoom: f32,
    pub pan: egui::Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            theta: 0.0,
            phi: 25.0,
            zoom: 150.0,
            pan: egui::vec2(0.0, 0.0),
        }
    }
}

impl Camera {
    fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.phi.to_radians()) * Quat::from_rotation_y(self.theta.to_radians())
    }

    /// World to view space; `+z` points at the viewer.
    pub fn world_to_view(&self, p: Vec3) -> Vec3 {
        self.rotation() * p
    }

    /// Rotates a direction into view space.
    pub fn dir_to_view(&self, d: Vec3) -> Vec3 {
        self.rotation() * d
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The view-space x/y are scaled by `zoom`, offset by `pan`, and then
    /// centered inside `rect`, with the y-axis flipped.
    pub fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        let v = self.world_to_view(p);
        let center = rect.center();
        egui::pos2(
            center.x + v.x * self.zoom + self.pan.x,
            center.y - v.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Camera::world_to_screen`] onto the `z = 0` view plane.
    pub fn screen_to_view(&self, p: egui::Pos2, rect: egui::Rect) -> Vec3 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec3::new(x, y, 0.0)
    }

    /// Orbits by a mouse drag, half a degree per pixel; `phi` stays in
    /// `[-90, 90]`.
    pub fn orbit(&mut self, delta: egui::Vec2) {
        self.theta += delta.x * 0.5;
        self.phi = (self.phi + delta.y * 0.5).clamp(-90.0, 90.0);
    }
}

/// Animated head pose: a steady spin about the vertical axis plus a
/// sinusoidal nod.
#[derive(Clone, Copy, Debug)]
pub struct HeadPose {
    pub time: f32,
    pub yaw: f32,
    /// Radians per second.
    pub spin_rate: f32,
    /// Peak nod angle in radians.
    pub nod_amplitude: f32,
    /// Nod frequency in radians per second.
    pub nod_rate: f32,
}

impl Default for HeadPose {
    fn default() -> Self {
        Self {
            time: 0.0,
            yaw: 0.0,
            spin_rate: 0.8,
            nod_amplitude: 0.3,
            nod_rate: 2.0,
        }
    }
}

impl HeadPose {
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
        self.yaw = (self.yaw + self.spin_rate * dt) % std::f32::consts::TAU;
    }

    pub fn pitch(&self) -> f32 {
        self.nod_amplitude * (self.nod_rate * self.time).sin()
    }

    pub fn transform(&self) -> HeadTransform {
        HeadTransform::from_yaw_pitch(self.yaw, self.pitch(), Vec3::ZERO)
    }
}

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`StrandField`], [`StrandDynamics`],
///   [`SphereCollider`]s and the [`Config`].
/// - The head animation ([`HeadPose`]) that produces a [`HeadTransform`]
///   every frame.
/// - The [`Camera`] and display toggles.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true`, call [`Viewer::step_once`] with the frame time.
/// 3. Render the head, strands and colliders.
pub struct Viewer {
    head_mesh: Mesh,
    field: Option<StrandField>,
    placement_error: Option<String>,
    colliders: Vec<SphereCollider>,
    cfg: Config,

    pose: HeadPose,
    head: HeadTransform,

    camera: Camera,
    running: bool,
    colliders_enabled: bool,
    fixed_length: bool,
    show_anchors: bool,

    max_dt: f32,
    last_frame_time: f64,
    last_step_dt: f32,
}

impl Viewer {
    /// Creates a viewer over [`demo_head`] and places strands with `cfg`.
    ///
    /// One collider sits just above the forehead.
    pub fn new(cfg: Config) -> Self {
        let mut viewer = Self {
            head_mesh: demo_head(),
            field: None,
            placement_error: None,
            colliders: vec![SphereCollider::new(Vec3::new(0.0, 0.9, 0.9), 0.35)],
            cfg,
            pose: HeadPose::default(),
            head: HeadTransform::IDENTITY,
            camera: Camera::default(),
            running: false,
            colliders_enabled: true,
            fixed_length: false,
            show_anchors: false,
            max_dt: 0.1,
            last_frame_time: 0.0,
            last_step_dt: 0.0,
        };
        viewer.reset();
        viewer
    }

    /// Re-places every strand with the current configuration and puts the
    /// head back in its rest pose.
    ///
    /// A placement failure leaves the viewer without strands and keeps the
    /// message for the status bar.
    fn reset(&mut self) {
        self.pose = HeadPose {
            time: 0.0,
            yaw: 0.0,
            ..self.pose
        };
        self.head = HeadTransform::IDENTITY;
        self.running = false;

        match StrandField::from_config(Some(&self.head_mesh), &self.cfg) {
            Ok(field) => {
                self.field = Some(field);
                self.placement_error = None;
            }
            Err(e) => {
                log::error!("strand placement failed: {e}");
                self.field = None;
                self.placement_error = Some(e.to_string());
            }
        }
    }

    /// Advances the head pose and the strands by `dt` seconds.
    ///
    /// `dt` is clamped to `[0, max_dt]` so a stalled frame cannot blow up
    /// the integration.
    fn step_once(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, self.max_dt);
        self.last_step_dt = dt;

        self.pose.advance(dt);
        self.head = self.pose.transform();

        let Some(field) = self.field.as_mut() else {
            return;
        };

        let mut dynamics = StrandDynamics::from_config(&self.cfg);
        if self.colliders_enabled {
            dynamics = dynamics.with_colliders(&self.colliders);
        }
        dynamics.step(&mut field.strands, dt, &self.head);
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                    self.last_frame_time = ctx.input(|i| i.time);
                }

                if ui.button("Step").clicked() {
                    self.step_once(1.0 / 60.0);
                }

                if ui.button("Re-place").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.camera.zoom, 20.0..=600.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (strand count, placement outcome, dt).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.4} s", self.last_step_dt));
                ui.separator();
                match (&self.field, &self.placement_error) {
                    (Some(field), _) => {
                        let report = field.report();
                        ui.label(format!("strands = {}", field.len()));
                        ui.label(format!(
                            "attempts = {} (rejected {})",
                            report.attempts, report.rejected
                        ));
                        ui.label(format!("spawn triangles = {}", report.spawn_triangles));
                    }
                    (None, Some(err)) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, err);
                    }
                    (None, None) => {
                        ui.label("no strands");
                    }
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Placement (applied on Re-place)");
                Self::labeled_drag_usize(
                    ui,
                    "max_num_spawns:",
                    &mut self.cfg.max_num_spawns,
                    0..=20_000,
                    10.0,
                );
                Self::labeled_drag_f32(
                    ui,
                    "color_threshold:",
                    &mut self.cfg.color_threshold,
                    0.0..=1.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "min_separation:",
                    &mut self.cfg.min_separation,
                    0.0..=1.0,
                    0.005,
                );
                Self::labeled_drag_f32(
                    ui,
                    "hair_length:",
                    &mut self.cfg.hair_length,
                    0.01..=3.0,
                    0.01,
                );
                ui.checkbox(&mut self.cfg.ribbon, "ribbon anchors");
                Self::labeled_drag_f32(
                    ui,
                    "ribbon_spread:",
                    &mut self.cfg.ribbon_spread,
                    0.0..=2.0,
                    0.01,
                );

                ui.separator();
                ui.label("Spring");
                Self::labeled_drag_f32(ui, "k_anchor:", &mut self.cfg.k_anchor, 0.0..=100.0, 0.1);
                Self::labeled_drag_f32(ui, "damping:", &mut self.cfg.damping, 0.0..=50.0, 0.05);
                Self::labeled_drag_f32(ui, "max dt:", &mut self.max_dt, 0.001..=0.5, 0.001);

                ui.separator();
                ui.label("Head motion");
                Self::labeled_drag_f32(ui, "spin rate:", &mut self.pose.spin_rate, -6.0..=6.0, 0.05);
                Self::labeled_drag_f32(
                    ui,
                    "nod amplitude:",
                    &mut self.pose.nod_amplitude,
                    0.0..=1.5,
                    0.01,
                );
                Self::labeled_drag_f32(ui, "nod rate:", &mut self.pose.nod_rate, 0.0..=12.0, 0.05);

                ui.separator();
                ui.label("Colliders");
                ui.checkbox(&mut self.colliders_enabled, "enabled");
                for (i, c) in self.colliders.iter_mut().enumerate() {
                    Self::labeled_drag_f32(ui, &format!("radius {i}:"), &mut c.radius, 0.0..=2.0, 0.01);
                }

                ui.separator();
                ui.label("Display");
                ui.checkbox(&mut self.fixed_length, "constant strand length");
                ui.checkbox(&mut self.show_anchors, "show anchors");

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = Config::default();
                }
            });
    }

    /// Paints the head triangles facing the camera, far to near.
    fn paint_head(&self, painter: &egui::Painter, rect: egui::Rect) {
        let light = Vec3::new(0.3, 0.6, 1.0).normalize();
        let mut faces: Vec<(f32, [egui::Pos2; 3], egui::Color32)> =
            Vec::with_capacity(self.head_mesh.triangle_count());

        for i in 0..self.head_mesh.triangle_count() {
            let idx = self.head_mesh.triangle_indices(i);
            let normal = idx
                .iter()
                .map(|&k| self.head_mesh.normals[k])
                .sum::<Vec3>();
            let n_view = self
                .camera
                .dir_to_view(self.head.transform_vector(normal))
                .normalize_or_zero();
            if n_view.z <= 0.0 {
                continue;
            }

            let world = idx.map(|k| self.head.transform_point(self.head_mesh.vertices[k]));
            let depth = world.iter().map(|&p| self.camera.world_to_view(p).z).sum::<f32>();
            let pts = world.map(|p| self.camera.world_to_screen(p, rect));

            let albedo = idx.iter().map(|&k| self.head_mesh.colors[k]).sum::<Vec3>() / 3.0;
            let shade = 0.35 + 0.65 * n_view.dot(light).max(0.0);
            let c = (albedo * shade * 255.0).clamp(Vec3::ZERO, Vec3::splat(255.0));

            faces.push((depth, pts, egui::Color32::from_rgb(c.x as u8, c.y as u8, c.z as u8)));
        }

        faces.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, pts, color) in faces {
            painter.add(egui::Shape::convex_polygon(pts.to_vec(), color, egui::Stroke::NONE));
        }
    }

    /// Paints strands whose root faces the camera (`front == true`) or
    /// faces away from it.
    fn paint_strands(&self, painter: &egui::Painter, rect: egui::Rect, front: bool) {
        let Some(field) = &self.field else {
            return;
        };
        let root_stroke = egui::Stroke::new(2.0, egui::Color32::from_rgb(255, 0, 255));

        let segments: Box<dyn Iterator<Item = StrandSegment> + '_> = if self.fixed_length {
            Box::new(field.display_segments(&self.head))
        } else {
            Box::new(field.segments(&self.head))
        };

        for seg in segments {
            let dir = self
                .head
                .transform_vector(field.strands[seg.id].spawn_direction());
            if (self.camera.dir_to_view(dir).z >= 0.0) != front {
                continue;
            }
            let a = self.camera.world_to_screen(seg.root, rect);
            let b = self.camera.world_to_screen(seg.tip, rect);
            painter.line_segment([a, b], root_stroke);
            painter.circle_filled(b, 1.5, egui::Color32::YELLOW);
        }

        if front && self.cfg.ribbon {
            let stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(200, 140, 60));
            for tri in field.ribbon_points(&self.head) {
                let pts = tri.map(|p| self.camera.world_to_screen(p, rect)).to_vec();
                painter.add(egui::Shape::closed_line(pts, stroke));
            }
        }

        if front && self.show_anchors {
            for p in field.rest_anchors(&self.head) {
                let s = self.camera.world_to_screen(p, rect);
                painter.circle_filled(s, 2.0, egui::Color32::from_rgb(128, 255, 128));
            }
        }
    }

    fn paint_colliders(&self, painter: &egui::Painter, rect: egui::Rect) {
        if !self.colliders_enabled {
            return;
        }
        let stroke = egui::Stroke::new(1.0, egui::Color32::LIGHT_BLUE);
        for c in &self.colliders {
            let center = self.camera.world_to_screen(self.head.transform_point(c.center), rect);
            painter.circle_stroke(center, c.radius * self.camera.zoom, stroke);
        }
    }

    /// Builds the central panel where the head and strands are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            if response.dragged_by(egui::PointerButton::Primary) {
                self.camera.orbit(response.drag_delta());
            } else if response.dragged() {
                self.camera.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let before = self.camera.screen_to_view(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.camera.zoom = (self.camera.zoom * factor).clamp(20.0, 600.0);

                let center = rect.center();
                let after = egui::pos2(
                    center.x + before.x * self.camera.zoom + self.camera.pan.x,
                    center.y - before.y * self.camera.zoom + self.camera.pan.y,
                );
                self.camera.pan += pointer_screen - after;
            }

            self.paint_strands(&painter, rect, false);
            self.paint_head(&painter, rect);
            self.paint_strands(&painter, rect, true);
            self.paint_colliders(&painter, rect);

            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = (now - self.last_frame_time) as f32;
                self.last_frame_time = now;
                self.step_once(elapsed);

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
