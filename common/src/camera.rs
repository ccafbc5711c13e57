//! 2D orthographic camera shared by both visualizers

use glam::{Mat4, Vec2, Vec3};

/// 2D orthographic camera with zoom and pan
#[derive(Debug, Clone)]
pub struct Camera2D {
    pub position: Vec3,
    pub zoom: f32,
    pub aspect_ratio: f32,
}

impl Camera2D {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            zoom: 1.0,
            aspect_ratio,
        }
    }

    /// Get the view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        let half_width = self.zoom * self.aspect_ratio;
        let half_height = self.zoom;

        let projection = Mat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            -1.0,
            1.0,
        );

        let view = Mat4::from_translation(-self.position);

        projection * view
    }

    /// Convert a cursor position (pixels, origin top-left) to world coordinates
    pub fn screen_to_world(&self, screen: Vec2, window_size: (u32, u32)) -> Vec2 {
        let normalized_x = (screen.x / window_size.0 as f32) * 2.0 - 1.0;
        let normalized_y = 1.0 - (screen.y / window_size.1 as f32) * 2.0;

        Vec2::new(
            self.position.x + normalized_x * self.zoom * self.aspect_ratio,
            self.position.y + normalized_y * self.zoom,
        )
    }

    /// Convert world coordinates to a cursor position (pixels, origin top-left)
    pub fn world_to_screen(&self, world: Vec2, window_size: (u32, u32)) -> Vec2 {
        let normalized_x = (world.x - self.position.x) / (self.zoom * self.aspect_ratio);
        let normalized_y = (world.y - self.position.y) / self.zoom;

        Vec2::new(
            (normalized_x + 1.0) / 2.0 * window_size.0 as f32,
            (1.0 - normalized_y) / 2.0 * window_size.1 as f32,
        )
    }

    pub fn update_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera_2d(camera: &Camera2D) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
        }
    }
}
