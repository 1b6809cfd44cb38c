use glam::DMat4;
use serde::{Deserialize, Serialize};

/// 4x4 column-major homogeneous transform, as handed over by callers.
pub type Mat4d = [f64; 16];

/// RGBA color or screen rectangle.
pub type Vec4f = [f32; 4];

/// 3D position in double precision.
pub type Vec3d = [f64; 3];

/// Identity transform in column-major layout.
pub const IDENTITY4D: Mat4d = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Convert a caller-supplied column-major matrix into a glam matrix.
pub fn to_dmat4(m: &Mat4d) -> DMat4 {
    DMat4::from_cols_array(m)
}

/// Input context shared with handlers and aspect-dependent layout.
///
/// Owned by the render thread. The event pump is the only writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowCtx {
    /// Left mouse button held.
    pub lbutton_down: bool,
    /// Middle mouse button held.
    pub mbutton_down: bool,
    /// Cursor x in window pixels.
    pub mouse_x: f64,
    /// Cursor y in window pixels.
    pub mouse_y: f64,
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
}

impl WindowCtx {
    pub fn with_viewport(width: u32, height: u32) -> Self {
        Self {
            viewport_width: width,
            viewport_height: height,
            ..Default::default()
        }
    }

    /// Width over height. A zero-height viewport is treated as one pixel high.
    pub fn aspect(&self) -> f64 {
        self.viewport_width as f64 / self.viewport_height.max(1) as f64
    }

    /// Length of the viewport diagonal in pixels.
    pub fn diagonal(&self) -> f64 {
        let w = self.viewport_width as f64;
        let h = self.viewport_height as f64;
        (w * w + h * h).sqrt()
    }
}
