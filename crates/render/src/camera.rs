use glam::{DMat4, DVec3};
use pointviz_common::{to_dmat4, Mat4d, IDENTITY4D};

/// Distance to the target at `log_distance == 0`, in metres.
pub const REFERENCE_DISTANCE: f64 = 50.0;
/// Per-step growth of the view distance.
const DISTANCE_BASE: f64 = 1.01;
pub const DEFAULT_FOV: i32 = 90;
/// Default pitch, in decidegrees. Looks down at the target at 45 degrees.
pub const DEFAULT_PITCH: i32 = -450;
const FULL_TURN: i32 = 3600;
const NEAR_PLANE: f64 = 0.1;
const FAR_PLANE: f64 = 10_000.0;

/// Matrices derived from a [`Camera`] for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraData {
    pub proj: DMat4,
    pub view: DMat4,
    pub target: DMat4,
}

impl CameraData {
    /// `proj * view * target`: world (target frame) to clip space.
    pub fn proj_view(&self) -> DMat4 {
        self.proj * self.view * self.target
    }
}

/// Orbit camera around a target frame.
///
/// Angles are kept in integer decidegrees and distance as an integer
/// logarithmic step so that repeated small moves never drift.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    target: Mat4d,
    view_offset: DVec3,
    yaw: i32,
    pitch: i32,
    log_distance: i32,
    orthographic: bool,
    fov: i32,
    proj_offset: (f64, f64),
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            target: IDENTITY4D,
            view_offset: DVec3::ZERO,
            yaw: 0,
            pitch: DEFAULT_PITCH,
            log_distance: 0,
            orthographic: false,
            fov: DEFAULT_FOV,
            proj_offset: (0.0, 0.0),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore every construction-time default.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Orbit left or right about the target.
    pub fn yaw(&mut self, degrees: f64) {
        let delta = (degrees * 10.0).round() as i32;
        self.yaw = self.yaw.wrapping_add(delta).rem_euclid(FULL_TURN);
    }

    /// Tilt up or down. Not clamped.
    pub fn pitch(&mut self, degrees: f64) {
        let delta = (degrees * 10.0).round() as i32;
        self.pitch = self.pitch.saturating_add(delta);
    }

    /// Move toward (positive) or away from (negative) the target.
    pub fn dolly(&mut self, amount: i32) {
        self.log_distance = self.log_distance.saturating_sub(amount);
    }

    /// Shift the view in its own plane.
    ///
    /// One unit is the length of the view-plane diagonal at the target
    /// distance, so the same gesture feels the same at any zoom.
    pub fn dolly_xy(&mut self, x: f64, y: f64) {
        let diagonal = 2.0 * self.view_distance() * (self.fov_radians() / 2.0).tan();
        let shift = self.rotation().inverse().transform_vector3(DVec3::new(x, y, 0.0));
        self.view_offset += shift * diagonal;
    }

    /// Diagonal field of view, in degrees.
    pub fn set_fov(&mut self, degrees: i32) {
        self.fov = degrees;
    }

    pub fn set_orthographic(&mut self, orthographic: bool) {
        self.orthographic = orthographic;
    }

    /// Translate the projected image, in normalized device coordinates.
    pub fn set_proj_offset(&mut self, x: f64, y: f64) {
        self.proj_offset = (x, y);
    }

    /// Frame the camera orbits around, column-major.
    pub fn set_target(&mut self, target: Mat4d) {
        self.target = target;
    }

    pub fn yaw_decidegrees(&self) -> i32 {
        self.yaw
    }

    pub fn pitch_decidegrees(&self) -> i32 {
        self.pitch
    }

    pub fn log_distance(&self) -> i32 {
        self.log_distance
    }

    pub fn is_orthographic(&self) -> bool {
        self.orthographic
    }

    pub fn fov(&self) -> i32 {
        self.fov
    }

    pub fn view_offset(&self) -> DVec3 {
        self.view_offset
    }

    pub fn view_distance(&self) -> f64 {
        REFERENCE_DISTANCE * DISTANCE_BASE.powi(self.log_distance)
    }

    fn fov_radians(&self) -> f64 {
        (self.fov as f64).to_radians()
    }

    fn rotation(&self) -> DMat4 {
        let pitch = (self.pitch as f64 / 10.0).to_radians();
        let yaw = (self.yaw as f64 / 10.0).to_radians();
        DMat4::from_rotation_x(pitch) * DMat4::from_rotation_z(yaw)
    }

    /// View and projection for a viewport of the given aspect ratio.
    pub fn matrices(&self, aspect: f64) -> CameraData {
        let distance = self.view_distance();
        let view = DMat4::from_translation(DVec3::new(0.0, 0.0, -distance))
            * self.rotation()
            * DMat4::from_translation(self.view_offset);

        // fov is diagonal: split it into its vertical share for this aspect.
        let tan_half_diag = (self.fov_radians() / 2.0).tan();
        let tan_half_v = tan_half_diag / (1.0 + aspect * aspect).sqrt();

        let proj = if self.orthographic {
            let half_h = distance * tan_half_v;
            let half_w = half_h * aspect;
            DMat4::orthographic_rh_gl(-half_w, half_w, -half_h, half_h, -FAR_PLANE, FAR_PLANE)
        } else {
            DMat4::perspective_rh_gl(2.0 * tan_half_v.atan(), aspect, NEAR_PLANE, FAR_PLANE)
        };
        let (ox, oy) = self.proj_offset;
        let proj = DMat4::from_translation(DVec3::new(ox, oy, 0.0)) * proj;

        CameraData {
            proj,
            view,
            target: to_dmat4(&self.target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_from_reference_distance() {
        let cam = Camera::new();
        assert_eq!(cam.view_distance(), REFERENCE_DISTANCE);
        assert_eq!(cam.pitch_decidegrees(), DEFAULT_PITCH);
        let data = cam.matrices(4.0 / 3.0);
        // Target origin sits straight ahead of the eye.
        let p = data.view.transform_point3(DVec3::ZERO);
        assert!((p - DVec3::new(0.0, 0.0, -REFERENCE_DISTANCE)).length() < 1e-9);
        assert!(!data.proj.col(0).x.is_nan());
    }

    #[test]
    fn reset_restores_construction_matrices() {
        let mut cam = Camera::new();
        let before = cam.matrices(1.5);
        cam.yaw(33.0);
        cam.pitch(-12.0);
        cam.dolly(40);
        cam.dolly_xy(0.1, -0.2);
        cam.set_fov(60);
        cam.set_orthographic(true);
        cam.set_proj_offset(0.3, 0.3);
        assert_ne!(cam.matrices(1.5), before);
        cam.reset();
        assert_eq!(cam.matrices(1.5), before);
        assert_eq!(cam, Camera::default());
    }

    #[test]
    fn matrices_are_pure() {
        let mut cam = Camera::new();
        cam.yaw(10.0);
        let snapshot = cam.clone();
        let a = cam.matrices(2.0);
        let b = cam.matrices(2.0);
        assert_eq!(a, b);
        assert_eq!(cam, snapshot);
    }

    #[test]
    fn yaw_wraps_and_rounds_to_decidegrees() {
        let mut cam = Camera::new();
        cam.yaw(-0.04);
        assert_eq!(cam.yaw_decidegrees(), 0);
        cam.yaw(-1.0);
        assert_eq!(cam.yaw_decidegrees(), 3590);
        cam.yaw(361.0);
        assert_eq!(cam.yaw_decidegrees(), 0);
    }

    #[test]
    fn positive_dolly_moves_closer() {
        let mut cam = Camera::new();
        cam.dolly(5);
        assert_eq!(cam.log_distance(), -5);
        assert!(cam.view_distance() < REFERENCE_DISTANCE);
        cam.dolly(-10);
        assert!(cam.view_distance() > REFERENCE_DISTANCE);
    }

    #[test]
    fn dolly_xy_scales_with_view_diagonal() {
        let mut cam = Camera::new();
        cam.pitch(45.0);
        cam.dolly_xy(0.5, 0.0);
        // 90 degree diagonal fov at 50 m: the diagonal spans 100 m.
        assert!((cam.view_offset() - DVec3::new(50.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn proj_offset_translates_clip_space() {
        let mut cam = Camera::new();
        let base = cam.matrices(1.0);
        cam.set_proj_offset(0.5, -0.25);
        let shifted = cam.matrices(1.0);
        let p = DVec3::new(1.0, 2.0, 3.0);
        let a = base.proj_view().project_point3(p);
        let b = shifted.proj_view().project_point3(p);
        assert!((b.x - a.x - 0.5).abs() < 1e-9);
        assert!((b.y - a.y + 0.25).abs() < 1e-9);
    }
}
