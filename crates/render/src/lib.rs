//! Rendering adapter: camera model and the backend contract.
//!
//! # Invariants
//! - Bindings see scene objects only through `StateView`; they may read
//!   buffers and consume dirty flags, nothing else.
//! - A binding re-uploads exactly the dirty field groups of a frame.
//! - `Camera::matrices` is a pure function of the camera and the aspect ratio.
//!
//! The GPU backend lives outside this workspace. `SoftwareRenderer` implements
//! the same contract on the CPU and records what each frame drew.

mod backend;
mod camera;
mod software;
mod target;

pub use backend::{ObjectRenderer, RenderBackend};
pub use camera::{Camera, CameraData, DEFAULT_FOV, DEFAULT_PITCH, REFERENCE_DISTANCE};
pub use software::{
    CloudDraw, CuboidDraw, FrameLog, ImageDraw, LabelDraw, ResolvedPoint, SoftwareCloud,
    SoftwareCuboid, SoftwareImage, SoftwareLabel, SoftwareRenderer, Uploads,
};
pub use target::{TargetDisplay, RING_COUNT};

pub fn crate_info() -> &'static str {
    "pointviz-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
