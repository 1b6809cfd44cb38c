//! Shared types for the pointviz workspace.
//!
//! # Invariants
//! - Matrices cross crate boundaries as column-major `[f64; 16]`.
//! - `WindowCtx` has a single writer: the render thread's event pump.

mod error;
pub mod palette;
mod types;

pub use error::{check_dims, check_len, ArgumentError, HandlerError, VizError};
pub use types::{to_dmat4, Mat4d, Vec3d, Vec4f, WindowCtx, IDENTITY4D};

pub fn crate_info() -> &'static str {
    "pointviz-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
