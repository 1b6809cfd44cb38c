//! Scene objects: staged host-side buffers with per-field dirty tracking.
//!
//! # Invariants
//! - Every setter copies caller data and marks exactly its field group dirty,
//!   even when the values did not change.
//! - Flags are cleared only by the consumer or `clear()`.
//! - A setter that fails leaves buffers and flags untouched.
//! - Buffer lengths are fixed at construction; only a cloud's palette and an
//!   image's dimensions may change.

mod cloud;
mod cuboid;
mod dirty;
mod image;
mod label;
mod object;
mod pose;

pub use cloud::{Addressing, Cloud, CloudField, DEFAULT_POINT_SIZE};
pub use cuboid::{Cuboid, CuboidField};
pub use dirty::{DirtyFlags, FieldGroup};
pub use image::{Image, ImageField};
pub use label::{Label, LabelField, DEFAULT_LABEL_SCALE};
pub use object::{Handle, ObjectKind, SceneObject, StateView};
pub use pose::{ColumnPose, ColumnPoseTexture};

pub fn crate_info() -> &'static str {
    "pointviz-scene v0.1.0"
}
