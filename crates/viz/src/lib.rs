//! Point cloud visualizer core.
//!
//! Producers stage scene objects on any thread and publish them with
//! `update()`; the thread owning [`PointViz`] draws the latest published
//! snapshot once per frame and dispatches window input to handler stacks.
//!
//! # Invariants
//! - `update()` never blocks. It publishes everything or nothing.
//! - A frame sees the most recent successful publish, with the dirty field
//!   groups of every publish since the previous frame.
//! - Added and removed objects reach the render thread only through
//!   `update()`.
//! - A handler error never skips drawing or presenting the frame.

mod config;
mod controls;
mod shared;
mod viz;
mod window;

pub use config::{VizConfig, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
pub use controls::add_default_controls;
pub use shared::{PublishStats, Registered, VizHandle};
pub use viz::PointViz;
pub use window::{EventSender, HeadlessWindow, WindowBackend};

pub fn crate_info() -> &'static str {
    "pointviz v0.1.0"
}
