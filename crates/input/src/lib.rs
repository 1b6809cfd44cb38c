//! Input handling: raw window events and per-event-kind handler stacks.
//!
//! # Invariants
//! - Dispatch runs newest handler first and stops at the first one that
//!   consumes the event.
//! - A failing handler never leaves a stack partly popped.

mod event;
mod handler;

pub use event::{button, key, modifier, InputEvent};
pub use handler::{Handler, HandlerStack, InputHandlers};

pub fn crate_info() -> &'static str {
    "pointviz-input v0.1.0"
}
