use std::sync::mpsc::{self, Receiver, Sender};

use pointviz_common::VizError;
use pointviz_input::{button, InputEvent};
use tracing::debug;

use crate::config::VizConfig;

/// The windowing side of a visualizer: context, events and presentation.
///
/// Driven from the render thread only.
pub trait WindowBackend {
    /// Make the rendering context current on the calling thread.
    fn make_current(&mut self) -> Result<(), VizError>;

    /// Events received since the last poll, oldest first.
    fn poll_events(&mut self) -> Vec<InputEvent>;

    fn swap_buffers(&mut self);

    fn set_visible(&mut self, visible: bool);

    /// Framebuffer size in pixels.
    fn viewport(&self) -> (u32, u32);
}

/// Window without a display. Events are injected through [`EventSender`].
#[derive(Debug)]
pub struct HeadlessWindow {
    title: String,
    viewport: (u32, u32),
    has_context: bool,
    visible: bool,
    presented: u64,
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl HeadlessWindow {
    pub fn new(config: &VizConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            title: config.name.clone(),
            viewport: (config.width, config.height),
            has_context: true,
            visible: false,
            presented: 0,
            tx,
            rx,
        }
    }

    /// A window whose context can never be made current.
    pub fn without_context(config: &VizConfig) -> Self {
        Self {
            has_context: false,
            ..Self::new(config)
        }
    }

    /// Handle for feeding events from any thread.
    pub fn event_sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Frames swapped to the (imaginary) screen.
    pub fn frames_presented(&self) -> u64 {
        self.presented
    }
}

impl WindowBackend for HeadlessWindow {
    fn make_current(&mut self) -> Result<(), VizError> {
        if self.has_context {
            Ok(())
        } else {
            Err(VizError::Context(format!("no rendering context for '{}'", self.title)))
        }
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        let events: Vec<InputEvent> = self.rx.try_iter().collect();
        for event in &events {
            if let InputEvent::Resize { width, height } = *event {
                self.viewport = (width, height);
            }
        }
        events
    }

    fn swap_buffers(&mut self) {
        self.presented += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            debug!(title = %self.title, visible, "window visibility changed");
        }
        self.visible = visible;
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}

/// Cloneable, `Send` source of events for a [`HeadlessWindow`].
///
/// Sends are dropped silently once the window is gone.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<InputEvent>,
}

impl EventSender {
    /// Queue an event. Returns `false` if the window no longer exists.
    pub fn send(&self, event: InputEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn key(&self, key: i32, mods: i32) -> bool {
        self.send(InputEvent::Key { key, mods })
    }

    pub fn scroll(&self, x: f64, y: f64) -> bool {
        self.send(InputEvent::Scroll { x, y })
    }

    pub fn cursor(&self, x: f64, y: f64) -> bool {
        self.send(InputEvent::CursorMove { x, y })
    }

    pub fn press(&self, which: i32) -> bool {
        self.send(InputEvent::MouseButton {
            button: which,
            pressed: true,
            mods: 0,
        })
    }

    pub fn release(&self, which: i32) -> bool {
        self.send(InputEvent::MouseButton {
            button: which,
            pressed: false,
            mods: 0,
        })
    }

    /// Press the left button, drag from `from` to `to`, release.
    pub fn drag(&self, from: (f64, f64), to: (f64, f64)) -> bool {
        self.cursor(from.0, from.1)
            && self.press(button::LEFT)
            && self.cursor(to.0, to.1)
            && self.release(button::LEFT)
    }

    pub fn resize(&self, width: u32, height: u32) -> bool {
        self.send(InputEvent::Resize { width, height })
    }

    pub fn close(&self) -> bool {
        self.send(InputEvent::CloseRequested)
    }
}
