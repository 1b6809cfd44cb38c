use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_WIDTH: u32 = 800;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 600;

/// Window settings for a visualizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Window title.
    pub name: String,
    /// Keep the initial aspect ratio when the window is resized.
    pub fix_aspect: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            name: "pointviz".to_owned(),
            fix_aspect: false,
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

impl VizConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Height matching `width` at the configured aspect ratio.
    pub fn fixed_height(&self, width: u32) -> u32 {
        if self.width == 0 {
            return self.height;
        }
        (width as f64 * self.height as f64 / self.width as f64).round() as u32
    }
}
