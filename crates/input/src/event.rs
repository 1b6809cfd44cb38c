/// Raw window events, as the window backend reports them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key press or repeat. Releases are not reported.
    Key { key: i32, mods: i32 },
    MouseButton { button: i32, pressed: bool, mods: i32 },
    Scroll { x: f64, y: f64 },
    /// New cursor position in window pixels.
    CursorMove { x: f64, y: f64 },
    Resize { width: u32, height: u32 },
    CloseRequested,
}

/// Key codes. Printable keys use their uppercase ASCII value.
pub mod key {
    pub const SPACE: i32 = 32;
    pub const MINUS: i32 = 45;
    pub const NUM_0: i32 = 48;
    pub const EQUAL: i32 = 61;
    pub const A: i32 = 65;
    pub const D: i32 = 68;
    pub const R: i32 = 82;
    pub const S: i32 = 83;
    pub const W: i32 = 87;
    pub const ESCAPE: i32 = 256;
}

/// Modifier bits, combined with `|`.
pub mod modifier {
    pub const NONE: i32 = 0;
    pub const SHIFT: i32 = 0x1;
    pub const CONTROL: i32 = 0x2;
    pub const ALT: i32 = 0x4;
    pub const SUPER: i32 = 0x8;
}

pub mod button {
    pub const LEFT: i32 = 0;
    pub const RIGHT: i32 = 1;
    pub const MIDDLE: i32 = 2;
}
