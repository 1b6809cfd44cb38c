use pointviz_common::WindowCtx;
use pointviz_input::{key, modifier};

use crate::shared::VizHandle;
use crate::viz::PointViz;
use crate::window::WindowBackend;
use pointviz_render::RenderBackend;

/// Degrees of orbit per pixel of left-button drag.
const ORBIT_SENSITIVITY: f64 = 0.3;

/// Degrees per key press for pitch and yaw, and dolly steps per press or
/// scroll notch.
const STEP: i32 = 5;

/// Install the standard camera controls.
///
/// | input                | action                         |
/// |----------------------|--------------------------------|
/// | W / S                | pitch up / down                |
/// | A / D                | yaw left / right               |
/// | = / -                | dolly in / out                 |
/// | 0                    | toggle orthographic projection |
/// | Esc                  | stop the render loop           |
/// | Shift+R              | reset the camera               |
/// | scroll               | dolly                          |
/// | left drag            | orbit                          |
/// | middle drag          | pan in the view plane          |
///
/// Every camera change is published immediately.
pub fn add_default_controls<W: WindowBackend, R: RenderBackend>(viz: &mut PointViz<W, R>) {
    let handle = viz.handle();
    viz.push_key_handler(move |_, code, mods| Ok(on_key(&handle, code, mods)));

    let handle = viz.handle();
    viz.push_scroll_handler(move |_, _, yoff| {
        handle.camera().dolly((f64::from(STEP) * yoff).round() as i32);
        handle.update();
        Ok(true)
    });

    let handle = viz.handle();
    viz.push_mouse_pos_handler(move |ctx, x, y| {
        on_cursor(&handle, ctx, x, y);
        Ok(true)
    });
}

fn on_key(viz: &VizHandle, code: i32, mods: i32) -> bool {
    let step = f64::from(STEP);
    match (mods, code) {
        (modifier::NONE, key::W) => viz.camera().pitch(step),
        (modifier::NONE, key::S) => viz.camera().pitch(-step),
        (modifier::NONE, key::A) => viz.camera().yaw(step),
        (modifier::NONE, key::D) => viz.camera().yaw(-step),
        (modifier::NONE, key::EQUAL) => viz.camera().dolly(STEP),
        (modifier::NONE, key::MINUS) => viz.camera().dolly(-STEP),
        (modifier::NONE, key::NUM_0) => {
            let mut camera = viz.camera();
            let orthographic = !camera.is_orthographic();
            camera.set_orthographic(orthographic);
        }
        (modifier::NONE, key::ESCAPE) => {
            tracing::info!("escape pressed, stopping");
            viz.set_running(false);
            return true;
        }
        (modifier::SHIFT, key::R) => viz.camera().reset(),
        _ => return false,
    }
    viz.update();
    true
}

fn on_cursor(viz: &VizHandle, ctx: &WindowCtx, x: f64, y: f64) {
    let dx = x - ctx.mouse_x;
    let dy = y - ctx.mouse_y;
    if ctx.lbutton_down {
        let mut camera = viz.camera();
        camera.yaw(ORBIT_SENSITIVITY * dx);
        camera.pitch(ORBIT_SENSITIVITY * dy);
    } else if ctx.mbutton_down {
        // pixels to fractions of the window
        let scale = 2.0 / ctx.diagonal().max(1.0);
        viz.camera().dolly_xy(dx * scale, dy * scale);
    }
    viz.update();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VizConfig;
    use crate::window::HeadlessWindow;
    use pointviz_input::button;
    use pointviz_render::{SoftwareRenderer, DEFAULT_PITCH};

    fn viz() -> PointViz<HeadlessWindow, SoftwareRenderer> {
        let config = VizConfig::default();
        let window = HeadlessWindow::new(&config);
        let mut viz = PointViz::new(config, window, SoftwareRenderer::new()).unwrap();
        add_default_controls(&mut viz);
        viz
    }

    #[test]
    fn w_pitches_up_five_degrees() {
        let mut viz = viz();
        viz.window().event_sender().key(key::W, modifier::NONE);
        viz.run_once().unwrap();
        assert_eq!(viz.camera().pitch_decidegrees(), DEFAULT_PITCH + 50);
    }

    #[test]
    fn modified_keys_are_ignored_except_shift_r() {
        let mut viz = viz();
        let events = viz.window().event_sender();
        events.key(key::A, modifier::NONE);
        events.key(key::A, modifier::CONTROL);
        viz.run_once().unwrap();
        assert_eq!(viz.camera().yaw_decidegrees(), 50);

        events.key(key::R, modifier::SHIFT);
        viz.run_once().unwrap();
        assert_eq!(viz.camera().yaw_decidegrees(), 0);
    }

    #[test]
    fn zero_toggles_orthographic() {
        let mut viz = viz();
        let events = viz.window().event_sender();
        events.key(key::NUM_0, modifier::NONE);
        viz.run_once().unwrap();
        assert!(viz.camera().is_orthographic());
        events.key(key::NUM_0, modifier::NONE);
        viz.run_once().unwrap();
        assert!(!viz.camera().is_orthographic());
    }

    #[test]
    fn escape_stops_run() {
        let mut viz = viz();
        viz.window().event_sender().key(key::ESCAPE, modifier::NONE);
        viz.run().unwrap();
        assert!(!viz.running());
    }

    #[test]
    fn unbound_key_reaches_handler_below() {
        use std::cell::Cell;
        use std::rc::Rc;

        let config = VizConfig::default();
        let window = HeadlessWindow::new(&config);
        let mut viz = PointViz::new(config, window, SoftwareRenderer::new()).unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        viz.push_key_handler(move |_, _, _| {
            counter.set(counter.get() + 1);
            Ok(true)
        });
        add_default_controls(&mut viz);

        let events = viz.window().event_sender();
        events.key(key::SPACE, modifier::NONE);
        events.key(key::W, modifier::NONE);
        viz.run_once().unwrap();
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn scroll_dollies() {
        let mut viz = viz();
        viz.window().event_sender().scroll(0.0, 1.0);
        viz.run_once().unwrap();
        assert_eq!(viz.camera().log_distance(), -STEP);
    }

    #[test]
    fn left_drag_orbits() {
        let mut viz = viz();
        viz.window().event_sender().drag((100.0, 100.0), (110.0, 100.0));
        viz.run_once().unwrap();
        assert_eq!(viz.camera().yaw_decidegrees(), 30);
        assert_eq!(viz.camera().pitch_decidegrees(), DEFAULT_PITCH);
    }

    #[test]
    fn middle_drag_pans() {
        let mut viz = viz();
        let events = viz.window().event_sender();
        events.cursor(400.0, 300.0);
        events.press(button::MIDDLE);
        events.cursor(500.0, 300.0);
        viz.run_once().unwrap();
        assert_ne!(viz.camera().view_offset().length(), 0.0);
        assert_eq!(viz.camera().yaw_decidegrees(), 0);
    }

    #[test]
    fn camera_moves_reach_the_front_snapshot() {
        let mut viz = viz();
        viz.window().event_sender().key(key::D, modifier::NONE);
        viz.run_once().unwrap();
        let front = viz.handle().shared.front.lock().unwrap().camera.yaw_decidegrees();
        assert_eq!(front, 3600 - 50);
    }
}
