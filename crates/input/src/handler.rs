use pointviz_common::{HandlerError, VizError, WindowCtx};
use tracing::{error, trace};

use crate::event::{button, InputEvent};

/// Input callback. `Ok(true)` consumes the event; `Ok(false)` passes it on to
/// the next older handler.
pub type Handler<A, B> = Box<dyn FnMut(&WindowCtx, A, B) -> Result<bool, HandlerError>>;

/// Handlers for one kind of event, newest first on dispatch.
pub struct HandlerStack<A, B> {
    name: &'static str,
    handlers: Vec<Handler<A, B>>,
}

impl<A: Copy, B: Copy> HandlerStack<A, B> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handlers: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push<F>(&mut self, handler: F)
    where
        F: FnMut(&WindowCtx, A, B) -> Result<bool, HandlerError> + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Remove the most recently pushed handler.
    pub fn pop(&mut self) -> bool {
        self.handlers.pop().is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Offer an event to each handler, newest first, until one consumes it.
    ///
    /// A failing handler aborts dispatch of this event on this stack; the
    /// stack itself is left as it was.
    pub fn dispatch(&mut self, ctx: &WindowCtx, a: A, b: B) -> Result<bool, VizError> {
        for handler in self.handlers.iter_mut().rev() {
            match handler(ctx, a, b) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(source) => {
                    error!(stack = self.name, error = %source, "input handler failed");
                    return Err(VizError::Handler {
                        stack: self.name,
                        source,
                    });
                }
            }
        }
        Ok(false)
    }
}

/// The four handler stacks of a visualizer.
pub struct InputHandlers {
    pub key: HandlerStack<i32, i32>,
    pub mouse_button: HandlerStack<i32, i32>,
    pub scroll: HandlerStack<f64, f64>,
    pub mouse_pos: HandlerStack<f64, f64>,
}

impl Default for InputHandlers {
    fn default() -> Self {
        Self {
            key: HandlerStack::new("key"),
            mouse_button: HandlerStack::new("mouse button"),
            scroll: HandlerStack::new("scroll"),
            mouse_pos: HandlerStack::new("mouse position"),
        }
    }
}

impl InputHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into `ctx` and dispatch it.
    ///
    /// Button handlers see the new button state. Cursor handlers see the
    /// previous cursor position in `ctx` and the new one as arguments, so they
    /// can compute deltas. Resize only updates the viewport; close requests
    /// are left to the caller.
    pub fn handle(&mut self, ctx: &mut WindowCtx, event: InputEvent) -> Result<bool, VizError> {
        trace!(?event, "input event");
        match event {
            InputEvent::Key { key, mods } => self.key.dispatch(ctx, key, mods),
            InputEvent::MouseButton {
                button: which,
                pressed,
                mods,
            } => {
                match which {
                    button::LEFT => ctx.lbutton_down = pressed,
                    button::MIDDLE => ctx.mbutton_down = pressed,
                    _ => {}
                }
                self.mouse_button.dispatch(ctx, which, mods)
            }
            InputEvent::Scroll { x, y } => self.scroll.dispatch(ctx, x, y),
            InputEvent::CursorMove { x, y } => {
                let handled = self.mouse_pos.dispatch(ctx, x, y);
                ctx.mouse_x = x;
                ctx.mouse_y = y;
                handled
            }
            InputEvent::Resize { width, height } => {
                ctx.viewport_width = width;
                ctx.viewport_height = height;
                Ok(false)
            }
            InputEvent::CloseRequested => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Calls = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(calls: &Calls, name: &'static str, result: bool) -> Handler<i32, i32> {
        let calls = Rc::clone(calls);
        Box::new(move |_, _, _| {
            calls.borrow_mut().push(name);
            Ok(result)
        })
    }

    #[test]
    fn dispatch_is_lifo_and_stops_at_true() {
        let calls: Calls = Rc::default();
        let mut stack = HandlerStack::new("key");
        stack.push(recorder(&calls, "h1", true));
        stack.push(recorder(&calls, "h2", true));
        stack.push(recorder(&calls, "h3", false));

        let handled = stack.dispatch(&WindowCtx::default(), 87, 0).unwrap();
        assert!(handled);
        assert_eq!(*calls.borrow(), vec!["h3", "h2"]);
    }

    #[test]
    fn pop_removes_newest() {
        let calls: Calls = Rc::default();
        let mut stack = HandlerStack::new("key");
        stack.push(recorder(&calls, "h1", false));
        stack.push(recorder(&calls, "h2", false));
        stack.push(recorder(&calls, "h3", false));

        assert!(stack.pop());
        assert_eq!(stack.len(), 2);
        assert!(!stack.dispatch(&WindowCtx::default(), 0, 0).unwrap());
        assert_eq!(*calls.borrow(), vec!["h2", "h1"]);
    }

    #[test]
    fn pop_on_empty_reports_nothing_removed() {
        let mut stack = HandlerStack::<f64, f64>::new("scroll");
        assert!(!stack.pop());
        assert!(stack.is_empty());
    }

    #[test]
    fn error_aborts_dispatch_and_keeps_stack() {
        let calls: Calls = Rc::default();
        let mut stack = HandlerStack::new("mouse button");
        stack.push(recorder(&calls, "h1", true));
        stack.push(|_: &WindowCtx, _: i32, _: i32| Err("broken handler".into()));

        let err = stack.dispatch(&WindowCtx::default(), 0, 0).unwrap_err();
        assert!(matches!(err, VizError::Handler { stack: "mouse button", .. }));
        assert!(calls.borrow().is_empty());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn cursor_handlers_see_previous_position() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut handlers = InputHandlers::new();
        let log = Rc::clone(&seen);
        handlers.mouse_pos.push(move |ctx, x, y| {
            log.borrow_mut().push((ctx.mouse_x, ctx.mouse_y, x, y));
            Ok(true)
        });

        let mut ctx = WindowCtx::with_viewport(100, 100);
        handlers
            .handle(&mut ctx, InputEvent::CursorMove { x: 10.0, y: 5.0 })
            .unwrap();
        handlers
            .handle(&mut ctx, InputEvent::CursorMove { x: 12.0, y: 8.0 })
            .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![(0.0, 0.0, 10.0, 5.0), (10.0, 5.0, 12.0, 8.0)]
        );
        assert_eq!((ctx.mouse_x, ctx.mouse_y), (12.0, 8.0));
    }

    #[test]
    fn button_handlers_see_new_state() {
        let pressed = Rc::new(RefCell::new(None));
        let mut handlers = InputHandlers::new();
        let log = Rc::clone(&pressed);
        handlers.mouse_button.push(move |ctx, _, _| {
            *log.borrow_mut() = Some(ctx.lbutton_down);
            Ok(false)
        });

        let mut ctx = WindowCtx::default();
        let handled = handlers
            .handle(
                &mut ctx,
                InputEvent::MouseButton {
                    button: button::LEFT,
                    pressed: true,
                    mods: 0,
                },
            )
            .unwrap();
        assert!(!handled);
        assert_eq!(*pressed.borrow(), Some(true));
        assert!(ctx.lbutton_down);
    }

    #[test]
    fn resize_updates_viewport() {
        let mut handlers = InputHandlers::new();
        let mut ctx = WindowCtx::default();
        handlers
            .handle(&mut ctx, InputEvent::Resize { width: 640, height: 480 })
            .unwrap();
        assert_eq!((ctx.viewport_width, ctx.viewport_height), (640, 480));
    }
}
