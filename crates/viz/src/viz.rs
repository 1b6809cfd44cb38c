use std::sync::atomic::Ordering;
use std::sync::{Arc, MutexGuard};

use pointviz_common::{HandlerError, VizError, WindowCtx};
use pointviz_input::{InputEvent, InputHandlers};
use pointviz_render::{Camera, CameraData, ObjectRenderer, RenderBackend, TargetDisplay};
use pointviz_scene::{Cloud, Cuboid, Handle, Image, Label, SceneObject, StateView};
use tracing::{error, info};

use crate::config::VizConfig;
use crate::shared::{lock, FrontList, PublishStats, Registered, Shared, VizHandle};
use crate::window::WindowBackend;

/// A renderer binding and the front slot it was created for.
struct Bound<B> {
    id: u64,
    binding: B,
}

type BindingList<B> = Vec<Option<Bound<B>>>;

/// Render-thread bindings, index-aligned with the front snapshot.
struct Bindings<R: RenderBackend> {
    clouds: BindingList<<R as ObjectRenderer<Cloud>>::Binding>,
    images: BindingList<<R as ObjectRenderer<Image>>::Binding>,
    cuboids: BindingList<<R as ObjectRenderer<Cuboid>>::Binding>,
    labels: BindingList<<R as ObjectRenderer<Label>>::Binding>,
}

impl<R: RenderBackend> Bindings<R> {
    fn new() -> Self {
        Self {
            clouds: Vec::new(),
            images: Vec::new(),
            cuboids: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.clouds.clear();
        self.images.clear();
        self.cuboids.clear();
        self.labels.clear();
    }
}

/// Draw every published object of one type, creating bindings for objects
/// new to the render thread and dropping those of removed ones. Flags left
/// over after the binding consumed what it needed are cleared.
fn draw_objects<T, R>(
    renderer: &mut R,
    slots: &mut FrontList<T>,
    bindings: &mut BindingList<<R as ObjectRenderer<T>>::Binding>,
    ctx: &WindowCtx,
    camera: &CameraData,
) -> Result<(), VizError>
where
    T: SceneObject,
    R: RenderBackend + ObjectRenderer<T>,
{
    renderer.begin_draw(T::KIND);
    bindings.resize_with(slots.len(), || None);
    for (slot, bound) in slots.iter_mut().zip(bindings.iter_mut()) {
        let Some(slot) = slot else {
            *bound = None;
            continue;
        };
        if bound.as_ref().is_none_or(|b| b.id != slot.id) {
            let binding = match <R as ObjectRenderer<T>>::create(renderer, &slot.object) {
                Ok(binding) => binding,
                Err(e) => {
                    renderer.end_draw(T::KIND);
                    return Err(e);
                }
            };
            tracing::debug!(kind = %T::KIND, id = slot.id, "binding created");
            *bound = Some(Bound { id: slot.id, binding });
        }
        if let Some(bound) = bound {
            let view = StateView::new(&mut slot.object);
            <R as ObjectRenderer<T>>::draw(renderer, &mut bound.binding, ctx, camera, view);
        }
        slot.object.clear();
    }
    renderer.end_draw(T::KIND);
    Ok(())
}

/// A point cloud visualizer.
///
/// Owns the window and renderer and must stay on the thread that created
/// them. Everything a producer thread needs is on [`VizHandle`], reachable
/// through [`PointViz::handle`]; the same methods are mirrored here.
pub struct PointViz<W: WindowBackend, R: RenderBackend> {
    shared: Arc<Shared>,
    config: VizConfig,
    window: W,
    renderer: R,
    ctx: WindowCtx,
    handlers: InputHandlers,
    bindings: Bindings<R>,
}

impl<W: WindowBackend, R: RenderBackend> PointViz<W, R> {
    /// Take over a window and a renderer.
    ///
    /// Fails with `VizError::Context` when the window has no usable context.
    pub fn new(config: VizConfig, mut window: W, mut renderer: R) -> Result<Self, VizError> {
        window.make_current()?;
        renderer.initialize()?;
        let (width, height) = window.viewport();
        info!(name = %config.name, width, height, "visualizer created");
        Ok(Self {
            shared: Arc::new(Shared::new()),
            config,
            window,
            renderer,
            ctx: WindowCtx::with_viewport(width, height),
            handlers: InputHandlers::new(),
            bindings: Bindings::new(),
        })
    }

    pub fn handle(&self) -> VizHandle {
        VizHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Input context as of the last processed event.
    pub fn window_ctx(&self) -> &WindowCtx {
        &self.ctx
    }

    /// Draw frames until `running` turns false.
    ///
    /// Stops early and returns the error if a handler fails.
    pub fn run(&mut self) -> Result<(), VizError> {
        self.set_running(true);
        self.window.set_visible(true);
        let result = loop {
            if !self.running() {
                break Ok(());
            }
            if let Err(e) = self.run_once() {
                break Err(e);
            }
        };
        self.window.set_visible(false);
        result
    }

    /// Process pending input, then draw and present one frame.
    ///
    /// The frame is drawn even if a handler fails; the first handler error
    /// is returned afterwards.
    pub fn run_once(&mut self) -> Result<(), VizError> {
        let _span = tracing::info_span!("frame").entered();
        self.window.make_current()?;

        let mut handler_error = None;
        for event in self.window.poll_events() {
            if let Err(e) = self.process_event(event) {
                handler_error.get_or_insert(e);
            }
        }

        self.draw()?;
        self.window.swap_buffers();
        handler_error.map_or(Ok(()), Err)
    }

    fn process_event(&mut self, event: InputEvent) -> Result<(), VizError> {
        match event {
            InputEvent::CloseRequested => {
                info!("close requested");
                self.set_running(false);
                Ok(())
            }
            InputEvent::Resize { width, .. } => {
                self.handlers.handle(&mut self.ctx, event)?;
                if self.config.fix_aspect {
                    self.ctx.viewport_height = self.config.fixed_height(width);
                }
                Ok(())
            }
            _ => self.handlers.handle(&mut self.ctx, event).map(|_| ()),
        }
    }

    fn draw(&mut self) -> Result<(), VizError> {
        let shared = Arc::clone(&self.shared);
        let mut front = lock(&shared.front);
        let ctx = self.ctx;
        let camera = front.camera.matrices(ctx.aspect());
        let front = &mut *front;

        self.renderer.clear_frame();
        draw_objects(&mut self.renderer, &mut front.clouds, &mut self.bindings.clouds, &ctx, &camera)?;
        self.renderer.draw_rings(&ctx, &camera, &front.target);
        draw_objects(&mut self.renderer, &mut front.cuboids, &mut self.bindings.cuboids, &ctx, &camera)?;
        // labels and images go on top of the scene
        draw_objects(&mut self.renderer, &mut front.labels, &mut self.bindings.labels, &ctx, &camera)?;
        draw_objects(&mut self.renderer, &mut front.images, &mut self.bindings.images, &ctx, &camera)?;

        front.changed = false;
        let frame = shared.frames.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(frame, "frame drawn");
        Ok(())
    }

    pub fn running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.shared.running.store(running, Ordering::Release);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.window.set_visible(visible);
    }

    /// See [`VizHandle::update`].
    pub fn update(&self) -> bool {
        self.shared.update()
    }

    pub fn camera(&self) -> MutexGuard<'_, Camera> {
        lock(&self.shared.camera)
    }

    pub fn target_display(&self) -> MutexGuard<'_, TargetDisplay> {
        lock(&self.shared.target)
    }

    pub fn stats(&self) -> PublishStats {
        self.shared.stats()
    }

    pub fn add<T: Registered>(&self, handle: &Handle<T>) {
        self.handle().add(handle);
    }

    pub fn remove<T: Registered>(&self, handle: &Handle<T>) -> bool {
        self.handle().remove(handle)
    }

    pub fn add_cloud(&self, cloud: &Handle<Cloud>) {
        self.add(cloud);
    }

    pub fn add_image(&self, image: &Handle<Image>) {
        self.add(image);
    }

    pub fn add_cuboid(&self, cuboid: &Handle<Cuboid>) {
        self.add(cuboid);
    }

    pub fn add_label(&self, label: &Handle<Label>) {
        self.add(label);
    }

    pub fn remove_cloud(&self, cloud: &Handle<Cloud>) -> bool {
        self.remove(cloud)
    }

    pub fn remove_image(&self, image: &Handle<Image>) -> bool {
        self.remove(image)
    }

    pub fn remove_cuboid(&self, cuboid: &Handle<Cuboid>) -> bool {
        self.remove(cuboid)
    }

    pub fn remove_label(&self, label: &Handle<Label>) -> bool {
        self.remove(label)
    }

    pub fn push_key_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&WindowCtx, i32, i32) -> Result<bool, HandlerError> + 'static,
    {
        self.handlers.key.push(handler);
    }

    pub fn push_mouse_button_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&WindowCtx, i32, i32) -> Result<bool, HandlerError> + 'static,
    {
        self.handlers.mouse_button.push(handler);
    }

    pub fn push_scroll_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&WindowCtx, f64, f64) -> Result<bool, HandlerError> + 'static,
    {
        self.handlers.scroll.push(handler);
    }

    pub fn push_mouse_pos_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&WindowCtx, f64, f64) -> Result<bool, HandlerError> + 'static,
    {
        self.handlers.mouse_pos.push(handler);
    }

    pub fn pop_key_handler(&mut self) -> bool {
        self.handlers.key.pop()
    }

    pub fn pop_mouse_button_handler(&mut self) -> bool {
        self.handlers.mouse_button.pop()
    }

    pub fn pop_scroll_handler(&mut self) -> bool {
        self.handlers.scroll.pop()
    }

    pub fn pop_mouse_pos_handler(&mut self) -> bool {
        self.handlers.mouse_pos.pop()
    }
}

impl<W: WindowBackend, R: RenderBackend> Drop for PointViz<W, R> {
    fn drop(&mut self) {
        if self.running() {
            self.set_running(false);
        }
        self.bindings.clear();
        if let Err(e) = self.window.make_current() {
            error!(error = %e, "releasing renderer without a current context");
        }
        self.renderer.uninitialize();
    }
}
