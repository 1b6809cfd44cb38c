use pointviz_common::{VizError, WindowCtx};
use pointviz_scene::{Cloud, Cuboid, Image, Label, ObjectKind, SceneObject, StateView};

use crate::camera::CameraData;
use crate::target::TargetDisplay;

/// Drawing path for one scene object type.
///
/// A binding owns whatever device-side copy the backend keeps of one object.
/// It is created on the object's first frame and reused until the object
/// leaves the scene.
pub trait ObjectRenderer<T: SceneObject> {
    type Binding;

    /// Allocate a binding holding every buffer of `object`.
    ///
    /// Fails with `InvalidArgument` when the backend is not initialized.
    fn create(&mut self, object: &T) -> Result<Self::Binding, VizError>;

    /// Draw one frame.
    ///
    /// Must re-upload exactly the dirty field groups, consume their flags, and
    /// leave clean groups untouched.
    fn draw(
        &mut self,
        binding: &mut Self::Binding,
        ctx: &WindowCtx,
        camera: &CameraData,
        object: StateView<'_, T>,
    );
}

/// A rendering backend: one binding type per object type plus frame-level
/// hooks.
///
/// Backends run on the render thread only and need not be `Send`.
pub trait RenderBackend:
    ObjectRenderer<Cloud> + ObjectRenderer<Image> + ObjectRenderer<Cuboid> + ObjectRenderer<Label>
{
    /// Build shared programs and resources. Must precede any `create`.
    fn initialize(&mut self) -> Result<(), VizError>;

    /// Release shared resources. Bindings created earlier become invalid.
    fn uninitialize(&mut self);

    fn is_initialized(&self) -> bool;

    /// Start a frame: clear color and depth.
    fn clear_frame(&mut self);

    /// Set up shared state before drawing every object of `kind`.
    fn begin_draw(&mut self, kind: ObjectKind);

    fn end_draw(&mut self, kind: ObjectKind);

    /// Draw the target rings, if enabled.
    fn draw_rings(&mut self, ctx: &WindowCtx, camera: &CameraData, target: &TargetDisplay);
}
