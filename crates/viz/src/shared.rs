//! State shared between producers and the render thread.
//!
//! Producers stage changes on their object handles and the staged camera, then
//! call `update()` to publish into the front snapshot. The render thread
//! consumes the front once per frame. Publishing never waits: if any piece of
//! state it needs is held elsewhere it gives up and reports `false`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use pointviz_render::{Camera, TargetDisplay};
use pointviz_scene::{Cloud, Cuboid, Handle, Image, Label, SceneObject};
use serde::{Deserialize, Serialize};

fn try_lock<T>(mutex: &Mutex<T>) -> Option<MutexGuard<'_, T>> {
    match mutex.try_lock() {
        Ok(guard) => Some(guard),
        Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
        Err(TryLockError::WouldBlock) => None,
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Registered handles of one object type. Removed entries leave a hole that
/// the next add reuses, so indices stay aligned with the front slots.
pub struct Entries<T> {
    slots: Vec<Option<Handle<T>>>,
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Entries<T> {
    /// Returns `false` if the handle was already present.
    fn add(&mut self, handle: &Handle<T>) -> bool {
        if self.slots.iter().flatten().any(|h| h.ptr_eq(handle)) {
            return false;
        }
        match self.slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => *slot = Some(handle.clone()),
            None => self.slots.push(Some(handle.clone())),
        }
        true
    }

    fn remove(&mut self, handle: &Handle<T>) -> bool {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|h| h.ptr_eq(handle)) {
                *slot = None;
                return true;
            }
        }
        false
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Lock every entry without waiting, or none of them.
    fn try_lock_all(&self) -> Option<Vec<Option<(&Handle<T>, MutexGuard<'_, T>)>>> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(handle) => handle.try_lock().map(|guard| Some((handle, guard))),
                None => Some(None),
            })
            .collect()
    }
}

#[derive(Default)]
pub struct Registry {
    pub(crate) clouds: Entries<Cloud>,
    pub(crate) images: Entries<Image>,
    pub(crate) cuboids: Entries<Cuboid>,
    pub(crate) labels: Entries<Label>,
}

/// One published object as the render thread sees it.
pub(crate) struct FrontSlot<T> {
    /// Unique per slot instance; a new id means a new binding is needed.
    pub(crate) id: u64,
    source: Handle<T>,
    pub(crate) object: T,
}

pub(crate) type FrontList<T> = Vec<Option<FrontSlot<T>>>;

/// The render-visible snapshot.
pub(crate) struct Front {
    pub(crate) camera: Camera,
    pub(crate) target: TargetDisplay,
    pub(crate) clouds: FrontList<Cloud>,
    pub(crate) images: FrontList<Image>,
    pub(crate) cuboids: FrontList<Cuboid>,
    pub(crate) labels: FrontList<Label>,
    /// Published but not yet drawn.
    pub(crate) changed: bool,
}

/// Object types the registry knows how to store.
pub trait Registered: SceneObject + Sized {
    #[doc(hidden)]
    fn entries(registry: &mut Registry) -> &mut Entries<Self>;
}

macro_rules! registered {
    ($ty:ty, $field:ident) => {
        impl Registered for $ty {
            fn entries(registry: &mut Registry) -> &mut Entries<Self> {
                &mut registry.$field
            }
        }
    };
}

registered!(Cloud, clouds);
registered!(Image, images);
registered!(Cuboid, cuboids);
registered!(Label, labels);

/// Publish and frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishStats {
    /// `update()` calls that reached the front snapshot.
    pub published: u64,
    /// `update()` calls that found something busy and returned `false`.
    pub skipped: u64,
    /// Frames drawn by the render thread.
    pub frames: u64,
}

pub(crate) struct Shared {
    pub(crate) running: AtomicBool,
    pub(crate) camera: Mutex<Camera>,
    pub(crate) target: Mutex<TargetDisplay>,
    registry: Mutex<Registry>,
    pub(crate) front: Mutex<Front>,
    next_id: AtomicU64,
    published: AtomicU64,
    skipped: AtomicU64,
    pub(crate) frames: AtomicU64,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            camera: Mutex::new(Camera::default()),
            target: Mutex::new(TargetDisplay::default()),
            registry: Mutex::new(Registry::default()),
            front: Mutex::new(Front {
                camera: Camera::default(),
                target: TargetDisplay::default(),
                clouds: Vec::new(),
                images: Vec::new(),
                cuboids: Vec::new(),
                labels: Vec::new(),
                changed: false,
            }),
            next_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            frames: AtomicU64::new(0),
        }
    }

    fn skip(&self, reason: &'static str) -> bool {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(reason, "publish skipped");
        false
    }

    /// Publish staged state into the front snapshot. See [`VizHandle::update`].
    pub(crate) fn update(&self) -> bool {
        let _span = tracing::info_span!("publish").entered();

        let Some(mut front) = try_lock(&self.front) else {
            return self.skip("front snapshot busy");
        };
        let Some(camera) = try_lock(&self.camera) else {
            return self.skip("camera busy");
        };
        // The camera always follows, even if objects are not ready yet.
        front.camera.clone_from(&camera);
        drop(camera);

        let Some(target) = try_lock(&self.target) else {
            return self.skip("target display busy");
        };
        let Some(registry) = try_lock(&self.registry) else {
            return self.skip("registry busy");
        };

        // Take every object lock before touching the front, so a busy object
        // leaves the snapshot exactly as it was.
        let Some(mut clouds) = registry.clouds.try_lock_all() else {
            return self.skip("cloud busy");
        };
        let Some(mut images) = registry.images.try_lock_all() else {
            return self.skip("image busy");
        };
        let Some(mut cuboids) = registry.cuboids.try_lock_all() else {
            return self.skip("cuboid busy");
        };
        let Some(mut labels) = registry.labels.try_lock_all() else {
            return self.skip("label busy");
        };

        let overwrote = front.changed;
        self.publish_list(&mut clouds, &mut front.clouds);
        self.publish_list(&mut images, &mut front.images);
        self.publish_list(&mut cuboids, &mut front.cuboids);
        self.publish_list(&mut labels, &mut front.labels);
        front.target = *target;
        front.changed = true;

        self.published.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            clouds = registry.clouds.len(),
            images = registry.images.len(),
            cuboids = registry.cuboids.len(),
            labels = registry.labels.len(),
            overwrote,
            "published"
        );
        true
    }

    fn publish_list<T: SceneObject>(
        &self,
        staged: &mut [Option<(&Handle<T>, MutexGuard<'_, T>)>],
        front: &mut FrontList<T>,
    ) {
        if front.len() < staged.len() {
            front.resize_with(staged.len(), || None);
        }
        for (entry, slot) in staged.iter_mut().zip(front.iter_mut()) {
            let Some((handle, object)) = entry else {
                *slot = None;
                continue;
            };
            let handle: &Handle<T> = handle;
            let object: &mut T = object;
            if let Some(current) = slot.as_mut().filter(|s| s.source.ptr_eq(handle)) {
                current.object.absorb(object);
                continue;
            }
            // New object, or a different one reusing a freed slot.
            *slot = Some(FrontSlot {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                source: handle.clone(),
                object: object.clone(),
            });
            object.clear();
        }
    }

    fn add<T: Registered>(&self, handle: &Handle<T>) {
        let added = T::entries(&mut lock(&self.registry)).add(handle);
        tracing::debug!(kind = %T::KIND, added, "add");
    }

    fn remove<T: Registered>(&self, handle: &Handle<T>) -> bool {
        let removed = T::entries(&mut lock(&self.registry)).remove(handle);
        tracing::debug!(kind = %T::KIND, removed, "remove");
        removed
    }

    pub(crate) fn stats(&self) -> PublishStats {
        PublishStats {
            published: self.published.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe side of a visualizer.
///
/// Cheap to clone; every clone talks to the same visualizer. Producers use
/// it to add and remove objects, move the camera and publish.
#[derive(Clone)]
pub struct VizHandle {
    pub(crate) shared: Arc<Shared>,
}

impl VizHandle {
    /// Publish all staged object, camera and target-display changes.
    ///
    /// Never blocks. Returns `false` if the render thread is reading the
    /// front snapshot or a staged object or the camera is locked elsewhere;
    /// staged changes are then kept for the next attempt. A publish that
    /// lands before the previous one was drawn replaces it: the next frame
    /// sees the latest data and every field group changed by either.
    pub fn update(&self) -> bool {
        self.shared.update()
    }

    /// Register an object. Takes effect on the next successful `update()`.
    /// Adding a handle that is already registered does nothing.
    pub fn add<T: Registered>(&self, handle: &Handle<T>) {
        self.shared.add(handle);
    }

    /// Unregister an object by identity. Takes effect on the next successful
    /// `update()`.
    pub fn remove<T: Registered>(&self, handle: &Handle<T>) -> bool {
        self.shared.remove(handle)
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

    /// Staged camera. Release the guard before calling `update()`.
    pub fn camera(&self) -> MutexGuard<'_, Camera> {
        lock(&self.shared.camera)
    }

    /// Staged target display. Release the guard before calling `update()`.
    pub fn target_display(&self) -> MutexGuard<'_, TargetDisplay> {
        lock(&self.shared.target)
    }

    pub fn running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Ask the render loop to stop (or keep going). Checked once per frame.
    pub fn set_running(&self, running: bool) {
        self.shared.running.store(running, Ordering::Release);
    }

    pub fn stats(&self) -> PublishStats {
        self.shared.stats()
    }
}
