use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use crate::dirty::{DirtyFlags, FieldGroup};

/// The four drawable object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Cloud,
    Image,
    Cuboid,
    Label,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Image => "image",
            Self::Cuboid => "cuboid",
            Self::Label => "label",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common surface of every scene object: staged buffers plus dirty flags.
pub trait SceneObject: Clone + Send + 'static {
    type Field: FieldGroup;

    const KIND: ObjectKind;

    fn dirty(&self) -> &DirtyFlags<Self::Field>;

    fn dirty_mut(&mut self) -> &mut DirtyFlags<Self::Field>;

    /// Copy one field group's buffer from `src`. Flags are not touched.
    fn copy_field(&mut self, src: &Self, field: Self::Field);

    /// Mark everything consumed. Buffers are left as they are.
    fn clear(&mut self) {
        self.dirty_mut().clear();
    }

    fn is_dirty(&self) -> bool {
        self.dirty().any()
    }

    /// Take over every dirty field group of `staged`, then clear `staged`.
    ///
    /// Flags accumulate on `self`, so an unconsumed earlier publish is
    /// overwritten with the latest data without losing which groups changed.
    fn absorb(&mut self, staged: &mut Self) {
        let pending = *staged.dirty();
        for field in pending.iter() {
            self.copy_field(staged, field);
        }
        self.dirty_mut().merge(&pending);
        staged.clear();
    }
}

/// Shared-ownership handle to a scene object.
///
/// The caller and the visualizer each hold a clone; identity is the
/// allocation, not the contents.
pub struct Handle<T>(Arc<Mutex<T>>);

impl<T> Handle<T> {
    pub fn new(object: T) -> Self {
        Self(Arc::new(Mutex::new(object)))
    }

    /// Lock the object, recovering the data if a previous holder panicked.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lock without waiting. `None` when someone else holds the object.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        match self.0.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Whether both handles refer to the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> From<T> for Handle<T> {
    fn from(object: T) -> Self {
        Self::new(object)
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", Arc::as_ptr(&self.0))
    }
}

/// What a renderer binding may do with an object: read its buffers, and
/// read or clear its dirty flags.
pub struct StateView<'a, T: SceneObject> {
    object: &'a mut T,
}

impl<'a, T: SceneObject> StateView<'a, T> {
    pub fn new(object: &'a mut T) -> Self {
        Self { object }
    }

    pub fn is_dirty(&self, field: T::Field) -> bool {
        self.object.dirty().contains(field)
    }

    /// Clear one group's flag, returning whether it needed consuming.
    pub fn consume(&mut self, field: T::Field) -> bool {
        self.object.dirty_mut().take(field)
    }

    /// Flags not yet consumed.
    pub fn pending(&self) -> DirtyFlags<T::Field> {
        *self.object.dirty()
    }
}

impl<T: SceneObject> Deref for StateView<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cuboid;
    use pointviz_common::IDENTITY4D;

    #[test]
    fn handle_identity_is_allocation() {
        let a = Handle::new(Cuboid::new(IDENTITY4D, [1.0; 4]));
        let b = Handle::new(Cuboid::new(IDENTITY4D, [1.0; 4]));
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn try_lock_fails_while_held() {
        let h = Handle::new(Cuboid::new(IDENTITY4D, [1.0; 4]));
        let guard = h.lock();
        assert!(h.try_lock().is_none());
        drop(guard);
        assert!(h.try_lock().is_some());
    }

    #[test]
    fn view_consumes_single_group() {
        let mut cuboid = Cuboid::new(IDENTITY4D, [1.0; 4]);
        let mut view = StateView::new(&mut cuboid);
        assert!(view.consume(crate::CuboidField::Rgba));
        assert!(!view.is_dirty(crate::CuboidField::Rgba));
        assert!(view.is_dirty(crate::CuboidField::Transform));
        assert_eq!(view.rgba(), [1.0; 4]);
    }

    #[test]
    fn absorb_accumulates_flags_and_clears_source() {
        let mut front = Cuboid::new(IDENTITY4D, [0.0; 4]);
        front.clear();
        front.set_rgba([0.5; 4]);

        let mut staged = Cuboid::new(IDENTITY4D, [0.0; 4]);
        staged.clear();
        let mut moved = IDENTITY4D;
        moved[12] = 3.0;
        staged.set_transform(moved);

        front.absorb(&mut staged);
        assert!(!staged.is_dirty());
        assert!(front.dirty().contains(crate::CuboidField::Rgba));
        assert!(front.dirty().contains(crate::CuboidField::Transform));
        assert_eq!(front.transform()[12], 3.0);
        assert_eq!(front.rgba(), [0.5; 4]);
    }
}
