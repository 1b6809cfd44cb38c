use pointviz_common::{Mat4d, Vec4f};

use crate::dirty::{DirtyFlags, FieldGroup};
use crate::object::{ObjectKind, SceneObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuboidField {
    Transform,
    Rgba,
}

impl FieldGroup for CuboidField {
    const ALL: &'static [Self] = &[Self::Transform, Self::Rgba];

    fn index(self) -> u32 {
        self as u32
    }
}

/// A unit cube placed by a 4x4 transform, filled with one color.
#[derive(Debug, Clone)]
pub struct Cuboid {
    transform: Mat4d,
    rgba: Vec4f,
    dirty: DirtyFlags<CuboidField>,
}

impl Cuboid {
    pub fn new(transform: Mat4d, rgba: Vec4f) -> Self {
        Self {
            transform,
            rgba,
            dirty: DirtyFlags::with(CuboidField::ALL),
        }
    }

    pub fn set_transform(&mut self, transform: Mat4d) {
        self.transform = transform;
        self.dirty.mark(CuboidField::Transform);
    }

    pub fn set_rgba(&mut self, rgba: Vec4f) {
        self.rgba = rgba;
        self.dirty.mark(CuboidField::Rgba);
    }

    pub fn transform(&self) -> &Mat4d {
        &self.transform
    }

    pub fn rgba(&self) -> Vec4f {
        self.rgba
    }
}

impl SceneObject for Cuboid {
    type Field = CuboidField;

    const KIND: ObjectKind = ObjectKind::Cuboid;

    fn dirty(&self) -> &DirtyFlags<CuboidField> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyFlags<CuboidField> {
        &mut self.dirty
    }

    fn copy_field(&mut self, src: &Self, field: CuboidField) {
        match field {
            CuboidField::Transform => self.transform = src.transform,
            CuboidField::Rgba => self.rgba = src.rgba,
        }
    }
}
