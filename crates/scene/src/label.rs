use pointviz_common::Vec3d;

use crate::dirty::{DirtyFlags, FieldGroup};
use crate::object::{ObjectKind, SceneObject};

pub const DEFAULT_LABEL_SCALE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Text,
    Position,
    Scale,
}

impl FieldGroup for LabelField {
    const ALL: &'static [Self] = &[Self::Text, Self::Position, Self::Scale];

    fn index(self) -> u32 {
        self as u32
    }
}

/// Text anchored either in the world or on the screen.
#[derive(Debug, Clone)]
pub struct Label {
    text: String,
    /// World point when `is_3d`, else `[x, y, 0]` in window fractions.
    position: Vec3d,
    is_3d: bool,
    align_right: bool,
    scale: f32,
    dirty: DirtyFlags<LabelField>,
}

impl Label {
    /// Label anchored at a world position.
    pub fn new_3d(text: impl Into<String>, position: Vec3d) -> Self {
        Self {
            text: text.into(),
            position,
            is_3d: true,
            align_right: false,
            scale: DEFAULT_LABEL_SCALE,
            dirty: DirtyFlags::with(LabelField::ALL),
        }
    }

    /// Label anchored at `(x, y)` in window fractions, `(0, 0)` top left.
    pub fn new_2d(text: impl Into<String>, x: f32, y: f32, align_right: bool) -> Self {
        let mut label = Self::new_3d(text, [0.0; 3]);
        label.set_position_2d(x, y, align_right);
        label
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty.mark(LabelField::Text);
    }

    pub fn set_position_3d(&mut self, position: Vec3d) {
        self.position = position;
        self.is_3d = true;
        self.dirty.mark(LabelField::Position);
    }

    pub fn set_position_2d(&mut self, x: f32, y: f32, align_right: bool) {
        self.position = [x as f64, y as f64, 0.0];
        self.align_right = align_right;
        self.is_3d = false;
        self.dirty.mark(LabelField::Position);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.dirty.mark(LabelField::Scale);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> Vec3d {
        self.position
    }

    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    pub fn align_right(&self) -> bool {
        self.align_right
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl SceneObject for Label {
    type Field = LabelField;

    const KIND: ObjectKind = ObjectKind::Label;

    fn dirty(&self) -> &DirtyFlags<LabelField> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyFlags<LabelField> {
        &mut self.dirty
    }

    fn copy_field(&mut self, src: &Self, field: LabelField) {
        match field {
            LabelField::Text => self.text.clone_from(&src.text),
            LabelField::Position => {
                self.position = src.position;
                self.is_3d = src.is_3d;
                self.align_right = src.align_right;
            }
            LabelField::Scale => self.scale = src.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_label_is_fully_dirty() {
        let label = Label::new_2d("fps", 0.0, 0.0, true);
        assert_eq!(label.dirty().iter().count(), LabelField::ALL.len());
        assert!(!label.is_3d());
        assert!(label.align_right());
        assert_eq!(label.scale(), DEFAULT_LABEL_SCALE);
    }

    #[test]
    fn switching_anchor_kind() {
        let mut label = Label::new_2d("a", 0.5, 0.25, false);
        label.clear();
        label.set_position_3d([1.0, 2.0, 3.0]);
        assert!(label.is_3d());
        assert_eq!(label.position(), [1.0, 2.0, 3.0]);
        assert_eq!(
            label.dirty().iter().collect::<Vec<_>>(),
            vec![LabelField::Position]
        );
    }

    #[test]
    fn same_text_still_marks_dirty() {
        let mut label = Label::new_3d("x", [0.0; 3]);
        label.clear();
        label.set_text("x");
        assert!(label.dirty().contains(LabelField::Text));
    }

    #[test]
    fn every_setter_marks_its_group_on_equal_values() {
        let cases: &[(LabelField, fn(&mut Label))] = &[
            (LabelField::Text, |l| l.set_text("origin")),
            (LabelField::Position, |l| l.set_position_3d([1.0, 2.0, 3.0])),
            (LabelField::Scale, |l| l.set_scale(DEFAULT_LABEL_SCALE)),
        ];
        for (field, set) in cases {
            let mut label = Label::new_3d("origin", [1.0, 2.0, 3.0]);
            label.clear();
            set(&mut label);
            assert_eq!(label.dirty().iter().collect::<Vec<_>>(), vec![*field]);
            assert_eq!(label.text(), "origin");
            assert_eq!(label.position(), [1.0, 2.0, 3.0]);
            assert!(label.is_3d());
        }

        let mut label = Label::new_2d("fps", 0.25, 0.5, true);
        label.clear();
        label.set_position_2d(0.25, 0.5, true);
        assert_eq!(
            label.dirty().iter().collect::<Vec<_>>(),
            vec![LabelField::Position]
        );
        assert!(!label.is_3d());
    }
}
