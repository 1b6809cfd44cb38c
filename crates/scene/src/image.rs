use pointviz_common::{check_dims, VizError, Vec4f};

use crate::dirty::{DirtyFlags, FieldGroup};
use crate::object::{ObjectKind, SceneObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageField {
    Position,
    Image,
    Mask,
}

impl FieldGroup for ImageField {
    const ALL: &'static [Self] = &[Self::Position, Self::Image, Self::Mask];

    fn index(self) -> u32 {
        self as u32
    }
}

/// A monochrome 2D image with an optional RGBA mask, drawn as a screen quad.
///
/// The mask is sized independently of the image.
#[derive(Debug, Clone, Default)]
pub struct Image {
    image_width: usize,
    image_height: usize,
    image: Vec<f32>,
    mask_width: usize,
    mask_height: usize,
    mask: Vec<f32>,
    /// `[x_min, x_max, y_max, y_min]`.
    position: Vec4f,
    dirty: DirtyFlags<ImageField>,
}

impl Image {
    /// Empty image. Nothing is staged until a setter runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the image with `width * height` row-major intensities.
    pub fn set_image(&mut self, width: usize, height: usize, data: &[f32]) -> Result<(), VizError> {
        check_dims("image data", &[width, height], data.len())?;
        self.image_width = width;
        self.image_height = height;
        self.image.clear();
        self.image.extend_from_slice(data);
        self.dirty.mark(ImageField::Image);
        Ok(())
    }

    /// Replace the mask with `width * height` RGBA texels.
    pub fn set_mask(&mut self, width: usize, height: usize, data: &[f32]) -> Result<(), VizError> {
        check_dims("image mask", &[4, width, height], data.len())?;
        self.mask_width = width;
        self.mask_height = height;
        self.mask.clear();
        self.mask.extend_from_slice(data);
        self.dirty.mark(ImageField::Mask);
        Ok(())
    }

    /// Place the quad in window coordinates. x is divided by the aspect ratio
    /// when drawn; y spans `[-1, 1]` top to bottom.
    pub fn set_position(&mut self, x_min: f32, x_max: f32, y_min: f32, y_max: f32) {
        self.position = [x_min, x_max, y_max, y_min];
        self.dirty.mark(ImageField::Position);
    }

    pub fn image_size(&self) -> (usize, usize) {
        (self.image_width, self.image_height)
    }

    pub fn image(&self) -> &[f32] {
        &self.image
    }

    pub fn mask_size(&self) -> (usize, usize) {
        (self.mask_width, self.mask_height)
    }

    pub fn mask(&self) -> &[f32] {
        &self.mask
    }

    pub fn position(&self) -> Vec4f {
        self.position
    }
}

impl SceneObject for Image {
    type Field = ImageField;

    const KIND: ObjectKind = ObjectKind::Image;

    fn dirty(&self) -> &DirtyFlags<ImageField> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyFlags<ImageField> {
        &mut self.dirty
    }

    fn copy_field(&mut self, src: &Self, field: ImageField) {
        match field {
            ImageField::Position => self.position = src.position,
            ImageField::Image => {
                self.image_width = src.image_width;
                self.image_height = src.image_height;
                self.image.clone_from(&src.image);
            }
            ImageField::Mask => {
                self.mask_width = src.mask_width;
                self.mask_height = src.mask_height;
                self.mask.clone_from(&src.mask);
            }
        }
    }
}
