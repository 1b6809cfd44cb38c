use pointviz_common::{check_dims, check_len, palette, ArgumentError, Mat4d, VizError, IDENTITY4D};

use crate::dirty::{DirtyFlags, FieldGroup};
use crate::object::{ObjectKind, SceneObject};
use crate::pose::ColumnPoseTexture;

/// Default rendered point size in pixels.
pub const DEFAULT_POINT_SIZE: f32 = 2.0;

/// How a cloud's points get their positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Fixed unit directions and offsets scaled by per-point range.
    Structured,
    /// Explicit xyz per point; ranges stay at 1.
    Unstructured,
}

impl Addressing {
    pub fn name(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Unstructured => "unstructured",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudField {
    Range,
    Key,
    Mask,
    Xyz,
    Offset,
    ColumnPoses,
    Pose,
    Palette,
    PointSize,
}

impl FieldGroup for CloudField {
    const ALL: &'static [Self] = &[
        Self::Range,
        Self::Key,
        Self::Mask,
        Self::Xyz,
        Self::Offset,
        Self::ColumnPoses,
        Self::Pose,
        Self::Palette,
        Self::PointSize,
    ];

    fn index(self) -> u32 {
        self as u32
    }
}

/// A point cloud of `n` points split into `w` columns.
///
/// Point `i` is placed at
/// `pose * column_pose[i % w] * (extrinsic * (xyz_i * range_i + offset_i))`,
/// or at the sensor origin when its range is zero.
#[derive(Debug, Clone)]
pub struct Cloud {
    n: usize,
    w: usize,
    addressing: Addressing,
    extrinsic: Mat4d,
    /// Interleaved `[x0, y0, z0, x1, ...]`.
    xyz: Vec<f32>,
    /// Interleaved like `xyz`.
    offset: Vec<f32>,
    range: Vec<f32>,
    key: Vec<f32>,
    mask: Vec<f32>,
    column_poses: ColumnPoseTexture,
    pose: Mat4d,
    palette: Vec<f32>,
    point_size: f32,
    dirty: DirtyFlags<CloudField>,
}

impl Cloud {
    fn blank(w: usize, n: usize, addressing: Addressing, extrinsic: Mat4d) -> Self {
        Self {
            n,
            w,
            addressing,
            extrinsic,
            xyz: vec![0.0; 3 * n],
            offset: vec![0.0; 3 * n],
            range: vec![0.0; n],
            key: vec![0.0; n],
            mask: vec![0.0; 4 * n],
            column_poses: ColumnPoseTexture::identity(w),
            pose: IDENTITY4D,
            palette: palette::SPEZIA.to_vec(),
            point_size: DEFAULT_POINT_SIZE,
            dirty: DirtyFlags::with(&[
                CloudField::ColumnPoses,
                CloudField::Pose,
                CloudField::Palette,
            ]),
        }
    }

    /// Cloud of `n` points positioned by [`Cloud::set_xyz`]. Uses one column.
    pub fn unstructured(n: usize, extrinsic: Mat4d) -> Self {
        let mut cloud = Self::blank(1, n, Addressing::Unstructured, extrinsic);
        cloud.range.fill(1.0);
        cloud.dirty.mark(CloudField::Range);
        cloud
    }

    /// Cloud of `w * h` points on fixed rays, positioned by [`Cloud::set_range`].
    ///
    /// `dir` and `off` use the planar layout: component `k` of point `i` is
    /// at `k * n + i`.
    pub fn structured(
        w: usize,
        h: usize,
        dir: &[f32],
        off: &[f32],
        extrinsic: Mat4d,
    ) -> Result<Self, VizError> {
        check_dims("cloud xyz", &[3, w, h], dir.len())?;
        check_dims("cloud offset", &[3, w, h], off.len())?;
        let n = w * h;

        let mut cloud = Self::blank(w, n, Addressing::Structured, extrinsic);
        interleave(n, dir, &mut cloud.xyz);
        interleave(n, off, &mut cloud.offset);
        cloud.dirty.mark(CloudField::Xyz);
        cloud.dirty.mark(CloudField::Offset);
        Ok(cloud)
    }

    fn require(&self, mode: Addressing, field: &'static str) -> Result<(), VizError> {
        if self.addressing == mode {
            Ok(())
        } else {
            Err(ArgumentError::AddressingMode {
                field,
                mode: self.addressing.name(),
            }
            .into())
        }
    }

    /// Per-point range along each ray. Structured clouds only.
    pub fn set_range(&mut self, range: &[u32]) -> Result<(), VizError> {
        self.require(Addressing::Structured, "cloud range")?;
        check_len("cloud range", self.n, range.len())?;
        for (dst, src) in self.range.iter_mut().zip(range) {
            *dst = *src as f32;
        }
        self.dirty.mark(CloudField::Range);
        Ok(())
    }

    /// Per-point palette coordinate in `[0, 1]`.
    pub fn set_key(&mut self, key: &[f32]) -> Result<(), VizError> {
        check_len("cloud key", self.n, key.len())?;
        self.key.copy_from_slice(key);
        self.dirty.mark(CloudField::Key);
        Ok(())
    }

    /// Per-point RGBA overlay.
    pub fn set_mask(&mut self, mask: &[f32]) -> Result<(), VizError> {
        check_len("cloud mask", 4 * self.n, mask.len())?;
        self.mask.copy_from_slice(mask);
        self.dirty.mark(CloudField::Mask);
        Ok(())
    }

    /// Explicit point positions, planar layout. Unstructured clouds only.
    pub fn set_xyz(&mut self, xyz: &[f32]) -> Result<(), VizError> {
        self.require(Addressing::Unstructured, "cloud xyz")?;
        check_len("cloud xyz", 3 * self.n, xyz.len())?;
        interleave(self.n, xyz, &mut self.xyz);
        self.dirty.mark(CloudField::Xyz);
        Ok(())
    }

    /// Per-point offsets, planar layout. Unstructured clouds only.
    pub fn set_offset(&mut self, offset: &[f32]) -> Result<(), VizError> {
        self.require(Addressing::Unstructured, "cloud offset")?;
        check_len("cloud offset", 3 * self.n, offset.len())?;
        interleave(self.n, offset, &mut self.offset);
        self.dirty.mark(CloudField::Offset);
        Ok(())
    }

    /// Whole-cloud pose, column-major.
    pub fn set_pose(&mut self, pose: Mat4d) {
        self.pose = pose;
        self.dirty.mark(CloudField::Pose);
    }

    /// Per-column rigid-body poses. See [`ColumnPoseTexture::write`] for the layout.
    pub fn set_column_poses(&mut self, rotation: &[f32], translation: &[f32]) -> Result<(), VizError> {
        self.column_poses.write(rotation, translation)?;
        self.dirty.mark(CloudField::ColumnPoses);
        Ok(())
    }

    /// Replace the palette with `k` RGB entries (`3k` floats, `k >= 1`).
    pub fn set_palette(&mut self, palette: &[f32]) -> Result<(), VizError> {
        if palette.is_empty() || palette.len() % 3 != 0 {
            return Err(ArgumentError::PaletteLength(palette.len()).into());
        }
        self.palette.clear();
        self.palette.extend_from_slice(palette);
        self.dirty.mark(CloudField::Palette);
        Ok(())
    }

    pub fn set_point_size(&mut self, size: f32) {
        self.point_size = size;
        self.dirty.mark(CloudField::PointSize);
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Number of columns, i.e. distinct column poses.
    pub fn cols(&self) -> usize {
        self.w
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    pub fn extrinsic(&self) -> &Mat4d {
        &self.extrinsic
    }

    pub fn xyz(&self) -> &[f32] {
        &self.xyz
    }

    pub fn offset(&self) -> &[f32] {
        &self.offset
    }

    pub fn range(&self) -> &[f32] {
        &self.range
    }

    pub fn key(&self) -> &[f32] {
        &self.key
    }

    pub fn mask(&self) -> &[f32] {
        &self.mask
    }

    pub fn column_poses(&self) -> &ColumnPoseTexture {
        &self.column_poses
    }

    pub fn pose(&self) -> &Mat4d {
        &self.pose
    }

    pub fn palette(&self) -> &[f32] {
        &self.palette
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Column-pose sample coordinate of every point: the centre of column
    /// `i % w`.
    pub fn trans_index(&self) -> Vec<f32> {
        (0..self.n)
            .map(|i| ColumnPoseTexture::texel_center(i % self.w.max(1), self.w))
            .collect()
    }
}

impl SceneObject for Cloud {
    type Field = CloudField;

    const KIND: ObjectKind = ObjectKind::Cloud;

    fn dirty(&self) -> &DirtyFlags<CloudField> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyFlags<CloudField> {
        &mut self.dirty
    }

    fn copy_field(&mut self, src: &Self, field: CloudField) {
        match field {
            CloudField::Range => self.range.clone_from(&src.range),
            CloudField::Key => self.key.clone_from(&src.key),
            CloudField::Mask => self.mask.clone_from(&src.mask),
            CloudField::Xyz => self.xyz.clone_from(&src.xyz),
            CloudField::Offset => self.offset.clone_from(&src.offset),
            CloudField::ColumnPoses => self.column_poses.clone_from(&src.column_poses),
            CloudField::Pose => self.pose = src.pose,
            CloudField::Palette => self.palette.clone_from(&src.palette),
            CloudField::PointSize => self.point_size = src.point_size,
        }
    }
}

/// Planar `[x.., y.., z..]` to interleaved `[x, y, z, ...]`.
fn interleave(n: usize, planar: &[f32], out: &mut [f32]) {
    for i in 0..n {
        for k in 0..3 {
            out[3 * i + k] = planar[k * n + i];
        }
    }
}
