//! Per-column pose encoding.
//!
//! `w` rigid-body poses are packed into a `w x 4` grid of RGB texels: rows
//! 0..3 hold the rotation columns, row 3 holds the translation. A point picks
//! its pose with one scalar `s` in `[0, 1]`; lookups snap to the nearest
//! column and never blend neighbours, so any backend that samples with
//! nearest filtering (texture, storage buffer, plain array) reproduces the
//! supplied poses exactly.

use glam::{DMat4, DVec4};
use pointviz_common::{check_dims, VizError};

/// Slack added before flooring so `v / w` computed in `f32` still lands on `v`.
const SNAP_EPSILON: f64 = 1e-3;

/// One column's rigid-body transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnPose {
    /// Row-major 3x3 rotation.
    pub rotation: [[f32; 3]; 3],
    pub translation: [f32; 3],
}

impl ColumnPose {
    pub const IDENTITY: Self = Self {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: [0.0; 3],
    };

    pub fn to_dmat4(&self) -> DMat4 {
        let r = &self.rotation;
        let t = &self.translation;
        DMat4::from_cols(
            DVec4::new(r[0][0] as f64, r[1][0] as f64, r[2][0] as f64, 0.0),
            DVec4::new(r[0][1] as f64, r[1][1] as f64, r[2][1] as f64, 0.0),
            DVec4::new(r[0][2] as f64, r[1][2] as f64, r[2][2] as f64, 0.0),
            DVec4::new(t[0] as f64, t[1] as f64, t[2] as f64, 1.0),
        )
    }
}

/// `w x 4` RGB texel grid holding one pose per column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPoseTexture {
    width: usize,
    /// Row-major: texel `(row, column)` lives at `row * width + column`.
    texels: Vec<[f32; 3]>,
}

impl ColumnPoseTexture {
    pub const ROWS: usize = 4;

    /// Every column set to the identity pose.
    pub fn identity(width: usize) -> Self {
        let mut texels = vec![[0.0; 3]; width * Self::ROWS];
        for v in 0..width {
            for axis in 0..3 {
                texels[axis * width + v][axis] = 1.0;
            }
        }
        Self { width, texels }
    }

    /// Build a texture from the planar caller layout (see [`Self::write`]).
    pub fn encode(width: usize, rotation: &[f32], translation: &[f32]) -> Result<Self, VizError> {
        let mut texture = Self::identity(width);
        texture.write(rotation, translation)?;
        Ok(texture)
    }

    /// Overwrite all poses.
    ///
    /// Rotation element `(row, col)` of column `v` is
    /// `rotation[(3 * row + col) * w + v]`; translation component `c` is
    /// `translation[c * w + v]`. Sizes are checked before anything is written.
    pub fn write(&mut self, rotation: &[f32], translation: &[f32]) -> Result<(), VizError> {
        let w = self.width;
        check_dims("column rotation", &[9, w], rotation.len())?;
        check_dims("column translation", &[3, w], translation.len())?;

        for v in 0..w {
            for col in 0..3 {
                for row in 0..3 {
                    self.texels[col * w + v][row] = rotation[(3 * row + col) * w + v];
                }
            }
            for c in 0..3 {
                self.texels[3 * w + v][c] = translation[c * w + v];
            }
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn texels(&self) -> &[[f32; 3]] {
        &self.texels
    }

    /// Flat `12 * w` float view, the layout a texture upload expects.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.texels)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    pub fn texel(&self, row: usize, column: usize) -> [f32; 3] {
        self.texels[row * self.width + column]
    }

    /// Decode the pose stored for column `v`.
    pub fn column(&self, v: usize) -> ColumnPose {
        let c0 = self.texel(0, v);
        let c1 = self.texel(1, v);
        let c2 = self.texel(2, v);
        ColumnPose {
            rotation: [
                [c0[0], c1[0], c2[0]],
                [c0[1], c1[1], c2[1]],
                [c0[2], c1[2], c2[2]],
            ],
            translation: self.texel(3, v),
        }
    }

    /// Nearest column for sample coordinate `s`, clamped to the grid.
    pub fn column_index(&self, s: f32) -> usize {
        if self.width == 0 {
            return 0;
        }
        let x = (s as f64 * self.width as f64 + SNAP_EPSILON).floor();
        // NaN and negatives saturate to 0 in the cast.
        (x as usize).min(self.width - 1)
    }

    /// Nearest-neighbour lookup of the pose at `s`.
    pub fn sample(&self, s: f32) -> ColumnPose {
        if self.width == 0 {
            return ColumnPose::IDENTITY;
        }
        self.column(self.column_index(s))
    }

    /// Sample coordinate of the centre of column `v`.
    pub fn texel_center(v: usize, width: usize) -> f32 {
        ((v as f64 + 0.5) / width.max(1) as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four columns, each with a distinct rotation (about Z by 0/90/180/270
    /// degrees) and translation `(10 v, v, -v)`.
    fn four_columns() -> (Vec<f32>, Vec<f32>, Vec<ColumnPose>) {
        let w = 4;
        let rots: [[[f32; 3]; 3]; 4] = [
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]],
            [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        ];
        let mut rotation = vec![0.0; 9 * w];
        let mut translation = vec![0.0; 3 * w];
        let mut expected = Vec::new();
        for v in 0..w {
            for row in 0..3 {
                for col in 0..3 {
                    rotation[(3 * row + col) * w + v] = rots[v][row][col];
                }
            }
            let t = [10.0 * v as f32, v as f32, -(v as f32)];
            for c in 0..3 {
                translation[c * w + v] = t[c];
            }
            expected.push(ColumnPose {
                rotation: rots[v],
                translation: t,
            });
        }
        (rotation, translation, expected)
    }

    #[test]
    fn identity_texture_decodes_to_identity() {
        let tex = ColumnPoseTexture::identity(3);
        for v in 0..3 {
            assert_eq!(tex.column(v), ColumnPose::IDENTITY);
        }
        assert_eq!(tex.as_floats().len(), 12 * 3);
    }

    #[test]
    fn sampling_at_column_starts_is_exact() {
        let (rotation, translation, expected) = four_columns();
        let tex = ColumnPoseTexture::encode(4, &rotation, &translation).unwrap();
        for v in 0..4 {
            assert_eq!(tex.sample(v as f32 / 4.0), expected[v], "column {v}");
            assert_eq!(
                tex.sample(ColumnPoseTexture::texel_center(v, 4)),
                expected[v]
            );
        }
    }

    #[test]
    fn no_blending_across_column_boundaries() {
        let (rotation, translation, expected) = four_columns();
        let tex = ColumnPoseTexture::encode(4, &rotation, &translation).unwrap();
        let eps = 0.01;
        for v in 1..4 {
            let boundary = v as f32 / 4.0;
            assert_eq!(tex.sample(boundary + eps), expected[v]);
            assert_eq!(tex.sample(boundary - eps), expected[v - 1]);
        }
    }

    #[test]
    fn sample_clamps_out_of_range() {
        let (rotation, translation, expected) = four_columns();
        let tex = ColumnPoseTexture::encode(4, &rotation, &translation).unwrap();
        assert_eq!(tex.sample(1.0), expected[3]);
        assert_eq!(tex.sample(-0.5), expected[0]);
        assert_eq!(tex.sample(f32::NAN), expected[0]);
    }

    #[test]
    fn wrong_sizes_leave_texture_untouched() {
        let mut tex = ColumnPoseTexture::identity(2);
        let before = tex.clone();
        assert!(tex.write(&[0.0; 17], &[0.0; 6]).is_err());
        assert!(tex.write(&[0.0; 18], &[0.0; 5]).is_err());
        assert_eq!(tex, before);
    }

    #[test]
    fn pose_matrix_applies_rotation_then_translation() {
        let (rotation, translation, _) = four_columns();
        let tex = ColumnPoseTexture::encode(4, &rotation, &translation).unwrap();
        let m = tex.column(1).to_dmat4();
        let p = m.transform_point3(glam::DVec3::X);
        // 90 degrees about Z maps X to Y, then translate by (10, 1, -1).
        assert!((p - glam::DVec3::new(10.0, 2.0, -1.0)).length() < 1e-9);
    }

    #[test]
    fn byte_view_matches_float_view() {
        let tex = ColumnPoseTexture::identity(5);
        assert_eq!(tex.as_bytes().len(), tex.as_floats().len() * 4);
    }
}
