//! CPU reference backend.
//!
//! Every binding keeps its own copy of the buffers it was handed, the same way
//! a GPU binding owns device buffers, and re-uploads only dirty field groups.
//! Each frame's output is recorded in a [`FrameLog`] so callers can inspect
//! what was drawn without a display.

use std::marker::PhantomData;

use glam::{DMat4, DVec3};
use pointviz_common::{to_dmat4, ArgumentError, VizError, Vec4f, WindowCtx};
use pointviz_scene::{
    Cloud, CloudField, ColumnPoseTexture, Cuboid, CuboidField, FieldGroup, Image, ImageField,
    Label, LabelField, ObjectKind, StateView,
};
use tracing::{debug, trace};

use crate::backend::{ObjectRenderer, RenderBackend};
use crate::camera::CameraData;
use crate::target::TargetDisplay;

/// Per-field upload counters of one binding.
#[derive(Debug, Clone)]
pub struct Uploads<F> {
    counts: Vec<u32>,
    _group: PhantomData<F>,
}

impl<F: FieldGroup> Uploads<F> {
    fn new() -> Self {
        Self {
            counts: vec![0; F::ALL.len()],
            _group: PhantomData,
        }
    }

    fn record(&mut self, field: F) {
        self.counts[field.index() as usize] += 1;
    }

    /// How many times `field` was re-uploaded after creation.
    pub fn get(&self, field: F) -> u32 {
        self.counts[field.index() as usize]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

/// A cloud point after every transform, in the target frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub position: DVec3,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloudDraw {
    pub points: Vec<ResolvedPoint>,
    pub point_size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageDraw {
    /// Quad corners in normalized device coordinates, x already divided by
    /// the aspect ratio.
    pub vertices: [[f32; 2]; 4],
    pub image_size: (usize, usize),
    pub mask_size: (usize, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CuboidDraw {
    pub corners: [DVec3; 8],
    pub rgba: Vec4f,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelDraw {
    pub text: String,
    /// Anchor in window fractions, `(0, 0)` top left.
    pub anchor: [f64; 2],
    pub align_right: bool,
    pub scale: f32,
}

/// Everything drawn since the last `clear_frame`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLog {
    pub clouds: Vec<CloudDraw>,
    pub images: Vec<ImageDraw>,
    pub cuboids: Vec<CuboidDraw>,
    pub labels: Vec<LabelDraw>,
    pub rings: Vec<f64>,
    /// Object passes in the order they ran.
    pub passes: Vec<ObjectKind>,
}

#[derive(Debug)]
pub struct SoftwareCloud {
    uploads: Uploads<CloudField>,
    w: usize,
    xyz: Vec<f32>,
    offset: Vec<f32>,
    range: Vec<f32>,
    key: Vec<f32>,
    mask: Vec<f32>,
    column_poses: ColumnPoseTexture,
    trans_index: Vec<f32>,
    pose: DMat4,
    palette: Vec<f32>,
    point_size: f32,
}

impl SoftwareCloud {
    pub fn uploads(&self) -> &Uploads<CloudField> {
        &self.uploads
    }

    fn upload(&mut self, cloud: &Cloud, field: CloudField) {
        match field {
            CloudField::Range => self.range.clone_from_slice(cloud.range()),
            CloudField::Key => self.key.clone_from_slice(cloud.key()),
            CloudField::Mask => self.mask.clone_from_slice(cloud.mask()),
            CloudField::Xyz => self.xyz.clone_from_slice(cloud.xyz()),
            CloudField::Offset => self.offset.clone_from_slice(cloud.offset()),
            CloudField::ColumnPoses => self.column_poses.clone_from(cloud.column_poses()),
            CloudField::Pose => self.pose = to_dmat4(cloud.pose()),
            CloudField::Palette => {
                self.palette.clear();
                self.palette.extend_from_slice(cloud.palette());
            }
            CloudField::PointSize => self.point_size = cloud.point_size(),
        }
        self.uploads.record(field);
    }

    fn resolve(&self, extrinsic: &DMat4) -> Vec<ResolvedPoint> {
        (0..self.range.len())
            .map(|i| {
                let r = self.range[i] as f64;
                let local = if r > 0.0 {
                    let dir = vec3_at(&self.xyz, i);
                    let off = vec3_at(&self.offset, i);
                    extrinsic.transform_point3(dir * r + off)
                } else {
                    DVec3::ZERO
                };
                let column = self.column_poses.sample(self.trans_index[i]).to_dmat4();
                ResolvedPoint {
                    position: (self.pose * column).transform_point3(local),
                    color: self.color(i),
                }
            })
            .collect()
    }

    /// Palette color at `sqrt(key)`, blended with the mask by its alpha.
    fn color(&self, i: usize) -> [f32; 3] {
        let entries = self.palette.len() / 3;
        let base = if entries == 0 {
            [0.0; 3]
        } else {
            let t = self.key[i].max(0.0).sqrt();
            let idx = ((t * entries as f32) as usize).min(entries - 1);
            [
                self.palette[3 * idx],
                self.palette[3 * idx + 1],
                self.palette[3 * idx + 2],
            ]
        };
        let m = &self.mask[4 * i..4 * i + 4];
        let a = m[3];
        [
            base[0] * (1.0 - a) + m[0] * a,
            base[1] * (1.0 - a) + m[1] * a,
            base[2] * (1.0 - a) + m[2] * a,
        ]
    }
}

fn vec3_at(buf: &[f32], i: usize) -> DVec3 {
    DVec3::new(buf[3 * i] as f64, buf[3 * i + 1] as f64, buf[3 * i + 2] as f64)
}

#[derive(Debug)]
pub struct SoftwareImage {
    uploads: Uploads<ImageField>,
    position: Vec4f,
    image_size: (usize, usize),
    image: Vec<f32>,
    mask_size: (usize, usize),
    mask: Vec<f32>,
}

impl SoftwareImage {
    pub fn uploads(&self) -> &Uploads<ImageField> {
        &self.uploads
    }
}

#[derive(Debug)]
pub struct SoftwareCuboid {
    uploads: Uploads<CuboidField>,
    transform: DMat4,
    rgba: Vec4f,
}

impl SoftwareCuboid {
    pub fn uploads(&self) -> &Uploads<CuboidField> {
        &self.uploads
    }
}

#[derive(Debug)]
pub struct SoftwareLabel {
    uploads: Uploads<LabelField>,
    text: String,
    position: DVec3,
    is_3d: bool,
    align_right: bool,
    scale: f32,
}

impl SoftwareLabel {
    pub fn uploads(&self) -> &Uploads<LabelField> {
        &self.uploads
    }
}

/// CPU implementation of [`RenderBackend`].
#[derive(Debug, Default)]
pub struct SoftwareRenderer {
    initialized: bool,
    pass: Option<ObjectKind>,
    frame: FrameLog,
    frames: u64,
    uploads: u64,
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the most recent frame drew.
    pub fn last_frame(&self) -> &FrameLog {
        &self.frame
    }

    /// Frames started with `clear_frame`.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Field-group uploads across every binding since creation.
    pub fn total_uploads(&self) -> u64 {
        self.uploads
    }

    fn require_initialized(&self, binding: &'static str) -> Result<(), VizError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ArgumentError::Uninitialized { binding }.into())
        }
    }
}

impl ObjectRenderer<Cloud> for SoftwareRenderer {
    type Binding = SoftwareCloud;

    fn create(&mut self, cloud: &Cloud) -> Result<SoftwareCloud, VizError> {
        self.require_initialized("cloud")?;
        let w = cloud.cols();
        Ok(SoftwareCloud {
            uploads: Uploads::new(),
            w,
            xyz: cloud.xyz().to_vec(),
            offset: cloud.offset().to_vec(),
            range: cloud.range().to_vec(),
            key: cloud.key().to_vec(),
            mask: cloud.mask().to_vec(),
            column_poses: cloud.column_poses().clone(),
            trans_index: cloud.trans_index(),
            pose: to_dmat4(cloud.pose()),
            palette: cloud.palette().to_vec(),
            point_size: cloud.point_size(),
        })
    }

    fn draw(
        &mut self,
        binding: &mut SoftwareCloud,
        _ctx: &WindowCtx,
        _camera: &CameraData,
        mut cloud: StateView<'_, Cloud>,
    ) {
        for field in cloud.pending().iter() {
            binding.upload(&cloud, field);
            cloud.consume(field);
            self.uploads += 1;
        }
        let points = binding.resolve(&to_dmat4(cloud.extrinsic()));
        trace!(points = points.len(), cols = binding.w, "cloud drawn");
        self.frame.clouds.push(CloudDraw {
            points,
            point_size: binding.point_size,
        });
    }
}

impl ObjectRenderer<Image> for SoftwareRenderer {
    type Binding = SoftwareImage;

    fn create(&mut self, image: &Image) -> Result<SoftwareImage, VizError> {
        self.require_initialized("image")?;
        Ok(SoftwareImage {
            uploads: Uploads::new(),
            position: image.position(),
            image_size: image.image_size(),
            image: image.image().to_vec(),
            mask_size: image.mask_size(),
            mask: image.mask().to_vec(),
        })
    }

    fn draw(
        &mut self,
        binding: &mut SoftwareImage,
        ctx: &WindowCtx,
        _camera: &CameraData,
        mut image: StateView<'_, Image>,
    ) {
        for field in image.pending().iter() {
            match field {
                ImageField::Position => binding.position = image.position(),
                ImageField::Image => {
                    binding.image_size = image.image_size();
                    binding.image.clear();
                    binding.image.extend_from_slice(image.image());
                }
                ImageField::Mask => {
                    binding.mask_size = image.mask_size();
                    binding.mask.clear();
                    binding.mask.extend_from_slice(image.mask());
                }
            }
            binding.uploads.record(field);
            image.consume(field);
            self.uploads += 1;
        }

        let aspect = ctx.aspect() as f32;
        let [x0, x1, y0, y1] = binding.position;
        let (x0, x1) = (x0 / aspect, x1 / aspect);
        self.frame.images.push(ImageDraw {
            vertices: [[x0, y0], [x0, y1], [x1, y1], [x1, y0]],
            image_size: binding.image_size,
            mask_size: binding.mask_size,
        });
    }
}

impl ObjectRenderer<Cuboid> for SoftwareRenderer {
    type Binding = SoftwareCuboid;

    fn create(&mut self, cuboid: &Cuboid) -> Result<SoftwareCuboid, VizError> {
        self.require_initialized("cuboid")?;
        Ok(SoftwareCuboid {
            uploads: Uploads::new(),
            transform: to_dmat4(cuboid.transform()),
            rgba: cuboid.rgba(),
        })
    }

    fn draw(
        &mut self,
        binding: &mut SoftwareCuboid,
        _ctx: &WindowCtx,
        _camera: &CameraData,
        mut cuboid: StateView<'_, Cuboid>,
    ) {
        for field in cuboid.pending().iter() {
            match field {
                CuboidField::Transform => binding.transform = to_dmat4(cuboid.transform()),
                CuboidField::Rgba => binding.rgba = cuboid.rgba(),
            }
            binding.uploads.record(field);
            cuboid.consume(field);
            self.uploads += 1;
        }

        let mut corners = [DVec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let unit = DVec3::new(
                if i & 1 == 0 { -0.5 } else { 0.5 },
                if i & 2 == 0 { -0.5 } else { 0.5 },
                if i & 4 == 0 { -0.5 } else { 0.5 },
            );
            *corner = binding.transform.transform_point3(unit);
        }
        self.frame.cuboids.push(CuboidDraw {
            corners,
            rgba: binding.rgba,
        });
    }
}

impl ObjectRenderer<Label> for SoftwareRenderer {
    type Binding = SoftwareLabel;

    fn create(&mut self, label: &Label) -> Result<SoftwareLabel, VizError> {
        self.require_initialized("label")?;
        Ok(SoftwareLabel {
            uploads: Uploads::new(),
            text: label.text().to_owned(),
            position: DVec3::from_array(label.position()),
            is_3d: label.is_3d(),
            align_right: label.align_right(),
            scale: label.scale(),
        })
    }

    fn draw(
        &mut self,
        binding: &mut SoftwareLabel,
        _ctx: &WindowCtx,
        camera: &CameraData,
        mut label: StateView<'_, Label>,
    ) {
        for field in label.pending().iter() {
            match field {
                LabelField::Text => {
                    binding.text.clear();
                    binding.text.push_str(label.text());
                }
                LabelField::Position => {
                    binding.position = DVec3::from_array(label.position());
                    binding.is_3d = label.is_3d();
                    binding.align_right = label.align_right();
                }
                LabelField::Scale => binding.scale = label.scale(),
            }
            binding.uploads.record(field);
            label.consume(field);
            self.uploads += 1;
        }

        let anchor = if binding.is_3d {
            let ndc = camera.proj_view().project_point3(binding.position);
            [(ndc.x + 1.0) / 2.0, (1.0 - ndc.y) / 2.0]
        } else {
            [binding.position.x, binding.position.y]
        };
        self.frame.labels.push(LabelDraw {
            text: binding.text.clone(),
            anchor,
            align_right: binding.align_right,
            scale: binding.scale,
        });
    }
}

impl RenderBackend for SoftwareRenderer {
    fn initialize(&mut self) -> Result<(), VizError> {
        if !self.initialized {
            debug!("software renderer initialized");
        }
        self.initialized = true;
        Ok(())
    }

    fn uninitialize(&mut self) {
        if self.initialized {
            debug!(frames = self.frames, "software renderer released");
        }
        self.initialized = false;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn clear_frame(&mut self) {
        self.frame = FrameLog::default();
        self.frames += 1;
    }

    fn begin_draw(&mut self, kind: ObjectKind) {
        self.pass = Some(kind);
        self.frame.passes.push(kind);
    }

    fn end_draw(&mut self, kind: ObjectKind) {
        debug_assert_eq!(self.pass, Some(kind));
        self.pass = None;
    }

    fn draw_rings(&mut self, _ctx: &WindowCtx, _camera: &CameraData, target: &TargetDisplay) {
        self.frame.rings = target.ring_radii();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use pointviz_common::IDENTITY4D;
    use pointviz_scene::SceneObject;

    fn ready() -> SoftwareRenderer {
        let mut r = SoftwareRenderer::new();
        r.initialize().unwrap();
        r
    }

    fn frame_inputs() -> (WindowCtx, CameraData) {
        (
            WindowCtx::with_viewport(800, 400),
            Camera::new().matrices(2.0),
        )
    }

    /// Two columns, two rows, every ray along +x with unit length.
    fn two_column_cloud() -> Cloud {
        let n = 4;
        let mut dir = vec![0.0; 3 * n];
        dir[..n].fill(1.0);
        let mut cloud = Cloud::structured(2, 2, &dir, &vec![0.0; 3 * n], IDENTITY4D).unwrap();
        let mut rotation = vec![0.0; 18];
        for v in 0..2 {
            for axis in 0..3 {
                rotation[(3 * axis + axis) * 2 + v] = 1.0;
            }
        }
        // column 0 at the origin, column 1 shifted 10 m along x
        let translation = [0.0, 10.0, 0.0, 0.0, 0.0, 0.0];
        cloud.set_column_poses(&rotation, &translation).unwrap();
        cloud.set_range(&[1, 2, 3, 4]).unwrap();
        cloud
    }

    #[test]
    fn create_before_initialize_fails() {
        let mut r = SoftwareRenderer::new();
        let err = ObjectRenderer::<Cuboid>::create(&mut r, &Cuboid::new(IDENTITY4D, [1.0; 4]))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(ObjectRenderer::<Image>::create(&mut r, &Image::new()).is_err());
    }

    #[test]
    fn points_resolve_against_their_column_pose() {
        let mut r = ready();
        let (ctx, cam) = frame_inputs();
        let mut cloud = two_column_cloud();
        let mut binding = ObjectRenderer::<Cloud>::create(&mut r, &cloud).unwrap();
        r.clear_frame();
        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut cloud));

        let xs: Vec<f64> = r.last_frame().clouds[0]
            .points
            .iter()
            .map(|p| p.position.x)
            .collect();
        // points 0 and 2 use column 0, points 1 and 3 use column 1
        assert_eq!(xs, vec![1.0, 12.0, 3.0, 14.0]);
    }

    #[test]
    fn zero_range_collapses_to_origin() {
        let mut r = ready();
        let (ctx, cam) = frame_inputs();
        let mut cloud = two_column_cloud();
        cloud.set_range(&[0, 0, 5, 0]).unwrap();
        let mut binding = ObjectRenderer::<Cloud>::create(&mut r, &cloud).unwrap();
        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut cloud));

        let points = &r.last_frame().clouds[0].points;
        assert_eq!(points[0].position, DVec3::ZERO);
        assert_eq!(points[1].position, DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(points[2].position, DVec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn draw_consumes_dirty_and_skips_clean() {
        let mut r = ready();
        let (ctx, cam) = frame_inputs();
        let mut cloud = two_column_cloud();
        let mut binding = ObjectRenderer::<Cloud>::create(&mut r, &cloud).unwrap();

        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut cloud));
        assert!(!cloud.is_dirty());
        let after_first = binding.uploads().total();
        assert_eq!(binding.uploads().get(CloudField::Range), 1);

        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut cloud));
        assert_eq!(binding.uploads().total(), after_first);

        cloud.set_key(&[1.0; 4]).unwrap();
        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut cloud));
        assert_eq!(binding.uploads().get(CloudField::Key), 1);
        assert_eq!(binding.uploads().get(CloudField::Range), 1);
        assert_eq!(binding.uploads().total(), after_first + 1);
    }

    #[test]
    fn mask_alpha_overrides_palette() {
        let mut r = ready();
        let (ctx, cam) = frame_inputs();
        let mut cloud = Cloud::unstructured(1, IDENTITY4D);
        cloud.set_palette(&[0.0, 0.0, 1.0]).unwrap();
        cloud.set_mask(&[1.0, 0.0, 0.0, 1.0]).unwrap();
        let mut binding = ObjectRenderer::<Cloud>::create(&mut r, &cloud).unwrap();
        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut cloud));
        assert_eq!(r.last_frame().clouds[0].points[0].color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn image_quad_is_aspect_corrected() {
        let mut r = ready();
        let (ctx, cam) = frame_inputs();
        let mut image = Image::new();
        image.set_position(-1.0, 1.0, -0.5, 0.5);
        let mut binding = ObjectRenderer::<Image>::create(&mut r, &image).unwrap();
        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut image));
        let quad = &r.last_frame().images[0];
        assert_eq!(
            quad.vertices,
            [[-0.5, 0.5], [-0.5, -0.5], [0.5, -0.5], [0.5, 0.5]]
        );
        assert_eq!(binding.uploads().get(ImageField::Position), 1);
    }

    #[test]
    fn label_2d_anchor_passes_through() {
        let mut r = ready();
        let (ctx, cam) = frame_inputs();
        let mut label = Label::new_2d("hello", 0.25, 0.75, true);
        let mut binding = ObjectRenderer::<Label>::create(&mut r, &label).unwrap();
        r.draw(&mut binding, &ctx, &cam, StateView::new(&mut label));
        let drawn = &r.last_frame().labels[0];
        assert_eq!(drawn.anchor, [0.25, 0.75]);
        assert_eq!(drawn.text, "hello");
        assert!(!label.is_dirty());
    }

    #[test]
    fn clear_frame_resets_log_and_counts() {
        let mut r = ready();
        let (ctx, cam) = frame_inputs();
        let mut target = TargetDisplay::default();
        target.enable_rings(true);
        r.draw_rings(&ctx, &cam, &target);
        assert!(!r.last_frame().rings.is_empty());
        r.clear_frame();
        assert_eq!(*r.last_frame(), FrameLog::default());
        assert_eq!(r.frames(), 1);
    }
}
