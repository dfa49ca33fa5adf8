//! Linear, bilinear and trilinear resampling of dose images.
//!
//! Three forms per family:
//! - by new spacing, keeping the input offset,
//! - onto a virtual grid anchored at a given offset with a given spacing,
//!   emitting exactly the grid points that fall inside the input domain,
//! - onto the grid of a reference image (offset and spacing taken from it).
//!
//! Multi-axis resampling is separable: bilinear and trilinear forms apply
//! the 1D pass along each affected axis in turn, and passes along distinct
//! axes commute up to rounding.
//!
//! Pointwise sampling ([`BilinearSampler`], [`TrilinearSampler`]) hoists the
//! per-image bounds and inverse spacings so the per-point cost is a handful
//! of multiplies; the gamma kernels lean on this.

use crate::error::GammaError;
use crate::image::DoseImage;
use crate::types::{GridOffset, GridSize, GridSpacing, ImageAxis, ImagePlane};
use crate::TOLERANCE;

/// In-plane axes of a plane, in (first, second) order.
fn plane_axes(plane: ImagePlane) -> (ImageAxis, ImageAxis) {
  match plane {
    ImagePlane::Axial => (ImageAxis::Y, ImageAxis::X),
    ImagePlane::Coronal => (ImageAxis::Z, ImageAxis::X),
    ImagePlane::Sagittal => (ImageAxis::Z, ImageAxis::Y),
  }
}

fn axis_params(img: &DoseImage, axis: ImageAxis) -> (f32, f32, u32) {
  match axis {
    ImageAxis::Z => (img.offset().frames, img.spacing().frames, img.size().frames),
    ImageAxis::Y => (img.offset().rows, img.spacing().rows, img.size().rows),
    ImageAxis::X => (
      img.offset().columns,
      img.spacing().columns,
      img.size().columns,
    ),
  }
}

fn replace_axis_offset(offset: GridOffset, axis: ImageAxis, value: f32) -> GridOffset {
  let mut offset = offset;
  match axis {
    ImageAxis::Z => offset.frames = value,
    ImageAxis::Y => offset.rows = value,
    ImageAxis::X => offset.columns = value,
  }
  offset
}

fn replace_axis_spacing(spacing: GridSpacing, axis: ImageAxis, value: f32) -> GridSpacing {
  let mut spacing = spacing;
  match axis {
    ImageAxis::Z => spacing.frames = value,
    ImageAxis::Y => spacing.rows = value,
    ImageAxis::X => spacing.columns = value,
  }
  spacing
}

/// Empty image carrying the metadata a missed resampling must report.
fn empty_result(img: &DoseImage, axis: ImageAxis, offset: f32, spacing: f32) -> DoseImage {
  DoseImage::new(
    Vec::new(),
    GridSize::new(0, 0, 0),
    replace_axis_offset(img.offset(), axis, offset),
    replace_axis_spacing(img.spacing(), axis, spacing),
  )
  .expect("empty image is always consistent")
}

// =============================================================================
// Resampling
// =============================================================================

/// Linear interpolation along `axis` with a new spacing.
///
/// The output grid starts at the input offset and covers the largest range
/// that fits inside the input domain.
pub fn linear_along_axis(img: &DoseImage, spacing: f32, axis: ImageAxis) -> DoseImage {
  let (old_offset, old_spacing, old_len) = axis_params(img, axis);
  if img.is_empty() {
    return empty_result(img, axis, old_offset, spacing);
  }

  let span = (old_len - 1) as f32 * old_spacing;
  let new_len = (span / spacing + TOLERANCE).floor() as u32 + 1;
  resample_axis(img, old_offset, spacing, new_len, axis)
}

/// Linear interpolation along `axis` onto a virtual grid anchored at
/// `grid_offset` with pitch `grid_spacing`.
///
/// Exactly the grid points inside the input domain (within tolerance) are
/// emitted. A whole-axis miss produces a zero-length image that still
/// carries the requested grid on the affected axis.
pub fn linear_along_axis_on_grid(
  img: &DoseImage,
  grid_offset: f32,
  grid_spacing: f32,
  axis: ImageAxis,
) -> DoseImage {
  if img.is_empty() {
    return empty_result(img, axis, grid_offset, grid_spacing);
  }

  let (old_offset, old_spacing, old_len) = axis_params(img, axis);
  let start = old_offset;
  let end = old_offset + (old_len - 1) as f32 * old_spacing;

  // first grid point at or after the domain start
  let n0 = ((start - grid_offset) / grid_spacing - TOLERANCE).ceil();
  let new_offset = grid_offset + n0 * grid_spacing;

  let count = ((end - new_offset) / grid_spacing + TOLERANCE).floor() as i64;
  if count < 0 {
    return empty_result(img, axis, new_offset, grid_spacing);
  }

  resample_axis(img, new_offset, grid_spacing, count as u32 + 1, axis)
}

/// Linear interpolation along `axis` onto the grid of `reference`.
pub fn linear_on_reference_grid(
  img: &DoseImage,
  reference: &DoseImage,
  axis: ImageAxis,
) -> DoseImage {
  let (ref_offset, ref_spacing, _) = axis_params(reference, axis);
  linear_along_axis_on_grid(img, ref_offset, ref_spacing, axis)
}

/// Bilinear interpolation on `plane` with new spacings, applied as two
/// separable 1D passes.
pub fn bilinear_on_plane(
  img: &DoseImage,
  first_spacing: f32,
  second_spacing: f32,
  plane: ImagePlane,
) -> DoseImage {
  let (first, second) = plane_axes(plane);
  let pass = linear_along_axis(img, first_spacing, first);
  linear_along_axis(&pass, second_spacing, second)
}

/// Bilinear interpolation on `plane` onto a virtual grid.
pub fn bilinear_on_plane_on_grid(
  img: &DoseImage,
  first_offset: f32,
  second_offset: f32,
  first_spacing: f32,
  second_spacing: f32,
  plane: ImagePlane,
) -> DoseImage {
  let (first, second) = plane_axes(plane);
  let pass = linear_along_axis_on_grid(img, first_offset, first_spacing, first);
  linear_along_axis_on_grid(&pass, second_offset, second_spacing, second)
}

/// Bilinear interpolation on `plane` onto the grid of `reference`.
pub fn bilinear_on_reference_grid(
  img: &DoseImage,
  reference: &DoseImage,
  plane: ImagePlane,
) -> DoseImage {
  let (first, second) = plane_axes(plane);
  let pass = linear_on_reference_grid(img, reference, first);
  linear_on_reference_grid(&pass, reference, second)
}

/// Trilinear interpolation with new spacings on all three axes.
pub fn trilinear(img: &DoseImage, spacing: GridSpacing) -> DoseImage {
  let pass = linear_along_axis(img, spacing.frames, ImageAxis::Z);
  let pass = linear_along_axis(&pass, spacing.rows, ImageAxis::Y);
  linear_along_axis(&pass, spacing.columns, ImageAxis::X)
}

/// Trilinear interpolation onto a virtual grid on all three axes.
pub fn trilinear_on_grid(img: &DoseImage, offset: GridOffset, spacing: GridSpacing) -> DoseImage {
  let pass = linear_along_axis_on_grid(img, offset.frames, spacing.frames, ImageAxis::Z);
  let pass = linear_along_axis_on_grid(&pass, offset.rows, spacing.rows, ImageAxis::Y);
  linear_along_axis_on_grid(&pass, offset.columns, spacing.columns, ImageAxis::X)
}

/// Trilinear interpolation onto the grid of `reference` on all three axes.
pub fn trilinear_on_reference_grid(img: &DoseImage, reference: &DoseImage) -> DoseImage {
  trilinear_on_grid(img, reference.offset(), reference.spacing())
}

/// Interpolate along one axis onto an explicit output grid.
fn resample_axis(
  img: &DoseImage,
  new_offset: f32,
  new_spacing: f32,
  new_len: u32,
  axis: ImageAxis,
) -> DoseImage {
  let (old_offset, old_spacing, old_len) = axis_params(img, axis);

  // lower/upper source index and blend fraction per output position
  let table: Vec<(u32, u32, f32)> = (0..new_len)
    .map(|t| {
      let p = new_offset + t as f32 * new_spacing;
      let rel = (p - old_offset) / old_spacing;
      let i0 = (rel.floor().max(0.0) as u32).min(old_len - 1);
      let i1 = (i0 + 1).min(old_len - 1);
      let frac = if i1 > i0 {
        (p - (old_offset + i0 as f32 * old_spacing)) / old_spacing
      } else {
        0.0
      };
      (i0, i1, frac)
    })
    .collect();

  let size = img.size();
  let (new_size, new_grid_offset, new_grid_spacing) = (
    match axis {
      ImageAxis::Z => GridSize::new(new_len, size.rows, size.columns),
      ImageAxis::Y => GridSize::new(size.frames, new_len, size.columns),
      ImageAxis::X => GridSize::new(size.frames, size.rows, new_len),
    },
    replace_axis_offset(img.offset(), axis, new_offset),
    replace_axis_spacing(img.spacing(), axis, new_spacing),
  );

  let mut data = Vec::with_capacity(new_size.product());
  match axis {
    ImageAxis::Z => {
      for &(k0, k1, frac) in &table {
        for j in 0..size.rows {
          for i in 0..size.columns {
            data.push(img.get(k0, j, i) * (1.0 - frac) + img.get(k1, j, i) * frac);
          }
        }
      }
    }
    ImageAxis::Y => {
      for k in 0..size.frames {
        for &(j0, j1, frac) in &table {
          for i in 0..size.columns {
            data.push(img.get(k, j0, i) * (1.0 - frac) + img.get(k, j1, i) * frac);
          }
        }
      }
    }
    ImageAxis::X => {
      for k in 0..size.frames {
        for j in 0..size.rows {
          for &(i0, i1, frac) in &table {
            data.push(img.get(k, j, i0) * (1.0 - frac) + img.get(k, j, i1) * frac);
          }
        }
      }
    }
  }

  DoseImage::new(data, new_size, new_grid_offset, new_grid_spacing)
    .expect("resampled size matches generated data")
}

// =============================================================================
// Pointwise sampling
// =============================================================================

/// Per-axis scalars hoisted out of the per-point path.
#[derive(Clone, Copy)]
struct AxisSampler {
  offset: f32,
  spacing: f32,
  inv_spacing: f32,
  len: u32,
  min: f32,
  max: f32,
}

impl AxisSampler {
  fn new(offset: f32, spacing: f32, len: u32) -> Self {
    // a zero-length axis accepts no point at all
    let (min, max) = if len == 0 {
      (f32::INFINITY, f32::NEG_INFINITY)
    } else {
      (
        offset - TOLERANCE,
        offset + (len - 1) as f32 * spacing + TOLERANCE,
      )
    };
    Self {
      offset,
      spacing,
      inv_spacing: 1.0 / spacing,
      len,
      min,
      max,
    }
  }

  #[inline]
  fn in_range(&self, p: f32) -> bool {
    p >= self.min && p <= self.max
  }

  /// Lower/upper source index and blend fraction for an in-range point.
  #[inline]
  fn locate(&self, p: f32) -> (u32, u32, f32) {
    let i0 = (((p - self.offset) * self.inv_spacing).max(0.0) as u32).min(self.len - 1);
    let i1 = (i0 + 1).min(self.len - 1);
    let frac = if i1 > i0 {
      (p - (self.offset + i0 as f32 * self.spacing)) * self.inv_spacing
    } else {
      0.0
    };
    (i0, i1, frac)
  }
}

/// Bilinear sampler over the rows/columns plane of one image.
pub struct BilinearSampler<'a> {
  img: &'a DoseImage,
  y: AxisSampler,
  x: AxisSampler,
}

impl<'a> BilinearSampler<'a> {
  pub fn new(img: &'a DoseImage) -> Self {
    let size = img.size();
    Self {
      img,
      y: AxisSampler::new(img.offset().rows, img.spacing().rows, size.rows),
      x: AxisSampler::new(img.offset().columns, img.spacing().columns, size.columns),
    }
  }

  /// Sample at physical (y, x) within the given frame.
  ///
  /// Returns `None` when the point lies outside the image (beyond
  /// tolerance). The frame index must be valid.
  #[inline]
  pub fn sample(&self, frame: u32, y: f32, x: f32) -> Option<f32> {
    if !self.y.in_range(y) || !self.x.in_range(x) {
      return None;
    }

    let (j0, j1, yd) = self.y.locate(y);
    let (i0, i1, xd) = self.x.locate(x);

    let c00 = self.img.get(frame, j0, i0);
    let c01 = self.img.get(frame, j1, i0);
    let c10 = self.img.get(frame, j0, i1);
    let c11 = self.img.get(frame, j1, i1);

    let c0 = c00 * (1.0 - xd) + c10 * xd;
    let c1 = c01 * (1.0 - xd) + c11 * xd;

    Some(c0 * (1.0 - yd) + c1 * yd)
  }
}

/// Trilinear sampler over a full 3D image.
pub struct TrilinearSampler<'a> {
  img: &'a DoseImage,
  z: AxisSampler,
  y: AxisSampler,
  x: AxisSampler,
}

impl<'a> TrilinearSampler<'a> {
  pub fn new(img: &'a DoseImage) -> Self {
    let size = img.size();
    Self {
      img,
      z: AxisSampler::new(img.offset().frames, img.spacing().frames, size.frames),
      y: AxisSampler::new(img.offset().rows, img.spacing().rows, size.rows),
      x: AxisSampler::new(img.offset().columns, img.spacing().columns, size.columns),
    }
  }

  /// Sample at physical (z, y, x).
  ///
  /// Returns `None` when the point lies outside the image (beyond
  /// tolerance).
  #[inline]
  pub fn sample(&self, z: f32, y: f32, x: f32) -> Option<f32> {
    if !self.z.in_range(z) || !self.y.in_range(y) || !self.x.in_range(x) {
      return None;
    }

    let (k0, k1, zd) = self.z.locate(z);
    let (j0, j1, yd) = self.y.locate(y);
    let (i0, i1, xd) = self.x.locate(x);

    let c000 = self.img.get(k0, j0, i0);
    let c001 = self.img.get(k1, j0, i0);
    let c010 = self.img.get(k0, j1, i0);
    let c011 = self.img.get(k1, j1, i0);
    let c100 = self.img.get(k0, j0, i1);
    let c101 = self.img.get(k1, j0, i1);
    let c110 = self.img.get(k0, j1, i1);
    let c111 = self.img.get(k1, j1, i1);

    let c00 = c000 * (1.0 - xd) + c100 * xd;
    let c01 = c001 * (1.0 - xd) + c101 * xd;
    let c10 = c010 * (1.0 - xd) + c110 * xd;
    let c11 = c011 * (1.0 - xd) + c111 * xd;

    let c0 = c00 * (1.0 - yd) + c10 * yd;
    let c1 = c01 * (1.0 - yd) + c11 * yd;

    Some(c0 * (1.0 - zd) + c1 * zd)
  }
}

/// Bilinear interpolation at a physical point inside one frame.
///
/// Fails when the frame index is past the number of frames; returns
/// `Ok(None)` when (y, x) lies outside the frame.
pub fn bilinear_at_point(
  img: &DoseImage,
  frame: u32,
  y: f32,
  x: f32,
) -> Result<Option<f32>, GammaError> {
  if frame >= img.size().frames {
    return Err(GammaError::OutOfRange(format!(
      "frame {frame} is past the number of frames {}",
      img.size().frames
    )));
  }
  Ok(BilinearSampler::new(img).sample(frame, y, x))
}

/// Trilinear interpolation at a physical point inside the image.
pub fn trilinear_at_point(img: &DoseImage, z: f32, y: f32, x: f32) -> Option<f32> {
  if img.is_empty() {
    return None;
  }
  TrilinearSampler::new(img).sample(z, y, x)
}

#[cfg(test)]
#[path = "interpolation_test.rs"]
mod interpolation_test;
