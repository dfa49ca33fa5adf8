//! Dense dose image container.
//!
//! A [`DoseImage`] owns a contiguous f32 buffer indexed as
//! `data[(k * rows + j) * columns + i]` over (frames, rows, columns),
//! together with the physical offset and spacing of the grid. Slicing and
//! re-labelling along anatomical planes produce new owned images; nothing
//! aliases the source buffer.

use glam::Vec3;

use crate::error::GammaError;
use crate::types::{GridOffset, GridSize, GridSpacing, ImagePlane};

/// Dense 3D scalar field with grid metadata.
///
/// A 2D image is represented as a 3D image with a single frame.
#[derive(Clone, Debug)]
pub struct DoseImage {
  data: Vec<f32>,
  size: GridSize,
  offset: GridOffset,
  spacing: GridSpacing,
}

impl DoseImage {
  /// Create an image from a flat buffer and its metadata.
  ///
  /// Fails when the declared size disagrees with the buffer length.
  pub fn new(
    data: Vec<f32>,
    size: GridSize,
    offset: GridOffset,
    spacing: GridSpacing,
  ) -> Result<Self, GammaError> {
    if size.product() != data.len() {
      return Err(GammaError::ShapeMismatch(format!(
        "size {}x{}x{} is inconsistent with data length {}",
        size.frames,
        size.rows,
        size.columns,
        data.len()
      )));
    }
    Ok(Self {
      data,
      size,
      offset,
      spacing,
    })
  }

  /// Create a single-frame image from a nested 2D literal.
  ///
  /// Fails when the rows are ragged. Empty literals (no rows, or rows of
  /// zero length) produce an empty image that keeps the given metadata.
  pub fn from_2d(
    image: Vec<Vec<f32>>,
    offset: GridOffset,
    spacing: GridSpacing,
  ) -> Result<Self, GammaError> {
    let columns = image.first().map_or(0, Vec::len);
    if image.iter().any(|row| row.len() != columns) {
      return Err(GammaError::ShapeMismatch(
        "rows don't have the same length".into(),
      ));
    }

    let rows = image.len();
    if columns == 0 {
      return Self::new(Vec::new(), GridSize::new(0, 0, 0), offset, spacing);
    }

    let data: Vec<f32> = image.into_iter().flatten().collect();
    Self::new(
      data,
      GridSize::new(1, rows as u32, columns as u32),
      offset,
      spacing,
    )
  }

  /// Create an image from a nested 3D literal.
  ///
  /// Fails when the frames or the rows are ragged.
  pub fn from_3d(
    image: Vec<Vec<Vec<f32>>>,
    offset: GridOffset,
    spacing: GridSpacing,
  ) -> Result<Self, GammaError> {
    let rows = image.first().map_or(0, Vec::len);
    if image.iter().any(|frame| frame.len() != rows) {
      return Err(GammaError::ShapeMismatch(
        "frames don't have the same number of rows".into(),
      ));
    }

    let columns = image
      .first()
      .and_then(|frame| frame.first())
      .map_or(0, Vec::len);
    if image
      .iter()
      .any(|frame| frame.iter().any(|row| row.len() != columns))
    {
      return Err(GammaError::ShapeMismatch(
        "rows don't have the same length".into(),
      ));
    }

    let frames = image.len();
    if rows == 0 || columns == 0 {
      return Self::new(Vec::new(), GridSize::new(0, 0, 0), offset, spacing);
    }

    let data: Vec<f32> = image.into_iter().flatten().flatten().collect();
    Self::new(
      data,
      GridSize::new(frames as u32, rows as u32, columns as u32),
      offset,
      spacing,
    )
  }

  // ===========================================================================
  // Metadata
  // ===========================================================================

  #[inline]
  pub fn size(&self) -> GridSize {
    self.size
  }

  #[inline]
  pub fn offset(&self) -> GridOffset {
    self.offset
  }

  #[inline]
  pub fn spacing(&self) -> GridSpacing {
    self.spacing
  }

  /// Total number of voxels.
  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Re-label the grid without touching the data.
  ///
  /// The new size must cover exactly as many voxels as the old one.
  pub fn set_size(&mut self, size: GridSize) -> Result<(), GammaError> {
    if size.product() != self.data.len() {
      return Err(GammaError::ShapeMismatch(format!(
        "new size {}x{}x{} is inconsistent with data length {}",
        size.frames,
        size.rows,
        size.columns,
        self.data.len()
      )));
    }
    self.size = size;
    Ok(())
  }

  pub fn set_offset(&mut self, offset: GridOffset) {
    self.offset = offset;
  }

  pub fn set_spacing(&mut self, spacing: GridSpacing) {
    self.spacing = spacing;
  }

  /// Physical position of the centre of voxel (frame, row, column), as
  /// (x, y, z) in millimetres.
  #[inline]
  pub fn voxel_position(&self, frame: u32, row: u32, column: u32) -> Vec3 {
    Vec3::new(
      self.offset.columns + column as f32 * self.spacing.columns,
      self.offset.rows + row as f32 * self.spacing.rows,
      self.offset.frames + frame as f32 * self.spacing.frames,
    )
  }

  // ===========================================================================
  // Element access
  // ===========================================================================

  /// Bounds-checked element access.
  pub fn at(&self, frame: u32, row: u32, column: u32) -> Result<f32, GammaError> {
    if frame >= self.size.frames || row >= self.size.rows || column >= self.size.columns {
      return Err(GammaError::OutOfRange(format!(
        "index ({frame}, {row}, {column}) is past size {}x{}x{}",
        self.size.frames, self.size.rows, self.size.columns
      )));
    }
    Ok(self.get(frame, row, column))
  }

  /// Element access without an explicit range check.
  #[inline]
  pub fn get(&self, frame: u32, row: u32, column: u32) -> f32 {
    debug_assert!(frame < self.size.frames && row < self.size.rows && column < self.size.columns);
    self.data[self.flat_index(frame, row, column)]
  }

  /// Element access by flat index.
  #[inline]
  pub fn get_index(&self, index: usize) -> f32 {
    self.data[index]
  }

  /// The underlying contiguous buffer, for vectorized loads.
  #[inline]
  pub fn data(&self) -> &[f32] {
    &self.data
  }

  /// Consume the image and return its buffer.
  pub fn into_data(self) -> Vec<f32> {
    self.data
  }

  #[inline]
  fn flat_index(&self, frame: u32, row: u32, column: u32) -> usize {
    (frame as usize * self.size.rows as usize + row as usize) * self.size.columns as usize
      + column as usize
  }

  // ===========================================================================
  // Plane views
  // ===========================================================================

  /// Extract one slice along the given plane as a single-frame image.
  ///
  /// The frames axis of the returned image represents the plane normal: its
  /// spacing slot is 0 and its offset is advanced to the slice position.
  /// Fails when `frame` is past the length of the plane-normal axis.
  pub fn image_2d(&self, frame: u32, plane: ImagePlane) -> Result<DoseImage, GammaError> {
    let axis_len = match plane {
      ImagePlane::Axial => self.size.frames,
      ImagePlane::Coronal => self.size.rows,
      ImagePlane::Sagittal => self.size.columns,
    };
    if frame >= axis_len {
      return Err(GammaError::OutOfRange(format!(
        "frame {frame} is past the plane axis length {axis_len}"
      )));
    }

    let (size, offset, spacing) = match plane {
      ImagePlane::Axial => (
        GridSize::new(1, self.size.rows, self.size.columns),
        GridOffset::new(
          self.offset.frames + frame as f32 * self.spacing.frames,
          self.offset.rows,
          self.offset.columns,
        ),
        GridSpacing::new(0.0, self.spacing.rows, self.spacing.columns),
      ),
      ImagePlane::Coronal => (
        GridSize::new(1, self.size.frames, self.size.columns),
        GridOffset::new(
          self.offset.rows + frame as f32 * self.spacing.rows,
          self.offset.frames,
          self.offset.columns,
        ),
        GridSpacing::new(0.0, self.spacing.frames, self.spacing.columns),
      ),
      ImagePlane::Sagittal => (
        GridSize::new(1, self.size.frames, self.size.rows),
        GridOffset::new(
          self.offset.columns + frame as f32 * self.spacing.columns,
          self.offset.frames,
          self.offset.rows,
        ),
        GridSpacing::new(0.0, self.spacing.frames, self.spacing.rows),
      ),
    };

    let mut data = Vec::with_capacity(size.product());
    match plane {
      ImagePlane::Axial => {
        for j in 0..self.size.rows {
          for i in 0..self.size.columns {
            data.push(self.get(frame, j, i));
          }
        }
      }
      ImagePlane::Coronal => {
        for k in 0..self.size.frames {
          for i in 0..self.size.columns {
            data.push(self.get(k, frame, i));
          }
        }
      }
      ImagePlane::Sagittal => {
        for k in 0..self.size.frames {
          for j in 0..self.size.rows {
            data.push(self.get(k, j, frame));
          }
        }
      }
    }

    DoseImage::new(data, size, offset, spacing)
  }

  /// Re-label the image so that the frames axis runs along the given plane
  /// normal, permuting data and metadata together.
  ///
  /// Axial is the identity permutation.
  pub fn image_3d(&self, plane: ImagePlane) -> DoseImage {
    match plane {
      ImagePlane::Axial => self.clone(),
      ImagePlane::Coronal => {
        let size = GridSize::new(self.size.rows, self.size.frames, self.size.columns);
        let offset = GridOffset::new(self.offset.rows, self.offset.frames, self.offset.columns);
        let spacing =
          GridSpacing::new(self.spacing.rows, self.spacing.frames, self.spacing.columns);

        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.size.rows {
          for k in 0..self.size.frames {
            for i in 0..self.size.columns {
              data.push(self.get(k, j, i));
            }
          }
        }
        DoseImage {
          data,
          size,
          offset,
          spacing,
        }
      }
      ImagePlane::Sagittal => {
        let size = GridSize::new(self.size.columns, self.size.frames, self.size.rows);
        let offset = GridOffset::new(self.offset.columns, self.offset.frames, self.offset.rows);
        let spacing =
          GridSpacing::new(self.spacing.columns, self.spacing.frames, self.spacing.rows);

        let mut data = Vec::with_capacity(self.data.len());
        for i in 0..self.size.columns {
          for k in 0..self.size.frames {
            for j in 0..self.size.rows {
              data.push(self.get(k, j, i));
            }
          }
        }
        DoseImage {
          data,
          size,
          offset,
          spacing,
        }
      }
    }
  }

  // ===========================================================================
  // Reductions
  // ===========================================================================

  /// Minimum value. NaN dominates; an empty image yields NaN.
  pub fn min(&self) -> f32 {
    let mut values = self.data.iter().copied();
    let Some(first) = values.next() else {
      return f32::NAN;
    };
    values.fold(first, propagating_min)
  }

  /// Maximum value. NaN dominates; an empty image yields NaN.
  pub fn max(&self) -> f32 {
    let mut values = self.data.iter().copied();
    let Some(first) = values.next() else {
      return f32::NAN;
    };
    values.fold(first, propagating_max)
  }

  /// Sum of all values, with IEEE-754 semantics (`+Inf + -Inf = NaN`).
  pub fn sum(&self) -> f32 {
    self.data.iter().sum()
  }

  /// Arithmetic mean of all values.
  pub fn mean(&self) -> f32 {
    self.sum() / self.data.len() as f32
  }

  /// Population variance of all values.
  pub fn var(&self) -> f32 {
    let mean = self.mean();
    let sq_sum: f32 = self.data.iter().map(|v| (v - mean) * (v - mean)).sum();
    sq_sum / self.data.len() as f32
  }

  /// Minimum value, skipping NaNs. Yields NaN if no non-NaN cell exists.
  pub fn nanmin(&self) -> f32 {
    self
      .data
      .iter()
      .copied()
      .filter(|v| !v.is_nan())
      .fold(f32::NAN, |acc, v| if acc.is_nan() { v } else { acc.min(v) })
  }

  /// Maximum value, skipping NaNs. Yields NaN if no non-NaN cell exists.
  pub fn nanmax(&self) -> f32 {
    self
      .data
      .iter()
      .copied()
      .filter(|v| !v.is_nan())
      .fold(f32::NAN, |acc, v| if acc.is_nan() { v } else { acc.max(v) })
  }

  /// Sum of all non-NaN values. Infinities still count.
  pub fn nansum(&self) -> f32 {
    self.data.iter().filter(|v| !v.is_nan()).sum()
  }

  /// Mean of all non-NaN values.
  pub fn nanmean(&self) -> f32 {
    self.nansum() / self.nansize() as f32
  }

  /// Population variance of all non-NaN values.
  pub fn nanvar(&self) -> f32 {
    let mean = self.nanmean();
    let sq_sum: f32 = self
      .data
      .iter()
      .filter(|v| !v.is_nan())
      .map(|v| (v - mean) * (v - mean))
      .sum();
    sq_sum / self.nansize() as f32
  }

  /// Number of non-NaN cells.
  pub fn nansize(&self) -> usize {
    self.data.iter().filter(|v| !v.is_nan()).count()
  }

  pub fn contains_nan(&self) -> bool {
    self.data.iter().any(|v| v.is_nan())
  }

  pub fn contains_inf(&self) -> bool {
    self.data.iter().any(|v| v.is_infinite())
  }
}

/// Element-wise bitwise equality, so `NaN == NaN` holds.
///
/// This deliberately breaks IEEE-754 equality to make result comparison in
/// tests deterministic.
impl PartialEq for DoseImage {
  fn eq(&self, other: &Self) -> bool {
    self.size == other.size
      && self.offset == other.offset
      && self.spacing == other.spacing
      && self.data.len() == other.data.len()
      && self
        .data
        .iter()
        .zip(other.data.iter())
        .all(|(a, b)| a.to_bits() == b.to_bits())
  }
}

#[inline]
fn propagating_min(a: f32, b: f32) -> f32 {
  if a.is_nan() || b.is_nan() {
    f32::NAN
  } else {
    a.min(b)
  }
}

#[inline]
fn propagating_max(a: f32, b: f32) -> f32 {
  if a.is_nan() || b.is_nan() {
    f32::NAN
  } else {
    a.max(b)
  }
}

#[cfg(test)]
#[path = "image_test.rs"]
mod image_test;
