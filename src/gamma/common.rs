//! Shared pieces of the gamma kernels: per-call coefficient scalars,
//! coordinate vectors and index arithmetic.
//!
//! All per-voxel work runs on squared quantities with precomputed inverse
//! squares; a single sqrt per voxel converts the winning gamma² to gamma.

use crate::image::DoseImage;
use crate::params::{GammaNormalization, GammaParameters};
use crate::types::{GridSize, ImageAxis};

/// Inverse-square scalars hoisted out of the per-voxel loops.
#[derive(Clone, Copy)]
pub(super) struct GammaCoeffs {
  pub dd_inv_sq: f32,
  pub dta_inv_sq: f32,
  pub dd_global_norm_inv_sq: f32,
  pub is_global: bool,
  pub dose_cutoff: f32,
}

impl GammaCoeffs {
  pub(super) fn new(params: &GammaParameters) -> Self {
    let dd_inv_sq = (100.0 * 100.0) / (params.dd_threshold * params.dd_threshold);
    Self {
      dd_inv_sq,
      dta_inv_sq: 1.0 / (params.dta_threshold * params.dta_threshold),
      dd_global_norm_inv_sq: dd_inv_sq / (params.global_norm_dose * params.global_norm_dose),
      is_global: params.normalization == GammaNormalization::Global,
      dose_cutoff: params.dose_cutoff,
    }
  }

  /// True when this reference dose is not evaluated (NaN in the result).
  #[inline]
  pub(super) fn skips(&self, dose_ref: f32) -> bool {
    dose_ref < self.dose_cutoff || (!self.is_global && dose_ref == 0.0)
  }

  /// Squared inverse of the normalized DD for this reference dose.
  #[inline]
  pub(super) fn dd_norm_inv_sq(&self, dose_ref: f32) -> f32 {
    if self.is_global {
      self.dd_global_norm_inv_sq
    } else {
      self.dd_inv_sq / (dose_ref * dose_ref)
    }
  }
}

/// Squared 1D Euclidean distance.
#[inline]
pub(super) fn dist_sq_1d(x1: f32, x2: f32) -> f32 {
  (x2 - x1) * (x2 - x1)
}

/// Physical coordinates of every grid position along `axis`.
pub(super) fn generate_coordinates(img: &DoseImage, axis: ImageAxis) -> Vec<f32> {
  let (start, step, len) = match axis {
    ImageAxis::Z => (img.offset().frames, img.spacing().frames, img.size().frames),
    ImageAxis::Y => (img.offset().rows, img.spacing().rows, img.size().rows),
    ImageAxis::X => (
      img.offset().columns,
      img.spacing().columns,
      img.size().columns,
    ),
  };

  let mut result = Vec::with_capacity(len as usize);
  let mut val = start;
  for _ in 0..len {
    result.push(val);
    val += step;
  }
  result
}

/// Decompose a flat index into (row, column).
#[inline]
pub(super) fn index_to_2d(index: usize, size: GridSize) -> (u32, u32) {
  let j = index / size.columns as usize;
  let i = index % size.columns as usize;
  (j as u32, i as u32)
}

/// Decompose a flat index into (frame, row, column).
#[inline]
pub(super) fn index_to_3d(index: usize, size: GridSize) -> (u32, u32, u32) {
  let frame_len = size.rows as usize * size.columns as usize;
  let k = index / frame_len;
  let rest = index % frame_len;
  let j = rest / size.columns as usize;
  let i = rest % size.columns as usize;
  (k as u32, j as u32, i as u32)
}
