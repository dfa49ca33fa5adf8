//! Vectorized inner loop for the Classic kernels, on portable SIMD.
//!
//! The Classic inner loop scans every evaluated voxel; along a row the only
//! lane-varying inputs are the evaluated dose and the X coordinate, so eight
//! columns are processed per iteration with a per-lane running minimum. The
//! remainder of a row (`columns % 8`) goes through the scalar path, and the
//! lane minimum is folded into the scalar minimum once per reference voxel.
//!
//! The Wendling kernels are deliberately not vectorized: the sorted-offset
//! walk terminates early and too few lanes survive to the blend for the
//! vector form to pay off.

use std::simd::{f32x8, num::SimdFloat};

use crate::gamma::common::dist_sq_1d;

/// Platform lane count for f32 work.
pub(super) const LANES: usize = 8;

/// Coordinates along one axis, padded to a lane multiple.
///
/// The filler is NaN so a stray full-width load can never produce a lane
/// that survives the running minimum.
pub(super) fn padded_coordinates(start: f32, step: f32, len: usize) -> Vec<f32> {
  let padding = LANES - len % LANES;
  let mut coords = Vec::with_capacity(len + padding);

  let mut val = start;
  for _ in 0..len {
    coords.push(val);
    val += step;
  }
  coords.extend(std::iter::repeat(f32::NAN).take(padding));
  coords
}

/// Running minimum of squared gamma, kept lane-wise and scalar side by side.
pub(super) struct LaneMin {
  vec: f32x8,
  scalar: f32,
}

impl LaneMin {
  #[inline]
  pub(super) fn new() -> Self {
    Self {
      vec: f32x8::splat(f32::INFINITY),
      scalar: f32::INFINITY,
    }
  }

  /// Fold one evaluated row into the running minimum.
  ///
  /// `y_dist_sq` and `z_dist_sq` carry the squared distances shared by the
  /// whole row; `doses` and `x_coords` hold the row's evaluated doses and
  /// padded X coordinates.
  #[inline]
  pub(super) fn accumulate_row(
    &mut self,
    doses: &[f32],
    x_coords: &[f32],
    dose_ref: f32,
    x_ref: f32,
    y_dist_sq: f32,
    z_dist_sq: f32,
    dd_norm_inv_sq: f32,
    dta_inv_sq: f32,
  ) {
    let columns = doses.len();
    let simd_columns = columns - columns % LANES;

    let dose_ref_vec = f32x8::splat(dose_ref);
    let x_ref_vec = f32x8::splat(x_ref);
    let y_dist_sq_vec = f32x8::splat(y_dist_sq);
    let z_dist_sq_vec = f32x8::splat(z_dist_sq);
    let dd_norm_vec = f32x8::splat(dd_norm_inv_sq);
    let dta_vec = f32x8::splat(dta_inv_sq);

    let mut ie = 0;
    while ie < simd_columns {
      let dose_eval = f32x8::from_slice(&doses[ie..]);
      let x_eval = f32x8::from_slice(&x_coords[ie..]);

      let dose_diff = dose_ref_vec - dose_eval;
      let x_diff = x_ref_vec - x_eval;
      let gamma_sq = dose_diff * dose_diff * dd_norm_vec
        + ((x_diff * x_diff + y_dist_sq_vec) + z_dist_sq_vec) * dta_vec;

      self.vec = gamma_sq.simd_min(self.vec);
      ie += LANES;
    }

    // scalar tail over columns % LANES
    for (dose_eval, x_eval) in doses[simd_columns..]
      .iter()
      .zip(&x_coords[simd_columns..columns])
    {
      let gamma_sq = dist_sq_1d(*dose_eval, dose_ref) * dd_norm_inv_sq
        + ((dist_sq_1d(*x_eval, x_ref) + y_dist_sq) + z_dist_sq) * dta_inv_sq;
      if gamma_sq < self.scalar {
        self.scalar = gamma_sq;
      }
    }
  }

  /// Horizontal reduction: the smallest squared gamma seen on any lane.
  #[inline]
  pub(super) fn finish(self) -> f32 {
    let vec_min = self.vec.reduce_min();
    if vec_min < self.scalar {
      vec_min
    } else {
      self.scalar
    }
  }
}
