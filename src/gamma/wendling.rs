//! Wendling gamma kernels: distance-sorted search with on-the-fly
//! interpolation of the evaluated image.
//!
//! The sorted-offset walk terminates as soon as the normalized squared
//! distance alone reaches the current best gamma²; offsets that land outside
//! the evaluated domain are skipped without contributing. A voxel with no
//! in-range sample at all becomes NaN.
//!
//! These kernels run behind the task-queue dispatcher, so unlike the Classic
//! kernels they see a zero-initialized output and do the cutoff bookkeeping
//! per voxel themselves.

use crate::gamma::common::{dist_sq_1d, index_to_2d, index_to_3d, GammaCoeffs};
use crate::image::DoseImage;
use crate::interpolation::{BilinearSampler, TrilinearSampler};
use crate::search::{BallPoint, DiscPoint};

/// 2D Wendling kernel over `[start, start + out.len())`.
pub(super) fn kernel_2d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  coeffs: &GammaCoeffs,
  points: &[DiscPoint],
  start: usize,
  out: &mut [f32],
) {
  let sampler = BilinearSampler::new(eval_img);
  let ref_size = ref_img.size();
  let offset = ref_img.offset();
  let spacing = ref_img.spacing();
  let end = start + out.len();

  let (j_start, i_start) = index_to_2d(start, ref_size);

  let mut ind = start;
  let mut jr = j_start;
  let mut yr = offset.rows + j_start as f32 * spacing.rows;
  while jr < ref_size.rows && ind < end {
    let i_first = if jr != j_start { 0 } else { i_start };

    let mut ir = i_first;
    let mut xr = offset.columns + i_first as f32 * spacing.columns;
    while ir < ref_size.columns && ind < end {
      let dose_ref = ref_img.get_index(ind);

      if coeffs.skips(dose_ref) {
        out[ind - start] = f32::NAN;
      } else {
        let dd_norm_inv_sq = coeffs.dd_norm_inv_sq(dose_ref);

        let mut min_gamma_sq = f32::INFINITY;
        let mut any_in_range = false;
        for point in points {
          let normalized_dist_sq = point.dist_sq * coeffs.dta_inv_sq;
          if normalized_dist_sq >= min_gamma_sq {
            break;
          }

          if let Some(dose_eval) = sampler.sample(0, yr + point.dy, xr + point.dx) {
            any_in_range = true;
            let gamma_sq = dist_sq_1d(dose_eval, dose_ref) * dd_norm_inv_sq + normalized_dist_sq;
            if gamma_sq < min_gamma_sq {
              min_gamma_sq = gamma_sq;
            }
          }
        }

        out[ind - start] = if any_in_range {
          min_gamma_sq.sqrt()
        } else {
          f32::NAN
        };
      }

      ind += 1;
      ir += 1;
      xr += spacing.columns;
    }
    jr += 1;
    yr += spacing.rows;
  }
}

/// 2.5D Wendling kernel.
///
/// `eval_img` is the evaluated image already interpolated onto the reference
/// Z grid; `frame_shift` maps a reference frame to its interpolated frame.
/// Reference frames whose match falls outside that image are NaN.
#[allow(clippy::too_many_arguments)]
pub(super) fn kernel_2_5d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  coeffs: &GammaCoeffs,
  points: &[DiscPoint],
  frame_shift: i32,
  start: usize,
  out: &mut [f32],
) {
  let sampler = BilinearSampler::new(eval_img);
  let ref_size = ref_img.size();
  let eval_frames = eval_img.size().frames as i32;
  let offset = ref_img.offset();
  let spacing = ref_img.spacing();
  let end = start + out.len();

  let (k_start, j_start, i_start) = index_to_3d(start, ref_size);

  let mut ind = start;
  let mut kr = k_start;
  let mut ke = k_start as i32 + frame_shift;
  while kr < ref_size.frames && ind < end {
    let frame_outside = ke < 0 || ke >= eval_frames;

    let j_first = if kr != k_start { 0 } else { j_start };
    let mut jr = j_first;
    let mut yr = offset.rows + j_first as f32 * spacing.rows;
    while jr < ref_size.rows && ind < end {
      let i_first = if kr != k_start || jr != j_start { 0 } else { i_start };

      let mut ir = i_first;
      let mut xr = offset.columns + i_first as f32 * spacing.columns;
      while ir < ref_size.columns && ind < end {
        let dose_ref = ref_img.get_index(ind);

        if frame_outside || coeffs.skips(dose_ref) {
          out[ind - start] = f32::NAN;
        } else {
          let dd_norm_inv_sq = coeffs.dd_norm_inv_sq(dose_ref);

          let mut min_gamma_sq = f32::INFINITY;
          let mut any_in_range = false;
          for point in points {
            let normalized_dist_sq = point.dist_sq * coeffs.dta_inv_sq;
            if normalized_dist_sq >= min_gamma_sq {
              break;
            }

            if let Some(dose_eval) = sampler.sample(ke as u32, yr + point.dy, xr + point.dx) {
              any_in_range = true;
              let gamma_sq = dist_sq_1d(dose_eval, dose_ref) * dd_norm_inv_sq + normalized_dist_sq;
              if gamma_sq < min_gamma_sq {
                min_gamma_sq = gamma_sq;
              }
            }
          }

          out[ind - start] = if any_in_range {
            min_gamma_sq.sqrt()
          } else {
            f32::NAN
          };
        }

        ind += 1;
        ir += 1;
        xr += spacing.columns;
      }
      jr += 1;
      yr += spacing.rows;
    }
    kr += 1;
    ke += 1;
  }
}

/// 3D Wendling kernel with trilinear sampling of the evaluated image.
pub(super) fn kernel_3d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  coeffs: &GammaCoeffs,
  points: &[BallPoint],
  start: usize,
  out: &mut [f32],
) {
  let sampler = TrilinearSampler::new(eval_img);
  let ref_size = ref_img.size();
  let offset = ref_img.offset();
  let spacing = ref_img.spacing();
  let end = start + out.len();

  let (k_start, j_start, i_start) = index_to_3d(start, ref_size);

  let mut ind = start;
  let mut kr = k_start;
  let mut zr = offset.frames + k_start as f32 * spacing.frames;
  while kr < ref_size.frames && ind < end {
    let j_first = if kr != k_start { 0 } else { j_start };
    let mut jr = j_first;
    let mut yr = offset.rows + j_first as f32 * spacing.rows;
    while jr < ref_size.rows && ind < end {
      let i_first = if kr != k_start || jr != j_start { 0 } else { i_start };

      let mut ir = i_first;
      let mut xr = offset.columns + i_first as f32 * spacing.columns;
      while ir < ref_size.columns && ind < end {
        let dose_ref = ref_img.get_index(ind);

        if coeffs.skips(dose_ref) {
          out[ind - start] = f32::NAN;
        } else {
          let dd_norm_inv_sq = coeffs.dd_norm_inv_sq(dose_ref);

          let mut min_gamma_sq = f32::INFINITY;
          let mut any_in_range = false;
          for point in points {
            let normalized_dist_sq = point.dist_sq * coeffs.dta_inv_sq;
            if normalized_dist_sq >= min_gamma_sq {
              break;
            }

            if let Some(dose_eval) =
              sampler.sample(zr + point.dz, yr + point.dy, xr + point.dx)
            {
              any_in_range = true;
              let gamma_sq = dist_sq_1d(dose_eval, dose_ref) * dd_norm_inv_sq + normalized_dist_sq;
              if gamma_sq < min_gamma_sq {
                min_gamma_sq = gamma_sq;
              }
            }
          }

          out[ind - start] = if any_in_range {
            min_gamma_sq.sqrt()
          } else {
            f32::NAN
          };
        }

        ind += 1;
        ir += 1;
        xr += spacing.columns;
      }
      jr += 1;
      yr += spacing.rows;
    }
    kr += 1;
    zr += spacing.frames;
  }
}
