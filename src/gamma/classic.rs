//! Classic gamma kernels: exhaustive scan of the evaluated image.
//!
//! Each kernel covers the flat reference-index range it is handed, resuming
//! the (frame, row, column) walk from the range start. Cells the dispatcher
//! prefilled with NaN (dose cutoff, local normalization by zero) are left
//! untouched; +Inf marks cells to compute. The column loop runs through the
//! SIMD lane driver.

use crate::gamma::common::{dist_sq_1d, index_to_2d, index_to_3d, GammaCoeffs};
use crate::gamma::simd::LaneMin;
use crate::image::DoseImage;

/// 2D Classic kernel over `[start, start + out.len())`.
#[allow(clippy::too_many_arguments)]
pub(super) fn kernel_2d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  coeffs: &GammaCoeffs,
  yr: &[f32],
  xr: &[f32],
  ye: &[f32],
  xe: &[f32],
  start: usize,
  out: &mut [f32],
) {
  let ref_size = ref_img.size();
  let eval_columns = eval_img.size().columns as usize;
  let eval_data = eval_img.data();
  let end = start + out.len();

  let (j_start, i_start) = index_to_2d(start, ref_size);

  let mut ind = start;
  let mut jr = j_start;
  while jr < ref_size.rows && ind < end {
    let i_first = if jr != j_start { 0 } else { i_start };

    let mut ir = i_first;
    while ir < ref_size.columns && ind < end {
      if out[ind - start] == f32::INFINITY {
        let dose_ref = ref_img.get_index(ind);
        let dd_norm_inv_sq = coeffs.dd_norm_inv_sq(dose_ref);

        let mut min = LaneMin::new();
        if eval_columns != 0 {
          for (je, row) in eval_data.chunks_exact(eval_columns).enumerate() {
            let y_dist_sq = dist_sq_1d(ye[je], yr[jr as usize]);
            min.accumulate_row(
              row,
              xe,
              dose_ref,
              xr[ir as usize],
              y_dist_sq,
              0.0,
              dd_norm_inv_sq,
              coeffs.dta_inv_sq,
            );
          }
        }

        out[ind - start] = min.finish().sqrt();
      }

      ind += 1;
      ir += 1;
    }
    jr += 1;
  }
}

/// 2.5D Classic kernel: the evaluated scan is restricted to the frame at the
/// same frame index as the reference voxel.
#[allow(clippy::too_many_arguments)]
pub(super) fn kernel_2_5d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  coeffs: &GammaCoeffs,
  zr: &[f32],
  yr: &[f32],
  xr: &[f32],
  ze: &[f32],
  ye: &[f32],
  xe: &[f32],
  start: usize,
  out: &mut [f32],
) {
  let ref_size = ref_img.size();
  let eval_size = eval_img.size();
  let eval_columns = eval_size.columns as usize;
  let eval_frame_len = eval_size.rows as usize * eval_columns;
  let eval_data = eval_img.data();
  let end = start + out.len();

  let (k_start, j_start, i_start) = index_to_3d(start, ref_size);

  let mut ind = start;
  let mut kr = k_start;
  while kr < ref_size.frames && ind < end {
    let z_dist_sq = dist_sq_1d(ze[kr as usize], zr[kr as usize]);
    let eval_frame = &eval_data[kr as usize * eval_frame_len..(kr as usize + 1) * eval_frame_len];

    let j_first = if kr != k_start { 0 } else { j_start };
    let mut jr = j_first;
    while jr < ref_size.rows && ind < end {
      let i_first = if kr != k_start || jr != j_start { 0 } else { i_start };

      let mut ir = i_first;
      while ir < ref_size.columns && ind < end {
        if out[ind - start] == f32::INFINITY {
          let dose_ref = ref_img.get_index(ind);
          let dd_norm_inv_sq = coeffs.dd_norm_inv_sq(dose_ref);

          let mut min = LaneMin::new();
          if eval_columns != 0 {
            for (je, row) in eval_frame.chunks_exact(eval_columns).enumerate() {
              let y_dist_sq = dist_sq_1d(ye[je], yr[jr as usize]);
              min.accumulate_row(
                row,
                xe,
                dose_ref,
                xr[ir as usize],
                y_dist_sq,
                z_dist_sq,
                dd_norm_inv_sq,
                coeffs.dta_inv_sq,
              );
            }
          }

          out[ind - start] = min.finish().sqrt();
        }

        ind += 1;
        ir += 1;
      }
      jr += 1;
    }
    kr += 1;
  }
}

/// 3D Classic kernel: the evaluated scan covers every frame.
#[allow(clippy::too_many_arguments)]
pub(super) fn kernel_3d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  coeffs: &GammaCoeffs,
  zr: &[f32],
  yr: &[f32],
  xr: &[f32],
  ze: &[f32],
  ye: &[f32],
  xe: &[f32],
  start: usize,
  out: &mut [f32],
) {
  let ref_size = ref_img.size();
  let eval_size = eval_img.size();
  let eval_columns = eval_size.columns as usize;
  let eval_frame_len = eval_size.rows as usize * eval_columns;
  let eval_data = eval_img.data();
  let end = start + out.len();

  let (k_start, j_start, i_start) = index_to_3d(start, ref_size);

  let mut ind = start;
  let mut kr = k_start;
  while kr < ref_size.frames && ind < end {
    let j_first = if kr != k_start { 0 } else { j_start };

    let mut jr = j_first;
    while jr < ref_size.rows && ind < end {
      let i_first = if kr != k_start || jr != j_start { 0 } else { i_start };

      let mut ir = i_first;
      while ir < ref_size.columns && ind < end {
        if out[ind - start] == f32::INFINITY {
          let dose_ref = ref_img.get_index(ind);
          let dd_norm_inv_sq = coeffs.dd_norm_inv_sq(dose_ref);

          let mut min = LaneMin::new();
          if eval_frame_len != 0 {
            for (ke, frame) in eval_data.chunks_exact(eval_frame_len).enumerate() {
              let z_dist_sq = dist_sq_1d(ze[ke], zr[kr as usize]);
              for (je, row) in frame.chunks_exact(eval_columns).enumerate() {
                let y_dist_sq = dist_sq_1d(ye[je], yr[jr as usize]);
                min.accumulate_row(
                  row,
                  xe,
                  dose_ref,
                  xr[ir as usize],
                  y_dist_sq,
                  z_dist_sq,
                  dd_norm_inv_sq,
                  coeffs.dta_inv_sq,
                );
              }
            }
          }

          out[ind - start] = min.finish().sqrt();
        }

        ind += 1;
        ir += 1;
      }
      jr += 1;
    }
    kr += 1;
  }
}
