//! Gamma-index computation: 2D, 2.5D and 3D, Classic and Wendling.
//!
//! The Classic method compares each reference voxel against every evaluated
//! voxel; the Wendling method walks a distance-sorted offset table with
//! early termination and samples the evaluated image by interpolation. Both
//! run multithreaded over rayon workers, with a work-splitting strategy
//! matched to each method's cost profile.
//!
//! All entry points validate their inputs up front and return a typed error
//! before any allocation; the result mirrors the reference image's grid.

mod classic;
mod common;
mod dispatch;
mod simd;
mod wendling;

use tracing::debug;

use crate::error::GammaError;
use crate::image::DoseImage;
use crate::interpolation;
use crate::params::{GammaMethod, GammaParameters};
use crate::result::GammaResult;
use crate::search;
use crate::types::ImageAxis;
use common::{generate_coordinates, GammaCoeffs};
use simd::padded_coordinates;

fn validate_images_2d(ref_img: &DoseImage, eval_img: &DoseImage) -> Result<(), GammaError> {
  if ref_img.size().frames > 1 {
    return Err(GammaError::DimensionMismatch(format!(
      "reference image is not 2D (frames={})",
      ref_img.size().frames
    )));
  }
  if eval_img.size().frames > 1 {
    return Err(GammaError::DimensionMismatch(format!(
      "evaluated image is not 2D (frames={})",
      eval_img.size().frames
    )));
  }
  Ok(())
}

fn wrap_result(gamma_vals: Vec<f32>, ref_img: &DoseImage) -> Result<GammaResult, GammaError> {
  let image = DoseImage::new(
    gamma_vals,
    ref_img.size(),
    ref_img.offset(),
    ref_img.spacing(),
  )?;
  Ok(GammaResult::new(image))
}

fn padded_x_coordinates(img: &DoseImage) -> Vec<f32> {
  padded_coordinates(
    img.offset().columns,
    img.spacing().columns,
    img.size().columns as usize,
  )
}

/// 2D gamma index of two single-frame images.
///
/// Only Y and X coordinates enter the distance term; differing Z offsets
/// have no effect.
pub fn gamma_index_2d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
  method: GammaMethod,
) -> Result<GammaResult, GammaError> {
  match method {
    GammaMethod::Classic => gamma_index_2d_classic(ref_img, eval_img, params),
    GammaMethod::Wendling => gamma_index_2d_wendling(ref_img, eval_img, params),
  }
}

/// 2.5D gamma index: frame-by-frame along the axial plane.
pub fn gamma_index_2_5d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
  method: GammaMethod,
) -> Result<GammaResult, GammaError> {
  match method {
    GammaMethod::Classic => gamma_index_2_5d_classic(ref_img, eval_img, params),
    GammaMethod::Wendling => gamma_index_2_5d_wendling(ref_img, eval_img, params),
  }
}

/// 3D gamma index over full volumes.
pub fn gamma_index_3d(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
  method: GammaMethod,
) -> Result<GammaResult, GammaError> {
  match method {
    GammaMethod::Classic => gamma_index_3d_classic(ref_img, eval_img, params),
    GammaMethod::Wendling => gamma_index_3d_wendling(ref_img, eval_img, params),
  }
}

/// 2D gamma index, Classic method.
pub fn gamma_index_2d_classic(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
  validate_images_2d(ref_img, eval_img)?;
  params.validate()?;

  let coeffs = GammaCoeffs::new(params);
  let yr = generate_coordinates(ref_img, ImageAxis::Y);
  let xr = generate_coordinates(ref_img, ImageAxis::X);
  let ye = generate_coordinates(eval_img, ImageAxis::Y);
  let xe = padded_x_coordinates(eval_img);

  let gamma_vals = dispatch::run_partitioned(ref_img, &coeffs, |start, out| {
    classic::kernel_2d(ref_img, eval_img, &coeffs, &yr, &xr, &ye, &xe, start, out);
  });

  wrap_result(gamma_vals, ref_img)
}

/// 2.5D gamma index, Classic method.
///
/// Reference and evaluated images must have the same number of frames; each
/// reference frame is compared against the evaluated frame at the same
/// index, with the Z distance between the paired frames in the DTA term.
pub fn gamma_index_2_5d_classic(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
  if ref_img.size().frames != eval_img.size().frames {
    return Err(GammaError::DimensionMismatch(format!(
      "reference and evaluated images don't have the same number of frames ({} vs {})",
      ref_img.size().frames,
      eval_img.size().frames
    )));
  }
  params.validate()?;

  let coeffs = GammaCoeffs::new(params);
  let zr = generate_coordinates(ref_img, ImageAxis::Z);
  let yr = generate_coordinates(ref_img, ImageAxis::Y);
  let xr = generate_coordinates(ref_img, ImageAxis::X);
  let ze = generate_coordinates(eval_img, ImageAxis::Z);
  let ye = generate_coordinates(eval_img, ImageAxis::Y);
  let xe = padded_x_coordinates(eval_img);

  let gamma_vals = dispatch::run_partitioned(ref_img, &coeffs, |start, out| {
    classic::kernel_2_5d(
      ref_img, eval_img, &coeffs, &zr, &yr, &xr, &ze, &ye, &xe, start, out,
    );
  });

  wrap_result(gamma_vals, ref_img)
}

/// 3D gamma index, Classic method.
pub fn gamma_index_3d_classic(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
  params.validate()?;

  let coeffs = GammaCoeffs::new(params);
  let zr = generate_coordinates(ref_img, ImageAxis::Z);
  let yr = generate_coordinates(ref_img, ImageAxis::Y);
  let xr = generate_coordinates(ref_img, ImageAxis::X);
  let ze = generate_coordinates(eval_img, ImageAxis::Z);
  let ye = generate_coordinates(eval_img, ImageAxis::Y);
  let xe = padded_x_coordinates(eval_img);

  let gamma_vals = dispatch::run_partitioned(ref_img, &coeffs, |start, out| {
    classic::kernel_3d(
      ref_img, eval_img, &coeffs, &zr, &yr, &xr, &ze, &ye, &xe, start, out,
    );
  });

  wrap_result(gamma_vals, ref_img)
}

/// 2D gamma index, Wendling method.
pub fn gamma_index_2d_wendling(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
  validate_images_2d(ref_img, eval_img)?;
  params.validate()?;
  params.validate_wendling()?;

  let coeffs = GammaCoeffs::new(params);
  let points = search::sorted_points_in_disc(params.max_search_distance, params.step_size);
  debug!(points = points.len(), "built disc search table");

  let gamma_vals = dispatch::run_task_queue(ref_img.len(), |start, out| {
    wendling::kernel_2d(ref_img, eval_img, &coeffs, &points, start, out);
  });

  wrap_result(gamma_vals, ref_img)
}

/// 2.5D gamma index, Wendling method.
///
/// The evaluated image is first interpolated along Z onto the reference
/// frame grid; reference frames whose interpolated counterpart falls outside
/// the evaluated Z domain come back as NaN.
pub fn gamma_index_2_5d_wendling(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
  params.validate()?;
  params.validate_wendling()?;

  let eval_interp = interpolation::linear_on_reference_grid(eval_img, ref_img, ImageAxis::Z);
  let frame_shift =
    ((ref_img.offset().frames - eval_interp.offset().frames) / ref_img.spacing().frames) as i32;

  let coeffs = GammaCoeffs::new(params);
  let points = search::sorted_points_in_disc(params.max_search_distance, params.step_size);
  debug!(
    points = points.len(),
    frame_shift, "built disc search table"
  );

  let gamma_vals = dispatch::run_task_queue(ref_img.len(), |start, out| {
    wendling::kernel_2_5d(
      ref_img,
      &eval_interp,
      &coeffs,
      &points,
      frame_shift,
      start,
      out,
    );
  });

  wrap_result(gamma_vals, ref_img)
}

/// 3D gamma index, Wendling method.
pub fn gamma_index_3d_wendling(
  ref_img: &DoseImage,
  eval_img: &DoseImage,
  params: &GammaParameters,
) -> Result<GammaResult, GammaError> {
  params.validate()?;
  params.validate_wendling()?;

  let coeffs = GammaCoeffs::new(params);
  let points = search::sorted_points_in_ball(params.max_search_distance, params.step_size);
  debug!(points = points.len(), "built ball search table");

  let gamma_vals = dispatch::run_task_queue(ref_img.len(), |start, out| {
    wendling::kernel_3d(ref_img, eval_img, &coeffs, &points, start, out);
  });

  wrap_result(gamma_vals, ref_img)
}
