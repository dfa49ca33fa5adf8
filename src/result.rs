//! Result container for gamma-index calculations.

use std::ops::Deref;

use crate::image::DoseImage;

/// A dose image holding gamma-index values.
///
/// Cells are either a non-negative gamma value or NaN for "not computed"
/// (dose cutoff, local normalization by zero, or no in-range candidate).
/// Derefs to [`DoseImage`], so all container methods apply.
#[derive(Clone, Debug, PartialEq)]
pub struct GammaResult {
  image: DoseImage,
}

impl GammaResult {
  pub fn new(image: DoseImage) -> Self {
    Self { image }
  }

  /// The fraction of non-NaN cells with gamma <= 1.
  ///
  /// NaN when the image has no non-NaN cell.
  pub fn passing_rate(&self) -> f32 {
    let passing = self
      .image
      .data()
      .iter()
      .filter(|v| !v.is_nan() && **v <= 1.0)
      .count();
    passing as f32 / self.image.nansize() as f32
  }

  /// Minimum gamma value, ignoring NaNs.
  pub fn min_gamma(&self) -> f32 {
    self.image.nanmin()
  }

  /// Maximum gamma value, ignoring NaNs.
  pub fn max_gamma(&self) -> f32 {
    self.image.nanmax()
  }

  /// Sum of gamma values, ignoring NaNs.
  pub fn sum_gamma(&self) -> f32 {
    self.image.nansum()
  }

  /// Mean gamma value, ignoring NaNs.
  pub fn mean_gamma(&self) -> f32 {
    self.image.nanmean()
  }

  /// Variance of gamma values, ignoring NaNs.
  pub fn var_gamma(&self) -> f32 {
    self.image.nanvar()
  }

  /// The underlying image.
  pub fn image(&self) -> &DoseImage {
    &self.image
  }

  pub fn into_image(self) -> DoseImage {
    self.image
  }
}

impl Deref for GammaResult {
  type Target = DoseImage;

  fn deref(&self) -> &Self::Target {
    &self.image
  }
}

#[cfg(test)]
#[path = "result_test.rs"]
mod result_test;
