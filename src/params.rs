//! Gamma-index parameters and their validation.
//!
//! Validation runs once at the API boundary; the kernels assume validated
//! inputs and never fail afterwards.

use crate::error::GammaError;

/// How the absolute dose-difference criterion is normalized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GammaNormalization {
  /// Divide by a single user-supplied dose (typically the reference maximum).
  Global,
  /// Divide by the dose at the current reference voxel.
  Local,
}

/// Which gamma-index algorithm to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GammaMethod {
  /// Exhaustive comparison against every evaluated voxel.
  Classic,
  /// Distance-sorted search with on-the-fly interpolation (Wendling et al.,
  /// 2007). Faster, and the recommended default.
  Wendling,
}

/// Parameters of a gamma-index calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GammaParameters {
  /// Acceptance criterion for dose difference (DD), in percent.
  pub dd_threshold: f32,
  /// Acceptance criterion for distance to agreement (DTA), in millimetres.
  pub dta_threshold: f32,
  /// Type of dose-difference normalization.
  pub normalization: GammaNormalization,
  /// Dose used for global normalization. Ignored for local normalization.
  pub global_norm_dose: f32,
  /// Reference doses below this value are not evaluated (NaN in the result).
  pub dose_cutoff: f32,
  /// Radius of the Wendling search, in millimetres. Ignored by Classic.
  pub max_search_distance: f32,
  /// Lattice pitch of the Wendling search, in millimetres. Ignored by
  /// Classic.
  pub step_size: f32,
}

impl GammaParameters {
  /// Check the parameters shared by every method.
  pub fn validate(&self) -> Result<(), GammaError> {
    if self.dd_threshold <= 0.0 {
      return Err(GammaError::InvalidParameter(
        "DD threshold is not positive".into(),
      ));
    }
    if self.dta_threshold <= 0.0 {
      return Err(GammaError::InvalidParameter(
        "DTA threshold is not positive".into(),
      ));
    }
    if self.normalization == GammaNormalization::Global && self.global_norm_dose <= 0.0 {
      return Err(GammaError::InvalidParameter(
        "global normalization dose is not positive".into(),
      ));
    }
    Ok(())
  }

  /// Check the additional parameters of the Wendling method.
  pub fn validate_wendling(&self) -> Result<(), GammaError> {
    if self.max_search_distance <= 0.0 {
      return Err(GammaError::InvalidParameter(
        "maximum search distance is not positive".into(),
      ));
    }
    if self.step_size <= 0.0 {
      return Err(GammaError::InvalidParameter(
        "step size is not positive".into(),
      ));
    }
    if self.step_size > self.max_search_distance {
      return Err(GammaError::InvalidParameter(
        "step size is greater than maximum search distance".into(),
      ));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params() -> GammaParameters {
    GammaParameters {
      dd_threshold: 3.0,
      dta_threshold: 3.0,
      normalization: GammaNormalization::Global,
      global_norm_dose: 1.0,
      dose_cutoff: 0.0,
      max_search_distance: 10.0,
      step_size: 0.3,
    }
  }

  #[test]
  fn test_valid_parameters_pass() {
    assert!(params().validate().is_ok());
    assert!(params().validate_wendling().is_ok());
  }

  #[test]
  fn test_non_positive_thresholds_fail() {
    let mut p = params();
    p.dd_threshold = 0.0;
    assert!(p.validate().is_err());

    let mut p = params();
    p.dta_threshold = -1.0;
    assert!(p.validate().is_err());
  }

  #[test]
  fn test_global_norm_dose_checked_only_for_global() {
    let mut p = params();
    p.global_norm_dose = -1.0;
    assert!(p.validate().is_err());

    p.normalization = GammaNormalization::Local;
    assert!(p.validate().is_ok());
  }

  #[test]
  fn test_wendling_parameters() {
    let mut p = params();
    p.max_search_distance = 0.0;
    assert!(p.validate_wendling().is_err());

    let mut p = params();
    p.step_size = 0.0;
    assert!(p.validate_wendling().is_err());

    let mut p = params();
    p.step_size = 12.0;
    p.max_search_distance = 10.0;
    assert!(p.validate_wendling().is_err());
  }
}
