//! Error taxonomy for the crate.
//!
//! All validation happens at API boundaries and produces a typed error
//! before any result buffer is allocated. Inside the per-voxel loops,
//! pathological conditions (dose cutoff, division by zero, no in-range
//! sample) are encoded as NaN in the output, never as errors.

use std::io;

/// Errors returned by constructors, kernels and readers.
#[derive(Debug, thiserror::Error)]
pub enum GammaError {
  /// Flat data length disagrees with the declared size, or a nested-list
  /// literal is ragged.
  #[error("shape mismatch: {0}")]
  ShapeMismatch(String),

  /// An image with the wrong dimensionality was supplied to a kernel.
  #[error("dimension mismatch: {0}")]
  DimensionMismatch(String),

  /// A gamma parameter failed validation.
  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  /// An index is past the image size.
  #[error("index out of range: {0}")]
  OutOfRange(String),

  /// A file did not have the expected format.
  #[error("unexpected format: {0}")]
  UnexpectedFormat(String),

  /// No Z spacing could be retrieved from the file.
  #[error("missing spacing: {0}")]
  MissingSpacing(String),

  /// Underlying file read or write failure.
  #[error("io error")]
  Io(#[from] io::Error),
}
