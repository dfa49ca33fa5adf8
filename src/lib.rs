#![feature(portable_simd)]

//! dose_gamma - gamma-index comparison of dose distributions
//!
//! This crate computes the gamma index, the voxel-wise quality metric used
//! in medical physics to compare a *reference* and an *evaluated* dose
//! distribution over 1D, 2D or 3D grids. For each reference voxel, the
//! metric is the minimum over candidate evaluated locations of a quadratic
//! combination of normalized dose difference and normalized spatial
//! distance; gamma <= 1 means the voxel passes.
//!
//! # Features
//!
//! - **Classic method**: exhaustive scan of the evaluated image, with the
//!   inner column loop vectorized on portable SIMD
//! - **Wendling method**: distance-sorted search with early termination and
//!   on-the-fly bilinear/trilinear interpolation of the evaluated image
//! - **2D / 2.5D / 3D** variants of both methods, multithreaded over rayon
//!   workers with load balancing matched to each method's cost profile
//! - **MetaImage I/O**: MHA/MHD reading and writing for dose grids
//!
//! # Example
//!
//! ```ignore
//! use dose_gamma::{
//!     gamma_index_2d, DoseImage, GammaMethod, GammaNormalization, GammaParameters,
//!     GridOffset, GridSpacing,
//! };
//!
//! let reference = DoseImage::from_2d(
//!     vec![vec![0.93, 0.95], vec![0.97, 1.00]],
//!     GridOffset::new(0.0, 0.0, -1.0),
//!     GridSpacing::new(1.0, 1.0, 1.0),
//! )?;
//! let evaluated = DoseImage::from_2d(
//!     vec![vec![0.95, 0.97], vec![1.00, 1.03]],
//!     GridOffset::new(0.0, -1.0, 0.0),
//!     GridSpacing::new(1.0, 1.0, 1.0),
//! )?;
//!
//! let params = GammaParameters {
//!     dd_threshold: 3.0,
//!     dta_threshold: 3.0,
//!     normalization: GammaNormalization::Global,
//!     global_norm_dose: reference.max(),
//!     dose_cutoff: 0.0,
//!     max_search_distance: 10.0,
//!     step_size: 0.3,
//! };
//!
//! let result = gamma_index_2d(&reference, &evaluated, &params, GammaMethod::Wendling)?;
//! println!("passing rate: {}", result.passing_rate());
//! ```

pub mod error;
pub mod image;
pub mod interpolation;
pub mod params;
pub mod result;
pub mod search;
pub mod types;

// Gamma kernels and dispatchers
pub mod gamma;

// File-format collaborators
pub mod io;

// Re-export commonly used items
pub use error::GammaError;
pub use gamma::{
  gamma_index_2_5d, gamma_index_2_5d_classic, gamma_index_2_5d_wendling, gamma_index_2d,
  gamma_index_2d_classic, gamma_index_2d_wendling, gamma_index_3d, gamma_index_3d_classic,
  gamma_index_3d_wendling,
};
pub use image::DoseImage;
pub use params::{GammaMethod, GammaNormalization, GammaParameters};
pub use result::GammaResult;
pub use types::{GridOffset, GridSize, GridSpacing, ImageAxis, ImagePlane};

/// Absolute tolerance for floating-point comparisons on physical
/// coordinates, in millimetres.
pub(crate) const TOLERANCE: f32 = 1e-6;
