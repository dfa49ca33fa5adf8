//! File-format collaborators for dose images.
//!
//! The core never invokes these itself; callers load a [`crate::DoseImage`]
//! through a reader, run the gamma computation, and hand the result to a
//! writer. MetaImage (MHA/MHD) is implemented here. A DICOM RT-Dose reader
//! plugs in through the same contract: produce a validated `DoseImage`,
//! report malformed input as [`crate::GammaError::UnexpectedFormat`] and an
//! unobtainable Z spacing as [`crate::GammaError::MissingSpacing`].

pub mod metaimage;

pub use metaimage::{read_metaimage, write_metaimage};
