//! MetaImage (MHA/MHD) reading and writing.
//!
//! The reader accepts the plain ASCII header followed by raw pixel data,
//! either inline (`ElementDataFile = LOCAL`, the single-file MHA form) or in
//! a detached raw file (the MHD form). Binary data may be little or big
//! endian; ASCII element data is also accepted. All element types are cast
//! to f32 on load. Optional header keys fall back to the MetaImage defaults
//! (zero offset, unit spacing, ASCII data, little endian).
//!
//! The writer emits a canonical single-file MHA: binary, little endian,
//! MET_FLOAT.
//!
//! MetaImage headers order per-axis values X Y Z; the in-memory model is
//! (frames, rows, columns) = (Z, Y, X), so every triple is reversed at the
//! boundary.

use std::fs;
use std::io::Write;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use tracing::debug;

use crate::error::GammaError;
use crate::image::DoseImage;
use crate::types::{GridOffset, GridSize, GridSpacing};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ElementType {
  UChar,
  Char,
  Short,
  UShort,
  Int,
  UInt,
  Float,
  Double,
}

impl ElementType {
  fn parse(name: &str) -> Result<Self, GammaError> {
    match name {
      "MET_UCHAR" => Ok(Self::UChar),
      "MET_CHAR" => Ok(Self::Char),
      "MET_SHORT" => Ok(Self::Short),
      "MET_USHORT" => Ok(Self::UShort),
      "MET_INT" => Ok(Self::Int),
      "MET_UINT" => Ok(Self::UInt),
      "MET_FLOAT" => Ok(Self::Float),
      "MET_DOUBLE" => Ok(Self::Double),
      other => Err(GammaError::UnexpectedFormat(format!(
        "unsupported element type {other}"
      ))),
    }
  }

  fn byte_size(&self) -> usize {
    match self {
      Self::UChar | Self::Char => 1,
      Self::Short | Self::UShort => 2,
      Self::Int | Self::UInt | Self::Float => 4,
      Self::Double => 8,
    }
  }
}

/// Parsed header state, with the MetaImage defaults filled in.
struct Header {
  ndims: usize,
  dim_size: Vec<usize>,
  offset: Vec<f32>,
  spacing: Vec<f32>,
  element_type: ElementType,
  binary: bool,
  big_endian: bool,
  data_file: String,
}

fn parse_bool(value: &str, key: &str) -> Result<bool, GammaError> {
  match value {
    "True" | "true" | "1" => Ok(true),
    "False" | "false" | "0" => Ok(false),
    other => Err(GammaError::UnexpectedFormat(format!(
      "{key} has non-boolean value {other}"
    ))),
  }
}

fn parse_numbers<T: std::str::FromStr>(value: &str, key: &str) -> Result<Vec<T>, GammaError> {
  value
    .split_whitespace()
    .map(|token| {
      token.parse::<T>().map_err(|_| {
        GammaError::UnexpectedFormat(format!("{key} has non-numeric value {token}"))
      })
    })
    .collect()
}

/// Parse the ASCII header, returning it and the byte offset of the pixel
/// data (the position right after the `ElementDataFile` line).
fn parse_header(bytes: &[u8]) -> Result<(Header, usize), GammaError> {
  let mut ndims: Option<usize> = None;
  let mut dim_size: Option<Vec<usize>> = None;
  let mut offset: Option<Vec<f32>> = None;
  let mut spacing: Option<Vec<f32>> = None;
  let mut element_type: Option<ElementType> = None;
  let mut binary = false;
  let mut big_endian = false;
  let mut data_file: Option<String> = None;

  let mut pos = 0usize;
  while pos < bytes.len() {
    let line_end = bytes[pos..]
      .iter()
      .position(|b| *b == b'\n')
      .map_or(bytes.len(), |n| pos + n);
    let line = std::str::from_utf8(&bytes[pos..line_end])
      .map_err(|_| GammaError::UnexpectedFormat("header is not valid ASCII".into()))?
      .trim_end_matches('\r');
    pos = line_end + 1;

    if line.trim().is_empty() {
      continue;
    }
    let Some((key, value)) = line.split_once('=') else {
      return Err(GammaError::UnexpectedFormat(format!(
        "header line without '=': {line}"
      )));
    };
    let key = key.trim();
    let value = value.trim();

    match key {
      "ObjectType" => {
        if value != "Image" {
          return Err(GammaError::UnexpectedFormat(format!(
            "object type is {value}, not Image"
          )));
        }
      }
      "NDims" => {
        let n: usize = value
          .parse()
          .map_err(|_| GammaError::UnexpectedFormat("NDims is not an integer".into()))?;
        if n != 2 && n != 3 {
          return Err(GammaError::UnexpectedFormat(format!(
            "NDims is {n}, only 2 and 3 are supported"
          )));
        }
        ndims = Some(n);
      }
      "DimSize" => dim_size = Some(parse_numbers(value, key)?),
      "Offset" | "Origin" | "Position" => offset = Some(parse_numbers(value, key)?),
      "ElementSpacing" => spacing = Some(parse_numbers(value, key)?),
      "ElementType" => element_type = Some(ElementType::parse(value)?),
      "BinaryData" => binary = parse_bool(value, key)?,
      "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
        big_endian = parse_bool(value, key)?;
      }
      "CompressedData" => {
        if parse_bool(value, key)? {
          return Err(GammaError::UnexpectedFormat(
            "compressed data is not supported".into(),
          ));
        }
      }
      "ElementNumberOfChannels" => {
        if value != "1" {
          return Err(GammaError::UnexpectedFormat(
            "multi-channel images are not supported".into(),
          ));
        }
      }
      "ElementDataFile" => {
        data_file = Some(value.to_string());
        break;
      }
      // TransformMatrix, AnatomicalOrientation and other decorations are
      // accepted and ignored
      _ => {}
    }
  }

  let ndims =
    ndims.ok_or_else(|| GammaError::UnexpectedFormat("header is missing NDims".into()))?;
  let dim_size =
    dim_size.ok_or_else(|| GammaError::UnexpectedFormat("header is missing DimSize".into()))?;
  let element_type = element_type
    .ok_or_else(|| GammaError::UnexpectedFormat("header is missing ElementType".into()))?;
  let data_file = data_file
    .ok_or_else(|| GammaError::UnexpectedFormat("header is missing ElementDataFile".into()))?;

  if dim_size.len() != ndims {
    return Err(GammaError::UnexpectedFormat(format!(
      "DimSize has {} values for NDims = {ndims}",
      dim_size.len()
    )));
  }

  let offset = offset.unwrap_or_else(|| vec![0.0; ndims]);
  let spacing = spacing.unwrap_or_else(|| vec![1.0; ndims]);
  if offset.len() != ndims || spacing.len() != ndims {
    return Err(GammaError::UnexpectedFormat(
      "Offset or ElementSpacing does not match NDims".into(),
    ));
  }

  Ok((
    Header {
      ndims,
      dim_size,
      offset,
      spacing,
      element_type,
      binary,
      big_endian,
      data_file,
    },
    pos,
  ))
}

fn decode_typed<E: ByteOrder>(bytes: &[u8], ty: ElementType, count: usize) -> Vec<f32> {
  let size = ty.byte_size();
  let chunks = bytes.chunks_exact(size).take(count);
  match ty {
    ElementType::UChar => chunks.map(|c| c[0] as f32).collect(),
    ElementType::Char => chunks.map(|c| c[0] as i8 as f32).collect(),
    ElementType::Short => chunks.map(|c| E::read_i16(c) as f32).collect(),
    ElementType::UShort => chunks.map(|c| E::read_u16(c) as f32).collect(),
    ElementType::Int => chunks.map(|c| E::read_i32(c) as f32).collect(),
    ElementType::UInt => chunks.map(|c| E::read_u32(c) as f32).collect(),
    ElementType::Float => chunks.map(|c| E::read_f32(c)).collect(),
    ElementType::Double => chunks.map(|c| E::read_f64(c) as f32).collect(),
  }
}

fn decode_binary(bytes: &[u8], header: &Header, count: usize) -> Result<Vec<f32>, GammaError> {
  let needed = count * header.element_type.byte_size();
  if bytes.len() < needed {
    return Err(GammaError::UnexpectedFormat(format!(
      "pixel data is truncated: {} bytes present, {needed} needed",
      bytes.len()
    )));
  }

  let values = if header.big_endian {
    decode_typed::<BigEndian>(bytes, header.element_type, count)
  } else {
    decode_typed::<LittleEndian>(bytes, header.element_type, count)
  };
  Ok(values)
}

fn decode_ascii(bytes: &[u8], count: usize) -> Result<Vec<f32>, GammaError> {
  let text = std::str::from_utf8(bytes)
    .map_err(|_| GammaError::UnexpectedFormat("ASCII element data is not valid text".into()))?;
  let values: Vec<f32> = parse_numbers(text, "element data")?;
  if values.len() < count {
    return Err(GammaError::UnexpectedFormat(format!(
      "ASCII element data has {} values, {count} needed",
      values.len()
    )));
  }
  Ok(values[..count].to_vec())
}

/// Build the image from a parsed header and its pixel bytes.
fn assemble(header: &Header, data_bytes: &[u8]) -> Result<DoseImage, GammaError> {
  // header axis order is X Y Z; the image model is (Z, Y, X)
  let nx = header.dim_size[0];
  let ny = header.dim_size[1];
  let nz = if header.ndims == 3 { header.dim_size[2] } else { 1 };
  let count = nx * ny * nz;

  let values = if header.binary {
    decode_binary(data_bytes, header, count)?
  } else {
    decode_ascii(data_bytes, count)?
  };

  let axis = |v: &[f32], index: usize, default: f32| {
    if index < v.len() {
      v[index]
    } else {
      default
    }
  };

  DoseImage::new(
    values,
    GridSize::new(nz as u32, ny as u32, nx as u32),
    GridOffset::new(
      axis(&header.offset, 2, 0.0),
      axis(&header.offset, 1, 0.0),
      axis(&header.offset, 0, 0.0),
    ),
    GridSpacing::new(
      axis(&header.spacing, 2, 1.0),
      axis(&header.spacing, 1, 1.0),
      axis(&header.spacing, 0, 1.0),
    ),
  )
}

/// Parse a MetaImage from memory.
///
/// `base_dir` resolves a detached raw file (the MHD form); a header that
/// names one fails with `UnexpectedFormat` when no directory is given.
pub fn parse_metaimage(bytes: &[u8], base_dir: Option<&Path>) -> Result<DoseImage, GammaError> {
  let (header, data_start) = parse_header(bytes)?;

  if header.data_file == "LIST" {
    return Err(GammaError::UnexpectedFormat(
      "per-slice data file lists are not supported".into(),
    ));
  }

  if header.data_file == "LOCAL" {
    return assemble(&header, &bytes[data_start..]);
  }

  let Some(dir) = base_dir else {
    return Err(GammaError::UnexpectedFormat(format!(
      "detached data file {} cannot be resolved without a base directory",
      header.data_file
    )));
  };
  let raw = fs::read(dir.join(&header.data_file))?;
  assemble(&header, &raw)
}

/// Read a dose image from an MHA or MHD file.
pub fn read_metaimage(path: impl AsRef<Path>) -> Result<DoseImage, GammaError> {
  let path = path.as_ref();
  debug!(path = %path.display(), "reading MetaImage");
  let bytes = fs::read(path)?;
  parse_metaimage(&bytes, path.parent())
}

/// Serialize an image as a single-file MHA (binary, little endian,
/// MET_FLOAT).
pub fn metaimage_bytes(img: &DoseImage) -> Vec<u8> {
  let size = img.size();
  let offset = img.offset();
  let spacing = img.spacing();
  // a frames spacing of 0 comes from 2D slices; MetaImage wants it positive
  let frames_spacing = if spacing.frames > 0.0 { spacing.frames } else { 1.0 };

  let mut out = Vec::with_capacity(512 + img.len() * 4);
  let _ = write!(
    out,
    "ObjectType = Image\n\
     NDims = 3\n\
     BinaryData = True\n\
     BinaryDataByteOrderMSB = False\n\
     CompressedData = False\n\
     TransformMatrix = 1 0 0 0 1 0 0 0 1\n\
     Offset = {} {} {}\n\
     ElementSpacing = {} {} {}\n\
     DimSize = {} {} {}\n\
     ElementType = MET_FLOAT\n\
     ElementDataFile = LOCAL\n",
    offset.columns,
    offset.rows,
    offset.frames,
    spacing.columns,
    spacing.rows,
    frames_spacing,
    size.columns,
    size.rows,
    size.frames,
  );

  for value in img.data() {
    let _ = out.write_f32::<LittleEndian>(*value);
  }
  out
}

/// Write a dose image to a single-file MHA.
pub fn write_metaimage(path: impl AsRef<Path>, img: &DoseImage) -> Result<(), GammaError> {
  let path = path.as_ref();
  debug!(path = %path.display(), voxels = img.len(), "writing MetaImage");
  fs::write(path, metaimage_bytes(img))?;
  Ok(())
}

#[cfg(test)]
#[path = "metaimage_test.rs"]
mod metaimage_test;
