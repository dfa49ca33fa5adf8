use super::*;

const TOL: f32 = 1e-5;

fn assert_values_close(actual: &DoseImage, expected: &[f32]) {
  assert_eq!(actual.len(), expected.len(), "length mismatch");
  for (index, (a, e)) in actual.data().iter().zip(expected.iter()).enumerate() {
    assert!(
      (a - e).abs() < TOL,
      "value {index}: expected {e}, got {a}"
    );
  }
}

fn line_image(values: &[f32], offset: f32, spacing: f32, axis: ImageAxis) -> DoseImage {
  let n = values.len() as u32;
  let (size, off, sp) = match axis {
    ImageAxis::Z => (
      GridSize::new(n, 1, 1),
      GridOffset::new(offset, 1.0, 1.0),
      GridSpacing::new(spacing, 2.0, 2.0),
    ),
    ImageAxis::Y => (
      GridSize::new(1, n, 1),
      GridOffset::new(1.0, offset, 1.0),
      GridSpacing::new(2.0, spacing, 2.0),
    ),
    ImageAxis::X => (
      GridSize::new(1, 1, n),
      GridOffset::new(1.0, 1.0, offset),
      GridSpacing::new(2.0, 2.0, spacing),
    ),
  };
  DoseImage::new(values.to_vec(), size, off, sp).unwrap()
}

fn cube_image() -> DoseImage {
  // 2x2x2 ramp
  DoseImage::from_3d(
    vec![
      vec![vec![1.0, 2.0], vec![4.0, 5.0]],
      vec![vec![7.0, 8.0], vec![10.0, 11.0]],
    ],
    GridOffset::new(0.0, 0.0, 0.0),
    GridSpacing::new(1.0, 1.0, 1.0),
  )
  .unwrap()
}

// =============================================================================
// Linear along axis, by spacing
// =============================================================================

#[test]
fn test_linear_by_spacing() {
  let cases: &[(&[f32], f32, &[f32], f32)] = &[
    (&[0.0, 2.0, 4.0], 2.0, &[0.0, 1.0, 2.0, 3.0, 4.0], 1.0),
    (
      &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0],
      3.0,
      &[0.0, 1.4, 2.8, 4.2, 5.6, 7.0, 8.4, 9.8, 11.2, 12.6, 14.0],
      1.4,
    ),
    (
      &[2.0, 4.0, 7.0, -5.0, 3.5],
      1.2,
      &[2.0, 3.16666666, 4.5, 6.25, 3.0, -4.0, -0.75],
      0.7,
    ),
    (&[4.0, 2.0, 6.0, 7.0], 1.0, &[4.0, 6.0], 2.0),
    (&[5.0], 2.0, &[5.0], 1.2),
  ];

  for axis in [ImageAxis::Z, ImageAxis::Y, ImageAxis::X] {
    for (original, old_spacing, interpolated, new_spacing) in cases {
      let img = line_image(original, 0.0, *old_spacing, axis);
      let result = linear_along_axis(&img, *new_spacing, axis);
      assert_values_close(&result, interpolated);
      assert_eq!(result.offset(), img.offset());
    }
  }
}

#[test]
fn test_linear_by_spacing_for_empty_image() {
  let img = DoseImage::new(
    vec![],
    GridSize::new(0, 0, 0),
    GridOffset::new(0.0, 0.0, 0.0),
    GridSpacing::new(2.0, 2.0, 2.0),
  )
  .unwrap();

  let result = linear_along_axis(&img, 1.0, ImageAxis::Y);
  assert!(result.is_empty());
  assert_eq!(result.size(), GridSize::new(0, 0, 0));
  assert_eq!(result.spacing(), GridSpacing::new(2.0, 1.0, 2.0));
}

#[test]
fn test_linear_by_spacing_for_multiframe_image() {
  let expected_z = [1.0, 2.0, 4.0, 5.0, 5.8, 6.8, 8.8, 9.8];
  let expected_y = [1.0, 2.0, 3.4, 4.4, 7.0, 8.0, 9.4, 10.4];
  let expected_x = [1.0, 1.8, 4.0, 4.8, 7.0, 7.8, 10.0, 10.8];

  let img = cube_image();
  assert_values_close(&linear_along_axis(&img, 0.8, ImageAxis::Z), &expected_z);
  assert_values_close(&linear_along_axis(&img, 0.8, ImageAxis::Y), &expected_y);
  assert_values_close(&linear_along_axis(&img, 0.8, ImageAxis::X), &expected_x);
}

// =============================================================================
// Linear along axis, on virtual grid
// =============================================================================

#[test]
fn test_linear_on_grid() {
  // original (values, offset, spacing), expected (values, offset, spacing), grid offset
  #[allow(clippy::type_complexity)]
  let cases: &[(&[f32], f32, f32, &[f32], f32, f32, f32)] = &[
    (&[0.0, 2.0, 4.0], 1.0, 2.0, &[0.2, 1.2, 2.2, 3.2], 1.2, 1.0, 1.2),
    (
      &[0.0, 3.0, 6.0, 9.0, 12.0, 15.0],
      2.0,
      3.0,
      &[1.0, 2.4, 3.8, 5.2, 6.6, 8.0, 9.4, 10.8, 12.2, 13.6, 15.0],
      3.0,
      1.4,
      3.0,
    ),
    (&[3.0, 5.0, 2.0], 1.6, 2.0, &[3.0, 5.0, 2.0], 1.6, 2.0, 1.6),
    (&[4.0, 2.0, 6.0, 7.0], 0.5, 1.0, &[3.8, 6.1], 0.6, 2.0, 0.6),
    (
      &[0.0, 1.0, 2.0, 3.0, 4.0],
      0.0,
      1.0,
      &[1.9, 3.9],
      1.9,
      2.0,
      -0.1,
    ),
    (&[3.0, 5.0], 3.0, 2.0, &[3.7, 4.8], 3.7, 1.1, 0.4),
    (&[3.0, 5.0], 3.0, 2.0, &[4.0], 4.0, 1.1, -0.4),
    (&[-3.0, -1.0], -3.0, 2.0, &[-2.9, -1.8], -2.9, 1.1, 0.4),
    (&[-3.0, -1.0], -3.0, 2.0, &[-2.6, -1.5], -2.6, 1.1, -0.4),
  ];

  for axis in [ImageAxis::Z, ImageAxis::Y, ImageAxis::X] {
    for (original, old_offset, old_spacing, interpolated, new_offset, new_spacing, grid_offset) in
      cases
    {
      let img = line_image(original, *old_offset, *old_spacing, axis);
      let result = linear_along_axis_on_grid(&img, *grid_offset, *new_spacing, axis);
      assert_values_close(&result, interpolated);

      let (result_offset, result_spacing, _) = super::axis_params(&result, axis);
      assert!((result_offset - new_offset).abs() < TOL);
      assert!((result_spacing - new_spacing).abs() < TOL);
    }
  }
}

#[test]
fn test_linear_on_grid_for_whole_axis_miss() {
  // grid pitch 5 anchored at 0 over a domain [1, 4]: no point lands inside
  let img = line_image(&[1.0, 2.0, 3.0, 4.0], 1.0, 1.0, ImageAxis::Z);
  let result = linear_along_axis_on_grid(&img, 0.0, 5.0, ImageAxis::Z);

  assert!(result.is_empty());
  assert_eq!(result.size(), GridSize::new(0, 0, 0));
  assert_eq!(result.offset().frames, 5.0);
  assert_eq!(result.spacing().frames, 5.0);
}

#[test]
fn test_linear_on_grid_for_single_point_miss() {
  // single voxel at 1.3, first grid point at 1.4 already past it
  let img = line_image(&[6.0], 1.3, 2.0, ImageAxis::X);
  let result = linear_along_axis_on_grid(&img, 1.4, 1.1, ImageAxis::X);

  assert!(result.is_empty());
  assert!((result.offset().columns - 1.4).abs() < TOL);
  assert!((result.spacing().columns - 1.1).abs() < TOL);
}

#[test]
fn test_linear_on_grid_for_empty_image() {
  let img = DoseImage::new(
    vec![],
    GridSize::new(0, 0, 0),
    GridOffset::new(1.2, 1.2, 1.2),
    GridSpacing::new(2.0, 2.0, 2.0),
  )
  .unwrap();

  let result = linear_along_axis_on_grid(&img, 1.6, 1.0, ImageAxis::Y);
  assert!(result.is_empty());
  assert_eq!(result.offset(), GridOffset::new(1.2, 1.6, 1.2));
  assert_eq!(result.spacing(), GridSpacing::new(2.0, 1.0, 2.0));
}

// =============================================================================
// Bilinear and trilinear
// =============================================================================

#[test]
fn test_bilinear_by_spacing() {
  let expected_yx = [1.0, 1.8, 3.1, 3.9, 7.0, 7.8, 9.1, 9.9];
  let expected_zx = [1.0, 1.8, 4.0, 4.8, 5.2, 6.0, 8.2, 9.0];
  let expected_zy = [1.0, 2.0, 3.4, 4.4, 5.2, 6.2, 7.6, 8.6];

  let img = cube_image();
  assert_values_close(
    &bilinear_on_plane(&img, 0.7, 0.8, ImagePlane::Axial),
    &expected_yx,
  );
  assert_values_close(
    &bilinear_on_plane(&img, 0.7, 0.8, ImagePlane::Coronal),
    &expected_zx,
  );
  assert_values_close(
    &bilinear_on_plane(&img, 0.7, 0.8, ImagePlane::Sagittal),
    &expected_zy,
  );
}

#[test]
fn test_bilinear_on_grid() {
  let mut img = cube_image();
  img.set_offset(GridOffset::new(1.0, 1.0, 1.0));

  let expected_yx = [1.7, 2.5, 3.8, 4.6, 7.7, 8.5, 9.8, 10.6];
  let expected_zx = [2.3, 3.1, 5.3, 6.1, 6.5, 7.3, 9.5, 10.3];
  let expected_zy = [2.5, 3.5, 4.9, 5.9, 6.7, 7.7, 9.1, 10.1];

  assert_values_close(
    &bilinear_on_plane_on_grid(&img, 1.2, 1.1, 0.7, 0.8, ImagePlane::Axial),
    &expected_yx,
  );
  assert_values_close(
    &bilinear_on_plane_on_grid(&img, 1.2, 1.1, 0.7, 0.8, ImagePlane::Coronal),
    &expected_zx,
  );
  assert_values_close(
    &bilinear_on_plane_on_grid(&img, 1.2, 1.1, 0.7, 0.8, ImagePlane::Sagittal),
    &expected_zy,
  );
}

#[test]
fn test_bilinear_on_reference_grid() {
  let img = DoseImage::new(
    vec![0.0, 2.0, 4.0, 6.0],
    GridSize::new(1, 2, 2),
    GridOffset::new(1.0, 1.0, 1.0),
    GridSpacing::new(2.0, 2.0, 2.0),
  )
  .unwrap();
  let reference = DoseImage::new(
    vec![20.0, 34.0, 18.0, 10.0],
    GridSize::new(1, 2, 2),
    GridOffset::new(1.5, 1.5, 1.5),
    GridSpacing::new(1.2, 1.2, 1.2),
  )
  .unwrap();

  let result = bilinear_on_reference_grid(&img, &reference, ImagePlane::Axial);
  assert_values_close(&result, &[1.5, 2.7, 3.9, 5.1]);
  assert_eq!(result.offset(), GridOffset::new(1.0, 1.5, 1.5));
  assert_eq!(result.spacing(), GridSpacing::new(2.0, 1.2, 1.2));
}

#[test]
fn test_trilinear_by_spacing() {
  let expected = [1.0, 1.8, 3.1, 3.9, 4.6, 5.4, 6.7, 7.5];
  let result = trilinear(&cube_image(), GridSpacing::new(0.6, 0.7, 0.8));
  assert_values_close(&result, &expected);
}

#[test]
fn test_trilinear_on_grid() {
  let mut img = cube_image();
  img.set_offset(GridOffset::new(1.0, 1.0, 1.0));

  let expected = [3.5, 4.3, 5.6, 6.4, 7.1, 7.9, 9.2, 10.0];
  let result = trilinear_on_grid(
    &img,
    GridOffset::new(1.3, 1.2, 1.1),
    GridSpacing::new(0.6, 0.7, 0.8),
  );
  assert_values_close(&result, &expected);
}

#[test]
fn test_trilinear_on_reference_grid() {
  let img = DoseImage::new(
    vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0],
    GridSize::new(2, 2, 2),
    GridOffset::new(1.0, 1.0, 1.0),
    GridSpacing::new(2.0, 2.0, 2.0),
  )
  .unwrap();
  let reference = DoseImage::new(
    vec![20.0, 34.0, 18.0, 10.0, 3.0, 0.0, 123.0, 4.0],
    GridSize::new(2, 2, 2),
    GridOffset::new(1.5, 1.5, 1.5),
    GridSpacing::new(1.2, 1.2, 1.2),
  )
  .unwrap();

  let result = trilinear_on_reference_grid(&img, &reference);
  assert_values_close(&result, &[3.5, 4.7, 5.9, 7.1, 8.3, 9.5, 10.7, 11.9]);
}

#[test]
fn test_axis_passes_commute() {
  let img = cube_image();
  let zy = linear_along_axis(&linear_along_axis(&img, 0.6, ImageAxis::Z), 0.7, ImageAxis::Y);
  let yz = linear_along_axis(&linear_along_axis(&img, 0.7, ImageAxis::Y), 0.6, ImageAxis::Z);
  assert_eq!(zy.size(), yz.size());
  for (a, b) in zy.data().iter().zip(yz.data().iter()) {
    assert!((a - b).abs() < TOL);
  }
}

#[test]
fn test_resample_onto_own_spacing_is_identity() {
  let img = cube_image();
  let result = trilinear(&img, img.spacing());
  assert_eq!(result.size(), img.size());
  for (a, b) in result.data().iter().zip(img.data().iter()) {
    assert!((a - b).abs() < TOL);
  }
}

// =============================================================================
// Pointwise
// =============================================================================

fn point_image() -> DoseImage {
  DoseImage::from_3d(
    vec![
      vec![vec![3.0, 6.8], vec![5.0, -2.0]],
      vec![vec![2.0, 8.0], vec![10.0, 2.0]],
    ],
    GridOffset::new(1.0, 2.0, 3.0),
    GridSpacing::new(1.5, 2.0, 2.5),
  )
  .unwrap()
}

#[test]
fn test_bilinear_at_point() {
  let img = point_image();
  let v0 = bilinear_at_point(&img, 0, 2.7, 3.8).unwrap().unwrap();
  let v1 = bilinear_at_point(&img, 1, 2.7, 3.8).unwrap().unwrap();
  assert!((v0 - 3.7064).abs() < TOL);
  assert!((v1 - 5.152).abs() < TOL);
}

#[test]
fn test_bilinear_at_point_on_edges() {
  let img = DoseImage::new(
    vec![1.0, 2.0, 3.0, 4.0],
    GridSize::new(1, 2, 2),
    GridOffset::new(1.0, 1.0, 1.0),
    GridSpacing::new(2.0, 2.0, 2.0),
  )
  .unwrap();

  let sample = |y, x| bilinear_at_point(&img, 0, y, x).unwrap().unwrap();
  assert_eq!(sample(1.0, 1.0), 1.0);
  assert_eq!(sample(1.0, 3.0), 2.0);
  assert_eq!(sample(3.0, 1.0), 3.0);
  assert_eq!(sample(3.0, 3.0), 4.0);
  assert!((sample(1.0, 2.0) - 1.5).abs() < TOL);
  assert!((sample(2.0, 3.0) - 3.0).abs() < TOL);
  assert!((sample(3.0, 2.0) - 3.5).abs() < TOL);
  assert!((sample(2.0, 1.0) - 2.0).abs() < TOL);
}

#[test]
fn test_bilinear_at_point_outside_image() {
  let img = DoseImage::new(
    vec![1.0, 2.0, 3.0, 4.0],
    GridSize::new(1, 2, 2),
    GridOffset::new(1.0, 2.0, 3.0),
    GridSpacing::new(2.0, 2.0, 2.5),
  )
  .unwrap();

  assert_eq!(bilinear_at_point(&img, 0, 20.0, 20.0).unwrap(), None);
  assert_eq!(bilinear_at_point(&img, 0, -20.0, -20.0).unwrap(), None);
  assert_eq!(bilinear_at_point(&img, 0, 4.1, 5.6).unwrap(), None);
  assert_eq!(bilinear_at_point(&img, 0, 1.9, 2.9).unwrap(), None);

  assert!(matches!(
    bilinear_at_point(&img, 10, 2.5, 3.5),
    Err(GammaError::OutOfRange(_))
  ));
}

#[test]
fn test_trilinear_at_point() {
  let img = point_image();
  let v0 = trilinear_at_point(&img, 2.1, 2.7, 4.2).unwrap();
  let v1 = trilinear_at_point(&img, 1.3, 3.5, 3.9).unwrap();
  assert!((v0 - 4.89642666).abs() < TOL);
  assert!((v1 - 3.6376).abs() < TOL);
}

#[test]
fn test_trilinear_at_point_on_edges() {
  let img = DoseImage::new(
    (1..=8).map(|v| v as f32).collect(),
    GridSize::new(2, 2, 2),
    GridOffset::new(1.0, 1.0, 1.0),
    GridSpacing::new(2.0, 2.0, 2.0),
  )
  .unwrap();

  let sample = |z, y, x| trilinear_at_point(&img, z, y, x).unwrap();
  assert_eq!(sample(1.0, 1.0, 1.0), 1.0);
  assert_eq!(sample(1.0, 3.0, 3.0), 4.0);
  assert_eq!(sample(3.0, 3.0, 3.0), 8.0);
  assert!((sample(2.0, 1.0, 1.0) - 3.0).abs() < TOL);
  assert!((sample(3.0, 2.0, 3.0) - 7.0).abs() < TOL);
}

#[test]
fn test_trilinear_at_point_outside_image() {
  let img = point_image();
  assert_eq!(trilinear_at_point(&img, -5.0, 2.7, 4.2), None);
  assert_eq!(trilinear_at_point(&img, 2.1, 50.0, 4.2), None);
  assert_eq!(trilinear_at_point(&img, 2.1, 2.7, -50.0), None);
}
