use std::collections::HashSet;

use super::*;

fn key2(p: &DiscPoint) -> (i64, i64) {
  ((p.dy * 1e4).round() as i64, (p.dx * 1e4).round() as i64)
}

fn key3(p: &BallPoint) -> (i64, i64, i64) {
  (
    (p.dz * 1e4).round() as i64,
    (p.dy * 1e4).round() as i64,
    (p.dx * 1e4).round() as i64,
  )
}

#[test]
fn test_disc_origin_comes_first() {
  let points = sorted_points_in_disc(2.0, 0.5);
  assert_eq!(points[0], DiscPoint { dy: 0.0, dx: 0.0, dist_sq: 0.0 });
}

#[test]
fn test_disc_is_sorted_by_distance() {
  let points = sorted_points_in_disc(3.0, 0.7);
  assert!(points.windows(2).all(|w| w[0].dist_sq <= w[1].dist_sq));
}

#[test]
fn test_disc_has_no_duplicates_and_stays_inside() {
  let points = sorted_points_in_disc(2.0, 0.5);
  let unique: HashSet<_> = points.iter().map(key2).collect();
  assert_eq!(unique.len(), points.len());

  let limit = 2.0 * 2.0 + 1e-3;
  assert!(points.iter().all(|p| p.dist_sq <= limit));
}

#[test]
fn test_disc_point_count_matches_lattice() {
  // unit step inside radius 2: all integer (dy, dx) with dy^2 + dx^2 <= 4
  let points = sorted_points_in_disc(2.0, 1.0);
  assert_eq!(points.len(), 13);
}

#[test]
fn test_disc_covers_all_sign_combinations() {
  let points = sorted_points_in_disc(1.0, 1.0);
  let keys: HashSet<_> = points.iter().map(key2).collect();
  for expected in [
    (0, 0),
    (10000, 0),
    (-10000, 0),
    (0, 10000),
    (0, -10000),
  ] {
    assert!(keys.contains(&expected), "missing {expected:?}");
  }
}

#[test]
fn test_disc_distances_are_consistent() {
  let points = sorted_points_in_disc(2.5, 0.3);
  for p in &points {
    let expected = p.dy * p.dy + p.dx * p.dx;
    assert!((p.dist_sq - expected).abs() < 1e-5);
  }
}

#[test]
fn test_ball_origin_comes_first() {
  let points = sorted_points_in_ball(2.0, 0.5);
  assert_eq!(
    points[0],
    BallPoint { dz: 0.0, dy: 0.0, dx: 0.0, dist_sq: 0.0 }
  );
}

#[test]
fn test_ball_is_sorted_by_distance() {
  let points = sorted_points_in_ball(2.0, 0.4);
  assert!(points.windows(2).all(|w| w[0].dist_sq <= w[1].dist_sq));
}

#[test]
fn test_ball_has_no_duplicates_and_stays_inside() {
  let points = sorted_points_in_ball(1.5, 0.5);
  let unique: HashSet<_> = points.iter().map(key3).collect();
  assert_eq!(unique.len(), points.len());

  let limit = 1.5 * 1.5 + 1e-3;
  assert!(points.iter().all(|p| p.dist_sq <= limit));
}

#[test]
fn test_ball_point_count_matches_lattice() {
  // unit step inside radius 1: origin plus the six axis neighbours
  let points = sorted_points_in_ball(1.0, 1.0);
  assert_eq!(points.len(), 7);

  // radius 2: all integer points with norm^2 <= 4
  let points = sorted_points_in_ball(2.0, 1.0);
  let expected = {
    let mut count = 0;
    for z in -2i32..=2 {
      for y in -2i32..=2 {
        for x in -2i32..=2 {
          if z * z + y * y + x * x <= 4 {
            count += 1;
          }
        }
      }
    }
    count
  };
  assert_eq!(points.len(), expected);
}

#[test]
fn test_ball_distances_are_consistent() {
  let points = sorted_points_in_ball(1.2, 0.3);
  for p in &points {
    let expected = p.dz * p.dz + p.dy * p.dy + p.dx * p.dx;
    assert!((p.dist_sq - expected).abs() < 1e-5);
  }
}
