//! Distance-sorted search-offset tables for the Wendling method.
//!
//! The tables enumerate lattice points (pitch `step_size`) inside a disc or
//! ball of the given radius, sorted ascending by squared distance so a
//! kernel walking the list can stop as soon as the normalized distance alone
//! exceeds its current best gamma. The origin always comes first; the table
//! is built once per gamma call and shared read-only across workers.
//!
//! Enumeration walks the positive wedge `0 <= x <= y (<= z) <= radius` and
//! materializes sign flips and coordinate permutations, skipping duplicates
//! for coordinates that are zero or equal.

use glam::{Vec2, Vec3A};

use crate::TOLERANCE;

/// In-plane search offset, millimetres from the reference voxel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscPoint {
  pub dy: f32,
  pub dx: f32,
  pub dist_sq: f32,
}

/// Volumetric search offset, millimetres from the reference voxel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallPoint {
  pub dz: f32,
  pub dy: f32,
  pub dx: f32,
  pub dist_sq: f32,
}

fn push_disc_variants(y: f32, x: f32, dist_sq: f32, result: &mut Vec<DiscPoint>) {
  result.push(DiscPoint { dy: y, dx: x, dist_sq });
  if y != 0.0 && x != 0.0 {
    result.push(DiscPoint {
      dy: -y,
      dx: -x,
      dist_sq,
    });
  }
  if y != 0.0 {
    result.push(DiscPoint {
      dy: -y,
      dx: x,
      dist_sq,
    });
  }
  if x != 0.0 {
    result.push(DiscPoint {
      dy: y,
      dx: -x,
      dist_sq,
    });
  }
}

/// Lattice points inside a disc of `radius`, sorted ascending by distance.
pub fn sorted_points_in_disc(radius: f32, step_size: f32) -> Vec<DiscPoint> {
  let elements = (radius / step_size) as u32;
  // a little more than pi * elements^2
  let mut result = Vec::with_capacity((3.5 * elements as f32 * elements as f32) as usize);

  let radius_sq = radius * radius + TOLERANCE;
  let radius = radius + TOLERANCE;

  let mut y = 0.0f32;
  while y <= radius {
    let mut x = 0.0f32;
    while x <= y + TOLERANCE {
      let dist_sq = Vec2::new(x, y).length_squared();
      if dist_sq <= radius_sq {
        push_disc_variants(y, x, dist_sq, &mut result);
        if y != x {
          push_disc_variants(x, y, dist_sq, &mut result);
        }
      }
      x += step_size;
    }
    y += step_size;
  }

  result.sort_by(|lhs, rhs| lhs.dist_sq.total_cmp(&rhs.dist_sq));
  result
}

fn push_ball_variants(z: f32, y: f32, x: f32, dist_sq: f32, result: &mut Vec<BallPoint>) {
  result.push(BallPoint {
    dz: z,
    dy: y,
    dx: x,
    dist_sq,
  });
  if z != 0.0 && y != 0.0 && x != 0.0 {
    result.push(BallPoint {
      dz: -z,
      dy: -y,
      dx: -x,
      dist_sq,
    });
  }
  if z != 0.0 && y != 0.0 {
    result.push(BallPoint {
      dz: -z,
      dy: -y,
      dx: x,
      dist_sq,
    });
  }
  if z != 0.0 && x != 0.0 {
    result.push(BallPoint {
      dz: -z,
      dy: y,
      dx: -x,
      dist_sq,
    });
  }
  if y != 0.0 && x != 0.0 {
    result.push(BallPoint {
      dz: z,
      dy: -y,
      dx: -x,
      dist_sq,
    });
  }
  if z != 0.0 {
    result.push(BallPoint {
      dz: -z,
      dy: y,
      dx: x,
      dist_sq,
    });
  }
  if y != 0.0 {
    result.push(BallPoint {
      dz: z,
      dy: -y,
      dx: x,
      dist_sq,
    });
  }
  if x != 0.0 {
    result.push(BallPoint {
      dz: z,
      dy: y,
      dx: -x,
      dist_sq,
    });
  }
}

/// Lattice points inside a ball of `radius`, sorted ascending by distance.
pub fn sorted_points_in_ball(radius: f32, step_size: f32) -> Vec<BallPoint> {
  let elements = (radius / step_size) as u32;
  // a little more than 4/3 * pi * elements^3
  let mut result =
    Vec::with_capacity((4.5 * (elements as f32).powi(3)) as usize);

  let radius_sq = radius * radius + TOLERANCE;
  let radius = radius + TOLERANCE;

  let mut z = 0.0f32;
  while z <= radius {
    let mut y = 0.0f32;
    while y <= z + TOLERANCE {
      let mut x = 0.0f32;
      while x <= y + TOLERANCE {
        let dist_sq = Vec3A::new(x, y, z).length_squared();
        if dist_sq <= radius_sq {
          push_ball_variants(z, y, x, dist_sq, &mut result);

          if z != y && y != x && z != x {
            push_ball_variants(y, x, z, dist_sq, &mut result);
            push_ball_variants(x, z, y, dist_sq, &mut result);
          }
          if y != x {
            push_ball_variants(z, x, y, dist_sq, &mut result);
          }
          if z != y {
            push_ball_variants(y, z, x, dist_sq, &mut result);
          }
          if z != x {
            push_ball_variants(x, y, z, dist_sq, &mut result);
          }
        }
        x += step_size;
      }
      y += step_size;
    }
    z += step_size;
  }

  result.sort_by(|lhs, rhs| lhs.dist_sq.total_cmp(&rhs.dist_sq));
  result
}

#[cfg(test)]
#[path = "search_test.rs"]
mod search_test;
