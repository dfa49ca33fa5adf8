//! Work dispatchers for the gamma kernels.
//!
//! Two strategies, matched to the cost profile of the kernels:
//!
//! - **Range partitioning** (Classic): per-voxel cost is uniform, so the
//!   must-compute cells are counted up front and split evenly. The output is
//!   prefilled with NaN (skipped cells) and +Inf (must-compute markers), and
//!   each worker owns one contiguous slice.
//! - **Task queue** (Wendling): early termination makes per-voxel cost vary
//!   by more than 10x, so the index range is chunked into small tasks behind
//!   a mutex-guarded FIFO and workers pop until the queue drains.
//!
//! Workers come from rayon's pool; the count is chosen once per call as
//! min(pool size, voxel count), and a single-worker call runs inline. Output
//! slices are disjoint, so the queue pop is the only synchronization point.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use crate::gamma::common::GammaCoeffs;
use crate::image::DoseImage;

fn thread_count(work_items: usize) -> usize {
  rayon::current_num_threads().min(work_items)
}

/// Even split of the must-compute cells into `count` index ranges.
///
/// When the prefill contains NaNs, range boundaries walk forward until each
/// range holds its share of +Inf markers.
fn calc_ranges(count: usize, must_compute: usize, gamma_vals: &[f32]) -> Vec<(usize, usize)> {
  let mut result = Vec::with_capacity(count);

  let per_range = must_compute / count;
  let remainder = must_compute % count;
  let mut start = 0usize;
  let mut end = 0usize;

  if must_compute == gamma_vals.len() {
    for n in 0..count {
      let amount = per_range + usize::from(n < remainder);
      end += amount;
      result.push((start, end));
      start = end;
    }
  } else {
    for n in 0..count {
      let amount = per_range + usize::from(n < remainder);
      let mut counter = 0usize;
      while counter < amount {
        if gamma_vals[end] == f32::INFINITY {
          counter += 1;
          if counter == 1 {
            start = end;
          }
        }
        end += 1;
      }
      result.push((start, end));
      start = end;
    }
  }

  result
}

/// Prefill the output and split the must-compute cells evenly across
/// workers. Each worker overwrites the +Inf markers of its range in place.
pub(super) fn run_partitioned<F>(ref_img: &DoseImage, coeffs: &GammaCoeffs, kernel: F) -> Vec<f32>
where
  F: Fn(usize, &mut [f32]) + Sync,
{
  let total = ref_img.len();

  let mut gamma_vals = Vec::with_capacity(total);
  let mut must_compute = 0usize;
  for index in 0..total {
    if coeffs.skips(ref_img.get_index(index)) {
      gamma_vals.push(f32::NAN);
    } else {
      gamma_vals.push(f32::INFINITY);
      must_compute += 1;
    }
  }
  if must_compute == 0 {
    return gamma_vals;
  }

  let threads = thread_count(total);
  debug!(threads, must_compute, total, "partitioned gamma dispatch");

  if threads <= 1 {
    kernel(0, &mut gamma_vals);
    return gamma_vals;
  }

  let ranges = calc_ranges(threads, must_compute, &gamma_vals);

  let mut jobs: Vec<(usize, &mut [f32])> = Vec::with_capacity(ranges.len());
  let mut tail: &mut [f32] = &mut gamma_vals;
  let mut consumed = 0usize;
  for (start, end) in ranges {
    if start == end {
      continue;
    }
    let (_, rest) = std::mem::take(&mut tail).split_at_mut(start - consumed);
    let (job, rest) = rest.split_at_mut(end - start);
    jobs.push((start, job));
    tail = rest;
    consumed = end;
  }

  rayon::scope(|scope| {
    for (start, job) in jobs {
      let kernel = &kernel;
      scope.spawn(move |_| kernel(start, job));
    }
  });

  gamma_vals
}

/// Chunk the index range into small tasks behind a mutex-guarded FIFO; each
/// worker pops until the queue is empty.
///
/// The output starts zeroed and every cell of every task is written by the
/// kernel, so no prefill pass is needed.
pub(super) fn run_task_queue<F>(total: usize, kernel: F) -> Vec<f32>
where
  F: Fn(usize, &mut [f32]) + Sync,
{
  let mut gamma_vals = vec![0.0f32; total];
  if total == 0 {
    return gamma_vals;
  }

  let threads = thread_count(total);
  if threads <= 1 {
    kernel(0, &mut gamma_vals);
    return gamma_vals;
  }

  const MAX_TASK_SIZE: usize = 256;
  let task_size = MAX_TASK_SIZE.min((total / threads).max(1));
  debug!(threads, task_size, total, "task-queue gamma dispatch");

  let queue: Mutex<VecDeque<(usize, &mut [f32])>> = Mutex::new(
    gamma_vals
      .chunks_mut(task_size)
      .enumerate()
      .map(|(n, chunk)| (n * task_size, chunk))
      .collect(),
  );

  rayon::scope(|scope| {
    for _ in 0..threads {
      scope.spawn(|_| loop {
        let task = queue.lock().unwrap().pop_front();
        match task {
          Some((start, slice)) => kernel(start, slice),
          None => break,
        }
      });
    }
  });

  drop(queue);
  gamma_vals
}
