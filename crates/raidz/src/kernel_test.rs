//! Kernel testing utilities.
//!
//! Runs every backend available on the current CPU over the same layout and
//! returns their results, so tests and fuzz drivers can verify cross-backend
//! equivalence. The first entry is always the scalar backend's; a backend
//! is purely a performance variant of the same mathematics, so every entry
//! must be byte-identical.

use alloc::vec::Vec;

use crate::map::RaidzMap;

/// Result of running one backend.
pub struct KernelRun {
  /// Backend name (e.g., "scalar", "x86_64/avx2").
  pub name: &'static str,
  /// Column contents after the operation, parity columns first.
  pub cols: Vec<Vec<u8>>,
}

fn snapshot(rm: &RaidzMap, upto: usize) -> Vec<Vec<u8>> {
  (0..upto).map(|c| rm.col(c).data().to_vec()).collect()
}

fn ordered_backends() -> Vec<&'static crate::dispatch::RaidzBackend> {
  let mut backends: Vec<_> = crate::dispatch::available().collect();
  // Scalar is registered last; surface it first as the oracle.
  backends.reverse();
  backends
}

/// Generate parity with every available backend; returns the parity columns.
#[must_use]
pub fn run_all_gen_kernels(ncols: usize, parity: usize, ashift: usize, payload: &[u8]) -> Vec<KernelRun> {
  ordered_backends()
    .into_iter()
    .map(|ops| {
      let mut rm = RaidzMap::new_with_backend(ncols, parity, ashift, 0, payload, ops);
      rm.generate_parity();
      KernelRun {
        name: ops.name,
        cols: snapshot(&rm, parity),
      }
    })
    .collect()
}

/// Generate, corrupt `targets`, reconstruct, with every available backend.
/// Returns all columns so callers can compare parity and data alike.
#[must_use]
pub fn run_all_rec_kernels(
  ncols: usize,
  parity: usize,
  ashift: usize,
  payload: &[u8],
  targets: &[usize],
) -> Vec<KernelRun> {
  ordered_backends()
    .into_iter()
    .map(|ops| {
      let mut rm = RaidzMap::new_with_backend(ncols, parity, ashift, 0, payload, ops);
      rm.generate_parity();
      for &t in targets {
        for (i, b) in rm.col_mut(t).data_mut().iter_mut().enumerate() {
          *b = (i as u8).wrapping_mul(251) ^ 0x5a;
        }
      }
      rm.reconstruct(targets);
      KernelRun {
        name: ops.name,
        cols: snapshot(&rm, ncols),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use alloc::vec::Vec;

  use super::*;

  #[test]
  fn scalar_is_the_first_run() {
    let payload: Vec<u8> = (0..4 * 512).map(|i| i as u8).collect();
    let runs = run_all_gen_kernels(6, 2, 9, &payload);
    assert_eq!(runs[0].name, "scalar");
  }

  #[test]
  fn all_kernels_agree_on_parity() {
    let payload: Vec<u8> = (0..6 * 512).map(|i| (i as u8).wrapping_mul(7)).collect();
    let runs = run_all_gen_kernels(7, 3, 9, &payload);
    for run in &runs[1..] {
      assert_eq!(run.cols, runs[0].cols, "{} diverges from scalar", run.name);
    }
  }
}
