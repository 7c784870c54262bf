//! Kernel dispatch: candidate lists and selection.
//!
//! - [`Candidate`]: a kernel with capability requirements
//! - [`Selected`]: the result of kernel selection
//! - [`select`] / [`try_select`]: choose the first candidate whose
//!   requirements are satisfied by the detected capabilities
//!
//! Candidates are ordered from best to worst; the last entry should require
//! [`Caps::NONE`] so selection always succeeds.

use platform::Caps;

/// A candidate kernel with capability requirements.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<F> {
  /// Human-readable name for diagnostics (e.g., "x86_64/avx2").
  pub name: &'static str,
  /// Required CPU capabilities. Must be a subset of detected caps.
  pub requires: Caps,
  /// The kernel payload (usually a function-pointer table).
  pub func: F,
}

impl<F> Candidate<F> {
  /// Create a new candidate.
  #[inline]
  #[must_use]
  pub const fn new(name: &'static str, requires: Caps, func: F) -> Self {
    Self { name, requires, func }
  }
}

/// The result of kernel selection.
#[derive(Clone, Copy, Debug)]
pub struct Selected<F> {
  /// Human-readable name of the selected kernel.
  pub name: &'static str,
  /// The selected kernel payload.
  pub func: F,
}

impl<F> Selected<F> {
  /// Create a new selected result.
  #[inline]
  #[must_use]
  pub const fn new(name: &'static str, func: F) -> Self {
    Self { name, func }
  }
}

/// Select the best kernel from a candidate list, or `None` if nothing matches.
#[inline]
#[must_use]
pub fn try_select<F: Copy>(caps: Caps, candidates: &[Candidate<F>]) -> Option<Selected<F>> {
  candidates
    .iter()
    .find(|c| caps.has(c.requires))
    .map(|c| Selected::new(c.name, c.func))
}

/// Select the best kernel from a candidate list.
///
/// Returns the first candidate whose `requires` is satisfied by `caps`.
///
/// # Panics
///
/// Panics if `candidates` is empty or no candidate matches. The candidate
/// list must end with an always-available fallback (`requires = Caps::NONE`).
#[inline]
#[must_use]
pub fn select<F: Copy>(caps: Caps, candidates: &[Candidate<F>]) -> Selected<F> {
  match try_select(caps, candidates) {
    Some(selected) => selected,
    None => panic!("no matching kernel; candidate list must include an unconditional fallback"),
  }
}

/// Build a `&[Candidate<_>]` literal with `name => requires => func` rows.
#[macro_export]
macro_rules! candidates {
  ($($name:expr => $requires:expr => $func:expr),+ $(,)?) => {
    &[$($crate::dispatch::Candidate::new($name, $requires, $func)),+]
  };
}
