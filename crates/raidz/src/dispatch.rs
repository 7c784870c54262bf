//! Backend registry and selection.
//!
//! The registry is an immutable, process-wide candidate list in preference
//! order (widest vectors first, scalar last and unconditional). The current
//! backend is resolved lazily (best available wins) and can be forced by
//! name for testing or diagnostics. Each [`RaidzMap`] caches the backend
//! active at its construction and uses it for every operation on that map,
//! so changing the current backend never affects an I/O in flight.

use core::fmt;
use core::sync::atomic::{AtomicPtr, Ordering};

use backend::{candidates, select, Candidate};
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
use platform::Caps;

use crate::map::RaidzMap;

/// Parity generation entry: P, PQ, or PQR over a whole map.
pub(crate) type GenFn = fn(&mut RaidzMap);

/// Reconstruction entry: one of the seven cases over sorted data targets.
/// Returns the bitmask of parity codes used.
pub(crate) type RecFn = fn(&mut RaidzMap, &[usize]) -> u8;

/// An immutable backend descriptor: one function-pointer table per backend.
pub(crate) struct RaidzBackend {
  pub(crate) name: &'static str,
  pub(crate) gen: [GenFn; 3],
  pub(crate) rec: [RecFn; 7],
}

#[cfg(target_arch = "x86_64")]
static CANDIDATES: &[Candidate<&'static RaidzBackend>] = candidates![
  "x86_64/avx2" => platform::x86::AVX2 => &crate::kernel::avx2::OPS,
  "scalar"      => platform::Caps::NONE => &crate::kernel::scalar::OPS,
];

#[cfg(target_arch = "aarch64")]
static CANDIDATES: &[Candidate<&'static RaidzBackend>] = candidates![
  "aarch64/neon" => platform::aarch64::NEON => &crate::kernel::neon::OPS,
  "scalar"       => platform::Caps::NONE    => &crate::kernel::scalar::OPS,
];

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
static CANDIDATES: &[Candidate<&'static RaidzBackend>] = candidates![
  "scalar" => Caps::NONE => &crate::kernel::scalar::OPS,
];

static CURRENT: AtomicPtr<RaidzBackend> = AtomicPtr::new(core::ptr::null_mut());

#[inline]
fn store_current(ops: &'static RaidzBackend) {
  CURRENT.store(ops as *const RaidzBackend as *mut RaidzBackend, Ordering::Release);
}

/// The current backend, resolving to the best available on first use.
pub(crate) fn current() -> &'static RaidzBackend {
  let p = CURRENT.load(Ordering::Acquire);
  if !p.is_null() {
    // SAFETY: the pointer was stored from a `&'static RaidzBackend`.
    #[allow(unsafe_code)]
    return unsafe { &*p };
  }
  let selected = select(platform::caps(), CANDIDATES).func;
  store_current(selected);
  selected
}

/// Backends available on this CPU, in preference order.
pub(crate) fn available() -> impl Iterator<Item = &'static RaidzBackend> {
  let caps = platform::caps();
  CANDIDATES.iter().filter(move |c| caps.has(c.requires)).map(|c| c.func)
}

/// Failure to select a backend by name; the caller may fall back to another
/// name or to `"fastest"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SelectBackendError {
  /// No backend is registered under the given name.
  Unknown,
  /// The backend exists but this CPU lacks the features it needs.
  Unsupported,
}

impl fmt::Display for SelectBackendError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Unknown => f.write_str("unknown raidz backend"),
      Self::Unsupported => f.write_str("raidz backend not supported on this cpu"),
    }
  }
}

impl core::error::Error for SelectBackendError {}

/// Registered backend names, in preference order.
///
/// The names are stable identifiers for [`set_backend`]; diagnostics may
/// also want [`current_backend_name`].
pub fn backend_names() -> impl Iterator<Item = &'static str> {
  CANDIDATES.iter().map(|c| c.name)
}

/// Name of the backend new maps will use.
#[must_use]
pub fn current_backend_name() -> &'static str {
  current().name
}

/// Set the process-wide backend by name.
///
/// Accepts a registered name (`"x86_64/avx2"`), its short form (`"avx2"`,
/// `"scalar"`), or `"fastest"` to re-run auto-selection. Matching is
/// case-insensitive. Maps created before the change keep their cached
/// backend.
pub fn set_backend(name: &str) -> Result<&'static str, SelectBackendError> {
  if name.eq_ignore_ascii_case("fastest") {
    let selected = select(platform::caps(), CANDIDATES);
    store_current(selected.func);
    return Ok(selected.name);
  }

  for cand in CANDIDATES {
    let short = cand.name.rsplit('/').next().unwrap_or(cand.name);
    if name.eq_ignore_ascii_case(cand.name) || name.eq_ignore_ascii_case(short) {
      if !platform::caps().has(cand.requires) {
        return Err(SelectBackendError::Unsupported);
      }
      store_current(cand.func);
      return Ok(cand.name);
    }
  }

  Err(SelectBackendError::Unknown)
}
