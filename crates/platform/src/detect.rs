//! Runtime CPU detection.
//!
//! Layers, in priority order:
//!
//! 1. User-supplied override ([`set_caps_override`]): tests, bare metal.
//! 2. Cached detection: compile-time `cfg!(target_feature)` unioned with
//!    runtime probes (`std` only), computed once.
//!
//! Under Miri the answer is always [`Caps::NONE`] so the interpreter never
//! sees vector intrinsics.

use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::caps::Caps;

// ─────────────────────────────────────────────────────────────────────────────
// Override support
// ─────────────────────────────────────────────────────────────────────────────

static OVERRIDE_SET: AtomicBool = AtomicBool::new(false);
static OVERRIDE_BITS: AtomicU64 = AtomicU64::new(0);

/// Set or clear the capabilities override.
pub fn set_caps_override(value: Option<Caps>) {
  match value {
    Some(caps) => {
      OVERRIDE_BITS.store(caps.as_raw(), Ordering::Release);
      OVERRIDE_SET.store(true, Ordering::Release);
    }
    None => OVERRIDE_SET.store(false, Ordering::Release),
  }
}

/// Check whether an override is currently set.
#[inline]
pub fn has_override() -> bool {
  OVERRIDE_SET.load(Ordering::Acquire)
}

#[inline]
fn get_override() -> Option<Caps> {
  if !OVERRIDE_SET.load(Ordering::Acquire) {
    return None;
  }
  Some(Caps::from_raw(OVERRIDE_BITS.load(Ordering::Acquire)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Cached detection
// ─────────────────────────────────────────────────────────────────────────────

/// Get detected capabilities, honoring any override.
#[inline]
#[must_use]
pub fn caps() -> Caps {
  // Miri cannot interpret SIMD intrinsics, so always report none.
  #[cfg(miri)]
  {
    return Caps::NONE;
  }

  #[cfg(not(miri))]
  {
    if let Some(forced) = get_override() {
      return forced;
    }

    #[cfg(feature = "std")]
    {
      use std::sync::OnceLock;
      static CACHED: OnceLock<Caps> = OnceLock::new();
      *CACHED.get_or_init(detect_uncached)
    }

    #[cfg(not(feature = "std"))]
    {
      // Without std there is nothing to probe; compile-time features are
      // cheap to recompute, so no cache is needed.
      detect_uncached()
    }
  }
}

/// Detect capabilities without caching.
#[must_use]
pub fn detect_uncached() -> Caps {
  #[cfg(target_arch = "x86_64")]
  {
    detect_x86_64()
  }

  #[cfg(target_arch = "aarch64")]
  {
    detect_aarch64()
  }

  #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
  {
    Caps::NONE
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// x86_64
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "x86_64")]
fn detect_x86_64() -> Caps {
  use crate::caps::x86;

  // Mutation happens only under target_feature / std cfg branches.
  #[allow(unused_mut)]
  let mut bits = Caps::NONE;

  // Compile-time features first.
  #[cfg(target_feature = "ssse3")]
  {
    bits |= x86::SSSE3;
  }

  #[cfg(target_feature = "avx2")]
  {
    bits |= x86::AVX2;
  }

  #[cfg(target_feature = "avx512bw")]
  {
    bits |= x86::AVX512BW;
  }

  // Runtime probes (std only).
  #[cfg(feature = "std")]
  {
    if std::arch::is_x86_feature_detected!("ssse3") {
      bits |= x86::SSSE3;
    }
    if std::arch::is_x86_feature_detected!("avx2") {
      bits |= x86::AVX2;
    }
    if std::arch::is_x86_feature_detected!("avx512bw") {
      bits |= x86::AVX512BW;
    }
  }

  bits
}

// ─────────────────────────────────────────────────────────────────────────────
// aarch64
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "aarch64")]
fn detect_aarch64() -> Caps {
  use crate::caps::aarch64;

  // Advanced SIMD is baseline on AArch64.
  aarch64::NEON
}
