//! CPU capability detection for zraid.
//!
//! This crate is the single source of truth for CPU feature detection across
//! the workspace. It answers one question: "which vector kernels can legally
//! run on this machine?"
//!
//! # Design
//!
//! 1. **One API**: kernels query [`caps()`] instead of doing ad-hoc detection.
//! 2. **Zero-cost when possible**: compile-time features are folded in via
//!    `cfg!(target_feature)`.
//! 3. **Cached otherwise**: runtime detection runs once and is cached
//!    (`OnceLock` under `std`, atomics without).
//! 4. **Overridable**: tests and bare-metal deployments can pin capabilities
//!    with [`set_caps_override`].
//!
//! # Example
//!
//! ```
//! use platform::caps;
//!
//! let c = caps();
//! if c.has(platform::x86::AVX2) {
//!   // 256-bit kernels are safe to call
//! }
//! ```

// Fallibility discipline: deny unwrap/expect in production, allow in tests.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod caps;
mod detect;

pub use caps::{x86, aarch64, Caps};

/// Get detected CPU capabilities.
///
/// The first call performs detection; subsequent calls return the cached
/// result. If an override is set it takes precedence.
#[inline]
#[must_use]
pub fn caps() -> Caps {
  detect::caps()
}

/// Detect capabilities without touching the cache.
///
/// Useful for tests that want fresh detection results.
#[inline]
#[must_use]
pub fn detect_uncached() -> Caps {
  detect::detect_uncached()
}

/// Set or clear the capabilities override.
///
/// When set, [`caps()`] returns the override instead of detecting. Pass
/// `None` to clear. Intended for forcing the portable path in tests and for
/// bare-metal targets where the CPU is known at deployment.
#[inline]
pub fn set_caps_override(value: Option<Caps>) {
  detect::set_caps_override(value);
}

/// Check whether an override is currently set.
#[inline]
#[must_use]
pub fn has_override() -> bool {
  detect::has_override()
}
