//! Backend crate: kernel selection primitives for zraid.
//!
//! Algorithm crates register their kernels as an ordered list of
//! [`Candidate`]s (best first, an always-available fallback last) and call
//! [`select`] against the detected [`platform::Caps`]. The result is a
//! [`Selected`] carrying the kernel's diagnostic name and its function table.
//!
//! ```
//! use backend::{candidates, select, Selected};
//! use platform::Caps;
//!
//! fn kernel_a() {}
//! fn kernel_b() {}
//!
//! let picked: Selected<fn()> = select(
//!   platform::caps(),
//!   candidates![
//!     "x86_64/avx2" => platform::x86::AVX2 => kernel_a,
//!     "scalar"      => Caps::NONE          => kernel_b,
//!   ],
//! );
//! ```

// Fallibility discipline: deny unwrap/expect in production, allow in tests.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod dispatch;

pub use dispatch::{select, try_select, Candidate, Selected};
pub use platform;
