//! RAID-Z(1/2/3) parity and reconstruction over GF(2^8).
//!
//! Given N data columns, compute 1-3 parity columns (P, Q, R); given up to 3
//! missing or corrupt columns, recover the original data from the survivors.
//! The mathematics is a Reed-Solomon code evaluated at the field points 1, 2,
//! and 4, computed by Horner-style recurrences so the hot loops are nothing
//! but XOR, in-field doubling, and constant multiplies.
//!
//! # Architecture
//!
//! The algorithms are written once against a small lane-primitive trait; each
//! backend (portable scalar, AVX2, NEON) supplies only native-width
//! primitives. Backends are registered in a process-wide immutable table,
//! auto-selected by CPU capability probe at first use, and can be forced by
//! name. Every [`RaidzMap`] caches the backend active at its construction, so
//! concurrent I/Os never race on selection.
//!
//! # Example
//!
//! ```
//! use raidz::RaidzMap;
//!
//! // 5 data columns + 2 parity, 512-byte sectors.
//! let payload = vec![0x5au8; 10 * 512];
//! let mut rm = RaidzMap::new(7, 2, 9, 0, &payload);
//! rm.generate_parity();
//!
//! // Lose two data columns; recover them from P and Q.
//! let golden: Vec<u8> = rm.col(3).data().to_vec();
//! rm.col_mut(3).data_mut().fill(0);
//! rm.col_mut(5).data_mut().fill(0);
//! rm.reconstruct(&[3, 5]);
//! assert_eq!(rm.col(3).data(), &golden[..]);
//! ```
//!
//! # Errors and contract violations
//!
//! The only recoverable error is backend selection by name
//! ([`set_backend`]). Size mismatches, out-of-range indices, and
//! insufficient-parity requests are caller bugs and panic; this path never
//! silently produces wrong parity or data.

// Fallibility discipline: deny unwrap/expect in production, allow in tests.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod gf;
pub mod kernel_test;

mod dispatch;
mod gen;
mod kernel;
mod map;
mod rec;

pub use dispatch::{backend_names, current_backend_name, set_backend, SelectBackendError};
pub use map::{Column, RaidzMap, CODE_P, CODE_Q, CODE_R};
