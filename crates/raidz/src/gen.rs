//! Parity generation.
//!
//! P is the plain XOR of the data columns. Q and R accumulate by a
//! Horner-style recurrence: for each data column in index order,
//! `q = q*2 ^ d` (and `r = r*4 ^ d`), which evaluates the Reed-Solomon
//! polynomial at the points 2 and 4 without ever materializing exponents.
//! A column shorter than the parity width keeps the recurrence running over
//! its missing tail with zero input, so the doubling count stays uniform
//! across byte positions.
//!
//! All three routines overwrite the parity buffers in place and leave data
//! columns untouched.

use crate::kernel::{Lane, MathScope};
use crate::map::{RaidzMap, CODE_P};

/// P parity: XOR every data column into P.
#[inline(always)]
pub(crate) fn generate_p<V: Lane>(rm: &mut RaidzMap) {
  let _scope = MathScope::<V>::enter();
  let (parity, data) = rm.split_parity_mut();
  let p = parity[CODE_P].data_mut();
  p.fill(0);

  for col in data {
    let d = col.data();
    for (pc, dc) in p[..d.len()].chunks_exact_mut(V::WIDTH).zip(d.chunks_exact(V::WIDTH)) {
      V::load(pc).xor(V::load(dc)).store(pc);
    }
  }
}

/// PQ parity: one fused pass per data column, then the Q doubling tail.
#[inline(always)]
pub(crate) fn generate_pq<V: Lane>(rm: &mut RaidzMap) {
  let _scope = MathScope::<V>::enter();
  let (parity, data) = rm.split_parity_mut();
  let (p_cols, q_cols) = parity.split_at_mut(1);
  let p = p_cols[CODE_P].data_mut();
  let q = q_cols[0].data_mut();
  p.fill(0);
  q.fill(0);

  for col in data {
    let d = col.data();
    let dlen = d.len();
    for ((pc, qc), dc) in p[..dlen]
      .chunks_exact_mut(V::WIDTH)
      .zip(q[..dlen].chunks_exact_mut(V::WIDTH))
      .zip(d.chunks_exact(V::WIDTH))
    {
      let dv = V::load(dc);
      V::load(pc).xor(dv).store(pc);
      V::load(qc).mul2().xor(dv).store(qc);
    }
    for qc in q[dlen..].chunks_exact_mut(V::WIDTH) {
      V::load(qc).mul2().store(qc);
    }
  }
}

/// PQR parity: as PQ with the additional x4 recurrence for R.
#[inline(always)]
pub(crate) fn generate_pqr<V: Lane>(rm: &mut RaidzMap) {
  let _scope = MathScope::<V>::enter();
  let (parity, data) = rm.split_parity_mut();
  let (p_cols, qr_cols) = parity.split_at_mut(1);
  let (q_cols, r_cols) = qr_cols.split_at_mut(1);
  let p = p_cols[CODE_P].data_mut();
  let q = q_cols[0].data_mut();
  let r = r_cols[0].data_mut();
  p.fill(0);
  q.fill(0);
  r.fill(0);

  for col in data {
    let d = col.data();
    let dlen = d.len();
    for (((pc, qc), rc), dc) in p[..dlen]
      .chunks_exact_mut(V::WIDTH)
      .zip(q[..dlen].chunks_exact_mut(V::WIDTH))
      .zip(r[..dlen].chunks_exact_mut(V::WIDTH))
      .zip(d.chunks_exact(V::WIDTH))
    {
      let dv = V::load(dc);
      V::load(pc).xor(dv).store(pc);
      V::load(qc).mul2().xor(dv).store(qc);
      V::load(rc).mul4().xor(dv).store(rc);
    }
    for (qc, rc) in q[dlen..]
      .chunks_exact_mut(V::WIDTH)
      .zip(r[dlen..].chunks_exact_mut(V::WIDTH))
    {
      V::load(qc).mul2().store(qc);
      V::load(rc).mul4().store(rc);
    }
  }
}
