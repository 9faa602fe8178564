//! Field and group arithmetic of the SM2 curve.
//!
//! The limb kernels in `arith` are shared with the SM9 fields.

pub(crate) mod arith;

pub mod curve;
pub mod gfn;
pub mod gfp;

pub type LIMB = u64;
pub const NLIMBS: usize = 4;
