//! Deterministic randomness for reproducing standard test vectors.

mod const_rng;

pub use const_rng::ConstRngCore;
