//! Constant-time cores of the ShangMi (GM/T) public-key algorithms.
//!
//! - [`sm2`]: the SM2 prime field, scalar field and group, with DSA, PKE and
//!   two-party key exchange on top.
//! - [`sm9`]: the BN256 tower fields, G1/G2/GT and the optimal-ate pairing,
//!   with the identity-based signature, encryption and key exchange.
//! - [`mac`]: the GB/T 15821.1 block-cipher MACs and HMAC.
//! - [`kdf`]: the X9.63 counter-mode KDF.

#![no_std]
#![warn(clippy::std_instead_of_alloc, clippy::std_instead_of_core)]

mod internal;

#[macro_use]
pub mod sm3;
pub mod sm4;
pub mod rc5;

pub mod traits;
pub mod padding;
pub mod kdf;
pub mod mac;
pub mod cryptobyte;
pub mod rand;

pub mod sm2;
pub mod sm9;

#[allow(unused_imports)]
#[macro_use]
extern crate alloc;

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;
