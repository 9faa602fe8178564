//! The hash functions H1 and H2, mapping byte strings onto [1, n-1].
//!
//! `H_v(Z, n)` concatenates `SM3(prefix || Z || ct)` for ct = 1, 2, keeps the
//! leftmost 320 bits and returns `(Ha mod (n-1)) + 1`. The inputs are public
//! so the big-integer reduction need not be constant time.

use num::BigUint;

use super::ec::gfn::GFnElement;
use super::ec::gt::GT;
use crate::sm3;

// 8 * ceil(5 * log2(n) / 32) bits.
const HLEN: usize = 40;

const PREFIX_H1: u8 = 0x01;
const PREFIX_H2: u8 = 0x02;

fn hash_to_range(prefix: u8, parts: &[&[u8]]) -> GFnElement {
    let mut ha = [0u8; 2 * sm3::DIGEST_SIZE];
    for (ct, block) in (1u32..).zip(ha.chunks_exact_mut(sm3::DIGEST_SIZE)) {
        let mut d = sm3::Digest::new();
        d.write(&[prefix]);
        for p in parts {
            d.write(p);
        }
        d.write(&ct.to_be_bytes());
        block.copy_from_slice(&d.sum());
    }

    let n_minus_1 = BigUint::from_bytes_be(&GFnElement::N.to_be_bytes()) - 1u32;
    let h = BigUint::from_bytes_be(&ha[..HLEN]) % n_minus_1 + 1u32;
    let be = h.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - be.len()..].copy_from_slice(&be);
    GFnElement::from(&out)
}

/// H1(id || hid, n).
pub fn h1(id: &[u8], hid: u8) -> GFnElement {
    hash_to_range(PREFIX_H1, &[id, &[hid]])
}

/// H2(msg || w, n).
pub fn h2(msg: &[u8], w: &GT) -> GFnElement {
    hash_to_range(PREFIX_H2, &[msg, &w.to_bytes()])
}
