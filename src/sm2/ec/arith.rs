//! 256-bit limb kernels shared by the SM2 and SM9 prime fields.
//!
//! Limbs are little-endian u64 words. Nothing here branches on limb values.

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use super::*;

/// a + b + carry, with the outgoing carry.
#[inline(always)]
pub const fn adc(a: u64, b: u64, carry: bool) -> (u64, bool) {
    let (s, c1) = a.overflowing_add(b);
    let (s, c2) = s.overflowing_add(carry as u64);
    (s, c1 | c2)
}

/// a - b - borrow, with the outgoing borrow.
#[inline(always)]
pub const fn sbb(a: u64, b: u64, borrow: bool) -> (u64, bool) {
    let (d, b1) = a.overflowing_sub(b);
    let (d, b2) = d.overflowing_sub(borrow as u64);
    (d, b1 | b2)
}

/// a + b*c + carry as a (low, high) pair. Never overflows 128 bits.
#[inline(always)]
pub const fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let wide = (a as u128) + (b as u128) * (c as u128) + (carry as u128);
    (wide as u64, (wide >> 64) as u64)
}

#[inline(always)]
pub fn constant_eq256(a: &[LIMB; NLIMBS], b: &[LIMB; NLIMBS]) -> Choice {
    let diff = a.iter().zip(b).fold(0, |acc, (x, y)| acc | (x ^ y));
    diff.ct_eq(&0)
}

#[inline(always)]
pub fn is_zero256(a: &[LIMB; NLIMBS]) -> Choice {
    a.iter().fold(0, |acc, x| acc | x).ct_eq(&0)
}

/// Full 512-bit product, schoolbook.
#[inline(always)]
pub fn mul256(a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB, b0: LIMB, b1: LIMB, b2: LIMB, b3: LIMB) -> (LIMB, LIMB, LIMB, LIMB, LIMB, LIMB, LIMB, LIMB) {
    let a = [a0, a1, a2, a3];
    let mut t = [0 as LIMB; 8];
    for (i, bi) in [b0, b1, b2, b3].into_iter().enumerate() {
        let mut carry = 0;
        for (j, aj) in a.iter().enumerate() {
            (t[i + j], carry) = mac(t[i + j], *aj, bi, carry);
        }
        t[i + NLIMBS] = carry;
    }
    (t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7])
}

/// Full 512-bit square: the cross products once, doubled, plus the diagonal.
#[inline(always)]
pub fn square256(b0: LIMB, b1: LIMB, b2: LIMB, b3: LIMB) -> (LIMB, LIMB, LIMB, LIMB, LIMB, LIMB, LIMB, LIMB) {
    let b = [b0, b1, b2, b3];
    let mut t = [0 as LIMB; 8];
    for i in 0..NLIMBS {
        let mut carry = 0;
        for j in i + 1..NLIMBS {
            (t[i + j], carry) = mac(t[i + j], b[i], b[j], carry);
        }
        t[i + NLIMBS] = carry;
    }

    // the cross sum is below 2^511, so no bit is shifted out.
    let mut shifted_in = 0;
    for w in t.iter_mut() {
        let top = *w >> 63;
        *w = (*w << 1) | shifted_in;
        shifted_in = top;
    }

    let mut carry = false;
    for (i, bi) in b.iter().enumerate() {
        let (lo, hi) = mac(0, *bi, *bi, 0);
        (t[2 * i], carry) = adc(t[2 * i], lo, carry);
        (t[2 * i + 1], carry) = adc(t[2 * i + 1], hi, carry);
    }
    (t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7])
}

#[inline(always)]
pub fn add256(a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB, b0: LIMB, b1: LIMB, b2: LIMB, b3: LIMB) -> (LIMB, LIMB, LIMB, LIMB, bool) {
    let (r0, c) = adc(a0, b0, false);
    let (r1, c) = adc(a1, b1, c);
    let (r2, c) = adc(a2, b2, c);
    let (r3, c) = adc(a3, b3, c);
    (r0, r1, r2, r3, c)
}

#[inline(always)]
pub fn sub256(a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB, b0: LIMB, b1: LIMB, b2: LIMB, b3: LIMB) -> (LIMB, LIMB, LIMB, LIMB, bool) {
    let (r0, b) = sbb(a0, b0, false);
    let (r1, b) = sbb(a1, b1, b);
    let (r2, b) = sbb(a2, b2, b);
    let (r3, b) = sbb(a3, b3, b);
    (r0, r1, r2, r3, b)
}

/// (a + b) mod m for a, b < m.
#[inline(always)]
pub fn add256_mod(a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB, b0: LIMB, b1: LIMB, b2: LIMB, b3: LIMB, m0: LIMB, m1: LIMB, m2: LIMB, m3: LIMB) -> (LIMB, LIMB, LIMB, LIMB) {
    let (s0, s1, s2, s3, carry) = add256(a0, a1, a2, a3, b0, b1, b2, b3);
    sub256_conditional(s0, s1, s2, s3, carry as LIMB, m0, m1, m2, m3)
}

/// Given the 257-bit value carry:a below 2m, returns it reduced below m.
#[inline(always)]
pub fn sub256_conditional(a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB, carry: LIMB, m0: LIMB, m1: LIMB, m2: LIMB, m3: LIMB) -> (LIMB, LIMB, LIMB, LIMB) {
    let (d0, d1, d2, d3, borrow) = sub256(a0, a1, a2, a3, m0, m1, m2, m3);
    // a borrow out of the carry word means a < m: keep a.
    let (_, keep) = sbb(carry, 0, borrow);
    let keep = Choice::from(keep as u8);
    (
        LIMB::conditional_select(&d0, &a0, keep),
        LIMB::conditional_select(&d1, &a1, keep),
        LIMB::conditional_select(&d2, &a2, keep),
        LIMB::conditional_select(&d3, &a3, keep),
    )
}

/// Adds m back when `borrow` is set; undoes a subtraction that went negative.
#[inline(always)]
pub fn add256_conditional(a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB, borrow: bool, m0: LIMB, m1: LIMB, m2: LIMB, m3: LIMB) -> (LIMB, LIMB, LIMB, LIMB) {
    let mask = (borrow as LIMB).wrapping_neg();
    let (r0, r1, r2, r3, _) = add256(a0, a1, a2, a3, m0 & mask, m1 & mask, m2 & mask, m3 & mask);
    (r0, r1, r2, r3)
}

/// Word-by-word Montgomery reduction: t / 2^256 mod m for odd m and t < m*2^256.
/// m_inv is -m^-1 mod 2^64.
#[inline(always)]
pub fn montgomery_reduce_generic(t: [LIMB; 8], m: &[LIMB; NLIMBS], m_inv: LIMB) -> [LIMB; NLIMBS] {
    let mut t = t;
    // bit 512 carried between rounds.
    let mut overflow = false;
    for i in 0..NLIMBS {
        let q = t[i].wrapping_mul(m_inv);
        let mut carry = 0;
        for (j, mj) in m.iter().enumerate() {
            (t[i + j], carry) = mac(t[i + j], q, *mj, carry);
        }
        let (s, c1) = adc(t[i + NLIMBS], carry, overflow);
        t[i + NLIMBS] = s;
        overflow = c1;
    }
    let (r0, r1, r2, r3) = sub256_conditional(t[4], t[5], t[6], t[7], overflow as LIMB, m[0], m[1], m[2], m[3]);
    [r0, r1, r2, r3]
}

/// -m0^-1 mod 2^64 by Newton iteration; each step doubles the correct bits.
pub const fn mont_neg_inv(m0: LIMB) -> LIMB {
    let mut inv: LIMB = 1;
    let mut i = 0;
    while i < 6 {
        inv = inv.wrapping_mul(2u64.wrapping_sub(m0.wrapping_mul(inv)));
        i += 1;
    }
    inv.wrapping_neg()
}

#[inline]
pub fn limbs_from_be_bytes(b: &[u8; 32]) -> [LIMB; NLIMBS] {
    let mut out = [0; NLIMBS];
    for (limb, chunk) in out.iter_mut().rev().zip(b.chunks_exact(8)) {
        *limb = chunk.iter().fold(0, |acc, x| (acc << 8) | *x as LIMB);
    }
    out
}

#[inline]
pub fn limbs_to_be_bytes(a: &[LIMB; NLIMBS]) -> [u8; 32] {
    let mut out = [0; 32];
    for (chunk, limb) in out.chunks_exact_mut(8).zip(a.iter().rev()) {
        chunk.copy_from_slice(&limb.to_be_bytes());
    }
    out
}

#[inline(always)]
pub fn less_than256(a: &[LIMB; NLIMBS], b: &[LIMB; NLIMBS]) -> Choice {
    let (_, _, _, _, borrow) = sub256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
    Choice::from(borrow as u8)
}
