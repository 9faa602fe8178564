use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};

use super::gfp::GFpElement;
use super::{arith::*, *};

// n, the order of the base point.
const N: [LIMB; 4] = [0x53bbf40939d54123, 0x7203df6b21c6052b, 0xffffffffffffffff, 0xfffffffeffffffff];

// -n^-1 mod 2^64
const N_INV: LIMB = mont_neg_inv(N[0]);

/// A scalar modulo n, kept as a plain integer in [0, n).
///
/// Multiplication and inversion go through the Montgomery domain internally;
/// see [`GFnElement::mul_plain`] and [`GFnElement::invert_plain`].
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub struct GFnElement {
    pub limbs: [LIMB; 4],
}

/// Reduces any 256-bit big-endian value into [0, n). A single subtraction
/// suffices since 2^256 < 2n.
impl From<&[u8; 32]> for GFnElement {
    fn from(v: &[u8; 32]) -> Self {
        let mut res = GFnElement { limbs: limbs_from_be_bytes(v) };
        res.add_zero();
        res
    }
}

/// The integer value of a base field element, reduced mod n.
impl From<&GFpElement> for GFnElement {
    fn from(v: &GFpElement) -> Self {
        let mut t = *v;
        t.from_mont();
        let mut res = GFnElement { limbs: t.limbs };
        res.add_zero();
        res
    }
}

#[inline(always)]
fn mont_mul(a: &[LIMB; 4], b: &[LIMB; 4]) -> [LIMB; 4] {
    let (t0, t1, t2, t3, t4, t5, t6, t7) = mul256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
    montgomery_reduce_generic([t0, t1, t2, t3, t4, t5, t6, t7], &N, N_INV)
}

#[inline(always)]
fn mont_sqr_n(a: &[LIMB; 4], n: usize) -> [LIMB; 4] {
    let mut out = *a;
    for _ in 0..n {
        let (t0, t1, t2, t3, t4, t5, t6, t7) = square256(out[0], out[1], out[2], out[3]);
        out = montgomery_reduce_generic([t0, t1, t2, t3, t4, t5, t6, t7], &N, N_INV);
    }
    out
}

// x^(n-2) for x in Montgomery form. The chain starts from a fixed head and
// then alternates "square k times, multiply by a small power of x".
fn mont_invert(x: &[LIMB; 4]) -> [LIMB; 4] {
    let x10 = mont_sqr_n(x, 1);
    let x11 = mont_mul(&x10, x);
    let x100 = mont_mul(&x11, x);
    let x101 = mont_mul(&x100, x);
    let x111 = mont_mul(&x10, &x101);
    let x1001 = mont_mul(&x10, &x111);
    let x1101 = mont_mul(&x1001, &x100);
    let x1111 = mont_mul(&x10, &x1101);
    let x11111 = mont_mul(&mont_sqr_n(&x1111, 1), x);
    let x111111 = mont_mul(&mont_sqr_n(&x11111, 1), x);
    let x1111110 = mont_sqr_n(&x111111, 1);

    let i20 = mont_mul(&mont_sqr_n(&x1111110, 6), &x1111110);
    let x18 = mont_mul(&mont_sqr_n(&i20, 5), &x111111);
    let x31 = mont_mul(&mont_mul(&mont_sqr_n(&x18, 13), &i20), x);
    let i42 = mont_sqr_n(&x31, 1);
    let i44 = mont_sqr_n(&i42, 2);
    let i140 = mont_sqr_n(&mont_mul(&mont_sqr_n(&mont_mul(&mont_sqr_n(&i44, 32), &i44), 29), &i42), 33);
    let mut acc = mont_mul(&mont_mul(&i44, &i140), &x111);

    let table = [*x, x11, x101, x111, x1001, x1101, x1111, x11111, x111111];
    const TAIL: [(usize, usize); 24] = [
        (4, 3), (3, 0), (11, 6), (6, 7), (5, 5), (3, 1), (3, 0), (7, 3),
        (5, 1), (9, 2), (5, 2), (5, 5), (5, 4), (4, 5), (2, 1), (7, 8),
        (2, 0), (10, 4), (5, 3), (5, 3), (4, 2), (4, 2), (9, 4), (5, 0),
    ];
    for (k, i) in TAIL {
        acc = mont_mul(&mont_sqr_n(&acc, k), &table[i]);
    }
    acc
}

impl GFnElement {
    pub const N: GFnElement = GFnElement { limbs: N };
    pub const ZERO: GFnElement = GFnElement { limbs: [0; 4] };
    pub const ONE: GFnElement = GFnElement { limbs: [1, 0, 0, 0] };

    /// 2^256 mod n
    pub const R: GFnElement = GFnElement {
        limbs: [0xac440bf6c62abedd, 0x8dfc2094de39fad4, 0, 0x100000000],
    };
    /// 2^512 mod n
    pub const RR: GFnElement = GFnElement {
        limbs: [0x901192af7c114f20, 0x3464504ade6fa2fa, 0x620fc84c3affe0d4, 0x1eb5e412a22b3d3b],
    };

    /// Parses a big-endian integer, requiring it to be in [0,n).
    pub fn from_be_bytes_checked(b: &[u8; 32]) -> Option<GFnElement> {
        let limbs = limbs_from_be_bytes(b);
        bool::from(less_than256(&limbs, &N)).then_some(GFnElement { limbs })
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        limbs_to_be_bytes(&self.limbs)
    }

    #[inline]
    pub fn is_zero(&self) -> Choice {
        is_zero256(&self.limbs)
    }

    /// Subtracts n once if the limbs are not below it.
    #[inline]
    pub fn add_zero(&mut self) -> &mut Self {
        let l = self.limbs;
        let (r0, r1, r2, r3) = sub256_conditional(l[0], l[1], l[2], l[3], 0, N[0], N[1], N[2], N[3]);
        self.limbs = [r0, r1, r2, r3];
        self
    }

    #[inline]
    pub fn add(&mut self, b: &GFnElement) -> &mut Self {
        let (a, b) = (&self.limbs, &b.limbs);
        let (s0, s1, s2, s3, carry) = add256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
        let (r0, r1, r2, r3) = sub256_conditional(s0, s1, s2, s3, carry as LIMB, N[0], N[1], N[2], N[3]);
        self.limbs = [r0, r1, r2, r3];
        self
    }

    #[inline]
    pub fn sub(&mut self, b: &GFnElement) -> &mut Self {
        let (a, b) = (&self.limbs, &b.limbs);
        let (d0, d1, d2, d3, borrow) = sub256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
        let (r0, r1, r2, r3) = add256_conditional(d0, d1, d2, d3, borrow, N[0], N[1], N[2], N[3]);
        self.limbs = [r0, r1, r2, r3];
        self
    }

    /// n - self, with 0 staying 0.
    #[inline]
    pub fn neg(&mut self) -> &mut Self {
        let b = self.limbs;
        let (r0, r1, r2, r3, _) = sub256(N[0], N[1], N[2], N[3], b[0], b[1], b[2], b[3]);
        self.limbs = [r0, r1, r2, r3];
        self.add_zero()
    }

    #[inline]
    pub fn new_from_add(a: &GFnElement, b: &GFnElement) -> GFnElement {
        let mut out = *a;
        out.add(b);
        out
    }

    #[inline]
    pub fn add_move(mut self, b: &GFnElement) -> Self {
        self.add(b);
        self
    }

    #[inline]
    pub fn sub_move(mut self, b: &GFnElement) -> Self {
        self.sub(b);
        self
    }

    #[inline]
    pub fn neg_move(mut self) -> Self {
        self.neg();
        self
    }

    /// a*b mod n. (a*b/R)*R^2/R = a*b.
    pub fn mul_plain(a: &GFnElement, b: &GFnElement) -> GFnElement {
        let t = mont_mul(&a.limbs, &b.limbs);
        GFnElement { limbs: mont_mul(&t, &Self::RR.limbs) }
    }

    /// a^-1 mod n; zero maps to zero.
    pub fn invert_plain(a: &GFnElement) -> GFnElement {
        let am = mont_mul(&a.limbs, &Self::RR.limbs);
        let inv = mont_invert(&am);
        GFnElement { limbs: mont_mul(&inv, &[1, 0, 0, 0]) }
    }
}

impl ConditionallySelectable for GFnElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut limbs = a.limbs;
        for (l, r) in limbs.iter_mut().zip(b.limbs.iter()) {
            l.conditional_assign(r, choice);
        }
        GFnElement { limbs }
    }
}

impl ConstantTimeEq for GFnElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        constant_eq256(&self.limbs, &other.limbs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use num::BigUint;
    use rand::Rng;

    fn order() -> BigUint {
        BigUint::from_bytes_be(&hex!("fffffffeffffffffffffffffffffffff7203df6b21c6052b53bbf40939d54123"))
    }

    fn big(limbs: &[u64]) -> BigUint {
        limbs.iter().rev().fold(BigUint::default(), |acc, l| (acc << 64usize) + *l)
    }

    fn sample() -> GFnElement {
        let mut rng = rand::rng();
        let mut e = GFnElement { limbs: [rng.random(), rng.random(), rng.random(), rng.random()] };
        e.add_zero();
        e
    }

    #[test]
    fn test_constants() {
        let r = BigUint::from(1u8) << 256usize;
        assert_eq!(big(&GFnElement::N.limbs), order());
        assert_eq!(big(&GFnElement::R.limbs), &r % order());
        assert_eq!(big(&GFnElement::RR.limbs), &r * &r % order());
        assert_eq!(N[0].wrapping_mul(N_INV), u64::MAX);
    }

    #[test]
    fn test_mul() {
        let n = order();
        let rinv = big(&GFnElement::R.limbs).modinv(&n).unwrap();
        for _ in 0..5000 {
            let (a, b) = (sample(), sample());
            assert_eq!(big(&mont_mul(&a.limbs, &b.limbs)), big(&a.limbs) * big(&b.limbs) * &rinv % &n);
            let p = GFnElement::mul_plain(&a, &b);
            assert_eq!(big(&p.limbs), big(&a.limbs) * big(&b.limbs) % &n);
        }
    }

    #[test]
    fn test_invert() {
        for _ in 0..200 {
            let a = sample();
            let am = mont_mul(&a.limbs, &GFnElement::RR.limbs);
            assert_eq!(mont_mul(&mont_invert(&am), &am), GFnElement::R.limbs);

            let inv = GFnElement::invert_plain(&a);
            assert_eq!(GFnElement::mul_plain(&inv, &a), GFnElement::ONE);
        }
        assert_eq!(GFnElement::invert_plain(&GFnElement::ZERO), GFnElement::ZERO);
    }

    #[test]
    fn test_sub_neg() {
        for _ in 0..1000 {
            let (a, b) = (sample(), sample());
            assert_eq!(a.sub_move(&b).add_move(&b), a);
            assert_eq!(a.neg_move().add_move(&a), GFnElement::ZERO);
        }
        assert_eq!(GFnElement::ZERO.neg_move(), GFnElement::ZERO);
    }

    #[test]
    fn test_bytes() {
        let n = GFnElement::N.to_be_bytes();
        assert!(GFnElement::from_be_bytes_checked(&n).is_none());
        assert!(bool::from(GFnElement::from(&n).is_zero()));
        let mut one = [0u8; 32];
        one[31] = 1;
        assert_eq!(GFnElement::from_be_bytes_checked(&one).unwrap(), GFnElement::ONE);
        assert_eq!(GFnElement::ONE.to_be_bytes(), one);
        assert_eq!(GFnElement::from(&GFpElement::R), GFnElement::ONE);
    }
}
