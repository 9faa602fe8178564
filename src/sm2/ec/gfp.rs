use core::fmt::Display;

use subtle::{Choice, ConditionallyNegatable, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use super::arith::*;
use super::*;

// p = 2^256 - 2^224 - 2^96 + 2^64 - 1, little-endian limbs.
const P: [LIMB; 4] = [0xFFFFFFFFFFFFFFFF, 0xFFFFFFFF00000000, 0xFFFFFFFFFFFFFFFF, 0xFFFFFFFEFFFFFFFF];

// (p + 1) / 4
const SQRT_EXP: [LIMB; 4] = [0x4000000000000000, 0xffffffffc0000000, 0xffffffffffffffff, 0x3fffffffbfffffff];

/// An element of the SM2 base field in Montgomery form, aR mod p with R = 2^256.
/// The limbs are always kept in [0, p).
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq)]
pub struct GFpElement {
    pub limbs: [LIMB; 4],
}

/// Wraps raw limbs and moves them into the Montgomery domain.
impl From<[LIMB; 4]> for GFpElement {
    fn from(value: [LIMB; 4]) -> Self {
        let mut res = GFpElement { limbs: value };
        res.to_mont();
        res
    }
}

impl Display for GFpElement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let l = &self.limbs;
        write!(f, "[0x{:016x}, 0x{:016x}, 0x{:016x}, 0x{:016x}]", l[0], l[1], l[2], l[3])
    }
}

#[inline(always)]
fn add_mod(a: &[LIMB; 4], b: &[LIMB; 4]) -> [LIMB; 4] {
    let (s0, s1, s2, s3, carry) = add256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
    let (r0, r1, r2, r3) = sub256_conditional(s0, s1, s2, s3, carry as LIMB, P[0], P[1], P[2], P[3]);
    [r0, r1, r2, r3]
}

#[inline(always)]
fn sub_mod(a: &[LIMB; 4], b: &[LIMB; 4]) -> [LIMB; 4] {
    let (d0, d1, d2, d3, borrow) = sub256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
    let (r0, r1, r2, r3) = add256_conditional(d0, d1, d2, d3, borrow, P[0], P[1], P[2], P[3]);
    [r0, r1, r2, r3]
}

#[inline(always)]
fn mont_mul(a: &[LIMB; 4], b: &[LIMB; 4]) -> [LIMB; 4] {
    let t = mul256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
    let mut out = [0; 4];
    montgomery_reduce(&mut out, t.0, t.1, t.2, t.3, t.4, t.5, t.6, t.7);
    out
}

#[inline(always)]
fn mont_sqr(a: &[LIMB; 4]) -> [LIMB; 4] {
    let t = square256(a[0], a[1], a[2], a[3]);
    let mut out = [0; 4];
    montgomery_reduce(&mut out, t.0, t.1, t.2, t.3, t.4, t.5, t.6, t.7);
    out
}

// Owned counterparts of the in-place operations so that expressions can be chained:
// GFpElement::new_from_mul(&a, &b).square_move().invert_move()
macro_rules! owned_ops {
    ($($new:ident / $mv:ident => $op:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            #[inline]
            pub fn $new(a: &GFpElement $(, $arg: $ty)*) -> GFpElement {
                let mut out = *a;
                out.$op($($arg),*);
                out
            }

            #[inline]
            pub fn $mv(mut self $(, $arg: $ty)*) -> GFpElement {
                self.$op($($arg),*);
                self
            }
        )*
    };
}

impl GFpElement {
    pub const ZERO: GFpElement = GFpElement { limbs: [0; 4] };
    pub const ONE: GFpElement = GFpElement { limbs: [1, 0, 0, 0] };
    pub const PRIME: GFpElement = GFpElement { limbs: P };

    /// 1 in Montgomery form, R mod p.
    pub const R: GFpElement = GFpElement {
        limbs: [0x0000000000000001, 0x00000000ffffffff, 0x0000000000000000, 0x0000000100000000],
    };

    /// R^2 mod p, used to enter the Montgomery domain.
    pub const RR: GFpElement = GFpElement {
        limbs: [0x0000000200000003, 0x00000002ffffffff, 0x0000000100000001, 0x0000000400000002],
    };

    owned_ops! {
        new_from_add / add_move => add(b: &GFpElement);
        new_from_sub / sub_move => sub(b: &GFpElement);
        new_from_mul / mul_move => mul(b: &GFpElement);
        new_from_double / double_move => double();
        new_from_triple / triple_move => triple();
        new_from_square / square_move => square();
        new_from_square_n / square_n_move => square_n(n: usize);
        new_from_invert / invert_move => invert();
        new_from_neg / neg_move => neg();
    }

    /// Both 0 and the unreduced p count as zero.
    #[inline]
    pub fn is_zero(&self) -> Choice {
        is_zero256(&self.limbs) | constant_eq256(&self.limbs, &P)
    }

    /// Reads a canonical big-endian integer; None unless it is below p.
    pub fn from_be_bytes(b: &[u8; 32]) -> Option<GFpElement> {
        let limbs = limbs_from_be_bytes(b);
        if !bool::from(less_than256(&limbs, &P)) {
            return None;
        }
        Some(GFpElement::from(limbs))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        limbs_to_be_bytes(&self.canonical())
    }

    pub fn is_odd(&self) -> Choice {
        Choice::from((self.canonical()[0] & 1) as u8)
    }

    // a * R^-1, i.e. the plain integer behind the Montgomery form.
    #[inline]
    fn canonical(&self) -> [LIMB; 4] {
        let l = &self.limbs;
        let mut out = [0; 4];
        montgomery_reduce(&mut out, l[0], l[1], l[2], l[3], 0, 0, 0, 0);
        out
    }

    /// Subtracts p once if the limbs are not below it.
    #[inline]
    pub fn add_zero(&mut self) -> &mut Self {
        let l = self.limbs;
        let (r0, r1, r2, r3) = sub256_conditional(l[0], l[1], l[2], l[3], 0, P[0], P[1], P[2], P[3]);
        self.limbs = [r0, r1, r2, r3];
        self
    }

    #[inline]
    pub fn to_mont(&mut self) -> &mut Self {
        self.mul(&GFpElement::RR)
    }

    #[inline]
    pub fn from_mont(&mut self) -> &mut Self {
        self.limbs = self.canonical();
        self
    }

    #[inline]
    pub fn add(&mut self, b: &GFpElement) -> &mut Self {
        self.limbs = add_mod(&self.limbs, &b.limbs);
        self
    }

    #[inline]
    pub fn double(&mut self) -> &mut Self {
        self.limbs = add_mod(&self.limbs, &self.limbs);
        self
    }

    #[inline]
    pub fn triple(&mut self) -> &mut Self {
        let t = add_mod(&self.limbs, &self.limbs);
        self.limbs = add_mod(&t, &self.limbs);
        self
    }

    #[inline]
    pub fn sub(&mut self, b: &GFpElement) -> &mut Self {
        self.limbs = sub_mod(&self.limbs, &b.limbs);
        self
    }

    /// p - self, folded back to 0 when self is 0.
    #[inline]
    pub fn neg(&mut self) -> &mut Self {
        self.limbs = sub_mod(&P, &self.limbs);
        self.add_zero()
    }

    /// Montgomery product, valid while a*b < pR.
    #[inline]
    pub fn mul(&mut self, b: &GFpElement) -> &mut Self {
        self.limbs = mont_mul(&self.limbs, &b.limbs);
        self
    }

    #[inline]
    pub fn square(&mut self) -> &mut Self {
        self.limbs = mont_sqr(&self.limbs);
        self
    }

    #[inline]
    pub fn square_n(&mut self, n: usize) -> &mut Self {
        for _ in 0..n {
            self.limbs = mont_sqr(&self.limbs);
        }
        self
    }

    // Destination-style forms used by the point formulas.

    #[inline]
    pub fn from_add(&mut self, a: &GFpElement, b: &GFpElement) -> &mut Self {
        self.limbs = add_mod(&a.limbs, &b.limbs);
        self
    }

    #[inline]
    pub fn from_double(&mut self, a: &GFpElement) -> &mut Self {
        self.limbs = add_mod(&a.limbs, &a.limbs);
        self
    }

    #[inline]
    pub fn from_sub(&mut self, a: &GFpElement, b: &GFpElement) -> &mut Self {
        self.limbs = sub_mod(&a.limbs, &b.limbs);
        self
    }

    #[inline(always)]
    pub fn from_mul(&mut self, a: &GFpElement, b: &GFpElement) -> &mut Self {
        self.limbs = mont_mul(&a.limbs, &b.limbs);
        self
    }

    /// self^-1 = self^(p-2); zero maps to zero.
    #[inline]
    pub fn invert(&mut self) -> &mut Self {
        let x = *self;
        self.invert2().mul(&x)
    }

    /// self^-2 = self^(p-3) through a fixed addition chain.
    pub fn invert2(&mut self) -> &mut Self {
        let x = *self;
        let x2 = GFpElement::new_from_square(&x).mul_move(&x);
        let x3 = GFpElement::new_from_square(&x2).mul_move(&x);
        let x6 = GFpElement::new_from_square_n(&x3, 3).mul_move(&x3);
        let x6_0 = GFpElement::new_from_square(&x6);
        let x7 = GFpElement::new_from_mul(&x6_0, &x);
        let x12 = GFpElement::new_from_square_n(&x6_0, 5).mul_move(&x6);
        let x24 = GFpElement::new_from_square_n(&x12, 12).mul_move(&x12);
        let x31 = GFpElement::new_from_square_n(&x24, 7).mul_move(&x7);
        let t39 = GFpElement::new_from_square_n(&x31, 2);
        let t68 = GFpElement::new_from_square_n(&t39, 29);
        let x62 = GFpElement::new_from_mul(&t68, &x31);
        let t71 = GFpElement::new_from_square_n(&t68, 2);
        let x64 = GFpElement::new_from_mul(&t71, &t39).mul_move(&x2);
        let t265 = GFpElement::new_from_square_n(&t71, 32);
        self.from_mul(&t265, &x64).square_n(64).mul(&x64).square_n(94).mul(&x62).square_n(2)
    }

    /// Returns a square root of a, or None if a is a non-residue.
    /// p = 3 mod 4, so the candidate is a^((p+1)/4).
    pub fn sqrt(a: &GFpElement) -> Option<GFpElement> {
        let mut r = GFpElement::R;
        for i in (0..256).rev() {
            r.square();
            if (SQRT_EXP[i / 64] >> (i % 64)) & 1 == 1 {
                r.mul(a);
            }
        }
        let back = GFpElement::new_from_square(&r);
        bool::from(back.ct_eq(a)).then_some(r)
    }
}

// One word of Montgomery reduction: (a + a0*p) / 2^64.
// p = -1 mod 2^64 makes the quotient digit a0 itself, and the sparse shape of p
// turns a0*p into shifts. The sum stays below 2^256.
#[inline(always)]
pub fn montgomery_reduce_limb(a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB) -> (LIMB, LIMB, LIMB, LIMB) {
    let lo = a0 << 32;
    let hi = a0 >> 32;

    let (r1, c) = adc(a1, a0, false);
    let (r2, c) = adc(a2, 0, c);
    let (r3, c) = adc(a3, 0, c);
    let (r4, _) = adc(a0, 0, c);

    let (r1, b) = sbb(r1, lo, false);
    let (r2, b) = sbb(r2, hi, b);
    let (r3, b) = sbb(r3, lo, b);
    let (r4, _) = sbb(r4, hi, b);

    (r1, r2, r3, r4)
}

// a / 2^256 mod p for a < pR, result in [0, p).
#[inline(always)]
fn montgomery_reduce(out: &mut [LIMB; 4], a0: LIMB, a1: LIMB, a2: LIMB, a3: LIMB, a4: LIMB, a5: LIMB, a6: LIMB, a7: LIMB) {
    let mut t = (a0, a1, a2, a3);
    for _ in 0..4 {
        t = montgomery_reduce_limb(t.0, t.1, t.2, t.3);
    }
    (out[0], out[1], out[2], out[3]) = add256_mod(t.0, t.1, t.2, t.3, a4, a5, a6, a7, P[0], P[1], P[2], P[3]);
}

impl Zeroize for GFpElement {
    fn zeroize(&mut self) {
        self.limbs.zeroize();
    }
}

impl ConditionallySelectable for GFpElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        let mut limbs = a.limbs;
        for (l, r) in limbs.iter_mut().zip(b.limbs.iter()) {
            l.conditional_assign(r, choice);
        }
        GFpElement { limbs }
    }
}

impl ConditionallyNegatable for GFpElement {
    fn conditional_negate(&mut self, choice: Choice) {
        let neg = self.neg_move();
        self.conditional_assign(&neg, choice);
    }
}

impl ConstantTimeEq for GFpElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        constant_eq256(&self.limbs, &other.limbs)
    }
}
