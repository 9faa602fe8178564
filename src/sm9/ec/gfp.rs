use core::fmt::Display;

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use crate::sm2::ec::arith::*;
use crate::sm2::ec::LIMB;

/// p = 36u^4 + 36u^3 + 24u^2 + 6u + 1, u = 0x600000000058f98a.
pub(crate) const P: [LIMB; 4] = [0xe56f9b27e351457d, 0x21f2934b1a7aeedb, 0xd603ab4ff58ec745, 0xb640000002a3a6f1];
const P_MINUS_2: [LIMB; 4] = [0xe56f9b27e351457b, 0x21f2934b1a7aeedb, 0xd603ab4ff58ec745, 0xb640000002a3a6f1];
// (p-5)/8, p = 5 mod 8
const P_MINUS_5_OVER_8: [LIMB; 4] = [0x7cadf364fc6a28af, 0xa43e5269634f5ddb, 0x3ac07569feb1d8e8, 0x16c80000005474de];
// -p^{-1} mod 2^64
const P_INV: LIMB = mont_neg_inv(P[0]);
// 2^256 mod p
const R: [LIMB; 4] = [0x1a9064d81caeba83, 0xde0d6cb4e5851124, 0x29fc54b00a7138ba, 0x49bffffffd5c590e];
// 2^512 mod p
const RR: [LIMB; 4] = [0x27dea312b417e2d2, 0x88f8105fae1a5d3f, 0xe479b522d6706e7b, 0x2ea795a656f62fbd];

/// Element of GF(p) in Montgomery form, limbs in [0,p).
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GFpElement {
    pub(crate) limbs: [LIMB; 4],
}

impl Display for GFpElement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in self.to_be_bytes() {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[inline(always)]
fn reduce(t: (LIMB, LIMB, LIMB, LIMB, LIMB, LIMB, LIMB, LIMB)) -> [LIMB; 4] {
    montgomery_reduce_generic([t.0, t.1, t.2, t.3, t.4, t.5, t.6, t.7], &P, P_INV)
}

impl GFpElement {
    pub const ZERO: GFpElement = GFpElement { limbs: [0; 4] };
    pub const ONE: GFpElement = GFpElement { limbs: R };

    /// Wraps limbs that are already in the Montgomery domain.
    pub(crate) const fn from_mont(limbs: [LIMB; 4]) -> Self {
        GFpElement { limbs }
    }

    /// v must be below p, which holds for any u64.
    pub fn from_u64(v: u64) -> Self {
        let mut e = GFpElement { limbs: [v, 0, 0, 0] };
        e.mul(&GFpElement { limbs: RR });
        e
    }

    /// Parses a big-endian integer. Returns None unless it is below p.
    pub fn from_be_bytes(b: &[u8; 32]) -> Option<Self> {
        let limbs = limbs_from_be_bytes(b);
        if !bool::from(less_than256(&limbs, &P)) {
            return None;
        }
        let mut e = GFpElement { limbs };
        e.mul(&GFpElement { limbs: RR });
        Some(e)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let a = &self.limbs;
        limbs_to_be_bytes(&reduce((a[0], a[1], a[2], a[3], 0, 0, 0, 0)))
    }

    pub fn is_zero(&self) -> Choice {
        is_zero256(&self.limbs)
    }

    #[inline]
    pub fn add(&mut self, b: &GFpElement) -> &mut Self {
        let a = &self.limbs;
        let b = &b.limbs;
        let (acc0, acc1, acc2, acc3, carry) = add256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
        (self.limbs[0], self.limbs[1], self.limbs[2], self.limbs[3]) = sub256_conditional(acc0, acc1, acc2, acc3, carry as LIMB, P[0], P[1], P[2], P[3]);
        self
    }

    #[inline]
    pub fn double(&mut self) -> &mut Self {
        let b = *self;
        self.add(&b)
    }

    #[inline]
    pub fn sub(&mut self, b: &GFpElement) -> &mut Self {
        let a = &self.limbs;
        let b = &b.limbs;
        let (t0, t1, t2, t3, borrow) = sub256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]);
        (self.limbs[0], self.limbs[1], self.limbs[2], self.limbs[3]) = add256_conditional(t0, t1, t2, t3, borrow, P[0], P[1], P[2], P[3]);
        self
    }

    #[inline]
    pub fn neg(&mut self) -> &mut Self {
        let a = self.limbs;
        self.limbs = [0; 4];
        self.sub(&GFpElement { limbs: a })
    }

    #[inline]
    pub fn mul(&mut self, b: &GFpElement) -> &mut Self {
        let a = &self.limbs;
        let b = &b.limbs;
        self.limbs = reduce(mul256(a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]));
        self
    }

    #[inline]
    pub fn square(&mut self) -> &mut Self {
        let a = &self.limbs;
        self.limbs = reduce(square256(a[0], a[1], a[2], a[3]));
        self
    }

    /// self = self^e for a public exponent e.
    fn pow(&mut self, e: &[LIMB; 4]) -> &mut Self {
        let a = *self;
        *self = GFpElement::ONE;
        for i in (0..256).rev() {
            self.square();
            if (e[i / 64] >> (i % 64)) & 1 == 1 {
                self.mul(&a);
            }
        }
        self
    }

    /// self = self^(p-2). Zero maps to zero.
    pub fn invert(&mut self) -> &mut Self {
        self.pow(&P_MINUS_2)
    }

    /// Square root by Atkin's method, None for non-residues.
    pub fn sqrt(&self) -> Option<GFpElement> {
        let a2 = self.double_move();
        let mut b = a2;
        b.pow(&P_MINUS_5_OVER_8);
        // i = 2ab^2 is a square root of -1
        let i = a2 * b.square_move();
        let x = *self * b * (i - GFpElement::ONE);
        match x.square_move() == *self {
            true => Some(x),
            false => None,
        }
    }

    /// Parity of the canonical value.
    pub fn is_odd(&self) -> Choice {
        Choice::from(self.to_be_bytes()[31] & 1)
    }

    pub fn invert_move(mut self) -> Self {
        self.invert();
        self
    }

    pub fn square_move(mut self) -> Self {
        self.square();
        self
    }

    pub fn double_move(mut self) -> Self {
        self.double();
        self
    }
}

impl core::ops::Add for GFpElement {
    type Output = GFpElement;

    #[inline]
    fn add(mut self, rhs: GFpElement) -> GFpElement {
        GFpElement::add(&mut self, &rhs);
        self
    }
}

impl core::ops::Sub for GFpElement {
    type Output = GFpElement;

    #[inline]
    fn sub(mut self, rhs: GFpElement) -> GFpElement {
        GFpElement::sub(&mut self, &rhs);
        self
    }
}

impl core::ops::Mul for GFpElement {
    type Output = GFpElement;

    #[inline]
    fn mul(mut self, rhs: GFpElement) -> GFpElement {
        GFpElement::mul(&mut self, &rhs);
        self
    }
}

impl core::ops::Neg for GFpElement {
    type Output = GFpElement;

    #[inline]
    fn neg(mut self) -> GFpElement {
        GFpElement::neg(&mut self);
        self
    }
}

impl Zeroize for GFpElement {
    fn zeroize(&mut self) {
        self.limbs.zeroize();
    }
}

impl ConditionallySelectable for GFpElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        GFpElement {
            limbs: [
                LIMB::conditional_select(&a.limbs[0], &b.limbs[0], choice),
                LIMB::conditional_select(&a.limbs[1], &b.limbs[1], choice),
                LIMB::conditional_select(&a.limbs[2], &b.limbs[2], choice),
                LIMB::conditional_select(&a.limbs[3], &b.limbs[3], choice),
            ],
        }
    }
}

impl ConstantTimeEq for GFpElement {
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

    fn prime() -> BigUint {
        BigUint::from_bytes_be(&hex!("B640000002A3A6F1D603AB4FF58EC74521F2934B1A7AEEDBE56F9B27E351457D"))
    }

    fn random() -> (GFpElement, BigUint) {
        let mut b: [u8; 32] = rand::rng().random();
        b[0] &= 0x7f;
        (GFpElement::from_be_bytes(&b).unwrap(), BigUint::from_bytes_be(&b))
    }

    fn to_big(a: &GFpElement) -> BigUint {
        BigUint::from_bytes_be(&a.to_be_bytes())
    }

    #[test]
    fn test_constants() {
        assert_eq!(P_INV, 0x892bc42c2f2ee42b);
        assert_eq!(to_big(&GFpElement::ONE), BigUint::from(1u32));
        assert_eq!(GFpElement::from_u64(5).to_be_bytes()[31], 5);
        let p = limbs_to_be_bytes(&P);
        assert!(GFpElement::from_be_bytes(&p).is_none());
    }

    #[test]
    fn test_arith() {
        let p = prime();
        for _ in 0..200 {
            let (a, ab) = random();
            let (b, bb) = random();
            assert_eq!(to_big(&(a + b)), (&ab + &bb) % &p);
            assert_eq!(to_big(&(a - b)), (&ab + &p - &bb) % &p);
            assert_eq!(to_big(&(a * b)), (&ab * &bb) % &p);
            assert_eq!(to_big(&a.square_move()), (&ab * &ab) % &p);
            assert_eq!(to_big(&(-a)), (&p - &ab) % &p);
            assert_eq!(a.invert_move() * a, GFpElement::ONE);
        }
    }

    #[test]
    fn test_edge_cases() {
        let zero = GFpElement::ZERO;
        assert_eq!(-zero, zero);
        assert_eq!(zero.invert_move(), zero);
        let minus_one = -GFpElement::ONE;
        assert_eq!(minus_one * minus_one, GFpElement::ONE);
        assert_eq!(minus_one + GFpElement::ONE, zero);
        assert!(bool::from((minus_one + GFpElement::ONE).is_zero()));
    }

    #[test]
    fn test_sqrt() {
        for _ in 0..20 {
            let (a, _) = random();
            let sq = a.square_move();
            let r = sq.sqrt().unwrap();
            assert!(r == a || r == -a);
        }
        // -1 is a square since p = 1 mod 4, 5 is not.
        assert!((-GFpElement::ONE).sqrt().is_some());
        assert!(GFpElement::from_u64(5).sqrt().is_none());
        assert_eq!(GFpElement::ZERO.sqrt(), Some(GFpElement::ZERO));
        assert!(bool::from(GFpElement::ONE.is_odd()));
        assert!(!bool::from(GFpElement::from_u64(2).is_odd()));
    }
}
