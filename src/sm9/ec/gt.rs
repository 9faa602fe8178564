use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use crate::sm9::error::{Result, SM9Error};

use super::gfn::GFnElement;
use super::gfp12::GFp12;

/// Element of the order-n subgroup of GF(p^12)*, written multiplicatively.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GT(pub(crate) GFp12);

impl GT {
    pub const ONE: GT = GT(GFp12::ONE);

    pub fn is_one(&self) -> Choice {
        self.0.ct_eq(&GFp12::ONE)
    }

    /// self^k with a fixed 4-bit window, constant time in k.
    pub fn pow(&self, k: &GFnElement) -> GT {
        let mut table = [GFp12::ONE; 16];
        for j in 1..16 {
            table[j] = table[j - 1] * self.0;
        }
        let mut acc = GFp12::ONE;
        for b in k.to_be_bytes() {
            for nibble in [b >> 4, b & 0x0f] {
                acc = acc.square().square().square().square();
                let mut t = GFp12::ONE;
                for (j, e) in table.iter().enumerate() {
                    t.conditional_assign(e, (j as u8).ct_eq(&nibble));
                }
                acc = acc * t;
            }
        }
        GT(acc)
    }

    /// The inverse; for unitary elements this is the conjugate.
    pub fn invert(&self) -> GT {
        GT(self.0.conj())
    }

    /// All twelve coordinates, never compressed.
    pub fn to_bytes(&self) -> [u8; 384] {
        self.0.to_be_bytes()
    }

    pub fn from_bytes(b: &[u8]) -> Result<GT> {
        let b: &[u8; 384] = b.try_into().map_err(|_| SM9Error::InvalidLength)?;
        GFp12::from_be_bytes(b).map(GT).ok_or(SM9Error::InvalidEncoding)
    }
}

impl core::ops::Mul for GT {
    type Output = GT;

    fn mul(self, rhs: GT) -> GT {
        GT(self.0 * rhs.0)
    }
}

impl Zeroize for GT {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl ConditionallySelectable for GT {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        GT(GFp12::conditional_select(&a.0, &b.0, choice))
    }
}

impl ConstantTimeEq for GT {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::g1::G1;
    use super::super::g2::G2;
    use super::super::pairing::pairing;
    use super::*;

    #[test]
    fn test_pow() {
        let g = pairing(&G1::GENERATOR, &G2::GENERATOR);
        assert!(bool::from(g.pow(&GFnElement::N).is_one()));
        assert!(bool::from(g.pow(&GFnElement::ZERO).is_one()));
        assert_eq!(g.pow(&GFnElement::ONE), g);
        assert_eq!(g.pow(&GFnElement::from_u64(3)), g * g * g);
        assert_eq!(g.pow(&GFnElement::ONE.neg_move()), g.invert());
        assert!(bool::from((g * g.invert()).is_one()));

        let a = GFnElement::from_u64(0x1234_5678_9abc);
        let b = GFnElement::from_u64(0xfedc_ba98);
        assert_eq!(g.pow(&a).pow(&b), g.pow(&GFnElement::mul_plain(&a, &b)));
    }

    #[test]
    fn test_bytes() {
        let g = pairing(&G1::GENERATOR, &G2::GENERATOR);
        let b = g.to_bytes();
        assert_eq!(GT::from_bytes(&b).unwrap(), g);
        assert_eq!(GT::from_bytes(&b[1..]).unwrap_err(), SM9Error::InvalidLength);
        assert_eq!(GT::from_bytes(&[0xff; 384]).unwrap_err(), SM9Error::InvalidEncoding);
    }
}
