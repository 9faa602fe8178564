use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use super::gfp::GFpElement;
use super::gfp2::GFp2;

/// GF(p^4) = GF(p^2)[v]/(v^2 - u), holding x*v + y.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GFp4 {
    pub x: GFp2,
    pub y: GFp2,
}

impl GFp4 {
    pub const ZERO: GFp4 = GFp4 { x: GFp2::ZERO, y: GFp2::ZERO };
    pub const ONE: GFp4 = GFp4 { x: GFp2::ZERO, y: GFp2::ONE };

    pub const fn new(x: GFp2, y: GFp2) -> Self {
        GFp4 { x, y }
    }

    pub fn is_zero(&self) -> Choice {
        self.x.is_zero() & self.y.is_zero()
    }

    pub fn double(&self) -> Self {
        *self + *self
    }

    pub fn triple(&self) -> Self {
        *self + *self + *self
    }

    /// x*v + y -> -x*v + y.
    pub fn conj(&self) -> Self {
        GFp4 { x: -self.x, y: self.y }
    }

    /// Conjugates both GF(p^2) coefficients, the p-power map without
    /// the v^(p-1) twist.
    pub fn conj_coeffs(&self) -> Self {
        GFp4 { x: self.x.conj(), y: self.y.conj() }
    }

    /// Multiplies by v.
    pub fn mul_v(&self) -> Self {
        GFp4 { x: self.y, y: self.x.mul_u() }
    }

    pub fn mul_gfp2(&self, k: &GFp2) -> Self {
        GFp4 { x: self.x * *k, y: self.y * *k }
    }

    pub fn mul_scalar(&self, k: &GFpElement) -> Self {
        GFp4 { x: self.x.mul_scalar(k), y: self.y.mul_scalar(k) }
    }

    pub fn square(&self) -> Self {
        let v0 = self.y.square();
        let v1 = self.x.square();
        let x = (self.x + self.y).square() - v0 - v1;
        GFp4 { x, y: v1.mul_u() + v0 }
    }

    /// Zero maps to zero.
    pub fn invert(&self) -> Self {
        // (xv + y)(xv - y) = x^2*u - y^2
        let t = (self.x.mul_u() * self.x - self.y.square()).invert();
        GFp4 { x: self.x * t, y: -(self.y * t) }
    }
}

impl core::ops::Add for GFp4 {
    type Output = GFp4;

    fn add(self, rhs: GFp4) -> GFp4 {
        GFp4 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl core::ops::Sub for GFp4 {
    type Output = GFp4;

    fn sub(self, rhs: GFp4) -> GFp4 {
        GFp4 { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl core::ops::Neg for GFp4 {
    type Output = GFp4;

    fn neg(self) -> GFp4 {
        GFp4 { x: -self.x, y: -self.y }
    }
}

impl core::ops::Mul for GFp4 {
    type Output = GFp4;

    fn mul(self, rhs: GFp4) -> GFp4 {
        let v0 = self.y * rhs.y;
        let v1 = self.x * rhs.x;
        let x = (self.x + self.y) * (rhs.x + rhs.y) - v0 - v1;
        GFp4 { x, y: v1.mul_u() + v0 }
    }
}

impl Zeroize for GFp4 {
    fn zeroize(&mut self) {
        self.x.zeroize();
        self.y.zeroize();
    }
}

impl ConditionallySelectable for GFp4 {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        GFp4 {
            x: GFp2::conditional_select(&a.x, &b.x, choice),
            y: GFp2::conditional_select(&a.y, &b.y, choice),
        }
    }
}

impl ConstantTimeEq for GFp4 {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.x.ct_eq(&other.x) & self.y.ct_eq(&other.y)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::gfp2::tests::random_fp2;
    use super::*;

    pub(crate) fn random_fp4() -> GFp4 {
        GFp4::new(random_fp2(), random_fp2())
    }

    #[test]
    fn test_v_squared() {
        let v = GFp4::new(GFp2::ONE, GFp2::ZERO);
        let u = GFp2::new(GFpElement::ONE, GFpElement::ZERO);
        assert_eq!(v * v, GFp4::new(GFp2::ZERO, u));
        assert_eq!(GFp4::ONE.mul_v(), v);
    }

    #[test]
    fn test_field_laws() {
        for _ in 0..50 {
            let (a, b, c) = (random_fp4(), random_fp4(), random_fp4());
            assert_eq!(a * b, b * a);
            assert_eq!((a * b) * c, a * (b * c));
            assert_eq!(a * (b - c), a * b - a * c);
            assert_eq!(a.square(), a * a);
            assert_eq!(a * a.invert(), GFp4::ONE);
            assert_eq!(a.mul_v(), a * GFp4::new(GFp2::ONE, GFp2::ZERO));
            let k = random_fp2();
            assert_eq!(a.mul_gfp2(&k), a * GFp4::new(GFp2::ZERO, k));
        }
    }
}
