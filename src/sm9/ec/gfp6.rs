use super::gfp::GFpElement;
use super::gfp12::{W2_P, W2_P2};
use super::gfp2::GFp2;

// s^(2(p^2-1)), Montgomery form.
pub(crate) const S2_P2: GFpElement = GFpElement::from_mont([0x2f4981aa150a0eb3, 0x19c92815c28ded55, 0x39934d9cf7fd761b, 0x99cac18b7ca1dd5f]);

/// GF(p^6) = GF(p^2)[s]/(s^3 - u), holding x*s^2 + y*s + z.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GFp6 {
    pub x: GFp2,
    pub y: GFp2,
    pub z: GFp2,
}

impl GFp6 {
    pub const ZERO: GFp6 = GFp6 { x: GFp2::ZERO, y: GFp2::ZERO, z: GFp2::ZERO };
    pub const ONE: GFp6 = GFp6 { x: GFp2::ZERO, y: GFp2::ZERO, z: GFp2::ONE };

    pub const fn new(x: GFp2, y: GFp2, z: GFp2) -> Self {
        GFp6 { x, y, z }
    }

    /// Multiplies by s.
    pub fn mul_s(&self) -> Self {
        GFp6 { x: self.y, y: self.z, z: self.x.mul_u() }
    }

    pub fn mul_gfp2(&self, k: &GFp2) -> Self {
        GFp6 { x: self.x * *k, y: self.y * *k, z: self.z * *k }
    }

    pub fn mul_scalar(&self, k: &GFpElement) -> Self {
        GFp6 { x: self.x.mul_scalar(k), y: self.y.mul_scalar(k), z: self.z.mul_scalar(k) }
    }

    pub fn square(&self) -> Self {
        *self * *self
    }

    /// Zero maps to zero.
    pub fn invert(&self) -> Self {
        let (x, y, z) = (self.x, self.y, self.z);
        let a = z.square() - (x * y).mul_u();
        let b = x.square().mul_u() - y * z;
        let c = y.square() - x * z;
        let f = ((c * y).mul_u() + a * z + (b * x).mul_u()).invert();
        GFp6 { x: c * f, y: b * f, z: a * f }
    }

    pub fn frobenius(&self) -> Self {
        GFp6 {
            x: self.x.conj().mul_scalar(&W2_P2),
            y: self.y.conj().mul_scalar(&W2_P),
            z: self.z.conj(),
        }
    }

    pub fn frobenius_p2(&self) -> Self {
        GFp6 { x: self.x.mul_scalar(&S2_P2), y: self.y.mul_scalar(&W2_P2), z: self.z }
    }
}

impl core::ops::Add for GFp6 {
    type Output = GFp6;

    fn add(self, rhs: GFp6) -> GFp6 {
        GFp6 { x: self.x + rhs.x, y: self.y + rhs.y, z: self.z + rhs.z }
    }
}

impl core::ops::Sub for GFp6 {
    type Output = GFp6;

    fn sub(self, rhs: GFp6) -> GFp6 {
        GFp6 { x: self.x - rhs.x, y: self.y - rhs.y, z: self.z - rhs.z }
    }
}

impl core::ops::Neg for GFp6 {
    type Output = GFp6;

    fn neg(self) -> GFp6 {
        GFp6 { x: -self.x, y: -self.y, z: -self.z }
    }
}

impl core::ops::Mul for GFp6 {
    type Output = GFp6;

    fn mul(self, rhs: GFp6) -> GFp6 {
        let (ax, ay, az) = (self.x, self.y, self.z);
        let (bx, by, bz) = (rhs.x, rhs.y, rhs.z);
        let v0 = az * bz;
        let v1 = ay * by;
        let v2 = ax * bx;
        GFp6 {
            z: ((ay + ax) * (by + bx) - v1 - v2).mul_u() + v0,
            y: (az + ay) * (bz + by) - v0 - v1 + v2.mul_u(),
            x: (az + ax) * (bz + bx) - v0 + v1 - v2,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::super::gfp2::tests::random_fp2;
    use super::*;

    pub(crate) fn random_fp6() -> GFp6 {
        GFp6::new(random_fp2(), random_fp2(), random_fp2())
    }

    #[test]
    fn test_s_cubed() {
        let s = GFp6::new(GFp2::ZERO, GFp2::ONE, GFp2::ZERO);
        let u = GFp2::new(GFpElement::ONE, GFpElement::ZERO);
        assert_eq!(s * s * s, GFp6::new(GFp2::ZERO, GFp2::ZERO, u));
        assert_eq!(GFp6::ONE.mul_s(), s);
    }

    #[test]
    fn test_field_laws() {
        for _ in 0..20 {
            let (a, b, c) = (random_fp6(), random_fp6(), random_fp6());
            assert_eq!(a * b, b * a);
            assert_eq!((a * b) * c, a * (b * c));
            assert_eq!(a * (b + c), a * b + a * c);
            assert_eq!(a * a.invert(), GFp6::ONE);
            assert_eq!(a.mul_s(), a * GFp6::new(GFp2::ZERO, GFp2::ONE, GFp2::ZERO));
            assert_eq!(a.frobenius_p2(), a.frobenius().frobenius());
            assert_eq!((a * b).frobenius(), a.frobenius() * b.frobenius());
        }
    }
}
