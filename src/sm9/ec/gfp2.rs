use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use super::gfp::GFpElement;

/// GF(p^2) = GF(p)[u]/(u^2 + 2), holding x*u + y.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GFp2 {
    pub x: GFpElement,
    pub y: GFpElement,
}

impl GFp2 {
    pub const ZERO: GFp2 = GFp2 { x: GFpElement::ZERO, y: GFpElement::ZERO };
    pub const ONE: GFp2 = GFp2 { x: GFpElement::ZERO, y: GFpElement::ONE };

    pub const fn new(x: GFpElement, y: GFpElement) -> Self {
        GFp2 { x, y }
    }

    /// Big-endian x || y.
    pub fn from_be_bytes(b: &[u8; 64]) -> Option<Self> {
        let (hi, lo) = b.split_at(32);
        let x = GFpElement::from_be_bytes(hi.try_into().ok()?)?;
        let y = GFpElement::from_be_bytes(lo.try_into().ok()?)?;
        Some(GFp2 { x, y })
    }

    pub fn to_be_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.x.to_be_bytes());
        out[32..].copy_from_slice(&self.y.to_be_bytes());
        out
    }

    pub fn is_zero(&self) -> Choice {
        self.x.is_zero() & self.y.is_zero()
    }

    pub fn is_one(&self) -> bool {
        *self == GFp2::ONE
    }

    pub fn double(&self) -> Self {
        *self + *self
    }

    pub fn triple(&self) -> Self {
        *self + *self + *self
    }

    /// x*u + y -> -x*u + y, the p-power Frobenius.
    pub fn conj(&self) -> Self {
        GFp2 { x: -self.x, y: self.y }
    }

    /// Multiplies by u.
    pub fn mul_u(&self) -> Self {
        GFp2 { x: self.y, y: -self.x.double_move() }
    }

    pub fn mul_scalar(&self, k: &GFpElement) -> Self {
        GFp2 { x: self.x * *k, y: self.y * *k }
    }

    pub fn square(&self) -> Self {
        // (xu + y)^2 = 2xy*u + y^2 - 2x^2
        let xy = self.x * self.y;
        let t = (self.y + self.x) * (self.y - self.x.double_move());
        GFp2 { x: xy.double_move(), y: t + xy }
    }

    /// Zero maps to zero.
    pub fn invert(&self) -> Self {
        let t = (self.x.square_move().double_move() + self.y.square_move()).invert_move();
        GFp2 { x: -(self.x * t), y: self.y * t }
    }
}

impl core::ops::Add for GFp2 {
    type Output = GFp2;

    fn add(self, rhs: GFp2) -> GFp2 {
        GFp2 { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl core::ops::Sub for GFp2 {
    type Output = GFp2;

    fn sub(self, rhs: GFp2) -> GFp2 {
        GFp2 { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl core::ops::Neg for GFp2 {
    type Output = GFp2;

    fn neg(self) -> GFp2 {
        GFp2 { x: -self.x, y: -self.y }
    }
}

impl core::ops::Mul for GFp2 {
    type Output = GFp2;

    /// Karatsuba: three base multiplications.
    fn mul(self, rhs: GFp2) -> GFp2 {
        let v0 = self.y * rhs.y;
        let v1 = self.x * rhs.x;
        let x = (self.x + self.y) * (rhs.x + rhs.y) - v0 - v1;
        GFp2 { x, y: v0 - v1.double_move() }
    }
}

impl Zeroize for GFp2 {
    fn zeroize(&mut self) {
        self.x.zeroize();
        self.y.zeroize();
    }
}

impl ConditionallySelectable for GFp2 {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        GFp2 {
            x: GFpElement::conditional_select(&a.x, &b.x, choice),
            y: GFpElement::conditional_select(&a.y, &b.y, choice),
        }
    }
}

impl ConstantTimeEq for GFp2 {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.x.ct_eq(&other.x) & self.y.ct_eq(&other.y)
    }
}
