use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

use super::gfp::GFpElement;
use super::gfp2::GFp2;
use super::gfp4::GFp4;

// Frobenius coefficients, Montgomery form.
// w^(p-1)
pub(crate) const FROB_W: GFpElement = GFpElement::from_mont([0x1a98dfbd4575299f, 0x9ec8547b245c54fd, 0xf51f5eac13df846c, 0x9ef74015d5a16393]);
// v^(p-1)
pub(crate) const FROB_V: GFpElement = GFpElement::from_mont([0x39b4ef0f3ee72529, 0xdb043bf508582782, 0xb8554ab054ac91e3, 0x9848eec25498cab5]);
// w^(2(p-1)) = w^(p^2-1)
pub(crate) const W2_P: GFpElement = GFpElement::from_mont([0xb626197dce4736ca, 0x08296b3557ed0186, 0x9c705db2fd91512a, 0x1c753e748601c992]);
// w^(2(p^2-1))
pub(crate) const W2_P2: GFpElement = GFpElement::from_mont([0x81054fcd94e9c1c4, 0x4c0e91cb8ce2df3e, 0x4877b452e8aedfb4, 0x88f53e748b491776]);
// v^(p-1) * w^(2(p-1))
pub(crate) const V_W2_P: GFpElement = GFpElement::from_mont([0x048baa79dcc34107, 0x5e2e7ac4fe76c161, 0x99399754365bd4bc, 0xaf91aeac819b0e13]);

/// GF(p^12) = GF(p^4)[w]/(w^3 - v), holding x*w^2 + y*w + z.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GFp12 {
    pub x: GFp4,
    pub y: GFp4,
    pub z: GFp4,
}

impl GFp12 {
    pub const ZERO: GFp12 = GFp12 { x: GFp4::ZERO, y: GFp4::ZERO, z: GFp4::ZERO };
    pub const ONE: GFp12 = GFp12 { x: GFp4::ZERO, y: GFp4::ZERO, z: GFp4::ONE };

    pub const fn new(x: GFp4, y: GFp4, z: GFp4) -> Self {
        GFp12 { x, y, z }
    }

    fn coefficients(&self) -> [&GFp2; 6] {
        [&self.x.x, &self.x.y, &self.y.x, &self.y.y, &self.z.x, &self.z.y]
    }

    /// Twelve big-endian coordinates, from x.x.x down to z.y.y.
    pub fn to_be_bytes(&self) -> [u8; 384] {
        let mut out = [0u8; 384];
        for (chunk, c) in out.chunks_exact_mut(64).zip(self.coefficients()) {
            chunk.copy_from_slice(&c.to_be_bytes());
        }
        out
    }

    pub fn from_be_bytes(b: &[u8; 384]) -> Option<Self> {
        let mut c = [GFp2::ZERO; 6];
        for (slot, chunk) in c.iter_mut().zip(b.chunks_exact(64)) {
            *slot = GFp2::from_be_bytes(chunk.try_into().ok()?)?;
        }
        Some(GFp12 { x: GFp4::new(c[0], c[1]), y: GFp4::new(c[2], c[3]), z: GFp4::new(c[4], c[5]) })
    }

    pub fn square(&self) -> Self {
        *self * *self
    }

    /// Zero maps to zero.
    pub fn invert(&self) -> Self {
        let (x, y, z) = (self.x, self.y, self.z);
        let a = z.square() - (x * y).mul_v();
        let b = x.square().mul_v() - y * z;
        let c = y.square() - x * z;
        let f = ((c * y).mul_v() + a * z + (b * x).mul_v()).invert();
        GFp12 { x: c * f, y: b * f, z: a * f }
    }

    /// The p^6-power Frobenius, which inverts elements of the cyclotomic
    /// subgroup.
    pub fn conj(&self) -> Self {
        GFp12 { x: self.x.conj(), y: -self.y.conj(), z: self.z.conj() }
    }

    /// The p-power Frobenius.
    pub fn frobenius(&self) -> Self {
        let (x, y, z) = (&self.x, &self.y, &self.z);
        GFp12 {
            x: GFp4::new(x.x.conj().mul_scalar(&V_W2_P), x.y.conj().mul_scalar(&W2_P)),
            y: GFp4::new(y.x.conj().mul_scalar(&W2_P2), y.y.conj().mul_scalar(&FROB_W)),
            z: GFp4::new(z.x.conj().mul_scalar(&FROB_V), z.y.conj()),
        }
    }

    /// The p^2-power Frobenius.
    pub fn frobenius_p2(&self) -> Self {
        GFp12 {
            x: self.x.conj().mul_scalar(&W2_P2),
            y: self.y.conj().mul_scalar(&W2_P),
            z: self.z.conj(),
        }
    }

    /// Squaring for elements of the cyclotomic subgroup only.
    pub fn cyclotomic_square(&self) -> Self {
        let v0 = self.x.square().mul_v();
        let v1 = self.y.square();
        let v2 = self.z.square();

        let x2 = self.x.double();
        let y2 = self.y.double();
        let z2 = self.z.double();
        let w0 = GFp4::new(x2.x, -x2.y);
        let w1 = GFp4::new(-y2.x, y2.y);
        let w2 = GFp4::new(z2.x, -z2.y);

        GFp12 { x: v1.triple() + w0, y: v0.triple() + w1, z: v2.triple() + w2 }
    }

    pub fn cyclotomic_square_n(&self, n: usize) -> Self {
        let mut out = *self;
        for _ in 0..n {
            out = out.cyclotomic_square();
        }
        out
    }
}

impl core::ops::Mul for GFp12 {
    type Output = GFp12;

    fn mul(self, rhs: GFp12) -> GFp12 {
        let (ax, ay, az) = (self.x, self.y, self.z);
        let (bx, by, bz) = (rhs.x, rhs.y, rhs.z);
        GFp12 {
            z: az * bz + (ay * bx).mul_v() + (ax * by).mul_v(),
            y: az * by + ay * bz + (ax * bx).mul_v(),
            x: az * bx + ay * by + ax * bz,
        }
    }
}

impl Zeroize for GFp12 {
    fn zeroize(&mut self) {
        self.x.zeroize();
        self.y.zeroize();
        self.z.zeroize();
    }
}

impl ConditionallySelectable for GFp12 {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        GFp12 {
            x: GFp4::conditional_select(&a.x, &b.x, choice),
            y: GFp4::conditional_select(&a.y, &b.y, choice),
            z: GFp4::conditional_select(&a.z, &b.z, choice),
        }
    }
}

impl ConstantTimeEq for GFp12 {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.x.ct_eq(&other.x) & self.y.ct_eq(&other.y) & self.z.ct_eq(&other.z)
    }
}
