use super::gfp12::{GFp12, FROB_W, W2_P};
use super::gfp2::GFp2;
use super::gfp4::GFp4;
use super::gfp6::GFp6;

/// GF(p^12) = GF(p^6)[t]/(t^2 - s), holding x*t + y.
///
/// Same field as [`GFp12`] over a 2-over-3 tower; the sparse line
/// multiplication is cheaper here.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GFp12b6 {
    pub x: GFp6,
    pub y: GFp6,
}

impl From<&GFp12> for GFp12b6 {
    fn from(a: &GFp12) -> Self {
        GFp12b6 {
            x: GFp6::new(a.x.x, a.z.x, a.y.y),
            y: GFp6::new(a.y.x, a.x.y, a.z.y),
        }
    }
}

impl From<&GFp12b6> for GFp12 {
    fn from(e: &GFp12b6) -> Self {
        GFp12 {
            x: GFp4::new(e.x.x, e.y.y),
            y: GFp4::new(e.y.x, e.x.z),
            z: GFp4::new(e.x.y, e.y.z),
        }
    }
}

// (2xy, x^2*u + y^2): one GF(p^4) squaring in the (x, y) basis.
#[inline]
fn fp4_square(x: &GFp2, y: &GFp2) -> (GFp2, GFp2) {
    ((*x * *y).double(), x.square().mul_u() + y.square())
}

impl GFp12b6 {
    pub const ONE: GFp12b6 = GFp12b6 { x: GFp6::ZERO, y: GFp6::ONE };

    pub fn square(&self) -> Self {
        *self * *self
    }

    /// Zero maps to zero.
    pub fn invert(&self) -> Self {
        let t = (self.y.square() - self.x.square().mul_s()).invert();
        GFp12b6 { x: -(self.x * t), y: self.y * t }
    }

    pub fn conj(&self) -> Self {
        GFp12b6 { x: -self.x, y: self.y }
    }

    pub fn frobenius(&self) -> Self {
        GFp12b6 { x: self.x.frobenius().mul_scalar(&FROB_W), y: self.y.frobenius() }
    }

    pub fn frobenius_p2(&self) -> Self {
        GFp12b6 { x: self.x.frobenius_p2().mul_scalar(&W2_P), y: self.y.frobenius_p2() }
    }

    /// Squaring for elements of the cyclotomic subgroup only.
    pub fn cyclotomic_square(&self) -> Self {
        let (ax, ay) = (&self.x, &self.y);
        let (t11, t00) = fp4_square(&ax.y, &ay.z);
        let (t12, t01) = fp4_square(&ay.x, &ax.z);
        let (t02, t10) = fp4_square(&ax.x, &ay.y);
        let (t02, t10) = (t10, t02.mul_u());

        GFp12b6 {
            x: GFp6::new(ax.x.double() + t12.triple(), ax.y.double() + t11.triple(), ax.z.double() + t10.triple()),
            y: GFp6::new(t02.triple() - ay.x.double(), t01.triple() - ay.y.double(), t00.triple() - ay.z.double()),
        }
    }

    pub fn cyclotomic_square_n(&self, n: usize) -> Self {
        let mut out = *self;
        for _ in 0..n {
            out = out.cyclotomic_square();
        }
        out
    }
}

impl core::ops::Mul for GFp12b6 {
    type Output = GFp12b6;

    fn mul(self, rhs: GFp12b6) -> GFp12b6 {
        let v0 = self.y * rhs.y;
        let v1 = self.x * rhs.x;
        let x = (self.x + self.y) * (rhs.x + rhs.y) - v0 - v1;
        GFp12b6 { x, y: v1.mul_s() + v0 }
    }
}

#[cfg(test)]
mod tests {
    use super::super::gfp12::tests::random_fp12;
    use super::*;

    #[test]
    fn test_isomorphism() {
        for _ in 0..10 {
            let (a, b) = (random_fp12(), random_fp12());
            let (ab, bb) = (GFp12b6::from(&a), GFp12b6::from(&b));
            assert_eq!(GFp12::from(&ab), a);
            assert_eq!(GFp12::from(&(ab * bb)), a * b);
            assert_eq!(GFp12::from(&ab.invert()), a.invert());
            assert_eq!(GFp12::from(&ab.frobenius()), a.frobenius());
            assert_eq!(GFp12::from(&ab.frobenius_p2()), a.frobenius_p2());
            assert_eq!(GFp12::from(&ab.conj()), a.conj());
        }
        assert_eq!(GFp12::from(&GFp12b6::ONE), GFp12::ONE);
    }

    #[test]
    fn test_cyclotomic_square() {
        let a = random_fp12();
        let t = a.conj() * a.invert();
        let t = t * t.frobenius_p2();
        let tb = GFp12b6::from(&t);
        assert_eq!(tb.cyclotomic_square(), tb.square());
        assert_eq!(GFp12::from(&tb.cyclotomic_square_n(2)), t.cyclotomic_square_n(2));
    }
}
