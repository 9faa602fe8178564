//! The same pairing computed over the 2-over-3 tower. Both the Miller loop
//! and the final exponentiation stay in [`GFp12b6`]; only the result is
//! mapped back to the primary tower.

use super::g1::G1;
use super::g2::G2;
use super::gfp12::GFp12;
use super::gfp12_b6::GFp12b6;
use super::gfp2::GFp2;
use super::gfp6::GFp6;
use super::gt::GT;
use super::pairing::{final_exponentiation, miller_loop, Line, PairingField};

impl PairingField for GFp12b6 {
    const ONE: Self = GFp12b6::ONE;

    fn square(&self) -> Self {
        GFp12b6::square(self)
    }

    fn invert(&self) -> Self {
        GFp12b6::invert(self)
    }

    fn conj(&self) -> Self {
        GFp12b6::conj(self)
    }

    fn frobenius(&self) -> Self {
        GFp12b6::frobenius(self)
    }

    fn frobenius_p2(&self) -> Self {
        GFp12b6::frobenius_p2(self)
    }

    fn cyclotomic_square(&self) -> Self {
        GFp12b6::cyclotomic_square(self)
    }

    fn cyclotomic_square_n(&self, n: usize) -> Self {
        GFp12b6::cyclotomic_square_n(self, n)
    }

    fn mul_line(&self, l: &Line) -> Self {
        // line = (c*s) * t + (b*s + a), Karatsuba over t
        let a2 = self.y * GFp6::new(GFp2::ZERO, l.b, l.a);
        let t3 = self.x.mul_gfp2(&l.c).mul_s();
        let x = (self.x + self.y) * GFp6::new(GFp2::ZERO, l.b + l.c, l.a) - a2 - t3;
        GFp12b6 { x, y: t3.mul_s() + a2 }
    }
}

/// e(P, Q) over the 2-over-3 tower; equal to [`super::pairing::pairing`].
pub fn pairing_b6(p: &G1, q: &G2) -> GT {
    let (Some((px, py)), Some((qx, qy))) = (p.to_affine(), q.to_affine()) else {
        return GT::ONE;
    };
    let f: GFp12b6 = miller_loop(&qx, &qy, &px, &py);
    GT(GFp12::from(&final_exponentiation(&f)))
}
