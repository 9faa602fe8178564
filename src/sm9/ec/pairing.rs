//! Optimal ate pairing on the SM9 BN curve.
//!
//! The Miller loop runs over the NAF of 6u+2 with the twist point kept in
//! Jacobian coordinates; the hard part of the final exponentiation uses
//! cyclotomic squarings and the u-power chain.

use super::g1::G1;
use super::g2::G2;
use super::gfp::GFpElement;
use super::gfp12::GFp12;
use super::gfp2::GFp2;
use super::gfp4::GFp4;
use super::gfp6::S2_P2;
use super::gt::GT;

// NAF of 6u+2, least significant digit first.
const SIX_U_PLUS_2_NAF: [i8; 66] = [
    0, -1, 0, 0, 0, 0, 1, 0, 1, 0, 0, -1, 0, -1, 0, 0, 0, -1, 0, -1, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1,
];

// Twisting coefficients for pi_p(Q) and pi_p^2(Q), Montgomery form.
const BETA_P_X: GFpElement = GFpElement::from_mont([0x646a4b5a4e6783b9, 0xd5e4017f8d980f9d, 0x8d8bf6fd0cdfe790, 0x2d4ac18b775a8f7b]);
const BETA_P_Y: GFpElement = GFpElement::from_mont([0xabbaac18a46a2054, 0x46ee57561222c759, 0x1dae609fa0e23561, 0x1df7113dae0adc3c]);
const BETA_P2_X: GFpElement = S2_P2;
const BETA_P2_Y: GFpElement = GFpElement::from_mont([0xcadf364fc6a28afa, 0x43e5269634f5ddb7, 0xac07569feb1d8e8a, 0x6c80000005474de3]);

/// Twist point (x, y, z) in Jacobian coordinates with t = z^2.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TwistPoint {
    x: GFp2,
    y: GFp2,
    z: GFp2,
    t: GFp2,
}

/// Coefficients of a sparse line evaluation.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Line {
    pub(crate) a: GFp2,
    pub(crate) b: GFp2,
    pub(crate) c: GFp2,
}

/// The operations the Miller loop and final exponentiation need from a
/// GF(p^12) representation.
pub(crate) trait PairingField: Copy + core::ops::Mul<Output = Self> {
    const ONE: Self;

    fn square(&self) -> Self;
    fn invert(&self) -> Self;
    fn conj(&self) -> Self;
    fn frobenius(&self) -> Self;
    fn frobenius_p2(&self) -> Self;
    fn cyclotomic_square(&self) -> Self;
    fn cyclotomic_square_n(&self, n: usize) -> Self;
    fn mul_line(&self, l: &Line) -> Self;
}

impl PairingField for GFp12 {
    const ONE: Self = GFp12::ONE;

    fn square(&self) -> Self {
        GFp12::square(self)
    }

    fn invert(&self) -> Self {
        GFp12::invert(self)
    }

    fn conj(&self) -> Self {
        GFp12::conj(self)
    }

    fn frobenius(&self) -> Self {
        GFp12::frobenius(self)
    }

    fn frobenius_p2(&self) -> Self {
        GFp12::frobenius_p2(self)
    }

    fn cyclotomic_square(&self) -> Self {
        GFp12::cyclotomic_square(self)
    }

    fn cyclotomic_square_n(&self, n: usize) -> Self {
        GFp12::cyclotomic_square_n(self, n)
    }

    // only the a, b and c slots of the line are non-zero
    fn mul_line(&self, l: &Line) -> Self {
        let ca = GFp4::new(l.c, l.a);
        GFp12 {
            x: self.z.mul_gfp2(&l.b) + self.x * ca,
            y: self.x.mul_gfp2(&l.b).mul_v() + self.y * ca,
            z: self.z * ca + self.y.mul_gfp2(&l.b).mul_v(),
        }
    }
}

/// Doubles r and evaluates the tangent line at the G1 point (px, py).
pub(crate) fn line_double(r: &TwistPoint, px: &GFpElement, py: &GFpElement) -> (TwistPoint, Line) {
    let a = r.x.square();
    let b = r.y.square();
    let c = b.square();
    let d = ((r.x + b).square() - a - c).double();
    let e = a.triple();
    let g = e.square();

    let x = g - d.double();
    let z = (r.y + r.z).square() - b - r.t;
    let y = (d - x) * e - c.double().double().double();
    let t = z.square();

    let lb = -((e * r.t).double().mul_scalar(px));
    let la = (r.x + e).square() - a - g - b.double().double();
    let lc = (z * r.t).double().mul_scalar(py);
    (TwistPoint { x, y, z, t }, Line { a: la, b: lb, c: lc })
}

/// Adds the affine twist point (qx, qy) to r and evaluates the line through
/// them at (px, py). r2 = qy^2.
pub(crate) fn line_add(r: &TwistPoint, qx: &GFp2, qy: &GFp2, px: &GFpElement, py: &GFpElement, r2: &GFp2) -> (TwistPoint, Line) {
    let b = *qx * r.t;
    let d = ((*qy + r.z).square() - *r2 - r.t) * r.t;
    let h = b - r.x;
    let i = h.square();
    let e = i.double().double();
    let j = h * e;
    let l1 = d - r.y.double();
    let v = r.x * e;

    let x = l1.square() - j - v.double();
    let z = (r.z + h).square() - r.t - i;
    let y = (v - x) * l1 - (r.y * j).double();
    let t = z.square();

    let la = (l1 * *qx).double() - ((*qy + z).square() - *r2 - t);
    let lc = z.mul_scalar(py).double();
    let lb = (-l1).mul_scalar(px).double();
    (TwistPoint { x, y, z, t }, Line { a: la, b: lb, c: lc })
}

/// Miller loop of the optimal ate pairing for affine Q on the twist and
/// affine P in G1.
pub(crate) fn miller_loop<F: PairingField>(qx: &GFp2, qy: &GFp2, px: &GFpElement, py: &GFpElement) -> F {
    let mut ret = F::ONE;
    let mut r = TwistPoint { x: *qx, y: *qy, z: GFp2::ONE, t: GFp2::ONE };
    let r2 = qy.square();
    let neg_qy = -*qy;

    let top = SIX_U_PLUS_2_NAF.len() - 1;
    for i in (1..=top).rev() {
        let (next, line) = line_double(&r, px, py);
        r = next;
        if i != top {
            ret = ret.square();
        }
        ret = ret.mul_line(&line);

        let step = match SIX_U_PLUS_2_NAF[i - 1] {
            1 => Some(qy),
            -1 => Some(&neg_qy),
            _ => None,
        };
        if let Some(y) = step {
            let (next, line) = line_add(&r, qx, y, px, py, &r2);
            r = next;
            ret = ret.mul_line(&line);
        }
    }

    // Q1 = pi_p(Q), -Q2 = -pi_p^2(Q)
    let q1x = qx.conj().mul_scalar(&BETA_P_X);
    let q1y = qy.conj().mul_scalar(&BETA_P_Y);
    let q2x = qx.mul_scalar(&BETA_P2_X);
    let q2y = neg_qy.mul_scalar(&BETA_P2_Y);

    let (next, line) = line_add(&r, &q1x, &q1y, px, py, &q1y.square());
    r = next;
    ret = ret.mul_line(&line);
    let (_, line) = line_add(&r, &q2x, &q2y, px, py, &q2y.square());
    ret.mul_line(&line)
}

/// x^u for x in the cyclotomic subgroup, u = 0x600000000058f98a.
fn pow_u<F: PairingField>(x: &F) -> F {
    let x = *x;
    let mut t2 = x.cyclotomic_square();
    let mut t1 = t2.cyclotomic_square();
    let mut z = x * t1;
    let mut t0 = t1 * z;
    t2 = t2 * t0;
    let mut t3 = x * t2;
    t3 = t3.cyclotomic_square_n(40);
    t3 = t2 * t3;
    t3 = t3.cyclotomic_square_n(7);
    t2 = t2 * t3;
    t1 = t1 * t2;
    t1 = t1.cyclotomic_square_n(4);
    t0 = t0 * t1;
    t0 = t0.cyclotomic_square();
    t0 = x * t0;
    t0 = t0.cyclotomic_square_n(6);
    z = z * t0;
    z.cyclotomic_square()
}

/// f^((p^12-1)/n).
pub(crate) fn final_exponentiation<F: PairingField>(f: &F) -> F {
    // easy part: f^((p^6-1)(p^2+1))
    let mut t1 = f.conj() * f.invert();
    t1 = t1 * t1.frobenius_p2();

    let fp = t1.frobenius();
    let fp2 = t1.frobenius_p2();
    let fp3 = fp2.frobenius();
    let y0 = fp * fp2 * fp3;

    let fu = pow_u(&t1);
    let fu2 = pow_u(&fu);
    let fu3 = pow_u(&fu2);
    let fu2p = fu2.frobenius();
    let fu3p = fu3.frobenius();

    let y1 = t1.conj();
    let y2 = fu2.frobenius_p2();
    let y3 = fu.frobenius().conj();
    let y4 = (fu * fu2p).conj();
    let y5 = fu2.conj();
    let y6 = (fu3 * fu3p).conj();

    let mut t0 = y6.cyclotomic_square() * y4 * y5;
    t1 = y3 * y5 * t0;
    t0 = t0 * y2;
    t1 = (t1.cyclotomic_square() * t0).cyclotomic_square();
    t0 = t1 * y1;
    t1 = t1 * y0;
    t0.cyclotomic_square() * t1
}

/// e(P, Q); the identity in either argument pairs to one.
pub fn pairing(p: &G1, q: &G2) -> GT {
    let (Some((px, py)), Some((qx, qy))) = (p.to_affine(), q.to_affine()) else {
        return GT::ONE;
    };
    let f: GFp12 = miller_loop(&qx, &qy, &px, &py);
    GT(final_exponentiation(&f))
}

#[cfg(test)]
mod tests {
    use super::super::gfn::GFnElement;
    use super::*;
    use hex_literal::hex;
    use rand::Rng;

    const GT_GENERATOR: [u8; 384] = hex!(
        "256943fbdb2bf87ab91ae7fbeaff14e146cf7e2279b9d155d13461e09b22f523"
        "0167b0280051495c6af1ec23ba2cd2ff1cdcdeca461a5ab0b5449e9091308310"
        "5e7addaddf7fbfe16291b4e89af50b8217ddc47ba3cba833c6e77c3fb027685e"
        "79d0c8337072c93fef482bb055f44d6247ccac8e8e12525854b3566236337ebe"
        "082cde173022da8cd09b28a2d80a8cee53894436a52007f978dc37f36116d39b"
        "3fa7ed741eaed99a58f53e3df82df7ccd3407bcc7b1d44a9441920ced5fb824f"
        "7fc6eb2aa771d99c9234fddd31752edfd60723e05a4ebfdeb5c33fbd47e0cf06"
        "6fa6b6fa6dd6b6d3b19a959a110e748154eef796dc0fc2dd766ea414de786968"
        "8ffe1c0e9de45fd0fed790ac26be91f6b3f0a49c084fe29a3fb6ed288ad7994d"
        "1664a1366beb3196f0443e15f5f9042a947354a5678430d45ba031cff06db927"
        "7f7c6d52b475e6aaa827fdc5b4175ac6929320f782d998f86b6b57cda42a0426"
        "36a699de7c136f78eee2dbac4ca9727bff0cee02ee920f5822e65ea170aa9669"
    );

    #[test]
    fn test_generator_pairing() {
        let g = pairing(&G1::GENERATOR, &G2::GENERATOR);
        assert_eq!(g.to_bytes(), GT_GENERATOR);
        assert!(bool::from(g.pow(&GFnElement::N).is_one()));
    }

    #[test]
    fn test_bilinearity() {
        let g = pairing(&G1::GENERATOR, &G2::GENERATOR);
        for _ in 0..2 {
            let a = GFnElement::from(&rand::rng().random::<[u8; 32]>());
            let pa = G1::new_from_scalar_base_mul(&a);
            let qa = G2::new_from_scalar_base_mul(&a);
            let ga = g.pow(&a);
            assert_eq!(pairing(&pa, &G2::GENERATOR), ga);
            assert_eq!(pairing(&G1::GENERATOR, &qa), ga);
        }
        let (a, b) = (GFnElement::from_u64(7), GFnElement::from_u64(11));
        let lhs = pairing(&G1::GENERATOR.scalar_mul(&a), &G2::GENERATOR.scalar_mul(&b));
        assert_eq!(lhs, g.pow(&GFnElement::from_u64(77)));
    }

    #[test]
    fn test_identity() {
        assert_eq!(pairing(&G1::INFINITY, &G2::GENERATOR), GT::ONE);
        assert_eq!(pairing(&G1::GENERATOR, &G2::INFINITY), GT::ONE);
    }

    #[test]
    fn test_projective_inputs() {
        // the same points with z != 1
        let p = G1::GENERATOR.double();
        let q = G2::GENERATOR.double().add(&G2::GENERATOR);
        let g = pairing(&G1::GENERATOR, &G2::GENERATOR);
        assert_eq!(pairing(&p, &q), g.pow(&GFnElement::from_u64(6)));
    }
}
