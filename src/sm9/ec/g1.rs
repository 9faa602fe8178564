use alloc::vec::Vec;

use subtle::{Choice, ConditionallySelectable};

use crate::internal::Lazy;
use crate::sm2::ec::curve::PointForm;
use crate::sm9::error::{Result, SM9Error};

use super::gfn::GFnElement;
use super::gfp::GFpElement;

// 5 and 3b = 15, Montgomery form.
const B: GFpElement = GFpElement::from_mont([0xb9f2c1e8c8c71995, 0x125df8f246a377fc, 0x25e650d049188d1c, 0x043fffffed866f63]);
const B3: GFpElement = GFpElement::from_mont([0x2dd845ba5a554cbf, 0x3719ead6d3ea67f6, 0x71b2f270db49a754, 0x0cbfffffc8934e29]);

impl_projective_point!(G1, GFpElement, B3, GFpElement::invert_move);

static BASE_TABLE: Lazy<Vec<[G1; 16]>> = Lazy::new(|| {
    let table = G1::GENERATOR.window_table();
    tracing::debug!(rows = table.len(), "sm9 G1 base table initialised");
    table
});

// x^3 + 5
fn rhs(x: &GFpElement) -> GFpElement {
    x.square_move() * *x + B
}

fn parse_coordinate(b: &[u8]) -> Result<GFpElement> {
    let b: &[u8; 32] = b.try_into().map_err(|_| SM9Error::InvalidLength)?;
    GFpElement::from_be_bytes(b).ok_or(SM9Error::InvalidPoint)
}

impl G1 {
    pub const GENERATOR: G1 = G1::from_affine(
        GFpElement::from_mont([0x22e935e29860501b, 0xa946fd5e0073282c, 0xefd0cec817a649be, 0x5129787c869140b5]),
        GFpElement::from_mont([0xee779649eb87f7c7, 0x15563cbdec30a576, 0x326353912824efbf, 0x7215717763c39828]),
    );

    /// [k]G1 from the precomputed table.
    pub fn new_from_scalar_base_mul(k: &GFnElement) -> G1 {
        G1::mul_with_table(&BASE_TABLE, k)
    }

    /// Y^2*Z = X^3 + 5*Z^3; true for the identity.
    pub fn is_on_curve(&self) -> bool {
        let z3 = self.z.square_move() * self.z;
        self.y.square_move() * self.z == self.x.square_move() * self.x + B * z3
    }

    /// 65 bytes uncompressed or hybrid, 33 compressed, a single zero byte for
    /// the identity.
    pub fn to_bytes(&self, form: PointForm) -> Vec<u8> {
        let Some((x, y)) = self.to_affine() else {
            return vec![0];
        };
        let odd = bool::from(y.is_odd()) as u8;
        let mut out = Vec::with_capacity(65);
        match form {
            PointForm::Uncompressed => {
                out.push(0x04);
                out.extend_from_slice(&x.to_be_bytes());
                out.extend_from_slice(&y.to_be_bytes());
            }
            PointForm::Compressed => {
                out.push(0x02 | odd);
                out.extend_from_slice(&x.to_be_bytes());
            }
            PointForm::Hybrid => {
                out.push(0x06 | odd);
                out.extend_from_slice(&x.to_be_bytes());
                out.extend_from_slice(&y.to_be_bytes());
            }
        }
        out
    }

    /// x || y without a prefix, as hashed by the protocols. The identity
    /// encodes as zeros.
    pub fn to_raw_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        if let Some((x, y)) = self.to_affine() {
            out[..32].copy_from_slice(&x.to_be_bytes());
            out[32..].copy_from_slice(&y.to_be_bytes());
        }
        out
    }

    /// Decodes 0x00, 0x02/0x03, 0x04 and 0x06/0x07 encodings.
    pub fn from_bytes(b: &[u8]) -> Result<G1> {
        let Some(&tag) = b.first() else {
            return Err(SM9Error::InvalidLength);
        };
        match tag {
            0x00 => match b.len() {
                1 => Ok(G1::INFINITY),
                _ => Err(SM9Error::InvalidLength),
            },
            0x02 | 0x03 => {
                if b.len() != 33 {
                    return Err(SM9Error::InvalidLength);
                }
                Self::decompress(&parse_coordinate(&b[1..])?, tag & 1)
            }
            0x04 | 0x06 | 0x07 => {
                if b.len() != 65 {
                    return Err(SM9Error::InvalidLength);
                }
                let y = parse_coordinate(&b[33..])?;
                let p = Self::from_raw_coordinates(parse_coordinate(&b[1..33])?, y)?;
                if tag != 0x04 && bool::from(y.is_odd()) as u8 != tag & 1 {
                    return Err(SM9Error::InvalidPoint);
                }
                Ok(p)
            }
            _ => Err(SM9Error::InvalidEncoding),
        }
    }

    /// Parses x || y, rejecting points off the curve.
    pub fn from_raw_bytes(b: &[u8]) -> Result<G1> {
        if b.len() != 64 {
            return Err(SM9Error::InvalidLength);
        }
        Self::from_raw_coordinates(parse_coordinate(&b[..32])?, parse_coordinate(&b[32..])?)
    }

    fn from_raw_coordinates(x: GFpElement, y: GFpElement) -> Result<G1> {
        let p = G1::from_affine(x, y);
        match p.is_on_curve() {
            true => Ok(p),
            false => Err(SM9Error::InvalidPoint),
        }
    }

    fn decompress(x: &GFpElement, odd: u8) -> Result<G1> {
        let Some(mut y) = rhs(x).sqrt() else {
            return Err(SM9Error::InvalidPoint);
        };
        let neg = -y;
        let flip = y.is_odd() ^ Choice::from(odd & 1);
        y.conditional_assign(&neg, flip);
        Ok(G1::from_affine(*x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rand::Rng;

    fn random_scalar() -> GFnElement {
        GFnElement::from(&rand::rng().random::<[u8; 32]>())
    }

    #[test]
    fn test_generator() {
        let g = G1::GENERATOR;
        assert!(g.is_on_curve());
        assert_eq!(
            g.to_raw_bytes(),
            hex!(
                "93DE051D62BF718FF5ED0704487D01D6E1E4086909DC3280E8C4E4817C66DDDD"
                "21FE8DDA4F21E607631065125C395BBC1C1C00CBFA6024350C464CD70A3EA616"
            )
        );
        assert!(bool::from(g.scalar_mul(&GFnElement::N).is_infinity()));
        let n_minus_1 = GFnElement::ONE.neg_move();
        assert_eq!(g.scalar_mul(&n_minus_1), g.neg());
    }

    #[test]
    fn test_add_double() {
        let g = G1::GENERATOR;
        let inf = G1::INFINITY;
        assert_eq!(g.add(&inf), g);
        assert_eq!(inf.add(&g), g);
        assert!(bool::from(g.add(&g.neg()).is_infinity()));
        assert_eq!(g.add(&g), g.double());
        assert!(bool::from(inf.double().is_infinity()));
        let g3 = g.double().add(&g);
        assert_eq!(g3, g.scalar_mul(&GFnElement::from_u64(3)));
        assert!(g3.is_on_curve());
    }

    #[test]
    fn test_scalar_mul() {
        for _ in 0..5 {
            let (a, b) = (random_scalar(), random_scalar());
            let pa = G1::new_from_scalar_base_mul(&a);
            assert_eq!(pa, G1::GENERATOR.scalar_mul(&a));
            let lhs = pa.scalar_mul(&b);
            let rhs = G1::new_from_scalar_base_mul(&GFnElement::mul_plain(&a, &b));
            assert_eq!(lhs, rhs);
            let sum = G1::new_from_scalar_base_mul(&GFnElement::new_from_add(&a, &b));
            assert_eq!(sum, pa.add(&G1::new_from_scalar_base_mul(&b)));
        }
        assert!(bool::from(G1::INFINITY.scalar_mul(&random_scalar()).is_infinity()));
        assert!(bool::from(G1::new_from_scalar_base_mul(&GFnElement::ZERO).is_infinity()));
    }

    #[test]
    fn test_encoding() {
        let p = G1::new_from_scalar_base_mul(&random_scalar());
        for form in [PointForm::Uncompressed, PointForm::Compressed, PointForm::Hybrid] {
            let b = p.to_bytes(form);
            assert_eq!(G1::from_bytes(&b).unwrap(), p);
        }
        assert_eq!(G1::from_raw_bytes(&p.to_raw_bytes()).unwrap(), p);
        assert_eq!(G1::from_bytes(&[0]).unwrap(), G1::INFINITY);
        assert_eq!(G1::INFINITY.to_bytes(PointForm::Compressed), vec![0]);

        let mut bad = p.to_bytes(PointForm::Uncompressed);
        bad[64] ^= 1;
        assert_eq!(G1::from_bytes(&bad).unwrap_err(), SM9Error::InvalidPoint);
        assert_eq!(G1::from_bytes(&bad[..64]).unwrap_err(), SM9Error::InvalidLength);
        assert_eq!(G1::from_bytes(&[0x05; 65]).unwrap_err(), SM9Error::InvalidEncoding);
        assert_eq!(G1::from_bytes(&[]).unwrap_err(), SM9Error::InvalidLength);
    }
}
