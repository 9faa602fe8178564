use alloc::vec::Vec;

use crate::internal::Lazy;
use crate::sm9::error::{Result, SM9Error};

use super::gfn::GFnElement;
use super::gfp::GFpElement;
use super::gfp2::GFp2;

// b = 5u and 3b = 15u on the twist y^2 = x^3 + 5u.
const B: GFp2 = GFp2::new(
    GFpElement::from_mont([0xb9f2c1e8c8c71995, 0x125df8f246a377fc, 0x25e650d049188d1c, 0x043fffffed866f63]),
    GFpElement::ZERO,
);
const B3: GFp2 = GFp2::new(
    GFpElement::from_mont([0x2dd845ba5a554cbf, 0x3719ead6d3ea67f6, 0x71b2f270db49a754, 0x0cbfffffc8934e29]),
    GFpElement::ZERO,
);

impl_projective_point!(G2, GFp2, B3, |z: GFp2| z.invert());

static BASE_TABLE: Lazy<Vec<[G2; 16]>> = Lazy::new(|| {
    let table = G2::GENERATOR.window_table();
    tracing::debug!(rows = table.len(), "sm9 G2 base table initialised");
    table
});

impl G2 {
    pub const GENERATOR: G2 = G2::from_affine(
        GFp2::new(
            GFpElement::from_mont([0xdb6db4822750a8a6, 0x84c6135a5121f134, 0x1874032f88791d41, 0x905112f2b85f3a37]),
            GFpElement::from_mont([0x260226a68ce2da8f, 0x7ee5645edbf6c06b, 0xf8f57c82b1495444, 0x61fcf018bc47c4d1]),
        ),
        GFp2::new(
            GFpElement::from_mont([0xf7b82dac4c89bfbb, 0x3706f3f6a49dc12f, 0x1e29de93d3eef769, 0x81e448c3c76a5d53]),
            GFpElement::from_mont([0xc03f138f9171c24a, 0x92fbab45a15a3ca7, 0x2445561e2ff77cdb, 0x108495e0c0f62ece]),
        ),
    );

    /// [k]G2 from the precomputed table.
    pub fn new_from_scalar_base_mul(k: &GFnElement) -> G2 {
        G2::mul_with_table(&BASE_TABLE, k)
    }

    /// Y^2*Z = X^3 + 5u*Z^3; true for the identity.
    pub fn is_on_curve(&self) -> bool {
        let z3 = self.z.square() * self.z;
        self.y.square() * self.z == self.x.square() * self.x + B * z3
    }

    /// x.x || x.y || y.x || y.y, each 32 bytes big-endian. The identity
    /// encodes as zeros.
    pub fn to_bytes(&self) -> [u8; 128] {
        let mut out = [0u8; 128];
        if let Some((x, y)) = self.to_affine() {
            out[..64].copy_from_slice(&x.to_be_bytes());
            out[64..].copy_from_slice(&y.to_be_bytes());
        }
        out
    }

    /// [n]P is the identity. The twist has a cofactor, so points on the
    /// curve may lie outside G2.
    pub fn is_in_subgroup(&self) -> bool {
        bool::from(self.scalar_mul(&GFnElement::N).is_infinity())
    }

    /// Parses the 128-byte form, optionally behind a 0x04 prefix. All zeros
    /// decode to the identity; any other point must be on the curve and in G2.
    pub fn from_bytes(b: &[u8]) -> Result<G2> {
        let raw = match b.len() {
            128 => b,
            129 if b[0] == 0x04 => &b[1..],
            129 => return Err(SM9Error::InvalidEncoding),
            _ => return Err(SM9Error::InvalidLength),
        };
        let parse = |c: &[u8]| -> Result<GFp2> {
            let c: &[u8; 64] = c.try_into().map_err(|_| SM9Error::InvalidLength)?;
            GFp2::from_be_bytes(c).ok_or(SM9Error::InvalidPoint)
        };
        if raw.iter().all(|v| *v == 0) {
            return Ok(G2::INFINITY);
        }
        let p = G2::from_affine(parse(&raw[..64])?, parse(&raw[64..])?);
        match p.is_on_curve() && p.is_in_subgroup() {
            true => Ok(p),
            false => Err(SM9Error::InvalidPoint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rand::Rng;

    #[test]
    fn test_generator() {
        let g = G2::GENERATOR;
        assert!(g.is_on_curve());
        assert_eq!(
            g.to_bytes(),
            hex!(
                "85AEF3D078640C98597B6027B441A01FF1DD2C190F5E93C454806C11D8806141"
                "3722755292130B08D2AAB97FD34EC120EE265948D19C17ABF9B7213BAF82D65B"
                "17509B092E845C1266BA0D262CBEE6ED0736A96FA347C8BD856DC76B84EBEB96"
                "A7CF28D519BE3DA65F3170153D278FF247EFBA98A71A08116215BBA5C999A7C7"
            )
        );
        assert!(bool::from(g.scalar_mul(&GFnElement::N).is_infinity()));
    }

    #[test]
    fn test_group_law() {
        let g = G2::GENERATOR;
        assert_eq!(g.add(&G2::INFINITY), g);
        assert_eq!(g.add(&g), g.double());
        assert!(bool::from(g.add(&g.neg()).is_infinity()));
        for _ in 0..3 {
            let a = GFnElement::from(&rand::rng().random::<[u8; 32]>());
            let b = GFnElement::from(&rand::rng().random::<[u8; 32]>());
            let pa = G2::new_from_scalar_base_mul(&a);
            assert_eq!(pa, g.scalar_mul(&a));
            assert!(pa.is_on_curve());
            assert_eq!(pa.scalar_mul(&b), G2::new_from_scalar_base_mul(&GFnElement::mul_plain(&a, &b)));
        }
    }

    #[test]
    fn test_encoding() {
        let p = G2::new_from_scalar_base_mul(&GFnElement::from_u64(0xdeadbeef));
        let b = p.to_bytes();
        assert_eq!(G2::from_bytes(&b).unwrap(), p);
        let mut prefixed = vec![0x04];
        prefixed.extend_from_slice(&b);
        assert_eq!(G2::from_bytes(&prefixed).unwrap(), p);
        prefixed[0] = 0x02;
        assert_eq!(G2::from_bytes(&prefixed).unwrap_err(), SM9Error::InvalidEncoding);
        assert_eq!(G2::from_bytes(&b[..127]).unwrap_err(), SM9Error::InvalidLength);

        let mut bad = b;
        bad[127] ^= 1;
        assert_eq!(G2::from_bytes(&bad).unwrap_err(), SM9Error::InvalidPoint);

        let zeros = G2::INFINITY.to_bytes();
        assert_eq!(zeros, [0u8; 128]);
        assert!(bool::from(G2::from_bytes(&zeros).unwrap().is_infinity()));
    }

    #[test]
    fn test_rejects_points_outside_g2() {
        // (1, y) lies on the twist but [n]P is not the identity.
        let b = hex!(
            "0000000000000000000000000000000000000000000000000000000000000000"
            "0000000000000000000000000000000000000000000000000000000000000001"
            "0453e9be88d22ccfe209a420669cac8b9ec1fccf14061eb8bd714e6a1f6a3ee1"
            "79a8eb911912ef24a4a0796b7a21a0935854b7cb00ee547f244a76f4c3718630"
        );
        let x = GFp2::from_be_bytes(b[..64].try_into().unwrap()).unwrap();
        let y = GFp2::from_be_bytes(b[64..].try_into().unwrap()).unwrap();
        let p = G2::from_affine(x, y);
        assert!(p.is_on_curve());
        assert!(!p.is_in_subgroup());
        assert_eq!(G2::from_bytes(&b).unwrap_err(), SM9Error::InvalidPoint);
        assert!(G2::GENERATOR.is_in_subgroup());
    }
}
