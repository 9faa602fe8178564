//! SM2 public key cryptography (GB/T 32918).
//!
//! Keys live here; the protocols are in [`sign`], [`encrypt`],
//! [`key_exchange`] and [`envelope`].

use alloc::vec::Vec;

use rand::TryRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::internal::OnceCell;
use ec::curve::{AffinePoint, ProjectivePoint};
use ec::gfn::GFnElement;
use error::{Result, SM2Error};

pub mod ec;
pub mod encrypt;
pub mod envelope;
pub mod error;
pub mod key_exchange;
pub mod sign;

pub use ec::curve::PointForm;
pub use encrypt::*;
pub use envelope::*;
pub use key_exchange::KeyExchange;
pub use sign::*;

/// Bound of every rejection-sampling loop.
pub(crate) const MAX_RETRIES: usize = 100;

/// Draws a scalar in [1, n-1] from 32 random bytes. A value >= n is reduced
/// by one subtraction, zero is rejected.
pub(crate) fn random_scalar<R: TryRngCore + ?Sized>(rng: &mut R) -> Result<GFnElement> {
    let mut buf = [0u8; 32];
    for _ in 0..MAX_RETRIES {
        rng.try_fill_bytes(&mut buf).map_err(|_| SM2Error::RandomnessFailure)?;
        let k = GFnElement::from(&buf);
        buf.zeroize();
        if !bool::from(k.is_zero()) {
            return Ok(k);
        }
        tracing::trace!("sm2: zero scalar drawn, retrying");
    }
    tracing::warn!(retries = MAX_RETRIES, "sm2: random scalar generation exhausted");
    Err(SM2Error::ResourceExhausted)
}

fn n_minus_one() -> GFnElement {
    let mut t = GFnElement::N;
    t.limbs[0] -= 1;
    t
}

/// An SM2 public key, a point of the curve other than the infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
}

impl PublicKey {
    /// Decodes any of the point encodings; the infinity is rejected.
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        Self::from_point(AffinePoint::from_bytes(b)?)
    }

    pub fn from_point(point: AffinePoint) -> Result<Self> {
        if point.infinity || !point.is_on_curve() {
            return Err(SM2Error::InvalidPoint);
        }
        Ok(PublicKey { point })
    }

    pub fn to_bytes(&self, form: PointForm) -> Vec<u8> {
        self.point.to_bytes(form)
    }

    pub fn x_bytes(&self) -> [u8; 32] {
        self.point.x_bytes()
    }

    pub fn y_bytes(&self) -> [u8; 32] {
        self.point.y_bytes()
    }

    pub fn point(&self) -> &AffinePoint {
        &self.point
    }
}

/// An SM2 private key d in [1, n-2] with its public key.
///
/// (1+d)^-1 is computed on the first signature and kept.
pub struct PrivateKey {
    d: GFnElement,
    d1inv: OnceCell<GFnElement>,
    public_key: PublicKey,
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        PrivateKey {
            d: self.d,
            d1inv: self.d1inv.clone(),
            public_key: self.public_key,
        }
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.d.limbs.zeroize();
        if let Some(mut v) = self.d1inv.take() {
            v.limbs.zeroize();
        }
    }
}

impl core::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrivateKey").field("public_key", &self.public_key).finish_non_exhaustive()
    }
}

impl PrivateKey {
    /// Parses a 32-byte big-endian d.
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        let b: &[u8; 32] = b.try_into().map_err(|_| SM2Error::InvalidLength)?;
        let d = GFnElement::from_be_bytes_checked(b).ok_or(SM2Error::InvalidScalar)?;
        Self::from_scalar(d)
    }

    pub fn generate<R: TryRngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        for _ in 0..MAX_RETRIES {
            let d = random_scalar(rng)?;
            if !bool::from(d.ct_eq(&n_minus_one())) {
                return Self::from_scalar(d);
            }
        }
        Err(SM2Error::ResourceExhausted)
    }

    fn from_scalar(d: GFnElement) -> Result<Self> {
        if bool::from(d.is_zero() | d.ct_eq(&n_minus_one())) {
            return Err(SM2Error::InvalidScalar);
        }
        let point = ProjectivePoint::new_from_scalar_base_mul(&d.limbs).to_affine();
        Ok(PrivateKey {
            d,
            d1inv: OnceCell::new(),
            public_key: PublicKey { point },
        })
    }

    /// The big-endian d. The caller owns the copy and should zeroize it.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.d.to_be_bytes()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub(crate) fn scalar(&self) -> &GFnElement {
        &self.d
    }

    // (1+d)^-1 mod n
    pub(crate) fn d1inv(&self) -> &GFnElement {
        self.d1inv.get_or_init(|| {
            let d1 = GFnElement::new_from_add(&self.d, &GFnElement::ONE);
            GFnElement::invert_plain(&d1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::ConstRngCore;
    use hex_literal::hex;

    const D: [u8; 32] = hex!("6c5a0a0b2eed3cbec3e4f1252bfe0e28c504a1c6bf1999eebb0af9ef0f8e6c85");

    #[test]
    fn test_private_key() {
        let sk = PrivateKey::from_bytes(&D).unwrap();
        assert_eq!(sk.to_bytes(), D);
        assert_eq!(
            sk.public_key().to_bytes(PointForm::Uncompressed),
            hex!(
                "048356e642a40ebd18d29ba3532fbd9f3bbee8f027c3f6f39a5ba2f870369f9988981f5efe55d1c5cdf6c0ef2b070847a14f7fdf4272a8df09c442f3058af94ba1"
            )
        );

        let d1inv = *sk.d1inv();
        let one = GFnElement::mul_plain(&d1inv, &GFnElement::new_from_add(sk.scalar(), &GFnElement::ONE));
        assert_eq!(one, GFnElement::ONE);
        // cached value survives clone.
        assert_eq!(*sk.clone().d1inv(), d1inv);
    }

    #[test]
    fn test_private_key_range() {
        assert_eq!(PrivateKey::from_bytes(&[0u8; 32]).unwrap_err(), SM2Error::InvalidScalar);
        assert_eq!(PrivateKey::from_bytes(&n_minus_one().to_be_bytes()).unwrap_err(), SM2Error::InvalidScalar);
        assert_eq!(PrivateKey::from_bytes(&GFnElement::N.to_be_bytes()).unwrap_err(), SM2Error::InvalidScalar);
        assert_eq!(PrivateKey::from_bytes(&D[..31]).unwrap_err(), SM2Error::InvalidLength);

        let mut nm2 = n_minus_one();
        nm2.limbs[0] -= 1;
        assert!(PrivateKey::from_bytes(&nm2.to_be_bytes()).is_ok());
    }

    #[test]
    fn test_generate() {
        let sk = PrivateKey::generate(&mut rand::rng()).unwrap();
        let pk = PublicKey::from_bytes(&sk.public_key().to_bytes(PointForm::Compressed)).unwrap();
        assert_eq!(&pk, sk.public_key());

        // replayed bytes give the same key.
        let sk = PrivateKey::generate(&mut ConstRngCore::new(D)).unwrap();
        assert_eq!(sk.to_bytes(), D);

        // an all-zero source never yields a scalar.
        let err = PrivateKey::generate(&mut ConstRngCore::new([0u8; 32])).unwrap_err();
        assert_eq!(err, SM2Error::ResourceExhausted);
    }

    #[test]
    fn test_public_key_infinity() {
        assert_eq!(PublicKey::from_bytes(&[0]).unwrap_err(), SM2Error::InvalidPoint);
        assert_eq!(PublicKey::from_point(AffinePoint::INFINITY).unwrap_err(), SM2Error::InvalidPoint);
    }
}
