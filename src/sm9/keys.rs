//! Master key pairs and user key extraction.
//!
//! Signature and encryption use separate master keys: `Ppub_s = [ks]G2`
//! with user keys in G1, and `Ppub_e = [ke]G1` with user keys in G2. Key
//! exchange uses encryption keys extracted under [`HID_EXCHANGE`].

use alloc::vec::Vec;

use rand::TryRngCore;
use zeroize::Zeroize;

use super::ec::g1::G1;
use super::ec::g2::G2;
use super::ec::gfn::GFnElement;
use super::ec::gt::GT;
use super::ec::pairing::pairing;
use super::error::{Result, SM9Error};
use super::hash::h1;
use super::*;
use crate::internal::OnceCell;
use crate::sm2::ec::curve::PointForm;

/// Identifier byte of signature keys.
pub const HID_SIGN: u8 = 0x01;
/// Identifier byte of key exchange keys.
pub const HID_EXCHANGE: u8 = 0x02;
/// Identifier byte of encryption keys.
pub const HID_ENCRYPT: u8 = 0x03;

fn parse_master_scalar(b: &[u8]) -> Result<GFnElement> {
    let b: &[u8; 32] = b.try_into().map_err(|_| SM9Error::InvalidLength)?;
    let k = GFnElement::from_be_bytes_checked(b).ok_or(SM9Error::InvalidScalar)?;
    if bool::from(k.is_zero()) {
        return Err(SM9Error::InvalidScalar);
    }
    Ok(k)
}

// k * (H1(id || hid) + k)^-1
fn extraction_scalar(k: &GFnElement, uid: &[u8], hid: u8) -> Result<GFnElement> {
    let mut t1 = GFnElement::new_from_add(&h1(uid, hid), k);
    if bool::from(t1.is_zero()) {
        tracing::warn!(hid, "sm9: identity hashes to -k, the master key must be replaced");
        return Err(SM9Error::InvalidScalar);
    }
    let t2 = GFnElement::mul_plain(k, &GFnElement::invert_plain(&t1));
    t1.limbs.zeroize();
    Ok(t2)
}

/// `Ppub_s` in G2, with `e(G1, Ppub_s)` cached on first use.
#[derive(Clone)]
pub struct SignMasterPublicKey {
    point: G2,
    g: OnceCell<GT>,
}

impl core::fmt::Debug for SignMasterPublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignMasterPublicKey").field("point", &self.point).finish()
    }
}

impl PartialEq for SignMasterPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point
    }
}

impl Eq for SignMasterPublicKey {}

impl SignMasterPublicKey {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        Self::from_point(G2::from_bytes(b)?)
    }

    pub fn from_point(point: G2) -> Result<Self> {
        if bool::from(point.is_infinity()) || !point.is_on_curve() {
            return Err(SM9Error::InvalidPoint);
        }
        Ok(SignMasterPublicKey { point, g: OnceCell::new() })
    }

    pub fn to_bytes(&self) -> [u8; 128] {
        self.point.to_bytes()
    }

    pub fn point(&self) -> &G2 {
        &self.point
    }

    // e(G1, Ppub_s)
    pub(crate) fn pairing_base(&self) -> &GT {
        self.g.get_or_init(|| pairing(&G1::GENERATOR, &self.point))
    }
}

/// The signature master key ks in [1, n-1].
#[derive(Clone)]
pub struct SignMasterPrivateKey {
    ks: GFnElement,
    public_key: SignMasterPublicKey,
}

impl Drop for SignMasterPrivateKey {
    fn drop(&mut self) {
        self.ks.limbs.zeroize();
    }
}

impl core::fmt::Debug for SignMasterPrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignMasterPrivateKey").field("public_key", &self.public_key).finish_non_exhaustive()
    }
}

impl SignMasterPrivateKey {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        Ok(Self::from_scalar(parse_master_scalar(b)?))
    }

    pub fn generate<R: TryRngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        Ok(Self::from_scalar(random_scalar(rng)?))
    }

    fn from_scalar(ks: GFnElement) -> Self {
        let point = G2::new_from_scalar_base_mul(&ks);
        SignMasterPrivateKey {
            ks,
            public_key: SignMasterPublicKey { point, g: OnceCell::new() },
        }
    }

    /// The big-endian ks. The caller owns the copy and should zeroize it.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.ks.to_be_bytes()
    }

    pub fn public_key(&self) -> &SignMasterPublicKey {
        &self.public_key
    }

    /// ds = [ks / (H1(uid || hid) + ks)]G1.
    pub fn generate_user_key(&self, uid: &[u8], hid: u8) -> Result<SignPrivateKey> {
        let mut t2 = extraction_scalar(&self.ks, uid, hid)?;
        let point = G1::new_from_scalar_base_mul(&t2);
        t2.limbs.zeroize();
        Ok(SignPrivateKey { point, master_public_key: self.public_key.clone() })
    }
}

/// A user signature key ds in G1.
#[derive(Clone)]
pub struct SignPrivateKey {
    point: G1,
    master_public_key: SignMasterPublicKey,
}

impl Drop for SignPrivateKey {
    fn drop(&mut self) {
        self.point.zeroize();
    }
}

impl core::fmt::Debug for SignPrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignPrivateKey")
            .field("master_public_key", &self.master_public_key)
            .finish_non_exhaustive()
    }
}

impl SignPrivateKey {
    /// Parses an extracted ds issued under `master_public_key`.
    pub fn from_bytes(b: &[u8], master_public_key: &SignMasterPublicKey) -> Result<Self> {
        let point = G1::from_bytes(b)?;
        if bool::from(point.is_infinity()) {
            return Err(SM9Error::InvalidPoint);
        }
        Ok(SignPrivateKey { point, master_public_key: master_public_key.clone() })
    }

    /// ds, uncompressed.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.point.to_bytes(PointForm::Uncompressed)
    }

    pub fn master_public_key(&self) -> &SignMasterPublicKey {
        &self.master_public_key
    }

    pub(crate) fn point(&self) -> &G1 {
        &self.point
    }
}

/// `Ppub_e` in G1, with `e(Ppub_e, G2)` cached on first use.
#[derive(Clone)]
pub struct EncryptMasterPublicKey {
    point: G1,
    g: OnceCell<GT>,
}

impl core::fmt::Debug for EncryptMasterPublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncryptMasterPublicKey").field("point", &self.point).finish()
    }
}

impl PartialEq for EncryptMasterPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point
    }
}

impl Eq for EncryptMasterPublicKey {}

impl EncryptMasterPublicKey {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        Self::from_point(G1::from_bytes(b)?)
    }

    pub fn from_point(point: G1) -> Result<Self> {
        if bool::from(point.is_infinity()) || !point.is_on_curve() {
            return Err(SM9Error::InvalidPoint);
        }
        Ok(EncryptMasterPublicKey { point, g: OnceCell::new() })
    }

    pub fn to_bytes(&self, form: PointForm) -> Vec<u8> {
        self.point.to_bytes(form)
    }

    pub fn point(&self) -> &G1 {
        &self.point
    }

    // e(Ppub_e, G2)
    pub(crate) fn pairing_base(&self) -> &GT {
        self.g.get_or_init(|| pairing(&self.point, &G2::GENERATOR))
    }

    /// Q = [H1(uid || hid)]G1 + Ppub_e, the point ciphertexts are formed on.
    pub(crate) fn user_point(&self, uid: &[u8], hid: u8) -> G1 {
        G1::new_from_scalar_base_mul(&h1(uid, hid)).add(&self.point)
    }
}

/// The encryption master key ke in [1, n-1].
#[derive(Clone)]
pub struct EncryptMasterPrivateKey {
    ke: GFnElement,
    public_key: EncryptMasterPublicKey,
}

impl Drop for EncryptMasterPrivateKey {
    fn drop(&mut self) {
        self.ke.limbs.zeroize();
    }
}

impl core::fmt::Debug for EncryptMasterPrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncryptMasterPrivateKey").field("public_key", &self.public_key).finish_non_exhaustive()
    }
}

impl EncryptMasterPrivateKey {
    pub fn from_bytes(b: &[u8]) -> Result<Self> {
        Ok(Self::from_scalar(parse_master_scalar(b)?))
    }

    pub fn generate<R: TryRngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        Ok(Self::from_scalar(random_scalar(rng)?))
    }

    fn from_scalar(ke: GFnElement) -> Self {
        let point = G1::new_from_scalar_base_mul(&ke);
        EncryptMasterPrivateKey {
            ke,
            public_key: EncryptMasterPublicKey { point, g: OnceCell::new() },
        }
    }

    /// The big-endian ke. The caller owns the copy and should zeroize it.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.ke.to_be_bytes()
    }

    pub fn public_key(&self) -> &EncryptMasterPublicKey {
        &self.public_key
    }

    /// de = [ke / (H1(uid || hid) + ke)]G2. Use [`HID_ENCRYPT`] for
    /// encryption keys and [`HID_EXCHANGE`] for key exchange keys.
    pub fn generate_user_key(&self, uid: &[u8], hid: u8) -> Result<EncryptPrivateKey> {
        let mut t2 = extraction_scalar(&self.ke, uid, hid)?;
        let point = G2::new_from_scalar_base_mul(&t2);
        t2.limbs.zeroize();
        Ok(EncryptPrivateKey { point, master_public_key: self.public_key.clone() })
    }
}

/// A user encryption (or key exchange) key de in G2.
#[derive(Clone)]
pub struct EncryptPrivateKey {
    point: G2,
    master_public_key: EncryptMasterPublicKey,
}

impl Drop for EncryptPrivateKey {
    fn drop(&mut self) {
        self.point.zeroize();
    }
}

impl core::fmt::Debug for EncryptPrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EncryptPrivateKey")
            .field("master_public_key", &self.master_public_key)
            .finish_non_exhaustive()
    }
}

impl EncryptPrivateKey {
    pub fn from_bytes(b: &[u8], master_public_key: &EncryptMasterPublicKey) -> Result<Self> {
        let point = G2::from_bytes(b)?;
        if bool::from(point.is_infinity()) {
            return Err(SM9Error::InvalidPoint);
        }
        Ok(EncryptPrivateKey { point, master_public_key: master_public_key.clone() })
    }

    pub fn to_bytes(&self) -> [u8; 128] {
        self.point.to_bytes()
    }

    pub fn master_public_key(&self) -> &EncryptMasterPublicKey {
        &self.master_public_key
    }

    pub(crate) fn point(&self) -> &G2 {
        &self.point
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hex_literal::hex;

    pub(crate) const KS: [u8; 32] = hex!("000130E78459D78545CB54C587E02CF480CE0B66340F319F348A1D5B1F2DC5F4");
    pub(crate) const KE: [u8; 32] = hex!("0001EDEE3778F441F8DEA3D9FA0ACC4E07EE36C93F9A08618AF4AD85CEDE1C22");

    #[test]
    fn test_sign_master_key() {
        let msk = SignMasterPrivateKey::from_bytes(&KS).unwrap();
        assert_eq!(msk.to_bytes(), KS);
        let mpk = SignMasterPublicKey::from_bytes(&msk.public_key().to_bytes()).unwrap();
        assert_eq!(&mpk, msk.public_key());
        assert_eq!(*mpk.pairing_base(), pairing(&G1::GENERATOR, &G2::GENERATOR).pow(&GFnElement::from(&KS)));
    }

    #[test]
    fn test_encrypt_user_key() {
        let msk = EncryptMasterPrivateKey::from_bytes(&KE).unwrap();
        assert_eq!(
            msk.public_key().point().to_raw_bytes(),
            hex!(
                "787ed7b8a51f3ab84e0a66003f32da5c720b17eca7137d39abc66e3c80a892ff"
                "769de61791e5adc4b9ff85a31354900b202871279a8c49dc3f220f644c57a7b1"
            )
        );
        let de = msk.generate_user_key(b"Bob", HID_ENCRYPT).unwrap();
        assert_eq!(
            de.to_bytes(),
            hex!(
                "94736acd2c8c8796cc4785e938301a139a059d3537b6414140b2d31eecf41683"
                "115bae85f5d8bc6c3dbd9e5342979acccf3c2f4f28420b1cb4f8c0b59a19b158"
                "7aa5e47570da7600cd760a0cf7beaf71c447f3844753fe74fa7ba92ca7d3b55f"
                "27538a62e7f7bfb51dce08704796d94c9d56734f119ea44732b50e31cdeb75c1"
            )
        );
        let parsed = EncryptPrivateKey::from_bytes(&de.to_bytes(), msk.public_key()).unwrap();
        assert_eq!(parsed.point(), de.point());

        // e(Q, de) = e(Ppub_e, G2)
        let q = msk.public_key().user_point(b"Bob", HID_ENCRYPT);
        assert_eq!(pairing(&q, de.point()), *msk.public_key().pairing_base());
    }

    #[test]
    fn test_master_key_range() {
        assert_eq!(SignMasterPrivateKey::from_bytes(&[0u8; 32]).unwrap_err(), SM9Error::InvalidScalar);
        assert_eq!(
            EncryptMasterPrivateKey::from_bytes(&GFnElement::N.to_be_bytes()).unwrap_err(),
            SM9Error::InvalidScalar
        );
        assert_eq!(SignMasterPrivateKey::from_bytes(&KS[1..]).unwrap_err(), SM9Error::InvalidLength);
        assert_eq!(EncryptMasterPublicKey::from_bytes(&[0]).unwrap_err(), SM9Error::InvalidPoint);
        assert_eq!(SignMasterPublicKey::from_bytes(&[0u8; 128]).unwrap_err(), SM9Error::InvalidPoint);
    }

    #[test]
    fn test_degenerate_identity() {
        // ks = -H1(id || hid) makes the extraction scalar undefined.
        let ks = h1(b"Alice", HID_SIGN).neg_move();
        let msk = SignMasterPrivateKey::from_bytes(&ks.to_be_bytes()).unwrap();
        assert_eq!(msk.generate_user_key(b"Alice", HID_SIGN).unwrap_err(), SM9Error::InvalidScalar);
        assert!(msk.generate_user_key(b"Alice", HID_EXCHANGE).is_ok());
    }

    #[test]
    fn test_generate() {
        let msk = EncryptMasterPrivateKey::generate(&mut rand::rng()).unwrap();
        let de = msk.generate_user_key(b"Carol", HID_EXCHANGE).unwrap();
        let q = msk.public_key().user_point(b"Carol", HID_EXCHANGE);
        assert_eq!(pairing(&q, de.point()), *msk.public_key().pairing_base());

        let msk = SignMasterPrivateKey::generate(&mut rand::rng()).unwrap();
        let ds = msk.generate_user_key(b"Carol", HID_SIGN).unwrap();
        let parsed = SignPrivateKey::from_bytes(&ds.to_bytes(), msk.public_key()).unwrap();
        assert_eq!(parsed.point(), ds.point());
    }
}
