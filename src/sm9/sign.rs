//! SM9 identity-based signatures (GB/T 38635.2).

use alloc::vec::Vec;

use rand::TryRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::ec::g1::G1;
use super::ec::g2::G2;
use super::ec::gfn::GFnElement;
use super::ec::pairing::pairing;
use super::error::{Result, SM9Error};
use super::hash::{h1, h2};
use super::*;
use crate::cryptobyte::asn1::BitString;
use crate::cryptobyte::{Builder, Parser};
use crate::sm2::ec::curve::PointForm;

const H_LEN: usize = 32;
const S_LEN: usize = 65;

/// A signature (h, S): h in [1, n-1] and S in G1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub h: [u8; 32],
    pub s: G1,
}

impl Signature {
    /// h || S with S uncompressed, 97 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        [&self.h[..], &self.s.to_bytes(PointForm::Uncompressed)[..]].concat()
    }

    pub fn from_bytes(b: &[u8]) -> Result<Signature> {
        if b.len() <= H_LEN {
            return Err(SM9Error::InvalidLength);
        }
        let (h, s) = b.split_at(H_LEN);
        Self::from_parts(h, s)
    }

    /// SEQUENCE { OCTET STRING h, BIT STRING S }
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let s = BitString::from_bytes(&self.s.to_bytes(PointForm::Uncompressed));
        let mut b = Builder::new(Vec::with_capacity(H_LEN + S_LEN + 8));
        b.add_asn1_sequence(|b| {
            b.add_asn1_octet_string(&self.h);
            b.add_asn1_bit_string(&s);
        });
        b.take().map_err(|_| SM9Error::InvalidEncoding)
    }

    /// Strict DER; trailing data is rejected.
    pub fn from_der(der: &[u8]) -> Result<Signature> {
        let mut input = Parser::new(der);
        let mut seq = input.read_asn1_sequence().ok_or(SM9Error::InvalidEncoding)?;
        if !input.is_empty() {
            return Err(SM9Error::InvalidEncoding);
        }
        let h = seq.read_asn1_octet_string().ok_or(SM9Error::InvalidEncoding)?;
        let s = seq.read_asn1_bit_string().ok_or(SM9Error::InvalidEncoding)?;
        if !seq.is_empty() || s.padding_bits() != 0 {
            return Err(SM9Error::InvalidEncoding);
        }
        Self::from_parts(h, s.as_slice())
    }

    fn from_parts(h: &[u8], s: &[u8]) -> Result<Signature> {
        let h: [u8; 32] = h.try_into().map_err(|_| SM9Error::InvalidLength)?;
        let s = G1::from_bytes(s)?;
        Ok(Signature { h, s })
    }
}

/// Signs msg with the user key ds.
pub fn sign<R: TryRngCore + ?Sized>(sk: &SignPrivateKey, msg: &[u8], rng: &mut R) -> Result<Signature> {
    let g = sk.master_public_key().pairing_base();

    for _ in 0..MAX_RETRIES {
        let mut r = random_scalar(rng)?;
        let mut w = g.pow(&r);
        let h = h2(msg, &w);
        w.zeroize();

        // l = (r - h) mod n
        let mut l = GFnElement::new_from_sub(&r, &h);
        r.limbs.zeroize();
        if bool::from(l.is_zero()) {
            l.limbs.zeroize();
            tracing::trace!("sm9: zero l, retrying signature");
            continue;
        }
        let s = sk.point().scalar_mul(&l);
        l.limbs.zeroize();
        return Ok(Signature { h: h.to_be_bytes(), s });
    }
    tracing::warn!(retries = MAX_RETRIES, "sm9: signing exhausted its retries");
    Err(SM9Error::ResourceExhausted)
}

/// Verifies a signature by the holder of uid under the signature master
/// public key.
pub fn verify(mpk: &SignMasterPublicKey, uid: &[u8], hid: u8, msg: &[u8], sig: &Signature) -> bool {
    let Some(h) = GFnElement::from_be_bytes_checked(&sig.h) else {
        return false;
    };
    if bool::from(h.is_zero() | sig.s.is_infinity()) || !sig.s.is_on_curve() {
        return false;
    }

    let t = mpk.pairing_base().pow(&h);
    // P = [H1(uid || hid)]G2 + Ppub_s
    let p = G2::new_from_scalar_base_mul(&h1(uid, hid)).add(mpk.point());
    let w = pairing(&sig.s, &p) * t;
    h2(msg, &w).ct_eq(&h).into()
}

/// Signs msg and returns the DER signature.
pub fn sign_asn1<R: TryRngCore + ?Sized>(sk: &SignPrivateKey, msg: &[u8], rng: &mut R) -> Result<Vec<u8>> {
    sign(sk, msg, rng)?.to_der()
}

/// Verifies a DER signature.
pub fn verify_asn1(mpk: &SignMasterPublicKey, uid: &[u8], hid: u8, msg: &[u8], sig: &[u8]) -> bool {
    match Signature::from_der(sig) {
        Ok(sig) => verify(mpk, uid, hid, msg, &sig),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::keys::tests::KS;
    use super::*;
    use crate::rand::ConstRngCore;
    use hex_literal::hex;

    const R: [u8; 32] = hex!("00033c8616b06704813203dfd00965022ed15975c662337aed648835dc4b1cbe");
    const MSG: &[u8] = b"Chinese IBS standard";

    fn alice() -> SignPrivateKey {
        let msk = SignMasterPrivateKey::from_bytes(&KS).unwrap();
        msk.generate_user_key(b"Alice", HID_SIGN).unwrap()
    }

    #[test]
    fn test_sign_vector() {
        let sk = alice();
        let sig = sign(&sk, MSG, &mut ConstRngCore::new(R)).unwrap();
        assert_eq!(sig.h, hex!("823c4b21e4bd2dfe1ed92c606653e996668563152fc33f55d7bfbb9bd9705adb"));
        assert_eq!(
            sig.s.to_raw_bytes(),
            hex!(
                "73bf96923ce58b6ad0e13e9643a406d8eb98417c50ef1b29cef9adb48b6d598c"
                "856712f1c2e0968ab7769f42a99586aed139d5b8b3e15891827cc2aced9baa05"
            )
        );
        assert!(verify(sk.master_public_key(), b"Alice", HID_SIGN, MSG, &sig));
        assert!(!verify(sk.master_public_key(), b"Bob", HID_SIGN, MSG, &sig));
        assert!(!verify(sk.master_public_key(), b"Alice", HID_SIGN, b"Chinese IBE standard", &sig));
    }

    #[test]
    fn test_encodings() {
        let sk = alice();
        let sig = sign(&sk, MSG, &mut rand::rng()).unwrap();

        let raw = sig.to_bytes();
        assert_eq!(raw.len(), 97);
        assert_eq!(Signature::from_bytes(&raw).unwrap(), sig);
        assert_eq!(Signature::from_bytes(&raw[..32]).unwrap_err(), SM9Error::InvalidLength);

        let der = sig.to_der().unwrap();
        assert_eq!(Signature::from_der(&der).unwrap(), sig);
        let mut trailing = der.clone();
        trailing.push(0);
        assert_eq!(Signature::from_der(&trailing).unwrap_err(), SM9Error::InvalidEncoding);

        let mpk = sk.master_public_key();
        assert!(verify_asn1(mpk, b"Alice", HID_SIGN, MSG, &der));
        assert!(!verify_asn1(mpk, b"Alice", HID_SIGN, MSG, &raw));
        assert!(sign_asn1(&sk, MSG, &mut rand::rng()).is_ok_and(|d| verify_asn1(mpk, b"Alice", HID_SIGN, MSG, &d)));
    }

    #[test]
    fn test_reject_malformed() {
        let sk = alice();
        let mpk = sk.master_public_key();
        let sig = sign(&sk, MSG, &mut rand::rng()).unwrap();

        let zero_h = Signature { h: [0; 32], ..sig };
        assert!(!verify(mpk, b"Alice", HID_SIGN, MSG, &zero_h));
        let big_h = Signature { h: GFnElement::N.to_be_bytes(), ..sig };
        assert!(!verify(mpk, b"Alice", HID_SIGN, MSG, &big_h));
        let no_s = Signature { s: G1::INFINITY, ..sig };
        assert!(!verify(mpk, b"Alice", HID_SIGN, MSG, &no_s));
        let other_s = Signature { s: G1::GENERATOR, ..sig };
        assert!(!verify(mpk, b"Alice", HID_SIGN, MSG, &other_s));
    }
}
