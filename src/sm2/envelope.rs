//! SM2 key pairs enveloped under an SM4 key (GB/T 35276-2017).
//!
//! ```text
//! SM2EnvelopedKey ::= SEQUENCE {
//!     symAlgID                AlgorithmIdentifier,
//!     symEncryptedKey         SM2Cipher,
//!     sm2PublicKey            BIT STRING,
//!     sm2EncryptedPrivateKey  BIT STRING
//! }
//! ```
//!
//! The private key is encrypted with SM4-ECB without padding.

use alloc::vec::Vec;

use rand::TryRngCore;
use zeroize::Zeroize;

use super::encrypt::{decrypt_with_mode, encrypt, CiphertextMode, EncrypterOpts};
use super::error::{Result, SM2Error};
use super::*;
use crate::cryptobyte::asn1::BitString;
use crate::cryptobyte::oid::{OidSM4, OidSM4ECB};
use crate::cryptobyte::{Builder, Parser, SEQUENCE};
use crate::sm4;

/// Envelopes `key` for the holder of `pk`.
pub fn marshal_enveloped_private_key<R: TryRngCore + ?Sized>(rng: &mut R, pk: &PublicKey, key: &PrivateKey) -> Result<Vec<u8>> {
    let mut sym_key = [0u8; sm4::KEY_SIZE];
    rng.try_fill_bytes(&mut sym_key).map_err(|_| SM2Error::RandomnessFailure)?;

    let mut d = key.to_bytes();
    let mut encrypted_d = [0u8; 32];
    sm4::Cipher::new(&sym_key).encrypt(&mut encrypted_d, &d);
    d.zeroize();

    let opts = EncrypterOpts { mode: CiphertextMode::Asn1, ..Default::default() };
    let encrypted_key = encrypt(pk, &sym_key, &opts, rng);
    sym_key.zeroize();
    let encrypted_key = encrypted_key?;

    let mut b = Builder::new(Vec::with_capacity(256));
    b.add_asn1_sequence(|b| {
        b.add_asn1_sequence(|b| {
            b.add_asn1_object_identifier(&OidSM4ECB);
            b.add_asn1_null();
        });
        b.add_bytes(&encrypted_key);
        b.add_asn1_bit_string(&BitString::from_bytes(&key.public_key().to_bytes(PointForm::Uncompressed)));
        b.add_asn1_bit_string(&BitString::from_bytes(&encrypted_d));
    });
    b.take().map_err(|_| SM2Error::InvalidEncoding)
}

/// Opens an enveloped key with `sk`. The recovered private key must match
/// the enveloped public key.
pub fn parse_enveloped_private_key(sk: &PrivateKey, der: &[u8]) -> Result<PrivateKey> {
    let mut input = Parser::new(der);
    let mut inner = input.read_asn1_sequence().ok_or(SM2Error::InvalidEncoding)?;
    if !input.is_empty() {
        return Err(SM2Error::InvalidEncoding);
    }
    let mut alg_id = inner.read_asn1_sequence().ok_or(SM2Error::InvalidEncoding)?;
    let encrypted_key = inner.read_asn1_element(SEQUENCE).ok_or(SM2Error::InvalidEncoding)?;
    let pub_bits = inner.read_asn1_bit_string().ok_or(SM2Error::InvalidEncoding)?;
    let d_bits = inner.read_asn1_bit_string().ok_or(SM2Error::InvalidEncoding)?;
    if !inner.is_empty() {
        return Err(SM2Error::InvalidEncoding);
    }

    let oid = alg_id.read_asn1_object_identifier().ok_or(SM2Error::InvalidEncoding)?;
    if oid != OidSM4 && oid != OidSM4ECB {
        tracing::debug!(%oid, "sm2: unsupported cipher in enveloped key");
        return Err(SM2Error::InvalidEncoding);
    }
    let pk = PublicKey::from_bytes(&pub_bits.right_align())?;

    let mut sym_key = decrypt_with_mode(sk, encrypted_key, CiphertextMode::Asn1)?;
    let cipher = sm4::Cipher::new_from_slice(&sym_key).ok_or(SM2Error::DecryptionError);
    sym_key.zeroize();
    let cipher = cipher?;

    let encrypted_d = d_bits.right_align();
    if encrypted_d.len() != 32 {
        return Err(SM2Error::InvalidLength);
    }
    let mut d = [0u8; 32];
    cipher.decrypt(&mut d, &encrypted_d);
    let key = PrivateKey::from_bytes(&d);
    d.zeroize();
    let key = key?;

    if key.public_key() != &pk {
        return Err(SM2Error::InvalidPoint);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_roundtrip() {
        let mut rng = rand::rng();
        let holder = PrivateKey::generate(&mut rng).unwrap();
        let key = PrivateKey::generate(&mut rng).unwrap();

        let der = marshal_enveloped_private_key(&mut rng, holder.public_key(), &key).unwrap();
        assert_eq!(der[0], 0x30);
        let opened = parse_enveloped_private_key(&holder, &der).unwrap();
        assert_eq!(opened.to_bytes(), key.to_bytes());

        let stranger = PrivateKey::generate(&mut rng).unwrap();
        assert_eq!(parse_enveloped_private_key(&stranger, &der).unwrap_err(), SM2Error::DecryptionError);
    }

    #[test]
    fn test_envelope_layout() {
        let mut rng = rand::rng();
        let holder = PrivateKey::generate(&mut rng).unwrap();
        let key = PrivateKey::generate(&mut rng).unwrap();
        let der = marshal_enveloped_private_key(&mut rng, holder.public_key(), &key).unwrap();

        let mut input = Parser::new(&der);
        let mut inner = input.read_asn1_sequence().unwrap();
        let mut alg = inner.read_asn1_sequence().unwrap();
        assert_eq!(alg.read_asn1_object_identifier().unwrap(), OidSM4ECB);
        let cipher = inner.read_asn1_element(SEQUENCE).unwrap();
        assert_eq!(decrypt(&holder, cipher).unwrap().len(), 16);
        let pub_bits = inner.read_asn1_bit_string().unwrap();
        assert_eq!(pub_bits.as_slice(), &key.public_key().to_bytes(PointForm::Uncompressed)[..]);
        assert_eq!(inner.read_asn1_bit_string().unwrap().as_slice().len(), 32);
    }

    #[test]
    fn test_envelope_mismatched_public_key() {
        let mut rng = rand::rng();
        let holder = PrivateKey::generate(&mut rng).unwrap();
        let key = PrivateKey::generate(&mut rng).unwrap();
        let other = PrivateKey::generate(&mut rng).unwrap();
        let der = marshal_enveloped_private_key(&mut rng, holder.public_key(), &key).unwrap();

        // splice in another public key, same length.
        let old = key.public_key().to_bytes(PointForm::Uncompressed);
        let new = other.public_key().to_bytes(PointForm::Uncompressed);
        let pos = der.windows(65).position(|w| w == &old[..]).unwrap();
        let mut forged = der.clone();
        forged[pos..pos + 65].copy_from_slice(&new);
        assert_eq!(parse_enveloped_private_key(&holder, &forged).unwrap_err(), SM2Error::InvalidPoint);

        assert_eq!(parse_enveloped_private_key(&holder, &der[..der.len() - 1]).unwrap_err(), SM2Error::InvalidEncoding);
    }
}
