//! SM2 public key encryption (GB/T 32918.4).

use alloc::vec::Vec;

use rand::TryRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::ec::curve::{AffinePoint, PointForm, ProjectivePoint};
use super::error::{Result, SM2Error};
use super::*;
use crate::cryptobyte::{Builder, Parser};
use crate::internal::{ct_is_zero, xor_bytes};
use crate::{kdf, sm3};

const C3_LEN: usize = sm3::DIGEST_SIZE;

/// Order of the ciphertext components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiphertextMode {
    #[default]
    C1C3C2,
    C1C2C3,
    /// SEQUENCE { INTEGER x1, INTEGER y1, OCTET STRING c3, OCTET STRING c2 }
    Asn1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncrypterOpts {
    pub mode: CiphertextMode,
    /// Encoding of C1 in the plain modes. ASN.1 always carries x1 and y1.
    pub point_form: PointForm,
}

impl Default for EncrypterOpts {
    fn default() -> Self {
        EncrypterOpts {
            mode: CiphertextMode::C1C3C2,
            point_form: PointForm::Uncompressed,
        }
    }
}

// The parts of a ciphertext, independent of the splicing order.
struct Parts<'a> {
    c1: AffinePoint,
    c3: &'a [u8],
    c2: &'a [u8],
}

/// Encrypts msg to pk. An empty message gives an empty ciphertext.
pub fn encrypt<R: TryRngCore + ?Sized>(pk: &PublicKey, msg: &[u8], opts: &EncrypterOpts, rng: &mut R) -> Result<Vec<u8>> {
    if msg.is_empty() {
        return Ok(Vec::new());
    }
    let p = ProjectivePoint::from(pk.point());

    for _ in 0..MAX_RETRIES {
        let mut k = random_scalar(rng)?;
        let c1 = ProjectivePoint::new_from_scalar_base_mul(&k.limbs).to_affine();
        let s = p.scalar_mul(&k.limbs).to_affine();
        k.limbs.zeroize();

        let mut x2y2 = [0u8; 64];
        x2y2[..32].copy_from_slice(&s.x_bytes());
        x2y2[32..].copy_from_slice(&s.y_bytes());
        let mut c2 = kdf::kdf(&x2y2, msg.len()).map_err(|_| SM2Error::InvalidLength)?;
        if bool::from(ct_is_zero(&c2)) {
            x2y2.zeroize();
            tracing::trace!("sm2: zero kdf output, retrying encryption");
            continue;
        }
        xor_bytes(&mut c2, msg);
        let c3 = sm3!(&x2y2[..32], msg, &x2y2[32..]);
        x2y2.zeroize();

        let parts = Parts { c1, c3: &c3, c2: &c2 };
        return marshal(&parts, opts);
    }
    tracing::warn!(retries = MAX_RETRIES, "sm2: encryption exhausted its retries");
    Err(SM2Error::ResourceExhausted)
}

/// Decrypts a C1C3C2 or ASN.1 ciphertext, telling them apart by the first byte.
pub fn decrypt(sk: &PrivateKey, ct: &[u8]) -> Result<Vec<u8>> {
    let mode = match ct.first() {
        Some(0x30) => CiphertextMode::Asn1,
        _ => CiphertextMode::C1C3C2,
    };
    decrypt_with_mode(sk, ct, mode)
}

/// Decrypts a ciphertext laid out in the given mode. Every failure is
/// reported as [`SM2Error::DecryptionError`].
pub fn decrypt_with_mode(sk: &PrivateKey, ct: &[u8], mode: CiphertextMode) -> Result<Vec<u8>> {
    let parts = unmarshal(ct, mode).map_err(|_| SM2Error::DecryptionError)?;
    if parts.c2.is_empty() {
        return Err(SM2Error::DecryptionError);
    }

    let s = parts.c1.scalar_mul(&sk.scalar().limbs);
    if s.infinity {
        return Err(SM2Error::DecryptionError);
    }
    let mut x2y2 = [0u8; 64];
    x2y2[..32].copy_from_slice(&s.x_bytes());
    x2y2[32..].copy_from_slice(&s.y_bytes());

    let mut msg = kdf::kdf(&x2y2, parts.c2.len()).map_err(|_| SM2Error::DecryptionError)?;
    let zero = ct_is_zero(&msg);
    xor_bytes(&mut msg, parts.c2);
    let c3 = sm3!(&x2y2[..32], &msg, &x2y2[32..]);
    x2y2.zeroize();

    if bool::from(!zero & c3[..].ct_eq(parts.c3)) {
        return Ok(msg);
    }
    msg.zeroize();
    Err(SM2Error::DecryptionError)
}

fn marshal(parts: &Parts, opts: &EncrypterOpts) -> Result<Vec<u8>> {
    match opts.mode {
        CiphertextMode::Asn1 => {
            let mut b = Builder::new(Vec::with_capacity(parts.c2.len() + 116));
            b.add_asn1_sequence(|b| {
                b.add_asn1_uint(&parts.c1.x_bytes());
                b.add_asn1_uint(&parts.c1.y_bytes());
                b.add_asn1_octet_string(parts.c3);
                b.add_asn1_octet_string(parts.c2);
            });
            b.take().map_err(|_| SM2Error::InvalidEncoding)
        }
        CiphertextMode::C1C3C2 => Ok([&parts.c1.to_bytes(opts.point_form)[..], parts.c3, parts.c2].concat()),
        CiphertextMode::C1C2C3 => Ok([&parts.c1.to_bytes(opts.point_form)[..], parts.c2, parts.c3].concat()),
    }
}

fn c1_len(tag: u8) -> Result<usize> {
    match tag {
        0x02 | 0x03 => Ok(33),
        0x04 | 0x06 | 0x07 => Ok(65),
        _ => Err(SM2Error::InvalidEncoding),
    }
}

fn read_coordinate(p: &mut Parser) -> Result<[u8; 32]> {
    let v = p.read_asn1_uint_bytes().ok_or(SM2Error::InvalidEncoding)?;
    if v.len() > 32 {
        return Err(SM2Error::InvalidEncoding);
    }
    let mut out = [0u8; 32];
    out[32 - v.len()..].copy_from_slice(v);
    Ok(out)
}

fn unmarshal(ct: &[u8], mode: CiphertextMode) -> Result<Parts<'_>> {
    if mode == CiphertextMode::Asn1 {
        let mut input = Parser::new(ct);
        let mut seq = input.read_asn1_sequence().ok_or(SM2Error::InvalidEncoding)?;
        if !input.is_empty() {
            return Err(SM2Error::InvalidEncoding);
        }
        let x1 = read_coordinate(&mut seq)?;
        let y1 = read_coordinate(&mut seq)?;
        let c3 = seq.read_asn1_octet_string().ok_or(SM2Error::InvalidEncoding)?;
        let c2 = seq.read_asn1_octet_string().ok_or(SM2Error::InvalidEncoding)?;
        if !seq.is_empty() || c3.len() != C3_LEN {
            return Err(SM2Error::InvalidEncoding);
        }
        let c1 = AffinePoint::from_bytes(&[&[0x04u8][..], &x1[..], &y1[..]].concat())?;
        return Ok(Parts { c1, c3, c2 });
    }

    let tag = *ct.first().ok_or(SM2Error::InvalidLength)?;
    let n = c1_len(tag)?;
    if ct.len() < n + C3_LEN {
        return Err(SM2Error::InvalidLength);
    }
    let c1 = AffinePoint::from_bytes(&ct[..n])?;
    if c1.infinity {
        return Err(SM2Error::InvalidPoint);
    }
    let rest = &ct[n..];
    let (c3, c2) = match mode {
        CiphertextMode::C1C2C3 => {
            let (c2, c3) = rest.split_at(rest.len() - C3_LEN);
            (c3, c2)
        }
        _ => rest.split_at(C3_LEN),
    };
    Ok(Parts { c1, c3, c2 })
}

/// Converts a plain ciphertext in `from` order to ASN.1.
pub fn plain_to_asn1(ct: &[u8], from: CiphertextMode) -> Result<Vec<u8>> {
    if from == CiphertextMode::Asn1 {
        return Err(SM2Error::InvalidEncoding);
    }
    let parts = unmarshal(ct, from)?;
    marshal(&parts, &EncrypterOpts { mode: CiphertextMode::Asn1, ..Default::default() })
}

/// Converts an ASN.1 ciphertext to the plain `to` order with an uncompressed C1.
pub fn asn1_to_plain(ct: &[u8], to: CiphertextMode) -> Result<Vec<u8>> {
    if to == CiphertextMode::Asn1 {
        return Err(SM2Error::InvalidEncoding);
    }
    let parts = unmarshal(ct, CiphertextMode::Asn1)?;
    marshal(&parts, &EncrypterOpts { mode: to, ..Default::default() })
}

/// Swaps C1C3C2 and C1C2C3. The encoding of C1 is kept as is.
pub fn adjust_ciphertext_splicing_order(ct: &[u8], from: CiphertextMode, to: CiphertextMode) -> Result<Vec<u8>> {
    if from == CiphertextMode::Asn1 || to == CiphertextMode::Asn1 {
        return Err(SM2Error::InvalidEncoding);
    }
    if from == to {
        return Ok(ct.to_vec());
    }
    let tag = *ct.first().ok_or(SM2Error::InvalidLength)?;
    let n = c1_len(tag)?;
    if ct.len() < n + C3_LEN {
        return Err(SM2Error::InvalidLength);
    }
    let (c1, rest) = ct.split_at(n);
    let out = match from {
        CiphertextMode::C1C3C2 => {
            let (c3, c2) = rest.split_at(C3_LEN);
            [c1, c2, c3].concat()
        }
        _ => {
            let (c2, c3) = rest.split_at(rest.len() - C3_LEN);
            [c1, c3, c2].concat()
        }
    };
    Ok(out)
}
