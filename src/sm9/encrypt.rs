//! SM9 key encapsulation and public key encryption (GB/T 38635.2).
//!
//! Ciphertexts are `C1 || C3 || C2` with C1 = x || y (64 bytes) and
//! `C3 = SM3(C2 || K2)`.

use alloc::vec::Vec;

use rand::TryRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::ec::g1::G1;
use super::ec::gt::GT;
use super::ec::pairing::pairing;
use super::error::{Result, SM9Error};
use super::*;
use crate::internal::{ct_is_zero, xor_bytes};
use crate::padding::{Padding, Pkcs7};
use crate::{kdf, sm3, sm4};

const C1_LEN: usize = 64;
const C3_LEN: usize = sm3::DIGEST_SIZE;
// K2, the SM3 MAC key.
const MAC_KEY_LEN: usize = 32;

/// How C2 is computed from the message and K1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionMode {
    /// C2 = M xor K1, with K1 as long as M.
    #[default]
    Xor,
    /// C2 = SM4-ECB(K1, PKCS#7(M)) with a 16-byte K1.
    Sm4Ecb,
}

impl EncryptionMode {
    fn k1_len(&self, data_len: usize) -> usize {
        match self {
            EncryptionMode::Xor => data_len,
            EncryptionMode::Sm4Ecb => sm4::KEY_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncrypterOpts {
    pub mode: EncryptionMode,
    /// Defaults to [`HID_ENCRYPT`].
    pub hid: u8,
}

impl Default for EncrypterOpts {
    fn default() -> Self {
        EncrypterOpts { mode: EncryptionMode::Xor, hid: HID_ENCRYPT }
    }
}

// KDF(C || w || uid, len)
fn derive_key(c: &G1, w: &GT, uid: &[u8], len: usize) -> Result<Vec<u8>> {
    let mut z = Vec::with_capacity(C1_LEN + 384 + uid.len());
    z.extend_from_slice(&c.to_raw_bytes());
    z.extend_from_slice(&w.to_bytes());
    z.extend_from_slice(uid);
    let k = kdf::kdf(&z, len).map_err(|_| SM9Error::InvalidLength);
    z.zeroize();
    k
}

// C = [r]Q and K = KDF(C || e(Ppub_e, G2)^r || uid, len), redrawn while the
// first `check_len` bytes of K are zero.
fn encapsulate<R: TryRngCore + ?Sized>(
    mpk: &EncryptMasterPublicKey,
    uid: &[u8],
    hid: u8,
    len: usize,
    check_len: usize,
    rng: &mut R,
) -> Result<(Vec<u8>, G1)> {
    let q = mpk.user_point(uid, hid);
    let g = mpk.pairing_base();

    for _ in 0..MAX_RETRIES {
        let mut r = random_scalar(rng)?;
        let c = q.scalar_mul(&r);
        let mut w = g.pow(&r);
        r.limbs.zeroize();
        let k = derive_key(&c, &w, uid, len);
        w.zeroize();
        let mut k = k?;
        if bool::from(ct_is_zero(&k[..check_len])) {
            k.zeroize();
            tracing::trace!("sm9: zero kdf output, retrying encapsulation");
            continue;
        }
        return Ok((k, c));
    }
    tracing::warn!(retries = MAX_RETRIES, "sm9: encapsulation exhausted its retries");
    Err(SM9Error::ResourceExhausted)
}

/// Generates a `key_len`-byte key for uid and the point C that carries it.
pub fn wrap_key<R: TryRngCore + ?Sized>(
    mpk: &EncryptMasterPublicKey,
    uid: &[u8],
    hid: u8,
    key_len: usize,
    rng: &mut R,
) -> Result<(Vec<u8>, G1)> {
    if key_len == 0 {
        return Err(SM9Error::InvalidLength);
    }
    encapsulate(mpk, uid, hid, key_len, key_len, rng)
}

/// Recovers the key wrapped in C with the user key of uid.
pub fn unwrap_key(sk: &EncryptPrivateKey, uid: &[u8], c: &G1, key_len: usize) -> Result<Vec<u8>> {
    if key_len == 0 {
        return Err(SM9Error::InvalidLength);
    }
    if bool::from(c.is_infinity()) || !c.is_on_curve() {
        return Err(SM9Error::InvalidPoint);
    }
    let mut w = pairing(c, sk.point());
    let k = derive_key(c, &w, uid, key_len);
    w.zeroize();
    let mut k = k?;
    if bool::from(ct_is_zero(&k)) {
        k.zeroize();
        return Err(SM9Error::DecryptionError);
    }
    Ok(k)
}

/// Encrypts msg to uid. An empty message gives an empty ciphertext.
pub fn encrypt<R: TryRngCore + ?Sized>(
    mpk: &EncryptMasterPublicKey,
    uid: &[u8],
    msg: &[u8],
    opts: &EncrypterOpts,
    rng: &mut R,
) -> Result<Vec<u8>> {
    if msg.is_empty() {
        return Ok(Vec::new());
    }
    let k1_len = opts.mode.k1_len(msg.len());
    let (mut k, c1) = encapsulate(mpk, uid, opts.hid, k1_len + MAC_KEY_LEN, k1_len, rng)?;
    let (k1, k2) = k.split_at(k1_len);

    let c2 = match opts.mode {
        EncryptionMode::Xor => {
            let mut c2 = msg.to_vec();
            xor_bytes(&mut c2, k1);
            c2
        }
        EncryptionMode::Sm4Ecb => {
            let cipher = sm4::Cipher::new_from_slice(k1).ok_or(SM9Error::InvalidLength)?;
            let mut c2 = Pkcs7.pad(msg, sm4::BLOCK_SIZE);
            cipher.encrypt_inplace(&mut c2);
            c2
        }
    };
    let c3 = sm3!(&c2[..], k2);
    k.zeroize();
    Ok([&c1.to_raw_bytes()[..], &c3[..], &c2[..]].concat())
}

/// Decrypts a C1 || C3 || C2 ciphertext. Every failure is reported as
/// [`SM9Error::DecryptionError`].
pub fn decrypt(sk: &EncryptPrivateKey, uid: &[u8], ct: &[u8], mode: EncryptionMode) -> Result<Vec<u8>> {
    if ct.len() <= C1_LEN + C3_LEN {
        return Err(SM9Error::DecryptionError);
    }
    let (c1, rest) = ct.split_at(C1_LEN);
    let (c3, c2) = rest.split_at(C3_LEN);
    let c1 = G1::from_raw_bytes(c1).map_err(|_| SM9Error::DecryptionError)?;
    if mode == EncryptionMode::Sm4Ecb && c2.len() % sm4::BLOCK_SIZE != 0 {
        return Err(SM9Error::DecryptionError);
    }

    let k1_len = mode.k1_len(c2.len());
    let mut w = pairing(&c1, sk.point());
    let k = derive_key(&c1, &w, uid, k1_len + MAC_KEY_LEN);
    w.zeroize();
    let mut k = k.map_err(|_| SM9Error::DecryptionError)?;
    let (k1, k2) = k.split_at(k1_len);

    let zero = ct_is_zero(k1);
    let tag = sm3!(c2, k2);
    if !bool::from(!zero & tag[..].ct_eq(c3)) {
        k.zeroize();
        return Err(SM9Error::DecryptionError);
    }

    let msg = match mode {
        EncryptionMode::Xor => {
            let mut msg = c2.to_vec();
            xor_bytes(&mut msg, k1);
            Ok(msg)
        }
        EncryptionMode::Sm4Ecb => match sm4::Cipher::new_from_slice(k1) {
            Some(cipher) => {
                let mut buf = c2.to_vec();
                cipher.decrypt_inplace(&mut buf);
                let msg = Pkcs7.unpad(&buf, sm4::BLOCK_SIZE).map(|m| m.to_vec());
                buf.zeroize();
                msg.map_err(|_| SM9Error::DecryptionError)
            }
            None => Err(SM9Error::DecryptionError),
        },
    };
    k.zeroize();
    msg
}
