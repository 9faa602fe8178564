//! SM2 digital signatures (GB/T 32918.2).

use alloc::vec::Vec;

use rand::TryRngCore;
use subtle::ConstantTimeEq;

use super::ec::arith::{add256, limbs_to_be_bytes};
use super::ec::curve::{AffinePoint, ProjectivePoint};
use super::ec::gfn::GFnElement;
use super::ec::gfp::GFpElement;
use super::error::{Result, SM2Error};
use super::*;
use crate::cryptobyte::{Builder, Parser};
use crate::sm3;

/// The user id assumed when none is given.
pub const DEFAULT_UID: &[u8] = b"1234567812345678";

// Identities longer than this overflow the 16-bit ENTL.
const MAX_UID_LEN: usize = 8191;

// a, b, Gx, Gy
const ABG: [u8; 128] = [
    /* a */
    0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC,
    /* b */
    0x28, 0xE9, 0xFA, 0x9E, 0x9D, 0x9F, 0x5E, 0x34, 0x4D, 0x5A, 0x9E, 0x4B, 0xCF, 0x65, 0x09, 0xA7, 0xF3, 0x97, 0x89, 0xF5, 0x15, 0xAB, 0x8F, 0x92, 0xDD, 0xBC, 0xBD, 0x41, 0x4D, 0x94, 0x0E, 0x93,
    /* Gx */
    0x32, 0xC4, 0xAE, 0x2C, 0x1F, 0x19, 0x81, 0x19, 0x5F, 0x99, 0x04, 0x46, 0x6A, 0x39, 0xC9, 0x94, 0x8F, 0xE3, 0x0B, 0xBF, 0xF2, 0x66, 0x0B, 0xE1, 0x71, 0x5A, 0x45, 0x89, 0x33, 0x4C, 0x74, 0xC7,
    /* Gy */
    0xBC, 0x37, 0x36, 0xA2, 0xF4, 0xF6, 0x77, 0x9C, 0x59, 0xBD, 0xCE, 0xE3, 0x6B, 0x69, 0x21, 0x53, 0xD0, 0xA9, 0x87, 0x7C, 0xC6, 0x2A, 0x47, 0x40, 0x02, 0xDF, 0x32, 0xE5, 0x21, 0x39, 0xF0, 0xA0,
];

/// Z_A = SM3(ENTL || ID || a || b || Gx || Gy || xA || yA).
pub fn compute_za(uid: &[u8], pk: &PublicKey) -> Result<[u8; 32]> {
    if uid.len() > MAX_UID_LEN {
        return Err(SM2Error::InvalidUid);
    }
    let entl = (uid.len() as u16) << 3;
    let mut d = sm3::Digest::new();
    d.write(&entl.to_be_bytes()).write(uid).write(&ABG);
    d.write(&pk.x_bytes()).write(&pk.y_bytes());
    Ok(d.sum())
}

/// e = SM3(Z_A || msg), the value actually signed.
pub fn hash_message(uid: Option<&[u8]>, pk: &PublicKey, msg: &[u8]) -> Result<[u8; 32]> {
    let za = compute_za(uid.unwrap_or(DEFAULT_UID), pk)?;
    Ok(sm3!(&za, msg))
}

/// Signature options.
#[derive(Debug, Clone, Copy)]
pub struct SignerOpts<'a> {
    /// Defaults to [`DEFAULT_UID`].
    pub uid: Option<&'a [u8]>,
    /// false: the message is already the 32-byte e.
    pub hash_msg: bool,
}

impl Default for SignerOpts<'_> {
    fn default() -> Self {
        SignerOpts { uid: None, hash_msg: true }
    }
}

/// An SM2 signature (r, s), both in [1, n-1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

fn read_integer(p: &mut Parser) -> Result<[u8; 32]> {
    let v = p.read_asn1_uint_bytes().ok_or(SM2Error::InvalidEncoding)?;
    if v.len() > 32 {
        return Err(SM2Error::InvalidEncoding);
    }
    let mut out = [0u8; 32];
    out[32 - v.len()..].copy_from_slice(v);
    Ok(out)
}

impl Signature {
    /// SEQUENCE { INTEGER r, INTEGER s }
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let mut b = Builder::new(Vec::with_capacity(72));
        b.add_asn1_sequence(|b| {
            b.add_asn1_uint(&self.r);
            b.add_asn1_uint(&self.s);
        });
        b.take().map_err(|_| SM2Error::InvalidEncoding)
    }

    /// Strict DER; trailing data is rejected.
    pub fn from_der(der: &[u8]) -> Result<Signature> {
        let mut input = Parser::new(der);
        let mut seq = input.read_asn1_sequence().ok_or(SM2Error::InvalidEncoding)?;
        if !input.is_empty() {
            return Err(SM2Error::InvalidEncoding);
        }
        let r = read_integer(&mut seq)?;
        let s = read_integer(&mut seq)?;
        if !seq.is_empty() {
            return Err(SM2Error::InvalidEncoding);
        }
        Ok(Signature { r, s })
    }

    // r and s in [1, n-1].
    fn scalars(&self) -> Option<(GFnElement, GFnElement)> {
        let r = GFnElement::from_be_bytes_checked(&self.r)?;
        let s = GFnElement::from_be_bytes_checked(&self.s)?;
        if bool::from(r.is_zero() | s.is_zero()) {
            return None;
        }
        Some((r, s))
    }
}

/// Signs the 32-byte e with a fresh nonce.
pub fn sign_hash<R: TryRngCore + ?Sized>(sk: &PrivateKey, e: &[u8; 32], rng: &mut R) -> Result<Signature> {
    let e = GFnElement::from(e);
    let d = sk.scalar();
    let d1inv = sk.d1inv();

    for _ in 0..MAX_RETRIES {
        let mut k = random_scalar(rng)?;
        let Some(x) = ProjectivePoint::new_from_scalar_base_mul(&k.limbs).get_affine_x() else {
            continue;
        };

        // r = e + x1 mod n, rejecting r = 0 and r + k = n.
        let r = GFnElement::from(&x).add_move(&e);
        let rk = GFnElement::new_from_add(&r, &k);
        if bool::from(r.is_zero() | rk.is_zero()) {
            tracing::trace!("sm2: degenerate r, retrying signature");
            continue;
        }

        // s = (1+d)^-1 * (k - r*d) mod n
        let rd = GFnElement::mul_plain(&r, d);
        let s = GFnElement::mul_plain(d1inv, &k.sub_move(&rd));
        k.limbs = [0; 4];
        if bool::from(s.is_zero()) {
            tracing::trace!("sm2: zero s, retrying signature");
            continue;
        }
        return Ok(Signature { r: r.to_be_bytes(), s: s.to_be_bytes() });
    }
    tracing::warn!(retries = MAX_RETRIES, "sm2: signing exhausted its retries");
    Err(SM2Error::ResourceExhausted)
}

/// Verifies a signature over the 32-byte e.
pub fn verify_hash(pk: &PublicKey, e: &[u8; 32], sig: &Signature) -> bool {
    let Some((r, s)) = sig.scalars() else {
        return false;
    };
    let t = GFnElement::new_from_add(&r, &s);
    if bool::from(t.is_zero()) {
        return false;
    }

    // [s]G + [t]P
    let p = ProjectivePoint::from(pk.point());
    let Some(x) = ProjectivePoint::new_from_double_scalar_mul(&s.limbs, &t.limbs, &p).get_affine_x() else {
        return false;
    };
    let v = GFnElement::from(&x).add_move(&GFnElement::from(e));
    v.ct_eq(&r).into()
}

/// Signs msg and returns the DER signature.
pub fn sign<R: TryRngCore + ?Sized>(sk: &PrivateKey, msg: &[u8], opts: &SignerOpts, rng: &mut R) -> Result<Vec<u8>> {
    let e = digest(sk.public_key(), msg, opts)?;
    sign_hash(sk, &e, rng)?.to_der()
}

/// Verifies a DER signature over msg.
pub fn verify(pk: &PublicKey, msg: &[u8], opts: &SignerOpts, sig: &[u8]) -> bool {
    let (Ok(e), Ok(sig)) = (digest(pk, msg, opts), Signature::from_der(sig)) else {
        return false;
    };
    verify_hash(pk, &e, &sig)
}

fn digest(pk: &PublicKey, msg: &[u8], opts: &SignerOpts) -> Result<[u8; 32]> {
    if opts.hash_msg {
        return hash_message(opts.uid, pk, msg);
    }
    msg.try_into().map_err(|_| SM2Error::InvalidLength)
}

/// Signs SM3(Z_A || msg) under uid (default id when None).
pub fn sign_message<R: TryRngCore + ?Sized>(sk: &PrivateKey, uid: Option<&[u8]>, msg: &[u8], rng: &mut R) -> Result<Vec<u8>> {
    sign(sk, msg, &SignerOpts { uid, hash_msg: true }, rng)
}

pub fn verify_message(pk: &PublicKey, uid: Option<&[u8]>, msg: &[u8], sig: &[u8]) -> bool {
    verify(pk, msg, &SignerOpts { uid, hash_msg: true }, sig)
}

/// Returns every public key for which `sig` is a valid signature of e:
/// P = (r+s)^-1 * (R - [s]G) for each R with x = r - e or r - e + n.
pub fn recover_public_keys(e: &[u8; 32], sig: &[u8]) -> Result<Vec<PublicKey>> {
    let sig = Signature::from_der(sig)?;
    let (r, s) = sig.scalars().ok_or(SM2Error::InvalidScalar)?;
    let t = GFnElement::new_from_add(&r, &s);
    if bool::from(t.is_zero()) {
        return Err(SM2Error::InvalidScalar);
    }
    let tinv = GFnElement::invert_plain(&t);

    let rx = r.sub_move(&GFnElement::from(e));
    let mut xs = vec![rx.to_be_bytes()];
    let n = GFnElement::N.limbs;
    let (a0, a1, a2, a3, carry) = add256(rx.limbs[0], rx.limbs[1], rx.limbs[2], rx.limbs[3], n[0], n[1], n[2], n[3]);
    let rxn = [a0, a1, a2, a3];
    // x + n may still be below p.
    if !carry {
        xs.push(limbs_to_be_bytes(&rxn));
    }

    let mut sg = ProjectivePoint::new_from_scalar_base_mul(&s.limbs);
    sg.neg();

    let mut keys = Vec::with_capacity(4);
    for x in xs {
        let Some(x) = GFpElement::from_be_bytes(&x) else {
            continue;
        };
        for odd in [0u8, 1] {
            let Ok(rp) = AffinePoint::decompress(&x, odd) else {
                continue;
            };
            let mut q = ProjectivePoint::from(rp);
            q.add(&sg);
            let p = q.scalar_mul(&tinv.limbs).to_affine();
            if let Ok(pk) = PublicKey::from_point(p) {
                keys.push(pk);
            }
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::ConstRngCore;
    use hex_literal::hex;

    const D: [u8; 32] = hex!("6c5a0a0b2eed3cbec3e4f1252bfe0e28c504a1c6bf1999eebb0af9ef0f8e6c85");
    const MSG: &[u8] = b"ShangMi SM2 Sign Standard";

    #[test]
    fn test_za() {
        let sk = PrivateKey::from_bytes(&D).unwrap();
        let za = compute_za(DEFAULT_UID, sk.public_key()).unwrap();
        assert_eq!(za, hex!("1a5970f7804cbe332809ecb70e4e8de3cee55309321f568a14b12d05270b236d"));

        // ENTL of the default id is 128 bits.
        let mut d = sm3::Digest::new();
        d.write(&[0x00, 0x80]).write(DEFAULT_UID).write(&ABG);
        d.write(&sk.public_key().x_bytes()).write(&sk.public_key().y_bytes());
        assert_eq!(d.sum(), za);

        assert_eq!(compute_za(&[0u8; 8192], sk.public_key()), Err(SM2Error::InvalidUid));
        assert!(compute_za(&[0u8; 8191], sk.public_key()).is_ok());
    }

    #[test]
    fn test_sign_fixed_nonce() {
        let sk = PrivateKey::from_bytes(&D).unwrap();
        let e = hash_message(None, sk.public_key(), MSG).unwrap();
        assert_eq!(e, hex!("4cac379502f9c465060ae33889cc95606fbc16f2128733f95a7539ca9d6f5290"));

        let k = hex!("59276E27D506861A16680F3AD9C02DCCEF3CC1FA3CDBE4CE6D54B80DEAC1BC21");
        let sig = sign_hash(&sk, &e, &mut ConstRngCore::new(k)).unwrap();
        assert_eq!(sig.r, hex!("519834069186dbfd680f155f18449416b11a45d0208e7008a9d94897cb83ed03"));
        assert_eq!(sig.s, hex!("22ac6da85b44ae1ffedaab8d469cfcba79a47658c20942af252675e86224dee1"));
        assert_eq!(
            sig.to_der().unwrap(),
            hex!(
                "30440220519834069186dbfd680f155f18449416b11a45d0208e7008a9d94897cb83ed03022022ac6da85b44ae1ffedaab8d469cfcba79a47658c20942af252675e86224dee1"
            )
        );
        assert!(verify_hash(sk.public_key(), &e, &sig));
    }

    #[test]
    fn test_sign_verify_message() {
        let sk = PrivateKey::from_bytes(&D).unwrap();
        let pk = sk.public_key();
        let mut rng = rand::rng();
        let sig = sign_message(&sk, None, MSG, &mut rng).unwrap();
        assert!(verify_message(pk, None, MSG, &sig));
        assert!(!verify_message(pk, Some(b"another id"), MSG, &sig));
        assert!(!verify_message(pk, None, b"ShangMi SM2 Sign Standard.", &sig));

        let sig = sign_message(&sk, Some(b"alice@example.com"), MSG, &mut rng).unwrap();
        assert!(verify_message(pk, Some(b"alice@example.com"), MSG, &sig));

        let other = PrivateKey::generate(&mut rng).unwrap();
        assert!(!verify_message(other.public_key(), Some(b"alice@example.com"), MSG, &sig));
    }

    #[test]
    fn test_sign_raw_digest() {
        let sk = PrivateKey::generate(&mut rand::rng()).unwrap();
        let opts = SignerOpts { uid: None, hash_msg: false };
        let e = [0x5au8; 32];
        let sig = sign(&sk, &e, &opts, &mut rand::rng()).unwrap();
        assert!(verify(sk.public_key(), &e, &opts, &sig));
        assert_eq!(sign(&sk, &e[..31], &opts, &mut rand::rng()), Err(SM2Error::InvalidLength));
    }

    #[test]
    fn test_bit_flips() {
        let sk = PrivateKey::generate(&mut rand::rng()).unwrap();
        let e = hash_message(None, sk.public_key(), MSG).unwrap();
        let sig = sign_hash(&sk, &e, &mut rand::rng()).unwrap();
        for i in 0..256 {
            let mut f = e;
            f[i / 8] ^= 1 << (i % 8);
            assert!(!verify_hash(sk.public_key(), &f, &sig));
        }
    }

    #[test]
    fn test_verify_rejects_range() {
        let sk = PrivateKey::from_bytes(&D).unwrap();
        let e = [1u8; 32];
        let sig = sign_hash(&sk, &e, &mut rand::rng()).unwrap();

        let zero = Signature { r: [0; 32], s: sig.s };
        assert!(!verify_hash(sk.public_key(), &e, &zero));
        let big = Signature { r: GFnElement::N.to_be_bytes(), s: sig.s };
        assert!(!verify_hash(sk.public_key(), &e, &big));
        let zero = Signature { r: sig.r, s: [0; 32] };
        assert!(!verify_hash(sk.public_key(), &e, &zero));
    }

    #[test]
    fn test_der() {
        let sig = Signature { r: [0; 32], s: [0x80; 32] };
        let mut r = [0u8; 32];
        r[31] = 1;
        let sig = Signature { r, ..sig };
        let der = sig.to_der().unwrap();
        assert_eq!(&der[..5], &[0x30, 0x26, 0x02, 0x01, 0x01]);
        assert_eq!(&der[5..8], &[0x02, 0x21, 0x00]);
        assert_eq!(Signature::from_der(&der).unwrap(), sig);

        let mut trailing = der.clone();
        trailing.push(0);
        assert_eq!(Signature::from_der(&trailing), Err(SM2Error::InvalidEncoding));
        assert_eq!(Signature::from_der(&der[..der.len() - 1]), Err(SM2Error::InvalidEncoding));
        // negative integer
        assert!(Signature::from_der(&hex!("3006020180020101")).is_err());
        // non-minimal integer
        assert!(Signature::from_der(&hex!("300702020001020101")).is_err());
        // 33 significant bytes
        let mut long = vec![0x30, 0x26, 0x02, 0x21];
        long.extend_from_slice(&[0x11; 33]);
        long.extend_from_slice(&[0x02, 0x01, 0x01]);
        assert!(Signature::from_der(&long).is_err());
    }

    #[test]
    fn test_recover_public_keys() {
        let sk = PrivateKey::from_bytes(&D).unwrap();
        let e = hash_message(None, sk.public_key(), MSG).unwrap();
        for _ in 0..4 {
            let sig = sign_hash(&sk, &e, &mut rand::rng()).unwrap().to_der().unwrap();
            let keys = recover_public_keys(&e, &sig).unwrap();
            assert!(!keys.is_empty() && keys.len() <= 4);
            assert!(keys.contains(sk.public_key()));
            for pk in keys {
                assert!(verify(&pk, &e, &SignerOpts { uid: None, hash_msg: false }, &sig));
            }
        }
    }
}
