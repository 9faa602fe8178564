//! SM2 two-party key agreement (GB/T 32918.3).
//!
//! The initiator A calls [`KeyExchange::init`] and later
//! [`KeyExchange::confirm_responder`]; the responder B calls
//! [`KeyExchange::respond`] and, with confirmation on, [`KeyExchange::confirm_initiator`].

use alloc::vec::Vec;

use rand::TryRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::ec::arith::limbs_from_be_bytes;
use super::ec::curve::{AffinePoint, PointForm, ProjectivePoint};
use super::ec::gfn::GFnElement;
use super::error::{Result, SM2Error};
use super::sign::compute_za;
use super::*;
use crate::kdf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    // initiator holding r_A.
    Initiated,
    // responder waiting for the initiator's tag.
    Responded,
    Done,
    // a check failed; the exchange has to be restarted with a new instance.
    Failed,
}

/// One side of an SM2 key exchange.
pub struct KeyExchange {
    sk: PrivateKey,
    peer_pub: PublicKey,
    z: [u8; 32],
    peer_z: [u8; 32],
    key_len: usize,
    gen_signature: bool,
    state: State,
    r: GFnElement,
    r_point: AffinePoint,
    peer_r_point: AffinePoint,
    // U for the initiator, V for the responder.
    shared: AffinePoint,
    key: Vec<u8>,
}

impl Drop for KeyExchange {
    fn drop(&mut self) {
        self.wipe_ephemeral();
        self.key.zeroize();
    }
}

// x̄ = 2^127 + (x mod 2^127)
fn x_bar(p: &AffinePoint) -> GFnElement {
    let x = limbs_from_be_bytes(&p.x_bytes());
    GFnElement { limbs: [x[0], (x[1] & 0x7fffffffffffffff) | 0x8000000000000000, 0, 0] }
}

impl KeyExchange {
    /// `key_len` is the agreed key length in bytes, `gen_signature` whether
    /// the confirmation tags are exchanged.
    pub fn new(sk: &PrivateKey, peer_pub: &PublicKey, uid: &[u8], peer_uid: &[u8], key_len: usize, gen_signature: bool) -> Result<Self> {
        if key_len == 0 {
            return Err(SM2Error::InvalidLength);
        }
        let z = compute_za(uid, sk.public_key())?;
        let peer_z = compute_za(peer_uid, peer_pub)?;
        Ok(KeyExchange {
            sk: sk.clone(),
            peer_pub: *peer_pub,
            z,
            peer_z,
            key_len,
            gen_signature,
            state: State::New,
            r: GFnElement::ZERO,
            r_point: AffinePoint::INFINITY,
            peer_r_point: AffinePoint::INFINITY,
            shared: AffinePoint::INFINITY,
            key: Vec::new(),
        })
    }

    /// The agreed key, once the exchange has completed.
    pub fn shared_key(&self) -> Option<&[u8]> {
        (self.state == State::Done).then_some(&self.key[..])
    }

    fn wipe_ephemeral(&mut self) {
        self.r.limbs.zeroize();
        self.r_point.zeroize();
        self.peer_r_point.zeroize();
        self.shared.zeroize();
    }

    // Wipes everything derived so far and makes later calls fail.
    fn fail(&mut self, err: SM2Error) -> SM2Error {
        self.wipe_ephemeral();
        self.key.zeroize();
        self.key.clear();
        self.state = State::Failed;
        err
    }

    // Only the key survives a completed exchange.
    fn finish(&mut self) {
        self.wipe_ephemeral();
        self.state = State::Done;
    }

    // Draws r and R = [r]G.
    fn generate_ephemeral<R: TryRngCore + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.r = random_scalar(rng)?;
        self.r_point = ProjectivePoint::new_from_scalar_base_mul(&self.r.limbs).to_affine();
        Ok(())
    }

    // Computes the shared point [t](P_peer + [x̄_peer]R_peer) and the key.
    fn derive(&mut self, peer_r: &[u8], initiator: bool) -> Result<()> {
        let peer_r_point = AffinePoint::from_bytes(peer_r)?;
        if peer_r_point.infinity {
            return Err(SM2Error::InvalidPoint);
        }
        self.peer_r_point = peer_r_point;

        // t = (d + x̄·r) mod n
        let mut t = GFnElement::mul_plain(&x_bar(&self.r_point), &self.r);
        t.add(self.sk.scalar());

        let mut q = ProjectivePoint::from(&peer_r_point).scalar_mul(&x_bar(&peer_r_point).limbs);
        q.add(&ProjectivePoint::from(self.peer_pub.point()));
        let shared = q.scalar_mul(&t.limbs).to_affine();
        t.limbs.zeroize();
        self.r.limbs.zeroize();
        if shared.infinity {
            return Err(SM2Error::InvalidPoint);
        }
        self.shared = shared;

        let (za, zb) = self.ordered_z(initiator);
        let mut z = Vec::with_capacity(128);
        z.extend_from_slice(&shared.x_bytes());
        z.extend_from_slice(&shared.y_bytes());
        z.extend_from_slice(za);
        z.extend_from_slice(zb);
        let key = kdf::kdf(&z, self.key_len).map_err(|_| SM2Error::InvalidLength);
        z.zeroize();
        self.key = key?;
        Ok(())
    }

    fn ordered_z(&self, initiator: bool) -> (&[u8; 32], &[u8; 32]) {
        match initiator {
            true => (&self.z, &self.peer_z),
            false => (&self.peer_z, &self.z),
        }
    }

    // SM3(tag || y || SM3(x || ZA || ZB || xRA || yRA || xRB || yRB))
    fn confirmation(&self, tag: u8, initiator: bool) -> [u8; 32] {
        let (za, zb) = self.ordered_z(initiator);
        let (ra, rb) = match initiator {
            true => (&self.r_point, &self.peer_r_point),
            false => (&self.peer_r_point, &self.r_point),
        };
        let inner = sm3!(
            &self.shared.x_bytes(),
            za,
            zb,
            &ra.x_bytes(),
            &ra.y_bytes(),
            &rb.x_bytes(),
            &rb.y_bytes()
        );
        sm3!(&[tag], &self.shared.y_bytes(), &inner)
    }

    /// Initiator step A1-A3: returns R_A, uncompressed.
    pub fn init<R: TryRngCore + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<u8>> {
        if self.state != State::New {
            return Err(SM2Error::InvalidState);
        }
        self.generate_ephemeral(rng)?;
        self.state = State::Initiated;
        Ok(self.r_point.to_bytes(PointForm::Uncompressed))
    }

    /// Responder step B1-B9: takes R_A and returns R_B with the optional tag S_B.
    pub fn respond<R: TryRngCore + ?Sized>(&mut self, rng: &mut R, peer_r: &[u8]) -> Result<(Vec<u8>, Option<[u8; 32]>)> {
        if self.state != State::New {
            return Err(SM2Error::InvalidState);
        }
        self.generate_ephemeral(rng).map_err(|e| self.fail(e))?;
        self.derive(peer_r, false).map_err(|e| self.fail(e))?;
        let rb = self.r_point.to_bytes(PointForm::Uncompressed);
        let tag = match self.gen_signature {
            true => {
                self.state = State::Responded;
                Some(self.confirmation(0x02, false))
            }
            false => {
                self.finish();
                None
            }
        };
        Ok((rb, tag))
    }

    /// Initiator step A4-A10: takes R_B and S_B, returns the key and the
    /// optional tag S_A.
    pub fn confirm_responder(&mut self, peer_r: &[u8], peer_tag: Option<&[u8]>) -> Result<(Vec<u8>, Option<[u8; 32]>)> {
        if self.state != State::Initiated {
            return Err(SM2Error::InvalidState);
        }
        self.derive(peer_r, true).map_err(|e| self.fail(e))?;
        let verified = match (self.gen_signature, peer_tag) {
            (_, Some(tag)) => bool::from(self.confirmation(0x02, true)[..].ct_eq(tag)),
            (true, None) => false,
            (false, None) => true,
        };
        if !verified {
            return Err(self.fail(SM2Error::VerificationFailure));
        }
        let tag = self.gen_signature.then(|| self.confirmation(0x03, true));
        self.finish();
        Ok((self.key.clone(), tag))
    }

    /// Responder step B10: checks S_A and returns the key.
    pub fn confirm_initiator(&mut self, peer_tag: &[u8]) -> Result<Vec<u8>> {
        if self.state != State::Responded {
            return Err(SM2Error::InvalidState);
        }
        let expected = self.confirmation(0x03, false);
        if !bool::from(expected[..].ct_eq(peer_tag)) {
            return Err(self.fail(SM2Error::VerificationFailure));
        }
        self.finish();
        Ok(self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rand::ConstRngCore;
    use hex_literal::hex;

    const DA: [u8; 32] = hex!("6FCBA2EF9AE0AB902BC3BDE3FF915D44BA4CC78F88E2F8E7F8996D3B8CCEEDEE");
    const DB: [u8; 32] = hex!("5E35D7D3F3C54DBAC72E61819E730B019A84208CA3A35E4C2E353DFCCB2A3B53");
    const RA: [u8; 32] = hex!("83A2C9C8B96E5AF70BD480B472409A9A327257F1EBB73F5B073354B248668563");
    const RB: [u8; 32] = hex!("33FE21940342161C55619C4A0C060293D543C80AF19748CE176D83477DE71C80");
    const IDA: &[u8] = b"ALICE123@YAHOO.COM";
    const IDB: &[u8] = b"BILL456@YAHOO.COM";

    fn parties(gen_signature: bool) -> (KeyExchange, KeyExchange) {
        let a = PrivateKey::from_bytes(&DA).unwrap();
        let b = PrivateKey::from_bytes(&DB).unwrap();
        let alice = KeyExchange::new(&a, b.public_key(), IDA, IDB, 16, gen_signature).unwrap();
        let bob = KeyExchange::new(&b, a.public_key(), IDB, IDA, 16, gen_signature).unwrap();
        (alice, bob)
    }

    #[test]
    fn test_fixed_ephemerals() {
        let (mut alice, mut bob) = parties(true);
        let ra = alice.init(&mut ConstRngCore::new(RA)).unwrap();
        assert_eq!(
            ra,
            hex!(
                "04698c93c85618d221a6de87ca8f091a89cfaecc9fff2dd978f92769a40af3b740b058698f05ed5aadec7d50616e7a05e9aa151c9b693fdcada01f16cfacc994b4"
            )
        );

        let (rb, sb) = bob.respond(&mut ConstRngCore::new(RB), &ra).unwrap();
        let sb = sb.unwrap();
        assert_eq!(sb, hex!("b93374ade30a74e12ddb40e4c03d0c6fcf61badbf2c2c5cc39a91201d9228e2e"));
        // not confirmed yet.
        assert!(bob.shared_key().is_none());

        let (key, sa) = alice.confirm_responder(&rb, Some(&sb)).unwrap();
        assert_eq!(key, hex!("f02f9068ad13e14f2b2602e0dfb2504f"));
        let sa = sa.unwrap();
        assert_eq!(sa, hex!("daefca6c32f53c48444d4ef35f98471e5d1cd1e3b5b8e3322dede310306689f6"));

        assert_eq!(bob.confirm_initiator(&sa).unwrap(), key);
        assert_eq!(bob.shared_key().unwrap(), &key[..]);
        assert_eq!(alice.shared_key().unwrap(), &key[..]);

        // only the key is kept once done.
        for kx in [&alice, &bob] {
            assert!(bool::from(kx.r.is_zero()));
            assert!(kx.shared.infinity && kx.r_point.infinity && kx.peer_r_point.infinity);
            assert_eq!(kx.shared.x.limbs, [0; 4]);
        }
    }

    #[test]
    fn test_without_confirmation() {
        let (mut alice, mut bob) = parties(false);
        let mut rng = rand::rng();
        let ra = alice.init(&mut rng).unwrap();
        let (rb, sb) = bob.respond(&mut rng, &ra).unwrap();
        assert!(sb.is_none());
        let (key, sa) = alice.confirm_responder(&rb, None).unwrap();
        assert!(sa.is_none());
        assert_eq!(bob.shared_key().unwrap(), &key[..]);
        assert_eq!(bob.confirm_initiator(&[0; 32]), Err(SM2Error::InvalidState));
    }

    #[test]
    fn test_bad_tags() {
        let (mut alice, mut bob) = parties(true);
        let mut rng = rand::rng();
        let ra = alice.init(&mut rng).unwrap();
        let (rb, sb) = bob.respond(&mut rng, &ra).unwrap();
        let mut sb = sb.unwrap();
        sb[0] ^= 1;
        assert_eq!(alice.confirm_responder(&rb, Some(&sb)).unwrap_err(), SM2Error::VerificationFailure);
        assert!(alice.shared_key().is_none());

        assert_eq!(bob.confirm_initiator(&[0; 32]), Err(SM2Error::VerificationFailure));
        assert!(bob.shared_key().is_none());
        assert_eq!(bob.confirm_initiator(&[0; 32]), Err(SM2Error::InvalidState));

        let (mut alice, _) = parties(true);
        alice.init(&mut rng).unwrap();
        assert_eq!(alice.confirm_responder(&rb, None).unwrap_err(), SM2Error::VerificationFailure);
    }

    #[test]
    fn test_no_retry_after_failure() {
        let (mut alice, mut bob) = parties(false);
        let mut rng = rand::rng();
        let ra = alice.init(&mut rng).unwrap();
        let (rb, _) = bob.respond(&mut rng, &ra).unwrap();

        // a tag is still checked when one is supplied.
        assert_eq!(alice.confirm_responder(&rb, Some(&[0; 32])).unwrap_err(), SM2Error::VerificationFailure);
        assert_eq!(alice.confirm_responder(&rb, None).unwrap_err(), SM2Error::InvalidState);
        assert!(alice.shared_key().is_none());
        assert!(bool::from(alice.r.is_zero()));

        // an invalid R_B also ends the exchange.
        let (mut alice, _) = parties(false);
        alice.init(&mut rng).unwrap();
        assert_eq!(alice.confirm_responder(&[0], None).unwrap_err(), SM2Error::InvalidPoint);
        assert_eq!(alice.confirm_responder(&rb, None).unwrap_err(), SM2Error::InvalidState);

        let (_, mut bob) = parties(false);
        assert_eq!(bob.respond(&mut rng, &[0]).unwrap_err(), SM2Error::InvalidPoint);
        assert_eq!(bob.respond(&mut rng, &ra).unwrap_err(), SM2Error::InvalidState);
    }

    #[test]
    fn test_out_of_order() {
        let (mut alice, mut bob) = parties(true);
        let mut rng = rand::rng();
        assert_eq!(alice.confirm_responder(&[4; 65], None).unwrap_err(), SM2Error::InvalidState);
        let ra = alice.init(&mut rng).unwrap();
        assert_eq!(alice.init(&mut rng).unwrap_err(), SM2Error::InvalidState);
        assert_eq!(alice.respond(&mut rng, &ra).unwrap_err(), SM2Error::InvalidState);

        // invalid R_A.
        assert_eq!(bob.respond(&mut rng, &[0]).unwrap_err(), SM2Error::InvalidPoint);
    }

    #[test]
    fn test_uid_too_long() {
        let a = PrivateKey::from_bytes(&DA).unwrap();
        let b = PrivateKey::from_bytes(&DB).unwrap();
        let uid = [0x61u8; 8192];
        assert_eq!(
            KeyExchange::new(&a, b.public_key(), &uid, IDB, 16, false).err(),
            Some(SM2Error::InvalidUid)
        );
    }
}
