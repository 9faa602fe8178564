//! SM9 two-party key agreement (GB/T 38635.2).
//!
//! Both parties hold encryption keys extracted under [`HID_EXCHANGE`] by the
//! same master key. The flow is that of [`crate::sm2::KeyExchange`]: A calls
//! [`KeyExchange::init`] and [`KeyExchange::confirm_responder`], B calls
//! [`KeyExchange::respond`] and, with confirmation on,
//! [`KeyExchange::confirm_initiator`].

use alloc::vec::Vec;

use rand::TryRngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::ec::g1::G1;
use super::ec::gfn::GFnElement;
use super::ec::gt::GT;
use super::ec::pairing::pairing;
use super::error::{Result, SM9Error};
use super::*;
use crate::kdf;
use crate::sm2::ec::curve::PointForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    New,
    Initiated,
    Responded,
    Done,
    Failed,
}

/// One side of an SM9 key exchange.
pub struct KeyExchange {
    sk: EncryptPrivateKey,
    uid: Vec<u8>,
    peer_uid: Vec<u8>,
    key_len: usize,
    gen_signature: bool,
    state: State,
    r: GFnElement,
    r_point: G1,
    peer_r_point: G1,
    // g1, g2, g3 as named from the responder's side.
    g: [GT; 3],
    key: Vec<u8>,
}

impl Drop for KeyExchange {
    fn drop(&mut self) {
        self.wipe_ephemeral();
        self.key.zeroize();
    }
}

impl KeyExchange {
    /// `sk` is the key extracted for `uid`; `key_len` is the agreed key
    /// length in bytes.
    pub fn new(sk: &EncryptPrivateKey, uid: &[u8], peer_uid: &[u8], key_len: usize, gen_signature: bool) -> Result<Self> {
        if key_len == 0 {
            return Err(SM9Error::InvalidLength);
        }
        Ok(KeyExchange {
            sk: sk.clone(),
            uid: uid.to_vec(),
            peer_uid: peer_uid.to_vec(),
            key_len,
            gen_signature,
            state: State::New,
            r: GFnElement::ZERO,
            r_point: G1::INFINITY,
            peer_r_point: G1::INFINITY,
            g: [GT::ONE; 3],
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
        self.g.iter_mut().for_each(Zeroize::zeroize);
    }

    fn fail(&mut self, err: SM9Error) -> SM9Error {
        self.wipe_ephemeral();
        self.key.zeroize();
        self.key.clear();
        self.state = State::Failed;
        err
    }

    fn finish(&mut self) {
        self.wipe_ephemeral();
        self.state = State::Done;
    }

    // r and R = [r]([H1(peer_uid || hid)]G1 + Ppub_e)
    fn generate_ephemeral<R: TryRngCore + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.r = random_scalar(rng)?;
        let q = self.sk.master_public_key().user_point(&self.peer_uid, HID_EXCHANGE);
        self.r_point = q.scalar_mul(&self.r);
        Ok(())
    }

    fn derive(&mut self, peer_r: &[u8], initiator: bool) -> Result<()> {
        let peer_r_point = G1::from_bytes(peer_r)?;
        if bool::from(peer_r_point.is_infinity()) {
            return Err(SM9Error::InvalidPoint);
        }
        self.peer_r_point = peer_r_point;

        let e = pairing(&peer_r_point, self.sk.point());
        let base = self.sk.master_public_key().pairing_base().pow(&self.r);
        let shared = e.pow(&self.r);
        self.r.limbs.zeroize();
        self.g = match initiator {
            true => [base, e, shared],
            false => [e, base, shared],
        };

        let mut z = Vec::with_capacity(self.uid.len() + self.peer_uid.len() + 128 + 3 * 384);
        z.extend_from_slice(&self.transcript(initiator));
        for g in &self.g {
            z.extend_from_slice(&g.to_bytes());
        }
        let key = kdf::kdf(&z, self.key_len).map_err(|_| SM9Error::InvalidLength);
        z.zeroize();
        self.key = key?;
        Ok(())
    }

    // IDA || IDB || RA || RB
    fn transcript(&self, initiator: bool) -> Vec<u8> {
        let (ida, idb, ra, rb) = match initiator {
            true => (&self.uid, &self.peer_uid, &self.r_point, &self.peer_r_point),
            false => (&self.peer_uid, &self.uid, &self.peer_r_point, &self.r_point),
        };
        [&ida[..], &idb[..], &ra.to_raw_bytes()[..], &rb.to_raw_bytes()[..]].concat()
    }

    // SM3(tag || g1 || SM3(g2 || g3 || IDA || IDB || RA || RB))
    fn confirmation(&self, tag: u8, initiator: bool) -> [u8; 32] {
        let inner = sm3!(&self.g[1].to_bytes(), &self.g[2].to_bytes(), &self.transcript(initiator));
        sm3!(&[tag], &self.g[0].to_bytes(), &inner)
    }

    /// Initiator step A1-A4: returns R_A, uncompressed.
    pub fn init<R: TryRngCore + ?Sized>(&mut self, rng: &mut R) -> Result<Vec<u8>> {
        if self.state != State::New {
            return Err(SM9Error::InvalidState);
        }
        self.generate_ephemeral(rng)?;
        self.state = State::Initiated;
        Ok(self.r_point.to_bytes(PointForm::Uncompressed))
    }

    /// Responder step B1-B7: takes R_A and returns R_B with the optional tag S_B.
    pub fn respond<R: TryRngCore + ?Sized>(&mut self, rng: &mut R, peer_r: &[u8]) -> Result<(Vec<u8>, Option<[u8; 32]>)> {
        if self.state != State::New {
            return Err(SM9Error::InvalidState);
        }
        self.generate_ephemeral(rng).map_err(|e| self.fail(e))?;
        self.derive(peer_r, false).map_err(|e| self.fail(e))?;
        let rb = self.r_point.to_bytes(PointForm::Uncompressed);
        let tag = match self.gen_signature {
            true => {
                self.state = State::Responded;
                Some(self.confirmation(0x82, false))
            }
            false => {
                self.finish();
                None
            }
        };
        Ok((rb, tag))
    }

    /// Initiator step A5-A8: takes R_B and S_B, returns the key and the
    /// optional tag S_A.
    pub fn confirm_responder(&mut self, peer_r: &[u8], peer_tag: Option<&[u8]>) -> Result<(Vec<u8>, Option<[u8; 32]>)> {
        if self.state != State::Initiated {
            return Err(SM9Error::InvalidState);
        }
        self.derive(peer_r, true).map_err(|e| self.fail(e))?;
        let verified = match (self.gen_signature, peer_tag) {
            (_, Some(tag)) => bool::from(self.confirmation(0x82, true)[..].ct_eq(tag)),
            (true, None) => false,
            (false, None) => true,
        };
        if !verified {
            return Err(self.fail(SM9Error::VerificationFailure));
        }
        let tag = self.gen_signature.then(|| self.confirmation(0x83, true));
        self.finish();
        Ok((self.key.clone(), tag))
    }

    /// Responder step B8: checks S_A and returns the key.
    pub fn confirm_initiator(&mut self, peer_tag: &[u8]) -> Result<Vec<u8>> {
        if self.state != State::Responded {
            return Err(SM9Error::InvalidState);
        }
        let expected = self.confirmation(0x83, false);
        if !bool::from(expected[..].ct_eq(peer_tag)) {
            return Err(self.fail(SM9Error::VerificationFailure));
        }
        self.finish();
        Ok(self.key.clone())
    }
}
