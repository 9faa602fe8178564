//! SM9 identity-based cryptography (GB/T 38635).
//!
//! A key generation centre holds a master key pair per purpose and extracts
//! user keys from identities, see [`keys`]. On top of them sit the
//! signature scheme in [`sign`], key encapsulation and encryption in
//! [`encrypt`] and the two-party [`key_exchange`].

use rand::TryRngCore;
use zeroize::Zeroize;

use ec::gfn::GFnElement;
use error::{Result, SM9Error};

pub mod ec;
pub mod encrypt;
pub mod error;
pub mod hash;
pub mod key_exchange;
pub mod keys;
pub mod sign;

pub use encrypt::*;
pub use key_exchange::KeyExchange;
pub use keys::*;
pub use sign::*;

/// Bound of every rejection-sampling loop.
pub(crate) const MAX_RETRIES: usize = 100;

/// Draws a scalar in [1, n-1] from 32 random bytes.
pub(crate) fn random_scalar<R: TryRngCore + ?Sized>(rng: &mut R) -> Result<GFnElement> {
    let mut buf = [0u8; 32];
    for _ in 0..MAX_RETRIES {
        rng.try_fill_bytes(&mut buf).map_err(|_| SM9Error::RandomnessFailure)?;
        let k = GFnElement::from(&buf);
        buf.zeroize();
        if !bool::from(k.is_zero()) {
            return Ok(k);
        }
        tracing::trace!("sm9: zero scalar drawn, retrying");
    }
    tracing::warn!(retries = MAX_RETRIES, "sm9: random scalar generation exhausted");
    Err(SM9Error::ResourceExhausted)
}
