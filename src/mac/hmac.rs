use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::sm3;
use crate::traits::Hash;

const MAX_BLOCK_SIZE: usize = 128;

/// HMAC (RFC 2104) over any [`Hash`].
pub struct HMac<H: Hash<DIGEST_SIZE> + Clone, const DIGEST_SIZE: usize> {
    outer: H,
    inner: H,

    // for reset.
    block_size: usize,
    processed_key: [u8; MAX_BLOCK_SIZE],
}

impl<H: Hash<DIGEST_SIZE> + Clone, const DIGEST_SIZE: usize> HMac<H, DIGEST_SIZE> {
    /// `hash` must be freshly reset, its block size no more than 128.
    pub fn new_with(key: &[u8], hash: H) -> Self {
        let block_size = hash.block_size();
        debug_assert!(block_size <= MAX_BLOCK_SIZE && DIGEST_SIZE <= block_size);

        let mut processed_key = [0u8; MAX_BLOCK_SIZE];
        if key.len() > block_size {
            let mut h = hash.clone();
            h.write(key);
            h.sum_into(&mut processed_key[..DIGEST_SIZE]);
        } else {
            processed_key[..key.len()].copy_from_slice(key);
        }

        let mut h = HMac {
            outer: hash.clone(),
            inner: hash,
            block_size,
            processed_key,
        };
        h.load_pads();
        h
    }

    fn load_pads(&mut self) {
        let mut pad = [0u8; MAX_BLOCK_SIZE];
        let pad = &mut pad[..self.block_size];

        for (p, k) in pad.iter_mut().zip(self.processed_key.iter()) {
            *p = k ^ 0x36;
        }
        self.inner.write(pad);

        for (p, k) in pad.iter_mut().zip(self.processed_key.iter()) {
            *p = k ^ 0x5c;
        }
        self.outer.write(pad);
        pad.zeroize();
    }

    // reset HMac for next computation, use the same key.
    pub fn reset(&mut self) {
        self.inner.reset();
        self.outer.reset();
        self.load_pads();
    }

    pub fn write(&mut self, data: &[u8]) -> &mut Self {
        self.inner.write(data);
        self
    }

    pub fn sum_into(&self, out: &mut [u8]) {
        let mac = self.inner.sum();
        let mut outer = self.outer.clone();
        outer.write(&mac);
        outer.sum_into(out);
    }

    pub fn sum(&self) -> [u8; DIGEST_SIZE] {
        let mut mac = [0u8; DIGEST_SIZE];
        self.sum_into(&mut mac);
        mac
    }

    /// Compares the current MAC with `tag` in constant time.
    pub fn verify(&self, tag: &[u8]) -> bool {
        self.sum().as_slice().ct_eq(tag).into()
    }
}

impl<H: Hash<DIGEST_SIZE> + Clone, const DIGEST_SIZE: usize> Drop for HMac<H, DIGEST_SIZE> {
    fn drop(&mut self) {
        self.processed_key.zeroize();
    }
}

pub type HMacSM3 = HMac<sm3::Digest, { sm3::DIGEST_SIZE }>;

impl HMacSM3 {
    pub fn new_sm3(key: &[u8]) -> Self {
        Self::new_with(key, sm3::Digest::new())
    }
}

pub fn hmac_sm3(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hm = HMacSM3::new_sm3(key);
    hm.write(data);
    hm.sum()
}

/// One-shot HMAC-SM3 over the concatenation of the arguments.
#[macro_export]
macro_rules! hmac_sm3 {
    ($key:expr, $($x:expr),+ $(,)?) => {{
        let mut h = $crate::mac::HMacSM3::new_sm3($key);
        $(
            h.write($x);
        )*
        h.sum()
    }};
}
