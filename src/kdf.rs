//! The X9.63 key derivation function of GB/T 32918.4-2016 5.4.3.
//!
//! `K = H(Z || 1) || H(Z || 2) || ...` truncated to the requested length,
//! with a 32-bit big-endian counter that must stay below `2^32 - 1`.

use alloc::vec::Vec;
use thiserror::Error;
use zeroize::Zeroize;

use crate::sm3;
use crate::traits::Hash;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfError {
    #[error("kdf: key length too long")]
    KeyTooLong,
}

pub type Result<T> = core::result::Result<T, KdfError>;

/// Streaming KDF. Feed Z with `write`, then `read` the key stream in
/// as many pieces as needed.
#[derive(Clone)]
pub struct Kdf<H: Hash<N> + Clone, const N: usize> {
    hash: H,
    ct: u32,
    block: [u8; N],
    // bytes of block already handed out.
    used: usize,
}

impl Kdf<sm3::Digest, { sm3::DIGEST_SIZE }> {
    pub fn new() -> Self {
        Self::new_with(sm3::Digest::new())
    }
}

impl Default for Kdf<sm3::Digest, { sm3::DIGEST_SIZE }> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hash<N> + Clone, const N: usize> Kdf<H, N> {
    /// `hash` must be freshly reset.
    pub fn new_with(hash: H) -> Self {
        Kdf { hash, ct: 1, block: [0; N], used: N }
    }

    // Kdf reads Z in multiple pieces. Z must be complete before the first read.
    pub fn write(&mut self, z: &[u8]) -> &mut Self {
        debug_assert!(self.ct == 1 && self.used == N);
        self.hash.write(z);
        self
    }

    fn next_block(&mut self) -> Result<()> {
        if self.ct == u32::MAX {
            return Err(KdfError::KeyTooLong);
        }
        let mut h = self.hash.clone();
        h.write(&self.ct.to_be_bytes());
        h.sum_into(&mut self.block);
        self.ct += 1;
        self.used = 0;
        Ok(())
    }

    /// Fills `out` with the next bytes of the key stream.
    pub fn read(&mut self, out: &mut [u8]) -> Result<()> {
        let mut out = out;
        while !out.is_empty() {
            if self.used == N {
                self.next_block()?;
            }
            let n = core::cmp::min(N - self.used, out.len());
            let (head, tail) = core::mem::take(&mut out).split_at_mut(n);
            head.copy_from_slice(&self.block[self.used..self.used + n]);
            self.used += n;
            out = tail;
        }
        Ok(())
    }
}

impl<H: Hash<N> + Clone, const N: usize> Drop for Kdf<H, N> {
    fn drop(&mut self) {
        self.block.zeroize();
    }
}

fn check_len(len: usize, digest_size: usize) -> Result<()> {
    let blocks = (len as u64).div_ceil(digest_size as u64);
    if blocks >= u32::MAX as u64 {
        return Err(KdfError::KeyTooLong);
    }
    Ok(())
}

/// Derives `len` bytes from `z` using SM3.
pub fn kdf(z: &[u8], len: usize) -> Result<Vec<u8>> {
    kdf_with(sm3::Digest::new(), z, len)
}

/// Derives `len` bytes from `z` with the given (reset) hash.
pub fn kdf_with<H: Hash<N> + Clone, const N: usize>(hash: H, z: &[u8], len: usize) -> Result<Vec<u8>> {
    check_len(len, N)?;
    let mut k = vec![0u8; len];
    let mut kdf = Kdf::new_with(hash);
    kdf.write(z).read(&mut k)?;
    Ok(k)
}
