//! Message authentication codes.
//!
//! [`Mac`] holds the eight block-cipher mechanisms of GB/T 15821.1-2020
//! (ISO/IEC 9797-1), [`Cmac`] is the streaming form of scheme 5 and
//! [`HMac`] is the hash based MAC.

pub mod hmac;
pub use hmac::{HMac, HMacSM3, hmac_sm3};

use alloc::vec::Vec;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

use crate::internal::xor_bytes;
use crate::padding::{Iso9797M2, Padding};
use crate::traits::Block;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacError {
    #[error("mac: invalid size {0}")]
    InvalidSize(usize),

    #[error("mac: invalid key")]
    InvalidKey,
}

pub type Result<T> = core::result::Result<T, MacError>;

/// The GB/T 15821.1-2020 MAC schemes over a block cipher `B`.
///
/// Every scheme returns the leftmost `size` bytes of its final block,
/// except TR-CBC-MAC on padded input which returns the rightmost.
pub enum Mac<B: Block, P: Padding = Iso9797M2> {
    /// Scheme 1, plain CBC-MAC.
    CbcMac { b: B, pad: P, size: usize },
    /// Scheme 2, CBC-MAC then one more encryption under a second key.
    Emac { b1: B, b2: B, size: usize },
    /// Scheme 3, CBC-MAC finalised by `E_k1(D_k2(tag))`.
    AnsiRetail { b1: B, b2: B, size: usize },
    /// Scheme 4, the first block also goes through `k3 = k2 ^ 0xF0..F0`.
    MacDes { b1: B, b2: B, b3: B, size: usize },
    /// Scheme 5.
    Cmac(Cmac<B>),
    /// Scheme 6, two keys derived by encrypting 1 and 2.
    Lmac { b1: B, b2: B, size: usize },
    /// Scheme 7, padding only when needed.
    TrCbc { b: B, size: usize },
    /// Scheme 8, CBC-MAC with a rotated last block.
    Cbcr { b: B, size: usize },
}

fn check_size(size: usize, block_size: usize) -> Result<()> {
    if size == 0 || size > block_size {
        return Err(MacError::InvalidSize(size));
    }
    Ok(())
}

fn new_block<B, F>(creator: &F, key: &[u8]) -> Result<B>
where
    F: Fn(&[u8]) -> Option<B>,
{
    creator(key).ok_or(MacError::InvalidKey)
}

// tag = E(tag ^ block) over every whole block of src.
fn cbc<B: Block + ?Sized>(b: &B, tag: &mut [u8], src: &[u8]) {
    for block in src.chunks_exact(tag.len()) {
        xor_bytes(tag, block);
        b.encrypt_inplace(tag);
    }
}

// Iso9797M2 padding is applied only if src is empty or not block aligned.
fn pad_if_needed(src: &[u8], block_size: usize) -> (Vec<u8>, bool) {
    if src.is_empty() || src.len() % block_size != 0 {
        (Iso9797M2.pad(src, block_size), true)
    } else {
        (src.to_vec(), false)
    }
}

// x <<= 1, returns the bit shifted out.
fn shift_left(x: &mut [u8]) -> u8 {
    let mut msb = 0;
    for v in x.iter_mut().rev() {
        let m = *v >> 7;
        *v = (*v << 1) | msb;
        msb = m;
    }
    msb
}

// Rotates x right by one bit.
fn rotate_right(x: &mut [u8]) {
    let mut lsb = 0;
    for v in x.iter_mut() {
        let l = *v << 7;
        *v = (*v >> 1) | lsb;
        lsb = l;
    }
    x[0] |= lsb;
}

impl<B: Block> Mac<B, Iso9797M2> {
    pub fn new_cbc_mac(b: B, size: usize) -> Result<Self> {
        Mac::new_cbc_mac_with_padding(b, size, Iso9797M2)
    }

    pub fn new_emac<F>(creator: F, key1: &[u8], key2: &[u8], size: usize) -> Result<Self>
    where
        F: Fn(&[u8]) -> Option<B>,
    {
        let b1 = new_block(&creator, key1)?;
        check_size(size, b1.block_size())?;
        let b2 = new_block(&creator, key2)?;
        Ok(Mac::Emac { b1, b2, size })
    }

    pub fn new_ansi_retail_mac<F>(creator: F, key1: &[u8], key2: &[u8], size: usize) -> Result<Self>
    where
        F: Fn(&[u8]) -> Option<B>,
    {
        let b1 = new_block(&creator, key1)?;
        check_size(size, b1.block_size())?;
        let b2 = new_block(&creator, key2)?;
        Ok(Mac::AnsiRetail { b1, b2, size })
    }

    pub fn new_mac_des<F>(creator: F, key1: &[u8], key2: &[u8], size: usize) -> Result<Self>
    where
        F: Fn(&[u8]) -> Option<B>,
    {
        let b1 = new_block(&creator, key1)?;
        check_size(size, b1.block_size())?;
        let b2 = new_block(&creator, key2)?;
        let mut key3 = key2.to_vec();
        key3.iter_mut().for_each(|k| *k ^= 0xf0);
        let b3 = new_block(&creator, &key3);
        key3.zeroize();
        Ok(Mac::MacDes { b1, b2, b3: b3?, size })
    }

    pub fn new_cmac(b: B, size: usize) -> Result<Self> {
        Ok(Mac::Cmac(Cmac::new(b, size)?))
    }

    pub fn new_lmac<F>(creator: F, key: &[u8], size: usize) -> Result<Self>
    where
        F: Fn(&[u8]) -> Option<B>,
    {
        let b = new_block(&creator, key)?;
        let block_size = b.block_size();
        check_size(size, block_size)?;

        let mut key1 = vec![0u8; block_size];
        let mut key2 = vec![0u8; block_size];
        key1[block_size - 1] = 0x01;
        key2[block_size - 1] = 0x02;
        b.encrypt_inplace(&mut key1);
        b.encrypt_inplace(&mut key2);
        let b1 = new_block(&creator, &key1);
        let b2 = new_block(&creator, &key2);
        key1.zeroize();
        key2.zeroize();
        Ok(Mac::Lmac { b1: b1?, b2: b2?, size })
    }

    pub fn new_tr_cbc_mac(b: B, size: usize) -> Result<Self> {
        check_size(size, b.block_size())?;
        Ok(Mac::TrCbc { b, size })
    }

    pub fn new_cbcr_mac(b: B, size: usize) -> Result<Self> {
        check_size(size, b.block_size())?;
        Ok(Mac::Cbcr { b, size })
    }
}

impl<B: Block, P: Padding> Mac<B, P> {
    pub fn new_cbc_mac_with_padding(b: B, size: usize, pad: P) -> Result<Self> {
        check_size(size, b.block_size())?;
        Ok(Mac::CbcMac { b, pad, size })
    }

    /// The number of bytes returned by [`Mac::mac`].
    pub fn size(&self) -> usize {
        match self {
            Mac::CbcMac { size, .. }
            | Mac::Emac { size, .. }
            | Mac::AnsiRetail { size, .. }
            | Mac::MacDes { size, .. }
            | Mac::Lmac { size, .. }
            | Mac::TrCbc { size, .. }
            | Mac::Cbcr { size, .. } => *size,
            Mac::Cmac(c) => c.size,
        }
    }

    pub fn mac(&self, src: &[u8]) -> Vec<u8> {
        match self {
            Mac::CbcMac { b, pad, size } => {
                let bs = b.block_size();
                let mut tag = vec![0u8; bs];
                cbc(b, &mut tag, &pad.pad(src, bs));
                tag.truncate(*size);
                tag
            }
            Mac::Emac { b1, b2, size } => {
                let bs = b1.block_size();
                let mut tag = vec![0u8; bs];
                cbc(b1, &mut tag, &Iso9797M2.pad(src, bs));
                b2.encrypt_inplace(&mut tag);
                tag.truncate(*size);
                tag
            }
            Mac::AnsiRetail { b1, b2, size } => {
                let bs = b1.block_size();
                let mut tag = vec![0u8; bs];
                cbc(b1, &mut tag, &Iso9797M2.pad(src, bs));
                b2.decrypt_inplace(&mut tag);
                b1.encrypt_inplace(&mut tag);
                tag.truncate(*size);
                tag
            }
            Mac::MacDes { b1, b2, b3, size } => {
                let bs = b1.block_size();
                let padded = Iso9797M2.pad(src, bs);
                let mut tag = padded[..bs].to_vec();
                b1.encrypt_inplace(&mut tag);
                b3.encrypt_inplace(&mut tag);
                cbc(b1, &mut tag, &padded[bs..]);
                b2.encrypt_inplace(&mut tag);
                tag.truncate(*size);
                tag
            }
            Mac::Cmac(c) => c.mac(src),
            Mac::Lmac { b1, b2, size } => {
                let bs = b1.block_size();
                let padded = Iso9797M2.pad(src, bs);
                let (head, last) = padded.split_at(padded.len() - bs);
                let mut tag = vec![0u8; bs];
                cbc(b1, &mut tag, head);
                cbc(b2, &mut tag, last);
                tag.truncate(*size);
                tag
            }
            Mac::TrCbc { b, size } => {
                let bs = b.block_size();
                let (src, padded) = pad_if_needed(src, bs);
                let mut tag = vec![0u8; bs];
                cbc(b, &mut tag, &src);
                if padded {
                    tag.split_off(bs - size)
                } else {
                    tag.truncate(*size);
                    tag
                }
            }
            Mac::Cbcr { b, size } => {
                let bs = b.block_size();
                let mut tag = vec![0u8; bs];
                b.encrypt_inplace(&mut tag);
                let (src, padded) = pad_if_needed(src, bs);
                let (head, last) = src.split_at(src.len() - bs);
                cbc(b, &mut tag, head);
                xor_bytes(&mut tag, last);
                if padded {
                    shift_left(&mut tag);
                } else {
                    rotate_right(&mut tag);
                }
                b.encrypt_inplace(&mut tag);
                tag.truncate(*size);
                tag
            }
        }
    }

    /// Compares the MAC of src with tag in constant time.
    pub fn verify(&self, src: &[u8], tag: &[u8]) -> bool {
        self.mac(src).as_slice().ct_eq(tag).into()
    }
}

/// CMAC (NIST SP 800-38B), GB/T 15821.1-2020 MAC scheme 5.
///
/// The subkeys use `R_b = 0x87`, the 128-bit block constant.
pub struct Cmac<B: Block> {
    b: B,
    k1: Vec<u8>,
    k2: Vec<u8>,
    size: usize,
    state: CmacState,
}

#[derive(Clone)]
struct CmacState {
    tag: Vec<u8>,
    // the last block, full or not, is held back until more data arrives.
    x: Vec<u8>,
    nx: usize,
}

impl CmacState {
    fn new(block_size: usize) -> Self {
        CmacState { tag: vec![0; block_size], x: vec![0; block_size], nx: 0 }
    }

    fn write<B: Block>(&mut self, b: &B, p: &[u8]) {
        let bs = self.tag.len();
        let mut p = p;
        while !p.is_empty() {
            if self.nx == bs {
                xor_bytes(&mut self.tag, &self.x);
                b.encrypt_inplace(&mut self.tag);
                self.nx = 0;
            }
            let n = core::cmp::min(bs - self.nx, p.len());
            self.x[self.nx..self.nx + n].copy_from_slice(&p[..n]);
            self.nx += n;
            p = &p[n..];
        }
    }

    fn sum<B: Block>(mut self, b: &B, k1: &[u8], k2: &[u8], size: usize) -> Vec<u8> {
        let bs = self.tag.len();
        if self.nx == bs {
            xor_bytes(&mut self.tag, &self.x);
            xor_bytes(&mut self.tag, k1);
        } else {
            xor_bytes(&mut self.tag, &self.x[..self.nx]);
            self.tag[self.nx] ^= 0x80;
            xor_bytes(&mut self.tag, k2);
        }
        b.encrypt_inplace(&mut self.tag);
        let mut tag = core::mem::take(&mut self.tag);
        tag.truncate(size);
        tag
    }
}

impl Drop for CmacState {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

impl<B: Block> Cmac<B> {
    pub fn new(b: B, size: usize) -> Result<Self> {
        let bs = b.block_size();
        check_size(size, bs)?;

        let mut k1 = vec![0u8; bs];
        b.encrypt_inplace(&mut k1);
        let msb = shift_left(&mut k1);
        k1[bs - 1] ^= msb * 0x87;

        let mut k2 = k1.clone();
        let msb = shift_left(&mut k2);
        k2[bs - 1] ^= msb * 0x87;

        Ok(Cmac { b, k1, k2, size, state: CmacState::new(bs) })
    }

    pub fn block_size(&self) -> usize {
        self.k1.len()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn reset(&mut self) {
        self.state = CmacState::new(self.block_size());
    }

    pub fn write(&mut self, p: &[u8]) -> &mut Self {
        self.state.write(&self.b, p);
        self
    }

    /// Returns the MAC of everything written so far. The state is kept
    /// so the caller can keep writing.
    pub fn sum(&self) -> Vec<u8> {
        self.state.clone().sum(&self.b, &self.k1, &self.k2, self.size)
    }

    /// One-shot MAC of src, independent of the streaming state.
    pub fn mac(&self, src: &[u8]) -> Vec<u8> {
        let mut state = CmacState::new(self.block_size());
        state.write(&self.b, src);
        state.sum(&self.b, &self.k1, &self.k2, self.size)
    }
}

impl<B: Block> Drop for Cmac<B> {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
    }
}
