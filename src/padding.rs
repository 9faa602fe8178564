//! Block padding schemes.

use alloc::vec::Vec;
use subtle::{ConditionallySelectable, ConstantTimeEq};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingError {
    #[error("padding: src length is not a multiple of block size")]
    InvalidLength,

    #[error("padding: invalid padding")]
    InvalidPadding,
}

pub type Result<T> = core::result::Result<T, PaddingError>;

pub trait Padding {
    /// Returns src followed by 1..=block_size padding bytes.
    fn pad(&self, src: &[u8], block_size: usize) -> Vec<u8>;

    fn unpad<'a>(&self, src: &'a [u8], block_size: usize) -> Result<&'a [u8]>;
}

/// ISO/IEC 9797-1 padding method 2 (GB/T 17964-2021 C.2): a single 0x80
/// byte then zeros up to the block boundary.
#[derive(Clone, Copy, Debug, Default)]
pub struct Iso9797M2;

impl Iso9797M2 {
    /// Appends the padding of a `len`-byte message to `out`.
    pub(crate) fn pad_into(out: &mut Vec<u8>, len: usize, block_size: usize) {
        let overhead = block_size - len % block_size;
        out.push(0x80);
        out.resize(out.len() + overhead - 1, 0);
    }
}

impl Padding for Iso9797M2 {
    fn pad(&self, src: &[u8], block_size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(src.len() + block_size);
        out.extend_from_slice(src);
        Self::pad_into(&mut out, src.len(), block_size);
        out
    }

    // Examines the whole last block whatever the marker position is.
    fn unpad<'a>(&self, src: &'a [u8], block_size: usize) -> Result<&'a [u8]> {
        if src.is_empty() || block_size == 0 || src.len() % block_size != 0 {
            return Err(PaddingError::InvalidLength);
        }
        let tail = &src[src.len() - block_size..];

        // Scanning backwards, `done` is set at the first non-zero byte which
        // must be the 0x80 marker.
        let mut done = subtle::Choice::from(0);
        let mut ok = subtle::Choice::from(1);
        let mut pos = 0u64;
        for i in (0..block_size).rev() {
            let b = tail[i];
            let nonzero = !b.ct_eq(&0);
            let first = nonzero & !done;
            ok &= !first | b.ct_eq(&0x80);
            pos.conditional_assign(&(i as u64), first);
            done |= nonzero;
        }
        ok &= done;

        if !bool::from(ok) {
            return Err(PaddingError::InvalidPadding);
        }
        Ok(&src[..src.len() - block_size + pos as usize])
    }
}

/// PKCS#7 padding (RFC 5652 section 6.3), for block sizes up to 255.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pkcs7;

impl Padding for Pkcs7 {
    fn pad(&self, src: &[u8], block_size: usize) -> Vec<u8> {
        debug_assert!(block_size > 0 && block_size < 256);
        let overhead = block_size - src.len() % block_size;
        let mut out = Vec::with_capacity(src.len() + overhead);
        out.extend_from_slice(src);
        out.resize(src.len() + overhead, overhead as u8);
        out
    }

    fn unpad<'a>(&self, src: &'a [u8], block_size: usize) -> Result<&'a [u8]> {
        if src.is_empty() || block_size == 0 || src.len() % block_size != 0 {
            return Err(PaddingError::InvalidLength);
        }
        let n = src[src.len() - 1] as usize;
        if n == 0 || n > block_size {
            return Err(PaddingError::InvalidPadding);
        }
        if src[src.len() - n..].iter().any(|b| *b as usize != n) {
            return Err(PaddingError::InvalidPadding);
        }
        Ok(&src[..src.len() - n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso9797_m2() {
        let p = Iso9797M2;
        assert_eq!(p.pad(b"", 8), [0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(p.pad(b"abc", 4), [b'a', b'b', b'c', 0x80]);
        assert_eq!(p.pad(b"abcd", 4), [b'a', b'b', b'c', b'd', 0x80, 0, 0, 0]);

        for n in 0..40 {
            let src = vec![0x80u8; n];
            let padded = p.pad(&src, 16);
            assert_eq!(padded.len() % 16, 0);
            assert_eq!(p.unpad(&padded, 16).unwrap(), &src[..]);
        }
    }

    #[test]
    fn test_iso9797_m2_unpad_errors() {
        let p = Iso9797M2;
        assert_eq!(p.unpad(b"", 4), Err(PaddingError::InvalidLength));
        assert_eq!(p.unpad(b"abcde", 4), Err(PaddingError::InvalidLength));
        assert_eq!(p.unpad(&[1, 2, 3, 4], 4), Err(PaddingError::InvalidPadding));
        assert_eq!(p.unpad(&[0, 0, 0, 0], 4), Err(PaddingError::InvalidPadding));
        assert_eq!(p.unpad(&[0x80, 0, 1, 0], 4), Err(PaddingError::InvalidPadding));
        assert_eq!(p.unpad(&[1, 0x80, 0, 0], 4), Ok(&[1u8][..]));
    }

    #[test]
    fn test_pkcs7() {
        let p = Pkcs7;
        assert_eq!(p.pad(b"abc", 4), [b'a', b'b', b'c', 1]);
        assert_eq!(p.pad(b"abcd", 4), [b'a', b'b', b'c', b'd', 4, 4, 4, 4]);
        assert_eq!(p.unpad(&[b'a', 3, 3, 3], 4), Ok(&b"a"[..]));
        assert_eq!(p.unpad(&[b'a', 2, 3, 3], 4), Err(PaddingError::InvalidPadding));
        assert_eq!(p.unpad(&[b'a', 2, 3, 5], 4), Err(PaddingError::InvalidPadding));
        assert_eq!(p.unpad(&[1, 2, 3, 0], 4), Err(PaddingError::InvalidPadding));
    }
}
