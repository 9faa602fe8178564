//! RC5-w/r/b with 32 and 64 bit words.
//!
//! Keys are 16, 24 or 32 bytes and the number of rounds is in `8..=127`.
//! Words are loaded little-endian as in Rivest's reference.

use alloc::vec::Vec;
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RC5Error {
    #[error("rc5: invalid key size {0}, should be 16, 24 or 32")]
    InvalidKeySize(usize),

    #[error("rc5: invalid rounds {0}, should be between 8 and 127")]
    InvalidRounds(usize),
}

pub type Result<T> = core::result::Result<T, RC5Error>;

fn check_params(key: &[u8], rounds: usize) -> Result<()> {
    match key.len() {
        16 | 24 | 32 => {}
        n => return Err(RC5Error::InvalidKeySize(n)),
    }
    if !(8..=127).contains(&rounds) {
        return Err(RC5Error::InvalidRounds(rounds));
    }
    Ok(())
}

macro_rules! rc5_cipher {
    ($name: ident, $word: ty, $p: expr, $q: expr) => {
        pub struct $name {
            s: Vec<$word>,
            rounds: usize,
        }

        impl $name {
            const WORD_SIZE: usize = core::mem::size_of::<$word>();
            pub const BLOCK_SIZE: usize = 2 * Self::WORD_SIZE;

            pub fn new(key: &[u8], rounds: usize) -> Result<Self> {
                check_params(key, rounds)?;

                let mut l: Vec<$word> = key
                    .chunks_exact(Self::WORD_SIZE)
                    .map(|c| {
                        let mut w = [0u8; core::mem::size_of::<$word>()];
                        w.copy_from_slice(c);
                        <$word>::from_le_bytes(w)
                    })
                    .collect();

                let t = 2 * rounds + 2;
                let mut s = Vec::with_capacity(t);
                let mut x: $word = $p;
                for _ in 0..t {
                    s.push(x);
                    x = x.wrapping_add($q);
                }

                let (mut a, mut b): ($word, $word) = (0, 0);
                let (mut i, mut j) = (0, 0);
                for _ in 0..3 * core::cmp::max(t, l.len()) {
                    s[i] = s[i].wrapping_add(a).wrapping_add(b).rotate_left(3);
                    a = s[i];
                    let ab = a.wrapping_add(b);
                    l[j] = l[j].wrapping_add(ab).rotate_left(ab as u32);
                    b = l[j];
                    i = (i + 1) % t;
                    j = (j + 1) % l.len();
                }
                l.zeroize();

                Ok($name { s, rounds })
            }

            #[inline]
            fn load(src: &[u8]) -> ($word, $word) {
                let mut a = [0u8; core::mem::size_of::<$word>()];
                let mut b = [0u8; core::mem::size_of::<$word>()];
                a.copy_from_slice(&src[..Self::WORD_SIZE]);
                b.copy_from_slice(&src[Self::WORD_SIZE..Self::BLOCK_SIZE]);
                (<$word>::from_le_bytes(a), <$word>::from_le_bytes(b))
            }

            #[inline]
            fn store(dst: &mut [u8], a: $word, b: $word) {
                dst[..Self::WORD_SIZE].copy_from_slice(&a.to_le_bytes());
                dst[Self::WORD_SIZE..Self::BLOCK_SIZE].copy_from_slice(&b.to_le_bytes());
            }

            fn encrypt_block(&self, dst: &mut [u8], src: &[u8]) {
                let (a, b) = Self::load(src);
                let mut a = a.wrapping_add(self.s[0]);
                let mut b = b.wrapping_add(self.s[1]);
                for r in 1..=self.rounds {
                    a = (a ^ b).rotate_left(b as u32).wrapping_add(self.s[2 * r]);
                    b = (b ^ a).rotate_left(a as u32).wrapping_add(self.s[2 * r + 1]);
                }
                Self::store(dst, a, b);
            }

            fn decrypt_block(&self, dst: &mut [u8], src: &[u8]) {
                let (mut a, mut b) = Self::load(src);
                for r in (1..=self.rounds).rev() {
                    b = b.wrapping_sub(self.s[2 * r + 1]).rotate_right(a as u32) ^ a;
                    a = a.wrapping_sub(self.s[2 * r]).rotate_right(b as u32) ^ b;
                }
                Self::store(dst, a.wrapping_sub(self.s[0]), b.wrapping_sub(self.s[1]));
            }

            // encrypt blocks into dst. returns the bytes encrypted.
            pub fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
                let mut n = 0;
                for (d, s) in dst.chunks_exact_mut(Self::BLOCK_SIZE).zip(src.chunks_exact(Self::BLOCK_SIZE)) {
                    self.encrypt_block(d, s);
                    n += Self::BLOCK_SIZE;
                }
                n
            }

            pub fn decrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
                let mut n = 0;
                for (d, s) in dst.chunks_exact_mut(Self::BLOCK_SIZE).zip(src.chunks_exact(Self::BLOCK_SIZE)) {
                    self.decrypt_block(d, s);
                    n += Self::BLOCK_SIZE;
                }
                n
            }

            pub fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize {
                let mut n = 0;
                let mut tmp = [0u8; 2 * core::mem::size_of::<$word>()];
                for b in in_out.chunks_exact_mut(Self::BLOCK_SIZE) {
                    tmp.copy_from_slice(b);
                    self.encrypt_block(b, &tmp);
                    n += Self::BLOCK_SIZE;
                }
                n
            }

            pub fn decrypt_inplace(&self, in_out: &mut [u8]) -> usize {
                let mut n = 0;
                let mut tmp = [0u8; 2 * core::mem::size_of::<$word>()];
                for b in in_out.chunks_exact_mut(Self::BLOCK_SIZE) {
                    tmp.copy_from_slice(b);
                    self.decrypt_block(b, &tmp);
                    n += Self::BLOCK_SIZE;
                }
                n
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                self.s.zeroize();
            }
        }
    };
}

rc5_cipher!(Cipher32, u32, 0xb7e15163, 0x9e3779b9);
rc5_cipher!(Cipher64, u64, 0xb7e151628aed2a6b, 0x9e3779b97f4a7c15);

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_rc5_32_12_16() {
        let c = Cipher32::new(&[0u8; 16], 12).unwrap();
        let mut out = [0u8; 8];
        c.encrypt(&mut out, &[0u8; 8]);
        assert_eq!(out, hex!("21A5DBEE154B8F6D"));

        let mut back = [0u8; 8];
        c.decrypt(&mut back, &out);
        assert_eq!(back, [0u8; 8]);
    }

    // Rivest's chained vectors: each key is the previous (pt, ct) pair.
    #[test]
    fn test_rc5_32_12_16_chain() {
        let cases = [
            (hex!("915F4619BE41B2516355A50110A9CE91"), hex!("21A5DBEE154B8F6D"), hex!("F7C013AC5B2B8952")),
            (hex!("783348E75AEB0F2FD7B169BB8DC16787"), hex!("F7C013AC5B2B8952"), hex!("2F42B3B70369FC92")),
            (hex!("DC49DB1375A5584F6485B413B5F12BAF"), hex!("2F42B3B70369FC92"), hex!("65C178B284D197CC")),
            (hex!("5269F149D41BA0152497574D7F153125"), hex!("65C178B284D197CC"), hex!("EB44E415DA319824")),
        ];
        for (key, pt, ct) in cases {
            let c = Cipher32::new(&key, 12).unwrap();
            let mut b = pt;
            assert_eq!(c.encrypt_inplace(&mut b), 8);
            assert_eq!(b, ct);
            assert_eq!(c.decrypt_inplace(&mut b), 8);
            assert_eq!(b, pt);
        }
    }

    #[test]
    fn test_rc5_32_20_16() {
        let c = Cipher32::new(&hex!("000102030405060708090A0B0C0D0E0F"), 20).unwrap();
        let mut out = [0u8; 8];
        c.encrypt(&mut out, &hex!("0001020304050607"));
        assert_eq!(out, hex!("2A0EDC0E9431FF73"));
    }

    #[test]
    fn test_rc5_32_longer_keys() {
        let key: std::vec::Vec<u8> = (0u8..32).collect();
        let pt = hex!("0001020304050607");
        let mut out = [0u8; 8];
        Cipher32::new(&key[..24], 12).unwrap().encrypt(&mut out, &pt);
        assert_eq!(out, hex!("bb900cf7269ad1d9"));
        Cipher32::new(&key, 12).unwrap().encrypt(&mut out, &pt);
        assert_eq!(out, hex!("b29c080c3f945c24"));
    }

    #[test]
    fn test_rc5_64_24_24() {
        let key: std::vec::Vec<u8> = (0u8..24).collect();
        let c = Cipher64::new(&key, 24).unwrap();
        let pt = hex!("000102030405060708090A0B0C0D0E0F");
        let mut out = [0u8; 16];
        assert_eq!(c.encrypt(&mut out, &pt), 16);
        assert_eq!(out, hex!("A46772820EDBCE0235ABEA32AE7178DA"));

        let mut back = [0u8; 16];
        c.decrypt(&mut back, &out);
        assert_eq!(back, pt);
    }

    #[test]
    fn test_rc5_64_16_16() {
        let key: std::vec::Vec<u8> = (0u8..16).collect();
        let c = Cipher64::new(&key, 16).unwrap();
        let mut b: [u8; 16] = core::array::from_fn(|i| i as u8);
        c.encrypt_inplace(&mut b);
        assert_eq!(b, hex!("34b0bcae559dd60566b6ba2b74ad0695"));
    }

    #[test]
    fn test_invalid_params() {
        assert_eq!(Cipher32::new(&[0u8; 15], 12).err(), Some(RC5Error::InvalidKeySize(15)));
        assert_eq!(Cipher64::new(&[0u8; 16], 7).err(), Some(RC5Error::InvalidRounds(7)));
        assert_eq!(Cipher64::new(&[0u8; 16], 128).err(), Some(RC5Error::InvalidRounds(128)));
        assert!(Cipher32::new(&[0u8; 32], 127).is_ok());
    }
}
