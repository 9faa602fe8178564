//! SM4 block cipher (GB/T 32907-2016).

mod block;
mod tables;

use zeroize::Zeroize;

use block::*;

pub const BLOCK_SIZE: usize = 16;
pub const KEY_SIZE: usize = 16;

pub struct Cipher {
    rk: [u32; 32],
    rk_rev: [u32; 32],
}

impl Cipher {
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        let (rk, rk_rev) = key_schedule(key);
        Cipher { rk, rk_rev }
    }

    /// Returns None if the key is not 16 bytes.
    pub fn new_from_slice(key: &[u8]) -> Option<Self> {
        let key: &[u8; KEY_SIZE] = key.try_into().ok()?;
        Some(Self::new(key))
    }

    // encrypt blocks into dst. returns the bytes encrypted.
    pub fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
        crypt_blocks(dst, src, &self.rk)
    }

    // decrypt blocks into dst. returns the bytes decrypted.
    pub fn decrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
        crypt_blocks(dst, src, &self.rk_rev)
    }

    pub fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize {
        crypt_blocks_inplace(in_out, &self.rk)
    }

    pub fn decrypt_inplace(&self, in_out: &mut [u8]) -> usize {
        crypt_blocks_inplace(in_out, &self.rk_rev)
    }
}

impl Drop for Cipher {
    fn drop(&mut self) {
        self.rk.zeroize();
        self.rk_rev.zeroize();
    }
}

const FK: [u32; 4] = [0xa3b1bac6, 0x56aa3350, 0x677d9197, 0xb27022dc];
const CK: [u32; 32] = [
    0x00070e15, 0x1c232a31, 0x383f464d, 0x545b6269, 0x70777e85, 0x8c939aa1,
    0xa8afb6bd, 0xc4cbd2d9, 0xe0e7eef5, 0xfc030a11, 0x181f262d, 0x343b4249,
    0x50575e65, 0x6c737a81, 0x888f969d, 0xa4abb2b9, 0xc0c7ced5, 0xdce3eaf1,
    0xf8ff060d, 0x141b2229, 0x30373e45, 0x4c535a61, 0x686f767d, 0x848b9299,
    0xa0a7aeb5, 0xbcc3cad1, 0xd8dfe6ed, 0xf4fb0209, 0x10171e25, 0x2c333a41,
    0x484f565d, 0x646b7279,
];

#[inline]
fn key_schedule(key: &[u8; KEY_SIZE]) -> ([u32; 32], [u32; 32]) {
    let mut rk = [0u32; 32];
    let mut rk_rev = [0u32; 32];
    let (a, b, c, d) = load_block(key);
    let mut k = [a ^ FK[0], b ^ FK[1], c ^ FK[2], d ^ FK[3]];
    for i in 0..32 {
        let t = x32::tau(k[(i + 1) % 4] ^ k[(i + 2) % 4] ^ k[(i + 3) % 4] ^ CK[i]);
        k[i % 4] ^= x32::L_key(t);
        rk[i] = k[i % 4];
        rk_rev[31 - i] = k[i % 4];
    }
    k.zeroize();
    (rk, rk_rev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("0123456789abcdeffedcba9876543210");

    const TEST_ROUNDKEY: [u32; 32] = [
        0xf12186f9, 0x41662b61, 0x5a6ab19a, 0x7ba92077, 0x367360f4, 0x776a0c61, 0xb6bb89b3,
        0x24763151, 0xa520307c, 0xb7584dbd, 0xc30753ed, 0x7ee55b57, 0x6988608c, 0x30d895b7,
        0x44ba14af, 0x104495a1, 0xd120b428, 0x73b55fa3, 0xcc874966, 0x92244439, 0xe89e641f,
        0x98ca015a, 0xc7159060, 0x99e1fd2e, 0xb79bd80c, 0x1d2115b0, 0x0e228aeb, 0xf1780c81,
        0x428d3654, 0x62293496, 0x01cf72e5, 0x9124a012,
    ];

    const TEST_CIPHER: [u8; 16] = hex!("681edf34d206965e86b3e94f536e4246");

    #[test]
    fn test_key_schedule() {
        let (rk, rk_rev) = key_schedule(&KEY);
        assert_eq!(rk, TEST_ROUNDKEY);
        for i in 0..32 {
            assert_eq!(rk_rev[i], TEST_ROUNDKEY[31 - i]);
        }
    }

    #[test]
    fn test_encrypt_decrypt() {
        let c = Cipher::new(&KEY);
        let mut out = [0u8; 16];
        assert_eq!(c.encrypt(&mut out, &KEY), 16);
        assert_eq!(out, TEST_CIPHER);

        let mut back = [0u8; 16];
        assert_eq!(c.decrypt(&mut back, &out), 16);
        assert_eq!(back, KEY);
    }

    #[test]
    fn test_million_iterations() {
        let c = Cipher::new(&KEY);
        let mut b = KEY;
        for _ in 0..1_000_000 {
            c.encrypt_inplace(&mut b);
        }
        assert_eq!(b, hex!("595298c7c6fd271f0402f804c33d3f66"));
    }

    #[test]
    fn test_blocks() {
        let c = Cipher::new(&hex!("000102030405060708090a0b0c0d0e0f"));
        let plain: std::vec::Vec<u8> = (0u8..32).collect();
        let want = hex!("8f78763ee06013e0b7622c428fd0528da73851aa4341e968c71dd8a3a0c8497c");

        // a trailing partial block is left alone.
        let mut out = [0xffu8; 40];
        let mut src = [0u8; 40];
        src[..32].copy_from_slice(&plain);
        assert_eq!(c.encrypt(&mut out, &src), 32);
        assert_eq!(&out[..32], &want);
        assert_eq!(&out[32..], &[0xff; 8]);

        let mut in_out = want;
        assert_eq!(c.decrypt_inplace(&mut in_out), 32);
        assert_eq!(&in_out[..], &plain[..]);

        // dst shorter than src.
        let mut short = [0u8; 20];
        assert_eq!(c.encrypt(&mut short, &plain), 16);
        assert_eq!(&short[..16], &want[..16]);
    }

    #[test]
    fn test_new_from_slice() {
        assert!(Cipher::new_from_slice(&[0u8; 15]).is_none());
        assert!(Cipher::new_from_slice(&[0u8; 16]).is_some());
    }
}
