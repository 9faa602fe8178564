use super::tables::SBOX;
use super::BLOCK_SIZE;

#[inline(always)]
fn get_u32_be(src: &[u8]) -> u32 {
    u32::from_be_bytes([src[0], src[1], src[2], src[3]])
}

#[inline(always)]
fn put_u32_be(dst: &mut [u8], a: u32) {
    dst[..4].copy_from_slice(&a.to_be_bytes());
}

#[inline(always)]
pub(super) fn load_block(src: &[u8]) -> (u32, u32, u32, u32) {
    (get_u32_be(&src[0..4]), get_u32_be(&src[4..8]), get_u32_be(&src[8..12]), get_u32_be(&src[12..16]))
}

// The output words are stored in reverse order (the final R transform).
#[inline(always)]
pub(super) fn store_block(dst: &mut [u8], a: u32, b: u32, c: u32, d: u32) {
    put_u32_be(&mut dst[..4], d);
    put_u32_be(&mut dst[4..8], c);
    put_u32_be(&mut dst[8..12], b);
    put_u32_be(&mut dst[12..16], a);
}

pub(super) mod x32 {
    use super::SBOX;

    #[inline]
    pub fn tau(x: u32) -> u32 {
        (SBOX[(x & 0xff) as usize] as u32)
            | (SBOX[((x >> 8) & 0xff) as usize] as u32) << 8
            | (SBOX[((x >> 16) & 0xff) as usize] as u32) << 16
            | (SBOX[((x >> 24) & 0xff) as usize] as u32) << 24
    }

    #[inline]
    #[allow(non_snake_case)]
    pub fn L(x: u32) -> u32 {
        x ^ x.rotate_left(2) ^ x.rotate_left(10) ^ x.rotate_left(18) ^ x.rotate_left(24)
    }

    // L'(x) of the key schedule.
    #[inline]
    #[allow(non_snake_case)]
    pub fn L_key(x: u32) -> u32 {
        x ^ x.rotate_left(13) ^ x.rotate_left(23)
    }

    // lt returns L(tau(x)).
    #[inline]
    pub fn lt(x: u32) -> u32 {
        L(tau(x))
    }
}

/// Runs the 32 rounds over one block. `rk` is the encryption schedule for
/// encryption and the reversed schedule for decryption.
#[inline]
pub(super) fn crypt_block(dst: &mut [u8], src: &[u8], rk: &[u32; 32]) {
    debug_assert!(dst.len() >= BLOCK_SIZE && src.len() >= BLOCK_SIZE);

    let (mut a, mut b, mut c, mut d) = load_block(src);
    for k in rk.chunks_exact(4) {
        a ^= x32::lt(b ^ c ^ d ^ k[0]);
        b ^= x32::lt(c ^ d ^ a ^ k[1]);
        c ^= x32::lt(d ^ a ^ b ^ k[2]);
        d ^= x32::lt(a ^ b ^ c ^ k[3]);
    }
    store_block(dst, a, b, c, d);
}

// Processes min(dst, src) whole blocks, returns the bytes processed.
pub(super) fn crypt_blocks(dst: &mut [u8], src: &[u8], rk: &[u32; 32]) -> usize {
    let mut n = 0;
    for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
        crypt_block(d, s, rk);
        n += BLOCK_SIZE;
    }
    n
}

pub(super) fn crypt_blocks_inplace(in_out: &mut [u8], rk: &[u32; 32]) -> usize {
    let mut n = 0;
    let mut tmp = [0u8; BLOCK_SIZE];
    for b in in_out.chunks_exact_mut(BLOCK_SIZE) {
        tmp.copy_from_slice(b);
        crypt_block(b, &tmp, rk);
        n += BLOCK_SIZE;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tau() {
        assert_eq!(x32::tau(0), 0xd6d6d6d6);
        assert_eq!(x32::tau(0x00010203), 0xd690e9fe);
    }

    #[test]
    fn test_l_linear() {
        let (x, y) = (0x01234567u32, 0x89abcdefu32);
        assert_eq!(x32::L(x ^ y), x32::L(x) ^ x32::L(y));
        assert_eq!(x32::L_key(x ^ y), x32::L_key(x) ^ x32::L_key(y));
        assert_eq!(x32::L(1), 1 | 1 << 2 | 1 << 10 | 1 << 18 | 1 << 24);
    }
}
