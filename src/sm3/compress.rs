//! Portable SM3 compression function.

use super::util::*;
use super::BLOCK_SIZE;

// W_0..W_67 of one block. W'_j = W_j ^ W_{j+4} is formed in the rounds.
#[inline(always)]
fn expand(block: &[u8]) -> [u32; 68] {
    let mut w = [0u32; 68];
    for (wi, word) in w.iter_mut().zip(block.chunks_exact(4)) {
        *wi = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
    }
    for j in 16..68 {
        w[j] = p1(w[j - 16] ^ w[j - 9] ^ w[j - 3].rotate_left(15)) ^ w[j - 13].rotate_left(7) ^ w[j - 6];
    }
    w
}

fn compress_block(s: &mut [u32; 8], block: &[u8]) {
    let w = expand(block);
    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *s;
    for j in 0..64 {
        let a12 = a.rotate_left(12);
        let ss1 = a12.wrapping_add(e).wrapping_add(T[j]).rotate_left(7);
        let ss2 = ss1 ^ a12;
        let (ff, gg) = match j < 16 {
            true => (ff0(a, b, c), gg0(e, f, g)),
            false => (ff1(a, b, c), gg1(e, f, g)),
        };
        let tt1 = ff.wrapping_add(d).wrapping_add(ss2).wrapping_add(w[j] ^ w[j + 4]);
        let tt2 = gg.wrapping_add(h).wrapping_add(ss1).wrapping_add(w[j]);
        d = c;
        c = b.rotate_left(9);
        b = a;
        a = tt1;
        h = g;
        g = f.rotate_left(19);
        f = e;
        e = p0(tt2);
    }
    for (si, v) in s.iter_mut().zip([a, b, c, d, e, f, g, h]) {
        *si ^= v;
    }
}

/// Absorbs every whole block of p into s and returns the remaining tail.
pub(crate) fn compress<'a>(s: &mut [u32; 8], p: &'a [u8]) -> &'a [u8] {
    let blocks = p.chunks_exact(BLOCK_SIZE);
    let tail = blocks.remainder();
    for block in blocks {
        compress_block(s, block);
    }
    tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        // "abc" padded, GB/T 32905 appendix A.
        let mut block = [0u8; BLOCK_SIZE];
        block[..4].copy_from_slice(&[0x61, 0x62, 0x63, 0x80]);
        block[63] = 0x18;
        let w = expand(&block);
        assert_eq!(w[16], 0x9092e200);
        assert_eq!(w[67], 0xb99c0545);

        let mut s = [0x7380166f, 0x4914b2b9, 0x172442d7, 0xda8a0600, 0xa96f30bc, 0x163138aa, 0xe38dee4d, 0xb0fb0e4e];
        let input = [&block[..], &[1u8, 2, 3][..]].concat();
        let tail = compress(&mut s, &input);
        assert_eq!(tail, &[1, 2, 3]);
        assert_eq!(s, [0x66c7f0f4, 0x62eeedd9, 0xd1f2d46b, 0xdc10e4e2, 0x4167c487, 0x5cf2f7a2, 0x297da02b, 0x8f4ba8e0]);
    }
}
