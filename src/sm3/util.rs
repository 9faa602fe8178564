// Boolean and permutation functions of the SM3 compression function.

#[inline(always)]
pub(crate) fn ff0(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}

#[inline(always)]
pub(crate) fn ff1(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (x & z) | (y & z)
}

#[inline(always)]
pub(crate) fn gg0(x: u32, y: u32, z: u32) -> u32 {
    x ^ y ^ z
}

#[inline(always)]
pub(crate) fn gg1(x: u32, y: u32, z: u32) -> u32 {
    (x & y) | (!x & z)
}

#[inline(always)]
pub(crate) fn p0(x: u32) -> u32 {
    x ^ x.rotate_left(9) ^ x.rotate_left(17)
}

#[inline(always)]
pub(crate) fn p1(x: u32) -> u32 {
    x ^ x.rotate_left(15) ^ x.rotate_left(23)
}

const fn t_table() -> [u32; 64] {
    let mut t = [0u32; 64];
    let mut i = 0;
    while i < 64 {
        let tj: u32 = if i < 16 { 0x79cc4519 } else { 0x7a879d8a };
        t[i] = tj.rotate_left((i % 32) as u32);
        i += 1;
    }
    t
}

/// T_j <<< j, for j in 0..64.
pub(crate) const T: [u32; 64] = t_table();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t_table() {
        assert_eq!(&T[..4], &[0x79cc4519, 0xf3988a32, 0xe7311465, 0xce6228cb]);
        assert_eq!(T[16], 0x9d8a7a87);
        assert_eq!(T[32], 0x7a879d8a);
    }
}
