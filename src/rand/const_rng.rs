use alloc::vec::Vec;

use ::rand::RngCore;

/// An RNG that replays a fixed byte string, starting over when it runs out.
///
/// Signing or encrypting with it makes the nonce a known value, e.g. the
/// `k` of a published SM2 example. Never use it outside tests.
#[derive(Debug, Clone)]
pub struct ConstRngCore {
    bytes: Vec<u8>,
    pos: usize,
}

impl ConstRngCore {
    /// An empty `bytes` replays zeros.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        if bytes.is_empty() {
            bytes.push(0);
        }
        ConstRngCore { bytes, pos: 0 }
    }

    /// Replays the concatenation of `parts`.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        Self::new(parts.concat())
    }
}

impl RngCore for ConstRngCore {
    fn next_u32(&mut self) -> u32 {
        let mut b = [0u8; 4];
        self.fill_bytes(&mut b);
        u32::from_le_bytes(b)
    }

    fn next_u64(&mut self) -> u64 {
        let mut b = [0u8; 8];
        self.fill_bytes(&mut b);
        u64::from_le_bytes(b)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for x in dest {
            *x = self.bytes[self.pos];
            self.pos = (self.pos + 1) % self.bytes.len();
        }
    }
}
