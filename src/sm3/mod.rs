//! SM3 cryptographic hash (GB/T 32905-2016).

mod compress;
pub(crate) mod util;

use compress::compress;

pub const BLOCK_SIZE: usize = 64;
pub const DIGEST_SIZE: usize = 32;

const IV: [u32; 8] = [0x7380166f, 0x4914b2b9, 0x172442d7, 0xda8a0600, 0xa96f30bc, 0x163138aa, 0xe38dee4d, 0xb0fb0e4e];

/// Streaming SM3 state. Cloning forks the computation, which HMAC uses to
/// keep its keyed inner and outer states.
#[derive(Debug, Copy, Clone)]
pub struct Digest {
    state: [u32; 8],
    buf: [u8; BLOCK_SIZE],
    buf_len: usize,
    // total bytes absorbed.
    total: u64,
}

impl Default for Digest {
    fn default() -> Self {
        Self::new()
    }
}

impl Digest {
    pub fn new() -> Digest {
        Digest { state: IV, buf: [0; BLOCK_SIZE], buf_len: 0, total: 0 }
    }

    pub fn reset(&mut self) -> &mut Digest {
        *self = Digest::new();
        self
    }

    pub fn write(&mut self, data: &[u8]) -> &mut Digest {
        self.total = self.total.wrapping_add(data.len() as u64);
        let mut data = data;

        if self.buf_len > 0 {
            let take = data.len().min(BLOCK_SIZE - self.buf_len);
            let (head, rest) = data.split_at(take);
            self.buf[self.buf_len..self.buf_len + take].copy_from_slice(head);
            self.buf_len += take;
            data = rest;
            if self.buf_len < BLOCK_SIZE {
                return self;
            }
            compress(&mut self.state, &self.buf);
            self.buf_len = 0;
        }

        let tail = compress(&mut self.state, data);
        self.buf[..tail.len()].copy_from_slice(tail);
        self.buf_len = tail.len();
        self
    }

    /// Writes the digest of everything absorbed so far into the first 32
    /// bytes of `output`. The state is left untouched.
    pub fn sum_into(&self, output: &mut [u8]) {
        // message tail, 0x80, zeros, then the 64-bit bit length.
        let blocks = if self.buf_len + 9 > BLOCK_SIZE { 2 } else { 1 };
        let mut last = [0u8; 2 * BLOCK_SIZE];
        last[..self.buf_len].copy_from_slice(&self.buf[..self.buf_len]);
        last[self.buf_len] = 0x80;
        let end = blocks * BLOCK_SIZE;
        last[end - 8..end].copy_from_slice(&(self.total << 3).to_be_bytes());

        let mut state = self.state;
        compress(&mut state, &last[..end]);
        for (out, word) in output[..DIGEST_SIZE].chunks_exact_mut(4).zip(state) {
            out.copy_from_slice(&word.to_be_bytes());
        }
    }

    pub fn sum(&self) -> [u8; DIGEST_SIZE] {
        let mut out = [0; DIGEST_SIZE];
        self.sum_into(&mut out);
        out
    }
}

/// One-shot SM3 over the concatenation of the arguments.
#[macro_export]
macro_rules! sm3 {
    ($($x:expr),+ $(,)?) => {{
        let mut h = $crate::sm3::Digest::new();
        $(
            h.write($x);
        )*
        h.sum()
    }};
}
