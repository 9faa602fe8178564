use crate::{rc5, sm3, sm4};

/// A streaming hash with a fixed digest size, used by the KDF and HMAC.
pub trait Hash<const DIGEST_SIZE: usize> {
    fn reset(&mut self);

    fn write(&mut self, data: &[u8]);

    fn sum_into(&self, digest: &mut [u8]);

    fn sum(&self) -> [u8; DIGEST_SIZE] {
        let mut digest = [0; DIGEST_SIZE];
        self.sum_into(&mut digest);
        digest
    }

    // The block size of the input for the Hash, used in HMAC.
    // For SM3, it's 64.
    fn block_size(&self) -> usize;
}

impl Hash<32> for sm3::Digest {
    fn reset(&mut self) {
        sm3::Digest::reset(self);
    }

    fn write(&mut self, data: &[u8]) {
        sm3::Digest::write(self, data);
    }

    fn sum_into(&self, digest: &mut [u8]) {
        sm3::Digest::sum_into(self, digest);
    }

    fn sum(&self) -> [u8; 32] {
        sm3::Digest::sum(self)
    }

    fn block_size(&self) -> usize {
        sm3::BLOCK_SIZE
    }
}

pub trait Block {
    fn block_size(&self) -> usize;

    // Encrypt as many blocks as possible from src to dst.
    // More precisely, encrypt min(dst.len()/BLOCK_SIZE, src.len()/BLOCK_SIZE) blocks.
    // Returns the number of bytes encrypted.
    fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize;
    fn decrypt(&self, dst: &mut [u8], src: &[u8]) -> usize;

    fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize;
    fn decrypt_inplace(&self, in_out: &mut [u8]) -> usize;
}

macro_rules! impl_block {
    ($t: ty, $block_size: expr) => {
        impl Block for $t {
            fn block_size(&self) -> usize {
                $block_size
            }

            fn encrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
                <$t>::encrypt(self, dst, src)
            }

            fn decrypt(&self, dst: &mut [u8], src: &[u8]) -> usize {
                <$t>::decrypt(self, dst, src)
            }

            fn encrypt_inplace(&self, in_out: &mut [u8]) -> usize {
                <$t>::encrypt_inplace(self, in_out)
            }

            fn decrypt_inplace(&self, in_out: &mut [u8]) -> usize {
                <$t>::decrypt_inplace(self, in_out)
            }
        }
    };
}

impl_block!(sm4::Cipher, sm4::BLOCK_SIZE);
impl_block!(rc5::Cipher32, rc5::Cipher32::BLOCK_SIZE);
impl_block!(rc5::Cipher64, rc5::Cipher64::BLOCK_SIZE);
