use crate::cryptobyte::Error;
use alloc::vec::Vec;

// BitString is the structure to use when you want an ASN.1 BIT STRING type. A
// bit string is padded up to the nearest byte in memory and the number of
// valid bits is recorded. Padding bits will be zero.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BitString {
    pub bytes: Vec<u8>,
    pub bit_length: usize,
}

impl BitString {
    pub fn new(bytes: impl Into<Vec<u8>>, bit_length: usize) -> BitString {
        BitString { bytes: bytes.into(), bit_length }
    }

    // A bit string made of whole bytes, as keys and points are carried.
    pub fn from_bytes(bytes: &[u8]) -> BitString {
        BitString { bytes: bytes.to_vec(), bit_length: 8 * bytes.len() }
    }

    // returns the i-th bit
    // Note the the index is count from highest bit to lowest.
    // EX:
    // 6e        5d        c0
    // 0110 1110 0101 1101 1100 0000
    pub fn at(&self, i: usize) -> Option<u8> {
        if i >= self.bit_length {
            return None;
        }
        let shift = 7 - (i % 8);
        Some((self.bytes[i / 8] >> shift) & 1)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    // The number of unused bits in the last byte.
    pub fn padding_bits(&self) -> u8 {
        ((8 - self.bit_length % 8) % 8) as u8
    }

    // Shifts the bits to the right so that the last bit is the lsb.
    pub fn right_align(&self) -> Vec<u8> {
        let shift = self.padding_bits() as u32;
        if shift == 0 || self.bytes.is_empty() {
            return self.bytes.clone();
        }

        let mut a = Vec::with_capacity(self.bytes.len());
        a.push(self.bytes[0] >> shift);
        for i in 1..self.bytes.len() {
            a.push((self.bytes[i - 1] << (8 - shift)) | (self.bytes[i] >> shift));
        }
        a
    }
}

// parse the contents of an asn.1 BIT STRING
impl TryFrom<&[u8]> for BitString {
    type Error = Error;

    fn try_from(v: &[u8]) -> Result<Self, Self::Error> {
        if v.is_empty() {
            return Err(Error::InvalidBitStringLength);
        }
        let pad_length = v[0] as usize;
        if pad_length > 7 || (v.len() == 1 && pad_length > 0) || (v[v.len() - 1] & ((1u8 << pad_length) - 1)) != 0 {
            return Err(Error::InvalidBitStringPadding);
        }

        let bit_length = 8 * (v.len() - 1) - pad_length;
        Ok(BitString { bytes: v[1..].to_vec(), bit_length })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift() {
        let b = BitString::new(vec![0xff, 0xff, 0xe0], 19);
        assert_eq!(b.padding_bits(), 5);
        assert_eq!([0x07, 0xff, 0xff], b.right_align()[..]);
    }

    #[test]
    fn test_at() {
        let b = BitString::new(vec![0x6e, 0x5d, 0xc0], 18);
        let bits: Vec<u8> = (0..18).map(|i| b.at(i).unwrap()).collect();
        assert_eq!(bits, [0, 1, 1, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1, 1, 0, 1, 1, 1]);
        assert_eq!(b.at(18), None);
    }

    #[test]
    fn test_parse() {
        let b = BitString::try_from(&[0x06u8, 0x6e, 0x5d, 0xc0][..]).unwrap();
        assert_eq!(b.bit_length, 18);
        assert_eq!(BitString::try_from(&[0x00u8][..]).unwrap().bit_length, 0);
        assert_eq!(BitString::try_from(&[0u8; 0][..]), Err(Error::InvalidBitStringLength));
        assert_eq!(BitString::try_from(&[0x08u8, 0x00][..]), Err(Error::InvalidBitStringPadding));
        assert_eq!(BitString::try_from(&[0x01u8][..]), Err(Error::InvalidBitStringPadding));
        assert_eq!(BitString::try_from(&[0x06u8, 0x6e, 0x5d, 0xc1][..]), Err(Error::InvalidBitStringPadding));
    }
}
