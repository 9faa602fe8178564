use core::mem;

use alloc::vec::Vec;

use super::asn1::{BitString, ObjectIdentifier};
use super::*;

/// Appends DER values to a byte vector.
///
/// Errors are sticky: once one is hit every later call is a no-op and
/// [`Builder::take`] reports the first error.
#[derive(Default)]
pub struct Builder {
    out: Vec<u8>,
    err: Option<Error>,
}

// Definite length: short form below 0x80, otherwise 0x80|k followed by k
// big-endian octets with k <= 4.
fn push_length(out: &mut Vec<u8>, len: usize) -> Result<()> {
    if len < 0x80 {
        out.push(len as u8);
        return Ok(());
    }
    let be = u32::try_from(len).map_err(|_| Error::LengthOverflow)?.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (be.len() - skip) as u8);
    out.extend_from_slice(&be[skip..]);
    Ok(())
}

impl Builder {
    pub fn new(out: Vec<u8>) -> Self {
        Builder { out, err: None }
    }

    /// Returns the encoding and leaves the builder empty.
    pub fn take(&mut self) -> Result<Vec<u8>> {
        match self.err {
            Some(e) => Err(e),
            None => Ok(mem::take(&mut self.out)),
        }
    }

    fn fail(&mut self, e: Error) {
        self.err.get_or_insert(e);
    }

    pub fn add_u8(&mut self, v: u8) {
        self.add_bytes(&[v]);
    }

    pub fn add_bytes(&mut self, bytes: &[u8]) {
        if self.err.is_none() {
            self.out.extend_from_slice(bytes);
        }
    }

    /// Writes a TLV whose contents are produced by `f` on a nested builder.
    pub fn add_asn1<F>(&mut self, tag: Tag, f: F)
    where
        F: FnOnce(&mut Builder),
    {
        if self.err.is_some() {
            return;
        }
        if !tag.is_low_number() {
            self.fail(Error::UnsupportedTag(tag.0));
            return;
        }
        let mut child = Builder::default();
        f(&mut child);
        if let Some(e) = child.err {
            self.fail(e);
            return;
        }
        self.out.push(tag.0);
        if let Err(e) = push_length(&mut self.out, child.out.len()) {
            self.fail(e);
            return;
        }
        self.out.append(&mut child.out);
    }

    pub fn add_asn1_sequence<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Builder),
    {
        self.add_asn1(SEQUENCE, f)
    }

    /// A non-negative INTEGER from big-endian magnitude bytes, written minimally.
    pub fn add_asn1_uint(&mut self, be: &[u8]) {
        let v = &be[be.iter().take_while(|b| **b == 0).count()..];
        self.add_asn1(INTEGER, |b| {
            if v.first().is_none_or(|x| x & 0x80 != 0) {
                b.add_u8(0);
            }
            b.add_bytes(v);
        })
    }

    pub fn add_asn1_octet_string(&mut self, bytes: &[u8]) {
        self.add_asn1(OCTET_STRING, |b| b.add_bytes(bytes))
    }

    pub fn add_asn1_bit_string(&mut self, v: &BitString) {
        self.add_asn1(BIT_STRING, |b| {
            b.add_u8(v.padding_bits());
            b.add_bytes(v.as_slice());
        })
    }

    pub fn add_asn1_object_identifier(&mut self, oid: &ObjectIdentifier) {
        if !oid.is_valid() {
            self.fail(Error::InvalidOid);
            return;
        }
        self.add_asn1(OBJECT_IDENTIFIER, |b| b.add_bytes(oid.as_der()));
    }

    pub fn add_asn1_boolean(&mut self, v: bool) {
        self.add_asn1(BOOLEAN, |b| b.add_u8(if v { 0xff } else { 0 }));
    }

    pub fn add_asn1_null(&mut self) {
        self.add_asn1(NULL, |_| {});
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(f: impl FnOnce(&mut Builder)) -> Result<Vec<u8>> {
        let mut b = Builder::new(Vec::new());
        f(&mut b);
        b.take()
    }

    #[test]
    fn test_nested() {
        let out = build(|b| {
            b.add_asn1_sequence(|b| {
                b.add_asn1_octet_string(&[1, 2]);
                b.add_asn1_sequence(|b| b.add_asn1_null());
            })
        });
        assert_eq!(out.unwrap(), vec![0x30, 8, 4, 2, 1, 2, 0x30, 2, 5, 0]);
    }

    #[test]
    fn test_long_lengths() {
        let out = build(|b| b.add_asn1_octet_string(&[0xaa; 0x80])).unwrap();
        assert_eq!(&out[..3], &[4, 0x81, 0x80]);
        assert_eq!(out.len(), 3 + 0x80);

        let out = build(|b| b.add_asn1_octet_string(&[0xaa; 300])).unwrap();
        assert_eq!(&out[..4], &[4, 0x82, 0x01, 0x2c]);
        assert_eq!(out.len(), 304);

        let out = build(|b| b.add_asn1_octet_string(&[0; 0x7f])).unwrap();
        assert_eq!(&out[..2], &[4, 0x7f]);
    }

    #[test]
    fn test_errors_are_sticky() {
        let mut b = Builder::new(Vec::new());
        b.add_asn1_sequence(|b| {
            b.add_asn1_null();
            b.add_asn1(Tag(0x1f), |_| {});
        });
        b.add_asn1_null();
        assert_eq!(b.take(), Err(Error::UnsupportedTag(0x1f)));
    }

    #[test]
    fn test_uint() {
        let out = build(|b| {
            b.add_asn1_uint(&[0, 0, 0x7f, 1]);
            b.add_asn1_uint(&[0x80]);
            b.add_asn1_uint(&[0, 0]);
            b.add_asn1_uint(&[]);
        });
        assert_eq!(out.unwrap(), vec![2, 2, 0x7f, 1, 2, 2, 0, 0x80, 2, 1, 0, 2, 1, 0]);
    }

    #[test]
    fn test_primitives() {
        let out = build(|b| {
            b.add_asn1_sequence(|b| {
                b.add_asn1_boolean(true);
                b.add_asn1_boolean(false);
                b.add_asn1_bit_string(&BitString::new(vec![0x6e, 0x5d, 0xc0], 18));
            })
        });
        assert_eq!(out.unwrap(), vec![0x30, 12, 1, 1, 0xff, 1, 1, 0, 3, 4, 6, 0x6e, 0x5d, 0xc0]);
    }

    #[test]
    fn test_object_identifier() {
        let out = build(|b| b.add_asn1_object_identifier(&crate::oid!(1, 2, 156, 10197, 1, 301)));
        assert_eq!(out.unwrap(), vec![6, 8, 0x2a, 0x81, 0x1c, 0xcf, 0x55, 0x01, 0x82, 0x2d]);
    }
}
