use super::asn1::{BitString, ObjectIdentifier};
use super::*;

/// Reads DER values off the front of a byte slice.
///
/// Every `read_*` either consumes exactly one well-formed value and returns
/// its contents, or returns None and leaves the input untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parser<'a> {
    rest: &'a [u8],
}

impl<'a> From<&'a [u8]> for Parser<'a> {
    fn from(value: &'a [u8]) -> Self {
        Parser::new(value)
    }
}

// One decoded value: tag, header length and total length.
struct Header {
    tag: Tag,
    header_len: usize,
    total_len: usize,
}

// Parses the identifier and a minimal definite length.
fn parse_header(v: &[u8]) -> Option<Header> {
    let (&tag, rest) = v.split_first()?;
    let tag = Tag(tag);
    if !tag.is_low_number() {
        return None;
    }
    let (&first, rest) = rest.split_first()?;
    let (len, header_len) = if first < 0x80 {
        (first as usize, 2)
    } else {
        let k = (first & 0x7f) as usize;
        if k == 0 || k > 4 || rest.len() < k || rest[0] == 0 {
            return None;
        }
        let len = rest[..k].iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
        // short form was available.
        if len < 0x80 {
            return None;
        }
        (len, 2 + k)
    };
    let total_len = header_len.checked_add(len)?;
    (total_len <= v.len()).then_some(Header { tag, header_len, total_len })
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a [u8]) -> Self {
        Parser { rest: s }
    }

    pub fn len(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// The remaining, unread input.
    pub fn remaining(&self) -> &'a [u8] {
        self.rest
    }

    pub fn peek_tag(&self) -> Option<Tag> {
        self.rest.first().map(|t| Tag(*t))
    }

    // Consumes one value with the expected tag; returns (whole element, contents).
    fn read_tagged(&mut self, tag: Tag) -> Option<(&'a [u8], &'a [u8])> {
        let h = parse_header(self.rest)?;
        if h.tag != tag {
            return None;
        }
        let (element, rest) = self.rest.split_at(h.total_len);
        self.rest = rest;
        Some((element, &element[h.header_len..]))
    }

    /// Returns the contents of the next value if it carries `tag`.
    pub fn read_asn1(&mut self, tag: Tag) -> Option<&'a [u8]> {
        self.read_tagged(tag).map(|(_, contents)| contents)
    }

    /// Like [`Parser::read_asn1`] but keeps the tag and length octets.
    pub fn read_asn1_element(&mut self, tag: Tag) -> Option<&'a [u8]> {
        self.read_tagged(tag).map(|(element, _)| element)
    }

    pub fn read_asn1_sequence(&mut self) -> Option<Parser<'a>> {
        self.read_asn1(SEQUENCE).map(Parser::new)
    }

    pub fn read_asn1_octet_string(&mut self) -> Option<&'a [u8]> {
        self.read_asn1(OCTET_STRING)
    }

    pub fn read_asn1_boolean(&mut self) -> Option<bool> {
        let mut p = *self;
        let v = match p.read_asn1(BOOLEAN)? {
            [0x00] => false,
            [0xff] => true,
            _ => return None,
        };
        *self = p;
        Some(v)
    }

    /// Reads a non-negative INTEGER and returns its magnitude without the
    /// sign octet. Negative and non-minimal encodings are rejected.
    pub fn read_asn1_uint_bytes(&mut self) -> Option<&'a [u8]> {
        let mut p = *self;
        let v = p.read_asn1(INTEGER)?;
        let magnitude = match v {
            [] => return None,
            [b, ..] if b & 0x80 != 0 => return None,
            [0, next, ..] if next & 0x80 == 0 => return None,
            [0, _, ..] => &v[1..],
            _ => v,
        };
        *self = p;
        Some(magnitude)
    }

    pub fn read_asn1_object_identifier(&mut self) -> Option<ObjectIdentifier> {
        let mut p = *self;
        let oid = ObjectIdentifier::try_from_asn1(p.read_asn1(OBJECT_IDENTIFIER)?).ok()?;
        *self = p;
        Some(oid)
    }

    pub fn read_asn1_bit_string(&mut self) -> Option<BitString> {
        let mut p = *self;
        let bits = BitString::try_from(p.read_asn1(BIT_STRING)?).ok()?;
        *self = p;
        Some(bits)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn test_boolean() {
        let mut s = Parser::new(&[1, 1, 0, 1, 1, 0xff, 5, 0]);
        assert_eq!(s.read_asn1_boolean(), Some(false));
        assert_eq!(s.read_asn1_boolean(), Some(true));
        assert_eq!(s.remaining(), &[5, 0]);

        let mut bad = Parser::new(&[1, 1, 2]);
        assert!(bad.read_asn1_boolean().is_none());
        assert_eq!(bad.len(), 3);
    }

    #[test]
    fn test_wrong_tag_keeps_input() {
        let mut s = Parser::new(&[4, 1, 0xaa]);
        assert!(s.read_asn1_sequence().is_none());
        assert_eq!(s.peek_tag(), Some(OCTET_STRING));
        assert_eq!(s.read_asn1_octet_string().unwrap(), &[0xaa]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_lengths() {
        let mut b = Builder::new(Vec::new());
        b.add_asn1_octet_string(&[7u8; 300]);
        let bytes = b.take().unwrap();
        let mut s = Parser::new(&bytes);
        assert_eq!(s.read_asn1_octet_string().unwrap(), &[7u8; 300][..]);
        assert!(s.is_empty());

        // long form where the short form fits.
        assert!(Parser::new(&[4, 0x81, 1, 0]).read_asn1_octet_string().is_none());
        // leading zero length octet.
        let mut v = vec![4, 0x82, 0, 0x80];
        v.extend_from_slice(&[0u8; 0x80]);
        assert!(Parser::new(&v).read_asn1_octet_string().is_none());
        // indefinite length.
        assert!(Parser::new(&[0x30, 0x80, 0, 0]).read_asn1_sequence().is_none());
        // more than four length octets.
        assert!(Parser::new(&[4, 0x85, 1, 0, 0, 0, 0]).read_asn1_octet_string().is_none());
        // truncated.
        assert!(Parser::new(&[4, 3, 1, 2]).read_asn1_octet_string().is_none());
        assert!(Parser::new(&[4]).read_asn1_octet_string().is_none());
        // high tag number form.
        assert!(Parser::new(&[0x1f, 1, 0]).read_asn1(Tag(0x1f)).is_none());
    }

    #[test]
    fn test_uint() {
        let mut s = Parser::new(&[2, 2, 0, 0x80, 2, 1, 0x7f, 2, 1, 0]);
        assert_eq!(s.read_asn1_uint_bytes().unwrap(), &[0x80]);
        assert_eq!(s.read_asn1_uint_bytes().unwrap(), &[0x7f]);
        assert_eq!(s.read_asn1_uint_bytes().unwrap(), &[0]);
        assert!(s.is_empty());

        for bad in [&[2u8, 1, 0x80][..], &[2, 2, 0, 1], &[2, 0]] {
            let mut p = Parser::new(bad);
            assert!(p.read_asn1_uint_bytes().is_none());
            assert_eq!(p.len(), bad.len());
        }
    }

    #[test]
    fn test_sequence() {
        let mut b = Builder::new(Vec::new());
        b.add_asn1_sequence(|b| {
            b.add_asn1_uint(&[0x80, 1]);
            b.add_asn1_object_identifier(&crate::oid!(1, 2, 156, 10197, 1, 301));
            b.add_asn1_bit_string(&BitString::from_bytes(&[4, 5]));
        });
        let bytes = b.take().unwrap();

        let mut s = Parser::new(&bytes);
        assert!(s.read_asn1_element(INTEGER).is_none());
        let mut peek = s;
        assert_eq!(peek.read_asn1_element(SEQUENCE).unwrap(), &bytes[..]);
        let mut seq = s.read_asn1_sequence().unwrap();
        assert!(s.is_empty());
        assert_eq!(seq.read_asn1_uint_bytes().unwrap(), &[0x80, 1]);
        assert_eq!(
            seq.read_asn1_object_identifier().unwrap(),
            ObjectIdentifier::try_from("1.2.156.10197.1.301").unwrap()
        );
        assert_eq!(seq.read_asn1_bit_string().unwrap().as_slice(), &[4, 5]);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_malformed_contents_keep_input() {
        // OBJECT IDENTIFIER with a truncated arc.
        let mut s = Parser::new(&[6, 2, 0x2a, 0x81]);
        assert!(s.read_asn1_object_identifier().is_none());
        assert_eq!(s.len(), 4);
        // BIT STRING with nonzero padding bits.
        let mut s = Parser::new(&[3, 2, 1, 0x01]);
        assert!(s.read_asn1_bit_string().is_none());
        assert_eq!(s.len(), 4);
    }
}
