use alloc::fmt;
use crate::cryptobyte::{Error, Result};

// OBJECT IDENTIFIER from its arcs, evaluated at compile time for consts.
#[macro_export]
macro_rules! oid {
    ($($d:expr),*) => {
        match $crate::cryptobyte::asn1::ObjectIdentifier::from_slice(&[$($d,)*]) {
            Some(oid) => oid,
            None => panic!("invalid object identifier"),
        }
    };
}

const OID_MAX_SIZE: usize = 63;

// An ObjectIdentifier represents an ASN.1 OBJECT IDENTIFIER, held as the
// contents octets of its DER encoding.
#[derive(Debug, Clone, Copy)]
pub struct ObjectIdentifier {
    der: [u8; OID_MAX_SIZE],
    der_len: u8,
}

impl PartialEq for ObjectIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.as_der() == other.as_der()
    }
}
impl Eq for ObjectIdentifier {}

// Calls f with every arc after the first octet. der must be valid.
fn for_each_arc<F: FnMut(u64)>(der: &[u8], mut f: F) {
    let mut n = 0u64;
    // 0x81, 0x82, 0x03 => 1*128^2 + 2*128 + 3
    for x in der {
        n = (n << 7) | (*x & 0x7f) as u64;
        if *x & 0x80 == 0 {
            f(n);
            n = 0;
        }
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let der = self.as_der();
        if der.is_empty() {
            return Ok(());
        }

        // The first subidentifier packs the first two arcs as 40*a0 + a1.
        let mut first = true;
        let mut res = Ok(());
        for_each_arc(der, |n| {
            if res.is_err() {
                return;
            }
            res = if first {
                first = false;
                let a0 = core::cmp::min(n / 40, 2);
                write!(f, "{}.{}", a0, n - 40 * a0)
            } else {
                write!(f, ".{}", n)
            };
        });
        res
    }
}

impl TryFrom<&str> for ObjectIdentifier {
    type Error = Error;

    /// Parses a dotted OID, e.g. `"1.2.156.10197.1.301"`.
    fn try_from(value: &str) -> Result<Self> {
        let mut v = [0u32; 32];
        let mut i = 0;
        for s in value.split('.') {
            if i == v.len() {
                return Err(Error::InvalidOid);
            }
            v[i] = s.parse::<u32>().map_err(|_| Error::InvalidOid)?;
            i += 1;
        }
        ObjectIdentifier::from_slice(&v[..i]).ok_or(Error::InvalidOid)
    }
}

impl ObjectIdentifier {
    /// Builds an OID from its arcs, e.g. [1, 2, 840, 113549].
    /// Returns None for fewer than two arcs, a bad first pair or an encoding
    /// longer than 63 bytes.
    pub const fn from_slice(parts: &[u32]) -> Option<ObjectIdentifier> {
        if parts.len() < 2 {
            return None;
        }

        if parts[0] > 2 || (parts[0] < 2 && parts[1] >= 40) || parts[1] > 255 - 80 {
            return None;
        }

        let mut der = [0u8; OID_MAX_SIZE];
        der[0] = (40 * parts[0] + parts[1]) as u8;
        let mut der_len = 1;

        let mut i = 2;
        while i < parts.len() {
            let part = parts[i];

            // How many bytes to encode part, at least one.
            let bits = 32 - part.leading_zeros();
            let mut length = ((bits + 6) / 7) as usize;
            if length == 0 {
                length = 1;
            }
            if der_len + length > OID_MAX_SIZE {
                return None;
            }

            let mut j = length - 1;
            while j > 0 {
                der[der_len] = (0x80 | ((part >> (7 * j)) & 0x7f)) as u8;
                der_len += 1;
                j -= 1;
            }
            der[der_len] = (part & 0x7f) as u8;
            der_len += 1;
            i += 1;
        }

        Some(ObjectIdentifier { der, der_len: der_len as u8 })
    }

    /// Takes the contents octets of a DER OBJECT IDENTIFIER.
    ///
    /// Every subidentifier must be minimally encoded (no leading 0x80) and
    /// terminated; arcs larger than 2^63 are rejected.
    pub fn try_from_asn1(v: &[u8]) -> Result<Self> {
        if v.is_empty() || v.len() > OID_MAX_SIZE {
            return Err(Error::MalformedOid);
        }
        let mut start = true;
        let mut bits = 0;
        for x in v {
            if start && *x == 0x80 {
                return Err(Error::MalformedOid);
            }
            bits += 7;
            if bits > 63 {
                return Err(Error::MalformedOid);
            }
            start = *x & 0x80 == 0;
            if start {
                bits = 0;
            }
        }
        if !start {
            // the last subidentifier is truncated.
            return Err(Error::MalformedOid);
        }

        let mut oid = ObjectIdentifier { der: [0; OID_MAX_SIZE], der_len: v.len() as u8 };
        oid.der[..v.len()].copy_from_slice(v);
        Ok(oid)
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der[..self.der_len as usize]
    }

    pub fn is_valid(&self) -> bool {
        self.der_len >= 1
    }
}
