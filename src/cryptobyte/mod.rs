//! Minimal DER writing and reading for the structures SM2 and SM9 exchange:
//! signatures, ciphertexts and enveloped keys.
//!
//! Only definite lengths and low tag numbers are handled. [`Builder`] nests
//! constructed values through closures and [`Parser`] hands out sub-parsers
//! over the contents of a constructed value.

pub mod asn1;
pub mod builder;
pub mod error;
pub mod oid;
pub mod parser;
pub use builder::Builder;
pub use error::{Error, Result};
pub use parser::Parser;

/// A DER identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag(pub u8);

impl From<Tag> for u8 {
    fn from(v: Tag) -> Self {
        v.0
    }
}

const CONSTRUCTED: u8 = 0x20;

pub const BOOLEAN: Tag = Tag(0x01);
pub const INTEGER: Tag = Tag(0x02);
pub const BIT_STRING: Tag = Tag(0x03);
pub const OCTET_STRING: Tag = Tag(0x04);
pub const NULL: Tag = Tag(0x05);
pub const OBJECT_IDENTIFIER: Tag = Tag(0x06);
pub const SEQUENCE: Tag = Tag(0x10 | CONSTRUCTED);

impl Tag {
    /// Tag numbers of 31 and above need the multi-octet form.
    pub const fn is_low_number(self) -> bool {
        self.0 & 0x1f != 0x1f
    }
}
