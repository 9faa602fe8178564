use thiserror::Error;

/// Failures of the DER [`Builder`](super::Builder) and of the
/// [`asn1`](super::asn1) value types.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("cryptobyte: length overflow")]
    LengthOverflow,

    /// Only low tag numbers (below 31) are written.
    #[error("cryptobyte: unsupported tag number {0}")]
    UnsupportedTag(u8),

    #[error("cryptobyte: invalid object identifier")]
    InvalidOid,

    #[error("cryptobyte: malformed object identifier encoding")]
    MalformedOid,

    #[error("cryptobyte: invalid bit string length")]
    InvalidBitStringLength,

    #[error("cryptobyte: invalid bit string padding")]
    InvalidBitStringPadding,
}

pub type Result<T> = core::result::Result<T, Error>;
