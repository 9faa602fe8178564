use thiserror;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SM9Error {
    #[error("sm9: invalid length")]
    InvalidLength,

    #[error("sm9: invalid encoding")]
    InvalidEncoding,

    #[error("sm9: invalid scalar")]
    InvalidScalar,

    #[error("sm9: invalid point")]
    InvalidPoint,

    #[error("sm9: decryption error")]
    DecryptionError,

    #[error("sm9: verification failure")]
    VerificationFailure,

    #[error("sm9: randomness source failure")]
    RandomnessFailure,

    #[error("sm9: too many retries")]
    ResourceExhausted,

    #[error("sm9: key exchange step out of order")]
    InvalidState,
}

pub type Result<T> = core::result::Result<T, SM9Error>;
